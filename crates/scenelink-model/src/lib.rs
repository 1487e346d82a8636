//! Scenelink core types
//!
//! Shared vocabulary for the pipeline:
//! - `Id`: the one identifier type both datasets are coerced into at parse time
//! - `RelationshipRow`: one kept row of the host/object schedule
//! - `SceneDocument` / `SceneObject`: the `ops_3d` JSON round-trip
//!
//! Parsing establishes types once; nothing downstream coerces at comparison
//! time, and nothing here mutates a document except through `parent_id`.

pub mod document;
pub mod id;
pub mod schedule;

pub use document::{DocumentError, SceneDocument, SceneObject};
pub use id::{coerce_id, parse_id, Id};
pub use schedule::RelationshipRow;
