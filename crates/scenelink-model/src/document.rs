//! Scene document round-trip.
//!
//! A scene export is a JSON object whose `ops_3d` key holds the records we
//! annotate. Everything else passes through untouched: top-level keys keep
//! their order and values, and record fields keep their original (possibly
//! float-typed) values. `parent_id` is the only field this module writes:
//! always a decimal string, `""` when unresolved, never null or omitted.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use thiserror::Error;

use crate::id::{coerce_id, Id};

/// Top-level key holding the record collection.
pub const OPS_KEY: &str = "ops_3d";

const PARENT_KEY: &str = "parent_id";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document root is not an object")]
    RootNotObject,
    #[error("document has no `ops_3d` key")]
    MissingOps,
    #[error("`ops_3d` is not an array")]
    OpsNotArray,
    #[error("record {index}: not an object")]
    RecordNotObject { index: usize },
    #[error("record {index}: missing or non-numeric `unique_id`")]
    BadUniqueId { index: usize },
    #[error("record {index}: `image_ids` missing or not an array")]
    MissingImageIds { index: usize },
    #[error("record {index}: non-numeric image id `{value}`")]
    BadImageId { index: usize, value: String },
}

/// One `ops_3d` record, parsed just far enough to resolve parents.
///
/// The full original field map is retained so serialization reproduces the
/// record as received, plus `parent_id`.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub unique_id: Id,
    pub image_ids: Vec<Id>,
    pub parent_id: Option<Id>,
    fields: Map<String, Value>,
}

impl SceneObject {
    /// Build a record from scratch (programmatic documents, tests).
    pub fn new(unique_id: Id, image_ids: Vec<Id>) -> Self {
        let mut fields = Map::new();
        fields.insert("unique_id".to_string(), Value::from(unique_id));
        fields.insert(
            "image_ids".to_string(),
            Value::Array(image_ids.iter().map(|&id| Value::from(id)).collect()),
        );
        Self {
            unique_id,
            image_ids,
            parent_id: None,
            fields,
        }
    }

    fn from_record(index: usize, record: &Value) -> Result<Self, DocumentError> {
        let Value::Object(fields) = record else {
            return Err(DocumentError::RecordNotObject { index });
        };

        let unique_id = fields
            .get("unique_id")
            .and_then(coerce_id)
            .ok_or(DocumentError::BadUniqueId { index })?;

        let image_values = match fields.get("image_ids") {
            Some(Value::Array(values)) => values,
            _ => return Err(DocumentError::MissingImageIds { index }),
        };
        let mut image_ids = Vec::with_capacity(image_values.len());
        for value in image_values {
            let id = coerce_id(value).ok_or_else(|| DocumentError::BadImageId {
                index,
                value: value.to_string(),
            })?;
            image_ids.push(id);
        }

        // Any `parent_id` already on the record is discarded so reruns start
        // from a clean slate; its key position in `fields` is kept.
        Ok(Self {
            unique_id,
            image_ids,
            parent_id: None,
            fields: fields.clone(),
        })
    }

    /// Original record fields, as received.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn to_record(&self) -> Value {
        let mut fields = self.fields.clone();
        let parent = self
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        fields.insert(PARENT_KEY.to_string(), Value::String(parent));
        Value::Object(fields)
    }
}

/// A scene export document: the parsed `ops_3d` records plus every other
/// top-level key, held for passthrough.
#[derive(Debug, Clone)]
pub struct SceneDocument {
    top: Map<String, Value>,
    objects: Vec<SceneObject>,
}

impl SceneDocument {
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(top) = root else {
            return Err(DocumentError::RootNotObject);
        };

        let records = match top.get(OPS_KEY) {
            Some(Value::Array(records)) => records,
            Some(_) => return Err(DocumentError::OpsNotArray),
            None => return Err(DocumentError::MissingOps),
        };
        let objects = records
            .iter()
            .enumerate()
            .map(|(index, record)| SceneObject::from_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { top, objects })
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Write resolved parent assignments back onto the records.
    ///
    /// `parents` is positional, one entry per record in document order.
    pub fn apply_parents(&mut self, parents: &[Option<Id>]) {
        debug_assert_eq!(parents.len(), self.objects.len());
        for (object, parent) in self.objects.iter_mut().zip(parents) {
            object.parent_id = *parent;
        }
    }

    /// Serialize with 4-space indentation, `ops_3d` in its original
    /// top-level position.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        let mut top = self.top.clone();
        let records: Vec<Value> = self.objects.iter().map(SceneObject::to_record).collect();
        // insert on an existing key keeps its slot (`preserve_order`)
        top.insert(OPS_KEY.to_string(), Value::Array(records));

        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut out, formatter);
        Value::Object(top).serialize(&mut serializer)?;
        Ok(String::from_utf8(out).expect("serde_json emits UTF-8"))
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
