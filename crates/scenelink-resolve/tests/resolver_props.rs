use proptest::prelude::*;

use scenelink_model::{Id, RelationshipRow, SceneObject};
use scenelink_resolve::{resolve_parents, HostIndex, MatchPolicy};

// Keep the id universe small so chains actually form.
fn small_id() -> impl Strategy<Value = Id> {
    1..40i64
}

fn rows() -> impl Strategy<Value = Vec<RelationshipRow>> {
    proptest::collection::vec(
        (small_id(), small_id(), [small_id(), small_id(), small_id()]),
        0..12,
    )
    .prop_map(|raw| {
        // distinct object_id per row, as the index requires
        raw.into_iter()
            .enumerate()
            .map(|(i, (host_id, _, image_ids))| RelationshipRow {
                host_id,
                object_id: 100 + i as Id,
                image_ids,
            })
            .collect()
    })
}

fn objects() -> impl Strategy<Value = Vec<SceneObject>> {
    proptest::collection::vec(
        (small_id(), proptest::collection::vec(small_id(), 0..5)),
        0..10,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(unique_id, image_ids)| SceneObject::new(unique_id, image_ids))
            .collect()
    })
}

proptest! {
    // Every resolved parent id names an object that exists in the document.
    #[test]
    fn resolved_parents_are_document_objects(rows in rows(), objects in objects()) {
        let index = HostIndex::new(rows).expect("distinct object ids");
        let parents = resolve_parents(&index, &objects, MatchPolicy::LastMatchWins)
            .expect("legacy order never errors");

        prop_assert_eq!(parents.len(), objects.len());
        for parent in parents.into_iter().flatten() {
            prop_assert!(objects.iter().any(|o| o.unique_id == parent));
        }
    }

    // Objects with no image ids never resolve, under either policy.
    #[test]
    fn empty_image_ids_never_resolve(rows in rows()) {
        let index = HostIndex::new(rows).expect("distinct object ids");
        let objects = vec![SceneObject::new(1, vec![])];

        let parents = resolve_parents(&index, &objects, MatchPolicy::LastMatchWins).unwrap();
        prop_assert_eq!(&parents, &vec![None]);
        let parents = resolve_parents(&index, &objects, MatchPolicy::Unique).unwrap();
        prop_assert_eq!(&parents, &vec![None]);
    }

    // When Unique succeeds, it agrees with LastMatchWins: a unanimous
    // candidate set has nothing for overwrite order to change.
    #[test]
    fn unique_agrees_with_legacy_when_unambiguous(rows in rows(), objects in objects()) {
        let index = HostIndex::new(rows).expect("distinct object ids");
        if let Ok(unique) = resolve_parents(&index, &objects, MatchPolicy::Unique) {
            let legacy = resolve_parents(&index, &objects, MatchPolicy::LastMatchWins).unwrap();
            prop_assert_eq!(unique, legacy);
        }
    }
}
