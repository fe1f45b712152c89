//! Integration tests for file cache capacity and uniqueness.
//!
//! Random sequences of `add` calls over a small pool of names must never
//! exceed the capacity or admit two entries for one normalized path, and the
//! duplicate and capacity errors must fire exactly at those boundaries.

use std::collections::HashSet;

use logging::{DestinationConfig, Error, LevelSet, OptionSet};
use logging_sink::file::{FileCache, RotationPolicy};
use proptest::prelude::*;

fn quiet() -> DestinationConfig {
    DestinationConfig::new(LevelSet::ALL, OptionSet::NO_HEADER)
}

// ============================================================================
// Boundaries
// ============================================================================

/// Verifies the seventeenth distinct file is refused at the default capacity.
#[test]
fn default_capacity_is_sixteen() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::default();
    for n in 0..16 {
        cache.add(dir.path().join(format!("{n}.log")), quiet()).unwrap();
    }
    assert!(matches!(
        cache.add(dir.path().join("16.log"), quiet()),
        Err(Error::NoRoom { capacity: 16, .. })
    ));
}

/// Verifies removing an entry frees room for another.
#[test]
fn removal_frees_a_slot() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(1, RotationPolicy::default());
    let id = cache.add(dir.path().join("a.log"), quiet()).unwrap();
    assert!(cache.add(dir.path().join("b.log"), quiet()).is_err());
    cache.remove(id).unwrap();
    cache.add(dir.path().join("b.log"), quiet()).unwrap();
}

/// Verifies a relative spelling of a registered path is a duplicate.
#[test]
fn path_lookup_uses_normalized_form() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::default();
    let plain = dir.path().join("x.log");
    let id = cache.add(&plain, quiet()).unwrap();
    let dotted = dir.path().join("sub").join("..").join("x.log");
    assert_eq!(cache.file_id(&dotted).unwrap(), Some(id));
    assert!(matches!(cache.add(&dotted, quiet()), Err(Error::DuplicateItem(_))));
}

// ============================================================================
// Property: capacity and uniqueness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Adds land, collide, or overflow exactly as a set model predicts.
    #[test]
    fn adds_respect_capacity_and_uniqueness(
        capacity in 1usize..6,
        names in proptest::collection::vec(0u8..10, 1..24),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(capacity, RotationPolicy::default());
        let mut model: HashSet<u8> = HashSet::new();

        for name in names {
            let path = dir.path().join(format!("f{name}.log"));
            let outcome = cache.add(&path, quiet());
            if model.contains(&name) {
                prop_assert!(matches!(outcome, Err(Error::DuplicateItem(_))));
            } else if model.len() == capacity {
                prop_assert!(
                    matches!(outcome, Err(Error::NoRoom { .. })),
                    "expected NoRoom at capacity {}", capacity
                );
            } else {
                prop_assert!(outcome.is_ok());
                model.insert(name);
            }
            prop_assert!(cache.len().unwrap() <= capacity);
            prop_assert_eq!(cache.len().unwrap(), model.len());
        }

        let ids = cache.ids().unwrap();
        let paths: HashSet<_> = ids
            .iter()
            .map(|id| cache.stats(*id).unwrap().path)
            .collect();
        prop_assert_eq!(paths.len(), ids.len());
    }
}
