//! Storage Integration Tests
//!
//! Tests for the single-variant storages, filtering and combined wrappers,
//! iteration and persistence.

mod common;

use common::{hello, world, StringVariant};
use transfer_api::{
    CombinedStorage, ContentsError, EmptyStorage, FilteringStorage, FixedVariantStorage,
    ResourceAmount, SingleVariantStorage, SlottedStorage, Storage, StorageView, Transaction,
    TransferVariant, ViewId,
};

#[test]
fn test_insert_and_extract() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let tx = Transaction::open_outer();
    assert_eq!(tank.insert(&hello(), 60, &tx), 60);
    assert_eq!(tank.insert(&hello(), 60, &tx), 40);
    assert_eq!(tank.insert(&hello(), 60, &tx), 0);
    tx.commit();

    assert_eq!(tank.resource(), hello());
    assert_eq!(tank.amount(), 100);

    let tx = Transaction::open_outer();
    assert_eq!(tank.extract(&hello(), 30, &tx), 30);
    assert_eq!(tank.extract(&hello(), 100, &tx), 70);
    tx.commit();

    assert!(tank.resource().is_blank());
    assert_eq!(tank.amount(), 0);
}

#[test]
fn test_rejects_other_variant_when_occupied() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let tx = Transaction::open_outer();
    assert_eq!(tank.insert(&hello(), 50, &tx), 50);
    assert_eq!(tank.insert(&world(), 50, &tx), 0);
    assert_eq!(tank.extract(&world(), 50, &tx), 0);
    tx.commit();

    assert_eq!(tank.amount(), 50);
}

#[test]
#[should_panic(expected = "blank")]
fn test_blank_insert_panics() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let tx = Transaction::open_outer();
    tank.insert(&StringVariant::blank(), 10, &tx);
}

#[test]
fn test_abort_restores_contents() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let tx = Transaction::open_outer();
    tank.insert(&hello(), 50, &tx);
    tx.abort();

    assert!(tank.resource().is_blank());
    assert_eq!(tank.amount(), 0);
}

#[test]
fn test_nested_commit_then_outer_abort_restores_contents() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let outer = Transaction::open_outer();
    let nested = outer.open_nested();
    tank.insert(&hello(), 50, &nested);
    nested.commit();
    assert_eq!(tank.amount(), 50);
    outer.abort();

    assert_eq!(tank.amount(), 0);
}

#[test]
fn test_insert_and_extract_filters() {
    let tank = SingleVariantStorage::with_fixed_capacity(100)
        .insert_filter(|variant: &StringVariant| *variant == hello())
        .extract_filter(|_| false);

    let tx = Transaction::open_outer();
    assert_eq!(tank.insert(&world(), 10, &tx), 0);
    assert_eq!(tank.insert(&hello(), 10, &tx), 10);
    assert_eq!(tank.extract(&hello(), 10, &tx), 0);
    tx.commit();

    assert_eq!(tank.amount(), 10);
}

#[test]
fn test_variant_dependent_capacity() {
    let tank = SingleVariantStorage::new(|variant: &StringVariant| {
        if *variant == hello() {
            100
        } else {
            10
        }
    });

    let tx = Transaction::open_outer();
    assert_eq!(tank.insert(&world(), 50, &tx), 10);
    tx.abort();

    let tx = Transaction::open_outer();
    assert_eq!(tank.insert(&hello(), 50, &tx), 50);
    tx.commit();
}

#[test]
fn test_final_commit_hook_on_storage() {
    let (count, hook) = common::counter_hook();
    let tank = SingleVariantStorage::with_fixed_capacity(100).on_final_commit(hook);

    let tx = Transaction::open_outer();
    tank.insert(&hello(), 10, &tx);
    tx.commit();
    assert_eq!(count.get(), 1);

    let tx = Transaction::open_outer();
    tank.insert(&hello(), 10, &tx);
    tx.abort();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_storage_version_tracks_commits() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);
    let initial = Storage::<StringVariant>::version(&tank);

    let tx = Transaction::open_outer();
    tank.insert(&hello(), 10, &tx);
    tx.abort();
    assert_eq!(Storage::<StringVariant>::version(&tank), initial);

    let tx = Transaction::open_outer();
    tank.insert(&hello(), 10, &tx);
    tx.commit();
    assert_ne!(Storage::<StringVariant>::version(&tank), initial);
}

#[test]
fn test_save_and_load_contents() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);
    tank.load_contents(ResourceAmount::new(hello(), 42)).unwrap();

    let saved = tank.save_contents();
    let json = serde_json::to_string(&saved).unwrap();
    let restored: ResourceAmount<StringVariant> = serde_json::from_str(&json).unwrap();

    let other = SingleVariantStorage::with_fixed_capacity(100);
    other.load_contents(restored).unwrap();
    assert_eq!(other.resource(), hello());
    assert_eq!(other.amount(), 42);
}

#[test]
fn test_load_contents_validation() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);

    let result = tank.load_contents(ResourceAmount::new(hello(), 150));
    assert_eq!(
        result,
        Err(ContentsError::ExceedsCapacity {
            amount: 150,
            capacity: 100
        })
    );

    let result = tank.load_contents(ResourceAmount::new(StringVariant::blank(), 5));
    assert_eq!(result, Err(ContentsError::BlankWithAmount { amount: 5 }));

    // The failed loads left the storage untouched.
    assert_eq!(tank.amount(), 0);

    tank.load_contents(ResourceAmount::new(StringVariant::blank(), 0))
        .unwrap();
    assert!(tank.resource().is_blank());
}

#[test]
fn test_iteration() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);
    assert_eq!(tank.iter().count(), 1);
    assert_eq!(tank.non_empty_iter().count(), 0);

    tank.load_contents(ResourceAmount::new(hello(), 30)).unwrap();
    let views: Vec<_> = tank.non_empty_iter().collect();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].resource(), hello());
    assert_eq!(views[0].amount(), 30);
    assert_eq!(views[0].capacity(), 100);
}

#[test]
fn test_non_empty_iter_skips_views_emptied_mid_iteration() {
    let a = SingleVariantStorage::with_fixed_capacity(100);
    let b = SingleVariantStorage::with_fixed_capacity(100);
    a.load_contents(ResourceAmount::new(hello(), 50)).unwrap();
    b.load_contents(ResourceAmount::new(hello(), 50)).unwrap();
    let combined = CombinedStorage::new(vec![&a, &b]);

    let tx = Transaction::open_outer();
    let mut iter = combined.non_empty_iter();
    assert_eq!(iter.next().unwrap().amount(), 50);

    // Drain the second part before the iterator reaches it.
    b.extract(&hello(), 50, &tx);
    assert!(iter.next().is_none());
    drop(iter);
    tx.commit();
}

#[test]
fn test_slot_access() {
    let tank = SingleVariantStorage::with_fixed_capacity(100);
    tank.load_contents(ResourceAmount::new(hello(), 30)).unwrap();

    assert_eq!(tank.slot_count(), 1);
    assert_eq!(tank.slot(0).amount(), 30);
    assert!(tank.get_slot(0).is_some());
    assert!(tank.get_slot(1).is_none());
    assert!(Storage::<StringVariant>::as_slotted(&tank).is_some());
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_slot_out_of_bounds_panics() {
    let tank = SingleVariantStorage::<StringVariant>::with_fixed_capacity(100);
    tank.slot(1);
}

#[test]
fn test_fixed_variant_storage() {
    let tank = FixedVariantStorage::new(hello(), 100);
    assert_eq!(*tank.allowed(), hello());

    let tx = Transaction::open_outer();
    assert_eq!(tank.fill(60, &tx), 60);
    assert_eq!(tank.fill(60, &tx), 40);
    assert_eq!(tank.insert(&world(), 10, &tx), 0);
    assert_eq!(tank.drain(30, &tx), 30);
    tx.commit();

    assert_eq!(tank.amount(), 70);
    assert_eq!(tank.slot_count(), 1);
    assert_eq!(tank.slot(0).resource(), hello());
}

#[test]
fn test_empty_storage() {
    let empty: &dyn Storage<StringVariant> = &EmptyStorage;
    assert!(!empty.supports_insertion());
    assert!(!empty.supports_extraction());
    assert_eq!(empty.version(), 0);
    assert_eq!(empty.iter().count(), 0);

    let tx = Transaction::open_outer();
    assert_eq!(empty.insert(&hello(), 10, &tx), 0);
    assert_eq!(empty.extract(&hello(), 10, &tx), 0);
    tx.commit();
}

#[test]
fn test_filtering_storage_gates_operations() {
    let backing = SingleVariantStorage::with_fixed_capacity(100);
    let filtered = FilteringStorage::new(backing)
        .insert_filter(|variant: &StringVariant| *variant == hello())
        .extract_filter(|_| false);

    let tx = Transaction::open_outer();
    assert_eq!(filtered.insert(&world(), 10, &tx), 0);
    assert_eq!(filtered.insert(&hello(), 10, &tx), 10);
    assert_eq!(filtered.extract(&hello(), 10, &tx), 0);
    tx.commit();

    assert_eq!(filtered.backing().amount(), 10);
}

#[test]
fn test_filtering_storage_gates_views() {
    let backing = SingleVariantStorage::with_fixed_capacity(100);
    backing
        .load_contents(ResourceAmount::new(hello(), 50))
        .unwrap();
    let filtered = FilteringStorage::new(backing).extract_filter(|_| false);

    let tx = Transaction::open_outer();
    let views: Vec<_> = filtered.iter().collect();
    assert_eq!(views.len(), 1);

    // Filtered contents stay visible but cannot be moved.
    assert_eq!(views[0].resource(), hello());
    assert_eq!(views[0].amount(), 50);
    assert_eq!(views[0].extract(&hello(), 50, &tx), 0);
    tx.commit();
}

#[test]
fn test_filtering_view_shares_underlying_id() {
    let backing = SingleVariantStorage::<StringVariant>::with_fixed_capacity(100);
    let filtered = FilteringStorage::new(backing).extract_filter(|_| false);

    let wrapped_id = filtered.iter().next().unwrap().underlying_id();
    let backing_id = ViewId::of(filtered.backing());
    assert_eq!(wrapped_id, backing_id);
}
