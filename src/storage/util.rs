//! Bulk moves, simulation and lookup helpers for storages.

use tracing::debug;

use super::{SlottedStorage, Storage, StorageView};
use crate::transaction::Transaction;
use crate::variant::ResourceAmount;

/// Move up to `max_amount` of resources accepted by `filter` from `from` to
/// `to`, returning the total amount moved.
///
/// Each candidate resource is moved in its own nested transaction, so a
/// partial per-resource failure (the destination accepted more than the source
/// could actually provide) rolls back cleanly without poisoning the rest of
/// the operation. The surrounding iteration scope commits when `max_amount` is
/// reached or all views were visited.
pub fn transfer<T: 'static>(
    from: &dyn Storage<T>,
    to: &dyn Storage<T>,
    filter: impl Fn(&T) -> bool,
    max_amount: u64,
    tx: Option<&Transaction>,
) -> u64 {
    let mut total_moved = 0;
    let iteration_tx = Transaction::open_nested_in(tx);

    for view in from.non_empty_iter() {
        let resource = view.resource();
        if !filter(&resource) {
            continue;
        }

        let max_extracted =
            simulate_extract_view(&*view, &resource, max_amount - total_moved, Some(&iteration_tx));

        {
            let transfer_tx = iteration_tx.open_nested();
            let accepted = to.insert(&resource, max_extracted, &transfer_tx);

            if view.extract(&resource, accepted, &transfer_tx) == accepted {
                total_moved += accepted;
                transfer_tx.commit();
            }
            // An unbalanced leg drops the guard, rolling the attempt back.
        }

        if total_moved == max_amount {
            break;
        }
    }

    iteration_tx.commit();
    debug!(total_moved, max_amount, "transfer finished");
    total_moved
}

/// Amount `storage` would accept for `resource`, without changing any state.
pub fn simulate_insert<T: 'static>(
    storage: &dyn Storage<T>,
    resource: &T,
    max_amount: u64,
    tx: Option<&Transaction>,
) -> u64 {
    let simulation = Transaction::open_nested_in(tx);
    let amount = storage.insert(resource, max_amount, &simulation);
    simulation.abort();
    amount
}

/// Amount `storage` would yield for `resource`, without changing any state.
pub fn simulate_extract<T: 'static>(
    storage: &dyn Storage<T>,
    resource: &T,
    max_amount: u64,
    tx: Option<&Transaction>,
) -> u64 {
    let simulation = Transaction::open_nested_in(tx);
    let amount = storage.extract(resource, max_amount, &simulation);
    simulation.abort();
    amount
}

/// Amount a single view would yield for `resource`, without changing any state.
pub fn simulate_extract_view<T: 'static>(
    view: &dyn StorageView<T>,
    resource: &T,
    max_amount: u64,
    tx: Option<&Transaction>,
) -> u64 {
    let simulation = Transaction::open_nested_in(tx);
    let amount = view.extract(resource, max_amount, &simulation);
    simulation.abort();
    amount
}

/// Extract any non-zero amount of any resource from `storage`, inside `tx`.
pub fn extract_any<T: 'static>(
    storage: &dyn Storage<T>,
    max_amount: u64,
    tx: &Transaction,
) -> Option<ResourceAmount<T>> {
    for view in storage.non_empty_iter() {
        let resource = view.resource();
        let amount = view.extract(&resource, max_amount, tx);
        if amount > 0 {
            return Some(ResourceAmount::new(resource, amount));
        }
    }

    None
}

/// Insert into a slotted storage, preferring to top up non-blank slots before
/// filling blank ones, returning the amount inserted.
pub fn insert_stacking<T: 'static>(
    slots: &dyn SlottedStorage<T>,
    resource: &T,
    max_amount: u64,
    tx: &Transaction,
) -> u64 {
    let mut amount = 0;

    for index in 0..slots.slot_count() {
        let slot = slots.slot(index);
        if !slot.is_resource_blank() {
            amount += slot.insert(resource, max_amount - amount, tx);
            if amount == max_amount {
                return amount;
            }
        }
    }

    for index in 0..slots.slot_count() {
        let slot = slots.slot(index);
        amount += slot.insert(resource, max_amount - amount, tx);
        if amount == max_amount {
            return amount;
        }
    }

    amount
}

/// Insert with stacking semantics when `storage` is slotted, plainly otherwise.
pub fn try_insert_stacking<T: 'static>(
    storage: &dyn Storage<T>,
    resource: &T,
    max_amount: u64,
    tx: &Transaction,
) -> u64 {
    match storage.as_slotted() {
        Some(slotted) => insert_stacking(slotted, resource, max_amount, tx),
        None => storage.insert(resource, max_amount, tx),
    }
}

/// Any stored resource accepted by `filter`.
pub fn find_stored_resource<T: 'static>(
    storage: &dyn Storage<T>,
    filter: impl Fn(&T) -> bool,
) -> Option<T> {
    storage
        .non_empty_iter()
        .map(|view| view.resource())
        .find(|resource| filter(resource))
}

/// Any resource accepted by `filter` that could actually be extracted right
/// now, probed inside a rolled-back nested transaction.
pub fn find_extractable_resource<T: 'static>(
    storage: &dyn Storage<T>,
    filter: impl Fn(&T) -> bool,
    tx: Option<&Transaction>,
) -> Option<T> {
    let probe = Transaction::open_nested_in(tx);
    let mut found = None;

    for view in storage.non_empty_iter() {
        let resource = view.resource();
        if filter(&resource) && view.extract(&resource, u64::MAX, &probe) > 0 {
            found = Some(resource);
            break;
        }
    }

    drop(probe);
    found
}

/// An extractable resource together with the amount extraction would yield.
pub fn find_extractable_content<T: 'static>(
    storage: &dyn Storage<T>,
    filter: impl Fn(&T) -> bool,
    tx: Option<&Transaction>,
) -> Option<ResourceAmount<T>> {
    let resource = find_extractable_resource(storage, filter, tx)?;
    let amount = simulate_extract(storage, &resource, u64::MAX, tx);

    (amount > 0).then(|| ResourceAmount::new(resource, amount))
}

/// Average fill ratio of all views scaled to `0..=15`, plus one whenever any
/// view holds something. A storage without views reads 0.
pub fn fill_level<T: 'static>(storage: &dyn Storage<T>) -> u8 {
    let mut fill = 0.0;
    let mut view_count = 0u32;
    let mut has_non_empty_view = false;

    for view in storage.iter() {
        view_count += 1;

        if view.amount() > 0 && view.capacity() > 0 {
            fill += view.amount() as f64 / view.capacity() as f64;
            has_non_empty_view = true;
        }
    }

    if view_count == 0 {
        return 0;
    }

    (fill / f64::from(view_count) * 14.0).floor() as u8 + u8::from(has_non_empty_view)
}
