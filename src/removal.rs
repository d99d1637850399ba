//! Removal of stored units: single slots, batches, or whole rooms.
//!
//! Every removal that actually frees something records one history snapshot
//! before the mutation; attempts that would free nothing leave both the
//! store and the history untouched.

use serde::Serialize;
use utoipa::ToSchema;

use crate::history::HistoryManager;
use crate::model::{HistoryEntry, HistoryKind, PendingItem, Room};
use crate::store::{SlotStore, StoreError, count_occupied};

/// Result of a removal call.
///
/// `freed == 0` means the call was an informational no-op: nothing was
/// occupied, nothing was mutated, and no history entry was recorded.
#[derive(Clone, Copy, Debug, Serialize, ToSchema)]
pub struct RemovalOutcome {
    /// Number of slots that transitioned `occupied → empty`.
    pub freed: usize,
}

impl RemovalOutcome {
    /// Whether the call changed nothing.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.freed == 0
    }
}

/// Frees a single slot.
///
/// No-op if the slot is missing from the room or not occupied.
pub fn remove_slot(
    store: &mut SlotStore,
    history: &mut HistoryManager,
    pending: &[PendingItem],
    room: &Room,
    slot_id: &str,
) -> Result<RemovalOutcome, StoreError> {
    let ids = [slot_id.to_string()];
    remove_slots(store, history, pending, room, &ids)
}

/// Frees every occupied slot among the given ids in one pass.
///
/// A single history snapshot covers the whole batch. Ids that are not part
/// of the room, or that reference empty slots, are ignored.
pub fn remove_slots(
    store: &mut SlotStore,
    history: &mut HistoryManager,
    pending: &[PendingItem],
    room: &Room,
    slot_ids: &[String],
) -> Result<RemovalOutcome, StoreError> {
    let current = store.get(&room.id)?;

    let matching = current
        .iter()
        .filter(|slot| slot.is_occupied() && slot_ids.iter().any(|id| *id == slot.id))
        .count();
    if matching == 0 {
        return Ok(RemovalOutcome { freed: 0 });
    }

    history.record(HistoryEntry::new(
        HistoryKind::Removal,
        room.id.clone(),
        current.clone(),
        pending.to_vec(),
        format!("Freed {} slot(s) in {}", matching, room.name),
    ));

    let mut next = current.as_ref().clone();
    for slot in next.iter_mut() {
        if slot.is_occupied() && slot_ids.iter().any(|id| *id == slot.id) {
            slot.clear();
        }
    }
    store.set(&room.id, next)?;

    Ok(RemovalOutcome { freed: matching })
}

/// Frees every occupied slot of a room.
///
/// Clearing an already-empty room is an informational no-op: success with
/// count 0, no snapshot taken, no history entry recorded.
pub fn clear_room(
    store: &mut SlotStore,
    history: &mut HistoryManager,
    pending: &[PendingItem],
    room: &Room,
) -> Result<RemovalOutcome, StoreError> {
    let current = store.get(&room.id)?;

    let occupied = count_occupied(&current);
    if occupied == 0 {
        return Ok(RemovalOutcome { freed: 0 });
    }

    history.record(HistoryEntry::new(
        HistoryKind::Removal,
        room.id.clone(),
        current.clone(),
        pending.to_vec(),
        format!("Cleared {} slot(s) in {}", occupied, room.name),
    ));

    let mut next = current.as_ref().clone();
    for slot in next.iter_mut() {
        slot.clear();
    }
    store.set(&room.id, next)?;

    Ok(RemovalOutcome { freed: occupied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Occupant;
    use crate::store::{RoomRegistry, count_empty};
    use crate::types::GridDimensioned;
    use chrono::Utc;

    fn setup() -> (RoomRegistry, SlotStore, HistoryManager) {
        let registry = RoomRegistry::new(vec![Room::new("Godown A", "GA", 3, 3).unwrap()]).unwrap();
        let store = SlotStore::from_registry(&registry);
        (registry, store, HistoryManager::with_default_depth())
    }

    fn occupy(store: &mut SlotStore, room_id: &str, indices: &[usize]) {
        let mut slots = store.get(room_id).unwrap().as_ref().clone();
        for &index in indices {
            slots[index].occupy(Occupant {
                content_id: "itm-1".to_string(),
                label: "MSP".to_string(),
                source_ref: "GC-1042".to_string(),
                contents: "Machine spares".to_string(),
                packing: "Wooden crate".to_string(),
                allocated_at: Utc::now(),
            });
        }
        store.set(room_id, slots).unwrap();
    }

    #[test]
    fn remove_slot_frees_an_occupied_slot() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();
        occupy(&mut store, "ga", &[0]);

        let outcome = remove_slot(&mut store, &mut history, &[], &room, "GA-R01-C01").unwrap();

        assert_eq!(outcome.freed, 1);
        assert!(!outcome.is_noop());
        assert_eq!(history.len(), 1);
        let slots = store.get("ga").unwrap();
        assert!(slots[0].is_empty());
        assert_eq!(count_empty(&slots), room.capacity());
    }

    #[test]
    fn remove_slot_on_empty_slot_is_a_noop_without_history() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();

        let outcome = remove_slot(&mut store, &mut history, &[], &room, "GA-R01-C01").unwrap();

        assert!(outcome.is_noop());
        assert!(history.is_empty());
    }

    #[test]
    fn remove_slots_takes_one_snapshot_for_the_whole_batch() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();
        occupy(&mut store, "ga", &[0, 1, 4]);

        let ids = vec![
            "GA-R01-C01".to_string(),
            "GA-R01-C02".to_string(),
            "GA-R02-C02".to_string(),
            "GA-R03-C03".to_string(), // empty, ignored
            "GB-R01-C01".to_string(), // foreign, ignored
        ];
        let outcome = remove_slots(&mut store, &mut history, &[], &room, &ids).unwrap();

        assert_eq!(outcome.freed, 3);
        assert_eq!(history.len(), 1, "batch must record exactly one snapshot");
        assert_eq!(count_occupied(&store.get("ga").unwrap()), 0);
    }

    #[test]
    fn clear_room_reports_the_freed_count() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();
        occupy(&mut store, "ga", &[0, 2, 5, 8]);

        let outcome = clear_room(&mut store, &mut history, &[], &room).unwrap();

        assert_eq!(outcome.freed, 4);
        assert_eq!(history.len(), 1);
        let slots = store.get("ga").unwrap();
        assert_eq!(count_empty(&slots), room.capacity());
    }

    #[test]
    fn clearing_an_empty_room_twice_is_informational() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();
        occupy(&mut store, "ga", &[0]);

        let first = clear_room(&mut store, &mut history, &[], &room).unwrap();
        assert_eq!(first.freed, 1);
        assert_eq!(history.len(), 1);

        let second = clear_room(&mut store, &mut history, &[], &room).unwrap();
        assert!(second.is_noop());
        assert_eq!(history.len(), 1, "no-op must not add a history entry");
    }

    #[test]
    fn snapshot_preserves_the_pre_removal_state() {
        let (registry, mut store, mut history) = setup();
        let room = registry.get("ga").unwrap().clone();
        occupy(&mut store, "ga", &[0, 1]);

        clear_room(&mut store, &mut history, &[], &room).unwrap();

        let entry = history.pop_latest().unwrap();
        assert_eq!(entry.kind, HistoryKind::Removal);
        assert_eq!(count_occupied(&entry.slots), 2);
    }
}
