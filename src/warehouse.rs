//! Warehouse facade: the explicit state handle for all slot operations.
//!
//! Owns the room catalog, the slot store, the undo history, the pending-item
//! list and the active consignment reference. Every presentation layer
//! (pointer drag, click, CLI command, API call) goes through the same
//! operations here; the facade never assumes a specific input modality.
//!
//! All capacity and existence checks are pre-flight: a failing operation
//! performs zero mutation and the slot arrays are never observable in a
//! partially updated state.

use std::collections::HashSet;
use std::sync::Arc;

use crate::advisor::{self, CapacityAdvice};
use crate::allocator::{self, AllocEvent, AllocationError, AllocationReport, FillMode};
use crate::history::HistoryManager;
use crate::model::{HistoryEntry, HistoryKind, PendingItem, Room, Slot};
use crate::removal::{self, RemovalOutcome};
use crate::search::search_slots;
use crate::store::{RoomRegistry, SlotStore, StoreError, count_empty, count_occupied};
use crate::types::{GridDimensioned, parse_slot_id};
use serde::Serialize;
use utoipa::ToSchema;

/// Operation errors of the warehouse facade.
///
/// `UnknownRoom` is a caller/configuration bug and not recoverable at
/// runtime; everything else is reported to the operator with the concrete
/// values involved so they can decide the next step.
#[derive(Debug, Clone)]
pub enum WarehouseError {
    UnknownRoom(String),
    InvalidSlotId(String),
    NoPendingItems,
    UnknownItem(String),
    DuplicateItem(String),
    Capacity { needed: usize, available: usize },
}

impl WarehouseError {
    /// Stable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            WarehouseError::UnknownRoom(_) => "unknown_room",
            WarehouseError::InvalidSlotId(_) => "invalid_slot_id",
            WarehouseError::NoPendingItems => "no_pending_items",
            WarehouseError::UnknownItem(_) => "unknown_item",
            WarehouseError::DuplicateItem(_) => "duplicate_item",
            WarehouseError::Capacity { .. } => "capacity_shortfall",
        }
    }
}

impl std::fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseError::UnknownRoom(id) => {
                write!(f, "Unknown room '{}' (configuration bug)", id)
            }
            WarehouseError::InvalidSlotId(id) => write!(f, "Invalid slot id '{}'", id),
            WarehouseError::NoPendingItems => write!(f, "No pending items loaded"),
            WarehouseError::UnknownItem(id) => write!(f, "Unknown pending item '{}'", id),
            WarehouseError::DuplicateItem(id) => {
                write!(f, "Pending item '{}' listed more than once", id)
            }
            WarehouseError::Capacity { needed, available } => {
                write!(f, "Need {} slot(s), only {} free", needed, available)
            }
        }
    }
}

impl std::error::Error for WarehouseError {}

impl From<StoreError> for WarehouseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownRoom(id) => WarehouseError::UnknownRoom(id),
        }
    }
}

/// Per-room capacity summary for presentation layers.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct RoomOverview {
    pub id: String,
    pub name: String,
    pub short_code: String,
    pub rows: usize,
    pub cols: usize,
    pub capacity: usize,
    pub free: usize,
    pub occupied: usize,
}

/// Result of an undo call.
#[derive(Clone, Debug)]
pub enum UndoOutcome {
    /// The most recent mutation was rolled back.
    Undone {
        kind: HistoryKind,
        room_id: String,
        description: String,
    },
    /// The history stack was empty (informational, not an error).
    NothingToUndo,
}

/// The warehouse state handle.
pub struct Warehouse {
    registry: RoomRegistry,
    store: SlotStore,
    history: HistoryManager,
    pending: Vec<PendingItem>,
    consignment: Option<String>,
}

impl Warehouse {
    /// Creates a warehouse with freshly initialized slot arrays.
    ///
    /// State is rebuilt from the registry on every process start; there is
    /// deliberately no persistence across restarts.
    pub fn new(registry: RoomRegistry, history_depth: usize) -> Self {
        let store = SlotStore::from_registry(&registry);
        Self {
            registry,
            store,
            history: HistoryManager::new(history_depth),
            pending: Vec::new(),
            consignment: None,
        }
    }

    /// The configured room catalog.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Current pending items awaiting storage assignment.
    pub fn pending(&self) -> &[PendingItem] {
        &self.pending
    }

    /// The consignment reference the pending items belong to.
    pub fn consignment(&self) -> Option<&str> {
        self.consignment.as_deref()
    }

    /// Number of undoable history entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Current slot array of a room.
    pub fn room_slots(&self, room_id: &str) -> Result<Arc<Vec<Slot>>, WarehouseError> {
        Ok(self.store.get(room_id)?)
    }

    /// Capacity summary of every configured room.
    pub fn room_overview(&self) -> Result<Vec<RoomOverview>, WarehouseError> {
        self.registry
            .iter()
            .map(|room| {
                let slots = self.store.get(&room.id)?;
                let free = count_empty(&slots);
                Ok(RoomOverview {
                    id: room.id.clone(),
                    name: room.name.clone(),
                    short_code: room.short_code.clone(),
                    rows: room.rows,
                    cols: room.cols,
                    capacity: room.capacity(),
                    free,
                    occupied: count_occupied(&slots),
                })
            })
            .collect()
    }

    /// Replaces the pending list with the items of a consignment.
    ///
    /// The items arrive from an external data-fetch collaborator; the core
    /// treats them as an opaque list and never fetches them itself.
    pub fn load_pending(&mut self, consignment: impl Into<String>, items: Vec<PendingItem>) {
        self.consignment = Some(consignment.into());
        self.pending = items;
    }

    /// Allocates pending items starting at a target slot.
    ///
    /// See `request_allocation_with_progress`.
    pub fn request_allocation(
        &mut self,
        target_slot_id: &str,
        mode: FillMode,
        item_ids: Option<&[String]>,
    ) -> Result<AllocationReport, WarehouseError> {
        self.request_allocation_with_progress(target_slot_id, mode, item_ids, |_| {})
    }

    /// Allocates pending items starting at a target slot, emitting progress
    /// events.
    ///
    /// `item_ids` selects a subset of the pending list (in the given order);
    /// `None` allocates every pending item. The commit is atomic at room
    /// level: on a capacity shortfall nothing is mutated, no history entry
    /// is recorded, and the error carries needed vs. available. On success
    /// the pre-mutation snapshot is recorded, the room's slot array is
    /// swapped, and the stored items leave the pending list.
    pub fn request_allocation_with_progress(
        &mut self,
        target_slot_id: &str,
        mode: FillMode,
        item_ids: Option<&[String]>,
        on_event: impl FnMut(&AllocEvent),
    ) -> Result<AllocationReport, WarehouseError> {
        if self.pending.is_empty() {
            return Err(WarehouseError::NoPendingItems);
        }

        let (short_code, start) = parse_slot_id(target_slot_id)
            .ok_or_else(|| WarehouseError::InvalidSlotId(target_slot_id.to_string()))?;
        let room = self
            .registry
            .by_short_code(short_code)
            .ok_or_else(|| WarehouseError::UnknownRoom(short_code.to_string()))?
            .clone();

        let items = self.select_items(item_ids)?;
        let slots = self.store.get(&room.id)?;
        let source_ref = self.consignment.clone().unwrap_or_default();

        let (next, report) = allocator::allocate_items_with_progress(
            &room, &slots, &items, &source_ref, start, mode, on_event,
        )
        .map_err(|err| match err {
            AllocationError::Shortfall { needed, available } => {
                WarehouseError::Capacity { needed, available }
            }
            AllocationError::StartOutsideRoom(_) => {
                WarehouseError::InvalidSlotId(target_slot_id.to_string())
            }
        })?;

        self.history.record(HistoryEntry::new(
            HistoryKind::Allocation,
            room.id.clone(),
            slots,
            self.pending.clone(),
            format!(
                "Stored {} unit(s) in {} starting at {}",
                report.allocated, room.name, target_slot_id
            ),
        ));
        self.store.set(&room.id, next)?;
        self.pending
            .retain(|pending| !items.iter().any(|item| item.id == pending.id));

        Ok(report)
    }

    /// Capacity advice for storing `needed` units in a room.
    pub fn advise(&self, room_id: &str, needed: usize) -> Result<CapacityAdvice, WarehouseError> {
        Ok(advisor::advise(&self.registry, &self.store, room_id, needed)?)
    }

    /// Frees a single slot (no-op if it is not occupied).
    pub fn remove_slot(&mut self, slot_id: &str) -> Result<RemovalOutcome, WarehouseError> {
        let room = self.room_of_slot(slot_id)?;
        Ok(removal::remove_slot(
            &mut self.store,
            &mut self.history,
            &self.pending,
            &room,
            slot_id,
        )?)
    }

    /// Frees a batch of slots with a single history snapshot.
    ///
    /// All ids must address the room of the first id; ids of other rooms or
    /// of empty slots are ignored. An empty batch is a no-op.
    pub fn remove_slots(&mut self, slot_ids: &[String]) -> Result<RemovalOutcome, WarehouseError> {
        let Some(first) = slot_ids.first() else {
            return Ok(RemovalOutcome { freed: 0 });
        };
        let room = self.room_of_slot(first)?;
        Ok(removal::remove_slots(
            &mut self.store,
            &mut self.history,
            &self.pending,
            &room,
            slot_ids,
        )?)
    }

    /// Frees every occupied slot of a room (informational no-op when the
    /// room is already empty).
    pub fn clear_room(&mut self, room_id: &str) -> Result<RemovalOutcome, WarehouseError> {
        let room = self.registry.get(room_id)?.clone();
        Ok(removal::clear_room(
            &mut self.store,
            &mut self.history,
            &self.pending,
            &room,
        )?)
    }

    /// Rolls back the most recent mutation by wholesale-restoring its
    /// snapshot (slot array and pending list).
    pub fn undo(&mut self) -> Result<UndoOutcome, WarehouseError> {
        let Some(entry) = self.history.pop_latest() else {
            return Ok(UndoOutcome::NothingToUndo);
        };

        self.store.restore(&entry.room_id, entry.slots)?;
        self.pending = entry.pending;

        Ok(UndoOutcome::Undone {
            kind: entry.kind,
            room_id: entry.room_id,
            description: entry.description,
        })
    }

    /// Searches occupied slots, either in one room or across all rooms.
    pub fn search(
        &self,
        query: &str,
        room_id: Option<&str>,
    ) -> Result<HashSet<String>, WarehouseError> {
        match room_id {
            Some(room_id) => {
                let slots = self.store.get(room_id)?;
                Ok(search_slots(query, &slots))
            }
            None => {
                let mut hits = HashSet::new();
                for room in self.registry.iter() {
                    let slots = self.store.get(&room.id)?;
                    hits.extend(search_slots(query, &slots));
                }
                Ok(hits)
            }
        }
    }

    /// Resolves the owning room of a slot id.
    fn room_of_slot(&self, slot_id: &str) -> Result<Room, WarehouseError> {
        let (short_code, _) = parse_slot_id(slot_id)
            .ok_or_else(|| WarehouseError::InvalidSlotId(slot_id.to_string()))?;
        self.registry
            .by_short_code(short_code)
            .cloned()
            .ok_or_else(|| WarehouseError::UnknownRoom(short_code.to_string()))
    }

    /// Picks the pending items addressed by `item_ids` (all when `None`).
    fn select_items(
        &self,
        item_ids: Option<&[String]>,
    ) -> Result<Vec<PendingItem>, WarehouseError> {
        match item_ids {
            None => Ok(self.pending.clone()),
            Some(ids) => {
                let mut seen = HashSet::new();
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    if !seen.insert(id.as_str()) {
                        return Err(WarehouseError::DuplicateItem(id.clone()));
                    }
                    let item = self
                        .pending
                        .iter()
                        .find(|item| item.id == *id)
                        .ok_or_else(|| WarehouseError::UnknownItem(id.clone()))?;
                    selected.push(item.clone());
                }
                Ok(selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DEFAULT_HISTORY_DEPTH;

    fn warehouse() -> Warehouse {
        let registry = RoomRegistry::new(vec![
            Room::new("Godown A", "GA", 10, 10).unwrap(),
            Room::new("Godown B", "GB", 8, 12).unwrap(),
        ])
        .unwrap();
        Warehouse::new(registry, DEFAULT_HISTORY_DEPTH)
    }

    fn item(id: &str, quantity: usize, prefix: Option<&str>) -> PendingItem {
        PendingItem::new(
            id,
            quantity,
            "Machine spares",
            "Wooden crate",
            prefix.map(str::to_string),
            12.0,
        )
        .unwrap()
    }

    fn free_in(warehouse: &Warehouse, room_id: &str) -> usize {
        count_empty(&warehouse.room_slots(room_id).unwrap())
    }

    #[test]
    fn allocating_and_undoing_restores_the_full_room() {
        // Room A is 10×10; 5 units stored horizontally from R01-C01 occupy
        // R01-C01..C05, then a single undo empties the room again.
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1042", vec![item("itm-1", 5, Some("MSP"))]);

        let report = warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();
        assert_eq!(report.allocated, 5);
        assert_eq!(
            report.filled,
            vec!["GA-R01-C01", "GA-R01-C02", "GA-R01-C03", "GA-R01-C04", "GA-R01-C05"]
        );
        assert_eq!(free_in(&warehouse, "ga"), 95);
        assert!(warehouse.pending().is_empty());

        let outcome = warehouse.undo().unwrap();
        assert!(matches!(outcome, UndoOutcome::Undone { .. }));
        assert_eq!(free_in(&warehouse, "ga"), 100);
        assert_eq!(warehouse.pending().len(), 1);
        assert_eq!(warehouse.pending()[0].id, "itm-1");
    }

    #[test]
    fn capacity_failure_leaves_everything_untouched() {
        // Fill Godown A down to 3 free slots, then request 5.
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1000", vec![item("filler", 97, None)]);
        warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();

        warehouse.load_pending("GC-1042", vec![item("itm-1", 5, None)]);
        let before = warehouse.room_slots("ga").unwrap();
        let history_before = warehouse.history_len();

        let result = warehouse.request_allocation("GA-R01-C01", FillMode::Horizontal, None);
        match result {
            Err(WarehouseError::Capacity { needed, available }) => {
                assert_eq!(needed, 5);
                assert_eq!(available, 3);
            }
            other => panic!("expected Capacity error, got {:?}", other),
        }

        assert_eq!(*warehouse.room_slots("ga").unwrap(), *before);
        assert_eq!(warehouse.history_len(), history_before);
        assert_eq!(warehouse.pending().len(), 1);
    }

    #[test]
    fn selected_items_leave_the_pending_list_others_stay() {
        let mut warehouse = warehouse();
        warehouse.load_pending(
            "GC-1042",
            vec![item("itm-1", 2, None), item("itm-2", 3, None)],
        );

        let ids = vec!["itm-2".to_string()];
        let report = warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, Some(&ids))
            .unwrap();

        assert_eq!(report.allocated, 3);
        assert_eq!(warehouse.pending().len(), 1);
        assert_eq!(warehouse.pending()[0].id, "itm-1");

        let slots = warehouse.room_slots("ga").unwrap();
        assert_eq!(slots[0].occupant.as_ref().unwrap().content_id, "itm-2");
        assert_eq!(slots[0].occupant.as_ref().unwrap().source_ref, "GC-1042");
    }

    #[test]
    fn allocation_requires_pending_items_and_known_references() {
        let mut warehouse = warehouse();
        assert!(matches!(
            warehouse.request_allocation("GA-R01-C01", FillMode::Horizontal, None),
            Err(WarehouseError::NoPendingItems)
        ));

        warehouse.load_pending("GC-1042", vec![item("itm-1", 1, None)]);
        assert!(matches!(
            warehouse.request_allocation("bogus", FillMode::Horizontal, None),
            Err(WarehouseError::InvalidSlotId(_))
        ));
        assert!(matches!(
            warehouse.request_allocation("GX-R01-C01", FillMode::Horizontal, None),
            Err(WarehouseError::UnknownRoom(_))
        ));
        assert!(matches!(
            warehouse.request_allocation("GA-R11-C01", FillMode::Horizontal, None),
            Err(WarehouseError::InvalidSlotId(_))
        ));

        let unknown = vec!["itm-9".to_string()];
        assert!(matches!(
            warehouse.request_allocation("GA-R01-C01", FillMode::Horizontal, Some(&unknown)),
            Err(WarehouseError::UnknownItem(_))
        ));

        let duplicated = vec!["itm-1".to_string(), "itm-1".to_string()];
        assert!(matches!(
            warehouse.request_allocation("GA-R01-C01", FillMode::Horizontal, Some(&duplicated)),
            Err(WarehouseError::DuplicateItem(_))
        ));
    }

    #[test]
    fn undo_on_empty_history_is_informational() {
        let mut warehouse = warehouse();
        assert!(matches!(
            warehouse.undo().unwrap(),
            UndoOutcome::NothingToUndo
        ));
    }

    #[test]
    fn undo_rolls_back_removals_too() {
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1042", vec![item("itm-1", 4, None)]);
        warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();

        let outcome = warehouse.remove_slot("GA-R01-C02").unwrap();
        assert_eq!(outcome.freed, 1);
        assert_eq!(free_in(&warehouse, "ga"), 97);

        let undone = warehouse.undo().unwrap();
        match undone {
            UndoOutcome::Undone { kind, room_id, .. } => {
                assert_eq!(kind, HistoryKind::Removal);
                assert_eq!(room_id, "ga");
            }
            other => panic!("expected Undone, got {:?}", other),
        }
        assert_eq!(free_in(&warehouse, "ga"), 96);
    }

    #[test]
    fn clear_room_round_trip_with_noop_repeat() {
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1042", vec![item("itm-1", 6, None)]);
        warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();

        let cleared = warehouse.clear_room("ga").unwrap();
        assert_eq!(cleared.freed, 6);
        assert_eq!(free_in(&warehouse, "ga"), 100);

        let history_len = warehouse.history_len();
        let repeat = warehouse.clear_room("ga").unwrap();
        assert!(repeat.is_noop());
        assert_eq!(warehouse.history_len(), history_len);
    }

    #[test]
    fn room_overview_reports_capacity_conservation() {
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1042", vec![item("itm-1", 7, None)]);
        warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();

        let overview = warehouse.room_overview().unwrap();
        let godown_a = overview.iter().find(|room| room.id == "ga").unwrap();
        assert_eq!(godown_a.capacity, 100);
        assert_eq!(godown_a.free + godown_a.occupied, godown_a.capacity);
        assert_eq!(godown_a.occupied, 7);

        let godown_b = overview.iter().find(|room| room.id == "gb").unwrap();
        assert_eq!(godown_b.free, 96);
    }

    #[test]
    fn search_spans_all_rooms_unless_scoped() {
        let mut warehouse = warehouse();
        warehouse.load_pending("GC-1042", vec![item("itm-1", 2, Some("MSP"))]);
        warehouse
            .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
            .unwrap();
        warehouse.load_pending("GC-1042", vec![item("itm-2", 1, Some("MSP"))]);
        warehouse
            .request_allocation("GB-R01-C01", FillMode::Horizontal, None)
            .unwrap();

        assert_eq!(warehouse.search("msp", None).unwrap().len(), 3);
        assert_eq!(warehouse.search("msp", Some("gb")).unwrap().len(), 1);
        assert!(warehouse.search("", None).unwrap().is_empty());
    }

    #[test]
    fn advise_prefers_the_current_room() {
        let warehouse = warehouse();
        let advice = warehouse.advise("ga", 10).unwrap();
        assert!(matches!(advice, CapacityAdvice::CurrentRoom { .. }));
    }

    #[test]
    fn history_bound_evicts_oldest_allocations() {
        let mut warehouse = warehouse();
        for i in 0..12 {
            warehouse.load_pending("GC-1042", vec![item(&format!("itm-{}", i), 1, None)]);
            warehouse
                .request_allocation("GA-R01-C01", FillMode::Horizontal, None)
                .unwrap();
        }
        assert_eq!(warehouse.history_len(), DEFAULT_HISTORY_DEPTH);
    }
}
