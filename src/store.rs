//! Room catalog and slot storage.
//!
//! The room→slots mapping lives in an explicit store object; callers hold a
//! handle to it instead of reaching into presentation-layer state. Mutations
//! replace a room's whole slot array (copy-on-write `Arc` swap), so a reader
//! holding the previous array always observes a complete pre-mutation state,
//! never a partially updated one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Room, Slot, ValidationError};
use crate::types::{GridDimensioned, GridPos};

/// Error for room lookups that cannot be recovered at runtime.
///
/// An unknown room id is a caller or configuration bug, not an operator
/// mistake; it is surfaced as a hard failure.
#[derive(Debug, Clone)]
pub enum StoreError {
    UnknownRoom(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownRoom(id) => {
                write!(f, "Unknown room id '{}' (configuration bug)", id)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only catalog of the configured rooms.
///
/// Built once at startup from static configuration; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
}

impl RoomRegistry {
    /// Creates a registry from a room list, validating id uniqueness.
    ///
    /// Duplicate short codes would break the global uniqueness of slot ids,
    /// so they are rejected as a configuration error.
    pub fn new(rooms: Vec<Room>) -> Result<Self, ValidationError> {
        if rooms.is_empty() {
            return Err(ValidationError::InvalidConfiguration(
                "At least one room must be configured".to_string(),
            ));
        }
        for (i, room) in rooms.iter().enumerate() {
            if rooms[..i].iter().any(|other| other.id == room.id) {
                return Err(ValidationError::InvalidConfiguration(format!(
                    "Duplicate room short code: {}",
                    room.short_code
                )));
            }
        }
        Ok(Self { rooms })
    }

    /// Looks up a room by its id.
    ///
    /// # Returns
    /// `Err(StoreError::UnknownRoom)` when no room carries the id.
    pub fn get(&self, room_id: &str) -> Result<&Room, StoreError> {
        self.rooms
            .iter()
            .find(|room| room.id == room_id)
            .ok_or_else(|| StoreError::UnknownRoom(room_id.to_string()))
    }

    /// Looks up a room by its slot-id short code.
    pub fn by_short_code(&self, short_code: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.short_code == short_code)
    }

    /// Iterates all rooms in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// Number of configured rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the registry is empty (never true for a validated registry).
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Owner of every room's slot array.
///
/// Slot arrays are created once per room (all empty, row-major order) and
/// replaced wholesale on each mutation.
#[derive(Clone, Debug, Default)]
pub struct SlotStore {
    slots: HashMap<String, Arc<Vec<Slot>>>,
}

impl SlotStore {
    /// Creates a store with one freshly initialized slot array per room.
    pub fn from_registry(registry: &RoomRegistry) -> Self {
        let mut store = Self::default();
        for room in registry.iter() {
            store
                .slots
                .insert(room.id.clone(), Arc::new(Self::initialize(room)));
        }
        store
    }

    /// Produces `rows × cols` empty slots in row-major order.
    pub fn initialize(room: &Room) -> Vec<Slot> {
        (0..room.capacity())
            .map(|index| Slot::empty(room, GridPos::from_index(index, room.cols)))
            .collect()
    }

    /// Reads the current slot array of a room.
    ///
    /// The returned `Arc` stays valid (and unchanged) across later mutations.
    pub fn get(&self, room_id: &str) -> Result<Arc<Vec<Slot>>, StoreError> {
        self.slots
            .get(room_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownRoom(room_id.to_string()))
    }

    /// Replaces a room's slot array with a freshly built one.
    pub fn set(&mut self, room_id: &str, slots: Vec<Slot>) -> Result<(), StoreError> {
        self.restore(room_id, Arc::new(slots))
    }

    /// Replaces a room's slot array with an existing snapshot.
    ///
    /// Used by undo, which restores the exact pre-mutation array.
    pub fn restore(&mut self, room_id: &str, slots: Arc<Vec<Slot>>) -> Result<(), StoreError> {
        match self.slots.get_mut(room_id) {
            Some(current) => {
                *current = slots;
                Ok(())
            }
            None => Err(StoreError::UnknownRoom(room_id.to_string())),
        }
    }
}

/// Counts the empty slots of a slot array.
pub fn count_empty(slots: &[Slot]) -> usize {
    slots.iter().filter(|slot| slot.is_empty()).count()
}

/// Counts the occupied slots of a slot array.
pub fn count_occupied(slots: &[Slot]) -> usize {
    slots.iter().filter(|slot| slot.is_occupied()).count()
}

/// Returns the first empty slot of a slot array in row-major order.
pub fn first_empty(slots: &[Slot]) -> Option<&Slot> {
    slots.iter().find(|slot| slot.is_empty())
}
