//! Data models for the warehouse slot allocation core.
//!
//! This module defines the fundamental data structures for grid-based storage:
//! - `Room`: A named grid of storage slots with fixed dimensions
//! - `Slot`: A single storage position, empty or occupied
//! - `PendingItem`: A cargo unit awaiting physical storage assignment
//! - `HistoryEntry`: A full pre-mutation snapshot for undo
//!
//! All structures implement the traits from the `types` module for OOP compliance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{FALLBACK_LABEL, GridDimensioned, GridPos, MAX_GRID_EXTENT, format_slot_id};

/// Validation error for warehouse master data.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidQuantity(String),
    InvalidConfiguration(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidQuantity(msg) => write!(f, "Invalid quantity: {}", msg),
            ValidationError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Helper function to validate a grid extent (DRY principle).
fn validate_extent(value: usize, name: &str) -> Result<(), ValidationError> {
    if !(1..=MAX_GRID_EXTENT).contains(&value) {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be between 1 and {}, got: {}",
            name, MAX_GRID_EXTENT, value
        )));
    }
    Ok(())
}

/// Helper function to validate a room short code (DRY principle).
fn validate_short_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::InvalidConfiguration(
            "Room short code must not be empty".to_string(),
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidConfiguration(format!(
            "Room short code may only contain letters, digits and '-', got: {}",
            code
        )));
    }
    Ok(())
}

/// Helper function to validate a required quantity (DRY principle).
fn validate_quantity(value: usize) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidQuantity(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// A storage room: a named grid of slots with fixed row/column dimensions.
///
/// Capacity is derived from the dimensions and immutable for the life of the
/// process.
///
/// # Fields
/// * `id` - Stable room id (lowercased short code)
/// * `name` - Display name of the room
/// * `short_code` - Short code used as the slot-id prefix
/// * `rows` - Row count of the grid
/// * `cols` - Column count of the grid
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub short_code: String,
    pub rows: usize,
    pub cols: usize,
}

impl Room {
    /// Creates a new Room with validation.
    ///
    /// The room id is derived from the short code.
    ///
    /// # Parameters
    /// * `name` - Display name
    /// * `short_code` - Slot-id prefix, e.g. `GA`
    /// * `rows` - Row count (1 to 99)
    /// * `cols` - Column count (1 to 99)
    ///
    /// # Returns
    /// `Ok(Room)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        name: impl Into<String>,
        short_code: impl Into<String>,
        rows: usize,
        cols: usize,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let short_code = short_code.into();

        if name.trim().is_empty() {
            return Err(ValidationError::InvalidConfiguration(
                "Room name must not be empty".to_string(),
            ));
        }
        validate_short_code(&short_code)?;
        validate_extent(rows, "Row count")?;
        validate_extent(cols, "Column count")?;

        Ok(Self {
            id: short_code.to_ascii_lowercase(),
            name,
            short_code,
            rows,
            cols,
        })
    }

    /// Builds the slot id for a position in this room.
    #[inline]
    pub fn slot_id(&self, pos: GridPos) -> String {
        format_slot_id(&self.short_code, pos)
    }
}

/// Implementation of the GridDimensioned trait for Room.
impl GridDimensioned for Room {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }
}

/// Status of a single slot.
///
/// The only transitions are `empty → occupied` (allocation) and
/// `occupied → empty` (removal); no other states exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Empty,
    Occupied,
}

/// Metadata attached to an occupied slot identifying what is stored there.
///
/// # Fields
/// * `content_id` - Id of the pending item the unit came from
/// * `label` - Display label (item prefix or a generic placeholder)
/// * `source_ref` - Source reference, e.g. the consignment id
/// * `contents` - Contents description
/// * `packing` - Packing type
/// * `allocated_at` - Time the unit was stored
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Occupant {
    pub content_id: String,
    pub label: String,
    pub source_ref: String,
    pub contents: String,
    pub packing: String,
    pub allocated_at: DateTime<Utc>,
}

/// A single storage position in a room grid.
///
/// Occupant data exists exactly when the slot is occupied; an empty slot
/// carries none (mutual exclusion enforced by the type).
///
/// # Fields
/// * `id` - Globally unique slot id (`{shortCode}-R{row:02}-C{col:02}`)
/// * `room_id` - Id of the owning room
/// * `pos` - Position within the room grid
/// * `occupant` - Stored-unit metadata, `None` while the slot is empty
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub id: String,
    pub room_id: String,
    pub pos: GridPos,
    pub occupant: Option<Occupant>,
}

impl Slot {
    /// Creates a new empty slot for a position in a room.
    pub fn empty(room: &Room, pos: GridPos) -> Self {
        Self {
            id: room.slot_id(pos),
            room_id: room.id.clone(),
            pos,
            occupant: None,
        }
    }

    /// Returns the derived status of the slot.
    #[inline]
    pub fn status(&self) -> SlotStatus {
        if self.occupant.is_some() {
            SlotStatus::Occupied
        } else {
            SlotStatus::Empty
        }
    }

    /// Checks whether the slot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    /// Checks whether the slot is occupied.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Transition `empty → occupied`: attaches stored-unit metadata.
    #[inline]
    pub fn occupy(&mut self, occupant: Occupant) {
        self.occupant = Some(occupant);
    }

    /// Transition `occupied → empty`: clears all occupant fields.
    #[inline]
    pub fn clear(&mut self) {
        self.occupant = None;
    }
}

/// A cargo unit awaiting physical storage assignment.
///
/// `quantity` is the number of slots the item needs; `weight` is carried for
/// display only and takes no part in allocation math.
///
/// # Fields
/// * `id` - Unique item id within the pending list
/// * `quantity` - Required slot count
/// * `contents` - Contents description
/// * `packing` - Packing type
/// * `prefix` - Optional label prefix shown on occupied slots
/// * `weight` - Weight in kg (display-only)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "itm-1",
    "quantity": 5,
    "contents": "Machine spares",
    "packing": "Wooden crate",
    "prefix": "MSP",
    "weight": 48.5
}))]
pub struct PendingItem {
    pub id: String,
    pub quantity: usize,
    pub contents: String,
    pub packing: String,
    #[serde(default)]
    #[schema(nullable = true)]
    pub prefix: Option<String>,
    pub weight: f64,
}

impl PendingItem {
    /// Creates a new PendingItem with validation.
    ///
    /// # Returns
    /// `Ok(PendingItem)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        id: impl Into<String>,
        quantity: usize,
        contents: impl Into<String>,
        packing: impl Into<String>,
        prefix: Option<String>,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::InvalidConfiguration(
                "Pending item id must not be empty".to_string(),
            ));
        }
        validate_quantity(quantity)?;
        if weight < 0.0 || weight.is_nan() || weight.is_infinite() {
            return Err(ValidationError::InvalidQuantity(format!(
                "Weight must be a finite non-negative number, got: {}",
                weight
            )));
        }

        Ok(Self {
            id,
            quantity,
            contents: contents.into(),
            packing: packing.into(),
            prefix,
            weight,
        })
    }

    /// Display label for slots filled from this item.
    ///
    /// Falls back to a generic placeholder when no prefix is set.
    pub fn display_label(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.trim().is_empty() => prefix.to_string(),
            _ => FALLBACK_LABEL.to_string(),
        }
    }
}

/// Kind of mutating operation a history entry was taken before.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Allocation,
    Removal,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::Allocation => write!(f, "allocation"),
            HistoryKind::Removal => write!(f, "removal"),
        }
    }
}

/// A full pre-mutation snapshot used for undo.
///
/// Holds the affected room's complete slot array and the pending-items list
/// exactly as they were immediately before the mutating call. Restoring is a
/// wholesale replacement, never a field-level diff.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub room_id: String,
    pub slots: Arc<Vec<Slot>>,
    pub pending: Vec<PendingItem>,
    pub at: DateTime<Utc>,
    pub description: String,
}

impl HistoryEntry {
    /// Creates a snapshot entry stamped with the current time.
    ///
    /// # Parameters
    /// * `kind` - Operation kind the snapshot precedes
    /// * `room_id` - Id of the room about to be mutated
    /// * `slots` - The room's slot array before the mutation
    /// * `pending` - The pending-items list before the mutation
    /// * `description` - Human-readable description of the operation
    pub fn new(
        kind: HistoryKind,
        room_id: impl Into<String>,
        slots: Arc<Vec<Slot>>,
        pending: Vec<PendingItem>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            room_id: room_id.into(),
            slots,
            pending,
            at: Utc::now(),
            description: description.into(),
        }
    }
}
