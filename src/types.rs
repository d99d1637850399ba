//! Common types and traits for warehouse grid addressing.
//!
//! This module defines reusable types and trait abstractions
//! that promote DRY principles and OOP design patterns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fallback display label for stored units whose pending item has no prefix.
pub const FALLBACK_LABEL: &str = "PKG";

/// Maximum rows or columns a room grid may have.
///
/// Slot ids encode row and column as two-digit numbers, so grids are capped
/// at 99×99 to keep ids fixed-width and globally unique.
pub const MAX_GRID_EXTENT: usize = 99;

/// A 1-based position in a room grid.
///
/// Used for slot addressing and fill-order calculations.
///
/// # Examples
/// ```
/// use stow_it_now::types::GridPos;
///
/// let pos = GridPos::new(1, 5);
/// assert_eq!(pos.to_index(10), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    /// Creates a new grid position.
    ///
    /// # Parameters
    /// * `row` - Row number (1-based)
    /// * `col` - Column number (1-based)
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Converts the position to a row-major array index.
    ///
    /// # Parameters
    /// * `cols` - Column count of the grid
    #[inline]
    pub const fn to_index(&self, cols: usize) -> usize {
        (self.row - 1) * cols + (self.col - 1)
    }

    /// Creates a position from a row-major array index.
    ///
    /// # Parameters
    /// * `index` - Array index (0-based)
    /// * `cols` - Column count of the grid
    #[inline]
    pub const fn from_index(index: usize, cols: usize) -> Self {
        Self::new(index / cols + 1, index % cols + 1)
    }

    /// Checks that row and column are 1-based and within the grid cap.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (1..=MAX_GRID_EXTENT).contains(&self.row) && (1..=MAX_GRID_EXTENT).contains(&self.col)
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{:02}-C{:02}", self.row, self.col)
    }
}

/// Builds the globally unique slot id for a position in a room.
///
/// Ids have the form `{shortCode}-R{row:02}-C{col:02}`, e.g. `GA-R01-C05`.
///
/// # Parameters
/// * `short_code` - Short code of the room
/// * `pos` - Position within the room grid
#[inline]
pub fn format_slot_id(short_code: &str, pos: GridPos) -> String {
    format!("{}-{}", short_code, pos)
}

/// Parses a slot id back into its room short code and grid position.
///
/// # Parameters
/// * `id` - Slot id of the form `{shortCode}-R{row:02}-C{col:02}`
///
/// # Returns
/// `Some((short_code, position))` for well-formed ids, otherwise `None`
pub fn parse_slot_id(id: &str) -> Option<(&str, GridPos)> {
    let mut parts = id.rsplitn(3, '-');
    let col_part = parts.next()?;
    let row_part = parts.next()?;
    let short_code = parts.next()?;

    if short_code.is_empty() {
        return None;
    }

    let row = parse_axis(row_part, 'R')?;
    let col = parse_axis(col_part, 'C')?;
    let pos = GridPos::new(row, col);
    if !pos.is_valid() {
        return None;
    }
    Some((short_code, pos))
}

/// Parses one `R05` / `C07` axis segment of a slot id.
fn parse_axis(part: &str, prefix: char) -> Option<usize> {
    let digits = part.strip_prefix(prefix)?;
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: usize = digits.parse().ok()?;
    if value == 0 { None } else { Some(value) }
}

/// Trait for objects laid out as a rectangular grid.
///
/// Provides a common interface for capacity math.
/// Follows the Interface Segregation Principle (ISP).
pub trait GridDimensioned {
    /// Returns the row count of the grid.
    fn rows(&self) -> usize;

    /// Returns the column count of the grid.
    fn cols(&self) -> usize;

    /// Total slot capacity, derived from the grid dimensions.
    fn capacity(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Checks whether a position lies inside the grid.
    fn contains(&self, pos: GridPos) -> bool {
        (1..=self.rows()).contains(&pos.row) && (1..=self.cols()).contains(&pos.col)
    }
}
