//! Spreadsheet boundary: read-only snapshots and the collaborator seams.
//!
//! The core never talks to a live spreadsheet. A [`SnapshotReader`] hands
//! it the current cell values, the planner computes writes, and a
//! [`WriteApplier`] applies them — whether the backend is Google- or
//! Microsoft-flavored is the collaborator's business. [`MemorySheet`]
//! implements both seams for the test suite.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::columns;
use crate::planner::CellWrite;

/// Errors crossing the spreadsheet boundary.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// The backend rejected or failed an operation.
    #[error("sheet backend error: {0}")]
    Backend(String),

    /// A write carried a cell reference the backend cannot address.
    #[error("unaddressable cell reference: {0}")]
    BadReference(String),
}

/// Read-only grid of current cell values.
///
/// Row index 0 corresponds to spreadsheet row 1; rows may be ragged and a
/// missing cell reads as empty. A snapshot is a point-in-time copy: two
/// callers planning from the same stale snapshot will compute the same
/// next free row, so concurrent use of one target sheet must be serialized
/// by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    rows: Vec<Vec<String>>,
}

impl Snapshot {
    /// Wrap a grid of cell strings, row 0 == spreadsheet row 1.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows the snapshot covers, counting from spreadsheet row 1.
    pub fn row_count(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// Cell value at 1-based `(row, col)`, if the snapshot covers it.
    pub fn cell(&self, row: u32, col: u32) -> Option<&str> {
        let row_index = usize::try_from(row.checked_sub(1)?).ok()?;
        let col_index = usize::try_from(col.checked_sub(1)?).ok()?;
        self.rows.get(row_index)?.get(col_index).map(String::as_str)
    }

    /// True when the cell is empty or outside the snapshot.
    pub fn is_cell_empty(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).is_none_or(str::is_empty)
    }
}

/// Supplies the current cell values of the sheet backing a template.
///
/// Implemented by the concrete spreadsheet collaborator; the core only
/// consumes the snapshot.
pub trait SnapshotReader {
    /// Read a point-in-time snapshot of the sheet backing `template_name`.
    fn read_snapshot(&self, template_name: &str) -> Result<Snapshot, SheetError>;
}

/// Applies planned writes to a concrete sheet backend.
pub trait WriteApplier {
    /// Apply each write in order, failing on the first backend rejection.
    fn apply(&mut self, writes: &[CellWrite]) -> Result<(), SheetError>;
}

/// In-memory sheet backend for the test suite.
///
/// Stores single cells keyed by `(row, col)`; every planned write is a
/// single-cell range, so that is all [`WriteApplier::apply`] accepts.
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    cells: BTreeMap<(u32, u32), String>,
}

impl MemorySheet {
    /// Seed a sheet from an existing snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut sheet = Self::default();
        let mut row = 0u32;
        for cells in &snapshot.rows {
            row = row.saturating_add(1);
            let mut col = 0u32;
            for value in cells {
                col = col.saturating_add(1);
                if !value.is_empty() {
                    sheet.cells.insert((row, col), value.clone());
                }
            }
        }
        sheet
    }

    /// Value at a single-cell reference like `"A19"`, if set and non-empty.
    pub fn value(&self, reference: &str) -> Option<&str> {
        let (col, row) = columns::parse_cell(reference)?;
        self.cells
            .get(&(row, col))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Densify the stored cells into a [`Snapshot`] grid.
    pub fn to_snapshot(&self) -> Snapshot {
        let max_row = self.cells.keys().map(|&(row, _)| row).max().unwrap_or(0);
        let max_col = self.cells.keys().map(|&(_, col)| col).max().unwrap_or(0);
        let mut rows = Vec::new();
        for row in 1..=max_row {
            let mut cells = Vec::new();
            for col in 1..=max_col {
                cells.push(
                    self.cells
                        .get(&(row, col))
                        .cloned()
                        .unwrap_or_default(),
                );
            }
            rows.push(cells);
        }
        Snapshot::new(rows)
    }
}

impl SnapshotReader for MemorySheet {
    fn read_snapshot(&self, _template_name: &str) -> Result<Snapshot, SheetError> {
        Ok(self.to_snapshot())
    }
}

impl WriteApplier for MemorySheet {
    fn apply(&mut self, writes: &[CellWrite]) -> Result<(), SheetError> {
        for write in writes {
            let (col, row) = columns::parse_cell(&write.range)
                .ok_or_else(|| SheetError::BadReference(write.range.clone()))?;
            if write.value.is_empty() {
                self.cells.remove(&(row, col));
            } else {
                self.cells.insert((row, col), write.value.clone());
            }
        }
        Ok(())
    }
}
