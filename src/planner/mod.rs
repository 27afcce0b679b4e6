//! Layout routing and cell planning.
//!
//! Given a template name, a parsed [`FieldRecord`], and a [`Snapshot`] of
//! the sheet's current values, the planner decides which variant applies,
//! finds the next free row in the variant's band, and emits an ordered list
//! of single-cell writes. The computation is pure and synchronous; callers
//! sharing one target sheet must serialize around it, since two plans built
//! from the same stale snapshot land on the same row.

use serde::Serialize;
use tracing::debug;

use crate::layout::{
    columns, CellRange, ColumnPlan, LayoutError, TemplateRegistry, Variant,
};
use crate::record::{present, FieldRecord};
use crate::sheets::Snapshot;

// ---------------------------------------------------------------------------
// Policies and errors
// ---------------------------------------------------------------------------

/// What to do when a variant's row band has no free row left.
///
/// The original silently overwrote the last row; rejecting is now the
/// default, with the legacy behavior kept as an opt-in compatibility mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub enum OverflowPolicy {
    /// Fail with [`PlanError::CapacityExceeded`].
    #[default]
    #[serde(rename = "reject")]
    Reject,
    /// Overwrite the last row of the band (legacy, lossy).
    #[serde(rename = "clamp")]
    ClampToLast,
}

/// Planning failures.
///
/// Malformed input data never errors — unknown templates and variants fall
/// back softly. Only structural misconfiguration and band exhaustion (under
/// [`OverflowPolicy::Reject`]) surface here.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Registry or template misconfiguration.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Every row of the variant's band is occupied.
    #[error("row band {row_start}..={row_end} of template {template} ({variant}) is full")]
    CapacityExceeded {
        /// The template that ran out of rows.
        template: String,
        /// The variant whose band is full.
        variant: Variant,
        /// First row of the band.
        row_start: u32,
        /// Last row of the band.
        row_end: u32,
    },
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// One single-cell write instruction, e.g. `A19` ← `マット`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellWrite {
    /// Single-cell A1-style reference.
    pub range: String,
    /// Value to place there; empty means clear.
    pub value: String,
}

impl CellWrite {
    /// Build a write instruction.
    pub fn new(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            value: value.into(),
        }
    }
}

/// The computed plan for one product entry.
#[derive(Debug, Clone, Serialize)]
pub struct WritePlan {
    /// Template actually used (after unknown-name fallback).
    pub template: String,
    /// Variant actually used (after suffix resolution and fallback).
    pub variant: Variant,
    /// The row the entry lands on.
    pub row: u32,
    /// Ordered write instructions for the collaborator to apply.
    pub writes: Vec<CellWrite>,
}

/// Outcome of a company/date update request.
///
/// An update with neither field is a distinguishable non-error outcome,
/// not a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompanyUpdate {
    /// At least one of company name / date was present.
    Updated {
        /// Ordered write instructions, including blank padding.
        writes: Vec<CellWrite>,
    },
    /// Neither company name nor date carried a value.
    NothingToUpdate,
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Routes records onto template layouts and plans cell writes.
#[derive(Debug, Clone)]
pub struct CellPlanner {
    registry: TemplateRegistry,
    overflow: OverflowPolicy,
}

impl CellPlanner {
    /// Build a planner over a validated registry.
    pub fn new(registry: TemplateRegistry, overflow: OverflowPolicy) -> Self {
        Self { registry, overflow }
    }

    /// The registry this planner routes against.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Plan the writes for one product entry.
    ///
    /// The variant comes from the product name's trailing marker; the row
    /// is the first unoccupied one in the variant's band, judged by the
    /// variant's own watched columns against `snapshot`. Fields without a
    /// configured column are omitted silently.
    pub fn plan_writes(
        &self,
        template_name: &str,
        record: &FieldRecord,
        snapshot: &Snapshot,
    ) -> Result<WritePlan, PlanError> {
        let (template, layout) = self.registry.resolve(template_name)?;
        let raw_name = record.product_name.as_deref().unwrap_or("");
        let (requested, clean_name) = Variant::split_product_name(raw_name);
        let (variant, plan) = layout.plan_for(template, requested)?;

        let next = next_free_row(plan, snapshot);
        let row = if next > plan.row_end {
            match self.overflow {
                OverflowPolicy::ClampToLast => plan.row_end,
                OverflowPolicy::Reject => {
                    return Err(PlanError::CapacityExceeded {
                        template: template.to_owned(),
                        variant,
                        row_start: plan.row_start,
                        row_end: plan.row_end,
                    });
                }
            }
        } else {
            next
        };

        let mut writes = Vec::new();
        if !clean_name.is_empty() {
            for column in &plan.name_columns {
                writes.push(CellWrite::new(format!("{column}{row}"), clean_name.as_str()));
            }
        }
        push_field(&mut writes, &plan.unit_price_column, &record.unit_price, row);
        push_field(&mut writes, &plan.quantity_column, &record.quantity, row);
        push_field(&mut writes, &plan.cycle_column, &record.cycle, row);
        push_field(
            &mut writes,
            &plan.install_place_column,
            &record.install_place,
            row,
        );

        debug!(template, %variant, row, writes = writes.len(), "planned product entry");
        Ok(WritePlan {
            template: template.to_owned(),
            variant,
            row,
            writes,
        })
    }

    /// Plan the company-name/date update, independent of variants and rows.
    ///
    /// Each present field goes into the first cell of its rectangle; the
    /// remainder is blank-padded to clear stale values left by a longer
    /// previous entry.
    pub fn plan_company_update(
        &self,
        template_name: &str,
        record: &FieldRecord,
    ) -> Result<CompanyUpdate, PlanError> {
        let (template, layout) = self.registry.resolve(template_name)?;

        let mut writes = Vec::new();
        if present(&record.company_name) {
            if let Some(company) = record.company_name.as_deref() {
                fill_first_and_blank(&mut writes, &layout.company_range, company);
            }
        }
        if present(&record.date) {
            if let Some(date) = record.date.as_deref() {
                fill_first_and_blank(&mut writes, &layout.date_range, date);
            }
        }

        if writes.is_empty() {
            return Ok(CompanyUpdate::NothingToUpdate);
        }
        debug!(template, writes = writes.len(), "planned company update");
        Ok(CompanyUpdate::Updated { writes })
    }
}

/// First unoccupied row of the band: `row_start` plus the count of rows
/// holding a value in any watched column. May exceed `row_end` when the
/// band is full.
fn next_free_row(plan: &ColumnPlan, snapshot: &Snapshot) -> u32 {
    let watched: Vec<u32> = plan
        .watched_columns()
        .iter()
        .filter_map(|letters| columns::letter_to_index(letters))
        .collect();
    let last_scanned = plan.row_end.min(snapshot.row_count());
    let mut used = 0u32;
    for row in plan.row_start..=last_scanned {
        if watched.iter().any(|&col| !snapshot.is_cell_empty(row, col)) {
            used = used.saturating_add(1);
        }
    }
    plan.row_start.saturating_add(used)
}

/// Append a write when both the column is configured and the field carries
/// a non-empty value.
fn push_field(
    writes: &mut Vec<CellWrite>,
    column: &Option<String>,
    value: &Option<String>,
    row: u32,
) {
    let (Some(column), Some(value)) = (column.as_deref(), value.as_deref()) else {
        return;
    };
    if value.is_empty() {
        return;
    }
    writes.push(CellWrite::new(format!("{column}{row}"), value));
}

/// Value into the first cell of the rectangle, blanks into the rest.
fn fill_first_and_blank(writes: &mut Vec<CellWrite>, range: &CellRange, value: &str) {
    let mut cells = range.cells();
    if let Some((col, row)) = cells.next() {
        writes.push(CellWrite::new(columns::format_cell(col, row), value));
    }
    for (col, row) in cells {
        writes.push(CellWrite::new(columns::format_cell(col, row), ""));
    }
}
