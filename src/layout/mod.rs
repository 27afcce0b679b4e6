//! Sheet layout templates: cell ranges, variants, column plans, and the
//! template registry.
//!
//! A template describes one fixed workbook shape (where company, date, and
//! line-item fields go). Templates are static configuration: built once at
//! startup, validated structurally, and never mutated afterwards.

pub mod columns;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layout::columns::letter_to_index;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural misconfiguration in templates or the registry.
///
/// These are programming/configuration errors raised at construction time,
/// not runtime conditions: malformed chat input never produces a
/// [`LayoutError`].
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// A template defines no variants at all.
    #[error("template {0} defines no variants")]
    NoVariants(String),

    /// A template's fallback variant is missing from its own variant table.
    #[error("template {template} falls back to variant {variant}, which it does not define")]
    MissingFallbackVariant {
        /// The offending template name.
        template: String,
        /// The fallback variant that is not defined.
        variant: Variant,
    },

    /// The registry's default template name is not registered.
    #[error("default template {0} is not registered")]
    UnknownDefaultTemplate(String),

    /// A row band is inverted or starts at row 0.
    #[error("template {template} variant {variant} has invalid row band {row_start}..={row_end}")]
    InvalidRowBand {
        /// The offending template name.
        template: String,
        /// The variant carrying the band.
        variant: Variant,
        /// First row of the band.
        row_start: u32,
        /// Last row of the band.
        row_end: u32,
    },

    /// A cell range string could not be parsed.
    #[error("invalid cell range: {0}")]
    InvalidRange(String),

    /// A column letter could not be parsed.
    #[error("invalid column letter {column} in template {template}")]
    InvalidColumn {
        /// The template defining the column.
        template: String,
        /// The unparseable column letters.
        column: String,
    },
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Trailing product-name marker selecting [`Variant::CurrentState`].
pub const SUFFIX_CURRENT: &str = "現状";
/// Trailing product-name marker selecting [`Variant::OurOffer`].
pub const SUFFIX_OURS: &str = "当社";

/// Sub-layout selector within a template.
///
/// The original routed on raw suffix strings; here the token set is a closed
/// enumeration so the "no recognized suffix" case is an explicit branch
/// landing on [`Variant::Default`] rather than an implicit fallthrough.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Variant {
    /// No suffix marker on the product name.
    #[default]
    #[serde(rename = "default")]
    Default,
    /// Current/as-is columns, selected by the `現状` marker.
    #[serde(rename = "current")]
    CurrentState,
    /// Our-offer columns, selected by the `当社` marker.
    #[serde(rename = "ours")]
    OurOffer,
}

impl Variant {
    /// Split a raw product name into its variant and the cleaned name.
    ///
    /// The marker must be trailing, optionally preceded by whitespace:
    /// `"マット 現状"` and `"マット現状"` both select
    /// [`Variant::CurrentState`] with the cleaned name `"マット"`.
    pub fn split_product_name(product_name: &str) -> (Variant, String) {
        let trimmed = product_name.trim();
        for (suffix, variant) in [
            (SUFFIX_CURRENT, Variant::CurrentState),
            (SUFFIX_OURS, Variant::OurOffer),
        ] {
            if let Some(stripped) = trimmed.strip_suffix(suffix) {
                return (variant, stripped.trim_end().to_owned());
            }
        }
        (Variant::Default, trimmed.to_owned())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Default => "default",
            Variant::CurrentState => "current",
            Variant::OurOffer => "ours",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Cell ranges
// ---------------------------------------------------------------------------

/// Rectangular cell range, 1-indexed and inclusive on both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    start_col: u32,
    start_row: u32,
    end_col: u32,
    end_row: u32,
}

impl CellRange {
    /// Build a range from 1-based corner coordinates.
    ///
    /// Fails with [`LayoutError::InvalidRange`] when a coordinate is 0 or
    /// the corners are inverted.
    pub fn new(
        start_col: u32,
        start_row: u32,
        end_col: u32,
        end_row: u32,
    ) -> Result<Self, LayoutError> {
        if start_col == 0
            || start_row == 0
            || end_col < start_col
            || end_row < start_row
        {
            return Err(LayoutError::InvalidRange(format!(
                "{}:{}",
                columns::format_cell(start_col, start_row),
                columns::format_cell(end_col, end_row)
            )));
        }
        Ok(Self {
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }

    /// Parse an A1-style range like `"A2:H3"`. A single reference like
    /// `"A2"` is a one-cell range.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidRange(text.to_owned());
        match text.split_once(':') {
            Some((start, end)) => {
                let (start_col, start_row) = columns::parse_cell(start).ok_or_else(invalid)?;
                let (end_col, end_row) = columns::parse_cell(end).ok_or_else(invalid)?;
                Self::new(start_col, start_row, end_col, end_row).map_err(|_| invalid())
            }
            None => {
                let (col, row) = columns::parse_cell(text).ok_or_else(invalid)?;
                Self::new(col, row, col, row)
            }
        }
    }

    /// First (top-left) cell as `(column, row)`.
    pub fn first_cell(&self) -> (u32, u32) {
        (self.start_col, self.start_row)
    }

    /// All cells in row-major order as `(column, row)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.start_row..=self.end_row)
            .flat_map(move |row| (self.start_col..=self.end_col).map(move |col| (col, row)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if (self.start_col, self.start_row) == (self.end_col, self.end_row) {
            f.write_str(&columns::format_cell(self.start_col, self.start_row))
        } else {
            write!(
                f,
                "{}:{}",
                columns::format_cell(self.start_col, self.start_row),
                columns::format_cell(self.end_col, self.end_row)
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Column plans and templates
// ---------------------------------------------------------------------------

/// Column assignment and row band for one variant of a template.
///
/// The product name is duplicated into every letter of `name_columns`;
/// the remaining fields each have at most one column. A field with no
/// configured column is silently omitted from plans, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlan {
    /// Columns receiving the product name (duplicated into each).
    pub name_columns: Vec<String>,
    /// Column receiving the unit price, if configured.
    #[serde(default)]
    pub unit_price_column: Option<String>,
    /// Column receiving the quantity, if configured.
    #[serde(default)]
    pub quantity_column: Option<String>,
    /// Column receiving the cycle, if configured.
    #[serde(default)]
    pub cycle_column: Option<String>,
    /// Column receiving the installation place, if configured.
    #[serde(default)]
    pub install_place_column: Option<String>,
    /// First row of the band new records append into (1-indexed, inclusive).
    pub row_start: u32,
    /// Last row of the band (1-indexed, inclusive).
    pub row_end: u32,
}

impl ColumnPlan {
    /// Union of all configured column letters, in lexicographic order.
    ///
    /// These are the columns the occupancy scan watches when deciding
    /// whether a row is used.
    pub fn watched_columns(&self) -> BTreeSet<String> {
        let mut watched: BTreeSet<String> = self.name_columns.iter().cloned().collect();
        for column in [
            &self.unit_price_column,
            &self.quantity_column,
            &self.cycle_column,
            &self.install_place_column,
        ]
        .into_iter()
        .flatten()
        {
            watched.insert(column.clone());
        }
        watched
    }

    fn validate(&self, template: &str, variant: Variant) -> Result<(), LayoutError> {
        if self.row_start == 0 || self.row_end < self.row_start {
            return Err(LayoutError::InvalidRowBand {
                template: template.to_owned(),
                variant,
                row_start: self.row_start,
                row_end: self.row_end,
            });
        }
        for column in self.watched_columns() {
            if letter_to_index(&column).is_none() {
                return Err(LayoutError::InvalidColumn {
                    template: template.to_owned(),
                    column,
                });
            }
        }
        Ok(())
    }
}

/// One named workbook shape: company/date placement plus per-variant plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayout {
    /// Rectangle receiving the company name (first cell) and blank padding.
    pub company_range: CellRange,
    /// Rectangle receiving the date (first cell) and blank padding.
    pub date_range: CellRange,
    /// Variant table. Row bands of different variants are a configuration
    /// contract, not enforced disjoint at runtime.
    pub variants: BTreeMap<Variant, ColumnPlan>,
    /// Variant used when the requested one is not in the table.
    pub fallback_variant: Variant,
}

impl TemplateLayout {
    /// Resolve `requested` against the variant table, falling back to the
    /// template's configured fallback variant.
    ///
    /// Only errors if the fallback itself is missing, which registry
    /// validation rules out for registered templates. `name` is used for
    /// error reporting only.
    pub fn plan_for(
        &self,
        name: &str,
        requested: Variant,
    ) -> Result<(Variant, &ColumnPlan), LayoutError> {
        if let Some(plan) = self.variants.get(&requested) {
            return Ok((requested, plan));
        }
        match self.variants.get(&self.fallback_variant) {
            Some(plan) => Ok((self.fallback_variant, plan)),
            None => Err(LayoutError::MissingFallbackVariant {
                template: name.to_owned(),
                variant: self.fallback_variant,
            }),
        }
    }

    fn validate(&self, name: &str) -> Result<(), LayoutError> {
        if self.variants.is_empty() {
            return Err(LayoutError::NoVariants(name.to_owned()));
        }
        if !self.variants.contains_key(&self.fallback_variant) {
            return Err(LayoutError::MissingFallbackVariant {
                template: name.to_owned(),
                variant: self.fallback_variant,
            });
        }
        for (variant, plan) in &self.variants {
            plan.validate(name, *variant)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Long comparison estimate sheet (the original bot's default).
pub const TEMPLATE_COMPARISON_LONG: &str = "比較見積書 ロング";
/// Short comparison estimate sheet.
pub const TEMPLATE_COMPARISON_SHORT: &str = "比較見積書 ショート";
/// Short new-estimate sheet.
pub const TEMPLATE_NEW_SHORT: &str = "新規見積書 ショート";

/// Named template table, loaded once at startup.
///
/// Unknown template names resolve to the default template — a soft
/// fallback preserving the original's liveness-over-validation stance —
/// while structural misconfiguration fails construction.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateLayout>,
    default_template: String,
}

impl TemplateRegistry {
    /// Build and validate a registry.
    pub fn new(
        templates: BTreeMap<String, TemplateLayout>,
        default_template: impl Into<String>,
    ) -> Result<Self, LayoutError> {
        let default_template = default_template.into();
        for (name, layout) in &templates {
            layout.validate(name)?;
        }
        if !templates.contains_key(&default_template) {
            return Err(LayoutError::UnknownDefaultTemplate(default_template));
        }
        Ok(Self {
            templates,
            default_template,
        })
    }

    /// The built-in registry mirroring the original workbook shapes, with
    /// [`TEMPLATE_COMPARISON_LONG`] as the default template.
    pub fn builtin() -> Result<Self, LayoutError> {
        Self::new(builtin_templates()?, TEMPLATE_COMPARISON_LONG)
    }

    /// Resolve a template by name, falling back to the default template.
    ///
    /// Returns the name actually used alongside the layout.
    pub fn resolve<'a>(
        &'a self,
        name: &'a str,
    ) -> Result<(&'a str, &'a TemplateLayout), LayoutError> {
        if let Some(layout) = self.templates.get(name) {
            return Ok((name, layout));
        }
        match self.templates.get(&self.default_template) {
            Some(layout) => Ok((self.default_template.as_str(), layout)),
            None => Err(LayoutError::UnknownDefaultTemplate(
                self.default_template.clone(),
            )),
        }
    }

    /// Name of the default template.
    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    /// Iterate all registered templates in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TemplateLayout)> {
        self.templates.iter()
    }
}

/// The built-in template table mirroring the original workbook shapes.
pub fn builtin_templates() -> Result<BTreeMap<String, TemplateLayout>, LayoutError> {
    let mut templates = BTreeMap::new();

    // Comparison sheets: current-state columns on the left (A-D), our-offer
    // columns on the right (I-L), product name spanning two columns.
    for (name, row_start, row_end) in [
        (TEMPLATE_COMPARISON_LONG, 19, 36),
        (TEMPLATE_COMPARISON_SHORT, 19, 26),
    ] {
        let mut variants = BTreeMap::new();
        variants.insert(
            Variant::Default,
            ColumnPlan {
                name_columns: vec!["A".to_owned(), "B".to_owned()],
                unit_price_column: Some("C".to_owned()),
                quantity_column: Some("D".to_owned()),
                cycle_column: Some("F".to_owned()),
                install_place_column: None,
                row_start,
                row_end,
            },
        );
        variants.insert(
            Variant::CurrentState,
            ColumnPlan {
                name_columns: vec!["A".to_owned(), "B".to_owned()],
                unit_price_column: Some("C".to_owned()),
                quantity_column: Some("D".to_owned()),
                cycle_column: None,
                install_place_column: None,
                row_start,
                row_end,
            },
        );
        variants.insert(
            Variant::OurOffer,
            ColumnPlan {
                name_columns: vec!["I".to_owned(), "J".to_owned()],
                unit_price_column: Some("K".to_owned()),
                quantity_column: Some("L".to_owned()),
                cycle_column: None,
                install_place_column: None,
                row_start,
                row_end,
            },
        );
        templates.insert(
            name.to_owned(),
            TemplateLayout {
                company_range: CellRange::parse("A2:H3")?,
                date_range: CellRange::parse("M2:Q2")?,
                variants,
                fallback_variant: Variant::Default,
            },
        );
    }

    // New-estimate sheet: single block under the B23:D23 header row.
    let mut variants = BTreeMap::new();
    variants.insert(
        Variant::Default,
        ColumnPlan {
            name_columns: vec!["B".to_owned()],
            unit_price_column: Some("D".to_owned()),
            quantity_column: Some("E".to_owned()),
            cycle_column: Some("F".to_owned()),
            install_place_column: Some("G".to_owned()),
            row_start: 24,
            row_end: 30,
        },
    );
    templates.insert(
        TEMPLATE_NEW_SHORT.to_owned(),
        TemplateLayout {
            company_range: CellRange::parse("A2:C2")?,
            date_range: CellRange::parse("M2:O2")?,
            variants,
            fallback_variant: Variant::Default,
        },
    );

    Ok(templates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
