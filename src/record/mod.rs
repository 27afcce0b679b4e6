//! Estimate field extraction from free-text chat messages.
//!
//! Parsing is best-effort by design: the input is free-form text typed by
//! non-technical users, so malformed lines are dropped silently and numeric
//! garbage degrades to a zero total rather than an error. [`parse`] never
//! fails; an unrecognizable message simply yields an empty record.

use serde::{Deserialize, Serialize};

/// Wire label for the company name.
pub const LABEL_COMPANY: &str = "社名";
/// Wire label alias for the company name, folded into [`LABEL_COMPANY`].
pub const LABEL_COMPANY_ALIAS: &str = "会社名";
/// Wire label for the product name.
pub const LABEL_PRODUCT: &str = "商品名";
/// Wire label for the unit price.
pub const LABEL_UNIT_PRICE: &str = "単価";
/// Wire label for the quantity.
pub const LABEL_QUANTITY: &str = "数量";
/// Wire label for the service cycle.
pub const LABEL_CYCLE: &str = "サイクル";
/// Wire label for the installation place.
pub const LABEL_INSTALL_PLACE: &str = "設置場所";
/// Wire label for the date.
pub const LABEL_DATE: &str = "日付";

/// Normalized key-value result of parsing one chat message.
///
/// `Some("")` means the user supplied the label with an empty value; fields
/// are treated as carrying a value only when non-empty (see
/// [`FieldRecord::has_company_fields`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Company name (`社名`, or `会社名` when the canonical label is absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Product name (`商品名`), possibly carrying a trailing variant marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// Unit price (`単価`) as the user typed it, separators and all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<String>,
    /// Quantity (`数量`) as the user typed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    /// Service cycle (`サイクル`), e.g. `週2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    /// Installation place (`設置場所`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_place: Option<String>,
    /// Date (`日付`) as the user typed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Derived total: unit price × quantity after digit stripping.
    ///
    /// Present iff both inputs are present and non-empty; `Some(0)` when
    /// either fails to parse. A zero total is distinguishable from a free
    /// item only by re-checking the inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<u64>,
}

impl FieldRecord {
    /// True when no field at all was recognized.
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.product_name.is_none()
            && self.unit_price.is_none()
            && self.quantity.is_none()
            && self.cycle.is_none()
            && self.install_place.is_none()
            && self.date.is_none()
    }

    /// True when the record carries a company name or date worth writing.
    pub fn has_company_fields(&self) -> bool {
        present(&self.company_name) || present(&self.date)
    }

    /// True when the record carries the full product triple
    /// (name, unit price, quantity) the original bot required for a line
    /// item.
    pub fn has_product_fields(&self) -> bool {
        present(&self.product_name) && present(&self.unit_price) && present(&self.quantity)
    }
}

/// Non-empty presence check; `Some("")` counts as no value.
pub(crate) fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Parse one chat message into a [`FieldRecord`]. Never fails.
///
/// Each non-blank line is split on its first ASCII or full-width colon;
/// lines without either are skipped. Keys and values are trimmed, the last
/// occurrence of a repeated key wins, and unrecognized keys are dropped.
pub fn parse(text: &str) -> FieldRecord {
    let mut record = FieldRecord::default();
    let mut alias_company: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = split_on_colon(line) else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_owned();
        match key {
            LABEL_COMPANY => record.company_name = Some(value),
            LABEL_COMPANY_ALIAS => alias_company = Some(value),
            LABEL_PRODUCT => record.product_name = Some(value),
            LABEL_UNIT_PRICE => record.unit_price = Some(value),
            LABEL_QUANTITY => record.quantity = Some(value),
            LABEL_CYCLE => record.cycle = Some(value),
            LABEL_INSTALL_PLACE => record.install_place = Some(value),
            LABEL_DATE => record.date = Some(value),
            _ => {}
        }
    }

    // The alias maps onto the canonical key only when 社名 itself was absent.
    if record.company_name.is_none() {
        record.company_name = alias_company;
    }

    record.total_price = derive_total_price(&record.unit_price, &record.quantity);
    record
}

/// Split a line on its first ASCII (`:`) or full-width (`：`) colon.
fn split_on_colon(line: &str) -> Option<(&str, &str)> {
    let (index, colon) = line.char_indices().find(|&(_, c)| c == ':' || c == '：')?;
    let rest = index.saturating_add(colon.len_utf8());
    Some((&line[..index], &line[rest..]))
}

/// Compute the derived total per the record invariant.
///
/// `None` unless both inputs are present and non-empty; `Some(0)` when
/// either fails to parse after digit stripping.
fn derive_total_price(unit_price: &Option<String>, quantity: &Option<String>) -> Option<u64> {
    let price = unit_price.as_deref().filter(|v| !v.is_empty())?;
    let qty = quantity.as_deref().filter(|v| !v.is_empty())?;
    let total = match (parse_digits(price), parse_digits(qty)) {
        (Some(p), Some(q)) => p.checked_mul(q).unwrap_or(0),
        _ => 0,
    };
    Some(total)
}

/// Strip all non-digit characters (normalizing full-width digits) and parse.
fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter_map(normalize_digit).collect();
    digits.parse().ok()
}

fn normalize_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        // Full-width digits are offset from ASCII by 0xFEE0.
        '０'..='９' => char::from_u32(u32::from(c).saturating_sub(0xFEE0)),
        _ => None,
    }
}
