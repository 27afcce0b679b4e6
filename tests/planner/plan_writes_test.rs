//! Row routing and write generation for product entries.

use mitsumori::layout::{TemplateRegistry, Variant, TEMPLATE_COMPARISON_LONG};
use mitsumori::planner::{CellPlanner, CellWrite, OverflowPolicy, PlanError};
use mitsumori::record;
use mitsumori::sheets::Snapshot;

fn planner(overflow: OverflowPolicy) -> CellPlanner {
    let registry = TemplateRegistry::builtin().expect("builtin registry should build");
    CellPlanner::new(registry, overflow)
}

/// Snapshot where rows `used_from..=used_to` hold data in column A.
fn occupied_rows(used_from: u32, used_to: u32) -> Snapshot {
    let mut rows = Vec::new();
    for row in 1..=used_to {
        let value = if row >= used_from { "使用中" } else { "" };
        rows.push(vec![value.to_owned()]);
    }
    Snapshot::new(rows)
}

#[test]
fn test_long_template_scenario_writes() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3\nサイクル:週2");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &Snapshot::default())
        .expect("should plan");

    assert_eq!(plan.variant, Variant::Default);
    assert_eq!(plan.row, 19);
    assert_eq!(
        plan.writes,
        vec![
            CellWrite::new("A19", "マット"),
            CellWrite::new("B19", "マット"),
            CellWrite::new("C19", "1000"),
            CellWrite::new("D19", "3"),
            CellWrite::new("F19", "週2"),
        ]
    );
}

#[test]
fn test_install_place_omitted_when_unconfigured() {
    // The long template's default variant has no install-place column.
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3\n設置場所:入口");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &Snapshot::default())
        .expect("should plan");
    assert!(
        !plan.writes.iter().any(|w| w.value == "入口"),
        "install place should be silently omitted"
    );
}

#[test]
fn test_twelve_used_rows_put_next_entry_on_row_31() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3");
    let snapshot = occupied_rows(19, 30);
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &snapshot)
        .expect("should plan");
    assert_eq!(plan.row, 31);
}

#[test]
fn test_full_band_clamps_to_last_row_in_compat_mode() {
    let planner = planner(OverflowPolicy::ClampToLast);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3");
    let snapshot = occupied_rows(19, 36);
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &snapshot)
        .expect("should plan");
    assert_eq!(plan.row, 36, "legacy mode overwrites the last row");
}

#[test]
fn test_full_band_errors_under_reject_policy() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3");
    let snapshot = occupied_rows(19, 36);
    let err = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &snapshot)
        .expect_err("should reject");
    assert!(matches!(
        err,
        PlanError::CapacityExceeded {
            row_start: 19,
            row_end: 36,
            ..
        }
    ));
}

#[test]
fn test_current_state_suffix_routes_and_strips() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット 現状\n単価:1000\n数量:3");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &Snapshot::default())
        .expect("should plan");
    assert_eq!(plan.variant, Variant::CurrentState);
    // Stored name is the cleaned one, and the current variant has no cycle column.
    assert!(plan
        .writes
        .contains(&CellWrite::new("A19", "マット")));
    assert!(!plan.writes.iter().any(|w| w.value.contains("現状")));
}

#[test]
fn test_our_offer_suffix_uses_right_hand_columns() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット 当社\n単価:800\n数量:3");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &Snapshot::default())
        .expect("should plan");
    assert_eq!(plan.variant, Variant::OurOffer);
    assert_eq!(
        plan.writes,
        vec![
            CellWrite::new("I19", "マット"),
            CellWrite::new("J19", "マット"),
            CellWrite::new("K19", "800"),
            CellWrite::new("L19", "3"),
        ]
    );
}

#[test]
fn test_variant_bands_occupy_independently() {
    // Left-hand (A-D) rows full up to 24; the our-offer variant watches
    // I-L only, so its band is still empty.
    let planner = planner(OverflowPolicy::Reject);
    let snapshot = occupied_rows(19, 24);

    let default_entry = record::parse("商品名:マット\n単価:1000\n数量:3");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &default_entry, &snapshot)
        .expect("should plan");
    assert_eq!(plan.row, 25);

    let ours_entry = record::parse("商品名:マット 当社\n単価:800\n数量:3");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &ours_entry, &snapshot)
        .expect("should plan");
    assert_eq!(plan.row, 19);
}

#[test]
fn test_unknown_template_falls_back_to_default() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:マット\n単価:1000\n数量:3");
    let plan = planner
        .plan_writes("知らないシート", &record, &Snapshot::default())
        .expect("should fall back, not fail");
    assert_eq!(plan.template, TEMPLATE_COMPARISON_LONG);
    assert_eq!(plan.row, 19);
}

#[test]
fn test_empty_fields_produce_no_writes() {
    let planner = planner(OverflowPolicy::Reject);
    let record = record::parse("商品名:\n単価:\nサイクル:");
    let plan = planner
        .plan_writes(TEMPLATE_COMPARISON_LONG, &record, &Snapshot::default())
        .expect("should plan");
    assert!(plan.writes.is_empty(), "empty values are not written");
}
