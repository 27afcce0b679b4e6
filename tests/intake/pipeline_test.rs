//! End-to-end message handling against an in-memory sheet.

use mitsumori::intake::{Intake, IntakeOutcome};
use mitsumori::layout::{TemplateRegistry, TEMPLATE_COMPARISON_LONG};
use mitsumori::planner::{CellPlanner, OverflowPolicy};
use mitsumori::sheets::{MemorySheet, SnapshotReader, WriteApplier};
use mitsumori::usage::UsageDecision;

fn intake() -> Intake {
    let registry = TemplateRegistry::builtin().expect("builtin registry should build");
    Intake::new(CellPlanner::new(registry, OverflowPolicy::Reject))
}

const ALLOWED: UsageDecision = UsageDecision::Allowed { remaining: None };

#[test]
fn test_successive_entries_fill_successive_rows() {
    let intake = intake();
    let mut sheet = MemorySheet::default();

    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");
    let outcome = intake
        .handle_message(
            "商品名:マット\n単価:1000\n数量:3\nサイクル:週2",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &ALLOWED,
        )
        .expect("should handle");
    let IntakeOutcome::ProductRecorded { plan, reply } = outcome else {
        panic!("expected a product entry");
    };
    assert_eq!(plan.row, 19);
    assert!(reply.contains("料金: 3000円"));
    sheet.apply(&plan.writes).expect("should apply");

    // The second entry sees the applied first one and lands below it.
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");
    let outcome = intake
        .handle_message(
            "商品名:モップ\n単価:500\n数量:2",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &ALLOWED,
        )
        .expect("should handle");
    let IntakeOutcome::ProductRecorded { plan, .. } = outcome else {
        panic!("expected a product entry");
    };
    assert_eq!(plan.row, 20);
    sheet.apply(&plan.writes).expect("should apply");

    assert_eq!(sheet.value("A19"), Some("マット"));
    assert_eq!(sheet.value("A20"), Some("モップ"));
    assert_eq!(sheet.value("C20"), Some("500"));
}

#[test]
fn test_company_update_applies_to_header() {
    let intake = intake();
    let mut sheet = MemorySheet::default();
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");

    let outcome = intake
        .handle_message(
            "会社名:ABC株式会社\n日付:2024/01/15",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &ALLOWED,
        )
        .expect("should handle");
    let IntakeOutcome::CompanyUpdated { writes, reply } = outcome else {
        panic!("expected a company update");
    };
    assert!(reply.contains("会社情報を更新しました"));
    sheet.apply(&writes).expect("should apply");
    assert_eq!(sheet.value("A2"), Some("ABC株式会社"));
    assert_eq!(sheet.value("M2"), Some("2024/01/15"));
}

#[test]
fn test_company_update_clears_stale_padding() {
    let intake = intake();
    let mut sheet = MemorySheet::default();

    // A previous longer company name left a value in B2.
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");
    let outcome = intake
        .handle_message("社名:とても長い社名", TEMPLATE_COMPARISON_LONG, &snapshot, &ALLOWED)
        .expect("should handle");
    let IntakeOutcome::CompanyUpdated { writes, .. } = outcome else {
        panic!("expected a company update");
    };
    sheet.apply(&writes).expect("should apply");
    sheet
        .apply(&[mitsumori::planner::CellWrite::new("B2", "残骸")])
        .expect("should apply");

    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");
    let outcome = intake
        .handle_message("社名:新社名", TEMPLATE_COMPARISON_LONG, &snapshot, &ALLOWED)
        .expect("should handle");
    let IntakeOutcome::CompanyUpdated { writes, .. } = outcome else {
        panic!("expected a company update");
    };
    sheet.apply(&writes).expect("should apply");
    assert_eq!(sheet.value("A2"), Some("新社名"));
    assert_eq!(sheet.value("B2"), None, "padding blanks clear stale cells");
}

#[test]
fn test_limit_reached_blocks_writes() {
    let intake = intake();
    let sheet = MemorySheet::default();
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");

    let outcome = intake
        .handle_message(
            "商品名:マット\n単価:1000\n数量:3",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &UsageDecision::LimitReached { limit: 10 },
        )
        .expect("should handle");
    let IntakeOutcome::UsageBlocked { reply } = outcome else {
        panic!("expected the gate to block");
    };
    assert!(reply.contains("月10件まで"));
}

#[test]
fn test_unrecognized_message_bypasses_the_gate() {
    let intake = intake();
    let sheet = MemorySheet::default();
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");

    // A chat greeting costs nothing even for a capped account.
    let outcome = intake
        .handle_message(
            "こんにちは",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &UsageDecision::LimitReached { limit: 10 },
        )
        .expect("should handle");
    let IntakeOutcome::Unrecognized { reply } = outcome else {
        panic!("expected the format help");
    };
    assert!(reply.contains("データの形式が正しくありません"));
    assert!(reply.contains("商品名:マット"));
}

#[test]
fn test_reply_omits_missing_optional_fields() {
    let intake = intake();
    let sheet = MemorySheet::default();
    let snapshot = sheet
        .read_snapshot(TEMPLATE_COMPARISON_LONG)
        .expect("should read");

    let outcome = intake
        .handle_message(
            "商品名:マット\n単価:1000\n数量:3",
            TEMPLATE_COMPARISON_LONG,
            &snapshot,
            &ALLOWED,
        )
        .expect("should handle");
    let IntakeOutcome::ProductRecorded { reply, .. } = outcome else {
        panic!("expected a product entry");
    };
    assert!(!reply.contains("サイクル"));
    assert!(!reply.contains("設置場所"));
}
