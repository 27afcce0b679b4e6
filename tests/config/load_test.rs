//! Loading configuration from real files on disk.

use std::fs;

use mitsumori::config::MitsumoriConfig;
use mitsumori::layout::TEMPLATE_NEW_SHORT;
use mitsumori::planner::OverflowPolicy;

#[test]
fn test_load_from_existing_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("mitsumori.toml");
    fs::write(
        &path,
        r#"
[intake]
default_template = "新規見積書 ショート"
overflow = "clamp"
"#,
    )
    .expect("should write config");

    let config = MitsumoriConfig::load_from_path(&path).expect("should load");
    assert_eq!(config.intake.default_template, TEMPLATE_NEW_SHORT);
    assert_eq!(config.intake.overflow, OverflowPolicy::ClampToLast);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("no-such-file.toml");

    let config = MitsumoriConfig::load_from_path(&path).expect("should default");
    assert_eq!(config.intake.overflow, OverflowPolicy::Reject);
    assert!(config.templates.is_empty());
}

#[test]
fn test_unparseable_file_is_an_error() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("mitsumori.toml");
    fs::write(&path, "[intake\ndefault_template =").expect("should write config");

    assert!(MitsumoriConfig::load_from_path(&path).is_err());
}

#[test]
fn test_loaded_templates_build_a_usable_registry() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("mitsumori.toml");
    fs::write(
        &path,
        r#"
[templates."月次見積書"]
company_range = "A1:B1"
date_range = "F1"

[templates."月次見積書".variants.default]
name_columns = ["A"]
unit_price_column = "B"
quantity_column = "C"
row_start = 5
row_end = 15
"#,
    )
    .expect("should write config");

    let config = MitsumoriConfig::load_from_path(&path).expect("should load");
    let registry = config.build_registry().expect("should build");
    let (name, layout) = registry.resolve("月次見積書").expect("should resolve");
    assert_eq!(name, "月次見積書");
    assert_eq!(layout.company_range.to_string(), "A1:B1");
}
