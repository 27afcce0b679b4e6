//! Configuration loading and registry construction.
//!
//! Loads configuration from `./mitsumori.toml` (or `$MITSUMORI_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::layout::{
    builtin_templates, CellRange, ColumnPlan, LayoutError, TemplateLayout, TemplateRegistry,
    Variant, TEMPLATE_COMPARISON_LONG,
};
use crate::planner::OverflowPolicy;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MitsumoriConfig {
    /// Intake behavior settings (`[intake]`).
    pub intake: IntakeConfig,
    /// Template definitions merged over the built-ins (`[templates.<name>]`).
    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Intake behavior settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Template used when a requested name is unknown.
    pub default_template: String,
    /// Row-band overflow policy (`"reject"` or `"clamp"`).
    pub overflow: OverflowPolicy,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_template: TEMPLATE_COMPARISON_LONG.to_owned(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// One template defined in configuration.
///
/// Ranges are A1-style strings; variants reuse the [`ColumnPlan`] shape.
/// A configured template replaces a built-in of the same name wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Company-name rectangle, e.g. `"A2:H3"`.
    pub company_range: String,
    /// Date rectangle, e.g. `"M2:Q2"`.
    pub date_range: String,
    /// Variant used when the requested one is not defined.
    #[serde(default)]
    pub fallback_variant: Variant,
    /// Variant table keyed by `default` / `current` / `ours`.
    pub variants: BTreeMap<Variant, ColumnPlan>,
}

impl TemplateConfig {
    fn into_layout(self) -> Result<TemplateLayout, LayoutError> {
        Ok(TemplateLayout {
            company_range: CellRange::parse(&self.company_range)?,
            date_range: CellRange::parse(&self.date_range)?,
            variants: self.variants,
            fallback_variant: self.fallback_variant,
        })
    }
}

impl MitsumoriConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$MITSUMORI_CONFIG_PATH` or `./mitsumori.toml`.
    /// A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        let mut config = Self::load_from_path(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides. A missing file yields
    /// defaults; an unreadable or unparseable one is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Parse a TOML string into config.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: MitsumoriConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Build the validated template registry: built-ins, overlaid with the
    /// configured templates, defaulting to `intake.default_template`.
    pub fn build_registry(&self) -> Result<TemplateRegistry, LayoutError> {
        let mut templates = builtin_templates()?;
        for (name, template) in &self.templates {
            templates.insert(name.clone(), template.clone().into_layout()?);
        }
        TemplateRegistry::new(templates, self.intake.default_template.clone())
    }

    /// Resolve the config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        match env("MITSUMORI_CONFIG_PATH") {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from("mitsumori.toml"),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("MITSUMORI_DEFAULT_TEMPLATE") {
            self.intake.default_template = v;
        }
        if let Some(v) = env("MITSUMORI_OVERFLOW") {
            match v.as_str() {
                "reject" => self.intake.overflow = OverflowPolicy::Reject,
                "clamp" => self.intake.overflow = OverflowPolicy::ClampToLast,
                _ => tracing::warn!(
                    var = "MITSUMORI_OVERFLOW",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }
}
