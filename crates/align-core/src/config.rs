//! Alignment settings.
//!
//! Hosts usually forward their editor configuration (tab size) here. The binary additionally
//! honors a few environment variables; they are read through a lookup closure so callers (and
//! tests) decide where values come from.

use crate::error::ConfigError;
use crate::width::ColumnMetric;

/// Environment variable overriding [`AlignConfig::tab_width`].
pub const ENV_TAB_WIDTH: &str = "ALIGN_TAB_WIDTH";
/// Environment variable overriding [`AlignConfig::operator`].
pub const ENV_OPERATOR: &str = "ALIGN_OPERATOR";
/// Environment variable overriding [`AlignConfig::column_metric`] (`chars` or `cells`).
pub const ENV_COLUMNS: &str = "ALIGN_COLUMNS";

/// Settings for one alignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignConfig {
    /// Tab stop width in columns (must be greater than 0).
    pub tab_width: usize,
    /// The operator character lined up across the block.
    pub operator: char,
    /// How non-tab characters are measured.
    pub column_metric: ColumnMetric,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            operator: '=',
            column_metric: ColumnMetric::Chars,
        }
    }
}

impl AlignConfig {
    /// Replace the tab width.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Replace the operator character.
    pub fn with_operator(mut self, operator: char) -> Self {
        self.operator = operator;
        self
    }

    /// Replace the column metric.
    pub fn with_column_metric(mut self, column_metric: ColumnMetric) -> Self {
        self.column_metric = column_metric;
        self
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tab_width == 0 {
            return Err(ConfigError::InvalidTabWidth);
        }
        if self.operator.is_whitespace() {
            return Err(ConfigError::InvalidOperator(self.operator.to_string()));
        }
        Ok(())
    }

    /// Apply overrides found through `lookup` (typically `|key| std::env::var(key).ok()`).
    ///
    /// Unset keys leave the current value untouched; malformed values are errors.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TAB_WIDTH) {
            self.tab_width = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::UnparsableTabWidth(raw.clone()))?;
        }

        if let Some(raw) = lookup(ENV_OPERATOR) {
            self.operator = parse_operator(&raw)?;
        }

        if let Some(raw) = lookup(ENV_COLUMNS) {
            self.column_metric =
                ColumnMetric::parse(&raw).ok_or(ConfigError::UnknownColumnMetric(raw))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }
}

/// Parse an operator given as text; exactly one non-whitespace character is accepted.
pub fn parse_operator(raw: &str) -> Result<char, ConfigError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if !ch.is_whitespace() => Ok(ch),
        _ => Err(ConfigError::InvalidOperator(raw.to_string())),
    }
}
