use num_format::{Grouping, Locale};
use serde::Serialize;

use crate::error::{ChartError, ChartResult};

/// Fraction digits kept when rendering a number.
const MAX_FRACTION_DIGITS: usize = 3;

/// A value as it reaches a chart label: numeric, free text, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Missing,
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Where the formatted text ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelContext<'a> {
    /// Text drawn on a bar segment.
    Label,
    /// One `"<series>: <value>"` line in a hover tooltip.
    Tooltip { series: &'a str },
}

/// Locale-aware rendering of cost values. No currency symbol is added.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    locale: Locale,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self { locale: Locale::en }
    }
}

impl ValueFormatter {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Look up a locale by its CLDR name, e.g. `"en"`, `"de"`, `"fr"`.
    pub fn for_locale_name(name: &str) -> ChartResult<Self> {
        let locale = Locale::from_name(name).map_err(|_| ChartError::Locale(name.to_string()))?;
        Ok(Self::new(locale))
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Render `value` for `context`.
    ///
    /// Numbers get grouping separators; text comes back as-is; a missing
    /// value stays missing.
    pub fn format(&self, value: &CellValue, context: LabelContext<'_>) -> Option<String> {
        let text = match value {
            CellValue::Number(n) => self.number(*n),
            CellValue::Text(s) => s.clone(),
            CellValue::Missing => return None,
        };
        Some(match context {
            LabelContext::Label => text,
            LabelContext::Tooltip { series } => format!("{series}: {text}"),
        })
    }

    pub fn label(&self, value: Option<f64>) -> Option<String> {
        self.format(&value.into(), LabelContext::Label)
    }

    /// Grouped decimal text with up to three fraction digits.
    ///
    /// Rounds the exact binary value to the nearest thousandth, so every
    /// finite `f64` keeps all of its integer digits.
    pub fn number(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
        let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let fraction = fraction.trim_end_matches('0');

        let mut out = String::new();
        if value.is_sign_negative() && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
            out.push_str(self.locale.minus_sign());
        }
        out.push_str(&self.group(whole));
        if !fraction.is_empty() {
            out.push_str(self.locale.decimal());
            out.push_str(fraction);
        }
        out
    }

    /// Insert the locale's separator into a run of ASCII digits.
    fn group(&self, digits: &str) -> String {
        let (first, rest) = match self.locale.grouping() {
            Grouping::Standard => (3, 3),
            Grouping::Indian => (3, 2),
            Grouping::Posix => return digits.to_string(),
        };

        let mut groups = Vec::new();
        let mut end = digits.len();
        let mut size = first;
        while end > size {
            groups.push(&digits[end - size..end]);
            end -= size;
            size = rest;
        }
        groups.push(&digits[..end]);
        groups.reverse();
        groups.join(self.locale.separator())
    }
}
