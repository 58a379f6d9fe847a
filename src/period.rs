//! Period-key normalization.
//!
//! Canonical keys are fixed-width, zero-padded and big-endian (`YYYY` or
//! `YYYY-MM`), so plain string ordering is chronological ordering. No
//! calendar type is involved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::schema::granularity;

/// Time-bucket resolution for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Month => granularity::MONTH,
            Self::Year => granularity::YEAR,
        }
    }

    /// Capitalized name for titles ("Month" / "Year").
    pub fn title(self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            granularity::MONTH => Ok(Self::Month),
            granularity::YEAR => Ok(Self::Year),
            _ => Err(ChartError::UnknownGranularity(s.to_string())),
        }
    }
}

fn all_digits(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_digit)
}

/// `MM/YYYY`
fn is_slash_month(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 7 && b[2] == b'/' && all_digits(&b[..2]) && all_digits(&b[3..])
}

/// `YYYY-MM`
fn is_iso_month(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 7 && b[4] == b'-' && all_digits(&b[..4]) && all_digits(&b[5..])
}

/// `YYYY`
fn is_year(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 4 && all_digits(b)
}

/// Whether `key` has one of the canonical shapes (`YYYY` or `YYYY-MM`).
///
/// Keys that fail this check came through [`normalize_period`] as opaque
/// pass-through labels and sort by their literal text.
pub fn is_canonical(key: &str) -> bool {
    is_iso_month(key) || is_year(key)
}

/// Normalize a raw period label to its canonical key.
///
/// Accepts `YYYY-MM` and `MM/YYYY`. Anything else is returned unchanged and
/// becomes an opaque group key.
pub fn normalize_period(text: &str, granularity: Granularity) -> String {
    if is_slash_month(text) {
        let (month, year) = (&text[..2], &text[3..]);
        return match granularity {
            Granularity::Month => format!("{year}-{month}"),
            Granularity::Year => year.to_string(),
        };
    }

    if is_iso_month(text) {
        return match granularity {
            Granularity::Month => text.to_string(),
            Granularity::Year => text[..4].to_string(),
        };
    }

    log::debug!("period label '{text}' has no recognised shape; using it verbatim");
    text.to_string()
}
