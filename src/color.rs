use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#8884d8", "#82ca9d", "#ffc658", "#ff7300", "#a4de6c", "#d0ed57", "#83a6ed", "#8dd1e1",
];

/// Ordered, non-empty list of color tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Palette(Vec<String>);

impl Palette {
    pub fn new<I, S>(colors: I) -> ChartResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            return Err(ChartError::Validation(
                "palette must contain at least one color".to_string(),
            ));
        }
        Ok(Self(colors))
    }

    /// Color at `index`, wrapping around the end of the palette.
    pub fn cycle(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }

    pub fn colors(&self) -> &[String] {
        &self.0
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl TryFrom<Vec<String>> for Palette {
    type Error = ChartError;

    fn try_from(colors: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<String> {
    fn from(palette: Palette) -> Self {
        palette.0
    }
}

/// Project name → color token.
pub type ColorTable = BTreeMap<String, String>;

/// Assign one palette color per project, by position in sorted name order.
///
/// Names are sorted and deduplicated first, so the result depends only on
/// the name set. Once every palette color is taken the colors repeat, and
/// adding a name shifts every name that sorts after it.
pub fn assign_colors<S: AsRef<str>>(names: &[S], palette: &Palette) -> ColorTable {
    let sorted: BTreeSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), palette.cycle(i).to_string()))
        .collect()
}
