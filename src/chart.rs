//! Chart module: stacked bar chart description for project costs.
//!
//! Produces a JSON-serializable payload that a rendering layer draws as
//! one category per period and one stacked series per project:
//! - Categories in chronological period order
//! - Series colored through the palette, in sorted project order
//! - Pre-formatted segment labels, placed per granularity
//! - Tooltip text per category
//!
//! No drawing happens here.

use serde::{Deserialize, Serialize};

use crate::aggregation::Aggregate;
use crate::color::{assign_colors, ColorTable, Palette};
use crate::error::ChartResult;
use crate::format::{CellValue, LabelContext, ValueFormatter};
use crate::period::Granularity;

// ── Config ──────────────────────────────────────────────────────────────────

/// Configuration for the cost chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Series colors, assigned by sorted project position
    pub palette: Palette,
    /// CLDR locale name for number grouping (default: "en")
    pub locale: String,
    /// Prefix of the tooltip header line (default: "Period")
    pub tooltip_header: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            locale: "en".to_string(),
            tooltip_header: "Period".to_string(),
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.formatter()?;
        Ok(config)
    }

    pub fn formatter(&self) -> ChartResult<ValueFormatter> {
        ValueFormatter::for_locale_name(&self.locale)
    }
}

// ── Output structures ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Top,
}

/// Label text color.
const LABEL_FILL: &str = "white";

/// Placement of the per-segment value labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStyle {
    pub position: LabelPosition,
    pub angle: i32,
    pub offset: Option<u32>,
    pub text_anchor: Option<&'static str>,
    pub font_size: u32,
    pub fill: &'static str,
}

impl LabelStyle {
    /// Month labels are rotated upright; year labels sit flat above the bar.
    pub fn for_granularity(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Month => Self {
                position: LabelPosition::Top,
                angle: -90,
                offset: Some(20),
                text_anchor: Some("middle"),
                font_size: 12,
                fill: LABEL_FILL,
            },
            Granularity::Year => Self {
                position: LabelPosition::Top,
                angle: 0,
                offset: None,
                text_anchor: None,
                font_size: 12,
                fill: LABEL_FILL,
            },
        }
    }
}

/// One project's stacked segment across all categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub color: String,
    /// Aligned with `ChartData::categories`; `None` draws a zero-height segment.
    pub values: Vec<Option<f64>>,
    pub labels: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub granularity: Granularity,
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub label_style: LabelStyle,
    pub tooltips: Vec<Vec<String>>,
}

impl ChartData {
    pub fn to_json(&self) -> ChartResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Tooltip lines for the category at `index`: a header and one line per
    /// project with a value in that period.
    pub fn tooltip(&self, index: usize) -> Option<&[String]> {
        self.tooltips.get(index).map(Vec::as_slice)
    }
}

// ── Assembly ────────────────────────────────────────────────────────────────

/// Main entry point: turn an aggregate into a chart description.
pub fn build_chart(aggregate: &Aggregate, config: &ChartConfig) -> ChartResult<ChartData> {
    let formatter = config.formatter()?;
    let colors = assign_colors(&aggregate.project_names, &config.palette);

    let categories: Vec<String> = aggregate.periods().map(str::to_string).collect();
    let series = build_series(aggregate, &colors, &formatter);
    let tooltips = build_tooltips(aggregate, &formatter, &config.tooltip_header);

    log::debug!(
        "built {} chart: {} categories, {} series",
        aggregate.granularity,
        categories.len(),
        series.len()
    );

    Ok(ChartData {
        title: format!("Project Costs by {}", aggregate.granularity.title()),
        granularity: aggregate.granularity,
        categories,
        series,
        label_style: LabelStyle::for_granularity(aggregate.granularity),
        tooltips,
    })
}

fn build_series(
    aggregate: &Aggregate,
    colors: &ColorTable,
    formatter: &ValueFormatter,
) -> Vec<ChartSeries> {
    aggregate
        .project_names
        .iter()
        .map(|name| {
            let values: Vec<Option<f64>> = aggregate.rows.iter().map(|r| r.cost(name)).collect();
            let labels = values.iter().map(|v| formatter.label(*v)).collect();
            ChartSeries {
                name: name.clone(),
                color: colors.get(name).cloned().unwrap_or_default(),
                values,
                labels,
            }
        })
        .collect()
}

fn build_tooltips(
    aggregate: &Aggregate,
    formatter: &ValueFormatter,
    header: &str,
) -> Vec<Vec<String>> {
    aggregate
        .rows
        .iter()
        .map(|row| {
            let mut lines = vec![format!("{header}: {}", row.period)];
            lines.extend(aggregate.project_names.iter().filter_map(|name| {
                let value = CellValue::from(row.cost(name));
                formatter.format(&value, LabelContext::Tooltip { series: name })
            }));
            lines
        })
        .collect()
}
