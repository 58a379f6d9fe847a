//! Cost aggregation and chart shaping for per-project cost feeds.
//!
//! Raw `(period, project, cost)` records are normalized to canonical period
//! keys, summed per project and period, ordered chronologically, and turned
//! into a stacked-series chart description with stable colors and
//! locale-formatted labels.

pub mod aggregation;
pub mod chart;
pub mod color;
pub mod error;
pub mod format;
pub mod frame;
pub mod model;
pub mod period;
pub mod schema;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{aggregate, sort_chronologically, Aggregate, CostRecord, PivotRow};
pub use chart::{build_chart, ChartConfig, ChartData, ChartSeries, LabelStyle};
pub use color::{assign_colors, ColorTable, Palette, DEFAULT_PALETTE};
pub use error::{ChartError, ChartResult};
pub use format::{CellValue, LabelContext, ValueFormatter};
pub use model::CostChartModel;
pub use period::{is_canonical, normalize_period, Granularity};
