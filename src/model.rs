use std::collections::HashMap;
use std::path::PathBuf;

use polars::prelude::DataFrame;

use crate::aggregation::{aggregate, Aggregate, CostRecord};
use crate::chart::{build_chart, ChartConfig, ChartData};
use crate::color::{assign_colors, ColorTable, Palette};
use crate::error::ChartResult;
use crate::frame;
use crate::period::Granularity;

/// A cost batch plus the granularity selector it is viewed at.
///
/// The aggregate is cached per `(batch, granularity)` and rebuilt from the
/// raw records on demand. Loading a new batch drops every cached aggregate.
#[derive(Debug, Default)]
pub struct CostChartModel {
    base_path: PathBuf,
    records: Vec<CostRecord>,
    granularity: Granularity,
    cache: HashMap<Granularity, Aggregate>,
}

impl CostChartModel {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a cost CSV relative to the base path and make it the current batch.
    ///
    /// `rename` maps source column names onto period / project_name /
    /// total_cost; `None` uses the statistics service names.
    pub fn load_csv(
        &mut self,
        filename: &str,
        rename: Option<&HashMap<String, String>>,
    ) -> ChartResult<&[CostRecord]> {
        let df = frame::read_cost_csv(&self.base_path.join(filename), &Self::renames(rename))?;
        self.load_frame(&df)
    }

    pub fn load_parquet(
        &mut self,
        filename: &str,
        rename: Option<&HashMap<String, String>>,
    ) -> ChartResult<&[CostRecord]> {
        let df =
            frame::read_cost_parquet(&self.base_path.join(filename), &Self::renames(rename))?;
        self.load_frame(&df)
    }

    /// Validate a cost frame and make it the current batch.
    pub fn load_frame(&mut self, df: &DataFrame) -> ChartResult<&[CostRecord]> {
        let records = frame::records_from_frame(df)?;
        self.set_records(records);
        Ok(self.records.as_slice())
    }

    pub fn set_records(&mut self, records: Vec<CostRecord>) {
        self.records = records;
        self.cache.clear();
    }

    pub fn records(&self) -> &[CostRecord] {
        &self.records
    }

    // ── Granularity ─────────────────────────────────────────────────────────

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    // ── Derived views ───────────────────────────────────────────────────────

    /// Aggregate for the current granularity, built from the raw records if
    /// not cached yet.
    pub fn aggregate(&mut self) -> &Aggregate {
        let granularity = self.granularity;
        let records = &self.records;
        self.cache.entry(granularity).or_insert_with(|| {
            log::debug!("no cached {granularity} aggregate; rebuilding");
            aggregate(records, granularity)
        })
    }

    pub fn colors(&mut self, palette: &Palette) -> ColorTable {
        assign_colors(&self.aggregate().project_names, palette)
    }

    pub fn chart(&mut self, config: &ChartConfig) -> ChartResult<ChartData> {
        build_chart(self.aggregate(), config)
    }

    pub fn pivot_frame(&mut self) -> ChartResult<DataFrame> {
        frame::pivot_to_frame(self.aggregate())
    }

    fn renames(rename: Option<&HashMap<String, String>>) -> HashMap<String, String> {
        rename.cloned().unwrap_or_else(frame::default_renames)
    }
}
