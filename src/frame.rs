//! DataFrame boundary: loading cost records and exporting pivot tables.
//!
//! This is where input gets validated. Everything past
//! [`records_from_frame`] works on well-typed [`CostRecord`]s.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;

use crate::aggregation::{Aggregate, CostRecord};
use crate::error::{ChartError, ChartResult};
use crate::schema::{cost, pivot, service};

/// Rename map from the statistics service's field names to cost columns.
pub fn default_renames() -> HashMap<String, String> {
    service::RENAMES
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names and applies the rename map.
pub fn read_cost_csv(path: &Path, rename: &HashMap<String, String>) -> ChartResult<DataFrame> {
    log::info!("reading cost records from {}", path.display());
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    apply_renames(df, rename)
}

/// Read a Parquet file, keeping the stored dtypes.
pub fn read_cost_parquet(path: &Path, rename: &HashMap<String, String>) -> ChartResult<DataFrame> {
    log::info!("reading cost records from {}", path.display());
    let file = File::open(path)?;
    let df = ParquetReader::new(file).finish()?;
    apply_renames(df, rename)
}

/// Rename only where the source column exists and the target does not, so a
/// frame that already uses the canonical names passes through untouched.
fn apply_renames(df: DataFrame, rename: &HashMap<String, String>) -> ChartResult<DataFrame> {
    let (old, new): (Vec<&str>, Vec<&str>) = rename
        .iter()
        .filter(|(from, to)| df.column(from).is_ok() && df.column(to).is_err())
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .unzip();

    if old.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().rename(old, new, true).collect()?)
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> ChartResult<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(ChartError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

/// Convert a cost frame into records.
///
/// Required columns: period, project_name, total_cost.
/// `total_cost` may be numeric or text; text is trimmed and parsed. Costs must
/// be finite and non-negative. Date and Datetime periods become `YYYY-MM`.
pub fn records_from_frame(df: &DataFrame) -> ChartResult<Vec<CostRecord>> {
    require_columns(df, &cost::ALL)?;

    let periods = period_labels(df.column(cost::PERIOD)?)?;
    let names = df.column(cost::PROJECT_NAME)?.cast(&DataType::String)?;
    let names = names.str()?;
    let costs = cost_values(df.column(cost::TOTAL_COST)?)?;

    let mut records = Vec::with_capacity(df.height());
    for (i, ((period, name), total)) in periods
        .into_iter()
        .zip(names.into_iter())
        .zip(costs)
        .enumerate()
    {
        let period = period
            .ok_or_else(|| ChartError::InvalidData(format!("Null {} at row {i}", cost::PERIOD)))?;
        let name = name.ok_or_else(|| {
            ChartError::InvalidData(format!("Null {} at row {i}", cost::PROJECT_NAME))
        })?;
        let total = total.ok_or_else(|| {
            ChartError::InvalidData(format!("Null {} at row {i}", cost::TOTAL_COST))
        })?;
        if !total.is_finite() || total < 0.0 {
            return Err(ChartError::InvalidData(format!(
                "{} at row {i} must be a non-negative number, got {total}",
                cost::TOTAL_COST
            )));
        }
        records.push(CostRecord::new(period, name, total));
    }

    log::debug!("read {} cost records from frame", records.len());
    Ok(records)
}

fn period_labels(column: &Column) -> ChartResult<Vec<Option<String>>> {
    let labels: Vec<Option<String>> = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|s| s.map(str::to_string))
            .collect(),
        DataType::Date => {
            let physical = column.as_materialized_series().to_physical_repr();
            let labels: Vec<Option<String>> = physical
                .i32()?
                .into_iter()
                .map(|days| days.and_then(date_from_epoch_days).map(month_label))
                .collect();
            labels
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = column.as_materialized_series().to_physical_repr();
            let labels: Vec<Option<String>> = physical
                .i64()?
                .into_iter()
                .map(|ticks| ticks.and_then(|t| date_from_ticks(t, unit)).map(month_label))
                .collect();
            labels
        }
        _ => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|s| s.map(str::to_string))
            .collect(),
    };
    Ok(labels)
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    // 719_163 = days from 0001-01-01 to 1970-01-01
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(719_163)?)
}

fn date_from_ticks(ticks: i64, unit: TimeUnit) -> Option<NaiveDate> {
    let dt = match unit {
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(ticks),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ticks)?,
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ticks)?,
    };
    Some(dt.date_naive())
}

fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn cost_values(column: &Column) -> ChartResult<Vec<Option<f64>>> {
    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, raw)| match raw {
                None => Ok(None),
                Some(text) => text.trim().parse::<f64>().map(Some).map_err(|_| {
                    ChartError::InvalidData(format!(
                        "{} at row {i} is not a number: '{text}'",
                        cost::TOTAL_COST
                    ))
                }),
            })
            .collect();
    }

    let floats = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = floats.f64()?.into_iter().collect();
    Ok(values)
}

/// Export an aggregate as a wide DataFrame: the period column first, then
/// one nullable Float64 column per project, in sorted project order.
///
/// The period column is named `period` unless a project already takes that
/// name; see [`pivot_period_column`].
pub fn pivot_to_frame(aggregate: &Aggregate) -> ChartResult<DataFrame> {
    let periods: Vec<String> = aggregate.periods().map(str::to_string).collect();
    let period_column = pivot_period_column(&aggregate.project_names);

    let mut columns: Vec<Column> = Vec::with_capacity(aggregate.project_names.len() + 1);
    columns.push(Series::new(period_column.as_str().into(), periods).into());

    for name in &aggregate.project_names {
        let values: Vec<Option<f64>> = aggregate.rows.iter().map(|r| r.cost(name)).collect();
        columns.push(Series::new(name.as_str().into(), values).into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Name for the pivot's period column: `period`, prefixed with underscores
/// until it no longer matches a project name.
pub fn pivot_period_column<S: AsRef<str>>(project_names: &[S]) -> String {
    let mut name = pivot::PERIOD.to_string();
    while project_names.iter().any(|p| p.as_ref() == name) {
        log::debug!("project named {name:?}; moving the pivot period column");
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate;
    use crate::period::Granularity;

    #[test]
    fn string_frame_to_records() {
        let df = df!(
            cost::PERIOD => ["06/2024", "2024-06"],
            cost::PROJECT_NAME => ["A", "A"],
            cost::TOTAL_COST => [" 100 ", "50.5"]
        )
        .unwrap();

        let records = records_from_frame(&df).unwrap();
        assert_eq!(
            records,
            vec![
                CostRecord::new("06/2024", "A", 100.0),
                CostRecord::new("2024-06", "A", 50.5),
            ]
        );
    }

    #[test]
    fn numeric_costs_are_cast() {
        let df = df!(
            cost::PERIOD => ["2024-01"],
            cost::PROJECT_NAME => ["A"],
            cost::TOTAL_COST => [42i64]
        )
        .unwrap();
        assert_eq!(records_from_frame(&df).unwrap()[0].total_cost, 42.0);
    }

    #[test]
    fn missing_column_is_reported() {
        let df = df!(
            cost::PERIOD => ["2024-01"],
            cost::TOTAL_COST => [1.0]
        )
        .unwrap();
        assert!(matches!(
            records_from_frame(&df),
            Err(ChartError::MissingColumn(c)) if c == cost::PROJECT_NAME
        ));
    }

    #[test]
    fn bad_costs_are_rejected_with_row() {
        let df = df!(
            cost::PERIOD => ["2024-01", "2024-02"],
            cost::PROJECT_NAME => ["A", "A"],
            cost::TOTAL_COST => ["1", "lots"]
        )
        .unwrap();
        let err = records_from_frame(&df).unwrap_err().to_string();
        assert!(err.contains("row 1"), "{err}");

        let df = df!(
            cost::PERIOD => ["2024-01"],
            cost::PROJECT_NAME => ["A"],
            cost::TOTAL_COST => [-3.0]
        )
        .unwrap();
        assert!(matches!(records_from_frame(&df), Err(ChartError::InvalidData(_))));

        let df = df!(
            cost::PERIOD => ["2024-01"],
            cost::PROJECT_NAME => ["A"],
            cost::TOTAL_COST => [None::<&str>]
        )
        .unwrap();
        assert!(matches!(records_from_frame(&df), Err(ChartError::InvalidData(_))));
    }

    #[test]
    fn null_project_is_rejected() {
        let df = df!(
            cost::PERIOD => ["2024-01"],
            cost::PROJECT_NAME => [None::<&str>],
            cost::TOTAL_COST => [1.0]
        )
        .unwrap();
        let err = records_from_frame(&df).unwrap_err().to_string();
        assert!(err.contains(cost::PROJECT_NAME), "{err}");
    }

    #[test]
    fn date_periods_become_month_keys() {
        let dates = Series::new(cost::PERIOD.into(), [19_889i32, 19_722])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![
            dates.into(),
            Series::new(cost::PROJECT_NAME.into(), ["A", "B"]).into(),
            Series::new(cost::TOTAL_COST.into(), [1.0, 2.0]).into(),
        ])
        .unwrap();

        let periods: Vec<String> = records_from_frame(&df)
            .unwrap()
            .into_iter()
            .map(|r| r.period)
            .collect();
        assert_eq!(periods, vec!["2024-06", "2023-12"]);
    }

    #[test]
    fn datetime_periods_become_month_keys() {
        let stamps = Series::new(cost::PERIOD.into(), [1_704_196_800_000_000i64])
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![
            stamps.into(),
            Series::new(cost::PROJECT_NAME.into(), ["A"]).into(),
            Series::new(cost::TOTAL_COST.into(), [1.0]).into(),
        ])
        .unwrap();
        assert_eq!(records_from_frame(&df).unwrap()[0].period, "2024-01");
    }

    #[test]
    fn renames_skip_existing_targets() {
        let df = df!(
            service::MONTH => ["2024-01"],
            service::PROJECT_NAME => ["A"],
            cost::TOTAL_COST => [1.0]
        )
        .unwrap();
        let df = apply_renames(df, &default_renames()).unwrap();
        assert!(df.column(cost::PERIOD).is_ok());
        assert!(df.column(cost::PROJECT_NAME).is_ok());
        assert!(df.column(cost::TOTAL_COST).is_ok());
    }

    #[test]
    fn pivot_frame_keeps_absent_cells_null() {
        let records = vec![
            CostRecord::new("2024-01", "A", 10.0),
            CostRecord::new("2024-02", "B", 20.0),
        ];
        let df = pivot_to_frame(&aggregate(&records, Granularity::Month)).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(
            df.get_column_names_str(),
            vec![pivot::PERIOD, "A", "B"]
        );
        let a = df.column("A").unwrap().f64().unwrap();
        assert_eq!(a.get(0), Some(10.0));
        assert_eq!(a.get(1), None);
    }

    #[test]
    fn project_named_like_the_period_column() {
        let records = vec![
            CostRecord::new("2024-01", "period", 5.0),
            CostRecord::new("2024-02", "_period", 7.0),
            CostRecord::new("2024-02", "A", 1.0),
        ];
        let df = pivot_to_frame(&aggregate(&records, Granularity::Month)).unwrap();

        assert_eq!(df.shape(), (2, 4));
        assert_eq!(
            df.get_column_names_str(),
            vec!["__period", "A", "_period", "period"]
        );
        let periods: Vec<Option<&str>> = df.column("__period").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(periods, vec![Some("2024-01"), Some("2024-02")]);
        let clash = df.column("period").unwrap().f64().unwrap();
        assert_eq!(clash.get(0), Some(5.0));
        assert_eq!(clash.get(1), None);
    }

    #[test]
    fn empty_pivot_frame() {
        let df = pivot_to_frame(&aggregate(&[], Granularity::Year)).unwrap();
        assert_eq!(df.shape(), (0, 1));
    }
}
