use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::period::{is_canonical, normalize_period, Granularity};

/// One project's cost for one period, as delivered by the statistics feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRecord {
    /// `YYYY-MM` or `MM/YYYY`; anything else is grouped verbatim.
    pub period: String,
    pub project_name: String,
    pub total_cost: f64,
}

impl CostRecord {
    pub fn new(period: impl Into<String>, project_name: impl Into<String>, total_cost: f64) -> Self {
        Self {
            period: period.into(),
            project_name: project_name.into(),
            total_cost,
        }
    }
}

/// One aggregated time bucket.
///
/// `costs` only holds projects that had at least one record in the bucket;
/// absence is not the same as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub period: String,
    pub costs: BTreeMap<String, f64>,
}

impl PivotRow {
    fn new(period: String) -> Self {
        Self {
            period,
            costs: BTreeMap::new(),
        }
    }

    pub fn cost(&self, project: &str) -> Option<f64> {
        self.costs.get(project).copied()
    }

    /// Height of the stacked bar for this bucket.
    pub fn total(&self) -> f64 {
        self.costs.values().sum()
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub granularity: Granularity,
    /// Ascending by canonical period key.
    pub rows: Vec<PivotRow>,
    /// Distinct project names, lexicographic.
    pub project_names: Vec<String>,
}

impl Aggregate {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of one project's cost across every bucket.
    pub fn project_total(&self, project: &str) -> f64 {
        self.rows.iter().filter_map(|r| r.cost(project)).sum()
    }

    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.period.as_str())
    }
}

/// Group records by canonical period and sum cost per project.
///
/// Duplicate `(project, period)` entries are summed. The returned rows are
/// ordered by [`sort_chronologically`].
pub fn aggregate(records: &[CostRecord], granularity: Granularity) -> Aggregate {
    let mut buckets: HashMap<String, PivotRow> = HashMap::new();
    let mut project_names: BTreeSet<&str> = BTreeSet::new();
    let mut opaque_keys = 0usize;

    for record in records {
        let key = normalize_period(&record.period, granularity);
        if !is_canonical(&key) {
            opaque_keys += 1;
        }

        let row = buckets
            .entry(key)
            .or_insert_with_key(|k| PivotRow::new(k.clone()));
        *row.costs.entry(record.project_name.clone()).or_insert(0.0) += record.total_cost;

        project_names.insert(record.project_name.as_str());
    }

    let mut rows: Vec<PivotRow> = buckets.into_values().collect();
    sort_chronologically(&mut rows);

    log::debug!(
        "aggregated {} records by {granularity}: {} periods, {} projects, {opaque_keys} records with opaque period keys",
        records.len(),
        rows.len(),
        project_names.len(),
    );

    Aggregate {
        granularity,
        rows,
        project_names: project_names.into_iter().map(str::to_string).collect(),
    }
}

/// Order rows ascending by period key using plain string comparison.
///
/// Chronological for canonical keys only; opaque keys land wherever their
/// literal text sorts.
pub fn sort_chronologically(rows: &mut [PivotRow]) {
    rows.sort_by(|a, b| a.period.cmp(&b.period));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(period: &str, project: &str, cost: f64) -> CostRecord {
        CostRecord::new(period, project, cost)
    }

    #[test]
    fn both_shapes_land_in_one_month_bucket() {
        let records = vec![rec("06/2024", "A", 100.0), rec("2024-06", "A", 50.0)];
        let agg = aggregate(&records, Granularity::Month);

        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.rows[0].period, "2024-06");
        assert_eq!(agg.rows[0].cost("A"), Some(150.0));
        assert_eq!(agg.project_names, vec!["A"]);
    }

    #[test]
    fn both_shapes_land_in_one_year_bucket() {
        let records = vec![rec("06/2024", "A", 100.0), rec("2024-06", "A", 50.0)];
        let agg = aggregate(&records, Granularity::Year);

        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.rows[0].period, "2024");
        assert_eq!(agg.rows[0].cost("A"), Some(150.0));
    }

    #[test]
    fn absent_projects_stay_absent() {
        let records = vec![rec("2024-01", "A", 10.0), rec("2024-02", "B", 20.0)];
        let agg = aggregate(&records, Granularity::Month);

        assert_eq!(agg.rows[0].cost("B"), None);
        assert_eq!(agg.rows[1].cost("A"), None);
        assert_eq!(agg.project_names, vec!["A", "B"]);
    }

    #[test]
    fn zero_cost_is_kept_as_a_value() {
        let agg = aggregate(&[rec("2024-01", "A", 0.0)], Granularity::Month);
        assert_eq!(agg.rows[0].cost("A"), Some(0.0));
    }

    #[test]
    fn rows_come_out_in_period_order() {
        let records = vec![
            rec("2024-01", "A", 1.0),
            rec("12/2023", "A", 1.0),
            rec("2023-02", "B", 1.0),
        ];
        let agg = aggregate(&records, Granularity::Month);
        let periods: Vec<&str> = agg.periods().collect();
        assert_eq!(periods, vec!["2023-02", "2023-12", "2024-01"]);

        let agg = aggregate(&records, Granularity::Year);
        let periods: Vec<&str> = agg.periods().collect();
        assert_eq!(periods, vec!["2023", "2024"]);
    }

    #[test]
    fn opaque_keys_group_by_literal_text() {
        let records = vec![
            rec("Q1 2024", "A", 5.0),
            rec("Q1 2024", "B", 7.0),
            rec("2024-01", "A", 1.0),
        ];
        let agg = aggregate(&records, Granularity::Year);
        let periods: Vec<&str> = agg.periods().collect();
        assert_eq!(periods, vec!["2024", "Q1 2024"]);
        assert_eq!(agg.rows[1].total(), 12.0);
    }

    #[test]
    fn empty_batch_yields_empty_aggregate() {
        let agg = aggregate(&[], Granularity::Month);
        assert!(agg.is_empty());
        assert!(agg.project_names.is_empty());
    }

    #[test]
    fn project_totals_and_row_totals() {
        let records = vec![
            rec("2024-01", "A", 1.5),
            rec("2024-01", "B", 2.0),
            rec("2024-02", "A", 3.0),
        ];
        let agg = aggregate(&records, Granularity::Month);
        assert_eq!(agg.project_total("A"), 4.5);
        assert_eq!(agg.project_total("missing"), 0.0);
        assert_eq!(agg.rows[0].total(), 3.5);
    }

    #[test]
    fn sorter_is_plain_lexicographic() {
        let mut rows = vec![
            PivotRow::new("2024-01".into()),
            PivotRow::new("2023-12".into()),
            PivotRow::new("2023".into()),
        ];
        sort_chronologically(&mut rows);
        let periods: Vec<&str> = rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2023", "2023-12", "2024-01"]);
    }

    #[test]
    fn records_serialize_with_snake_case_fields() {
        let json = serde_json::to_value(CostRecord::new("2024-01", "A", 2.5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"period": "2024-01", "project_name": "A", "total_cost": 2.5})
        );
    }
}
