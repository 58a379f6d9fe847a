/// Column-name constants for cost frames.
/// Single source of truth - exported to Python via PyO3.

// ── Cost record columns ─────────────────────────────────────────────────────
pub mod cost {
    pub const PERIOD: &str = "period";
    pub const PROJECT_NAME: &str = "project_name";
    pub const TOTAL_COST: &str = "total_cost";

    pub const ALL: [&str; 3] = [PERIOD, PROJECT_NAME, TOTAL_COST];
}

// ── Upstream statistics service names ───────────────────────────────────────
/// Field names used by the statistics service payload. Mapped onto
/// [`cost`] columns by the default rename map.
pub mod service {
    pub const MONTH: &str = "month";
    pub const PROJECT_NAME: &str = "projectName";
    pub const TOTAL_COST: &str = "totalCost";

    pub const RENAMES: [(&str, &str); 3] = [
        (MONTH, super::cost::PERIOD),
        (PROJECT_NAME, super::cost::PROJECT_NAME),
        (TOTAL_COST, super::cost::TOTAL_COST),
    ];
}

// ── Pivot columns ───────────────────────────────────────────────────────────
pub mod pivot {
    pub const PERIOD: &str = "period";
}

// ── Granularity values ──────────────────────────────────────────────────────
pub mod granularity {
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
}
