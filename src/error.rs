use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Unknown granularity: '{0}'. Must be 'month' or 'year'")]
    UnknownGranularity(String),

    #[error("Unknown locale: {0}")]
    Locale(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ChartResult<T> = Result<T, ChartError>;

#[cfg(feature = "python")]
impl From<ChartError> for pyo3::PyErr {
    fn from(err: ChartError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};

        match err {
            ChartError::MissingColumn(_)
            | ChartError::InvalidData(_)
            | ChartError::Validation(_)
            | ChartError::UnknownGranularity(_)
            | ChartError::Locale(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
