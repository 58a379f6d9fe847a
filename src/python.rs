use std::collections::HashMap;

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyModule, PyString};
use pyo3_polars::PyDataFrame;

use crate::chart::ChartConfig;
use crate::color::{self, ColorTable, Palette};
use crate::format::ValueFormatter;
use crate::model::CostChartModel;
use crate::period::{self, Granularity};
use crate::schema;

fn palette_or_default(palette: Option<Vec<String>>) -> PyResult<Palette> {
    Ok(match palette {
        Some(colors) => Palette::new(colors)?,
        None => Palette::default(),
    })
}

#[pyclass(name = "CostChart")]
pub struct PyCostChart {
    model: CostChartModel,
}

#[pymethods]
impl PyCostChart {
    #[new]
    fn new(base_path: String) -> Self {
        Self {
            model: CostChartModel::new(base_path),
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a cost CSV and make it the current batch.
    ///
    /// Required columns (after rename): period, project_name, total_cost.
    /// Without `rename`, the service names month / projectName / totalCost
    /// are mapped automatically. Returns the number of records loaded.
    #[pyo3(signature = (filename, rename=None))]
    fn load_csv(
        &mut self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<usize> {
        Ok(self.model.load_csv(filename, rename.as_ref())?.len())
    }

    #[pyo3(signature = (filename, rename=None))]
    fn load_parquet(
        &mut self,
        filename: &str,
        rename: Option<HashMap<String, String>>,
    ) -> PyResult<usize> {
        Ok(self.model.load_parquet(filename, rename.as_ref())?.len())
    }

    /// Load cost records from a polars DataFrame.
    fn load_frame(&mut self, df: PyDataFrame) -> PyResult<usize> {
        Ok(self.model.load_frame(&df.0)?.len())
    }

    // ── Granularity ─────────────────────────────────────────────────────────

    /// "month" or "year".
    #[getter]
    fn granularity(&self) -> &'static str {
        self.model.granularity().as_str()
    }

    #[setter]
    fn set_granularity(&mut self, granularity: &str) -> PyResult<()> {
        self.model.set_granularity(granularity.parse::<Granularity>()?);
        Ok(())
    }

    // ── Derived views ───────────────────────────────────────────────────────

    fn project_names(&mut self) -> Vec<String> {
        self.model.aggregate().project_names.clone()
    }

    /// Wide table: period plus one cost column per project (null when absent).
    /// The period column comes first; it is `_period` if a project is named
    /// `period`.
    fn pivot(&mut self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.model.pivot_frame()?))
    }

    #[pyo3(signature = (palette=None))]
    fn colors(&mut self, palette: Option<Vec<String>>) -> PyResult<ColorTable> {
        let palette = palette_or_default(palette)?;
        Ok(self.model.colors(&palette))
    }

    /// Chart description as JSON for the rendering layer.
    ///
    /// Args:
    ///     palette: Series colors (default: 8-color built-in palette)
    ///     locale: Number grouping locale (default: "en")
    ///     tooltip_header: Tooltip header prefix (default: "Period")
    ///     pretty: Indent the JSON (default: False)
    #[pyo3(signature = (
        palette = None,
        locale = "en",
        tooltip_header = "Period",
        pretty = false,
    ))]
    fn chart_json(
        &mut self,
        palette: Option<Vec<String>>,
        locale: &str,
        tooltip_header: &str,
        pretty: bool,
    ) -> PyResult<String> {
        let config = ChartConfig {
            palette: palette_or_default(palette)?,
            locale: locale.to_string(),
            tooltip_header: tooltip_header.to_string(),
        };
        let chart = self.model.chart(&config)?;
        let json = if pretty {
            chart.to_json_pretty()?
        } else {
            chart.to_json()?
        };
        Ok(json)
    }
}

#[pyfunction]
#[pyo3(signature = (period, granularity="month"))]
fn normalize_period(period: &str, granularity: &str) -> PyResult<String> {
    Ok(period::normalize_period(period, granularity.parse::<Granularity>()?))
}

/// Grouped text for numbers; any other value is returned unchanged.
#[pyfunction]
#[pyo3(signature = (value, locale="en"))]
fn format_value<'py>(value: &Bound<'py, PyAny>, locale: &str) -> PyResult<Bound<'py, PyAny>> {
    let formatter = ValueFormatter::for_locale_name(locale)?;
    if value.is_instance_of::<PyBool>() {
        return Ok(value.clone());
    }
    match value.extract::<f64>() {
        Ok(n) => Ok(PyString::new(value.py(), &formatter.number(n)).into_any()),
        Err(_) => Ok(value.clone()),
    }
}

#[pyfunction]
#[pyo3(signature = (names, palette=None))]
fn assign_colors(names: Vec<String>, palette: Option<Vec<String>>) -> PyResult<ColorTable> {
    let palette = palette_or_default(palette)?;
    Ok(color::assign_colors(&names, &palette))
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let columns = PyModule::new(m.py(), "columns")?;
    columns.add("PERIOD", schema::cost::PERIOD)?;
    columns.add("PROJECT_NAME", schema::cost::PROJECT_NAME)?;
    columns.add("TOTAL_COST", schema::cost::TOTAL_COST)?;
    m.add_submodule(&columns)?;

    let granularity = PyModule::new(m.py(), "granularity")?;
    granularity.add("MONTH", schema::granularity::MONTH)?;
    granularity.add("YEAR", schema::granularity::YEAR)?;
    m.add_submodule(&granularity)?;

    m.add("DEFAULT_PALETTE", color::DEFAULT_PALETTE.to_vec())?;
    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCostChart>()?;
    m.add_function(wrap_pyfunction!(normalize_period, m)?)?;
    m.add_function(wrap_pyfunction!(format_value, m)?)?;
    m.add_function(wrap_pyfunction!(assign_colors, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
