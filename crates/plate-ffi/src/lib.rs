//! # Plate FFI
//!
//! Python 綁定層（PyO3），供負責 HTTP 的 Python 後端呼叫

use pyo3::prelude::*;

pub mod python;

/// `GET /` 存活檢查回應
pub const HEALTH_MESSAGE: &str = "Backend is up and running!";

/// Python 模組註冊
#[pymodule]
fn plate_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyPlateOptimizer>()?;
    m.add_function(wrap_pyfunction!(python::optimize_plates, m)?)?;
    m.add_function(wrap_pyfunction!(python::health, m)?)?;
    m.add_function(wrap_pyfunction!(python::no_solution_body, m)?)?;
    Ok(())
}
