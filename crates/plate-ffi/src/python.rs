//! Python 綁定實現

use plate_calc::PlateOptimizer;
use plate_core::{OptimizeRequest, OptimizeResponse, OptimizerConfig};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::time::Duration;

/// Python 印版優化器
#[pyclass(name = "PlateOptimizer")]
pub struct PyPlateOptimizer {
    #[pyo3(get, set)]
    pub time_limit_secs: f64,
    #[pyo3(get, set)]
    pub random_seed: u64,
    #[pyo3(get, set)]
    pub num_workers: usize,
    #[pyo3(get, set)]
    pub max_sheets: u32,
    #[pyo3(get, set)]
    pub use_seed_hints: bool,
}

#[pymethods]
impl PyPlateOptimizer {
    #[new]
    #[pyo3(signature = (time_limit_secs=500.0, random_seed=42, num_workers=8))]
    fn new(time_limit_secs: f64, random_seed: u64, num_workers: usize) -> Self {
        let defaults = OptimizerConfig::default();
        Self {
            time_limit_secs,
            random_seed,
            num_workers,
            max_sheets: defaults.max_sheets,
            use_seed_hints: defaults.use_seed_hints,
        }
    }

    /// 執行優化，回傳 `POST /optimize-plates` 的回應 JSON
    ///
    /// 找不到解或請求無效時回傳 `{"error": ...}`，不拋出例外。
    fn optimize(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let config = self.to_rust_config()?;
        Ok(py.allow_threads(|| PlateOptimizer::new(config).optimize_json(request_json)))
    }

    /// 執行優化，回傳包含求解狀態與耗時的診斷報告 JSON
    ///
    /// 請求無效時拋出 `ValueError`。
    fn optimize_report(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let config = self.to_rust_config()?;
        let request = OptimizeRequest::from_json(request_json)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        let report = py
            .allow_threads(|| PlateOptimizer::new(config).optimize(&request))
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        serde_json::to_string(&report).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "PlateOptimizer(time_limit_secs={}, random_seed={}, num_workers={})",
            self.time_limit_secs, self.random_seed, self.num_workers
        )
    }
}

/// 內部方法實現（不暴露給 Python）
impl PyPlateOptimizer {
    /// 轉換為 Rust OptimizerConfig（內部使用）
    pub(crate) fn to_rust_config(&self) -> PyResult<OptimizerConfig> {
        let time_limit = Duration::try_from_secs_f64(self.time_limit_secs).map_err(|_| {
            PyValueError::new_err(format!(
                "Invalid time_limit_secs: {}, must be a non-negative number",
                self.time_limit_secs
            ))
        })?;
        if self.max_sheets == 0 {
            return Err(PyValueError::new_err("max_sheets must be at least 1"));
        }

        Ok(OptimizerConfig::default()
            .with_time_limit(time_limit)
            .with_random_seed(self.random_seed)
            .with_num_workers(self.num_workers)
            .with_max_sheets(self.max_sheets)
            .with_seed_hints(self.use_seed_hints))
    }
}

/// 以預設配置執行優化，回傳回應 JSON
#[pyfunction]
pub fn optimize_plates(py: Python<'_>, request_json: &str) -> String {
    py.allow_threads(|| plate_calc::optimize_json(request_json))
}

/// 存活檢查
#[pyfunction]
pub fn health() -> &'static str {
    crate::HEALTH_MESSAGE
}

/// 無解時的回應 JSON（供 Python 端比對）
#[pyfunction]
pub fn no_solution_body() -> PyResult<String> {
    OptimizeResponse::error(&plate_core::PlateError::NoSolution)
        .to_json()
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))
}
