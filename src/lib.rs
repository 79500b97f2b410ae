//! # plateopt
//!
//! 印版 ups 優化：將吊牌分配到固定數量的印版，決定每個吊牌的 ups 與每張印版的張數，
//! 在滿足需求數量與印版容量的前提下最小化總張數。

pub use plate_calc as calc;
pub use plate_core as types;
pub use plate_solver as solver;

pub use plate_calc::{optimize_json, OptimizationReport, PlateOptimizer};
pub use plate_core::{
    OptimizeRequest, OptimizeResponse, OptimizedPlan, OptimizerConfig, PlateError, PlateIndex,
    ResultRow, Summary, Tag,
};
pub use plate_solver::{ConstraintSolver, HighsSolver, SolveStatus, SolverParams};
