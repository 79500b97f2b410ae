//! # Plate Calculation Engine
//!
//! 印版 ups 優化核心：貪婪初始解、約束模型建構、最佳解追蹤與主流程

pub mod incumbent;
pub mod model_builder;
pub mod optimizer;
pub mod seed;
pub mod summary;

// Re-export 主要類型
pub use incumbent::{Incumbent, IncumbentTracker};
pub use model_builder::{PlateAssignment, PlateModel, PlateModelBuilder};
pub use optimizer::{optimize_json, OptimizationReport, PlateOptimizer};
pub use seed::{SeedAssignment, SeedGenerator};
