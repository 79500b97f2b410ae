//! # Plate Core
//!
//! 核心資料模型與類型定義（吊牌、印版、請求與回應格式）

pub mod config;
pub mod plate;
pub mod request;
pub mod response;
pub mod tag;

// Re-export 主要類型
pub use config::OptimizerConfig;
pub use plate::PlateIndex;
pub use request::OptimizeRequest;
pub use response::{ErrorBody, OptimizeResponse, OptimizedPlan, ResultRow, Summary};
pub use tag::Tag;

/// 印版優化錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PlateError {
    #[error("無效的請求: {0}")]
    InvalidInput(String),

    /// 對外回應固定使用此字串，前端依此判斷
    #[error("No solution found")]
    NoSolution,

    #[error("模型建構錯誤: {0}")]
    Model(String),

    #[error("求解器錯誤: {0}")]
    Solver(String),

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlateError>;
