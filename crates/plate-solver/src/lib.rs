//! 整數規劃求解層
//!
//! 提供建模詞彙（整數與布林變數、線性約束、big-M 與取值展開的乘積線性化、
//! 最小化目標、暖啟動提示值），以及 [`ConstraintSolver`] 介面與以
//! HiGHS（經由 `good_lp`）實作的 [`HighsSolver`]。

pub mod model;
pub mod solution;
pub mod solver;

pub use model::{
    BoolVar, Comparison, IntVar, LinearConstraint, LinearExpr, MipModel, OneHot, VarInfo,
};
pub use solution::MipSolution;
pub use solver::{ConstraintSolver, HighsSolver, SolveOutcome, SolveStatus, SolverParams};

/// 建模錯誤
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("變數 {name} 的定義域為空: [{lo}, {hi}]")]
    EmptyDomain { name: String, lo: i64, hi: i64 },

    #[error("未知的變數索引: {0}")]
    UnknownVariable(usize),

    #[error("乘積線性化的變數 {0} 定義域含負值")]
    NegativeProductDomain(String),

    #[error("變數 {0} 不是布林變數")]
    NotBoolean(String),

    #[error("變數 {name} 的定義域過寬（{width} 個取值），無法展開")]
    DomainTooWide { name: String, width: i64 },

    #[error("賦值長度錯誤: 預期 {expected}，實際 {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("變數 {name} 的值 {value} 超出定義域")]
    ValueOutOfDomain { name: String, value: i64 },

    #[error("第 {0} 條約束未滿足")]
    ConstraintViolated(usize),
}

/// 求解錯誤
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("模型錯誤: {0}")]
    Model(#[from] ModelError),

    #[error("求解後端錯誤: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;
