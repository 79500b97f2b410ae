//! 求解器回報的解

use std::time::Duration;

use crate::model::{BoolVar, IntVar};

/// 一組完整賦值及其目標值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipSolution {
    values: Vec<i64>,
    objective: i64,
    /// 自求解開始經過的時間
    pub wall_time: Duration,
}

impl MipSolution {
    pub fn new(values: Vec<i64>, objective: i64, wall_time: Duration) -> Self {
        Self {
            values,
            objective,
            wall_time,
        }
    }

    #[inline]
    pub fn value(&self, var: impl Into<IntVar>) -> i64 {
        self.values[var.into().index()]
    }

    #[inline]
    pub fn bool_value(&self, var: BoolVar) -> bool {
        self.values[var.index()] != 0
    }

    pub fn objective(&self) -> i64 {
        self.objective
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}
