//! 優化器配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 每張印版張數變數的上界
pub const DEFAULT_MAX_SHEETS: u32 = 10_000;

/// 乘積輔助變數（ups × 張數）的上界
pub const DEFAULT_MAX_PRODUCT: u64 = 1_000_000;

/// 貪婪初始解估算 ups 時使用的數量除數
pub const DEFAULT_SEED_QTY_DIVISOR: u64 = 1000;

/// 印版優化配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// 求解時間上限（牆鐘時間）
    pub time_limit: Duration,

    /// 求解器隨機種子（固定種子與工作者數量時結果可重現）
    pub random_seed: u64,

    /// 搜尋工作者數量
    pub num_workers: usize,

    /// 每張印版張數上界
    pub max_sheets: u32,

    /// 乘積輔助變數上界
    pub max_product: u64,

    /// 貪婪初始解：ups 估算 = QTY / 除數（夾在 [1, upsPerPlate]）
    pub seed_qty_divisor: u64,

    /// 是否將貪婪初始解作為提示交給求解器
    pub use_seed_hints: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(500),
            random_seed: 42,
            num_workers: 8,
            max_sheets: DEFAULT_MAX_SHEETS,
            max_product: DEFAULT_MAX_PRODUCT,
            seed_qty_divisor: DEFAULT_SEED_QTY_DIVISOR,
            use_seed_hints: true,
        }
    }
}

impl OptimizerConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置時間上限
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// 建構器模式：設置隨機種子
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// 建構器模式：設置工作者數量（至少 1）
    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers.max(1);
        self
    }

    /// 建構器模式：設置張數上界
    pub fn with_max_sheets(mut self, max_sheets: u32) -> Self {
        self.max_sheets = max_sheets;
        self
    }

    /// 建構器模式：設置乘積上界
    pub fn with_max_product(mut self, max_product: u64) -> Self {
        self.max_product = max_product;
        self
    }

    /// 建構器模式：設置貪婪估算除數
    pub fn with_seed_qty_divisor(mut self, divisor: u64) -> Self {
        self.seed_qty_divisor = divisor.max(1);
        self
    }

    /// 建構器模式：是否使用初始解提示
    pub fn with_seed_hints(mut self, enabled: bool) -> Self {
        self.use_seed_hints = enabled;
        self
    }
}
