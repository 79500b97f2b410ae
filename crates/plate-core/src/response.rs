//! 優化回應（結果列、摘要與錯誤主體）

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{PlateError, PlateIndex, Result, Tag};

/// 結果列自身的欄位名稱；附加欄位同名時以計算值為準
pub const RESULT_COLUMNS: [&str; 8] = [
    "COLOR",
    "SIZE",
    "QTY",
    "PLATE",
    "OPTIMAL_UPS",
    "SHEETS_NEEDED",
    "QTY_PRODUCED",
    "EXCESS",
];

/// 單一吊牌的分配結果列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "COLOR")]
    pub color: String,

    #[serde(rename = "SIZE")]
    pub size: String,

    /// 需求數量
    #[serde(rename = "QTY")]
    pub qty: u64,

    /// 印版標籤（A, B, ...）
    #[serde(rename = "PLATE")]
    pub plate: String,

    /// 每次壓印的 ups
    #[serde(rename = "OPTIMAL_UPS")]
    pub optimal_ups: i64,

    /// 所屬印版的張數
    #[serde(rename = "SHEETS_NEEDED")]
    pub sheets_needed: i64,

    /// 實際生產量 = ups × 張數
    #[serde(rename = "QTY_PRODUCED")]
    pub qty_produced: i64,

    /// 超產量 = 實際生產量 - 需求數量
    #[serde(rename = "EXCESS")]
    pub excess: i64,

    /// 吊牌附加欄位（透傳）
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResultRow {
    /// 由吊牌與分配結果建立結果列
    ///
    /// 與結果欄位同名的附加欄位（例如重新優化時帶回的 `PLATE`、`EXCESS`）
    /// 會被捨棄，避免輸出重複鍵。
    pub fn from_assignment(tag: &Tag, plate: PlateIndex, ups: i64, sheets: i64) -> Self {
        let qty_produced = ups * sheets;
        Self {
            color: tag.color.clone(),
            size: tag.size.clone(),
            qty: tag.qty,
            plate: plate.label(),
            optimal_ups: ups,
            sheets_needed: sheets,
            qty_produced,
            excess: qty_produced - tag.qty as i64,
            extra: tag
                .extra
                .iter()
                .filter(|(key, _)| !RESULT_COLUMNS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// 優化摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_sheets: i64,
    pub total_produced: i64,
    pub total_excess: i64,
    /// 浪費百分比（小數兩位）
    pub waste_percentage: f64,
    pub total_plates: u32,
    pub total_items: u64,
    pub ups_capacity: u32,
}

/// 成功的優化結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPlan {
    /// 結果列：依印版排序，同印版內依輸入順序
    pub results: Vec<ResultRow>,
    pub summary: Summary,
}

impl OptimizedPlan {
    /// 指定印版的所有結果列
    pub fn rows_on(&self, plate_label: &str) -> impl Iterator<Item = &ResultRow> {
        let label = plate_label.to_string();
        self.results.iter().filter(move |r| r.plate == label)
    }
}

/// 錯誤主體
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `POST /optimize-plates` 回應主體
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizeResponse {
    Solved(OptimizedPlan),
    Failed(ErrorBody),
}

impl OptimizeResponse {
    /// 將優化結果轉為回應主體，錯誤以結構化主體呈現
    pub fn from_result(result: Result<OptimizedPlan>) -> Self {
        match result {
            Ok(plan) => OptimizeResponse::Solved(plan),
            Err(err) => OptimizeResponse::error(&err),
        }
    }

    /// 錯誤回應
    pub fn error(err: &PlateError) -> Self {
        OptimizeResponse::Failed(ErrorBody {
            error: err.to_string(),
        })
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, OptimizeResponse::Solved(_))
    }

    pub fn plan(&self) -> Option<&OptimizedPlan> {
        match self {
            OptimizeResponse::Solved(plan) => Some(plan),
            OptimizeResponse::Failed(_) => None,
        }
    }

    /// 序列化為 JSON 字串
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
