//! 吊牌（SKU）模型

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 吊牌：以顏色/尺寸識別，並帶有需求生產數量
///
/// 除 `COLOR`、`SIZE`、`QTY` 以外的欄位（如 `ITEM_DESCRIPTION`、`ITEM_CODE`、
/// `PRICE`、`RATIO`、`RUN`、`SHEET`）原樣保存在 `extra`，並原樣輸出到結果列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// 顏色
    #[serde(rename = "COLOR")]
    pub color: String,

    /// 尺寸
    #[serde(rename = "SIZE")]
    pub size: String,

    /// 需求生產數量
    #[serde(rename = "QTY")]
    pub qty: u64,

    /// 附加欄位（透傳）
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Tag {
    /// 創建新的吊牌
    pub fn new(color: impl Into<String>, size: impl Into<String>, qty: u64) -> Self {
        Self {
            color: color.into(),
            size: size.into(),
            qty,
            extra: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置附加欄位
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// 讀取附加欄位
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// 吊牌識別鍵（顏色, 尺寸）
    pub fn key(&self) -> (&str, &str) {
        (&self.color, &self.size)
    }
}
