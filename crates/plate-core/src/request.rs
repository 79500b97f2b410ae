//! 優化請求（`POST /optimize-plates` 的請求主體）

use serde::{Deserialize, Serialize};

use crate::{PlateError, Result, Tag};

/// 印版優化請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    /// 待分配的吊牌
    pub tags: Vec<Tag>,

    /// 每張印版的 ups 容量
    pub ups_per_plate: u32,

    /// 印版數量
    pub plate_count: u32,
}

impl OptimizeRequest {
    /// 創建新的請求
    pub fn new(tags: Vec<Tag>, ups_per_plate: u32, plate_count: u32) -> Self {
        Self {
            tags,
            ups_per_plate,
            plate_count,
        }
    }

    /// 從 JSON 解析請求
    ///
    /// 缺少欄位、型別錯誤或負數都視為無效輸入。
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PlateError::InvalidInput(e.to_string()))
    }

    /// 驗證請求內容
    pub fn validate(&self) -> Result<()> {
        if self.tags.is_empty() {
            return Err(PlateError::InvalidInput("tags 不可為空".to_string()));
        }
        if self.ups_per_plate == 0 {
            return Err(PlateError::InvalidInput(
                "upsPerPlate 必須至少為 1".to_string(),
            ));
        }
        if self.plate_count == 0 {
            return Err(PlateError::InvalidInput(
                "plateCount 必須至少為 1".to_string(),
            ));
        }
        if let Some(tag) = self.tags.iter().find(|t| i64::try_from(t.qty).is_err()) {
            return Err(PlateError::InvalidInput(format!(
                "吊牌 {}/{} 的 QTY 超出範圍: {}",
                tag.color, tag.size, tag.qty
            )));
        }
        Ok(())
    }

    /// 所有吊牌需求數量總和
    pub fn total_items(&self) -> u64 {
        self.tags.iter().map(|t| t.qty).sum()
    }
}
