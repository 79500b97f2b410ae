//! 結果摘要計算

use plate_core::{ResultRow, Summary};
use rust_decimal::{Decimal, RoundingStrategy};

/// 浪費百分比 = 100 × 超產量 / 實際生產量，四捨五入到小數兩位（銀行家捨入）
///
/// 生產量為 0 時回傳 0。
pub fn waste_percentage(total_excess: i64, total_produced: i64) -> Decimal {
    if total_produced <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(total_excess) * Decimal::ONE_HUNDRED / Decimal::from(total_produced))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// 經由十進位字串轉換，取得最接近的 f64（避免 7.69 變成 7.6899999...）
fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}

/// 由結果列與張數建立摘要
pub fn summarize(
    rows: &[ResultRow],
    total_sheets: i64,
    total_items: u64,
    plate_count: u32,
    ups_capacity: u32,
) -> Summary {
    let total_produced: i64 = rows.iter().map(|r| r.qty_produced).sum();
    let total_excess = total_produced - total_items as i64;
    let waste = waste_percentage(total_excess, total_produced);

    Summary {
        total_sheets,
        total_produced,
        total_excess,
        waste_percentage: decimal_to_f64(waste),
        total_plates: plate_count,
        total_items,
        ups_capacity,
    }
}
