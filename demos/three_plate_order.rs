//! # 三版訂單優化範例
//!
//! 18 個吊牌（三種顏色 × 六種尺寸）分配到 3 張印版，每版容量 20 ups。

use anyhow::Context;
use plateopt::{OptimizeRequest, OptimizerConfig, PlateOptimizer, Tag};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let order = [
        ("812 GREY VIGO", "XXS", 60),
        ("800 BLACK", "XXS", 72),
        ("676 ROSA EMPO", "XXS", 96),
        ("812 GREY VIGO", "XL", 121),
        ("800 BLACK", "XL", 145),
        ("676 ROSA EMPO", "XL", 193),
        ("812 GREY VIGO", "XS", 337),
        ("812 GREY VIGO", "L", 366),
        ("800 BLACK", "XS", 407),
        ("800 BLACK", "L", 439),
        ("676 ROSA EMPO", "XS", 540),
        ("676 ROSA EMPO", "L", 586),
        ("812 GREY VIGO", "M", 833),
        ("812 GREY VIGO", "S", 883),
        ("800 BLACK", "M", 999),
        ("800 BLACK", "S", 1059),
        ("676 ROSA EMPO", "M", 1333),
        ("676 ROSA EMPO", "S", 1412),
    ];
    let tags = order
        .iter()
        .map(|&(color, size, qty)| Tag::new(color, size, qty))
        .collect();
    let request = OptimizeRequest::new(tags, 20, 3);

    let config = OptimizerConfig::default()
        .with_time_limit(Duration::from_secs(20))
        .with_num_workers(4);
    let report = PlateOptimizer::new(config)
        .optimize(&request)
        .context("優化請求無效")?;

    println!("求解狀態: {}", report.status);
    println!("耗時: {:.2}s", report.wall_time.as_secs_f64());
    println!("目標變化: {:?}", report.objective_trace);

    match report.plan() {
        Some(plan) => {
            println!(
                "{:<16} {:<5} {:>6} {:>5} {:>4} {:>7} {:>8} {:>6}",
                "COLOR", "SIZE", "QTY", "PLATE", "UPS", "SHEETS", "PRODUCED", "EXCESS"
            );
            for row in &plan.results {
                println!(
                    "{:<16} {:<5} {:>6} {:>5} {:>4} {:>7} {:>8} {:>6}",
                    row.color,
                    row.size,
                    row.qty,
                    row.plate,
                    row.optimal_ups,
                    row.sheets_needed,
                    row.qty_produced,
                    row.excess
                );
            }
            println!();
            println!("{}", serde_json::to_string_pretty(&plan.summary)?);
        }
        None => println!("{}", report.response.to_json()?),
    }

    Ok(())
}
