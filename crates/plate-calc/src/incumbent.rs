//! 目前最佳解追蹤
//!
//! 求解器依序回報的改善解被視為一個序列，追蹤器是其上的 fold：
//! 只保留目標值嚴格最小的解，並在接受時轉成結果列與摘要。

use plate_core::{OptimizeResponse, OptimizedPlan, PlateError, PlateIndex, ResultRow, Result, Tag};
use plate_solver::MipSolution;
use std::time::Duration;

use crate::{model_builder::PlateModel, summary};

/// 已接受的最佳解
#[derive(Debug, Clone, PartialEq)]
pub struct Incumbent {
    /// 目標值（總張數）
    pub objective: i64,
    pub plan: OptimizedPlan,
    /// 自求解開始經過的時間
    pub found_after: Duration,
}

/// 最佳解追蹤器
#[derive(Debug, Clone)]
pub struct IncumbentTracker<'a> {
    tags: &'a [Tag],
    model: &'a PlateModel,
    ups_per_plate: u32,
    plate_count: u32,
    total_items: u64,
    observed: usize,
    trace: Vec<i64>,
    best: Option<Incumbent>,
}

impl<'a> IncumbentTracker<'a> {
    pub fn new(tags: &'a [Tag], model: &'a PlateModel, ups_per_plate: u32, plate_count: u32) -> Self {
        Self {
            tags,
            model,
            ups_per_plate,
            plate_count,
            total_items: tags.iter().map(|t| t.qty).sum(),
            observed: 0,
            trace: Vec::new(),
            best: None,
        }
    }

    /// 觀察一個解；目標值嚴格改善時取代目前最佳，相同目標值保留先到者
    pub fn observe(mut self, solution: &MipSolution) -> Self {
        self.observed += 1;

        let assignment = self.model.decode(solution);
        let objective = assignment.total_sheets();
        if self.best_objective().is_some_and(|best| objective >= best) {
            return self;
        }

        let mut rows = Vec::with_capacity(self.tags.len());
        for j in 0..self.plate_count as usize {
            let plate = PlateIndex::new(j);
            let sheets = assignment.sheets[j];
            for i in assignment.tags_on(plate) {
                rows.push(ResultRow::from_assignment(
                    &self.tags[i],
                    plate,
                    assignment.ups[i],
                    sheets,
                ));
            }
        }

        let summary = summary::summarize(
            &rows,
            objective,
            self.total_items,
            self.plate_count,
            self.ups_per_plate,
        );

        tracing::info!(
            "新的最佳解 #{}：總張數 {}，浪費 {}%，超產 {}，生產 {}",
            self.observed,
            summary.total_sheets,
            summary.waste_percentage,
            summary.total_excess,
            summary.total_produced
        );

        self.trace.push(objective);
        self.best = Some(Incumbent {
            objective,
            plan: OptimizedPlan {
                results: rows,
                summary,
            },
            found_after: solution.wall_time,
        });
        self
    }

    pub fn best(&self) -> Option<&Incumbent> {
        self.best.as_ref()
    }

    pub fn best_objective(&self) -> Option<i64> {
        self.best.as_ref().map(|b| b.objective)
    }

    /// 觀察過的解數量
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// 依序接受的目標值（嚴格遞減）
    pub fn trace(&self) -> &[i64] {
        &self.trace
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// 取出最佳方案；從未觀察到解時回傳 `NoSolution`
    pub fn into_plan(self) -> Result<OptimizedPlan> {
        self.best.map(|b| b.plan).ok_or(PlateError::NoSolution)
    }

    pub fn into_response(self) -> OptimizeResponse {
        OptimizeResponse::from_result(self.into_plan())
    }
}
