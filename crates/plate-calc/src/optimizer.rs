//! 印版優化主流程

use chrono::{DateTime, Utc};
use plate_core::{
    OptimizeRequest, OptimizeResponse, OptimizedPlan, OptimizerConfig, PlateError, Result,
};
use plate_solver::{ConstraintSolver, HighsSolver, SolveStatus, SolverParams};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    incumbent::IncumbentTracker,
    model_builder::PlateModelBuilder,
    seed::{self, SeedGenerator},
};

/// 單次優化的診斷報告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub run_id: Uuid,
    pub solved_at: DateTime<Utc>,
    pub status: SolveStatus,
    pub wall_time: Duration,
    pub best_objective_bound: Option<i64>,
    pub best_objective: Option<i64>,
    /// 求解器回報的改善解數量
    pub solutions_seen: usize,
    /// 依序接受的目標值
    pub objective_trace: Vec<i64>,
    pub response: OptimizeResponse,
}

impl OptimizationReport {
    pub fn is_solved(&self) -> bool {
        self.response.is_solved()
    }

    pub fn plan(&self) -> Option<&OptimizedPlan> {
        self.response.plan()
    }

    pub fn into_plan(self) -> Result<OptimizedPlan> {
        match self.response {
            OptimizeResponse::Solved(plan) => Ok(plan),
            OptimizeResponse::Failed(_) => Err(PlateError::NoSolution),
        }
    }
}

/// 印版優化器
pub struct PlateOptimizer<S = HighsSolver> {
    solver: S,
    config: OptimizerConfig,
}

impl PlateOptimizer<HighsSolver> {
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_solver(HighsSolver::new(), config)
    }
}

impl Default for PlateOptimizer<HighsSolver> {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl<S: ConstraintSolver> PlateOptimizer<S> {
    pub fn with_solver(solver: S, config: OptimizerConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_params(&self) -> SolverParams {
        SolverParams::default()
            .with_time_limit(self.config.time_limit)
            .with_random_seed(self.config.random_seed)
            .with_num_workers(self.config.num_workers)
    }

    /// 執行優化
    ///
    /// 請求無效或模型建構失敗時回傳錯誤；找不到解時回傳的報告帶有
    /// `{"error": "No solution found"}` 回應。
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizationReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("optimize_plates", %run_id);
        let _guard = span.enter();

        request.validate()?;

        tracing::info!(
            "開始印版優化：吊牌 {} 筆，印版 {} 張，每版容量 {} ups",
            request.tags.len(),
            request.plate_count,
            request.ups_per_plate
        );

        if let Some(reason) = self.trivially_infeasible(request) {
            tracing::warn!("不需搜尋即可判定無解: {}", reason);
            return Ok(OptimizationReport {
                run_id,
                solved_at: Utc::now(),
                status: SolveStatus::Infeasible,
                wall_time: Duration::ZERO,
                best_objective_bound: None,
                best_objective: None,
                solutions_seen: 0,
                objective_trace: Vec::new(),
                response: OptimizeResponse::error(&PlateError::NoSolution),
            });
        }

        // Step 1: 貪婪初始解
        let seed = if self.config.use_seed_hints {
            let seed = SeedGenerator::new(request.ups_per_plate, request.plate_count)
                .with_qty_divisor(self.config.seed_qty_divisor)
                .generate(&request.tags);
            if !seed::is_within_capacity(&seed, request.ups_per_plate, request.plate_count) {
                tracing::warn!("初始解超出印版容量，僅作為提示使用");
            }
            Some(seed)
        } else {
            None
        };

        // Step 2: 建構模型
        let mut builder =
            PlateModelBuilder::new(&request.tags, request.ups_per_plate, request.plate_count)
                .with_max_sheets(self.config.max_sheets)
                .with_max_product(self.config.max_product);
        if let Some(seed) = seed.as_deref() {
            builder = builder.with_seed(seed);
        }
        let model = builder
            .build()
            .map_err(|e| PlateError::Model(e.to_string()))?;

        // Step 3: 求解，每個改善解回報時即 fold 進追蹤器
        let mut tracker = Some(IncumbentTracker::new(
            &request.tags,
            &model,
            request.ups_per_plate,
            request.plate_count,
        ));
        let outcome = self
            .solver
            .solve(model.mip_model(), &self.solver_params(), &mut |s| {
                tracker = tracker.take().map(|t| t.observe(s));
            })
            .map_err(|e| PlateError::Solver(e.to_string()))?;
        let tracker =
            tracker.ok_or_else(|| PlateError::Solver("最佳解追蹤器遺失".to_string()))?;

        tracing::info!("求解狀態: {}", outcome.status);
        tracing::info!("改善解數量: {}", tracker.observed());
        tracing::info!("耗時: {:.2}s", outcome.wall_time.as_secs_f64());
        tracing::info!("目標下界: {:?}", outcome.best_objective_bound);
        tracing::info!("最佳目標值: {:?}", tracker.best_objective());

        let best_objective = tracker.best_objective();
        let solutions_seen = tracker.observed();
        let objective_trace = tracker.trace().to_vec();
        let response = tracker.into_response();
        if !response.is_solved() {
            tracing::warn!("時限內未找到任何解");
        }

        Ok(OptimizationReport {
            run_id,
            solved_at: Utc::now(),
            status: outcome.status,
            wall_time: outcome.wall_time,
            best_objective_bound: outcome.best_objective_bound,
            best_objective,
            solutions_seen,
            objective_trace,
            response,
        })
    }

    /// 執行優化並只取最佳方案
    pub fn solve(&self, request: &OptimizeRequest) -> Result<OptimizedPlan> {
        self.optimize(request)?.into_plan()
    }

    /// 處理 `POST /optimize-plates` 的 JSON 主體，回傳回應 JSON
    pub fn optimize_json(&self, body: &str) -> String {
        let response = OptimizeRequest::from_json(body)
            .and_then(|request| self.optimize(&request))
            .map(|report| report.response)
            .unwrap_or_else(|err| {
                tracing::warn!("優化請求失敗: {}", err);
                OptimizeResponse::error(&err)
            });
        render(&response)
    }

    /// 不需搜尋即可判定無解的情況
    fn trivially_infeasible(&self, request: &OptimizeRequest) -> Option<String> {
        let slots = request.plate_count as u64 * request.ups_per_plate as u64;
        if request.tags.len() as u64 > slots {
            return Some(format!(
                "吊牌 {} 筆超過可用 ups 總數 {}",
                request.tags.len(),
                slots
            ));
        }

        let max_output = (request.ups_per_plate as u64 * self.config.max_sheets as u64)
            .min(self.config.max_product);
        request.tags.iter().find(|t| t.qty > max_output).map(|t| {
            format!(
                "吊牌 {}/{} 的 QTY {} 超過單版最大產量 {}",
                t.color, t.size, t.qty, max_output
            )
        })
    }
}

/// 以預設配置處理 JSON 請求
pub fn optimize_json(body: &str) -> String {
    PlateOptimizer::<HighsSolver>::default().optimize_json(body)
}

fn render(response: &OptimizeResponse) -> String {
    response.to_json().unwrap_or_else(|err| {
        serde_json::json!({ "error": err.to_string() }).to_string()
    })
}
