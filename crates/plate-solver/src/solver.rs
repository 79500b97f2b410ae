//! 求解器介面與 HiGHS 實作

use good_lp::solvers::highs::{highs, HighsProblem};
use good_lp::solvers::SolutionStatus;
use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    WithInitialSolution, WithTimeLimit,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use crate::{
    model::{Comparison, LinearConstraint, LinearExpr, MipModel},
    solution::MipSolution,
    SolverError,
};

/// 線性鬆弛下界的求解時限
const RELAXATION_TIME_LIMIT: Duration = Duration::from_secs(10);

/// 整數性容差：後端回傳值與最近整數的距離上限
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// 求解參數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverParams {
    /// 牆鐘時間上限
    pub time_limit: Duration,
    /// 隨機種子
    pub random_seed: u64,
    /// 平行度；大於 1 時開啟後端的平行模式
    pub num_workers: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(500),
            random_seed: 42,
            num_workers: 8,
        }
    }
}

impl SolverParams {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers.max(1);
        self
    }

    /// HiGHS 的 `random_seed` 選項只接受非負 32 位整數
    fn highs_seed(&self) -> i32 {
        (self.random_seed % (i32::MAX as u64 + 1)) as i32
    }
}

/// 求解終止狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// 已證明最佳
    Optimal,
    /// 有可行解但未證明最佳
    Feasible,
    /// 已證明無解
    Infeasible,
    /// 時限內未找到解
    Unknown,
}

impl SolveStatus {
    pub fn name(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 求解結果摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// 求解耗時
    pub wall_time: Duration,
    /// 目標下界：已證明最佳時等於最佳目標值，否則為線性鬆弛的最佳值（向上取整）
    pub best_objective_bound: Option<i64>,
    /// 最佳目標值
    pub objective: Option<i64>,
    /// 回呼次數（每次皆為嚴格改善）
    pub solutions: usize,
}

/// 約束求解能力
///
/// 每找到一個嚴格改善的解就在呼叫端執行緒上依序呼叫 `on_solution`，
/// 目標值嚴格遞減；提示值僅作為暖啟動，不要求可行。
pub trait ConstraintSolver {
    fn solve(
        &self,
        model: &MipModel,
        params: &SolverParams,
        on_solution: &mut dyn FnMut(&MipSolution),
    ) -> Result<SolveOutcome, SolverError>;
}

/// 以 HiGHS 求解整數線性模型
///
/// 完整且可行的提示值會先作為第一個解回報，再交給 HiGHS 作為初始解；
/// HiGHS 結束後回報其最佳解（若嚴格更好）。回傳的賦值一律以
/// [`MipModel::check`] 重新驗證。
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }

    fn problem(
        &self,
        model: &MipModel,
        params: &SolverParams,
        time_limit: Duration,
        integral: bool,
    ) -> (HighsProblem, Vec<Variable>) {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .vars()
            .iter()
            .map(|info| {
                let def = variable()
                    .min(info.lo as f64)
                    .max(info.hi as f64)
                    .name(info.name.clone());
                vars.add(if integral { def.integer() } else { def })
            })
            .collect();

        let objective = model
            .objective()
            .map_or_else(|| Expression::from(0.0), |obj| expression(obj, &handles));

        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .with_time_limit(time_limit.as_secs_f64())
            .set_option("output_flag", false)
            .set_option("random_seed", params.highs_seed())
            .set_option("parallel", if params.num_workers > 1 { "on" } else { "off" })
            .set_option("mip_rel_gap", 0.0);

        for constraint in model.constraints() {
            problem.add_constraint(to_constraint(constraint, &handles));
        }
        (problem, handles)
    }

    /// 線性鬆弛的最佳值向上取整；目標係數皆為整數，故為整數最佳值的下界
    fn relaxation_bound(&self, model: &MipModel, params: &SolverParams) -> Option<i64> {
        let objective = model.objective()?;
        let (problem, handles) =
            self.problem(model, params, params.time_limit.min(RELAXATION_TIME_LIMIT), false);
        let solution = problem.solve().ok()?;
        if !matches!(solution.status(), SolutionStatus::Optimal) {
            return None;
        }

        let value = objective
            .terms
            .iter()
            .map(|&(var, coef)| coef as f64 * solution.value(handles[var.index()]))
            .sum::<f64>()
            + objective.offset as f64;
        Some((value - INTEGRALITY_TOLERANCE).ceil() as i64)
    }
}

/// 依序回報嚴格改善的解
struct Reporter<'c> {
    on_solution: &'c mut dyn FnMut(&MipSolution),
    started: Instant,
    best: Option<i64>,
    callbacks: usize,
}

impl Reporter<'_> {
    fn offer(&mut self, model: &MipModel, values: Vec<i64>) {
        let objective = model.objective_value(&values);
        if self.best.is_some_and(|best| objective >= best) {
            return;
        }
        self.best = Some(objective);
        self.callbacks += 1;
        (self.on_solution)(&MipSolution::new(values, objective, self.started.elapsed()));
    }
}

impl ConstraintSolver for HighsSolver {
    #[tracing::instrument(level = "debug", skip_all, fields(vars = model.num_vars(), constraints = model.num_constraints()))]
    fn solve(
        &self,
        model: &MipModel,
        params: &SolverParams,
        on_solution: &mut dyn FnMut(&MipSolution),
    ) -> Result<SolveOutcome, SolverError> {
        let mut reporter = Reporter {
            on_solution,
            started: Instant::now(),
            best: None,
            callbacks: 0,
        };

        if let Some(values) = model.complete_hint() {
            match model.check(&values) {
                Ok(()) => {
                    tracing::debug!("提示值本身可行，作為第一個解回報");
                    reporter.offer(model, values);
                }
                Err(err) => tracing::debug!("提示值不可行（{}），僅作為初始解", err),
            }
        }

        let (mut problem, handles) = self.problem(model, params, params.time_limit, true);
        if !model.hints().is_empty() {
            // 同一變數以最後一次提示為準
            let hints: BTreeMap<usize, i64> =
                model.hints().iter().map(|&(v, x)| (v.index(), x)).collect();
            problem = problem.with_initial_solution(
                hints
                    .into_iter()
                    .map(|(index, value)| (handles[index], value as f64))
                    .collect::<Vec<_>>(),
            );
        }

        let mut proven_optimal = false;
        let mut proven_infeasible = false;
        match problem.solve() {
            Ok(solution) => {
                let values: Vec<i64> = handles
                    .iter()
                    .map(|&h| solution.value(h).round() as i64)
                    .collect();
                match model.check(&values) {
                    Ok(()) => {
                        proven_optimal = matches!(solution.status(), SolutionStatus::Optimal);
                        reporter.offer(model, values);
                    }
                    // 時限內未找到可行解時，後端可能回傳未完成的賦值
                    Err(err) => tracing::debug!("後端回傳的賦值不可行（{}），忽略", err),
                }
            }
            Err(ResolutionError::Infeasible) => proven_infeasible = true,
            Err(ResolutionError::Unbounded) => {
                return Err(SolverError::Backend("目標函數無界".to_string()));
            }
            Err(err) => tracing::warn!("求解未正常結束: {}", err),
        }

        let status = match (reporter.best, proven_optimal, proven_infeasible) {
            (Some(_), true, _) => SolveStatus::Optimal,
            (Some(_), false, _) => SolveStatus::Feasible,
            (None, _, true) => SolveStatus::Infeasible,
            (None, _, false) => SolveStatus::Unknown,
        };
        let best_objective_bound = match status {
            SolveStatus::Optimal => reporter.best,
            SolveStatus::Infeasible => None,
            _ => self.relaxation_bound(model, params),
        };

        Ok(SolveOutcome {
            status,
            wall_time: reporter.started.elapsed(),
            best_objective_bound,
            objective: reporter.best,
            solutions: reporter.callbacks,
        })
    }
}

fn expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.offset as f64);
    for &(var, coef) in &expr.terms {
        out.add_mul(coef as f64, handles[var.index()]);
    }
    out
}

fn to_constraint(constraint: &LinearConstraint, handles: &[Variable]) -> good_lp::Constraint {
    let lhs = expression(&constraint.expr, handles);
    let rhs = constraint.rhs as f64;
    match constraint.cmp {
        Comparison::Le => lhs.leq(rhs),
        Comparison::Ge => lhs.geq(rhs),
        Comparison::Eq => lhs.eq(rhs),
    }
}
