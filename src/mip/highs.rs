//! HiGHS backend through `good_lp`.
//!
//! `good_lp` problems are consumed by `solve`, so every call rebuilds a
//! fresh problem from the [`MipModel`]. Variables keep their order, which
//! lets solution values be read back by [`VarId`].

use super::model::{Direction, LinearExpr, MipModel, Objective, Sense};
use super::solver::{MipSolution, MipSolver, SolveStatus, SolverConfig};
use good_lp::solvers::highs::highs;
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use std::time::Instant;
use tracing::{debug, warn};

/// Solves models with HiGHS.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for HighsSolver {
    fn solve(
        &self,
        model: &MipModel,
        objective: &Objective,
        config: &SolverConfig,
    ) -> MipSolution {
        if let Err(reason) = model
            .validate()
            .and_then(|()| model.validate_objective(objective))
        {
            warn!(model = %model.name, %reason, "rejecting invalid model");
            return MipSolution::empty(SolveStatus::Error(reason));
        }
        if let Some(index) = model.trivially_violated() {
            debug!(model = %model.name, constraint = index, "constant constraint cannot hold");
            return MipSolution::empty(SolveStatus::Infeasible);
        }
        if model.num_vars() == 0 {
            return MipSolution {
                status: SolveStatus::Optimal,
                objective_value: Some(objective.expr.constant),
                values: Vec::new(),
                solve_time_ms: 0,
            };
        }

        let start_time = Instant::now();

        let mut problem_vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .vars()
            .iter()
            .map(|v| {
                let definition = if v.is_binary() {
                    variable().binary()
                } else {
                    variable().integer().min(v.lower as f64).max(v.upper as f64)
                };
                problem_vars.add(definition.name(v.name.clone()))
            })
            .collect();

        let objective_expr = to_expression(&objective.expr, &handles);
        let unsolved = match objective.direction {
            Direction::Maximise => problem_vars.maximise(objective_expr),
            Direction::Minimise => problem_vars.minimise(objective_expr),
        };
        let mut problem = unsolved.using(highs);
        problem.set_verbose(config.verbose);
        // HiGHS keeps one global scheduler; `num_workers == 1` keeps its
        // default size.
        if config.num_workers > 1 {
            problem = problem.set_option("threads", config.num_workers as i32);
        }
        if let Some(limit) = config.time_limit() {
            problem = problem.with_time_limit(limit.as_secs_f64());
        }

        for c in model.constraints().iter().filter(|c| !c.expr.is_constant()) {
            let lhs = to_expression(&c.expr, &handles);
            let constraint = match c.sense {
                Sense::Le => lhs.leq(c.rhs),
                Sense::Ge => lhs.geq(c.rhs),
                Sense::Eq => lhs.eq(c.rhs),
            };
            problem.add_constraint(constraint);
        }

        let result = problem.solve();
        let solve_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(solution) => match status_of(solution.status()) {
                SolveStatus::Optimal => {
                    let values: Vec<f64> = handles.iter().map(|&h| solution.value(h)).collect();
                    let objective_value = objective.expr.eval(|v| values[v.index()]);
                    MipSolution {
                        status: SolveStatus::Optimal,
                        objective_value: Some(objective_value),
                        values,
                        solve_time_ms,
                    }
                }
                status => {
                    debug!(model = %model.name, %status, "backend stopped before proving optimality");
                    MipSolution {
                        solve_time_ms,
                        ..MipSolution::empty(status)
                    }
                }
            },
            Err(err) => MipSolution {
                solve_time_ms,
                ..MipSolution::empty(status_of_error(err))
            },
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant);
    for &(var, coefficient) in &expr.terms {
        out.add_mul(coefficient, handles[var.index()]);
    }
    out
}

/// Status of a solve that returned a solution. HiGHS time, iteration,
/// memory and interrupt stops all arrive as `TimeLimit`.
fn status_of(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::TimeLimit => SolveStatus::Timeout,
        #[allow(unreachable_patterns)]
        _ => SolveStatus::NotSolved,
    }
}

fn status_of_error(err: ResolutionError) -> SolveStatus {
    match err {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        other => SolveStatus::Error(other.to_string()),
    }
}
