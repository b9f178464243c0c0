//! MIP solver interface and a basic enumeration implementation.

use super::model::{MipModel, Objective};
use super::variables::VarId;
use crate::error::OptionsError;
use std::fmt;
use std::time::{Duration, Instant};

/// Terminal status of one solve.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveStatus {
    /// Proven optimal solution found.
    Optimal,
    /// No feasible solution exists.
    Infeasible,
    /// The time budget ran out before optimality was proven.
    Timeout,
    /// The objective is unbounded.
    Unbounded,
    /// The solver was not run or gave up without a verdict.
    NotSolved,
    /// Any other backend status, verbatim.
    Error(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => f.write_str("Optimal"),
            SolveStatus::Infeasible => f.write_str("Infeasible"),
            SolveStatus::Timeout => f.write_str("Timeout"),
            SolveStatus::Unbounded => f.write_str("Unbounded"),
            SolveStatus::NotSolved => f.write_str("Not Solved"),
            SolveStatus::Error(message) => write!(f, "Error ({message})"),
        }
    }
}

/// Solution of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct MipSolution {
    /// Solver status.
    pub status: SolveStatus,
    /// Objective value, when a solution was found.
    pub objective_value: Option<f64>,
    /// Value of every variable, indexed by [`VarId::index`]. Empty when no
    /// solution was found.
    pub values: Vec<f64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
}

impl MipSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: Vec::new(),
            solve_time_ms: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Value of a variable, if a solution was found.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }

    /// Whether a binary variable is set in the solution.
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var).is_some_and(|v| v > 0.5)
    }
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Wall-clock budget per solve in milliseconds; `None` for no limit.
    pub time_limit_ms: Option<u64>,
    /// Number of backend worker threads. `1` leaves the thread count to the
    /// backend default.
    pub num_workers: usize,
    /// Let the backend write its log.
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            num_workers: 1,
            verbose: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Per-solve budget as a [`Duration`].
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.num_workers == 0 {
            return Err(OptionsError::Config("num_workers must be at least 1".into()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(OptionsError::Config("time_limit_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Trait for MIP solver implementations.
///
/// Implementors solve one model against one objective. The model is only
/// read; callers extend it between solves.
pub trait MipSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &MipModel, objective: &Objective, config: &SolverConfig)
        -> MipSolution;
}

/// A simple exhaustive MIP solver for small models.
///
/// Enumerates every point of the variable domains. Models whose search
/// space exceeds `max_points` are reported as [`SolveStatus::NotSolved`].
#[derive(Debug, Clone)]
pub struct SimpleMipSolver {
    /// Largest number of points examined.
    pub max_points: u64,
}

impl SimpleMipSolver {
    pub fn new() -> Self {
        Self {
            max_points: 1 << 22,
        }
    }

    pub fn with_max_points(mut self, max_points: u64) -> Self {
        self.max_points = max_points;
        self
    }
}

impl Default for SimpleMipSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MipSolver for SimpleMipSolver {
    fn solve(
        &self,
        model: &MipModel,
        objective: &Objective,
        config: &SolverConfig,
    ) -> MipSolution {
        if model.validate().is_err() || model.validate_objective(objective).is_err() {
            return MipSolution::empty(SolveStatus::Error("invalid model".into()));
        }

        let start_time = Instant::now();
        let vars = model.vars();
        let points = vars
            .iter()
            .try_fold(1u64, |acc, v| acc.checked_mul(v.domain_size()));
        match points {
            Some(p) if p <= self.max_points => {}
            _ => return MipSolution::empty(SolveStatus::NotSolved),
        }

        let mut point: Vec<i64> = vars.iter().map(|v| v.lower).collect();
        let mut best: Option<(f64, Vec<f64>)> = None;
        let mut examined: u64 = 0;

        loop {
            examined += 1;
            if examined % 4096 == 0 {
                if let Some(limit) = config.time_limit() {
                    if start_time.elapsed() >= limit {
                        let mut solution = MipSolution::empty(SolveStatus::Timeout);
                        solution.solve_time_ms = start_time.elapsed().as_millis() as u64;
                        return solution;
                    }
                }
            }

            let value_of = |v: VarId| point[v.index()] as f64;
            let feasible = model
                .constraints()
                .iter()
                .all(|c| c.sense.holds(c.expr.eval(value_of), c.rhs, 1e-9));
            if feasible {
                let value = objective.expr.eval(value_of);
                if best.as_ref().map_or(true, |(b, _)| objective.improves(value, *b)) {
                    best = Some((value, point.iter().map(|&x| x as f64).collect()));
                }
            }

            // Odometer step.
            let mut i = 0;
            loop {
                if i == point.len() {
                    let mut solution = match best {
                        Some((value, values)) => MipSolution {
                            status: SolveStatus::Optimal,
                            objective_value: Some(value),
                            values,
                            solve_time_ms: 0,
                        },
                        None => MipSolution::empty(SolveStatus::Infeasible),
                    };
                    solution.solve_time_ms = start_time.elapsed().as_millis() as u64;
                    return solution;
                }
                if point[i] < vars[i].upper {
                    point[i] += 1;
                    break;
                }
                point[i] = vars[i].lower;
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{LinearExpr, Sense};

    #[test]
    fn test_simple_solver_knapsack() {
        // max 3x + 2y + 2z  s.t.  2x + y + z <= 2
        let mut model = MipModel::new("knapsack");
        let x = model.add_binary("x");
        let y = model.add_binary("y");
        let z = model.add_binary("z");
        model.add_constraint(
            LinearExpr::new()
                .with_term(x, 2.0)
                .with_term(y, 1.0)
                .with_term(z, 1.0),
            Sense::Le,
            2.0,
        );
        let objective = Objective::maximise(
            LinearExpr::new()
                .with_term(x, 3.0)
                .with_term(y, 2.0)
                .with_term(z, 2.0),
        );

        let solution = SimpleMipSolver::new().solve(&model, &objective, &SolverConfig::default());

        assert!(solution.is_optimal());
        assert_eq!(solution.objective_value, Some(4.0));
        assert!(!solution.is_set(x));
        assert!(solution.is_set(y) && solution.is_set(z));
    }

    #[test]
    fn test_simple_solver_infeasible() {
        let mut model = MipModel::new("infeasible");
        let x = model.add_integer("x", 0, 3);
        model.add_constraint(LinearExpr::sum([x]), Sense::Ge, 4.0);
        let solution =
            SimpleMipSolver::new().solve(&model, &Objective::feasibility(), &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert_eq!(solution.value(x), None);
    }

    #[test]
    fn test_simple_solver_refuses_large_models() {
        let mut model = MipModel::new("large");
        for i in 0..8 {
            model.add_binary(format!("x{i}"));
        }
        let solver = SimpleMipSolver::new().with_max_points(100);
        let solution = solver.solve(&model, &Objective::feasibility(), &SolverConfig::default());
        assert_eq!(solution.status, SolveStatus::NotSolved);
    }

    #[test]
    fn test_solver_config_default_and_validate() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, None);
        assert_eq!(config.num_workers, 1);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());

        assert!(SolverConfig::new().with_num_workers(0).validate().is_err());
        assert!(SolverConfig::new().with_time_limit_ms(0).validate().is_err());
        assert_eq!(
            SolverConfig::new().with_time_limit_ms(1500).time_limit(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Optimal.to_string(), "Optimal");
        assert_eq!(SolveStatus::NotSolved.to_string(), "Not Solved");
        assert_eq!(
            SolveStatus::Error("numerical".into()).to_string(),
            "Error (numerical)"
        );
    }
}
