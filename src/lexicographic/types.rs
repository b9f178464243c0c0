//! Outcome of a lexicographic solve.

use crate::metrics::{Assignment, MatchingStats};
use crate::mip::{Direction, SolveStatus};
use crate::options::Criterion;

/// Record of one optimisation pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassRecord {
    /// Criterion being optimised; `None` for the feasibility-only solve.
    pub criterion: Option<Criterion>,
    /// Rank of a generous or greedy sub-pass.
    pub rank: Option<usize>,
    pub direction: Direction,
    pub status: SolveStatus,
    /// Optimal objective value, frozen for the following passes.
    pub value: Option<i64>,
    pub solve_time_ms: u64,
}

/// Result of [`LexicographicSolver::run`](super::LexicographicSolver::run).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexicographicOutcome {
    /// `Optimal` if every pass succeeded, otherwise the first other status.
    pub status: SolveStatus,

    /// The optimal matching, present only when `status` is `Optimal`.
    pub assignment: Option<Assignment>,

    /// Statistics of `assignment`.
    pub stats: Option<MatchingStats>,

    /// Passes in execution order, up to and including the first failure.
    pub passes: Vec<PassRecord>,

    /// Constraints and optimisations applied, in order.
    pub notes: Vec<String>,

    /// Post-hoc stability check, when stability was requested.
    pub stability_audit: Option<bool>,

    /// Variables in the final model.
    pub num_vars: usize,

    /// Constraints in the final model.
    pub num_constraints: usize,

    /// Time spent building the constraint system.
    pub model_time_ms: u64,

    /// Time spent in the backend over all passes.
    pub solve_time_ms: u64,

    /// Per-pass time limit the run was configured with.
    pub time_limit_ms: Option<u64>,
}

impl LexicographicOutcome {
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// Total wall-clock time.
    pub fn total_time_ms(&self) -> u64 {
        self.model_time_ms + self.solve_time_ms
    }
}
