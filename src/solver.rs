//! Single entry point over both strategies.

use crate::error::{MatchingError, OptionsError};
use crate::io::{render_exact, render_oracle, Format};
use crate::lexicographic::{LexicographicOutcome, LexicographicSolver};
use crate::mip::{SolveStatus, SolverConfig};
use crate::model::Instance;
use crate::options::{SolveOptions, SolverKind};
use crate::oracle::{OracleOutcome, OracleSolver};
use tracing::warn;

/// Result of [`solve`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveReport {
    Exact(LexicographicOutcome),
    Oracle(OracleOutcome),
}

impl SolveReport {
    /// Status of the run. The oracle reports `Infeasible` when no valid
    /// matching exists and `Optimal` otherwise.
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveReport::Exact(outcome) => outcome.status.clone(),
            SolveReport::Oracle(outcome) if outcome.is_feasible() => SolveStatus::Optimal,
            SolveReport::Oracle(_) => SolveStatus::Infeasible,
        }
    }

    /// Renders the results text. The oracle report has one format only.
    pub fn render(&self, instance: &Instance, format: Format) -> String {
        match self {
            SolveReport::Exact(outcome) => render_exact(outcome, instance, format),
            SolveReport::Oracle(outcome) => render_oracle(outcome),
        }
    }
}

/// Validates the options against the instance and runs the selected
/// strategy.
///
/// Malformed options are the only errors; infeasibility and timeouts are
/// reported through the status of the returned report.
///
/// # Examples
///
/// ```no_run
/// use u_matching::mip::{SolveStatus, SolverConfig};
/// use u_matching::model::{InstanceBuilder, PreferenceList};
/// use u_matching::options::{Criterion, CriterionOrder, SolveOptions};
/// use u_matching::solver::solve;
///
/// let mut builder = InstanceBuilder::new();
/// let s = builder.add_supervisor(0, 1, 2);
/// builder.add_resource(0, 2, s);
/// builder.add_agent(PreferenceList::strict([1]));
/// let instance = builder.build().unwrap();
///
/// let options = SolveOptions::default()
///     .with_criteria(CriterionOrder::new([Criterion::MaxSize]).unwrap());
/// let report = solve(&instance, &options, &SolverConfig::default()).unwrap();
/// assert_eq!(report.status(), SolveStatus::Optimal);
/// ```
pub fn solve(
    instance: &Instance,
    options: &SolveOptions,
    config: &SolverConfig,
) -> Result<SolveReport, MatchingError> {
    check(instance, options, config)?;
    Ok(match options.solver {
        SolverKind::Lexicographic => {
            SolveReport::Exact(LexicographicSolver::new().run(instance, options, config))
        }
        SolverKind::BruteForce => run_oracle(instance, options),
    })
}

fn check(
    instance: &Instance,
    options: &SolveOptions,
    config: &SolverConfig,
) -> Result<(), OptionsError> {
    options.validate()?;
    config.validate()?;
    if options.instance.two_sided != instance.is_two_sided() {
        return Err(OptionsError::TwoSidedMismatch {
            options: options.instance.two_sided,
            instance: instance.is_two_sided(),
        });
    }
    Ok(())
}

fn run_oracle(instance: &Instance, options: &SolveOptions) -> SolveReport {
    if options.extra.stability {
        warn!("exhaustive search checks validity only; stability is not enforced");
    }
    if !options.criteria.is_empty() {
        warn!("exhaustive search reports every optimum; the criterion order is not used");
    }
    SolveReport::Oracle(OracleSolver::run(instance, options.instance.closures))
}
