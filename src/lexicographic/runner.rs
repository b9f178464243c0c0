//! Lexicographic optimisation loop.

use super::formulation::Formulation;
use super::types::{LexicographicOutcome, PassRecord};
use crate::metrics::{Assignment, MatchingStats};
use crate::mip::{HighsSolver, MipSolution, MipSolver, Objective, SolveStatus, SolverConfig};
use crate::model::Instance;
use crate::options::SolveOptions;
use crate::predicate::{is_stable, is_valid};
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Optimises the selected criteria one after another, freezing each
/// optimum before moving on.
///
/// # Examples
///
/// ```no_run
/// use u_matching::lexicographic::LexicographicSolver;
/// use u_matching::mip::SolverConfig;
/// use u_matching::model::{InstanceBuilder, PreferenceList};
/// use u_matching::options::{Criterion, CriterionOrder, SolveOptions};
///
/// let mut builder = InstanceBuilder::new();
/// let s = builder.add_supervisor(0, 1, 2);
/// builder.add_resource(0, 1, s);
/// builder.add_agent(PreferenceList::strict([1]));
/// let instance = builder.build().unwrap();
///
/// let options = SolveOptions::default()
///     .with_criteria(CriterionOrder::new([Criterion::MaxSize]).unwrap());
/// let outcome = LexicographicSolver::new().run(&instance, &options, &SolverConfig::default());
/// assert!(outcome.is_optimal());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LexicographicSolver<S: MipSolver = HighsSolver> {
    backend: S,
}

impl LexicographicSolver<HighsSolver> {
    /// Solver backed by HiGHS.
    pub fn new() -> Self {
        Self {
            backend: HighsSolver::new(),
        }
    }
}

impl<S: MipSolver> LexicographicSolver<S> {
    /// Solver backed by any [`MipSolver`].
    pub fn with_backend(backend: S) -> Self {
        Self { backend }
    }

    /// Runs the full sequence of passes.
    ///
    /// The options are expected to be validated already.
    pub fn run(
        &self,
        instance: &Instance,
        options: &SolveOptions,
        config: &SolverConfig,
    ) -> LexicographicOutcome {
        let _span = info_span!(
            "lexicographic_solve",
            agents = instance.num_agents(),
            pairs = instance.pairs().len(),
            criteria = options.criteria.len(),
        )
        .entered();

        let start = Instant::now();
        let mut formulation = Formulation::build(instance, options);
        let model_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            vars = formulation.model().num_vars(),
            constraints = formulation.model().num_constraints(),
            "constraint system built"
        );

        if instance.pairs().is_empty() {
            return Self::without_candidates(instance, options, config, formulation, model_time_ms);
        }

        let mut passes = Vec::new();
        let mut last: Option<MipSolution> = None;
        let mut status = SolveStatus::Optimal;

        'criteria: for criterion in options.criteria.iter() {
            formulation.push_note(format!("optimisation: {criterion}"));
            for pass in formulation.plan(instance, criterion) {
                let solution =
                    self.backend
                        .solve(formulation.model(), &pass.objective, config);
                let value = solution.objective_value.map(|v| v.round() as i64);
                debug!(
                    criterion = %pass.criterion,
                    rank = pass.rank,
                    direction = %pass.objective.direction,
                    status = %solution.status,
                    value,
                    "pass finished"
                );
                passes.push(PassRecord {
                    criterion: Some(pass.criterion),
                    rank: pass.rank,
                    direction: pass.objective.direction,
                    status: solution.status.clone(),
                    value: if solution.is_optimal() { value } else { None },
                    solve_time_ms: solution.solve_time_ms,
                });

                if !solution.is_optimal() {
                    warn!(criterion = %pass.criterion, status = %solution.status, "pass not optimal; stopping");
                    status = solution.status.clone();
                    last = None;
                    break 'criteria;
                }
                if let Some(v) = value {
                    formulation.freeze(&pass.objective, v as f64);
                }
                last = Some(solution);
            }
        }

        if options.criteria.is_empty() {
            let objective = Objective::feasibility();
            let solution = self
                .backend
                .solve(formulation.model(), &objective, config);
            passes.push(PassRecord {
                criterion: None,
                rank: None,
                direction: objective.direction,
                status: solution.status.clone(),
                value: None,
                solve_time_ms: solution.solve_time_ms,
            });
            status = solution.status.clone();
            last = solution.is_optimal().then_some(solution);
        }

        let solve_time_ms = passes.iter().map(|p| p.solve_time_ms).sum();
        let assignment = last.map(|solution| formulation.assignment(instance, &solution));
        let outcome = Self::finish(
            instance,
            options,
            config,
            &formulation,
            status,
            assignment,
            passes,
            model_time_ms,
            solve_time_ms,
        );
        info!(
            status = %outcome.status,
            passes = outcome.passes.len(),
            size = outcome.stats.as_ref().map(|s| s.size),
            "lexicographic solve finished"
        );
        outcome
    }

    /// Without candidate pairs the only matching is the empty one.
    fn without_candidates(
        instance: &Instance,
        options: &SolveOptions,
        config: &SolverConfig,
        mut formulation: Formulation,
        model_time_ms: u64,
    ) -> LexicographicOutcome {
        for criterion in options.criteria.iter() {
            formulation.push_note(format!("optimisation: {criterion}"));
        }
        let (status, assignment) = if is_valid(instance, &[], options.instance.closures) {
            (
                SolveStatus::Optimal,
                Some(Assignment::unassigned(instance.num_agents())),
            )
        } else {
            (SolveStatus::Infeasible, None)
        };
        debug!(%status, "no candidate pairs; backend skipped");
        Self::finish(
            instance,
            options,
            config,
            &formulation,
            status,
            assignment,
            Vec::new(),
            model_time_ms,
            0,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        instance: &Instance,
        options: &SolveOptions,
        config: &SolverConfig,
        formulation: &Formulation,
        status: SolveStatus,
        assignment: Option<Assignment>,
        passes: Vec<PassRecord>,
        model_time_ms: u64,
        solve_time_ms: u64,
    ) -> LexicographicOutcome {
        let stats = assignment.as_ref().map(|a| MatchingStats::of(instance, a));
        let stability_audit = match (&assignment, options.extra.stability) {
            (Some(a), true) => Some(is_stable(instance, a.slots())),
            _ => None,
        };
        LexicographicOutcome {
            status,
            assignment,
            stats,
            passes,
            notes: formulation.notes().to_vec(),
            stability_audit,
            num_vars: formulation.model().num_vars(),
            num_constraints: formulation.model().num_constraints(),
            model_time_ms,
            solve_time_ms,
            time_limit_ms: config.time_limit_ms,
        }
    }
}
