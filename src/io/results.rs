//! Results reports.

use crate::lexicographic::LexicographicOutcome;
use crate::metrics::{Assignment, MatchingStats, ProfileDisplay};
use crate::mip::SolveStatus;
use crate::model::Instance;
use crate::oracle::OracleOutcome;
use std::fmt;

/// Level of detail of an exact-solver report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Statistics only.
    #[default]
    Short,
    /// Statistics with explanatory comments, the passes, and per-agent,
    /// per-resource and per-supervisor detail.
    Long,
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

/// Renders the report of an exact solve.
///
/// Reports end after the status line unless every pass was optimal; a
/// timeout replaces the status section.
pub fn render_exact(outcome: &LexicographicOutcome, instance: &Instance, format: Format) -> String {
    ExactReport {
        outcome,
        instance,
        format,
    }
    .to_string()
}

/// Renders the report of an exhaustive search.
pub fn render_oracle(outcome: &OracleOutcome) -> String {
    OracleReport(outcome).to_string()
}

struct ExactReport<'a> {
    outcome: &'a LexicographicOutcome,
    instance: &'a Instance,
    format: Format,
}

impl ExactReport<'_> {
    fn long(&self) -> bool {
        self.format == Format::Long
    }

    fn comment(&self, f: &mut fmt::Formatter<'_>, lines: &[&str]) -> fmt::Result {
        if self.long() {
            for line in lines {
                writeln!(f, "# {line}")?;
            }
        }
        Ok(())
    }

    fn statistics(
        &self,
        f: &mut fmt::Formatter<'_>,
        assignment: &Assignment,
        stats: &MatchingStats,
    ) -> fmt::Result {
        writeln!(f, "# matching statistics")?;
        self.comment(f, &["the resource assigned to each agent, 0 if none"])?;
        writeln!(f, "matching: {}", assignment.matching_string(self.instance))?;
        self.comment(f, &["the sum of ranks of matched agents"])?;
        writeln!(f, "cost: {}", stats.cost)?;
        self.comment(f, &["the sum of squares of ranks of matched agents"])?;
        writeln!(f, "cost_sq: {}", stats.cost_sq)?;
        self.comment(f, &["the worst rank of a matched agent"])?;
        writeln!(f, "degree: {}", stats.degree)?;
        self.comment(f, &["the number of agents matched at rank 1, 2, 3 and so on"])?;
        writeln!(f, "profile: {}", ProfileDisplay(&stats.profile))?;
        self.comment(
            f,
            &["the largest difference between a supervisor's load and target"],
        )?;
        writeln!(f, "max_load_deviation: {}", stats.max_deviation)?;
        self.comment(
            f,
            &["the sum of differences between supervisor loads and targets"],
        )?;
        writeln!(f, "sum_load_deviation: {}", stats.sum_deviation)?;
        writeln!(f)
    }

    fn passes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# passes")?;
        for (i, pass) in self.outcome.passes.iter().enumerate() {
            write!(f, "{}: ", i + 1)?;
            match pass.criterion {
                Some(criterion) => write!(f, "{criterion}")?,
                None => write!(f, "feasibility")?,
            }
            if let Some(rank) = pass.rank {
                write!(f, " (rank {rank})")?;
            }
            write!(f, ", {}, {}", pass.direction, pass.status)?;
            if let Some(value) = pass.value {
                write!(f, ", value {value}")?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }

    fn details(&self, f: &mut fmt::Formatter<'_>, assignment: &Assignment) -> fmt::Result {
        let instance = self.instance;
        let mut by_resource = vec![Vec::new(); instance.num_resources()];
        let mut by_supervisor = vec![Vec::new(); instance.num_supervisors()];

        writeln!(f, "# the resource and supervisor of each agent")?;
        writeln!(f, "Agent_assignments:")?;
        for agent in instance.agents() {
            match assignment
                .get(agent.id - 1)
                .and_then(|p| instance.pair(p))
            {
                Some(pair) => {
                    writeln!(
                        f,
                        "a_{}: r_{} (s_{})",
                        agent.id,
                        pair.resource_id(),
                        pair.supervisor_id()
                    )?;
                    by_resource[pair.resource].push(format!("a_{}", agent.id));
                    by_supervisor[pair.supervisor]
                        .push(format!("a_{} (r_{})", agent.id, pair.resource_id()));
                }
                None => writeln!(f, "a_{}: no assignment", agent.id)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "# the agents of each resource, with load and upper quota")?;
        writeln!(f, "Resource_assignments:")?;
        for (resource, assigned) in instance.resources().iter().zip(&by_resource) {
            write!(f, "r_{} (s_{}): ", resource.id, resource.supervisor + 1)?;
            write_entries(f, assigned)?;
            writeln!(f, "    {}/{}", assigned.len(), resource.upper)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "# the agents of each supervisor, with load, upper quota and target"
        )?;
        writeln!(f, "Supervisor_assignments:")?;
        for (supervisor, assigned) in instance.supervisors().iter().zip(&by_supervisor) {
            write!(f, "s_{}: ", supervisor.id)?;
            write_entries(f, assigned)?;
            writeln!(
                f,
                "    {}/{} ({})",
                assigned.len(),
                supervisor.upper,
                supervisor.target
            )?;
        }
        Ok(())
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &[String]) -> fmt::Result {
    if entries.is_empty() {
        f.write_str("no assignment")
    } else {
        f.write_str(&entries.join(" "))
    }
}

impl fmt::Display for ExactReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        writeln!(f, "# Results")?;
        writeln!(f)?;

        writeln!(f, "# main constraints and optimisations")?;
        for note in &outcome.notes {
            writeln!(f, "- {note}")?;
        }
        writeln!(f)?;

        if outcome.status == SolveStatus::Timeout {
            return match outcome.time_limit_ms {
                Some(ms) => writeln!(f, "Timeout: {} seconds", seconds(ms)),
                None => writeln!(f, "Timeout"),
            };
        }

        writeln!(f, "# solver status")?;
        writeln!(f, "solver_status: {}", outcome.status)?;
        writeln!(f)?;
        if self.long() {
            self.passes(f)?;
        }
        let (Some(assignment), Some(stats)) = (&outcome.assignment, &outcome.stats) else {
            return Ok(());
        };

        writeln!(f, "# timings")?;
        writeln!(f, "time_model_creation_seconds: {}", seconds(outcome.model_time_ms))?;
        writeln!(f, "time_solve_seconds: {}", seconds(outcome.solve_time_ms))?;
        writeln!(f, "time_total_seconds: {}", seconds(outcome.total_time_ms()))?;
        writeln!(f)?;

        if let Some(stable) = outcome.stability_audit {
            writeln!(f, "stability_correct: {stable}")?;
            writeln!(f)?;
        }

        self.statistics(f, assignment, stats)?;
        if self.long() {
            self.details(f, assignment)?;
        }
        Ok(())
    }
}

struct OracleReport<'a>(&'a OracleOutcome);

impl fmt::Display for OracleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        writeln!(f, "# Results (exhaustive search)")?;
        writeln!(f)?;
        writeln!(f, "# timings")?;
        writeln!(f, "time_solve_seconds: {}", seconds(outcome.solve_time_ms))?;
        writeln!(f)?;
        writeln!(f, "# search")?;
        writeln!(f, "matchings_examined: {}", outcome.examined)?;
        writeln!(f, "matchings_feasible: {}", outcome.feasible)?;
        writeln!(f)?;

        let Some(optima) = &outcome.optima else {
            return writeln!(f, "Infeasible");
        };
        writeln!(f, "# optimal matching statistics")?;
        writeln!(f, "optimal_size: {}", optima.size)?;
        writeln!(f, "optimal_max_size_min_cost: {}", optima.max_size_min_cost)?;
        writeln!(f, "optimal_max_size_min_degree: {}", optima.max_size_min_degree)?;
        writeln!(f, "optimal_max_size_min_cost_sq: {}", optima.max_size_min_cost_sq)?;
        writeln!(
            f,
            "optimal_max_size_generous_profile: {}",
            ProfileDisplay(&optima.max_size_generous_profile)
        )?;
        writeln!(
            f,
            "optimal_max_size_greedy_profile: {}",
            ProfileDisplay(&optima.max_size_greedy_profile)
        )?;
        writeln!(f, "optimal_greedy_profile: {}", ProfileDisplay(&optima.greedy_profile))?;
        writeln!(f, "optimal_min_size: {}", optima.min_size)?;
        writeln!(
            f,
            "optimal_generous_profile: {}",
            ProfileDisplay(&optima.generous_profile)
        )?;
        writeln!(f, "optimal_min_cost: {}", optima.min_cost)?;
        writeln!(f, "optimal_min_cost_sq: {}", optima.min_cost_sq)?;
        writeln!(f, "optimal_max_load_deviation: {}", optima.min_max_deviation)?;
        writeln!(f, "optimal_sum_load_deviation: {}", optima.min_sum_deviation)
    }
}
