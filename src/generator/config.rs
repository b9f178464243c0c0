//! Generator configuration.
//!
//! [`GeneratorConfig`] holds the parameters of one family of random
//! instances.

use crate::error::GeneratorError;
use crate::options::AgentClasses;
use std::fmt;

/// Problem family of a generated instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchingProblem {
    /// House allocation: one-sided lists, houses with capacities.
    Ha,
    /// Stable marriage: as many women as men, capacity 1, two-sided lists.
    Sm,
    /// Hospitals/residents: hospitals with quotas, two-sided lists.
    Hr,
    /// Student-project allocation with lecturers.
    Spa,
}

impl MatchingProblem {
    pub fn name(self) -> &'static str {
        match self {
            MatchingProblem::Ha => "HA",
            MatchingProblem::Sm => "SM",
            MatchingProblem::Hr => "HR",
            MatchingProblem::Spa => "SPA",
        }
    }

    /// Agent classes of the textual form.
    pub fn agent_classes(self) -> AgentClasses {
        match self {
            MatchingProblem::Spa => AgentClasses::Three,
            _ => AgentClasses::Two,
        }
    }
}

impl fmt::Display for MatchingProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of a random instance.
///
/// Quota parameters are sums spread as evenly as possible over the
/// resources or supervisors. Which parameters are required or refused
/// depends on the [`MatchingProblem`]; see [`validate`](Self::validate).
///
/// # Builder Pattern
///
/// ```
/// use u_matching::generator::{GeneratorConfig, MatchingProblem};
///
/// let config = GeneratorConfig::new(MatchingProblem::Spa, 10)
///     .with_resources(5)
///     .with_supervisors(2)
///     .with_list_lengths(2, 3)
///     .with_resource_upper_sum(12)
///     .with_supervisor_upper_sum(10)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    pub problem: MatchingProblem,

    /// Number of agents.
    pub num_agents: usize,

    /// Number of resources. Implied by `num_agents` for SM.
    pub num_resources: Option<usize>,

    /// Number of supervisors (SPA only).
    pub num_supervisors: Option<usize>,

    /// Shortest agent preference list.
    pub min_list_len: usize,

    /// Longest agent preference list; at most the number of resources.
    pub max_list_len: usize,

    /// Generate supervisor (or resource) preference lists.
    pub two_sided: bool,

    /// The most popular resource is `skew` times as likely to be ranked as
    /// the least popular one.
    pub skew: f64,

    /// Probability that an agent list entry is tied with the next.
    pub agent_ties: f64,

    /// Probability that a supervisor list entry is tied with the next.
    pub supervisor_ties: Option<f64>,

    pub resource_lower_sum: Option<usize>,
    pub resource_upper_sum: Option<usize>,
    pub supervisor_lower_sum: Option<usize>,
    pub supervisor_target_sum: Option<usize>,
    pub supervisor_upper_sum: Option<usize>,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Configuration with lists of length 1, no skew and no ties.
    pub fn new(problem: MatchingProblem, num_agents: usize) -> Self {
        Self {
            problem,
            num_agents,
            num_resources: None,
            num_supervisors: None,
            min_list_len: 1,
            max_list_len: 1,
            two_sided: false,
            skew: 1.0,
            agent_ties: 0.0,
            supervisor_ties: None,
            resource_lower_sum: None,
            resource_upper_sum: None,
            supervisor_lower_sum: None,
            supervisor_target_sum: None,
            supervisor_upper_sum: None,
            seed: None,
        }
    }

    pub fn with_resources(mut self, n: usize) -> Self {
        self.num_resources = Some(n);
        self
    }

    pub fn with_supervisors(mut self, n: usize) -> Self {
        self.num_supervisors = Some(n);
        self
    }

    pub fn with_list_lengths(mut self, min: usize, max: usize) -> Self {
        self.min_list_len = min;
        self.max_list_len = max;
        self
    }

    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    pub fn with_agent_ties(mut self, probability: f64) -> Self {
        self.agent_ties = probability;
        self
    }

    pub fn with_supervisor_ties(mut self, probability: f64) -> Self {
        self.supervisor_ties = Some(probability);
        self
    }

    pub fn with_resource_lower_sum(mut self, sum: usize) -> Self {
        self.resource_lower_sum = Some(sum);
        self
    }

    pub fn with_resource_upper_sum(mut self, sum: usize) -> Self {
        self.resource_upper_sum = Some(sum);
        self
    }

    pub fn with_supervisor_lower_sum(mut self, sum: usize) -> Self {
        self.supervisor_lower_sum = Some(sum);
        self
    }

    pub fn with_supervisor_target_sum(mut self, sum: usize) -> Self {
        self.supervisor_target_sum = Some(sum);
        self
    }

    pub fn with_supervisor_upper_sum(mut self, sum: usize) -> Self {
        self.supervisor_upper_sum = Some(sum);
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of resources after problem defaults.
    pub(crate) fn resources(&self) -> usize {
        match self.problem {
            MatchingProblem::Sm => self.num_agents,
            _ => self.num_resources.unwrap_or(0),
        }
    }

    pub(crate) fn supervisors(&self) -> usize {
        self.num_supervisors.unwrap_or(0)
    }

    /// Resource quota sums `(lower, upper)` after problem defaults.
    pub(crate) fn resource_sums(&self) -> (usize, usize) {
        match self.problem {
            MatchingProblem::Sm => (0, self.num_agents),
            _ => (
                self.resource_lower_sum.unwrap_or(0),
                self.resource_upper_sum.unwrap_or(0),
            ),
        }
    }

    /// Supervisor quota sums `(lower, target, upper)` after defaults.
    pub(crate) fn supervisor_sums(&self) -> (usize, usize, usize) {
        (
            self.supervisor_lower_sum.unwrap_or(0),
            self.supervisor_target_sum.unwrap_or(0),
            self.supervisor_upper_sum.unwrap_or(0),
        )
    }

    /// Checks required and refused parameters, then bounds.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        self.check_presence()?;
        self.check_bounds()
    }

    fn check_presence(&self) -> Result<(), GeneratorError> {
        let problem = self.problem.name();
        let supervisor_sums = [
            (self.supervisor_lower_sum.is_some(), "supervisor_lower_sum"),
            (self.supervisor_target_sum.is_some(), "supervisor_target_sum"),
            (self.supervisor_upper_sum.is_some(), "supervisor_upper_sum"),
        ];

        let (required, banned): (Vec<(bool, &'static str)>, Vec<(bool, &'static str)>) =
            match self.problem {
                MatchingProblem::Ha => (
                    vec![
                        (self.num_resources.is_some(), "num_resources"),
                        (self.resource_upper_sum.is_some(), "resource_upper_sum"),
                    ],
                    [
                        (self.two_sided, "two_sided"),
                        (self.num_supervisors.is_some(), "num_supervisors"),
                        (self.supervisor_ties.is_some(), "supervisor_ties"),
                    ]
                    .into_iter()
                    .chain(supervisor_sums)
                    .collect(),
                ),
                MatchingProblem::Sm => (
                    vec![(self.two_sided, "two_sided")],
                    [
                        (self.num_resources.is_some(), "num_resources"),
                        (self.num_supervisors.is_some(), "num_supervisors"),
                        (self.resource_lower_sum.is_some(), "resource_lower_sum"),
                        (self.resource_upper_sum.is_some(), "resource_upper_sum"),
                    ]
                    .into_iter()
                    .chain(supervisor_sums)
                    .collect(),
                ),
                MatchingProblem::Hr => (
                    vec![
                        (self.two_sided, "two_sided"),
                        (self.num_resources.is_some(), "num_resources"),
                        (self.resource_upper_sum.is_some(), "resource_upper_sum"),
                    ],
                    std::iter::once((self.num_supervisors.is_some(), "num_supervisors"))
                        .chain(supervisor_sums)
                        .collect(),
                ),
                MatchingProblem::Spa => (
                    vec![
                        (self.num_resources.is_some(), "num_resources"),
                        (self.num_supervisors.is_some(), "num_supervisors"),
                        (self.resource_upper_sum.is_some(), "resource_upper_sum"),
                        (self.supervisor_upper_sum.is_some(), "supervisor_upper_sum"),
                    ],
                    Vec::new(),
                ),
            };

        if let Some(&(_, parameter)) = required.iter().find(|(present, _)| !present) {
            return Err(GeneratorError::Missing { parameter, problem });
        }
        if let Some(&(_, parameter)) = banned.iter().find(|(present, _)| *present) {
            return Err(GeneratorError::Banned { parameter, problem });
        }
        Ok(())
    }

    fn check_bounds(&self) -> Result<(), GeneratorError> {
        let bounds = |message: &str| -> Result<(), GeneratorError> {
            Err(GeneratorError::Bounds(message.to_string()))
        };
        let num_resources = self.resources();
        let (lower_sum, upper_sum) = self.resource_sums();

        if self.num_agents < 1 {
            return bounds("num_agents must be at least 1");
        }
        if num_resources < 1 {
            return bounds("num_resources must be at least 1");
        }
        if self.problem == MatchingProblem::Spa && self.supervisors() < 1 {
            return bounds("num_supervisors must be at least 1");
        }
        if self.min_list_len < 1 || self.max_list_len < 1 {
            return bounds("preference list lengths must be at least 1");
        }
        if self.max_list_len < self.min_list_len {
            return bounds("min_list_len cannot exceed max_list_len");
        }
        if self.max_list_len > num_resources {
            return bounds("max_list_len exceeds the number of resources to rank");
        }
        let probabilities = [Some(self.agent_ties), self.supervisor_ties];
        if probabilities
            .iter()
            .flatten()
            .any(|p| !(0.0..=1.0).contains(p))
        {
            return bounds("tie probabilities must lie in [0.0, 1.0]");
        }
        if !(self.skew.is_finite() && self.skew > 0.0) {
            return bounds("skew must be positive");
        }
        if upper_sum < num_resources {
            return bounds("resource_upper_sum must be at least num_resources");
        }
        if lower_sum > upper_sum {
            return bounds("resource_lower_sum cannot exceed resource_upper_sum");
        }
        if self.problem == MatchingProblem::Spa {
            let (lower, target, upper) = self.supervisor_sums();
            if upper < 1 {
                return bounds("supervisor_upper_sum must be at least 1");
            }
            if target > upper {
                return bounds("supervisor_target_sum cannot exceed supervisor_upper_sum");
            }
            if lower > target {
                return bounds("supervisor_lower_sum cannot exceed supervisor_target_sum");
            }
        }
        Ok(())
    }
}
