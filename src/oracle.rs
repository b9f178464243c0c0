//! Exhaustive oracle.
//!
//! Enumerates every way of giving each agent one of its candidate resources
//! or nothing, keeps the valid matchings, and tracks the optimum of every
//! statistic along the way. Meant as ground truth on instances small enough
//! for the full scan to finish.

use crate::metrics::{more_generous, more_greedy, MatchingStats};
use crate::model::{Instance, PairIndex};
use crate::predicate::is_valid;
use std::time::Instant;
use tracing::{debug, info_span};

/// A running best under a caller-supplied "strictly better" comparator.
///
/// The first offer always wins; later offers replace the current value only
/// if strictly better, so ties keep the earlier value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningBest<T> {
    best: Option<T>,
}

impl<T> Default for RunningBest<T> {
    fn default() -> Self {
        Self { best: None }
    }
}

impl<T> RunningBest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a candidate; returns whether it became the running best.
    pub fn offer(&mut self, candidate: T, better: impl Fn(&T, &T) -> bool) -> bool {
        let replace = match &self.best {
            None => true,
            Some(current) => better(&candidate, current),
        };
        if replace {
            self.best = Some(candidate);
        }
        replace
    }

    /// Replaces the running best unconditionally.
    pub fn reset(&mut self, value: T) {
        self.best = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.best.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.best
    }
}

fn smaller(a: &usize, b: &usize) -> bool {
    a < b
}

fn larger(a: &usize, b: &usize) -> bool {
    a > b
}

fn generous(a: &Vec<usize>, b: &Vec<usize>) -> bool {
    more_generous(a, b)
}

fn greedy(a: &Vec<usize>, b: &Vec<usize>) -> bool {
    more_greedy(a, b)
}

/// Optimal values over all valid matchings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleOptima {
    /// Largest matching size.
    pub size: usize,
    /// Among maximum matchings: smallest sum of ranks.
    pub max_size_min_cost: usize,
    /// Among maximum matchings: smallest degree.
    pub max_size_min_degree: usize,
    /// Among maximum matchings: smallest sum of squared ranks.
    pub max_size_min_cost_sq: usize,
    /// Among maximum matchings: most generous profile.
    pub max_size_generous_profile: Vec<usize>,
    /// Among maximum matchings: most greedy profile.
    pub max_size_greedy_profile: Vec<usize>,
    /// Most greedy profile over all valid matchings.
    pub greedy_profile: Vec<usize>,
    /// Smallest largest supervisor deviation.
    pub min_max_deviation: usize,
    /// Smallest total supervisor deviation.
    pub min_sum_deviation: usize,
    /// Smallest matching size.
    pub min_size: usize,
    /// Most generous profile over all valid matchings.
    pub generous_profile: Vec<usize>,
    /// Smallest sum of ranks over all valid matchings.
    pub min_cost: usize,
    /// Smallest sum of squared ranks over all valid matchings.
    pub min_cost_sq: usize,
}

/// Result of [`OracleSolver::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OracleOutcome {
    /// `None` when no valid matching exists.
    pub optima: Option<OracleOptima>,
    /// Candidate matchings enumerated.
    pub examined: u64,
    /// Valid matchings among them.
    pub feasible: u64,
    /// Time spent scanning.
    pub solve_time_ms: u64,
}

impl OracleOutcome {
    pub fn is_feasible(&self) -> bool {
        self.optima.is_some()
    }
}

/// Running optima of the scan.
#[derive(Debug, Default)]
struct Trackers {
    size: RunningBest<usize>,
    max_size_cost: RunningBest<usize>,
    max_size_degree: RunningBest<usize>,
    max_size_cost_sq: RunningBest<usize>,
    max_size_generous: RunningBest<Vec<usize>>,
    max_size_greedy: RunningBest<Vec<usize>>,
    greedy: RunningBest<Vec<usize>>,
    max_deviation: RunningBest<usize>,
    sum_deviation: RunningBest<usize>,
    min_size: RunningBest<usize>,
    generous: RunningBest<Vec<usize>>,
    cost: RunningBest<usize>,
    cost_sq: RunningBest<usize>,
}

impl Trackers {
    fn observe(&mut self, stats: MatchingStats) {
        if self.size.offer(stats.size, larger) {
            self.max_size_cost.reset(stats.cost);
            self.max_size_degree.reset(stats.degree);
            self.max_size_cost_sq.reset(stats.cost_sq);
            self.max_size_generous.reset(stats.profile.clone());
            self.max_size_greedy.reset(stats.profile.clone());
        } else if self.size.get() == Some(&stats.size) {
            self.max_size_cost.offer(stats.cost, smaller);
            self.max_size_degree.offer(stats.degree, smaller);
            self.max_size_cost_sq.offer(stats.cost_sq, smaller);
            self.max_size_generous.offer(stats.profile.clone(), generous);
            self.max_size_greedy.offer(stats.profile.clone(), greedy);
        }

        self.greedy.offer(stats.profile.clone(), greedy);
        self.generous.offer(stats.profile, generous);
        self.max_deviation.offer(stats.max_deviation, smaller);
        self.sum_deviation.offer(stats.sum_deviation, smaller);
        self.min_size.offer(stats.size, smaller);
        self.cost.offer(stats.cost, smaller);
        self.cost_sq.offer(stats.cost_sq, smaller);
    }

    fn finish(self) -> Option<OracleOptima> {
        Some(OracleOptima {
            size: self.size.into_inner()?,
            max_size_min_cost: self.max_size_cost.into_inner()?,
            max_size_min_degree: self.max_size_degree.into_inner()?,
            max_size_min_cost_sq: self.max_size_cost_sq.into_inner()?,
            max_size_generous_profile: self.max_size_generous.into_inner()?,
            max_size_greedy_profile: self.max_size_greedy.into_inner()?,
            greedy_profile: self.greedy.into_inner()?,
            min_max_deviation: self.max_deviation.into_inner()?,
            min_sum_deviation: self.sum_deviation.into_inner()?,
            min_size: self.min_size.into_inner()?,
            generous_profile: self.generous.into_inner()?,
            min_cost: self.cost.into_inner()?,
            min_cost_sq: self.cost_sq.into_inner()?,
        })
    }
}

/// Executes the exhaustive scan.
pub struct OracleSolver;

impl OracleSolver {
    /// Scans `(candidates + 1)` choices per agent.
    pub fn run(instance: &Instance, closures: bool) -> OracleOutcome {
        let _span = info_span!(
            "oracle_scan",
            agents = instance.num_agents(),
            pairs = instance.pairs().len()
        )
        .entered();
        let start = Instant::now();

        let num_agents = instance.num_agents();
        // choice[a] == agent_pairs(a).len() means unassigned.
        let mut choice = vec![0usize; num_agents];
        let mut matched: Vec<Option<PairIndex>> = Vec::with_capacity(num_agents);
        let mut trackers = Trackers::default();
        let mut examined = 0u64;
        let mut feasible = 0u64;

        loop {
            examined += 1;
            matched.clear();
            matched.extend(
                (0..num_agents).filter_map(|a| instance.agent_pairs(a).get(choice[a]).map(|&p| Some(p))),
            );
            if is_valid(instance, &matched, closures) {
                feasible += 1;
                trackers.observe(MatchingStats::compute(
                    instance,
                    matched.iter().flatten().copied(),
                ));
            }

            if !advance(instance, &mut choice) {
                break;
            }
        }

        let optima = trackers.finish();
        debug!(examined, feasible, infeasible = optima.is_none(), "oracle scan finished");
        OracleOutcome {
            optima,
            examined,
            feasible,
            solve_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Odometer step over the per-agent choices; `false` after the last one.
fn advance(instance: &Instance, choice: &mut [usize]) -> bool {
    for (agent, c) in choice.iter_mut().enumerate() {
        if *c < instance.agent_pairs(agent).len() {
            *c += 1;
            return true;
        }
        *c = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceBuilder, PreferenceList};

    /// Resource quotas `[0,1]` and `[1,2]`, supervisors `[0,2]` with
    /// targets 1. Agent 1 ranks resource 2 then 1, agent 2 ranks resource 2.
    fn instance() -> Instance {
        let mut b = InstanceBuilder::new();
        b.add_supervisor(0, 1, 2);
        b.add_supervisor(0, 1, 2);
        b.add_resource(0, 1, 1);
        b.add_resource(1, 2, 2);
        b.add_agent(PreferenceList::strict([2, 1]));
        b.add_agent(PreferenceList::strict([2]));
        b.build().unwrap()
    }

    #[test]
    fn test_running_best_keeps_earlier_ties() {
        let mut best = RunningBest::new();
        assert!(best.offer((3, 'a'), |x: &(i32, char), y| x.0 < y.0));
        assert!(!best.offer((3, 'b'), |x, y| x.0 < y.0));
        assert!(best.offer((1, 'c'), |x, y| x.0 < y.0));
        assert_eq!(best.get(), Some(&(1, 'c')));
        best.reset((9, 'd'));
        assert_eq!(best.into_inner(), Some((9, 'd')));
    }

    #[test]
    fn test_scan_counts() {
        let outcome = OracleSolver::run(&instance(), false);
        // (2 + 1) * (1 + 1) choices, of which (r2, r2), (r1, r2),
        // (r2, -) and (-, r2) are valid.
        assert_eq!(outcome.examined, 6);
        assert_eq!(outcome.feasible, 4);
    }

    #[test]
    fn test_optima() {
        let optima = OracleSolver::run(&instance(), false).optima.unwrap();
        assert_eq!(optima.size, 2);
        assert_eq!(optima.max_size_min_cost, 2);
        assert_eq!(optima.max_size_min_degree, 1);
        assert_eq!(optima.max_size_min_cost_sq, 2);
        assert_eq!(optima.max_size_generous_profile, vec![2, 0]);
        assert_eq!(optima.max_size_greedy_profile, vec![2, 0]);
        assert_eq!(optima.greedy_profile, vec![2, 0]);
        assert_eq!(optima.min_max_deviation, 0);
        assert_eq!(optima.min_sum_deviation, 0);
        assert_eq!(optima.min_size, 1);
        assert_eq!(optima.generous_profile, vec![1, 0]);
        assert_eq!(optima.min_cost, 1);
        assert_eq!(optima.min_cost_sq, 1);
    }

    #[test]
    fn test_infeasible_sentinel() {
        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 3);
        b.add_resource(2, 3, s);
        b.add_agent(PreferenceList::strict([1]));
        let outcome = OracleSolver::run(&b.build().unwrap(), false);
        assert!(!outcome.is_feasible());
        assert_eq!(outcome.examined, 2);
        assert_eq!(outcome.feasible, 0);
    }

    #[test]
    fn test_closures_admit_empty_resource() {
        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 3);
        b.add_resource(2, 3, s);
        b.add_agent(PreferenceList::strict([1]));
        let optima = OracleSolver::run(&b.build().unwrap(), true).optima.unwrap();
        assert_eq!(optima.size, 0);
        assert_eq!(optima.greedy_profile, vec![0]);
    }
}
