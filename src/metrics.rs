//! Assignments and the statistics derived from them.

use crate::model::{Instance, PairIndex};
use std::cmp::Ordering;
use std::fmt;

/// One slot per agent: the matched candidate pair, or `None` if unassigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    slots: Vec<Option<PairIndex>>,
}

impl Assignment {
    /// Every agent unassigned.
    pub fn unassigned(num_agents: usize) -> Self {
        Self {
            slots: vec![None; num_agents],
        }
    }

    pub fn from_slots(slots: Vec<Option<PairIndex>>) -> Self {
        Self { slots }
    }

    /// Builds an assignment from one resource id (or `None`) per agent.
    ///
    /// Returns `None` if an agent is given a resource it does not list.
    pub fn from_resource_ids(instance: &Instance, ids: &[Option<usize>]) -> Option<Self> {
        let mut slots = Vec::with_capacity(instance.num_agents());
        for agent in 0..instance.num_agents() {
            let slot = match ids.get(agent).copied().flatten() {
                Some(resource_id) => Some(instance.find_pair(agent, resource_id)?),
                None => None,
            };
            slots.push(slot);
        }
        Some(Self { slots })
    }

    pub fn slots(&self) -> &[Option<PairIndex>] {
        &self.slots
    }

    pub fn get(&self, agent: usize) -> Option<PairIndex> {
        self.slots.get(agent).copied().flatten()
    }

    pub fn set(&mut self, agent: usize, pair: Option<PairIndex>) {
        if let Some(slot) = self.slots.get_mut(agent) {
            *slot = pair;
        }
    }

    /// Matched pairs in agent order.
    pub fn matched(&self) -> impl Iterator<Item = PairIndex> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Number of matched agents.
    pub fn size(&self) -> usize {
        self.matched().count()
    }

    /// Resource id per agent, `None` for unassigned agents.
    pub fn resource_ids(&self, instance: &Instance) -> Vec<Option<usize>> {
        self.slots
            .iter()
            .map(|slot| slot.and_then(|p| instance.pair(p)).map(|p| p.resource_id()))
            .collect()
    }

    /// Resource id per agent separated by spaces, `0` for unassigned agents.
    pub fn matching_string(&self, instance: &Instance) -> String {
        self.resource_ids(instance)
            .iter()
            .map(|id| id.unwrap_or(0).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Statistics of one matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchingStats {
    /// Number of matched agents.
    pub size: usize,
    /// Sum of matched agent-side ranks.
    pub cost: usize,
    /// Sum of squared matched agent-side ranks.
    pub cost_sq: usize,
    /// Largest matched agent-side rank (0 for the empty matching).
    pub degree: usize,
    /// Number of matches at each rank `1..=max_rank`.
    pub profile: Vec<usize>,
    /// Largest deviation of a supervisor's load from its target.
    pub max_deviation: usize,
    /// Total deviation of supervisor loads from their targets.
    pub sum_deviation: usize,
}

impl MatchingStats {
    /// Computes the statistics of the given matched pairs.
    ///
    /// Pair indices outside the instance are skipped.
    pub fn compute(instance: &Instance, matched: impl IntoIterator<Item = PairIndex>) -> Self {
        let mut stats = Self {
            profile: vec![0; instance.max_rank()],
            ..Self::default()
        };
        let mut loads = vec![0usize; instance.num_supervisors()];
        for pair in matched.into_iter().filter_map(|p| instance.pair(p)) {
            let rank = pair.agent_rank;
            stats.size += 1;
            stats.cost += rank;
            stats.cost_sq += rank * rank;
            stats.degree = stats.degree.max(rank);
            stats.profile[rank - 1] += 1;
            loads[pair.supervisor] += 1;
        }
        let deviations = supervisor_deviations(instance, &loads);
        stats.max_deviation = deviations.iter().copied().max().unwrap_or(0);
        stats.sum_deviation = deviations.iter().sum();
        stats
    }

    /// Statistics of an assignment.
    pub fn of(instance: &Instance, assignment: &Assignment) -> Self {
        Self::compute(instance, assignment.matched())
    }
}

/// Absolute difference between each supervisor's load and its target.
pub fn supervisor_deviations(instance: &Instance, loads: &[usize]) -> Vec<usize> {
    instance
        .supervisors()
        .iter()
        .enumerate()
        .map(|(k, s)| loads.get(k).copied().unwrap_or(0).abs_diff(s.target))
        .collect()
}

/// Formats a profile as `< a b c >`.
pub struct ProfileDisplay<'a>(pub &'a [usize]);

impl fmt::Display for ProfileDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("< ")?;
        for count in self.0 {
            write!(f, "{count} ")?;
        }
        f.write_str(">")
    }
}

/// Whether `p1` is strictly more generous than `p2`.
///
/// Scans from the worst rank towards the best; the first differing entry
/// decides, fewer matches at that rank being more generous.
///
/// ```
/// use u_matching::metrics::more_generous;
///
/// assert!(more_generous(&[2, 1], &[1, 2]));
/// assert!(!more_generous(&[1, 2], &[2, 1]));
/// assert!(!more_generous(&[1, 2], &[1, 2]));
/// ```
pub fn more_generous(p1: &[usize], p2: &[usize]) -> bool {
    first_difference(p1.iter().rev(), p2.iter().rev()) == Some(Ordering::Less)
}

/// Whether `p1` is strictly more greedy than `p2`.
///
/// Scans from rank 1 towards the worst rank; the first differing entry
/// decides, more matches at that rank being greedier.
pub fn more_greedy(p1: &[usize], p2: &[usize]) -> bool {
    first_difference(p1.iter(), p2.iter()) == Some(Ordering::Greater)
}

fn first_difference<'a>(
    a: impl Iterator<Item = &'a usize>,
    b: impl Iterator<Item = &'a usize>,
) -> Option<Ordering> {
    a.zip(b).map(|(x, y)| x.cmp(y)).find(|o| o.is_ne())
}
