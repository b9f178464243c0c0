//! Validity and stability of a candidate matching.
//!
//! Both predicates are pure and never fail: a missing or unknown pair
//! reference simply makes the matching invalid (or unstable).

use crate::model::{CandidatePair, Instance, PairIndex};

/// Checks a matching against every quota.
///
/// `matched` holds one entry per matched agent. A `None` entry, an unknown
/// pair index or an agent matched twice makes the matching invalid. With
/// `closures`, a resource with no matches is exempt from its lower quota;
/// supervisor quotas are never relaxed.
pub fn is_valid(instance: &Instance, matched: &[Option<PairIndex>], closures: bool) -> bool {
    let mut agent_seen = vec![false; instance.num_agents()];
    let mut resource_counts = vec![0usize; instance.num_resources()];
    let mut supervisor_counts = vec![0usize; instance.num_supervisors()];

    for entry in matched {
        let Some(pair) = entry.and_then(|p| instance.pair(p)) else {
            return false;
        };
        if std::mem::replace(&mut agent_seen[pair.agent], true) {
            return false;
        }
        resource_counts[pair.resource] += 1;
        supervisor_counts[pair.supervisor] += 1;
    }

    let resources_ok = instance
        .resources()
        .iter()
        .zip(&resource_counts)
        .all(|(r, &n)| n <= r.upper && (n >= r.lower || (closures && n == 0)));
    let supervisors_ok = instance
        .supervisors()
        .iter()
        .zip(&supervisor_counts)
        .all(|(s, &n)| s.lower <= n && n <= s.upper);

    resources_ok && supervisors_ok
}

/// Checks that no candidate pair blocks the matching.
///
/// `slots` holds one entry per agent in agent order, `None` meaning
/// unassigned. A slot naming an unknown pair, or a pair of another agent,
/// is reported as unstable.
///
/// A pair `(a, r, s)` blocks when `a` is unassigned or strictly prefers `r`
/// to its match, and one of the following holds:
/// - `r` and `s` are both under their upper quotas;
/// - `r` is under its upper quota, `s` is full, and either `a` is already
///   assigned to `s` or `s` ranks `a` strictly better than its worst
///   assignee;
/// - `r` is full and `s` ranks `a` strictly better than the worst assignee
///   of `r`.
pub fn is_stable(instance: &Instance, slots: &[Option<PairIndex>]) -> bool {
    let Some(table) = OccupancyTable::build(instance, slots) else {
        return false;
    };

    for agent in 0..instance.num_agents() {
        let current = table.current[agent].map(|p| &instance.pairs()[p]);
        for &p in instance.agent_pairs(agent) {
            let pair = &instance.pairs()[p];
            if table.blocks(instance, pair, current) {
                return false;
            }
        }
    }
    true
}

/// Per-resource and per-supervisor occupancy and worst assigned
/// supervisor-side rank.
struct OccupancyTable {
    current: Vec<Option<PairIndex>>,
    resource_counts: Vec<usize>,
    supervisor_counts: Vec<usize>,
    resource_worst: Vec<Option<usize>>,
    supervisor_worst: Vec<Option<usize>>,
}

impl OccupancyTable {
    fn build(instance: &Instance, slots: &[Option<PairIndex>]) -> Option<Self> {
        let mut table = Self {
            current: vec![None; instance.num_agents()],
            resource_counts: vec![0; instance.num_resources()],
            supervisor_counts: vec![0; instance.num_supervisors()],
            resource_worst: vec![None; instance.num_resources()],
            supervisor_worst: vec![None; instance.num_supervisors()],
        };
        for (agent, slot) in slots.iter().enumerate() {
            let Some(p) = *slot else {
                continue;
            };
            let pair = instance.pair(p)?;
            if pair.agent != agent {
                return None;
            }
            table.current[agent] = Some(p);
            table.resource_counts[pair.resource] += 1;
            table.supervisor_counts[pair.supervisor] += 1;
            let rank = pair.supervisor_rank_or_last();
            raise(&mut table.resource_worst[pair.resource], rank);
            raise(&mut table.supervisor_worst[pair.supervisor], rank);
        }
        Some(table)
    }

    fn blocks(
        &self,
        instance: &Instance,
        pair: &CandidatePair,
        current: Option<&CandidatePair>,
    ) -> bool {
        let wants_to_move = current.map_or(true, |c| pair.agent_rank < c.agent_rank);
        if !wants_to_move {
            return false;
        }

        let resource = &instance.resources()[pair.resource];
        let supervisor = &instance.supervisors()[pair.supervisor];
        let resource_open = self.resource_counts[pair.resource] < resource.upper;
        let supervisor_open = self.supervisor_counts[pair.supervisor] < supervisor.upper;
        let rank = pair.supervisor_rank_or_last();
        let beats = |worst: Option<usize>| worst.is_some_and(|w| rank < w);

        match (resource_open, supervisor_open) {
            (true, true) => true,
            (true, false) => {
                current.is_some_and(|c| c.supervisor == pair.supervisor)
                    || beats(self.supervisor_worst[pair.supervisor])
            }
            (false, _) => beats(self.resource_worst[pair.resource]),
        }
    }
}

fn raise(slot: &mut Option<usize>, rank: usize) {
    *slot = Some(slot.map_or(rank, |w| w.max(rank)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceBuilder, PreferenceList};
    use proptest::prelude::*;

    /// Resource quotas `[0,1]` and `[1,2]`, supervisor quotas `[0,2]` with
    /// targets `[1,1]`. Agent 1 ranks resource 2 then 1, agent 2 ranks
    /// resource 2. Supervisor 1 ranks agent 1; supervisor 2 ranks 1 then 2.
    fn example(resource_one_lower: usize) -> Instance {
        let mut b = InstanceBuilder::new().two_sided(true);
        b.add_supervisor(0, 1, 2);
        b.add_supervisor(0, 1, 2);
        b.add_resource(resource_one_lower, 1, 1);
        b.add_resource(1, 2, 2);
        b.add_agent(PreferenceList::strict([2, 1]));
        b.add_agent(PreferenceList::strict([2]));
        b.set_supervisor_preferences(1, PreferenceList::strict([1]));
        b.set_supervisor_preferences(2, PreferenceList::strict([1, 2]));
        b.build().unwrap()
    }

    fn slots(instance: &Instance, ids: &[Option<usize>]) -> Vec<Option<PairIndex>> {
        ids.iter()
            .enumerate()
            .map(|(a, id)| id.map(|r| instance.find_pair(a, r).unwrap()))
            .collect()
    }

    #[test]
    fn test_valid_when_quotas_hold() {
        let inst = example(0);
        let both = slots(&inst, &[Some(2), Some(2)]);
        assert!(is_valid(&inst, &both, false));
    }

    #[test]
    fn test_unmet_lower_quota_without_closure() {
        let inst = example(1);
        let matched = slots(&inst, &[Some(2), None]);
        let matched: Vec<_> = matched.into_iter().flatten().map(Some).collect();
        assert!(!is_valid(&inst, &matched, false));
        assert!(is_valid(&inst, &matched, true));
    }

    #[test]
    fn test_none_and_repeated_agent_are_invalid() {
        let inst = example(0);
        assert!(!is_valid(&inst, &[Some(2), None], false));
        assert!(!is_valid(&inst, &[Some(0), Some(1)], false));
        assert!(!is_valid(&inst, &[Some(99)], false));
    }

    #[test]
    fn test_supervisor_lower_quota_never_relaxed() {
        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(1, 1, 2);
        b.add_resource(1, 2, s);
        b.add_agent(PreferenceList::strict([1]));
        let inst = b.build().unwrap();
        assert!(!is_valid(&inst, &[], true));
        assert!(is_valid(&inst, &[Some(0)], true));
    }

    #[test]
    fn test_unassigned_agent_with_open_resource_blocks() {
        let inst = example(0);
        let a = slots(&inst, &[Some(2), None]);
        assert!(!is_stable(&inst, &a));
    }

    #[test]
    fn test_both_on_preferred_resource_is_stable() {
        let inst = example(0);
        let a = slots(&inst, &[Some(2), Some(2)]);
        assert!(is_stable(&inst, &a));
    }

    #[test]
    fn test_full_resource_blocks_only_for_better_ranked_agent() {
        // Resource 2 holds a single seat taken by agent 2, whom supervisor
        // 2 ranks below agent 1.
        let mut b = InstanceBuilder::new().two_sided(true);
        b.add_supervisor(0, 1, 2);
        b.add_supervisor(0, 1, 2);
        b.add_resource(0, 1, 1);
        b.add_resource(0, 1, 2);
        b.add_agent(PreferenceList::strict([2, 1]));
        b.add_agent(PreferenceList::strict([2]));
        b.set_supervisor_preferences(1, PreferenceList::strict([1]));
        b.set_supervisor_preferences(2, PreferenceList::strict([1, 2]));
        let inst = b.build().unwrap();

        assert!(!is_stable(&inst, &slots(&inst, &[Some(1), Some(2)])));
        assert!(is_stable(&inst, &slots(&inst, &[Some(2), None])));
    }

    #[test]
    fn test_full_supervisor_accepts_own_assignee() {
        // One supervisor with capacity 1 owns both resources; agent 1 sits
        // on its second choice under the same supervisor.
        let mut b = InstanceBuilder::new().two_sided(true);
        let s = b.add_supervisor(0, 1, 1);
        b.add_resource(0, 1, s);
        b.add_resource(0, 1, s);
        b.add_agent(PreferenceList::strict([1, 2]));
        b.set_supervisor_preferences(s, PreferenceList::strict([1]));
        let inst = b.build().unwrap();

        assert!(!is_stable(&inst, &slots(&inst, &[Some(2)])));
        assert!(is_stable(&inst, &slots(&inst, &[Some(1)])));
    }

    #[test]
    fn test_foreign_pair_in_slot_is_unstable() {
        let inst = example(0);
        // Pair 2 belongs to agent 2.
        assert!(!is_stable(&inst, &[Some(2), None]));
    }

    proptest! {
        #[test]
        fn prop_predicates_are_idempotent(
            choice in proptest::collection::vec(0usize..3, 2),
            closures in any::<bool>(),
        ) {
            let inst = example(1);
            let slots: Vec<Option<PairIndex>> = choice
                .iter()
                .enumerate()
                .map(|(a, &c)| inst.agent_pairs(a).get(c).copied())
                .collect();
            let matched: Vec<Option<PairIndex>> = slots.iter().flatten().map(|&p| Some(p)).collect();
            prop_assert_eq!(is_valid(&inst, &matched, closures), is_valid(&inst, &matched, closures));
            prop_assert_eq!(is_stable(&inst, &slots), is_stable(&inst, &slots));
        }
    }
}
