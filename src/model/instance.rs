//! The instance model: agents, resources, supervisors and candidate pairs.

use super::preference::PreferenceList;
use crate::error::InstanceError;

/// Stable index of a [`CandidatePair`] in [`Instance::pairs`].
pub type PairIndex = usize;

/// An agent (e.g. a student) with its preference list over resource ids.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
    /// 1-based identity.
    pub id: usize,
    pub preferences: PreferenceList,
}

/// A capacitated slot (e.g. a project) owned by one supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    /// 1-based identity.
    pub id: usize,
    pub lower: usize,
    pub upper: usize,
    /// Index of the owning supervisor.
    pub supervisor: usize,
    /// Resource-local ranking over agent ids, if any.
    pub preferences: Option<PreferenceList>,
}

/// An aggregator of resources (e.g. a lecturer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Supervisor {
    /// 1-based identity.
    pub id: usize,
    pub lower: usize,
    pub target: usize,
    pub upper: usize,
    /// Indices of the owned resources.
    pub resources: Vec<usize>,
    /// Ranking over agent ids, if any.
    pub preferences: Option<PreferenceList>,
}

/// One appearance of a resource on an agent's preference list.
///
/// All fields are indices (0-based); the `*_id` accessors give the 1-based
/// identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidatePair {
    pub agent: usize,
    pub resource: usize,
    pub supervisor: usize,
    /// Rank of the resource on the agent's list.
    pub agent_rank: usize,
    /// Rank of the agent for the supervisor (or the resource), present only
    /// when two-sided lists are enabled.
    pub supervisor_rank: Option<usize>,
}

impl CandidatePair {
    pub fn agent_id(&self) -> usize {
        self.agent + 1
    }

    pub fn resource_id(&self) -> usize {
        self.resource + 1
    }

    pub fn supervisor_id(&self) -> usize {
        self.supervisor + 1
    }

    /// Supervisor-side rank, with unranked pairs placed after every ranked one.
    pub fn supervisor_rank_or_last(&self) -> usize {
        self.supervisor_rank.unwrap_or(usize::MAX)
    }
}

/// A fully built, read-only instance.
///
/// Candidate pairs live in one arena; the per-agent, per-resource,
/// per-supervisor and per-rank views hold indices into it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    agents: Vec<Agent>,
    resources: Vec<Resource>,
    supervisors: Vec<Supervisor>,
    pairs: Vec<CandidatePair>,
    by_agent: Vec<Vec<PairIndex>>,
    by_resource: Vec<Vec<PairIndex>>,
    by_supervisor: Vec<Vec<PairIndex>>,
    by_rank: Vec<Vec<PairIndex>>,
    two_sided: bool,
}

impl Instance {
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn supervisors(&self) -> &[Supervisor] {
        &self.supervisors
    }

    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    pub fn pair(&self, index: PairIndex) -> Option<&CandidatePair> {
        self.pairs.get(index)
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn num_supervisors(&self) -> usize {
        self.supervisors.len()
    }

    /// Whether supervisor-side ranks were computed.
    pub fn is_two_sided(&self) -> bool {
        self.two_sided
    }

    /// Pairs of an agent, in the agent's preference order.
    pub fn agent_pairs(&self, agent: usize) -> &[PairIndex] {
        self.by_agent.get(agent).map_or(&[], Vec::as_slice)
    }

    /// Pairs naming a resource.
    pub fn resource_pairs(&self, resource: usize) -> &[PairIndex] {
        self.by_resource.get(resource).map_or(&[], Vec::as_slice)
    }

    /// Pairs naming a supervisor.
    pub fn supervisor_pairs(&self, supervisor: usize) -> &[PairIndex] {
        self.by_supervisor.get(supervisor).map_or(&[], Vec::as_slice)
    }

    /// Pairs at a given (1-based) agent-side rank, across all agents.
    pub fn rank_pairs(&self, rank: usize) -> &[PairIndex] {
        match rank.checked_sub(1) {
            Some(i) => self.by_rank.get(i).map_or(&[], Vec::as_slice),
            None => &[],
        }
    }

    /// Largest agent-side rank of any pair (0 without pairs).
    pub fn max_rank(&self) -> usize {
        self.by_rank.len()
    }

    /// Agent-side ranks carried by at least one pair, ascending.
    pub fn distinct_ranks(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.by_rank
            .iter()
            .enumerate()
            .filter(|(_, pairs)| !pairs.is_empty())
            .map(|(i, _)| i + 1)
    }

    /// Largest supervisor upper quota (0 without supervisors).
    pub fn max_supervisor_upper(&self) -> usize {
        self.supervisors.iter().map(|s| s.upper).max().unwrap_or(0)
    }

    /// The pair of `agent` naming resource id `resource_id`, if listed.
    pub fn find_pair(&self, agent: usize, resource_id: usize) -> Option<PairIndex> {
        self.agent_pairs(agent)
            .iter()
            .copied()
            .find(|&p| self.pairs[p].resource_id() == resource_id)
    }
}

/// Incrementally describes an instance and builds it with validation.
///
/// # Examples
///
/// ```
/// use u_matching::model::{InstanceBuilder, PreferenceList};
///
/// let mut builder = InstanceBuilder::new();
/// let lecturer = builder.add_supervisor(0, 1, 2);
/// builder.add_resource(0, 1, lecturer);
/// builder.add_resource(1, 2, lecturer);
/// builder.add_agent(PreferenceList::strict([2, 1]));
/// builder.add_agent(PreferenceList::strict([2]));
/// let instance = builder.build().unwrap();
///
/// assert_eq!(instance.pairs().len(), 3);
/// assert_eq!(instance.resource_pairs(1).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    agents: Vec<PreferenceList>,
    resources: Vec<ResourceSpec>,
    supervisors: Vec<SupervisorSpec>,
    two_sided: bool,
}

#[derive(Debug, Clone)]
struct ResourceSpec {
    lower: usize,
    upper: usize,
    supervisor: usize,
    preferences: Option<PreferenceList>,
}

#[derive(Debug, Clone)]
struct SupervisorSpec {
    lower: usize,
    target: usize,
    upper: usize,
    preferences: Option<PreferenceList>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes supervisor-side ranks from the supervisor and resource lists.
    pub fn two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    /// Adds an agent and returns its id.
    pub fn add_agent(&mut self, preferences: PreferenceList) -> usize {
        self.agents.push(preferences);
        self.agents.len()
    }

    /// Adds a resource owned by supervisor id `supervisor` and returns its id.
    pub fn add_resource(&mut self, lower: usize, upper: usize, supervisor: usize) -> usize {
        self.resources.push(ResourceSpec {
            lower,
            upper,
            supervisor,
            preferences: None,
        });
        self.resources.len()
    }

    /// Adds a supervisor and returns its id.
    pub fn add_supervisor(&mut self, lower: usize, target: usize, upper: usize) -> usize {
        self.supervisors.push(SupervisorSpec {
            lower,
            target,
            upper,
            preferences: None,
        });
        self.supervisors.len()
    }

    /// Adds a resource that is its own supervisor, with quotas
    /// `(lower, upper, upper)`, as in instances with two agent classes.
    /// Returns the shared id.
    pub fn add_self_supervised(
        &mut self,
        lower: usize,
        upper: usize,
        preferences: Option<PreferenceList>,
    ) -> usize {
        let supervisor = self.add_supervisor(lower, upper, upper);
        let resource = self.add_resource(lower, upper, supervisor);
        if let Some(list) = preferences {
            self.set_resource_preferences(resource, list);
        }
        resource
    }

    /// Sets the ranking of supervisor id `supervisor` over agent ids.
    /// Unknown ids are ignored.
    pub fn set_supervisor_preferences(&mut self, supervisor: usize, preferences: PreferenceList) {
        if let Some(spec) = supervisor.checked_sub(1).and_then(|i| self.supervisors.get_mut(i)) {
            spec.preferences = Some(preferences);
        }
    }

    /// Sets the resource-local ranking of resource id `resource`. It takes
    /// precedence over the owning supervisor's list. Unknown ids are ignored.
    pub fn set_resource_preferences(&mut self, resource: usize, preferences: PreferenceList) {
        if let Some(spec) = resource.checked_sub(1).and_then(|i| self.resources.get_mut(i)) {
            spec.preferences = Some(preferences);
        }
    }

    /// Validates the description and builds the instance.
    pub fn build(self) -> Result<Instance, InstanceError> {
        let num_agents = self.agents.len();
        let num_resources = self.resources.len();
        let num_supervisors = self.supervisors.len();

        let mut supervisors: Vec<Supervisor> = Vec::with_capacity(num_supervisors);
        for (i, spec) in self.supervisors.into_iter().enumerate() {
            if !(spec.lower <= spec.target && spec.target <= spec.upper) {
                return Err(InstanceError::SupervisorQuota {
                    supervisor: i + 1,
                    lower: spec.lower,
                    target: spec.target,
                    upper: spec.upper,
                });
            }
            if let Some(list) = &spec.preferences {
                check_agent_list(list, num_agents, || format!("supervisor {}", i + 1))?;
            }
            supervisors.push(Supervisor {
                id: i + 1,
                lower: spec.lower,
                target: spec.target,
                upper: spec.upper,
                resources: Vec::new(),
                preferences: spec.preferences,
            });
        }

        let mut resources: Vec<Resource> = Vec::with_capacity(num_resources);
        for (i, spec) in self.resources.into_iter().enumerate() {
            if spec.lower > spec.upper {
                return Err(InstanceError::ResourceQuota {
                    resource: i + 1,
                    lower: spec.lower,
                    upper: spec.upper,
                });
            }
            let Some(owner) = spec
                .supervisor
                .checked_sub(1)
                .filter(|&k| k < num_supervisors)
            else {
                return Err(InstanceError::UnknownSupervisor {
                    resource: i + 1,
                    supervisor: spec.supervisor,
                });
            };
            if let Some(list) = &spec.preferences {
                check_agent_list(list, num_agents, || format!("resource {}", i + 1))?;
            }
            supervisors[owner].resources.push(i);
            resources.push(Resource {
                id: i + 1,
                lower: spec.lower,
                upper: spec.upper,
                supervisor: owner,
                preferences: spec.preferences,
            });
        }

        let mut agents = Vec::with_capacity(num_agents);
        let mut pairs = Vec::new();
        let mut by_agent = Vec::with_capacity(num_agents);
        for (i, preferences) in self.agents.into_iter().enumerate() {
            if preferences.len() > num_resources {
                return Err(InstanceError::ListTooLong {
                    agent: i + 1,
                    len: preferences.len(),
                    available: num_resources,
                });
            }
            let mut row = Vec::with_capacity(preferences.len());
            let mut seen = vec![false; num_resources];
            for (resource_id, agent_rank) in preferences.ranked() {
                let Some(resource) = resource_id.checked_sub(1).filter(|&j| j < num_resources)
                else {
                    return Err(InstanceError::UnknownResource {
                        agent: i + 1,
                        resource: resource_id,
                    });
                };
                if std::mem::replace(&mut seen[resource], true) {
                    return Err(InstanceError::DuplicateResource {
                        agent: i + 1,
                        resource: resource_id,
                    });
                }
                let supervisor = resources[resource].supervisor;
                let supervisor_rank = if self.two_sided {
                    let rank = resources[resource]
                        .preferences
                        .as_ref()
                        .or(supervisors[supervisor].preferences.as_ref())
                        .and_then(|list| rank_of(list, i + 1));
                    match rank {
                        Some(rank) => Some(rank),
                        None => {
                            return Err(InstanceError::UnrankedAgent {
                                agent: i + 1,
                                resource: resource_id,
                                owner: format!("supervisor {}", supervisor + 1),
                            })
                        }
                    }
                } else {
                    None
                };
                row.push(pairs.len());
                pairs.push(CandidatePair {
                    agent: i,
                    resource,
                    supervisor,
                    agent_rank,
                    supervisor_rank,
                });
            }
            by_agent.push(row);
            agents.push(Agent {
                id: i + 1,
                preferences,
            });
        }

        let max_rank = pairs.iter().map(|p| p.agent_rank).max().unwrap_or(0);
        let mut by_resource = vec![Vec::new(); num_resources];
        let mut by_supervisor = vec![Vec::new(); num_supervisors];
        let mut by_rank = vec![Vec::new(); max_rank];
        for (index, pair) in pairs.iter().enumerate() {
            by_resource[pair.resource].push(index);
            by_supervisor[pair.supervisor].push(index);
            by_rank[pair.agent_rank - 1].push(index);
        }

        Ok(Instance {
            agents,
            resources,
            supervisors,
            pairs,
            by_agent,
            by_resource,
            by_supervisor,
            by_rank,
            two_sided: self.two_sided,
        })
    }
}

fn rank_of(list: &PreferenceList, agent_id: usize) -> Option<usize> {
    list.ranked()
        .find(|&(entry, _)| entry == agent_id)
        .map(|(_, rank)| rank)
}

fn check_agent_list(
    list: &PreferenceList,
    num_agents: usize,
    owner: impl Fn() -> String,
) -> Result<(), InstanceError> {
    let mut seen = vec![false; num_agents];
    for agent in list.entries() {
        if agent == 0 || agent > num_agents {
            return Err(InstanceError::UnknownAgent {
                owner: owner(),
                agent,
            });
        }
        if std::mem::replace(&mut seen[agent - 1], true) {
            return Err(InstanceError::DuplicateAgent {
                owner: owner(),
                agent,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two agents, two resources under two supervisors.
    /// Agent 1 ranks resource 2 then 1, agent 2 ranks only resource 2.
    fn example_builder() -> InstanceBuilder {
        let mut b = InstanceBuilder::new().two_sided(true);
        b.add_supervisor(0, 1, 2);
        b.add_supervisor(0, 1, 2);
        b.add_resource(1, 2, 1);
        b.add_resource(0, 1, 2);
        b.add_agent(PreferenceList::strict([2, 1]));
        b.add_agent(PreferenceList::strict([2]));
        b.set_supervisor_preferences(1, PreferenceList::strict([1]));
        b.set_supervisor_preferences(2, PreferenceList::strict([1, 2]));
        b
    }

    #[test]
    fn test_index_views() {
        let inst = example_builder().build().unwrap();
        assert_eq!(inst.pairs().len(), 3);
        assert_eq!(inst.agent_pairs(0), &[0, 1]);
        assert_eq!(inst.agent_pairs(1), &[2]);
        assert_eq!(inst.resource_pairs(0), &[1]);
        assert_eq!(inst.resource_pairs(1), &[0, 2]);
        assert_eq!(inst.supervisor_pairs(0), &[1]);
        assert_eq!(inst.supervisor_pairs(1), &[0, 2]);
        assert_eq!(inst.rank_pairs(1), &[0, 2]);
        assert_eq!(inst.rank_pairs(2), &[1]);
        assert!(inst.rank_pairs(0).is_empty());
        assert!(inst.rank_pairs(3).is_empty());
    }

    #[test]
    fn test_every_pair_in_exactly_one_entry_per_view() {
        let inst = example_builder().build().unwrap();
        let agent_view: Vec<PairIndex> = (0..inst.num_agents())
            .flat_map(|a| inst.agent_pairs(a).to_vec())
            .collect();
        let resource_view: Vec<PairIndex> = (0..inst.num_resources())
            .flat_map(|r| inst.resource_pairs(r).to_vec())
            .collect();
        let supervisor_view: Vec<PairIndex> = (0..inst.num_supervisors())
            .flat_map(|s| inst.supervisor_pairs(s).to_vec())
            .collect();
        let rank_view: Vec<PairIndex> = (1..=inst.max_rank())
            .flat_map(|r| inst.rank_pairs(r).to_vec())
            .collect();
        for view in [agent_view, resource_view, supervisor_view, rank_view] {
            let mut sorted = view;
            sorted.sort_unstable();
            assert_eq!(sorted, (0..inst.pairs().len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_ranks_and_ids() {
        let inst = example_builder().build().unwrap();
        let p = inst.pair(1).unwrap();
        assert_eq!((p.agent_id(), p.resource_id(), p.supervisor_id()), (1, 1, 1));
        assert_eq!(p.agent_rank, 2);
        assert_eq!(p.supervisor_rank, Some(1));
        assert_eq!(inst.pair(2).unwrap().supervisor_rank, Some(2));
        assert_eq!(inst.max_rank(), 2);
        assert_eq!(inst.max_supervisor_upper(), 2);
        assert_eq!(inst.find_pair(0, 1), Some(1));
        assert_eq!(inst.find_pair(1, 1), None);
    }

    #[test]
    fn test_tied_ranks_skip() {
        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 5);
        for _ in 0..5 {
            b.add_resource(0, 1, s);
        }
        b.add_agent(PreferenceList::parse_tokens(&["4", "5", "(1", "2)", "3"]).unwrap());
        let inst = b.build().unwrap();
        let ranks: Vec<usize> = inst.pairs().iter().map(|p| p.agent_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 3, 5]);
        assert_eq!(inst.distinct_ranks().collect::<Vec<_>>(), vec![1, 2, 3, 5]);
        assert!(inst.rank_pairs(4).is_empty());
    }

    #[test]
    fn test_resource_list_overrides_supervisor_list() {
        let mut b = InstanceBuilder::new().two_sided(true);
        b.add_self_supervised(0, 1, Some(PreferenceList::strict([2, 1])));
        b.add_agent(PreferenceList::strict([1]));
        b.add_agent(PreferenceList::strict([1]));
        let inst = b.build().unwrap();
        assert_eq!(inst.pair(0).unwrap().supervisor_rank, Some(2));
        assert_eq!(inst.pair(1).unwrap().supervisor_rank, Some(1));
        assert_eq!(inst.supervisors()[0].target, 1);
    }

    #[test]
    fn test_one_sided_has_no_supervisor_ranks() {
        let inst = example_builder().two_sided(false).build().unwrap();
        assert!(inst.pairs().iter().all(|p| p.supervisor_rank.is_none()));
        assert!(!inst.is_two_sided());
    }

    #[test]
    fn test_rejects_malformed() {
        let mut b = InstanceBuilder::new();
        b.add_supervisor(2, 1, 3);
        assert!(matches!(b.build(), Err(InstanceError::SupervisorQuota { .. })));

        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 1);
        b.add_resource(2, 1, s);
        assert!(matches!(b.build(), Err(InstanceError::ResourceQuota { .. })));

        let mut b = InstanceBuilder::new();
        b.add_resource(0, 1, 4);
        assert!(matches!(b.build(), Err(InstanceError::UnknownSupervisor { .. })));

        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 1);
        b.add_resource(0, 1, s);
        b.add_agent(PreferenceList::strict([1, 1]));
        assert!(matches!(b.build(), Err(InstanceError::ListTooLong { .. })));

        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 1);
        b.add_resource(0, 1, s);
        b.add_resource(0, 1, s);
        b.add_agent(PreferenceList::strict([1, 1]));
        assert!(matches!(b.build(), Err(InstanceError::DuplicateResource { .. })));

        let mut b = InstanceBuilder::new();
        let s = b.add_supervisor(0, 0, 1);
        b.add_resource(0, 1, s);
        b.add_agent(PreferenceList::strict([3]));
        assert!(matches!(b.build(), Err(InstanceError::UnknownResource { .. })));
    }

    #[test]
    fn test_rejects_unranked_agent_when_two_sided() {
        let mut b = example_builder();
        b.set_supervisor_preferences(2, PreferenceList::strict([2]));
        assert!(matches!(b.build(), Err(InstanceError::UnrankedAgent { .. })));

        let mut b = example_builder();
        b.set_supervisor_preferences(2, PreferenceList::strict([1, 2, 7]));
        assert!(matches!(b.build(), Err(InstanceError::UnknownAgent { .. })));
    }
}
