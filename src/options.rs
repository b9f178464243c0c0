//! User-selected option sets.
//!
//! Every option is a closed set of named alternatives so that the dispatch
//! over criteria and the validation of instance options are exhaustive.

use crate::error::OptionsError;
use std::fmt;

/// Number of agent classes in an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentClasses {
    /// Agents and resources only (HA, SM, HR). Every resource acts as its
    /// own supervisor.
    Two,
    /// Agents, resources and supervisors (SPA).
    #[default]
    Three,
}

/// Options describing the shape of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceOptions {
    /// Supervisors (or resources, with two agent classes) rank agents.
    pub two_sided: bool,
    /// Number of agent classes.
    pub agent_classes: AgentClasses,
    /// A resource may stay entirely unused regardless of its lower quota.
    pub closures: bool,
}

impl InstanceOptions {
    pub fn new(agent_classes: AgentClasses) -> Self {
        Self {
            agent_classes,
            ..Self::default()
        }
    }

    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    pub fn with_closures(mut self, closures: bool) -> Self {
        self.closures = closures;
        self
    }
}

/// Constraints layered on top of validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraConstraints {
    /// No blocking pair may exist.
    pub stability: bool,
}

/// An optimization criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// Maximize the number of matched agents.
    MaxSize,
    /// Minimize the number of matched agents.
    MinSize,
    /// Minimize matches at the worst rank, then the next worst, and so on.
    Generous,
    /// Maximize matches at rank 1, then rank 2, and so on.
    Greedy,
    /// Minimize the sum of matched ranks.
    MinCost,
    /// Minimize the sum of squared matched ranks.
    MinSquaredCost,
    /// Minimize the largest deviation of a supervisor's load from its target.
    LoadMaxBalance,
    /// Minimize the total deviation of supervisor loads from their targets.
    LoadSumBalance,
}

impl Criterion {
    /// All criteria in their conventional listing order.
    pub const ALL: [Criterion; 8] = [
        Criterion::MaxSize,
        Criterion::MinSize,
        Criterion::Generous,
        Criterion::Greedy,
        Criterion::MinCost,
        Criterion::MinSquaredCost,
        Criterion::LoadMaxBalance,
        Criterion::LoadSumBalance,
    ];

    /// Whether the criterion needs the per-supervisor deviation variables.
    pub fn needs_load_balance(self) -> bool {
        matches!(self, Criterion::LoadMaxBalance | Criterion::LoadSumBalance)
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Criterion::MaxSize => "maximising size",
            Criterion::MinSize => "minimising size",
            Criterion::Generous => "generous",
            Criterion::Greedy => "greedy",
            Criterion::MinCost => "minimising sum of ranks",
            Criterion::MinSquaredCost => "minimising sum of squares of ranks",
            Criterion::LoadMaxBalance => "load max balanced",
            Criterion::LoadSumBalance => "load sum balanced",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Criteria in lexicographic priority order, without repetitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriterionOrder(Vec<Criterion>);

impl CriterionOrder {
    /// Creates an order from an explicit sequence.
    pub fn new(criteria: impl IntoIterator<Item = Criterion>) -> Result<Self, OptionsError> {
        let criteria: Vec<Criterion> = criteria.into_iter().collect();
        for (i, c) in criteria.iter().enumerate() {
            if criteria[..i].contains(c) {
                return Err(OptionsError::RepeatedCriterion(c.to_string()));
            }
        }
        Ok(Self(criteria))
    }

    /// Places criteria by 1-based position; unplaced criteria are skipped.
    ///
    /// Positions must lie in `1..=8` and be distinct. Gaps are closed, so
    /// positions `{4, 2}` yield the order `[second, first]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_matching::options::{Criterion, CriterionOrder};
    ///
    /// let order = CriterionOrder::from_positions(&[
    ///     (Some(3), Criterion::MaxSize),
    ///     (None, Criterion::MinSize),
    ///     (Some(1), Criterion::Greedy),
    /// ])
    /// .unwrap();
    /// assert_eq!(order.as_slice(), &[Criterion::Greedy, Criterion::MaxSize]);
    /// ```
    pub fn from_positions(placed: &[(Option<usize>, Criterion)]) -> Result<Self, OptionsError> {
        let max = Criterion::ALL.len();
        let mut slots: Vec<Option<Criterion>> = vec![None; max];
        for &(position, criterion) in placed {
            let Some(position) = position else {
                continue;
            };
            if position < 1 || position > max {
                return Err(OptionsError::PositionOutOfRange { position, max });
            }
            if slots[position - 1].is_some() {
                return Err(OptionsError::RepeatedPosition(position));
            }
            slots[position - 1] = Some(criterion);
        }
        Self::new(slots.into_iter().flatten())
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether any criterion needs load-balance variables.
    pub fn needs_load_balance(&self) -> bool {
        self.0.iter().any(|c| c.needs_load_balance())
    }
}

/// Which strategy computes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverKind {
    /// Sequence of integer programs against the MIP backend.
    #[default]
    Lexicographic,
    /// Exhaustive enumeration; ground truth for small instances.
    BruteForce,
}

/// Everything the user selects for one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveOptions {
    pub instance: InstanceOptions,
    pub extra: ExtraConstraints,
    pub criteria: CriterionOrder,
    pub solver: SolverKind,
}

impl SolveOptions {
    pub fn new(instance: InstanceOptions) -> Self {
        Self {
            instance,
            ..Self::default()
        }
    }

    pub fn with_stability(mut self, stability: bool) -> Self {
        self.extra.stability = stability;
        self
    }

    pub fn with_criteria(mut self, criteria: CriterionOrder) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Checks the option sets for consistency.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.extra.stability && !self.instance.two_sided {
            return Err(OptionsError::StabilityWithoutTwoSidedLists);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_positions_closes_gaps() {
        let placed = [
            (Some(4), Criterion::MaxSize),
            (Some(2), Criterion::MinSize),
            (None, Criterion::Generous),
            (Some(5), Criterion::Greedy),
            (None, Criterion::MinCost),
            (Some(1), Criterion::MinSquaredCost),
            (Some(3), Criterion::LoadMaxBalance),
            (None, Criterion::LoadSumBalance),
        ];
        let order = CriterionOrder::from_positions(&placed).unwrap();
        assert_eq!(
            order.as_slice(),
            &[
                Criterion::MinSquaredCost,
                Criterion::MinSize,
                Criterion::LoadMaxBalance,
                Criterion::MaxSize,
                Criterion::Greedy,
            ]
        );
        assert_eq!(order.len(), 5);
        assert!(order.needs_load_balance());
    }

    #[test]
    fn test_from_positions_rejects_bad_positions() {
        let out_of_range = [(Some(9), Criterion::MaxSize)];
        assert_eq!(
            CriterionOrder::from_positions(&out_of_range),
            Err(OptionsError::PositionOutOfRange { position: 9, max: 8 })
        );

        let zero = [(Some(0), Criterion::MaxSize)];
        assert!(CriterionOrder::from_positions(&zero).is_err());

        let repeated = [(Some(1), Criterion::MaxSize), (Some(1), Criterion::Greedy)];
        assert_eq!(
            CriterionOrder::from_positions(&repeated),
            Err(OptionsError::RepeatedPosition(1))
        );
    }

    #[test]
    fn test_new_rejects_repeated_criterion() {
        assert!(CriterionOrder::new([Criterion::Greedy, Criterion::Greedy]).is_err());
        assert!(CriterionOrder::new([Criterion::Greedy, Criterion::MinCost]).is_ok());
    }

    #[test]
    fn test_stability_requires_two_sided_lists() {
        let options = SolveOptions::new(InstanceOptions::new(AgentClasses::Three)).with_stability(true);
        assert_eq!(
            options.validate(),
            Err(OptionsError::StabilityWithoutTwoSidedLists)
        );

        let options = SolveOptions::new(InstanceOptions::new(AgentClasses::Three).with_two_sided(true))
            .with_stability(true);
        assert!(options.validate().is_ok());
    }
}
