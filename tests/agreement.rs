//! The exact solver and the exhaustive oracle agree on every criterion.

use u_matching::generator::{GeneratorConfig, InstanceGenerator, MatchingProblem};
use u_matching::io::parse_instance;
use u_matching::lexicographic::LexicographicOutcome;
use u_matching::metrics::MatchingStats;
use u_matching::mip::SolverConfig;
use u_matching::model::{Instance, PairIndex};
use u_matching::options::{AgentClasses, Criterion, CriterionOrder, InstanceOptions, SolveOptions};
use u_matching::oracle::{OracleOptima, OracleSolver};
use u_matching::predicate::{is_stable, is_valid};
use u_matching::{solve, SolveReport};

const TIES: &str = "\
4 3 2
1: 1 (2 3)
2: 3 1
3: 2
4: (1 3)
1: 0: 2: 1
2: 0: 1: 1
3: 1: 2: 2
1: 0: 2: 3:
2: 0: 1: 2:
";

/// Resource 2 can only be opened by closing it.
const CLOSURE: &str = "\
3 2 1
1: 1 2
2: 1
3: 1
1: 0: 2: 1
2: 2: 2: 1
1: 0: 2: 3:
";

fn options(closures: bool) -> InstanceOptions {
    InstanceOptions::new(AgentClasses::Three).with_closures(closures)
}

fn exact(instance: &Instance, closures: bool, criteria: &[Criterion]) -> LexicographicOutcome {
    let options = SolveOptions::new(options(closures))
        .with_criteria(CriterionOrder::new(criteria.iter().copied()).unwrap());
    match solve(instance, &options, &SolverConfig::default()).unwrap() {
        SolveReport::Exact(outcome) => outcome,
        SolveReport::Oracle(_) => panic!("expected an exact report"),
    }
}

type Check = fn(Criterion, &MatchingStats, &OracleOptima) -> bool;

fn single(criterion: Criterion, stats: &MatchingStats, optima: &OracleOptima) -> bool {
    match criterion {
        Criterion::MaxSize => stats.size == optima.size,
        Criterion::MinSize => stats.size == optima.min_size,
        Criterion::Generous => stats.profile == optima.generous_profile,
        Criterion::Greedy => stats.profile == optima.greedy_profile,
        Criterion::MinCost => stats.cost == optima.min_cost,
        Criterion::MinSquaredCost => stats.cost_sq == optima.min_cost_sq,
        Criterion::LoadMaxBalance => stats.max_deviation == optima.min_max_deviation,
        Criterion::LoadSumBalance => stats.sum_deviation == optima.min_sum_deviation,
    }
}

fn after_max_size(criterion: Criterion, stats: &MatchingStats, optima: &OracleOptima) -> bool {
    stats.size == optima.size
        && match criterion {
            Criterion::MinCost => stats.cost == optima.max_size_min_cost,
            Criterion::MinSquaredCost => stats.cost_sq == optima.max_size_min_cost_sq,
            Criterion::Generous => stats.profile == optima.max_size_generous_profile,
            Criterion::Greedy => stats.profile == optima.max_size_greedy_profile,
            _ => true,
        }
}

fn assert_agreement(instance: &Instance, closures: bool) {
    let oracle = OracleSolver::run(instance, closures);

    let mut runs: Vec<(Vec<Criterion>, Check)> = Criterion::ALL
        .iter()
        .map(|&c| (vec![c], single as Check))
        .collect();
    for c in [
        Criterion::MinCost,
        Criterion::MinSquaredCost,
        Criterion::Generous,
        Criterion::Greedy,
    ] {
        runs.push((vec![Criterion::MaxSize, c], after_max_size as Check));
    }

    for (criteria, agrees) in runs {
        let outcome = exact(instance, closures, &criteria);
        let last = criteria[criteria.len() - 1];
        match &oracle.optima {
            None => {
                assert!(!outcome.is_optimal(), "{criteria:?}: exact found a matching");
                assert!(outcome.assignment.is_none());
            }
            Some(optima) => {
                assert!(outcome.is_optimal(), "{criteria:?}: {}", outcome.status);
                let assignment = outcome.assignment.as_ref().unwrap();
                let matched: Vec<_> = assignment.matched().map(Some).collect();
                assert!(is_valid(instance, &matched, closures), "{criteria:?}");
                let stats = outcome.stats.as_ref().unwrap();
                assert!(
                    agrees(last, stats, optima),
                    "{criteria:?}: exact {stats:?}, oracle {optima:?}"
                );
            }
        }
    }
}

#[test]
fn test_agreement_with_ties() {
    let instance = parse_instance(TIES, &options(false)).unwrap();
    assert_agreement(&instance, false);
    assert_agreement(&instance, true);
}

#[test]
fn test_agreement_with_closures() {
    let instance = parse_instance(CLOSURE, &options(true)).unwrap();
    assert!(OracleSolver::run(&instance, false).optima.is_none());
    assert!(OracleSolver::run(&instance, true).optima.is_some());
    assert_agreement(&instance, false);
    assert_agreement(&instance, true);
}

#[test]
fn test_agreement_on_generated_instances() {
    for seed in 1..=6 {
        let config = GeneratorConfig::new(MatchingProblem::Spa, 5)
            .with_resources(3)
            .with_supervisors(2)
            .with_list_lengths(1, 3)
            .with_agent_ties(0.3)
            .with_skew(2.0)
            .with_resource_lower_sum(2)
            .with_resource_upper_sum(6)
            .with_supervisor_lower_sum(1)
            .with_supervisor_target_sum(3)
            .with_supervisor_upper_sum(5)
            .with_seed(seed);
        let instance = InstanceGenerator::generate(&config).unwrap().instance;
        assert_agreement(&instance, false);
        assert_agreement(&instance, true);
    }
}

/// Size of the largest valid stable matching, found by enumeration.
fn largest_stable(instance: &Instance) -> Option<usize> {
    fn visit(
        instance: &Instance,
        agent: usize,
        slots: &mut Vec<Option<PairIndex>>,
        best: &mut Option<usize>,
    ) {
        if agent == instance.num_agents() {
            let matched: Vec<_> = slots.iter().flatten().map(|&p| Some(p)).collect();
            if is_valid(instance, &matched, false) && is_stable(instance, slots) {
                *best = Some(best.map_or(matched.len(), |b| b.max(matched.len())));
            }
            return;
        }
        let choices: Vec<Option<PairIndex>> = std::iter::once(None)
            .chain(instance.agent_pairs(agent).iter().map(|&p| Some(p)))
            .collect();
        for choice in choices {
            slots[agent] = choice;
            visit(instance, agent + 1, slots, best);
        }
        slots[agent] = None;
    }

    let mut best = None;
    visit(instance, 0, &mut vec![None; instance.num_agents()], &mut best);
    best
}

#[test]
fn test_max_size_stable_matching_on_generated_instances() {
    for seed in 1..=30 {
        let config = GeneratorConfig::new(MatchingProblem::Spa, 5)
            .with_resources(3)
            .with_supervisors(2)
            .with_list_lengths(1, 3)
            .with_two_sided(true)
            .with_agent_ties(0.3)
            .with_supervisor_ties(0.3)
            .with_resource_upper_sum(4)
            .with_supervisor_lower_sum(1)
            .with_supervisor_target_sum(2)
            .with_supervisor_upper_sum(4)
            .with_seed(seed);
        let instance = InstanceGenerator::generate(&config).unwrap().instance;

        let options = SolveOptions::new(options(false).with_two_sided(true))
            .with_stability(true)
            .with_criteria(CriterionOrder::new([Criterion::MaxSize]).unwrap());
        let outcome = match solve(&instance, &options, &SolverConfig::default()).unwrap() {
            SolveReport::Exact(outcome) => outcome,
            SolveReport::Oracle(_) => panic!("expected an exact report"),
        };

        match largest_stable(&instance) {
            None => assert!(!outcome.is_optimal(), "seed {seed}: exact found a matching"),
            Some(size) => {
                assert!(outcome.is_optimal(), "seed {seed}: {}", outcome.status);
                assert_eq!(outcome.stats.as_ref().unwrap().size, size, "seed {seed}");
                assert_eq!(outcome.stability_audit, Some(true), "seed {seed}");
                let slots = outcome.assignment.as_ref().unwrap().slots();
                assert!(is_stable(&instance, slots), "seed {seed}");
            }
        }
    }
}
