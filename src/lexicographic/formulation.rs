//! Integer-programming formulation of a matching instance.
//!
//! One binary variable per candidate pair says whether the agent takes that
//! resource. Stability adds two binaries per pair, closures one binary per
//! resource, load balancing three bounded integers per supervisor.

use crate::metrics::Assignment;
use crate::mip::{Direction, IntVar, LinearExpr, MipModel, MipSolution, Objective, Sense, VarId};
use crate::model::Instance;
use crate::options::{Criterion, SolveOptions};

/// Per-supervisor load variables.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoadVars {
    pub overload: VarId,
    pub underload: VarId,
    pub abs_diff: VarId,
}

/// One objective of the lexicographic sequence.
#[derive(Debug, Clone)]
pub(crate) struct PlannedPass {
    pub criterion: Criterion,
    /// Rank targeted by a generous or greedy sub-pass.
    pub rank: Option<usize>,
    pub objective: Objective,
}

/// The linear model together with the variable handles of every entity.
///
/// Owned by one solve; the model only grows.
#[derive(Debug)]
pub(crate) struct Formulation {
    model: MipModel,
    assigned: Vec<VarId>,
    load: Vec<LoadVars>,
    notes: Vec<String>,
}

impl Formulation {
    /// Builds every constraint the options ask for.
    pub fn build(instance: &Instance, options: &SolveOptions) -> Self {
        let mut model = MipModel::new("matching");
        let assigned: Vec<VarId> = instance
            .pairs()
            .iter()
            .map(|p| model.add_binary(format!("x_{}_{}", p.agent_id(), p.resource_id())))
            .collect();

        let mut formulation = Self {
            model,
            assigned,
            load: Vec::new(),
            notes: Vec::new(),
        };

        formulation.add_validity(instance, options.instance.closures);
        if options.extra.stability {
            formulation.add_stability(instance);
        }
        if options.criteria.needs_load_balance() {
            formulation.add_load_balance(instance);
        }
        formulation
    }

    pub fn model(&self) -> &MipModel {
        &self.model
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: String) {
        self.notes.push(note);
    }

    fn sum_of(&self, pairs: &[usize]) -> LinearExpr {
        LinearExpr::sum(pairs.iter().map(|&p| self.assigned[p]))
    }

    // ========================================================================
    // Constraints
    // ========================================================================

    fn add_validity(&mut self, instance: &Instance, closures: bool) {
        self.notes.push("valid matching constraints added".into());

        for agent in 0..instance.num_agents() {
            let row = self.sum_of(instance.agent_pairs(agent));
            self.model.add_constraint(row, Sense::Le, 1.0);
        }

        if closures {
            self.notes.push("resource closures allowed".into());
        }
        for (j, resource) in instance.resources().iter().enumerate() {
            let load = self.sum_of(instance.resource_pairs(j));
            let lower = resource.lower as f64;
            let upper = resource.upper as f64;
            if closures {
                // closed = 1 forces the load to zero.
                let closed = self.model.add_binary(format!("closed_{}", resource.id));
                self.model
                    .add_constraint(load.clone().with_term(closed, lower), Sense::Ge, lower);
                self.model
                    .add_constraint(load.with_term(closed, upper), Sense::Le, upper);
            } else {
                self.model.add_constraint(load.clone(), Sense::Ge, lower);
                self.model.add_constraint(load, Sense::Le, upper);
            }
        }

        for (k, supervisor) in instance.supervisors().iter().enumerate() {
            let load = self.sum_of(instance.supervisor_pairs(k));
            self.model
                .add_constraint(load.clone(), Sense::Ge, supervisor.lower as f64);
            self.model
                .add_constraint(load, Sense::Le, supervisor.upper as f64);
        }
    }

    /// For every pair `(a, r, s)`: if `a` would rather move to `r`, then
    /// either `s` is full with agents it ranks at least as well as `a`
    /// (`alpha`), or `r` is (`beta`).
    fn add_stability(&mut self, instance: &Instance) {
        self.notes.push("stability constraints added".into());

        for (p, pair) in instance.pairs().iter().enumerate() {
            let alpha = self.model.add_binary(format!("alpha_{p}"));
            let beta = self.model.add_binary(format!("beta_{p}"));

            let mut wants_to_move = LinearExpr::constant(1.0);
            for &q in instance.agent_pairs(pair.agent) {
                if instance.pairs()[q].agent_rank <= pair.agent_rank {
                    wants_to_move.add_term(self.assigned[q], -1.0);
                }
            }

            let rank = pair.supervisor_rank_or_last();
            let mut supervisor_better = LinearExpr::new();
            let mut resource_better = LinearExpr::new();
            for &q in instance.supervisor_pairs(pair.supervisor) {
                let other = &instance.pairs()[q];
                if other.agent == pair.agent || other.supervisor_rank_or_last() > rank {
                    continue;
                }
                supervisor_better.add_term(self.assigned[q], 1.0);
                if other.resource == pair.resource {
                    resource_better.add_term(self.assigned[q], 1.0);
                }
            }

            let supervisor_upper = instance.supervisors()[pair.supervisor].upper as f64;
            let resource_upper = instance.resources()[pair.resource].upper as f64;
            self.model.add_constraint(
                supervisor_better.with_term(alpha, -supervisor_upper),
                Sense::Ge,
                0.0,
            );
            self.model.add_constraint(
                resource_better.with_term(beta, -resource_upper),
                Sense::Ge,
                0.0,
            );
            self.model.add_constraint(
                wants_to_move.with_term(alpha, -1.0).with_term(beta, -1.0),
                Sense::Le,
                0.0,
            );
        }
    }

    fn add_load_balance(&mut self, instance: &Instance) {
        self.notes.push("load-balancing constraints added".into());

        for (k, supervisor) in instance.supervisors().iter().enumerate() {
            let upper = supervisor.upper as i64;
            let target = supervisor.target as f64;
            let vars = LoadVars {
                overload: self
                    .model
                    .add_var(IntVar::new(format!("overload_{}", supervisor.id), -upper, upper)),
                underload: self
                    .model
                    .add_var(IntVar::new(format!("underload_{}", supervisor.id), -upper, upper)),
                abs_diff: self
                    .model
                    .add_integer(format!("abs_diff_{}", supervisor.id), 0, upper),
            };
            let load = self.sum_of(instance.supervisor_pairs(k));

            // overload = load - target, underload = target - load
            self.model.add_constraint(
                load.clone().with_term(vars.overload, -1.0),
                Sense::Eq,
                target,
            );
            self.model
                .add_constraint(load.with_term(vars.underload, 1.0), Sense::Eq, target);
            self.model.add_constraint(
                LinearExpr::new()
                    .with_term(vars.abs_diff, 1.0)
                    .with_term(vars.overload, -1.0),
                Sense::Ge,
                0.0,
            );
            self.model.add_constraint(
                LinearExpr::new()
                    .with_term(vars.abs_diff, 1.0)
                    .with_term(vars.underload, -1.0),
                Sense::Ge,
                0.0,
            );
            self.load.push(vars);
        }
    }

    /// Pins `objective` to the value it just reached.
    pub fn freeze(&mut self, objective: &Objective, value: f64) {
        let sense = match objective.direction {
            Direction::Maximise => Sense::Ge,
            Direction::Minimise => Sense::Le,
        };
        self.model
            .add_constraint(objective.expr.clone(), sense, value);
    }

    // ========================================================================
    // Objectives
    // ========================================================================

    /// Objectives of one criterion, in the order they must be optimised.
    ///
    /// May add auxiliary variables to the model.
    pub fn plan(&mut self, instance: &Instance, criterion: Criterion) -> Vec<PlannedPass> {
        let single = |objective| {
            vec![PlannedPass {
                criterion,
                rank: None,
                objective,
            }]
        };
        let all_pairs: Vec<usize> = (0..instance.pairs().len()).collect();

        match criterion {
            Criterion::MaxSize => single(Objective::maximise(self.sum_of(&all_pairs))),
            Criterion::MinSize => single(Objective::minimise(self.sum_of(&all_pairs))),
            Criterion::Generous => instance
                .distinct_ranks()
                .rev()
                .map(|r| PlannedPass {
                    criterion,
                    rank: Some(r),
                    objective: Objective::minimise(self.sum_of(instance.rank_pairs(r))),
                })
                .collect(),
            Criterion::Greedy => instance
                .distinct_ranks()
                .map(|r| PlannedPass {
                    criterion,
                    rank: Some(r),
                    objective: Objective::maximise(self.sum_of(instance.rank_pairs(r))),
                })
                .collect(),
            Criterion::MinCost => single(Objective::minimise(self.weighted_by_rank(instance, |r| r))),
            Criterion::MinSquaredCost => {
                single(Objective::minimise(self.weighted_by_rank(instance, |r| r * r)))
            }
            Criterion::LoadMaxBalance => {
                let max_dev = self.model.add_integer(
                    "max_abs_diff",
                    0,
                    instance.max_supervisor_upper() as i64,
                );
                for vars in &self.load {
                    self.model.add_constraint(
                        LinearExpr::new()
                            .with_term(max_dev, 1.0)
                            .with_term(vars.abs_diff, -1.0),
                        Sense::Ge,
                        0.0,
                    );
                }
                single(Objective::minimise(LinearExpr::sum([max_dev])))
            }
            Criterion::LoadSumBalance => single(Objective::minimise(LinearExpr::sum(
                self.load.iter().map(|v| v.abs_diff),
            ))),
        }
    }

    fn weighted_by_rank(&self, instance: &Instance, weight: impl Fn(usize) -> usize) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (p, pair) in instance.pairs().iter().enumerate() {
            expr.add_term(self.assigned[p], weight(pair.agent_rank) as f64);
        }
        expr
    }

    /// Reads the matched pair of every agent from a solution.
    pub fn assignment(&self, instance: &Instance, solution: &MipSolution) -> Assignment {
        let mut assignment = Assignment::unassigned(instance.num_agents());
        for (p, pair) in instance.pairs().iter().enumerate() {
            if solution.is_set(self.assigned[p]) {
                assignment.set(pair.agent, Some(p));
            }
        }
        assignment
    }
}
