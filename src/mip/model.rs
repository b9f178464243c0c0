//! MIP model definition.

use super::variables::{IntVar, VarId};
use std::fmt;

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    /// (variable, coefficient) pairs. A variable may appear more than once.
    pub terms: Vec<(VarId, f64)>,
    /// Constant offset.
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Adds `coefficient * var`.
    pub fn add_term(&mut self, var: VarId, coefficient: f64) -> &mut Self {
        self.terms.push((var, coefficient));
        self
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.terms.push((var, coefficient));
        self
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression with `value(var)` for each variable.
    pub fn eval(&self, mut value: impl FnMut(VarId) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, &(v, c)| acc + c * value(v))
    }
}

/// Relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

impl Sense {
    /// Whether `lhs` stands in this relation to `rhs`, up to `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tolerance,
            Sense::Ge => lhs + tolerance >= rhs,
            Sense::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        })
    }
}

/// A linear constraint `expr (sense) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Maximise,
    Minimise,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Maximise => "maximise",
            Direction::Minimise => "minimise",
        })
    }
}

/// Objective function of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub direction: Direction,
    pub expr: LinearExpr,
}

impl Objective {
    pub fn maximise(expr: LinearExpr) -> Self {
        Self {
            direction: Direction::Maximise,
            expr,
        }
    }

    pub fn minimise(expr: LinearExpr) -> Self {
        Self {
            direction: Direction::Minimise,
            expr,
        }
    }

    /// A zero objective; the solve only looks for a feasible point.
    pub fn feasibility() -> Self {
        Self::minimise(LinearExpr::new())
    }

    /// Whether `a` is strictly better than `b` in this direction.
    pub fn improves(&self, a: f64, b: f64) -> bool {
        match self.direction {
            Direction::Maximise => a > b,
            Direction::Minimise => a < b,
        }
    }
}

/// A mixed-integer linear model that grows over the lifetime of one solve.
///
/// # Examples
///
/// ```
/// use u_matching::mip::{LinearExpr, MipModel, Sense};
///
/// let mut model = MipModel::new("example");
/// let x = model.add_binary("x");
/// let y = model.add_binary("y");
/// model.add_constraint(LinearExpr::sum([x, y]), Sense::Le, 1.0);
/// assert_eq!(model.num_vars(), 2);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MipModel {
    /// Model name.
    pub name: String,
    vars: Vec<IntVar>,
    constraints: Vec<LinearConstraint>,
}

impl MipModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Adds an integer variable.
    pub fn add_var(&mut self, var: IntVar) -> VarId {
        self.vars.push(var);
        VarId(self.vars.len() - 1)
    }

    /// Adds a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(IntVar::binary(name))
    }

    /// Adds an integer variable over `[lower, upper]`.
    pub fn add_integer(&mut self, name: impl Into<String>, lower: i64, upper: i64) -> VarId {
        self.add_var(IntVar::new(name, lower, upper))
    }

    /// Adds `expr (sense) rhs`.
    pub fn add_constraint(&mut self, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(LinearConstraint { expr, sense, rhs });
    }

    pub fn vars(&self) -> &[IntVar] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> Option<&IntVar> {
        self.vars.get(id.0)
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Validates the model for consistency.
    ///
    /// Checks variable domains and that every referenced variable exists.
    pub fn validate(&self) -> Result<(), String> {
        for var in &self.vars {
            if var.lower > var.upper {
                return Err(format!(
                    "variable {} has empty domain [{}, {}]",
                    var.name, var.lower, var.upper
                ));
            }
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if let Some(&(v, _)) = c.expr.terms.iter().find(|(v, _)| v.0 >= self.vars.len()) {
                return Err(format!("constraint {i} references undefined variable {v}"));
            }
            if !c.rhs.is_finite() {
                return Err(format!("constraint {i} has non-finite right-hand side"));
            }
        }
        Ok(())
    }

    /// Validates an objective against this model.
    pub fn validate_objective(&self, objective: &Objective) -> Result<(), String> {
        match objective
            .expr
            .terms
            .iter()
            .find(|(v, _)| v.0 >= self.vars.len())
        {
            Some(&(v, _)) => Err(format!("objective references undefined variable {v}")),
            None => Ok(()),
        }
    }

    /// The first constraint without variable terms that cannot hold.
    pub fn trivially_violated(&self) -> Option<usize> {
        self.constraints.iter().position(|c| {
            c.expr.is_constant() && !c.sense.holds(c.expr.constant, c.rhs, 1e-9)
        })
    }
}
