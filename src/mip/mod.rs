//! Mixed-integer programming (MIP) layer.
//!
//! A backend-agnostic linear model over bounded integer variables, plus the
//! solver interface the lexicographic matching solver drives.
//!
//! # Key Components
//!
//! - **Variables**: [`IntVar`] addressed by [`VarId`]
//! - **Expressions**: [`LinearExpr`], constraints with [`Sense`]
//! - **Model**: [`MipModel`]: grows between solves, never shrinks
//! - **Solver**: [`MipSolver`] trait, implemented by [`HighsSolver`]
//!   (HiGHS via `good_lp`) and [`SimpleMipSolver`] (exhaustive, for tiny
//!   models)

mod highs;
mod model;
mod solver;
mod variables;

pub use highs::HighsSolver;
pub use model::{Direction, LinearConstraint, LinearExpr, MipModel, Objective, Sense};
pub use solver::{MipSolution, MipSolver, SimpleMipSolver, SolveStatus, SolverConfig};
pub use variables::{IntVar, VarId};
