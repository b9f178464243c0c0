//! Exact lexicographic optimisation for capacitated many-to-one matching.
//!
//! Agents rank resources; resources belong to supervisors; both carry
//! lower and upper quotas, and supervisors a target load. The crate covers
//! the Student-Project Allocation family and its two-class special cases
//! (house allocation, stable marriage, hospitals/residents), with ties.
//!
//! - **Predicates**: validity of a matching against every quota, and
//!   stability against blocking pairs.
//! - **Lexicographic solver**: one integer program solved once per
//!   criterion (size, generous, greedy, rank costs, load balance), each
//!   optimum frozen before the next pass. Backed by HiGHS through
//!   `good_lp`.
//! - **Oracle**: exhaustive enumeration reporting every optimum, as ground
//!   truth on small instances.
//! - **Metrics**: size, cost, squared cost, degree, profile and supervisor
//!   load deviations of a matching.
//! - **IO**: textual instance format and results reports.
//! - **Generator**: random instances of every family.
//!
//! # Architecture
//!
//! [`model`] holds the immutable instance with its candidate-pair arena.
//! [`mip`] is a backend-agnostic linear model behind the
//! [`MipSolver`](mip::MipSolver) trait; [`lexicographic`] encodes matchings
//! into it. [`solver::solve`] validates options and dispatches between the
//! exact solver and the oracle. The library logs through `tracing` and never
//! installs a subscriber.

pub mod error;
pub mod generator;
pub mod io;
pub mod lexicographic;
pub mod metrics;
pub mod mip;
pub mod model;
pub mod options;
pub mod oracle;
pub mod predicate;
pub mod solver;

pub use error::MatchingError;
pub use solver::{solve, SolveReport};
