//! Exact lexicographic solver.
//!
//! Builds one integer program encoding validity (and, on request,
//! stability and supervisor load balance), then optimises the selected
//! criteria in priority order. After each pass the optimum is frozen as a
//! constraint; the first pass that does not reach optimality ends the run
//! with its status.
//!
//! | Criterion | Objective | Direction |
//! |---|---|---|
//! | `MaxSize` / `MinSize` | number of matches | max / min |
//! | `Generous` | matches at rank r, worst rank first | min per rank |
//! | `Greedy` | matches at rank r, rank 1 first | max per rank |
//! | `MinCost` | sum of ranks | min |
//! | `MinSquaredCost` | sum of squared ranks | min |
//! | `LoadMaxBalance` | largest supervisor deviation | min |
//! | `LoadSumBalance` | total supervisor deviation | min |

mod formulation;
mod runner;
mod types;

pub use runner::LexicographicSolver;
pub use types::{LexicographicOutcome, PassRecord};
