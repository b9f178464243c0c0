//! Random instance generation.
//!
//! Agent preference lists are drawn without replacement under a linear
//! popularity skew; supervisor (or resource) lists rank exactly the agents
//! that rank one of their resources, in random order. Quota sums are spread
//! evenly.
//!
//! | Problem | Agent classes | Two-sided lists |
//! |---|---|---|
//! | HA | 2 | never |
//! | SM | 2 | always |
//! | HR | 2 | always |
//! | SPA | 3 | optional |

mod config;
mod runner;
mod shared;

pub use config::{GeneratorConfig, MatchingProblem};
pub use runner::{GeneratedInstance, InstanceGenerator};
pub use shared::{
    create_linear_distribution, create_quotas, create_tie_indicators, invert_lists,
    sample_agent_lists, spread_owners, with_ties,
};
