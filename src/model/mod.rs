//! Instance data model.
//!
//! # Key Components
//!
//! - **Preferences**: [`PreferenceList`]: ordered tie groups with
//!   competition ranking
//! - **Entities**: [`Agent`], [`Resource`], [`Supervisor`]
//! - **Pairs**: [`CandidatePair`]: one per appearance of a resource on an
//!   agent's list, stored once in an arena and addressed by [`PairIndex`]
//! - **Instance**: [`Instance`], built and validated by [`InstanceBuilder`]
//!
//! Identities are 1-based; every index stored in the model is 0-based.

mod instance;
mod preference;

pub use instance::{
    Agent, CandidatePair, Instance, InstanceBuilder, PairIndex, Resource, Supervisor,
};
pub use preference::PreferenceList;
