//! Error types.
//!
//! Only malformed input is an error. Infeasible instances, backend
//! timeouts and other non-optimal backend outcomes are ordinary results
//! reported through [`SolveStatus`](crate::mip::SolveStatus).

use thiserror::Error;

/// Malformed instance data, rejected before any solve attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("resource {resource}: lower quota {lower} exceeds upper quota {upper}")]
    ResourceQuota {
        resource: usize,
        lower: usize,
        upper: usize,
    },

    #[error(
        "supervisor {supervisor}: quotas must satisfy lower <= target <= upper \
         (found {lower} <= {target} <= {upper})"
    )]
    SupervisorQuota {
        supervisor: usize,
        lower: usize,
        target: usize,
        upper: usize,
    },

    #[error("resource {resource} refers to unknown supervisor {supervisor}")]
    UnknownSupervisor { resource: usize, supervisor: usize },

    #[error("agent {agent} ranks unknown resource {resource}")]
    UnknownResource { agent: usize, resource: usize },

    #[error("agent {agent} ranks resource {resource} more than once")]
    DuplicateResource { agent: usize, resource: usize },

    #[error("agent {agent} ranks {len} resources but only {available} exist")]
    ListTooLong {
        agent: usize,
        len: usize,
        available: usize,
    },

    #[error("preference list of {owner} ranks unknown agent {agent}")]
    UnknownAgent { owner: String, agent: usize },

    #[error("preference list of {owner} ranks agent {agent} more than once")]
    DuplicateAgent { owner: String, agent: usize },

    #[error("agent {agent} ranks resource {resource} but is not ranked back by {owner}")]
    UnrankedAgent {
        agent: usize,
        resource: usize,
        owner: String,
    },
}

/// Inconsistent option sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("stability constraints require two-sided preference lists")]
    StabilityWithoutTwoSidedLists,

    #[error("criterion position {position} is outside 1..={max}")]
    PositionOutOfRange { position: usize, max: usize },

    #[error("criterion position {0} is used more than once")]
    RepeatedPosition(usize),

    #[error("criterion {0} is selected more than once")]
    RepeatedCriterion(String),

    #[error(
        "options ask for two-sided lists = {options} but the instance was built with {instance}"
    )]
    TwoSidedMismatch { options: bool, instance: bool },

    #[error("invalid solver configuration: {0}")]
    Config(String),
}

/// Failure to read the textual instance format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("instance text is empty")]
    Empty,

    #[error("line {line}: {message}")]
    Line { line: usize, message: String },

    #[error("expected {expected} lines describing {what}, found {found}")]
    MissingLines {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Generator parameters out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("{0}")]
    Bounds(String),

    #[error("parameter {parameter} is required for {problem}")]
    Missing {
        parameter: &'static str,
        problem: &'static str,
    },

    #[error("parameter {parameter} is not allowed for {problem}")]
    Banned {
        parameter: &'static str,
        problem: &'static str,
    },

    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchingError {
    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_entity() {
        let err = InstanceError::ResourceQuota {
            resource: 3,
            lower: 4,
            upper: 2,
        };
        assert_eq!(
            err.to_string(),
            "resource 3: lower quota 4 exceeds upper quota 2"
        );

        let err = OptionsError::RepeatedPosition(2);
        assert!(err.to_string().contains("position 2"));
    }

    #[test]
    fn test_conversion_into_crate_error() {
        let err: MatchingError = OptionsError::StabilityWithoutTwoSidedLists.into();
        assert!(matches!(err, MatchingError::Options(_)));

        let parse: ParseError = InstanceError::UnknownSupervisor {
            resource: 1,
            supervisor: 0,
        }
        .into();
        let err: MatchingError = parse.into();
        assert!(matches!(err, MatchingError::Parse(ParseError::Instance(_))));
    }
}
