//! MIP variable types.

use std::fmt;

/// Handle of a variable inside one [`MipModel`](super::MipModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in its model.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An integer variable with a domain `[lower, upper]`.
///
/// Binary variables are integer variables over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVar {
    /// Variable name (diagnostics only).
    pub name: String,
    /// Minimum value.
    pub lower: i64,
    /// Maximum value.
    pub upper: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    /// Creates a binary variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name, 0, 1)
    }

    pub fn is_binary(&self) -> bool {
        self.lower == 0 && self.upper == 1
    }

    /// Domain size (upper - lower + 1), 0 for an empty domain.
    pub fn domain_size(&self) -> u64 {
        if self.upper < self.lower {
            0
        } else {
            self.upper.abs_diff(self.lower) + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_var_domain() {
        let v = IntVar::new("dev", 0, 4);
        assert_eq!(v.domain_size(), 5);
        assert!(!v.is_binary());
        assert!(IntVar::binary("x").is_binary());
        assert_eq!(IntVar::new("empty", 3, 2).domain_size(), 0);
    }

    #[test]
    fn test_var_id_display() {
        assert_eq!(VarId(7).to_string(), "v7");
        assert_eq!(VarId(7).index(), 7);
    }
}
