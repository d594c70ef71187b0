//! SQL three-valued logic

use std::fmt;

/// Truth value of a predicate under SQL semantics.
///
/// Comparisons involving NULL, or values that cannot be ordered against each
/// other, produce `Unknown` rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ternary {
    True,
    False,
    #[default]
    Unknown,
}

impl Ternary {
    pub fn and(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::False, _) | (_, Ternary::False) => Ternary::False,
            (Ternary::True, Ternary::True) => Ternary::True,
            _ => Ternary::Unknown,
        }
    }

    pub fn or(self, other: Ternary) -> Ternary {
        match (self, other) {
            (Ternary::True, _) | (_, Ternary::True) => Ternary::True,
            (Ternary::False, Ternary::False) => Ternary::False,
            _ => Ternary::Unknown,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Ternary {
        match self {
            Ternary::True => Ternary::False,
            Ternary::False => Ternary::True,
            Ternary::Unknown => Ternary::Unknown,
        }
    }

    /// Only `True` passes a filter; `Unknown` is treated like `False`.
    pub fn is_true(self) -> bool {
        self == Ternary::True
    }

    /// `Some(bool)` for a known value, `None` for `Unknown`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Ternary::True => Some(true),
            Ternary::False => Some(false),
            Ternary::Unknown => None,
        }
    }
}

impl From<bool> for Ternary {
    fn from(b: bool) -> Self {
        if b {
            Ternary::True
        } else {
            Ternary::False
        }
    }
}

impl fmt::Display for Ternary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ternary::True => write!(f, "TRUE"),
            Ternary::False => write!(f, "FALSE"),
            Ternary::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_truth_table() {
        assert_eq!(Ternary::True.and(Ternary::True), Ternary::True);
        assert_eq!(Ternary::True.and(Ternary::Unknown), Ternary::Unknown);
        assert_eq!(Ternary::Unknown.and(Ternary::False), Ternary::False);
        assert_eq!(Ternary::False.and(Ternary::True), Ternary::False);
    }

    #[test]
    fn test_or_truth_table() {
        assert_eq!(Ternary::False.or(Ternary::False), Ternary::False);
        assert_eq!(Ternary::False.or(Ternary::Unknown), Ternary::Unknown);
        assert_eq!(Ternary::Unknown.or(Ternary::True), Ternary::True);
    }

    #[test]
    fn test_not_unknown_stays_unknown() {
        assert_eq!(Ternary::Unknown.not(), Ternary::Unknown);
        assert_eq!(Ternary::True.not(), Ternary::False);
    }
}
