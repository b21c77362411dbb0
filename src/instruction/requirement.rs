//! Requirements and metrics.
//!
//! A `Requirement` is a boolean predicate over component counts; a `Metric`
//! is a non-negative quantity derived from counts. Both are evaluated by a
//! [`Reader`](crate::store::Reader) against the current store.

use serde::{Deserialize, Serialize};

use crate::types::TypeExpr;

/// A boolean predicate over component counts.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    /// At least `count` components of `of`.
    Min { of: TypeExpr, count: u32 },
    /// At most `count` components of `of`.
    Max { of: TypeExpr, count: u32 },
    /// Exactly `count` components of `of`.
    Exact { of: TypeExpr, count: u32 },
    /// All of the requirements hold.
    And(Vec<Requirement>),
    /// At least one of the requirements holds.
    Or(Vec<Requirement>),
    /// The requirement does not hold.
    Not(Box<Requirement>),
}

impl Requirement {
    /// At least `count` of `of`.
    #[must_use]
    pub fn min(count: u32, of: TypeExpr) -> Self {
        Requirement::Min { of, count }
    }

    /// At most `count` of `of`.
    #[must_use]
    pub fn max(count: u32, of: TypeExpr) -> Self {
        Requirement::Max { of, count }
    }

    /// Exactly `count` of `of`.
    #[must_use]
    pub fn exact(count: u32, of: TypeExpr) -> Self {
        Requirement::Exact { of, count }
    }

    /// Apply `f` to every type mentioned.
    #[must_use]
    pub fn map_types(&self, f: &impl Fn(&TypeExpr) -> TypeExpr) -> Self {
        match self {
            Requirement::Min { of, count } => Requirement::Min { of: f(of), count: *count },
            Requirement::Max { of, count } => Requirement::Max { of: f(of), count: *count },
            Requirement::Exact { of, count } => Requirement::Exact { of: f(of), count: *count },
            Requirement::And(parts) => Requirement::And(parts.iter().map(|r| r.map_types(f)).collect()),
            Requirement::Or(parts) => Requirement::Or(parts.iter().map(|r| r.map_types(f)).collect()),
            Requirement::Not(inner) => Requirement::Not(Box::new(inner.map_types(f))),
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, parts: &[Requirement], sep: &str) -> std::fmt::Result {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                match part {
                    Requirement::And(_) | Requirement::Or(_) => write!(f, "({part})")?,
                    _ => write!(f, "{part}")?,
                }
            }
            Ok(())
        }

        match self {
            Requirement::Min { of, count } => write!(f, "{count} {of}"),
            Requirement::Max { of, count } => write!(f, "MAX {count} {of}"),
            Requirement::Exact { of, count } => write!(f, "={count} {of}"),
            Requirement::And(parts) => join(f, parts, " AND "),
            Requirement::Or(parts) => join(f, parts, " OR "),
            Requirement::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

/// A quantity derived from component counts, used by `Per` instructions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// `count(of) / per`, rounded down.
    Count { of: TypeExpr, per: u32 },
    /// The inner metric, clamped to at most `max`.
    Max { inner: Box<Metric>, max: u32 },
    /// Sum of the parts.
    Plus(Vec<Metric>),
}

impl Metric {
    /// One per component of `of`.
    #[must_use]
    pub fn count(of: TypeExpr) -> Self {
        Metric::Count { of, per: 1 }
    }

    /// One per `per` components of `of`.
    #[must_use]
    pub fn per(per: u32, of: TypeExpr) -> Self {
        assert!(per > 0, "Metric divisor must be positive");
        Metric::Count { of, per }
    }

    /// Clamp this metric (builder pattern).
    #[must_use]
    pub fn clamped(self, max: u32) -> Self {
        Metric::Max {
            inner: Box::new(self),
            max,
        }
    }

    /// Apply `f` to every type mentioned.
    #[must_use]
    pub fn map_types(&self, f: &impl Fn(&TypeExpr) -> TypeExpr) -> Self {
        match self {
            Metric::Count { of, per } => Metric::Count { of: f(of), per: *per },
            Metric::Max { inner, max } => Metric::Max {
                inner: Box::new(inner.map_types(f)),
                max: *max,
            },
            Metric::Plus(parts) => Metric::Plus(parts.iter().map(|m| m.map_types(f)).collect()),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Count { of, per: 1 } => write!(f, "{of}"),
            Metric::Count { of, per } => write!(f, "{per} {of}"),
            Metric::Max { inner, max } => write!(f, "{inner} MAX {max}"),
            Metric::Plus(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}
