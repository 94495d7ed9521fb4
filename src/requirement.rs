//! Package names and requirement specs.
//!
//! A package name is the join key between local requirement specs and the
//! remote inventory: comparison is case-insensitive and treats `-` and `_`
//! as the same character.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::Error;
use crate::version::{CompareOp, Version};

/// Normalized package identifier.
#[derive(Debug, Clone)]
pub struct PackageName {
    raw: String,
    normalized: String,
}

impl PackageName {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        PackageName { raw, normalized }
    }

    /// The name as given by the caller or upstream metadata.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-folded, `-`/`_`-folded form used for comparison and as the
    /// remote library name.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Case-fold and fold `-` into `_`.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageName {}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for PackageName {
    fn from(raw: &str) -> Self {
        PackageName::new(raw)
    }
}

/// A package name plus a conjunction of version constraints, as declared by
/// upstream package metadata (`pkg>=2.0,<3.0`).
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementSpec {
    pub name: PackageName,
    pub constraints: Vec<(CompareOp, Version)>,
}

impl RequirementSpec {
    pub fn unconstrained(name: impl Into<PackageName>) -> Self {
        RequirementSpec {
            name: name.into(),
            constraints: Vec::new(),
        }
    }
}

impl FromStr for RequirementSpec {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        // Environment markers are not our concern.
        let line = line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            return Err(Error::planning("empty requirement"));
        }

        let split_at = line
            .find(|c| matches!(c, '<' | '>' | '=' | '!' | '~' | '('))
            .unwrap_or(line.len());
        let (name_part, constraint_part) = line.split_at(split_at);

        // Strip extras: "requests[security]" -> "requests"
        let name = name_part
            .split('[')
            .next()
            .unwrap_or("")
            .trim();
        if name.is_empty() {
            return Err(Error::planning(format!("malformed requirement `{line}`")));
        }

        let constraint_part = constraint_part
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');

        let mut constraints = Vec::new();
        for clause in constraint_part.split(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let op_len = clause
                .find(|c: char| !matches!(c, '<' | '>' | '=' | '!' | '~'))
                .unwrap_or(clause.len());
            let (op, version) = clause.split_at(op_len);
            let op = op.parse::<CompareOp>()?;
            constraints.push((op, Version::parse(version.trim())));
        }

        Ok(RequirementSpec {
            name: PackageName::new(name),
            constraints,
        })
    }
}

impl fmt::Display for RequirementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (i, (op, version)) in self.constraints.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{op}{version}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_is_an_equivalence() {
        assert_eq!(normalize("Foo-Bar"), normalize("foo_bar"));
        assert_eq!(normalize("foo_bar"), normalize("FOO_BAR"));
        assert_eq!(normalize("Foo-Bar"), "foo_bar");
    }

    #[test]
    fn test_package_name_equality() {
        assert_eq!(PackageName::new("Foo-Bar"), PackageName::new("foo_bar"));
        assert_ne!(PackageName::new("foo"), PackageName::new("foobar"));
    }

    #[test]
    fn test_package_name_keeps_raw_for_display() {
        let name = PackageName::new("Foo-Bar");
        assert_eq!(name.to_string(), "Foo-Bar");
        assert_eq!(name.normalized(), "foo_bar");
    }

    #[test]
    fn test_parse_bare_name() {
        let req: RequirementSpec = "six".parse().unwrap();
        assert_eq!(req.name.as_str(), "six");
        assert!(req.constraints.is_empty());
    }

    #[test]
    fn test_parse_pinned() {
        let req: RequirementSpec = "astor==0.8.1".parse().unwrap();
        assert_eq!(req.name.as_str(), "astor");
        assert_eq!(
            req.constraints,
            vec![(CompareOp::Eq, Version::parse("0.8.1"))]
        );
    }

    #[test]
    fn test_parse_conjunction() {
        let req: RequirementSpec = "pkgB>=2.0,<3.0".parse().unwrap();
        assert_eq!(req.constraints.len(), 2);
        assert_eq!(req.constraints[0].0, CompareOp::Ge);
        assert_eq!(req.constraints[1].0, CompareOp::Lt);
    }

    #[test]
    fn test_parse_strips_extras_and_markers() {
        let req: RequirementSpec = "requests[security]>=2.0; python_version > \"3\""
            .parse()
            .unwrap();
        assert_eq!(req.name.as_str(), "requests");
        assert_eq!(req.constraints, vec![(CompareOp::Ge, Version::parse("2.0"))]);
    }

    #[test]
    fn test_parse_parenthesized_constraints() {
        let req: RequirementSpec = "six (>=1.5)".parse().unwrap();
        assert_eq!(req.name.as_str(), "six");
        assert_eq!(req.constraints, vec![(CompareOp::Ge, Version::parse("1.5"))]);
    }

    #[test]
    fn test_parse_unsupported_operator_is_fatal() {
        let err = "pkg=>1.0".parse::<RequirementSpec>().unwrap_err();
        assert!(err.to_string().contains("unsupported version operator"));
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!("".parse::<RequirementSpec>().is_err());
        assert!("  ; marker".parse::<RequirementSpec>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let req: RequirementSpec = "pkgB>=2.0,<3.0".parse().unwrap();
        assert_eq!(req.to_string(), "pkgB>=2.0,<3.0");
    }
}
