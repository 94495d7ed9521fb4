//! Loose version parsing and comparison.
//!
//! Remote inventories report versions that are only mostly semver, so parsing
//! never rejects a string. A version is an ordered list of segments split on
//! `.` and on digit/alpha boundaries; numeric segments compare numerically,
//! textual segments lexically, and a numeric segment always orders before a
//! textual one at the same position. Shorter versions are padded with zero
//! segments, so `1.2` < `1.2.1` and `1.2` == `1.2.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Text(String),
}

impl Segment {
    fn cmp_loose(&self, other: &Segment) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

/// A loosely parsed, totally ordered version.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string. Parsing is total: anything splits into
    /// segments, and an empty string yields an empty version (meaning
    /// "absent" to the resolver).
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut current_is_digit = None;

        for ch in text.trim().chars() {
            if ch == '.' || ch == '-' || ch == '_' {
                Self::push_segment(&mut segments, &mut current, &mut current_is_digit);
                continue;
            }
            let is_digit = ch.is_ascii_digit();
            if current_is_digit.is_some_and(|d| d != is_digit) {
                Self::push_segment(&mut segments, &mut current, &mut current_is_digit);
            }
            current.push(ch);
            current_is_digit = Some(is_digit);
        }
        Self::push_segment(&mut segments, &mut current, &mut current_is_digit);

        Version {
            raw: text.trim().to_string(),
            segments,
        }
    }

    fn push_segment(segments: &mut Vec<Segment>, current: &mut String, is_digit: &mut Option<bool>) {
        if current.is_empty() {
            return;
        }
        let segment = if is_digit.unwrap_or(false) {
            // Oversized numeric runs fall back to textual comparison.
            current
                .parse::<u64>()
                .map(Segment::Number)
                .unwrap_or_else(|_| Segment::Text(current.clone()))
        } else {
            Segment::Text(current.to_lowercase())
        };
        segments.push(segment);
        current.clear();
        *is_digit = None;
    }

    /// An empty version means "no version recorded". It never satisfies an
    /// upgrade-required constraint.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when this version satisfies a PEP 440 style compatible-release
    /// constraint (`~= spec`): at least the spec version, staying within the
    /// spec's final released segment.
    fn is_compatible_with(&self, spec: &Version) -> bool {
        if self.cmp(spec) == Ordering::Less {
            return false;
        }
        if spec.segments.len() < 2 {
            return true;
        }
        let prefix = &spec.segments[..spec.segments.len() - 1];
        prefix.iter().enumerate().all(|(i, seg)| {
            let mine = self.segments.get(i).unwrap_or(&Segment::Number(0));
            mine.cmp_loose(seg) == Ordering::Equal
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).unwrap_or(&Segment::Number(0));
            let b = other.segments.get(i).unwrap_or(&Segment::Number(0));
            match a.cmp_loose(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for Version {
    fn from(text: &str) -> Self {
        Version::parse(text)
    }
}

/// Version comparison operator of a requirement constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `~=`, compatible release.
    Compatible,
}

impl CompareOp {
    /// Evaluate `version <op> spec`.
    pub fn matches(self, version: &Version, spec: &Version) -> bool {
        match self {
            CompareOp::Eq => version == spec,
            CompareOp::Ne => version != spec,
            CompareOp::Lt => version < spec,
            CompareOp::Le => version <= spec,
            CompareOp::Gt => version > spec,
            CompareOp::Ge => version >= spec,
            CompareOp::Compatible => version.is_compatible_with(spec),
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            "~=" => Ok(CompareOp::Compatible),
            other => Err(Error::planning(format!(
                "unsupported version operator `{other}`"
            ))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Compatible => "~=",
        };
        write!(f, "{text}")
    }
}

/// Check a version against a conjunction of constraints. An empty installed
/// version never satisfies anything.
pub fn satisfies(version: &Version, constraints: &[(CompareOp, Version)]) -> bool {
    if version.is_empty() {
        return false;
    }
    constraints
        .iter()
        .all(|(op, spec)| op.matches(version, spec))
}
