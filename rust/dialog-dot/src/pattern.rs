//! Hierarchical resource patterns and their intersection.
//!
//! A pattern is a `/`-separated list of segments. Besides literal segments
//! there are two wildcards:
//!
//! - `+` matches exactly one segment
//! - `*` matches zero or more segments, and may appear at most once
//!
//! ```text
//! a/+/c   matches a/b/c, a/x/c
//! a/*     matches a, a/b, a/b/c, ...
//! a/*/c   matches a/c, a/b/c, a/b/b/c, ...
//! ```

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::{Serialize, Serializer};

use crate::PatternError;

/// One segment of a [`ResourcePattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A concrete segment.
    Literal(String),
    /// `+`: exactly one segment.
    One,
    /// `*`: zero or more segments.
    Many,
}

impl Segment {
    /// Whether this is the multi-level wildcard.
    pub fn is_many(&self) -> bool {
        matches!(self, Segment::Many)
    }

    /// Whether this segment matches the concrete segment `value`.
    fn accepts(&self, value: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == value,
            Segment::One => true,
            Segment::Many => true,
        }
    }
}

impl From<&str> for Segment {
    fn from(value: &str) -> Self {
        match value {
            "+" => Segment::One,
            "*" => Segment::Many,
            literal => Segment::Literal(literal.to_owned()),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Literal(literal) => write!(f, "{literal}"),
            Segment::One => write!(f, "+"),
            Segment::Many => write!(f, "*"),
        }
    }
}

/// A resource pattern below a namespace, e.g. `a/b/*`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourcePattern(Vec<Segment>);

impl ResourcePattern {
    /// Build a pattern from segments, rejecting more than one `*`.
    pub fn new(segments: Vec<Segment>) -> Result<Self, PatternError> {
        if segments.is_empty() {
            return Err(PatternError::Empty);
        }
        if segments.iter().filter(|segment| segment.is_many()).count() > 1 {
            return Err(PatternError::MultipleWildcards);
        }
        Ok(Self(segments))
    }

    /// The segments of this pattern.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// A pattern is concrete when it names exactly one resource.
    pub fn is_concrete(&self) -> bool {
        self.0
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Whether the concrete resource `path` falls within this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').collect();

        match self.0.iter().position(Segment::is_many) {
            None => {
                parts.len() == self.0.len()
                    && self
                        .0
                        .iter()
                        .zip(&parts)
                        .all(|(segment, part)| segment.accepts(part))
            }
            Some(star) => {
                let (head, tail) = (&self.0[..star], &self.0[star + 1..]);
                parts.len() >= head.len() + tail.len()
                    && head
                        .iter()
                        .zip(&parts)
                        .all(|(segment, part)| segment.accepts(part))
                    && tail
                        .iter()
                        .rev()
                        .zip(parts.iter().rev())
                        .all(|(segment, part)| segment.accepts(part))
            }
        }
    }

    /// Intersect this pattern with `other`. See [`narrow`].
    pub fn narrow(&self, other: &ResourcePattern) -> Option<ResourcePattern> {
        narrow(self, other)
    }
}

/// Compute the most specific pattern that both `a` and `b` permit.
///
/// Returns `None` when the two patterns share no resource (or when the
/// shared resources cannot be expressed with a single `*`). The result never
/// matches anything that `a` or `b` would reject.
///
/// The result is exact except where a trailing `*` on one side meets a
/// leading `*` on the other. There the intersection of `head/*` and
/// `*/tail` is `head/*/tail` plus every resource on which `head` and `tail`
/// overlap, which no single-`*` pattern can express, so only `head/*/tail`
/// is kept. `narrow("a/*", "*/a")` is `a/*/a` and no longer matches `a`.
/// In that case the order in which several patterns are narrowed can decide
/// whether they overlap at all; for patterns whose `*` (if any) is always
/// last, or always first, it cannot.
///
/// ```
/// use dialog_dot::{ResourcePattern, narrow};
///
/// let a: ResourcePattern = "a/b/*".parse().unwrap();
/// let b: ResourcePattern = "a/+/c".parse().unwrap();
/// assert_eq!(narrow(&a, &b).unwrap().to_string(), "a/b/c");
///
/// let c: ResourcePattern = "p/*".parse().unwrap();
/// let d: ResourcePattern = "q/r".parse().unwrap();
/// assert!(narrow(&c, &d).is_none());
/// ```
pub fn narrow(a: &ResourcePattern, b: &ResourcePattern) -> Option<ResourcePattern> {
    let (a, b) = (a.segments(), b.segments());

    // Segments in front of any `*` sit at fixed offsets from the start.
    let mut front = Vec::new();
    while front.len() < a.len() && front.len() < b.len() {
        let index = front.len();
        if a[index].is_many() || b[index].is_many() {
            break;
        }
        front.push(meet(&a[index], &b[index])?);
    }

    // Likewise for segments behind any `*`, from the end.
    let mut back = Vec::new();
    let (mut a_end, mut b_end) = (a.len(), b.len());
    while a_end > front.len() && b_end > front.len() {
        let (x, y) = (&a[a_end - 1], &b[b_end - 1]);
        if x.is_many() || y.is_many() {
            break;
        }
        back.push(meet(x, y)?);
        a_end -= 1;
        b_end -= 1;
    }
    back.reverse();

    let middle = reconcile(&a[front.len()..a_end], &b[front.len()..b_end])?;

    let segments: Vec<Segment> = front.into_iter().chain(middle).chain(back).collect();
    if segments.is_empty() {
        return None;
    }
    ResourcePattern::new(segments).ok()
}

/// Intersect two single-segment wildcards or literals.
fn meet(a: &Segment, b: &Segment) -> Option<Segment> {
    match (a, b) {
        (Segment::Many, _) | (_, Segment::Many) => None,
        (Segment::One, other) | (other, Segment::One) => Some(other.clone()),
        (Segment::Literal(x), Segment::Literal(y)) if x == y => Some(a.clone()),
        _ => None,
    }
}

/// Intersect what is left between the matched front and back. Each side
/// holds at most one `*`, and any `*` sits at the edge of its middle.
fn reconcile(a: &[Segment], b: &[Segment]) -> Option<Vec<Segment>> {
    match (a, b) {
        ([], []) => Some(Vec::new()),
        ([Segment::Many], other) | (other, [Segment::Many]) => Some(other.to_vec()),
        ([], _) | (_, []) => None,
        _ => {
            let crossed = |prefixed: &[Segment], suffixed: &[Segment]| {
                let head = prefixed.strip_suffix(&[Segment::Many])?;
                let tail = suffixed.strip_prefix(&[Segment::Many])?;
                Some(
                    head.iter()
                        .cloned()
                        .chain([Segment::Many])
                        .chain(tail.iter().cloned())
                        .collect::<Vec<_>>(),
                )
            };
            crossed(a, b).or_else(|| crossed(b, a))
        }
    }
}

impl FromStr for ResourcePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PatternError::Empty);
        }
        let segments = s
            .split('/')
            .enumerate()
            .map(|(index, part)| {
                if part.is_empty() {
                    Err(PatternError::EmptySegment { index })
                } else {
                    Ok(Segment::from(part))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }
}

impl Display for ResourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Debug for ResourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResourcePattern")
            .field(&self.to_string())
            .finish()
    }
}

impl Serialize for ResourcePattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn pattern(s: &str) -> ResourcePattern {
        s.parse().expect("valid pattern")
    }

    fn narrowed(a: &str, b: &str) -> Option<String> {
        narrow(&pattern(a), &pattern(b)).map(|pattern| pattern.to_string())
    }

    #[test]
    fn it_parses_and_renders_patterns() -> Result<()> {
        let parsed: ResourcePattern = "a/+/c/*".parse()?;
        assert_eq!(
            parsed.segments(),
            &[
                Segment::Literal("a".into()),
                Segment::One,
                Segment::Literal("c".into()),
                Segment::Many,
            ]
        );
        assert_eq!(parsed.to_string(), "a/+/c/*");
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_patterns() {
        assert_eq!("".parse::<ResourcePattern>(), Err(PatternError::Empty));
        assert_eq!(
            "a//b".parse::<ResourcePattern>(),
            Err(PatternError::EmptySegment { index: 1 })
        );
        assert_eq!(
            "a/*/b/*".parse::<ResourcePattern>(),
            Err(PatternError::MultipleWildcards)
        );
    }

    #[test]
    fn it_matches_concrete_resources() {
        assert!(pattern("a/b/c").matches("a/b/c"));
        assert!(!pattern("a/b/c").matches("a/b"));
        assert!(pattern("a/+/c").matches("a/x/c"));
        assert!(!pattern("a/+/c").matches("a/c"));
        assert!(pattern("a/*").matches("a"));
        assert!(pattern("a/*").matches("a/b/c/d"));
        assert!(pattern("a/*/z").matches("a/z"));
        assert!(pattern("a/*/z").matches("a/b/c/z"));
        assert!(!pattern("a/*/z").matches("a/b/c"));
    }

    #[test]
    fn it_narrows_literals_against_wildcards() {
        assert_eq!(narrowed("a/b/*", "a/b/c"), Some("a/b/c".into()));
        assert_eq!(narrowed("a/+/c", "a/b/+"), Some("a/b/c".into()));
        assert_eq!(narrowed("a/*", "a/b/*"), Some("a/b/*".into()));
        assert_eq!(narrowed("*", "x/y"), Some("x/y".into()));
    }

    #[test]
    fn it_narrows_single_against_multi_level_wildcards() {
        assert_eq!(narrowed("a/+", "a/*"), Some("a/+".into()));
        assert_eq!(narrowed("*/y", "*/y/y"), Some("*/y/y".into()));
        assert_eq!(narrowed("a/*/z", "a/b/*"), Some("a/b/*/z".into()));
        assert_eq!(narrowed("*/z", "a/*"), Some("a/*/z".into()));
    }

    #[test]
    fn it_reports_no_overlap_for_disjoint_patterns() {
        assert_eq!(narrowed("p/*", "q/r"), None);
        assert_eq!(narrowed("a/b", "a/b/c"), None);
        assert_eq!(narrowed("a/+", "a"), None);
        assert_eq!(narrowed("x/*/y", "x/*/z"), None);
    }

    #[test]
    fn it_keeps_only_the_expressible_part_of_crossed_wildcards() {
        let crossed = narrow(&pattern("a/*"), &pattern("*/a")).expect("overlap");
        assert_eq!(crossed.to_string(), "a/*/a");
        assert!(crossed.matches("a/a"));
        assert!(crossed.matches("a/b/a"));
        assert!(!crossed.matches("a"));

        let left = narrow(&crossed, &pattern("a"));
        let right = narrow(&pattern("a/*"), &pattern("a"));
        assert_eq!(left, None);
        assert_eq!(right.map(|pattern| pattern.to_string()), Some("a".into()));
    }

    #[test]
    fn it_lets_a_wildcard_match_zero_segments() {
        assert_eq!(narrowed("a/*", "a"), Some("a".into()));
        assert_eq!(narrowed("a/*/c", "a/c"), Some("a/c".into()));
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("a".to_owned()),
            Just("b".to_owned()),
            Just("+".to_owned()),
        ]
    }

    fn arbitrary_pattern() -> impl Strategy<Value = ResourcePattern> {
        (prop::collection::vec(segment(), 0..4), any::<Option<prop::sample::Index>>())
            .prop_filter_map("non-empty pattern", |(mut parts, star)| {
                if let Some(index) = star {
                    let at = index.index(parts.len() + 1);
                    parts.insert(at, "*".to_owned());
                }
                parts.join("/").parse().ok()
            })
    }

    /// Patterns whose `*`, if present, is the last segment (or the first).
    fn anchored_pattern(trailing: bool) -> impl Strategy<Value = ResourcePattern> {
        (prop::collection::vec(segment(), 0..4), any::<bool>()).prop_filter_map(
            "non-empty pattern",
            move |(mut parts, star)| {
                if star {
                    let at = if trailing { parts.len() } else { 0 };
                    parts.insert(at, "*".to_owned());
                }
                parts.join("/").parse().ok()
            },
        )
    }

    fn concrete_path() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("c")], 1..6)
            .prop_map(|parts| parts.join("/"))
    }

    proptest! {
        #[test]
        fn overlap_is_commutative(a in arbitrary_pattern(), b in arbitrary_pattern()) {
            prop_assert_eq!(narrow(&a, &b).is_some(), narrow(&b, &a).is_some());
        }

        #[test]
        fn overlap_of_prefix_patterns_is_associative(
            a in anchored_pattern(true),
            b in anchored_pattern(true),
            c in anchored_pattern(true),
        ) {
            let left = narrow(&a, &b).and_then(|ab| narrow(&ab, &c));
            let right = narrow(&b, &c).and_then(|bc| narrow(&a, &bc));
            prop_assert_eq!(left.is_some(), right.is_some());
        }

        #[test]
        fn overlap_of_suffix_patterns_is_associative(
            a in anchored_pattern(false),
            b in anchored_pattern(false),
            c in anchored_pattern(false),
        ) {
            let left = narrow(&a, &b).and_then(|ab| narrow(&ab, &c));
            let right = narrow(&b, &c).and_then(|bc| narrow(&a, &bc));
            prop_assert_eq!(left.is_some(), right.is_some());
        }

        #[test]
        fn narrowing_with_itself_is_identity(a in arbitrary_pattern()) {
            prop_assert_eq!(narrow(&a, &a), Some(a));
        }

        #[test]
        fn narrowing_never_broadens(
            a in arbitrary_pattern(),
            b in arbitrary_pattern(),
            path in concrete_path(),
        ) {
            if let Some(result) = narrow(&a, &b) {
                if result.matches(&path) {
                    prop_assert!(a.matches(&path));
                    prop_assert!(b.matches(&path));
                }
            }
        }

        #[test]
        fn narrowing_against_a_concrete_resource_yields_it(
            a in arbitrary_pattern(),
            path in concrete_path(),
        ) {
            let concrete: ResourcePattern = path.parse().expect("valid path");
            let result = narrow(&a, &concrete);
            prop_assert_eq!(result.is_some(), a.matches(&path));
            if let Some(result) = result {
                prop_assert_eq!(result, concrete);
            }
        }
    }
}
