//! Magnitude threshold filtering
//!
//! A `FilterPredicate` is a conjunction of conditions such as `G>11` and
//! `H<8`. A record passes only if every referenced attribute is present,
//! numeric, and satisfies its condition.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::outcome::AttributeSet;
use crate::StarqueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
        }
    }
}

/// One `attribute <op> threshold` test
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, comparison: Comparison, threshold: f64) -> Self {
        Self {
            attribute: attribute.into(),
            comparison,
            threshold,
        }
    }

    /// Absent and non-numeric values never satisfy a condition
    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        attributes
            .number(&self.attribute)
            .is_some_and(|value| self.comparison.holds(value, self.threshold))
    }
}

lazy_static! {
    // `<attribute><op><number>`, e.g. `G>11`, `flux(H) <= 8.5`
    static ref CONDITION_RE: Regex = Regex::new(
        r"^\s*([A-Za-z_][A-Za-z0-9_()]*)\s*(>=|<=|>|<)\s*([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)\s*$"
    )
    .unwrap();
}

impl FromStr for Condition {
    type Err = StarqueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CONDITION_RE
            .captures(s)
            .ok_or_else(|| StarqueryError::InvalidPredicate(s.to_string()))?;

        let comparison = match &caps[2] {
            ">" => Comparison::Greater,
            ">=" => Comparison::GreaterOrEqual,
            "<" => Comparison::Less,
            _ => Comparison::LessOrEqual,
        };
        let threshold = caps[3]
            .parse::<f64>()
            .map_err(|_| StarqueryError::InvalidPredicate(s.to_string()))?;

        Ok(Condition::new(&caps[1], comparison, threshold))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.attribute, self.comparison.symbol(), self.threshold)
    }
}

/// Conjunction of conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPredicate {
    conditions: Vec<Condition>,
}

impl FilterPredicate {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Parse each condition string, e.g. `["G>11", "H<8"]`
    pub fn parse<S: AsRef<str>>(conditions: &[S]) -> crate::Result<Self> {
        let conditions = conditions
            .iter()
            .map(|c| c.as_ref().parse())
            .collect::<crate::Result<Vec<Condition>>>()?;
        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// True when there are no conditions, in which case everything passes
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        self.conditions.iter().all(|c| c.matches(attributes))
    }

    /// The records whose attributes satisfy the predicate, in input order
    pub fn apply<'r, T, F>(&self, records: &'r [T], attributes: F) -> Vec<&'r T>
    where
        F: Fn(&T) -> Option<&AttributeSet>,
    {
        records
            .iter()
            .filter(|r| attributes(*r).is_some_and(|a| self.matches(a)))
            .collect()
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::AttributeValue;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn attrs(g: Option<f64>, h: Option<f64>) -> AttributeSet {
        let mut set = AttributeSet::new();
        set.insert("G", g.map(AttributeValue::Number));
        set.insert("H", h.map(AttributeValue::Number));
        set
    }

    fn taurus_predicate() -> FilterPredicate {
        FilterPredicate::parse(&["G>11", "H<8"]).unwrap()
    }

    #[rstest]
    #[case(Some(12.0), Some(7.5), true)]
    #[case(Some(10.0), Some(7.5), false)]
    #[case(Some(12.0), Some(8.0), false)]
    #[case(Some(12.0), None, false)]
    #[case(None, Some(7.5), false)]
    #[case(None, None, false)]
    fn test_g_and_h_limits(#[case] g: Option<f64>, #[case] h: Option<f64>, #[case] passes: bool) {
        assert_eq!(taurus_predicate().matches(&attrs(g, h)), passes);
    }

    #[rstest]
    #[case("G>11", ">", 11.0)]
    #[case(" H <= 8.5 ", "<=", 8.5)]
    #[case("K>=-1.5", ">=", -1.5)]
    #[case("flux(J)<1e1", "<", 10.0)]
    #[case("flux(H) <= 8.5", "<=", 8.5)]
    fn test_parse_condition(#[case] text: &str, #[case] symbol: &str, #[case] threshold: f64) {
        let condition: Condition = text.parse().unwrap();
        assert_eq!(condition.comparison.symbol(), symbol);
        assert_relative_eq!(condition.threshold, threshold);
    }

    #[rstest]
    #[case("G")]
    #[case("G=11")]
    #[case(">11")]
    #[case("G>eleven")]
    fn test_invalid_condition(#[case] text: &str) {
        assert!(matches!(
            text.parse::<Condition>(),
            Err(StarqueryError::InvalidPredicate(_))
        ));
    }

    #[test]
    fn test_text_values_never_match() {
        let mut set = AttributeSet::new();
        set.insert("H", Some(AttributeValue::Text("7.5".to_string())));
        assert!(!FilterPredicate::parse(&["H<8"]).unwrap().matches(&set));
    }

    #[test]
    fn test_apply_preserves_order() {
        let records = vec![
            ("a", Some(attrs(Some(12.0), Some(7.0)))),
            ("b", None),
            ("c", Some(attrs(Some(10.0), Some(7.0)))),
            ("d", Some(attrs(Some(13.0), Some(6.0)))),
        ];
        let passed = taurus_predicate().apply(&records, |r| r.1.as_ref());
        let names: Vec<_> = passed.iter().map(|r| r.0).collect();
        assert_eq!(names, vec!["a", "d"]);
    }

    #[test]
    fn test_empty_predicate_passes_present_attributes() {
        let predicate = FilterPredicate::default();
        assert!(predicate.is_empty());
        assert!(predicate.matches(&attrs(None, None)));
    }

    #[test]
    fn test_display() {
        assert_eq!(taurus_predicate().to_string(), "G>11 AND H<8");
    }
}
