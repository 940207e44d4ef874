//! Per-record query outcomes and fetched attribute values

use indexmap::IndexMap;
use std::fmt;

/// Result of one remote lookup for one record
///
/// `NotFound` and `Error` are kept apart so callers can log them differently,
/// but every writer treats both as "no data".
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    /// The service returned data
    Found(T),
    /// The service answered but had nothing for this record
    NotFound,
    /// The call failed (network error, timeout, malformed response)
    Error(String),
}

impl<T> QueryOutcome<T> {
    /// True for `Found`
    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found(_))
    }

    /// True for both `NotFound` and `Error`
    pub fn is_no_data(&self) -> bool {
        !self.is_found()
    }

    /// Borrow the found value, if any
    pub fn found(&self) -> Option<&T> {
        match self {
            QueryOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Map the found value, carrying `NotFound` and `Error` through
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryOutcome<U> {
        match self {
            QueryOutcome::Found(value) => QueryOutcome::Found(f(value)),
            QueryOutcome::NotFound => QueryOutcome::NotFound,
            QueryOutcome::Error(reason) => QueryOutcome::Error(reason),
        }
    }
}

/// A single value returned by a catalog query
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric view of the value; text values never compare as numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole magnitudes keep their decimal point: 12.0, not 12
            AttributeValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            AttributeValue::Number(v) => write!(f, "{}", v),
            AttributeValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Attribute name to value for one resolved identifier, in field order
///
/// A `None` value means the service had no data for that attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    values: IndexMap<String, Option<AttributeValue>>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An attribute set where every field is absent
    pub fn empty_for<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            values: fields
                .iter()
                .map(|f| (f.as_ref().to_string(), None))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<AttributeValue>) {
        self.values.insert(name.into(), value);
    }

    /// Value of an attribute; `None` both for absent values and unknown names
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name).and_then(|v| v.as_ref())
    }

    /// Numeric value of an attribute, if present and numeric
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_f64)
    }

    /// Render an attribute the way the output files expect it (`None` when absent)
    pub fn render(&self, name: &str) -> String {
        match self.get(name) {
            Some(value) => value.to_string(),
            None => "None".to_string(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_no_data() {
        let found: QueryOutcome<u32> = QueryOutcome::Found(1);
        let missing: QueryOutcome<u32> = QueryOutcome::NotFound;
        let failed: QueryOutcome<u32> = QueryOutcome::Error("timeout".to_string());

        assert!(found.is_found());
        assert!(missing.is_no_data());
        assert!(failed.is_no_data());
        assert_eq!(found.map(|v| v * 2), QueryOutcome::Found(2));
        assert_eq!(
            failed.map(|v| v * 2),
            QueryOutcome::Error("timeout".to_string())
        );
    }

    #[test]
    fn test_attribute_set_rendering() {
        let mut attrs = AttributeSet::empty_for(&["G", "H", "main_id"]);
        attrs.insert("G", Some(AttributeValue::Number(12.5)));
        attrs.insert("main_id", Some(AttributeValue::Text("V* T Tau".to_string())));

        assert_eq!(attrs.render("G"), "12.5");
        assert_eq!(attrs.render("H"), "None");
        assert_eq!(attrs.render("main_id"), "V* T Tau");
        assert_eq!(attrs.number("G"), Some(12.5));
        assert_eq!(attrs.number("main_id"), None);
        assert_eq!(attrs.names().collect::<Vec<_>>(), vec!["G", "H", "main_id"]);
    }

    #[test]
    fn test_whole_numbers_keep_decimal_point() {
        assert_eq!(AttributeValue::Number(12.0).to_string(), "12.0");
        assert_eq!(AttributeValue::Number(-3.0).to_string(), "-3.0");
        assert_eq!(AttributeValue::Number(7.25).to_string(), "7.25");
        assert_eq!(AttributeValue::Number(f64::NAN).to_string(), "NaN");
    }
}
