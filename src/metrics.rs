//! Numeric helpers shared by the metric parsers

use crate::error::{Result, WrapperError};
use log::warn;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A metric value as it appeared in the tool report
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            MetricValue::Int(v) => Some(v),
            MetricValue::Float(_) => None,
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            MetricValue::Int(v) => serializer.serialize_i64(v),
            MetricValue::Float(v) => serializer.serialize_f64(v),
        }
    }
}

/// Parse a raw report value: float when it carries a decimal point or an
/// exponent marker, integer otherwise
pub fn parse_numeric(metric: &str, raw: &str) -> Result<MetricValue> {
    let raw = raw.trim();
    let invalid = || WrapperError::InvalidValue {
        metric: metric.to_string(),
        value: raw.to_string(),
    };

    if raw.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        raw.parse::<f64>().map(MetricValue::Float).map_err(|_| invalid())
    } else {
        raw.parse::<i64>().map(MetricValue::Int).map_err(|_| invalid())
    }
}

/// Parse a count that may carry thousands separators (`1,234,567`)
pub fn parse_count(metric: &str, raw: &str) -> Result<u64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<u64>().map_err(|_| WrapperError::InvalidValue {
        metric: metric.to_string(),
        value: raw.trim().to_string(),
    })
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `numerator / denominator`, an error when the denominator is zero
pub fn ratio(
    metric: &'static str,
    numerator: f64,
    denominator_name: &'static str,
    denominator: f64,
) -> Result<f64> {
    if denominator == 0.0 {
        return Err(WrapperError::UndefinedRatio {
            metric,
            denominator: denominator_name,
        });
    }
    Ok(numerator / denominator)
}

/// `numerator / denominator * 100` rounded to two decimals
pub fn percentage(
    metric: &'static str,
    numerator: f64,
    denominator_name: &'static str,
    denominator: f64,
) -> Result<f64> {
    ratio(metric, numerator, denominator_name, denominator).map(|r| round_to(r * 100.0, 2))
}

/// Report an undefined ratio as `None` (JSON `null`) with a warning;
/// any other error is passed through
pub fn undefined_as_none(value: Result<f64>) -> Result<Option<f64>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(e @ WrapperError::UndefinedRatio { .. }) => {
            warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// One `{"label": value}` entry in a list-of-singletons metric
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl Serialize for LabeledValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.value)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_typing_follows_decimal_point() {
        assert_eq!(parse_numeric("x", "1500").unwrap(), MetricValue::Int(1500));
        assert_eq!(parse_numeric("x", "151.0").unwrap(), MetricValue::Float(151.0));
        assert_eq!(parse_numeric("x", "1.234e-03").unwrap(), MetricValue::Float(0.001234));
        assert_eq!(parse_numeric("x", "2E5").unwrap(), MetricValue::Float(200000.0));
        assert!(parse_numeric("x", "abc").is_err());
    }

    #[test]
    fn test_parse_count_strips_separators() {
        assert_eq!(parse_count("pairs", "1,234,567").unwrap(), 1_234_567);
        assert!(parse_count("pairs", "12a").is_err());
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        assert_eq!(percentage("p", 1.0, "d", 3.0).unwrap(), 33.33);
        assert_eq!(percentage("p", 95.0, "d", 100.0).unwrap(), 95.0);
    }

    #[test]
    fn test_percentage_zero_denominator_is_undefined() {
        let err = percentage("percentage_of_mapped_reads", 0.0, "total_reads", 0.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'percentage_of_mapped_reads' is undefined because 'total_reads' is zero"
        );
    }

    #[test]
    fn test_undefined_as_none() {
        assert_eq!(undefined_as_none(Ok(1.5)).unwrap(), Some(1.5));
        assert_eq!(undefined_as_none(ratio("r", 1.0, "d", 0.0)).unwrap(), None);
        assert!(undefined_as_none(Err(WrapperError::MissingArgument("x"))).is_err());
    }

    #[test]
    fn test_labeled_value_is_singleton_object() {
        let json = serde_json::to_string(&vec![LabeledValue::new("0", 0.25), LabeledValue::new("1", 0.75)]).unwrap();
        assert_eq!(json, r#"[{"0":0.25},{"1":0.75}]"#);
    }
}
