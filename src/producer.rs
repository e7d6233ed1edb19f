//! Value producer - turns user parameters into a fully-defaulted record.
//!
//! The producer is pure: no hidden global reads, so the same parameters
//! always yield the same record. Preprocessing policy (aggregation, default
//! color, default animate) lives in the [`Producer`] config; every field
//! absent from the input has a well-defined default applied before the
//! record ever reaches the serialization boundary.

use serde::Deserialize;

use crate::error::RecordError;
use crate::record::RenderRecord;

// =============================================================================
// Parameters
// =============================================================================

/// The value carried by the parameters: a single number or a series to be
/// aggregated.
///
/// Untagged, so both `95` and `[1, 6, 9]` parse from parameter JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueInput {
    /// A single number, used as-is.
    Scalar(f64),
    /// A series, reduced by the producer's aggregation mode.
    Series(Vec<f64>),
}

impl From<f64> for ValueInput {
    fn from(v: f64) -> Self {
        ValueInput::Scalar(v)
    }
}

impl From<Vec<f64>> for ValueInput {
    fn from(v: Vec<f64>) -> Self {
        ValueInput::Series(v)
    }
}

/// User-supplied parameters for one output value.
///
/// Only `value` is mandatory at this layer; `title` is required by the wire
/// contract and its absence fails production, fast, rather than emitting a
/// partial record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputParams {
    /// Title text. Required - there is no sensible default.
    #[serde(default)]
    pub title: Option<String>,
    /// The value, scalar or series.
    pub value: ValueInput,
    /// Explicit color. Defaults from the palette by threshold when absent.
    #[serde(default)]
    pub color: Option<String>,
    /// Whether to animate. Defaults to `true` when absent.
    #[serde(default)]
    pub animate: Option<bool>,
}

impl OutputParams {
    /// Parameters with a title and a value, everything else defaulted.
    pub fn new(title: impl Into<String>, value: impl Into<ValueInput>) -> Self {
        OutputParams {
            title: Some(title.into()),
            value: value.into(),
            color: None,
            animate: None,
        }
    }
}

// =============================================================================
// Producer Config
// =============================================================================

/// How a series value is reduced to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum of all entries.
    Sum,
    /// Arithmetic mean of all entries.
    Mean,
}

/// Two-entry color palette selected by threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Color for values at or below the threshold.
    pub low: String,
    /// Color for values above the threshold.
    pub high: String,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            low: "#ef476f".to_string(),
            high: "#06d6a0".to_string(),
        }
    }
}

/// Value producer configuration.
///
/// # Example
///
/// ```ignore
/// use spark_outputs::producer::{OutputParams, Producer};
///
/// let producer = Producer::default();
/// let record = producer.produce(OutputParams::new("Countries", 95.0))?;
/// assert_eq!(record.color, "#ef476f");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Producer {
    /// Series aggregation mode.
    pub aggregate: Aggregate,
    /// Palette used when no explicit color is supplied.
    pub palette: Palette,
    /// Threshold separating the low and high palette entries.
    pub threshold: f64,
}

impl Default for Producer {
    fn default() -> Self {
        Producer {
            aggregate: Aggregate::Sum,
            palette: Palette::default(),
            threshold: 100.0,
        }
    }
}

impl Producer {
    /// Build a fully-defaulted record from user parameters.
    ///
    /// Series values are aggregated first, then defaults are applied on the
    /// aggregated value:
    /// - `color`: low palette entry when `value <= threshold`, high otherwise
    /// - `animate`: `true`
    ///
    /// # Errors
    ///
    /// - [`RecordError::MissingField`] when `title` is absent
    /// - [`RecordError::Malformed`] for an empty series
    /// - [`RecordError::NonFinite`] when the aggregated value is not finite
    pub fn produce(&self, params: OutputParams) -> Result<RenderRecord, RecordError> {
        let title = params.title.ok_or(RecordError::MissingField("title"))?;

        let value = match params.value {
            ValueInput::Scalar(v) => v,
            ValueInput::Series(ref series) => {
                if series.is_empty() {
                    return Err(RecordError::Malformed("empty value series".to_string()));
                }
                let sum: f64 = series.iter().sum();
                match self.aggregate {
                    Aggregate::Sum => sum,
                    Aggregate::Mean => sum / series.len() as f64,
                }
            }
        };
        if !value.is_finite() {
            return Err(RecordError::NonFinite);
        }

        let color = params.color.unwrap_or_else(|| {
            if value <= self.threshold {
                self.palette.low.clone()
            } else {
                self.palette.high.clone()
            }
        });

        Ok(RenderRecord {
            title,
            value,
            color,
            animate: params.animate.unwrap_or(true),
            resources: None,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_applied() {
        let record = Producer::default()
            .produce(OutputParams::new("Countries", 95.0))
            .unwrap();
        assert_eq!(record.title, "Countries");
        assert_eq!(record.value, 95.0);
        assert_eq!(record.color, "#ef476f");
        assert!(record.animate);
        assert_eq!(record.resources, None);
    }

    #[test]
    fn test_series_sum_and_low_palette() {
        let record = Producer::default()
            .produce(OutputParams::new("Total", vec![1.0, 6.0, 9.0]))
            .unwrap();
        assert_eq!(record.value, 16.0);
        // 16 <= 100, so the low palette entry wins.
        assert_eq!(record.color, "#ef476f");
    }

    #[test]
    fn test_high_palette_above_threshold() {
        let record = Producer::default()
            .produce(OutputParams::new("Population", 250.0))
            .unwrap();
        assert_eq!(record.color, "#06d6a0");
    }

    #[test]
    fn test_explicit_fields_win() {
        let mut params = OutputParams::new("Total", 5.0);
        params.color = Some("#118ab2".to_string());
        params.animate = Some(false);
        let record = Producer::default().produce(params).unwrap();
        assert_eq!(record.color, "#118ab2");
        assert!(!record.animate);
    }

    #[test]
    fn test_mean_aggregation() {
        let producer = Producer {
            aggregate: Aggregate::Mean,
            ..Producer::default()
        };
        let record = producer
            .produce(OutputParams::new("Average", vec![2.0, 4.0, 6.0]))
            .unwrap();
        assert_eq!(record.value, 4.0);
    }

    #[test]
    fn test_missing_title_fails_fast() {
        let params = OutputParams {
            title: None,
            value: ValueInput::Scalar(1.0),
            color: None,
            animate: None,
        };
        assert!(matches!(
            Producer::default().produce(params),
            Err(RecordError::MissingField("title"))
        ));
    }

    #[test]
    fn test_empty_series_rejected() {
        let params = OutputParams::new("Total", Vec::<f64>::new());
        assert!(matches!(
            Producer::default().produce(params),
            Err(RecordError::Malformed(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let producer = Producer::default();
        let a = producer
            .produce(OutputParams::new("Countries", 95.0))
            .unwrap()
            .to_wire()
            .unwrap();
        let b = producer
            .produce(OutputParams::new("Countries", 95.0))
            .unwrap()
            .to_wire()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_params_parse_from_json() {
        let params: OutputParams =
            serde_json::from_str(r#"{"title":"Total","value":[1,6,9]}"#).unwrap();
        assert_eq!(params.value, ValueInput::Series(vec![1.0, 6.0, 9.0]));
    }
}
