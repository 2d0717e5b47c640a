//! Wire types for the churn analytics backend.
//!
//! The backend answers `/stats` with a flat summary record and
//! `/chart/{name}` with either a single value series or a churned /
//! not-churned pair. Label arrays arrive as strings for categorical charts
//! and as integers for the tenure curve, so labels are normalised to strings
//! at decode time.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Response body of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_customers: u64,
    /// Percentage in `[0, 100]`.
    pub churn_rate: f64,
    pub avg_monthly: f64,
    /// Months.
    pub avg_tenure: f64,
}

// ---------------------------------------------------------------------------
// Series identifiers
// ---------------------------------------------------------------------------

/// Number of aligned value arrays a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    /// `{labels, values}`
    Single,
    /// `{labels, churned, not_churned}`
    Split,
}

impl Arity {
    pub fn dataset_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Split => 2,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single-series"),
            Self::Split => write!(f, "two-series"),
        }
    }
}

/// Every chart dataset the backend serves under `/chart/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeriesId {
    ChurnRate,
    TenureChurn,
    GenderChurn,
    SeniorChurn,
    PartnerChurn,
    DependentsChurn,
    InternetChurn,
    ContractChurn,
    PaymentChurn,
    PhoneChurn,
    MonthlyChargesDist,
    TotalChargesDist,
    MonthlyGroupsChurn,
}

impl SeriesId {
    /// All identifiers in dashboard order.
    pub const ALL: [SeriesId; 13] = [
        Self::ChurnRate,
        Self::TenureChurn,
        Self::GenderChurn,
        Self::SeniorChurn,
        Self::PartnerChurn,
        Self::DependentsChurn,
        Self::InternetChurn,
        Self::ContractChurn,
        Self::PaymentChurn,
        Self::PhoneChurn,
        Self::MonthlyChargesDist,
        Self::TotalChargesDist,
        Self::MonthlyGroupsChurn,
    ];

    /// Path segment used in `/chart/{name}`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChurnRate => "churnRate",
            Self::TenureChurn => "tenureChurn",
            Self::GenderChurn => "genderChurn",
            Self::SeniorChurn => "seniorChurn",
            Self::PartnerChurn => "partnerChurn",
            Self::DependentsChurn => "dependentsChurn",
            Self::InternetChurn => "internetChurn",
            Self::ContractChurn => "contractChurn",
            Self::PaymentChurn => "paymentChurn",
            Self::PhoneChurn => "phoneChurn",
            Self::MonthlyChargesDist => "monthlyChargesDist",
            Self::TotalChargesDist => "totalChargesDist",
            Self::MonthlyGroupsChurn => "monthlyGroupsChurn",
        }
    }

    /// Shape the backend returns for this identifier.
    pub fn arity(self) -> Arity {
        match self {
            Self::ChurnRate | Self::TenureChurn | Self::MonthlyGroupsChurn => Arity::Single,
            _ => Arity::Split,
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown series '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Series payloads
// ---------------------------------------------------------------------------

/// Response body of `GET /chart/{name}`.
///
/// Decoding does not check that value arrays match the label count; use
/// [`ChartSeries::validate`] for that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartSeries {
    Split {
        #[serde(deserialize_with = "labels_as_strings")]
        labels: Vec<String>,
        churned: Vec<f64>,
        not_churned: Vec<f64>,
    },
    Single {
        #[serde(deserialize_with = "labels_as_strings")]
        labels: Vec<String>,
        values: Vec<f64>,
    },
}

/// Why a series cannot be applied to a widget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected a {expected} payload, got {actual}")]
    Arity { expected: Arity, actual: Arity },

    #[error("'{dataset}' has {values} values for {labels} labels")]
    Length {
        dataset: &'static str,
        labels: usize,
        values: usize,
    },
}

impl ChartSeries {
    /// Convenience constructor for single-series payloads.
    pub fn single(labels: &[&str], values: &[f64]) -> Self {
        Self::Single {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            values: values.to_vec(),
        }
    }

    /// Convenience constructor for churned / not-churned payloads.
    pub fn split(labels: &[&str], churned: &[f64], not_churned: &[f64]) -> Self {
        Self::Split {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            churned: churned.to_vec(),
            not_churned: not_churned.to_vec(),
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Single { .. } => Arity::Single,
            Self::Split { .. } => Arity::Split,
        }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            Self::Single { labels, .. } | Self::Split { labels, .. } => labels,
        }
    }

    /// Named value arrays in dataset order.
    pub fn datasets(&self) -> Vec<(&'static str, &[f64])> {
        match self {
            Self::Single { values, .. } => vec![("values", values.as_slice())],
            Self::Split {
                churned,
                not_churned,
                ..
            } => vec![
                ("churned", churned.as_slice()),
                ("not_churned", not_churned.as_slice()),
            ],
        }
    }

    /// Check arity against `expected` and every value array against the
    /// label count.
    pub fn validate(&self, expected: Arity) -> Result<(), ShapeError> {
        let actual = self.arity();
        if actual != expected {
            return Err(ShapeError::Arity { expected, actual });
        }

        let labels = self.labels().len();
        for (dataset, values) in self.datasets() {
            if values.len() != labels {
                return Err(ShapeError::Length {
                    dataset,
                    labels,
                    values: values.len(),
                });
            }
        }
        Ok(())
    }
}

/// Accept labels as JSON strings, numbers or booleans and keep their text.
fn labels_as_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|value| match value {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Bool(b) => Ok(b.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "unsupported label value: {other}"
            ))),
        })
        .collect()
}

/// Response body of `GET /test`.
#[derive(Debug, Clone, Deserialize)]
pub struct PingResponse {
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_split_series() {
        let json = r#"{"labels":["Male","Female"],"churned":[120,95],"not_churned":[380,405]}"#;
        let series: ChartSeries = serde_json::from_str(json).unwrap();
        assert_eq!(
            series,
            ChartSeries::split(&["Male", "Female"], &[120.0, 95.0], &[380.0, 405.0])
        );
    }

    #[test]
    fn decodes_integer_labels_as_text() {
        let json = r#"{"labels":[1,2,3],"values":[50.0,41.2,0]}"#;
        let series: ChartSeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.labels(), ["1", "2", "3"]);
        assert_eq!(series.arity(), Arity::Single);
    }

    #[test]
    fn empty_object_is_not_a_series() {
        assert!(serde_json::from_str::<ChartSeries>("{}").is_err());
    }

    #[test]
    fn validate_reports_arity_mismatch() {
        let series = ChartSeries::single(&["No", "Yes"], &[5174.0, 1869.0]);
        assert_eq!(
            series.validate(Arity::Split),
            Err(ShapeError::Arity {
                expected: Arity::Split,
                actual: Arity::Single
            })
        );
    }

    #[test]
    fn validate_reports_length_mismatch() {
        let series = ChartSeries::split(&["Yes", "No"], &[1.0, 2.0], &[3.0]);
        let err = series.validate(Arity::Split).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Length {
                dataset: "not_churned",
                labels: 2,
                values: 1
            }
        );
    }

    #[test]
    fn series_names_round_trip_through_from_str() {
        for id in SeriesId::ALL {
            assert_eq!(id.as_str().parse::<SeriesId>(), Ok(id));
        }
        assert!("revenueChurn".parse::<SeriesId>().is_err());
    }

    #[test]
    fn single_series_ids() {
        let singles: Vec<_> = SeriesId::ALL
            .into_iter()
            .filter(|id| id.arity() == Arity::Single)
            .collect();
        assert_eq!(
            singles,
            vec![
                SeriesId::ChurnRate,
                SeriesId::TenureChurn,
                SeriesId::MonthlyGroupsChurn
            ]
        );
    }

    #[test]
    fn decodes_summary() {
        let json =
            r#"{"total_customers":1000,"churn_rate":26.5,"avg_monthly":64.2,"avg_tenure":32.4}"#;
        let stats: SummaryStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_customers, 1000);
        assert!((stats.churn_rate - 26.5).abs() < f64::EPSILON);
    }
}
