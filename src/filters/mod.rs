//! Filter state: the selected value per dimension and its immutable snapshot.
//!
//! Legal values come from the backend's `GET /filters` endpoint once at
//! startup ([`FilterOptions`]). A dimension without an explicit selection
//! uses the first option the backend listed for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Options and snapshot
// ---------------------------------------------------------------------------

/// Enumerated legal values per filter dimension, as returned by `GET /filters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Listed for completeness; not part of the snapshot.
    #[serde(default)]
    pub time_periods: Vec<String>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub contracts: Vec<String>,
}

impl FilterOptions {
    /// The legal values for one dimension.
    pub fn values(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Segment => &self.segments,
            Dimension::Service => &self.services,
            Dimension::Contract => &self.contracts,
        }
    }

    /// First listed value for a dimension, or `""` when the list is empty.
    pub fn default_value(&self, dimension: Dimension) -> &str {
        self.values(dimension)
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Snapshot built from the first entry of every dimension.
    pub fn default_snapshot(&self) -> FilterSnapshot {
        FilterSnapshot::new(
            self.default_value(Dimension::Segment),
            self.default_value(Dimension::Service),
            self.default_value(Dimension::Contract),
        )
    }
}

/// Immutable record of the selected filter values.
///
/// Serializes to exactly the three query parameters the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub segment: String,
    pub service: String,
    pub contract: String,
}

impl FilterSnapshot {
    pub fn new(
        segment: impl Into<String>,
        service: impl Into<String>,
        contract: impl Into<String>,
    ) -> Self {
        Self {
            segment: segment.into(),
            service: service.into(),
            contract: contract.into(),
        }
    }

    /// Value selected for one dimension.
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Segment => &self.segment,
            Dimension::Service => &self.service,
            Dimension::Contract => &self.contract,
        }
    }

    /// `(key, value)` pairs in query-string order.
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("segment", self.segment.as_str()),
            ("service", self.service.as_str()),
            ("contract", self.contract.as_str()),
        ]
    }
}

impl fmt::Display for FilterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment={} service={} contract={}",
            self.segment, self.service, self.contract
        )
    }
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// A filterable dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Segment,
    Service,
    Contract,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Self::Segment, Self::Service, Self::Contract];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::Service => "service",
            Self::Contract => "contract",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "segment" | "segments" => Ok(Self::Segment),
            "service" | "services" => Ok(Self::Service),
            "contract" | "contracts" => Ok(Self::Contract),
            other => Err(FilterError::UnknownDimension(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter dimension '{0}' (expected segment, service or contract)")]
    UnknownDimension(String),

    #[error("'{value}' is not a valid {dimension}; choose one of: {}", .allowed.join(", "))]
    InvalidValue {
        dimension: Dimension,
        value: String,
        allowed: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Current selection for every dimension, constrained to [`FilterOptions`].
#[derive(Debug, Clone)]
pub struct FilterState {
    options: FilterOptions,
    selected: FilterSnapshot,
}

impl FilterState {
    /// Start with the first option of every dimension selected.
    pub fn new(options: FilterOptions) -> Self {
        let selected = options.default_snapshot();
        Self { options, selected }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Snapshot of the current selection.
    pub fn current(&self) -> FilterSnapshot {
        self.selected.clone()
    }

    /// Select `value` for `dimension`. Only values listed in the options are
    /// accepted.
    pub fn select(&mut self, dimension: Dimension, value: &str) -> Result<(), FilterError> {
        let allowed = self.options.values(dimension);
        if !allowed.iter().any(|v| v == value) {
            return Err(FilterError::InvalidValue {
                dimension,
                value: value.to_string(),
                allowed: allowed.to_vec(),
            });
        }

        let slot = match dimension {
            Dimension::Segment => &mut self.selected.segment,
            Dimension::Service => &mut self.selected.service,
            Dimension::Contract => &mut self.selected.contract,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// Restore the first-option defaults.
    pub fn reset(&mut self) {
        self.selected = self.options.default_snapshot();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
