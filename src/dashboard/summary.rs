//! Summary tiles: the four headline numbers above the charts.
use serde::Serialize;

use crate::api::SummaryStats;
use crate::widgets::WidgetStatus;

/// Placeholder shown before the first successful fetch.
pub const PLACEHOLDER: &str = "--";

/// Display strings for the summary tiles.
///
/// Values are shown as the backend sent them; the only formatting is the
/// unit affix (`%`, `$`, `mos`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPanel {
    pub total_customers: String,
    pub churn_rate: String,
    pub avg_monthly: String,
    pub avg_tenure: String,
    pub status: WidgetStatus,
}

impl Default for SummaryPanel {
    fn default() -> Self {
        Self {
            total_customers: PLACEHOLDER.to_string(),
            churn_rate: PLACEHOLDER.to_string(),
            avg_monthly: PLACEHOLDER.to_string(),
            avg_tenure: PLACEHOLDER.to_string(),
            status: WidgetStatus::Empty,
        }
    }
}

impl SummaryPanel {
    /// Write a freshly fetched record into the tiles.
    pub fn show(&mut self, stats: &SummaryStats) {
        self.total_customers = stats.total_customers.to_string();
        self.churn_rate = format!("{}%", stats.churn_rate);
        self.avg_monthly = format!("${}", stats.avg_monthly);
        self.avg_tenure = format!("{} mos", stats.avg_tenure);
        self.status = WidgetStatus::Fresh;
    }

    /// Keep the tiles but flag them as stale.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.status = WidgetStatus::Unavailable {
            reason: reason.into(),
        };
    }

    /// `(caption, value)` pairs in display order.
    pub fn tiles(&self) -> [(&'static str, &str); 4] {
        [
            ("Total Customers", self.total_customers.as_str()),
            ("Churn Rate", self.churn_rate.as_str()),
            ("Avg. Monthly Charge", self.avg_monthly.as_str()),
            ("Avg. Tenure", self.avg_tenure.as_str()),
        ]
    }
}
