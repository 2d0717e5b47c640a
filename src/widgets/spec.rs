//! Static widget declarations: chart kind, dataset styling and axis titles.
//!
//! These are fixed at construction and never touched by data updates.
use serde::Serialize;

use crate::api::{Arity, SeriesId};

/// Visual chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Line,
    Bar,
}

/// 24-bit colour with an alpha channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

pub const PINK: Rgba = Rgba::rgb(0xf7, 0x25, 0x85);
pub const BLUE: Rgba = Rgba::rgb(0x43, 0x61, 0xee);
pub const SKY: Rgba = Rgba::rgb(0x17, 0x8a, 0xe9);

/// Styling for one dataset within a widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStyle {
    pub label: &'static str,
    pub color: Rgba,
    /// Area fill under a line.
    pub fill: bool,
    /// Line smoothing (0 = straight segments).
    pub tension: f32,
}

impl DatasetStyle {
    pub const fn solid(label: &'static str, color: Rgba) -> Self {
        Self {
            label,
            color,
            fill: false,
            tension: 0.0,
        }
    }

    pub const fn area(label: &'static str, color: Rgba, tension: f32) -> Self {
        Self {
            label,
            color,
            fill: true,
            tension,
        }
    }
}

/// Legend placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
}

/// Everything about a widget that is decided once, at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSpec {
    pub series: SeriesId,
    pub title: &'static str,
    pub kind: ChartKind,
    /// Per-dataset styling; a pie uses `slice_colors` instead of the dataset colour.
    pub datasets: Vec<DatasetStyle>,
    pub slice_colors: Vec<Rgba>,
    pub x_axis: Option<&'static str>,
    pub y_axis: Option<&'static str>,
    pub stacked: bool,
    pub begin_at_zero: bool,
    pub legend: LegendPosition,
}

impl WidgetSpec {
    fn new(series: SeriesId, title: &'static str, kind: ChartKind) -> Self {
        Self {
            series,
            title,
            kind,
            datasets: Vec::new(),
            slice_colors: Vec::new(),
            x_axis: None,
            y_axis: None,
            stacked: false,
            begin_at_zero: false,
            legend: LegendPosition::Top,
        }
    }

    fn dataset(mut self, style: DatasetStyle) -> Self {
        self.datasets.push(style);
        self
    }

    fn churn_split(self) -> Self {
        self.dataset(DatasetStyle::solid("Churned", PINK))
            .dataset(DatasetStyle::solid("Not Churned", BLUE))
    }

    fn axes(mut self, x: &'static str, y: &'static str) -> Self {
        self.x_axis = Some(x);
        self.y_axis = Some(y);
        self.begin_at_zero = true;
        self
    }

    fn stacked(mut self) -> Self {
        self.stacked = true;
        self.begin_at_zero = true;
        self
    }

    fn zero_based(mut self) -> Self {
        self.begin_at_zero = true;
        self
    }

    /// Payload shape this widget accepts.
    pub fn arity(&self) -> Arity {
        if self.datasets.len() == 2 {
            Arity::Split
        } else {
            Arity::Single
        }
    }

    /// Declaration for every dashboard chart, in display order.
    pub fn standard() -> Vec<WidgetSpec> {
        use ChartKind::{Bar, Line, Pie};
        use SeriesId as S;

        vec![
            {
                let mut spec = Self::new(S::ChurnRate, "Overall Churn Rate", Pie)
                    .dataset(DatasetStyle::solid("Customers", PINK));
                spec.slice_colors = vec![PINK, BLUE];
                spec.legend = LegendPosition::Bottom;
                spec
            },
            Self::new(S::TenureChurn, "Churn Rate by Tenure", Line)
                .dataset(DatasetStyle::area("Churn Rate (%)", BLUE, 0.4))
                .axes("Tenure (months)", "Churn Rate (%)"),
            Self::new(S::GenderChurn, "Churn by Gender", Bar)
                .churn_split()
                .zero_based(),
            Self::new(S::SeniorChurn, "Churn by Senior Citizen Status", Bar).churn_split(),
            Self::new(S::PartnerChurn, "Churn Rate by Partnership Status", Bar)
                .churn_split()
                .stacked(),
            Self::new(S::DependentsChurn, "Churn Rate by Dependent Status", Bar)
                .churn_split()
                .stacked(),
            Self::new(S::InternetChurn, "Churn by Internet Service", Bar).churn_split(),
            Self::new(S::ContractChurn, "Churn by Contract Type", Bar).churn_split(),
            Self::new(S::PaymentChurn, "Churn by Payment Method", Bar).churn_split(),
            Self::new(S::PhoneChurn, "Churn by Phone Service", Bar).churn_split(),
            Self::new(S::MonthlyChargesDist, "Monthly Charges Distribution", Line)
                .churn_split()
                .axes("Monthly Charges ($)", "Number of Customers"),
            Self::new(S::TotalChargesDist, "Total Charges Distribution", Line)
                .churn_split()
                .axes("Total Charges ($)", "Number of Customers"),
            Self::new(
                S::MonthlyGroupsChurn,
                "Churn Rate by Monthly Charges Group",
                Line,
            )
            .dataset(DatasetStyle::area(
                "Churn Rate (%)",
                SKY.with_alpha(0.42),
                0.0,
            ))
            .axes("Monthly Charges Groups ($)", "Churn Rate (%)"),
        ]
    }
}
