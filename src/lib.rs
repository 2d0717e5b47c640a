//! churnboard: terminal client for the customer-churn analytics backend.
//!
//! The refresh pipeline lives in [`dashboard`]: it takes a
//! [`filters::FilterSnapshot`], pulls the summary record and every chart
//! series through an [`api::MetricSource`], and applies each result to its
//! widget in the [`widgets::WidgetRegistry`].

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod controls;
pub mod dashboard;
pub mod filters;
pub mod widgets;
