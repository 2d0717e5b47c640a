//! Rendering surfaces for widgets.
//!
//! A [`Canvas`] is the charting layer: it receives a [`Frame`] every time a
//! widget's data or status changes and draws it. [`TextCanvas`] draws
//! horizontal bar charts for a terminal; [`RecordingCanvas`] keeps every
//! frame it was given, for tests and headless use.

use colored::{ColoredString, Colorize};

use super::spec::{ChartKind, Rgba, WidgetSpec};
use super::{ChartData, WidgetStatus};

/// Default bar width in terminal columns.
pub const DEFAULT_BAR_WIDTH: usize = 30;

/// Longest label shown before truncation.
const MAX_LABEL_WIDTH: usize = 24;

/// Everything a canvas needs to draw one widget.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub spec: &'a WidgetSpec,
    pub data: &'a ChartData,
    pub status: &'a WidgetStatus,
    pub revision: u64,
}

/// A surface a widget redraws onto.
pub trait Canvas {
    fn draw(&mut self, frame: Frame<'_>);
}

// ---------------------------------------------------------------------------
// Text canvas
// ---------------------------------------------------------------------------

/// Terminal renderer. Keeps the text of the last frame drawn.
#[derive(Debug, Clone)]
pub struct TextCanvas {
    bar_width: usize,
    text: String,
}

impl Default for TextCanvas {
    fn default() -> Self {
        Self::with_bar_width(DEFAULT_BAR_WIDTH)
    }
}

impl TextCanvas {
    pub fn with_bar_width(bar_width: usize) -> Self {
        Self {
            bar_width: bar_width.max(1),
            text: String::new(),
        }
    }

    /// Text of the most recent frame (empty before the first draw).
    pub fn text(&self) -> &str {
        &self.text
    }

    fn render(&self, frame: Frame<'_>) -> Vec<String> {
        let spec = frame.spec;
        let data = frame.data;
        let mut lines = Vec::new();

        let mut header = format!("{}", spec.title.bold().cyan());
        if let WidgetStatus::Unavailable { reason } = frame.status {
            header.push_str(&format!(
                "  {}",
                format!("[data unavailable: {reason}]").red().bold()
            ));
        }
        lines.push(header);

        if data.labels.is_empty() {
            lines.push(format!("  {}", "(no data)".dimmed()));
            return lines;
        }

        let label_width = data
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_WIDTH);

        match spec.kind {
            ChartKind::Pie => self.render_pie(spec, data, label_width, &mut lines),
            ChartKind::Bar | ChartKind::Line if spec.stacked => {
                self.render_stacked(spec, data, label_width, &mut lines)
            }
            ChartKind::Bar | ChartKind::Line => {
                self.render_grouped(spec, data, label_width, &mut lines)
            }
        }

        if spec.datasets.len() > 1 {
            let legend: Vec<String> = spec
                .datasets
                .iter()
                .map(|d| format!("{} {}", paint("■", d.color), d.label))
                .collect();
            lines.push(format!("  {}", legend.join("   ")));
        }

        if let (Some(x), Some(y)) = (spec.x_axis, spec.y_axis) {
            lines.push(format!("  {}", format!("x: {x}  y: {y}").dimmed()));
        }

        lines
    }

    fn render_pie(
        &self,
        spec: &WidgetSpec,
        data: &ChartData,
        label_width: usize,
        lines: &mut Vec<String>,
    ) {
        let values = data.datasets.first().map(Vec::as_slice).unwrap_or(&[]);
        let total: f64 = values.iter().sum();

        for (i, (label, value)) in data.labels.iter().zip(values).enumerate() {
            let share = if total > 0.0 { value / total } else { 0.0 };
            let color = spec
                .slice_colors
                .get(i % spec.slice_colors.len().max(1))
                .copied()
                .unwrap_or(Rgba::rgb(0xcc, 0xcc, 0xcc));
            lines.push(format!(
                "  {:<label_width$} {} {} ({:.1}%)",
                truncate(label, MAX_LABEL_WIDTH),
                paint(&bar(share, self.bar_width), color),
                format_value(*value),
                share * 100.0,
            ));
        }
    }

    fn render_grouped(
        &self,
        spec: &WidgetSpec,
        data: &ChartData,
        label_width: usize,
        lines: &mut Vec<String>,
    ) {
        let max = data
            .datasets
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max);

        for (row, label) in data.labels.iter().enumerate() {
            for (i, values) in data.datasets.iter().enumerate() {
                let value = values.get(row).copied().unwrap_or(0.0);
                let shown_label = if i == 0 {
                    truncate(label, MAX_LABEL_WIDTH)
                } else {
                    String::new()
                };
                let color = spec
                    .datasets
                    .get(i)
                    .map(|d| d.color)
                    .unwrap_or(Rgba::rgb(0xcc, 0xcc, 0xcc));
                lines.push(format!(
                    "  {:<label_width$} {} {}",
                    shown_label,
                    paint(&bar(ratio(value, max), self.bar_width), color),
                    format_value(value),
                ));
            }
        }
    }

    fn render_stacked(
        &self,
        spec: &WidgetSpec,
        data: &ChartData,
        label_width: usize,
        lines: &mut Vec<String>,
    ) {
        let totals: Vec<f64> = (0..data.labels.len())
            .map(|row| data.datasets.iter().filter_map(|v| v.get(row)).sum())
            .collect();
        let max = totals.iter().copied().fold(0.0_f64, f64::max);

        for (row, label) in data.labels.iter().enumerate() {
            let mut segments = String::new();
            let mut parts = Vec::new();
            for (i, values) in data.datasets.iter().enumerate() {
                let value = values.get(row).copied().unwrap_or(0.0);
                let color = spec
                    .datasets
                    .get(i)
                    .map(|d| d.color)
                    .unwrap_or(Rgba::rgb(0xcc, 0xcc, 0xcc));
                let cells = bar(ratio(value, max), self.bar_width);
                segments.push_str(&paint(&cells, color).to_string());
                parts.push(format_value(value));
            }
            lines.push(format!(
                "  {:<label_width$} {} {}",
                truncate(label, MAX_LABEL_WIDTH),
                segments,
                parts.join(" / "),
            ));
        }
    }
}

impl Canvas for TextCanvas {
    fn draw(&mut self, frame: Frame<'_>) {
        self.text = self.render(frame).join("\n");
    }
}

// ---------------------------------------------------------------------------
// Recording canvas
// ---------------------------------------------------------------------------

/// What a [`RecordingCanvas`] saw in one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnFrame {
    pub data: ChartData,
    pub status: WidgetStatus,
    pub revision: u64,
}

/// Canvas that records every frame instead of drawing it.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    frames: Vec<DrawnFrame>,
}

impl RecordingCanvas {
    pub fn frames(&self) -> &[DrawnFrame] {
        &self.frames
    }

    pub fn draw_count(&self) -> usize {
        self.frames.len()
    }
}

impl Canvas for RecordingCanvas {
    fn draw(&mut self, frame: Frame<'_>) {
        self.frames.push(DrawnFrame {
            data: frame.data.clone(),
            status: frame.status.clone(),
            revision: frame.revision,
        });
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}

/// Bar of `share * width` cells; non-zero values always get at least one cell.
fn bar(share: f64, width: usize) -> String {
    let share = share.clamp(0.0, 1.0);
    let mut cells = (share * width as f64).round() as usize;
    if cells == 0 && share > 0.0 {
        cells = 1;
    }
    "█".repeat(cells)
}

fn paint(text: &str, color: Rgba) -> ColoredString {
    text.truecolor(color.r, color.g, color.b)
}

/// Shortest textual form of a value (`120`, `41.27`).
pub fn format_value(value: f64) -> String {
    format!("{value}")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::spec::WidgetSpec;

    fn no_color() {
        colored::control::set_override(false);
    }

    fn spec_for(index: usize) -> WidgetSpec {
        WidgetSpec::standard().swap_remove(index)
    }

    #[test]
    fn bar_scales_and_keeps_small_values_visible() {
        assert_eq!(bar(1.0, 10).chars().count(), 10);
        assert_eq!(bar(0.5, 10).chars().count(), 5);
        assert_eq!(bar(0.001, 10).chars().count(), 1);
        assert_eq!(bar(0.0, 10), "");
    }

    #[test]
    fn format_value_drops_trailing_zero() {
        assert_eq!(format_value(120.0), "120");
        assert_eq!(format_value(41.27), "41.27");
    }

    #[test]
    fn truncate_long_labels() {
        assert_eq!(truncate("Electronic check", 24), "Electronic check");
        assert_eq!(truncate("Bank transfer (automatic)", 10), "Bank tran…");
    }

    #[test]
    fn empty_widget_says_no_data() {
        no_color();
        let spec = spec_for(2);
        let mut canvas = TextCanvas::default();
        canvas.draw(Frame {
            spec: &spec,
            data: &ChartData::empty(spec.arity()),
            status: &WidgetStatus::Empty,
            revision: 0,
        });
        assert!(canvas.text().starts_with("Churn by Gender"));
        assert!(canvas.text().contains("(no data)"));
    }

    #[test]
    fn pie_shows_shares() {
        no_color();
        let spec = spec_for(0);
        let data = ChartData {
            labels: vec!["No".to_string(), "Yes".to_string()],
            datasets: vec![vec![75.0, 25.0]],
        };
        let mut canvas = TextCanvas::with_bar_width(8);
        canvas.draw(Frame {
            spec: &spec,
            data: &data,
            status: &WidgetStatus::Fresh,
            revision: 1,
        });
        assert!(canvas.text().contains("75 (75.0%)"));
        assert!(canvas.text().contains("25 (25.0%)"));
    }

    #[test]
    fn unavailable_banner_is_drawn() {
        no_color();
        let spec = spec_for(1);
        let mut canvas = TextCanvas::default();
        canvas.draw(Frame {
            spec: &spec,
            data: &ChartData::empty(spec.arity()),
            status: &WidgetStatus::Unavailable {
                reason: "HTTP 500".to_string(),
            },
            revision: 0,
        });
        assert!(canvas.text().contains("[data unavailable: HTTP 500]"));
    }

    #[test]
    fn split_chart_lists_legend_and_values() {
        no_color();
        let spec = spec_for(2);
        let data = ChartData {
            labels: vec!["Male".to_string(), "Female".to_string()],
            datasets: vec![vec![120.0, 95.0], vec![380.0, 405.0]],
        };
        let mut canvas = TextCanvas::default();
        canvas.draw(Frame {
            spec: &spec,
            data: &data,
            status: &WidgetStatus::Fresh,
            revision: 1,
        });
        let text = canvas.text();
        assert!(text.contains("Churned"));
        assert!(text.contains("Not Churned"));
        assert!(text.contains(" 405"));
    }
}
