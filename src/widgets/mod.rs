//! Widget registry: one persistent chart widget per series identifier.
//!
//! Widgets are declared once ([`spec::WidgetSpec::standard`]) and live for the
//! whole session. Only the refresh pipeline writes to them, through
//! [`WidgetHandle::apply`] and [`WidgetHandle::mark_unavailable`].

pub mod canvas;
pub mod spec;

use serde::Serialize;

use crate::api::{Arity, ChartSeries, SeriesId};

pub use canvas::{Canvas, Frame, RecordingCanvas, TextCanvas};
pub use spec::{ChartKind, WidgetSpec};

// ---------------------------------------------------------------------------
// Widget state
// ---------------------------------------------------------------------------

/// Labels and value arrays currently displayed by a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    /// One array per dataset, in the widget's dataset order.
    pub datasets: Vec<Vec<f64>>,
}

impl ChartData {
    /// No labels and one empty array per dataset.
    pub fn empty(arity: Arity) -> Self {
        Self {
            labels: Vec::new(),
            datasets: vec![Vec::new(); arity.dataset_count()],
        }
    }
}

/// Whether the displayed data reflects the latest refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WidgetStatus {
    /// Nothing applied yet.
    Empty,
    /// Data from the most recent successful fetch.
    Fresh,
    /// The last refresh failed for this widget; the data shown is older.
    Unavailable { reason: String },
}

/// One chart widget: static spec, current data and its canvas.
#[derive(Debug)]
pub struct WidgetHandle<C> {
    spec: WidgetSpec,
    data: ChartData,
    status: WidgetStatus,
    revision: u64,
    canvas: C,
}

impl<C: Canvas> WidgetHandle<C> {
    pub fn new(spec: WidgetSpec, canvas: C) -> Self {
        let data = ChartData::empty(spec.arity());
        Self {
            spec,
            data,
            status: WidgetStatus::Empty,
            revision: 0,
            canvas,
        }
    }

    pub fn spec(&self) -> &WidgetSpec {
        &self.spec
    }

    pub fn data(&self) -> &ChartData {
        &self.data
    }

    pub fn status(&self) -> &WidgetStatus {
        &self.status
    }

    /// Number of successful applies so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// Replace labels and datasets with `series` and redraw.
    ///
    /// # Panics
    ///
    /// If the series arity differs from the widget's or any value array does
    /// not match the label count. Callers holding untrusted data should run
    /// [`ChartSeries::validate`] first.
    pub fn apply(&mut self, series: &ChartSeries) {
        if let Err(e) = series.validate(self.spec.arity()) {
            panic!("cannot apply series to widget '{}': {e}", self.spec.series);
        }

        self.data.labels = series.labels().to_vec();
        self.data.datasets = series
            .datasets()
            .into_iter()
            .map(|(_, values)| values.to_vec())
            .collect();
        self.status = WidgetStatus::Fresh;
        self.revision += 1;
        self.redraw();
    }

    /// Keep the current data but flag it as stale and redraw.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.status = WidgetStatus::Unavailable {
            reason: reason.into(),
        };
        self.redraw();
    }

    fn redraw(&mut self) {
        self.canvas.draw(Frame {
            spec: &self.spec,
            data: &self.data,
            status: &self.status,
            revision: self.revision,
        });
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered `(series, widget)` pairs the refresh pipeline iterates over.
#[derive(Debug)]
pub struct WidgetRegistry<C> {
    entries: Vec<(SeriesId, WidgetHandle<C>)>,
}

impl<C: Canvas> WidgetRegistry<C> {
    /// Build a registry from explicit specs, one canvas per widget.
    pub fn from_specs(
        specs: Vec<WidgetSpec>,
        mut make_canvas: impl FnMut(&WidgetSpec) -> C,
    ) -> Self {
        let entries = specs
            .into_iter()
            .map(|spec| {
                let canvas = make_canvas(&spec);
                (spec.series, WidgetHandle::new(spec, canvas))
            })
            .collect();
        Self { entries }
    }

    /// Every dashboard chart, with canvases from `make_canvas`.
    pub fn standard_with(make_canvas: impl FnMut(&WidgetSpec) -> C) -> Self {
        Self::from_specs(WidgetSpec::standard(), make_canvas)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered series identifiers in display order.
    pub fn series_ids(&self) -> Vec<SeriesId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn get(&self, id: SeriesId) -> Option<&WidgetHandle<C>> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, handle)| handle)
    }

    pub fn get_mut(&mut self, id: SeriesId) -> Option<&mut WidgetHandle<C>> {
        self.entries
            .iter_mut()
            .find(|(entry, _)| *entry == id)
            .map(|(_, handle)| handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeriesId, &WidgetHandle<C>)> {
        self.entries.iter().map(|(id, handle)| (*id, handle))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SeriesId, &mut WidgetHandle<C>)> {
        self.entries.iter_mut().map(|(id, handle)| (*id, handle))
    }
}

impl<C: Canvas + Default> WidgetRegistry<C> {
    /// Every dashboard chart with default canvases.
    pub fn standard() -> Self {
        Self::standard_with(|_| C::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> WidgetRegistry<RecordingCanvas> {
        WidgetRegistry::standard()
    }

    #[test]
    fn standard_registry_has_one_widget_per_series() {
        let reg = registry();
        assert_eq!(reg.len(), 13);
        assert_eq!(reg.series_ids(), SeriesId::ALL.to_vec());
    }

    #[test]
    fn widgets_start_empty_with_declared_dataset_count() {
        let reg = registry();
        let gender = reg.get(SeriesId::GenderChurn).unwrap();
        assert_eq!(gender.status(), &WidgetStatus::Empty);
        assert_eq!(gender.data().datasets.len(), 2);
        assert_eq!(gender.revision(), 0);
        assert_eq!(gender.canvas().draw_count(), 0);
    }

    #[test]
    fn apply_replaces_data_and_redraws() {
        let mut reg = registry();
        let widget = reg.get_mut(SeriesId::GenderChurn).unwrap();
        widget.apply(&ChartSeries::split(
            &["Male", "Female"],
            &[120.0, 95.0],
            &[380.0, 405.0],
        ));

        assert_eq!(widget.data().labels, vec!["Male", "Female"]);
        assert_eq!(widget.data().datasets[0], vec![120.0, 95.0]);
        assert_eq!(widget.data().datasets[1], vec![380.0, 405.0]);
        assert_eq!(widget.status(), &WidgetStatus::Fresh);
        assert_eq!(widget.revision(), 1);
        assert_eq!(widget.canvas().draw_count(), 1);
    }

    #[test]
    fn apply_overwrites_previous_labels() {
        let mut reg = registry();
        let widget = reg.get_mut(SeriesId::ChurnRate).unwrap();
        widget.apply(&ChartSeries::single(&["No", "Yes", "Unknown"], &[1.0, 2.0, 3.0]));
        widget.apply(&ChartSeries::single(&["No", "Yes"], &[10.0, 20.0]));
        assert_eq!(widget.data().labels, vec!["No", "Yes"]);
        assert_eq!(widget.data().datasets, vec![vec![10.0, 20.0]]);
        assert_eq!(widget.revision(), 2);
    }

    #[test]
    #[should_panic(expected = "expected a two-series payload")]
    fn apply_panics_on_arity_mismatch() {
        let mut reg = registry();
        reg.get_mut(SeriesId::GenderChurn)
            .unwrap()
            .apply(&ChartSeries::single(&["Male"], &[1.0]));
    }

    #[test]
    #[should_panic(expected = "has 1 values for 2 labels")]
    fn apply_panics_on_length_mismatch() {
        let mut reg = registry();
        reg.get_mut(SeriesId::TenureChurn)
            .unwrap()
            .apply(&ChartSeries::single(&["1", "2"], &[50.0]));
    }

    #[test]
    fn mark_unavailable_keeps_data() {
        let mut reg = registry();
        let widget = reg.get_mut(SeriesId::PhoneChurn).unwrap();
        widget.apply(&ChartSeries::split(&["No", "Yes"], &[1.0, 2.0], &[3.0, 4.0]));
        widget.mark_unavailable("HTTP 503");

        assert_eq!(widget.data().labels, vec!["No", "Yes"]);
        assert_eq!(
            widget.status(),
            &WidgetStatus::Unavailable {
                reason: "HTTP 503".to_string()
            }
        );
        assert_eq!(widget.revision(), 1);
        assert_eq!(widget.canvas().draw_count(), 2);
    }

    #[test]
    fn static_styling_survives_updates() {
        let mut reg = registry();
        let before = reg.get(SeriesId::TenureChurn).unwrap().spec().clone();
        reg.get_mut(SeriesId::TenureChurn)
            .unwrap()
            .apply(&ChartSeries::single(&["1"], &[47.5]));
        assert_eq!(reg.get(SeriesId::TenureChurn).unwrap().spec(), &before);
    }
}
