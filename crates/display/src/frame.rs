//! Per-frame update of every data source and visualizer.

use scene_events::JulianDate;
use serde::Serialize;

use crate::collection::DataSourceCollection;
use crate::registry::VisualizerRegistry;
use crate::render::RenderContext;
use crate::source::DataSource;

/// What happened during one frame update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// The frame was skipped because terrain heights are not initialized
    pub skipped: bool,
    /// Sources whose own update ran
    pub sources_updated: usize,
    /// Sources whose own update reported not ready
    pub sources_not_ready: usize,
    /// Visualizer updates that ran
    pub visualizers_updated: usize,
    /// Visualizer updates that reported not ready
    pub visualizers_not_ready: usize,
}

impl FrameReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// True iff the frame ran and every update in it succeeded.
    pub fn is_ready(&self) -> bool {
        !self.skipped && self.sources_not_ready == 0 && self.visualizers_not_ready == 0
    }

    fn record_source(&mut self, ready: bool) {
        self.sources_updated += 1;
        if !ready {
            self.sources_not_ready += 1;
        }
    }

    fn record_visualizer(&mut self, ready: bool) {
        self.visualizers_updated += 1;
        if !ready {
            self.visualizers_not_ready += 1;
        }
    }
}

/// Updates every registered source, then the default source.
///
/// Every source and visualizer is updated even after one reports not ready.
/// The only skip is the whole frame, when terrain heights are missing.
pub(crate) fn update_frame(
    scene: &dyn RenderContext,
    collection: &mut DataSourceCollection,
    default_source: &mut dyn DataSource,
    registry: &mut VisualizerRegistry,
    time: &JulianDate,
) -> FrameReport {
    if !scene.terrain_heights_initialized() {
        return FrameReport::skipped();
    }

    let mut report = FrameReport::default();
    for source in collection.iter_mut() {
        update_source(source, registry, time, &mut report);
    }
    update_source(default_source, registry, time, &mut report);

    tracing::trace!(
        "Frame at {}: {}/{} visualizers ready",
        time,
        report.visualizers_updated - report.visualizers_not_ready,
        report.visualizers_updated
    );
    report
}

fn update_source(
    source: &mut dyn DataSource,
    registry: &mut VisualizerRegistry,
    time: &JulianDate,
    report: &mut FrameReport,
) {
    if let Some(ready) = source.update(time) {
        report.record_source(ready);
    }

    let Some(entry) = registry.entry_mut(source.id()) else {
        tracing::warn!("Data source '{}' has no registry entry", source.name());
        return;
    };

    let entities = source.entities();
    for visualizer in entry.visualizers.iter_mut() {
        let ready = visualizer.update(time, entities, &mut entry.group);
        report.record_visualizer(ready);
    }
}
