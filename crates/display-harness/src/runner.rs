//! Frame loop driving a display against a recorded scene.

use display::{DataSourceDisplay, DisplayError, FrameReport, SceneRecorder};
use scene_events::{BoundingSphereState, EntityId, JulianDate};
use serde::Serialize;

/// How to drive the frame loop.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub frames: u64,
    pub start: JulianDate,
    pub step_seconds: f64,
    /// Frames to run before terrain heights count as initialized
    pub terrain_delay: u64,
    /// Entity whose bounding sphere is polled every frame
    pub query: Option<EntityId>,
    pub allow_partial: bool,
}

/// What happened over a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub frames_run: u64,
    /// First frame (1-based) after which the display was ready
    pub ready_at: Option<u64>,
    pub query: Option<EntityId>,
    /// First non-pending answer to the query
    pub query_result: Option<BoundingSphereState>,
    /// Frame on which `query_result` was obtained
    pub query_resolved_at: Option<u64>,
    pub attached_groups: usize,
    pub last_report: FrameReport,
}

/// Runs `options.frames` frames and tears the display down afterwards.
pub fn run(
    display: &mut DataSourceDisplay<SceneRecorder>,
    options: &RunOptions,
) -> Result<RunSummary, DisplayError> {
    let journal = display.render_context()?.journal();
    let mut summary = RunSummary {
        frames_run: 0,
        ready_at: None,
        query: options.query.clone(),
        query_result: None,
        query_resolved_at: None,
        attached_groups: 0,
        last_report: FrameReport::default(),
    };

    let mut time = options.start;
    for frame in 1..=options.frames {
        let terrain_ready = frame > options.terrain_delay;
        display
            .render_context_mut()?
            .set_terrain_heights_initialized(terrain_ready);

        let report = display.update_with_report(&time)?;
        if report.is_ready() && summary.ready_at.is_none() {
            tracing::info!("Display ready after frame {} at {}", frame, time);
            summary.ready_at = Some(frame);
        }

        if let (Some(entity), None) = (&options.query, &summary.query_result) {
            let state = display.bounding_sphere(entity, options.allow_partial)?;
            if !state.is_pending() {
                tracing::info!("Bounding sphere for '{}' on frame {}: {:?}", entity, frame, state);
                summary.query_result = Some(state);
                summary.query_resolved_at = Some(frame);
            }
        }

        summary.frames_run = frame;
        summary.last_report = report;
        time = time.add_seconds(options.step_seconds);
    }

    summary.attached_groups = journal.borrow().attached.len();
    display.destroy()?;

    let journal = journal.borrow();
    tracing::debug!(
        "Scene saw {} attaches and {} detaches",
        journal.attach_count,
        journal.detach_count
    );
    Ok(summary)
}
