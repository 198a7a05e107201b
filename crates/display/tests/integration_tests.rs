//! Integration tests for the data source display.
//!
//! These drive a full display through the public API, using counting
//! visualizers to observe lifecycle calls and the sample scene fixture to
//! exercise the standard visualizers end-to-end.

use display::{
    factory_fn, from_description, CustomDataSource, DataSource, DataSourceCollection,
    DataSourceDisplay, DisplayConfig, DisplayError, RenderableGroup, SceneRecorder, Visualizer,
};
use scene_events::fixtures::{regions_id, sample_scene, satellites_id};
use scene_events::{
    BoundingSphere, BoundingSphereState, DVec3, Entity, EntityCollection, EntityId, Graphics,
    GraphicsKind, JulianDate,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Lifecycle call counts shared by every visualizer a factory builds.
#[derive(Debug, Default)]
struct Counters {
    created: Cell<usize>,
    updated: Cell<usize>,
    destroyed: Cell<usize>,
}

/// Visualizer with a scripted readiness and bounding sphere.
struct CountingVisualizer {
    name: String,
    counters: Rc<Counters>,
    ready: Rc<Cell<bool>>,
    sphere: Option<BoundingSphereState>,
    log: Option<Rc<RefCell<Vec<String>>>>,
}

impl CountingVisualizer {
    fn new(name: impl Into<String>, counters: &Rc<Counters>) -> Self {
        counters.created.set(counters.created.get() + 1);
        Self {
            name: name.into(),
            counters: Rc::clone(counters),
            ready: Rc::new(Cell::new(true)),
            sphere: None,
            log: None,
        }
    }

    fn with_ready(mut self, ready: &Rc<Cell<bool>>) -> Self {
        self.ready = Rc::clone(ready);
        self
    }

    fn with_sphere(mut self, state: BoundingSphereState) -> Self {
        self.sphere = Some(state);
        self
    }

    fn with_log(mut self, log: &Rc<RefCell<Vec<String>>>) -> Self {
        self.log = Some(Rc::clone(log));
        self
    }
}

impl Visualizer for CountingVisualizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(
        &mut self,
        _time: &JulianDate,
        _entities: &EntityCollection,
        _group: &mut RenderableGroup,
    ) -> bool {
        self.counters.updated.set(self.counters.updated.get() + 1);
        if let Some(log) = &self.log {
            log.borrow_mut().push(self.name.clone());
        }
        self.ready.get()
    }

    fn bounding_sphere(&self, _entity: &Entity) -> Option<BoundingSphereState> {
        self.sphere
    }

    fn destroy(self: Box<Self>, _group: &mut RenderableGroup) {
        self.counters.destroyed.set(self.counters.destroyed.get() + 1);
    }
}

fn t(seconds: f64) -> JulianDate {
    JulianDate::j2000().add_seconds(seconds)
}

fn source_with(name: &str, entity_ids: &[&str]) -> Box<dyn DataSource> {
    let entities = entity_ids
        .iter()
        .map(|id| Entity::new(*id).with_position(DVec3::ZERO))
        .collect();
    Box::new(CustomDataSource::new(name).with_entities(entities))
}

/// Display whose factory builds `k` counting visualizers per source.
fn counting_display(
    k: usize,
    counters: &Rc<Counters>,
) -> DataSourceDisplay<SceneRecorder> {
    let counters = Rc::clone(counters);
    let factory = factory_fn(move |_, _, _| {
        (0..k)
            .map(|i| {
                Box::new(CountingVisualizer::new(format!("v{}", i), &counters))
                    as Box<dyn Visualizer>
            })
            .collect()
    });
    DataSourceDisplay::with_factory(
        SceneRecorder::new(),
        DataSourceCollection::new(),
        Box::new(factory),
    )
    .expect("Failed to create display")
}

/// Builds the sample scene into a display with the standard visualizers.
fn sample_display() -> (DataSourceDisplay<SceneRecorder>, JulianDate) {
    let scene = sample_scene();
    let mut collection = DataSourceCollection::new();
    for source in &scene.sources {
        collection
            .add(from_description(source))
            .expect("Failed to add sample source");
    }

    let mut display = DataSourceDisplay::new(SceneRecorder::new(), collection)
        .expect("Failed to create display");
    let defaults = display
        .default_data_source_mut()
        .expect("Display destroyed")
        .entities_mut();
    for entity in scene.default_entities {
        defaults.add(entity);
    }
    (display, scene.start)
}

#[test]
fn test_visualizer_count_per_source() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(3, &counters);

    for i in 0..4 {
        display
            .add_data_source(source_with(&format!("s{}", i), &[]))
            .unwrap();
    }

    let registry = display.registry().unwrap();
    assert_eq!(registry.len(), 5, "Four sources plus the default");
    assert_eq!(registry.total_visualizers(), 15);
    assert_eq!(counters.created.get(), 15);
    for source in display.data_sources().unwrap().iter() {
        assert_eq!(registry.visualizer_count(source.id()), Some(3));
    }
}

#[test]
fn test_removal_destroys_and_detaches_once() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(2, &counters);
    let journal = display.render_context().unwrap().journal();

    let id = display.add_data_source(source_with("doomed", &[])).unwrap();
    let handle = journal.borrow().handle_for(id).expect("Group not attached");

    let removed = display.remove_data_source(id).unwrap();
    assert_eq!(removed.id(), id);
    assert_eq!(counters.destroyed.get(), 2);
    assert_eq!(journal.borrow().detach_count_for(handle), 1);
    assert!(!display.registry().unwrap().contains(id));

    // A later frame must not touch the removed entry again
    display.update(&t(0.0)).unwrap();
    assert_eq!(counters.destroyed.get(), 2);
    assert_eq!(journal.borrow().detach_count_for(handle), 1);
    assert!(matches!(
        display.remove_data_source(id),
        Err(DisplayError::NotRegistered(_))
    ));
}

#[test]
fn test_add_duplicate_source_is_rejected() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(2, &counters);
    let journal = display.render_context().unwrap().journal();
    let default_id = display.default_data_source().unwrap().id();

    let id = display.add_data_source(source_with("first", &[])).unwrap();
    let again = CustomDataSource::with_id(id, "again");
    assert!(matches!(
        display.add_data_source(Box::new(again)),
        Err(DisplayError::AlreadyRegistered(dup)) if dup == id
    ));
    let clash = CustomDataSource::with_id(default_id, "clash");
    assert!(matches!(
        display.add_data_source(Box::new(clash)),
        Err(DisplayError::AlreadyRegistered(dup)) if dup == default_id
    ));

    assert_eq!(display.data_sources().unwrap().len(), 1);
    assert_eq!(display.registry().unwrap().len(), 2);
    assert_eq!(counters.created.get(), 4);
    assert_eq!(journal.borrow().attach_count, 2);

    // The default entry survives an attempt to remove it by id
    assert!(display.remove_data_source(default_id).is_err());
    assert!(display.registry().unwrap().contains(default_id));
    assert_eq!(counters.destroyed.get(), 0);
}

#[test]
fn test_direct_add_of_default_id_is_dropped_on_drain() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(1, &counters);
    let default_id = display.default_data_source().unwrap().id();

    display
        .data_sources_mut()
        .unwrap()
        .add(Box::new(CustomDataSource::with_id(default_id, "clash")))
        .unwrap();
    assert!(display.update(&t(0.0)).unwrap());

    assert!(!display.data_sources().unwrap().contains(default_id));
    assert!(display.registry().unwrap().contains(default_id));
    assert_eq!(display.registry().unwrap().len(), 1);
    assert_eq!(counters.destroyed.get(), 0);

    // A real direct add still registers normally afterwards
    let id = display
        .data_sources_mut()
        .unwrap()
        .add(source_with("later", &[]))
        .unwrap();
    display.update(&t(1.0)).unwrap();
    assert!(display.registry().unwrap().contains(id));
    assert_eq!(display.registry().unwrap().len(), 2);
}

#[test]
fn test_update_ticks_every_visualizer_after_failure() {
    let counters = Rc::new(Counters::default());
    let failing = Rc::new(Cell::new(false));
    let factory = {
        let counters = Rc::clone(&counters);
        let failing = Rc::clone(&failing);
        factory_fn(move |_, _, _| {
            vec![
                Box::new(CountingVisualizer::new("first", &counters)) as Box<dyn Visualizer>,
                Box::new(CountingVisualizer::new("flaky", &counters).with_ready(&failing)),
                Box::new(CountingVisualizer::new("last", &counters)),
            ]
        })
    };
    let mut display = DataSourceDisplay::with_factory(
        SceneRecorder::new(),
        DataSourceCollection::new(),
        Box::new(factory),
    )
    .unwrap();
    display.add_data_source(source_with("a", &[])).unwrap();

    let report = display.update_with_report(&t(0.0)).unwrap();
    assert!(!report.is_ready());
    assert_eq!(report.visualizers_updated, 6);
    assert_eq!(report.visualizers_not_ready, 2);
    assert_eq!(counters.updated.get(), 6);
    assert!(!display.is_ready().unwrap());

    failing.set(true);
    assert!(display.update(&t(1.0)).unwrap());
    assert_eq!(counters.updated.get(), 12);
}

#[test]
fn test_update_order_follows_collection() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let counters = Rc::new(Counters::default());
    let factory = {
        let log = Rc::clone(&log);
        let counters = Rc::clone(&counters);
        factory_fn(move |_, _, source: &dyn DataSource| {
            vec![Box::new(
                CountingVisualizer::new(source.name().to_string(), &counters).with_log(&log),
            ) as Box<dyn Visualizer>]
        })
    };
    let mut display = DataSourceDisplay::with_factory(
        SceneRecorder::new(),
        DataSourceCollection::new(),
        Box::new(factory),
    )
    .unwrap();
    let a = display.add_data_source(source_with("a", &[])).unwrap();
    display.add_data_source(source_with("b", &[])).unwrap();

    display.update(&t(0.0)).unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "default"]);

    log.borrow_mut().clear();
    assert!(display.data_sources_mut().unwrap().raise_to_top(a));
    display.update(&t(1.0)).unwrap();
    assert_eq!(*log.borrow(), vec!["b", "a", "default"]);
}

#[test]
fn test_not_ready_gives_pending() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(1, &counters);
    display
        .add_data_source(source_with("a", &["known"]))
        .unwrap();

    // No frame has run yet
    for allow_partial in [false, true] {
        let state = display
            .bounding_sphere(&EntityId::new("known"), allow_partial)
            .unwrap();
        assert!(state.is_pending());
        let state = display
            .bounding_sphere(&EntityId::new("unknown"), allow_partial)
            .unwrap();
        assert!(state.is_pending());
    }
}

#[test]
fn test_unknown_entity_fails() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(1, &counters);
    display.add_data_source(source_with("a", &["known"])).unwrap();
    assert!(display.update(&t(0.0)).unwrap());

    for allow_partial in [false, true] {
        let state = display
            .bounding_sphere(&EntityId::new("unknown"), allow_partial)
            .unwrap();
        assert_eq!(state, BoundingSphereState::Failed);
    }
}

#[test]
fn test_partial_merge_skips_pending() {
    let a = BoundingSphere::new(DVec3::new(0.0, 0.0, 0.0), 1.0);
    let b = BoundingSphere::new(DVec3::new(10.0, 0.0, 0.0), 1.0);
    let counters = Rc::new(Counters::default());
    let factory = {
        let counters = Rc::clone(&counters);
        factory_fn(move |_, _, _| {
            vec![
                Box::new(
                    CountingVisualizer::new("a", &counters)
                        .with_sphere(BoundingSphereState::done(a)),
                ) as Box<dyn Visualizer>,
                Box::new(
                    CountingVisualizer::new("loading", &counters)
                        .with_sphere(BoundingSphereState::Pending),
                ),
                Box::new(
                    CountingVisualizer::new("b", &counters)
                        .with_sphere(BoundingSphereState::done(b)),
                ),
                // Does not compute spheres
                Box::new(CountingVisualizer::new("silent", &counters)),
            ]
        })
    };
    let mut display = DataSourceDisplay::with_factory(
        SceneRecorder::new(),
        DataSourceCollection::new(),
        Box::new(factory),
    )
    .unwrap();
    display.add_data_source(source_with("s", &["e"])).unwrap();
    assert!(display.update(&t(0.0)).unwrap());

    let strict = display.bounding_sphere(&EntityId::new("e"), false).unwrap();
    assert_eq!(strict, BoundingSphereState::Pending);

    let partial = display.bounding_sphere(&EntityId::new("e"), true).unwrap();
    let sphere = partial.sphere().expect("Expected a merged sphere");
    assert!(sphere.contains_sphere(&a, 1e-9));
    assert!(sphere.contains_sphere(&b, 1e-9));
    assert!((sphere.radius - 6.0).abs() < 1e-9);
}

#[test]
fn test_terrain_gate_skips_all_work() {
    let counters = Rc::new(Counters::default());
    let factory = {
        let counters = Rc::clone(&counters);
        factory_fn(move |_, _, _| {
            vec![Box::new(CountingVisualizer::new("v", &counters)) as Box<dyn Visualizer>]
        })
    };
    let mut display = DataSourceDisplay::with_factory(
        SceneRecorder::without_terrain(),
        DataSourceCollection::new(),
        Box::new(factory),
    )
    .unwrap();
    display.add_data_source(source_with("a", &["e"])).unwrap();

    let report = display.update_with_report(&t(0.0)).unwrap();
    assert!(report.skipped);
    assert!(!display.is_ready().unwrap());
    assert_eq!(counters.updated.get(), 0);

    display
        .render_context_mut()
        .unwrap()
        .set_terrain_heights_initialized(true);
    assert!(display.update(&t(1.0)).unwrap());
    assert_eq!(counters.updated.get(), 2);
}

#[test]
fn test_destroy_tears_down_everything_once() {
    let counters = Rc::new(Counters::default());
    let mut display = counting_display(2, &counters);
    let journal = display.render_context().unwrap().journal();
    display.add_data_source(source_with("a", &[])).unwrap();
    display.add_data_source(source_with("b", &[])).unwrap();

    display.destroy().unwrap();
    assert!(display.is_destroyed());
    assert_eq!(counters.destroyed.get(), 6);
    assert!(journal.borrow().attached.is_empty());
    assert_eq!(journal.borrow().detach_count, 3);

    assert!(matches!(display.destroy(), Err(DisplayError::Destroyed)));
    assert!(matches!(
        display.add_data_source(source_with("c", &[])),
        Err(DisplayError::Destroyed)
    ));
    drop(display);
    assert_eq!(counters.destroyed.get(), 6);
    assert_eq!(journal.borrow().detach_count, 3);
}

#[test]
fn test_sample_scene_becomes_ready() {
    let (mut display, start) = sample_display();
    assert_eq!(display.data_sources().unwrap().len(), 2);
    assert_eq!(display.registry().unwrap().total_visualizers(), 21);

    // Satellites report loading for one frame, the model for three
    let mut time = start;
    let mut ready_at = None;
    for frame in 1..=6 {
        if display.update(&time).unwrap() {
            ready_at = Some(frame);
            break;
        }
        time = time.add_seconds(1.0);
    }
    assert_eq!(ready_at, Some(4));

    let alpha = display
        .bounding_sphere(&EntityId::new("sat_alpha"), false)
        .unwrap();
    let sphere = alpha.sphere().expect("Expected sat_alpha to be done");
    let expected_center = DVec3::new(7_000_000.0, 7500.0 * 3.0, 0.0);
    assert!((sphere.center - expected_center).length() < 1e-6);
    assert!((sphere.radius - 20.0).abs() < 1e-9);

    let station = display
        .bounding_sphere(&EntityId::new("ground_station"), false)
        .unwrap();
    assert!(station.is_done());

    let border = display
        .bounding_sphere(&EntityId::new("border"), false)
        .unwrap();
    let border_sphere = border.sphere().expect("Expected border to be done");
    assert!(border_sphere.contains_point(DVec3::new(6_378_137.0, 100_000.0, 0.0), 1e-6));

    let hidden = display
        .bounding_sphere(&EntityId::new("hidden_marker"), true)
        .unwrap();
    assert_eq!(hidden, BoundingSphereState::Failed);
}

#[test]
fn test_sample_scene_owners() {
    let (display, _) = sample_display();
    let default_id = display.default_data_source().unwrap().id();

    assert_eq!(
        display.owner_of(&EntityId::new("sat_beta")).unwrap(),
        Some(satellites_id())
    );
    assert_eq!(
        display.owner_of(&EntityId::new("region_north")).unwrap(),
        Some(regions_id())
    );
    assert_eq!(
        display.owner_of(&EntityId::new("ground_station")).unwrap(),
        Some(default_id)
    );
}

#[test]
fn test_removing_source_resets_readiness() {
    let (mut display, start) = sample_display();
    let mut time = start;
    while !display.update(&time).unwrap() {
        time = time.add_seconds(1.0);
    }

    let journal = display.render_context().unwrap().journal();
    let handle = journal.borrow().handle_for(regions_id()).unwrap();
    display.remove_data_source(regions_id()).unwrap();

    assert_eq!(journal.borrow().detach_count_for(handle), 1);
    assert!(display
        .bounding_sphere(&EntityId::new("sat_beta"), false)
        .unwrap()
        .is_pending());

    assert!(display.update(&time.add_seconds(1.0)).unwrap());
    assert!(display
        .bounding_sphere(&EntityId::new("region_north"), true)
        .unwrap()
        .is_failed());
    assert!(display
        .bounding_sphere(&EntityId::new("sat_beta"), false)
        .unwrap()
        .is_done());
}

#[test]
fn test_display_from_config() {
    let config = DisplayConfig::from_str(
        r#"
[visualizers]
enabled = ["point", "label"]

[display]
default_source_name = "loose"
"#,
    )
    .unwrap();

    let mut display =
        DataSourceDisplay::from_config(SceneRecorder::new(), DataSourceCollection::new(), &config)
            .unwrap();
    let id = display
        .add_data_source(Box::new(CustomDataSource::new("tracks").with_entities(
            std::iter::once(
                Entity::new("p")
                    .with_position(DVec3::X)
                    .with_graphics(Graphics::new(GraphicsKind::Point).with_radius(2.0)),
            )
            .collect(),
        )))
        .unwrap();

    assert_eq!(display.default_data_source().unwrap().name(), "loose");
    assert_eq!(display.registry().unwrap().visualizer_count(id), Some(2));
    assert!(display.update(&t(0.0)).unwrap());

    let state = display.bounding_sphere(&EntityId::new("p"), false).unwrap();
    assert_eq!(state, BoundingSphereState::done(BoundingSphere::new(DVec3::X, 2.0)));
}
