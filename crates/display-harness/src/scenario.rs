//! Scene loading, random scene generation, and display construction.

use display::{
    from_description, DataSource, DataSourceCollection, DataSourceDisplay, DisplayConfig,
    DisplayError, RenderContext,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene_events::{
    DVec3, DataSourceId, Entity, Graphics, GraphicsKind, JulianDate, SceneDescription,
    SourceDescription, TimeInterval,
};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mean Earth radius in meters, used to place generated entities.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Number of sources a generated scene spreads its entities over.
const GENERATED_SOURCES: usize = 3;

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scene file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Reads a scene description from a JSON file.
pub fn load_scene(path: &Path) -> Result<SceneDescription, SceneLoadError> {
    let content = fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SceneDescription::from_json(&content).map_err(|source| SceneLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Generates a scene of `entity_count` entities from `seed`.
///
/// The same seed always yields the same scene, source ids included.
pub fn generate_scene(seed: u64, entity_count: usize, start: JulianDate) -> SceneDescription {
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut sources: Vec<SourceDescription> = (0..GENERATED_SOURCES)
        .map(|i| {
            let mut source = SourceDescription::new(format!("generated_{}", i));
            source.id = Some(DataSourceId::from_u128(rng.gen()));
            source.loading_frames = rng.gen_range(0..3);
            source
        })
        .collect();

    let mut default_entities = Vec::new();
    for i in 0..entity_count {
        let entity = random_entity(&mut rng, format!("entity_{:04}", i), start);
        // Roughly one entity in ten goes to the default source
        if rng.gen_bool(0.1) {
            default_entities.push(entity);
        } else {
            let slot = rng.gen_range(0..sources.len());
            sources[slot].entities.push(entity);
        }
    }

    SceneDescription {
        start,
        default_entities,
        sources,
    }
}

fn random_entity(rng: &mut SmallRng, id: String, start: JulianDate) -> Entity {
    let longitude = rng.gen_range(-PI..PI);
    let latitude = rng.gen_range(-PI / 2.0..PI / 2.0);
    let altitude = rng.gen_range(0.0..1_000_000.0);
    let position = surface_point(longitude, latitude, EARTH_RADIUS + altitude);

    let mut entity = Entity::new(id.clone()).with_name(id).with_position(position);

    if rng.gen_bool(0.3) {
        let velocity = DVec3::new(
            rng.gen_range(-7500.0..7500.0),
            rng.gen_range(-7500.0..7500.0),
            rng.gen_range(-100.0..100.0),
        );
        entity = entity.with_velocity(velocity, start);
    }
    if rng.gen_bool(0.1) {
        let opens = start.add_seconds(rng.gen_range(0.0..30.0));
        entity = entity.with_availability(TimeInterval::new(opens, opens.add_seconds(600.0)));
    }

    let graphics_count = rng.gen_range(1..=3);
    for _ in 0..graphics_count {
        let kind = GraphicsKind::ALL[rng.gen_range(0..GraphicsKind::ALL.len())];
        if entity.graphics_of(kind).is_some() {
            continue;
        }
        entity = entity.with_graphics(random_graphics(rng, kind, position));
    }
    entity
}

fn random_graphics(rng: &mut SmallRng, kind: GraphicsKind, position: DVec3) -> Graphics {
    let mut graphics = Graphics::new(kind).with_radius(rng.gen_range(1.0..100_000.0));
    if kind.is_asynchronous() {
        graphics = graphics.with_load_frames(rng.gen_range(0..5));
    }
    if kind == GraphicsKind::Polyline {
        let offset = DVec3::new(
            rng.gen_range(-1.0e5..1.0e5),
            rng.gen_range(-1.0e5..1.0e5),
            0.0,
        );
        let end = position + offset;
        graphics = graphics.with_positions(vec![position, end]);
    }
    graphics
}

fn surface_point(longitude: f64, latitude: f64, radius: f64) -> DVec3 {
    DVec3::new(
        radius * latitude.cos() * longitude.cos(),
        radius * latitude.cos() * longitude.sin(),
        radius * latitude.sin(),
    )
}

/// Builds a display showing every source of `scene`.
///
/// Default entities go into the display's default data source.
pub fn build_display<R: RenderContext>(
    scene: &SceneDescription,
    render: R,
    config: &DisplayConfig,
) -> Result<DataSourceDisplay<R>, DisplayError> {
    let mut collection = DataSourceCollection::new();
    for source in &scene.sources {
        collection.add(from_description(source))?;
    }

    let mut display = DataSourceDisplay::from_config(render, collection, config)?;
    let defaults = display.default_data_source_mut()?.entities_mut();
    for entity in &scene.default_entities {
        defaults.add(entity.clone());
    }

    tracing::info!(
        "Loaded {} data sources with {} entities",
        scene.sources.len(),
        scene.entity_count()
    );
    Ok(display)
}
