//! Data source display: keeps visualizers in step with a changing set of
//! data sources.
//!
//! The display sits between the entity model and the scene. Every data
//! source it shows gets a renderable group attached to the scene and an
//! ordered list of visualizers. Each frame the display updates every source
//! and every visualizer, and it answers "where is this entity drawn?" by
//! merging the bounding spheres of the owning source's visualizers.
//!
//! # Architecture
//!
//! ```text
//! DataSourceCollection ──changes──▶ VisualizerRegistry ──attach/detach──▶ RenderContext
//!                                        │
//!                          update(time) ─┤─ bounding_sphere(entity)
//!                                        ▼
//!                                    Visualizers
//! ```
//!
//! # Modules
//!
//! - [`collection`]: Ordered data sources with queued change notifications
//! - [`registry`]: Renderable group and visualizer ownership per data source
//! - [`frame`]: Per-frame update and readiness reduction
//! - [`standard`]: The standard visualizer set and default factory
//! - [`render`]: The scene interface and an in-memory recorder
//! - [`config`]: TOML configuration

pub mod bounds;
pub mod collection;
pub mod config;
pub mod frame;
pub mod registry;
pub mod render;
pub mod source;
pub mod standard;
pub mod visualizer;

// Re-export collection types
pub use collection::{DataSourceCollection, SubscriptionId};

// Re-export config types
pub use config::{
    default_config_toml, ConfigError, DisplayConfig, GeneralConfig, TomlSerializeError,
    VisualizerConfig,
};

// Re-export frame types
pub use frame::FrameReport;

// Re-export registry types
pub use registry::{RegistryEntry, VisualizerRegistry};

// Re-export render types
pub use render::{
    GroupHandle, Primitive, RenderContext, RenderableGroup, SceneEvent, SceneJournal,
    SceneRecorder,
};

// Re-export source types
pub use source::{from_description, CustomDataSource, DataSource, ScriptedDataSource};

// Re-export visualizer types
pub use standard::{GraphicsVisualizer, StandardVisualizerFactory};
pub use visualizer::{factory_fn, Visualizer, VisualizerFactory};

use scene_events::{BoundingSphereState, CollectionChange, DataSourceId, EntityId, JulianDate};
use std::fmt;

/// Errors that can occur in display operations.
///
/// Every variant except `Config` is a usage fault: the caller broke the
/// display's contract.
#[derive(Debug)]
pub enum DisplayError {
    /// The display was already destroyed
    Destroyed,
    /// A data source with this id is already registered
    AlreadyRegistered(DataSourceId),
    /// No data source with this id is registered
    NotRegistered(DataSourceId),
    /// Error loading configuration
    Config(ConfigError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Destroyed => write!(f, "Display was destroyed"),
            DisplayError::AlreadyRegistered(id) => {
                write!(f, "Data source {} is already registered", id)
            }
            DisplayError::NotRegistered(id) => write!(f, "Data source {} is not registered", id),
            DisplayError::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisplayError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for DisplayError {
    fn from(e: ConfigError) -> Self {
        DisplayError::Config(e)
    }
}

/// Visualizes a collection of data sources.
///
/// Owns the collection, an always-present default data source, and one
/// registry entry per source. Driven from a single thread: call
/// [`update`](Self::update) once per frame and poll
/// [`bounding_sphere`](Self::bounding_sphere) until it stops returning
/// `Pending`.
///
/// After [`destroy`](Self::destroy) every call except
/// [`is_destroyed`](Self::is_destroyed) returns [`DisplayError::Destroyed`].
pub struct DataSourceDisplay<R: RenderContext> {
    scene: R,
    collection: DataSourceCollection,
    default_source: CustomDataSource,
    registry: VisualizerRegistry,
    factory: Box<dyn VisualizerFactory>,
    subscription: Option<SubscriptionId>,
    log_frame_reports: bool,
    ready: bool,
    last_report: FrameReport,
    destroyed: bool,
}

impl<R: RenderContext> DataSourceDisplay<R> {
    /// Creates a display using the standard visualizer set.
    pub fn new(scene: R, collection: DataSourceCollection) -> Result<Self, DisplayError> {
        Self::with_factory(scene, collection, Box::new(StandardVisualizerFactory::new()))
    }

    /// Creates a display with a custom visualizer factory.
    pub fn with_factory(
        scene: R,
        collection: DataSourceCollection,
        factory: Box<dyn VisualizerFactory>,
    ) -> Result<Self, DisplayError> {
        Self::build(scene, collection, factory, &GeneralConfig::default())
    }

    /// Creates a display whose standard visualizers and settings come from `config`.
    pub fn from_config(
        scene: R,
        collection: DataSourceCollection,
        config: &DisplayConfig,
    ) -> Result<Self, DisplayError> {
        let factory = StandardVisualizerFactory::from_config(&config.visualizers);
        Self::build(scene, collection, Box::new(factory), &config.display)
    }

    fn build(
        mut scene: R,
        mut collection: DataSourceCollection,
        factory: Box<dyn VisualizerFactory>,
        general: &GeneralConfig,
    ) -> Result<Self, DisplayError> {
        let subscription = collection.subscribe();
        let mut registry = VisualizerRegistry::new();

        for source in collection.iter() {
            registry.on_added(&mut scene, factory.as_ref(), source)?;
        }

        let default_source = CustomDataSource::new(general.default_source_name.clone());
        registry.on_added(&mut scene, factory.as_ref(), &default_source)?;

        tracing::debug!(
            "Display created with {} data sources and {} visualizers",
            collection.len(),
            registry.total_visualizers()
        );

        Ok(Self {
            scene,
            collection,
            default_source,
            registry,
            factory,
            subscription: Some(subscription),
            log_frame_reports: general.log_frame_reports,
            ready: false,
            last_report: FrameReport::default(),
            destroyed: false,
        })
    }

    fn check_alive(&self) -> Result<(), DisplayError> {
        if self.destroyed {
            Err(DisplayError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Applies collection changes queued since the last call.
    ///
    /// Any added or removed source resets readiness: no full frame has run
    /// for the new set of sources yet. A source whose registration fails is
    /// taken back out of the collection; the rejected ids are returned with
    /// their errors.
    fn apply_pending_changes(&mut self) -> Vec<(DataSourceId, DisplayError)> {
        let mut rejected = Vec::new();
        let Some(subscription) = self.subscription else {
            return rejected;
        };
        let default_id = self.default_source.id();

        for change in self.collection.drain_changes(subscription) {
            match change {
                CollectionChange::Added { id } => {
                    // Already gone again if it was removed before this drain
                    let Some(source) = self.collection.get(id) else {
                        continue;
                    };
                    let result = if id == default_id {
                        Err(DisplayError::AlreadyRegistered(id))
                    } else {
                        self.registry
                            .on_added(&mut self.scene, self.factory.as_ref(), source)
                            .map(|_| ())
                    };
                    if let Err(e) = result {
                        tracing::warn!("Rejecting data source {}: {}", id, e);
                        self.collection.remove(id);
                        rejected.push((id, e));
                        continue;
                    }
                    self.ready = false;
                }
                CollectionChange::Removed { id } => {
                    // The default entry only goes away with the display
                    if id == default_id || !self.registry.contains(id) {
                        continue;
                    }
                    if let Err(e) = self.registry.on_removed(&mut self.scene, id) {
                        tracing::warn!("Ignoring removal of data source {}: {}", id, e);
                        continue;
                    }
                    self.ready = false;
                }
                CollectionChange::Moved { .. } => {}
            }
        }
        rejected
    }

    /// Adds a data source to the collection and registers it immediately.
    ///
    /// A source whose id is already shown, the default source's included,
    /// is rejected with [`DisplayError::AlreadyRegistered`] and left out of
    /// the collection.
    pub fn add_data_source(
        &mut self,
        source: Box<dyn DataSource>,
    ) -> Result<DataSourceId, DisplayError> {
        self.check_alive()?;
        let id = source.id();
        if id == self.default_source.id() {
            return Err(DisplayError::AlreadyRegistered(id));
        }

        self.apply_pending_changes();
        self.collection.add(source)?;
        let rejected = self.apply_pending_changes();
        match rejected.into_iter().find(|(rejected_id, _)| *rejected_id == id) {
            Some((_, e)) => Err(e),
            None => Ok(id),
        }
    }

    /// Removes a data source, tearing down its visualizers, and hands it back.
    pub fn remove_data_source(
        &mut self,
        id: DataSourceId,
    ) -> Result<Box<dyn DataSource>, DisplayError> {
        self.check_alive()?;
        let source = self
            .collection
            .remove(id)
            .ok_or(DisplayError::NotRegistered(id))?;
        self.apply_pending_changes();
        Ok(source)
    }

    /// Updates every data source and visualizer to `time`.
    ///
    /// Returns true if everything is ready to be displayed. Returns false
    /// without updating anything while terrain heights are not initialized.
    pub fn update(&mut self, time: &JulianDate) -> Result<bool, DisplayError> {
        Ok(self.update_with_report(time)?.is_ready())
    }

    /// Same as [`update`](Self::update), returning the full frame report.
    pub fn update_with_report(&mut self, time: &JulianDate) -> Result<FrameReport, DisplayError> {
        self.check_alive()?;
        self.apply_pending_changes();

        let report = frame::update_frame(
            &self.scene,
            &mut self.collection,
            &mut self.default_source,
            &mut self.registry,
            time,
        );
        if self.log_frame_reports {
            tracing::debug!("Frame report at {}: {:?}", time, report);
        }

        self.ready = report.is_ready();
        self.last_report = report.clone();
        Ok(report)
    }

    /// Computes a bounding sphere enclosing everything drawn for `entity`.
    ///
    /// Returns `Pending` until a frame has fully succeeded since the last
    /// structural change. With `allow_partial` false, any pending
    /// visualizer makes the result pending; with it true, only the spheres
    /// available now are merged. Returns `Failed` if no source owns the
    /// entity or nothing is drawn for it.
    pub fn bounding_sphere(
        &mut self,
        entity: &EntityId,
        allow_partial: bool,
    ) -> Result<BoundingSphereState, DisplayError> {
        self.check_alive()?;
        self.apply_pending_changes();

        if !self.ready {
            return Ok(BoundingSphereState::Pending);
        }

        Ok(bounds::compute_bounding_sphere(
            &self.scene,
            &self.default_source,
            &self.collection,
            &self.registry,
            entity,
            allow_partial,
        ))
    }

    /// Finds which data source owns `entity`.
    pub fn owner_of(&self, entity: &EntityId) -> Result<Option<DataSourceId>, DisplayError> {
        self.check_alive()?;
        Ok(bounds::find_owner(&self.default_source, &self.collection, entity).map(|s| s.id()))
    }

    /// Whether the most recent frame fully succeeded.
    pub fn is_ready(&self) -> Result<bool, DisplayError> {
        self.check_alive()?;
        Ok(self.ready)
    }

    /// Report of the most recent frame.
    pub fn last_report(&self) -> Result<&FrameReport, DisplayError> {
        self.check_alive()?;
        Ok(&self.last_report)
    }

    /// The data sources shown, excluding the default source.
    pub fn data_sources(&self) -> Result<&DataSourceCollection, DisplayError> {
        self.check_alive()?;
        Ok(&self.collection)
    }

    /// Mutable access to the collection. Structural changes made through it
    /// are applied at the start of the next update or query.
    pub fn data_sources_mut(&mut self) -> Result<&mut DataSourceCollection, DisplayError> {
        self.check_alive()?;
        Ok(&mut self.collection)
    }

    /// The always-present source for entities not tied to any other source.
    pub fn default_data_source(&self) -> Result<&CustomDataSource, DisplayError> {
        self.check_alive()?;
        Ok(&self.default_source)
    }

    /// Mutable access to the default source, for adding loose entities.
    pub fn default_data_source_mut(&mut self) -> Result<&mut CustomDataSource, DisplayError> {
        self.check_alive()?;
        Ok(&mut self.default_source)
    }

    /// The scene this display feeds.
    pub fn render_context(&self) -> Result<&R, DisplayError> {
        self.check_alive()?;
        Ok(&self.scene)
    }

    /// Mutable access to the scene, e.g. to flip its terrain flag.
    pub fn render_context_mut(&mut self) -> Result<&mut R, DisplayError> {
        self.check_alive()?;
        Ok(&mut self.scene)
    }

    /// The registry entries of every shown source, the default included.
    pub fn registry(&self) -> Result<&VisualizerRegistry, DisplayError> {
        self.check_alive()?;
        Ok(&self.registry)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Unsubscribes from the collection and tears down every registry entry,
    /// registered sources first and the default source last.
    pub fn destroy(&mut self) -> Result<(), DisplayError> {
        self.check_alive()?;
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.collection.unsubscribe(subscription);
        }

        let ids: Vec<DataSourceId> = self
            .collection
            .iter()
            .map(|s| s.id())
            .filter(|id| self.registry.contains(*id))
            .collect();
        for id in ids {
            if let Err(e) = self.registry.on_removed(&mut self.scene, id) {
                tracing::warn!("Failed to tear down data source {}: {}", id, e);
            }
        }
        let default_id = self.default_source.id();
        if let Err(e) = self.registry.on_removed(&mut self.scene, default_id) {
            tracing::warn!("Failed to tear down default data source: {}", e);
        }

        // Entries whose source left the collection without being drained
        let stale: Vec<DataSourceId> = self.registry.ids().collect();
        for id in stale {
            if let Err(e) = self.registry.on_removed(&mut self.scene, id) {
                tracing::warn!("Failed to tear down stale data source {}: {}", id, e);
            }
        }

        self.ready = false;
        self.destroyed = true;
        tracing::debug!("Display destroyed");
    }
}

impl<R: RenderContext> Drop for DataSourceDisplay<R> {
    fn drop(&mut self) {
        if !self.destroyed {
            self.teardown();
        }
    }
}

impl<R: RenderContext> fmt::Debug for DataSourceDisplay<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceDisplay")
            .field("collection", &self.collection)
            .field("default_source", &self.default_source.name())
            .field("registry", &self.registry)
            .field("ready", &self.ready)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
