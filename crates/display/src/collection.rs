//! Ordered collection of data sources with change notification.
//!
//! Every structural change is queued for each live subscriber. Subscribers
//! drain their queue when they are ready to react, so nothing is ever called
//! back in the middle of a mutation.

use scene_events::{CollectionChange, DataSourceId};
use std::fmt;

use crate::source::DataSource;
use crate::DisplayError;

/// Token identifying one subscriber of a [`DataSourceCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
struct ChangeNotifier {
    queues: Vec<(SubscriptionId, Vec<CollectionChange>)>,
    next_id: u64,
}

impl ChangeNotifier {
    fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.queues.push((id, Vec::new()));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.queues.len();
        self.queues.retain(|(sub, _)| *sub != id);
        self.queues.len() != before
    }

    fn raise(&mut self, change: CollectionChange) {
        for (_, queue) in &mut self.queues {
            queue.push(change);
        }
    }

    fn drain(&mut self, id: SubscriptionId) -> Vec<CollectionChange> {
        self.queues
            .iter_mut()
            .find(|(sub, _)| *sub == id)
            .map(|(_, queue)| std::mem::take(queue))
            .unwrap_or_default()
    }
}

/// The data sources a display shows, in display order.
#[derive(Default)]
pub struct DataSourceCollection {
    sources: Vec<Box<dyn DataSource>>,
    notifier: ChangeNotifier,
}

impl DataSourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source. Fails if a source with the same id is present.
    pub fn add(&mut self, source: Box<dyn DataSource>) -> Result<DataSourceId, DisplayError> {
        let id = source.id();
        if self.contains(id) {
            return Err(DisplayError::AlreadyRegistered(id));
        }
        self.sources.push(source);
        self.notifier.raise(CollectionChange::Added { id });
        Ok(id)
    }

    /// Removes a source and hands it back.
    pub fn remove(&mut self, id: DataSourceId) -> Option<Box<dyn DataSource>> {
        let index = self.index_of(id)?;
        let source = self.sources.remove(index);
        self.notifier.raise(CollectionChange::Removed { id });
        Some(source)
    }

    /// Removes every source, raising one change per source.
    pub fn remove_all(&mut self) -> Vec<Box<dyn DataSource>> {
        let removed: Vec<Box<dyn DataSource>> = self.sources.drain(..).collect();
        for source in &removed {
            self.notifier.raise(CollectionChange::Removed { id: source.id() });
        }
        removed
    }

    pub fn get(&self, id: DataSourceId) -> Option<&dyn DataSource> {
        self.sources
            .iter()
            .find(|s| s.id() == id)
            .map(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: DataSourceId) -> Option<&mut (dyn DataSource + 'static)> {
        self.sources
            .iter_mut()
            .find(|s| s.id() == id)
            .map(|s| s.as_mut())
    }

    /// Source at `index` in display order.
    pub fn get_index(&self, index: usize) -> Option<&dyn DataSource> {
        self.sources.get(index).map(|s| s.as_ref())
    }

    pub fn contains(&self, id: DataSourceId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: DataSourceId) -> Option<usize> {
        self.sources.iter().position(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DataSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn DataSource + 'static)> {
        self.sources.iter_mut().map(|s| s.as_mut())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Moves a source to the end of the order, so it is updated last.
    pub fn raise_to_top(&mut self, id: DataSourceId) -> bool {
        let last = self.sources.len().saturating_sub(1);
        self.move_to(id, last)
    }

    /// Moves a source to the front of the order, so it is updated first.
    pub fn lower_to_bottom(&mut self, id: DataSourceId) -> bool {
        self.move_to(id, 0)
    }

    fn move_to(&mut self, id: DataSourceId, to: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        if from != to {
            let source = self.sources.remove(from);
            self.sources.insert(to, source);
            self.notifier.raise(CollectionChange::Moved { id, from, to });
        }
        true
    }

    /// Starts queueing changes for a new subscriber.
    pub fn subscribe(&mut self) -> SubscriptionId {
        self.notifier.subscribe()
    }

    /// Stops queueing changes for `id`. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Takes every change queued for `id` since its last drain.
    pub fn drain_changes(&mut self, id: SubscriptionId) -> Vec<CollectionChange> {
        self.notifier.drain(id)
    }
}

impl fmt::Debug for DataSourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceCollection")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("subscribers", &self.notifier.queues.len())
            .finish()
    }
}
