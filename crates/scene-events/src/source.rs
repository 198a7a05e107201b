//! Data Source Identity and Change Notifications
//!
//! A data source is identified by a [`DataSourceId`]. Collections of data
//! sources announce structural changes with [`CollectionChange`] values.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(pub Uuid);

impl DataSourceId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an identifier from a fixed value, for reproducible scenes.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ds_{}", self.0.simple())
    }
}

/// A structural change to a collection of data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectionChange {
    /// A data source was appended to the collection
    Added { id: DataSourceId },
    /// A data source left the collection
    Removed { id: DataSourceId },
    /// A data source changed position in the collection order
    Moved {
        id: DataSourceId,
        from: usize,
        to: usize,
    },
}

impl CollectionChange {
    /// The data source the change is about.
    pub fn data_source(&self) -> DataSourceId {
        match self {
            CollectionChange::Added { id }
            | CollectionChange::Removed { id }
            | CollectionChange::Moved { id, .. } => *id,
        }
    }
}
