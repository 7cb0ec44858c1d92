//! Producer dialect plugins.
//!
//! A [`ProducerPlugin`] recognizes the files written by one producer from their root and group attributes and object names.
//!
//! Plugins are registered at compile time using the [inventory] crate.
//! At runtime, the registered plugins are tried in ascending [priority](ProducerPlugin::priority) order and the first match selects the [`Producer`].
//! Files matched by no plugin are [`Producer::General`].
//!
//! ### Registering a plugin
//! ```rust
//! # use h5cf::{model::{File, Producer}, plugin::ProducerPlugin};
//! fn is_my_obpg_variant(file: &File) -> bool {
//!     file.root_string_attribute("processing_level").as_deref() == Some("L3 Binned Custom")
//! }
//!
//! inventory::submit! {
//!     ProducerPlugin::new("my_obpg_variant", 1000, is_my_obpg_variant, Producer::ObpgL3)
//! }
//! ```

use itertools::Itertools;

use crate::model::{File, Producer};

/// A producer plugin.
pub struct ProducerPlugin {
    /// The identifier of the plugin.
    identifier: &'static str,
    /// The priority, lower values are tried first.
    priority: u32,
    /// Tests if a walked file was written by this producer.
    match_fn: fn(file: &File) -> bool,
    /// The producer of matched files.
    producer: Producer,
}

inventory::collect!(ProducerPlugin);

impl ProducerPlugin {
    /// Create a new plugin for registration.
    pub const fn new(
        identifier: &'static str,
        priority: u32,
        match_fn: fn(file: &File) -> bool,
        producer: Producer,
    ) -> Self {
        Self {
            identifier,
            priority,
            match_fn,
            producer,
        }
    }

    /// Returns true if `file` was written by this producer.
    #[must_use]
    pub fn is_match(&self, file: &File) -> bool {
        (self.match_fn)(file)
    }

    /// Returns the identifier of the plugin.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// Returns the priority of the plugin.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns the producer of matched files.
    #[must_use]
    pub const fn producer(&self) -> Producer {
        self.producer
    }
}

/// The registered producer plugins in the order they are tried.
pub fn producer_plugins() -> impl Iterator<Item = &'static ProducerPlugin> {
    inventory::iter::<ProducerPlugin>
        .into_iter()
        .sorted_by_key(|plugin| (plugin.priority, plugin.identifier))
}

/// Find the first registered plugin matching `file`.
#[must_use]
pub fn match_producer(file: &File) -> Option<&'static ProducerPlugin> {
    producer_plugins().find(|plugin| plugin.is_match(file))
}
