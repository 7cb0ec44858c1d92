//! A metadata normalization engine mapping hierarchical HDF5-style containers to a flat CF variable model.
//!
//! A container holds nested groups, multidimensional datasets, typed attributes, links, named datatypes, and dimension scales.
//! `h5cf` walks the container once and produces a [`File`](model::File) in which:
//!  - every dataset axis has a stable dimension name,
//!  - every dimension has exactly one coordinate variable, promoted from an existing dataset or synthesized,
//!  - every variable, dimension, and attribute has a flat, clash-free, CF-legal name,
//!  - objects that cannot be represented are dropped and optionally described in a diagnostics transcript.
//!
//! Producer conventions (GPM, Aquarius, OBPG) are recognized by [producer plugins](plugin), and general products are classified by their structural [pattern](model::Pattern).
//!
//! Bulk array values are never read. Synthesized coordinate variables carry a [`CoordinateSource`](model::CoordinateSource) describing how a value reader derives their values.
//!
//! ## Example
//! ```rust
//! # use h5cf::container::{MemoryContainerBuilder, MemoryDataset};
//! # use h5cf::datatype::Datatype;
//! let container = MemoryContainerBuilder::new()
//!     .dataset("/lat", MemoryDataset::dimension_scale(Datatype::Float32, 10))?
//!     .dataset("/lon", MemoryDataset::dimension_scale(Datatype::Float32, 20))?
//!     .dataset(
//!         "/temp",
//!         MemoryDataset::simple(Datatype::Float32, &[10, 20])
//!             .with_dimension_scales(&["/lat", "/lon"])?,
//!     )?
//!     .build();
//!
//! let file = h5cf::normalize::normalize(&container, &h5cf::config::Config::default())?;
//! let temp = file.var("/temp").unwrap();
//! assert_eq!(temp.new_name(), "temp");
//! assert_eq!(temp.dimensions()[0].new_name(), "lat");
//! assert_eq!(file.cvars().len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! `h5cf` has no optional features.
//!
//! ## Logging
//! Each pass of a normalization run is wrapped in a [`tracing`] span, and decisions are logged at the `debug` and `trace` levels.
//! Container calls can be logged with the [`UsageLogContainerAdapter`](container::UsageLogContainerAdapter).
//!
//! ## Licence
//! `h5cf` is licensed under either of
//!  - the Apache License, Version 2.0 [LICENSE-APACHE](https://docs.rs/crate/h5cf/latest/source/LICENCE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license [LICENSE-MIT](https://docs.rs/crate/h5cf/latest/source/LICENCE-MIT) or <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

/// Create a [`NormalizeError::Internal`](normalize::NormalizeError::Internal) with a formatted message and the source location.
macro_rules! normalize_err {
    ($($arg:tt)*) => {
        $crate::normalize::NormalizeError::Internal {
            message: format!($($arg)*),
            provenance: $crate::normalize::Provenance {
                file: file!(),
                line: line!(),
            },
        }
    };
}

pub mod config;
pub mod container;
pub mod coordinate;
pub mod datatype;
pub mod dialect;
pub mod dimension;
pub mod filter;
pub mod model;
pub mod naming;
pub mod normalize;
pub mod plugin;
pub mod supplement;
pub mod walker;
