//! The normalization pipeline.
//!
//! [`normalize`] runs every pass of a [`Normalizer`] in order and returns the normalized [`File`].
//! A [`Normalizer`] exposes the passes individually, so a caller can inspect the [`File`] between passes or abandon a run between two passes.
//!
//! The passes are:
//!  1. [walk](crate::walker::walk) the container,
//!  2. [classify](crate::dialect::classify) the producer and pattern, then remove objects that only describe the layout of the file,
//!  3. [resolve](crate::dimension::resolve) dimensions,
//!  4. [synthesize](crate::coordinate::synthesize) coordinate variables,
//!  5. [remove unsupported](crate::filter::remove_unsupported) objects,
//!  6. add [supplementary attributes](crate::supplement::add_supplementary_attributes),
//!  7. [assign names](crate::naming::assign_names),
//!  8. [update coordinates attributes](crate::coordinate::update_coordinates_attributes),
//!  9. clean up.

use derive_more::Display;
use thiserror::Error;

use crate::{
    config::Config,
    container::{ContainerError, ObjectPathError, ReadableContainerTraits},
    coordinate, dialect, dimension,
    filter::{self, FilterSummary},
    model::File,
    naming, supplement, walker,
};

const PLACEHOLDER_PREFIX: &str = "FakeDim";

/// The source location a [`NormalizeError`] was raised at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[display("{file}:{line}")]
pub struct Provenance {
    /// The source file.
    pub file: &'static str,
    /// The source line.
    pub line: u32,
}

/// A fatal normalization error.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A container error.
    #[error(transparent)]
    Container(#[from] ContainerError),
    /// An invalid object path.
    #[error(transparent)]
    InvalidPath(#[from] ObjectPathError),
    /// The container violates a structural invariant.
    #[error("{message} ({provenance})")]
    Internal {
        /// The error message.
        message: String,
        /// Where the error was raised.
        provenance: Provenance,
    },
}

/// Normalize the object graph of `container` into a [`File`].
///
/// `config` is copied into the run, so later changes to it do not affect the result.
/// Pass [`&global_config()`](crate::config::global_config) to normalize with the global configuration.
///
/// # Errors
/// Returns a [`NormalizeError`] if the container cannot be read or violates a structural invariant.
pub fn normalize(
    container: &dyn ReadableContainerTraits,
    config: &Config,
) -> Result<File, NormalizeError> {
    Normalizer::new(container, config).run()
}

/// A normalization run over a container.
///
/// Each pass must be called once and in order, see the [module documentation](self).
pub struct Normalizer<'a> {
    container: &'a dyn ReadableContainerTraits,
    file: File,
    summary: FilterSummary,
}

impl<'a> Normalizer<'a> {
    /// Create a new normalizer of `container` with a snapshot of `config`.
    #[must_use]
    pub fn new(container: &'a dyn ReadableContainerTraits, config: &Config) -> Self {
        Self {
            container,
            file: File::new(config.clone()),
            summary: FilterSummary::default(),
        }
    }

    /// The file as normalized by the passes run so far.
    #[must_use]
    pub const fn file(&self) -> &File {
        &self.file
    }

    /// Run every remaining pass and return the normalized file.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if a pass fails.
    pub fn run(mut self) -> Result<File, NormalizeError> {
        self.walk()?;
        self.classify();
        self.resolve_dimensions()?;
        self.synthesize_coordinates()?;
        self.remove_unsupported()?;
        self.add_supplementary_attributes();
        self.assign_names()?;
        self.update_coordinates_attributes()?;
        self.cleanup();
        Ok(self.into_file())
    }

    /// Walk the container.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if the container cannot be read.
    pub fn walk(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("walk").entered();
        walker::walk(self.container, &mut self.file)?;
        tracing::debug!(
            groups = self.file.groups.len(),
            vars = self.file.vars.len(),
            "walked container"
        );
        Ok(())
    }

    /// Classify the producer and pattern, and remove objects that only describe the layout of the file.
    pub fn classify(&mut self) {
        let _span = tracing::info_span!("classify").entered();
        dialect::classify(&mut self.file);
        dialect::remove_unneeded_objects(&mut self.file);
    }

    /// Name every dimension.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if the dimensions are inconsistent.
    pub fn resolve_dimensions(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("resolve_dimensions").entered();
        dimension::resolve(self.container, &mut self.file)
    }

    /// Give every dimension a coordinate variable.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if coordinate variables cannot be synthesized.
    pub fn synthesize_coordinates(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("synthesize_coordinates").entered();
        coordinate::synthesize(&mut self.file)
    }

    /// Remove objects that cannot be represented.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if an unsupported coordinate variable cannot be replaced.
    pub fn remove_unsupported(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("remove_unsupported").entered();
        self.summary = filter::remove_unsupported(&mut self.file)?;
        Ok(())
    }

    /// Add supplementary attributes.
    pub fn add_supplementary_attributes(&mut self) {
        let _span = tracing::info_span!("add_supplementary_attributes").entered();
        supplement::add_supplementary_attributes(&mut self.file);
    }

    /// Flatten names and resolve clashes.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if a COARDS file has a coordinate variable that is not one-dimensional.
    pub fn assign_names(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("assign_names").entered();
        naming::assign_names(&mut self.file)
    }

    /// Rebuild the `coordinates` attributes.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if the GPM level 1 coordinate variables do not pair up.
    pub fn update_coordinates_attributes(&mut self) -> Result<(), NormalizeError> {
        let _span = tracing::info_span!("update_coordinates_attributes").entered();
        coordinate::update_coordinates_attributes(&mut self.file)
    }

    /// Remove unreferenced placeholder coordinate variables, restore shadowed names, and qualify `coordinates` and `bounds` attributes.
    pub fn cleanup(&mut self) {
        let _span = tracing::info_span!("cleanup").entered();
        if self.summary.removed_for_datatype() + self.summary.removed_for_long_string() > 0 {
            remove_unreferenced_placeholders(&mut self.file);
        }
        if self.file.state.has_nc4_non_coord {
            strip_nc4_non_coord_prefix(&mut self.file);
        }
        coordinate::add_path_to_coordinates(&mut self.file);
        coordinate::update_bounds_attributes(&mut self.file);
        if !self.file.config.include_attributes() {
            remove_attributes(&mut self.file);
        }
    }

    /// Consume the normalizer and return the file.
    #[must_use]
    pub fn into_file(self) -> File {
        self.file
    }
}

/// Remove the placeholder coordinate variables whose dimension is no longer used by a variable.
fn remove_unreferenced_placeholders(file: &mut File) {
    let referenced: Vec<String> = file
        .vars
        .values()
        .chain(file.cvars.values().map(|cvar| &cvar.var).filter(|var| var.rank() > 1))
        .flat_map(|var| var.dimensions.iter().map(|dim| dim.new_name().to_string()))
        .collect();
    let removed = file.cvars.take_where(|cvar| {
        cvar.new_name.starts_with(PLACEHOLDER_PREFIX) && !referenced.contains(&cvar.new_name)
    });
    for cvar in removed {
        tracing::debug!(cvar = %cvar.new_name, "remove unreferenced placeholder coordinate variable");
        file.dimensions.remove(&cvar.cf_dim_name);
    }
}

fn strip_nc4_non_coord_prefix(file: &mut File) {
    for var in file
        .vars
        .values_mut()
        .filter(|var| var.name.starts_with(dialect::NC4_NON_COORD_PREFIX))
    {
        var.new_name = var.new_name.replacen(dialect::NC4_NON_COORD_PREFIX, "", 1);
    }
}

fn remove_attributes(file: &mut File) {
    file.root_attributes.clear();
    for group in file.groups.values_mut() {
        group.attributes.clear();
    }
    for var in file.vars.values_mut() {
        var.attributes.clear();
    }
    for cvar in file.cvars.values_mut() {
        cvar.attributes.clear();
    }
}
