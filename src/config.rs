//! h5cf global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the h5cf crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
/// A normalization run takes a snapshot of the global configuration when it starts, so changes made while a run is in progress only affect later runs.
///
/// # Diagnostics Configuration Options
///
/// ## Emit Diagnostics
/// > default: [`false`]
///
/// If enabled, every ignored link, named datatype, attribute, and variable is described in the diagnostics transcript returned by [`File::diagnostics`](crate::model::File::diagnostics).
///
/// # Attribute Configuration Options
///
/// ## Strip netCDF Housekeeping
/// > default: [`true`]
///
/// If enabled, attributes written by the netCDF-4 library for its own bookkeeping (`_Netcdf4Dimid`, `_Netcdf4Coordinates`, `_NCProperties`, `_nc3_strict`) and the dimension scale `CLASS`/`NAME` attributes of coordinate variables are removed.
///
/// ## Include Attributes
/// > default: [`true`]
///
/// If disabled, every attribute is dropped from the normalized file once the passes that read attributes have run, so only the variable structure remains.
///
/// ## Add Supplementary Attributes
/// > default: [`true`]
///
/// If enabled, the `origname` and `fullnamepath` attributes are added to variables and promoted coordinate variables, and `fullnamepath` is added to groups with attributes.
/// The CF attributes implied by producer conventions (GPM, Aquarius) are added regardless.
///
/// ## Omit Zero Storage Full Name Path
/// > default: [`false`]
///
/// If enabled, the `fullnamepath` attribute is not added to variables with no allocated storage.
///
/// # Naming Configuration Options
///
/// ## Keep Variable Leading Underscore
/// > default: [`false`]
///
/// If enabled, files that match no structural pattern keep the leading `/` of variable paths when flattening, so every flattened name starts with `_`.
///
/// ## Force Flatten Coordinates
/// > default: [`false`]
///
/// If enabled, `coordinates` attributes are always flattened in place rather than rebuilt from the coordinate variables of a variable's dimensions.
///
/// ## Coordinates Add Path
/// > default: [`true`]
///
/// If enabled, relative paths in `coordinates` attributes that were not rebuilt are qualified by the group of their variable and flattened.
/// A name without `/` refers to the same group, and each leading `../` climbs one group.
///
/// # Datatype Configuration Options
///
/// ## Support 64-bit Integers
/// > default: [`false`]
///
/// If enabled, `Int64` and `UInt64` variables and attributes are retained.
///
/// ## Drop Long String
/// > default: [`false`]
///
/// If enabled, string variables and string attributes with an element longer than the netCDF string limit of 32767 bytes are removed and listed in the diagnostics.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    emit_diagnostics: bool,
    strip_netcdf_housekeeping: bool,
    include_attributes: bool,
    add_supplementary_attributes: bool,
    omit_zero_storage_fullnamepath: bool,
    keep_var_leading_underscore: bool,
    force_flatten_coordinates: bool,
    coordinates_add_path: bool,
    support_int64: bool,
    drop_long_string: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            emit_diagnostics: false,
            strip_netcdf_housekeeping: true,
            include_attributes: true,
            add_supplementary_attributes: true,
            omit_zero_storage_fullnamepath: false,
            keep_var_leading_underscore: false,
            force_flatten_coordinates: false,
            coordinates_add_path: true,
            support_int64: false,
            drop_long_string: false,
        }
    }
}

impl Config {
    /// Get the [emit diagnostics](#emit-diagnostics) configuration.
    #[must_use]
    pub fn emit_diagnostics(&self) -> bool {
        self.emit_diagnostics
    }

    /// Set the [emit diagnostics](#emit-diagnostics) configuration.
    pub fn set_emit_diagnostics(&mut self, emit_diagnostics: bool) -> &mut Self {
        self.emit_diagnostics = emit_diagnostics;
        self
    }

    /// Get the [strip netCDF housekeeping](#strip-netcdf-housekeeping) configuration.
    #[must_use]
    pub fn strip_netcdf_housekeeping(&self) -> bool {
        self.strip_netcdf_housekeeping
    }

    /// Set the [strip netCDF housekeeping](#strip-netcdf-housekeeping) configuration.
    pub fn set_strip_netcdf_housekeeping(&mut self, strip_netcdf_housekeeping: bool) -> &mut Self {
        self.strip_netcdf_housekeeping = strip_netcdf_housekeeping;
        self
    }

    /// Get the [include attributes](#include-attributes) configuration.
    #[must_use]
    pub fn include_attributes(&self) -> bool {
        self.include_attributes
    }

    /// Set the [include attributes](#include-attributes) configuration.
    pub fn set_include_attributes(&mut self, include_attributes: bool) -> &mut Self {
        self.include_attributes = include_attributes;
        self
    }

    /// Get the [add supplementary attributes](#add-supplementary-attributes) configuration.
    #[must_use]
    pub fn add_supplementary_attributes(&self) -> bool {
        self.add_supplementary_attributes
    }

    /// Set the [add supplementary attributes](#add-supplementary-attributes) configuration.
    pub fn set_add_supplementary_attributes(&mut self, add: bool) -> &mut Self {
        self.add_supplementary_attributes = add;
        self
    }

    /// Get the [omit zero storage full name path](#omit-zero-storage-full-name-path) configuration.
    #[must_use]
    pub fn omit_zero_storage_fullnamepath(&self) -> bool {
        self.omit_zero_storage_fullnamepath
    }

    /// Set the [omit zero storage full name path](#omit-zero-storage-full-name-path) configuration.
    pub fn set_omit_zero_storage_fullnamepath(&mut self, omit: bool) -> &mut Self {
        self.omit_zero_storage_fullnamepath = omit;
        self
    }

    /// Get the [keep variable leading underscore](#keep-variable-leading-underscore) configuration.
    #[must_use]
    pub fn keep_var_leading_underscore(&self) -> bool {
        self.keep_var_leading_underscore
    }

    /// Set the [keep variable leading underscore](#keep-variable-leading-underscore) configuration.
    pub fn set_keep_var_leading_underscore(&mut self, keep: bool) -> &mut Self {
        self.keep_var_leading_underscore = keep;
        self
    }

    /// Get the [force flatten coordinates](#force-flatten-coordinates) configuration.
    #[must_use]
    pub fn force_flatten_coordinates(&self) -> bool {
        self.force_flatten_coordinates
    }

    /// Set the [force flatten coordinates](#force-flatten-coordinates) configuration.
    pub fn set_force_flatten_coordinates(&mut self, force: bool) -> &mut Self {
        self.force_flatten_coordinates = force;
        self
    }

    /// Get the [coordinates add path](#coordinates-add-path) configuration.
    #[must_use]
    pub fn coordinates_add_path(&self) -> bool {
        self.coordinates_add_path
    }

    /// Set the [coordinates add path](#coordinates-add-path) configuration.
    pub fn set_coordinates_add_path(&mut self, add_path: bool) -> &mut Self {
        self.coordinates_add_path = add_path;
        self
    }

    /// Get the [support 64-bit integers](#support-64-bit-integers) configuration.
    #[must_use]
    pub fn support_int64(&self) -> bool {
        self.support_int64
    }

    /// Set the [support 64-bit integers](#support-64-bit-integers) configuration.
    pub fn set_support_int64(&mut self, support_int64: bool) -> &mut Self {
        self.support_int64 = support_int64;
        self
    }

    /// Get the [drop long string](#drop-long-string) configuration.
    #[must_use]
    pub fn drop_long_string(&self) -> bool {
        self.drop_long_string
    }

    /// Set the [drop long string](#drop-long-string) configuration.
    pub fn set_drop_long_string(&mut self, drop_long_string: bool) -> &mut Self {
        self.drop_long_string = drop_long_string;
        self
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global h5cf configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global h5cf configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
