//! Name normalization and clash resolution.
//!
//! Hierarchical paths are flattened into CF-legal names with a [`Flattener`].
//! Names are then made unique within their scope:
//!  - variables, coordinate variables, groups, and the file attribute table share one scope,
//!  - the attributes of each object form a scope of their own,
//!  - dimension names form a scope of their own.
//!
//! Within a scope the first occurrence keeps its name and later ones get a `_k` suffix.

mod clash;

pub(crate) use clash::NameScope;

use std::collections::BTreeMap;

use crate::{
    model::{Attribute, Dimension, File, Pattern, Producer},
    normalize::NormalizeError,
};

/// Map `name` to a CF-legal name.
///
/// A leading digit is prefixed with `_`, and every character other than an ASCII alphanumeric or `_` becomes `_`.
///
/// ```rust
/// # use h5cf::naming::cf_name;
/// assert_eq!(cf_name("1st level"), "_1st_level");
/// assert_eq!(cf_name("g1/temp"), "g1_temp");
/// ```
#[must_use]
pub fn cf_name(name: &str) -> String {
    let mut cf = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        cf.push('_');
    }
    cf.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    cf
}

/// Flattens object paths into CF-legal names.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flattener {
    keep_leading_slash: bool,
}

impl Flattener {
    /// The flattener of `file`.
    ///
    /// The leading `/` of a path is kept, and so flattened to `_`, only for general files matching no pattern with [keep variable leading underscore](crate::config::Config#keep-variable-leading-underscore) enabled.
    #[must_use]
    pub fn for_file(file: &File) -> Self {
        Self {
            keep_leading_slash: file.producer == Producer::General
                && file.pattern == Pattern::Other
                && file.config.keep_var_leading_underscore(),
        }
    }

    /// Flatten `path`.
    #[must_use]
    pub fn flatten(&self, path: &str) -> String {
        if self.keep_leading_slash {
            cf_name(path)
        } else {
            cf_name(path.strip_prefix('/').unwrap_or(path))
        }
    }
}

/// Assign the final names of every object, attribute, and dimension of `file`.
///
/// # Errors
/// Returns a [`NormalizeError`] if COARDS naming is enabled and a coordinate variable is not one-dimensional.
pub fn assign_names(file: &mut File) -> Result<(), NormalizeError> {
    match file.producer {
        Producer::GpmL3Single | Producer::GpmL3Multi => adjust_gpm_l3_names(file),
        Producer::MeasuresOzone => adjust_short_names(file, false),
        Producer::Smap => adjust_short_names(file, true),
        _ => {}
    }
    flatten_names(file);
    resolve_object_clashes(file);
    if file.state.coards {
        rename_coards_dimensions(file)?;
    } else if file.producer == Producer::General && file.pattern == Pattern::LatLon2D {
        rename_lat_lon_2d_dimensions(file);
    }
    resolve_dimension_clashes(file);
    tracing::debug!(attribute_table = %file.attribute_table_name, "assigned names");
    Ok(())
}

/// Drop the outer grid group from the names of GPM level 3 variables.
fn adjust_gpm_l3_names(file: &mut File) {
    let single_group = file.groups.len() <= 1;
    for var in file.vars.values_mut() {
        let adjusted = if single_group {
            Some(var.name.as_str())
        } else {
            var.full_path
                .trim_start_matches('/')
                .split_once('/')
                .map(|(_, rest)| rest)
        };
        if let Some(adjusted) = adjusted.filter(|adjusted| !adjusted.is_empty()) {
            var.new_name = adjusted.to_string();
        }
    }
}

/// Name variables by their last path component.
///
/// With `cvars_only`, only existing coordinate variables are renamed.
fn adjust_short_names(file: &mut File, cvars_only: bool) {
    let cvars = file
        .cvars
        .values_mut()
        .filter(|cvar| cvar.kind.is_existing())
        .map(|cvar| &mut cvar.var);
    let vars = file.vars.values_mut().filter(|_| !cvars_only);
    for var in cvars.chain(vars) {
        var.new_name.clone_from(&var.name);
    }
}

fn flatten_attributes(attributes: &mut [Attribute]) {
    for attribute in attributes {
        attribute.new_name = cf_name(&attribute.name);
    }
}

fn flatten_dimensions(flattener: Flattener, dimensions: &mut [Dimension]) {
    for dimension in dimensions {
        dimension.new_name = flattener.flatten(&dimension.new_name);
    }
}

fn flatten_names(file: &mut File) {
    let flattener = Flattener::for_file(file);
    flatten_attributes(&mut file.root_attributes);
    for group in file.groups.values_mut() {
        group.new_name = flattener.flatten(&group.path);
        flatten_attributes(&mut group.attributes);
    }
    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for var in vars {
        var.new_name = flattener.flatten(&var.new_name);
        flatten_dimensions(flattener, &mut var.dimensions);
        flatten_attributes(&mut var.attributes);
    }
}

fn resolve_attribute_clashes(attributes: &mut [Attribute]) {
    NameScope::default().claim_all(attributes.iter_mut().map(|attribute| &mut attribute.new_name));
}

fn resolve_object_clashes(file: &mut File) {
    let mut scope = NameScope::default();
    scope.claim_all(file.cvars.values_mut().map(|cvar| &mut cvar.var.new_name));
    let (packed, plain): (Vec<_>, Vec<_>) =
        file.vars.values_mut().partition(|var| var.packed.is_some());
    scope.claim_all(packed.into_iter().map(|var| &mut var.new_name));
    scope.claim_all(plain.into_iter().map(|var| &mut var.new_name));
    scope.claim(&mut file.attribute_table_name);
    scope.claim_all(file.groups.values_mut().map(|group| &mut group.new_name));

    resolve_attribute_clashes(&mut file.root_attributes);
    for group in file.groups.values_mut() {
        resolve_attribute_clashes(&mut group.attributes);
    }
    for var in file.vars.values_mut() {
        resolve_attribute_clashes(&mut var.attributes);
    }
    for cvar in file.cvars.values_mut() {
        resolve_attribute_clashes(&mut cvar.var.attributes);
    }
}

/// Set the new name of every axis named `dim_name` to `new_name`.
fn rename_dimension(file: &mut File, dim_name: &str, new_name: &str) {
    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for dimension in vars.flat_map(|var| var.dimensions.iter_mut()) {
        if dimension.name == dim_name && dimension.new_name != new_name {
            dimension.new_name = new_name.to_string();
        }
    }
}

/// Give every dimension the name of its coordinate variable.
fn rename_coards_dimensions(file: &mut File) -> Result<(), NormalizeError> {
    let mut renames = Vec::with_capacity(file.cvars.len());
    for cvar in file.cvars.values() {
        let [dimension] = cvar.dimensions() else {
            return Err(normalize_err!(
                "the coordinate variable {} has rank {}, but COARDS naming requires rank 1",
                cvar.full_path,
                cvar.rank()
            ));
        };
        if dimension.new_name != cvar.new_name {
            renames.push((dimension.name.clone(), cvar.new_name.clone()));
        }
    }
    for (dim_name, new_name) in renames {
        rename_dimension(file, &dim_name, &new_name);
    }
    Ok(())
}

/// Give the dimensions of a 2-D latitude/longitude pair the names of the pair.
fn rename_lat_lon_2d_dimensions(file: &mut File) {
    let renames: Vec<(String, String)> = file
        .cvars
        .values()
        .filter(|cvar| cvar.kind.is_existing() && cvar.rank() == 2)
        .map(|cvar| (cvar.cf_dim_name.clone(), cvar.new_name.clone()))
        .collect();
    for (dim_name, new_name) in renames {
        rename_dimension(file, &dim_name, &new_name);
    }
}

/// Make dimension names unique.
///
/// Dimensions are collected from coordinate variables, then variables, and every axis with the same original name takes the same new name.
fn resolve_dimension_clashes(file: &mut File) {
    let mut order = Vec::new();
    let mut new_names: BTreeMap<String, String> = BTreeMap::new();
    let dimensions = file
        .cvars
        .values()
        .map(|cvar| &cvar.var)
        .chain(file.vars.values())
        .flat_map(|var| var.dimensions.iter());
    for dimension in dimensions {
        if !new_names.contains_key(&dimension.name) {
            order.push(dimension.name.clone());
            new_names.insert(dimension.name.clone(), dimension.new_name.clone());
        }
    }

    let mut resolved: Vec<String> = order
        .iter()
        .filter_map(|name| new_names.get(name).cloned())
        .collect();
    NameScope::default().claim_all(resolved.iter_mut());
    let new_names: BTreeMap<String, String> = order.into_iter().zip(resolved).collect();

    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for dimension in vars.flat_map(|var| var.dimensions.iter_mut()) {
        if let Some(new_name) = new_names.get(&dimension.name) {
            dimension.new_name.clone_from(new_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{CVar, CVarKind, Group, PackedDigits, Var},
    };

    fn var(path: &str, dims: &[(&str, u64)]) -> Var {
        let mut var = Var::new(path, Datatype::Float32);
        var.dimensions = dims
            .iter()
            .map(|(name, size)| {
                let mut dimension = Dimension::new(*size, false);
                dimension.set_name(name);
                dimension
            })
            .collect();
        var
    }

    fn dim_new_names(var: &Var) -> Vec<&str> {
        var.dimensions().iter().map(Dimension::new_name).collect()
    }

    #[test]
    fn naming_cf_name() {
        assert_eq!(cf_name(""), "");
        assert_eq!(cf_name("temp"), "temp");
        assert_eq!(cf_name("a-b.c d"), "a_b_c_d");
        assert_eq!(cf_name("2m_temperature"), "_2m_temperature");
    }

    #[test]
    fn naming_flattener_leading_slash() {
        let mut file = File::new(Config::default());
        assert_eq!(Flattener::for_file(&file).flatten("/g1/temp"), "g1_temp");
        file.config.set_keep_var_leading_underscore(true);
        assert_eq!(Flattener::for_file(&file).flatten("/g1/temp"), "_g1_temp");
        file.pattern = Pattern::DimensionScale;
        assert_eq!(Flattener::for_file(&file).flatten("/g1/temp"), "g1_temp");
    }

    #[test]
    fn naming_object_clash() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(var("/a/b", &[]));
        file.vars.insert(var("/a_b", &[]));
        file.vars.insert(var("/HDF5_GLOBAL", &[]));
        file.groups.insert(Group::new("/a"));
        assign_names(&mut file)?;
        let names: Vec<&str> = file.vars().values().map(Var::new_name).collect();
        assert_eq!(names, vec!["a_b", "a_b_1", "HDF5_GLOBAL"]);
        assert_eq!(file.attribute_table_name(), "HDF5_GLOBAL_1");
        assert_eq!(file.groups().values().next().map(Group::new_name), Some("a"));
        Ok(())
    }

    #[test]
    fn naming_attribute_clash() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        let mut temp = var("/temp", &[]);
        temp.attributes.push(Attribute::new_string("a b", "1"));
        temp.attributes.push(Attribute::new_string("a_b", "2"));
        file.vars.insert(temp);
        file.root_attributes.push(Attribute::new_string("a_b", "3"));
        assign_names(&mut file)?;
        let temp = file.var("/temp").unwrap();
        let names: Vec<&str> = temp.attributes().iter().map(Attribute::new_name).collect();
        assert_eq!(names, vec!["a_b", "a_b_1"]);
        assert_eq!(file.root_attributes()[0].new_name(), "a_b");
        Ok(())
    }

    #[test]
    fn naming_coards_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.state.coards = true;
        let key = file.vars.insert(var("/g/lat", &[("/g/lat", 3)]));
        file.promote(key, "/g/lat", CVarKind::Existing)?;
        file.cvars.insert(CVar::synthesize(
            "FakeDim0",
            2,
            false,
            Datatype::Int32,
            CVarKind::OtherMissing,
        ));
        file.vars
            .insert(var("/g/t", &[("FakeDim0", 2), ("/g/lat", 3)]));
        assign_names(&mut file)?;
        assert_eq!(dim_new_names(file.var("/g/t").unwrap()), vec!["FakeDim0", "g_lat"]);
        assert_eq!(dim_new_names(file.cvar("/g/lat").unwrap()), vec!["g_lat"]);
        Ok(())
    }

    #[test]
    fn naming_coards_rank_2_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.state.coards = true;
        let key = file
            .vars
            .insert(var("/lat", &[("FakeDim0", 3), ("FakeDim1", 4)]));
        file.promote(key, "FakeDim0", CVarKind::Existing)?;
        assert!(assign_names(&mut file).is_err());
        Ok(())
    }

    #[test]
    fn naming_lat_lon_2d_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::LatLon2D;
        let axes = [("FakeDim0", 3), ("FakeDim1", 4)];
        let lat = file.vars.insert(var("/lat", &axes));
        file.promote(lat, "FakeDim0", CVarKind::Existing)?;
        let lon = file.vars.insert(var("/lon", &axes));
        file.promote(lon, "FakeDim1", CVarKind::Existing)?;
        file.vars.insert(var("/t", &axes));
        assign_names(&mut file)?;
        assert_eq!(dim_new_names(file.var("/t").unwrap()), vec!["lat", "lon"]);
        Ok(())
    }

    #[test]
    fn naming_dimension_clash() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(var("/t", &[("/a/b", 2), ("/a_b", 3)]));
        file.vars.insert(var("/u", &[("/a_b", 3)]));
        assign_names(&mut file)?;
        assert_eq!(dim_new_names(file.var("/t").unwrap()), vec!["a_b", "a_b_1"]);
        assert_eq!(dim_new_names(file.var("/u").unwrap()), vec!["a_b_1"]);
        Ok(())
    }

    #[test]
    fn naming_gpm_l3_multi_grid() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL3Multi;
        file.groups.insert(Group::new("/Grids"));
        file.groups.insert(Group::new("/Grids/G1"));
        file.vars.insert(var("/Grids/G1/precip", &[]));
        assign_names(&mut file)?;
        assert_eq!(file.var("/Grids/G1/precip").map(Var::new_name), Some("G1_precip"));

        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL3Single;
        file.groups.insert(Group::new("/Grid"));
        file.vars.insert(var("/Grid/precip", &[]));
        assign_names(&mut file)?;
        assert_eq!(file.var("/Grid/precip").map(Var::new_name), Some("precip"));
        Ok(())
    }

    #[test]
    fn naming_short_names() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.producer = Producer::MeasuresOzone;
        let key = file.vars.insert(var("/Data/Latitude", &[("/Data/Latitude", 18)]));
        file.promote(key, "/Data/Latitude", CVarKind::Existing)?;
        file.vars.insert(var("/Data/O3", &[]));
        file.vars.insert(var("/Extra/O3", &[]));
        assign_names(&mut file)?;
        assert_eq!(file.cvar("/Data/Latitude").map(|cvar| cvar.new_name()), Some("Latitude"));
        assert_eq!(file.var("/Data/O3").map(Var::new_name), Some("O3"));
        assert_eq!(file.var("/Extra/O3").map(Var::new_name), Some("O3_1"));

        let mut file = File::new(Config::default());
        file.producer = Producer::Smap;
        let key = file.vars.insert(var("/Soil/cell_lat", &[("YDim", 4), ("XDim", 6)]));
        file.promote(key, "YDim", CVarKind::Existing)?;
        file.vars.insert(var("/Soil/moisture", &[("YDim", 4), ("XDim", 6)]));
        assign_names(&mut file)?;
        assert_eq!(file.cvar("/Soil/cell_lat").map(|cvar| cvar.new_name()), Some("cell_lat"));
        assert_eq!(file.var("/Soil/moisture").map(Var::new_name), Some("Soil_moisture"));
        Ok(())
    }

    #[test]
    fn naming_packed_fields_keep_their_names() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(var("/id_Time", &[]));
        let mut time = var("/id", &[]);
        time.name = "id_Time".to_string();
        time.new_name = "/id_Time".to_string();
        time.packed = Some(PackedDigits {
            source_datatype: Datatype::Int64,
            start_digit: 1,
            digit_count: 6,
        });
        file.vars.insert(time);
        assign_names(&mut file)?;
        let names: Vec<(&str, bool)> = file
            .vars()
            .values()
            .map(|var| (var.new_name(), var.packed().is_some()))
            .collect();
        assert_eq!(names, vec![("id_Time_1", false), ("id_Time", true)]);
        Ok(())
    }
}
