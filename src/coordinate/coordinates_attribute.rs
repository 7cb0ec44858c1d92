//! The `coordinates` and `bounds` attributes.
//!
//! Once names are final, the `coordinates` attribute of a variable must refer to flattened coordinate variable names.
//! Depending on the dialect, the attribute is flattened in place, rebuilt from the coordinate variables of the variable's axes, or left for [`add_path_to_coordinates`].

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{
    dialect::{coordinate_tokens, is_latitude_name, is_longitude_name},
    dimension::{SMAP_LATITUDE_SUFFIX, SMAP_LONGITUDE_SUFFIX},
    model::{Attribute, CVarKind, File, Pattern, Producer, Var},
    naming::Flattener,
    normalize::NormalizeError,
};

use super::{DEGREES_EAST, DEGREES_NORTH};

const COORDINATES: &str = "coordinates";
const BOUNDS: &str = "bounds";
const UNITS: &str = "units";
const LEVEL: &str = "level";

/// Add `units` to synthesized coordinate variables, and make every `coordinates` attribute refer to flattened names.
///
/// SeaWiFS level 2 swaths keep their `coordinates` attributes as written.
///
/// # Errors
/// Returns a [`NormalizeError`] if two GPM level 1 latitude/longitude coordinate variables share a CF dimension.
pub fn update_coordinates_attributes(file: &mut File) -> Result<(), NormalizeError> {
    add_synthesized_units(file);
    let flattener = Flattener::for_file(file);
    if file.producer == Producer::SeaWifsL2 {
        return Ok(());
    }
    if file.producer == Producer::GpmL1 {
        return gpm_l1_coordinates(file);
    }
    if file.producer == Producer::General && file.pattern == Pattern::CoordinatesAttribute {
        pair_coordinates(file, flattener);
        return Ok(());
    }
    flatten_keep_groups(file, flattener);
    if file.state.coards {
        return Ok(());
    }

    let smap = file.producer == Producer::Smap;
    for cvar in file.cvars.values_mut() {
        if !cvar.kind.is_existing() || cvar.rank() != 2 {
            continue;
        }
        if is_latitude_name(&cvar.name) || (smap && cvar.name.ends_with(SMAP_LATITUDE_SUFFIX)) {
            cvar.rewrite_string_attribute(UNITS, DEGREES_NORTH);
        } else if is_longitude_name(&cvar.name)
            || (smap && cvar.name.ends_with(SMAP_LONGITUDE_SUFFIX))
        {
            cvar.rewrite_string_attribute(UNITS, DEGREES_EAST);
        }
    }

    let has_2d_geolocation = (file.producer == Producer::General
        && file.pattern == Pattern::DimensionScale)
        || file.cvars.values().any(|cvar| cvar.rank() == 2);
    if !has_2d_geolocation {
        return Ok(());
    }
    let force = file.config.force_flatten_coordinates();
    let rebuilt: Vec<_> = file
        .vars
        .iter()
        .filter(|(_, var)| !(force && var.has_attribute(COORDINATES)) && var.rank() >= 2)
        .filter(|(_, var)| {
            !file.state.keep_coordinates_groups.contains(var.group_path())
                && uses_2d_cvars(file, var)
        })
        .map(|(key, var)| (key, rebuild_coordinates(file, var)))
        .collect();
    for var in file.vars.values_mut() {
        if force && var.has_attribute(COORDINATES) {
            flatten_coordinates(var, flattener);
        }
    }
    for (key, coordinates) in rebuilt {
        let Some(var) = file.vars.get_mut(key) else {
            continue;
        };
        var.remove_attribute(COORDINATES);
        if !coordinates.is_empty() {
            var.attributes.push(Attribute::new_string(COORDINATES, &coordinates));
        }
        var.coordinates_needs_path = false;
    }
    Ok(())
}

fn add_synthesized_units(file: &mut File) {
    for cvar in file.cvars.values_mut() {
        let units = match cvar.kind {
            CVarKind::OtherMissing => LEVEL,
            CVarKind::LatitudeMissing => DEGREES_NORTH,
            CVarKind::LongitudeMissing => DEGREES_EAST,
            _ => continue,
        };
        cvar.set_attribute(Attribute::new_string(UNITS, units));
    }
}

/// Flatten the paths of the `coordinates` attribute of `var` in place.
fn flatten_coordinates(var: &mut Var, flattener: Flattener) {
    let Some(value) = var.string_attribute(COORDINATES) else {
        return;
    };
    if !value.contains('/') {
        return;
    }
    let flattened = value
        .split(' ')
        .map(|token| flattener.flatten(token))
        .join(" ");
    if let Some(attribute) = var.attribute_mut(COORDINATES) {
        attribute.set_string(&flattened);
    }
    var.coordinates_needs_path = false;
}

fn flatten_keep_groups(file: &mut File, flattener: Flattener) {
    let keep = &file.state.keep_coordinates_groups;
    for var in file
        .vars
        .values_mut()
        .filter(|var| keep.contains(var.group_path()))
    {
        flatten_coordinates(var, flattener);
    }
}

/// Returns true if both axes of a 2-D coordinate variable appear once, in order, among the axes of `var`.
fn uses_2d_cvars(file: &File, var: &Var) -> bool {
    let position = |name: &str| {
        let mut positions = var
            .dimensions()
            .iter()
            .positions(|dimension| dimension.name() == name);
        match (positions.next(), positions.next()) {
            (Some(position), None) => Some(position),
            _ => None,
        }
    };
    file.cvars.values().any(|cvar| match cvar.dimensions() {
        [dim0, dim1] => matches!(
            (position(dim0.name()), position(dim1.name())),
            (Some(i0), Some(i1)) if i0 < i1
        ),
        _ => false,
    })
}

/// The coordinate variables of the axes of `var`, in axis order.
fn rebuild_coordinates(file: &File, var: &Var) -> String {
    var.dimensions()
        .iter()
        .flat_map(|dimension| {
            file.cvars
                .values()
                .filter(move |cvar| cvar.cf_dim_name == dimension.name())
                .map(|cvar| cvar.new_name())
        })
        .join(" ")
}

/// Split a group-qualified CF dimension name into its group path (with the trailing `/`) and dimension name.
fn split_qualified(cf_dim_name: &str) -> (&str, &str) {
    cf_dim_name
        .rfind('/')
        .map_or(("", cf_dim_name), |index| {
            (&cf_dim_name[..=index], &cf_dim_name[index + 1..])
        })
}

/// Point the `coordinates` attribute of every GPM level 1 swath variable at the latitude and longitude of its swath.
fn gpm_l1_coordinates(file: &mut File) -> Result<(), NormalizeError> {
    let mut geolocation: BTreeMap<&str, &str> = BTreeMap::new();
    let mut geolocation_dims = BTreeSet::new();
    for cvar in file.cvars.values().filter(|cvar| cvar.rank() == 2) {
        if geolocation
            .insert(cvar.cf_dim_name(), cvar.new_name())
            .is_some()
        {
            return Err(normalize_err!(
                "two GPM geolocation coordinate variables share the dimension {}",
                cvar.cf_dim_name()
            ));
        }
        geolocation_dims.extend(cvar.dimensions().iter().map(|dimension| dimension.name()));
    }

    let mut updates = Vec::new();
    for (key, var) in file.vars.iter().filter(|(_, var)| var.rank() >= 2) {
        let geolocated_axes = var
            .dimensions()
            .iter()
            .filter(|dimension| geolocation_dims.contains(dimension.name()))
            .count();
        if geolocated_axes < 2 {
            continue;
        }
        let matches = |in_group: &dyn Fn(&str) -> bool| {
            geolocation
                .iter()
                .filter_map(|(cf_dim_name, new_name)| {
                    let (group, dim_name) = split_qualified(cf_dim_name);
                    (in_group(group)
                        && var
                            .dimensions()
                            .iter()
                            .any(|dimension| dimension.name() == dim_name))
                    .then_some((dim_name, *new_name))
                })
                .collect::<Vec<_>>()
        };
        let mut matched = matches(&|group: &str| group == var.group_path());
        if matched.len() != 2 {
            matched = matches(&|group: &str| var.full_path().contains(group));
        }
        if matched.len() != 2 {
            continue;
        }
        let mut names: Vec<&str> = matched.iter().map(|(_, new_name)| *new_name).collect();
        if var.rank() > 2 {
            names.extend(
                var.dimensions()
                    .iter()
                    .filter(|dimension| {
                        !matched
                            .iter()
                            .any(|(dim_name, _)| *dim_name == dimension.name())
                    })
                    .map(|dimension| dimension.new_name()),
            );
        }
        updates.push((key, names.join(" ")));
    }

    for (key, coordinates) in updates {
        let Some(var) = file.vars.get_mut(key) else {
            continue;
        };
        var.set_attribute(Attribute::new_string(COORDINATES, &coordinates));
        var.coordinates_needs_path = false;
    }
    Ok(())
}

/// Rewrite `coordinates` attributes naming a latitude/longitude pair of the coordinates attribute pattern.
fn pair_coordinates(file: &mut File, flattener: Flattener) {
    let pairs = file.state.pairs.clone();
    for var in file
        .vars
        .values_mut()
        .filter(|var| var.rank() >= 2 && var.has_attribute(COORDINATES))
    {
        let mut tokens = coordinate_tokens(var);
        if tokens.first().is_some_and(|token| !token.starts_with('/')) {
            for token in tokens.iter_mut().filter(|token| token.contains('/')) {
                token.insert(0, '/');
            }
        }

        let latitudes: Vec<usize> = tokens
            .iter()
            .filter_map(|token| pairs.iter().position(|pair| &pair.latitude == token))
            .collect();
        let longitudes: Vec<usize> = tokens
            .iter()
            .filter_map(|token| pairs.iter().position(|pair| &pair.longitude == token))
            .collect();
        if let ([latitude], [longitude]) = (latitudes.as_slice(), longitudes.as_slice()) {
            if latitude == longitude {
                flatten_coordinates(var, flattener);
                continue;
            }
        }

        let group = var.group_path().trim_end_matches('/');
        let in_group = |path: &str| {
            path.rsplit_once('/')
                .is_some_and(|(parent, name)| parent == group && tokens.iter().any(|token| token == name))
        };
        let same_group = pairs
            .iter()
            .any(|pair| in_group(&pair.latitude) || in_group(&pair.longitude));
        if same_group {
            let prefix = flattener.flatten(var.group_path());
            let coordinates = tokens
                .iter()
                .map(|token| format!("{prefix}{token}"))
                .join(" ");
            if let Some(attribute) = var.attribute_mut(COORDINATES) {
                attribute.set_string(&coordinates);
            }
            var.coordinates_needs_path = false;
        }
    }
}

/// Resolve a path relative to the group of the variable at `var_path`.
///
/// A token without `/` names an object in the same group.
/// A token starting with `../` climbs one group per repetition.
fn resolve_relative(token: &str, var_path: &str) -> String {
    let groups: Vec<&str> = var_path
        .trim_start_matches('/')
        .split('/')
        .collect::<Vec<_>>()
        .split_last()
        .map_or_else(Vec::new, |(_, groups)| groups.to_vec());
    if groups.is_empty() {
        return token.to_string();
    }
    if !token.contains('/') {
        return format!("{}/{token}", groups.join("/"));
    }
    let mut suffix = token;
    let mut climbed = 0;
    while let Some(rest) = suffix.strip_prefix("../") {
        suffix = rest;
        climbed += 1;
    }
    if climbed == 0 || climbed > groups.len() {
        return token.to_string();
    }
    let kept = &groups[..groups.len() - climbed];
    if kept.is_empty() {
        format!("/{suffix}")
    } else {
        format!("/{}/{suffix}", kept.join("/"))
    }
}

/// Qualify and flatten the relative paths of the `coordinates` attributes not already rewritten.
///
/// GPM level 3 files are skipped, their coordinate variables are not qualified by group.
/// A variable of a keep group whose `coordinates` hold no path is qualified here too, since only paths are flattened in place.
pub(crate) fn add_path_to_coordinates(file: &mut File) {
    if file.producer.is_gpm_l3() || !file.config.coordinates_add_path() {
        return;
    }
    let flattener = Flattener::for_file(file);
    for var in file
        .vars
        .values_mut()
        .filter(|var| var.coordinates_needs_path)
    {
        let Some(value) = var.string_attribute(COORDINATES) else {
            continue;
        };
        let qualified = value
            .split(' ')
            .filter(|token| !token.is_empty())
            .map(|token| flattener.flatten(&resolve_relative(token, &var.full_path)))
            .join(" ");
        if let Some(attribute) = var.attribute_mut(COORDINATES) {
            attribute.set_string(&qualified);
        }
    }
}

/// Qualify and flatten the path of every `bounds` attribute.
pub(crate) fn update_bounds_attributes(file: &mut File) {
    let flattener = Flattener::for_file(file);
    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for var in vars {
        let Some(value) = var.string_attribute(BOUNDS) else {
            continue;
        };
        let bounds = flattener.flatten(&resolve_relative(&value, &var.full_path));
        if let Some(attribute) = var.attribute_mut(BOUNDS) {
            attribute.set_string(&bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{CVar, Dimension, LatLonPair},
        naming::assign_names,
    };

    fn var(path: &str, dims: &[(&str, u64)], coordinates: Option<&str>) -> Var {
        let mut var = Var::new(path, Datatype::Float32);
        var.dimensions = dims
            .iter()
            .map(|(name, size)| {
                let mut dimension = Dimension::new(*size, false);
                dimension.set_name(name);
                dimension
            })
            .collect();
        if let Some(coordinates) = coordinates {
            var.attributes
                .push(Attribute::new_string(COORDINATES, coordinates));
        }
        var
    }

    fn coordinates(file: &File, path: &str) -> Option<String> {
        file.var(path)?.string_attribute(COORDINATES)
    }

    #[test]
    fn coordinates_resolve_relative() {
        assert_eq!(resolve_relative("lat", "/temp"), "lat");
        assert_eq!(resolve_relative("lat", "/g1/g2/temp"), "g1/g2/lat");
        assert_eq!(resolve_relative("../lat", "/g1/g2/temp"), "/g1/lat");
        assert_eq!(resolve_relative("../../lat", "/g1/g2/temp"), "/lat");
        assert_eq!(resolve_relative("../../../lat", "/g1/g2/temp"), "../../../lat");
        assert_eq!(resolve_relative("/g3/lat", "/g1/temp"), "/g3/lat");
    }

    #[test]
    fn coordinates_synthesized_units() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.state.coards = true;
        for (name, kind) in [
            ("nlat", CVarKind::LatitudeMissing),
            ("nlon", CVarKind::LongitudeMissing),
            ("FakeDim0", CVarKind::OtherMissing),
        ] {
            file.cvars
                .insert(CVar::synthesize(name, 2, false, Datatype::Float32, kind));
        }
        update_coordinates_attributes(&mut file)?;
        let units = |name: &str| file.cvar(name).and_then(|cvar| cvar.units());
        assert_eq!(units("nlat").as_deref(), Some(DEGREES_NORTH));
        assert_eq!(units("nlon").as_deref(), Some(DEGREES_EAST));
        assert_eq!(units("FakeDim0").as_deref(), Some("level"));
        Ok(())
    }

    #[test]
    fn coordinates_rebuilt_from_2d_cvars() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::LatLon2D;
        let axes = [("FakeDim0", 3), ("FakeDim1", 4)];
        let lat = file.vars.insert(var("/lat", &axes, None));
        file.promote(lat, "FakeDim0", CVarKind::Existing)?;
        let lon = file.vars.insert(var("/lon", &axes, None));
        file.promote(lon, "FakeDim1", CVarKind::Existing)?;
        file.vars
            .insert(var("/t", &[("FakeDim2", 2), ("FakeDim0", 3), ("FakeDim1", 4)], Some("x y")));
        file.vars.insert(var("/u", &[("FakeDim1", 4), ("FakeDim0", 3)], Some("x y")));
        assign_names(&mut file)?;
        update_coordinates_attributes(&mut file)?;
        assert_eq!(coordinates(&file, "/t").as_deref(), Some("lat lon"));
        assert_eq!(coordinates(&file, "/u").as_deref(), Some("x y"));
        assert_eq!(file.cvar("/lat").and_then(|cvar| cvar.units()).as_deref(), Some(DEGREES_NORTH));
        assert_eq!(file.cvar("/lat").map(|cvar| cvar.kind()), Some(CVarKind::Modified));
        assert!(!file.var("/t").unwrap().coordinates_needs_path);
        assert!(file.var("/u").unwrap().coordinates_needs_path);
        Ok(())
    }

    #[test]
    fn coordinates_keep_group_flattened() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::DimensionScale;
        file.state.keep_coordinates_groups.insert("/S1/".to_string());
        file.vars.insert(var(
            "/S1/t",
            &[("/S1/x", 3), ("/S1/y", 4)],
            Some("/S1/lat /S1/cell_lon"),
        ));
        update_coordinates_attributes(&mut file)?;
        assert_eq!(coordinates(&file, "/S1/t").as_deref(), Some("S1_lat S1_cell_lon"));
        Ok(())
    }

    #[test]
    fn coordinates_gpm_l1() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL1;
        let axes = [("nscan", 10), ("npixel", 20)];
        let lat = file.vars.insert(var("/S1/Latitude", &axes, None));
        file.promote(lat, "/S1/nscan", CVarKind::Existing)?;
        let lon = file.vars.insert(var("/S1/Longitude", &axes, None));
        file.promote(lon, "/S1/npixel", CVarKind::Existing)?;
        file.vars
            .insert(var("/S1/precip", &[("nscan", 10), ("npixel", 20), ("nlayer", 5)], None));
        file.vars.insert(var("/S1/scanTime/Year", &[("nscan", 10)], None));
        assign_names(&mut file)?;
        update_coordinates_attributes(&mut file)?;
        assert_eq!(
            coordinates(&file, "/S1/precip").as_deref(),
            Some("S1_Longitude S1_Latitude nlayer")
        );
        assert_eq!(coordinates(&file, "/S1/scanTime/Year"), None);
        Ok(())
    }

    #[test]
    fn coordinates_pair_pattern() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::CoordinatesAttribute;
        file.state.pairs = vec![LatLonPair {
            latitude: "/g/lat".to_string(),
            longitude: "/g/lon".to_string(),
            rank: 2,
        }];
        let axes = [("FakeDim0", 3), ("FakeDim1", 4)];
        file.vars.insert(var("/g/a", &axes, Some("/g/lat /g/lon")));
        file.vars.insert(var("/g/b", &axes, Some("lat lon")));
        file.vars.insert(var("/g/c", &axes, Some("g/lat g/lon")));
        file.vars.insert(var("/h/d", &axes, Some("x y")));
        update_coordinates_attributes(&mut file)?;
        assert_eq!(coordinates(&file, "/g/a").as_deref(), Some("g_lat g_lon"));
        assert_eq!(coordinates(&file, "/g/b").as_deref(), Some("g_lat g_lon"));
        assert_eq!(coordinates(&file, "/g/c").as_deref(), Some("g_lat g_lon"));
        assert_eq!(coordinates(&file, "/h/d").as_deref(), Some("x y"));
        assert!(file.var("/h/d").unwrap().coordinates_needs_path);
        Ok(())
    }

    #[test]
    fn coordinates_add_path_and_bounds() {
        let mut file = File::new(Config::default());
        let mut t = var("/g1/g2/t", &[], Some("lat ../lon"));
        t.attributes.push(Attribute::new_string(BOUNDS, "t_bnds"));
        file.vars.insert(t);
        add_path_to_coordinates(&mut file);
        update_bounds_attributes(&mut file);
        let t = file.var("/g1/g2/t").unwrap();
        assert_eq!(t.string_attribute(COORDINATES).as_deref(), Some("g1_g2_lat g1_lon"));
        assert_eq!(t.string_attribute(BOUNDS).as_deref(), Some("g1_g2_t_bnds"));
    }
}
