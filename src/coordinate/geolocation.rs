//! Promotion of 2-D latitude/longitude variables in dimension scale files.
//!
//! A dimension scale file can carry several 2-D geolocation pairs, for example one per swath group.
//! Each pair whose longitude and latitude share both axes, and which is unique within its group, replaces the 1-D coordinate variables of its axes.
//! Groups holding ambiguous pairs are recorded, and their variables keep their own `coordinates` attribute.

use std::collections::BTreeSet;

use crate::{
    dialect::{is_latitude_name, is_longitude_name},
    model::{CVarKind, EntityKey, File, Var},
    normalize::NormalizeError,
};

pub(crate) const DEGREES_NORTH: &str = "degrees_north";
pub(crate) const DEGREES_EAST: &str = "degrees_east";

fn has_units(var: &Var, units: &str) -> bool {
    var.units().as_deref() == Some(units)
}

/// A 2-D latitude or longitude variable that may become a coordinate variable.
#[derive(Clone, Debug)]
struct Candidate {
    key: EntityKey,
    group: String,
    axes: [(String, u64); 2],
}

impl Candidate {
    fn new(key: EntityKey, var: &Var) -> Option<Self> {
        let [dim0, dim1] = var.dimensions() else {
            return None;
        };
        Some(Self {
            key,
            group: var.group_path().to_string(),
            axes: [
                (dim0.name().to_string(), dim0.size()),
                (dim1.name().to_string(), dim1.size()),
            ],
        })
    }

    fn shares_axis_name(&self, other: &Self) -> bool {
        self.axes
            .iter()
            .any(|(name, _)| other.axes.iter().any(|(other, _)| name == other))
    }
}

/// The axis (name, size) of every 1-D existing coordinate variable with `units`.
fn axes_1d(file: &File, units: &str) -> Vec<(String, u64)> {
    file.cvars
        .values()
        .filter(|cvar| cvar.kind == CVarKind::Existing && has_units(cvar, units))
        .filter_map(|cvar| cvar.dimensions().first())
        .map(|dimension| (dimension.name().to_string(), dimension.size()))
        .collect()
}

/// Returns true if the 1-D coordinate variables already geolocate the file.
///
/// A latitude without a longitude is a zonal average and never has 2-D geolocation.
fn has_only_1d_geolocation(file: &File) -> bool {
    let latitude = axes_1d(file, DEGREES_NORTH).pop();
    let longitude = axes_1d(file, DEGREES_EAST).pop();
    match (latitude, longitude) {
        (Some((lat_name, lat_size)), Some((lon_name, lon_size))) => {
            if file.has_groups() {
                let rank_2 = || file.vars.values().filter(|var| var.rank() == 2);
                let by_name = rank_2().any(|var| is_latitude_name(&var.name))
                    && rank_2().any(|var| is_longitude_name(&var.name));
                let by_units = rank_2().any(|var| has_units(var, DEGREES_NORTH))
                    && rank_2().any(|var| has_units(var, DEGREES_EAST));
                !(by_name || by_units)
            } else if lat_size == lon_size {
                file.vars.values().filter(|var| var.rank() >= 2).any(|var| {
                    let names = || var.dimensions().iter().map(|dimension| dimension.name());
                    names().any(|name| name == lat_name) && names().any(|name| name == lon_name)
                })
            } else {
                true
            }
        }
        (Some(_), None) => true,
        _ => false,
    }
}

/// Collect the 2-D latitude and longitude variables, by name or by units.
fn candidates_2d(file: &File) -> (Vec<Candidate>, Vec<Candidate>) {
    let mut latitudes = Vec::new();
    let mut longitudes = Vec::new();
    for (key, var) in file.vars.iter().filter(|(_, var)| var.rank() == 2) {
        let Some(candidate) = Candidate::new(key, var) else {
            continue;
        };
        if is_latitude_name(&var.name) || has_units(var, DEGREES_NORTH) {
            latitudes.push(candidate);
        } else if is_longitude_name(&var.name) || has_units(var, DEGREES_EAST) {
            longitudes.push(candidate);
        }
    }
    (latitudes, longitudes)
}

/// Drop candidates with an axis already claimed by a 1-D coordinate variable.
fn retain_unclaimed(candidates: &mut Vec<Candidate>, claimed: &[(String, u64)]) {
    candidates.retain(|candidate| {
        !candidate
            .axes
            .iter()
            .any(|axis| claimed.contains(axis))
    });
}

/// Keep candidates with exactly one counterpart of identical axes in the same group.
///
/// A candidate with several counterparts in its group is dropped and its group is recorded.
fn retain_paired(
    candidates: &mut Vec<Candidate>,
    counterparts: &[Candidate],
    keep_coordinates_groups: &mut BTreeSet<String>,
) {
    candidates.retain(|candidate| {
        let same_group = counterparts
            .iter()
            .filter(|counterpart| {
                counterpart.axes == candidate.axes && counterpart.group == candidate.group
            })
            .count();
        match same_group {
            0 => false,
            1 => true,
            _ => {
                keep_coordinates_groups.insert(candidate.group.clone());
                false
            }
        }
    });
}

/// Drop candidates sharing an axis name with another candidate of the same kind.
///
/// If one group contains the other, only the candidate of the nested group is dropped.
fn retain_unique(candidates: &mut Vec<Candidate>, keep_coordinates_groups: &mut BTreeSet<String>) {
    let mut shared = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            let (a, b) = (&candidates[i], &candidates[j]);
            if !a.shares_axis_name(b) {
                continue;
            }
            if a.group.len() > b.group.len() && a.group.starts_with(&b.group) {
                shared[i] = true;
                keep_coordinates_groups.insert(a.group.clone());
            } else if b.group.len() > a.group.len() && b.group.starts_with(&a.group) {
                shared[j] = true;
                keep_coordinates_groups.insert(b.group.clone());
            } else {
                shared[i] = true;
                shared[j] = true;
                keep_coordinates_groups.insert(a.group.clone());
                keep_coordinates_groups.insert(b.group.clone());
            }
        }
    }
    let mut index = 0;
    candidates.retain(|_| {
        let keep = !shared[index];
        index += 1;
        keep
    });
}

/// Promote 2-D latitude/longitude pairs to coordinate variables.
///
/// The 1-D coordinate variables of the axes of a promoted pair are retracted.
/// COARDS naming is disabled if any pair is promoted.
pub(super) fn promote_2d_geolocation(file: &mut File) -> Result<(), NormalizeError> {
    if has_only_1d_geolocation(file) {
        return Ok(());
    }
    let (mut latitudes, mut longitudes) = candidates_2d(file);
    retain_unclaimed(&mut latitudes, &axes_1d(file, DEGREES_NORTH));
    retain_unclaimed(&mut longitudes, &axes_1d(file, DEGREES_EAST));

    let keep_coordinates_groups = &mut file.state.keep_coordinates_groups;
    retain_paired(&mut latitudes, &longitudes, keep_coordinates_groups);
    retain_paired(&mut longitudes, &latitudes, keep_coordinates_groups);
    retain_unique(&mut latitudes, keep_coordinates_groups);
    retain_unique(&mut longitudes, keep_coordinates_groups);
    if latitudes.len() != longitudes.len() {
        return Err(normalize_err!(
            "found {} 2-D latitude but {} 2-D longitude coordinate variables",
            latitudes.len(),
            longitudes.len()
        ));
    }
    if latitudes.is_empty() {
        return Ok(());
    }

    let mut dim_names_2d = BTreeSet::new();
    for (candidates, axis) in [(latitudes, 0), (longitudes, 1)] {
        for candidate in candidates {
            let (cf_dim_name, _) = &candidate.axes[axis];
            file.promote(candidate.key, cf_dim_name, CVarKind::Existing)?;
            dim_names_2d.insert(cf_dim_name.clone());
        }
    }

    let retracted: Vec<EntityKey> = file
        .cvars
        .iter()
        .filter(|(_, cvar)| cvar.rank() == 1 && dim_names_2d.contains(&cvar.cf_dim_name))
        .map(|(key, _)| key)
        .collect();
    for key in retracted {
        file.retract(key)?;
    }
    file.state.coards = false;
    tracing::debug!(dimensions = ?dim_names_2d, "promoted 2-D geolocation coordinate variables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{Attribute, CVar, Dimension, Group},
    };

    fn named_var(path: &str, dims: &[(&str, u64)], units: Option<&str>) -> Var {
        let mut var = Var::new(path, Datatype::Float32);
        var.dimensions = dims
            .iter()
            .map(|(name, size)| {
                let mut dimension = Dimension::new(*size, false);
                dimension.set_name(name);
                dimension
            })
            .collect();
        if let Some(units) = units {
            var.attributes.push(Attribute::new_string("units", units));
        }
        var
    }

    fn index_fill(file: &mut File, path: &str, size: u64) {
        let key = file.vars.insert(named_var(path, &[(path, size)], None));
        file.promote(key, path, CVarKind::IndexFill).unwrap();
    }

    fn swath_file() -> File {
        let mut file = File::new(Config::default());
        file.groups.insert(Group::new("/S1"));
        file.groups.insert(Group::new("/S2"));
        for swath in ["S1", "S2"] {
            let x = format!("/{swath}/x");
            let y = format!("/{swath}/y");
            index_fill(&mut file, &x, 4);
            index_fill(&mut file, &y, 5);
            let axes = [(x.as_str(), 4), (y.as_str(), 5)];
            file.vars.insert(named_var(&format!("/{swath}/lat"), &axes, None));
            file.vars.insert(named_var(&format!("/{swath}/lon"), &axes, None));
            file.vars.insert(named_var(&format!("/{swath}/t"), &axes, None));
        }
        file.state.coards = true;
        file
    }

    #[test]
    fn geolocation_promote_per_group() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = swath_file();
        promote_2d_geolocation(&mut file)?;
        assert!(!file.is_coards());
        assert_eq!(file.cvars().len(), 4);
        assert_eq!(file.cvar("/S1/lat").map(CVar::cf_dim_name), Some("/S1/x"));
        assert_eq!(file.cvar("/S2/lon").map(CVar::cf_dim_name), Some("/S2/y"));
        assert!(file.cvar("/S1/x").is_none());
        assert!(file.var("/S1/x").is_none());
        assert!(file.state.keep_coordinates_groups.is_empty());
        Ok(())
    }

    #[test]
    fn geolocation_ambiguous_group_is_kept() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = swath_file();
        let axes = [("/S1/x", 4), ("/S1/y", 5)];
        file.vars
            .insert(named_var("/S1/cell_lon", &axes, Some(DEGREES_EAST)));
        promote_2d_geolocation(&mut file)?;
        assert!(file.cvar("/S1/lat").is_none());
        assert!(file.cvar("/S2/lat").is_some());
        assert!(file.cvar("/S1/x").is_some());
        assert!(file.state.keep_coordinates_groups.contains("/S1/"));
        Ok(())
    }

    #[test]
    fn geolocation_existing_1d_is_retracted() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = swath_file();
        let key = file
            .cvars
            .find(|cvar| cvar.full_path == "/S1/x")
            .unwrap();
        file.cvars.get_mut(key).unwrap().kind = CVarKind::Existing;
        promote_2d_geolocation(&mut file)?;
        assert!(file.var("/S1/x").is_some());
        assert!(file.cvar("/S1/x").is_none());
        Ok(())
    }

    #[test]
    fn geolocation_skipped_with_1d_lat_lon() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        for (path, size, units) in [("/lat", 3, DEGREES_NORTH), ("/lon", 4, DEGREES_EAST)] {
            let key = file
                .vars
                .insert(named_var(path, &[(path, size)], Some(units)));
            file.promote(key, path, CVarKind::Existing)?;
        }
        let axes = [("/lat", 3), ("/lon", 4)];
        file.vars.insert(named_var("/t", &axes, None));
        file.vars.insert(named_var("/g_lat", &axes, Some(DEGREES_NORTH)));
        promote_2d_geolocation(&mut file)?;
        assert_eq!(file.cvars().len(), 2);
        assert!(file.var("/g_lat").is_some());
        Ok(())
    }
}
