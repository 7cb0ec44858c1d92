//! Structural pattern checks of general products.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{
    datatype::Datatype,
    model::{File, LatLonPair, Var},
};

/// The reserved latitude/longitude name pairs, in the order they are tried.
const LAT_LON_NAMES: [(&str, &str); 4] = [
    ("latitude", "longitude"),
    ("Latitude", "Longitude"),
    ("lat", "lon"),
    ("cell_lat", "cell_lon"),
];

const DIMENSION_SCALE: &str = "DIMENSION_SCALE";

/// Returns true if `name` is `lat`, `latitude`, or `Latitude`.
pub(crate) fn is_latitude_name(name: &str) -> bool {
    matches!(name, "lat" | "latitude" | "Latitude")
}

/// Returns true if `name` is `lon`, `longitude`, or `Longitude`.
pub(crate) fn is_longitude_name(name: &str) -> bool {
    matches!(name, "lon" | "longitude" | "Longitude")
}

/// Returns true if `name` ends with `lat`, `latitude`, or `Latitude`.
pub(crate) fn has_latitude_suffix(name: &str) -> bool {
    name.ends_with("lat") || name.ends_with("latitude") || name.ends_with("Latitude")
}

/// Returns true if `name` ends with `lon`, `longitude`, or `Longitude`.
pub(crate) fn has_longitude_suffix(name: &str) -> bool {
    name.ends_with("lon") || name.ends_with("longitude") || name.ends_with("Longitude")
}

/// Resolve a `coordinates` attribute token of a variable in `group_path` to a full path.
pub(crate) fn resolve_coordinate(group_path: &str, token: &str) -> String {
    if token.starts_with('/') {
        token.to_string()
    } else if token.contains('/') {
        format!("/{token}")
    } else {
        format!("{group_path}{token}")
    }
}

/// The whitespace separated tokens of the `coordinates` attribute of `var`.
pub(crate) fn coordinate_tokens(var: &Var) -> Vec<String> {
    var.string_attribute("coordinates")
        .map(|value| {
            value
                .split(' ')
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns true if `var` is a dimension scale.
pub(crate) fn is_dimension_scale_var(var: &Var) -> bool {
    var.string_attribute("CLASS")
        .is_some_and(|class| class.starts_with(DIMENSION_SCALE))
}

/// Dimension scales name the dimensions.
///
/// A dimension scale must exist, and either a variable refers to scales through `DIMENSION_LIST`,
/// or a single scale carries `REFERENCE_LIST` (or `NAME` and `_Netcdf4Dimid`, a netCDF-4 file with only dimensions).
pub(crate) fn is_dimension_scale(file: &File) -> bool {
    let scales: Vec<&Var> = file
        .vars
        .values()
        .filter(|var| is_dimension_scale_var(var))
        .collect();
    if scales.is_empty() {
        return false;
    }
    if file
        .vars
        .values()
        .any(|var| var.has_attribute("DIMENSION_LIST"))
    {
        return true;
    }
    match scales.as_slice() {
        [scale] => {
            scale.has_attribute("REFERENCE_LIST")
                || (scale.has_attribute("NAME") && scale.has_attribute("_Netcdf4Dimid"))
        }
        _ => false,
    }
}

/// A new GPM level 3 product describes its dimensions with `DimensionNames` attributes.
///
/// About five evenly spaced variables are sampled.
pub(crate) fn is_new_gpm_l3(file: &File) -> bool {
    let vars: Vec<&Var> = file.vars.values().collect();
    let step = (vars.len() / 5).max(1);
    let samples = if step == 1 { vars.len() } else { 5 };
    let has_dimension_names = vars.iter().step_by(step).take(samples).any(|var| {
        var.attribute("DimensionNames")
            .is_some_and(|attribute| attribute.datatype() == Datatype::FixedString)
    });
    has_dimension_names
        && file.groups.values().any(|group| {
            group
                .attributes()
                .iter()
                .any(|attribute| attribute.name().contains("GridHeader"))
        })
}

fn var_under_group<'a>(file: &'a File, group: &str, name: &str, rank: usize) -> Option<&'a Var> {
    let full_path = format!("{group}{name}");
    file.vars
        .values()
        .find(|var| var.full_path == full_path && var.rank() == rank)
}

fn shape(var: &Var) -> Vec<u64> {
    var.dimensions.iter().map(|dimension| dimension.size).collect()
}

/// A pair of 2-D reserved latitude/longitude names of equal shape.
///
/// Both variables live under `/` or both under `/Geolocation`, otherwise both under `/GeolocationData`.
/// Returns the full paths of the latitude and longitude.
pub(crate) fn lat_lon_2d(file: &File) -> Option<(String, String)> {
    for (lat_name, lon_name) in LAT_LON_NAMES {
        let find = |group: &str| {
            (
                var_under_group(file, group, lat_name, 2),
                var_under_group(file, group, lon_name, 2),
            )
        };
        let (lat_root, lon_root) = find("/");
        let (lat_geo, lon_geo) = find("/Geolocation/");
        let pair = match (lat_root, lon_root) {
            (Some(lat), Some(lon)) => {
                (lat_geo.is_none() && lon_geo.is_none()).then_some((lat, lon))
            }
            (None, None) if lat_geo.is_some() && lon_geo.is_some() => lat_geo.zip(lon_geo),
            _ => {
                let (lat, lon) = find("/GeolocationData/");
                lat.zip(lon)
            }
        };
        if let Some((lat, lon)) = pair {
            if shape(lat) == shape(lon) {
                return Some((lat.full_path.clone(), lon.full_path.clone()));
            }
        }
    }
    None
}

/// A pair of 1-D reserved latitude/longitude names under `/` or `/Geolocation`.
///
/// If both have the same length, some variable of rank 2 or more must have two axes of that length.
/// Returns the full paths of the latitude and longitude.
pub(crate) fn lat_lon_1d(file: &File) -> Option<(String, String)> {
    for (lat_name, lon_name) in LAT_LON_NAMES {
        let find = |name: &str| {
            var_under_group(file, "/", name, 1)
                .or_else(|| var_under_group(file, "/Geolocation/", name, 1))
        };
        let (Some(lat), Some(lon)) = (find(lat_name), find(lon_name)) else {
            continue;
        };
        let lat_size = lat.dimensions[0].size;
        let lon_size = lon.dimensions[0].size;
        let is_grid = lat_size != lon_size
            || file.vars.values().any(|var| {
                var.rank() >= 2
                    && var
                        .dimensions
                        .iter()
                        .filter(|dimension| dimension.size == lat_size)
                        .count()
                        >= 2
            });
        if is_grid {
            return Some((lat.full_path.clone(), lon.full_path.clone()));
        }
    }
    None
}

#[derive(Debug)]
struct CandidatePair {
    latitude: String,
    longitude: String,
    rank: usize,
    size1: u64,
    size2: u64,
}

/// Returns true if the `coordinates` attribute of `var` names both a latitude-like and a longitude-like variable.
fn coordinates_name_lat_lon(var: &Var) -> bool {
    let tokens = coordinate_tokens(var);
    tokens.iter().any(|token| has_latitude_suffix(token))
        && tokens
            .iter()
            .any(|token| !has_latitude_suffix(token) && has_longitude_suffix(token))
}

/// The name prefixes of a latitude-like or longitude-like name, with the suffix removed.
fn name_prefixes(name: &str, long_suffix_len: usize) -> [Option<&str>; 2] {
    let strip = |len: usize| {
        name.len()
            .checked_sub(len)
            .filter(|end| *end > 0)
            .and_then(|end| name.get(..end))
    };
    [strip(3), strip(long_suffix_len)]
}

fn pair_rank_1(lat: &Var, lons: &[&Var]) -> Option<CandidatePair> {
    let same_rank: Vec<&Var> = lons.iter().filter(|lon| lon.rank() == 1).copied().collect();
    let lon = match same_rank.as_slice() {
        [] => None,
        [lon] => Some(*lon),
        _ => same_rank
            .iter()
            .filter(|lon| lon.group_path() == lat.group_path())
            .exactly_one()
            .ok()
            .copied(),
    }?;
    Some(CandidatePair {
        latitude: lat.full_path.clone(),
        longitude: lon.full_path.clone(),
        rank: 1,
        size1: lat.dimensions[0].size,
        size2: lon.dimensions[0].size,
    })
}

fn pair_rank_n(lat: &Var, lons: &[&Var]) -> Vec<CandidatePair> {
    let lat_shape = shape(lat);
    let same_shape: BTreeMap<&str, &Var> = lons
        .iter()
        .filter(|lon| lon.rank() == lat.rank() && shape(lon) == lat_shape)
        .map(|lon| (lon.full_path.as_str(), *lon))
        .collect();
    let matched: Vec<&Var> = if same_shape.len() == 1 {
        same_shape.values().copied().collect()
    } else {
        let same_group: Vec<&Var> = same_shape
            .values()
            .filter(|lon| lon.group_path() == lat.group_path())
            .copied()
            .collect();
        if same_group.len() == 1 {
            same_group
        } else {
            let lat_prefixes = name_prefixes(&lat.name, "latitude".len());
            same_group
                .into_iter()
                .filter(|lon| {
                    let lon_prefixes = name_prefixes(&lon.name, "longitude".len());
                    lat_prefixes.iter().flatten().any(|lat_prefix| {
                        !lat_prefix.is_empty()
                            && lon_prefixes.iter().flatten().any(|lon_prefix| lon_prefix == lat_prefix)
                    })
                })
                .collect()
        }
    };
    matched
        .into_iter()
        .map(|lon| CandidatePair {
            latitude: lat.full_path.clone(),
            longitude: lon.full_path.clone(),
            rank: lat.rank(),
            size1: lat.dimensions[0].size,
            size2: lat.dimensions[1].size,
        })
        .collect()
}

/// Returns true if some variable naming both members of `pair` in its `coordinates` attribute uses the pair's length other than exactly twice.
fn shared_axis_conflict(file: &File, pair: &CandidatePair) -> bool {
    file.vars.values().any(|var| {
        if var.rank() < 2 {
            return false;
        }
        let resolved: BTreeSet<String> = coordinate_tokens(var)
            .iter()
            .map(|token| resolve_coordinate(var.group_path(), token))
            .collect();
        resolved.contains(&pair.latitude)
            && resolved.contains(&pair.longitude)
            && var
                .dimensions
                .iter()
                .filter(|dimension| dimension.size == pair.size1)
                .count()
                != 2
    })
}

/// Latitude/longitude pairs named by `coordinates` attributes.
///
/// Returns [`None`] if the pattern does not match.
pub(crate) fn coordinates_pairs(file: &File) -> Option<Vec<LatLonPair>> {
    if !file
        .vars
        .values()
        .any(|var| var.rank() >= 2 && coordinates_name_lat_lon(var))
    {
        return None;
    }

    let (lats, lons): (Vec<&Var>, Vec<&Var>) = file
        .vars
        .values()
        .filter(|var| var.rank() > 0 && (has_latitude_suffix(&var.name) || has_longitude_suffix(&var.name)))
        .partition(|var| has_latitude_suffix(&var.name));

    let mut pairs: Vec<CandidatePair> = Vec::new();
    for lat in lats {
        if lat.rank() == 1 {
            pairs.extend(pair_rank_1(lat, &lons));
        } else {
            pairs.extend(pair_rank_n(lat, &lons));
        }
    }

    let longitude_counts = pairs.iter().counts_by(|pair| pair.longitude.clone());
    pairs.retain(|pair| longitude_counts.get(&pair.longitude) == Some(&1));
    tracing::trace!(?pairs, "coordinates attribute candidate pairs");

    let accepted = pairs.iter().any(|pair| pair.rank >= 2)
        || pairs.iter().any(|pair| {
            pair.rank == 1 && (pair.size1 != pair.size2 || !shared_axis_conflict(file, pair))
        });
    accepted.then(|| {
        pairs
            .into_iter()
            .map(|pair| LatLonPair {
                latitude: pair.latitude,
                longitude: pair.longitude,
                rank: pair.rank,
            })
            .collect()
    })
}
