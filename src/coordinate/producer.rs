//! Coordinate variables of producer files.

use std::collections::BTreeSet;

use crate::{
    datatype::Datatype,
    dimension::{AQUARIUS_DATA, SMAP_LATITUDE_SUFFIX, SMAP_LONGITUDE_SUFFIX},
    model::{
        CVar, CVarKind, CoordinateSource, File, GridAxis, PackedDigits, Pattern, Producer,
        SpecialSequence,
    },
    normalize::NormalizeError,
};

const GPM_LATITUDE: &str = "Latitude";
const GPM_LONGITUDE: &str = "Longitude";
const GRID_HEADER: &str = "GridHeader";

/// The swath geolocation of SeaWiFS level 2 products and the dimension each one describes.
const SEAWIFS_L2_GEOLOCATION: [(&str, &str); 2] =
    [("/latitude", "/natrack"), ("/longitude", "/nxtrack")];

/// The suffix, least significant digit, and digit count of the fields of packed ACOS and OCO-2 date-times.
const PACKED_DATE_TIME_FIELDS: [(&str, u32, u32); 2] = [("_Time", 1, 6), ("_Date", 7, 8)];

/// Promote the 2-D `Latitude` and `Longitude` of every GPM level 1 swath.
///
/// The CF dimension is qualified by the swath group, since every swath reuses the same axis names.
/// The latitude/longitude axes get no other coordinate variable.
pub(super) fn synthesize_gpm_l1(file: &mut File) -> Result<(), NormalizeError> {
    let mut geolocation_dims = BTreeSet::new();
    let candidates: Vec<_> = file
        .vars
        .iter()
        .filter(|(_, var)| var.rank() == 2)
        .filter_map(|(key, var)| {
            let axis = match var.name.as_str() {
                GPM_LATITUDE => 0,
                GPM_LONGITUDE => 1,
                _ => return None,
            };
            let dim_name = var.dimensions[axis].name().to_string();
            Some((key, format!("{}{dim_name}", var.group_path()), dim_name))
        })
        .collect();
    for (key, cf_dim_name, dim_name) in candidates {
        file.promote(key, &cf_dim_name, CVarKind::Existing)?;
        geolocation_dims.insert(dim_name);
    }
    super::add_missing_cvars(file, |name| geolocation_dims.contains(name));
    Ok(())
}

/// The group and header attribute describing the grid of a GPM level 3 latitude/longitude dimension.
fn gpm_grid_header(file: &File, dim_name: &str) -> Result<(String, String), NormalizeError> {
    match file.producer {
        Producer::GpmL3Multi => {
            let grid = match dim_name {
                "ltL" | "lnL" => "G1",
                "ltH" | "lnH" => "G2",
                _ => return Err(normalize_err!("{dim_name} is not a GPM multi-grid axis")),
            };
            Ok((format!("/Grids/{grid}"), format!("{grid}_{GRID_HEADER}")))
        }
        Producer::GpmL3Single => file
            .groups
            .values()
            .map(|group| group.path())
            .find(|path| matches!(*path, "/Grid" | "/GRID"))
            .map(|path| (path.to_string(), GRID_HEADER.to_string()))
            .ok_or_else(|| normalize_err!("the GPM grid group does not exist")),
        _ => file
            .groups
            .values()
            .find_map(|group| {
                group
                    .attributes()
                    .iter()
                    .find(|attribute| attribute.name().ends_with(GRID_HEADER))
                    .map(|attribute| (group.path().to_string(), attribute.name().to_string()))
            })
            .ok_or_else(|| normalize_err!("no GPM group has a grid header")),
    }
}

/// Synthesize a coordinate variable for every GPM level 3 dimension.
///
/// Latitude and longitude axes take their values from the grid header, and layer and height axes are fixed sequences.
pub(super) fn synthesize_gpm_l3(file: &mut File) -> Result<(), NormalizeError> {
    file.state.coards = true;
    for name in file.dimensions.names() {
        let Some(entry) = file.dimensions.get(&name).copied() else {
            continue;
        };
        let grid_axis = match name.as_str() {
            "nlat" | "ltH" | "ltL" => Some((CVarKind::LatitudeMissing, GridAxis::Latitude)),
            "nlon" | "lnH" | "lnL" => Some((CVarKind::LongitudeMissing, GridAxis::Longitude)),
            _ => None,
        };
        let cvar = match (name.as_str(), entry.size, grid_axis) {
            (_, _, Some((kind, axis))) => {
                let (group, attribute) = gpm_grid_header(file, &name)?;
                CVar::synthesize(&name, entry.size, entry.unlimited, Datatype::Float32, kind)
                    .with_source(CoordinateSource::GridHeader {
                        group,
                        attribute,
                        axis,
                    })
            }
            ("nlayer", 28 | 19, _) => special(&name, entry.size, SpecialSequence::GpmLayers),
            ("hgt" | "nalt", 5, _) => special(&name, entry.size, SpecialSequence::GpmHeights),
            _ => CVar::synthesize(
                &name,
                entry.size,
                entry.unlimited,
                Datatype::Int32,
                CVarKind::OtherMissing,
            ),
        };
        file.cvars.insert(cvar);
    }
    Ok(())
}

fn special(name: &str, size: u64, sequence: SpecialSequence) -> CVar {
    CVar::synthesize(name, size, false, Datatype::Float32, CVarKind::Special)
        .with_source(CoordinateSource::Special(sequence))
}

fn side_attributes(start: &str, step: &str, count: &str) -> CoordinateSource {
    CoordinateSource::SideAttributes {
        start: start.to_string(),
        step: step.to_string(),
        count: count.to_string(),
    }
}

/// Synthesize the latitude and longitude of the Aquarius level 3 data variable from the root attributes.
pub(super) fn synthesize_aquarius(file: &mut File) -> Result<(), NormalizeError> {
    file.state.coards = true;
    let axes: Vec<(String, u64, bool)> = file
        .vars
        .values()
        .filter(|var| var.name == AQUARIUS_DATA)
        .flat_map(|var| var.dimensions().iter())
        .map(|dimension| {
            (
                dimension.name().to_string(),
                dimension.size(),
                dimension.is_unlimited(),
            )
        })
        .collect();
    for (name, size, unlimited) in axes {
        if file.cvar_of_dimension(&name).is_some() {
            continue;
        }
        let (kind, source) = match name.as_str() {
            "lat" => (
                CVarKind::LatitudeMissing,
                side_attributes("SW Point Latitude", "Latitude Step", "Number of Lines"),
            ),
            "lon" => (
                CVarKind::LongitudeMissing,
                side_attributes("SW Point Longitude", "Longitude Step", "Number of Columns"),
            ),
            _ => continue,
        };
        file.cvars.insert(
            CVar::synthesize(&name, size, unlimited, Datatype::Float32, kind).with_source(source),
        );
    }
    super::add_missing_cvars(file, |_| false);
    Ok(())
}

/// Turn the netCDF-4 dimensions of the OBPG level 3 grid into latitude and longitude coordinate variables.
///
/// The grid is taken from the first 2-D geophysical (or `float32`) variable, whose smaller axis is the latitude.
pub(super) fn synthesize_obpg(file: &mut File) -> Result<(), NormalizeError> {
    if file.pattern == Pattern::DimensionScale {
        super::dimension_scale::synthesize(file)?;
    } else {
        super::add_missing_cvars(file, |_| false);
    }

    let grid = file
        .vars
        .values()
        .filter(|var| var.rank() == 2)
        .find(|var| {
            var.full_path.starts_with("/geophysical_data") || var.datatype == Datatype::Float32
        });
    let Some(grid) = grid else {
        return Ok(());
    };
    let datatype = grid.datatype;
    let mut lat = (grid.dimensions[0].name().to_string(), grid.dimensions[0].size());
    let mut lon = (grid.dimensions[1].name().to_string(), grid.dimensions[1].size());
    if lat.1 > lon.1 {
        std::mem::swap(&mut lat, &mut lon);
    }

    for cvar in file
        .cvars
        .values_mut()
        .filter(|cvar| cvar.kind == CVarKind::IndexFill)
    {
        let Some(dimension) = cvar.dimensions().first() else {
            continue;
        };
        let axis = (dimension.name().to_string(), dimension.size());
        let (kind, source) = if axis == lat {
            (
                CVarKind::LatitudeMissing,
                side_attributes("sw_point_latitude", "latitude_step", "number_of_lines"),
            )
        } else if axis == lon {
            (
                CVarKind::LongitudeMissing,
                side_attributes("sw_point_longitude", "longitude_step", "number_of_columns"),
            )
        } else {
            continue;
        };
        cvar.kind = kind;
        cvar.source = Some(source);
        cvar.datatype = datatype;
        cvar.remove_attribute("NAME");
    }
    Ok(())
}

/// Promote the dimension scales of a SeaWiFS file.
///
/// Level 3 grids follow COARDS.
/// The along and across track dimensions of a level 2 swath take the 2-D latitude and longitude instead of their own index scales.
pub(super) fn synthesize_seawifs(file: &mut File) -> Result<(), NormalizeError> {
    if file.producer == Producer::SeaWifsL2 {
        for (path, dim_name) in SEAWIFS_L2_GEOLOCATION {
            if file.dimensions.get(dim_name).is_none() {
                continue;
            }
            let Some(key) = file.var_key(path) else {
                continue;
            };
            file.promote(key, dim_name, CVarKind::Existing)?;
            for scale in file.vars.take_where(|var| var.full_path == dim_name) {
                tracing::debug!(var = %scale.full_path, "drop track index replaced by geolocation");
            }
        }
    }
    super::dimension_scale::promote_dimension_scales(file)?;
    super::add_missing_cvars(file, |_| false);
    file.state.coards =
        file.producer == Producer::SeaWifsL3 && file.pattern == Pattern::DimensionScale;
    Ok(())
}

/// Promote the 1-D coordinate variables of a MEaSUREs ozone file, which name their own dimensions.
pub(super) fn synthesize_ozone(file: &mut File) -> Result<(), NormalizeError> {
    super::dimension_scale::promote_dimension_scales(file)?;
    super::add_missing_cvars(file, |_| false);
    Ok(())
}

/// Promote the first 2-D SMAP latitude and longitude to the coordinate variables of `YDim` and `XDim`.
pub(super) fn synthesize_smap(file: &mut File) -> Result<(), NormalizeError> {
    let candidates: Vec<_> = file
        .vars
        .iter()
        .filter(|(_, var)| var.rank() == 2)
        .filter_map(|(key, var)| {
            let axis = if var.name.ends_with(SMAP_LATITUDE_SUFFIX) {
                0
            } else if var.name.ends_with(SMAP_LONGITUDE_SUFFIX) {
                1
            } else {
                return None;
            };
            Some((key, var.dimensions[axis].name().to_string()))
        })
        .collect();
    for (key, dim_name) in candidates {
        if file.cvar_of_dimension(&dim_name).is_some() {
            continue;
        }
        file.promote(key, &dim_name, CVarKind::Existing)?;
    }
    super::add_missing_cvars(file, |_| false);
    Ok(())
}

/// Replace every `int64` variable by one `int32` variable per packed date-time field.
///
/// The fields are named by suffixing the variable with `_Time` and `_Date`.
/// Both keep the full path of the dataset they are read from.
pub(super) fn split_packed_date_times(file: &mut File) {
    for var in file.vars.take_where(|var| var.datatype == Datatype::Int64) {
        tracing::debug!(var = %var.full_path, "split packed date-time");
        for (suffix, start_digit, digit_count) in PACKED_DATE_TIME_FIELDS {
            let mut field = var.clone();
            field.name.push_str(suffix);
            field.new_name.push_str(suffix);
            field.datatype = Datatype::Int32;
            field.packed = Some(PackedDigits {
                source_datatype: var.datatype,
                start_digit,
                digit_count,
            });
            file.vars.insert(field);
        }
    }
}
