//! Coordinate variable synthesis.
//!
//! After [dimension resolution](crate::dimension), every dimension of the [`DimensionTable`](crate::model::DimensionTable) gets exactly one coordinate variable ([`CVar`]).
//! A coordinate variable is either an existing dataset promoted with [`File::promote`], or is synthesized with a [`CoordinateSource`](crate::model::CoordinateSource) describing its values.
//!
//! The strategy depends on the producer and pattern of the file:
//!  - dimension scale files promote their dimension scales, then any 2-D latitude/longitude pairs,
//!  - the 1-D and 2-D lat/lon patterns promote their latitude and longitude,
//!  - producer files follow the producer convention, see the `producer` module,
//!  - every other dimension gets an [`OtherMissing`](CVarKind::OtherMissing) index coordinate variable.
//!
//! The `coordinates` attribute of every variable is rebuilt from the coordinate variables once names are final, see [`update_coordinates_attributes`].

mod coordinates_attribute;
mod dimension_scale;
mod geolocation;
mod lat_lon;
mod producer;

pub use coordinates_attribute::update_coordinates_attributes;
pub(crate) use coordinates_attribute::{add_path_to_coordinates, update_bounds_attributes};
pub(crate) use geolocation::{DEGREES_EAST, DEGREES_NORTH};

use crate::{
    datatype::Datatype,
    model::{CVar, CVarKind, File, Pattern, Producer},
    normalize::NormalizeError,
};

const GPM_L1_SPECIAL_VARS: [&str; 1] = ["AlgorithmRuntimeInfo"];
const GPM_L3_SPECIAL_VARS: [&str; 3] = [
    "InputFileNames",
    "InputAlgorithmVersions",
    "InputGenerationDateTimes",
];

/// Give every dimension of `file` a coordinate variable.
///
/// Producer bookkeeping variables that have no CF representation are removed afterwards.
/// The packed `int64` date-times of ACOS and OCO-2 files are split into their time and date fields.
///
/// # Errors
/// Returns a [`NormalizeError`] if
///  - a dimension scale is not one-dimensional,
///  - the 2-D latitude and longitude coordinate variables do not pair up, or
///  - a producer grid description is missing.
pub fn synthesize(file: &mut File) -> Result<(), NormalizeError> {
    match file.producer {
        Producer::GpmL1 => producer::synthesize_gpm_l1(file)?,
        Producer::GpmL3Single | Producer::GpmL3Multi | Producer::GpmL3New => {
            producer::synthesize_gpm_l3(file)?;
        }
        Producer::AquariusL3 => producer::synthesize_aquarius(file)?,
        Producer::ObpgL3 => producer::synthesize_obpg(file)?,
        Producer::SeaWifsL2 | Producer::SeaWifsL3 => producer::synthesize_seawifs(file)?,
        Producer::MeasuresOzone => producer::synthesize_ozone(file)?,
        Producer::Smap => producer::synthesize_smap(file)?,
        Producer::AcosOco2 => add_missing_cvars(file, |_| false),
        Producer::General => match file.pattern {
            Pattern::DimensionScale => dimension_scale::synthesize(file)?,
            Pattern::LatLon1D | Pattern::LatLon2D => lat_lon::synthesize(file)?,
            Pattern::CoordinatesAttribute | Pattern::Other => add_missing_cvars(file, |_| false),
        },
    }
    remove_special_vars(file);
    if file.producer == Producer::AcosOco2 {
        producer::split_packed_date_times(file);
    }
    tracing::debug!(
        cvars = file.cvars.len(),
        coards = file.state.coards,
        "synthesized coordinate variables"
    );
    Ok(())
}

/// Synthesize an index coordinate variable for every dimension without one.
///
/// Dimensions for which `skip` returns true are left without a coordinate variable.
fn add_missing_cvars(file: &mut File, skip: impl Fn(&str) -> bool) {
    let missing: Vec<CVar> = file
        .dimensions
        .iter()
        .filter(|(name, _)| !skip(*name))
        .filter(|(name, _)| file.cvar_of_dimension(name).is_none())
        .map(|(name, entry)| {
            CVar::synthesize(
                name,
                entry.size,
                entry.unlimited,
                Datatype::Int32,
                CVarKind::OtherMissing,
            )
        })
        .collect();
    for cvar in missing {
        tracing::trace!(dimension = cvar.cf_dim_name(), "synthesize index coordinate variable");
        file.cvars.insert(cvar);
    }
}

/// Remove the GPM bookkeeping variables that hold no science data.
fn remove_special_vars(file: &mut File) {
    let names: &[&str] = match file.producer {
        Producer::GpmL1 => &GPM_L1_SPECIAL_VARS,
        Producer::GpmL3Single | Producer::GpmL3Multi | Producer::GpmL3New => &GPM_L3_SPECIAL_VARS,
        _ => return,
    };
    for var in file.vars.take_where(|var| names.contains(&var.name.as_str())) {
        tracing::debug!(var = %var.full_path, "remove producer bookkeeping variable");
    }
}
