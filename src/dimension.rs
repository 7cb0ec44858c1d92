//! Dimension resolution.
//!
//! Gives every axis of every variable a dimension name, and binds every name to exactly one size in the [`DimensionTable`](crate::model::DimensionTable).
//!
//! Names come from dimension scales, producer conventions, or the latitude of a 2-D lat/lon pair.
//! Any axis still unnamed gets a placeholder name `FakeDimN`, see [`PlaceholderNames`].
//! Placeholder names are compacted to `FakeDim0..FakeDimN-1` once every axis is named.

mod lat_lon;
mod placeholder;
mod producer;
mod scale;

pub(crate) use placeholder::PlaceholderNames;
pub(crate) use producer::{AQUARIUS_DATA, SMAP_LATITUDE_SUFFIX, SMAP_LONGITUDE_SUFFIX};

use crate::{
    container::ReadableContainerTraits,
    model::{File, Pattern, Producer},
    normalize::NormalizeError,
};

/// Name the dimensions of every variable of `file`.
///
/// Dimension scale references are dereferenced through `container`.
///
/// # Errors
/// Returns a [`NormalizeError`] if
///  - a dimension list cannot be dereferenced,
///  - a dimension name is bound to two sizes,
///  - a `DimensionNames` attribute does not match the rank of its variable,
///  - a producer latitude or coordinate variable has an unexpected rank, or
///  - a dimension scale file has no dimensions.
pub fn resolve(
    container: &dyn ReadableContainerTraits,
    file: &mut File,
) -> Result<(), NormalizeError> {
    let mut placeholders = PlaceholderNames::default();
    let producer = file.producer;
    match producer {
        Producer::GpmL1 | Producer::GpmL3Single | Producer::GpmL3Multi | Producer::GpmL3New => {
            producer::name_gpm_dimensions(file)?;
        }
        Producer::AquariusL3 => producer::name_aquarius_dimensions(file)?,
        Producer::General | Producer::ObpgL3 | Producer::SeaWifsL2 | Producer::SeaWifsL3 => {
            if file.pattern == Pattern::DimensionScale {
                scale::name_scale_dimensions(container, file)?;
            }
        }
        Producer::MeasuresOzone => {
            if file.pattern == Pattern::DimensionScale {
                scale::name_scale_dimensions(container, file)?;
            } else {
                producer::name_ozone_dimensions(file)?;
            }
        }
        Producer::Smap => producer::name_smap_dimensions(file)?,
        Producer::AcosOco2 => {}
    }

    placeholders.name_all(file)?;
    if file.pattern == Pattern::LatLon2D {
        lat_lon::name_lat_lon_2d(file)?;
    }
    placeholders.compact(file)?;

    if file.pattern == Pattern::DimensionScale && file.dimensions.is_empty() {
        return Err(normalize_err!(
            "a dimension scale file must have at least one dimension"
        ));
    }
    tracing::debug!(dimensions = file.dimensions.len(), "resolved dimension names");
    Ok(())
}
