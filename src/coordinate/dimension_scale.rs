use crate::{
    model::{CVarKind, File, Var},
    normalize::NormalizeError,
};

use super::geolocation::promote_2d_geolocation;

const NETCDF_DIMENSION_MARK: &str = "This is a netCDF dimension but not a netCDF variable";

/// Returns true if `var` only exists to define a netCDF-4 dimension.
fn is_netcdf_dimension(var: &Var) -> bool {
    var.string_attribute("NAME")
        .is_some_and(|name| name.starts_with(NETCDF_DIMENSION_MARK))
}

/// Promote every dimension scale to the coordinate variable of the dimension it names.
///
/// Pure netCDF-4 dimensions are promoted as [`IndexFill`](CVarKind::IndexFill) coordinate variables.
/// Dimensions that already have a coordinate variable are skipped.
pub(super) fn promote_dimension_scales(file: &mut File) -> Result<(), NormalizeError> {
    for name in file.dimensions.names() {
        if file.state.nc4_shadow_paths.contains(&name) || file.cvar_of_dimension(&name).is_some() {
            continue;
        }
        let Some(key) = file.var_key(&name) else {
            continue;
        };
        let Some(var) = file.vars.get(key) else {
            continue;
        };
        if var.rank() != 1 {
            return Err(normalize_err!(
                "the dimension scale {name} has rank {}, expected 1",
                var.rank()
            ));
        }
        let kind = if is_netcdf_dimension(var) {
            CVarKind::IndexFill
        } else {
            CVarKind::Existing
        };
        file.promote(key, &name, kind)?;
    }
    Ok(())
}

/// Synthesize the coordinate variables of a dimension scale file.
pub(super) fn synthesize(file: &mut File) -> Result<(), NormalizeError> {
    promote_dimension_scales(file)?;
    promote_2d_geolocation(file)?;
    let shadows = file.state.nc4_shadow_paths.clone();
    super::add_missing_cvars(file, |name| shadows.contains(name));
    Ok(())
}
