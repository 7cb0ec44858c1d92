use crate::{
    model::{CVarKind, File, Pattern},
    normalize::NormalizeError,
};

/// Promote the latitude and longitude of the 1-D and 2-D lat/lon patterns.
///
/// The latitude is the coordinate of its first axis.
/// The longitude is the coordinate of its first axis for 1-D, and of its second axis for 2-D.
pub(super) fn synthesize(file: &mut File) -> Result<(), NormalizeError> {
    let longitude_axis = match file.pattern {
        Pattern::LatLon1D => {
            file.state.coards = true;
            0
        }
        Pattern::LatLon2D => 1,
        pattern => {
            return Err(normalize_err!(
                "lat/lon coordinate variables cannot be synthesized for the {pattern} pattern"
            ))
        }
    };
    let latitude = file.state.latitude.clone();
    let longitude = file.state.longitude.clone();
    for (path, axis) in [(latitude, 0), (longitude, longitude_axis)] {
        let Some(path) = path else {
            continue;
        };
        let Some(key) = file.var_key(&path) else {
            continue;
        };
        let cf_dim_name = file
            .vars
            .get(key)
            .and_then(|var| var.dimensions().get(axis))
            .map(|dimension| dimension.name().to_string())
            .ok_or_else(|| normalize_err!("{path} has no axis {axis}"))?;
        file.promote(key, &cf_dim_name, CVarKind::Existing)?;
    }
    super::add_missing_cvars(file, |_| false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{CVar, Dimension, Var},
    };

    fn named_var(path: &str, dims: &[(&str, u64)]) -> Var {
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

    fn file(pattern: Pattern, vars: Vec<Var>) -> Result<File, NormalizeError> {
        let mut file = File::new(Config::default());
        file.pattern = pattern;
        file.state.latitude = Some("/lat".to_string());
        file.state.longitude = Some("/lon".to_string());
        for var in vars {
            for dimension in var.dimensions() {
                file.dimensions
                    .insert(dimension.name(), dimension.size(), false)?;
            }
            file.vars.insert(var);
        }
        Ok(file)
    }

    #[test]
    fn lat_lon_1d() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = file(
            Pattern::LatLon1D,
            vec![
                named_var("/lat", &[("FakeDim0", 3)]),
                named_var("/lon", &[("FakeDim1", 4)]),
                named_var("/t", &[("FakeDim2", 2), ("FakeDim0", 3), ("FakeDim1", 4)]),
            ],
        )?;
        synthesize(&mut file)?;
        assert!(file.is_coards());
        assert_eq!(file.cvar("/lon").map(CVar::cf_dim_name), Some("FakeDim1"));
        assert_eq!(
            file.cvar_of_dimension("FakeDim2").map(CVar::kind),
            Some(CVarKind::OtherMissing)
        );
        assert_eq!(file.cvars().len(), 3);
        Ok(())
    }

    #[test]
    fn lat_lon_2d() -> Result<(), Box<dyn std::error::Error>> {
        let axes = [("FakeDim0", 3), ("FakeDim1", 4)];
        let mut file = file(
            Pattern::LatLon2D,
            vec![named_var("/lat", &axes), named_var("/lon", &axes)],
        )?;
        synthesize(&mut file)?;
        assert!(!file.is_coards());
        assert_eq!(file.cvar("/lat").map(CVar::cf_dim_name), Some("FakeDim0"));
        assert_eq!(file.cvar("/lon").map(CVar::cf_dim_name), Some("FakeDim1"));
        assert_eq!(file.cvars().len(), 2);
        Ok(())
    }
}
