use crate::{model::File, normalize::NormalizeError};

const GPM_DIMENSION_NAMES: &str = "DimensionNames";

/// The Aquarius level 3 data variable.
pub(crate) const AQUARIUS_DATA: &str = "l3m_data";

/// The 1-D coordinate variables of MEaSUREs ozone products without dimension scales.
const OZONE_COORDINATES: [&str; 5] = [
    "Latitude",
    "Time",
    "MixingRatioPressureLevels",
    "ProfilePressureLevels",
    "Wavelength",
];

/// The name suffix of SMAP latitudes.
pub(crate) const SMAP_LATITUDE_SUFFIX: &str = "_lat";

/// The name suffix of SMAP longitudes.
pub(crate) const SMAP_LONGITUDE_SUFFIX: &str = "_lon";

const SMAP_Y: &str = "YDim";
const SMAP_X: &str = "XDim";

/// Name every unnamed axis after the first candidate of the same size not yet used by another axis of the same variable.
fn name_axes_by_size(
    file: &mut File,
    candidates: &[(String, u64)],
) -> Result<(), NormalizeError> {
    for var in file.vars.values_mut() {
        let mut used: Vec<bool> = var
            .dimensions
            .iter()
            .fold(vec![false; candidates.len()], |mut used, dimension| {
                if let Some(index) = candidates
                    .iter()
                    .position(|(name, _)| name == dimension.name())
                {
                    used[index] = true;
                }
                used
            });
        for dimension in var.dimensions.iter_mut().filter(|d| d.name().is_empty()) {
            let Some(index) = (0..candidates.len())
                .find(|&index| !used[index] && candidates[index].1 == dimension.size)
            else {
                continue;
            };
            used[index] = true;
            let name = &candidates[index].0;
            file.dimensions
                .insert(name, dimension.size, dimension.unlimited)?;
            dimension.set_name(name);
        }
    }
    Ok(())
}

/// Name the two axes of the SMAP grid `YDim` and `XDim` after the first 2-D latitude.
///
/// Other axes of the same sizes take these names too, in order.
pub(super) fn name_smap_dimensions(file: &mut File) -> Result<(), NormalizeError> {
    let Some(latitude) = file.vars.values().find(|var| {
        var.name.len() > SMAP_LATITUDE_SUFFIX.len() && var.name.ends_with(SMAP_LATITUDE_SUFFIX)
    }) else {
        return Ok(());
    };
    let [y, x] = latitude.dimensions.as_slice() else {
        return Err(normalize_err!(
            "the SMAP latitude {} has rank {}, expected 2",
            latitude.full_path,
            latitude.dimensions.len()
        ));
    };
    let candidates = [(SMAP_Y.to_string(), y.size), (SMAP_X.to_string(), x.size)];
    name_axes_by_size(file, &candidates)
}

/// Name the axes of MEaSUREs ozone variables after the 1-D coordinate variables of the same size.
///
/// A coordinate variable names its own axis.
pub(super) fn name_ozone_dimensions(file: &mut File) -> Result<(), NormalizeError> {
    let mut candidates = Vec::new();
    for var in file
        .vars
        .values_mut()
        .filter(|var| OZONE_COORDINATES.contains(&var.name.as_str()))
    {
        let [dimension] = var.dimensions.as_mut_slice() else {
            return Err(normalize_err!(
                "the ozone coordinate variable {} has rank {}, expected 1",
                var.full_path,
                var.dimensions.len()
            ));
        };
        file.dimensions
            .insert(&var.full_path, dimension.size, dimension.unlimited)?;
        dimension.set_name(&var.full_path);
        candidates.push((var.full_path.clone(), dimension.size));
    }
    file.state.coards = true;
    name_axes_by_size(file, &candidates)
}

/// Name axes from the comma separated `DimensionNames` attribute of GPM variables.
///
/// Empty names are left for placeholders.
pub(super) fn name_gpm_dimensions(file: &mut File) -> Result<(), NormalizeError> {
    for var in file.vars.values_mut() {
        let Some(dimension_names) = var.string_attribute(GPM_DIMENSION_NAMES) else {
            continue;
        };
        let names: Vec<&str> = dimension_names.split(',').collect();
        if names.len() != var.dimensions.len() {
            return Err(normalize_err!(
                "{} has {} dimension names but rank {}",
                var.full_path,
                names.len(),
                var.dimensions.len()
            ));
        }
        for (dimension, name) in var.dimensions.iter_mut().zip(names) {
            if !name.is_empty() {
                file.dimensions
                    .insert(name, dimension.size, dimension.unlimited)?;
                dimension.set_name(name);
            }
        }
    }
    Ok(())
}

/// Name the axes of the Aquarius level 3 data variable `lat` and `lon`.
pub(super) fn name_aquarius_dimensions(file: &mut File) -> Result<(), NormalizeError> {
    for var in file.vars.values_mut().filter(|var| var.name == AQUARIUS_DATA) {
        if var.dimensions.len() != 2 {
            return Err(normalize_err!(
                "the Aquarius data variable {} has rank {}, expected 2",
                var.full_path,
                var.dimensions.len()
            ));
        }
        let [lat, lon] = var.dimensions.as_mut_slice() else {
            continue;
        };
        file.dimensions.insert("lat", lat.size, lat.unlimited)?;
        lat.set_name("lat");
        file.dimensions.insert("lon", lon.size, lon.unlimited)?;
        lon.set_name("lon");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{Attribute, Dimension, Var},
    };

    fn gpm_var(path: &str, shape: &[u64], dimension_names: &str) -> Var {
        let mut var = Var::new(path, Datatype::Float32);
        var.dimensions = shape.iter().map(|size| Dimension::new(*size, false)).collect();
        var.attributes
            .push(Attribute::new_string(GPM_DIMENSION_NAMES, dimension_names));
        var
    }

    #[test]
    fn producer_gpm_dimension_names() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(gpm_var("/S1/Latitude", &[10, 20], "nscan,npixel"));
        file.vars.insert(gpm_var("/S1/flag", &[10, 4], "nscan,"));
        name_gpm_dimensions(&mut file)?;
        let flag = file.var("/S1/flag").unwrap();
        assert_eq!(flag.dimensions()[0].name(), "nscan");
        assert_eq!(flag.dimensions()[1].name(), "");
        assert_eq!(file.dimensions().names(), vec!["npixel", "nscan"]);
        Ok(())
    }

    #[test]
    fn producer_gpm_dimension_names_mismatch() {
        let mut file = File::new(Config::default());
        file.vars.insert(gpm_var("/S1/Latitude", &[10, 20], "nscan"));
        assert!(name_gpm_dimensions(&mut file).is_err());

        let mut file = File::new(Config::default());
        file.vars.insert(gpm_var("/S1/a", &[10], "nscan"));
        file.vars.insert(gpm_var("/S1/b", &[11], "nscan"));
        assert!(name_gpm_dimensions(&mut file).is_err());
    }

    fn sized_var(path: &str, shape: &[u64]) -> Var {
        let mut var = Var::new(path, Datatype::Float32);
        var.dimensions = shape.iter().map(|size| Dimension::new(*size, false)).collect();
        var
    }

    fn names(file: &File, path: &str) -> Vec<String> {
        file.var(path)
            .map(|var| var.dimensions().iter().map(|d| d.name().to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn producer_smap_grid() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(sized_var("/Soil/cell_lat", &[4, 6]));
        file.vars.insert(sized_var("/Soil/cell_lon", &[4, 6]));
        file.vars.insert(sized_var("/Soil/moisture", &[4, 6]));
        file.vars.insert(sized_var("/Soil/square", &[4, 4]));
        file.vars.insert(sized_var("/Soil/flags", &[3]));
        name_smap_dimensions(&mut file)?;
        assert_eq!(names(&file, "/Soil/moisture"), vec!["YDim", "XDim"]);
        assert_eq!(names(&file, "/Soil/square"), vec!["YDim", ""]);
        assert_eq!(names(&file, "/Soil/flags"), vec![""]);
        assert_eq!(file.dimensions().names(), vec!["XDim", "YDim"]);

        let mut file = File::new(Config::default());
        file.vars.insert(sized_var("/cell_lat", &[4]));
        assert!(name_smap_dimensions(&mut file).is_err());
        Ok(())
    }

    #[test]
    fn producer_ozone_coordinates() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(sized_var("/Data/Latitude", &[18]));
        file.vars.insert(sized_var("/Data/Time", &[12]));
        file.vars.insert(sized_var("/Data/ColumnAmountO3", &[12, 18]));
        file.vars.insert(sized_var("/Data/Other", &[5]));
        name_ozone_dimensions(&mut file)?;
        assert_eq!(names(&file, "/Data/Latitude"), vec!["/Data/Latitude"]);
        assert_eq!(names(&file, "/Data/ColumnAmountO3"), vec!["/Data/Time", "/Data/Latitude"]);
        assert_eq!(names(&file, "/Data/Other"), vec![""]);
        assert!(file.is_coards());

        let mut file = File::new(Config::default());
        file.vars.insert(sized_var("/Data/Time", &[12, 2]));
        assert!(name_ozone_dimensions(&mut file).is_err());
        Ok(())
    }

    #[test]
    fn producer_aquarius() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        let mut data = Var::new("/l3m_data", Datatype::Float32);
        data.dimensions = vec![Dimension::new(180, false), Dimension::new(360, false)];
        file.vars.insert(data);
        name_aquarius_dimensions(&mut file)?;
        assert_eq!(file.dimensions().get("lat").map(|entry| entry.size), Some(180));
        assert_eq!(file.dimensions().get("lon").map(|entry| entry.size), Some(360));
        Ok(())
    }
}
