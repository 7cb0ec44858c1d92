use crate::{model::File, normalize::NormalizeError};

/// Give the axes of every variable that match the 2-D latitude's shape the latitude's dimension names.
///
/// In each variable, the first axis of the latitude's first size and the next later axis of its second size are renamed.
pub(super) fn name_lat_lon_2d(file: &mut File) -> Result<(), NormalizeError> {
    let latitude = file
        .state
        .latitude
        .as_deref()
        .ok_or_else(|| normalize_err!("the 2-D lat/lon pattern has no latitude"))?;
    let lat = file
        .var(latitude)
        .ok_or_else(|| normalize_err!("the 2-D latitude {latitude} does not exist"))?;
    let [dim0, dim1] = lat.dimensions() else {
        return Err(normalize_err!(
            "the 2-D latitude {latitude} has rank {}",
            lat.rank()
        ));
    };
    let (name0, size0) = (dim0.name().to_string(), dim0.size());
    let (name1, size1) = (dim1.name().to_string(), dim1.size());

    for var in file.vars.values_mut() {
        let axes = var.dimensions.iter().enumerate().find_map(|(i, dimension)| {
            if dimension.size != size0 {
                return None;
            }
            var.dimensions[i + 1..]
                .iter()
                .position(|dimension| dimension.size == size1)
                .map(|offset| (i, i + 1 + offset))
        });
        if let Some((i, j)) = axes {
            var.dimensions[i].set_name(&name0);
            var.dimensions[j].set_name(&name1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        datatype::Datatype,
        model::{Dimension, Var},
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

    #[test]
    fn lat_lon_2d_rename() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.state.latitude = Some("/lat".to_string());
        file.vars.insert(named_var("/lat", &[("FakeDim0", 3), ("FakeDim1", 4)]));
        file.vars.insert(named_var(
            "/t",
            &[("FakeDim5", 4), ("FakeDim6", 3), ("FakeDim7", 9), ("FakeDim8", 4)],
        ));
        file.vars.insert(named_var("/u", &[("FakeDim8", 4), ("FakeDim6", 3)]));
        name_lat_lon_2d(&mut file)?;

        let t: Vec<&str> = file.var("/t").unwrap().dimensions().iter().map(Dimension::name).collect();
        assert_eq!(t, vec!["FakeDim5", "FakeDim0", "FakeDim7", "FakeDim1"]);
        let u: Vec<&str> = file.var("/u").unwrap().dimensions().iter().map(Dimension::name).collect();
        assert_eq!(u, vec!["FakeDim8", "FakeDim6"]);
        Ok(())
    }

    #[test]
    fn lat_lon_2d_requires_rank_2_latitude() {
        let mut file = File::new(Config::default());
        file.state.latitude = Some("/lat".to_string());
        file.vars.insert(named_var("/lat", &[("FakeDim0", 3)]));
        assert!(name_lat_lon_2d(&mut file).is_err());
    }
}
