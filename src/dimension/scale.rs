use crate::{
    container::{ObjectHandle, ObjectPath, ReadableContainerTraits},
    dialect::is_dimension_scale_var,
    model::File,
    normalize::NormalizeError,
};

/// Name axes from the dimension scales attached to them.
///
/// An axis with an attached scale takes the full path of its first scale.
/// A dimension scale with no dimension list of its own names its only axis by its own full path.
/// Dimension scales that are not 1-D are dropped.
pub(super) fn name_scale_dimensions(
    container: &dyn ReadableContainerTraits,
    file: &mut File,
) -> Result<(), NormalizeError> {
    for key in file.vars.keys() {
        let Some(var) = file.vars.get(key) else {
            continue;
        };
        if var.has_attribute("DIMENSION_LIST") {
            let handle = ObjectHandle::open(container, &ObjectPath::new(&var.full_path)?)?;
            let dimension_list = handle.dimension_list()?;
            drop(handle);
            let Some(var) = file.vars.get_mut(key) else {
                continue;
            };
            if dimension_list.len() != var.dimensions.len() {
                return Err(normalize_err!(
                    "the dimension list of {} has {} axes but the variable has rank {}",
                    var.full_path,
                    dimension_list.len(),
                    var.dimensions.len()
                ));
            }
            for (dimension, scales) in var.dimensions.iter_mut().zip(&dimension_list) {
                if let Some(scale) = scales.first() {
                    file.dimensions
                        .insert(scale.as_str(), dimension.size, dimension.unlimited)?;
                    dimension.set_name(scale.as_str());
                }
            }
        } else if is_dimension_scale_var(var) {
            if var.rank() == 1 {
                let Some(var) = file.vars.get_mut(key) else {
                    continue;
                };
                let full_path = var.full_path.clone();
                let dimension = &mut var.dimensions[0];
                file.dimensions
                    .insert(&full_path, dimension.size, dimension.unlimited)?;
                dimension.set_name(&full_path);
            } else if let Some(var) = file.vars.remove(key) {
                tracing::debug!(var = %var.full_path, rank = var.rank(), "drop dimension scale that is not 1-D");
                file.diagnostics.ignored_var_dataspace(&var.full_path);
            }
        }
    }
    file.state.coards = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        container::{MemoryContainerBuilder, MemoryDataset, RawAttribute},
        datatype::Datatype,
        model::{Dimension, Var},
        walker::walk,
    };

    #[test]
    fn scale_dimension_list() -> Result<(), Box<dyn std::error::Error>> {
        let container = MemoryContainerBuilder::new()
            .group("/g")?
            .dataset("/g/y", MemoryDataset::dimension_scale(Datatype::Float32, 3))?
            .dataset("/x", MemoryDataset::dimension_scale(Datatype::Float64, 4))?
            .dataset(
                "/g/t",
                MemoryDataset::simple(Datatype::Int16, &[3, 4])
                    .with_dimension_scales(&["/g/y", "/x"])?,
            )?
            .dataset(
                "/bad",
                MemoryDataset::simple(Datatype::Int16, &[2, 2])
                    .with_attribute(RawAttribute::string("CLASS", "DIMENSION_SCALE")),
            )?
            .build();
        let mut config = Config::default();
        config.set_emit_diagnostics(true);
        let mut file = File::new(config);
        walk(&container, &mut file)?;
        name_scale_dimensions(&container, &mut file)?;
        assert_eq!(container.open_handle_count(), 0);

        let t = file.var("/g/t").unwrap();
        assert_eq!(t.dimensions()[0].name(), "/g/y");
        assert_eq!(t.dimensions()[1].name(), "/x");
        assert_eq!(file.var("/x").unwrap().dimensions()[0].name(), "/x");
        assert!(file.var("/bad").is_none());
        assert!(!file.diagnostics().is_empty());
        assert!(file.is_coards());
        assert_eq!(file.dimensions().names(), vec!["/g/y", "/x"]);
        Ok(())
    }

    #[test]
    fn scale_failed_dereference_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let container = MemoryContainerBuilder::new().build();
        let mut file = File::new(Config::default());
        let mut var = Var::new("/t", Datatype::Int8);
        var.dimensions.push(Dimension::new(2, false));
        var.attributes
            .push(crate::model::Attribute::new_string("DIMENSION_LIST", ""));
        file.vars.insert(var);
        assert!(name_scale_dimensions(&container, &mut file).is_err());
        assert_eq!(container.open_handle_count(), 0);
        Ok(())
    }
}
