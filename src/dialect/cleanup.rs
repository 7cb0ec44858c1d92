use crate::model::{File, Pattern, Producer};

/// The name prefix netCDF-4 gives a variable that shares its name with a dimension but is not its coordinate.
pub(crate) const NC4_NON_COORD_PREFIX: &str = "_nc4_non_coord_";

/// Remove objects that only exist to describe the layout of the file.
///
/// In dimension scale files, the pure netCDF-4 dimension datasets shadowed by a `_nc4_non_coord_` variable are removed.
/// In new GPM level 3 files, groups without attributes are removed.
pub(crate) fn remove_unneeded_objects(file: &mut File) {
    if file.producer == Producer::General && file.pattern == Pattern::DimensionScale {
        let shadows: Vec<String> = file
            .vars
            .values()
            .filter_map(|var| {
                var.name
                    .strip_prefix(NC4_NON_COORD_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| format!("{}{name}", var.group_path()))
            })
            .collect();
        if shadows.is_empty() {
            return;
        }
        file.state.has_nc4_non_coord = true;
        file.state.nc4_shadow_paths.extend(shadows);
        let shadow_paths = &file.state.nc4_shadow_paths;
        for var in file
            .vars
            .take_where(|var| shadow_paths.contains(&var.full_path))
        {
            tracing::debug!(var = %var.full_path, "remove netCDF-4 dimension shadowed by a non-coordinate variable");
        }
    } else if file.producer == Producer::GpmL3New {
        file.groups.retain(|group| !group.attributes.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, datatype::Datatype, model::{Group, Var}};

    #[test]
    fn cleanup_nc4_shadow_dimension() {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::DimensionScale;
        file.vars.insert(Var::new("/g/time", Datatype::Float64));
        file.vars.insert(Var::new("/g/_nc4_non_coord_time", Datatype::Float32));
        file.vars.insert(Var::new("/time", Datatype::Float64));
        remove_unneeded_objects(&mut file);
        assert!(file.var("/g/time").is_none());
        assert!(file.var("/time").is_some());
        assert!(file.state.has_nc4_non_coord);
        assert!(file.state.nc4_shadow_paths.contains("/g/time"));
    }

    #[test]
    fn cleanup_empty_gpm_groups() {
        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL3New;
        file.groups.insert(Group::new("/Grid"));
        remove_unneeded_objects(&mut file);
        assert!(file.groups().is_empty());
    }
}
