//! The graph walker.
//!
//! Visits the container depth first from the root and populates a [`File`] with its groups, variables, dimensions, and attributes.
//! Links and named datatypes are skipped and recorded in the diagnostics.
//! Every object is opened through an [`ObjectHandle`], so it is closed on every exit path.

use crate::{
    container::{
        Dataspace, DatasetInfo, MemberKind, ObjectHandle, ObjectPath, RawAttribute,
        ReadableContainerTraits,
    },
    model::{Attribute, Dimension, File, Group, Var},
    normalize::NormalizeError,
};

/// Walk `container` into `file`.
///
/// # Errors
/// Returns a [`NormalizeError`] if the root cannot be opened, a group cannot be listed, or a dataset's datatype or shape cannot be read.
pub fn walk(container: &dyn ReadableContainerTraits, file: &mut File) -> Result<(), NormalizeError> {
    let root = ObjectHandle::open(container, &ObjectPath::root())?;
    let (attributes, unsupported) = read_attributes(&root, file.config.support_int64())?;
    file.root_attributes = attributes;
    file.root_unsupported_attribute_type = unsupported;
    walk_group(container, &root, file)
}

fn walk_group(
    container: &dyn ReadableContainerTraits,
    group: &ObjectHandle,
    file: &mut File,
) -> Result<(), NormalizeError> {
    for member in group.members()? {
        let path = group.path().join(&member.name)?;
        match member.kind {
            MemberKind::Group => {
                let child = ObjectHandle::open(container, &path)?;
                let mut entity = Group::new(path.as_str());
                let (attributes, unsupported) = read_attributes(&child, file.config.support_int64())?;
                entity.attributes = attributes;
                entity.unsupported_attribute_type = unsupported;
                file.groups.insert(entity);
                walk_group(container, &child, file)?;
            }
            MemberKind::Dataset => {
                let dataset = ObjectHandle::open(container, &path)?;
                let var = read_var(&dataset, file.config.support_int64())?;
                tracing::trace!(var = %path, datatype = %var.datatype, rank = var.rank(), "walk dataset");
                file.vars.insert(var);
            }
            MemberKind::NamedDatatype => {
                file.diagnostics
                    .ignored_named_datatype(group.path().as_str(), &member.name);
            }
            MemberKind::SoftLink { target } => {
                file.diagnostics.ignored_link(path.as_str(), &target);
            }
            MemberKind::ExternalLink {
                file: external,
                target,
            } => {
                file.diagnostics
                    .ignored_link(path.as_str(), &format!("{external}:{target}"));
            }
        }
    }
    Ok(())
}

fn read_var(dataset: &ObjectHandle, support_int64: bool) -> Result<Var, NormalizeError> {
    let DatasetInfo {
        datatype,
        dataspace,
        storage_size,
    } = dataset.dataset_info()?;
    let mut var = Var::new(dataset.path().as_str(), datatype);
    match dataspace {
        Dataspace::Null => var.unsupported_dataspace = true,
        Dataspace::Scalar => var.unsupported_dataspace = !datatype.is_string(),
        Dataspace::Simple(extents) => {
            var.unsupported_dataspace = extents.iter().any(|extent| extent.size == 0);
            var.dimensions = extents
                .into_iter()
                .map(|extent| Dimension::new(extent.size, extent.unlimited))
                .collect();
        }
    }
    var.zero_storage = storage_size == 0;
    if datatype.is_string() && !var.unsupported_dataspace {
        let values = dataset.string_values()?;
        var.longest_string = values.iter().map(String::len).max().unwrap_or(0);
        var.string_value = values.into_iter().next();
    }
    let (attributes, unsupported) = read_attributes(dataset, support_int64)?;
    var.attributes = attributes;
    var.unsupported_attribute_type = unsupported;
    Ok(var)
}

/// Read the attributes of `object`, and whether any has an unsupported datatype.
fn read_attributes(
    object: &ObjectHandle,
    support_int64: bool,
) -> Result<(Vec<Attribute>, bool), NormalizeError> {
    let raw = object.attributes()?;
    let unsupported = raw
        .iter()
        .any(|attribute: &RawAttribute| !attribute.datatype.is_supported(support_int64));
    Ok((raw.into_iter().map(Attribute::from_raw).collect(), unsupported))
}
