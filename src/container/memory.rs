use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

use crate::datatype::{CharacterSet, Datatype};

use super::{
    ContainerError, DatasetInfo, Dataspace, Member, MemberKind, ObjectId, ObjectPath,
    RawAttribute, RawAttributeData, ReadableContainerTraits,
};

/// A dataset held by a [`MemoryContainer`].
#[derive(Clone, Debug)]
pub struct MemoryDataset {
    info: DatasetInfo,
    attributes: Vec<RawAttribute>,
    dimension_list: Option<Vec<Vec<ObjectPath>>>,
    strings: Vec<String>,
}

impl MemoryDataset {
    /// Create a new dataset.
    ///
    /// The storage size defaults to the number of elements multiplied by the element size (one byte per element for non-numeric types).
    #[must_use]
    pub fn new(datatype: Datatype, dataspace: Dataspace) -> Self {
        let element_size = datatype.element_size().unwrap_or(1) as u64;
        let storage_size = dataspace.num_elements() * element_size;
        Self {
            info: DatasetInfo {
                datatype,
                dataspace,
                storage_size,
            },
            attributes: Vec::new(),
            dimension_list: None,
            strings: Vec::new(),
        }
    }

    /// Create a new dataset with a simple dataspace of `shape`.
    #[must_use]
    pub fn simple(datatype: Datatype, shape: &[u64]) -> Self {
        Self::new(datatype, Dataspace::simple(shape))
    }

    /// Create a one-dimensional dimension scale dataset with the `CLASS` and `REFERENCE_LIST` attributes set.
    #[must_use]
    pub fn dimension_scale(datatype: Datatype, size: u64) -> Self {
        Self::simple(datatype, &[size])
            .with_attribute(RawAttribute::string("CLASS", "DIMENSION_SCALE"))
            .with_attribute(RawAttribute::reference_list())
    }

    /// Set the allocated storage size.
    #[must_use]
    pub fn with_storage_size(mut self, storage_size: u64) -> Self {
        self.info.storage_size = storage_size;
        self
    }

    /// Set the elements of a string dataset.
    ///
    /// The storage size becomes the total length of the elements.
    #[must_use]
    pub fn with_strings(mut self, values: &[&str]) -> Self {
        self.strings = values.iter().map(ToString::to_string).collect();
        self.info.storage_size = values.iter().map(|value| value.len() as u64).sum();
        self
    }

    /// Append an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: RawAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Attach dimension scales to each axis, adding the `DIMENSION_LIST` attribute.
    #[must_use]
    pub fn with_dimension_list(mut self, dimension_list: Vec<Vec<ObjectPath>>) -> Self {
        let rank = dimension_list.len() as u64;
        self.attributes.retain(|attribute| attribute.name != "DIMENSION_LIST");
        self.attributes.push(RawAttribute {
            name: "DIMENSION_LIST".to_string(),
            datatype: Datatype::VariableLength,
            dataspace: Dataspace::simple(&[rank]),
            cset: CharacterSet::Ascii,
            data: RawAttributeData::Unread,
        });
        self.dimension_list = Some(dimension_list);
        self
    }

    /// Attach one dimension scale per axis from the scale `paths`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if a path is invalid.
    pub fn with_dimension_scales(self, paths: &[&str]) -> Result<Self, ContainerError> {
        let dimension_list = paths
            .iter()
            .map(|path| Ok(vec![ObjectPath::new(path)?]))
            .collect::<Result<Vec<_>, ContainerError>>()?;
        Ok(self.with_dimension_list(dimension_list))
    }
}

#[derive(Clone, Debug)]
enum MemoryObject {
    Group {
        attributes: Vec<RawAttribute>,
        members: Vec<Member>,
    },
    Dataset(MemoryDataset),
    NamedDatatype,
}

impl MemoryObject {
    fn new_group() -> Self {
        Self::Group {
            attributes: Vec::new(),
            members: Vec::new(),
        }
    }
}

/// An in-memory container.
///
/// Open handles are tracked, so tests can check that every object opened during normalization is closed again with [`MemoryContainer::open_handle_count`].
#[derive(Debug)]
pub struct MemoryContainer {
    objects: BTreeMap<ObjectPath, MemoryObject>,
    handles: Mutex<HashMap<ObjectId, ObjectPath>>,
    next_handle: AtomicU64,
}

impl MemoryContainer {
    fn from_objects(objects: BTreeMap<ObjectPath, MemoryObject>) -> Self {
        Self {
            objects,
            handles: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Create a memory container from a [JSON description](super::description).
    ///
    /// # Errors
    /// Returns [`ContainerError::InvalidDescription`] if `json` is not a valid description.
    pub fn from_json(json: &str) -> Result<Self, ContainerError> {
        super::description::container_from_json(json)
    }

    /// The number of currently open object handles.
    #[must_use]
    pub fn open_handle_count(&self) -> usize {
        self.handles.lock().len()
    }

    fn object(&self, id: ObjectId) -> Result<(ObjectPath, &MemoryObject), ContainerError> {
        let path = self
            .handles
            .lock()
            .get(&id)
            .cloned()
            .ok_or(ContainerError::InvalidHandle(id))?;
        let object = self
            .objects
            .get(&path)
            .ok_or_else(|| ContainerError::NotFound(path.to_string()))?;
        Ok((path, object))
    }
}

impl ReadableContainerTraits for MemoryContainer {
    fn open(&self, path: &ObjectPath) -> Result<ObjectId, ContainerError> {
        match self.objects.get(path) {
            Some(MemoryObject::Group { .. } | MemoryObject::Dataset(_)) => {
                let id = ObjectId(self.next_handle.fetch_add(1, Ordering::Relaxed));
                self.handles.lock().insert(id, path.clone());
                Ok(id)
            }
            Some(MemoryObject::NamedDatatype) => Err(ContainerError::UnexpectedKind(
                path.to_string(),
                "group or dataset",
            )),
            None => Err(ContainerError::NotFound(path.to_string())),
        }
    }

    fn close(&self, id: ObjectId) -> Result<(), ContainerError> {
        self.handles
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or(ContainerError::InvalidHandle(id))
    }

    fn members(&self, group: ObjectId) -> Result<Vec<Member>, ContainerError> {
        match self.object(group)? {
            (_, MemoryObject::Group { members, .. }) => Ok(members.clone()),
            (path, _) => Err(ContainerError::UnexpectedKind(path.to_string(), "group")),
        }
    }

    fn attributes(&self, object: ObjectId) -> Result<Vec<RawAttribute>, ContainerError> {
        match self.object(object)? {
            (_, MemoryObject::Group { attributes, .. }) => Ok(attributes.clone()),
            (_, MemoryObject::Dataset(dataset)) => Ok(dataset.attributes.clone()),
            (path, MemoryObject::NamedDatatype) => Err(ContainerError::UnexpectedKind(
                path.to_string(),
                "group or dataset",
            )),
        }
    }

    fn dataset_info(&self, dataset: ObjectId) -> Result<DatasetInfo, ContainerError> {
        match self.object(dataset)? {
            (_, MemoryObject::Dataset(dataset)) => Ok(dataset.info.clone()),
            (path, _) => Err(ContainerError::UnexpectedKind(path.to_string(), "dataset")),
        }
    }

    fn dimension_list(&self, dataset: ObjectId) -> Result<Vec<Vec<ObjectPath>>, ContainerError> {
        let (path, object) = self.object(dataset)?;
        let MemoryObject::Dataset(dataset) = object else {
            return Err(ContainerError::UnexpectedKind(path.to_string(), "dataset"));
        };
        let dimension_list = dataset
            .dimension_list
            .as_ref()
            .ok_or_else(|| format!("dataset {path} has no dimension list"))?;
        for target in dimension_list.iter().flatten() {
            if !matches!(self.objects.get(target), Some(MemoryObject::Dataset(_))) {
                return Err(ContainerError::Other(format!(
                    "cannot dereference dimension scale {target} of dataset {path}"
                )));
            }
        }
        Ok(dimension_list.clone())
    }

    fn string_values(&self, dataset: ObjectId) -> Result<Vec<String>, ContainerError> {
        match self.object(dataset)? {
            (_, MemoryObject::Dataset(dataset)) if dataset.info.datatype.is_string() => {
                Ok(dataset.strings.clone())
            }
            (path, _) => Err(ContainerError::UnexpectedKind(
                path.to_string(),
                "string dataset",
            )),
        }
    }
}

/// A [`MemoryContainer`] builder.
///
/// Intermediate groups are created as needed.
///
/// ### Example
/// ```rust
/// # use h5cf::container::{MemoryContainerBuilder, MemoryDataset, RawAttribute};
/// # use h5cf::datatype::Datatype;
/// let container = MemoryContainerBuilder::new()
///     .dataset("/lat", MemoryDataset::dimension_scale(Datatype::Float32, 10))?
///     .dataset("/lon", MemoryDataset::dimension_scale(Datatype::Float32, 20))?
///     .dataset(
///         "/temp",
///         MemoryDataset::simple(Datatype::Float32, &[10, 20])
///             .with_dimension_scales(&["/lat", "/lon"])?
///             .with_attribute(RawAttribute::string("units", "K")),
///     )?
///     .build();
/// # Ok::<_, h5cf::container::ContainerError>(())
/// ```
#[derive(Debug)]
pub struct MemoryContainerBuilder {
    objects: BTreeMap<ObjectPath, MemoryObject>,
}

impl Default for MemoryContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContainerBuilder {
    /// Create a new builder with an empty root group.
    #[must_use]
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(ObjectPath::root(), MemoryObject::new_group());
        Self { objects }
    }

    /// Build the container.
    #[must_use]
    pub fn build(self) -> MemoryContainer {
        MemoryContainer::from_objects(self.objects)
    }

    fn ensure_group(&mut self, path: &ObjectPath) -> Result<(), ContainerError> {
        match self.objects.get(path) {
            Some(MemoryObject::Group { .. }) => Ok(()),
            Some(_) => Err(ContainerError::UnexpectedKind(path.to_string(), "group")),
            None => {
                self.add_member(path, MemberKind::Group)?;
                self.objects.insert(path.clone(), MemoryObject::new_group());
                Ok(())
            }
        }
    }

    fn add_member(&mut self, path: &ObjectPath, kind: MemberKind) -> Result<(), ContainerError> {
        let parent = path
            .parent()
            .ok_or_else(|| ContainerError::Other("the root group cannot be a member".into()))?;
        self.ensure_group(&parent)?;
        if let Some(MemoryObject::Group { members, .. }) = self.objects.get_mut(&parent) {
            let name = path.name().to_string();
            if members.iter().any(|member| member.name == name) {
                return Err(ContainerError::Other(format!("{path} already exists")));
            }
            members.push(Member { name, kind });
        }
        Ok(())
    }

    /// Add a group at `path`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `path` is invalid or an ancestor is not a group.
    pub fn group(mut self, path: &str) -> Result<Self, ContainerError> {
        self.ensure_group(&ObjectPath::new(path)?)?;
        Ok(self)
    }

    /// Add a dataset at `path`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `path` is invalid or already exists.
    pub fn dataset(mut self, path: &str, dataset: MemoryDataset) -> Result<Self, ContainerError> {
        let path = ObjectPath::new(path)?;
        self.add_member(&path, MemberKind::Dataset)?;
        self.objects.insert(path, MemoryObject::Dataset(dataset));
        Ok(self)
    }

    /// Add a named datatype at `path`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `path` is invalid or already exists.
    pub fn named_datatype(mut self, path: &str) -> Result<Self, ContainerError> {
        let path = ObjectPath::new(path)?;
        self.add_member(&path, MemberKind::NamedDatatype)?;
        self.objects.insert(path, MemoryObject::NamedDatatype);
        Ok(self)
    }

    /// Add a soft link at `path` to `target`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `path` is invalid or already exists.
    pub fn soft_link(mut self, path: &str, target: &str) -> Result<Self, ContainerError> {
        let kind = MemberKind::SoftLink {
            target: target.to_string(),
        };
        self.add_member(&ObjectPath::new(path)?, kind)?;
        Ok(self)
    }

    /// Add an external link at `path` to `target` in `file`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `path` is invalid or already exists.
    pub fn external_link(
        mut self,
        path: &str,
        file: &str,
        target: &str,
    ) -> Result<Self, ContainerError> {
        let kind = MemberKind::ExternalLink {
            file: file.to_string(),
            target: target.to_string(),
        };
        self.add_member(&ObjectPath::new(path)?, kind)?;
        Ok(self)
    }

    /// Append an attribute to the group or dataset at `path`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if there is no group or dataset at `path`.
    pub fn attribute(mut self, path: &str, attribute: RawAttribute) -> Result<Self, ContainerError> {
        let path = ObjectPath::new(path)?;
        match self.objects.get_mut(&path) {
            Some(MemoryObject::Group { attributes, .. }) => attributes.push(attribute),
            Some(MemoryObject::Dataset(dataset)) => dataset.attributes.push(attribute),
            Some(MemoryObject::NamedDatatype) => {
                return Err(ContainerError::UnexpectedKind(
                    path.to_string(),
                    "group or dataset",
                ))
            }
            None => return Err(ContainerError::NotFound(path.to_string())),
        }
        Ok(self)
    }
}
