//! Read access to hierarchical containers.
//!
//! A container holds a tree of groups and datasets with typed attributes, soft and external links, named datatypes, and dimension scales.
//! The normalization engine reads structural metadata through [`ReadableContainerTraits`].
//! The only values it reads are the elements of string datasets; numeric array values are never requested.
//!
//! Every object opened through the container is held by an [`ObjectHandle`] which closes the object when dropped.
//! This guarantees handles are released on every exit path, including early returns with `?`.
//!
//! This module provides:
//!  - the [`MemoryContainer`], an in-memory container populated with a [`MemoryContainerBuilder`] or from a [JSON description](description),
//!  - the [`UsageLogContainerAdapter`], which logs container calls to a writer.

mod object_path;
pub use object_path::{ObjectPath, ObjectPathError};

pub mod description;
mod memory;
pub use memory::{MemoryContainer, MemoryContainerBuilder, MemoryDataset};

mod usage_log;
pub use usage_log::UsageLogContainerAdapter;

use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datatype::{CharacterSet, Datatype};

/// [`Arc`] wrapped readable container.
pub type ReadableContainer = Arc<dyn ReadableContainerTraits>;

/// An identifier of an open container object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("handle {_0}")]
pub struct ObjectId(pub u64);

/// The kind of a group member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    /// A group.
    Group,
    /// A dataset.
    Dataset,
    /// A committed (named) datatype.
    NamedDatatype,
    /// A soft link to `target`.
    SoftLink {
        /// The link target path.
        target: String,
    },
    /// An external link to `target` in `file`.
    ExternalLink {
        /// The external file name.
        file: String,
        /// The object path in the external file.
        target: String,
    },
}

/// A group member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// The member name.
    pub name: String,
    /// The member kind.
    pub kind: MemberKind,
}

/// One axis of a simple dataspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    /// The current size.
    pub size: u64,
    /// True if the maximum size is unlimited.
    #[serde(default)]
    pub unlimited: bool,
}

impl Extent {
    /// Create a fixed size extent.
    #[must_use]
    pub const fn new(size: u64) -> Self {
        Self {
            size,
            unlimited: false,
        }
    }

    /// Create an extent with an unlimited maximum size.
    #[must_use]
    pub const fn unlimited(size: u64) -> Self {
        Self {
            size,
            unlimited: true,
        }
    }
}

/// The shape of a dataset or attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dataspace {
    /// The null dataspace, holding no elements.
    Null,
    /// A single element.
    Scalar,
    /// A multidimensional array.
    Simple(Vec<Extent>),
}

impl Dataspace {
    /// Create a simple dataspace with fixed size extents.
    #[must_use]
    pub fn simple(shape: &[u64]) -> Self {
        Self::Simple(shape.iter().copied().map(Extent::new).collect())
    }

    /// The number of elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        match self {
            Self::Null => 0,
            Self::Scalar => 1,
            Self::Simple(extents) => extents.iter().map(|extent| extent.size).product(),
        }
    }
}

/// Structural information of a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetInfo {
    /// The element datatype.
    pub datatype: Datatype,
    /// The shape.
    pub dataspace: Dataspace,
    /// The allocated storage size in bytes.
    pub storage_size: u64,
}

/// Raw attribute data as returned by a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawAttributeData {
    /// Little-endian numeric elements.
    Bytes(Vec<u8>),
    /// Fixed-length strings of `size` bytes each, possibly NUL padded.
    FixedStrings {
        /// The size of each string element.
        size: usize,
        /// The concatenated string elements.
        bytes: Vec<u8>,
    },
    /// Variable-length strings.
    Strings(Vec<String>),
    /// The data was not read because the datatype is unsupported.
    Unread,
}

/// An attribute as returned by a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAttribute {
    /// The attribute name.
    pub name: String,
    /// The element datatype.
    pub datatype: Datatype,
    /// The attribute shape.
    pub dataspace: Dataspace,
    /// The character set of string attributes.
    pub cset: CharacterSet,
    /// The attribute data.
    pub data: RawAttributeData,
}

impl RawAttribute {
    fn numeric(name: &str, datatype: Datatype, count: usize, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            dataspace: Dataspace::simple(&[count as u64]),
            cset: CharacterSet::Ascii,
            data: RawAttributeData::Bytes(bytes),
        }
    }

    /// Create a scalar fixed-length string attribute.
    #[must_use]
    pub fn string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            datatype: Datatype::FixedString,
            dataspace: Dataspace::Scalar,
            cset: CharacterSet::Ascii,
            data: RawAttributeData::FixedStrings {
                size: value.len(),
                bytes: value.as_bytes().to_vec(),
            },
        }
    }

    /// Create a one-dimensional variable-length string attribute.
    #[must_use]
    pub fn strings(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            datatype: Datatype::VariableString,
            dataspace: Dataspace::simple(&[values.len() as u64]),
            cset: CharacterSet::Utf8,
            data: RawAttributeData::Strings(values.iter().map(ToString::to_string).collect()),
        }
    }

    /// Create a one-dimensional `int32` attribute.
    #[must_use]
    pub fn int32(name: &str, values: &[i32]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::numeric(name, Datatype::Int32, values.len(), bytes)
    }

    /// Create a one-dimensional `int64` attribute.
    #[must_use]
    pub fn int64(name: &str, values: &[i64]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::numeric(name, Datatype::Int64, values.len(), bytes)
    }

    /// Create a one-dimensional `float32` attribute.
    #[must_use]
    pub fn float32(name: &str, values: &[f32]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::numeric(name, Datatype::Float32, values.len(), bytes)
    }

    /// Create a one-dimensional `float64` attribute.
    #[must_use]
    pub fn float64(name: &str, values: &[f64]) -> Self {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::numeric(name, Datatype::Float64, values.len(), bytes)
    }

    /// Create an attribute of an unsupported `datatype` whose data is not read.
    #[must_use]
    pub fn unread(name: &str, datatype: Datatype, count: u64) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            dataspace: Dataspace::simple(&[count]),
            cset: CharacterSet::Ascii,
            data: RawAttributeData::Unread,
        }
    }

    /// Create the `REFERENCE_LIST` attribute of a dimension scale.
    #[must_use]
    pub fn reference_list() -> Self {
        Self::unread("REFERENCE_LIST", Datatype::Compound, 1)
    }

    /// Create an attribute with the null dataspace.
    #[must_use]
    pub fn null(name: &str, datatype: Datatype) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            dataspace: Dataspace::Null,
            cset: CharacterSet::Ascii,
            data: RawAttributeData::Bytes(Vec::new()),
        }
    }
}

/// Readable container traits.
pub trait ReadableContainerTraits: Send + Sync {
    /// Open the group or dataset at `path`.
    ///
    /// Prefer [`ObjectHandle::open`], which closes the object when dropped.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if the object does not exist or cannot be opened.
    fn open(&self, path: &ObjectPath) -> Result<ObjectId, ContainerError>;

    /// Close an object opened with [`open`](ReadableContainerTraits::open).
    ///
    /// # Errors
    /// Returns [`ContainerError::InvalidHandle`] if `id` is not open.
    fn close(&self, id: ObjectId) -> Result<(), ContainerError>;

    /// List the members of an open group in creation order.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `group` is not an open group.
    fn members(&self, group: ObjectId) -> Result<Vec<Member>, ContainerError>;

    /// Read the attributes of an open object in creation order.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `object` is not open or an attribute cannot be read.
    fn attributes(&self, object: ObjectId) -> Result<Vec<RawAttribute>, ContainerError>;

    /// Read the datatype, dataspace, and storage size of an open dataset.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `dataset` is not an open dataset.
    fn dataset_info(&self, dataset: ObjectId) -> Result<DatasetInfo, ContainerError>;

    /// Dereference the `DIMENSION_LIST` attribute of an open dataset.
    ///
    /// Returns, per axis, the paths of the dimension scale datasets attached to that axis.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if the dataset has no dimension list or a reference cannot be resolved.
    fn dimension_list(&self, dataset: ObjectId) -> Result<Vec<Vec<ObjectPath>>, ContainerError>;

    /// Read the elements of an open string dataset.
    ///
    /// Fixed-length elements are returned without their NUL padding.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if `dataset` is not an open string dataset or its elements cannot be read.
    fn string_values(&self, dataset: ObjectId) -> Result<Vec<String>, ContainerError>;
}

/// An open container object, closed on drop.
pub struct ObjectHandle<'a> {
    container: &'a dyn ReadableContainerTraits,
    id: ObjectId,
    path: ObjectPath,
}

impl core::fmt::Debug for ObjectHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.path, self.id)
    }
}

impl<'a> ObjectHandle<'a> {
    /// Open the object at `path` in `container`.
    ///
    /// # Errors
    /// Returns a [`ContainerError`] if the object cannot be opened.
    pub fn open(
        container: &'a dyn ReadableContainerTraits,
        path: &ObjectPath,
    ) -> Result<Self, ContainerError> {
        let id = container.open(path)?;
        Ok(Self {
            container,
            id,
            path: path.clone(),
        })
    }

    /// The object identifier.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// The object path.
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// List the members of this group.
    ///
    /// # Errors
    /// See [`ReadableContainerTraits::members`].
    pub fn members(&self) -> Result<Vec<Member>, ContainerError> {
        self.container.members(self.id)
    }

    /// Read the attributes of this object.
    ///
    /// # Errors
    /// See [`ReadableContainerTraits::attributes`].
    pub fn attributes(&self) -> Result<Vec<RawAttribute>, ContainerError> {
        self.container.attributes(self.id)
    }

    /// Read the dataset information of this dataset.
    ///
    /// # Errors
    /// See [`ReadableContainerTraits::dataset_info`].
    pub fn dataset_info(&self) -> Result<DatasetInfo, ContainerError> {
        self.container.dataset_info(self.id)
    }

    /// Dereference the dimension list of this dataset.
    ///
    /// # Errors
    /// See [`ReadableContainerTraits::dimension_list`].
    pub fn dimension_list(&self) -> Result<Vec<Vec<ObjectPath>>, ContainerError> {
        self.container.dimension_list(self.id)
    }

    /// Read the elements of this string dataset.
    ///
    /// # Errors
    /// See [`ReadableContainerTraits::string_values`].
    pub fn string_values(&self) -> Result<Vec<String>, ContainerError> {
        self.container.string_values(self.id)
    }
}

impl Drop for ObjectHandle<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.container.close(self.id) {
            tracing::warn!(path = %self.path, %err, "failed to close object handle");
        }
    }
}

/// A container error.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// An object does not exist.
    #[error("object {0} does not exist")]
    NotFound(String),
    /// An object handle is not open.
    #[error("{0} is not open")]
    InvalidHandle(ObjectId),
    /// An object is not of the expected kind.
    #[error("object {0} is not a {1}")]
    UnexpectedKind(String, &'static str),
    /// An invalid object path.
    #[error(transparent)]
    InvalidPath(#[from] ObjectPathError),
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid container description.
    #[error("invalid container description: {0}")]
    InvalidDescription(String),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for ContainerError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for ContainerError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
