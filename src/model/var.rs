use crate::datatype::Datatype;

use super::{Attribute, Dimension};

/// A decimal digit field packed into the values of an integer dataset.
///
/// Digits are counted from the least significant, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedDigits {
    /// The datatype of the stored values.
    pub source_datatype: Datatype,
    /// The least significant digit of the field.
    pub start_digit: u32,
    /// The number of digits of the field.
    pub digit_count: u32,
}

/// A variable (dataset) of the flat model.
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Var {
    pub(crate) name: String,
    pub(crate) full_path: String,
    pub(crate) new_name: String,
    pub(crate) datatype: Datatype,
    pub(crate) dimensions: Vec<Dimension>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) unsupported_attribute_type: bool,
    pub(crate) unsupported_dataspace: bool,
    pub(crate) zero_storage: bool,
    pub(crate) coordinates_needs_path: bool,
    /// The byte length of the longest element of a string variable.
    pub(crate) longest_string: usize,
    /// The first element of a string variable.
    pub(crate) string_value: Option<String>,
    /// The variable exposes one digit field of its dataset.
    pub(crate) packed: Option<PackedDigits>,
}

impl Var {
    /// Create a variable with no dimensions or attributes.
    #[must_use]
    pub fn new(full_path: &str, datatype: Datatype) -> Self {
        let name = full_path.rsplit('/').next().unwrap_or(full_path);
        Self {
            name: name.to_string(),
            full_path: full_path.to_string(),
            new_name: full_path.to_string(),
            datatype,
            dimensions: Vec::new(),
            attributes: Vec::new(),
            unsupported_attribute_type: false,
            unsupported_dataspace: false,
            zero_storage: false,
            coordinates_needs_path: true,
            longest_string: 0,
            string_value: None,
            packed: None,
        }
    }

    /// The last path component.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full path in the container.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The flattened, clash-free name.
    #[must_use]
    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    /// The element datatype.
    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The dimensions.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// The attributes in creation order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns true if the variable has no allocated storage.
    #[must_use]
    pub const fn is_zero_storage(&self) -> bool {
        self.zero_storage
    }

    /// The path of the parent group, including the trailing `/`.
    #[must_use]
    pub fn group_path(&self) -> &str {
        self.full_path
            .rfind('/')
            .map_or("", |index| &self.full_path[..=index])
    }

    /// The attribute named `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Returns true if the variable has an attribute named `name`.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// The concatenated value of the string attribute named `name`.
    #[must_use]
    pub fn string_attribute(&self, name: &str) -> Option<String> {
        self.attribute(name).and_then(Attribute::as_string)
    }

    pub(crate) fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self
            .attributes
            .iter()
            .position(|attribute| attribute.name == name)?;
        Some(self.attributes.remove(index))
    }

    /// Add `attribute`, replacing an attribute of the same name.
    pub(crate) fn set_attribute(&mut self, attribute: Attribute) {
        if let Some(existing) = self.attribute_mut(&attribute.name) {
            *existing = attribute;
        } else {
            self.attributes.push(attribute);
        }
    }

    /// The first element of a string variable, if it was read.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    /// The digit field this variable exposes, if its dataset packs several fields.
    #[must_use]
    pub const fn packed(&self) -> Option<&PackedDigits> {
        self.packed.as_ref()
    }

    /// The `units` attribute value.
    #[must_use]
    pub fn units(&self) -> Option<String> {
        self.string_attribute("units")
    }
}
