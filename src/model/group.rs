use super::Attribute;

/// A group of the container.
///
/// Groups are not part of the flat model, but their attributes are kept under the flattened group path.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub(crate) path: String,
    pub(crate) new_name: String,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) unsupported_attribute_type: bool,
}

impl Group {
    /// Create a group at `path` with no attributes.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            new_name: path.to_string(),
            attributes: Vec::new(),
            unsupported_attribute_type: false,
        }
    }

    /// The full path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The flattened, clash-free name.
    #[must_use]
    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    /// The attributes in creation order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// The attribute named `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}
