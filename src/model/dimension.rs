use std::collections::BTreeMap;

use crate::normalize::NormalizeError;

/// One axis of a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub(crate) size: u64,
    pub(crate) name: String,
    pub(crate) new_name: String,
    pub(crate) unlimited: bool,
}

impl Dimension {
    /// Create an unnamed dimension of `size`.
    #[must_use]
    pub fn new(size: u64, unlimited: bool) -> Self {
        Self {
            size,
            name: String::new(),
            new_name: String::new(),
            unlimited,
        }
    }

    /// The size.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The original dimension name (a full path or a placeholder name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flattened, clash-free name.
    #[must_use]
    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    /// Returns true if the dimension is unlimited.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.unlimited
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.new_name = name.to_string();
    }
}

/// An entry of the [`DimensionTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DimensionEntry {
    /// The dimension size.
    pub size: u64,
    /// True if the dimension is unlimited.
    pub unlimited: bool,
}

/// The unique dimension names of a file and their sizes.
///
/// A name is bound to exactly one size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DimensionTable(BTreeMap<String, DimensionEntry>);

impl DimensionTable {
    /// Bind `name` to `size`.
    ///
    /// Returns true if the name was not previously bound.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if `name` is already bound to a different size.
    pub fn insert(&mut self, name: &str, size: u64, unlimited: bool) -> Result<bool, NormalizeError> {
        if let Some(entry) = self.0.get_mut(name) {
            if entry.size != size {
                return Err(normalize_err!(
                    "dimension {name} has size {size} but was previously bound to size {}",
                    entry.size
                ));
            }
            entry.unlimited |= unlimited;
            Ok(false)
        } else {
            self.0.insert(name.to_string(), DimensionEntry { size, unlimited });
            Ok(true)
        }
    }

    /// The entry bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DimensionEntry> {
        self.0.get(name)
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Unbind `name`.
    pub fn remove(&mut self, name: &str) -> Option<DimensionEntry> {
        self.0.remove(name)
    }

    /// Iterate over names and entries in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DimensionEntry)> {
        self.0.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// The names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// The number of dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}
