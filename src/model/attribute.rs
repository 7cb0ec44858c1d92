use crate::{
    container::{RawAttribute, RawAttributeData},
    datatype::{CharacterSet, Datatype},
};

/// An attribute of a file, group, or variable.
///
/// Numeric values are held as little-endian bytes.
/// String values are held as the concatenated UTF-8 bytes of every element, with the size of each element in [`string_sizes`](Attribute::string_sizes).
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) new_name: String,
    pub(crate) datatype: Datatype,
    pub(crate) count: u64,
    pub(crate) value: Vec<u8>,
    pub(crate) string_sizes: Vec<usize>,
    pub(crate) cset: CharacterSet,
}

impl Attribute {
    /// Create an attribute from a container attribute.
    ///
    /// Fixed-length string elements are trimmed at their first NUL byte.
    #[must_use]
    pub fn from_raw(raw: RawAttribute) -> Self {
        let count = raw.dataspace.num_elements();
        let (value, string_sizes) = match raw.data {
            RawAttributeData::Bytes(bytes) => (bytes, Vec::new()),
            RawAttributeData::FixedStrings { size, bytes } => {
                let elements: Vec<&[u8]> = if size == 0 {
                    Vec::new()
                } else {
                    bytes.chunks(size).collect()
                };
                let mut value = Vec::with_capacity(bytes.len());
                let mut string_sizes = Vec::with_capacity(elements.len());
                for element in elements {
                    let end = element.iter().position(|b| *b == 0).unwrap_or(element.len());
                    value.extend_from_slice(&element[..end]);
                    string_sizes.push(end);
                }
                (value, string_sizes)
            }
            RawAttributeData::Strings(strings) => {
                let string_sizes = strings.iter().map(String::len).collect();
                (strings.concat().into_bytes(), string_sizes)
            }
            RawAttributeData::Unread => (Vec::new(), Vec::new()),
        };
        Self {
            new_name: raw.name.clone(),
            name: raw.name,
            datatype: raw.datatype,
            count,
            value,
            string_sizes,
            cset: raw.cset,
        }
    }

    /// Create a scalar string attribute.
    #[must_use]
    pub fn new_string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            new_name: name.to_string(),
            datatype: Datatype::FixedString,
            count: 1,
            value: value.as_bytes().to_vec(),
            string_sizes: vec![value.len()],
            cset: CharacterSet::Ascii,
        }
    }

    /// Create a numeric attribute of `datatype` from `values`.
    ///
    /// Returns [`None`] if `datatype` is not numeric.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new_numeric(name: &str, datatype: Datatype, values: &[f64]) -> Option<Self> {
        let mut value = Vec::new();
        for v in values {
            match datatype {
                Datatype::Int8 => value.extend((*v as i8).to_le_bytes()),
                Datatype::UInt8 => value.extend((*v as u8).to_le_bytes()),
                Datatype::Int16 => value.extend((*v as i16).to_le_bytes()),
                Datatype::UInt16 => value.extend((*v as u16).to_le_bytes()),
                Datatype::Int32 => value.extend((*v as i32).to_le_bytes()),
                Datatype::UInt32 => value.extend((*v as u32).to_le_bytes()),
                Datatype::Int64 => value.extend((*v as i64).to_le_bytes()),
                Datatype::UInt64 => value.extend((*v as u64).to_le_bytes()),
                Datatype::Float32 => value.extend((*v as f32).to_le_bytes()),
                Datatype::Float64 => value.extend(v.to_le_bytes()),
                _ => return None,
            }
        }
        Some(Self {
            name: name.to_string(),
            new_name: name.to_string(),
            datatype,
            count: values.len() as u64,
            value,
            string_sizes: Vec::new(),
            cset: CharacterSet::Ascii,
        })
    }

    /// Create a one-dimensional `float32` attribute.
    #[must_use]
    pub fn new_float32(name: &str, values: &[f32]) -> Self {
        Self {
            name: name.to_string(),
            new_name: name.to_string(),
            datatype: Datatype::Float32,
            count: values.len() as u64,
            value: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            string_sizes: Vec::new(),
            cset: CharacterSet::Ascii,
        }
    }

    /// The original name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
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

    /// The number of elements.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// The raw value bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The size in bytes of each string element.
    #[must_use]
    pub fn string_sizes(&self) -> &[usize] {
        &self.string_sizes
    }

    /// The character set.
    #[must_use]
    pub const fn cset(&self) -> CharacterSet {
        self.cset
    }

    /// The string elements, or [`None`] if this is not a string attribute.
    #[must_use]
    pub fn strings(&self) -> Option<Vec<String>> {
        if !self.datatype.is_string() {
            return None;
        }
        let mut offset = 0;
        let mut strings = Vec::with_capacity(self.string_sizes.len());
        for size in &self.string_sizes {
            let end = (offset + size).min(self.value.len());
            strings.push(String::from_utf8_lossy(&self.value[offset..end]).into_owned());
            offset = end;
        }
        Some(strings)
    }

    /// All string elements concatenated, or [`None`] if this is not a string attribute.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        self.datatype
            .is_string()
            .then(|| String::from_utf8_lossy(&self.value).into_owned())
    }

    /// The numeric elements as [`f64`], or [`None`] if this is not a numeric attribute.
    #[must_use]
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        let size = self.datatype.element_size()?;
        self.value
            .chunks_exact(size)
            .map(|element| self.datatype.decode_f64(element))
            .collect()
    }

    /// Replace the string value.
    pub(crate) fn set_string(&mut self, value: &str) {
        self.value = value.as_bytes().to_vec();
        self.string_sizes = vec![value.len()];
        self.count = 1;
    }
}
