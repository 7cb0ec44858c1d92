//! JSON container descriptions.
//!
//! A description is a JSON object describing the root group.
//! Member and attribute order is preserved.
//!
//! ```json
//! {
//!   "attributes": {
//!     "title": "A fixed-length string",
//!     "history": ["variable", "length", "strings"],
//!     "version": 2,
//!     "Latitude Step": { "datatype": "float32", "value": [0.5] },
//!     "packed": { "datatype": "compound" }
//!   },
//!   "members": {
//!     "lat": { "dataset": { "datatype": "float32", "shape": [10] } },
//!     "ProjectId": { "dataset": { "datatype": "fixed_string", "value": "OCO2" } },
//!     "temp": {
//!       "dataset": {
//!         "datatype": "float32",
//!         "shape": [10, 20],
//!         "unlimited": [0],
//!         "dimension_list": [["/lat"], ["/lon"]],
//!         "attributes": { "units": "K" }
//!       }
//!     },
//!     "Geolocation": { "group": { "members": {} } },
//!     "alias": { "soft_link": "/temp" },
//!     "remote": { "external_link": { "file": "other.h5", "target": "/x" } },
//!     "type": "named_datatype"
//!   }
//! }
//! ```
//!
//! Bare integer attributes are `int32`, other bare numbers are `float64`.
//! A dataset without a `shape` is scalar unless `"dataspace": "null"` is given.
//! Only string datasets may carry a `value`, either one string or an array of strings.

use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::datatype::{CharacterSet, Datatype};

use super::{
    ContainerError, Dataspace, Extent, MemoryContainer, MemoryContainerBuilder, MemoryDataset,
    ObjectPath, RawAttribute, RawAttributeData,
};

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GroupDescription {
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    members: Map<String, Value>,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum DataspaceKind {
    Null,
    Scalar,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetDescription {
    datatype: Datatype,
    #[serde(default)]
    shape: Option<Vec<u64>>,
    #[serde(default)]
    unlimited: Vec<usize>,
    #[serde(default)]
    dataspace: Option<DataspaceKind>,
    #[serde(default)]
    storage_size: Option<u64>,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    dimension_list: Option<Vec<Vec<String>>>,
    #[serde(default)]
    value: Option<StringValues>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringValues {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum MemberDescription {
    Group(GroupDescription),
    Dataset(DatasetDescription),
    SoftLink(String),
    ExternalLink { file: String, target: String },
    NamedDatatype,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeDescription {
    Text(String),
    Texts(Vec<String>),
    Number(Number),
    Numbers(Vec<Number>),
    Typed(TypedAttributeDescription),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TypedAttributeDescription {
    datatype: Datatype,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    cset: CharacterSet,
    #[serde(default)]
    dataspace: Option<DataspaceKind>,
}

fn invalid(message: impl Into<String>) -> ContainerError {
    ContainerError::InvalidDescription(message.into())
}

#[allow(clippy::cast_possible_truncation)]
fn encode_number(datatype: Datatype, number: &Number) -> Result<Vec<u8>, ContainerError> {
    let as_int = || {
        number
            .as_i64()
            .ok_or_else(|| invalid(format!("{number} is not an integer")))
    };
    let as_float = || {
        number
            .as_f64()
            .ok_or_else(|| invalid(format!("{number} is not a number")))
    };
    let out_of_range = |_| invalid(format!("{number} is out of range for {datatype}"));
    Ok(match datatype {
        Datatype::Int8 => i8::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::UInt8 => u8::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::Int16 => i16::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::UInt16 => u16::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::Int32 => i32::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::UInt32 => u32::try_from(as_int()?).map_err(out_of_range)?.to_le_bytes().to_vec(),
        Datatype::Int64 => as_int()?.to_le_bytes().to_vec(),
        Datatype::UInt64 => number
            .as_u64()
            .ok_or_else(|| invalid(format!("{number} is not an unsigned integer")))?
            .to_le_bytes()
            .to_vec(),
        Datatype::Float32 => (as_float()? as f32).to_le_bytes().to_vec(),
        Datatype::Float64 => as_float()?.to_le_bytes().to_vec(),
        _ => return Err(invalid(format!("{datatype} cannot hold numbers"))),
    })
}

fn typed_attribute(
    name: &str,
    description: TypedAttributeDescription,
) -> Result<RawAttribute, ContainerError> {
    let TypedAttributeDescription {
        datatype,
        value,
        cset,
        dataspace,
    } = description;
    let values = match value {
        Value::Null => Vec::new(),
        Value::Array(values) => values,
        value => vec![value],
    };
    let count = values.len() as u64;
    let dataspace = match dataspace {
        Some(DataspaceKind::Null) => Dataspace::Null,
        Some(DataspaceKind::Scalar) => Dataspace::Scalar,
        None if values.is_empty() && !datatype.is_supported(true) => Dataspace::simple(&[1]),
        None => Dataspace::simple(&[count]),
    };
    let data = match datatype {
        Datatype::FixedString | Datatype::VariableString => {
            let strings = values
                .iter()
                .map(|value| {
                    value
                        .as_str()
                        .map(ToString::to_string)
                        .ok_or_else(|| invalid(format!("attribute {name} expects strings")))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if datatype == Datatype::VariableString {
                RawAttributeData::Strings(strings)
            } else {
                let size = strings.iter().map(String::len).max().unwrap_or(0);
                let mut bytes = Vec::with_capacity(size * strings.len());
                for string in &strings {
                    bytes.extend_from_slice(string.as_bytes());
                    bytes.resize(bytes.len() + size - string.len(), 0);
                }
                RawAttributeData::FixedStrings { size, bytes }
            }
        }
        datatype if datatype.element_size().is_some() => {
            let mut bytes = Vec::new();
            for value in &values {
                let Value::Number(number) = value else {
                    return Err(invalid(format!("attribute {name} expects numbers")));
                };
                bytes.extend(encode_number(datatype, number)?);
            }
            RawAttributeData::Bytes(bytes)
        }
        _ => RawAttributeData::Unread,
    };
    Ok(RawAttribute {
        name: name.to_string(),
        datatype,
        dataspace,
        cset,
        data,
    })
}

fn number_datatype(numbers: &[Number]) -> Datatype {
    if numbers.iter().all(|number| number.as_i64().is_some_and(|v| i32::try_from(v).is_ok())) {
        Datatype::Int32
    } else {
        Datatype::Float64
    }
}

fn attribute(name: &str, value: Value) -> Result<RawAttribute, ContainerError> {
    let description: AttributeDescription = serde_json::from_value(value)
        .map_err(|err| invalid(format!("attribute {name}: {err}")))?;
    match description {
        AttributeDescription::Text(text) => Ok(RawAttribute::string(name, &text)),
        AttributeDescription::Texts(texts) => {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            Ok(RawAttribute::strings(name, &texts))
        }
        AttributeDescription::Number(number) => {
            let datatype = number_datatype(std::slice::from_ref(&number));
            typed_attribute(
                name,
                TypedAttributeDescription {
                    datatype,
                    value: Value::Number(number),
                    cset: CharacterSet::Ascii,
                    dataspace: None,
                },
            )
        }
        AttributeDescription::Numbers(numbers) => {
            let datatype = number_datatype(&numbers);
            let value = Value::Array(numbers.into_iter().map(Value::Number).collect());
            typed_attribute(
                name,
                TypedAttributeDescription {
                    datatype,
                    value,
                    cset: CharacterSet::Ascii,
                    dataspace: None,
                },
            )
        }
        AttributeDescription::Typed(typed) => typed_attribute(name, typed),
    }
}

fn attributes(map: Map<String, Value>) -> Result<Vec<RawAttribute>, ContainerError> {
    map.into_iter()
        .map(|(name, value)| attribute(&name, value))
        .collect()
}

fn dataset(description: DatasetDescription) -> Result<MemoryDataset, ContainerError> {
    let dataspace = match (description.dataspace, description.shape) {
        (Some(DataspaceKind::Null), _) => Dataspace::Null,
        (Some(DataspaceKind::Scalar), _) | (None, None) => Dataspace::Scalar,
        (None, Some(shape)) => Dataspace::Simple(
            shape
                .iter()
                .enumerate()
                .map(|(axis, &size)| {
                    if description.unlimited.contains(&axis) {
                        Extent::unlimited(size)
                    } else {
                        Extent::new(size)
                    }
                })
                .collect(),
        ),
    };
    let mut dataset = MemoryDataset::new(description.datatype, dataspace);
    if let Some(value) = description.value {
        if !description.datatype.is_string() {
            return Err(invalid(format!(
                "a {} dataset cannot hold string values",
                description.datatype
            )));
        }
        let values = match value {
            StringValues::One(value) => vec![value],
            StringValues::Many(values) => values,
        };
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        dataset = dataset.with_strings(&values);
    }
    if let Some(storage_size) = description.storage_size {
        dataset = dataset.with_storage_size(storage_size);
    }
    for attribute in attributes(description.attributes)? {
        dataset = dataset.with_attribute(attribute);
    }
    if let Some(dimension_list) = description.dimension_list {
        let dimension_list = dimension_list
            .iter()
            .map(|scales| {
                scales
                    .iter()
                    .map(|scale| ObjectPath::new(scale))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        dataset = dataset.with_dimension_list(dimension_list);
    }
    Ok(dataset)
}

fn add_group(
    mut builder: MemoryContainerBuilder,
    path: &ObjectPath,
    description: GroupDescription,
) -> Result<MemoryContainerBuilder, ContainerError> {
    if !path.is_root() {
        builder = builder.group(path.as_str())?;
    }
    for attribute in attributes(description.attributes)? {
        builder = builder.attribute(path.as_str(), attribute)?;
    }
    for (name, value) in description.members {
        let member_path = path.join(&name)?;
        let member: MemberDescription = serde_json::from_value(value)
            .map_err(|err| invalid(format!("member {member_path}: {err}")))?;
        builder = match member {
            MemberDescription::Group(group) => add_group(builder, &member_path, group)?,
            MemberDescription::Dataset(description) => {
                builder.dataset(member_path.as_str(), dataset(description)?)?
            }
            MemberDescription::SoftLink(target) => {
                builder.soft_link(member_path.as_str(), &target)?
            }
            MemberDescription::ExternalLink { file, target } => {
                builder.external_link(member_path.as_str(), &file, &target)?
            }
            MemberDescription::NamedDatatype => builder.named_datatype(member_path.as_str())?,
        };
    }
    Ok(builder)
}

/// Create a [`MemoryContainer`] from a JSON description of the root group.
///
/// # Errors
/// Returns [`ContainerError::InvalidDescription`] if `json` is not a valid description.
pub fn container_from_json(json: &str) -> Result<MemoryContainer, ContainerError> {
    let root: GroupDescription = serde_json::from_str(json).map_err(|err| invalid(err.to_string()))?;
    Ok(add_group(MemoryContainerBuilder::new(), &ObjectPath::root(), root)?.build())
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::container::{MemberKind, ObjectHandle};

    use super::*;

    const JSON: &str = r#"{
        "attributes": {
            "title": "test",
            "levels": [1, 2, 3],
            "scale": 0.5,
            "Latitude Step": { "datatype": "float32", "value": [0.25] },
            "packed": { "datatype": "compound" }
        },
        "members": {
            "lat": { "dataset": { "datatype": "float32", "shape": [4] } },
            "id": { "dataset": { "datatype": "variable_string", "value": "ACOS" } },
            "g": {
                "group": {
                    "members": {
                        "v": {
                            "dataset": {
                                "datatype": "int16",
                                "shape": [4, 2],
                                "unlimited": [0],
                                "dimension_list": [["/lat"], []]
                            }
                        }
                    }
                }
            },
            "alias": { "soft_link": "/lat" },
            "type": "named_datatype"
        }
    }"#;

    #[test]
    fn description_attributes() -> Result<(), Box<dyn Error>> {
        let container = container_from_json(JSON)?;
        let root = ObjectHandle::open(&container, &ObjectPath::root())?;
        let attributes = root.attributes()?;
        assert_eq!(attributes.len(), 5);
        assert_eq!(attributes[0].datatype, Datatype::FixedString);
        assert_eq!(attributes[1].datatype, Datatype::Int32);
        assert_eq!(attributes[1].dataspace, Dataspace::simple(&[3]));
        assert_eq!(attributes[2].datatype, Datatype::Float64);
        assert_eq!(
            attributes[3].data,
            RawAttributeData::Bytes(0.25f32.to_le_bytes().to_vec())
        );
        assert_eq!(attributes[4].data, RawAttributeData::Unread);
        assert_eq!(attributes[4].dataspace, Dataspace::simple(&[1]));
        Ok(())
    }

    #[test]
    fn description_members() -> Result<(), Box<dyn Error>> {
        let container = container_from_json(JSON)?;
        let root = ObjectHandle::open(&container, &ObjectPath::root())?;
        let kinds: Vec<MemberKind> = root.members()?.into_iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MemberKind::Dataset,
                MemberKind::Dataset,
                MemberKind::Group,
                MemberKind::SoftLink {
                    target: "/lat".to_string()
                },
                MemberKind::NamedDatatype
            ]
        );
        let v = ObjectHandle::open(&container, &"/g/v".try_into()?)?;
        let info = v.dataset_info()?;
        assert_eq!(
            info.dataspace,
            Dataspace::Simple(vec![Extent::unlimited(4), Extent::new(2)])
        );
        assert_eq!(info.storage_size, 16);
        assert_eq!(v.dimension_list()?[0], vec![ObjectPath::new("/lat")?]);
        let id = ObjectHandle::open(&container, &"/id".try_into()?)?;
        assert_eq!(id.string_values()?, vec!["ACOS".to_string()]);
        Ok(())
    }

    #[test]
    fn description_invalid() {
        assert!(container_from_json(r#"{ "members": { "x": { "dataset": {} } } }"#).is_err());
        assert!(container_from_json(r#"{ "unknown": 1 }"#).is_err());
        assert!(container_from_json(
            r#"{ "members": { "x": { "dataset": { "datatype": "int8", "value": "a" } } } }"#
        )
        .is_err());
    }
}
