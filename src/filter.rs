//! The unsupported-object filter.
//!
//! Removes the variables and attributes that cannot be represented in the flat CF model, and records each of them in the [`Diagnostics`] of the file.
//! The filter runs before naming, so removed objects never take a flattened name.
//!
//! Objects are removed if their
//!  - datatype is not [supported](crate::datatype::Datatype::is_supported),
//!  - dataspace is null, non-string scalar, or has a zero-sized dimension (attributes with no elements).
//!
//! String variables and attributes with an element longer than [`NETCDF_STRING_LIMIT`] are removed if [drop long string](crate::config::Config#drop-long-string) is enabled.
//!
//! netCDF-4 bookkeeping attributes are stripped if [strip netCDF housekeeping](crate::config::Config#strip-netcdf-housekeeping) is enabled.

mod diagnostics;

pub use diagnostics::{DiagnosticCategory, Diagnostics};

use crate::{
    datatype::Datatype,
    dialect::is_dimension_scale_var,
    model::{Attribute, CVar, CVarKind, DimensionEntry, File, Pattern, Producer, Var},
    normalize::NormalizeError,
};

const DIMENSION_LIST: &str = "DIMENSION_LIST";
const REFERENCE_LIST: &str = "REFERENCE_LIST";

const ROOT_HOUSEKEEPING: [&str; 3] = ["_nc3_strict", "_NCProperties", "_Netcdf4Coordinates"];
const CVAR_HOUSEKEEPING: [&str; 3] = ["NAME", "_Netcdf4Dimid", "_Netcdf4Coordinates"];
const VAR_HOUSEKEEPING: [&str; 2] = ["_Netcdf4Dimid", "_Netcdf4Coordinates"];

/// The longest string element, in bytes, that a netCDF string can hold.
pub const NETCDF_STRING_LIMIT: usize = 32767;

/// The number of objects removed by [`remove_unsupported`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterSummary {
    datatype: usize,
    dataspace: usize,
    long_string: usize,
}

impl FilterSummary {
    /// The number of variables and coordinate variables removed for their datatype.
    #[must_use]
    pub const fn removed_for_datatype(&self) -> usize {
        self.datatype
    }

    /// The number of variables and coordinate variables removed for their dataspace.
    #[must_use]
    pub const fn removed_for_dataspace(&self) -> usize {
        self.dataspace
    }

    /// The number of string variables and coordinate variables removed for their length.
    #[must_use]
    pub const fn removed_for_long_string(&self) -> usize {
        self.long_string
    }
}

/// Where an attribute is attached, for diagnostics.
#[derive(Clone, Copy)]
enum Owner<'a> {
    Group(&'a str),
    Var { path: &'a str, is_dimension_scale: bool },
}

/// Remove the unsupported objects of `file`.
///
/// A coordinate variable removed for its datatype or dataspace is replaced by an index coordinate variable for the same dimension.
///
/// # Errors
/// Returns a [`NormalizeError`] if the dimension of a removed coordinate variable cannot be found.
pub fn remove_unsupported(file: &mut File) -> Result<FilterSummary, NormalizeError> {
    let datatype = remove_unsupported_datatypes(file)?;
    let dataspace = remove_unsupported_dataspaces(file)?;
    let long_string = if file.config.drop_long_string() {
        remove_long_strings(file)?
    } else {
        0
    };
    let summary = FilterSummary {
        datatype,
        dataspace,
        long_string,
    };
    if file.config.strip_netcdf_housekeeping()
        && !(file.producer == Producer::General && file.pattern == Pattern::Other)
    {
        strip_housekeeping(file);
    }
    tracing::debug!(?summary, "removed unsupported objects");
    Ok(summary)
}

/// Decides which attributes are removed and reported.
#[derive(Clone, Copy)]
struct AttributeFilter {
    support_int64: bool,
    dimension_scale_file: bool,
}

impl AttributeFilter {
    fn for_file(file: &File) -> Self {
        Self {
            support_int64: file.config.support_int64(),
            dimension_scale_file: file.pattern == Pattern::DimensionScale
                || file.producer == Producer::ObpgL3,
        }
    }

    /// Returns true if an ignored attribute is reported.
    ///
    /// Dimension scale bookkeeping references are expected in dimension scale files, so they are removed silently.
    fn is_reported(self, owner: Owner, attribute: &Attribute) -> bool {
        match owner {
            Owner::Var {
                is_dimension_scale, ..
            } if self.dimension_scale_file => match attribute.name() {
                DIMENSION_LIST => false,
                REFERENCE_LIST => !is_dimension_scale,
                _ => true,
            },
            _ => true,
        }
    }

    /// Report and remove the unsupported attributes of one owner.
    ///
    /// 64-bit integer attributes are reported even if they are supported.
    fn apply(self, diagnostics: &mut Diagnostics, owner: Owner, attributes: &mut Vec<Attribute>) {
        attributes.retain(|attribute| {
            let supported = attribute.datatype().is_supported(self.support_int64);
            if (!supported || attribute.datatype().is_int64()) && self.is_reported(owner, attribute) {
                match owner {
                    Owner::Group(path) => diagnostics.ignored_group_attribute(path, attribute.name()),
                    Owner::Var { path, .. } => {
                        diagnostics.ignored_var_attribute(path, attribute.name());
                    }
                }
            }
            supported
        });
    }
}

/// The size of the dimension of `cvar`.
fn cvar_dimension(file: &File, cvar: &CVar) -> Result<DimensionEntry, NormalizeError> {
    if let Some(entry) = file.dimensions.get(&cvar.cf_dim_name) {
        return Ok(*entry);
    }
    cvar.dimensions()
        .iter()
        .find(|dimension| cvar.cf_dim_name.ends_with(dimension.name()))
        .map(|dimension| DimensionEntry {
            size: dimension.size(),
            unlimited: dimension.is_unlimited(),
        })
        .ok_or_else(|| {
            normalize_err!(
                "the dimension {} of the coordinate variable {} does not exist",
                cvar.cf_dim_name,
                cvar.full_path
            )
        })
}

/// Replace the coordinate variables marked [`Unsupported`](CVarKind::Unsupported) by index coordinate variables.
fn replace_unsupported_cvars(file: &mut File) -> Result<(), NormalizeError> {
    let mut replacements = Vec::new();
    for cvar in file
        .cvars
        .values()
        .filter(|cvar| cvar.kind == CVarKind::Unsupported)
    {
        let entry = cvar_dimension(file, cvar)?;
        replacements.push(CVar::synthesize(
            &cvar.cf_dim_name,
            entry.size,
            entry.unlimited,
            Datatype::Int32,
            CVarKind::OtherMissing,
        ));
    }
    for cvar in file
        .cvars
        .take_where(|cvar| cvar.kind == CVarKind::Unsupported)
    {
        tracing::debug!(cvar = %cvar.full_path, dimension = %cvar.cf_dim_name, "replace unsupported coordinate variable");
    }
    for cvar in replacements {
        file.cvars.insert(cvar);
    }
    Ok(())
}

fn remove_unsupported_datatypes(file: &mut File) -> Result<usize, NormalizeError> {
    let filter = AttributeFilter::for_file(file);
    let support_int64 = filter.support_int64;
    let diagnostics = &mut file.diagnostics;

    filter.apply(diagnostics, Owner::Group("/"), &mut file.root_attributes);
    for group in file.groups.values_mut() {
        filter.apply(diagnostics, Owner::Group(&group.path), &mut group.attributes);
    }

    // Variables go first, so the attributes of a removed variable are never reported.
    let mut removed = 0;
    for var in file.vars.values() {
        if !var.datatype.is_supported(support_int64) || var.datatype.is_int64() {
            diagnostics.ignored_var_datatype(&var.full_path);
        }
    }
    for var in file
        .vars
        .take_where(|var| !var.datatype.is_supported(support_int64))
    {
        tracing::debug!(var = %var.full_path, datatype = %var.datatype, "remove variable with unsupported datatype");
        removed += 1;
    }
    for var in file.vars.values_mut() {
        let owner = Owner::Var {
            path: &var.full_path,
            is_dimension_scale: is_dimension_scale_var(var),
        };
        filter.apply(diagnostics, owner, &mut var.attributes);
    }

    for cvar in file.cvars.values_mut() {
        let var = &mut cvar.var;
        let owner = Owner::Var {
            path: &var.full_path,
            is_dimension_scale: is_dimension_scale_var(var),
        };
        filter.apply(diagnostics, owner, &mut var.attributes);
        if !var.datatype.is_supported(support_int64) || var.datatype.is_int64() {
            diagnostics.ignored_var_datatype(&var.full_path);
        }
        if !var.datatype.is_supported(support_int64) {
            cvar.kind = CVarKind::Unsupported;
            removed += 1;
        }
    }
    replace_unsupported_cvars(file)?;
    Ok(removed)
}

fn remove_unsupported_dataspaces(file: &mut File) -> Result<usize, NormalizeError> {
    let mut removed = 0;
    for var in file.vars.take_where(|var| var.unsupported_dataspace) {
        file.diagnostics.ignored_var_dataspace(&var.full_path);
        removed += 1;
    }
    for cvar in file.cvars.values_mut().filter(|cvar| cvar.unsupported_dataspace) {
        file.diagnostics.ignored_var_dataspace(&cvar.var.full_path);
        cvar.kind = CVarKind::Unsupported;
        removed += 1;
    }
    replace_unsupported_cvars(file)?;

    let has_elements = |attribute: &Attribute| attribute.count() > 0;
    file.root_attributes.retain(has_elements);
    for group in file.groups.values_mut() {
        group.attributes.retain(has_elements);
    }
    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for var in vars {
        var.attributes.retain(has_elements);
    }
    Ok(removed)
}

fn is_long_string(attribute: &Attribute) -> bool {
    attribute.datatype().is_string()
        && attribute
            .string_sizes()
            .iter()
            .any(|&size| size > NETCDF_STRING_LIMIT)
}

fn remove_long_string_attributes(
    diagnostics: &mut Diagnostics,
    path: &str,
    attributes: &mut Vec<Attribute>,
) {
    attributes.retain(|attribute| {
        let long = is_long_string(attribute);
        if long {
            diagnostics.ignored_long_string_attribute(path, attribute.name());
        }
        !long
    });
}

fn remove_long_strings(file: &mut File) -> Result<usize, NormalizeError> {
    let is_long =
        |var: &Var| var.datatype.is_string() && var.longest_string > NETCDF_STRING_LIMIT;
    let mut removed = 0;
    for var in file.vars.take_where(is_long) {
        tracing::debug!(var = %var.full_path, length = var.longest_string, "remove long string variable");
        file.diagnostics.ignored_long_string_var(&var.full_path);
        removed += 1;
    }
    for cvar in file.cvars.values_mut().filter(|cvar| is_long(&cvar.var)) {
        file.diagnostics.ignored_long_string_var(&cvar.var.full_path);
        cvar.kind = CVarKind::Unsupported;
        removed += 1;
    }
    replace_unsupported_cvars(file)?;

    let diagnostics = &mut file.diagnostics;
    remove_long_string_attributes(diagnostics, "/", &mut file.root_attributes);
    for group in file.groups.values_mut() {
        remove_long_string_attributes(diagnostics, &group.path, &mut group.attributes);
    }
    let vars = file
        .vars
        .values_mut()
        .chain(file.cvars.values_mut().map(|cvar| &mut cvar.var));
    for var in vars {
        remove_long_string_attributes(diagnostics, &var.full_path, &mut var.attributes);
    }
    Ok(removed)
}

/// Remove the attributes the netCDF-4 library writes for its own bookkeeping.
fn strip_housekeeping(file: &mut File) {
    file.root_attributes
        .retain(|attribute| !ROOT_HOUSEKEEPING.contains(&attribute.name()));
    for cvar in file.cvars.values_mut() {
        if is_dimension_scale_var(cvar) {
            cvar.remove_attribute("CLASS");
        }
        cvar.attributes
            .retain(|attribute| !CVAR_HOUSEKEEPING.contains(&attribute.name()));
    }
    for var in file.vars.values_mut() {
        var.attributes
            .retain(|attribute| !VAR_HOUSEKEEPING.contains(&attribute.name()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        container::{Dataspace, RawAttribute, RawAttributeData},
        datatype::CharacterSet,
        model::{Dimension, Group},
    };

    fn typed(name: &str, datatype: Datatype) -> Attribute {
        Attribute::from_raw(RawAttribute {
            name: name.to_string(),
            datatype,
            dataspace: Dataspace::simple(&[1]),
            cset: CharacterSet::Ascii,
            data: RawAttributeData::Unread,
        })
    }

    fn var(path: &str, datatype: Datatype, attributes: Vec<Attribute>) -> Var {
        let mut var = Var::new(path, datatype);
        let mut dimension = Dimension::new(3, false);
        dimension.set_name("FakeDim0");
        var.dimensions.push(dimension);
        var.attributes = attributes;
        var
    }

    fn diagnostics_file() -> File {
        let mut config = Config::default();
        config.set_emit_diagnostics(true);
        File::new(config)
    }

    #[test]
    fn filter_unsupported_datatypes() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.root_attributes.push(typed("history", Datatype::VariableString));
        file.root_attributes.push(typed("table", Datatype::Compound));
        let mut group = Group::new("/g");
        group.attributes.push(typed("id", Datatype::Int64));
        file.groups.insert(group);
        file.vars.insert(var(
            "/g/t",
            Datatype::Float32,
            vec![typed("units", Datatype::FixedString), typed("ref", Datatype::Reference)],
        ));
        file.vars.insert(var("/g/c", Datatype::Compound, vec![]));
        file.vars.insert(var("/g/i", Datatype::Int64, vec![]));

        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_datatype(), 2);
        assert_eq!(file.root_attributes().len(), 1);
        assert!(file.groups().values().all(|group| group.attributes().is_empty()));
        assert_eq!(file.var("/g/t").map(|var| var.attributes().len()), Some(1));
        assert!(file.var("/g/c").is_none());
        assert!(file.var("/g/i").is_none());

        let diagnostics = file.diagnostics();
        assert_eq!(
            diagnostics.entries(DiagnosticCategory::GroupAttributes),
            &[
                "Group path: /  Attribute name: table".to_string(),
                "Group path: /g  Attribute name: id".to_string(),
            ]
        );
        assert_eq!(diagnostics.entries(DiagnosticCategory::VarAttributes).len(), 1);
        assert_eq!(diagnostics.entries(DiagnosticCategory::VarDatatype).len(), 2);
        Ok(())
    }

    #[test]
    fn filter_variables_before_their_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.vars.insert(var(
            "/packed",
            Datatype::Compound,
            vec![typed("ref", Datatype::Reference)],
        ));
        file.vars.insert(var(
            "/t",
            Datatype::Float32,
            vec![typed("ref", Datatype::Reference)],
        ));
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_datatype(), 1);
        let diagnostics = file.diagnostics();
        assert_eq!(
            diagnostics.entries(DiagnosticCategory::VarDatatype),
            &["Variable path: /packed".to_string()]
        );
        assert_eq!(
            diagnostics.entries(DiagnosticCategory::VarAttributes),
            &["Variable path: /t  Attribute name: ref".to_string()]
        );
        Ok(())
    }

    #[test]
    fn filter_int64_reported_when_supported() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.config.set_support_int64(true);
        file.vars.insert(var("/i", Datatype::Int64, vec![]));
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_datatype(), 0);
        assert!(file.var("/i").is_some());
        assert_eq!(
            file.diagnostics().entries(DiagnosticCategory::VarDatatype),
            &["Variable path: /i".to_string()]
        );
        Ok(())
    }

    #[test]
    fn filter_unsupported_cvar_replaced() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.dimensions.insert("FakeDim0", 3, false)?;
        let key = file.vars.insert(var("/time", Datatype::Compound, vec![]));
        file.promote(key, "FakeDim0", CVarKind::Existing)?;
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_datatype(), 1);
        let cvar = file.cvar_of_dimension("FakeDim0").unwrap();
        assert_eq!(cvar.kind(), CVarKind::OtherMissing);
        assert_eq!(cvar.datatype(), Datatype::Int32);
        assert_eq!(file.cvars().len(), 1);
        assert_eq!(
            file.diagnostics().entries(DiagnosticCategory::VarDatatype),
            &["Variable path: /time".to_string()]
        );
        Ok(())
    }

    #[test]
    fn filter_dimension_scale_references_not_reported() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.pattern = Pattern::DimensionScale;
        file.vars.insert(var(
            "/t",
            Datatype::Float32,
            vec![typed(DIMENSION_LIST, Datatype::VariableLength)],
        ));
        file.vars.insert(var(
            "/x",
            Datatype::Float32,
            vec![
                Attribute::new_string("CLASS", "DIMENSION_SCALE"),
                typed(REFERENCE_LIST, Datatype::Compound),
            ],
        ));
        file.vars.insert(var(
            "/y",
            Datatype::Float32,
            vec![typed(REFERENCE_LIST, Datatype::Compound)],
        ));
        remove_unsupported(&mut file)?;
        assert_eq!(
            file.diagnostics().entries(DiagnosticCategory::VarAttributes),
            &["Variable path: /y  Attribute name: REFERENCE_LIST".to_string()]
        );
        assert!(file.var("/t").is_some_and(|var| !var.has_attribute(DIMENSION_LIST)));
        Ok(())
    }

    #[test]
    fn filter_unsupported_dataspace() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        let mut null = var("/null", Datatype::Float32, vec![]);
        null.unsupported_dataspace = true;
        file.vars.insert(null);
        let mut empty = Attribute::new_string("empty", "");
        empty.count = 0;
        file.vars
            .insert(var("/t", Datatype::Float32, vec![empty]));
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_dataspace(), 1);
        assert!(file.var("/null").is_none());
        assert!(file.var("/t").is_some_and(|var| var.attributes().is_empty()));
        assert_eq!(
            file.diagnostics().entries(DiagnosticCategory::VarDataspace),
            &["Variable path: /null".to_string()]
        );
        Ok(())
    }

    fn long_string_file(drop_long_string: bool) -> File {
        let mut file = diagnostics_file();
        file.config.set_drop_long_string(drop_long_string);
        let long = "x".repeat(NETCDF_STRING_LIMIT + 1);
        file.root_attributes.push(Attribute::new_string("history", &long));
        file.root_attributes.push(Attribute::new_string("title", "short"));
        let mut text = var("/text", Datatype::VariableString, vec![]);
        text.longest_string = NETCDF_STRING_LIMIT + 1;
        file.vars.insert(text);
        let mut label = var("/label", Datatype::FixedString, vec![]);
        label.longest_string = NETCDF_STRING_LIMIT;
        file.vars.insert(label);
        file.vars.insert(var(
            "/t",
            Datatype::Float32,
            vec![Attribute::new_string("comment", &long)],
        ));
        file
    }

    #[test]
    fn filter_long_strings_dropped() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = long_string_file(true);
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_long_string(), 1);
        assert!(file.var("/text").is_none());
        assert!(file.var("/label").is_some());
        assert!(file.var("/t").is_some_and(|var| !var.has_attribute("comment")));
        assert_eq!(file.root_attributes().len(), 1);
        assert_eq!(
            file.diagnostics().entries(DiagnosticCategory::LongStrings),
            &[
                "Variable path: /text".to_string(),
                "Object path: /  Attribute name: history".to_string(),
                "Object path: /t  Attribute name: comment".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn filter_long_strings_kept_by_default() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = long_string_file(false);
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_long_string(), 0);
        assert!(file.var("/text").is_some());
        assert!(file.var("/t").is_some_and(|var| var.has_attribute("comment")));
        assert_eq!(file.root_attributes().len(), 2);
        assert!(file
            .diagnostics()
            .entries(DiagnosticCategory::LongStrings)
            .is_empty());
        Ok(())
    }

    #[test]
    fn filter_long_string_cvar_replaced() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = diagnostics_file();
        file.config.set_drop_long_string(true);
        file.dimensions.insert("FakeDim0", 3, false)?;
        let mut names = var("/names", Datatype::VariableString, vec![]);
        names.longest_string = NETCDF_STRING_LIMIT + 10;
        let key = file.vars.insert(names);
        file.promote(key, "FakeDim0", CVarKind::Existing)?;
        let summary = remove_unsupported(&mut file)?;
        assert_eq!(summary.removed_for_long_string(), 1);
        let cvar = file.cvar_of_dimension("FakeDim0").unwrap();
        assert_eq!(cvar.kind(), CVarKind::OtherMissing);
        Ok(())
    }

    #[test]
    fn filter_strip_housekeeping() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.pattern = Pattern::DimensionScale;
        file.root_attributes.push(Attribute::new_string("_NCProperties", "version=2"));
        file.root_attributes.push(Attribute::new_string("title", "t"));
        let key = file.vars.insert(var(
            "/x",
            Datatype::Float32,
            vec![
                Attribute::new_string("CLASS", "DIMENSION_SCALE"),
                Attribute::new_string("NAME", "x"),
                Attribute::new_string("units", "m"),
            ],
        ));
        file.promote(key, "/x", CVarKind::Existing)?;
        file.vars.insert(var(
            "/t",
            Datatype::Float32,
            vec![Attribute::new_string("_Netcdf4Coordinates", "")],
        ));
        remove_unsupported(&mut file)?;
        assert_eq!(file.root_attributes().len(), 1);
        let x = file.cvar("/x").unwrap();
        assert_eq!(x.attributes().len(), 1);
        assert!(x.has_attribute("units"));
        assert!(file.var("/t").is_some_and(|var| var.attributes().is_empty()));

        let mut file = File::new(Config::default());
        file.root_attributes.push(Attribute::new_string("_NCProperties", "version=2"));
        remove_unsupported(&mut file)?;
        assert_eq!(file.root_attributes().len(), 1);
        Ok(())
    }
}
