use std::{collections::BTreeMap, fmt::Write};

use derive_more::Display;

/// The category of an ignored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum DiagnosticCategory {
    /// Soft and external links.
    #[display("IGNORED soft links and external links:")]
    Links,
    /// Named (committed) datatypes.
    #[display("IGNORED named datatypes:")]
    NamedDatatypes,
    /// Attributes of the root and other groups.
    #[display("IGNORED attributes of the root and groups:")]
    GroupAttributes,
    /// Attributes of variables.
    #[display("IGNORED attributes of variables:")]
    VarAttributes,
    /// Variables with an unsupported datatype.
    #[display("IGNORED variables with unsupported datatypes:")]
    VarDatatype,
    /// Variables with an unsupported dataspace.
    #[display("IGNORED variables with unsupported dimensions:")]
    VarDataspace,
    /// String variables and attributes longer than the netCDF string limit.
    #[display("IGNORED string variables and attributes longer than the netCDF string limit (32767 bytes):")]
    LongStrings,
}

const PAGE_HEADER: &str = "This transcript lists the HDF5 objects and attributes that were ignored while mapping the file to the flat CF model.\n";

const OBJECT_HEADER: &str = "\
Ignored objects include soft links, external links, and named datatypes.
Variables and attributes are ignored if their datatype is compound, reference, array, enum, opaque, bitfield, time, or a variable-length sequence other than a string.
64-bit integer variables and attributes are ignored unless 64-bit integer support is enabled, and are always listed.
Variables are ignored if their dataspace is null, has a zero-sized dimension, or is a non-string scalar, and dimension scales are ignored if they are not one-dimensional.
String variables and attributes longer than 32767 bytes are ignored if long strings are dropped.
";

const NOTHING_IGNORED: &str = "There are no ignored HDF5 objects or attributes.";

/// The transcript of objects ignored during a normalization run.
///
/// Entries are only recorded if diagnostics are enabled.
/// The [`Display`](std::fmt::Display) implementation renders the transcript with each category header emitted once.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
    entries: BTreeMap<DiagnosticCategory, Vec<String>>,
}

impl Diagnostics {
    /// Create a new diagnostics buffer.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: BTreeMap::new(),
        }
    }

    /// Returns true if entries are recorded.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an ignored link at `path`.
    pub fn ignored_link(&mut self, path: &str, target: &str) {
        self.record(DiagnosticCategory::Links, format!("Link path: {path} -> {target}"));
    }

    /// Record an ignored named datatype `name` in `group`.
    pub fn ignored_named_datatype(&mut self, group: &str, name: &str) {
        self.record(
            DiagnosticCategory::NamedDatatypes,
            format!("Group path: {group}  Named datatype: {name}"),
        );
    }

    /// Record an ignored attribute of a group at `path`.
    pub fn ignored_group_attribute(&mut self, path: &str, attribute: &str) {
        self.record(
            DiagnosticCategory::GroupAttributes,
            format!("Group path: {path}  Attribute name: {attribute}"),
        );
    }

    /// Record an ignored attribute of a variable at `path`.
    pub fn ignored_var_attribute(&mut self, path: &str, attribute: &str) {
        self.record(
            DiagnosticCategory::VarAttributes,
            format!("Variable path: {path}  Attribute name: {attribute}"),
        );
    }

    /// Record a variable at `path` ignored for its datatype.
    pub fn ignored_var_datatype(&mut self, path: &str) {
        self.record(DiagnosticCategory::VarDatatype, format!("Variable path: {path}"));
    }

    /// Record a variable at `path` ignored for its dataspace.
    pub fn ignored_var_dataspace(&mut self, path: &str) {
        self.record(DiagnosticCategory::VarDataspace, format!("Variable path: {path}"));
    }

    /// Record a string variable at `path` ignored for its length.
    pub fn ignored_long_string_var(&mut self, path: &str) {
        self.record(DiagnosticCategory::LongStrings, format!("Variable path: {path}"));
    }

    /// Record a string attribute of the object at `path` ignored for its length.
    pub fn ignored_long_string_attribute(&mut self, path: &str, attribute: &str) {
        self.record(
            DiagnosticCategory::LongStrings,
            format!("Object path: {path}  Attribute name: {attribute}"),
        );
    }

    fn record(&mut self, category: DiagnosticCategory, entry: String) {
        tracing::debug!(%category, entry = %entry, "ignored");
        if self.enabled {
            self.entries.entry(category).or_default().push(entry);
        }
    }

    /// The entries of `category`.
    #[must_use]
    pub fn entries(&self, category: DiagnosticCategory) -> &[String] {
        self.entries.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Render the transcript.
    ///
    /// Returns [`None`] if diagnostics are disabled.
    #[must_use]
    pub fn transcript(&self) -> Option<String> {
        self.enabled.then(|| self.to_string())
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut transcript = String::from(PAGE_HEADER);
        if self.is_empty() {
            transcript.push_str(NOTHING_IGNORED);
        } else {
            transcript.push_str(OBJECT_HEADER);
            for (category, entries) in &self.entries {
                writeln!(transcript, "\n******WARNING******\n{category}")?;
                for entry in entries {
                    writeln!(transcript, " {entry}")?;
                }
            }
        }
        f.write_str(&transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_nothing_ignored() {
        let diagnostics = Diagnostics::new(true);
        assert!(diagnostics
            .to_string()
            .ends_with("There are no ignored HDF5 objects or attributes."));
    }

    #[test]
    fn diagnostics_headers_once_in_category_order() {
        let mut diagnostics = Diagnostics::new(true);
        diagnostics.ignored_var_datatype("/a");
        diagnostics.ignored_link("/l", "/a");
        diagnostics.ignored_var_datatype("/b");
        let transcript = diagnostics.to_string();
        assert_eq!(
            transcript
                .matches("IGNORED variables with unsupported datatypes:")
                .count(),
            1
        );
        let links = transcript.find("IGNORED soft links").unwrap();
        let datatypes = transcript.find("IGNORED variables with").unwrap();
        assert!(links < datatypes);
        assert!(transcript.contains(" Variable path: /a\n Variable path: /b\n"));
        assert_eq!(diagnostics.entries(DiagnosticCategory::VarDatatype).len(), 2);
    }

    #[test]
    fn diagnostics_disabled_records_nothing() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.ignored_var_dataspace("/a");
        assert!(diagnostics.is_empty());
        assert_eq!(diagnostics.transcript(), None);
    }
}
