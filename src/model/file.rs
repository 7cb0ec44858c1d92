use crate::{config::Config, filter::Diagnostics, normalize::NormalizeError};

use super::{
    Attribute, CVar, CVarKind, DialectState, DimensionTable, EntityKey, EntityStore, Group,
    LatLonPair, Pattern, Producer, Var,
};

/// The default name of the table holding the file (root group) attributes.
pub const DEFAULT_ATTRIBUTE_TABLE_NAME: &str = "HDF5_GLOBAL";

/// A normalized file.
///
/// A [`File`] owns every group, variable, and coordinate variable of one normalization run.
/// Variables move between the variable and coordinate variable stores only through [`File::promote`] and [`File::retract`].
#[derive(Debug)]
pub struct File {
    pub(crate) root_attributes: Vec<Attribute>,
    pub(crate) root_unsupported_attribute_type: bool,
    pub(crate) groups: EntityStore<Group>,
    pub(crate) vars: EntityStore<Var>,
    pub(crate) cvars: EntityStore<CVar>,
    pub(crate) dimensions: DimensionTable,
    pub(crate) producer: Producer,
    pub(crate) pattern: Pattern,
    pub(crate) state: DialectState,
    pub(crate) attribute_table_name: String,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) config: Config,
}

impl File {
    /// Create an empty file normalized with `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            root_attributes: Vec::new(),
            root_unsupported_attribute_type: false,
            groups: EntityStore::new(),
            vars: EntityStore::new(),
            cvars: EntityStore::new(),
            dimensions: DimensionTable::default(),
            producer: Producer::General,
            pattern: Pattern::Other,
            state: DialectState::default(),
            attribute_table_name: DEFAULT_ATTRIBUTE_TABLE_NAME.to_string(),
            diagnostics: Diagnostics::new(config.emit_diagnostics()),
            config,
        }
    }

    /// The root group attributes.
    #[must_use]
    pub fn root_attributes(&self) -> &[Attribute] {
        &self.root_attributes
    }

    /// The root attribute named `name`.
    #[must_use]
    pub fn root_attribute(&self, name: &str) -> Option<&Attribute> {
        self.root_attributes
            .iter()
            .find(|attribute| attribute.name == name)
    }

    /// The concatenated value of the root string attribute named `name`.
    #[must_use]
    pub fn root_string_attribute(&self, name: &str) -> Option<String> {
        self.root_attribute(name).and_then(Attribute::as_string)
    }

    /// The groups other than the root.
    #[must_use]
    pub const fn groups(&self) -> &EntityStore<Group> {
        &self.groups
    }

    /// The plain variables.
    #[must_use]
    pub const fn vars(&self) -> &EntityStore<Var> {
        &self.vars
    }

    /// The coordinate variables.
    #[must_use]
    pub const fn cvars(&self) -> &EntityStore<CVar> {
        &self.cvars
    }

    /// The dimension table.
    #[must_use]
    pub const fn dimensions(&self) -> &DimensionTable {
        &self.dimensions
    }

    /// The detected producer.
    #[must_use]
    pub const fn producer(&self) -> Producer {
        self.producer
    }

    /// The detected structural pattern.
    #[must_use]
    pub const fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Returns true if dimensions take the names of their coordinate variables.
    #[must_use]
    pub const fn is_coards(&self) -> bool {
        self.state.coards
    }

    /// The latitude/longitude pairs found by the `coordinates` attribute scan.
    #[must_use]
    pub fn lat_lon_pairs(&self) -> &[LatLonPair] {
        &self.state.pairs
    }

    /// The groups whose variables keep their original `coordinates` attribute.
    pub fn keep_coordinates_groups(&self) -> impl Iterator<Item = &str> {
        self.state.keep_coordinates_groups.iter().map(String::as_str)
    }

    /// The name of the table holding the file attributes.
    #[must_use]
    pub fn attribute_table_name(&self) -> &str {
        &self.attribute_table_name
    }

    /// The diagnostics of ignored objects.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The configuration of the run.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The plain variable with `full_path`.
    #[must_use]
    pub fn var(&self, full_path: &str) -> Option<&Var> {
        self.vars.values().find(|var| var.full_path == full_path)
    }

    /// The coordinate variable with `full_path`.
    #[must_use]
    pub fn cvar(&self, full_path: &str) -> Option<&CVar> {
        self.cvars.values().find(|cvar| cvar.full_path == full_path)
    }

    /// The coordinate variable of the CF dimension `dim_name`.
    #[must_use]
    pub fn cvar_of_dimension(&self, dim_name: &str) -> Option<&CVar> {
        self.cvars
            .values()
            .find(|cvar| cvar.cf_dim_name == dim_name)
    }

    pub(crate) fn var_key(&self, full_path: &str) -> Option<EntityKey> {
        self.vars.find(|var| var.full_path == full_path)
    }

    /// Returns true if the file has groups other than the root.
    #[must_use]
    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Promote the variable at `key` to a coordinate variable of `cf_dim_name`.
    ///
    /// The variable is removed from the variable store and inserted in the coordinate variable store.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if `key` is not a variable.
    pub fn promote(
        &mut self,
        key: EntityKey,
        cf_dim_name: &str,
        kind: CVarKind,
    ) -> Result<EntityKey, NormalizeError> {
        let var = self
            .vars
            .remove(key)
            .ok_or_else(|| normalize_err!("cannot promote variable {key}, it does not exist"))?;
        tracing::trace!(var = %var.full_path, cf_dim_name, %kind, "promote");
        Ok(self.cvars.insert(CVar::promote(var, cf_dim_name, kind)))
    }

    /// Retract the coordinate variable at `key` back to a plain variable.
    ///
    /// An [`IndexFill`](CVarKind::IndexFill) coordinate variable has no plain counterpart and is discarded.
    /// Returns the key of the restored variable.
    ///
    /// # Errors
    /// Returns a [`NormalizeError`] if `key` is not a coordinate variable, or is neither an existing nor an index-fill coordinate variable.
    pub fn retract(&mut self, key: EntityKey) -> Result<Option<EntityKey>, NormalizeError> {
        let kind = self
            .cvars
            .get(key)
            .ok_or_else(|| normalize_err!("cannot retract coordinate variable {key}, it does not exist"))?
            .kind;
        match kind {
            CVarKind::IndexFill => {
                self.cvars.remove(key);
                Ok(None)
            }
            CVarKind::Existing => {
                let cvar = self.cvars.remove(key).ok_or_else(|| {
                    normalize_err!("cannot retract coordinate variable {key}, it does not exist")
                })?;
                tracing::trace!(var = %cvar.full_path, "retract");
                Ok(Some(self.vars.insert(cvar.into_var())))
            }
            kind => Err(normalize_err!(
                "cannot retract a coordinate variable of kind {kind}"
            )),
        }
    }
}
