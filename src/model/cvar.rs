use derive_more::{Deref, DerefMut, Display};

use crate::datatype::Datatype;

use super::{Attribute, Dimension, Var};

/// The kind of a coordinate variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum CVarKind {
    /// An existing variable promoted to a coordinate variable.
    Existing,
    /// A synthesized latitude, with values derived from a [`CoordinateSource`].
    LatitudeMissing,
    /// A synthesized longitude, with values derived from a [`CoordinateSource`].
    LongitudeMissing,
    /// A synthesized coordinate with index values.
    OtherMissing,
    /// A pure netCDF dimension with index values.
    IndexFill,
    /// An existing variable whose attributes were rewritten to describe its values.
    Modified,
    /// A synthesized coordinate with a fixed special sequence of values.
    Special,
    /// A coordinate that cannot be represented.
    Unsupported,
}

impl CVarKind {
    /// Returns true if the coordinate variable is backed by a dataset of the container.
    #[must_use]
    pub const fn is_existing(&self) -> bool {
        matches!(self, Self::Existing | Self::Modified)
    }

    /// Returns true if the coordinate variable has no backing dataset.
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        matches!(
            self,
            Self::LatitudeMissing | Self::LongitudeMissing | Self::OtherMissing | Self::Special
        )
    }
}

/// The axis of a grid header coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum GridAxis {
    /// Latitude.
    Latitude,
    /// Longitude.
    Longitude,
}

/// A fixed special sequence of coordinate values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum SpecialSequence {
    /// GPM precipitation layer boundaries.
    GpmLayers,
    /// GPM heights.
    GpmHeights,
}

/// How the values of a coordinate variable are derived by a value reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinateSource {
    /// `0..size`.
    Index,
    /// `start + step * i`, with `start`, `step`, and the element count read from file attributes.
    SideAttributes {
        /// The name of the start attribute.
        start: String,
        /// The name of the step attribute.
        step: String,
        /// The name of the element count attribute.
        count: String,
    },
    /// The grid description header attribute of a GPM group.
    GridHeader {
        /// The group holding the header attribute.
        group: String,
        /// The name of the header attribute.
        attribute: String,
        /// The axis.
        axis: GridAxis,
    },
    /// A fixed sequence of values.
    Special(SpecialSequence),
}

/// A coordinate variable: a 1-D (or 2-D geolocation) variable bound to one CF dimension.
#[derive(Clone, Debug, PartialEq, Deref, DerefMut)]
pub struct CVar {
    #[deref]
    #[deref_mut]
    pub(crate) var: Var,
    pub(crate) cf_dim_name: String,
    pub(crate) kind: CVarKind,
    pub(crate) source: Option<CoordinateSource>,
}

impl CVar {
    /// Promote `var` to a coordinate variable of `cf_dim_name`.
    #[must_use]
    pub fn promote(var: Var, cf_dim_name: &str, kind: CVarKind) -> Self {
        Self {
            var,
            cf_dim_name: cf_dim_name.to_string(),
            kind,
            source: None,
        }
    }

    /// Synthesize a 1-D coordinate variable for the dimension `dim_name` of `size`.
    ///
    /// The variable is named by the dimension and has index values.
    #[must_use]
    pub fn synthesize(dim_name: &str, size: u64, unlimited: bool, datatype: Datatype, kind: CVarKind) -> Self {
        let mut var = Var::new(dim_name, datatype);
        var.name = dim_name.to_string();
        let mut dimension = Dimension::new(size, unlimited);
        dimension.set_name(dim_name);
        var.dimensions.push(dimension);
        Self {
            var,
            cf_dim_name: dim_name.to_string(),
            kind,
            source: Some(CoordinateSource::Index),
        }
    }

    /// Set the value source.
    #[must_use]
    pub fn with_source(mut self, source: CoordinateSource) -> Self {
        self.source = Some(source);
        self
    }

    /// The name of the CF dimension this variable is the coordinate of.
    #[must_use]
    pub fn cf_dim_name(&self) -> &str {
        &self.cf_dim_name
    }

    /// The kind.
    #[must_use]
    pub const fn kind(&self) -> CVarKind {
        self.kind
    }

    /// The value source of a synthesized coordinate variable.
    #[must_use]
    pub fn source(&self) -> Option<&CoordinateSource> {
        self.source.as_ref()
    }

    /// The underlying variable.
    #[must_use]
    pub fn var(&self) -> &Var {
        &self.var
    }

    /// Set the string attribute `name` to `value`.
    ///
    /// An [`Existing`](CVarKind::Existing) coordinate variable becomes [`Modified`](CVarKind::Modified) if the value changes.
    pub(crate) fn rewrite_string_attribute(&mut self, name: &str, value: &str) {
        if self.string_attribute(name).as_deref() == Some(value) {
            return;
        }
        self.var.set_attribute(Attribute::new_string(name, value));
        if self.kind == CVarKind::Existing {
            self.kind = CVarKind::Modified;
        }
    }

    /// Mark an [`Existing`](CVarKind::Existing) coordinate variable as [`Modified`](CVarKind::Modified).
    pub(crate) fn mark_modified(&mut self) {
        if self.kind == CVarKind::Existing {
            self.kind = CVarKind::Modified;
        }
    }

    /// Convert back into a plain variable.
    #[must_use]
    pub fn into_var(self) -> Var {
        self.var
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cvar_synthesize() {
        let cvar = CVar::synthesize("FakeDim0", 5, false, Datatype::Int32, CVarKind::OtherMissing);
        assert_eq!(cvar.name(), "FakeDim0");
        assert_eq!(cvar.full_path(), "FakeDim0");
        assert_eq!(cvar.rank(), 1);
        assert_eq!(cvar.dimensions()[0].size(), 5);
        assert_eq!(cvar.dimensions()[0].name(), "FakeDim0");
        assert_eq!(cvar.source(), Some(&CoordinateSource::Index));
        assert!(cvar.kind().is_synthesized());
        assert!(!CVarKind::IndexFill.is_synthesized());
    }

    #[test]
    fn cvar_rewrite_string_attribute() {
        let mut var = Var::new("/lat", Datatype::Float32);
        var.attributes.push(Attribute::new_string("units", "degrees_north"));
        let mut cvar = CVar::promote(var, "/lat", CVarKind::Existing);
        cvar.rewrite_string_attribute("units", "degrees_north");
        assert_eq!(cvar.kind(), CVarKind::Existing);
        cvar.rewrite_string_attribute("axis", "Y");
        assert_eq!(cvar.kind(), CVarKind::Modified);
        assert!(cvar.kind().is_existing());

        let mut index = CVar::synthesize("FakeDim0", 2, false, Datatype::Int32, CVarKind::OtherMissing);
        index.rewrite_string_attribute("units", "level");
        assert_eq!(index.kind(), CVarKind::OtherMissing);
    }
}
