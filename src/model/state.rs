use std::collections::BTreeSet;

use derive_more::Display;

/// The producer dialect of a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum Producer {
    /// A general product following no known producer convention.
    #[default]
    General,
    /// A GPM level 1 swath product.
    GpmL1,
    /// A GPM level 3 product with a single grid.
    GpmL3Single,
    /// A GPM level 3 product with multiple grids.
    GpmL3Multi,
    /// A GPM level 3 product with `DimensionNames` attributes.
    GpmL3New,
    /// An Aquarius level 3 product.
    AquariusL3,
    /// An OBPG level 3 mapped product.
    ObpgL3,
    /// A MEaSUREs SeaWiFS level 2 product.
    SeaWifsL2,
    /// A MEaSUREs SeaWiFS level 3 product.
    SeaWifsL3,
    /// A MEaSUREs ozone zonal mean product.
    MeasuresOzone,
    /// A SMAP product.
    Smap,
    /// An ACOS or OCO-2 product.
    AcosOco2,
}

impl Producer {
    /// Returns true for GPM products.
    #[must_use]
    pub const fn is_gpm(&self) -> bool {
        matches!(
            self,
            Self::GpmL1 | Self::GpmL3Single | Self::GpmL3Multi | Self::GpmL3New
        )
    }

    /// Returns true for GPM level 3 products.
    #[must_use]
    pub const fn is_gpm_l3(&self) -> bool {
        matches!(self, Self::GpmL3Single | Self::GpmL3Multi | Self::GpmL3New)
    }

    /// Returns true for MEaSUREs SeaWiFS products.
    #[must_use]
    pub const fn is_seawifs(&self) -> bool {
        matches!(self, Self::SeaWifsL2 | Self::SeaWifsL3)
    }
}

/// The structural pattern of a general product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum Pattern {
    /// Dimension scales name the dimensions.
    DimensionScale,
    /// A 2-D latitude/longitude pair.
    LatLon2D,
    /// A 1-D latitude/longitude pair.
    LatLon1D,
    /// `coordinates` attributes name latitude/longitude pairs.
    CoordinatesAttribute,
    /// No recognized pattern.
    #[default]
    Other,
}

/// A latitude/longitude variable pair found by the classifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatLonPair {
    /// The full path of the latitude.
    pub latitude: String,
    /// The full path of the longitude.
    pub longitude: String,
    /// The rank of both variables.
    pub rank: usize,
}

/// State shared between passes for the detected dialect.
#[derive(Clone, Debug, Default)]
pub(crate) struct DialectState {
    /// Dimensions take the names of their 1-D coordinate variables.
    pub(crate) coards: bool,
    /// The latitude path of the 1-D and 2-D lat/lon patterns.
    pub(crate) latitude: Option<String>,
    /// The longitude path of the 1-D and 2-D lat/lon patterns.
    pub(crate) longitude: Option<String>,
    /// The pairs of the coordinates attribute pattern.
    pub(crate) pairs: Vec<LatLonPair>,
    /// Groups whose variables keep their original `coordinates` attribute.
    pub(crate) keep_coordinates_groups: BTreeSet<String>,
    /// Full paths of pure netCDF-4 dimensions shadowed by a `_nc4_non_coord_` variable.
    pub(crate) nc4_shadow_paths: BTreeSet<String>,
    /// The file contains `_nc4_non_coord_` variables.
    pub(crate) has_nc4_non_coord: bool,
}
