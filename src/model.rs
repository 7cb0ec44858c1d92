//! The flat variable model.
//!
//! A [`File`] owns three [`EntityStore`]s: groups, plain variables ([`Var`]), and coordinate variables ([`CVar`]).
//! Entities are addressed by [`EntityKey`] and are owned by exactly one store at a time.
//! Promoting a variable to a coordinate variable moves it between stores, see [`File::promote`] and [`File::retract`].

mod attribute;
mod cvar;
mod dimension;
mod entity_store;
mod file;
mod group;
mod state;
mod var;

pub use attribute::Attribute;
pub use cvar::{CVar, CVarKind, CoordinateSource, GridAxis, SpecialSequence};
pub use dimension::{Dimension, DimensionEntry, DimensionTable};
pub use entity_store::{EntityKey, EntityStore};
pub use file::{File, DEFAULT_ATTRIBUTE_TABLE_NAME};
pub use group::Group;
pub(crate) use state::DialectState;
pub use state::{LatLonPair, Pattern, Producer};
pub use var::{PackedDigits, Var};
