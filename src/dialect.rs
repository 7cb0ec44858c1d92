//! The dialect classifier.
//!
//! Classification first matches a [producer plugin](crate::plugin::ProducerPlugin), then tries the structural patterns of general products in a fixed order.
//! The first match wins and is never revisited.
//! A file matching no pattern is [`Pattern::Other`], which is not an error.

mod cleanup;
mod pattern;
mod producer;

pub(crate) use cleanup::{remove_unneeded_objects, NC4_NON_COORD_PREFIX};
pub(crate) use pattern::{
    coordinate_tokens, has_latitude_suffix, has_longitude_suffix, is_dimension_scale_var,
    is_latitude_name, is_longitude_name, resolve_coordinate,
};

use crate::{
    model::{File, Pattern, Producer},
    plugin,
};

/// Classify `file` into a producer and a structural pattern.
pub fn classify(file: &mut File) {
    if let Some(plugin) = plugin::match_producer(file) {
        tracing::debug!(plugin = plugin.identifier(), "matched producer plugin");
        file.producer = plugin.producer();
    }
    let producer = file.producer;
    match producer {
        Producer::GpmL3Single | Producer::GpmL3Multi if pattern::is_dimension_scale(file) => {
            file.producer = Producer::General;
            file.pattern = Pattern::DimensionScale;
        }
        Producer::ObpgL3 | Producer::SeaWifsL2 | Producer::SeaWifsL3 | Producer::MeasuresOzone
            if pattern::is_dimension_scale(file) =>
        {
            file.pattern = Pattern::DimensionScale;
        }
        Producer::General => classify_general(file),
        _ => {}
    }
    tracing::debug!(producer = %file.producer, pattern = %file.pattern, "classified");
}

fn classify_general(file: &mut File) {
    if pattern::is_dimension_scale(file) {
        file.pattern = Pattern::DimensionScale;
    } else if pattern::is_new_gpm_l3(file) {
        file.producer = Producer::GpmL3New;
    } else if let Some((latitude, longitude)) = pattern::lat_lon_2d(file) {
        file.pattern = Pattern::LatLon2D;
        file.state.latitude = Some(latitude);
        file.state.longitude = Some(longitude);
    } else if let Some((latitude, longitude)) = pattern::lat_lon_1d(file) {
        file.pattern = Pattern::LatLon1D;
        file.state.latitude = Some(latitude);
        file.state.longitude = Some(longitude);
    } else if let Some(pairs) = pattern::coordinates_pairs(file) {
        file.pattern = Pattern::CoordinatesAttribute;
        file.state.pairs = pairs;
    }
}
