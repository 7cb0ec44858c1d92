//! Supplementary attributes.
//!
//! Adds the attributes a CF client needs to map flattened names back to the container (`origname` and `fullnamepath`), and the CF attributes that producer conventions leave implicit.

use crate::{
    coordinate::{DEGREES_EAST, DEGREES_NORTH},
    datatype::Datatype,
    dimension::AQUARIUS_DATA,
    model::{Attribute, CVarKind, CoordinateSource, File, Producer, SpecialSequence, Var},
};

const ORIGNAME: &str = "origname";
const FULLNAMEPATH: &str = "fullnamepath";
const FILL_VALUE: &str = "_FillValue";
const GPM_MISSING_VALUE: &str = "CodeMissingValue";
const AQUARIUS_FILL_VALUE: f32 = -32767.0;
const SEAWIFS_FILL_VALUE: f32 = -999.0;

/// Add the supplementary attributes of `file`.
///
/// Path attributes are only added if [add supplementary attributes](crate::config::Config#add-supplementary-attributes) is enabled.
pub fn add_supplementary_attributes(file: &mut File) {
    if file.config.add_supplementary_attributes() {
        add_path_attributes(file);
    }
    match file.producer {
        Producer::GpmL1 | Producer::GpmL3Single | Producer::GpmL3Multi => add_gpm_attributes(file),
        Producer::AquariusL3 => add_aquarius_attributes(file),
        producer if producer.is_seawifs() => add_seawifs_attributes(file),
        _ => {}
    }
}

fn add_var_path_attributes(var: &mut Var, omit_zero_storage: bool) {
    let origname = Attribute::new_string(ORIGNAME, &var.name);
    var.set_attribute(origname);
    if !(omit_zero_storage && var.zero_storage) {
        let fullnamepath = Attribute::new_string(FULLNAMEPATH, &var.full_path);
        var.set_attribute(fullnamepath);
    }
}

/// Add `origname` and `fullnamepath` to every object backed by a dataset, and `fullnamepath` to every group with attributes.
fn add_path_attributes(file: &mut File) {
    let omit_zero_storage = file.config.omit_zero_storage_fullnamepath();
    for var in file.vars.values_mut() {
        add_var_path_attributes(var, omit_zero_storage);
    }
    for cvar in file
        .cvars
        .values_mut()
        .filter(|cvar| cvar.kind.is_existing())
    {
        add_var_path_attributes(&mut cvar.var, omit_zero_storage);
    }
    for group in file
        .groups
        .values_mut()
        .filter(|group| !group.attributes.is_empty())
    {
        let fullnamepath = Attribute::new_string(FULLNAMEPATH, &group.path);
        group.attributes.push(fullnamepath);
    }
}

/// Rename the GPM `CodeMissingValue` of `var` to `_FillValue`.
///
/// A string missing value is converted to the datatype of the variable.
fn gpm_fill_value(var: &mut Var) {
    if var.has_attribute(FILL_VALUE) {
        return;
    }
    let Some(missing) = var.remove_attribute(GPM_MISSING_VALUE) else {
        return;
    };
    let fill_value = if missing.datatype().is_string() {
        missing
            .as_string()
            .and_then(|value| value.trim().parse::<f64>().ok())
            .and_then(|value| Attribute::new_numeric(FILL_VALUE, var.datatype, &[value]))
    } else {
        let mut fill_value = missing.clone();
        fill_value.name = FILL_VALUE.to_string();
        fill_value.new_name = FILL_VALUE.to_string();
        Some(fill_value)
    };
    match fill_value {
        Some(fill_value) => var.attributes.push(fill_value),
        None => {
            tracing::debug!(var = %var.full_path, "cannot convert the GPM missing value to a fill value");
            var.attributes.push(missing);
        }
    }
}

fn add_gpm_attributes(file: &mut File) {
    for var in file.vars.values_mut() {
        gpm_fill_value(var);
    }
    let producer = file.producer;
    for cvar in file.cvars.values_mut() {
        gpm_fill_value(&mut cvar.var);
        match (producer, cvar.kind) {
            (Producer::GpmL1, CVarKind::Existing) => {
                let units = if cvar.name.contains("Latitude") {
                    DEGREES_NORTH
                } else if cvar.name.contains("Longitude") {
                    DEGREES_EAST
                } else {
                    continue;
                };
                if cvar.remove_attribute("Units").is_some() {
                    cvar.mark_modified();
                }
                cvar.rewrite_string_attribute("units", units);
            }
            (Producer::GpmL3Single | Producer::GpmL3Multi, CVarKind::Special) => {
                cvar.set_attribute(Attribute::new_string("units", "km"));
                cvar.set_attribute(Attribute::new_string("axis", "Z"));
                cvar.set_attribute(Attribute::new_string("positive", "up"));
                if cvar.source == Some(CoordinateSource::Special(SpecialSequence::GpmHeights)) {
                    cvar.set_attribute(Attribute::new_string(
                        "comment",
                        "Number of heights above the earth ellipsoid",
                    ));
                }
            }
            _ => {}
        }
    }
}

/// SeaWiFS `float32` variables without a `_FillValue` or `valid_range` use -999.
fn add_seawifs_attributes(file: &mut File) {
    for var in file.vars.values_mut().filter(|var| {
        var.datatype == Datatype::Float32
            && !var.has_attribute(FILL_VALUE)
            && !var.has_attribute("valid_range")
    }) {
        var.attributes
            .push(Attribute::new_float32(FILL_VALUE, &[SEAWIFS_FILL_VALUE]));
    }
}

/// Add the CF attributes of the Aquarius data variable from the file attributes.
fn add_aquarius_attributes(file: &mut File) {
    let long_name = file.root_string_attribute("Parameter");
    let units = file.root_string_attribute("Units");
    let root_f32 = |names: [&str; 2]| {
        names
            .iter()
            .find_map(|name| file.root_attribute(name))
            .and_then(Attribute::as_f64s)
            .and_then(|values| values.first().copied())
    };
    #[allow(clippy::cast_possible_truncation)]
    let valid_min = root_f32(["Data Minimum", "data_minimum"]).map(|value| value as f32);
    #[allow(clippy::cast_possible_truncation)]
    let valid_max = root_f32(["Data Maximum", "data_maximum"]).map(|value| value as f32);

    for var in file
        .vars
        .values_mut()
        .filter(|var| var.name == AQUARIUS_DATA)
    {
        let mut add = |attribute: Attribute| {
            if !var.has_attribute(attribute.name()) {
                var.attributes.push(attribute);
            }
        };
        if let Some(long_name) = &long_name {
            add(Attribute::new_string("long_name", long_name));
        }
        if let Some(units) = &units {
            add(Attribute::new_string("units", units));
        }
        if let Some(valid_min) = valid_min {
            add(Attribute::new_float32("valid_min", &[valid_min]));
        }
        if let Some(valid_max) = valid_max {
            add(Attribute::new_float32("valid_max", &[valid_max]));
        }
        add(Attribute::new_float32(FILL_VALUE, &[AQUARIUS_FILL_VALUE]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        container::RawAttribute,
        model::{CVar, Group},
    };

    #[test]
    fn supplement_path_attributes() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.vars.insert(Var::new("/g/t", Datatype::Float32));
        let mut empty = Var::new("/g/empty", Datatype::Float32);
        empty.zero_storage = true;
        file.vars.insert(empty);
        let mut group = Group::new("/g");
        group.attributes.push(Attribute::new_string("title", "g"));
        file.groups.insert(group);
        file.groups.insert(Group::new("/h"));
        let key = file.vars.insert(Var::new("/g/x", Datatype::Float32));
        file.promote(key, "/g/x", CVarKind::Existing)?;
        file.cvars.insert(CVar::synthesize(
            "FakeDim0",
            2,
            false,
            Datatype::Int32,
            CVarKind::OtherMissing,
        ));
        file.config.set_omit_zero_storage_fullnamepath(true);
        add_supplementary_attributes(&mut file);

        let t = file.var("/g/t").unwrap();
        assert_eq!(t.string_attribute(ORIGNAME).as_deref(), Some("t"));
        assert_eq!(t.string_attribute(FULLNAMEPATH).as_deref(), Some("/g/t"));
        let empty = file.var("/g/empty").unwrap();
        assert!(empty.has_attribute(ORIGNAME));
        assert!(!empty.has_attribute(FULLNAMEPATH));
        assert!(file.cvar("/g/x").unwrap().has_attribute(FULLNAMEPATH));
        assert!(file.cvar("FakeDim0").unwrap().attributes().is_empty());
        let groups: Vec<bool> = file
            .groups()
            .values()
            .map(|group| group.attribute(FULLNAMEPATH).is_some())
            .collect();
        assert_eq!(groups, vec![true, false]);
        Ok(())
    }

    #[test]
    fn supplement_disabled() {
        let mut config = Config::default();
        config.set_add_supplementary_attributes(false);
        let mut file = File::new(config);
        file.vars.insert(Var::new("/t", Datatype::Float32));
        add_supplementary_attributes(&mut file);
        assert!(file.var("/t").unwrap().attributes().is_empty());
    }

    #[test]
    fn supplement_gpm_fill_value() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL1;
        let mut precip = Var::new("/S1/precip", Datatype::Int16);
        precip
            .attributes
            .push(Attribute::new_string(GPM_MISSING_VALUE, "-9999"));
        file.vars.insert(precip);
        let mut lat = Var::new("/S1/Latitude", Datatype::Float32);
        lat.attributes.push(Attribute::new_string("Units", "degrees"));
        let key = file.vars.insert(lat);
        file.promote(key, "/S1/nscan", CVarKind::Existing)?;
        add_supplementary_attributes(&mut file);

        let precip = file.var("/S1/precip").unwrap();
        assert!(!precip.has_attribute(GPM_MISSING_VALUE));
        let fill_value = precip.attribute(FILL_VALUE).unwrap();
        assert_eq!(fill_value.datatype(), Datatype::Int16);
        assert_eq!(fill_value.as_f64s(), Some(vec![-9999.0]));
        let lat = file.cvar("/S1/Latitude").unwrap();
        assert!(!lat.has_attribute("Units"));
        assert_eq!(lat.units().as_deref(), Some(DEGREES_NORTH));
        assert_eq!(lat.kind(), CVarKind::Modified);
        Ok(())
    }

    #[test]
    fn supplement_gpm_l3_special() {
        let mut file = File::new(Config::default());
        file.producer = Producer::GpmL3Single;
        file.cvars.insert(
            CVar::synthesize("hgt", 5, false, Datatype::Float32, CVarKind::Special)
                .with_source(CoordinateSource::Special(SpecialSequence::GpmHeights)),
        );
        file.cvars.insert(
            CVar::synthesize("nlayer", 28, false, Datatype::Float32, CVarKind::Special)
                .with_source(CoordinateSource::Special(SpecialSequence::GpmLayers)),
        );
        add_supplementary_attributes(&mut file);
        let hgt = file.cvar("hgt").unwrap();
        assert_eq!(hgt.units().as_deref(), Some("km"));
        assert!(hgt.has_attribute("comment"));
        let nlayer = file.cvar("nlayer").unwrap();
        assert_eq!(nlayer.string_attribute("positive").as_deref(), Some("up"));
        assert!(!nlayer.has_attribute("comment"));
    }

    #[test]
    fn supplement_aquarius() {
        let mut config = Config::default();
        config.set_add_supplementary_attributes(false);
        let mut file = File::new(config);
        file.producer = Producer::AquariusL3;
        file.root_attributes
            .push(Attribute::new_string("Parameter", "SSS"));
        file.root_attributes.push(Attribute::from_raw(RawAttribute::float32(
            "Data Minimum",
            &[30.5],
        )));
        let mut data = Var::new("/l3m_data", Datatype::Float32);
        data.attributes.push(Attribute::new_string("units", "psu"));
        file.vars.insert(data);
        add_supplementary_attributes(&mut file);

        let data = file.var("/l3m_data").unwrap();
        assert_eq!(data.string_attribute("long_name").as_deref(), Some("SSS"));
        assert_eq!(data.units().as_deref(), Some("psu"));
        assert_eq!(
            data.attribute("valid_min").and_then(Attribute::as_f64s),
            Some(vec![30.5])
        );
        assert!(!data.has_attribute("valid_max"));
        assert_eq!(
            data.attribute(FILL_VALUE).and_then(Attribute::as_f64s),
            Some(vec![-32767.0])
        );
    }

    #[test]
    fn supplement_seawifs_fill_value() {
        let mut config = Config::default();
        config.set_add_supplementary_attributes(false);
        let mut file = File::new(config);
        file.producer = Producer::SeaWifsL3;
        file.vars.insert(Var::new("/aerosol", Datatype::Float32));
        let mut ranged = Var::new("/angstrom", Datatype::Float32);
        ranged
            .attributes
            .push(Attribute::new_float32("valid_range", &[0.0, 2.0]));
        file.vars.insert(ranged);
        file.vars.insert(Var::new("/count", Datatype::Int16));
        add_supplementary_attributes(&mut file);

        assert_eq!(
            file.var("/aerosol")
                .and_then(|var| var.attribute(FILL_VALUE))
                .and_then(Attribute::as_f64s),
            Some(vec![-999.0])
        );
        assert!(!file.var("/angstrom").unwrap().has_attribute(FILL_VALUE));
        assert!(!file.var("/count").unwrap().has_attribute(FILL_VALUE));
    }
}
