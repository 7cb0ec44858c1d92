//! Built-in producer signatures.

use crate::{
    model::{Attribute, File, Group, Producer},
    plugin::ProducerPlugin,
};

const GPM_FILE_HEADER: &str = "FileHeader";
const OZONE_PRODUCT_TYPES: [&str; 2] = ["L3 Monthly Zonal Means", "L3 Daily Zonal Means"];
const OZONE_PARAMETER: &str = "total ozone and profile ozone";
const PROJECT_ID: &str = "/Metadata/ProjectId";
const ACOS_OCO2_PROJECTS: [&str; 2] = ["ACOS", "OCO2"];

inventory::submit! {
    ProducerPlugin::new("gpm_l1", 100, is_gpm_l1, Producer::GpmL1)
}

inventory::submit! {
    ProducerPlugin::new("gpm_l3_single", 200, is_gpm_l3_single, Producer::GpmL3Single)
}

inventory::submit! {
    ProducerPlugin::new("gpm_l3_multi", 300, is_gpm_l3_multi, Producer::GpmL3Multi)
}

inventory::submit! {
    ProducerPlugin::new("seawifs_l2", 350, is_seawifs_l2, Producer::SeaWifsL2)
}

inventory::submit! {
    ProducerPlugin::new("seawifs_l3", 360, is_seawifs_l3, Producer::SeaWifsL3)
}

inventory::submit! {
    ProducerPlugin::new("aquarius_l3", 400, is_aquarius_l3, Producer::AquariusL3)
}

inventory::submit! {
    ProducerPlugin::new("obpg_l3", 500, is_obpg_l3, Producer::ObpgL3)
}

inventory::submit! {
    ProducerPlugin::new("measures_ozone", 600, is_measures_ozone, Producer::MeasuresOzone)
}

inventory::submit! {
    ProducerPlugin::new("smap", 700, is_smap, Producer::Smap)
}

inventory::submit! {
    ProducerPlugin::new("acos_oco2", 800, is_acos_oco2, Producer::AcosOco2)
}

fn has_attribute_containing(group: &Group, pattern: &str) -> bool {
    group
        .attributes()
        .iter()
        .any(|attribute| attribute.name().contains(pattern))
}

fn is_child_of(group: &Group, parent: &str) -> bool {
    group
        .path()
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|name| !name.is_empty() && !name.contains('/'))
}

/// A root `FileHeader` and a top-level group with a `SwathHeader` attribute.
fn is_gpm_l1(file: &File) -> bool {
    file.root_attribute(GPM_FILE_HEADER).is_some()
        && file
            .groups()
            .values()
            .any(|group| is_child_of(group, "") && has_attribute_containing(group, "SwathHeader"))
}

/// A root `FileHeader` and a `Grid` (or `GRID`) group with a `GridHeader` attribute.
fn is_gpm_l3_single(file: &File) -> bool {
    file.root_attribute(GPM_FILE_HEADER).is_some()
        && file.groups().values().any(|group| {
            matches!(group.path(), "/Grid" | "/GRID") && group.attribute("GridHeader").is_some()
        })
}

/// A root `FileHeader` and a `Grids` group with a subgroup having a `GridHeader` attribute.
fn is_gpm_l3_multi(file: &File) -> bool {
    file.root_attribute(GPM_FILE_HEADER).is_some()
        && file.groups().values().any(|group| {
            is_child_of(group, "/Grids") && has_attribute_containing(group, "GridHeader")
        })
}

/// `Sensor` (or `instrument`) is `Aquarius` and `Title` (or `title`) mentions `Level-3`.
fn is_aquarius_l3(file: &File) -> bool {
    [("Sensor", "Title"), ("instrument", "title")]
        .iter()
        .any(|(sensor, title)| {
            file.root_string_attribute(sensor).as_deref() == Some("Aquarius")
                && file
                    .root_string_attribute(title)
                    .is_some_and(|title| title.contains("Level-3"))
        })
}

/// `processing_level` is `L3 Mapped` and `cdm_data_type` is `grid`.
fn is_obpg_l3(file: &File) -> bool {
    file.root_string_attribute("processing_level").as_deref() == Some("L3 Mapped")
        && file.root_string_attribute("cdm_data_type").as_deref() == Some("grid")
}

/// A SeaWiFS `instrument_short_name` and a `long_name` (or `short_name`) naming the processing level.
fn is_seawifs_level(file: &File, level: char) -> bool {
    if file.root_string_attribute("instrument_short_name").as_deref() != Some("SeaWiFS") {
        return false;
    }
    let long_name = file.root_string_attribute("long_name").is_some_and(|long_name| {
        long_name.starts_with("SeaWiFS") && long_name.contains(&format!("Level {level}"))
    });
    long_name
        || file
            .root_string_attribute("short_name")
            .is_some_and(|short_name| short_name.starts_with(&format!("SWDB_L{level}")))
}

fn is_seawifs_l2(file: &File) -> bool {
    is_seawifs_level(file, '2')
}

fn is_seawifs_l3(file: &File) -> bool {
    is_seawifs_level(file, '3')
}

/// A zonal mean `ProductType` of total and profile ozone.
fn is_measures_ozone(file: &File) -> bool {
    file.root_string_attribute("ProductType")
        .is_some_and(|product| OZONE_PRODUCT_TYPES.contains(&product.as_str()))
        && file.root_string_attribute("ParameterName").as_deref() == Some(OZONE_PARAMETER)
}

/// A `Metadata` group whose `ProjectID` is `SMAP`.
fn is_smap(file: &File) -> bool {
    file.groups().values().any(|group| {
        group.path() == "/Metadata"
            && group
                .attribute("ProjectID")
                .and_then(Attribute::as_string)
                .is_some_and(|project| project.trim_end_matches('\0').trim() == "SMAP")
    })
}

/// A `/Metadata/ProjectId` string dataset naming ACOS or OCO-2.
fn is_acos_oco2(file: &File) -> bool {
    file.var(PROJECT_ID)
        .and_then(|var| var.string_value())
        .map(|project| project.trim_end_matches('\0').trim())
        .is_some_and(|project| ACOS_OCO2_PROJECTS.contains(&project))
}
