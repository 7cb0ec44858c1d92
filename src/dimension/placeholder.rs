use std::collections::{BTreeMap, BTreeSet};

use crate::{
    model::{Dimension, DimensionTable, File},
    normalize::NormalizeError,
};

const PLACEHOLDER_PREFIX: &str = "FakeDim";

/// Allocates placeholder dimension names `FakeDim0`, `FakeDim1`, ...
///
/// One name is shared by all axes of the same size across variables.
/// Within one variable, the n-th axis of a repeated size takes the n-th name recorded for that size,
/// so two axes of one variable never share a name.
#[derive(Debug, Default)]
pub(crate) struct PlaceholderNames {
    next: usize,
    by_size: BTreeMap<u64, Vec<String>>,
    allocated: BTreeSet<String>,
}

impl PlaceholderNames {
    fn fresh(&mut self, table: &DimensionTable) -> String {
        loop {
            let name = format!("{PLACEHOLDER_PREFIX}{}", self.next);
            self.next += 1;
            if !table.contains(&name) && !self.allocated.contains(&name) {
                self.allocated.insert(name.clone());
                return name;
            }
        }
    }

    /// Name the unnamed axes of one variable.
    pub(crate) fn name_axes(
        &mut self,
        dimensions: &mut [Dimension],
        table: &mut DimensionTable,
    ) -> Result<(), NormalizeError> {
        let mut occurrences: BTreeMap<u64, usize> = BTreeMap::new();
        for dimension in dimensions.iter_mut().filter(|dimension| dimension.name.is_empty()) {
            let occurrence = occurrences.entry(dimension.size).or_default();
            let index = *occurrence;
            *occurrence += 1;
            while self.by_size.get(&dimension.size).map_or(0, Vec::len) <= index {
                let name = self.fresh(table);
                self.by_size.entry(dimension.size).or_default().push(name);
            }
            let name = &self.by_size[&dimension.size][index];
            table.insert(name, dimension.size, dimension.unlimited)?;
            dimension.set_name(name);
        }
        Ok(())
    }

    /// Name the unnamed axes of every variable.
    pub(crate) fn name_all(&mut self, file: &mut File) -> Result<(), NormalizeError> {
        for var in file.vars.values_mut() {
            self.name_axes(&mut var.dimensions, &mut file.dimensions)?;
        }
        Ok(())
    }

    /// Renumber the placeholder names still used by a variable contiguously, in ascending numeric order.
    ///
    /// The placeholder entries of the dimension table are rebuilt.
    pub(crate) fn compact(&mut self, file: &mut File) -> Result<(), NormalizeError> {
        let mut used: Vec<(usize, String)> = file
            .vars
            .values()
            .flat_map(|var| var.dimensions.iter())
            .filter(|dimension| self.allocated.contains(&dimension.name))
            .filter_map(|dimension| {
                let index = dimension.name.strip_prefix(PLACEHOLDER_PREFIX)?.parse().ok()?;
                Some((index, dimension.name.clone()))
            })
            .collect();
        used.sort_unstable();
        used.dedup();

        for name in &self.allocated {
            file.dimensions.remove(name);
        }
        let renames: BTreeMap<String, String> = used
            .into_iter()
            .enumerate()
            .map(|(index, (_, name))| (name, format!("{PLACEHOLDER_PREFIX}{index}")))
            .collect();
        for var in file.vars.values_mut() {
            for dimension in &mut var.dimensions {
                if let Some(name) = renames.get(&dimension.name) {
                    dimension.set_name(name);
                    file.dimensions
                        .insert(name, dimension.size, dimension.unlimited)?;
                }
            }
        }
        if renames.iter().any(|(old, new)| old != new) {
            tracing::debug!(count = renames.len(), "compacted placeholder dimension names");
        }
        self.allocated = renames.into_values().collect();
        self.by_size.clear();
        self.next = self.allocated.len();
        Ok(())
    }
}
