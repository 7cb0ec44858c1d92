use std::collections::HashSet;

/// A set of names claimed within one naming scope.
///
/// The first occurrence of a name keeps it.
/// A later occurrence becomes `name_k`, with `k` the smallest positive integer giving an unclaimed name.
#[derive(Debug, Default)]
pub(crate) struct NameScope {
    claimed: HashSet<String>,
}

impl NameScope {
    /// Claim `names`, renaming the ones that clash with a name already claimed.
    ///
    /// Every unique name of the batch is claimed before clashing names are renamed, so a renamed name never takes a name that appears later in the batch.
    pub(crate) fn claim_all<'a>(&mut self, names: impl IntoIterator<Item = &'a mut String>) {
        let mut clashing = Vec::new();
        for name in names {
            if !self.claimed.insert(name.clone()) {
                clashing.push(name);
            }
        }
        for name in clashing {
            let renamed = self.unique(name);
            tracing::trace!(name = %name, renamed = %renamed, "resolve name clash");
            *name = renamed;
        }
    }

    /// Claim a single `name`, renaming it if it clashes.
    pub(crate) fn claim(&mut self, name: &mut String) {
        self.claim_all(std::iter::once(name));
    }

    fn unique(&mut self, name: &str) -> String {
        let mut index = 1u64;
        loop {
            let candidate = format!("{name}_{index}");
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(ToString::to_string).collect();
        NameScope::default().claim_all(names.iter_mut());
        names
    }

    #[test]
    fn clash_first_occurrence_wins() {
        assert_eq!(resolve(&["a", "b", "a", "a"]), vec!["a", "b", "a_1", "a_2"]);
    }

    #[test]
    fn clash_skips_names_claimed_later_in_batch() {
        assert_eq!(resolve(&["a", "a", "a_1"]), vec!["a", "a_2", "a_1"]);
    }

    #[test]
    fn clash_free_is_unchanged() {
        let names = resolve(&["x", "y_1", "z"]);
        assert_eq!(names, vec!["x", "y_1", "z"]);
        assert_eq!(resolve(&names.iter().map(String::as_str).collect::<Vec<_>>()), names);
    }

    #[test]
    fn clash_across_batches() {
        let mut scope = NameScope::default();
        let mut cvars = vec!["lat".to_string()];
        let mut vars = vec!["lat".to_string(), "t".to_string()];
        scope.claim_all(cvars.iter_mut());
        scope.claim_all(vars.iter_mut());
        let mut table = "t".to_string();
        scope.claim(&mut table);
        assert_eq!(cvars, vec!["lat"]);
        assert_eq!(vars, vec!["lat_1", "t"]);
        assert_eq!(table, "t_1");
    }
}
