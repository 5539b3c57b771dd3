//! Topological ordering of plugin descriptors by declared dependency
//! (§3 "DepList entry", §4.8 "`__sort`").

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};

// Layer 3: Internal module imports
use super::error::PluginError;

/// `(name, required-names)` entries to be sorted so that every name
/// appears after everything it requires.
#[derive(Debug, Default)]
pub struct DepList {
    entries: Vec<(String, Vec<String>)>,
}

impl DepList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, requires: Vec<String>) {
        self.entries.push((name.into(), requires));
    }

    /// Depth-first topological sort. A dependency cycle (including one
    /// requiring a name never added) is a fatal config error (§9 "cyclic
    /// `extends`/`requires` is a fatal config error").
    pub fn sort(self) -> Result<Vec<String>, PluginError> {
        let index: HashMap<&str, &Vec<String>> =
            self.entries.iter().map(|(name, reqs)| (name.as_str(), reqs)).collect();

        let mut ordered = Vec::with_capacity(self.entries.len());
        let mut done: HashSet<String> = HashSet::new();
        let mut visiting: HashSet<String> = HashSet::new();

        fn visit(
            name: &str,
            index: &HashMap<&str, &Vec<String>>,
            done: &mut HashSet<String>,
            visiting: &mut HashSet<String>,
            ordered: &mut Vec<String>,
        ) -> Result<(), PluginError> {
            if done.contains(name) {
                return Ok(());
            }
            if !visiting.insert(name.to_string()) {
                return Err(PluginError::DependencyCycle(vec![name.to_string()]));
            }
            if let Some(requires) = index.get(name) {
                for dep in requires.iter() {
                    visit(dep, index, done, visiting, ordered).map_err(|err| match err {
                        PluginError::DependencyCycle(mut chain) => {
                            chain.push(name.to_string());
                            PluginError::DependencyCycle(chain)
                        }
                        other => other,
                    })?;
                }
            }
            visiting.remove(name);
            done.insert(name.to_string());
            ordered.push(name.to_string());
            Ok(())
        }

        for (name, _) in &self.entries {
            visit(name, &index, &mut done, &mut visiting, &mut ordered)?;
        }
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_entries_preserve_insertion_order() {
        let mut dl = DepList::new();
        dl.add("a", vec![]);
        dl.add("b", vec![]);
        assert_eq!(dl.sort().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn dependency_is_ordered_before_dependent() {
        let mut dl = DepList::new();
        dl.add("b", vec!["a".to_string()]);
        dl.add("a", vec![]);
        assert_eq!(dl.sort().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn cycle_is_rejected() {
        let mut dl = DepList::new();
        dl.add("a", vec!["b".to_string()]);
        dl.add("b", vec!["a".to_string()]);
        assert!(matches!(dl.sort(), Err(PluginError::DependencyCycle(_))));
    }

    #[test]
    fn requiring_an_unknown_name_is_tolerated_as_a_leaf() {
        let mut dl = DepList::new();
        dl.add("a", vec!["ghost".to_string()]);
        let sorted = dl.sort().unwrap();
        assert!(sorted.contains(&"a".to_string()));
        assert!(sorted.contains(&"ghost".to_string()));
    }
}
