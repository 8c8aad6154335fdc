use indexmap::IndexSet;

/// Ids of the groups whose children are currently rendered as a sub-field,
/// in the order they were expanded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    ids: IndexSet<String>,
}

impl ExpansionSet {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Flips membership of `id` and reports whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.shift_remove(id) {
            false
        } else {
            self.ids.insert(id.to_owned());
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExpansionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership_and_keeps_order() {
        let mut set = ExpansionSet::new();
        assert!(set.toggle("lib"));
        assert!(set.toggle("app"));
        assert!(set.toggle("tools"));
        assert!(!set.toggle("app"));

        assert_eq!(set.iter().collect::<Vec<_>>(), ["lib", "tools"]);
        assert!(!set.contains("app"));
        assert_eq!(set.len(), 2);
    }
}
