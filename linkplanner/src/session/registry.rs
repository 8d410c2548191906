//! Transmitter coverage registry.

use std::collections::BTreeSet;

use crate::coverage::{union, CoverageSet};

/// Coverage sets keyed by transmitter, in the order first supplied.
#[derive(Debug, Clone, Default)]
pub(crate) struct CoverageRegistry {
    entries: Vec<(String, CoverageSet)>,
    selected: BTreeSet<String>,
}

impl CoverageRegistry {
    /// Replaces a transmitter's set. A known transmitter keeps its position.
    pub(crate) fn set(&mut self, transmitter: &str, set: CoverageSet) {
        match self.entries.iter_mut().find(|(id, _)| id == transmitter) {
            Some((_, existing)) => *existing = set,
            None => self.entries.push((transmitter.to_string(), set)),
        }
    }

    pub(crate) fn remove(&mut self, transmitter: &str) -> bool {
        self.selected.remove(transmitter);
        let before = self.entries.len();
        self.entries.retain(|(id, _)| id != transmitter);
        self.entries.len() != before
    }

    pub(crate) fn select<I, S>(&mut self, transmitters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = transmitters.into_iter().map(Into::into).collect();
    }

    pub(crate) fn get(&self, transmitter: &str) -> Option<&CoverageSet> {
        self.entries
            .iter()
            .find(|(id, _)| id == transmitter)
            .map(|(_, set)| set)
    }

    pub(crate) fn transmitters(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Union of the selected transmitters, or of all when none is selected.
    pub(crate) fn view(&self) -> CoverageSet {
        let all = self.selected.is_empty();
        union(
            self.entries
                .iter()
                .filter(|(id, _)| all || self.selected.contains(id))
                .map(|(_, set)| set),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{BuildingKey, CoverageStatus};

    fn set_of(id: u64, status: CoverageStatus) -> CoverageSet {
        let mut set = CoverageSet::new();
        set.insert(Some(id), None, status);
        set
    }

    #[test]
    fn test_view_without_selection_uses_all() {
        let mut registry = CoverageRegistry::default();
        registry.set("a", set_of(1, CoverageStatus::Unserviceable));
        registry.set("b", set_of(1, CoverageStatus::Serviceable));
        assert_eq!(registry.view().status(&BuildingKey::Id(1)), CoverageStatus::Serviceable);
    }

    #[test]
    fn test_view_respects_selection() {
        let mut registry = CoverageRegistry::default();
        registry.set("a", set_of(1, CoverageStatus::Unserviceable));
        registry.set("b", set_of(1, CoverageStatus::Serviceable));
        registry.select(["a"]);
        assert_eq!(
            registry.view().status(&BuildingKey::Id(1)),
            CoverageStatus::Unserviceable
        );
    }

    #[test]
    fn test_replace_keeps_supply_order() {
        let mut registry = CoverageRegistry::default();
        registry.set("a", CoverageSet::new());
        registry.set("b", CoverageSet::new());
        registry.set("a", set_of(3, CoverageStatus::Serviceable));
        assert_eq!(registry.transmitters().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").map(CoverageSet::len), Some(1));
    }

    #[test]
    fn test_remove_drops_selection_too() {
        let mut registry = CoverageRegistry::default();
        registry.set("a", set_of(1, CoverageStatus::Serviceable));
        registry.set("b", set_of(2, CoverageStatus::Serviceable));
        registry.select(["a"]);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        // No selection left: all remaining transmitters count.
        assert_eq!(registry.view().len(), 1);
        assert!(registry.view().includes(&BuildingKey::Id(2)));
    }
}
