//! Criticality parameter (`k`) per benchmark instance.

use std::collections::BTreeMap;

/// `k` used for instances the catalog does not know.
pub const DEFAULT_K: u32 = 0;

const BUILTIN: &[(&str, u32)] = &[
    ("1-Insertions_4.col", 5),
    ("2-Insertions_3.col", 4),
    ("2-Insertions_4.col", 5),
    ("3-Insertions_3.col", 4),
    ("3-Insertions_4.col", 5),
    ("4-Insertions_3.col", 4),
    ("mug100_1.col", 4),
    ("mug100_25.col", 4),
    ("mug88_1.col", 4),
    ("mug88_25.col", 4),
    ("myciel2.col", 3),
    ("myciel3.col", 4),
    ("myciel4.col", 5),
    ("myciel5.col", 6),
    ("myciel6.col", 7),
    ("queen10_10.col", 11),
    ("DSJC125.5.col", 14),
    ("DSJC250.5.col", 14),
    ("DSJR500.1.col", 6),
    ("DSJR500.1c.col", 80),
    ("DSJR500.5.col", 90),
    ("1-FullIns_3.col", 4),
    ("1-FullIns_4.col", 5),
    ("1-FullIns_5.col", 6),
    ("2-FullIns_3.col", 5),
    ("2-FullIns_4.col", 6),
    ("2-FullIns_5.col", 7),
    ("3-FullIns_3.col", 6),
    ("3-FullIns_4.col", 7),
    ("3-FullIns_5.col", 8),
    ("4-FullIns_3.col", 7),
    ("4-FullIns_4.col", 8),
    ("4-FullIns_5.col", 7),
    ("5-FullIns_3.col", 8),
    ("5-FullIns_4.col", 9),
    ("1-Insertions_5.col", 6),
    ("1-Insertions_6.col", 7),
    ("2-Insertions_5.col", 6),
    ("3-Insertions_5.col", 6),
    ("4-Insertions_4.col", 5),
    ("ash331GPIA.col", 4),
    ("ash608GPIA.col", 4),
    ("ash958GPIA.col", 4),
    ("flat1000_50_0.col", 50),
    ("flat1000_60_0.col", 60),
    ("flat1000_76_0.col", 76),
    ("flat300_20_0.col", 20),
    ("flat300_26_0.col", 26),
    ("flat300_28_0.col", 28),
    ("myciel7.col", 8),
    ("queen6_6.col", 7),
    ("queen8_8.col", 9),
    ("queen9_9.col", 10),
    ("r1000.1c.col", 96),
    ("DSJC125.1.col", 5),
    ("DSJC125.9.col", 44),
    ("DSJC250.1.col", 6),
    ("DSJC250.9.col", 72),
    ("DSJC500.1.col", 9),
    ("DSJC500.5.col", 43),
    ("DSJC500.9.col", 123),
    ("DSJC1000.1.col", 9),
    ("DSJC1000.5.col", 73),
    ("DSJC1000.9.col", 216),
    ("C2000.5.col", 99),
    ("C4000.5.col", 107),
    ("will199GPIA.col", 7),
];

/// Name-keyed lookup of `k`. Lookups are exact string matches on the
/// instance file name, never positions in a directory listing.
#[derive(Debug, Clone, Default)]
pub struct InstanceCatalog {
    entries: BTreeMap<String, u32>,
}

impl InstanceCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(name, k)| (name.to_string(), *k))
                .collect(),
        }
    }

    /// Built-in table with `overrides` replacing or extending entries.
    pub fn with_overrides(overrides: &BTreeMap<String, u32>) -> Self {
        let mut catalog = Self::builtin();
        for (name, k) in overrides {
            catalog.entries.insert(name.clone(), *k);
        }
        catalog
    }

    pub fn k_for(&self, name: &str) -> u32 {
        self.entries.get(name).copied().unwrap_or(DEFAULT_K)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_resolves_known_instances() {
        let catalog = InstanceCatalog::builtin();
        assert!(BUILTIN
            .iter()
            .all(|(name, k)| catalog.contains(name) && catalog.k_for(name) == *k));
        assert_eq!(catalog.k_for("myciel3.col"), 4);
        assert_eq!(catalog.k_for("DSJC1000.9.col"), 216);
        assert_eq!(catalog.k_for("will199GPIA.col"), 7);
    }

    #[test]
    fn unknown_or_near_miss_names_fall_back_to_default() {
        let catalog = InstanceCatalog::builtin();
        assert_eq!(catalog.k_for("unknown.col"), DEFAULT_K);
        assert_eq!(catalog.k_for("myciel3"), DEFAULT_K);
        assert_eq!(catalog.k_for("MYCIEL3.COL"), DEFAULT_K);
        assert!(!catalog.contains("myciel3"));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert("myciel3.col".to_string(), 9);
        overrides.insert("custom.col".to_string(), 12);
        let catalog = InstanceCatalog::with_overrides(&overrides);
        assert_eq!(catalog.k_for("myciel3.col"), 9);
        assert_eq!(catalog.k_for("custom.col"), 12);
        assert_eq!(catalog.k_for("myciel4.col"), 5);
        assert!(catalog.contains("custom.col"));
    }
}
