//! The fixed landscape class taxonomy.
//!
//! Mask stacks are compared positionally, so the mapping from class name to
//! channel index is established once here and held invariant across stored
//! artifacts and live queries. The catch-all class soaks up every oracle
//! label no scored class claims; it is colorized but never scored.

use std::collections::{HashMap, HashSet};

/// One semantic region category: stable name, sketch palette color, and the
/// segmentation-model label names that map onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyClass {
    pub name: &'static str,
    pub display_color: [u8; 3],
    pub synonyms: &'static [&'static str],
}

pub const CATCH_ALL: &str = "INVALID_OTHER";

/// Taxonomy entries in channel order; the catch-all is last and unscored.
pub const CLASSES: &[TaxonomyClass] = &[
    TaxonomyClass { name: "SKY", display_color: [179, 229, 252], synonyms: &["sky"] },
    TaxonomyClass { name: "MOUNTAIN", display_color: [97, 115, 97], synonyms: &["mountain", "hill"] },
    TaxonomyClass { name: "WATER_BODY", display_color: [74, 163, 210], synonyms: &["water", "sea", "lake", "river"] },
    TaxonomyClass { name: "FOREST_TREES", display_color: [46, 139, 87], synonyms: &["tree", "trees", "plant", "bush"] },
    TaxonomyClass { name: "FLOWERS", display_color: [231, 154, 184], synonyms: &["flower", "flowers"] },
    TaxonomyClass { name: "BOULDERS_CLIFF", display_color: [164, 159, 154], synonyms: &["rock", "stone", "boulder", "cliff"] },
    TaxonomyClass { name: "PATH_ROAD", display_color: [191, 168, 147], synonyms: &["road", "path", "trail", "sidewalk"] },
    TaxonomyClass { name: "GRASS_FIELD", display_color: [122, 180, 96], synonyms: &["grass", "lawn", "field", "meadow"] },
    TaxonomyClass { name: "EARTH_LAND", display_color: [137, 115, 96], synonyms: &["earth", "land", "soil", "ground"] },
    TaxonomyClass { name: CATCH_ALL, display_color: [255, 0, 0], synonyms: &[] },
];

/// Ordered list of scored classes plus the name→index lookup built
/// alongside it.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    scored: Vec<TaxonomyClass>,
    index_by_name: HashMap<&'static str, usize>,
    catch_all_color: [u8; 3],
}

impl Taxonomy {
    /// The landscape taxonomy used across the whole pipeline.
    pub fn landscape() -> Self {
        let scored: Vec<TaxonomyClass> =
            CLASSES.iter().filter(|c| c.name != CATCH_ALL).copied().collect();
        let index_by_name = scored.iter().enumerate().map(|(i, c)| (c.name, i)).collect();
        let catch_all_color = CLASSES
            .iter()
            .find(|c| c.name == CATCH_ALL)
            .map(|c| c.display_color)
            .unwrap_or([255, 0, 0]);
        Self { scored, index_by_name, catch_all_color }
    }

    /// Scored classes in fixed channel order.
    pub fn scored(&self) -> &[TaxonomyClass] {
        &self.scored
    }

    /// Number of scored channels in every mask stack.
    pub fn num_channels(&self) -> usize {
        self.scored.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub fn catch_all_color(&self) -> [u8; 3] {
        self.catch_all_color
    }

    /// Resolve the oracle's `id -> label name` table into one label-id set
    /// per scored channel. A label maps to a class when any synonym occurs
    /// as a substring of the label name; unclaimed ids map to no channel.
    pub fn map_oracle_labels(&self, labels: &[(u32, String)]) -> Vec<HashSet<u32>> {
        self.scored
            .iter()
            .map(|class| {
                labels
                    .iter()
                    .filter(|(_, name)| class.synonyms.iter().any(|syn| name.contains(syn)))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .collect()
    }
}
