//! Faction control derived from map items.

use crate::api::MapData;

use serde::Serialize;

/// Number of map items owned by each faction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StructureCounts {
    pub wardens: usize,
    pub colonials: usize,
}

/// Which faction holds the majority of items on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FactionControl {
    Wardens,
    Colonials,
    Contested,
}

impl StructureCounts {
    pub fn control(&self) -> FactionControl {
        use std::cmp::Ordering;

        match self.wardens.cmp(&self.colonials) {
            Ordering::Greater => FactionControl::Wardens,
            Ordering::Less => FactionControl::Colonials,
            Ordering::Equal => FactionControl::Contested,
        }
    }
}

/// Count items per faction; neutral items are ignored.
pub fn count_structures(data: &MapData) -> StructureCounts {
    data.map_items
        .iter()
        .fold(StructureCounts::default(), |mut counts, item| {
            match item.team_id.as_str() {
                "WARDENS" => counts.wardens += 1,
                "COLONIALS" => counts.colonials += 1,
                _ => {}
            }
            counts
        })
}
