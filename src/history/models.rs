//! Snapshot types.

use crate::api::{view, WarReport};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// War reports collected in one poll tick, keyed by canonical map name.
///
/// Maps whose fetch failed during the tick are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    reports: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, map_name: impl Into<String>, report: Value) {
        self.reports.insert(map_name.into(), report);
    }

    /// Raw report payload for `map_name`.
    pub fn get(&self, map_name: &str) -> Option<&Value> {
        self.reports.get(map_name)
    }

    /// Typed report for `map_name`; `None` when absent, empty or malformed.
    pub fn war_report(&self, map_name: &str) -> Option<WarReport> {
        self.get(map_name).and_then(view)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            reports: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// On-disk layout: `{"reports": [snapshot, ...]}`, oldest first.
#[derive(Debug, Default, Deserialize)]
pub(super) struct HistoryDocument {
    #[serde(default)]
    pub reports: Vec<Snapshot>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryDocumentRef<'a, S: Serialize> {
    pub reports: &'a S,
}
