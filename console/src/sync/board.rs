//! Status board reconciliation
//!
//! Both update sources end up here. Every update replaces whole records;
//! the last one applied wins regardless of which source it came from.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::models::event::ProgressEvent;
use crate::models::status::StatusRecord;

/// Poll response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusesResponse {
    #[serde(default)]
    pub statuses: HashMap<String, StatusRecord>,
}

/// An update from one of the two sources
#[derive(Debug, Clone)]
pub enum Update {
    /// A single event from the push channel
    Push(ProgressEvent),

    /// A full status map from the poller
    Poll(HashMap<String, StatusRecord>),
}

/// A record that changed and must be re-rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub target_id: String,
    pub record: StatusRecord,
}

#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    records: BTreeMap<String, StatusRecord>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target_id: &str) -> Option<&StatusRecord> {
        self.records.get(target_id)
    }

    pub fn records(&self) -> &BTreeMap<String, StatusRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply an update and return the rows it touched.
    ///
    /// Push events without a target id touch nothing. Poll responses only
    /// touch the ids they contain; targets missing from a response keep
    /// their last record.
    pub fn apply(&mut self, update: &Update) -> Vec<RowUpdate> {
        match update {
            Update::Push(event) => match event.target_id() {
                Some(target_id) => vec![self.replace(target_id, event.to_record())],
                None => Vec::new(),
            },
            Update::Poll(statuses) => {
                let mut ids: Vec<&String> = statuses.keys().collect();
                ids.sort();
                ids.into_iter()
                    .map(|id| self.replace(id, statuses[id].clone()))
                    .collect()
            }
        }
    }

    fn replace(&mut self, target_id: &str, record: StatusRecord) -> RowUpdate {
        self.records.insert(target_id.to_string(), record.clone());
        RowUpdate {
            target_id: target_id.to_string(),
            record,
        }
    }
}

/// Pure form of [`StatusBoard::apply`]
pub fn reconcile(mut board: StatusBoard, update: &Update) -> StatusBoard {
    board.apply(update);
    board
}
