use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::studio::payload::ImagePayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub uri: String,
    #[serde(skip)]
    pub payload: ImagePayload,
    pub created_at: DateTime<Utc>,
}

/// Successful composite results for the life of the process, newest first.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    next_id: u64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, payload: ImagePayload) -> &HistoryEntry {
        self.next_id += 1;
        let entry = HistoryEntry {
            id: self.next_id,
            uri: payload.to_data_uri(),
            payload,
            created_at: Utc::now(),
        };
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `prefix-YYYYMMDD_HHMMSS.png`, stamped with the caller's local time.
pub fn download_filename(prefix: &str, at: &NaiveDateTime) -> String {
    format!("{}-{}.png", prefix, at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(data: &str) -> ImagePayload {
        ImagePayload::new(data, "image/png").unwrap()
    }

    #[test]
    fn newest_entry_comes_first() {
        let mut history = History::new();
        for data in ["R1", "R2", "R3"] {
            history.push(payload(data));
        }

        let order: Vec<&str> = history
            .entries()
            .iter()
            .map(|entry| entry.payload.data())
            .collect();
        assert_eq!(order, vec!["R3", "R2", "R1"]);
        assert_eq!(history.latest().map(|entry| entry.id), Some(3));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn entries_are_addressable_by_id() {
        let mut history = History::new();
        let first_id = history.push(payload("R1")).id;
        history.push(payload("R2"));

        let entry = history.get(first_id).unwrap();
        assert_eq!(entry.uri, "data:image/png;base64,R1");
        assert!(history.get(99).is_none());
    }

    #[test]
    fn download_filename_is_zero_padded() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap();
        assert_eq!(
            download_filename("outfit-creation", &at),
            "outfit-creation-20240307_090502.png"
        );
    }
}
