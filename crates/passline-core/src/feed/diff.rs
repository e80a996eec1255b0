use std::collections::{HashMap, HashSet};

use passline_api::{ChangeKind, RawDocument};

use super::ChangeRecord;

/// Synthesize change records between two full result sets.
///
/// Added and modified records follow the order of `current`; removals
/// follow at the end in the order of `previous`.
pub fn diff_documents(previous: &[RawDocument], current: &[RawDocument]) -> Vec<ChangeRecord> {
    let before: HashMap<&str, &RawDocument> = previous.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut seen = HashSet::with_capacity(current.len());
    let mut changes = Vec::new();

    for doc in current {
        seen.insert(doc.id.as_str());
        match before.get(doc.id.as_str()) {
            None => changes.push(ChangeRecord::new(doc.id.as_str(), ChangeKind::Added)),
            Some(old) if old.fields != doc.fields => {
                changes.push(ChangeRecord::new(doc.id.as_str(), ChangeKind::Modified));
            }
            Some(_) => {}
        }
    }

    for doc in previous {
        if !seen.contains(doc.id.as_str()) {
            changes.push(ChangeRecord::new(doc.id.as_str(), ChangeKind::Removed));
        }
    }

    changes
}
