//! Packet identifier ↔ display name mapping.
//!
//! Built once per connect from the packet catalog. Display names are
//! normalized: a leading pointer/reference marker and any path prefix up to
//! the last `.` or `::` are stripped, so `*packet.Text` and
//! `protocol::packet::Text` both become `Text`.

use crate::ports::outbound::PacketEntry;
use serde::Serialize;
use std::collections::HashMap;

/// Bidirectional packet mapping. Last writer wins on a name collision.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PacketMapping {
    name_to_id: HashMap<String, u32>,
    id_to_name: HashMap<u32, String>,
}

impl PacketMapping {
    /// Build the mapping, skipping entries without a usable name.
    pub fn from_catalog<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PacketEntry>,
    {
        let mut mapping = Self::default();
        for entry in entries {
            let Some(name) = entry.name.as_deref().and_then(display_name) else {
                continue;
            };
            mapping.name_to_id.insert(name.to_string(), entry.id);
            mapping.id_to_name.insert(entry.id, name.to_string());
        }
        mapping
    }

    /// Identifier for a display name.
    pub fn id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    /// Display name for an identifier.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// Display name → identifier table.
    pub fn name_to_id(&self) -> &HashMap<String, u32> {
        &self.name_to_id
    }

    /// Identifier → display name table.
    pub fn id_to_name(&self) -> &HashMap<u32, String> {
        &self.id_to_name
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

/// Canonical short name for a raw catalog name. `None` if nothing is left.
pub fn display_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim().trim_start_matches(['*', '&']);

    let cut = [trimmed.rfind("::").map(|i| i + 2), trimmed.rfind('.').map(|i| i + 1)]
        .into_iter()
        .flatten()
        .max();

    let short = match cut {
        // A trailing separator leaves nothing to keep; fall back to the whole.
        Some(start) if start < trimmed.len() => &trimmed[start..],
        _ => trimmed,
    };

    (!short.is_empty()).then_some(short)
}
