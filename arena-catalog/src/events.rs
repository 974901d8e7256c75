use serde::{Deserialize, Serialize};

/// One of the fixed live events tickets are sold for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEvent {
    /// Slug used as `eventId`, e.g. `15-feb-2026`.
    pub id: String,
    pub name: String,
    pub date: String,
    pub venue: String,
}

impl LiveEvent {
    /// Placeholder used when a confirmed payment refers to an event that is
    /// no longer configured.
    pub fn unlisted(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            date: String::new(),
            venue: String::new(),
        }
    }
}
