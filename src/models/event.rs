use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery mode of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "event_mode", rename_all = "lowercase")]
pub enum EventMode {
    Online,
    Offline,
    Hybrid,
}

impl EventMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// A persisted event. The slug is unique (enforced by the datastore) and is
/// always stored lowercase and trimmed; lookups normalize the same way.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub overview: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub venue: String,
    pub mode: EventMode,
    pub audience: String,
    pub organizer: String,
    pub agenda: Vec<String>,
    pub tags: Vec<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

/// A fully validated event ready to be inserted. The image field already
/// holds the durable URL returned by the asset host, never raw bytes.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub overview: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub venue: String,
    pub mode: EventMode,
    pub audience: String,
    pub organizer: String,
    pub agenda: Vec<String>,
    pub tags: Vec<String>,
    pub image: String,
}

/// Derives the lookup slug from a title: lowercase, trimmed, with runs of
/// non-alphanumeric characters collapsed to single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}
