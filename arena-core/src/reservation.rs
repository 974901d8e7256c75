use arena_shared::pii::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Which collection a sellable position lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Suite,
    Table,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Suite => "suite",
            ItemKind::Table => "table",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suite" => Ok(ItemKind::Suite),
            "table" | "mesa" => Ok(ItemKind::Table),
            other => Err(CoreError::ValidationError(format!("unknown item kind '{}'", other))),
        }
    }
}

/// Natural key of a claim. `kind` selects the collection; uniqueness is
/// (item_id, event_id, category) within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationKey {
    pub kind: ItemKind,
    pub item_id: String,
    pub event_id: String,
    pub category: String,
}

impl ReservationKey {
    pub fn new(kind: ItemKind, item_id: impl Into<String>, event_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind,
            item_id: item_id.into(),
            event_id: event_id.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for ReservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} [{}] @ {}", self.kind, self.item_id, self.category, self.event_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Available,
    Claimed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Available => "AVAILABLE",
            ReservationStatus::Claimed => "CLAIMED",
        }
    }
}

/// A persisted claim. Rows only exist once claimed; `Available` is the
/// absence of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub key: ReservationKey,
    pub status: ReservationStatus,
    pub claimed_at: Option<DateTime<Utc>>,
    pub buyer_email: Option<Masked<String>>,
    /// Hosted checkout session that paid for the claim.
    pub payment_reference: Option<String>,
}

/// Who is claiming. Both fields come from the payment notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claimant {
    pub buyer_email: Option<Masked<String>>,
    pub payment_reference: Option<String>,
}

impl Claimant {
    pub fn new(buyer_email: Option<String>, payment_reference: Option<String>) -> Self {
        Self {
            buyer_email: buyer_email.map(Masked),
            payment_reference,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// This call created the claim.
    Claimed(ReservationRecord),
    /// A claim already existed; carries the stored record unchanged.
    AlreadyClaimed(ReservationRecord),
}

impl ClaimOutcome {
    pub fn record(&self) -> &ReservationRecord {
        match self {
            ClaimOutcome::Claimed(r) | ClaimOutcome::AlreadyClaimed(r) => r,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimedItem {
    pub kind: ItemKind,
    pub item_id: String,
    pub category: String,
}
