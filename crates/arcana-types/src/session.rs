//! Session and reading types for Arcana.
//!
//! A `Session` is the mutable draft of a tarot reading in progress. Once the
//! user confirms completion it is converted into an immutable `Reading` and
//! no further writes are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a reading session.
///
/// A session transitions Draft -> Completed exactly once and is immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Draft,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Draft => write!(f, "draft"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(SessionStatus::Draft),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Draft
    }
}

/// Layout of the cards in a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpreadType {
    SingleCard,
    ThreeCard,
    CelticCross,
    Horseshoe,
}

impl SpreadType {
    /// Number of card positions this spread holds.
    pub fn positions(&self) -> u8 {
        match self {
            SpreadType::SingleCard => 1,
            SpreadType::ThreeCard => 3,
            SpreadType::CelticCross => 10,
            SpreadType::Horseshoe => 7,
        }
    }
}

impl fmt::Display for SpreadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadType::SingleCard => write!(f, "single-card"),
            SpreadType::ThreeCard => write!(f, "three-card"),
            SpreadType::CelticCross => write!(f, "celtic-cross"),
            SpreadType::Horseshoe => write!(f, "horseshoe"),
        }
    }
}

impl FromStr for SpreadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single-card" => Ok(SpreadType::SingleCard),
            "three-card" => Ok(SpreadType::ThreeCard),
            "celtic-cross" => Ok(SpreadType::CelticCross),
            "horseshoe" => Ok(SpreadType::Horseshoe),
            other => Err(format!("invalid spread type: '{other}'")),
        }
    }
}

/// Whether a card was drawn upright or reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardOrientation {
    Upright,
    Reversed,
}

impl fmt::Display for CardOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardOrientation::Upright => write!(f, "upright"),
            CardOrientation::Reversed => write!(f, "reversed"),
        }
    }
}

/// A single card drawn into a spread position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    /// Card identifier (e.g., "the-tower", "three-of-cups").
    pub card_id: String,
    /// Position index within the spread (0-based).
    pub position: u8,
    pub orientation: CardOrientation,
}

/// A mutable draft of a tarot reading in progress.
///
/// `updated_at` is owned by the server: it is set on every successful write
/// and is monotonically non-decreasing. The client never fabricates it --
/// it is only ever adopted from a server response and echoed back as
/// `expected_updated_at` for optimistic-concurrency checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub question: Option<String>,
    pub spread: Option<SpreadType>,
    /// Drawn cards in draw order. Never reordered by auto-save; only an
    /// explicit user action replaces this sequence.
    pub cards: Vec<DrawnCard>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub status: SessionStatus,
}

/// A finalized, immutable reading produced from a completed session.
///
/// Carries its own identifier, distinct from the originating session's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    /// The session this reading was finalized from.
    pub session_id: Uuid,
    pub question: Option<String>,
    pub spread: SpreadType,
    pub cards: Vec<DrawnCard>,
    pub notes: Option<String>,
    /// Free-form interpretation text supplied at completion.
    pub interpretation: Option<String>,
    pub completed_at: DateTime<Utc>,
}
