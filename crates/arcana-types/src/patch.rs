//! Partial session updates.
//!
//! `SessionPatch` carries the subset of session fields touched by a local
//! edit. Patches merge field-wise (later wins) so a burst of edits within
//! one debounce window collapses into a single cumulative payload.

use serde::{Deserialize, Serialize};

use crate::session::{DrawnCard, Session, SpreadType};

/// A partial update to a session's user-editable fields.
///
/// `None` means "field untouched". Note that `question` and `notes` use a
/// nested Option so a patch can distinguish "leave as is" (`None`) from
/// "clear the field" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<SpreadType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<DrawnCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl SessionPatch {
    /// A patch that sets the question text.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            question: Some(Some(text.into())),
            ..Self::default()
        }
    }

    /// A patch that selects the spread type.
    pub fn spread(spread: SpreadType) -> Self {
        Self {
            spread: Some(spread),
            ..Self::default()
        }
    }

    /// A patch that replaces the drawn card sequence.
    pub fn cards(cards: Vec<DrawnCard>) -> Self {
        Self {
            cards: Some(cards),
            ..Self::default()
        }
    }

    /// A patch that sets the notes text.
    pub fn notes(text: impl Into<String>) -> Self {
        Self {
            notes: Some(Some(text.into())),
            ..Self::default()
        }
    }

    /// Whether this patch touches no fields at all.
    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.spread.is_none()
            && self.cards.is_none()
            && self.notes.is_none()
    }

    /// Merge `later` into this patch, field-wise. Fields set in `later`
    /// overwrite fields set here; untouched fields are preserved.
    pub fn merge(&mut self, later: SessionPatch) {
        if later.question.is_some() {
            self.question = later.question;
        }
        if later.spread.is_some() {
            self.spread = later.spread;
        }
        if later.cards.is_some() {
            self.cards = later.cards;
        }
        if later.notes.is_some() {
            self.notes = later.notes;
        }
    }

    /// Apply this patch to a session in place.
    ///
    /// Does not touch `updated_at` or `status` -- those are server-owned.
    pub fn apply_to(&self, session: &mut Session) {
        if let Some(question) = &self.question {
            session.question = question.clone();
        }
        if let Some(spread) = self.spread {
            session.spread = Some(spread);
        }
        if let Some(cards) = &self.cards {
            session.cards = cards.clone();
        }
        if let Some(notes) = &self.notes {
            session.notes = notes.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CardOrientation, SessionStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn test_session() -> Session {
        Session {
            id: Uuid::now_v7(),
            question: None,
            spread: None,
            cards: Vec::new(),
            notes: None,
            updated_at: Utc::now(),
            status: SessionStatus::Draft,
        }
    }

    fn card(id: &str, position: u8) -> DrawnCard {
        DrawnCard {
            card_id: id.to_string(),
            position,
            orientation: CardOrientation::Upright,
        }
    }

    #[test]
    fn test_empty_patch() {
        assert!(SessionPatch::default().is_empty());
        assert!(!SessionPatch::question("hm").is_empty());
    }

    #[test]
    fn test_merge_later_wins() {
        let mut patch = SessionPatch::question("first draft");
        patch.merge(SessionPatch::question("final question"));
        assert_eq!(
            patch.question,
            Some(Some("final question".to_string()))
        );
    }

    #[test]
    fn test_merge_preserves_untouched_fields() {
        let mut patch = SessionPatch::spread(SpreadType::ThreeCard);
        patch.merge(SessionPatch::question("what now?"));

        assert_eq!(patch.spread, Some(SpreadType::ThreeCard));
        assert_eq!(patch.question, Some(Some("what now?".to_string())));
    }

    #[test]
    fn test_apply_to_session() {
        let mut session = test_session();
        let mut patch = SessionPatch::question("What should I focus on?");
        patch.merge(SessionPatch::cards(vec![card("the-star", 0)]));

        patch.apply_to(&mut session);
        assert_eq!(
            session.question.as_deref(),
            Some("What should I focus on?")
        );
        assert_eq!(session.cards.len(), 1);
        assert_eq!(session.cards[0].card_id, "the-star");
    }

    #[test]
    fn test_apply_can_clear_field() {
        let mut session = test_session();
        session.notes = Some("scratch".to_string());

        let patch = SessionPatch {
            notes: Some(None),
            ..SessionPatch::default()
        };
        patch.apply_to(&mut session);
        assert!(session.notes.is_none());
    }

    #[test]
    fn test_untouched_fields_skipped_in_json() {
        let patch = SessionPatch::question("only this");
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("question"));
        assert!(!json.contains("cards"));
        assert!(!json.contains("spread"));
        assert!(!json.contains("notes"));
    }
}
