//! Review sessions and their aggregation.

use chrono::{DateTime, Utc};
use deckstore_types::{
    Document, DocumentId, FieldKey, Identifiable, OwnerId, Predicate, Record, ToWireValue,
    UpdateOperation, WireError, WireValue,
};

use crate::now;

/// Stored fields of a [`ReviewSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    /// `userId`
    Owner,
    /// `deckId`, nullable for mixed sessions.
    Deck,
    /// `cardIds`
    CardIds,
    /// `correct`
    Correct,
    /// `incorrect`
    Incorrect,
    /// `startedAt`, epoch millis.
    StartedAt,
    /// `finishedAt`, epoch millis, nullable.
    FinishedAt,
}

impl FieldKey for SessionField {
    const ALL: &'static [Self] = &[
        Self::Owner,
        Self::Deck,
        Self::CardIds,
        Self::Correct,
        Self::Incorrect,
        Self::StartedAt,
        Self::FinishedAt,
    ];

    fn wire_key(self) -> &'static str {
        match self {
            Self::Owner => "userId",
            Self::Deck => "deckId",
            Self::CardIds => "cardIds",
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::StartedAt => "startedAt",
            Self::FinishedAt => "finishedAt",
        }
    }
}

/// One sitting of card reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSession {
    /// Document id.
    pub id: DocumentId,
    /// Owning user.
    pub owner: OwnerId,
    /// Deck reviewed, or `None` for a mixed session.
    pub deck_id: Option<DocumentId>,
    /// Cards reviewed, in review order.
    pub card_ids: Vec<DocumentId>,
    /// Correct answers.
    pub correct: u32,
    /// Incorrect answers.
    pub incorrect: u32,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time, once finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Start a session now.
    pub fn start(owner: OwnerId, deck_id: Option<DocumentId>) -> Self {
        Self {
            id: DocumentId::generate(),
            owner,
            deck_id,
            card_ids: Vec::new(),
            correct: 0,
            incorrect: 0,
            started_at: now(),
            finished_at: None,
        }
    }

    /// Record one answer. Returns the operations that persist it.
    pub fn record_answer(&mut self, card_id: DocumentId, correct: bool) -> Vec<UpdateOperation> {
        let counter = if correct {
            self.correct += 1;
            UpdateOperation::set(SessionField::Correct, self.correct)
        } else {
            self.incorrect += 1;
            UpdateOperation::set(SessionField::Incorrect, self.incorrect)
        };
        let add = UpdateOperation::add_to_array(SessionField::CardIds, [&card_id]);
        if !self.card_ids.contains(&card_id) {
            self.card_ids.push(card_id);
        }
        vec![counter, add]
    }

    /// Mark finished at `at`.
    pub fn finish(&mut self, at: DateTime<Utc>) -> Vec<UpdateOperation> {
        self.finished_at = Some(at);
        vec![UpdateOperation::set(SessionField::FinishedAt, at)]
    }

    /// Whether the session has ended.
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Number of answers recorded.
    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Fraction answered correctly; `None` before the first answer.
    pub fn accuracy(&self) -> Option<f64> {
        let answered = self.answered();
        (answered > 0).then(|| f64::from(self.correct) / f64::from(answered))
    }

    /// Sessions for `deck_id`.
    pub fn for_deck(deck_id: &DocumentId) -> Predicate {
        Predicate::equal_to(SessionField::Deck, deck_id)
    }

    /// Sessions started at or after `since`, newest first.
    pub fn since(since: DateTime<Utc>) -> [Predicate; 2] {
        [
            Predicate::greater_or_equal(SessionField::StartedAt, since),
            Predicate::order_by_descending(SessionField::StartedAt),
        ]
    }
}

impl Identifiable for ReviewSession {
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Document for ReviewSession {
    type Field = SessionField;
    const COLLECTION: &'static str = "reviewSessions";
    const OWNER_FIELD: SessionField = SessionField::Owner;
    const ORDER_FIELD: SessionField = SessionField::StartedAt;
    const ORDER_DESCENDING: bool = true;

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn field_value(&self, field: SessionField) -> WireValue {
        match field {
            SessionField::Owner => self.owner.to_wire(),
            SessionField::Deck => self.deck_id.to_wire(),
            SessionField::CardIds => self.card_ids.to_wire(),
            SessionField::Correct => self.correct.to_wire(),
            SessionField::Incorrect => self.incorrect.to_wire(),
            SessionField::StartedAt => self.started_at.to_wire(),
            SessionField::FinishedAt => self.finished_at.to_wire(),
        }
    }

    fn from_record(record: &Record) -> Result<Self, WireError> {
        Ok(Self {
            id: record.id.clone(),
            owner: record.decode(SessionField::Owner)?,
            deck_id: record.decode(SessionField::Deck)?,
            card_ids: record.decode(SessionField::CardIds)?,
            correct: record.decode(SessionField::Correct)?,
            incorrect: record.decode(SessionField::Incorrect)?,
            started_at: record.decode(SessionField::StartedAt)?,
            finished_at: record.decode(SessionField::FinishedAt)?,
        })
    }
}

/// Totals over a set of sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionSummary {
    /// Sessions counted.
    pub sessions: usize,
    /// Sessions that were finished.
    pub finished: usize,
    /// Correct answers across all sessions.
    pub correct: u64,
    /// Incorrect answers across all sessions.
    pub incorrect: u64,
    /// Distinct cards reviewed across all sessions.
    pub distinct_cards: usize,
}

impl SessionSummary {
    /// Aggregate `sessions`.
    pub fn aggregate<'a>(sessions: impl IntoIterator<Item = &'a ReviewSession>) -> Self {
        let mut summary = Self::default();
        let mut cards = std::collections::HashSet::new();
        for session in sessions {
            summary.sessions += 1;
            summary.finished += usize::from(session.is_finished());
            summary.correct += u64::from(session.correct);
            summary.incorrect += u64::from(session.incorrect);
            cards.extend(session.card_ids.iter());
        }
        summary.distinct_cards = cards.len();
        summary
    }

    /// Overall fraction answered correctly; `None` with no answers.
    pub fn accuracy(&self) -> Option<f64> {
        let answered = self.correct + self.incorrect;
        (answered > 0).then(|| self.correct as f64 / answered as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use deckstore_types::FieldInstruction;
    use serde_json::json;

    fn session() -> ReviewSession {
        ReviewSession::start(OwnerId::new("u1"), Some(DocumentId::new("d1")))
    }

    #[test]
    fn answers_update_counters_and_card_list() {
        let mut s = session();
        s.record_answer(DocumentId::new("c1"), true);
        s.record_answer(DocumentId::new("c2"), false);
        let ops = s.record_answer(DocumentId::new("c1"), true);

        assert_eq!(s.correct, 2);
        assert_eq!(s.incorrect, 1);
        assert_eq!(s.card_ids, [DocumentId::new("c1"), DocumentId::new("c2")]);
        assert_eq!(s.accuracy(), Some(2.0 / 3.0));

        let patch = deckstore_query::translate(&ops);
        assert_eq!(patch.get("correct"), Some(&FieldInstruction::Set(json!(2))));
        assert_eq!(patch.get("cardIds"), Some(&FieldInstruction::ArrayUnion(vec![json!("c1")])));
    }

    #[test]
    fn mixed_session_stores_null_deck() {
        let s = ReviewSession::start(OwnerId::new("u1"), None);
        let record = s.to_record();
        assert_eq!(record.fields["deckId"], WireValue::Null);
        assert_eq!(record.fields["finishedAt"], WireValue::Null);
        assert_eq!(ReviewSession::from_record(&record).unwrap(), s);
    }

    #[test]
    fn summary_totals_sessions() {
        let mut a = session();
        a.record_answer(DocumentId::new("c1"), true);
        a.finish(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let mut b = session();
        b.record_answer(DocumentId::new("c1"), false);
        b.record_answer(DocumentId::new("c2"), true);

        let summary = SessionSummary::aggregate([&a, &b]);
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.finished, 1);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.distinct_cards, 2);
        assert_eq!(SessionSummary::default().accuracy(), None);
    }
}
