//! Flashcards and their review scheduling state.

use chrono::{DateTime, Duration, Utc};
use deckstore_types::{
    Document, DocumentId, FieldKey, Identifiable, OwnerId, Predicate, Record, ToWireValue,
    UpdateOperation, WireError, WireValue, wire_enum,
};
use serde::{Deserialize, Serialize};

use crate::now;

/// Ease factor given to new cards.
pub const INITIAL_EASE: f64 = 2.5;

/// Lowest ease factor a card can fall to.
pub const MINIMUM_EASE: f64 = 1.3;

/// Longest interval, in days, a review can schedule.
pub const MAXIMUM_INTERVAL_DAYS: u32 = 36_500;

/// Where a card is in its learning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Never reviewed.
    #[default]
    New,
    /// Reviewed, not yet graduated.
    Learning,
    /// Scheduled at growing intervals.
    Review,
    /// Excluded from sessions.
    Suspended,
}

wire_enum!(CardStatus {
    New => "new",
    Learning => "learning",
    Review => "review",
    Suspended => "suspended",
});

/// Stored fields of a [`Flashcard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashcardField {
    /// `userId`
    Owner,
    /// `deckId`
    Deck,
    /// `front`
    Front,
    /// `back`
    Back,
    /// `hint`, nullable.
    Hint,
    /// `status`
    Status,
    /// `tags`
    Tags,
    /// `ease`
    Ease,
    /// `intervalDays`
    IntervalDays,
    /// `dueAt`, epoch millis, nullable.
    DueAt,
    /// `createdAt`, epoch millis.
    CreatedAt,
}

impl FieldKey for FlashcardField {
    const ALL: &'static [Self] = &[
        Self::Owner,
        Self::Deck,
        Self::Front,
        Self::Back,
        Self::Hint,
        Self::Status,
        Self::Tags,
        Self::Ease,
        Self::IntervalDays,
        Self::DueAt,
        Self::CreatedAt,
    ];

    fn wire_key(self) -> &'static str {
        match self {
            Self::Owner => "userId",
            Self::Deck => "deckId",
            Self::Front => "front",
            Self::Back => "back",
            Self::Hint => "hint",
            Self::Status => "status",
            Self::Tags => "tags",
            Self::Ease => "ease",
            Self::IntervalDays => "intervalDays",
            Self::DueAt => "dueAt",
            Self::CreatedAt => "createdAt",
        }
    }
}

/// One card: a prompt, its answer, and scheduling state.
#[derive(Debug, Clone, PartialEq)]
pub struct Flashcard {
    /// Document id.
    pub id: DocumentId,
    /// Owning user.
    pub owner: OwnerId,
    /// Deck the card belongs to.
    pub deck_id: DocumentId,
    /// Prompt side.
    pub front: String,
    /// Answer side.
    pub back: String,
    /// Optional hint shown on request.
    pub hint: Option<String>,
    /// Learning status.
    pub status: CardStatus,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Ease factor.
    pub ease: f64,
    /// Current review interval.
    pub interval_days: u32,
    /// Next review time. `None` until first reviewed.
    pub due_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    /// A new card in `deck_id` with a generated id.
    pub fn new(
        owner: OwnerId,
        deck_id: DocumentId,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        Self {
            id: DocumentId::generate(),
            owner,
            deck_id,
            front: front.into(),
            back: back.into(),
            hint: None,
            status: CardStatus::New,
            tags: Vec::new(),
            ease: INITIAL_EASE,
            interval_days: 0,
            due_at: None,
            created_at: now(),
        }
    }

    /// Set the hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Cards in `deck_id`.
    pub fn in_deck(deck_id: &DocumentId) -> Predicate {
        Predicate::equal_to(FlashcardField::Deck, deck_id)
    }

    /// Cards in any of `deck_ids` (at most ten per query).
    pub fn in_decks(deck_ids: &[DocumentId]) -> Predicate {
        Predicate::is_in(FlashcardField::Deck, deck_ids)
    }

    /// Cards with `status`.
    pub fn with_status(status: CardStatus) -> Predicate {
        Predicate::equal_to(FlashcardField::Status, status)
    }

    /// Cards due at or before `at`, soonest first.
    pub fn due_by(at: DateTime<Utc>) -> [Predicate; 2] {
        [
            Predicate::less_or_equal(FlashcardField::DueAt, at),
            Predicate::order_by(FlashcardField::DueAt),
        ]
    }

    /// Schedule the next review from a recall grade in `0..=5`.
    ///
    /// Grades below 3 restart the interval. Returns the operations that
    /// persist the new schedule; `self` is updated to match.
    pub fn review(&mut self, grade: u8, at: DateTime<Utc>) -> Vec<UpdateOperation> {
        let grade = f64::from(grade.min(5));
        if grade < 3.0 {
            self.interval_days = 1;
            self.status = CardStatus::Learning;
        } else {
            self.interval_days = match self.interval_days {
                0 => 1,
                1 => 6,
                days => {
                    let grown = (f64::from(days) * self.ease).round();
                    grown.min(f64::from(MAXIMUM_INTERVAL_DAYS)) as u32
                }
            }
            .min(MAXIMUM_INTERVAL_DAYS);
            self.status = CardStatus::Review;
        }
        let penalty = 5.0 - grade;
        self.ease = (self.ease + 0.1 - penalty * (0.08 + penalty * 0.02)).max(MINIMUM_EASE);
        let due = at
            .checked_add_signed(Duration::days(i64::from(self.interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.due_at = Some(due);

        vec![
            UpdateOperation::set(FlashcardField::Status, self.status),
            UpdateOperation::set(FlashcardField::Ease, self.ease),
            UpdateOperation::set(FlashcardField::IntervalDays, self.interval_days),
            UpdateOperation::set(FlashcardField::DueAt, self.due_at),
        ]
    }
}

impl Identifiable for Flashcard {
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Document for Flashcard {
    type Field = FlashcardField;
    const COLLECTION: &'static str = "flashcards";
    const OWNER_FIELD: FlashcardField = FlashcardField::Owner;
    const ORDER_FIELD: FlashcardField = FlashcardField::CreatedAt;
    const ORDER_DESCENDING: bool = true;

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn field_value(&self, field: FlashcardField) -> WireValue {
        match field {
            FlashcardField::Owner => self.owner.to_wire(),
            FlashcardField::Deck => self.deck_id.to_wire(),
            FlashcardField::Front => self.front.to_wire(),
            FlashcardField::Back => self.back.to_wire(),
            FlashcardField::Hint => self.hint.to_wire(),
            FlashcardField::Status => self.status.to_wire(),
            FlashcardField::Tags => self.tags.to_wire(),
            FlashcardField::Ease => self.ease.to_wire(),
            FlashcardField::IntervalDays => self.interval_days.to_wire(),
            FlashcardField::DueAt => self.due_at.to_wire(),
            FlashcardField::CreatedAt => self.created_at.to_wire(),
        }
    }

    fn from_record(record: &Record) -> Result<Self, WireError> {
        Ok(Self {
            id: record.id.clone(),
            owner: record.decode(FlashcardField::Owner)?,
            deck_id: record.decode(FlashcardField::Deck)?,
            front: record.decode(FlashcardField::Front)?,
            back: record.decode(FlashcardField::Back)?,
            hint: record.decode(FlashcardField::Hint)?,
            status: record.decode(FlashcardField::Status)?,
            tags: record.decode(FlashcardField::Tags)?,
            ease: record.decode(FlashcardField::Ease)?,
            interval_days: record.decode(FlashcardField::IntervalDays)?,
            due_at: record.decode(FlashcardField::DueAt)?,
            created_at: record.decode(FlashcardField::CreatedAt)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn card() -> Flashcard {
        Flashcard::new(OwnerId::new("u1"), DocumentId::new("d1"), "perro", "dog")
    }

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn new_card_round_trips() {
        let card = card().with_hint("woof");
        let record = card.to_record();
        assert_eq!(record.fields["status"], json!("new"));
        assert_eq!(record.fields["dueAt"], WireValue::Null);
        assert_eq!(record.fields["deckId"], json!("d1"));
        assert_eq!(Flashcard::from_record(&record).unwrap(), card);
    }

    #[test]
    fn good_grades_grow_the_interval() {
        let mut card = card();
        card.review(4, at());
        assert_eq!(card.interval_days, 1);
        card.review(4, at());
        assert_eq!(card.interval_days, 6);
        card.review(5, at());
        assert!(card.interval_days > 6);
        assert_eq!(card.status, CardStatus::Review);
        assert_eq!(card.due_at, Some(at() + Duration::days(i64::from(card.interval_days))));
    }

    #[test]
    fn failed_recall_restarts_and_lowers_ease() {
        let mut card = card();
        card.interval_days = 20;
        let ops = card.review(1, at());
        assert_eq!(card.interval_days, 1);
        assert_eq!(card.status, CardStatus::Learning);
        assert!(card.ease < INITIAL_EASE);
        assert_eq!(ops.len(), 4);
    }

    #[test]
    fn ease_never_drops_below_minimum() {
        let mut card = card();
        for _ in 0..20 {
            card.review(0, at());
        }
        assert!((card.ease - MINIMUM_EASE).abs() < f64::EPSILON);
    }

    #[test]
    fn long_easy_streaks_cap_the_interval() {
        let mut card = card();
        for _ in 0..40 {
            card.review(5, at());
            assert!(card.interval_days <= MAXIMUM_INTERVAL_DAYS);
        }
        assert_eq!(card.interval_days, MAXIMUM_INTERVAL_DAYS);
        let expected = at() + Duration::days(i64::from(MAXIMUM_INTERVAL_DAYS));
        assert_eq!(card.due_at, Some(expected));
    }

    #[test]
    fn review_near_the_end_of_time_saturates_the_due_date() {
        let mut card = card();
        card.interval_days = 6;
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        card.review(5, late);
        assert_eq!(card.due_at, Some(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn due_by_filters_and_orders_on_due_date() {
        let [filter, order] = Flashcard::due_by(at());
        assert_eq!(filter.filter_field().map(|f| f.as_str()), Some("dueAt"));
        assert!(order.is_ordering());
    }
}
