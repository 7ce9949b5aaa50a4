#![deny(missing_docs)]
//! Flashcard-domain documents stored through deckstore.
//!
//! Each type declares an explicit field table ([`DeckField`],
//! [`FlashcardField`], [`SessionField`]) mapping logical fields to wire
//! keys, and encodes its enums through
//! [`wire_enum!`](deckstore_types::wire_enum). Optional fields are always
//! written, as null when absent.

pub mod deck;
pub mod flashcard;
pub mod session;

pub use deck::{Deck, DeckField, DeckTheme};
pub use flashcard::{
    CardStatus, Flashcard, FlashcardField, INITIAL_EASE, MAXIMUM_INTERVAL_DAYS, MINIMUM_EASE,
};
pub use session::{ReviewSession, SessionField, SessionSummary};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time at the millisecond precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
