//! Decks: named, themed collections of flashcards.

use chrono::{DateTime, Utc};
use deckstore_types::{
    Document, DocumentId, FieldKey, Identifiable, OwnerId, Predicate, Record, ToWireValue,
    UpdateOperation, WireError, WireValue, wire_enum,
};
use serde::{Deserialize, Serialize};

use crate::now;

/// Visual theme of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckTheme {
    /// Blue tones.
    #[default]
    Ocean,
    /// Green tones.
    Forest,
    /// Warm tones.
    Sunset,
    /// Dark background.
    Midnight,
    /// Plain, printable.
    Paper,
}

wire_enum!(DeckTheme {
    Ocean => "ocean",
    Forest => "forest",
    Sunset => "sunset",
    Midnight => "midnight",
    Paper => "paper",
});

/// Stored fields of a [`Deck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckField {
    /// `userId`
    Owner,
    /// `name`
    Name,
    /// `description`, nullable.
    Description,
    /// `theme`
    Theme,
    /// `tags`
    Tags,
    /// `cardCount`
    CardCount,
    /// `createdAt`, epoch millis.
    CreatedAt,
    /// `updatedAt`, epoch millis.
    UpdatedAt,
}

impl FieldKey for DeckField {
    const ALL: &'static [Self] = &[
        Self::Owner,
        Self::Name,
        Self::Description,
        Self::Theme,
        Self::Tags,
        Self::CardCount,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    fn wire_key(self) -> &'static str {
        match self {
            Self::Owner => "userId",
            Self::Name => "name",
            Self::Description => "description",
            Self::Theme => "theme",
            Self::Tags => "tags",
            Self::CardCount => "cardCount",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }
}

/// A deck of flashcards. Newest decks list first.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    /// Document id.
    pub id: DocumentId,
    /// Owning user.
    pub owner: OwnerId,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Visual theme.
    pub theme: DeckTheme,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Number of cards, maintained by the caller.
    pub card_count: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    /// A new empty deck with a generated id.
    pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        let created_at = now();
        Self {
            id: DocumentId::generate(),
            owner,
            name: name.into(),
            description: None,
            theme: DeckTheme::default(),
            tags: Vec::new(),
            card_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: DeckTheme) -> Self {
        self.theme = theme;
        self
    }

    /// Add tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Decks carrying `tag`.
    pub fn tagged(tag: &str) -> Predicate {
        Predicate::array_contains(DeckField::Tags, tag)
    }

    /// Decks using `theme`.
    pub fn themed(theme: DeckTheme) -> Predicate {
        Predicate::equal_to(DeckField::Theme, theme)
    }

    /// Rename and touch.
    pub fn rename(name: &str) -> Vec<UpdateOperation> {
        vec![
            UpdateOperation::set(DeckField::Name, name),
            UpdateOperation::set(DeckField::UpdatedAt, now()),
        ]
    }

    /// Replace or clear the description, and touch.
    pub fn describe(description: Option<&str>) -> Vec<UpdateOperation> {
        vec![
            UpdateOperation::set(DeckField::Description, description),
            UpdateOperation::set(DeckField::UpdatedAt, now()),
        ]
    }
}

impl Identifiable for Deck {
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

impl Document for Deck {
    type Field = DeckField;
    const COLLECTION: &'static str = "decks";
    const OWNER_FIELD: DeckField = DeckField::Owner;
    const ORDER_FIELD: DeckField = DeckField::CreatedAt;
    const ORDER_DESCENDING: bool = true;

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn field_value(&self, field: DeckField) -> WireValue {
        match field {
            DeckField::Owner => self.owner.to_wire(),
            DeckField::Name => self.name.to_wire(),
            DeckField::Description => self.description.to_wire(),
            DeckField::Theme => self.theme.to_wire(),
            DeckField::Tags => self.tags.to_wire(),
            DeckField::CardCount => self.card_count.to_wire(),
            DeckField::CreatedAt => self.created_at.to_wire(),
            DeckField::UpdatedAt => self.updated_at.to_wire(),
        }
    }

    fn from_record(record: &Record) -> Result<Self, WireError> {
        Ok(Self {
            id: record.id.clone(),
            owner: record.decode(DeckField::Owner)?,
            name: record.decode(DeckField::Name)?,
            description: record.decode(DeckField::Description)?,
            theme: record.decode(DeckField::Theme)?,
            tags: record.decode(DeckField::Tags)?,
            card_count: record.decode(DeckField::CardCount)?,
            created_at: record.decode(DeckField::CreatedAt)?,
            updated_at: record.decode(DeckField::UpdatedAt)?,
        })
    }
}
