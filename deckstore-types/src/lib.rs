//! # deckstore-types: protocol types for the deckstore access layer
//!
//! This crate defines the vocabulary every other deckstore crate speaks:
//!
//! | Concern | Types | What it does |
//! |---------|-------|-------------|
//! | Identity | [`DocumentId`], [`OwnerId`] | Typed string identifiers |
//! | Wire | [`WireValue`], [`ToWireValue`], [`FromWireValue`] | Explicit domain ↔ primitive conversion |
//! | Documents | [`Document`], [`FieldKey`], [`Record`] | Per-type field tables, no reflection |
//! | Queries | [`Predicate`], [`Query`], [`Filter`] | Caller vocabulary and composed query |
//! | Updates | [`UpdateOperation`], [`Patch`] | Typed field updates and partial-update payload |
//! | Boundary | [`RemoteStore`], [`WriteBatch`] | The remote ordered document store |
//! | Callbacks | [`PageSource`], [`SearchSource`] | Fetch/search functions injected into list state |
//! | Errors | [`BackendError`], [`StoreError`] | Raw backend errors and the closed service taxonomy |
//!
//! Boundary traits use `async-trait`. Nothing here talks to the network.

#![deny(missing_docs)]

pub mod document;
pub mod error;
pub mod id;
pub mod predicate;
pub mod query;
pub mod source;
pub mod store;
pub mod update;
pub mod wire;

pub use document::{DOCUMENT_ID_FIELD, Document, FieldKey, FieldPath, Identifiable, Record};
pub use error::{BackendCode, BackendError, Operation, StoreError};
pub use id::{DocumentId, OwnerId};
pub use predicate::Predicate;
pub use query::{Filter, FilterOp, Limit, OrderSpec, Query};
pub use source::{PageSource, SearchSource};
pub use store::{BatchWrite, RemoteStore, WriteBatch};
pub use update::{FieldInstruction, Patch, UpdateOperation};
pub use wire::{FromWireValue, ToWireValue, WireError, WireValue};
