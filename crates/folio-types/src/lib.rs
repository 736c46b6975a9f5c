//! Foundation types for the Folio bookkeeping engine.
//!
//! This crate provides the identifiers, money primitives, and bounded
//! metadata used throughout Folio. Every other Folio crate depends on
//! `folio-types`.
//!
//! # Key Types
//!
//! - [`UserId`] / [`AccountId`] / [`EntryId`] / [`LineId`] — UUID v7 entity identifiers
//! - [`Currency`] / [`Money`] — integer minor-unit amounts in a single currency
//! - [`Side`] — debit or credit, with `flip` and `sign`
//! - [`AccountType`] — the five fundamental account types
//! - [`Metadata`] — bounded string map with a canonical sorted-key encoding
//! - [`Category`] — informational entry tags with a custom escape hatch
//! - [`Deadline`] — cooperative cancellation handle for engine operations

pub mod account;
pub mod category;
pub mod error;
pub mod id;
pub mod metadata;
pub mod money;
pub mod slug;
pub mod temporal;

pub use account::AccountType;
pub use category::Category;
pub use error::TypeError;
pub use id::{AccountId, EntryId, LineId, UserId};
pub use metadata::Metadata;
pub use money::{Currency, Money, Side};
pub use temporal::{Deadline, DeadlineExceeded};
