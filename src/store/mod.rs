//! Entity Store: persistent relational cache for Types, Abilities and
//! Pokémon, plus their many-to-many relations.
//!
//! Everything the resolver fetches lands here; the listing and comparison
//! engines only ever read. Records are never deleted.

mod entities;

pub use entities::{EntityStore, PageOf, StoreFilter};
