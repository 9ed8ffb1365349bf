//! Remote Client: stateless wrapper around the PokeAPI JSON documents.
//!
//! `api_types` holds serde structs matching the wire documents; `client`
//! holds the `RemoteApi` trait and its reqwest implementation. Domain
//! types never leak wire shapes: conversions happen at this boundary.

pub mod api_types;
mod client;

pub use client::{PokeApiClient, RemoteApi};

#[cfg(test)]
pub mod testing;
