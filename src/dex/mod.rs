//! The cache-or-fetch core: resolver, evolution-chain resolution,
//! listing/filtering, and comparison, all over one Entity Store and one
//! remote client.

mod compare;
mod evolution;
mod listing;
mod resolver;
pub mod types;

use crate::pokeapi::RemoteApi;
use crate::store::EntityStore;

/// Front-end to the cached creature data. Each operation decides per
/// request whether local storage suffices or the remote source must be
/// consulted, and persists whatever it fetches.
pub struct Dex<R> {
  store: EntityStore,
  remote: R,
}

impl<R: RemoteApi> Dex<R> {
  pub fn new(store: EntityStore, remote: R) -> Self {
    Self { store, remote }
  }

  pub fn store(&self) -> &EntityStore {
    &self.store
  }
}
