//! The cache-or-fetch decision function, the single point of truth for
//! freshness.

use tracing::debug;

use crate::error::{DexError, Result};
use crate::pokeapi::RemoteApi;

use super::types::{Identifier, Pokemon};
use super::Dex;

impl<R: RemoteApi> Dex<R> {
  /// Return a locally-complete record for the identifier, fetching,
  /// normalizing and persisting from the remote source when the local
  /// copy is absent or incomplete.
  ///
  /// Freshness is a completeness check, not a time policy: a stored
  /// record with no stats is a miss no matter how recently it was
  /// written. Idempotent — a second call with unchanged remote data is a
  /// pure local read.
  pub async fn get_or_fetch(&self, ident: &Identifier) -> Result<Pokemon> {
    if let Some(existing) = self.store.lookup(ident)? {
      if existing.is_complete() {
        debug!(%ident, "cache hit");
        return Ok(existing);
      }
      debug!(%ident, "stored record incomplete, re-syncing");
    } else {
      debug!(%ident, "cache miss");
    }

    let detail = self
      .remote
      .pokemon_detail(&ident.as_path_segment())
      .await
      .map_err(|e| match e {
        // Surface the user's identifier, not the endpoint.
        DexError::NotFound(_) => DexError::NotFound(ident.to_string()),
        other => other,
      })?;

    // Upsert by the key kind the lookup used, so the record the caller
    // found (or would find) is the one mutated.
    let saved = self.store.upsert_pokemon(ident, &detail.into_record())?;
    Ok(saved)
  }
}
