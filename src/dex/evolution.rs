//! Recursive evolution-chain resolution.
//!
//! The remote models evolutions as a three-hop document graph: detail ->
//! species -> evolution chain, whose root is a tree of species names. Every
//! node resolves through the cache-or-fetch path, so walking a chain
//! persists every member as a side effect.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::error::{DexError, Result};
use crate::pokeapi::api_types::ApiChainLink;
use crate::pokeapi::RemoteApi;

use super::types::{EvolutionNode, Identifier};
use super::Dex;

impl<R: RemoteApi> Dex<R> {
  /// Resolve the full evolution chain containing the identified entity.
  ///
  /// Fails if the starting entity or any required document is missing or
  /// malformed. A chain *member* that fails to resolve is dropped along
  /// with its subtree instead of blanking out the rest of the chain.
  pub async fn evolution_chain(&self, ident: &Identifier) -> Result<EvolutionNode> {
    let start = self.get_or_fetch(ident).await?;

    // The resolver returns local records only; the species reference lives
    // in the wire document, so fetch the detail again.
    let detail = self.remote.pokemon_detail(&ident.as_path_segment()).await?;
    let species_url = detail
      .species
      .and_then(|s| s.url)
      .ok_or_else(|| {
        DexError::MalformedDocument(format!("detail for '{}' has no species reference", start.name))
      })?;

    let species = self.remote.species(&species_url).await?;
    let chain_url = species
      .evolution_chain
      .and_then(|r| r.url)
      .ok_or_else(|| {
        DexError::MalformedDocument(format!(
          "species for '{}' has no evolution chain reference",
          start.name
        ))
      })?;

    let chain_doc = self.remote.evolution_chain(&chain_url).await?;
    let root = chain_doc
      .chain
      .ok_or_else(|| DexError::MalformedDocument("evolution chain document has no root".into()))?;

    let root_name = root.species.name.to_lowercase();
    self
      .resolve_chain_node(&root)
      .await
      .ok_or(DexError::NotFound(root_name))
  }

  /// Depth-first pre-order descent. Returns None when this node's species
  /// cannot be resolved; siblings are unaffected.
  fn resolve_chain_node<'a>(
    &'a self,
    link: &'a ApiChainLink,
  ) -> Pin<Box<dyn Future<Output = Option<EvolutionNode>> + 'a>> {
    Box::pin(async move {
      let name = link.species.name.to_lowercase();
      let pokemon = match self.get_or_fetch(&Identifier::Name(name.clone())).await {
        Ok(p) => p,
        Err(e) => {
          warn!(%name, error = %e, "dropping unresolvable chain member");
          return None;
        }
      };

      let mut evolves_to = Vec::new();
      for child in &link.evolves_to {
        if let Some(node) = self.resolve_chain_node(child).await {
          evolves_to.push(node);
        }
      }

      Some(EvolutionNode {
        display_name: pokemon.display_name(),
        sprite_url: pokemon.sprite_url.clone(),
        detail_key: pokemon.name.clone(),
        pokemon,
        evolves_to,
      })
    })
  }
}
