//! Serde-deserializable types matching PokeAPI documents.
//!
//! These are separate from domain types so deserialization stays defensive
//! (every field the remote may omit is an `Option` or defaulted) while
//! domain types stay focused on application needs. A missing required
//! reference becomes a `MalformedDocument` error at the point of use,
//! never an uncaught fault.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dex::types::PokemonRecord;

// ============================================================================
// Common nested shapes
// ============================================================================

/// The `{ name, url }` pair PokeAPI uses for every cross-document reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiNamedResource {
  #[serde(default)]
  pub name: String,
  pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResourceRef {
  pub url: Option<String>,
}

// ============================================================================
// Pokémon detail document
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTypeSlot {
  #[serde(rename = "type")]
  pub kind: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAbilitySlot {
  pub ability: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatSlot {
  pub stat: ApiNamedResource,
  #[serde(default)]
  pub base_stat: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSprites {
  pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPokemonDetail {
  pub id: i64,
  pub name: String,
  pub height: Option<i64>,
  pub weight: Option<i64>,
  #[serde(default)]
  pub sprites: ApiSprites,
  #[serde(default)]
  pub types: Vec<ApiTypeSlot>,
  #[serde(default)]
  pub abilities: Vec<ApiAbilitySlot>,
  #[serde(default)]
  pub stats: Vec<ApiStatSlot>,
  /// Reference to the species document, the first hop toward the
  /// evolution chain.
  pub species: Option<ApiNamedResource>,
}

// ============================================================================
// Species and evolution-chain documents
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSpecies {
  pub evolution_chain: Option<ApiResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChainLink {
  pub species: ApiNamedResource,
  #[serde(default)]
  pub evolves_to: Vec<ApiChainLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvolutionChain {
  pub chain: Option<ApiChainLink>,
}

// ============================================================================
// Type member and index documents
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTypeMember {
  pub pokemon: ApiNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTypeDocument {
  #[serde(default)]
  pub pokemon: Vec<ApiTypeMember>,
}

/// Paged index document (`/type`, `/ability`, `/pokemon?limit=N`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResourcePage {
  #[serde(default)]
  pub results: Vec<ApiNamedResource>,
  pub next: Option<String>,
  pub previous: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiPokemonDetail {
  /// Normalize the wire payload into upsert-ready fields: lowercase names,
  /// stats keyed by name, relation lists as plain name sets.
  pub fn into_record(self) -> PokemonRecord {
    let stats: BTreeMap<String, i64> = self
      .stats
      .into_iter()
      .map(|s| (s.stat.name.to_lowercase(), s.base_stat))
      .collect();
    PokemonRecord {
      external_id: self.id,
      name: self.name.to_lowercase(),
      height: self.height,
      weight: self.weight,
      sprite_url: self.sprites.front_default,
      stats,
      types: self
        .types
        .into_iter()
        .map(|t| t.kind.name.to_lowercase())
        .collect(),
      abilities: self
        .abilities
        .into_iter()
        .map(|a| a.ability.name.to_lowercase())
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_detail_parses_and_normalizes() {
    let detail: ApiPokemonDetail = serde_json::from_value(json!({
      "id": 1,
      "name": "Bulbasaur",
      "height": 7,
      "weight": 69,
      "sprites": {"front_default": "https://example.com/bulbasaur.png"},
      "types": [{"type": {"name": "Grass"}}, {"type": {"name": "poison"}}],
      "abilities": [{"ability": {"name": "Overgrow"}}],
      "stats": [{"stat": {"name": "hp"}, "base_stat": 45}],
      "species": {"name": "bulbasaur", "url": "https://example.com/species/1/"}
    }))
    .unwrap();

    let rec = detail.into_record();
    assert_eq!(rec.external_id, 1);
    assert_eq!(rec.name, "bulbasaur");
    assert_eq!(rec.types, vec!["grass", "poison"]);
    assert_eq!(rec.abilities, vec!["overgrow"]);
    assert_eq!(rec.stats.get("hp"), Some(&45));
    assert_eq!(
      rec.sprite_url.as_deref(),
      Some("https://example.com/bulbasaur.png")
    );
  }

  #[test]
  fn test_detail_tolerates_missing_optional_fields() {
    let detail: ApiPokemonDetail =
      serde_json::from_value(json!({"id": 132, "name": "ditto"})).unwrap();
    assert!(detail.species.is_none());
    let rec = detail.into_record();
    assert!(rec.stats.is_empty());
    assert!(rec.types.is_empty());
    assert!(rec.sprite_url.is_none());
  }

  #[test]
  fn test_chain_link_parses_recursively() {
    let chain: ApiEvolutionChain = serde_json::from_value(json!({
      "chain": {
        "species": {"name": "bulbasaur"},
        "evolves_to": [{
          "species": {"name": "ivysaur"},
          "evolves_to": [{"species": {"name": "venusaur"}, "evolves_to": []}]
        }]
      }
    }))
    .unwrap();

    let root = chain.chain.unwrap();
    assert_eq!(root.species.name, "bulbasaur");
    assert_eq!(root.evolves_to[0].species.name, "ivysaur");
    assert_eq!(root.evolves_to[0].evolves_to[0].species.name, "venusaur");
  }
}
