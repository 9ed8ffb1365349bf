//! In-memory `RemoteApi` implementation with canned documents and a call
//! log, so core tests can assert exactly which remote fetches happened.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::error::{DexError, Result};
use crate::pokeapi::api_types::{
  ApiEvolutionChain, ApiPokemonDetail, ApiResourcePage, ApiSpecies, ApiTypeDocument,
};
use crate::pokeapi::RemoteApi;

#[derive(Default)]
pub struct FakeRemote {
  pokemon: HashMap<String, Value>,
  species: HashMap<String, Value>,
  chains: HashMap<String, Value>,
  type_docs: HashMap<String, Value>,
  type_index: Vec<String>,
  ability_index: Vec<String>,
  page: Vec<String>,
  /// Endpoints forced to fail with RemoteUnavailable.
  outages: HashSet<String>,
  calls: Mutex<Vec<String>>,
}

impl FakeRemote {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a detail document, reachable by name and by id.
  pub fn add_pokemon(&mut self, doc: Value) {
    let id = doc["id"].as_i64().expect("detail doc needs an id");
    let name = doc["name"].as_str().expect("detail doc needs a name");
    self.pokemon.insert(id.to_string(), doc.clone());
    self.pokemon.insert(name.to_string(), doc);
  }

  pub fn add_species(&mut self, url: &str, doc: Value) {
    self.species.insert(url.to_string(), doc);
  }

  pub fn add_chain(&mut self, url: &str, doc: Value) {
    self.chains.insert(url.to_string(), doc);
  }

  pub fn add_type_doc(&mut self, name: &str, member_names: &[&str]) {
    let members: Vec<Value> = member_names
      .iter()
      .map(|n| json!({"pokemon": {"name": n, "url": format!("https://example.test/pokemon/{}/", n)}}))
      .collect();
    self
      .type_docs
      .insert(name.to_string(), json!({"pokemon": members}));
  }

  pub fn set_type_index(&mut self, names: &[&str]) {
    self.type_index = names.iter().map(|s| s.to_string()).collect();
  }

  pub fn set_ability_index(&mut self, names: &[&str]) {
    self.ability_index = names.iter().map(|s| s.to_string()).collect();
  }

  pub fn set_pokemon_page(&mut self, names: &[&str]) {
    self.page = names.iter().map(|s| s.to_string()).collect();
  }

  /// Force one endpoint (e.g. "type/grass", "pokemon_page") to fail.
  pub fn outage(&mut self, endpoint: &str) {
    self.outages.insert(endpoint.to_string());
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self, prefix: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.starts_with(prefix))
      .count()
  }

  fn record(&self, endpoint: &str) -> Result<()> {
    self.calls.lock().unwrap().push(endpoint.to_string());
    if self.outages.contains(endpoint) {
      return Err(DexError::RemoteUnavailable(format!(
        "{}: connection refused",
        endpoint
      )));
    }
    Ok(())
  }

  fn index_page(names: &[String]) -> ApiResourcePage {
    serde_json::from_value(json!({
      "results": names
        .iter()
        .map(|n| json!({"name": n, "url": format!("https://example.test/{}/", n)}))
        .collect::<Vec<_>>(),
      "next": null,
      "previous": null
    }))
    .unwrap()
  }
}

impl RemoteApi for FakeRemote {
  async fn pokemon_detail(&self, ident: &str) -> Result<ApiPokemonDetail> {
    self.record(&format!("pokemon/{}", ident))?;
    let doc = self
      .pokemon
      .get(ident)
      .ok_or_else(|| DexError::NotFound(ident.to_string()))?;
    Ok(serde_json::from_value(doc.clone()).unwrap())
  }

  async fn species(&self, url: &str) -> Result<ApiSpecies> {
    self.record(&format!("species {}", url))?;
    let doc = self
      .species
      .get(url)
      .ok_or_else(|| DexError::NotFound(url.to_string()))?;
    Ok(serde_json::from_value(doc.clone()).unwrap())
  }

  async fn evolution_chain(&self, url: &str) -> Result<ApiEvolutionChain> {
    self.record(&format!("chain {}", url))?;
    let doc = self
      .chains
      .get(url)
      .ok_or_else(|| DexError::NotFound(url.to_string()))?;
    Ok(serde_json::from_value(doc.clone()).unwrap())
  }

  async fn type_document(&self, name: &str) -> Result<ApiTypeDocument> {
    self.record(&format!("type/{}", name))?;
    let doc = self
      .type_docs
      .get(name)
      .ok_or_else(|| DexError::NotFound(name.to_string()))?;
    Ok(serde_json::from_value(doc.clone()).unwrap())
  }

  async fn type_index(&self) -> Result<ApiResourcePage> {
    self.record("type_index")?;
    Ok(Self::index_page(&self.type_index))
  }

  async fn ability_index(&self) -> Result<ApiResourcePage> {
    self.record("ability_index")?;
    Ok(Self::index_page(&self.ability_index))
  }

  async fn pokemon_page(&self, _limit: u32) -> Result<ApiResourcePage> {
    self.record("pokemon_page")?;
    Ok(Self::index_page(&self.page))
  }
}

/// Build a detail document the way PokeAPI shapes it.
pub fn detail(id: i64, name: &str, types: &[&str], abilities: &[&str], stats: &[(&str, i64)]) -> Value {
  json!({
    "id": id,
    "name": name,
    "height": 7,
    "weight": 69,
    "sprites": {"front_default": format!("https://example.test/sprites/{}.png", name)},
    "types": types.iter().map(|t| json!({"type": {"name": t}})).collect::<Vec<_>>(),
    "abilities": abilities.iter().map(|a| json!({"ability": {"name": a}})).collect::<Vec<_>>(),
    "stats": stats
      .iter()
      .map(|(s, v)| json!({"stat": {"name": s}, "base_stat": v}))
      .collect::<Vec<_>>(),
    "species": {
      "name": name,
      "url": format!("https://example.test/species/{}/", name)
    }
  })
}

/// Detail document with an explicit species URL (for evolution-chain tests).
pub fn detail_with_species(id: i64, name: &str, stats: &[(&str, i64)], species_url: &str) -> Value {
  let mut doc = detail(id, name, &[], &[], stats);
  doc["species"] = json!({"name": name, "url": species_url});
  doc
}
