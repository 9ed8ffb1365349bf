//! The `RemoteApi` trait and its reqwest implementation.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{DexError, Result};
use crate::pokeapi::api_types::{
  ApiEvolutionChain, ApiPokemonDetail, ApiResourcePage, ApiSpecies, ApiTypeDocument,
};

/// Index documents are small; one page covers everything we list.
const INDEX_PAGE_LIMIT: u32 = 100;

/// Remote source seam. The production implementation issues HTTP GETs;
/// tests substitute a fake with canned documents.
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
  /// Full detail document for one entity, by name or numeric id.
  async fn pokemon_detail(&self, ident: &str) -> Result<ApiPokemonDetail>;

  /// Species document, fetched by the absolute URL a detail document gave us.
  async fn species(&self, url: &str) -> Result<ApiSpecies>;

  /// Evolution-chain document, by the URL a species document gave us.
  async fn evolution_chain(&self, url: &str) -> Result<ApiEvolutionChain>;

  /// Per-type document listing member species.
  async fn type_document(&self, name: &str) -> Result<ApiTypeDocument>;

  /// Index of all type names.
  async fn type_index(&self) -> Result<ApiResourcePage>;

  /// Index of all ability names.
  async fn ability_index(&self) -> Result<ApiResourcePage>;

  /// One page of entity summaries.
  async fn pokemon_page(&self, limit: u32) -> Result<ApiResourcePage>;
}

/// PokeAPI client wrapper.
#[derive(Clone)]
pub struct PokeApiClient {
  http: reqwest::Client,
  base: Url,
}

impl PokeApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    // Url::join drops the last path segment unless the base ends in '/'.
    let mut base = config.api.base_url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base = Url::parse(&base)
      .map_err(|e| DexError::RemoteUnavailable(format!("invalid base url '{}': {}", base, e)))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| DexError::RemoteUnavailable(format!("invalid endpoint '{}': {}", path, e)))
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
    debug!(%url, "GET");
    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| DexError::RemoteUnavailable(format!("GET {}: {}", url, e)))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(DexError::NotFound(url.to_string()));
    }
    if !status.is_success() {
      return Err(DexError::RemoteUnavailable(format!(
        "GET {} returned {}",
        url, status
      )));
    }

    response
      .json::<T>()
      .await
      .map_err(|e| DexError::MalformedDocument(format!("GET {}: {}", url, e)))
  }

  async fn get_json_at<T: DeserializeOwned>(&self, raw_url: &str) -> Result<T> {
    let url = Url::parse(raw_url)
      .map_err(|e| DexError::MalformedDocument(format!("bad reference url '{}': {}", raw_url, e)))?;
    self.get_json(url).await
  }
}

impl RemoteApi for PokeApiClient {
  async fn pokemon_detail(&self, ident: &str) -> Result<ApiPokemonDetail> {
    let url = self.endpoint(&format!("pokemon/{}/", ident))?;
    self.get_json(url).await
  }

  async fn species(&self, url: &str) -> Result<ApiSpecies> {
    self.get_json_at(url).await
  }

  async fn evolution_chain(&self, url: &str) -> Result<ApiEvolutionChain> {
    self.get_json_at(url).await
  }

  async fn type_document(&self, name: &str) -> Result<ApiTypeDocument> {
    let url = self.endpoint(&format!("type/{}/", name))?;
    self.get_json(url).await
  }

  async fn type_index(&self) -> Result<ApiResourcePage> {
    let url = self.endpoint(&format!("type?limit={}", INDEX_PAGE_LIMIT))?;
    self.get_json(url).await
  }

  async fn ability_index(&self) -> Result<ApiResourcePage> {
    let url = self.endpoint(&format!("ability?limit={}", INDEX_PAGE_LIMIT))?;
    self.get_json(url).await
  }

  async fn pokemon_page(&self, limit: u32) -> Result<ApiResourcePage> {
    let url = self.endpoint(&format!("pokemon?limit={}", limit))?;
    self.get_json(url).await
  }
}
