//! Listing/filtering engine: builds a queryable view of local storage,
//! backfilling from the remote source where the filter demands it.

use tracing::warn;

use crate::error::{DexError, Result};
use crate::pokeapi::RemoteApi;
use crate::store::StoreFilter;

use super::types::{Identifier, ListFilter, ListOutcome, ListRequest, Listing};
use super::Dex;

/// Fixed page size of the local queryset.
const PAGE_SIZE: usize = 20;

/// Below this many local records the unfiltered view seeds itself with one
/// remote summary page.
const SEED_THRESHOLD: usize = 20;
const SEED_PAGE_LIMIT: u32 = 20;

impl<R: RemoteApi> Dex<R> {
  /// Produce one page of locally stored records for the request, plus the
  /// full type/ability lookup lists.
  ///
  /// Exactly one filter mode is honored per request (name query, then
  /// type, then ability). A successful name query short-circuits into a
  /// redirect signal; every other remote failure degrades to whatever is
  /// stored locally, with a displayable notice.
  pub async fn list(&self, req: &ListRequest) -> Result<ListOutcome> {
    let mut notice: Option<String> = None;
    let filter = ListFilter::from_request(req);

    if let ListFilter::NameQuery(q) = &filter {
      match self.get_or_fetch(&Identifier::parse(q)).await {
        Ok(p) => return Ok(ListOutcome::Redirect { name: p.name }),
        Err(DexError::Storage(e)) => return Err(DexError::Storage(e)),
        Err(e) => {
          warn!(query = %q, error = %e, "name query did not resolve");
          notice = Some(format!(
            "Pokémon '{}' not found. Showing the unfiltered list.",
            q
          ));
        }
      }
    }

    let store_filter = match &filter {
      ListFilter::ByType(type_name) => {
        if let Err(e) = self.backfill_type(type_name).await {
          warn!(type_name, error = %e, "type backfill failed, using local records");
          notice = Some(format!(
            "Could not refresh type '{}' from the remote source ({}). Showing locally stored results.",
            type_name, e
          ));
        }
        StoreFilter::ByType(type_name.clone())
      }
      // No remote backfill on the ability path: results are only as
      // complete as what other paths have already resolved.
      ListFilter::ByAbility(ability) => StoreFilter::ByAbility(ability.clone()),
      ListFilter::NameQuery(_) | ListFilter::Unfiltered => {
        self.seed_if_sparse().await?;
        StoreFilter::All
      }
    };

    let types = self.type_lookup_list(&mut notice).await?;
    let abilities = self.ability_lookup_list(&mut notice).await?;

    let requested = req.page.as_deref().map(parse_page).unwrap_or(1);
    let probe = self.store.query_pokemon(&store_filter, requested, PAGE_SIZE)?;
    let total = probe.total;
    let total_pages = std::cmp::max(1, total.div_ceil(PAGE_SIZE));
    let (page, entries) = if requested > total_pages {
      // Out-of-range page clamps to the last page instead of erroring.
      let last = self.store.query_pokemon(&store_filter, total_pages, PAGE_SIZE)?;
      (total_pages, last.entries)
    } else {
      (requested, probe.entries)
    };

    Ok(ListOutcome::Page(Listing {
      entries,
      page,
      total_pages,
      total,
      types,
      abilities,
      notice,
    }))
  }

  /// Resolve every member of the remote per-type document so the local
  /// filter query is complete. Individual members that fail to resolve
  /// are skipped; a failure to fetch the document itself propagates so
  /// the caller can degrade.
  async fn backfill_type(&self, type_name: &str) -> Result<()> {
    let doc = self.remote.type_document(type_name).await?;
    for member in doc.pokemon {
      let name = member.pokemon.name.to_lowercase();
      if name.is_empty() {
        continue;
      }
      if let Err(e) = self.get_or_fetch(&Identifier::Name(name.clone())).await {
        warn!(%name, error = %e, "skipping type member that failed to resolve");
      }
    }
    Ok(())
  }

  /// Seed the unfiltered view with one remote summary page when local
  /// storage is sparse. Remote failure here is not fatal.
  async fn seed_if_sparse(&self) -> Result<()> {
    if self.store.pokemon_count()? >= SEED_THRESHOLD {
      return Ok(());
    }
    let page = match self.remote.pokemon_page(SEED_PAGE_LIMIT).await {
      Ok(page) => page,
      Err(e) => {
        warn!(error = %e, "could not seed the listing from the remote source");
        return Ok(());
      }
    };
    for summary in page.results {
      let name = summary.name.to_lowercase();
      if name.is_empty() {
        continue;
      }
      if let Err(e) = self.get_or_fetch(&Identifier::Name(name.clone())).await {
        warn!(%name, error = %e, "skipping summary entry that failed to resolve");
      }
    }
    Ok(())
  }

  /// Known type names, lazily seeded from the remote index the first time
  /// the local set is empty.
  async fn type_lookup_list(&self, notice: &mut Option<String>) -> Result<Vec<String>> {
    let names = self.store.type_names()?;
    if !names.is_empty() {
      return Ok(names);
    }
    match self.remote.type_index().await {
      Ok(page) => {
        for entry in page.results {
          if !entry.name.is_empty() {
            self.store.ensure_type(&entry.name)?;
          }
        }
        self.store.type_names()
      }
      Err(e) => {
        warn!(error = %e, "could not fetch the type index");
        if notice.is_none() {
          *notice = Some("Could not fetch Pokémon types for filtering.".into());
        }
        Ok(names)
      }
    }
  }

  async fn ability_lookup_list(&self, notice: &mut Option<String>) -> Result<Vec<String>> {
    let names = self.store.ability_names()?;
    if !names.is_empty() {
      return Ok(names);
    }
    match self.remote.ability_index().await {
      Ok(page) => {
        for entry in page.results {
          if !entry.name.is_empty() {
            self.store.ensure_ability(&entry.name)?;
          }
        }
        self.store.ability_names()
      }
      Err(e) => {
        warn!(error = %e, "could not fetch the ability index");
        if notice.is_none() {
          *notice = Some("Could not fetch Pokémon abilities for filtering.".into());
        }
        Ok(names)
      }
    }
  }
}

/// Parse a raw page parameter; anything non-numeric or below 1 clamps to
/// the first page.
fn parse_page(raw: &str) -> usize {
  raw
    .trim()
    .parse::<usize>()
    .ok()
    .filter(|p| *p >= 1)
    .unwrap_or(1)
}
