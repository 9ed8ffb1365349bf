//! Domain types returned by the core to the presentation layer.

use std::collections::BTreeMap;

/// A locally cached Pokémon record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
  /// Stable id assigned by the remote source.
  pub external_id: i64,
  /// Lowercase unique name, the primary user-facing lookup key.
  pub name: String,
  pub height: Option<i64>,
  pub weight: Option<i64>,
  pub sprite_url: Option<String>,
  /// Base stats by stat name. `None` or empty marks the record incomplete.
  pub stats: Option<BTreeMap<String, i64>>,
  /// Type names, lowercase, order-irrelevant.
  pub types: Vec<String>,
  /// Ability names, lowercase, order-irrelevant.
  pub abilities: Vec<String>,
}

impl Pokemon {
  /// A record is complete iff its stats mapping is present and non-empty.
  /// Incomplete records are treated as cache misses by the resolver.
  pub fn is_complete(&self) -> bool {
    self.stats.as_ref().is_some_and(|s| !s.is_empty())
  }

  pub fn display_name(&self) -> String {
    capitalize(&self.name)
  }

  pub fn stat(&self, name: &str) -> Option<i64> {
    self.stats.as_ref().and_then(|s| s.get(name).copied())
  }
}

/// Normalized fields of a freshly fetched detail payload, ready for upsert.
#[derive(Debug, Clone)]
pub struct PokemonRecord {
  pub external_id: i64,
  pub name: String,
  pub height: Option<i64>,
  pub weight: Option<i64>,
  pub sprite_url: Option<String>,
  pub stats: BTreeMap<String, i64>,
  pub types: Vec<String>,
  pub abilities: Vec<String>,
}

/// How the user identified an entity. The resolver upserts by the same
/// key kind it looked up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
  ExternalId(i64),
  Name(String),
}

impl Identifier {
  /// Normalize raw user input: numeric input becomes an external-id key,
  /// anything else a lowercased name key.
  pub fn parse(raw: &str) -> Self {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
      Ok(id) => Identifier::ExternalId(id),
      Err(_) => Identifier::Name(trimmed.to_lowercase()),
    }
  }

  /// Path segment for the remote detail endpoint.
  pub fn as_path_segment(&self) -> String {
    match self {
      Identifier::ExternalId(id) => id.to_string(),
      Identifier::Name(name) => name.clone(),
    }
  }
}

impl std::fmt::Display for Identifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Identifier::ExternalId(id) => write!(f, "#{}", id),
      Identifier::Name(name) => write!(f, "{}", name),
    }
  }
}

/// One node of a resolved evolution chain.
#[derive(Debug, Clone)]
pub struct EvolutionNode {
  pub pokemon: Pokemon,
  pub display_name: String,
  pub sprite_url: Option<String>,
  /// Key the presentation layer navigates with (lowercase name).
  pub detail_key: String,
  /// Ordered child stages; empty for a final form.
  pub evolves_to: Vec<EvolutionNode>,
}

/// Inbound listing request, as received from the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
  pub query: Option<String>,
  pub type_filter: Option<String>,
  pub ability_filter: Option<String>,
  /// Raw page parameter; non-numeric input clamps to the first page.
  pub page: Option<String>,
}

/// Exactly one filter mode wins per request: name query, then type,
/// then ability, then unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
  NameQuery(String),
  ByType(String),
  ByAbility(String),
  Unfiltered,
}

impl ListFilter {
  pub fn from_request(req: &ListRequest) -> Self {
    let non_empty = |s: &Option<String>| {
      s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
    };
    if let Some(q) = non_empty(&req.query) {
      ListFilter::NameQuery(q)
    } else if let Some(t) = non_empty(&req.type_filter) {
      ListFilter::ByType(t)
    } else if let Some(a) = non_empty(&req.ability_filter) {
      ListFilter::ByAbility(a)
    } else {
      ListFilter::Unfiltered
    }
  }
}

/// Listing result: either a redirect to a detail view (successful name
/// query) or a page of local records.
#[derive(Debug, Clone)]
pub enum ListOutcome {
  Redirect { name: String },
  Page(Listing),
}

#[derive(Debug, Clone)]
pub struct Listing {
  pub entries: Vec<Pokemon>,
  pub page: usize,
  pub total_pages: usize,
  pub total: usize,
  /// Full lookup list of known type names.
  pub types: Vec<String>,
  /// Full lookup list of known ability names.
  pub abilities: Vec<String>,
  /// Displayable not-found / degraded-mode message, if any.
  pub notice: Option<String>,
}

/// Per-stat head-to-head outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  LeftWins,
  RightWins,
  Tie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatMatchup {
  pub left: i64,
  pub right: i64,
  pub outcome: Outcome,
}

/// Full comparison result; `stats` iterates in sorted stat-name order.
#[derive(Debug, Clone)]
pub struct Comparison {
  pub left: Pokemon,
  pub right: Pokemon,
  pub stats: BTreeMap<String, StatMatchup>,
}

/// Capitalize the first character for display ("bulbasaur" -> "Bulbasaur").
pub fn capitalize(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_identifier_parse_numeric() {
    assert_eq!(Identifier::parse("25"), Identifier::ExternalId(25));
    assert_eq!(Identifier::parse(" 7 "), Identifier::ExternalId(7));
  }

  #[test]
  fn test_identifier_parse_name_lowercases() {
    assert_eq!(
      Identifier::parse(" Bulbasaur "),
      Identifier::Name("bulbasaur".into())
    );
  }

  #[test]
  fn test_completeness_gate() {
    let mut p = Pokemon {
      external_id: 1,
      name: "bulbasaur".into(),
      height: Some(7),
      weight: Some(69),
      sprite_url: None,
      stats: None,
      types: vec![],
      abilities: vec![],
    };
    assert!(!p.is_complete());
    p.stats = Some(BTreeMap::new());
    assert!(!p.is_complete());
    p.stats = Some(BTreeMap::from([("hp".to_string(), 45)]));
    assert!(p.is_complete());
  }

  #[test]
  fn test_filter_priority() {
    let req = ListRequest {
      query: Some("Pikachu".into()),
      type_filter: Some("grass".into()),
      ability_filter: Some("overgrow".into()),
      page: None,
    };
    assert_eq!(
      ListFilter::from_request(&req),
      ListFilter::NameQuery("pikachu".into())
    );

    let req = ListRequest {
      query: Some("  ".into()),
      type_filter: Some("Grass".into()),
      ability_filter: Some("overgrow".into()),
      page: None,
    };
    assert_eq!(
      ListFilter::from_request(&req),
      ListFilter::ByType("grass".into())
    );

    let req = ListRequest {
      ability_filter: Some("overgrow".into()),
      ..Default::default()
    };
    assert_eq!(
      ListFilter::from_request(&req),
      ListFilter::ByAbility("overgrow".into())
    );

    assert_eq!(
      ListFilter::from_request(&ListRequest::default()),
      ListFilter::Unfiltered
    );
  }

  #[test]
  fn test_capitalize() {
    assert_eq!(capitalize("bulbasaur"), "Bulbasaur");
    assert_eq!(capitalize(""), "");
  }
}
