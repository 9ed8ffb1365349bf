//! Head-to-head stat comparison between two resolved entities.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DexError, Result};
use crate::pokeapi::RemoteApi;

use super::types::{Comparison, Identifier, Outcome, StatMatchup};
use super::Dex;

impl<R: RemoteApi> Dex<R> {
  /// Resolve both identifiers and compare their base stats.
  ///
  /// Identical raw identifiers are rejected before any resolution. If
  /// either side fails to resolve, the error names the side(s) that
  /// failed.
  pub async fn compare(&self, left_raw: &str, right_raw: &str) -> Result<Comparison> {
    if left_raw == right_raw {
      return Err(DexError::InvalidComparison);
    }

    let left = self.get_or_fetch(&Identifier::parse(left_raw)).await;
    let right = self.get_or_fetch(&Identifier::parse(right_raw)).await;

    match (left, right) {
      (Ok(left), Ok(right)) => {
        let stats = stat_matchups(left.stats.as_ref(), right.stats.as_ref());
        Ok(Comparison { left, right, stats })
      }
      (left, right) => Err(match (left, right) {
        (Err(_), Ok(_)) => DexError::NotFound(left_raw.trim().to_string()),
        (Ok(_), Err(_)) => DexError::NotFound(right_raw.trim().to_string()),
        _ => DexError::NeitherFound {
          left: left_raw.trim().to_string(),
          right: right_raw.trim().to_string(),
        },
      }),
    }
  }
}

/// Union of stat names on either side; a stat missing from one side counts
/// as 0. Ties require strict equality. The result iterates in sorted
/// stat-name order.
fn stat_matchups(
  left: Option<&BTreeMap<String, i64>>,
  right: Option<&BTreeMap<String, i64>>,
) -> BTreeMap<String, StatMatchup> {
  let names: BTreeSet<&String> = left
    .into_iter()
    .flat_map(|m| m.keys())
    .chain(right.into_iter().flat_map(|m| m.keys()))
    .collect();

  names
    .into_iter()
    .map(|name| {
      let l = left.and_then(|m| m.get(name).copied()).unwrap_or(0);
      let r = right.and_then(|m| m.get(name).copied()).unwrap_or(0);
      let outcome = match l.cmp(&r) {
        std::cmp::Ordering::Greater => Outcome::LeftWins,
        std::cmp::Ordering::Less => Outcome::RightWins,
        std::cmp::Ordering::Equal => Outcome::Tie,
      };
      (
        name.clone(),
        StatMatchup {
          left: l,
          right: r,
          outcome,
        },
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use crate::pokeapi::testing::{detail, FakeRemote};
  use crate::store::EntityStore;

  use super::*;

  fn dex_with_pair() -> Dex<FakeRemote> {
    let mut remote = FakeRemote::new();
    remote.add_pokemon(detail(
      1,
      "bulbasaur",
      &["grass"],
      &["overgrow"],
      &[("hp", 45), ("attack", 49), ("speed", 45)],
    ));
    remote.add_pokemon(detail(
      25,
      "pikachu",
      &["electric"],
      &["static"],
      &[("hp", 35), ("attack", 55), ("speed", 45)],
    ));
    Dex::new(EntityStore::open_in_memory().unwrap(), remote)
  }

  #[tokio::test]
  async fn test_self_compare_rejected_without_resolution() {
    let dex = dex_with_pair();
    let err = dex.compare("bulbasaur", "bulbasaur").await.unwrap_err();
    assert_eq!(err, DexError::InvalidComparison);
    assert!(dex.remote.calls().is_empty());
  }

  #[tokio::test]
  async fn test_compare_outcomes_per_stat() {
    let dex = dex_with_pair();
    let cmp = dex.compare("bulbasaur", "pikachu").await.unwrap();

    assert_eq!(cmp.left.name, "bulbasaur");
    assert_eq!(cmp.right.name, "pikachu");
    let hp = &cmp.stats["hp"];
    assert_eq!((hp.left, hp.right, hp.outcome), (45, 35, Outcome::LeftWins));
    assert_eq!(cmp.stats["attack"].outcome, Outcome::RightWins);
    assert_eq!(cmp.stats["speed"].outcome, Outcome::Tie);
    // Sorted stat-name order.
    let names: Vec<&str> = cmp.stats.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["attack", "hp", "speed"]);
  }

  #[tokio::test]
  async fn test_compare_is_symmetric_with_mirrored_outcomes() {
    let dex = dex_with_pair();
    let ab = dex.compare("bulbasaur", "pikachu").await.unwrap();
    let ba = dex.compare("pikachu", "bulbasaur").await.unwrap();

    for (name, matchup) in &ab.stats {
      let mirrored = &ba.stats[name];
      assert_eq!(matchup.left, mirrored.right);
      assert_eq!(matchup.right, mirrored.left);
      let expected = match matchup.outcome {
        Outcome::LeftWins => Outcome::RightWins,
        Outcome::RightWins => Outcome::LeftWins,
        Outcome::Tie => Outcome::Tie,
      };
      assert_eq!(mirrored.outcome, expected);
    }
  }

  #[test]
  fn test_missing_stat_counts_as_zero() {
    let stats = stat_matchups(
      Some(&BTreeMap::from([("hp".to_string(), 45)])),
      Some(&BTreeMap::from([("attack".to_string(), 55)])),
    );
    assert_eq!(
      stats["hp"],
      StatMatchup {
        left: 45,
        right: 0,
        outcome: Outcome::LeftWins
      }
    );
    assert_eq!(
      stats["attack"],
      StatMatchup {
        left: 0,
        right: 55,
        outcome: Outcome::RightWins
      }
    );
  }

  #[tokio::test]
  async fn test_failed_side_is_named() {
    let dex = dex_with_pair();
    let err = dex.compare("bulbasaur", "missingno").await.unwrap_err();
    match err {
      DexError::NotFound(who) => assert_eq!(who, "missingno"),
      other => panic!("unexpected error: {:?}", other),
    }

    let err = dex.compare("missingno", "glitchmon").await.unwrap_err();
    assert_eq!(
      err,
      DexError::NeitherFound {
        left: "missingno".into(),
        right: "glitchmon".into()
      }
    );
    assert_eq!(
      err.to_string(),
      "neither 'missingno' nor 'glitchmon' was found"
    );
  }
}
