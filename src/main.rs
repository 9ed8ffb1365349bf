mod config;
mod dex;
mod error;
mod pokeapi;
mod store;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dex::types::{Comparison, EvolutionNode, Identifier, ListOutcome, ListRequest, Outcome, Pokemon};
use dex::Dex;
use pokeapi::PokeApiClient;
use store::EntityStore;

#[derive(Parser, Debug)]
#[command(name = "rdex")]
#[command(about = "A local-first Pokédex over PokeAPI")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rdex/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show one Pokémon by name or number
  Show { identifier: String },
  /// Browse the local cache, filtering and backfilling as needed
  List {
    /// Name to search for (redirects to its detail on a hit)
    #[arg(short, long)]
    query: Option<String>,
    /// Filter by type name
    #[arg(short = 't', long = "type")]
    type_filter: Option<String>,
    /// Filter by ability name (local records only)
    #[arg(short = 'a', long = "ability")]
    ability_filter: Option<String>,
    /// Page number (clamps into range)
    #[arg(short, long)]
    page: Option<String>,
  },
  /// Show the evolution chain containing a Pokémon
  Evolution { identifier: String },
  /// Compare two Pokémon stat by stat
  Compare { left: String, right: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;

  let store = EntityStore::open(&config.database_path()?)?;
  let client = PokeApiClient::new(&config)?;
  let dex = Dex::new(store, client);

  match args.command {
    Command::Show { identifier } => {
      let ident = Identifier::parse(&identifier);
      let pokemon = dex.get_or_fetch(&ident).await?;
      print_pokemon(&pokemon);
      if let Some(synced) = dex.store().synced_at(&ident)? {
        println!("Last synced: {}", synced.format("%Y-%m-%d %H:%M UTC"));
      }
    }
    Command::List {
      query,
      type_filter,
      ability_filter,
      page,
    } => {
      let request = ListRequest {
        query,
        type_filter,
        ability_filter,
        page,
      };
      match dex.list(&request).await? {
        ListOutcome::Redirect { name } => {
          let pokemon = dex.get_or_fetch(&Identifier::Name(name)).await?;
          print_pokemon(&pokemon);
        }
        ListOutcome::Page(listing) => {
          if let Some(notice) = &listing.notice {
            eprintln!("{}", notice);
          }
          for p in &listing.entries {
            println!(
              "#{:<5} {:<14} {}",
              p.external_id,
              p.display_name(),
              p.types.join("/")
            );
          }
          println!(
            "Page {}/{} ({} total). Types known: {}. Abilities known: {}.",
            listing.page,
            listing.total_pages,
            listing.total,
            listing.types.len(),
            listing.abilities.len()
          );
        }
      }
    }
    Command::Evolution { identifier } => {
      let tree = dex.evolution_chain(&Identifier::parse(&identifier)).await?;
      print_tree(&tree, 0);
    }
    Command::Compare { left, right } => {
      let comparison = dex.compare(&left, &right).await?;
      print_comparison(&comparison);
    }
  }

  Ok(())
}

fn print_pokemon(p: &Pokemon) {
  println!("{} (#{})", p.display_name(), p.external_id);
  if let Some(height) = p.height {
    println!("Height: {} dm", height);
  }
  if let Some(weight) = p.weight {
    println!("Weight: {} hg", weight);
  }
  println!("Types: {}", p.types.join(", "));
  println!("Abilities: {}", p.abilities.join(", "));
  if let Some(stats) = &p.stats {
    for (name, value) in stats {
      println!("  {:<16} {}", name, value);
    }
  }
  if let Some(sprite) = &p.sprite_url {
    println!("Sprite: {}", sprite);
  }
}

fn print_tree(node: &EvolutionNode, depth: usize) {
  println!(
    "{}{} (#{})",
    "  ".repeat(depth),
    node.display_name,
    node.pokemon.external_id
  );
  for child in &node.evolves_to {
    print_tree(child, depth + 1);
  }
}

fn print_comparison(c: &Comparison) {
  println!(
    "{:<16} {:>8} {:>8}",
    "Stat",
    c.left.display_name(),
    c.right.display_name()
  );
  for (name, matchup) in &c.stats {
    println!(
      "{:<16} {:>8} {} {:>6}",
      name,
      matchup.left,
      outcome_marker(matchup.outcome),
      matchup.right
    );
  }
}

/// Marker placed between the left and right values, reading as the
/// inequality between them.
fn outcome_marker(outcome: Outcome) -> &'static str {
  match outcome {
    Outcome::LeftWins => ">",
    Outcome::RightWins => "<",
    Outcome::Tie => "=",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_outcome_marker_reads_as_inequality_between_sides() {
    // Left value prints first, so a left win must render as "45 > 35".
    assert_eq!(outcome_marker(Outcome::LeftWins), ">");
    assert_eq!(outcome_marker(Outcome::RightWins), "<");
    assert_eq!(outcome_marker(Outcome::Tie), "=");
  }
}
