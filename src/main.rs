//! Startup runner: loads settings, inserts a facts file and runs every query
//! of a query file, printing each result as JSON.
//!
//! ```text
//! arbor [settings-file]
//! ```
//! The settings file defaults to `arbor.toml` and may be absent, in which
//! case `ARBOR_FACTS_FILE`, `ARBOR_QUERY_FILE` and friends are used.
use std::fs;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arbor::construct::Database;
use arbor::query::Query;
use arbor::settings::{DEFAULT_SETTINGS_FILE, Settings};

const COMMENT: char = '#';

fn main() -> arbor::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_owned());
    let settings = Settings::load(&path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(settings = %path, "starting");

    let mut database = Database::new();
    if let Some(facts_file) = &settings.facts_file {
        let facts = fs::read_to_string(facts_file)?;
        let mut inserted = 0;
        for sentence in facts.lines().map(str::trim) {
            if sentence.is_empty() || sentence.starts_with(COMMENT) {
                continue;
            }
            match database.insert(sentence) {
                Ok(()) => inserted += 1,
                Err(e) => warn!(%sentence, error = %e, "sentence not inserted"),
            }
        }
        info!(file = %facts_file, inserted, nodes = database.tree().len(), "facts loaded");
    }
    if let Some(query_file) = &settings.query_file {
        let text = fs::read_to_string(query_file)?;
        for query in queries(&text) {
            match query.run(&mut database) {
                Ok(result) => {
                    let json = if settings.pretty {
                        serde_json::to_string_pretty(&result)?
                    } else {
                        serde_json::to_string(&result)?
                    };
                    println!("{}", json);
                }
                Err(e) => warn!(clauses = ?query.clauses(), error = %e, "query failed to run"),
            }
        }
    }
    Ok(())
}

// blank lines separate queries, comment lines are ignored
fn queries(text: &str) -> Vec<Query> {
    let mut queries = Vec::new();
    let mut query = Query::new();
    for line in text.lines().map(str::trim) {
        if line.starts_with(COMMENT) {
            continue;
        }
        if line.is_empty() {
            if !query.clauses().is_empty() {
                queries.push(std::mem::take(&mut query));
            }
            continue;
        }
        query = query.clause(line);
    }
    if !query.clauses().is_empty() {
        queries.push(query);
    }
    queries
}
