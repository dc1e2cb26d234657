use std::fs;

use anyhow::{Context, anyhow};
use clap::Parser;
use owo_colors::OwoColorize;

use crate::{
    cli::Cli,
    impact::Scorer,
    openalex::{Client, DEFAULT_MAX_RESULTS, Work, WorksQuery},
};

mod cli;
mod feed;
mod impact;
mod openalex;
mod settings;

/// Sort key for works without a publication date; sorts them last in the
/// descending order used for feeds.
const MISSING_DATE: &str = "1900-01-01";

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = settings::load(&args.settings)?;
    fs::create_dir_all(&args.feeds_dir).with_context(|| {
        format!(
            "failed to create feeds directory {}",
            args.feeds_dir.display()
        )
    })?;

    let client = Client::new(&args.api_base, &config.email)?;
    // One scorer for the whole run: the journal cache spans all queries.
    let mut scorer = Scorer::new(&client);

    for (key, query) in &config.queries {
        let output_path = args.feeds_dir.join(format!("{}.xml", query.feed_name));

        let works_query = match query.kind.as_str() {
            "keyword" => {
                let search = query
                    .search
                    .clone()
                    .ok_or_else(|| anyhow!("query '{key}' is missing a search string"))?;
                WorksQuery::Keyword { search }
            }
            "authors" => {
                let authors = query
                    .authors
                    .as_deref()
                    .ok_or_else(|| anyhow!("query '{key}' is missing an authors list"))?;
                eprintln!("Tracking authors:");
                for author in authors {
                    eprintln!("  - {} ({})", author.name, author.id);
                }
                WorksQuery::Authors {
                    ids: authors.iter().map(|a| a.id.clone()).collect(),
                }
            }
            other => {
                eprintln!("Unknown query type: {other}, skipping.");
                continue;
            }
        };

        // A fetch failure aborts the whole run; queries are not isolated.
        let works = client.works(&works_query, DEFAULT_MAX_RESULTS)?;
        let mut kept: Vec<Work> = works
            .iter()
            .filter(|work| scorer.score(work) >= config.impact_threshold)
            .cloned()
            .collect();
        sort_by_date_desc(&mut kept);

        eprintln!(
            "[{}] Returned {} works, {} passed impact filter",
            query.feed_name,
            works.len(),
            kept.len()
        );
        feed::write_feed(&query.feed_name, &kept, &output_path)?;
        eprintln!("{} generated feed: {}", "✓".green(), output_path.display());
    }

    Ok(())
}

/// Newest first, by string comparison of the ISO dates.
fn sort_by_date_desc(works: &mut [Work]) {
    works.sort_by(|a, b| publication_date(b).cmp(publication_date(a)));
}

fn publication_date(work: &Work) -> &str {
    work.publication_date.as_deref().unwrap_or(MISSING_DATE)
}
