use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

/// Works are only searched from this date forward.
const FROM_DATE_FILTER: &str = "from_publication_date:2023-01-01";
const SORT: &str = "publication_date:desc";

/// Single-page result cap for the works search.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Synchronous OpenAlex client.
///
/// One agent for the whole run; the base URL is injectable so the tests can
/// point it at a local stub server.
pub struct Client {
    agent: ureq::Agent,
    base: Url,
    mailto: String,
}

/// The two supported works-search constructions.
pub enum WorksQuery {
    Keyword { search: String },
    /// Author ids are OR-ed together (pipe-joined in the filter expression).
    Authors { ids: Vec<String> },
}

impl Client {
    pub fn new(base: &str, mailto: &str) -> anyhow::Result<Self> {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_global(Some(Duration::from_secs(30)))
            .build();
        Ok(Client {
            agent: ureq::Agent::new_with_config(cfg),
            base: Url::parse(base).with_context(|| format!("invalid API base URL: {base}"))?,
            mailto: mailto.to_string(),
        })
    }

    /// Run one works search and return its single page of results.
    ///
    /// A non-success HTTP status or transport failure is an error; callers
    /// get no partial results and there is no retry.
    pub fn works(&self, query: &WorksQuery, max_results: usize) -> anyhow::Result<Vec<Work>> {
        let url = self.works_url(query, max_results)?;
        println!("Query URL: {url}");
        let body: String = self
            .agent
            .get(url.as_str())
            .call()
            .with_context(|| format!("works search failed: {url}"))?
            .into_body()
            .read_to_string()
            .context("failed to read works search response body")?;
        let page: WorksPage =
            serde_json::from_str(&body).context("malformed works search response")?;
        Ok(page.results)
    }

    fn works_url(&self, query: &WorksQuery, max_results: usize) -> anyhow::Result<Url> {
        let mut url = self.base.join("works")?;
        {
            let mut params = url.query_pairs_mut();
            match query {
                WorksQuery::Keyword { search } => {
                    params.append_pair("search", search);
                    params.append_pair("filter", FROM_DATE_FILTER);
                }
                WorksQuery::Authors { ids } => {
                    params.append_pair(
                        "filter",
                        &format!("{FROM_DATE_FILTER},author.id:{}", ids.join("|")),
                    );
                }
            }
            params.append_pair("sort", SORT);
            params.append_pair("per_page", &max_results.to_string());
            params.append_pair("mailto", &self.mailto);
        }
        Ok(url)
    }

    /// Look up one source record and return its 2-year mean citedness,
    /// defaulting to 0.0 when the API carries no summary stats for it.
    pub fn source_impact(&self, journal_id: &str) -> anyhow::Result<f64> {
        let mut url = self.base.join(&format!("sources/{journal_id}"))?;
        url.query_pairs_mut().append_pair("mailto", &self.mailto);
        let body: String = self
            .agent
            .get(url.as_str())
            .call()
            .with_context(|| format!("source lookup failed for {journal_id}"))?
            .into_body()
            .read_to_string()
            .context("failed to read source lookup response body")?;
        let record: SourceRecord =
            serde_json::from_str(&body).context("malformed source lookup response")?;
        Ok(record.summary_stats.two_yr_mean_citedness)
    }
}

#[derive(Debug, Deserialize)]
struct WorksPage {
    results: Vec<Work>,
}

/// One work record, narrowed to the fields the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Work {
    pub title: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub publication_date: Option<String>,
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    pub primary_location: Option<PrimaryLocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Authorship {
    #[serde(default)]
    pub author: Author,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimaryLocation {
    pub source: Option<SourceRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRef {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceRecord {
    #[serde(default)]
    summary_stats: SummaryStats,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryStats {
    #[serde(rename = "2yr_mean_citedness", default)]
    two_yr_mean_citedness: f64,
}

impl Work {
    /// Journal id: the last path segment of the primary location's source URL
    /// (e.g. "https://openalex.org/S12345" -> "S12345").
    pub fn journal_id(&self) -> Option<&str> {
        let id = self
            .primary_location
            .as_ref()?
            .source
            .as_ref()?
            .id
            .as_deref()?;
        id.rsplit('/').next().filter(|segment| !segment.is_empty())
    }
}
