use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tqdm::Iter;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AuthorCountryRecord, CountryCodeTable};
use crate::common::{deserialize_verbose, short_oa_id, AUTHORS, MAX_PER_PAGE, WORKS};
use crate::config::{CountryConfig, QueryConfig};
use crate::error::Result;
use crate::oa_structs::{GroupByResponse, Work, WorksPage};

const START_CURSOR: &str = "*";

pub trait PageFetch {
    fn fetch_page(&self, filter: &str, per_page: usize, cursor: &str) -> Result<WorksPage>;
}

pub trait CountryLookup {
    fn lookup_countries(&self, countries: &CountryConfig) -> Result<CountryCodeTable>;
}

pub struct OpenAlexClient {
    client: Client,
    api_base: String,
    mailto: Option<String>,
}

impl OpenAlexClient {
    pub fn new(api_base: &str, mailto: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("coauthor-net/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            mailto,
        })
    }

    pub fn from_config(query: &QueryConfig) -> Result<Self> {
        Self::new(&query.api_base, query.mailto.clone())
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        entity: &str,
        mut params: Vec<(&str, String)>,
        what: &str,
    ) -> Result<T> {
        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.clone()));
        }
        let url = format!("{}/{}", self.api_base, entity);
        debug!(%url, ?params, "GET");
        let body = self
            .client
            .get(&url)
            .query(&params)
            .send()?
            .error_for_status()?
            .text()?;
        deserialize_verbose(&body, what)
    }

    /// No retry: a failed lookup is logged and returned.
    pub fn country_codes(&self, countries: &CountryConfig) -> Result<CountryCodeTable> {
        let params = vec![
            ("filter", countries.flag_filter.clone()),
            ("group-by", countries.group_by.clone()),
        ];
        match self.get_json::<GroupByResponse>(AUTHORS, params, "group-by response") {
            Ok(resp) => {
                let table = CountryCodeTable::from_group_by(resp);
                info!(countries = table.len(), "loaded country codes");
                Ok(table)
            }
            Err(err) => {
                warn!(%err, "country-code lookup failed");
                Err(err)
            }
        }
    }
}

impl CountryLookup for OpenAlexClient {
    fn lookup_countries(&self, countries: &CountryConfig) -> Result<CountryCodeTable> {
        self.country_codes(countries)
    }
}

impl PageFetch for OpenAlexClient {
    fn fetch_page(&self, filter: &str, per_page: usize, cursor: &str) -> Result<WorksPage> {
        let params = vec![
            ("filter", filter.to_string()),
            ("per-page", per_page.to_string()),
            ("cursor", cursor.to_string()),
        ];
        self.get_json(WORKS, params, "works page")
    }
}

pub fn source_filter(source_id: &str) -> String {
    format!("primary_location.source.id:{}", short_oa_id(source_id))
}

/// Pages of works, capped at `n_max` records. An error is yielded once and ends the run.
pub struct WorkPager<'a, F: PageFetch> {
    fetcher: &'a F,
    filter: String,
    per_page: usize,
    n_max: usize,
    cursor: Option<String>,
    yielded: usize,
}

impl<'a, F: PageFetch> WorkPager<'a, F> {
    pub fn new(fetcher: &'a F, filter: String, per_page: usize, n_max: usize) -> Self {
        Self {
            fetcher,
            filter,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            n_max,
            cursor: Some(START_CURSOR.to_string()),
            yielded: 0,
        }
    }
}

impl<'a, F: PageFetch> Iterator for WorkPager<'a, F> {
    type Item = Result<Vec<Work>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.n_max {
            return None;
        }
        let cursor = self.cursor.take()?;
        let page = match self.fetcher.fetch_page(&self.filter, self.per_page, &cursor) {
            Ok(page) => page,
            Err(err) => return Some(Err(err)),
        };
        let mut results = page.results;
        if results.is_empty() {
            return None;
        }
        results.truncate(self.n_max - self.yielded);
        self.yielded += results.len();
        self.cursor = page.meta.next_cursor;
        Some(Ok(results))
    }
}

pub fn filter_min_year<I>(works: I, min_year: u16) -> impl Iterator<Item = Work>
where
    I: IntoIterator<Item = Work>,
{
    works
        .into_iter()
        .filter(move |w| w.publication_year.map_or(false, |y| y >= min_year))
}

pub fn collect_works<F: PageFetch>(pager: WorkPager<'_, F>, min_year: u16) -> Result<Vec<Work>> {
    let mut all = Vec::new();
    for page in pager.tqdm().desc(Some(WORKS)) {
        all.extend(page?);
    }
    let fetched = all.len();
    let kept: Vec<Work> = filter_min_year(all, min_year).collect();
    info!(fetched, kept = kept.len(), min_year, "collected works");
    Ok(kept)
}

pub fn fetch_works<F: PageFetch>(client: &F, query: &QueryConfig) -> Result<Vec<Work>> {
    let filter = source_filter(&query.source_id);
    let pager = WorkPager::new(client, filter, query.per_page, query.n_max);
    collect_works(pager, query.min_year)
}

/// The country table is looked up before any page of works is requested.
pub fn gather_records<C>(
    client: &C,
    query: &QueryConfig,
    countries: &CountryConfig,
) -> Result<Vec<AuthorCountryRecord>>
where
    C: CountryLookup + PageFetch,
{
    let table = client.lookup_countries(countries)?;
    let works = fetch_works(client, query)?;
    let records = aggregate(works.iter(), &table);
    info!(records = records.len(), "aggregated author countries");
    Ok(records)
}
