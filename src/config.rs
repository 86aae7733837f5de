use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::coauthor_graph::{Palette, SizePolicy};
use crate::common::API_BASE;
use crate::error::Result;
use crate::layout::LayoutParams;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub query: QueryConfig,
    pub countries: CountryConfig,
    pub graph: GraphConfig,
    pub layout: LayoutParams,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub api_base: String,
    pub source_id: String,
    pub min_year: u16,
    pub per_page: usize,
    pub n_max: usize,
    pub mailto: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            source_id: "S13479253".to_string(),
            min_year: 2013,
            per_page: 25,
            n_max: 100_000,
            mailto: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryConfig {
    pub flag_filter: String,
    pub group_by: String,
}

impl Default for CountryConfig {
    fn default() -> Self {
        Self {
            flag_filter: "last_known_institution.is_global_south:true".to_string(),
            group_by: "last_known_institution.country_code".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub size_policy: SizePolicy,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("coauthor-out"),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_toml(&fs::read_to_string(p)?),
            None => Ok(Self::default()),
        }
    }
}
