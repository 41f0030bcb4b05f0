//! Static record source and workspace settings for Gongmo.
//!
//! Listings, employees and overview figures ship as JSON fixtures embedded at
//! compile time; `gongmo.yaml` may point at on-disk replacements.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gongmo_core::{Employee, Listing, Overview, ALL_CATEGORIES};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CRATE_NAME: &str = "gongmo-catalog";

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const SETTINGS_FILE: &str = "gongmo.yaml";

const EMBEDDED_LISTINGS: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/listings.json"));
const EMBEDDED_EMPLOYEES: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/employees.json"));
const EMBEDDED_OVERVIEW: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/overview.json"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("parsing settings {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("duplicate listing id {0}")]
    DuplicateId(u32),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Mock-latency knobs for the assistant screens, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssistSettings {
    pub reply_delay_ms: u64,
    pub proposal_delay_ms: u64,
    pub refresh_delay_ms: u64,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1500,
            proposal_delay_ms: 2000,
            refresh_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub page_size: usize,
    /// Category options offered by the list filter, sentinel first.
    pub categories: Vec<String>,
    pub listings_path: Option<PathBuf>,
    pub employees_path: Option<PathBuf>,
    pub assist: AssistSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            categories: default_categories(),
            listings_path: None,
            employees_path: None,
            assist: AssistSettings::default(),
        }
    }
}

pub fn default_categories() -> Vec<String> {
    [
        ALL_CATEGORIES,
        "창업지원",
        "디지털전환",
        "AI/ICT",
        "소상공인",
        "투자연계",
        "청년창업",
        "글로벌",
    ]
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

impl Settings {
    /// Loads settings for a workspace. `GONGMO_CONFIG` overrides the default
    /// `<root>/gongmo.yaml`; a missing default file yields [`Settings::default`].
    pub fn load(workspace_root: &Path) -> Result<Self, CatalogError> {
        if let Ok(explicit) = std::env::var("GONGMO_CONFIG") {
            return Self::from_path(Path::new(&explicit));
        }
        let path = workspace_root.join(SETTINGS_FILE);
        if !path.exists() {
            info!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        Self::parse(text, "<inline>")
    }

    fn parse(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let settings: Settings = serde_yaml::from_str(text).map_err(|source| CatalogError::Yaml {
            origin: origin.to_string(),
            source,
        })?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, CatalogError> {
        if self.page_size == 0 {
            return Err(CatalogError::InvalidSettings("page_size must be at least 1".into()));
        }
        if self.categories.first().map(String::as_str) != Some(ALL_CATEGORIES) {
            return Err(CatalogError::InvalidSettings(format!(
                "categories must start with the \"{ALL_CATEGORIES}\" sentinel"
            )));
        }
        Ok(self)
    }
}

/// The immutable record set the dashboard serves for the process lifetime.
#[derive(Debug, Clone)]
pub struct Catalog {
    listings: Vec<Listing>,
    employees: Vec<Employee>,
    overview: Overview,
}

impl Catalog {
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_parts(
            parse_json(EMBEDDED_LISTINGS, "embedded listings.json")?,
            parse_json(EMBEDDED_EMPLOYEES, "embedded employees.json")?,
            parse_json(EMBEDDED_OVERVIEW, "embedded overview.json")?,
        )
    }

    /// Builds the catalog from the embedded fixtures, swapping in any override
    /// files named by `settings` (relative paths resolve against `workspace_root`).
    pub fn load(settings: &Settings, workspace_root: &Path) -> Result<Self, CatalogError> {
        let listings = match &settings.listings_path {
            Some(path) => read_json_file(&workspace_root.join(path))?,
            None => parse_json(EMBEDDED_LISTINGS, "embedded listings.json")?,
        };
        let employees = match &settings.employees_path {
            Some(path) => read_json_file(&workspace_root.join(path))?,
            None => parse_json(EMBEDDED_EMPLOYEES, "embedded employees.json")?,
        };
        let overview = parse_json(EMBEDDED_OVERVIEW, "embedded overview.json")?;
        Self::from_parts(listings, employees, overview)
    }

    pub fn from_parts(
        listings: Vec<Listing>,
        employees: Vec<Employee>,
        overview: Overview,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(listings.len());
        for listing in &listings {
            if !seen.insert(listing.id) {
                return Err(CatalogError::DuplicateId(listing.id));
            }
            for (name, value) in [
                ("start_date", &listing.start_date),
                ("deadline", &listing.deadline),
                ("info_collected_at", &listing.info_collected_at),
            ] {
                if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                    warn!(id = listing.id, field = name, value = %value, "non-ISO date; ordering falls back to plain string order");
                }
            }
        }
        debug!(listings = listings.len(), employees = employees.len(), "catalog loaded");
        Ok(Self {
            listings,
            employees,
            overview,
        })
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn listing(&self, id: u32) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }
}

fn parse_json<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T, CatalogError> {
    serde_json::from_str(text).map_err(|source| CatalogError::Json {
        origin: origin.to_string(),
        source,
    })
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&text, &path.display().to_string())
}
