//! Core domain model for the Gongmo grant-listing dashboard.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "gongmo-core";

/// Sentinel category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "전체";

/// Crawl status of a listing. Display only; never consulted by filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Crawling,
    Completed,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "진행중",
            Self::Crawling => "수집중",
            Self::Completed => "완료",
        }
    }
}

/// One grant/funding opportunity. Dates are kept as the `YYYY-MM-DD` strings
/// the source delivers; ordering relies on their lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u32,
    pub source: String,
    pub status: ListingStatus,
    pub title: String,
    pub category: String,
    pub start_date: String,
    pub deadline: String,
    pub info_collected_at: String,
    /// `YYYY-MM-DD HH:MM`, display only.
    pub collected_at: String,
    pub amount: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Listing {
    pub fn date(&self, field: DateField) -> &str {
        match field {
            DateField::StartDate => &self.start_date,
            DateField::Deadline => &self.deadline,
            DateField::InfoCollectedAt => &self.info_collected_at,
        }
    }

    /// Two-letter badge derived from the part of `source` before the first `-`.
    pub fn source_badge(&self) -> String {
        let head = self.source.split('-').next().unwrap_or_default();
        head.chars().take(2).collect()
    }

    /// Lowercase class-safe key of `source`, e.g. `gov-kr` for `Gov.kr`.
    pub fn source_key(&self) -> String {
        self.source
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// Formats `collected_at` as `2026년 2월 5일 14시 35분`, falling back to the
    /// raw value when it does not parse.
    pub fn collected_at_display(&self) -> String {
        match NaiveDateTime::parse_from_str(&self.collected_at, "%Y-%m-%d %H:%M") {
            Ok(dt) => dt.format("%Y년 %-m월 %-d일 %-H시 %-M분").to_string(),
            Err(_) => self.collected_at.clone(),
        }
    }
}

/// Which listing date a date-range filter or a sort applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DateField {
    StartDate,
    Deadline,
    #[default]
    InfoCollectedAt,
}

impl DateField {
    pub const ALL: [DateField; 3] = [Self::InfoCollectedAt, Self::StartDate, Self::Deadline];

    pub fn as_param(self) -> &'static str {
        match self {
            Self::StartDate => "startDate",
            Self::Deadline => "deadline",
            Self::InfoCollectedAt => "infoCollectedAt",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_param() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StartDate => "모집 시작일",
            Self::Deadline => "모집 마감일",
            Self::InfoCollectedAt => "정보 수집일",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Ascending),
            "desc" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "오름차순",
            Self::Descending => "내림차순",
        }
    }
}

/// Open vs. closed partition of listings, relative to today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListTab {
    #[default]
    Recruiting,
    Closed,
}

impl ListTab {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Recruiting => "recruiting",
            Self::Closed => "closed",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "recruiting" => Some(Self::Recruiting),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recruiting => "모집중",
            Self::Closed => "모집마감",
        }
    }

    /// Whether a listing with `deadline` belongs to this tab on `today`.
    /// Both arguments are `YYYY-MM-DD` strings.
    pub fn admits(self, deadline: &str, today: &str) -> bool {
        match self {
            Self::Recruiting => deadline >= today,
            Self::Closed => deadline < today,
        }
    }
}

/// Category selection: either the [`ALL_CATEGORIES`] sentinel or one exact
/// category name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn from_label(label: &str) -> Self {
        if label.is_empty() || label == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Only(category) => category,
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn label(self) -> &'static str {
        match self {
            Self::Present => "출근",
            Self::Absent => "부재",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u32,
    pub name: String,
    pub department: String,
    pub position: String,
    pub presence: Presence,
    pub attendance: String,
}

/// Label/value card used on the dashboard and HR screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub sub: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePoint {
    pub day: String,
    pub rate: u8,
}

/// Static overview figures for the dashboard and HR screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Overview {
    pub summary_cards: Vec<StatCard>,
    pub hr_stats: Vec<StatCard>,
    pub attendance: Vec<AttendancePoint>,
}
