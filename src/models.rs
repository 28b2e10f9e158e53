//! Data models shared by the scrapers, the stores and the CLI.
//!
//! This module defines:
//! - [`Source`]: a registered (source name, category) listing page
//! - [`ListingCandidate`]: a (title, URL) pair surfaced from a listing page
//! - [`ExtractedContent`]: an article body accepted by the selector cascade
//! - [`PersistedArticle`]: a summarized article stored by URL
//!
//! Candidates and extracted content are transient: they live for one scrape
//! call and only reach the database once a caller turns them into a
//! [`PersistedArticle`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source name attached to placeholder listings.
pub const SAMPLE_SOURCE_NAME: &str = "샘플";

/// A registered news source for one category.
///
/// Uniquely identified by `(name, category)`. `listing_url` is always absolute;
/// `base_url` is the origin relative links on that page are resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub category: String,
    pub base_url: String,
    pub listing_url: String,
}

/// A tentative article link harvested from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCandidate {
    /// Link text, longer than five characters after trimming.
    pub title: String,
    /// Absolute article URL, unique within one scrape pass.
    pub url: String,
    pub category: String,
    pub source_name: String,
}

/// Which tier produced an [`ExtractedContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Plain HTTP GET parsed with `scraper`.
    Static,
    /// Headless browser render queried in the live DOM.
    Dynamic,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Static => f.write_str("static"),
            ExtractionMethod::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// An article body that passed the length gate, plus a best-effort title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    /// Normalized body text; always longer than the length gate.
    pub body: String,
    pub url: String,
    pub extraction_method: ExtractionMethod,
}

/// A summarized article as stored in the local database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedArticle {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub category: String,
    pub source_name: String,
    pub summary: String,
    pub content: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Fields required to insert a new [`PersistedArticle`].
#[derive(Debug, Clone)]
pub struct NewArticle<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub category: &'a str,
    pub source_name: &'a str,
    pub summary: &'a str,
    pub content: Option<&'a str>,
}

/// Placeholder listing shown when no source is registered or every tier failed.
///
/// Known categories ("정치", "경제") get fixed headlines; any other category gets
/// five `"{category} 관련 뉴스 N"` entries.
pub fn sample_listing(category: &str) -> Vec<ListingCandidate> {
    let titles: Vec<String> = match category {
        "정치" => [
            "국회 예산안 심의 진행 상황",
            "정치개혁 관련 논의 활발",
            "여야 간 정책 협의 지속",
            "지방선거 준비 본격화",
            "국정감사 결과 발표",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect(),
        "경제" => [
            "주식시장 변동성 증가",
            "부동산 시장 동향 분석",
            "기업 실적 발표 시즌",
            "환율 변동 영향 분석",
            "경제 지표 발표",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect(),
        other => (1..=5).map(|n| format!("{other} 관련 뉴스 {n}")).collect(),
    };

    titles
        .into_iter()
        .enumerate()
        .map(|(i, title)| ListingCandidate {
            title,
            url: format!("https://example.com/news/{}", i + 1),
            category: category.to_string(),
            source_name: SAMPLE_SOURCE_NAME.to_string(),
        })
        .collect()
}
