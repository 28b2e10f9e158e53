//! Acceptance rules shared by both tiers.
//!
//! The tiers differ only in how they evaluate a selector (parsed markup vs.
//! live DOM). Deciding whether a block counts as article content, whether a
//! headline is usable, and which links make it into a listing happens here so
//! the two tiers cannot drift apart.

use super::normalize::normalize;
use super::selectors::{LENGTH_GATE, MAX_CANDIDATES, MIN_TITLE_CHARS};
use crate::models::{ListingCandidate, Source};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Normalize a candidate block and accept it if it clears the length gate.
pub fn accept_body(raw: &str) -> Option<String> {
    let text = normalize(raw);
    (text.chars().count() > LENGTH_GATE).then_some(text)
}

/// First block, in the given order, that clears the length gate.
pub fn first_accepted<I>(blocks: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    blocks.into_iter().find_map(|b| accept_body(b.as_ref()))
}

/// Collapse whitespace in a headline and accept it if long enough.
pub fn accept_title(raw: &str) -> Option<String> {
    let title = raw.split_whitespace().join(" ");
    (title.chars().count() > MIN_TITLE_CHARS).then_some(title)
}

/// Collects listing candidates for one scrape pass of one source.
///
/// Enforces the listing invariants: URLs resolved against the source's base
/// URL, unique by exact URL, titles longer than five characters, and at most
/// [`MAX_CANDIDATES`] entries.
#[derive(Debug)]
pub struct LinkHarvest {
    base: Option<Url>,
    category: String,
    source_name: String,
    seen: HashSet<String>,
    candidates: Vec<ListingCandidate>,
}

impl LinkHarvest {
    pub fn new(source: &Source) -> Self {
        let base = Url::parse(&source.base_url)
            .or_else(|_| Url::parse(&source.listing_url))
            .ok();
        Self {
            base,
            category: source.category.clone(),
            source_name: source.name.clone(),
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    /// Resolve `href` to an absolute http(s) URL.
    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let url = match &self.base {
            Some(base) => base.join(href).ok()?,
            None => Url::parse(href).ok()?,
        };
        matches!(url.scheme(), "http" | "https").then(|| url.to_string())
    }

    /// Offer one anchor. `title` is the anchor text, `nested` the fallback
    /// headline found inside the anchor when its own text is empty.
    ///
    /// The URL is marked as seen even if the title is rejected, so a later
    /// duplicate anchor with better text is still skipped.
    pub fn offer(&mut self, href: &str, title: &str, nested: Option<&str>) {
        if self.is_full() {
            return;
        }
        let Some(url) = self.resolve(href) else {
            return;
        };
        if !self.seen.insert(url.clone()) {
            return;
        }

        let title = if title.trim().is_empty() {
            nested.unwrap_or_default()
        } else {
            title
        };
        let Some(title) = accept_title(title) else {
            debug!(%url, "Skipping anchor with short title");
            return;
        };

        self.candidates.push(ListingCandidate {
            title,
            url,
            category: self.category.clone(),
            source_name: self.source_name.clone(),
        });
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= MAX_CANDIDATES
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn into_candidates(self) -> Vec<ListingCandidate> {
        self.candidates
    }
}
