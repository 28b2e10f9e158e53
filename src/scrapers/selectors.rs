//! Selector descriptors and the per-site rule tables.
//!
//! Site knowledge is data: each [`SiteTemplate`] maps to ordered selector
//! lists, and every list ends in a shared generic fallback. Order matters.
//! Precise site rules come first because the generic rules (whole-page
//! containers, any anchor under a heading) produce noisier matches.

use itertools::Itertools;
use url::Url;

/// Minimum number of characters (exclusive) a body must have to count as found.
pub const LENGTH_GATE: usize = 100;

/// Minimum number of characters (exclusive) for a title or listing headline.
pub const MIN_TITLE_CHARS: usize = 5;

/// Anchors looked at per selector on a listing page.
pub const HARVEST_PER_SELECTOR: usize = 20;

/// Maximum candidates accepted from one listing page.
pub const MAX_CANDIDATES: usize = 15;

/// Title used when no title selector yields usable text.
pub const TITLE_PLACEHOLDER: &str = "제목을 찾을 수 없습니다.";

/// One extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(&'static str),
    XPath(&'static str),
}

impl Selector {
    /// Classify a raw rule string; anything starting with `//` is XPath.
    pub fn parse(raw: &'static str) -> Self {
        if raw.starts_with("//") {
            Selector::XPath(raw)
        } else {
            Selector::Css(raw)
        }
    }

    pub fn expr(&self) -> &'static str {
        match self {
            Selector::Css(expr) | Selector::XPath(expr) => expr,
        }
    }
}

/// The news sites with hand-tuned selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteTemplate {
    Yonhap,
    ZdNet,
    HankookIlbo,
    Chosun,
    JoongAng,
}

impl SiteTemplate {
    pub const ALL: [SiteTemplate; 5] = [
        SiteTemplate::Yonhap,
        SiteTemplate::ZdNet,
        SiteTemplate::HankookIlbo,
        SiteTemplate::Chosun,
        SiteTemplate::JoongAng,
    ];

    /// Registry name of the source this template belongs to.
    pub fn source_name(self) -> &'static str {
        match self {
            SiteTemplate::Yonhap => "연합뉴스",
            SiteTemplate::ZdNet => "ZDNet",
            SiteTemplate::HankookIlbo => "한국일보",
            SiteTemplate::Chosun => "조선일보",
            SiteTemplate::JoongAng => "중앙일보",
        }
    }

    fn domain(self) -> &'static str {
        match self {
            SiteTemplate::Yonhap => "yna.co.kr",
            SiteTemplate::ZdNet => "zdnet.co.kr",
            SiteTemplate::HankookIlbo => "hankookilbo.com",
            SiteTemplate::Chosun => "chosun.com",
            SiteTemplate::JoongAng => "joongang.co.kr",
        }
    }

    /// Template for a registry source name, if it is one of the known five.
    pub fn from_source_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.source_name() == name.trim())
    }

    /// Template whose domain (or a subdomain of it) hosts `url`.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| {
            let domain = t.domain();
            host == domain || host.ends_with(&format!(".{domain}"))
        })
    }

    fn content_rules(self) -> &'static [&'static str] {
        match self {
            SiteTemplate::HankookIlbo => &[
                ".news-content",
                ".article-content",
                ".content",
                "article .text",
                ".news-text",
                ".article-text",
            ],
            SiteTemplate::Yonhap => &[
                ".news-con",
                ".article-content",
                ".content",
                "article .text",
                ".news-text",
                ".article-text",
            ],
            SiteTemplate::ZdNet => &[
                ".newsPost .content",
                ".article-content",
                ".content",
                "article .text",
                ".news-text",
                ".article-text",
            ],
            SiteTemplate::Chosun | SiteTemplate::JoongAng => &[
                ".story-content",
                ".article-content",
                ".content",
                "article .text",
                ".news-text",
                ".article-text",
            ],
        }
    }

    fn listing_rules(self) -> &'static [&'static str] {
        match self {
            SiteTemplate::Yonhap => &["//ul/li//strong/a", "//ul/li//a", ".news-con a", "article a"],
            SiteTemplate::ZdNet => &[".newsPost a", ".newsPost h3 a", "article a"],
            SiteTemplate::HankookIlbo => &[".news-item a", "article a", ".list-item a"],
            SiteTemplate::Chosun | SiteTemplate::JoongAng => {
                &[".story-item a", "article a", ".list-item a"]
            }
        }
    }
}

const GENERIC_CONTENT_RULES: &[&str] = &[
    "article",
    ".article-content",
    ".news-content",
    ".content",
    ".story-content",
    ".post-content",
    ".entry-content",
    "[class*=\"article\"]",
    "[class*=\"content\"]",
    "[class*=\"story\"]",
    "main",
    ".main-content",
    ".text-content",
];

/// Anchor patterns for the static listing tier, after any site rules.
const STATIC_LISTING_RULES: &[&str] = &[
    "a[href*=\"/News/\"]",
    "a[href*=\"/news/\"]",
    "a[href*=\"/article/\"]",
    "a[href*=\"/story/\"]",
    "a[href*=\"/view/\"]",
    "a[href*=\"/read/\"]",
    ".news-item a",
    ".article-item a",
    "article a",
    ".list-item a",
    ".item a",
    "[class*=\"news\"] a",
    "[class*=\"article\"] a",
    "[class*=\"story\"] a",
    "h1 a",
    "h2 a",
    "h3 a",
    "h4 a",
];

/// Anchor patterns for the dynamic listing tier on sites without a template.
const DYNAMIC_LISTING_RULES: &[&str] = &[
    "a[href*=\"/News/\"]",
    "a[href*=\"/news/\"]",
    "a[href*=\"/article/\"]",
    ".news-item a",
    ".article-item a",
    "article a",
    ".list-item a",
    ".item a",
    "[class*=\"news\"] a",
];

const TITLE_RULES: &[&str] = &[
    "h1",
    ".title",
    ".headline",
    ".article-title",
    ".news-title",
    "title",
    ".post-title",
    ".entry-title",
];

/// Nested elements searched for a headline when a static anchor has no text.
pub const STATIC_NESTED_TITLE: &str = "h1, h2, h3, h4, span, div, strong";

/// Nested tags tried, in order, when a rendered anchor has no text.
pub const DYNAMIC_NESTED_TITLE: &[&str] = &["h3", "strong"];

fn parse_all<'a>(raw: impl IntoIterator<Item = &'a &'static str>) -> Vec<Selector> {
    raw.into_iter().map(|r| Selector::parse(*r)).unique().collect()
}

/// Body-text rules: the site's own rules (if any) followed by the generic list.
pub fn content_rules(template: Option<SiteTemplate>) -> Vec<Selector> {
    let site = template.map(SiteTemplate::content_rules).unwrap_or(&[]);
    parse_all(site.iter().chain(GENERIC_CONTENT_RULES))
}

/// Anchor rules for the static tier: site CSS rules, then the shared list.
///
/// XPath entries of a site list are kept; the static tier skips them.
pub fn static_listing_rules(template: Option<SiteTemplate>) -> Vec<Selector> {
    let site = template.map(SiteTemplate::listing_rules).unwrap_or(&[]);
    parse_all(site.iter().chain(STATIC_LISTING_RULES))
}

/// Anchor rules for the dynamic tier: the site list, or the generic list.
pub fn dynamic_listing_rules(template: Option<SiteTemplate>) -> Vec<Selector> {
    match template {
        Some(t) => parse_all(t.listing_rules()),
        None => parse_all(DYNAMIC_LISTING_RULES),
    }
}

pub fn title_rules() -> Vec<Selector> {
    parse_all(TITLE_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(Selector::parse("//ul/li//a"), Selector::XPath("//ul/li//a"));
        assert_eq!(Selector::parse(".story-item a"), Selector::Css(".story-item a"));
        assert_eq!(Selector::parse("//ul/li//a").expr(), "//ul/li//a");
    }

    #[test]
    fn test_template_from_source_name() {
        assert_eq!(SiteTemplate::from_source_name("조선일보"), Some(SiteTemplate::Chosun));
        assert_eq!(SiteTemplate::from_source_name(" ZDNet "), Some(SiteTemplate::ZdNet));
        assert_eq!(SiteTemplate::from_source_name("경향신문"), None);
    }

    #[test]
    fn test_template_from_url() {
        assert_eq!(
            SiteTemplate::from_url("https://www.yna.co.kr/view/AKR2025"),
            Some(SiteTemplate::Yonhap)
        );
        assert_eq!(
            SiteTemplate::from_url("https://zdnet.co.kr/view/?no=1"),
            Some(SiteTemplate::ZdNet)
        );
        assert_eq!(SiteTemplate::from_url("https://notchosun.com/a"), None);
        assert_eq!(SiteTemplate::from_url("not a url"), None);
    }

    #[test]
    fn test_content_rules_site_first_then_generic() {
        let rules = content_rules(Some(SiteTemplate::Chosun));
        assert_eq!(rules[0], Selector::Css(".story-content"));
        assert_eq!(rules.last(), Some(&Selector::Css(".text-content")));
        // duplicates shared with the generic list keep their first position
        let count = rules
            .iter()
            .filter(|s| **s == Selector::Css(".article-content"))
            .count();
        assert_eq!(count, 1);
        assert_eq!(rules[1], Selector::Css(".article-content"));

        let generic = content_rules(None);
        assert_eq!(generic[0], Selector::Css("article"));
        assert_eq!(generic.len(), GENERIC_CONTENT_RULES.len());
    }

    #[test]
    fn test_dynamic_listing_rules_mix_xpath_and_css() {
        let rules = dynamic_listing_rules(Some(SiteTemplate::Yonhap));
        assert_eq!(
            rules,
            vec![
                Selector::XPath("//ul/li//strong/a"),
                Selector::XPath("//ul/li//a"),
                Selector::Css(".news-con a"),
                Selector::Css("article a"),
            ]
        );
        assert_eq!(dynamic_listing_rules(None).len(), 9);
    }

    #[test]
    fn test_static_listing_rules_order() {
        let rules = static_listing_rules(Some(SiteTemplate::Chosun));
        assert_eq!(rules[0], Selector::Css(".story-item a"));
        assert!(rules.contains(&Selector::Css("h4 a")));
        assert_eq!(static_listing_rules(None)[0], Selector::Css("a[href*=\"/News/\"]"));
    }

    #[test]
    fn test_title_rules() {
        let rules = title_rules();
        assert_eq!(rules.first(), Some(&Selector::Css("h1")));
        assert!(rules.contains(&Selector::Css("title")));
    }
}
