use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Whether a scraped item is the post itself or one of its comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

/// One unit of scraped content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub kind: ItemKind,
    pub content: String,
    pub author: Option<String>,
}

impl ScrapedItem {
    #[must_use]
    pub fn post(content: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Post,
            content: content.into(),
            author: None,
        }
    }

    #[must_use]
    pub fn comment(content: impl Into<String>, author: Option<String>) -> Self {
        Self {
            kind: ItemKind::Comment,
            content: content.into(),
            author,
        }
    }
}

/// Bookkeeping the scrape service reports alongside a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeMetadata {
    pub total_comments: Option<u64>,
    pub scraped_at: Option<String>,
    pub comment_limit_reached: Option<bool>,
    pub clicks_to_expand: Option<u64>,
}

/// Everything scraped for one submitted URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPost {
    pub platform: Platform,
    pub post: ScrapedItem,
    pub image_alt: Option<String>,
    pub post_url: String,
    pub comments: Vec<ScrapedItem>,
    pub metadata: Option<ScrapeMetadata>,
}

/// Label returned by the sentiment service.
///
/// Matching is exact and case-sensitive; anything else is kept verbatim in
/// [`SentimentLabel::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for SentimentLabel {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Positive" => Self::Positive,
            "Negative" => Self::Negative,
            "Neutral" => Self::Neutral,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for SentimentLabel {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<SentimentLabel> for String {
    fn from(label: SentimentLabel) -> Self {
        match label {
            SentimentLabel::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-class confidences in `[0, 1]`. Independent values; they need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScores {
    #[must_use]
    pub fn max(&self) -> f64 {
        self.positive.max(self.negative).max(self.neutral)
    }
}

/// Sentiment of one scraped item as classified by the sentiment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub source: ScrapedItem,
    pub label: SentimentLabel,
    pub scores: SentimentScores,
}

impl SentimentResult {
    /// Confidence in the service's own label.
    ///
    /// For unrecognized labels this is the highest of the three scores.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self.label {
            SentimentLabel::Positive => self.scores.positive,
            SentimentLabel::Negative => self.scores.negative,
            SentimentLabel::Neutral => self.scores.neutral,
            SentimentLabel::Other(_) => self.scores.max(),
        }
    }
}

/// Ordered results of one analysis run: the post first (when analyzed),
/// then surviving comments in scrape order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<SentimentResult>);

impl ResultSet {
    #[must_use]
    pub fn new(results: Vec<SentimentResult>) -> Self {
        Self(results)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SentimentResult> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SentimentResult] {
        &self.0
    }

    /// The post-level result, if post analysis ran.
    #[must_use]
    pub fn post(&self) -> Option<&SentimentResult> {
        self.0.first().filter(|r| r.source.kind == ItemKind::Post)
    }

    pub fn comments(&self) -> impl Iterator<Item = &SentimentResult> {
        self.0.iter().filter(|r| r.source.kind == ItemKind::Comment)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SentimentResult;
    type IntoIter = std::slice::Iter<'a, SentimentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
