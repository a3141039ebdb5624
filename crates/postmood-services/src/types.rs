//! Wire types for the scrape, sentiment and insight services.

use postmood_core::{
    Distribution, ItemKind, ResultSet, ScrapeMetadata, ScrapedItem, SentimentLabel,
    SentimentScores,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scrape service
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ScrapeRequest<'a> {
    pub post_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeResponse {
    pub post: ScrapeResponsePost,
    #[serde(default)]
    pub comments: Vec<ScrapeResponseComment>,
    #[serde(default)]
    pub metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeResponsePost {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default, alias = "url")]
    pub post_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeResponseComment {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Sentiment service
// ---------------------------------------------------------------------------

/// The sentiment service names its input field `tweet` for every platform.
#[derive(Debug, Serialize)]
pub(crate) struct SentimentRequest<'a> {
    pub tweet: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentResponse {
    #[serde(rename = "Sentiment_Analysis")]
    pub sentiment_analysis: SentimentLabel,
    #[serde(default)]
    pub cleaned_tweet: Option<String>,
    #[serde(default)]
    pub predicted_probabilities: PredictedProbabilities,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictedProbabilities {
    #[serde(rename = "Positive", default)]
    pub positive: f64,
    #[serde(rename = "Negative", default)]
    pub negative: f64,
    #[serde(rename = "Neutral", default)]
    pub neutral: f64,
}

/// Classification of one text as returned by the sentiment service.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentPrediction {
    pub label: SentimentLabel,
    pub scores: SentimentScores,
    /// Text after the service's own preprocessing, when reported.
    pub cleaned_text: Option<String>,
}

impl From<SentimentResponse> for SentimentPrediction {
    fn from(response: SentimentResponse) -> Self {
        let p = response.predicted_probabilities;
        Self {
            label: response.sentiment_analysis,
            scores: SentimentScores {
                positive: p.positive,
                negative: p.negative,
                neutral: p.neutral,
            },
            cleaned_text: response.cleaned_tweet,
        }
    }
}

// ---------------------------------------------------------------------------
// Insight service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightComment {
    pub comment: String,
    pub sentiment: SentimentLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightPost {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentLabel>,
}

/// Body sent to the insight service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub distribution: Distribution,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<InsightComment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<InsightPost>,
}

impl InsightRequest {
    /// Builds the request from an analyzed result set.
    ///
    /// When the post was scraped but not analyzed, `scraped_post` still
    /// contributes its text without a label.
    #[must_use]
    pub fn from_results(
        distribution: Distribution,
        results: &ResultSet,
        scraped_post: Option<&ScrapedItem>,
    ) -> Self {
        let comments = results
            .comments()
            .map(|r| InsightComment {
                comment: r.source.content.clone(),
                sentiment: r.label.clone(),
                author: r.source.author.clone(),
            })
            .collect();

        let post = match results.post() {
            Some(r) => Some(InsightPost {
                content: r.source.content.clone(),
                sentiment: Some(r.label.clone()),
            }),
            None => scraped_post
                .filter(|p| p.kind == ItemKind::Post && !p.content.trim().is_empty())
                .map(|p| InsightPost {
                    content: p.content.clone(),
                    sentiment: None,
                }),
        };

        Self {
            distribution,
            comments,
            post,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use postmood_core::SentimentResult;

    #[test]
    fn sentiment_response_parses_service_shape() {
        let body = serde_json::json!({
            "Sentiment_Analysis": "Positive",
            "cleaned_tweet": "खूप छान",
            "original_tweet": "खूप छान!",
            "predicted_probabilities": { "Positive": 0.91, "Negative": 0.04, "Neutral": 0.05 }
        });
        let parsed: SentimentResponse = serde_json::from_value(body).expect("parse");
        let prediction = SentimentPrediction::from(parsed);
        assert_eq!(prediction.label, SentimentLabel::Positive);
        assert!((prediction.scores.positive - 0.91).abs() < 1e-9);
        assert_eq!(prediction.cleaned_text.as_deref(), Some("खूप छान"));
    }

    #[test]
    fn scrape_response_accepts_url_alias_and_missing_metadata() {
        let body = serde_json::json!({
            "post": { "content": "hello", "url": "https://www.facebook.com/share/p/1" },
            "comments": [{ "comment": "hi", "author": "A" }, { "comment": "yo" }]
        });
        let parsed: ScrapeResponse = serde_json::from_value(body).expect("parse");
        assert_eq!(
            parsed.post.post_url.as_deref(),
            Some("https://www.facebook.com/share/p/1")
        );
        assert_eq!(parsed.comments.len(), 2);
        assert!(parsed.comments[1].author.is_none());
        assert!(parsed.metadata.is_none());
    }

    #[test]
    fn scrape_request_omits_absent_credentials() {
        let body = serde_json::to_value(ScrapeRequest {
            post_url: "https://x.com/a/status/1",
            email: None,
            password: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "post_url": "https://x.com/a/status/1" }));
    }

    #[test]
    fn insight_request_lists_comments_and_labelled_post() {
        let results = ResultSet::new(vec![
            SentimentResult {
                source: ScrapedItem::post("post text"),
                label: SentimentLabel::Neutral,
                scores: SentimentScores::default(),
            },
            SentimentResult {
                source: ScrapedItem::comment("nice", Some("Asha".to_string())),
                label: SentimentLabel::Positive,
                scores: SentimentScores::default(),
            },
        ]);
        let request = InsightRequest::from_results(Distribution::default(), &results, None);
        assert_eq!(request.comments.len(), 1);
        assert_eq!(request.comments[0].author.as_deref(), Some("Asha"));
        assert_eq!(
            request.post.as_ref().and_then(|p| p.sentiment.clone()),
            Some(SentimentLabel::Neutral)
        );
    }

    #[test]
    fn insight_request_falls_back_to_unlabelled_scraped_post() {
        let scraped = ScrapedItem::post("just the post");
        let request = InsightRequest::from_results(
            Distribution::default(),
            &ResultSet::default(),
            Some(&scraped),
        );
        let post = request.post.expect("post");
        assert_eq!(post.content, "just the post");
        assert!(post.sentiment.is_none());

        let json = serde_json::to_value(&request.comments).unwrap();
        assert_eq!(json, serde_json::json!([]));
    }
}
