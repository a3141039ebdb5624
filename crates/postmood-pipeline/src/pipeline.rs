//! End-to-end orchestration of one analysis run.

use futures::future::join_all;
use postmood_core::{
    compute_stats, validate_post_url, AggregateStats, AnalysisRequest, ItemKind, Platform,
    ResultSet, ScrapedItem, ScrapedPost, SentimentResult,
};
use postmood_services::{ScrapeService, SentimentService};

use crate::error::{ItemFailure, PipelineError};
use crate::session::AnalysisSession;

/// Maximum number of sentiment calls in flight at once.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Everything produced by a successful run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub scraped: ScrapedPost,
    pub results: ResultSet,
    pub stats: Option<AggregateStats>,
    /// Comments dropped because their sentiment call failed.
    pub failures: Vec<ItemFailure>,
}

/// Summary of a run published into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub platform: Platform,
    pub result_count: usize,
    pub skipped_count: usize,
    pub stats: Option<AggregateStats>,
    /// Fingerprint of the published result set; `None` if a newer run
    /// superseded this one before it finished.
    pub result_key: Option<String>,
}

/// Scrape -> analyze -> aggregate, with comments classified in bounded batches.
pub struct AnalysisPipeline<S, A> {
    scraper: S,
    analyzer: A,
    batch_size: usize,
    analyze_post: bool,
}

impl<S, A> AnalysisPipeline<S, A>
where
    S: ScrapeService,
    A: SentimentService,
{
    #[must_use]
    pub fn new(scraper: S, analyzer: A) -> Self {
        Self {
            scraper,
            analyzer,
            batch_size: DEFAULT_BATCH_SIZE,
            analyze_post: true,
        }
    }

    /// Sets the comment batch size. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Enables or disables post-level sentiment.
    #[must_use]
    pub fn with_post_analysis(mut self, enabled: bool) -> Self {
        self.analyze_post = enabled;
        self
    }

    /// Runs the pipeline and publishes the result into `session`.
    ///
    /// Validation happens before the session is touched, so a rejected URL
    /// leaves the previous results in place. Once the URL is accepted the
    /// session's previous results and cached insight are discarded.
    ///
    /// # Errors
    ///
    /// See [`AnalysisPipeline::run`].
    pub async fn run_analysis(
        &self,
        session: &AnalysisSession,
        request: &AnalysisRequest,
    ) -> Result<RunReport, PipelineError> {
        validate_post_url(&request.post_url)?;

        let _guard = session.lock_runs().await;
        let generation = session.begin_run().await;

        match self.run(request).await {
            Ok(outcome) => {
                let report_stats = outcome.stats;
                let platform = outcome.scraped.platform;
                let result_count = outcome.results.len();
                let skipped_count = outcome.failures.len();
                let result_key = session
                    .publish(
                        generation,
                        outcome.scraped,
                        outcome.results,
                        outcome.stats,
                        skipped_count,
                    )
                    .await;

                Ok(RunReport {
                    platform,
                    result_count,
                    skipped_count,
                    stats: report_stats,
                    result_key,
                })
            }
            Err(e) => {
                session.record_failure(generation, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Runs the pipeline without touching any session.
    ///
    /// 1. Validate the URL (no network on failure).
    /// 2. Scrape the post and its comments.
    /// 3. Classify the post, when enabled and non-blank.
    /// 4. Classify non-blank comments in batches of `batch_size`; a batch is
    ///    only issued once every call of the previous batch has settled.
    /// 5. Aggregate.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Validation`], [`PipelineError::Configuration`],
    /// [`PipelineError::Scrape`] and [`PipelineError::PostAnalysis`] abort the
    /// run. Per-comment failures never do; they are reported in
    /// [`AnalysisOutcome::failures`].
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, PipelineError> {
        let (platform, post_url) = validate_post_url(&request.post_url)?;

        let scraped = self
            .scraper
            .scrape(platform, post_url)
            .await
            .map_err(PipelineError::from_scrape)?;

        let mut results = Vec::with_capacity(scraped.comments.len() + 1);

        if self.analyze_post && !scraped.post.content.trim().is_empty() {
            let prediction = self
                .analyzer
                .analyze(&scraped.post.content)
                .await
                .map_err(PipelineError::PostAnalysis)?;
            results.push(SentimentResult {
                source: ScrapedItem {
                    kind: ItemKind::Post,
                    ..scraped.post.clone()
                },
                label: prediction.label,
                scores: prediction.scores,
            });
        } else if self.analyze_post {
            tracing::debug!(post_url, "post has no text; skipping post-level sentiment");
        }

        let (comment_results, failures) = self.analyze_comments(&scraped.comments).await;
        results.extend(comment_results);

        if !failures.is_empty() {
            tracing::warn!(
                post_url,
                failed = failures.len(),
                total = scraped.comments.len(),
                "some comments could not be analyzed and were dropped"
            );
        }

        let results = ResultSet::new(results);
        let stats = compute_stats(&results);

        tracing::info!(
            %platform,
            post_url,
            analyzed = results.len(),
            skipped = failures.len(),
            "analysis complete"
        );

        Ok(AnalysisOutcome {
            scraped,
            results,
            stats,
            failures,
        })
    }

    /// Classifies comments batch by batch, keeping scrape order.
    async fn analyze_comments(
        &self,
        comments: &[ScrapedItem],
    ) -> (Vec<SentimentResult>, Vec<ItemFailure>) {
        let pending: Vec<(usize, &ScrapedItem)> = comments
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.content.trim().is_empty())
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        let mut failures = Vec::new();

        for (batch_number, batch) in pending.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                batch = batch_number + 1,
                size = batch.len(),
                "analyzing comment batch"
            );

            // join_all yields outputs in input order regardless of completion order.
            let outcomes =
                join_all(batch.iter().map(|(_, c)| self.analyzer.analyze(&c.content))).await;

            for (&(index, comment), outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(prediction) => results.push(SentimentResult {
                        source: comment.clone(),
                        label: prediction.label,
                        scores: prediction.scores,
                    }),
                    Err(error) => {
                        tracing::warn!(
                            index,
                            error = %error,
                            "comment analysis failed; dropping comment"
                        );
                        failures.push(ItemFailure {
                            index,
                            content: comment.content.clone(),
                            error,
                        });
                    }
                }
            }
        }

        (results, failures)
    }
}
