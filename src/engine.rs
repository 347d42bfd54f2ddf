// Moderation engine: wires the registry, clients, and limiters into the
// flows the upload/review workflow calls.
//
// Text moderation walks the registry's priority order and escalates
// low-confidence local results to the cloud. Frame review chunks sampled
// frames into contact sheets, analyzes them concurrently under the vision
// limiter, and folds the results into one aggregate. Every limiter permit
// is an owned permit: if the orchestrating job is cancelled mid-call, the
// permit drops with the future and the slot frees itself.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::client::cloud::CloudTextClient;
use crate::client::local::LocalTextClient;
use crate::client::vision::CloudVisionClient;
use crate::client::{AnalysisResult, AnalysisSource, ContentType, TextAnalyzer};
use crate::config::Config;
use crate::grid;
use crate::registry::{ModelRegistry, ModelRole};
use crate::review::conclusion::generate_conclusion;
use crate::review::status::{determine_status, FinalVerdict, ReviewThresholds};
use crate::review::{FrameReviewAggregate, SubtitleReviewResult};

/// Everything one video review produces. `frame_review: None` means the
/// frames went unanalyzed (backend off or every call failed); the caller
/// must treat that differently from "analyzed and clean".
#[derive(Debug, Clone)]
pub struct VideoReviewOutcome {
    pub frame_review: Option<FrameReviewAggregate>,
    pub subtitle_review: Option<SubtitleReviewResult>,
    pub verdict: FinalVerdict,
    pub conclusion: String,
}

pub struct ModerationEngine {
    registry: Arc<ModelRegistry>,
    local: LocalTextClient,
    cloud: CloudTextClient,
    vision: CloudVisionClient,
    limiters: RwLock<HashMap<ModelRole, Arc<Semaphore>>>,
    thresholds: ReviewThresholds,
    grid_rows: u32,
    grid_cols: u32,
}

impl ModerationEngine {
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(ModelRegistry::from_config(config));
        let limiters = RwLock::new(Self::build_limiters(&registry));
        Self {
            local: LocalTextClient::new(Arc::clone(&registry)),
            cloud: CloudTextClient::new(Arc::clone(&registry)),
            vision: CloudVisionClient::new(Arc::clone(&registry)),
            registry,
            limiters,
            thresholds: config.thresholds,
            grid_rows: config.grid_rows,
            grid_cols: config.grid_cols,
        }
    }

    /// Shared registry handle, for callers that surface availability.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Re-read backend configuration. The registry swaps atomically;
    /// limiters are rebuilt alongside it, and permits already held against
    /// the old semaphores drain out on their own.
    pub fn reload(&self, config: &Config) {
        self.registry.reload(config);
        let fresh = Self::build_limiters(&self.registry);
        match self.limiters.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }

    fn build_limiters(registry: &ModelRegistry) -> HashMap<ModelRole, Arc<Semaphore>> {
        let mut limiters = HashMap::new();
        for role in [
            ModelRole::LocalText,
            ModelRole::CloudText,
            ModelRole::CloudVision,
        ] {
            if let Some(model) = registry.get_model(role) {
                if model.enabled {
                    limiters.insert(role, Arc::new(Semaphore::new(model.max_concurrency)));
                }
            }
        }
        limiters
    }

    fn limiter(&self, role: ModelRole) -> Option<Arc<Semaphore>> {
        let guard = match self.limiters.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(&role).cloned()
    }

    /// Score one piece of text content.
    ///
    /// Walks the text backends in priority order. In hybrid mode a local
    /// result below the confidence threshold is kept as a fallback while
    /// the cloud backend gets a try; if the cloud also produces nothing,
    /// the low-confidence local result is better than none.
    pub async fn moderate_text(
        &self,
        content: &str,
        content_type: ContentType,
    ) -> Option<AnalysisResult> {
        let order = self.registry.text_priority();
        if order.is_empty() {
            debug!(content_type = %content_type, "Text moderation off, content unanalyzed");
            return None;
        }

        let mut low_confidence: Option<AnalysisResult> = None;
        for role in order {
            let Some(result) = self.call_text_backend(role, content, content_type).await else {
                continue;
            };

            let confidence = result.confidence.unwrap_or(0.0);
            if result.source == AnalysisSource::Local
                && self.registry.should_escalate_to_cloud(confidence)
            {
                info!(
                    confidence,
                    score = result.score,
                    "Low-confidence local result, escalating to cloud"
                );
                low_confidence = Some(result);
                continue;
            }
            return Some(result);
        }

        if low_confidence.is_some() {
            debug!("Escalation produced nothing, keeping local result");
        } else {
            warn!(content_type = %content_type, "Every text backend failed, content unanalyzed");
        }
        low_confidence
    }

    async fn call_text_backend(
        &self,
        role: ModelRole,
        content: &str,
        content_type: ContentType,
    ) -> Option<AnalysisResult> {
        let limiter = self.limiter(role)?;
        // Owned permit: released on drop, including cancellation mid-call
        let _permit = limiter.acquire_owned().await.ok()?;
        match role {
            ModelRole::LocalText => self.local.predict(content, content_type).await,
            ModelRole::CloudText => self.cloud.predict(content, content_type).await,
            ModelRole::CloudVision => None,
        }
    }

    /// Review a video's sampled frames.
    ///
    /// Frames are chunked into rows×cols contact sheets; each sheet is one
    /// vision call, run concurrently under the vision limiter. A sheet's
    /// result stands for every frame in its chunk when counting. Returns
    /// None when no vision backend is available or every call failed.
    pub async fn review_frames(&self, paths: &[PathBuf]) -> Option<FrameReviewAggregate> {
        if paths.is_empty() {
            debug!("No frames sampled, skipping frame review");
            return None;
        }
        if self.registry.vision_priority().is_empty() {
            debug!("No vision backend available, frames left unanalyzed");
            return None;
        }
        let limiter = self.limiter(ModelRole::CloudVision)?;

        let capacity = (self.grid_rows as usize) * (self.grid_cols as usize);
        let chunks = grid::batch_images(paths, capacity.max(1));
        let concurrency = self
            .registry
            .get_model(ModelRole::CloudVision)
            .map(|m| m.max_concurrency)
            .unwrap_or(1)
            .max(1);
        let (rows, cols) = (self.grid_rows, self.grid_cols);

        let outcomes: Vec<Option<(AnalysisResult, usize)>> =
            stream::iter(chunks.into_iter().map(|chunk| {
                let limiter = Arc::clone(&limiter);
                let vision = &self.vision;
                async move {
                    let frame_count = chunk.len();
                    // Compositing is CPU-bound image work; keep it off the
                    // async runtime.
                    let composite = tokio::task::spawn_blocking(move || {
                        grid::create_image_grid(&chunk, rows, cols, None)
                    })
                    .await
                    .ok()
                    .flatten()?;

                    let _permit = limiter.acquire_owned().await.ok()?;
                    let result = vision.analyze_composite(&composite, frame_count).await?;
                    Some((result, frame_count))
                }
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut violation_count = 0;
        let mut suspicious_count = 0;
        let mut total_frames = 0;
        let mut score_sum = 0.0;
        for (result, frame_count) in outcomes.into_iter().flatten() {
            total_frames += frame_count;
            if result.is_inappropriate {
                violation_count += frame_count;
            } else if result.score < self.thresholds.score_review_gate {
                suspicious_count += frame_count;
            }
            score_sum += result.score * frame_count as f64;
        }

        if total_frames == 0 {
            warn!(
                supplied = paths.len(),
                "Every vision call failed, frames left unanalyzed"
            );
            return None;
        }

        let aggregate =
            FrameReviewAggregate::from_counts(violation_count, suspicious_count, total_frames, score_sum);
        info!(
            total_frames,
            violation_ratio = aggregate.violation_ratio,
            suspicious_ratio = aggregate.suspicious_ratio,
            avg_score = aggregate.avg_score,
            "Frame review complete"
        );
        Some(aggregate)
    }

    /// Review subtitle-derived text. Subtitle text rides the comment
    /// prompt; the policy bands are the same.
    pub async fn review_subtitles(&self, subtitle_text: &str) -> Option<SubtitleReviewResult> {
        if subtitle_text.trim().is_empty() {
            return None;
        }
        let result = self.moderate_text(subtitle_text, ContentType::Comment).await?;
        Some(SubtitleReviewResult::from_analysis(
            &result,
            self.thresholds.score_review_gate,
        ))
    }

    /// Fold frame and subtitle reviews into the final verdict and its
    /// explanation.
    pub fn finalize(
        &self,
        frame: Option<&FrameReviewAggregate>,
        subtitle: Option<&SubtitleReviewResult>,
    ) -> (FinalVerdict, String) {
        let verdict = determine_status(frame, subtitle, &self.thresholds);
        let conclusion = generate_conclusion(frame, subtitle, &verdict, &self.thresholds);
        (verdict, conclusion)
    }

    /// The whole video flow: frame review and subtitle review run
    /// concurrently, then the verdict is computed.
    pub async fn review_video(
        &self,
        frame_paths: &[PathBuf],
        subtitle_text: Option<&str>,
    ) -> VideoReviewOutcome {
        let (frame_review, subtitle_review) = tokio::join!(self.review_frames(frame_paths), async {
            match subtitle_text {
                Some(text) => self.review_subtitles(text).await,
                None => None,
            }
        });

        let (verdict, conclusion) = self.finalize(frame_review.as_ref(), subtitle_review.as_ref());
        info!(
            status = %verdict.status,
            score = verdict.score,
            "Video review finished"
        );
        VideoReviewOutcome {
            frame_review,
            subtitle_review,
            verdict,
            conclusion,
        }
    }
}
