//! Entity extraction orchestration.
//!
//! The extractor decides per document whether to call the NER model,
//! windows the text for it, and always runs the regex fallback so that
//! model failures degrade to pattern-only results instead of errors.

use crate::entities::{merge_entities, Entity, EntityKind, EntitySource};
use crate::model::{span_to_byte_range, window_text, NerModel};
use crate::patterns::extract_with_patterns;
use crate::risk::failure_risk;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum characters per model window
    pub window_chars: usize,
    /// Risk score above which the model is skipped
    pub risk_threshold: f64,
    /// Minimum model confidence to keep a span
    pub min_model_score: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window_chars: 1800,
            risk_threshold: 0.6,
            min_model_score: 0.5,
        }
    }
}

/// Extraction outcome with provenance counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Merged, deduplicated entities sorted by span
    pub entities: Vec<Entity>,
    /// Risk score computed for the input
    pub risk: f64,
    /// Whether the model was consulted
    pub model_used: bool,
    /// Number of model windows that failed
    pub failed_windows: usize,
}

/// Entity extractor with model fallback.
pub struct EntityExtractor {
    config: ExtractorConfig,
    model: Option<Arc<dyn NerModel>>,
}

impl EntityExtractor {
    /// Pattern-only extractor.
    pub fn patterns_only() -> Self {
        Self {
            config: ExtractorConfig::default(),
            model: None,
        }
    }

    pub fn new(config: ExtractorConfig, model: Arc<dyn NerModel>) -> Self {
        Self {
            config,
            model: Some(model),
        }
    }

    /// Extract entities from text.
    ///
    /// Model errors never surface to the caller; affected windows simply
    /// contribute nothing and the pattern results stand alone.
    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        let risk = failure_risk(text);
        let mut failed_windows = 0;
        let mut entities = Vec::new();

        let use_model = self.model.is_some() && risk < self.config.risk_threshold;
        if let (true, Some(model)) = (use_model, self.model.as_ref()) {
            for (window, offset) in window_text(text, self.config.window_chars) {
                match model.classify(&window).await {
                    Ok(spans) => {
                        for span in spans {
                            if span.score < self.config.min_model_score {
                                continue;
                            }
                            // Model spans are character positions within the
                            // window; entity spans are byte offsets into the
                            // full text, matching the pattern extractor.
                            let (start, end) = match span_to_byte_range(&window, span.start, span.end) {
                                Some(range) => range,
                                None => {
                                    warn!(
                                        label = %span.label,
                                        start = span.start,
                                        end = span.end,
                                        "Model span out of window bounds, dropped"
                                    );
                                    continue;
                                }
                            };
                            entities.push(Entity::new(
                                EntityKind::from_model_label(&span.label),
                                span.word,
                                offset + start,
                                offset + end,
                                span.score,
                                EntitySource::Model,
                            ));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, offset, "Model window failed, falling back to patterns");
                        failed_windows += 1;
                    }
                }
            }
        } else if self.model.is_some() {
            debug!(risk, threshold = self.config.risk_threshold, "Model skipped for risky input");
        }

        entities.extend(extract_with_patterns(text));
        let entities = merge_entities(entities);

        debug!(
            count = entities.len(),
            risk,
            model_used = use_model,
            "Extraction complete"
        );

        ExtractionOutcome {
            entities,
            risk,
            model_used: use_model,
            failed_windows,
        }
    }
}
