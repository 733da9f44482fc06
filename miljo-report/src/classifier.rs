//! Classification service: the external model call with the deterministic
//! fallback behind one `classify` entry point.
//!
//! The contract is that `classify` never fails. Whatever goes wrong with the
//! external call (transport, timeout, unparseable reply) is logged and
//! answered locally instead.

use std::time::Duration;

use tracing::{debug, warn};

use miljo_core::aggregate::CategoryAggregate;
use miljo_core::fallback::fallback_classify;
use miljo_core::locator::FactorTable;
use miljo_core::prompt::{build_prompt, parse_model_response};
use miljo_core::result::ClassificationResult;

use crate::gemini::ModelClient;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Overall bound on the external call, sanitation and parsing included.
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45),
        }
    }
}

/// Two-branch classification: ask the model, fall back locally.
pub struct Classifier<C: ModelClient> {
    client: C,
    config: ClassifierConfig,
}

impl<C: ModelClient> Classifier<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: ClassifierConfig::default(),
        }
    }

    pub fn with_config(client: C, config: ClassifierConfig) -> Self {
        Self { client, config }
    }

    /// Estimate emissions, cost and energy per category. Infallible: the
    /// fallback answers whenever the model path does not produce a valid
    /// result in time.
    pub async fn classify(
        &self,
        aggregates: &[CategoryAggregate],
        factors: &FactorTable,
    ) -> ClassificationResult {
        let prompt = build_prompt(aggregates, factors);
        debug!(prompt_len = prompt.len(), "asking model for classification");

        match tokio::time::timeout(self.config.timeout, self.client.generate(&prompt)).await {
            Ok(Ok(reply)) => match parse_model_response(&reply) {
                Ok(result) => {
                    debug!(
                        categories = result.categories.len(),
                        "model classification accepted"
                    );
                    return result;
                }
                Err(err) => {
                    warn!(error = %err, "model reply unusable, using local fallback");
                }
            },
            Ok(Err(err)) => {
                warn!(error = %err, "model call failed, using local fallback");
            }
            Err(_) => {
                warn!(
                    timeout_s = self.config.timeout.as_secs(),
                    "model call timed out, using local fallback"
                );
            }
        }

        fallback_classify(aggregates, factors)
    }
}
