// SPDX-License-Identifier: GPL-3.0-only

//! Recognition and chat collaborators
//!
//! The session only depends on the [`Annotator`] contract: one image in,
//! one [`DetectionResult`] (or an error) out. Any failure is treated as
//! "no result" for that kind and call.

pub mod chat;
pub mod simulated;
pub mod vision;

pub use chat::ChatClient;
pub use simulated::SimulatedAnnotator;
pub use vision::VisionClient;

use crate::app::frame_processor::{DetectionKind, DetectionResult};
use crate::config::RecognitionConfig;
use crate::errors::RecognitionError;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::info;

/// Recognition service
pub trait Annotator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run one recognition kind over a base64-encoded JPEG
    fn annotate(
        &self,
        kind: DetectionKind,
        image_base64: Arc<str>,
    ) -> BoxFuture<'static, Result<DetectionResult, RecognitionError>>;
}

/// Real client when an API key is configured, simulated otherwise
pub fn annotator_from_config(config: &RecognitionConfig) -> Arc<dyn Annotator> {
    match config.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            info!(endpoint = %config.endpoint, "Using recognition service");
            Arc::new(VisionClient::new(
                config.endpoint.clone(),
                key.to_string(),
                config.max_results,
            ))
        }
        None => {
            info!("No recognition API key, using simulated recognition");
            Arc::new(SimulatedAnnotator::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_selects_simulation() {
        let config = RecognitionConfig::default();
        assert_eq!(annotator_from_config(&config).name(), "simulated");

        let config = RecognitionConfig {
            api_key: Some("key".into()),
            ..RecognitionConfig::default()
        };
        assert_eq!(annotator_from_config(&config).name(), "vision");
    }
}
