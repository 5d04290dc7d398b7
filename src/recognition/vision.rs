// SPDX-License-Identifier: GPL-3.0-only

//! `images:annotate` recognition client
//!
//! Sends one feature per request and maps the response onto
//! [`DetectionResult`]. Face vertices are absolute pixels of the submitted
//! (reference) image; object vertices are normalized.

use super::Annotator;
use crate::app::frame_processor::{
    DetectionKind, DetectionResult, FrameRegion, LabeledRegion, PixelBox,
};
use crate::errors::RecognitionError;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Serialize, Debug)]
struct Image {
    content: String,
}

#[derive(Serialize, Debug)]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Serialize, Debug)]
struct BatchRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Deserialize, Debug, Default)]
struct Vertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct BoundingPoly {
    vertices: Vec<Vertex>,
    normalized_vertices: Vec<Vertex>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    #[serde(default)]
    bounding_poly: BoundingPoly,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ObjectAnnotation {
    #[serde(default)]
    name: String,
    score: Option<f32>,
    #[serde(default)]
    bounding_poly: BoundingPoly,
}

#[derive(Deserialize, Debug)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize, Debug)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct AnnotateImageResponse {
    face_annotations: Vec<FaceAnnotation>,
    localized_object_annotations: Vec<ObjectAnnotation>,
    text_annotations: Vec<TextAnnotation>,
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<Status>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct BatchResponse {
    responses: Vec<AnnotateImageResponse>,
}

/// HTTP recognition client
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: u32,
}

impl VisionClient {
    pub fn new(endpoint: String, api_key: String, max_results: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            max_results,
        }
    }

    async fn request(
        client: reqwest::Client,
        url: String,
        api_key: String,
        body: BatchRequest,
        kind: DetectionKind,
    ) -> Result<DetectionResult, RecognitionError> {
        let response = client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(kind = ?kind, error = %e, "Failed to send recognition request");
                RecognitionError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(kind = ?kind, status = status.as_u16(), "Recognition API error");
            return Err(RecognitionError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        parse_response(kind, &text)
    }
}

impl Annotator for VisionClient {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn annotate(
        &self,
        kind: DetectionKind,
        image_base64: Arc<str>,
    ) -> BoxFuture<'static, Result<DetectionResult, RecognitionError>> {
        let body = BatchRequest {
            requests: vec![AnnotateImageRequest {
                image: Image {
                    content: image_base64.to_string(),
                },
                features: vec![Feature {
                    kind: kind.feature_type(),
                    max_results: self.max_results,
                }],
            }],
        };
        debug!(kind = ?kind, endpoint = %self.endpoint, "Submitting recognition request");

        Self::request(
            self.client.clone(),
            self.endpoint.clone(),
            self.api_key.clone(),
            body,
            kind,
        )
        .boxed()
    }
}

/// Map an `images:annotate` response body onto a detection result
pub fn parse_response(kind: DetectionKind, body: &str) -> Result<DetectionResult, RecognitionError> {
    let batch: BatchResponse =
        serde_json::from_str(body).map_err(|e| RecognitionError::Decode(e.to_string()))?;
    let response = batch.responses.into_iter().next().unwrap_or_default();

    if let Some(status) = response.error.filter(|s| s.code != 0) {
        return Err(RecognitionError::Status {
            code: u16::try_from(status.code).unwrap_or(500),
            message: status.message,
        });
    }

    let result = match kind {
        DetectionKind::Face => DetectionResult::Faces(
            response
                .face_annotations
                .iter()
                .filter_map(|face| PixelBox::from_vertices(&points(&face.bounding_poly.vertices)))
                .collect(),
        ),
        DetectionKind::Object => DetectionResult::Objects(
            response
                .localized_object_annotations
                .into_iter()
                .filter_map(|object| {
                    let b = PixelBox::from_vertices(&points(&object.bounding_poly.normalized_vertices))?;
                    Some(LabeledRegion {
                        bounds: FrameRegion {
                            x: b.x,
                            y: b.y,
                            width: b.width,
                            height: b.height,
                        },
                        label: object.name,
                        score: object.score,
                    })
                })
                .collect(),
        ),
        DetectionKind::Text => DetectionResult::Text(
            response
                .full_text_annotation
                .map(|full| full.text)
                .or_else(|| {
                    response
                        .text_annotations
                        .into_iter()
                        .next()
                        .map(|t| t.description)
                })
                .unwrap_or_default(),
        ),
    };

    Ok(result)
}

fn points(vertices: &[Vertex]) -> Vec<(f32, f32)> {
    vertices.iter().map(|v| (v.x, v.y)).collect()
}
