// Cloud vision client.
//
// Takes a composite frame grid (see grid.rs) instead of individual frames:
// a vision call costs roughly the same per request however many sub-images
// it carries, so one contact sheet per call amortizes the per-request price
// across its cells. The composite travels as a base64 JPEG data URL in an
// image_url content part.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde::Serialize;
use tracing::{debug, warn};

use super::parse;
use super::wire::ChatResponse;
use super::{AnalysisResult, AnalysisSource, ContentType};
use crate::prompt;
use crate::registry::{ModelConfig, ModelRegistry, ModelRole};

pub struct CloudVisionClient {
    client: reqwest::Client,
    registry: Arc<ModelRegistry>,
}

impl CloudVisionClient {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
        }
    }

    /// Score one composite frame grid.
    ///
    /// Same contract as the text clients: None for a disabled backend,
    /// a failed or timed-out call, or unparsable output. The caller
    /// treats a None composite as "these frames went unanalyzed".
    pub async fn analyze_composite(
        &self,
        composite: &RgbImage,
        frame_count: usize,
    ) -> Option<AnalysisResult> {
        let config = self.registry.get_model(ModelRole::CloudVision)?;
        if !config.enabled {
            debug!("Cloud vision backend disabled");
            return None;
        }

        match self.try_analyze(&config, composite, frame_count).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    model = %config.name,
                    error = %e,
                    frame_count,
                    "Vision analysis failed, frames left unanalyzed"
                );
                None
            }
        }
    }

    async fn try_analyze(
        &self,
        config: &ModelConfig,
        composite: &RgbImage,
        frame_count: usize,
    ) -> Result<AnalysisResult> {
        let jpeg = encode_jpeg(composite)?;
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg));

        let request = VisionRequest {
            model: config.name.clone(),
            messages: vec![
                VisionMessage {
                    role: "system",
                    content: vec![ContentPart::Text {
                        text: prompt::prompt(ContentType::Frame).to_string(),
                    }],
                },
                VisionMessage {
                    role: "user",
                    content: vec![
                        ContentPart::Text {
                            text: format!(
                                "This image is a contact sheet of {frame_count} video frames \
                                 in playback order, laid out row by row. Score the sheet as \
                                 a whole."
                            ),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: data_url },
                        },
                    ],
                },
            ],
            temperature: 0.1,
            stream: false,
        };

        let response = self
            .client
            .post(&config.endpoint)
            .timeout(config.timeout)
            .bearer_auth(&config.credential)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("request to {} failed", config.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "vision backend returned {}: {}",
                status,
                parse::truncate_chars(&body, 200)
            );
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse vision response envelope")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        let result = parse::parse_analysis(&content, AnalysisSource::Cloud, &config.name)?;
        debug!(
            score = result.score,
            frame_count,
            is_inappropriate = result.is_inappropriate,
            "Vision model scored frame grid"
        );
        Ok(result)
    }
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buf, ImageOutputFormat::Jpeg(85))
        .context("failed to encode composite as JPEG")?;
    Ok(buf.into_inner())
}

// --- Vision request wire types (OpenAI multi-part content) ---

#[derive(Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<VisionMessage>,
    temperature: f64,
    stream: bool,
}

#[derive(Serialize)]
struct VisionMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_parts_serialize_to_openai_shape() {
        let part = ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/jpeg;base64,AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn encode_jpeg_produces_jfif_bytes() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([40, 80, 120]));
        let bytes = encode_jpeg(&img).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
