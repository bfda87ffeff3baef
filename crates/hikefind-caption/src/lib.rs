//! hikefind-caption
//!
//! Text-generation oracle adapters: a Gemini HTTP client that turns a
//! sketch plus its detected classes into a short search phrase, and a
//! static composer used as the fallback and the test double. Caption
//! failures are degradable by contract — callers substitute
//! [`FALLBACK_QUERY_PHRASE`] and never fail the query on them.

use base64::Engine;
use image::RgbImage;

use hikefind_core::config::CaptionConfig;
use hikefind_core::error::{Error, Result};
use hikefind_core::taxonomy::Taxonomy;
use hikefind_core::traits::SketchCaptioner;
pub use hikefind_core::FALLBACK_QUERY_PHRASE;

/// Build the configured captioner. Without an API key in the configured
/// environment variable (or with `APP_USE_FAKE_MODELS=1`) this degrades to
/// the static composer.
pub fn default_captioner(config: &CaptionConfig) -> Box<dyn SketchCaptioner> {
    let use_fake = std::env::var("APP_USE_FAKE_MODELS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    match std::env::var(&config.api_key_env) {
        Ok(key) if !use_fake && !key.is_empty() => {
            Box::new(GeminiCaptioner::new(config.clone(), key))
        }
        _ => {
            tracing::info!("no caption API key, using StaticCaptioner");
            Box::new(StaticCaptioner::default())
        }
    }
}

/// Deterministic captioner composing a phrase from the detected classes.
#[derive(Default)]
pub struct StaticCaptioner;

impl SketchCaptioner for StaticCaptioner {
    fn describe(&self, _sketch: &RgbImage, detected: &[&str]) -> Result<String> {
        if detected.is_empty() {
            return Ok(FALLBACK_QUERY_PHRASE.to_string());
        }
        let features: Vec<String> = detected
            .iter()
            .map(|name| name.to_lowercase().replace('_', " "))
            .collect();
        Ok(format!("a landscape with {}", features.join(", ")))
    }
}

/// Gemini-backed captioner: sends the sketch inline with a color key and
/// the detected classes, asks for a JSON object, and takes `description`.
pub struct GeminiCaptioner {
    config: CaptionConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiCaptioner {
    pub fn new(config: CaptionConfig, api_key: String) -> Self {
        Self { config, api_key, client: reqwest::blocking::Client::new() }
    }

    fn build_prompt(detected: &[&str]) -> String {
        let taxonomy = Taxonomy::landscape();
        let mut prompt = String::from(
            "You are an expert at describing landscape art. Analyze a user's sketch \
             and generate a descriptive search query.\n\nHere is the color key:\n",
        );
        for class in taxonomy.scored() {
            let [r, g, b] = class.display_color;
            prompt.push_str(&format!("- {}: rgb({},{},{})\n", class.name, r, g, b));
        }
        prompt.push_str(&format!(
            "\nBased on the colors, the sketch contains: {}.\n\n",
            detected.join(", ")
        ));
        prompt.push_str(
            "Analyze the sketch and the detected elements. Generate a single, short, \
             descriptive phrase (max 10 words) that captures the main elements and their \
             spatial relationship. Focus on the key features.\n\
             Your response MUST be a single, valid JSON object matching this schema:\n\
             {\n  \"description\": \"A short, 10-word descriptive phrase for a search query.\",\n  \
             \"main_features\": [\"list\", \"of\", \"detected\", \"elements\"]\n}\n",
        );
        prompt
    }

    fn encode_png(sketch: &RgbImage) -> Result<String> {
        let mut bytes = Vec::new();
        sketch
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| Error::Caption(format!("failed to encode sketch: {e}")))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

impl SketchCaptioner for GeminiCaptioner {
    fn describe(&self, sketch: &RgbImage, detected: &[&str]) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": Self::build_prompt(detected) },
                    { "inline_data": { "mime_type": "image/png", "data": Self::encode_png(sketch)? } },
                ],
            }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| Error::Caption(format!("caption service unreachable: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Caption(format!(
                "caption service returned {}",
                response.status()
            )));
        }
        let value: serde_json::Value = response
            .json()
            .map_err(|e| Error::Caption(format!("invalid caption response: {e}")))?;
        let text = value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| Error::Caption("caption response has no text part".to_string()))?;
        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::Caption(format!("caption text is not JSON: {e}")))?;
        let description = parsed["description"]
            .as_str()
            .ok_or_else(|| Error::Caption("caption JSON has no description".to_string()))?;
        tracing::info!(caption = description, "generated query phrase");
        Ok(description.to_string())
    }
}
