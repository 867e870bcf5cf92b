//! Speech recognition
//!
//! Ranked backend providers are probed once at initialization; whichever
//! answers first handles the whole run. Recognition itself never fails
//! past this boundary: on any provider error the facade degrades to a
//! single mock segment spanning the measured duration of the input file.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use callsim_config::SttSettings;
use callsim_core::audio::wav_duration_secs;
use callsim_core::{Error, SttProvider, SttSegment, Transcription};
use serde::Deserialize;

const ENGINE_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const MOCK_TEXT: &str = "[mock transcript: recognition unavailable]";
const ERROR_TEXT: &str = "[transcription error]";

/// Hosted transcription API (OpenAI-compatible, multipart upload)
pub struct OpenAiSttProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiTranscription {
    text: String,
    #[serde(default)]
    segments: Vec<ApiSegment>,
    #[serde(default)]
    language: Option<String>,
}

impl OpenAiSttProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> callsim_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(ENGINE_TIMEOUT)
            .build()
            .map_err(|e| Error::Recognition(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl SttProvider for OpenAiSttProvider {
    fn name(&self) -> &str {
        "openai-api"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> callsim_core::Result<Transcription> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| Error::Recognition(e.to_string()))?;
        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", part);
        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.endpoint))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Recognition(format!(
                "transcription API returned {status}: {body}"
            )));
        }

        let parsed: ApiTranscription = response
            .json()
            .await
            .map_err(|e| Error::Recognition(format!("bad API response: {e}")))?;

        Ok(normalize_result(parsed, audio, language))
    }
}

/// STT sidecar service (POST WAV bytes to /transcribe)
pub struct HttpSttProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpSttProvider {
    pub fn new(url: impl Into<String>) -> callsim_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(ENGINE_TIMEOUT)
            .build()
            .map_err(|e| Error::Recognition(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SttProvider for HttpSttProvider {
    fn name(&self) -> &str {
        "http-sidecar"
    }

    async fn is_available(&self) -> bool {
        let health = format!("{}/health", self.url);
        match tokio::time::timeout(PROBE_TIMEOUT, self.client.get(&health).send()).await {
            Ok(Ok(resp)) => resp.status().is_success(),
            _ => false,
        }
    }

    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> callsim_core::Result<Transcription> {
        let bytes = tokio::fs::read(audio).await?;

        let mut request = self
            .client
            .post(format!("{}/transcribe", self.url))
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(bytes);
        if let Some(lang) = language {
            request = request.query(&[("language", lang)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Recognition(format!("STT sidecar returned {status}")));
        }

        let parsed: ApiTranscription = response
            .json()
            .await
            .map_err(|e| Error::Recognition(format!("bad sidecar response: {e}")))?;

        Ok(normalize_result(parsed, audio, language))
    }
}

/// Normalize an engine result to the recognizer contract: text joined from
/// segments, a synthesized segment when the engine sent none, dropped
/// malformed entries.
fn normalize_result(
    parsed: ApiTranscription,
    audio: &Path,
    language_hint: Option<&str>,
) -> Transcription {
    let language = parsed
        .language
        .or_else(|| language_hint.map(str::to_string))
        .unwrap_or_else(|| "und".to_string());

    let mut segments: Vec<SttSegment> = parsed
        .segments
        .into_iter()
        .filter(|s| s.end >= s.start && !s.text.trim().is_empty())
        .map(|s| SttSegment::new(s.start, s.end, s.text.trim()))
        .collect();

    if segments.is_empty() {
        let duration = wav_duration_secs(audio);
        let text = parsed.text.trim();
        let text = if text.is_empty() { "[empty transcript]" } else { text };
        segments.push(SttSegment::new(0.0, duration, text));
    }

    let mut result = Transcription::from_segments(segments, language);
    // Prefer the engine's full text when it is richer than the join
    let full = parsed.text.trim();
    if !full.is_empty() {
        result.text = full.to_string();
    }
    result
}

/// Recognition result plus how it was obtained
///
/// `degraded` carries the engine failure message when the transcription
/// is a mock placeholder rather than real recognition output; the
/// orchestrator records it and falls back to the original client text
/// for downstream stages.
#[derive(Debug, Clone)]
pub struct RecognitionOutcome {
    pub transcription: Transcription,
    pub degraded: Option<String>,
}

/// Recognition facade
pub struct SpeechRecognizer {
    provider: Option<Box<dyn SttProvider>>,
    language: Option<String>,
}

impl SpeechRecognizer {
    /// Probe the ranked provider list once and keep the first responder.
    ///
    /// Ranking: hosted API (when the model selector says so), then the
    /// configured sidecar. `force_mock` skips probing entirely.
    pub async fn new(settings: &SttSettings) -> Self {
        let language = settings.language.clone();

        if settings.force_mock {
            tracing::info!("STT force-mock enabled; recognition runs in mock mode");
            return Self {
                provider: None,
                language,
            };
        }

        let mut candidates: Vec<Box<dyn SttProvider>> = Vec::new();

        if settings.model.eq_ignore_ascii_case("openai") {
            if let Some(key) = settings.api_key.as_deref() {
                match OpenAiSttProvider::new(
                    "https://api.openai.com/v1",
                    key,
                    "gpt-4o-mini-transcribe",
                ) {
                    Ok(provider) => candidates.push(Box::new(provider)),
                    Err(e) => tracing::warn!("failed to init hosted STT: {e}"),
                }
            } else {
                tracing::warn!("stt.model=openai but no API key configured");
            }
        }

        if let Some(url) = settings.sidecar_url.as_deref() {
            match HttpSttProvider::new(url) {
                Ok(provider) => candidates.push(Box::new(provider)),
                Err(e) => tracing::warn!("failed to init STT sidecar: {e}"),
            }
        }

        for candidate in candidates {
            if candidate.is_available().await {
                tracing::info!(backend = candidate.name(), "STT backend selected");
                return Self {
                    provider: Some(candidate),
                    language,
                };
            }
            tracing::warn!(backend = candidate.name(), "STT backend unavailable, trying next");
        }

        tracing::warn!("no STT backend available; recognition degrades to mock");
        Self {
            provider: None,
            language,
        }
    }

    /// Mock-only recognizer
    pub fn mock() -> Self {
        Self {
            provider: None,
            language: None,
        }
    }

    /// Recognizer with an injected provider (tests)
    pub fn with_provider(provider: Box<dyn SttProvider>) -> Self {
        Self {
            provider: Some(provider),
            language: None,
        }
    }

    /// Transcribe a WAV file. Always returns the full contract shape;
    /// never fails past this boundary.
    pub async fn transcribe(&self, audio: &Path) -> RecognitionOutcome {
        let language = self.language.as_deref();

        match &self.provider {
            Some(provider) => match provider.transcribe(audio, language).await {
                Ok(result) => RecognitionOutcome {
                    transcription: result,
                    degraded: None,
                },
                Err(e) => {
                    tracing::warn!(backend = provider.name(), "transcription failed: {e}");
                    RecognitionOutcome {
                        transcription: mock_transcription(audio, ERROR_TEXT, language),
                        degraded: Some(e.to_string()),
                    }
                }
            },
            None => RecognitionOutcome {
                transcription: mock_transcription(audio, MOCK_TEXT, language),
                degraded: Some("recognition engine unavailable".to_string()),
            },
        }
    }
}

/// Single segment spanning the measured duration of the file
fn mock_transcription(audio: &Path, text: &str, language: Option<&str>) -> Transcription {
    let duration = wav_duration_secs(audio);
    Transcription {
        text: text.to_string(),
        segments: vec![SttSegment::new(0.0, duration, text)],
        language: language.unwrap_or("und").to_string(),
    }
}
