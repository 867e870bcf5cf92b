//! Text vocalization
//!
//! Maps raw text to a phonetically annotated string. Providers are an
//! explicit ranked chain fixed at construction: the external phonetic
//! engine (a subprocess CLI) when enabled, then a best-effort mock. The
//! facade itself never fails; a provider error falls through the chain.

use std::process::Command;

use callsim_core::{Error, Result, VocalizeProvider, Vocalized};
use serde::Deserialize;

/// Marker appended by the mock provider so demo output is recognizable
const MOCK_SUFFIX: &str = "(ניקוד_המחשה)";

/// External phonetic engine invoked as `<cli> --text <text> --json`
pub struct CliVocalizer {
    cli_path: String,
}

#[derive(Debug, Deserialize)]
struct CliOutput {
    #[serde(alias = "nikud")]
    vocalized: Option<String>,
    phonemes: Option<String>,
}

impl CliVocalizer {
    pub fn new(cli_path: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
        }
    }
}

impl VocalizeProvider for CliVocalizer {
    fn name(&self) -> &str {
        "cli"
    }

    fn vocalize(&self, text: &str) -> Result<Vocalized> {
        let output = Command::new(&self.cli_path)
            .arg("--text")
            .arg(text)
            .arg("--json")
            .output()
            .map_err(|e| Error::Vocalize(format!("{}: {e}", self.cli_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Vocalize(format!(
                "{} exited with {}: {}",
                self.cli_path,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            return Err(Error::Vocalize(format!("{}: empty output", self.cli_path)));
        }

        // JSON when the engine supports it, plain annotated text otherwise
        match serde_json::from_str::<CliOutput>(&stdout) {
            Ok(parsed) => Ok(Vocalized {
                vocalized: parsed.vocalized.unwrap_or_else(|| stdout.clone()),
                phonemes: parsed.phonemes,
            }),
            Err(_) => Ok(Vocalized::plain(stdout)),
        }
    }
}

/// Best-effort fallback: pass the text through with a visible marker
pub struct MockVocalizer;

impl VocalizeProvider for MockVocalizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn vocalize(&self, text: &str) -> Result<Vocalized> {
        Ok(Vocalized::plain(format!("{text} {MOCK_SUFFIX}")))
    }
}

/// Vocalization facade over the ranked provider chain
pub struct Vocalizer {
    providers: Vec<Box<dyn VocalizeProvider>>,
}

impl Vocalizer {
    /// Build the chain: CLI engine first when configured, mock last
    pub fn new(use_engine: bool, cli_path: Option<&str>) -> Self {
        let mut providers: Vec<Box<dyn VocalizeProvider>> = Vec::new();
        if use_engine {
            match cli_path {
                Some(path) => providers.push(Box::new(CliVocalizer::new(path))),
                None => {
                    tracing::warn!("vocalizer engine requested but no cli_path configured; using mock");
                }
            }
        }
        providers.push(Box::new(MockVocalizer));
        Self { providers }
    }

    /// Mock-only chain
    pub fn mock() -> Self {
        Self {
            providers: vec![Box::new(MockVocalizer)],
        }
    }

    /// Annotate text for synthesis. Never fails; empty input stays empty.
    pub fn vocalize(&self, text: &str) -> Vocalized {
        if text.is_empty() {
            return Vocalized {
                vocalized: String::new(),
                phonemes: None,
            };
        }

        for provider in &self.providers {
            match provider.vocalize(text) {
                Ok(result) => return result,
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "vocalization failed: {e}");
                }
            }
        }

        // The mock provider is infallible, so this is unreachable in
        // practice; keep the raw text as the final degrade anyway.
        Vocalized::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_stays_empty() {
        let v = Vocalizer::mock();
        let out = v.vocalize("");
        assert!(out.vocalized.is_empty());
        assert!(out.phonemes.is_none());
    }

    #[test]
    fn test_mock_appends_marker() {
        let v = Vocalizer::mock();
        let out = v.vocalize("שלום עולם");
        assert!(out.vocalized.starts_with("שלום עולם"));
        assert!(out.vocalized.ends_with(MOCK_SUFFIX));
    }

    #[test]
    fn test_broken_cli_falls_through_to_mock() {
        let v = Vocalizer::new(true, Some("/definitely/not/a/binary"));
        let out = v.vocalize("טקסט");
        assert!(out.vocalized.ends_with(MOCK_SUFFIX));
    }

    struct FailingProvider;

    impl VocalizeProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn vocalize(&self, _text: &str) -> Result<Vocalized> {
            Err(Error::Vocalize("boom".to_string()))
        }
    }

    #[test]
    fn test_chain_order_first_success_wins() {
        let v = Vocalizer {
            providers: vec![Box::new(FailingProvider), Box::new(MockVocalizer)],
        };
        let out = v.vocalize("אבג");
        assert!(out.vocalized.ends_with(MOCK_SUFFIX));
    }
}
