//! Offline text provider.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

/// Number of prompt characters echoed into the stub script.
pub const PROMPT_EXCERPT_CHARS: usize = 60;

/// Returns a script templated from the start of the prompt without calling
/// any upstream. The same prompt always yields the same script.
#[derive(Debug, Default, Clone)]
pub struct StubTextProvider;

impl StubTextProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn render(prompt: &str) -> String {
        let excerpt: String = prompt.trim().chars().take(PROMPT_EXCERPT_CHARS).collect();
        format!(
            "🔥 Hook: \"{excerpt}...\"\n\
             🎬 Scene 1: Open on a close-up while you say the hook straight to camera.\n\
             🎬 Scene 2: Show the problem in three quick cuts.\n\
             🎬 Scene 3: Reveal the fix and the result.\n\
             📣 CTA: Follow for more ideas like this!"
        )
    }
}

#[async_trait]
impl TextProvider for StubTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            text: Self::render(prompt),
            raw: None,
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
