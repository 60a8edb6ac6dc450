//! Test support: a scripted LLM that replays canned responses in call order.

use std::collections::VecDeque;
use std::sync::Mutex;

use tutorforge_llm::LlmClient;
use tutorforge_shared::{Result, TutorForgeError};

/// Replays a fixed sequence of responses; an exhausted script errors.
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
}

impl ScriptedLlm {
    pub(crate) fn new(
        responses: impl IntoIterator<Item = std::result::Result<String, String>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    /// Number of responses not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().expect("lock").len()
    }
}

/// Shorthand for a successful scripted response.
pub(crate) fn ok(text: &str) -> std::result::Result<String, String> {
    Ok(text.to_string())
}

/// Shorthand for a failing scripted response.
pub(crate) fn fail(message: &str) -> std::result::Result<String, String> {
    Err(message.to_string())
}

impl LlmClient for ScriptedLlm {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        let next = self.responses.lock().expect("lock").pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(TutorForgeError::Llm(message)),
            None => Err(TutorForgeError::Llm("scripted responses exhausted".into())),
        }
    }
}
