use serde::{Deserialize, Serialize};

use super::turn::Turn;

/// Per-call options forwarded with every chat request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOptions {
    pub thinking_mode: Option<bool>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thinking_mode(mut self, enabled: bool) -> Self {
        self.thinking_mode = Some(enabled);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Request body for the streaming chat endpoint.
///
/// `history` is the conversation *before* this message; the new user
/// message travels separately in `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Session correlation key (not a credential)
    pub session_id: String,
    /// The new user message
    pub message: String,
    /// Prior turns, oldest first
    pub history: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            history,
            thinking_mode: None,
            system_prompt: None,
            model: None,
        }
    }

    /// Apply per-call options (builder pattern)
    pub fn with_options(mut self, options: &ChatOptions) -> Self {
        self.thinking_mode = options.thinking_mode;
        self.system_prompt = options.system_prompt.clone();
        self.model = options.model.clone();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_unset_options() {
        let request = ChatRequest::new("s-1", "What is RAII?", vec![]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "session_id": "s-1",
                "message": "What is RAII?",
                "history": []
            })
        );
    }

    #[test]
    fn test_request_with_options_and_history() {
        let options = ChatOptions::new()
            .with_thinking_mode(true)
            .with_system_prompt("Explain like a tutor")
            .with_model("qwen-72b");
        let history = vec![Turn::user("What is RAII?"), Turn::assistant("Resource acquisition...")];
        let request = ChatRequest::new("s-1", "And in Rust?", history).with_options(&options);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["thinking_mode"], true);
        assert_eq!(json["system_prompt"], "Explain like a tutor");
        assert_eq!(json["model"], "qwen-72b");
        assert_eq!(json["history"][1]["role"], "assistant");
        assert_eq!(json["history"].as_array().unwrap().len(), 2);
    }
}
