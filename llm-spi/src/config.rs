//! Static defaults for model selection and the tool loop's iteration cap.

/// Default model/limits an agent falls back to when an action or the
/// Supervisor planner doesn't override them (§4.9 "Configuration").
pub struct AgentexLlmConfig {
    /// Base system prompt prepended ahead of an action's own prompt.
    pub system_prompt: String,

    /// Default model identifier.
    pub default_model: String,

    /// Default maximum output tokens per provider call.
    pub default_max_tokens: u32,

    /// Default maximum tool-loop iterations (§4.4, `max_iterations`).
    pub default_max_iterations: u32,
}

impl Default for AgentexLlmConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".into(),
            default_model: String::new(),
            default_max_tokens: 4096,
            default_max_iterations: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AgentexLlmConfig::default();
        assert_eq!(config.system_prompt, "You are a helpful assistant.");
        assert!(config.default_model.is_empty());
        assert_eq!(config.default_max_tokens, 4096);
        assert_eq!(config.default_max_iterations, 20);
    }

    #[test]
    fn custom_config_values() {
        let config = AgentexLlmConfig {
            system_prompt: "Custom prompt".into(),
            default_model: "gpt-4o".into(),
            default_max_tokens: 2048,
            default_max_iterations: 10,
        };
        assert_eq!(config.system_prompt, "Custom prompt");
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.default_max_tokens, 2048);
        assert_eq!(config.default_max_iterations, 10);
    }
}
