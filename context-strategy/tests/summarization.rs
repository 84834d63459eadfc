use agentex_context::SummarizationStrategy;
use agentex_llm::{
    ContentPart, ContextStrategy, Provider, ProviderError, ProviderMessage, ProviderRequest,
    ProviderResponse, Role, StopReason, TokenUsage,
};

struct MockProvider;

impl Provider for MockProvider {
    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            content: vec![ContentPart::Text {
                text: "user asked about HashMap, assistant explained it".into(),
            }],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
            model: "mock".into(),
            cost: None,
            truncated: None,
        })
    }
}

fn user_msg(text: &str) -> ProviderMessage {
    ProviderMessage {
        role: Role::User,
        content: vec![ContentPart::Text { text: text.into() }],
    }
}

#[tokio::test]
async fn replaces_old_messages_with_summary_and_keeps_recent() {
    let strategy = SummarizationStrategy::new(MockProvider, 1, 0);
    let messages = vec![
        ProviderMessage {
            role: Role::System,
            content: vec![ContentPart::Text { text: "be helpful".into() }],
        },
        user_msg("what is a HashMap"),
        user_msg("how do I iterate it"),
        user_msg("last question, keep me verbatim"),
    ];

    let compacted = strategy.compact(messages).await.unwrap();

    // system message, summary message, then the 1 preserved recent message
    assert_eq!(compacted.len(), 3);
    assert_eq!(compacted[0].role, Role::System);
    let ContentPart::Text { text } = &compacted[1].content[0] else {
        panic!("expected text");
    };
    assert!(text.starts_with("[Summary of earlier conversation]"));
    let ContentPart::Text { text } = &compacted[2].content[0] else {
        panic!("expected text");
    };
    assert_eq!(text, "last question, keep me verbatim");
}
