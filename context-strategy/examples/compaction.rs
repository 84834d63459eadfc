//! Build a conversation, check token counts, and compact with SlidingWindowStrategy.
//!
//! Run with: `cargo run --example compaction -p agentex-context`

use agentex_context::{SlidingWindowStrategy, TokenCounter};
use agentex_llm::{ContentPart, ContextStrategy, ProviderMessage, Role};

fn user_msg(text: &str) -> ProviderMessage {
    ProviderMessage {
        role: Role::User,
        content: vec![ContentPart::Text { text: text.to_string() }],
    }
}

fn assistant_msg(text: &str) -> ProviderMessage {
    ProviderMessage {
        role: Role::Assistant,
        content: vec![ContentPart::Text { text: text.to_string() }],
    }
}

fn system_msg(text: &str) -> ProviderMessage {
    ProviderMessage {
        role: Role::System,
        content: vec![ContentPart::Text { text: text.to_string() }],
    }
}

#[tokio::main]
async fn main() {
    let counter = TokenCounter::new();

    let messages = vec![
        system_msg("You are a helpful coding assistant."),
        user_msg("Can you explain what a HashMap is in Rust?"),
        assistant_msg(
            "A HashMap in Rust is a collection that stores key-value pairs. \
             It uses a hashing algorithm to map keys to their associated values, \
             providing O(1) average-case lookup, insertion, and deletion.",
        ),
        user_msg("How do I iterate over a HashMap?"),
        assistant_msg(
            "You can iterate over a HashMap using a for loop: \
             `for (key, value) in &map { ... }`. You can also use `.keys()`, \
             `.values()`, or `.iter()` for more specific iteration patterns.",
        ),
        user_msg("What about BTreeMap? When should I use it instead?"),
        assistant_msg(
            "Use BTreeMap when you need keys in sorted order. BTreeMap provides \
             O(log n) operations but maintains ordering. HashMap is faster for \
             unsorted access patterns.",
        ),
    ];

    let total_tokens = counter.estimate_messages(&messages);
    println!("Conversation has {} messages", messages.len());
    println!("Estimated token count: {total_tokens}");

    // Keep the last 4 non-system messages; trigger above 100 tokens.
    let strategy = SlidingWindowStrategy::new(4, 100);

    let should = strategy.should_compact(&messages, total_tokens);
    println!("\nShould compact (threshold=100, current={total_tokens}): {should}");

    if should {
        let compacted = strategy
            .compact(messages.clone())
            .await
            .expect("compaction should succeed");

        let compacted_tokens = counter.estimate_messages(&compacted);

        println!("\nBefore compaction:");
        println!("  Messages: {}", messages.len());
        println!("  Tokens:   {total_tokens}");

        println!("\nAfter compaction:");
        println!("  Messages: {}", compacted.len());
        println!("  Tokens:   {compacted_tokens}");

        println!("\nRetained messages:");
        for msg in &compacted {
            let role = match msg.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::System => "System",
            };
            let text = msg
                .content
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("");
            let display = if text.len() > 60 {
                format!("{}...", &text[..60])
            } else {
                text
            };
            println!("  [{role}] {display}");
        }
    } else {
        println!("No compaction needed.");
    }
}
