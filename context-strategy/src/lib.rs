#![deny(missing_docs)]
//! Context compaction strategies for `agentex-llm`'s [`ContextStrategy`] trait.
//!
//! - [`SlidingWindowStrategy`] — drop oldest non-system messages
//! - [`ToolResultClearingStrategy`] — replace stale tool results with a placeholder
//! - [`SummarizationStrategy`] — fold old messages into an LLM-written summary
//! - [`CompositeStrategy`] — chain several, stopping once under budget
//! - [`SystemInjector`] — turn/token-triggered reminder injection
//! - [`PersistentContext`] — priority-ordered sections that are never compacted
//!
//! `agentex_llm::NoCompaction` (a pass-through strategy) lives in `agentex-llm`
//! itself since it has no dependency on a token counter.

pub mod counter;
pub mod injector;
pub mod persistent;
pub mod strategies;

pub use counter::TokenCounter;
pub use injector::{InjectionTrigger, SystemInjector};
pub use persistent::{ContextSection, PersistentContext};
pub use strategies::{
    BoxedStrategy, CompositeStrategy, SlidingWindowStrategy, SummarizationStrategy,
    ToolResultClearingStrategy,
};
