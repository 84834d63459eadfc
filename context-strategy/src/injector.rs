//! Turn/token-triggered system message injection.
//!
//! Complements the compaction strategies: instead of shrinking the window,
//! `SystemInjector` adds a reminder message when a rule fires. Used by the
//! tool loop to nudge long-running conversations (e.g. "be concise" every
//! few turns, or a warning once the context is getting large).

/// A condition that triggers a system message injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionTrigger {
    /// Fires when the current turn number is a positive multiple of `n`.
    EveryNTurns(u32),
    /// Fires once the estimated token count is at or above the threshold.
    OnTokenThreshold(usize),
}

impl InjectionTrigger {
    fn fires(&self, turn: u32, token_count: usize) -> bool {
        match *self {
            InjectionTrigger::EveryNTurns(n) => n > 0 && turn > 0 && turn % n == 0,
            InjectionTrigger::OnTokenThreshold(threshold) => token_count >= threshold,
        }
    }
}

/// Holds a set of injection rules and evaluates them against a turn/token pair.
#[derive(Debug, Default)]
pub struct SystemInjector {
    rules: Vec<(InjectionTrigger, String)>,
}

impl SystemInjector {
    /// Creates an injector with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registers a rule: when `trigger` fires, `content` is returned by [`check`](Self::check).
    pub fn add_rule(&mut self, trigger: InjectionTrigger, content: String) {
        self.rules.push((trigger, content));
    }

    /// Returns the content of every rule whose trigger fires for this turn/token pair.
    #[must_use]
    pub fn check(&self, turn: u32, token_count: usize) -> Vec<String> {
        self.rules
            .iter()
            .filter(|(trigger, _)| trigger.fires(turn, token_count))
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_every_n_turns() {
        let mut injector = SystemInjector::new();
        injector.add_rule(InjectionTrigger::EveryNTurns(5), "reminder".to_string());
        assert!(injector.check(5, 0).contains(&"reminder".to_string()));
        assert!(injector.check(1, 0).is_empty());
    }

    #[test]
    fn does_not_fire_on_turn_zero() {
        let mut injector = SystemInjector::new();
        injector.add_rule(InjectionTrigger::EveryNTurns(5), "content".to_string());
        assert!(injector.check(0, 0).is_empty());
    }

    #[test]
    fn fires_on_token_threshold() {
        let mut injector = SystemInjector::new();
        injector.add_rule(InjectionTrigger::OnTokenThreshold(50_000), "warn".to_string());
        assert!(injector.check(1, 50_000).contains(&"warn".to_string()));
        assert!(injector.check(1, 49_999).is_empty());
    }

    #[test]
    fn no_rules_returns_empty() {
        let injector = SystemInjector::new();
        assert!(injector.check(10, 100_000).is_empty());
    }
}
