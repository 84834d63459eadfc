//! Priority-ordered, always-present context sections.
//!
//! Unlike the compaction strategies, `PersistentContext` never drops
//! anything — it renders a fixed set of labeled sections (role, rules,
//! reminders) in priority order ahead of the compactable message window.

/// A single labeled block of persistent context, rendered in `priority` order
/// (lower first).
#[derive(Debug, Clone)]
pub struct ContextSection {
    /// Heading shown above the section's content.
    pub label: String,
    /// Section body.
    pub content: String,
    /// Sort key; lower renders first. Ties keep insertion order.
    pub priority: usize,
}

/// An ordered collection of [`ContextSection`]s, rendered as markdown.
#[derive(Debug, Default)]
pub struct PersistentContext {
    sections: Vec<ContextSection>,
}

impl PersistentContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Appends a section.
    pub fn add_section(&mut self, section: ContextSection) {
        self.sections.push(section);
    }

    /// Renders all sections as `## label\ncontent`, sorted by priority and
    /// separated by a blank line. Empty context renders as an empty string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut ordered: Vec<&ContextSection> = self.sections.iter().collect();
        ordered.sort_by_key(|s| s.priority);

        ordered
            .iter()
            .map(|s| format!("## {}\n{}", s.label, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sections_in_priority_order() {
        let mut ctx = PersistentContext::new();
        ctx.add_section(ContextSection {
            label: "Rules".into(),
            content: "Be concise.".into(),
            priority: 10,
        });
        ctx.add_section(ContextSection {
            label: "Role".into(),
            content: "You are helpful.".into(),
            priority: 0,
        });
        let rendered = ctx.render();
        assert!(rendered.find("Role").unwrap() < rendered.find("Rules").unwrap());
    }

    #[test]
    fn empty_context_renders_empty_string() {
        assert_eq!(PersistentContext::new().render(), "");
    }

    #[test]
    fn single_section_renders_correctly() {
        let mut ctx = PersistentContext::new();
        ctx.add_section(ContextSection {
            label: "Solo".into(),
            content: "Only section.".into(),
            priority: 0,
        });
        assert_eq!(ctx.render(), "## Solo\nOnly section.");
    }

    #[test]
    fn sections_separated_by_double_newline() {
        let mut ctx = PersistentContext::new();
        ctx.add_section(ContextSection {
            label: "A".into(),
            content: "aaa".into(),
            priority: 0,
        });
        ctx.add_section(ContextSection {
            label: "B".into(),
            content: "bbb".into(),
            priority: 1,
        });
        assert_eq!(ctx.render(), "## A\naaa\n\n## B\nbbb");
    }
}
