//! Decoder configuration

/// How tab characters in leading whitespace are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabPolicy {
    /// Only spaces count as indentation; a tab ends the indent and is content
    #[default]
    Literal,

    /// Each leading tab counts as this many columns
    Expand(usize),

    /// A tab inside leading whitespace is a syntax error
    Reject,
}

/// Options shared by both decoders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Tab handling in the line classifier
    pub tab_policy: TabPolicy,

    /// Fail on malformed flow collections and reserved indicators instead of
    /// degrading them to strings
    pub strict_flow: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab_policy(mut self, policy: TabPolicy) -> Self {
        self.tab_policy = policy;
        self
    }

    pub fn with_strict_flow(mut self, strict: bool) -> Self {
        self.strict_flow = strict;
        self
    }
}
