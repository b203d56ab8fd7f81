use std::fmt;

/// What a single checker wants done with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Approve,
    Remove,
    /// Leave the item for a human moderator; suppresses approval.
    Manual,
    /// No opinion.
    Pass,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Approve => "approve",
            Action::Remove => "remove",
            Action::Manual => "manual",
            Action::Pass => "pass",
        };
        f.write_str(s)
    }
}

/// Rule an item broke, passed along with a removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    Flair,
    Domain,
    Promotion,
    Custom(String),
}

impl Rule {
    pub fn id(&self) -> &str {
        match self {
            Rule::Flair => "flair",
            Rule::Domain => "domain",
            Rule::Promotion => "promotion",
            Rule::Custom(id) => id,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One checker's decision about one item. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub action: Action,
    pub reason: Option<Rule>,
}

impl Verdict {
    pub fn approve() -> Self {
        Self { action: Action::Approve, reason: None }
    }

    pub fn remove(rule: Rule) -> Self {
        Self { action: Action::Remove, reason: Some(rule) }
    }

    pub fn manual() -> Self {
        Self { action: Action::Manual, reason: None }
    }

    pub fn pass() -> Self {
        Self { action: Action::Pass, reason: None }
    }
}
