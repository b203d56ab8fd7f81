//! The capability-typed checker interface.

use std::fmt;
use std::str::FromStr;

use warden_core::{CheckerError, ItemKind, ModerationItem, Verdict};

/// Which item streams a checker applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PostOnly,
    CommentOnly,
    Both,
}

impl Capability {
    pub fn applies_to(self, kind: ItemKind) -> bool {
        matches!(
            (self, kind),
            (Capability::Both, _)
                | (Capability::PostOnly, ItemKind::Post)
                | (Capability::CommentOnly, ItemKind::Comment)
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::PostOnly => f.write_str("post"),
            Capability::CommentOnly => f.write_str("comment"),
            Capability::Both => f.write_str("both"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown capability '{0}': expected post, comment, or both")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "submission" => Ok(Capability::PostOnly),
            "comment" => Ok(Capability::CommentOnly),
            "both" | "all" => Ok(Capability::Both),
            _ => Err(UnknownCapability(s.to_string())),
        }
    }
}

/// A rule unit evaluated against every item of the kinds it declares.
///
/// Checkers own whatever state they need; state also touched by a periodic
/// job must be guarded by the checker itself.
pub trait Checker: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn capability(&self) -> Capability;

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError>;
}
