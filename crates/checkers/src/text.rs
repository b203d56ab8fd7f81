use warden_core::{CheckerError, ModerationItem, Verdict};
use warden_rules::{Capability, Checker};

/// Approves text posts; link posts are left to the other checkers.
#[derive(Debug, Default)]
pub struct TextChecker;

impl Checker for TextChecker {
    fn name(&self) -> &str {
        "text"
    }

    fn capability(&self) -> Capability {
        Capability::PostOnly
    }

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        if item.is_self {
            Ok(Verdict::approve())
        } else {
            Ok(Verdict::pass())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn self_post_is_approved() {
        let post = ModerationItem::post("p1", "alice", Utc::now()).self_post();
        assert_eq!(TextChecker.evaluate(&post).unwrap(), Verdict::approve());
    }

    #[test]
    fn link_post_passes() {
        let post = ModerationItem::post("p1", "alice", Utc::now()).with_url("https://example.com/a");
        assert_eq!(TextChecker.evaluate(&post).unwrap(), Verdict::pass());
    }
}
