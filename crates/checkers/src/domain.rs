use warden_core::{CheckerError, DomainSettings, ModerationItem, Rule, Verdict};
use warden_rules::{Capability, Checker};

/// Decides link posts by the host they point at.
///
/// Matching is a case-insensitive substring test against the full URL, so
/// `youtube.com` also covers `m.youtube.com`. Approved hosts win over
/// rejected ones.
#[derive(Debug, Clone)]
pub struct DomainChecker {
    approved: Vec<String>,
    rejected: Vec<String>,
}

impl DomainChecker {
    pub fn new(settings: &DomainSettings) -> Self {
        Self {
            approved: normalize(&settings.approved),
            rejected: normalize(&settings.rejected),
        }
    }
}

pub(crate) fn normalize(hosts: &[String]) -> Vec<String> {
    hosts
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

pub(crate) fn matches_any(url: &str, hosts: &[String]) -> bool {
    hosts.iter().any(|host| url.contains(host.as_str()))
}

impl Checker for DomainChecker {
    fn name(&self) -> &str {
        "domain"
    }

    fn capability(&self) -> Capability {
        Capability::PostOnly
    }

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        let url = match (&item.url, item.is_self) {
            (Some(url), false) => url.to_ascii_lowercase(),
            _ => return Ok(Verdict::pass()),
        };

        if matches_any(&url, &self.approved) {
            Ok(Verdict::approve())
        } else if matches_any(&url, &self.rejected) {
            Ok(Verdict::remove(Rule::Domain))
        } else {
            Ok(Verdict::pass())
        }
    }
}
