use std::sync::Arc;

use warden_rules::{ExtensionContext, ModuleCatalog, SetupError};

use crate::domain::DomainChecker;
use crate::env::CheckerEnv;
use crate::text::TextChecker;
use crate::{all, flair, highlight, promotion};

fn text_setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    ctx.add_extension(Arc::new(TextChecker));
    Ok(())
}

fn domain_setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    let checker = DomainChecker::new(&ctx.env().settings.domains);
    ctx.add_extension(Arc::new(checker));
    Ok(())
}

/// Every module shipped with the bot, by name.
pub fn builtin_catalog() -> ModuleCatalog<CheckerEnv> {
    ModuleCatalog::new()
        .with_module("text", text_setup)
        .with_module("domain", domain_setup)
        .with_module("flair", flair::setup)
        .with_module("highlight", highlight::setup)
        .with_module("promotion", promotion::setup)
        .with_module("all", all::setup)
}
