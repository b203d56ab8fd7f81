pub mod config;
pub mod error;
pub mod item;
pub mod verdict;

pub use config::{
    AllSettings, CheckerSettings, Config, DomainSettings, FlairSettings, HighlightSettings, PromotionSettings,
};
pub use error::*;
pub use item::*;
pub use verdict::*;
