//! Shared types, error model, and configuration for the positioning pipeline.
//!
//! This crate is the foundation depended on by all other crates.
//! It provides:
//! - [`PositioningError`]: the unified error type
//! - Collection types ([`CompanyScrape`], [`PageRecord`]) and [`slugify`]
//! - The validated [`PositioningBrief`] and its [`Entry`] decoding
//! - Configuration ([`AppConfig`], [`EnvVars`], provider resolution)

pub mod brief;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use brief::{
    AudienceMessage, Avoidance, CompetitiveResponse, Entry, EntityElements, PositioningBrief,
    PositioningStatement, REQUIRED_FRAMEWORK_KEYS, REQUIRED_KEYS, ValueProposition,
    WhiteSpaceItem, check_required_keys, text_of,
};
pub use config::{
    AppConfig, CollectConfig, CollectionConfig, DefaultsConfig, EnvVars, GenerationConfig,
    GenerationOverrides, GenerationSettings, PageTarget, ProviderChoice, RenderConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_generation,
};
pub use error::{PositioningError, Result};
pub use types::{CompanyScrape, HOMEPAGE, Heading, PageRecord, slugify};
