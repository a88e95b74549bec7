//! Shared types, error model, and configuration for prgen.
//!
//! This crate is the foundation depended on by all other prgen crates.
//! It provides:
//! - [`PrgenError`]: the unified error type
//! - Domain types ([`ProjectCategory`], [`ChangeSet`])
//! - Configuration ([`AppConfig`], config loading and env overrides)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DiffConfig, LlmConfig, OutputConfig, PromptsConfig, apply_env_overrides,
    apply_env_overrides_from, config_dir, config_file_path, expand_home, init_config,
    load_config, load_config_from, mask_secret,
};
pub use error::{PrgenError, Result};
pub use types::{ChangeSet, ProjectCategory};
