/// TOML configuration and the per-request configuration manager.
pub mod toml_config;
/// Text helpers shared by prompt builders.
pub mod text;
