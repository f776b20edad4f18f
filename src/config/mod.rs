mod mirror_config;

pub use mirror_config::{MirrorConfig, MirrorConfigError};
