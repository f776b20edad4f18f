use std::path::{Path, PathBuf};
use std::time::Duration;

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "mirrorsync.yaml";

fn get_default_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Settings read from a YAML config file. Every key is optional; command
/// line arguments take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub interval: Option<Duration>,
    pub checksum: Option<bool>,
}

impl MirrorConfig {
    /// Reads `explicit` when given, otherwise `mirrorsync.yaml` in `root` if
    /// it exists.
    pub async fn discover(
        explicit: Option<&Path>,
        root: &Path,
    ) -> Result<Option<Self>, MirrorConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = get_default_config_path(root);
                if !default_path.is_file() {
                    debug!("No config file at {}", default_path.display());
                    return Ok(None);
                }
                default_path
            }
        };
        Self::from_path(path).await.map(Some)
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, MirrorConfigError> {
        debug!("Reading config file: {}", path.display());
        let bytes = fs::read(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    fn apply_key(&mut self, key: &str, value: &Yaml) -> Result<(), MirrorConfigError> {
        match key {
            "source" => self.source = Some(Self::path_value(key, value)?),
            "replica" => self.replica = Some(Self::path_value(key, value)?),
            "log_file" => self.log_file = Some(Self::path_value(key, value)?),
            "interval" => match value {
                Yaml::Value(Scalar::Integer(seconds)) if *seconds > 0 => {
                    self.interval = Some(Duration::from_secs(seconds.unsigned_abs()));
                }
                _ => {
                    return InvalidValueSnafu {
                        key,
                        expected: "a positive number of seconds",
                    }
                    .fail();
                }
            },
            "checksum" => match value {
                Yaml::Value(Scalar::Boolean(checksum)) => self.checksum = Some(*checksum),
                _ => {
                    return InvalidValueSnafu {
                        key,
                        expected: "true or false",
                    }
                    .fail();
                }
            },
            other => debug!("Ignoring unknown config key '{other}'"),
        }
        Ok(())
    }

    fn path_value(key: &str, value: &Yaml) -> Result<PathBuf, MirrorConfigError> {
        match value {
            Yaml::Value(Scalar::String(path)) if !path.is_empty() => {
                Ok(PathBuf::from(path.to_string()))
            }
            _ => InvalidValueSnafu {
                key,
                expected: "a non-empty path",
            }
            .fail(),
        }
    }

    fn parse_mapping(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, MirrorConfigError> {
        let mut config = Self::default();
        for (key, value) in top_level {
            if let Yaml::Value(Scalar::String(key)) = key {
                config.apply_key(key, value)?;
            } else {
                debug!("Skipping non-string config key: {:?}", key);
            }
        }
        Ok(config)
    }
}

impl TryFrom<&str> for MirrorConfig {
    type Error = MirrorConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            // An empty file configures nothing.
            return Ok(Self::default());
        };

        let top_level = document
            .as_mapping()
            .context(TopLevelNotMapSnafu)?;
        Self::parse_mapping(top_level)
    }
}

#[derive(Debug, Snafu)]
pub enum MirrorConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The config file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Config key '{}' should be {}", key, expected))]
    InvalidValue { key: String, expected: &'static str },
}
