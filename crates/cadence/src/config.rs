//! `cadence.toml` plus command-line overrides.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use cadence_core::input::{KeyMap, SystemActions, host_key};
use cadence_runtime::{RuntimeConfig, TransferMode};

use crate::args::Args;

pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transfer {
    Synchronous,
    #[default]
    Overlapped,
}

impl From<Transfer> for TransferMode {
    fn from(value: Transfer) -> Self {
        match value {
            Transfer::Synchronous => TransferMode::Synchronous,
            Transfer::Overlapped => TransferMode::Overlapped,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("`{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub rom_file: Option<PathBuf>,
    pub palette_file: Option<PathBuf>,
    pub frame_rate: f64,
    pub audio_enabled: bool,
    pub audio_frequency: u32,
    pub render_scale: u32,
    pub vsync: bool,
    pub transfer: Transfer,
    pub worker_stack_size: usize,
    pub width: usize,
    pub height: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            rom_file: None,
            palette_file: None,
            frame_rate: cadence_runtime::DEFAULT_FRAME_RATE,
            audio_enabled: true,
            audio_frequency: 22_050,
            render_scale: 3,
            vsync: false,
            transfer: Transfer::default(),
            worker_stack_size: cadence_runtime::DEFAULT_WORKER_STACK_SIZE,
            width: 256,
            height: 240,
        }
    }
}

impl Configuration {
    /// Load `explicit`, or the default file when it exists.
    ///
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Command-line flags win over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(rom) = &args.rom {
            self.rom_file = Some(rom.clone());
        }
        if let Some(palette) = &args.palette {
            self.palette_file = Some(palette.clone());
        }
        if let Some(fps) = args.fps {
            self.frame_rate = fps;
        }
        if let Some(transfer) = args.transfer {
            self.transfer = transfer;
        }
        if args.no_audio {
            self.audio_enabled = false;
        }
        if let Some(scale) = args.scale {
            self.render_scale = scale;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return invalid("frame_rate", "must be a positive number");
        }
        if self.width == 0 || self.height == 0 {
            return invalid("width/height", "must be non-zero");
        }
        if self.render_scale == 0 {
            return invalid("render_scale", "must be at least 1");
        }
        if self.audio_enabled && self.audio_frequency == 0 {
            return invalid("audio_frequency", "must be non-zero");
        }
        Ok(())
    }

    pub fn runtime_config(&self, frame_limit: Option<u64>) -> RuntimeConfig {
        RuntimeConfig {
            frame_rate: self.frame_rate,
            transfer: self.transfer.into(),
            worker_stack_size: self.worker_stack_size,
            key_map: key_map(),
            frame_limit,
        }
    }
}

/// Native layout plus ZR to quit and ZL to reset.
pub fn key_map() -> KeyMap {
    KeyMap::default()
        .bind_system(host_key::ZR, SystemActions::QUIT)
        .bind_system(host_key::ZL, SystemActions::RESET)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Configuration::parse("").expect("parse"), Configuration::default());
    }

    #[test]
    fn parses_every_field() {
        let config = Configuration::parse(
            r#"
            rom_file = "game.nes"
            palette_file = "smooth.pal"
            frame_rate = 50.0
            audio_enabled = false
            audio_frequency = 44100
            render_scale = 2
            vsync = true
            transfer = "synchronous"
            worker_stack_size = 131072
            width = 320
            height = 200
            "#,
        )
        .expect("parse");

        assert_eq!(config.rom_file, Some(PathBuf::from("game.nes")));
        assert_eq!(config.palette_file, Some(PathBuf::from("smooth.pal")));
        assert_eq!(config.frame_rate, 50.0);
        assert!(!config.audio_enabled);
        assert_eq!(config.audio_frequency, 44_100);
        assert_eq!(config.render_scale, 2);
        assert!(config.vsync);
        assert_eq!(config.transfer, Transfer::Synchronous);
        assert_eq!(config.worker_stack_size, 128 * 1024);
        assert_eq!((config.width, config.height), (320, 200));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Configuration::parse("scanlines = true").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Configuration::load(Some(Path::new("/nonexistent/cadence.toml")))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn args_override_the_file() {
        let mut config = Configuration::default();
        let args = Args::parse_from([
            "cadence",
            "--fps",
            "30",
            "--transfer",
            "synchronous",
            "--no-audio",
            "--scale",
            "1",
            "--rom",
            "other.bin",
        ]);
        config.apply_args(&args);

        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.transfer, Transfer::Synchronous);
        assert!(!config.audio_enabled);
        assert_eq!(config.render_scale, 1);
        assert_eq!(config.rom_file, Some(PathBuf::from("other.bin")));
    }

    #[test]
    fn rejects_unusable_values() {
        for config in [
            Configuration {
                frame_rate: 0.0,
                ..Configuration::default()
            },
            Configuration {
                width: 0,
                ..Configuration::default()
            },
            Configuration {
                render_scale: 0,
                ..Configuration::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn runtime_config_binds_system_keys() {
        let runtime = Configuration::default().runtime_config(Some(10));
        assert_eq!(runtime.frame_limit, Some(10));
        assert_eq!(runtime.transfer, TransferMode::Overlapped);
        assert_eq!(
            runtime.key_map.binding(host_key::ZR),
            Some(cadence_core::input::Binding::System(SystemActions::QUIT))
        );
    }
}
