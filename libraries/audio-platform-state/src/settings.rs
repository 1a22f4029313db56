/// Platform state settings
use crate::error::{PlatformStateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix of every setting
pub const ENV_PREFIX: &str = "AUDIO_HAL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlatformStateSettings {
    /// Configuration file searched first
    #[serde(default = "default_vendor_conf_path")]
    pub vendor_conf_path: PathBuf,

    /// Configuration file used when the vendor one is missing
    #[serde(default = "default_system_conf_path")]
    pub system_conf_path: PathBuf,

    #[serde(default = "default_route_conf_dir")]
    pub route_conf_dir: PathBuf,

    #[serde(default = "default_route_conf_file_name")]
    pub route_conf_file_name: String,

    /// Forward informational routing subsystem logs
    #[serde(default)]
    pub pfw_verbose: bool,

    /// Routing subsystem parameter holding the diagnostic file list
    #[serde(default = "default_debug_files_path_list")]
    pub debug_files_path_list: String,

    #[serde(default = "default_debug_chunk_size")]
    pub debug_chunk_size: usize,
}

impl Default for PlatformStateSettings {
    fn default() -> Self {
        Self {
            vendor_conf_path: default_vendor_conf_path(),
            system_conf_path: default_system_conf_path(),
            route_conf_dir: default_route_conf_dir(),
            route_conf_file_name: default_route_conf_file_name(),
            pfw_verbose: false,
            debug_files_path_list: default_debug_files_path_list(),
            debug_chunk_size: default_debug_chunk_size(),
        }
    }
}

impl PlatformStateSettings {
    /// Load settings from an optional file and the environment
    ///
    /// Environment variables are prefixed with `AUDIO_HAL_`, for example
    /// `AUDIO_HAL_PFW_VERBOSE=true`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config = settings
            .build()
            .map_err(|e| PlatformStateError::Settings(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| PlatformStateError::Settings(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.debug_chunk_size == 0 {
            return Err(PlatformStateError::Settings(
                "debug_chunk_size must be at least 1".to_string(),
            ));
        }
        for (name, path) in [
            ("vendor_conf_path", &self.vendor_conf_path),
            ("system_conf_path", &self.system_conf_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(PlatformStateError::Settings(format!("{} is empty", name)));
            }
        }
        if self.route_conf_file_name.is_empty() {
            return Err(PlatformStateError::Settings(
                "route_conf_file_name is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration file of the routing subsystem
    pub fn route_conf_path(&self) -> PathBuf {
        self.route_conf_dir.join(&self.route_conf_file_name)
    }
}

// Default values
fn default_vendor_conf_path() -> PathBuf {
    PathBuf::from("/vendor/etc/audio_hal.conf")
}

fn default_system_conf_path() -> PathBuf {
    PathBuf::from("/system/etc/audio_hal.conf")
}

fn default_route_conf_dir() -> PathBuf {
    PathBuf::from("/etc/parameter-framework/")
}

fn default_route_conf_file_name() -> String {
    "RouteParameterFramework.xml".to_string()
}

fn default_debug_files_path_list() -> String {
    "/Route/debug_fs/debug_files/path_list/".to_string()
}

fn default_debug_chunk_size() -> usize {
    998
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = PlatformStateSettings::default();
        assert_eq!(
            settings.route_conf_path(),
            PathBuf::from("/etc/parameter-framework/RouteParameterFramework.xml")
        );
        assert_eq!(settings.debug_chunk_size, 998);
        assert!(!settings.pfw_verbose);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "vendor_conf_path = \"/tmp/vendor.conf\"").unwrap();
        writeln!(file, "pfw_verbose = true").unwrap();

        let settings = PlatformStateSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.vendor_conf_path, PathBuf::from("/tmp/vendor.conf"));
        assert!(settings.pfw_verbose);
        assert_eq!(settings.system_conf_path, default_system_conf_path());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let settings = PlatformStateSettings {
            debug_chunk_size: 0,
            ..PlatformStateSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(PlatformStateError::Settings(_))
        ));
    }
}
