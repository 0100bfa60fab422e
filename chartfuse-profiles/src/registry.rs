//! Thread-safe profile registry
//!
//! Profiles are registered by name, validated on the way in and handed out
//! as owned [`PipelineConfig`] copies so readers never hold the lock while
//! a pipeline runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use chartfuse_core::PipelineConfig;

use crate::{parse_profile, ProfileError, BUNDLED_PROFILES};

/// Profile name of a `*.json` path: its file stem
pub(crate) fn profile_name(path: &Path) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// Named pipeline configurations
pub struct ProfileRegistry {
    profiles: RwLock<BTreeMap<String, PipelineConfig>>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a registry holding every bundled profile
    pub fn with_builtin() -> Result<Self, ProfileError> {
        let registry = Self::new();
        for file in BUNDLED_PROFILES.files() {
            let Some(name) = profile_name(file.path()) else {
                continue;
            };
            let json = file.contents_utf8().ok_or_else(|| ProfileError::Parse {
                name: name.clone(),
                message: "profile is not UTF-8".to_string(),
            })?;
            registry.register_json(&name, json)?;
        }
        Ok(registry)
    }

    /// Register a configuration, replacing any profile of the same name
    pub fn register(&self, name: &str, config: PipelineConfig) -> Result<(), ProfileError> {
        config.validate().map_err(|error| ProfileError::Invalid {
            name: name.to_string(),
            error,
        })?;

        let mut profiles = self.profiles.write().map_err(|_| ProfileError::Poisoned)?;
        profiles.insert(name.to_string(), config);
        Ok(())
    }

    /// Parse, validate and register a JSON document
    pub fn register_json(&self, name: &str, json: &str) -> Result<(), ProfileError> {
        let config = parse_profile(name, json)?;
        self.register(name, config)
    }

    /// Register every `*.json` file in `dir`, named by file stem
    ///
    /// Stops at the first file that fails to load; profiles registered
    /// before it stay registered. Returns the number of profiles loaded.
    pub fn load_from_dir(&self, dir: impl AsRef<Path>) -> Result<usize, ProfileError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                if let Some(name) = profile_name(&path) {
                    paths.push((name, path));
                }
            }
        }
        paths.sort();

        for (name, path) in &paths {
            let json = fs::read_to_string(path)?;
            self.register_json(name, &json)?;
        }
        Ok(paths.len())
    }

    /// Configuration registered under `name`
    pub fn get(&self, name: &str) -> Result<PipelineConfig, ProfileError> {
        let profiles = self.profiles.read().map_err(|_| ProfileError::Poisoned)?;
        profiles
            .get(name)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }

    /// Whether a profile is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.profiles
            .read()
            .map(|profiles| profiles.contains_key(name))
            .unwrap_or(false)
    }

    /// Remove a profile, returning its configuration
    pub fn remove(&self, name: &str) -> Result<PipelineConfig, ProfileError> {
        let mut profiles = self.profiles.write().map_err(|_| ProfileError::Poisoned)?;
        profiles
            .remove(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Result<Vec<String>, ProfileError> {
        let profiles = self.profiles.read().map_err(|_| ProfileError::Poisoned)?;
        Ok(profiles.keys().cloned().collect())
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write(dir: &Path, file: &str, contents: &str) {
        let mut handle = File::create(dir.join(file)).unwrap();
        handle.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn register_and_retrieve() {
        let registry = ProfileRegistry::new();
        let mut config = PipelineConfig::default();
        config.temporal.window_size = 3;

        registry.register("short", config.clone()).unwrap();

        assert!(registry.contains("short"));
        assert_eq!(registry.get("short").unwrap(), config);
        assert!(matches!(registry.get("long"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let registry = ProfileRegistry::new();
        let mut config = PipelineConfig::default();
        config.delta.change_threshold_bits = 65;

        assert!(matches!(
            registry.register("broken", config),
            Err(ProfileError::Invalid { .. })
        ));
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn re_registering_replaces() {
        let registry = ProfileRegistry::new();
        registry.register_json("p", r#"{ "temporal": { "window_size": 3 } }"#).unwrap();
        registry.register_json("p", r#"{ "temporal": { "window_size": 9 } }"#).unwrap();

        assert_eq!(registry.get("p").unwrap().temporal.window_size, 9);
        assert_eq!(registry.names().unwrap(), ["p"]);
    }

    #[test]
    fn remove_profile() {
        let registry = ProfileRegistry::with_builtin().unwrap();
        registry.remove("balanced").unwrap();

        assert!(!registry.contains("balanced"));
        assert!(matches!(registry.remove("balanced"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "night.json", r#"{ "delta": { "change_threshold_bits": 8 } }"#);
        write(dir.path(), "day.json", "{}");
        write(dir.path(), "notes.txt", "not a profile");

        let registry = ProfileRegistry::new();
        assert_eq!(registry.load_from_dir(dir.path()).unwrap(), 2);

        assert_eq!(registry.names().unwrap(), ["day", "night"]);
        assert_eq!(registry.get("night").unwrap().delta.change_threshold_bits, 8);
        assert_eq!(registry.get("day").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn load_directory_stops_at_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "b.json", "{ broken");

        let registry = ProfileRegistry::new();
        let result = registry.load_from_dir(dir.path());

        assert!(matches!(result, Err(ProfileError::Parse { ref name, .. }) if name == "b"));
        assert!(registry.contains("a"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProfileRegistry::new();

        assert!(matches!(
            registry.load_from_dir(dir.path().join("absent")),
            Err(ProfileError::Io(_))
        ));
    }

    #[test]
    fn profile_names_from_paths() {
        assert_eq!(profile_name(Path::new("dir/low_power.json")), Some("low_power".to_string()));
        assert_eq!(profile_name(Path::new("dir/readme.md")), None);
        assert_eq!(profile_name(Path::new("dir/noext")), None);
    }
}
