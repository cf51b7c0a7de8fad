//! # Configuration Layer
//!
//! Configuration is a set of named sections (`global`, plus one per API family)
//! holding string values. Three layers are consulted on every lookup, highest
//! precedence first:
//!
//! 1. **Overrides**: values supplied on the command line for this run only.
//! 2. **Persisted**: values read from the user's config file.
//! 3. **Defaults**: the built-in [`DEFAULTS`] table.
//!
//! [`Config::set`] and [`Config::delete`] only ever touch the persisted layer, and
//! [`Config::override_value`] only the override layer, so a `set` can never hide a
//! value given on the command line.
//!
//! ## Storage Format
//!
//! The file is TOML with one table per section:
//!
//! ```text
//! # cirrus configuration file
//! [global]
//! apis = "nova synnefo"
//! token = "..."
//!
//! [storage]
//! url = "https://..."
//! ```
//!
//! Unknown sections and keys are kept as they are and written back untouched,
//! with their TOML types: lookups see a string rendering, the file keeps the
//! integer, array or table it had.

use crate::error::ConfigError;
use directories::BaseDirs;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Environment variable that replaces the default config file path.
pub const CONFIG_ENV: &str = "CIRRUS_CONFIG";

const CONFIG_FILENAME: &str = ".cirrusrc";

const HEADER: &str = "# cirrus configuration file\n";

pub const GLOBAL: &str = "global";

/// Built-in defaults as `(section, key, value)`.
pub const DEFAULTS: &[(&str, &str, &str)] = &[
    (GLOBAL, "apis", "nova synnefo glance plankton"),
    (GLOBAL, "token", ""),
    (GLOBAL, "compute_url", "https://cloud.example.org/compute/v1.1"),
    (GLOBAL, "images_url", "https://cloud.example.org/images"),
    (GLOBAL, "storage_url", "https://cloud.example.org/storage/v1"),
    (GLOBAL, "account", ""),
    (GLOBAL, "container", ""),
];

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Looks up the built-in default for `section.key`.
pub fn default_value(section: &str, key: &str) -> Option<&'static str> {
    DEFAULTS
        .iter()
        .find(|(s, k, _)| *s == section && *k == key)
        .map(|(_, _, v)| *v)
}

/// Splits a user-facing key into `(section, key)`.
///
/// A bare key addresses the `global` section; `storage.url` addresses `url` in
/// the `storage` section.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('.') {
        Some((section, rest)) if !section.is_empty() && !rest.is_empty() => (section, rest),
        _ => (GLOBAL, key),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    /// The file as parsed; `set` and `delete` edit it and `write` saves it.
    document: toml::Table,
    /// String view of `document` used for lookups.
    persisted: Sections,
    overrides: Sections,
}

impl Config {
    /// An empty configuration bound to `path`; nothing is read.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            document: toml::Table::new(),
            persisted: Sections::new(),
            overrides: Sections::new(),
        }
    }

    /// Loads the file at `path`. A missing file yields an empty persisted layer.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::new(path);

        if !config.path.exists() {
            debug!("No config file at {}", config.path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(&config.path).map_err(|source| ConfigError::Read {
            path: config.path.clone(),
            source,
        })?;
        config.document = parse(&config.path, &content)?;
        config.persisted = string_view(&config.document);
        debug!("Loaded config from {}", config.path.display());
        Ok(config)
    }

    /// Loads from `$CIRRUS_CONFIG`, falling back to `~/.cirrusrc`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_path()?,
        };
        Self::load(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The command-line value for `section.key`, if one was given.
    pub fn get_override(&self, section: &str, key: &str) -> Option<&str> {
        lookup(&self.overrides, section, key)
    }

    /// Resolves `section.key`: override, then persisted, then default.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        lookup(&self.overrides, section, key)
            .or_else(|| lookup(&self.persisted, section, key))
            .or_else(|| default_value(section, key))
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.persisted
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());

        if section == GLOBAL {
            remove_bare_key(&mut self.document, key);
        }
        let slot = self
            .document
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !slot.is_table() {
            // A bare top-level key is shadowed by the new section
            *slot = toml::Value::Table(toml::Table::new());
            if let Some(global) = self.persisted.get_mut(GLOBAL) {
                global.remove(section);
            }
        }
        if let toml::Value::Table(values) = slot {
            values.insert(key.to_string(), toml::Value::String(value.to_string()));
        }
    }

    /// Removes a persisted value. Returns whether anything was removed.
    pub fn delete(&mut self, section: &str, key: &str) -> bool {
        let Some(values) = self.persisted.get_mut(section) else {
            return false;
        };
        let removed = values.remove(key).is_some();
        if values.is_empty() {
            self.persisted.remove(section);
        }

        if section == GLOBAL {
            remove_bare_key(&mut self.document, key);
        }
        if let Some(toml::Value::Table(values)) = self.document.get_mut(section) {
            values.remove(key);
            if values.is_empty() {
                self.document.remove(section);
            }
        }
        removed
    }

    pub fn override_value(&mut self, section: &str, key: &str, value: &str) {
        self.overrides
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// The effective values of a section, sorted by key.
    pub fn items(&self, section: &str, include_defaults: bool) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        if include_defaults {
            for (s, k, v) in DEFAULTS {
                if *s == section {
                    merged.insert(k.to_string(), v.to_string());
                }
            }
        }
        for layer in [&self.persisted, &self.overrides] {
            if let Some(values) = layer.get(section) {
                merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged.into_iter().collect()
    }

    /// Every section known to any layer, `global` first.
    pub fn sections(&self) -> Vec<String> {
        let mut names: Vec<String> = vec![GLOBAL.to_string()];
        let others = self
            .persisted
            .keys()
            .chain(self.overrides.keys())
            .map(String::as_str)
            .chain(DEFAULTS.iter().map(|(s, _, _)| *s));
        for name in others {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names[1..].sort();
        names
    }

    /// Writes the persisted layer back to disk.
    ///
    /// The content goes to a temporary file next to the target first, readable
    /// only by the owner, which then replaces the target in one rename.
    pub fn write(&self) -> Result<(), ConfigError> {
        let content = format!("{}{}", HEADER, toml::to_string(&self.document)?);

        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
        restrict_permissions(file.as_file()).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!("Wrote config to {}", self.path.display());
        Ok(())
    }
}

fn default_path() -> Result<PathBuf, ConfigError> {
    let dirs = BaseDirs::new().ok_or(ConfigError::NoHome)?;
    Ok(dirs.home_dir().join(CONFIG_FILENAME))
}

fn lookup<'a>(layer: &'a Sections, section: &str, key: &str) -> Option<&'a str> {
    layer
        .get(section)
        .and_then(|values| values.get(key))
        .map(String::as_str)
}

fn parse(path: &Path, content: &str) -> Result<toml::Table, ConfigError> {
    content.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn string_view(document: &toml::Table) -> Sections {
    let mut sections = Sections::new();
    // Bare top-level keys belong to the global section; a `[global]` entry of
    // the same name wins.
    for (name, value) in document {
        if !value.is_table() {
            sections
                .entry(GLOBAL.to_string())
                .or_default()
                .insert(name.clone(), value_to_string(value));
        }
    }
    for (name, value) in document {
        if let toml::Value::Table(values) = value {
            let entry = sections.entry(name.clone()).or_default();
            for (key, value) in values {
                entry.insert(key.clone(), value_to_string(value));
            }
        }
    }
    sections
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn remove_bare_key(document: &mut toml::Table, key: &str) {
    if document.get(key).is_some_and(|v| !v.is_table()) {
        document.remove(key);
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_resolve() {
        let config = Config::new("/nonexistent/cirrusrc");
        assert_eq!(
            config.get(GLOBAL, "apis"),
            Some("nova synnefo glance plankton")
        );
        assert_eq!(config.get(GLOBAL, "token"), Some(""));
        assert_eq!(config.get(GLOBAL, "no_such_key"), None);
        assert_eq!(config.get("compute", "url"), None);
    }

    #[test]
    fn test_precedence_override_persisted_default() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        assert_eq!(
            config.get(GLOBAL, "compute_url"),
            Some("https://cloud.example.org/compute/v1.1")
        );

        config.set(GLOBAL, "compute_url", "P");
        assert_eq!(config.get(GLOBAL, "compute_url"), Some("P"));

        config.override_value(GLOBAL, "compute_url", "O");
        assert_eq!(config.get(GLOBAL, "compute_url"), Some("O"));
    }

    #[test]
    fn test_set_does_not_drop_override() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        config.override_value(GLOBAL, "token", "from-flag");
        config.set(GLOBAL, "token", "from-file");
        assert_eq!(config.get(GLOBAL, "token"), Some("from-flag"));

        config.delete(GLOBAL, "token");
        assert_eq!(config.get(GLOBAL, "token"), Some("from-flag"));
    }

    #[test]
    fn test_delete_falls_back_to_default() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        config.set(GLOBAL, "apis", "nova");
        assert!(config.delete(GLOBAL, "apis"));
        assert!(!config.delete(GLOBAL, "apis"));
        assert!(!config.delete("nosection", "apis"));
        assert_eq!(
            config.get(GLOBAL, "apis"),
            Some("nova synnefo glance plankton")
        );
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("token"), (GLOBAL, "token"));
        assert_eq!(split_key("storage.url"), ("storage", "url"));
        assert_eq!(split_key(".url"), (GLOBAL, ".url"));
        assert_eq!(split_key("storage."), (GLOBAL, "storage."));
    }

    #[test]
    fn test_items_layers() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        config.set(GLOBAL, "token", "abc");
        config.set(GLOBAL, "colors", "off");
        config.override_value(GLOBAL, "apis", "nova");

        let items = config.items(GLOBAL, false);
        assert_eq!(
            items,
            vec![
                ("apis".to_string(), "nova".to_string()),
                ("colors".to_string(), "off".to_string()),
                ("token".to_string(), "abc".to_string()),
            ]
        );

        let with_defaults = config.items(GLOBAL, true);
        assert!(with_defaults.contains(&("images_url".to_string(), "https://cloud.example.org/images".to_string())));
        assert!(with_defaults.contains(&("token".to_string(), "abc".to_string())));
    }

    #[test]
    fn test_sections_global_first() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        config.set("storage", "url", "x");
        config.set("compute", "token", "y");
        assert_eq!(config.sections(), vec!["global", "compute", "storage"]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path().join("missing")).unwrap();
        assert_eq!(config.get(GLOBAL, "token"), Some(""));
        assert!(config.items(GLOBAL, false).is_empty());
    }

    #[test]
    fn test_write_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");

        let mut config = Config::new(&path);
        config.set(GLOBAL, "token", "ABC123");
        config.set("storage", "account", "alice");
        config.override_value(GLOBAL, "apis", "nova");
        config.write().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
        assert!(!content.contains("apis"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.get(GLOBAL, "token"), Some("ABC123"));
        assert_eq!(loaded.get("storage", "account"), Some("alice"));
        assert_eq!(
            loaded.get(GLOBAL, "apis"),
            Some("nova synnefo glance plankton")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_write_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut config = Config::load(&path).unwrap();
        config.set(GLOBAL, "token", "secret");
        config.write().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_unknown_values_preserved() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        fs::write(
            &path,
            "loose = 1\n[global]\ntoken = \"t\"\nretries = 3\n[custom]\nflag = true\n",
        )
        .unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.get(GLOBAL, "loose"), Some("1"));
        assert_eq!(config.get(GLOBAL, "retries"), Some("3"));
        assert_eq!(config.get("custom", "flag"), Some("true"));

        config.set(GLOBAL, "token", "u");
        config.write().unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.get("custom", "flag"), Some("true"));
        assert_eq!(reloaded.get(GLOBAL, "token"), Some("u"));
    }

    #[test]
    fn test_typed_values_written_back_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        let original = "[custom]\nretries = 3\nlist = [1, 2]\n[custom.nested]\nx = \"y\"\n";
        fs::write(&path, original).unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.get("custom", "retries"), Some("3"));
        config.set(GLOBAL, "token", "t");
        config.write().unwrap();

        let expected: toml::Table = original.parse().unwrap();
        let written: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written.get("custom"), expected.get("custom"));
        assert_eq!(
            written["global"]["token"],
            toml::Value::String("t".to_string())
        );
    }

    #[test]
    fn test_set_moves_bare_key_into_global() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        fs::write(&path, "token = \"old\"\n").unwrap();

        let mut config = Config::load(&path).unwrap();
        assert_eq!(config.get(GLOBAL, "token"), Some("old"));
        config.set(GLOBAL, "token", "new");
        config.write().unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.get(GLOBAL, "token"), Some("new"));
        let written: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert!(!written.contains_key("token"));
    }

    #[test]
    fn test_delete_removes_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        fs::write(&path, "[storage]\naccount = \"alice\"\nquota = 10\n").unwrap();

        let mut config = Config::load(&path).unwrap();
        assert!(config.delete("storage", "account"));
        config.write().unwrap();

        let written: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written["storage"].get("account"), None);
        assert_eq!(written["storage"]["quota"], toml::Value::Integer(10));
    }

    #[test]
    fn test_get_override_ignores_persisted() {
        let mut config = Config::new("/nonexistent/cirrusrc");
        config.set(GLOBAL, "token", "file");
        assert_eq!(config.get_override(GLOBAL, "token"), None);
        config.override_value(GLOBAL, "token", "flag");
        assert_eq!(config.get_override(GLOBAL, "token"), Some("flag"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cirrusrc");
        fs::write(&path, "[global\ntoken = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
