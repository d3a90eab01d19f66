//! Configuration for `folio.toml`.
//!
//! ```text
//! config/
//! ├── section/   # [notes], [build], [index], [watch]
//! ├── error      # ConfigError
//! └── mod.rs     # NotesConfig (this file)
//! ```
//!
//! The config file is optional. Without one every section takes its
//! defaults and the notes root is the current directory (or `--root`).
//! The loaded `NotesConfig` is immutable and shared behind an `Arc`.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{
    BuildSectionConfig, IndexSectionConfig, NotesSectionConfig, WatchSectionConfig,
};

use crate::{cli::Cli, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the current directory.
pub const CONFIG_FILE: &str = "folio.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Absolute, canonical notes root (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub notes: NotesSectionConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub index: IndexSectionConfig,

    #[serde(default)]
    pub watch: WatchSectionConfig,
}

impl NotesConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// `-C` names the file explicitly; otherwise `folio.toml` is searched
    /// upward from the current directory. The notes root comes from
    /// `--root`, then `[notes] root`, then the config file's directory,
    /// then the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => Some(cwd.join(path)),
            None => find_config_file(&cwd, Path::new(CONFIG_FILE)),
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf);

        let root = match (&cli.root, &config.notes.root) {
            (Some(root), _) => cwd.join(expand_tilde(root)),
            (None, Some(root)) => base.join(expand_tilde(root)),
            (None, None) => base,
        };

        config.config_path = config_path;
        config.finalize(&root)?;
        Ok(config)
    }

    /// Build a config rooted at `root` with all defaults.
    pub fn for_root(root: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.finalize(root)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored: {}", display_path, fields.join(", "));
    }

    /// Resolve and validate the root, then check the section values.
    fn finalize(&mut self, root: &Path) -> Result<()> {
        if !root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "notes root `{}` is not a directory",
                root.display()
            ))
            .into());
        }
        self.root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve notes root `{}`", root.display()))?;

        if let Some(templates) = &self.build.templates {
            let base = self
                .config_path
                .as_deref()
                .and_then(Path::parent)
                .unwrap_or(&self.root);
            self.build.templates = Some(base.join(expand_tilde(templates)));
        }

        for ext in &mut self.index.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }

        self.validate()?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, name) in [("build.dir", &self.build.dir), ("index.dir", &self.index.dir)] {
            let is_plain = !name.is_empty()
                && name != "."
                && name != ".."
                && !name.contains(['/', '\\']);
            if !is_plain {
                return Err(ConfigError::Validation(format!(
                    "`{field}` must be a plain directory name, got `{name}`"
                )));
            }
        }
        if self.build.dir == self.index.dir {
            return Err(ConfigError::Validation(
                "`build.dir` and `index.dir` must differ".to_string(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "`watch.debounce_ms` must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Notes root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute build tree root.
    pub fn build_root(&self) -> PathBuf {
        self.root.join(&self.build.dir)
    }

    /// Absolute index storage root.
    pub fn index_root(&self) -> PathBuf {
        self.root.join(&self.index.dir)
    }
}

/// Expand a leading `~` in a configured path.
fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Walk up from `start` looking for `name`.
fn find_config_file(start: &Path, name: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
pub fn test_parse_config(extra: &str) -> NotesConfig {
    let (parsed, ignored) = NotesConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            NotesConfig::parse_with_ignored("[build]\ndir = \".out\"\nminify = true").unwrap();
        assert_eq!(ignored, vec!["build.minify".to_string()]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(NotesConfig::from_str("[build\ndir = 1").is_err());
    }

    #[test]
    fn test_for_root_paths() {
        let temp = TempDir::new().unwrap();
        let config = NotesConfig::for_root(temp.path()).unwrap();
        let root = temp.path().canonicalize().unwrap();
        assert_eq!(config.root(), root);
        assert_eq!(config.build_root(), root.join(".build"));
        assert_eq!(config.index_root(), root.join(".searchindex"));
    }

    #[test]
    fn test_for_root_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(NotesConfig::for_root(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_validate_rejects_nested_build_dir() {
        let temp = TempDir::new().unwrap();
        let mut config = test_parse_config("[build]\ndir = \"out/build\"");
        assert!(config.finalize(temp.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_same_dirs() {
        let temp = TempDir::new().unwrap();
        let mut config = test_parse_config("[build]\ndir = \".x\"\n[index]\ndir = \".x\"");
        assert!(config.finalize(temp.path()).is_err());
    }

    #[test]
    fn test_extensions_normalized() {
        let temp = TempDir::new().unwrap();
        let mut config = test_parse_config("[index]\nextensions = [\".MD\", \"txt\"]");
        config.finalize(temp.path()).unwrap();
        assert_eq!(config.index.extensions, vec!["md".to_string(), "txt".to_string()]);
    }

    #[test]
    fn test_find_config_file_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "").unwrap();
        let found = find_config_file(&nested, Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(found, temp.path().join(CONFIG_FILE));
    }
}
