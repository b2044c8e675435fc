//! Tool configuration for `docforge.toml`.
//!
//! Configuration is layered: built-in defaults, then `docforge.toml` (if
//! present next to the documents directory), then CLI flags. The resulting
//! [`Config`] is wrapped in an `Arc` once at startup and passed by reference
//! to every component that needs it; there is no ambient global.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::utils::path::normalize_path;

/// Config file name looked up next to the documents directory.
const CONFIG_FILE: &str = "docforge.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project root (parent of the documents directory). Not serialized.
    #[serde(skip)]
    pub root: PathBuf,

    /// Documents directory holding template files. Not serialized.
    #[serde(skip)]
    pub documents: PathBuf,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// HTTP port for the preview server.
    pub port: u16,
    /// Debounce window for file-change aggregation, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            debounce_ms: 150,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory for build artifacts, relative to the project root.
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
        }
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Path to the esbuild binary (default: found on PATH).
    pub esbuild: Option<PathBuf>,
    /// Path to the node binary (default: found on PATH).
    pub node: Option<PathBuf>,
}

impl Config {
    /// Load configuration for a documents directory, applying CLI overrides.
    pub fn load(cli: &Cli, documents_dir: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        let documents = crate::utils::path::absolutize(&cwd, documents_dir);
        let root = documents
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| documents.clone());

        let mut config = Self::read_file(&root.join(CONFIG_FILE))?.unwrap_or_default();
        config.root = normalize_path(&root);
        config.documents = normalize_path(&documents);

        if let Some(port) = cli.port() {
            config.serve.port = port;
        }

        Ok(config)
    }

    /// Read and parse the config file if it exists.
    fn read_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    /// Absolute output directory for build artifacts.
    pub fn output_dir(&self) -> PathBuf {
        if self.build.output.is_absolute() {
            self.build.output.clone()
        } else {
            self.root.join(&self.build.output)
        }
    }

    /// Locate the esbuild binary. Precedence: config, `DOCFORGE_ESBUILD`, PATH.
    pub fn esbuild_bin(&self) -> Result<PathBuf> {
        if let Some(path) = &self.tools.esbuild {
            return Ok(path.clone());
        }
        if let Some(path) = std::env::var_os("DOCFORGE_ESBUILD") {
            return Ok(PathBuf::from(path));
        }
        which::which("esbuild")
            .context("esbuild not found on PATH (npm install -g esbuild, or set [tools] esbuild)")
    }

    /// Locate the node binary. Precedence: config, `DOCFORGE_NODE`, PATH.
    pub fn node_bin(&self) -> Result<PathBuf> {
        if let Some(path) = &self.tools.node {
            return Ok(path.clone());
        }
        if let Some(path) = std::env::var_os("DOCFORGE_NODE") {
            return Ok(PathBuf::from(path));
        }
        which::which("node").context("node not found on PATH")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.debounce_ms, 150);
        assert_eq!(config.build.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            [serve]
            port = 4100
            debounce_ms = 200

            [build]
            output = "out"

            [tools]
            esbuild = "/usr/local/bin/esbuild"
            "#,
        )
        .unwrap();

        assert_eq!(config.serve.port, 4100);
        assert_eq!(config.serve.debounce_ms, 200);
        assert_eq!(config.build.output, PathBuf::from("out"));
        assert_eq!(
            config.tools.esbuild,
            Some(PathBuf::from("/usr/local/bin/esbuild"))
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Config, _> = toml::from_str("[serve]\nprot = 4100\n");
        assert!(result.is_err());
    }
}
