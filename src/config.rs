use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Top-level settings, loaded from `minicade.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host poll/tick period in milliseconds.
    pub tick_rate_ms: u64,
    pub scores_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub log_level: String,
    /// Fixed RNG seed for every game instance; entropy when unset.
    pub seed: Option<u64>,
    pub minesweeper: MinesweeperConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            scores_path: None,
            log_path: None,
            log_level: "info".to_string(),
            seed: None,
            minesweeper: MinesweeperConfig::default(),
        }
    }
}

/// Board size for Minesweeper.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MinesweeperConfig {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl Default for MinesweeperConfig {
    fn default() -> Self {
        Self { rows: 9, cols: 9, mines: 10 }
    }
}

impl Config {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("reading config {}", path.display())),
        };
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_ms == 0 {
            bail!("tick_rate_ms must be > 0");
        }
        let ms = self.minesweeper;
        if !(4..=30).contains(&ms.rows) || !(4..=30).contains(&ms.cols) {
            bail!("minesweeper rows and cols must be between 4 and 30");
        }
        // the first reveal keeps its 3x3 neighbourhood clear
        if ms.mines == 0 || ms.mines > ms.rows * ms.cols - 9 {
            bail!(
                "minesweeper mines must be between 1 and {} for a {}x{} board",
                ms.rows * ms.cols - 9,
                ms.rows,
                ms.cols
            );
        }
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("minicade.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        if let Some(p) = &self.log_path {
            return p.clone();
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join("minicade.log");
            }
        }
        PathBuf::from("minicade.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.tick_rate_ms, 16);
        assert_eq!(config.minesweeper, MinesweeperConfig::default());
        assert_eq!(config.seed, None);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = Config::parse("seed = 7\n[minesweeper]\nmines = 20\n").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.minesweeper.rows, 9);
        assert_eq!(config.minesweeper.mines, 20);
    }

    #[test]
    fn rejects_overfull_minefield() {
        let err = Config::parse("[minesweeper]\nrows = 4\ncols = 4\nmines = 8\n").unwrap_err();
        assert!(err.to_string().contains("mines"));
    }

    #[test]
    fn rejects_zero_tick_rate() {
        assert!(Config::parse("tick_rate_ms = 0").is_err());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("minicade-does-not-exist.toml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_level, "info");
    }
}
