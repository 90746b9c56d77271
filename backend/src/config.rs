//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary). CLI flags override them.
//!
//! | Variable                         | Default                          |
//! |----------------------------------|----------------------------------|
//! | `FRONTEIRAS_DATA_DIR`            | `./`                             |
//! | `FRONTEIRAS_PORT`                | `3000`                           |
//! | `FRONTEIRAS_SALDO_FILE`          | `saldo_migratorio_estados.csv`   |
//! | `FRONTEIRAS_ORIGENS_FILE`        | `pop_migrantes.csv`              |
//! | `FRONTEIRAS_MATRIZ_FILE`         | `pop_migrantes_rodolfo.csv`      |
//! | `FRONTEIRAS_MUNICIPIOS_FILE`     | `municipios_origem.xlsx`         |
//! | `FRONTEIRAS_IMIGRANTES_FILE`     | `imigrantes_nacionalidade.xlsx`  |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::logs::log_warning;

pub const DEFAULT_PORT: u16 = 3000;

/// File names of the source tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFiles {
    pub state_balance: String,
    pub state_origins: String,
    pub migrant_origin: String,
    pub municipality_origin: String,
    pub immigrant_count: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            state_balance: "saldo_migratorio_estados.csv".to_string(),
            state_origins: "pop_migrantes.csv".to_string(),
            migrant_origin: "pop_migrantes_rodolfo.csv".to_string(),
            municipality_origin: "municipios_origem.xlsx".to_string(),
            immigrant_count: "imigrantes_nacionalidade.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
    pub files: SourceFiles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./"),
            port: DEFAULT_PORT,
            files: SourceFiles::default(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("FRONTEIRAS_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log_warning(format!("Invalid FRONTEIRAS_PORT '{}', using {}", raw, DEFAULT_PORT));
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        let files = SourceFiles {
            state_balance: var("FRONTEIRAS_SALDO_FILE").unwrap_or(defaults.files.state_balance),
            state_origins: var("FRONTEIRAS_ORIGENS_FILE").unwrap_or(defaults.files.state_origins),
            migrant_origin: var("FRONTEIRAS_MATRIZ_FILE").unwrap_or(defaults.files.migrant_origin),
            municipality_origin: var("FRONTEIRAS_MUNICIPIOS_FILE")
                .unwrap_or(defaults.files.municipality_origin),
            immigrant_count: var("FRONTEIRAS_IMIGRANTES_FILE")
                .unwrap_or(defaults.files.immigrant_count),
        };

        Self {
            data_dir: var("FRONTEIRAS_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            port,
            files,
        }
    }

    pub fn state_balance_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.state_balance)
    }

    pub fn state_origins_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.state_origins)
    }

    pub fn migrant_origin_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.migrant_origin)
    }

    pub fn municipality_origin_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.municipality_origin)
    }

    pub fn immigrant_count_path(&self) -> PathBuf {
        self.data_dir.join(&self.files.immigrant_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.port, 3000);
        assert!(config.state_balance_path().ends_with("saldo_migratorio_estados.csv"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("FRONTEIRAS_DATA_DIR", "/srv/censo"),
            ("FRONTEIRAS_PORT", "8080"),
            ("FRONTEIRAS_MUNICIPIOS_FILE", "municipios.csv"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.municipality_origin_path(), PathBuf::from("/srv/censo/municipios.csv"));
        assert_eq!(config.files.immigrant_count, "imigrantes_nacionalidade.xlsx");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::from_lookup(lookup(&[("FRONTEIRAS_PORT", "porta")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = Config::from_lookup(lookup(&[("FRONTEIRAS_DATA_DIR", "  ")]));
        assert_eq!(config.data_dir, PathBuf::from("./"));
    }
}
