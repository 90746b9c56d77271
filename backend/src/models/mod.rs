//! Domain models for the census migration tables.
//!
//! - [`Region`] - the five Brazilian macro-regions, in display order
//! - [`StateBalanceRecord`] - one federal unit's migration balance
//! - [`MigrantOriginRecord`] - people born in one region living in another
//! - [`MunicipalityOriginRecord`] - municipal population by state of origin
//! - [`ImmigrantCountRecord`] - foreign-born residents per country, 2010 and 2022
//!
//! All records are read-only once loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Column Names
// =============================================================================

/// Column names of each source table, after header trimming.
pub mod columns {
    /// State balance table (`saldo_migratorio_estados.csv`).
    pub mod state_balance {
        pub const UF: &str = "uf";
        pub const IN_MIGRANTS: &str = "imigrantes";
        pub const OUT_MIGRANTS: &str = "emigrantes";
        pub const NET_BALANCE: &str = "saldo_migratorio";
        pub const RATE: &str = "taxa_migra";
    }

    /// Birth region x residence region triples.
    pub mod migrant_origin {
        pub const ORIGIN: &str = "local_nasc";
        pub const DESTINATION: &str = "local_resid";
        pub const POPULATION: &str = "pop";
    }

    /// Municipality x state of origin.
    pub mod municipality_origin {
        pub const MUNICIPALITY: &str = "municipio";
        pub const ORIGIN: &str = "origem";
        pub const POPULATION: &str = "pop";
    }

    /// Immigrants by nationality.
    pub mod immigrant_count {
        pub const COUNTRY: &str = "pais_regiao";
        pub const COUNT_2010: &str = "2010";
        pub const COUNT_2022: &str = "2022";
    }
}

/// Region code of the whole-country aggregate row in the state table.
pub const COUNTRY_AGGREGATE_UF: &str = "BR";

// =============================================================================
// Region
// =============================================================================

/// Brazilian macro-region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Norte,
    Nordeste,
    Sudeste,
    Sul,
    #[serde(rename = "Centro-Oeste")]
    CentroOeste,
}

impl Region {
    /// Fixed display order on both axes of the migration matrix.
    pub const ORDER: [Region; 5] = [
        Region::Norte,
        Region::Nordeste,
        Region::Sudeste,
        Region::Sul,
        Region::CentroOeste,
    ];

    /// Portuguese label as it appears in the source tables.
    pub fn label(self) -> &'static str {
        match self {
            Region::Norte => "Norte",
            Region::Nordeste => "Nordeste",
            Region::Sudeste => "Sudeste",
            Region::Sul => "Sul",
            Region::CentroOeste => "Centro-Oeste",
        }
    }

    /// Position in [`Region::ORDER`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a source-table label. Surrounding whitespace and case are
    /// ignored; anything else must match exactly.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ORDER
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown region: {}", s))
    }
}

// =============================================================================
// Records
// =============================================================================

/// Migration balance of one federal unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateBalanceRecord {
    /// Two-letter state code, unique across the table
    pub uf: String,
    /// People who moved in
    pub in_migrants: i64,
    /// People who moved out
    pub out_migrants: i64,
    /// In minus out
    pub net_balance: i64,
    /// Balance as a fraction of current population (`0.0496` for 4,96%)
    pub migration_rate: f64,
}

/// People born in `origin` who now live in `destination`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrantOriginRecord {
    pub origin: String,
    pub destination: String,
    pub population: u64,
}

/// Residents of a municipality coming from one state of origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityOriginRecord {
    pub municipality: String,
    pub origin: String,
    pub population: u64,
}

/// Foreign-born and naturalized residents from one country.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImmigrantCountRecord {
    pub country: String,
    pub count_2010: u64,
    pub count_2022: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_order_matches_index() {
        for (i, region) in Region::ORDER.iter().enumerate() {
            assert_eq!(region.index(), i);
        }
    }

    #[test]
    fn test_region_from_label() {
        assert_eq!(Region::from_label("Centro-Oeste"), Some(Region::CentroOeste));
        assert_eq!(Region::from_label(" nordeste "), Some(Region::Nordeste));
        assert_eq!(Region::from_label("Centro Oeste"), None);
        assert!("Exterior".parse::<Region>().is_err());
    }

    #[test]
    fn test_region_serializes_as_label() {
        let json = serde_json::to_string(&Region::CentroOeste).unwrap();
        assert_eq!(json, "\"Centro-Oeste\"");
    }
}
