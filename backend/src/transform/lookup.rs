//! Municipality lookup over the municipality x origin table.
//!
//! The origin with the most residents is taken as the municipality's own
//! state; everyone else is counted as migrant population.

use serde::Serialize;

use crate::error::{LookupError, LookupResult};
use crate::format::{format_integer, format_percentage, PercentScale};
use crate::models::MunicipalityOriginRecord;

/// One origin of a municipality's residents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginRow {
    pub origin: String,
    pub population: u64,
    /// Share of the municipality's total, in percent
    pub percentage: f64,
    pub population_text: String,
    pub percentage_text: String,
}

/// Per-origin breakdown of one municipality plus its summary totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityProfile {
    pub municipality: String,
    /// Sorted by population, largest first
    pub rows: Vec<OriginRow>,
    pub total_population: u64,
    pub native_population: u64,
    pub migrant_population: u64,
    pub total_population_text: String,
    pub native_population_text: String,
    pub migrant_population_text: String,
}

impl MunicipalityProfile {
    /// Origin assumed to be the municipality's own state.
    pub fn native_origin(&self) -> Option<&str> {
        self.rows.first().map(|r| r.origin.as_str())
    }
}

/// Look up a municipality by exact, case-sensitive name.
///
/// Fails with [`LookupError::NotFound`] when no row matches; callers show an
/// empty state instead of aborting.
pub fn lookup_municipality(
    records: &[MunicipalityOriginRecord],
    name: &str,
) -> LookupResult<MunicipalityProfile> {
    let mut matched: Vec<&MunicipalityOriginRecord> =
        records.iter().filter(|r| r.municipality == name).collect();

    if matched.is_empty() {
        return Err(LookupError::NotFound(name.to_string()));
    }

    // Stable: equal counts keep table order.
    matched.sort_by(|a, b| b.population.cmp(&a.population));

    let total_population: u64 = matched.iter().map(|r| r.population).sum();
    let native_population = matched.first().map(|r| r.population).unwrap_or(0);
    let migrant_population = total_population - native_population;

    let rows = matched
        .iter()
        .map(|r| {
            let percentage = if total_population == 0 {
                0.0
            } else {
                r.population as f64 / total_population as f64 * 100.0
            };
            OriginRow {
                origin: r.origin.clone(),
                population: r.population,
                percentage,
                population_text: format_integer(r.population as i64),
                percentage_text: format_percentage(percentage, 2, PercentScale::Percent),
            }
        })
        .collect();

    Ok(MunicipalityProfile {
        municipality: name.to_string(),
        rows,
        total_population,
        native_population,
        migrant_population,
        total_population_text: format_integer(total_population as i64),
        native_population_text: format_integer(native_population as i64),
        migrant_population_text: format_integer(migrant_population as i64),
    })
}

/// Distinct municipality names, sorted, for the selection list.
pub fn municipality_names(records: &[MunicipalityOriginRecord]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.municipality.clone()).collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(municipality: &str, origin: &str, population: u64) -> MunicipalityOriginRecord {
        MunicipalityOriginRecord {
            municipality: municipality.to_string(),
            origin: origin.to_string(),
            population,
        }
    }

    fn sample() -> Vec<MunicipalityOriginRecord> {
        vec![
            row("Porto Alegre", "SP", 40_000),
            row("Florianópolis", "SC", 400_000),
            row("Porto Alegre", "RS", 1_222_000),
            row("Porto Alegre", "SC", 38_000),
            row("Florianópolis", "RS", 60_000),
        ]
    }

    #[test]
    fn test_lookup_totals() {
        let profile = lookup_municipality(&sample(), "Porto Alegre").unwrap();

        assert_eq!(profile.total_population, 1_300_000);
        assert_eq!(profile.native_population, 1_222_000);
        assert_eq!(profile.migrant_population, 78_000);
        assert_eq!(profile.total_population_text, "1.300.000");
        assert_eq!(profile.migrant_population_text, "78.000");
        assert_eq!(profile.native_origin(), Some("RS"));
    }

    #[test]
    fn test_lookup_rows_sorted_with_percentages() {
        let profile = lookup_municipality(&sample(), "Porto Alegre").unwrap();

        let origins: Vec<&str> = profile.rows.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, vec!["RS", "SP", "SC"]);

        let expected = [94.0, 3.08, 2.92];
        for (r, want) in profile.rows.iter().zip(expected) {
            assert!((r.percentage - want).abs() < 0.1, "{}: {}", r.origin, r.percentage);
        }
        assert_eq!(profile.rows[0].percentage_text, "94,00%");
        assert_eq!(profile.rows[1].percentage_text, "3,08%");
        assert_eq!(profile.rows[2].percentage_text, "2,92%");
        assert_eq!(profile.rows[0].population_text, "1.222.000");
    }

    #[test]
    fn test_rows_sum_to_total() {
        let profile = lookup_municipality(&sample(), "Florianópolis").unwrap();
        let sum: u64 = profile.rows.iter().map(|r| r.population).sum();
        assert_eq!(sum, profile.total_population);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let records = sample();
        assert_eq!(
            lookup_municipality(&records, "porto alegre"),
            Err(LookupError::NotFound("porto alegre".to_string()))
        );
        assert!(lookup_municipality(&records, "Florianopolis").is_err());
        assert!(lookup_municipality(&records, "Porto Alegre ").is_err());
    }

    #[test]
    fn test_all_zero_municipality() {
        let records = vec![row("Serra da Saudade", "MG", 0), row("Serra da Saudade", "SP", 0)];
        let profile = lookup_municipality(&records, "Serra da Saudade").unwrap();

        assert_eq!(profile.total_population, 0);
        assert_eq!(profile.migrant_population, 0);
        assert!(profile.rows.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn test_municipality_names() {
        assert_eq!(municipality_names(&sample()), vec!["Florianópolis", "Porto Alegre"]);
    }
}
