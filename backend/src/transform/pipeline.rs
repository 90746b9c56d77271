//! Table loaders: raw file → cleaned, typed records.
//!
//! Every loader follows the same steps:
//! 1. Read the raw table through the process-wide cache
//! 2. Drop serialized index columns
//! 3. Check the remaining headers against the table schema
//! 4. Drop aggregate rows
//! 5. Coerce each row into a typed record
//!
//! Any failure aborts the whole table. The `*_from_raw` variants skip step 1
//! and take an already-read table.
//!
//! # Example
//!
//! ```rust,ignore
//! use fronteiras::transform::pipeline::{load_state_balances, rank_by_balance};
//! use std::path::Path;
//!
//! let states = load_state_balances(Path::new("saldo_migratorio_estados.csv"))?;
//! let ranked = rank_by_balance(&states);
//! println!("{} {}", ranked[0].uf, ranked[0].net_balance_text);
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::api::logs::{log_info, log_table, LogEntry};
use crate::cache::TABLE_CACHE;
use crate::error::LoadResult;
use crate::format::{format_integer, format_percentage, format_signed_integer, PercentScale};
use crate::models::columns::{immigrant_count, migrant_origin, municipality_origin, state_balance};
use crate::models::{
    ImmigrantCountRecord, MigrantOriginRecord, MunicipalityOriginRecord, StateBalanceRecord,
    COUNTRY_AGGREGATE_UF,
};
use crate::parser::RawTable;
use crate::validation::{check_columns, SourceTable};

use super::clean::{drop_rows_matching, drop_total_rows, drop_unnamed_columns, RowContext};

// =============================================================================
// Shared steps
// =============================================================================

/// Copy the raw table, drop index columns and check the schema.
fn prepare(raw: &RawTable, kind: SourceTable) -> LoadResult<RawTable> {
    log_info(format!("📖 Loading {} from {}", kind.name(), raw.source));
    log_table(
        LogEntry::info(format!(
            "{} rows, {} columns, encoding {}, delimiter {}",
            raw.row_count(),
            raw.headers.len(),
            raw.encoding,
            match raw.delimiter {
                Some('\t') => "\\t".to_string(),
                Some(c) => format!("'{}'", c),
                None => "none".to_string(),
            }
        )),
        kind.name(),
    );

    let mut table = raw.clone();
    let dropped = drop_unnamed_columns(&mut table);
    if !dropped.is_empty() {
        log_table(
            LogEntry::warning(format!("Dropped index column(s): {}", dropped.join(", "))),
            kind.name(),
        );
    }

    if let Err(e) = check_columns(kind, &table.headers) {
        log_table(LogEntry::error(e.to_string()), kind.name());
        return Err(e);
    }
    Ok(table)
}

/// Convert every row, logging the first failure before returning it.
fn convert_rows<T, F>(table: &RawTable, kind: SourceTable, mut convert: F) -> LoadResult<Vec<T>>
where
    F: FnMut(RowContext<'_>) -> LoadResult<T>,
{
    let records = table
        .rows()
        .map(|(line, record)| convert(RowContext::new(kind, line, record)))
        .collect::<LoadResult<Vec<T>>>()
        .inspect_err(|e| log_table(LogEntry::error(e.to_string()), kind.name()))?;

    log_table(
        LogEntry::success(format!("{} records loaded", records.len())),
        kind.name(),
    );
    Ok(records)
}

// =============================================================================
// State balances
// =============================================================================

/// Load the per-state migration balance table.
pub fn load_state_balances(path: &Path) -> LoadResult<Vec<StateBalanceRecord>> {
    let raw = TABLE_CACHE.get_or_read(path)?;
    state_balances_from_raw(&raw)
}

/// Clean and type an already-read state balance table.
///
/// The whole-country row (`uf == "BR"`) is removed; `taxa_migra` is read as
/// a localized percent string and stored as a fraction. When a state code
/// repeats, the first row wins.
pub fn state_balances_from_raw(raw: &RawTable) -> LoadResult<Vec<StateBalanceRecord>> {
    let kind = SourceTable::StateBalance;
    let mut table = prepare(raw, kind)?;

    let dropped = drop_rows_matching(&mut table, state_balance::UF, COUNTRY_AGGREGATE_UF);
    if dropped > 0 {
        log_table(
            LogEntry::info(format!("Dropped {} country aggregate row(s)", dropped)),
            kind.name(),
        );
    }

    let records = convert_rows(&table, kind, |row| {
        Ok(StateBalanceRecord {
            uf: row.text(state_balance::UF).to_string(),
            in_migrants: row.integer(state_balance::IN_MIGRANTS)?,
            out_migrants: row.integer(state_balance::OUT_MIGRANTS)?,
            net_balance: row.integer(state_balance::NET_BALANCE)?,
            migration_rate: row.percent(state_balance::RATE)?,
        })
    })?;

    let mut seen = HashSet::new();
    let total = records.len();
    let unique: Vec<StateBalanceRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.uf.clone()))
        .collect();
    if unique.len() < total {
        log_table(
            LogEntry::warning(format!("Ignored {} repeated state code(s)", total - unique.len())),
            kind.name(),
        );
    }
    Ok(unique)
}

/// One state's balance with display strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateBalanceView {
    pub uf: String,
    pub in_migrants: i64,
    pub out_migrants: i64,
    pub net_balance: i64,
    pub migration_rate: f64,
    pub in_migrants_text: String,
    pub out_migrants_text: String,
    /// Signed: `+354.000`, `-165.000`
    pub net_balance_text: String,
    /// Two decimals: `4,96%`
    pub migration_rate_text: String,
}

impl From<&StateBalanceRecord> for StateBalanceView {
    fn from(r: &StateBalanceRecord) -> Self {
        Self {
            uf: r.uf.clone(),
            in_migrants: r.in_migrants,
            out_migrants: r.out_migrants,
            net_balance: r.net_balance,
            migration_rate: r.migration_rate,
            in_migrants_text: format_integer(r.in_migrants),
            out_migrants_text: format_integer(r.out_migrants),
            net_balance_text: format_signed_integer(r.net_balance),
            migration_rate_text: format_percentage(r.migration_rate, 2, PercentScale::Fraction),
        }
    }
}

/// States ordered by net balance, biggest gain first and biggest loss last.
/// Ties keep table order.
pub fn rank_by_balance(records: &[StateBalanceRecord]) -> Vec<StateBalanceView> {
    let mut views: Vec<StateBalanceView> = records.iter().map(StateBalanceView::from).collect();
    views.sort_by(|a, b| b.net_balance.cmp(&a.net_balance));
    views
}

// =============================================================================
// State origins (display-only table)
// =============================================================================

/// Load a table that is shown as is, only dropping index columns.
pub fn load_display_table(path: &Path) -> LoadResult<RawTable> {
    let raw = TABLE_CACHE.get_or_read(path)?;
    let mut table = (*raw).clone();
    drop_unnamed_columns(&mut table);
    Ok(table)
}

// =============================================================================
// Migrant origins
// =============================================================================

/// Load the birth region x residence region triples.
pub fn load_migrant_origins(path: &Path) -> LoadResult<Vec<MigrantOriginRecord>> {
    let raw = TABLE_CACHE.get_or_read(path)?;
    migrant_origins_from_raw(&raw)
}

/// Clean and type an already-read migrant origin table.
pub fn migrant_origins_from_raw(raw: &RawTable) -> LoadResult<Vec<MigrantOriginRecord>> {
    let kind = SourceTable::MigrantOrigin;
    let table = prepare(raw, kind)?;

    convert_rows(&table, kind, |row| {
        Ok(MigrantOriginRecord {
            origin: row.text(migrant_origin::ORIGIN).to_string(),
            destination: row.text(migrant_origin::DESTINATION).to_string(),
            population: row.count(migrant_origin::POPULATION)?,
        })
    })
}

// =============================================================================
// Municipality origins
// =============================================================================

/// Load the municipality x state of origin table.
pub fn load_municipality_origins(path: &Path) -> LoadResult<Vec<MunicipalityOriginRecord>> {
    let raw = TABLE_CACHE.get_or_read(path)?;
    municipality_origins_from_raw(&raw)
}

/// Clean and type an already-read municipality table. `"-"` counts as zero.
pub fn municipality_origins_from_raw(raw: &RawTable) -> LoadResult<Vec<MunicipalityOriginRecord>> {
    let kind = SourceTable::MunicipalityOrigin;
    let table = prepare(raw, kind)?;

    convert_rows(&table, kind, |row| {
        Ok(MunicipalityOriginRecord {
            // Names are matched exactly later; keep them as read (trimmed).
            municipality: row.text(municipality_origin::MUNICIPALITY).to_string(),
            origin: row.text(municipality_origin::ORIGIN).to_string(),
            population: row.count(municipality_origin::POPULATION)?,
        })
    })
}

// =============================================================================
// Immigrants by nationality
// =============================================================================

/// Load the immigrants by country table.
pub fn load_immigrant_counts(path: &Path) -> LoadResult<Vec<ImmigrantCountRecord>> {
    let raw = TABLE_CACHE.get_or_read(path)?;
    immigrant_counts_from_raw(&raw)
}

/// Clean and type an already-read immigrant table.
///
/// Rows whose label contains "total" (any case) are aggregates and dropped
/// before conversion.
pub fn immigrant_counts_from_raw(raw: &RawTable) -> LoadResult<Vec<ImmigrantCountRecord>> {
    let kind = SourceTable::ImmigrantCount;
    let mut table = prepare(raw, kind)?;

    let dropped = drop_total_rows(&mut table, immigrant_count::COUNTRY);
    if dropped > 0 {
        log_table(
            LogEntry::info(format!("Dropped {} total row(s)", dropped)),
            kind.name(),
        );
    }

    convert_rows(&table, kind, |row| {
        Ok(ImmigrantCountRecord {
            country: row.text(immigrant_count::COUNTRY).to_string(),
            count_2010: row.count(immigrant_count::COUNT_2010)?,
            count_2022: row.count(immigrant_count::COUNT_2022)?,
        })
    })
}

/// Growth between two counts in percent, `None` when the base is zero.
pub fn growth_percent(before: u64, after: u64) -> Option<f64> {
    (before > 0).then(|| (after as f64 - before as f64) / before as f64 * 100.0)
}

/// One country with growth and share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmigrantRow {
    pub country: String,
    pub count_2010: u64,
    pub count_2022: u64,
    pub growth_percent: Option<f64>,
    /// Share of all 2022 immigrants, in percent
    pub share_2022: f64,
    pub count_2010_text: String,
    pub count_2022_text: String,
    pub growth_text: Option<String>,
    pub share_2022_text: String,
}

/// Immigrant table with national totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmigrantView {
    /// Sorted by 2022 count, largest first
    pub rows: Vec<ImmigrantRow>,
    pub total_2010: u64,
    pub total_2022: u64,
    pub total_growth_percent: Option<f64>,
    pub total_2010_text: String,
    pub total_2022_text: String,
}

/// Build the immigrant view from typed records.
pub fn immigrant_view(records: &[ImmigrantCountRecord]) -> ImmigrantView {
    let total_2010: u64 = records.iter().map(|r| r.count_2010).sum();
    let total_2022: u64 = records.iter().map(|r| r.count_2022).sum();

    let mut rows: Vec<ImmigrantRow> = records
        .iter()
        .map(|r| {
            let growth = growth_percent(r.count_2010, r.count_2022);
            let share = if total_2022 == 0 {
                0.0
            } else {
                r.count_2022 as f64 / total_2022 as f64 * 100.0
            };
            ImmigrantRow {
                country: r.country.clone(),
                count_2010: r.count_2010,
                count_2022: r.count_2022,
                growth_percent: growth,
                share_2022: share,
                count_2010_text: format_integer(r.count_2010 as i64),
                count_2022_text: format_integer(r.count_2022 as i64),
                growth_text: growth.map(|g| format_percentage(g, 1, PercentScale::Percent)),
                share_2022_text: format_percentage(share, 1, PercentScale::Percent),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.count_2022.cmp(&a.count_2022));

    ImmigrantView {
        rows,
        total_2010,
        total_2022,
        total_growth_percent: growth_percent(total_2010, total_2022),
        total_2010_text: format_integer(total_2010 as i64),
        total_2022_text: format_integer(total_2022 as i64),
    }
}
