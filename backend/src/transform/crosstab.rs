//! Birth region x residence region cross-tabulation.
//!
//! ```text
//! (origin, destination, pop) triples        MigrationMatrix
//! ┌──────────────────────────────┐          ┌──────────┬───────┬──────────┬─────┐
//! │ Nordeste, Sudeste, 6.700.000 │          │          │ Norte │ Nordeste │ ... │
//! │ Nordeste, Norte,     900.000 │    →     │ Norte    │   —   │  12,3%   │     │
//! │ Sul,      Sudeste,   700.000 │          │ Nordeste │ 9,1%  │    —     │     │
//! └──────────────────────────────┘          └──────────┴───────┴──────────┴─────┘
//! ```
//!
//! Rows are birth regions, columns residence regions, both in
//! [`Region::ORDER`]. A pair absent from the input stays "no data" rather
//! than becoming a silent zero.
//!
//! Labels are matched after trimming and ignoring ASCII case, so
//! `" nordeste "` lands in the Nordeste row. Any other spelling
//! (`"Centro Oeste"`, `"Exterior"`) is left out and counted in
//! [`MigrationMatrix::ignored_records`].

use serde::Serialize;

use crate::format::{format_integer, format_percentage, PercentScale, NO_DATA};
use crate::models::{MigrantOriginRecord, Region};

const N: usize = Region::ORDER.len();

/// Display text of one matrix cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellDisplay {
    /// No recorded flow, or a flow of zero people.
    NoData,
    /// Formatted share of the origin row and formatted head count.
    Flow { percentage: String, population: String },
}

impl CellDisplay {
    /// Single-string rendering, the two parts joined by `separator`.
    pub fn text(&self, separator: &str) -> String {
        match self {
            CellDisplay::NoData => NO_DATA.to_string(),
            CellDisplay::Flow { percentage, population } => {
                format!("{}{}{}", percentage, separator, population)
            }
        }
    }
}

/// Region x region migration counts.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationMatrix {
    population: [[Option<u64>; N]; N],
    /// Records whose origin or destination is not one of the five regions
    pub ignored_records: usize,
}

impl MigrationMatrix {
    /// Build the matrix from flat triples.
    ///
    /// Duplicate (origin, destination) pairs accumulate. Labels are read with
    /// [`Region::from_label`] (trimmed, case-insensitive); labels outside the
    /// five regions are counted in `ignored_records` and left out.
    pub fn build(records: &[MigrantOriginRecord]) -> Self {
        let mut population = [[None; N]; N];
        let mut ignored_records = 0;

        for record in records {
            match (
                Region::from_label(&record.origin),
                Region::from_label(&record.destination),
            ) {
                (Some(origin), Some(destination)) => {
                    let cell: &mut Option<u64> = &mut population[origin.index()][destination.index()];
                    *cell = Some(cell.unwrap_or(0) + record.population);
                }
                _ => ignored_records += 1,
            }
        }

        Self {
            population,
            ignored_records,
        }
    }

    /// Regions on both axes, in display order.
    pub fn regions(&self) -> [Region; N] {
        Region::ORDER
    }

    /// Recorded flow from `origin` to `destination`, `None` when absent.
    pub fn population(&self, origin: Region, destination: Region) -> Option<u64> {
        self.population[origin.index()][destination.index()]
    }

    /// Everyone born in `origin`, across all destinations including itself.
    pub fn row_total(&self, origin: Region) -> u64 {
        self.population[origin.index()].iter().flatten().sum()
    }

    /// Everyone living in `destination`, across all birth regions.
    pub fn column_total(&self, destination: Region) -> u64 {
        self.population
            .iter()
            .filter_map(|row| row[destination.index()])
            .sum()
    }

    /// Sum of every recorded cell.
    pub fn grand_total(&self) -> u64 {
        Region::ORDER.iter().map(|r| self.row_total(*r)).sum()
    }

    /// Share of `origin`'s row living in `destination`, in percent.
    ///
    /// Zero when the cell is absent or the row total is zero; a zero row
    /// never divides.
    pub fn percentage(&self, origin: Region, destination: Region) -> f64 {
        let total = self.row_total(origin);
        if total == 0 {
            return 0.0;
        }
        let count = self.population(origin, destination).unwrap_or(0);
        count as f64 / total as f64 * 100.0
    }

    /// Percentage view of the whole matrix, rows summing to 100 (or 0).
    pub fn percentages(&self) -> [[f64; N]; N] {
        let mut out = [[0.0; N]; N];
        for origin in Region::ORDER {
            for destination in Region::ORDER {
                out[origin.index()][destination.index()] = self.percentage(origin, destination);
            }
        }
        out
    }

    /// Fraction of `origin`'s row that stayed in `origin`.
    ///
    /// `None` when the diagonal was not recorded or the row is empty.
    pub fn retention(&self, origin: Region) -> Option<f64> {
        let stayed = self.population(origin, origin)?;
        let total = self.row_total(origin);
        (total > 0).then(|| stayed as f64 / total as f64)
    }

    /// Display text for one cell: percentage with one decimal and the head
    /// count, or [`CellDisplay::NoData`] for absent or zero flows.
    pub fn cell_display(&self, origin: Region, destination: Region) -> CellDisplay {
        match self.population(origin, destination) {
            None | Some(0) => CellDisplay::NoData,
            Some(count) => CellDisplay::Flow {
                percentage: format_percentage(
                    self.percentage(origin, destination),
                    1,
                    PercentScale::Percent,
                ),
                population: format_integer(count as i64),
            },
        }
    }

    /// Row totals and column totals, both in region order.
    pub fn region_totals(&self) -> ([u64; N], [u64; N]) {
        let mut rows = [0; N];
        let mut columns = [0; N];
        for region in Region::ORDER {
            rows[region.index()] = self.row_total(region);
            columns[region.index()] = self.column_total(region);
        }
        (rows, columns)
    }

    /// Serializable snapshot for the presentation layer.
    pub fn view(&self) -> MatrixView {
        let percentages = self.percentages();
        let (row_totals, column_totals) = self.region_totals();
        MatrixView {
            regions: Region::ORDER.iter().map(|r| r.label()).collect(),
            population: self.population.iter().map(|row| row.to_vec()).collect(),
            percentages: percentages.iter().map(|row| row.to_vec()).collect(),
            cells: Region::ORDER
                .iter()
                .map(|o| Region::ORDER.iter().map(|d| self.cell_display(*o, *d)).collect())
                .collect(),
            row_totals: row_totals.to_vec(),
            column_totals: column_totals.to_vec(),
            grand_total: format_integer(self.grand_total() as i64),
            retention: Region::ORDER.iter().map(|r| self.retention(*r)).collect(),
            ignored_records: self.ignored_records,
        }
    }
}

/// Matrix as plain data: counts, shares and per-cell text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixView {
    pub regions: Vec<&'static str>,
    /// `null` marks an absent flow
    pub population: Vec<Vec<Option<u64>>>,
    pub percentages: Vec<Vec<f64>>,
    pub cells: Vec<Vec<CellDisplay>>,
    pub row_totals: Vec<u64>,
    pub column_totals: Vec<u64>,
    pub grand_total: String,
    pub retention: Vec<Option<f64>>,
    pub ignored_records: usize,
}
