//! Fronteiras CLI - census migration tables as JSON
//!
//! # Main Commands
//!
//! ```bash
//! fronteiras serve                          # Start HTTP server (port 3000)
//! fronteiras saldo                          # State balances and ranking
//! fronteiras matriz                         # Region x region migration matrix
//! fronteiras municipio Pelotas              # Origins of one municipality
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! fronteiras parse input.csv                # Raw table as JSON
//! fronteiras municipios                     # Municipality names
//! ```
//!
//! Table files default to the configured data directory (see `config`).

use clap::{Parser, Subcommand};
use fronteiras::{
    decode_content, detect_encoding, immigrant_view, load_display_table, load_immigrant_counts,
    load_migrant_origins, load_municipality_origins, load_state_balances, lookup_municipality,
    municipality_names, parse_delimited, rank_by_balance, read_table, Config, LookupError,
    MigrationMatrix,
};
use fronteiras::api::types::{MunicipalityList, StateBalanceData, TableData};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fronteiras")]
#[command(about = "Census migration tables: load, clean and format for display", long_about = None)]
struct Cli {
    /// Directory holding the source tables (overrides FRONTEIRAS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a CSV/Excel file and output the raw table as JSON
    Parse {
        /// Input file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// State migration balances, ranked by net balance
    Saldo {
        /// State balance table (default: configured file)
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// State origins table, index columns dropped
    Origens {
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Birth region x residence region matrix
    Matriz {
        /// Migrant origin table (default: configured file)
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Origins of one municipality's residents
    Municipio {
        /// Exact municipality name
        nome: String,

        /// Municipality origin table (default: configured file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List municipality names
    Municipios {
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Immigrants by nationality, 2010 and 2022
    Imigrantes {
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides FRONTEIRAS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Saldo { input, output } => {
            let input = input.unwrap_or_else(|| config.state_balance_path());
            cmd_saldo(&input, output.as_deref())
        }

        Commands::Origens { input, output } => {
            let input = input.unwrap_or_else(|| config.state_origins_path());
            cmd_origens(&input, output.as_deref())
        }

        Commands::Matriz { input, output } => {
            let input = input.unwrap_or_else(|| config.migrant_origin_path());
            cmd_matriz(&input, output.as_deref())
        }

        Commands::Municipio {
            nome,
            input,
            output,
        } => {
            let input = input.unwrap_or_else(|| config.municipality_origin_path());
            cmd_municipio(&input, &nome, output.as_deref())
        }

        Commands::Municipios { input, output } => {
            let input = input.unwrap_or_else(|| config.municipality_origin_path());
            cmd_municipios(&input, output.as_deref())
        }

        Commands::Imigrantes { input, output } => {
            let input = input.unwrap_or_else(|| config.immigrant_count_path());
            cmd_imigrantes(&input, output.as_deref())
        }

        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());

    let table = match delimiter {
        Some(d) => {
            let bytes = fs::read(input)?;
            let encoding = detect_encoding(&bytes);
            let content = decode_content(&bytes, &encoding);
            let mut table = parse_delimited(&content, d, &input.display().to_string())?;
            table.encoding = encoding;
            table
        }
        None => read_table(input)?,
    };

    eprintln!("   Encoding: {}", table.encoding);
    if let Some(d) = table.delimiter {
        eprintln!(
            "   Delimiter: '{}'{}",
            format_delimiter(d),
            if delimiter.is_none() { " (auto-detected)" } else { "" }
        );
    }
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Parsed {} records", table.row_count());

    write_json(&table.records, output)
}

fn cmd_saldo(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📊 State balances: {}", input.display());

    let states = load_state_balances(input)?;
    let ranking = rank_by_balance(&states);

    if let (Some(top), Some(bottom)) = (ranking.first(), ranking.last()) {
        eprintln!("   Biggest gain: {} {}", top.uf, top.net_balance_text);
        eprintln!("   Biggest loss: {} {}", bottom.uf, bottom.net_balance_text);
    }

    write_json(&StateBalanceData { states, ranking }, output)
}

fn cmd_origens(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 State origins: {}", input.display());

    let table = load_display_table(input)?;
    eprintln!("   {} rows", table.row_count());

    write_json(&TableData::from(table), output)
}

fn cmd_matriz(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🧭 Migration matrix: {}", input.display());

    let records = load_migrant_origins(input)?;
    let matrix = MigrationMatrix::build(&records);
    if matrix.ignored_records > 0 {
        eprintln!(
            "   ⚠️  {} record(s) with unknown region labels ignored",
            matrix.ignored_records
        );
    }

    let view = matrix.view();
    eprintln!("   Total: {}", view.grand_total);

    write_json(&view, output)
}

fn cmd_municipio(
    input: &Path,
    nome: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🏙️  Municipality '{}': {}", nome, input.display());

    let records = load_municipality_origins(input)?;
    match lookup_municipality(&records, nome) {
        Ok(profile) => {
            eprintln!(
                "   Total {}, migrants {}",
                profile.total_population_text, profile.migrant_population_text
            );
            write_json(&profile, output)
        }
        Err(LookupError::NotFound(name)) => {
            eprintln!("   Nenhum dado encontrado para '{}'", name);
            Ok(())
        }
    }
}

fn cmd_municipios(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🏙️  Municipalities: {}", input.display());

    let records = load_municipality_origins(input)?;
    let list = MunicipalityList::from(municipality_names(&records));
    eprintln!("   {} municipalities", list.count);

    write_json(&list, output)
}

fn cmd_imigrantes(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🌎 Immigrants by nationality: {}", input.display());

    let records = load_immigrant_counts(input)?;
    let view = immigrant_view(&records);
    eprintln!(
        "   2010: {}  2022: {}",
        view.total_2010_text, view.total_2022_text
    );

    write_json(&view, output)
}

async fn cmd_serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    fronteiras::server::start_server(config).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_json<T: Serialize>(
    value: &T,
    path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    write_output(&json, path)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_municipio_input_defaults_to_config() {
        let cli = Cli::try_parse_from(["fronteiras", "municipio", "Porto Alegre"]).unwrap();
        match cli.command {
            Commands::Municipio { nome, input, .. } => {
                assert_eq!(nome, "Porto Alegre");
                assert!(input.is_none());
            }
            _ => panic!("expected municipio"),
        }
    }

    #[test]
    fn test_municipio_input_flag() {
        let cli = Cli::try_parse_from([
            "fronteiras",
            "municipio",
            "Pelotas",
            "--input",
            "municipios.xlsx",
        ])
        .unwrap();
        match cli.command {
            Commands::Municipio { input, .. } => {
                assert_eq!(input, Some(PathBuf::from("municipios.xlsx")));
            }
            _ => panic!("expected municipio"),
        }
    }
}
