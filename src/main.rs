use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use district_rank::buffered_eprintln;
use district_rank::config::Config;
use district_rank::data::{CacheSource, DatasetCache, IndicatorTable};
use district_rank::output::{BaseMapStyle, FillBy, Palette, ThemeColors, ThemeConfig};
use district_rank::scoring::{RankOrder, ScoredTable, ScoringError, ScoringOptions};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_SCORING: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum OutputFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank districts by environmental score (default if no subcommand)
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show raw and normalized indicator values of one district
    Show {
        /// District identifier as it appears in the data
        district: String,
    },
    /// Compare normalized indicator profiles of several districts
    Compare {
        /// Districts to compare (defaults to the first three in the data)
        districts: Vec<String>,
    },
    /// Show one indicator for every district, largest first
    Param {
        /// Indicator column name
        column: String,
    },
    /// Export scored district boundaries as GeoJSON
    Map {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Color districts by this indicator instead of the score
        #[arg(short, long)]
        param: Option<String>,
    },
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "district-rank")]
#[command(about = "Rank districts by a composite environmental score", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/district-rank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Indicator CSV (overrides data.indicators)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Boundary GeoJSON (overrides data.boundaries)
    #[arg(short, long, global = true)]
    boundaries: Option<PathBuf>,

    /// Bypass the dataset cache for this run
    #[arg(long, global = true)]
    no_cache: bool,

    /// Remove all cached datasets before running
    #[arg(long, global = true)]
    clear_cache: bool,

    /// Color palette (overrides theme.palette)
    #[arg(long, value_enum, global = true)]
    palette: Option<Palette>,

    /// Base map style (overrides theme.base_map_style)
    #[arg(long, value_enum, global = true)]
    base_map_style: Option<BaseMapStyle>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List {
        format: OutputFormat::Table,
    });
    let start_time = Instant::now();
    let config_path = cli.config.map(PathBuf::from);

    if let Commands::Init { force } = command {
        match district_rank::config::run_init(config_path, force) {
            Ok(path) => {
                println!("Wrote config to {}", path.display());
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        }
    }

    // Warnings become part of the JSON document instead of stderr noise
    if matches!(command, Commands::List { format: OutputFormat::Json }) {
        district_rank::diagnostics::activate();
    }

    // Load config
    let config = match district_rank::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = district_rank::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let mut theme = config.effective_theme();
    if let Some(palette) = cli.palette {
        theme.palette = palette;
    }
    if let Some(style) = cli.base_map_style {
        theme.base_map_style = style;
    }

    let cache_path = district_rank::data::get_cache_path();
    if cli.clear_cache {
        match district_rank::data::clear_cache(&cache_path) {
            Ok(()) => {
                if cli.verbose {
                    eprintln!("Cleared dataset cache at {}", cache_path.display());
                }
            }
            Err(e) => buffered_eprintln!("Warning: {:#}", e),
        }
    }

    let data_path = match cli.data.clone().or_else(|| config.data.indicators.clone()) {
        Some(p) => p,
        None => {
            eprintln!("No indicator file configured.");
            eprintln!("Pass --data <csv> or add it to ~/.config/district-rank/config.yaml:");
            eprintln!("  data:");
            eprintln!("    indicators: District_Data_Modified.csv");
            std::process::exit(EXIT_CONFIG);
        }
    };

    let cache = DatasetCache::new(
        cache_path,
        district_rank::config::cache_config(&config, cli.no_cache),
    );
    let load_start = Instant::now();
    let (table, source) = match cache.get_or_load(&data_path, district_rank::data::load_indicators) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Data error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    };

    if cli.verbose {
        let origin = match source {
            CacheSource::Memory | CacheSource::Disk => "cache",
            CacheSource::Loaded => "file",
        };
        eprintln!(
            "Loaded {} districts x {} indicators from {} ({}) in {:?}",
            table.len(),
            table.columns.len(),
            data_path.display(),
            origin,
            load_start.elapsed()
        );
    }

    let schema = config.effective_schema();
    let options = ScoringOptions {
        order: RankOrder::Descending,
        tie_tolerance: config.effective_ranking().effective_tolerance(),
    };
    let scored = match district_rank::scoring::score_and_rank_with(&table, &schema, options) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Scoring error: {}", e);
            std::process::exit(EXIT_SCORING);
        }
    };

    for warning in &scored.warnings {
        buffered_eprintln!("Warning: {}", warning);
    }

    let colors = ThemeColors::from_config(&theme);
    let use_colors = district_rank::output::should_use_colors();

    let exit_code = match command {
        Commands::List { format } => run_list(&scored, format, &colors, use_colors),
        Commands::Show { district } => {
            match district_rank::output::format_profile(&district, &table, &scored, &schema, &colors, use_colors) {
                Ok(text) => {
                    println!("{}", text);
                    EXIT_SUCCESS
                }
                Err(ScoringError::UnknownEntity(id)) => {
                    eprintln!("No district named '{}' in {}", id, data_path.display());
                    EXIT_DATA
                }
                Err(e) => {
                    eprintln!("Scoring error: {}", e);
                    EXIT_SCORING
                }
            }
        }
        Commands::Compare { districts } => {
            let ids: Vec<String> = if districts.is_empty() {
                table.ids().take(3).map(String::from).collect()
            } else {
                districts
            };
            println!(
                "{}",
                district_rank::output::format_comparison(&ids, &scored, &colors, use_colors)
            );
            EXIT_SUCCESS
        }
        Commands::Param { column } => {
            match district_rank::output::format_parameter_table(&table, &column, &colors, use_colors) {
                Ok(text) => {
                    println!("{}", text);
                    EXIT_SUCCESS
                }
                Err(e) => {
                    eprintln!("Scoring error: {}", e);
                    EXIT_SCORING
                }
            }
        }
        Commands::Map { out, param } => {
            run_map(&cli.boundaries, &config, &table, &scored, &theme, out, param, cli.verbose)
        }
        Commands::Init { .. } => EXIT_SUCCESS,
    };

    if cli.verbose {
        eprintln!("Total time: {:?}", start_time.elapsed());
    }

    std::process::exit(exit_code);
}

fn run_list(scored: &ScoredTable, format: OutputFormat, colors: &ThemeColors, use_colors: bool) -> i32 {
    match format {
        OutputFormat::Table => {
            println!("{}", district_rank::output::format_ranked_table(scored, colors, use_colors));
            if !scored.is_empty() {
                println!();
                println!("{}", district_rank::output::format_podium(scored, use_colors));
            }
        }
        OutputFormat::Tsv => {
            let tsv = district_rank::output::format_tsv(scored);
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
        }
        OutputFormat::Json => {
            let warnings = district_rank::diagnostics::drain();
            match district_rank::output::format_json(scored, warnings) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize results: {}", e);
                    return EXIT_DATA;
                }
            }
        }
    }
    EXIT_SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_map(
    boundaries_flag: &Option<PathBuf>,
    config: &Config,
    table: &IndicatorTable,
    scored: &ScoredTable,
    theme: &ThemeConfig,
    out: PathBuf,
    param: Option<String>,
    verbose: bool,
) -> i32 {
    let boundaries_path = match boundaries_flag.clone().or_else(|| config.data.boundaries.clone()) {
        Some(p) => p,
        None => {
            eprintln!("No boundary file configured.");
            eprintln!("Pass --boundaries <geojson> or set data.boundaries in the config file.");
            return EXIT_CONFIG;
        }
    };
    let join_key = config
        .data
        .join_key
        .clone()
        .unwrap_or_else(|| table.key.clone());

    let boundaries = match district_rank::data::load_boundaries(&boundaries_path, &join_key) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Data error: {:#}", e);
            return EXIT_DATA;
        }
    };

    let joined = district_rank::data::join_boundaries(&boundaries, table, scored);
    if !joined.unmatched_scores.is_empty() {
        buffered_eprintln!(
            "Warning: no boundary for {}",
            joined.unmatched_scores.join(", ")
        );
    }
    if !joined.unmatched_boundaries.is_empty() {
        buffered_eprintln!(
            "Warning: no indicator data for boundaries {}",
            joined.unmatched_boundaries.join(", ")
        );
    }
    if joined.matched.is_empty() {
        eprintln!(
            "No boundary matched any district on '{}'. Check data.join_key.",
            join_key
        );
        return EXIT_DATA;
    }

    let fill_by = param.map(FillBy::Column).unwrap_or(FillBy::Score);
    let collection = match district_rank::output::build_feature_collection(&joined, table, &fill_by, theme) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Scoring error: {}", e);
            return EXIT_SCORING;
        }
    };

    let count = collection.features.len();
    if let Err(e) = district_rank::output::write_feature_collection(&out, collection) {
        eprintln!("Data error: {:#}", e);
        return EXIT_DATA;
    }

    if verbose {
        eprintln!("Joined {} of {} boundaries on '{}'", count, boundaries.len(), join_key);
    }
    println!("Wrote {} districts to {}", count, out.display());
    EXIT_SUCCESS
}
