//! Cellscape CLI - per-region diversity analysis of spatial cell data

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cellscape_core::{CellTable, TaxonomyLevel};
use cellscape_metrics::diversity::DiversityStat;
use cellscape_metrics::local::{local_metric, LocalMetricParams};
use cellscape_metrics::proportions::{level_proportions, ProportionParams};
use cellscape_metrics::region::{diversity_metrics, region_metric, RegionMetricParams};
use cellscape_plots::{
    barplot_dual_y_count_frac, barplot_stacked_proportions, plot_metric_levels, ChartStyle,
    Orientation, PaletteBook, StackedBarParams,
};

mod io;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cellscape")]
#[command(author, version, about = "Per-region diversity analysis of spatial cell data", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a cell table
    Info {
        /// Input cell CSV
        input: PathBuf,
    },
    /// Per-region diversity metrics
    RegionMetrics {
        /// Input cell CSV
        input: PathBuf,
        /// Output metrics CSV
        output: PathBuf,
        /// Taxonomy levels, comma separated (cluster,supertype,subclass)
        #[arg(short, long, default_value = "cluster,supertype,subclass")]
        levels: String,
        /// Region labels to exclude, comma separated
        #[arg(short, long, default_value = "unassigned,TH-unassigned")]
        exclude: String,
        /// Compute a single statistic instead of the full battery
        #[arg(short, long)]
        metric: Option<String>,
    },
    /// Per-cell neighborhood diversity metrics
    LocalMetrics {
        /// Input cell CSV (must carry x_ccf/y_ccf/z_ccf columns)
        input: PathBuf,
        /// Output per-cell CSV, rows aligned with the input
        output: PathBuf,
        /// Statistic: count, frac, count_gt5, inverse_simpsons, shannon_index
        #[arg(short, long, default_value = "inverse_simpsons")]
        metric: String,
        /// Neighborhood size, in cells (the cell itself included)
        #[arg(short = 'k', long, default_value = "15")]
        neighbors: usize,
        /// Taxonomy levels, comma separated
        #[arg(short, long, default_value = "cluster,supertype,subclass")]
        levels: String,
    },
    /// Per-region category proportions
    Proportions {
        /// Input cell CSV
        input: PathBuf,
        /// Output proportion CSV (regions x categories)
        output: PathBuf,
        /// Taxonomy level
        #[arg(short = 't', long, default_value = "cluster")]
        level: String,
        /// Collapse categories at or below this fraction into "other"
        #[arg(long, default_value = "0.01")]
        min_frac: f64,
        /// Collapse categories at or below this cell count into "other"
        /// (overrides --min-frac)
        #[arg(long)]
        min_count: Option<u32>,
    },
    /// Chart rendering (SVG output)
    Plot {
        #[command(subcommand)]
        chart: PlotCommands,
    },
}

#[derive(Subcommand)]
enum PlotCommands {
    /// Barplot of unique-category count and fraction, twin y-axes
    DualAxis {
        /// Input cell CSV
        input: PathBuf,
        /// Output SVG file
        output: PathBuf,
        /// Taxonomy level
        #[arg(short = 't', long, default_value = "cluster")]
        level: String,
        /// Only count categories with more than 5 cells
        #[arg(long)]
        gt5: bool,
        /// Image size as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1000x500")]
        size: String,
    },
    /// Scatter one metric across regions for several taxonomy levels
    Metric {
        /// Input cell CSV
        input: PathBuf,
        /// Output SVG file
        output: PathBuf,
        /// Metric column prefix (e.g. shannon_index)
        #[arg(short, long, default_value = "shannon_index")]
        metric: String,
        /// Taxonomy levels, comma separated
        #[arg(short, long, default_value = "cluster,supertype,subclass")]
        levels: String,
        /// Y-axis label
        #[arg(long)]
        ylabel: Option<String>,
        /// Image size as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1000x500")]
        size: String,
    },
    /// Stacked barplot of per-region category proportions
    Proportions {
        /// Input cell CSV
        input: PathBuf,
        /// Output SVG file
        output: PathBuf,
        /// Taxonomy level
        #[arg(short = 't', long, default_value = "cluster")]
        level: String,
        /// Collapse categories at or below this fraction into "other"
        #[arg(long, default_value = "0.01")]
        min_frac: f64,
        /// Collapse categories at or below this cell count into "other"
        #[arg(long)]
        min_count: Option<u32>,
        /// Restrict the chart to these regions, comma separated
        #[arg(short, long)]
        regions: Option<String>,
        /// Horizontal bars, least diverse region at the top
        #[arg(long)]
        horizontal: bool,
        /// Draw the category legend
        #[arg(long)]
        legend: bool,
        /// Image size as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1000x500")]
        size: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_cells(path: &PathBuf) -> Result<CellTable> {
    let pb = spinner("Reading cells...");
    let cells = io::read_cells(path)?;
    pb.finish_and_clear();
    info!(
        "Input: {} cells, {} regions",
        cells.len(),
        cells.region().n_categories()
    );
    Ok(cells)
}

fn parse_levels(s: &str) -> Result<Vec<TaxonomyLevel>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<TaxonomyLevel>()
                .map_err(anyhow::Error::from)
        })
        .collect()
}

fn parse_level(s: &str) -> Result<TaxonomyLevel> {
    s.trim().parse::<TaxonomyLevel>().map_err(Into::into)
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// A statistic and its normalizer, by output column name.
fn parse_stat(s: &str) -> Result<(DiversityStat, Option<DiversityStat>)> {
    use DiversityStat::*;
    match s.to_lowercase().as_str() {
        "count" | "count_unique" => Ok((CountUnique, None)),
        "frac" => Ok((CountUnique, Some(CountUnique))),
        "count_norm2cells" => Ok((CountUniqueNorm, None)),
        "count_gt5" => Ok((CountGtThreshold, None)),
        "frac_gt5" => Ok((CountGtThreshold, Some(CountUnique))),
        "inverse_simpsons" | "isi" => Ok((InverseSimpson, None)),
        "shannon_index" | "shannon" => Ok((Shannon, None)),
        _ => anyhow::bail!(
            "Unknown metric: {}. Use count, frac, count_norm2cells, count_gt5, frac_gt5, \
             inverse_simpsons, or shannon_index.",
            s
        ),
    }
}

fn parse_size(s: &str) -> Result<ChartStyle> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("Size must be WIDTHxHEIGHT, got: {s}"))?;
    let width: u32 = w.trim().parse().context("Invalid width")?;
    let height: u32 = h.trim().parse().context("Invalid height")?;
    Ok(ChartStyle::new(width, height))
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let cells = read_cells(&input)?;
            println!("File: {}", input.display());
            println!("Cells: {}", cells.len());
            println!("Regions: {}", cells.region().n_categories());
            for level in cells.levels() {
                let n = cells.level(level)?.n_categories();
                println!("  {level}: {n} categories");
            }
            println!(
                "Coordinates: {}",
                if cells.has_coords() { "x/y/z present" } else { "none" }
            );

            let counts = cells.region().counts();
            let mut by_count: Vec<(usize, &str)> = counts
                .iter()
                .enumerate()
                .map(|(code, &n)| (n, cells.region().category(code as u32)))
                .collect();
            by_count.sort_by(|a, b| b.cmp(a));
            println!("\nLargest regions:");
            for (n, region) in by_count.iter().take(10) {
                println!("  {region}: {n} cells");
            }
        }

        // ── Region metrics ───────────────────────────────────────────
        Commands::RegionMetrics {
            input,
            output,
            levels,
            exclude,
            metric,
        } => {
            let params = RegionMetricParams {
                levels: parse_levels(&levels)?,
                exclude: parse_list(&exclude),
            };
            let cells = read_cells(&input)?;
            let start = Instant::now();
            let metrics = match metric {
                Some(ref name) => {
                    let (stat, norm) = parse_stat(name)?;
                    region_metric(&cells, stat, name, &params, norm)
                        .context("Failed to compute region metric")?
                }
                None => diversity_metrics(&cells, &params)
                    .context("Failed to compute region metrics")?,
            };
            let elapsed = start.elapsed();
            info!(
                "Computed {} columns over {} regions",
                metrics.columns().len(),
                metrics.n_regions()
            );
            io::write_region_metrics(&metrics, &output)?;
            done("Region metrics", &output, elapsed);
        }

        // ── Local metrics ────────────────────────────────────────────
        Commands::LocalMetrics {
            input,
            output,
            metric,
            neighbors,
            levels,
        } => {
            let (stat, norm) = parse_stat(&metric)?;
            if norm.is_some() {
                anyhow::bail!("Normalized metrics are not defined per neighborhood; use count, count_gt5, inverse_simpsons, or shannon_index.");
            }
            let params = LocalMetricParams {
                n_neighbors: neighbors,
                levels: parse_levels(&levels)?,
            };
            let cells = read_cells(&input)?;
            let pb = spinner("Computing neighborhoods...");
            let start = Instant::now();
            let local = local_metric(&cells, stat, &metric, &params)
                .context("Failed to compute local metrics")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();
            io::write_local_metrics(&local, &output)?;
            done("Local metrics", &output, elapsed);
        }

        // ── Proportions ──────────────────────────────────────────────
        Commands::Proportions {
            input,
            output,
            level,
            min_frac,
            min_count,
        } => {
            let level = parse_level(&level)?;
            let params = ProportionParams { min_frac, min_count };
            let cells = read_cells(&input)?;
            let start = Instant::now();
            let props = level_proportions(&cells, level, &params)
                .context("Failed to compute proportions")?;
            let elapsed = start.elapsed();
            info!(
                "{} regions x {} categories",
                props.regions().len(),
                props.categories().len()
            );
            io::write_proportions(&props, &output)?;
            done("Proportions", &output, elapsed);
        }

        // ── Plots ────────────────────────────────────────────────────
        Commands::Plot { chart } => match chart {
            PlotCommands::DualAxis {
                input,
                output,
                level,
                gt5,
                size,
            } => {
                let level = parse_level(&level)?;
                let style = parse_size(&size)?;
                let cells = read_cells(&input)?;
                let start = Instant::now();
                let metrics = diversity_metrics(
                    &cells,
                    &RegionMetricParams {
                        levels: vec![level],
                        ..Default::default()
                    },
                )?;
                let svg = barplot_dual_y_count_frac(&metrics, level, gt5, &style)
                    .context("Failed to render chart")?;
                let elapsed = start.elapsed();
                std::fs::write(&output, svg)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                done("Chart", &output, elapsed);
            }

            PlotCommands::Metric {
                input,
                output,
                metric,
                levels,
                ylabel,
                size,
            } => {
                let levels = parse_levels(&levels)?;
                let style = parse_size(&size)?;
                let cells = read_cells(&input)?;
                let start = Instant::now();
                let metrics = diversity_metrics(
                    &cells,
                    &RegionMetricParams {
                        levels: levels.clone(),
                        ..Default::default()
                    },
                )?;
                let svg = plot_metric_levels(&metrics, &metric, &levels, ylabel.as_deref(), &style)
                    .context("Failed to render chart")?;
                let elapsed = start.elapsed();
                std::fs::write(&output, svg)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                done("Chart", &output, elapsed);
            }

            PlotCommands::Proportions {
                input,
                output,
                level,
                min_frac,
                min_count,
                regions,
                horizontal,
                legend,
                size,
            } => {
                let level = parse_level(&level)?;
                let style = parse_size(&size)?;
                let cells = read_cells(&input)?;
                let start = Instant::now();
                // The annotation and sort keys come from the metric battery.
                let metrics = diversity_metrics(
                    &cells,
                    &RegionMetricParams {
                        levels: vec![level],
                        ..Default::default()
                    },
                )?;
                let params = StackedBarParams {
                    regions: regions.as_deref().map(parse_list),
                    ordered_regions: None,
                    legend,
                    orientation: if horizontal {
                        Orientation::Horizontal
                    } else {
                        Orientation::Vertical
                    },
                    proportions: ProportionParams { min_frac, min_count },
                };
                let svg = barplot_stacked_proportions(
                    &cells,
                    level,
                    &metrics,
                    None,
                    &PaletteBook::new(),
                    &params,
                    &style,
                )
                .context("Failed to render chart")?;
                let elapsed = start.elapsed();
                std::fs::write(&output, svg)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                done("Chart", &output, elapsed);
            }
        },
    }

    Ok(())
}
