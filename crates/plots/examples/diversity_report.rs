//! Example: End-to-end diversity report on synthetic data
//!
//! This example demonstrates the full analysis workflow:
//! 1. Build a synthetic cell table with regions, clusters and coordinates
//! 2. Compute the per-region diversity metric battery
//! 3. Compute local neighborhood diversity around each cell
//! 4. Render the three chart types to SVG files

use std::fs;

use cellscape_core::{CategoricalColumn, CellTable, TaxonomyLevel};
use cellscape_metrics::local::{local_metric, LocalMetricParams};
use cellscape_metrics::prelude::DiversityStat;
use cellscape_metrics::region::{diversity_metrics, RegionMetricParams};
use cellscape_plots::{
    barplot_dual_y_count_frac, barplot_stacked_proportions, plot_metric_levels, ChartStyle,
    Orientation, PaletteBook, StackedBarParams,
};

fn main() -> anyhow::Result<()> {
    let cells = synthetic_cells();
    println!("cells: {}", cells.len());

    // Region-level battery (count, frac, gt5 variants, Simpson, Shannon)
    let params = RegionMetricParams {
        levels: vec![TaxonomyLevel::Cluster, TaxonomyLevel::Supertype],
        ..Default::default()
    };
    let metrics = diversity_metrics(&cells, &params)?;
    println!("region metrics: {} regions x {} columns", metrics.n_regions(), metrics.columns().len());
    for region in metrics.regions() {
        println!(
            "  {region}: count_cluster={:.0} shannon_cluster={:.3}",
            metrics.value(region, "count_cluster")?,
            metrics.value(region, "shannon_index_cluster")?,
        );
    }

    // Local neighborhood diversity (15 nearest cells, self included)
    let local = local_metric(
        &cells,
        DiversityStat::InverseSimpson,
        "inverse_simpsons",
        &LocalMetricParams {
            levels: vec![TaxonomyLevel::Cluster],
            ..Default::default()
        },
    )?;
    let col = local.column("local_inverse_simpsons_cluster")?;
    let mean = col.sum() / col.len() as f64;
    println!("local inverse Simpson (cluster): mean {mean:.3} over {} cells", local.n_cells());

    // Charts
    let style = ChartStyle::default();
    fs::write(
        "count_frac_cluster.svg",
        barplot_dual_y_count_frac(&metrics, TaxonomyLevel::Cluster, true, &style)?,
    )?;
    fs::write(
        "shannon_levels.svg",
        plot_metric_levels(
            &metrics,
            "shannon_index",
            &[TaxonomyLevel::Cluster, TaxonomyLevel::Supertype],
            Some("Shannon diversity (bits)"),
            &style,
        )?,
    )?;
    fs::write(
        "proportions_cluster.svg",
        barplot_stacked_proportions(
            &cells,
            TaxonomyLevel::Cluster,
            &metrics,
            None,
            &PaletteBook::new(),
            &StackedBarParams {
                legend: true,
                orientation: Orientation::Horizontal,
                ..Default::default()
            },
            &ChartStyle::new(700, 500),
        )?,
    )?;

    println!("wrote count_frac_cluster.svg, shannon_levels.svg, proportions_cluster.svg");
    Ok(())
}

/// Three regions with very different composition, plus an unassigned pool
/// that the default exclusion list removes.
fn synthetic_cells() -> CellTable {
    let mut regions = Vec::new();
    let mut clusters = Vec::new();
    let mut supertypes = Vec::new();
    let mut coords = Vec::new();

    // MOB: 120 cells spread over 12 clusters clumped in space
    for i in 0..120 {
        regions.push("MOB".to_string());
        let c = i % 12;
        clusters.push(format!("c{c:02}"));
        supertypes.push(format!("st{}", c / 4));
        let clump = (c / 4) as f64 * 40.0;
        coords.push([clump + (i % 7) as f64, (i % 5) as f64, (i % 3) as f64]);
    }
    // ACB: 60 cells dominated by one cluster
    for i in 0..60 {
        regions.push("ACB".to_string());
        let c = if i < 52 { 20 } else { 21 + i % 3 };
        clusters.push(format!("c{c:02}"));
        supertypes.push("st9".to_string());
        coords.push([200.0 + (i % 8) as f64, (i % 6) as f64, 0.0]);
    }
    // SI: 20 cells, a single cluster
    for i in 0..20 {
        regions.push("SI".to_string());
        clusters.push("c30".to_string());
        supertypes.push("st9".to_string());
        coords.push([300.0 + (i % 4) as f64, (i % 5) as f64, 1.0]);
    }
    // unassigned: excluded from region metrics by default
    for i in 0..10 {
        regions.push("unassigned".to_string());
        clusters.push("c31".to_string());
        supertypes.push("st9".to_string());
        coords.push([400.0, i as f64, 0.0]);
    }

    CellTable::from_columns(
        CategoricalColumn::from_values(&regions),
        vec![
            (TaxonomyLevel::Cluster, CategoricalColumn::from_values(&clusters)),
            (TaxonomyLevel::Supertype, CategoricalColumn::from_values(&supertypes)),
        ],
        Some(coords),
    )
    .expect("consistent column lengths")
}
