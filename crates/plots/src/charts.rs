//! Chart generation using plotters (SVG output)
//!
//! All charts render into an SVG string; nothing is written to disk here.
//! The SVG backend also avoids system font dependencies.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontTransform, TextStyle};

use cellscape_core::{CellTable, Error, MetricTable, ProportionTable, TaxonomyLevel};
use cellscape_metrics::proportions::{level_proportions, ProportionParams};

use crate::palette::{fallback_palette, PaletteProvider, Rgb};

/// Bar color shared by the count/fraction charts.
const BAR_COLOR: RGBColor = RGBColor(93, 167, 229);

/// Per-level series colors for the multi-level metric chart.
const LEVEL_COLORS: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
];

/// Rendering configuration, passed explicitly to every chart call.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            font_size: 12,
        }
    }
}

impl ChartStyle {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

/// Bar orientation for the stacked proportion chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Options for [`barplot_stacked_proportions`].
#[derive(Debug, Clone, Default)]
pub struct StackedBarParams {
    /// Restrict the chart to these regions (intersection with the data).
    pub regions: Option<Vec<String>>,
    /// Explicit display order; overrides the diversity-based sort.
    pub ordered_regions: Option<Vec<String>>,
    /// Draw the category legend.
    pub legend: bool,
    pub orientation: Orientation,
    /// Thresholds for collapsing rare categories into `other`.
    pub proportions: ProportionParams,
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn segment_label(names: &[String], v: &SegmentValue<usize>) -> String {
    match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            names.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

/// Barplot with both the unique-category count and the fraction of all
/// categories per region, on twin y-axes.
///
/// Regions are sorted so they display low to high count, left to right.
/// With `gt5_only`, the `count_gt5`/`frac_gt5` columns are used instead of
/// the raw `count`/`frac` columns.
pub fn barplot_dual_y_count_frac(
    metrics: &MetricTable,
    level: TaxonomyLevel,
    gt5_only: bool,
    style: &ChartStyle,
) -> Result<String> {
    let (count_col, frac_col) = if gt5_only {
        (format!("count_gt5_{level}"), format!("frac_gt5_{level}"))
    } else {
        (format!("count_{level}"), format!("frac_{level}"))
    };

    let order = metrics.regions_sorted_by(&count_col)?;
    if order.is_empty() {
        bail!("no regions to plot");
    }

    let counts = column_in_order(metrics, &order, &count_col)?;
    let fracs = column_in_order(metrics, &order, &frac_col)?;

    let n = order.len();
    let count_max = (counts.iter().cloned().fold(f64::MIN, f64::max) * 1.05).max(1.0);
    let frac_max = (fracs.iter().cloned().fold(f64::MIN, f64::max) * 1.05).max(1e-6);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{level} count per CCF structure"),
                ("sans-serif", style.font_size * 2),
            )
            .margin(10)
            .x_label_area_size(110)
            .y_label_area_size(60)
            .right_y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), 0.0..count_max)?
            .set_secondary_coord((0..n).into_segmented(), 0.0..frac_max);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| segment_label(&order, v))
            .x_label_style(
                ("sans-serif", style.font_size)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc("CCF subregions")
            .y_desc(format!("unique {level} count"))
            .axis_desc_style(("sans-serif", style.font_size))
            .draw()?;

        chart
            .configure_secondary_axes()
            .y_desc(format!("fraction of total {level} count"))
            .axis_desc_style(("sans-serif", style.font_size))
            .draw()?;

        chart.draw_secondary_series(fracs.iter().enumerate().map(|(i, &f)| {
            Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), f)],
                BAR_COLOR.filled(),
            )
        }))?;

        chart.draw_series(
            counts
                .iter()
                .enumerate()
                .map(|(i, &c)| Circle::new((SegmentValue::CenterOf(i), c), 3, BLACK.filled())),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Scatter one metric across regions for several taxonomy levels.
///
/// Regions are sorted ascending by the first level's column. With an empty
/// `levels` slice, `metric` is treated as a plain column name and plotted
/// as a single series.
pub fn plot_metric_levels(
    metrics: &MetricTable,
    metric: &str,
    levels: &[TaxonomyLevel],
    ylabel: Option<&str>,
    style: &ChartStyle,
) -> Result<String> {
    let sort_col = match levels.first() {
        Some(level) => format!("{metric}_{level}"),
        None => metric.to_string(),
    };

    let order = metrics.regions_sorted_by(&sort_col)?;
    if order.is_empty() {
        bail!("no regions to plot");
    }

    // (series name, values) pairs, drawn coarsest-last like the original.
    let mut series = Vec::new();
    if levels.is_empty() {
        series.push((metric.to_string(), column_in_order(metrics, &order, metric)?));
    } else {
        for level in levels.iter().rev() {
            let column = format!("{metric}_{level}");
            series.push((level.to_string(), column_in_order(metrics, &order, &column)?));
        }
    }

    let n = order.len();
    let y_max = series
        .iter()
        .flat_map(|(_, values)| values.iter().cloned())
        .fold(f64::MIN, f64::max)
        .max(1e-6)
        * 1.05;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(110)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_labels(n)
            .x_label_formatter(&|v| segment_label(&order, v))
            .x_label_style(
                ("sans-serif", style.font_size)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc("CCF structures")
            .y_desc(ylabel.unwrap_or(metric))
            .axis_desc_style(("sans-serif", style.font_size))
            .draw()?;

        for (s, (name, values)) in series.iter().enumerate() {
            let color = LEVEL_COLORS[s % LEVEL_COLORS.len()];
            chart
                .draw_series(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, &v)| Circle::new((SegmentValue::CenterOf(i), v), 3, color.filled())),
                )?
                .label(name.clone())
                .legend(move |(x, y)| Circle::new((x + 5, y), 3, color.filled()));
        }

        if !levels.is_empty() {
            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.8))
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(("sans-serif", style.font_size))
                .draw()?;
        }

        root.present()?;
    }

    Ok(svg)
}

/// Stacked barplot of per-region category proportions.
///
/// Unless an explicit order is supplied, regions are sorted ascending by
/// (number of non-zero non-`other` categories, inverse Simpson's index), so
/// bars run from least to most diverse. Bars are annotated with the raw
/// unique-category count and the number of displayed categories.
///
/// Without an explicit `params.regions` restriction, only regions present
/// in `metrics` are drawn; labels the metric battery excluded (such as
/// "unassigned") are dropped rather than erroring on the sort key lookup.
pub fn barplot_stacked_proportions(
    cells: &CellTable,
    level: TaxonomyLevel,
    metrics: &MetricTable,
    palette: Option<&BTreeMap<String, Rgb>>,
    provider: &dyn PaletteProvider,
    params: &StackedBarParams,
    style: &ChartStyle,
) -> Result<String> {
    let props = level_proportions(cells, level, &params.proportions)?;

    // Proportions cover every region with cells; sort keys and annotations
    // come from the metric table, which may exclude labels such as
    // "unassigned". Without an explicit restriction, keep the intersection.
    let keep: Vec<String> = match params.regions {
        Some(ref explicit) => explicit.clone(),
        None => props
            .regions()
            .iter()
            .filter(|r| metrics.regions().contains(*r))
            .cloned()
            .collect(),
    };
    let props = props.restrict(&keep)?;
    if props.regions().is_empty() {
        bail!("no regions to plot");
    }

    let order = match params.ordered_regions {
        Some(ref explicit) => explicit.clone(),
        None => sort_by_diversity(&props, metrics, level)?,
    };
    let props = props.reorder(&order)?;

    // The one recovery path: an unknown level falls back to the generic
    // categorical palette; any other palette failure propagates.
    let mut colors = match palette {
        Some(explicit) => explicit.clone(),
        None => match provider.taxonomy_palette(level) {
            Ok(p) => p,
            Err(Error::UnknownLevel(_)) => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        },
    };
    for (name, color) in fallback_palette(props.categories()) {
        colors.entry(name).or_insert(color);
    }

    // Cumulative offsets per region for stacking.
    let n = props.regions().len();
    let n_cats = props.categories().len();
    let mut offsets = vec![vec![0.0f64; n_cats + 1]; n];
    for (r, row) in props.data().rows().into_iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            offsets[r][c + 1] = offsets[r][c] + v;
        }
    }

    let annotations = annotation_text(&props, metrics, level)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE)?;

        match params.orientation {
            Orientation::Vertical => {
                let mut chart = ChartBuilder::on(&root)
                    .margin(10)
                    .x_label_area_size(110)
                    .y_label_area_size(60)
                    .build_cartesian_2d((0..n).into_segmented(), 0.0..1.09)?;

                let regions = props.regions().to_vec();
                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .disable_y_mesh()
                    .x_labels(n)
                    .x_label_formatter(&|v| segment_label(&regions, v))
                    .x_label_style(
                        ("sans-serif", style.font_size)
                            .into_font()
                            .transform(FontTransform::Rotate90),
                    )
                    .x_desc("CCF structure")
                    .y_desc(format!("proportion of cells in unique {level}"))
                    .axis_desc_style(("sans-serif", style.font_size))
                    .draw()?;

                for (c, category) in props.categories().iter().enumerate() {
                    let color = rgb(colors[category]);
                    let series = chart.draw_series((0..n).filter_map(|r| {
                        let (lo, hi) = (offsets[r][c], offsets[r][c + 1]);
                        (hi > lo).then(|| {
                            Rectangle::new(
                                [
                                    (SegmentValue::Exact(r), lo),
                                    (SegmentValue::Exact(r + 1), hi),
                                ],
                                color.filled(),
                            )
                        })
                    }))?;
                    if params.legend {
                        series
                            .label(category.clone())
                            .legend(move |(x, y)| {
                                Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled())
                            });
                    }
                }

                let label_style = TextStyle::from(("sans-serif", style.font_size).into_font())
                    .pos(Pos::new(HPos::Center, VPos::Bottom));
                chart.draw_series(annotations.iter().enumerate().map(|(r, text)| {
                    Text::new(text.clone(), (SegmentValue::CenterOf(r), 1.02), label_style.clone())
                }))?;

                if params.legend {
                    chart
                        .configure_series_labels()
                        .border_style(BLACK)
                        .background_style(WHITE.mix(0.8))
                        .position(SeriesLabelPosition::UpperLeft)
                        .label_font(("sans-serif", style.font_size))
                        .draw()?;
                }
            }
            Orientation::Horizontal => {
                // Least-diverse region at the top: segment 0 is at the
                // bottom, so reverse the row order for display.
                let display: Vec<usize> = (0..n).rev().collect();
                let regions: Vec<String> = display
                    .iter()
                    .map(|&r| props.regions()[r].clone())
                    .collect();

                let mut chart = ChartBuilder::on(&root)
                    .margin(10)
                    .x_label_area_size(40)
                    .y_label_area_size(110)
                    .build_cartesian_2d(0.0..1.11, (0..n).into_segmented())?;

                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .disable_y_mesh()
                    .y_labels(n)
                    .y_label_formatter(&|v| segment_label(&regions, v))
                    .y_label_style(("sans-serif", style.font_size))
                    .y_desc("CCF structure")
                    .x_desc(format!("proportion of cells in unique {level}"))
                    .axis_desc_style(("sans-serif", style.font_size))
                    .draw()?;

                for (c, category) in props.categories().iter().enumerate() {
                    let color = rgb(colors[category]);
                    let series = chart.draw_series(display.iter().enumerate().filter_map(
                        |(slot, &r)| {
                            let (lo, hi) = (offsets[r][c], offsets[r][c + 1]);
                            (hi > lo).then(|| {
                                Rectangle::new(
                                    [
                                        (lo, SegmentValue::Exact(slot)),
                                        (hi, SegmentValue::Exact(slot + 1)),
                                    ],
                                    color.filled(),
                                )
                            })
                        },
                    ))?;
                    if params.legend {
                        series
                            .label(category.clone())
                            .legend(move |(x, y)| {
                                Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled())
                            });
                    }
                }

                let label_style = TextStyle::from(("sans-serif", style.font_size).into_font())
                    .pos(Pos::new(HPos::Left, VPos::Center));
                chart.draw_series(display.iter().enumerate().map(|(slot, &r)| {
                    Text::new(
                        annotations[r].clone(),
                        (1.02, SegmentValue::CenterOf(slot)),
                        label_style.clone(),
                    )
                }))?;

                if params.legend {
                    chart
                        .configure_series_labels()
                        .border_style(BLACK)
                        .background_style(WHITE.mix(0.8))
                        .position(SeriesLabelPosition::LowerRight)
                        .label_font(("sans-serif", style.font_size))
                        .draw()?;
                }
            }
        }

        root.present()?;
    }

    Ok(svg)
}

fn column_in_order(metrics: &MetricTable, order: &[String], column: &str) -> Result<Vec<f64>> {
    order
        .iter()
        .map(|region| metrics.value(region, column).map_err(Into::into))
        .collect()
}

/// Regions sorted ascending by (non-zero non-`other` category count,
/// inverse Simpson's index).
fn sort_by_diversity(
    props: &ProportionTable,
    metrics: &MetricTable,
    level: TaxonomyLevel,
) -> Result<Vec<String>> {
    let nonzero = props.nonzero_counts();
    let isi_col = format!("inverse_simpsons_{level}");

    let mut keyed: Vec<(usize, f64, String)> = props
        .regions()
        .iter()
        .enumerate()
        .map(|(i, region)| {
            metrics
                .value(region, &isi_col)
                .map(|isi| (nonzero[i], isi, region.clone()))
                .map_err(anyhow::Error::from)
        })
        .collect::<Result<_>>()?;

    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    Ok(keyed.into_iter().map(|(_, _, region)| region).collect())
}

/// Per-region bar annotation: raw unique-category count over the number of
/// displayed (non-zero, non-`other`) categories.
fn annotation_text(
    props: &ProportionTable,
    metrics: &MetricTable,
    level: TaxonomyLevel,
) -> Result<Vec<String>> {
    let count_col = format!("count_{level}");
    let nonzero = props.nonzero_counts();

    props
        .regions()
        .iter()
        .zip(nonzero)
        .map(|(region, n_shown)| {
            let n_all = metrics.value(region, &count_col)?;
            Ok(format!("{}/{}", n_all as u64, n_shown))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellscape_core::CategoricalColumn;
    use cellscape_metrics::region::{diversity_metrics, RegionMetricParams};
    use crate::palette::PaletteBook;

    fn sample_cells() -> CellTable {
        let mut regions = Vec::new();
        let mut clusters = Vec::new();
        // "A": even mix of 3 clusters; "B": one cluster dominates.
        for i in 0..30 {
            regions.push("A");
            clusters.push(["c1", "c2", "c3"][i % 3]);
        }
        for i in 0..20 {
            regions.push("B");
            clusters.push(if i < 19 { "c1" } else { "c2" });
        }
        CellTable::from_columns(
            CategoricalColumn::from_values(regions),
            vec![(
                TaxonomyLevel::Cluster,
                CategoricalColumn::from_values(clusters),
            )],
            None,
        )
        .unwrap()
    }

    fn sample_metrics(cells: &CellTable) -> MetricTable {
        diversity_metrics(
            cells,
            &RegionMetricParams {
                levels: vec![TaxonomyLevel::Cluster],
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn dual_axis_chart_renders() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        let svg =
            barplot_dual_y_count_frac(&metrics, TaxonomyLevel::Cluster, true, &ChartStyle::default())
                .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("cluster count per CCF structure"));
    }

    #[test]
    fn dual_axis_unknown_column_errors() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        // Supertype columns were never computed.
        assert!(barplot_dual_y_count_frac(
            &metrics,
            TaxonomyLevel::Supertype,
            false,
            &ChartStyle::default()
        )
        .is_err());
    }

    #[test]
    fn metric_levels_chart_renders() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        let svg = plot_metric_levels(
            &metrics,
            "shannon_index",
            &[TaxonomyLevel::Cluster],
            Some("Shannon diversity"),
            &ChartStyle::default(),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn single_metric_mode_uses_plain_column() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        let svg =
            plot_metric_levels(&metrics, "count_cells", &[], None, &ChartStyle::default()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn stacked_chart_falls_back_without_palette() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        // Empty book: taxonomy_palette yields UnknownLevel, which must be
        // recovered from, not propagated.
        let svg = barplot_stacked_proportions(
            &cells,
            TaxonomyLevel::Cluster,
            &metrics,
            None,
            &PaletteBook::new(),
            &StackedBarParams {
                legend: true,
                ..Default::default()
            },
            &ChartStyle::default(),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn stacked_chart_horizontal_renders() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        let svg = barplot_stacked_proportions(
            &cells,
            TaxonomyLevel::Cluster,
            &metrics,
            None,
            &PaletteBook::new(),
            &StackedBarParams {
                orientation: Orientation::Horizontal,
                ..Default::default()
            },
            &ChartStyle::new(500, 900),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn stacked_chart_skips_regions_absent_from_metrics() {
        // "unassigned" cells appear in the proportion table but not in the
        // metric battery; with default params the chart drops them instead
        // of failing on the sort key lookup.
        let mut regions = Vec::new();
        let mut clusters = Vec::new();
        for i in 0..30 {
            regions.push("A");
            clusters.push(["c1", "c2", "c3"][i % 3]);
        }
        for _ in 0..5 {
            regions.push("unassigned");
            clusters.push("c9");
        }
        let cells = CellTable::from_columns(
            CategoricalColumn::from_values(regions),
            vec![(
                TaxonomyLevel::Cluster,
                CategoricalColumn::from_values(clusters),
            )],
            None,
        )
        .unwrap();
        let metrics = sample_metrics(&cells);
        assert!(!metrics.regions().contains(&"unassigned".to_string()));

        let svg = barplot_stacked_proportions(
            &cells,
            TaxonomyLevel::Cluster,
            &metrics,
            None,
            &PaletteBook::new(),
            &StackedBarParams::default(),
            &ChartStyle::default(),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn diversity_sort_puts_least_diverse_first() {
        let cells = sample_cells();
        let metrics = sample_metrics(&cells);
        let props =
            level_proportions(&cells, TaxonomyLevel::Cluster, &ProportionParams::default())
                .unwrap();
        let order = sort_by_diversity(&props, &metrics, TaxonomyLevel::Cluster).unwrap();
        assert_eq!(order, vec!["B".to_string(), "A".to_string()]);
    }
}
