//! CSV input and output for the CLI

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use cellscape_core::{CellRecord, CellTable, LocalMetrics, MetricTable, ProportionTable};

/// One row of the input cell table.
///
/// Taxonomy and coordinate columns are optional; when present they must be
/// filled for every row.
#[derive(Debug, Deserialize)]
pub struct CellRow {
    pub region: String,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub supertype: Option<String>,
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub x_ccf: Option<f64>,
    #[serde(default)]
    pub y_ccf: Option<f64>,
    #[serde(default)]
    pub z_ccf: Option<f64>,
}

pub fn read_cells(path: &Path) -> Result<CellTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut builder = CellTable::builder();
    for (i, row) in reader.deserialize().enumerate() {
        let row: CellRow = row.with_context(|| format!("Bad record at line {}", i + 2))?;
        let coords = match (row.x_ccf, row.y_ccf, row.z_ccf) {
            (Some(x), Some(y), Some(z)) => Some([x, y, z]),
            (None, None, None) => None,
            _ => anyhow::bail!("Incomplete coordinates at line {}", i + 2),
        };
        builder.push(CellRecord {
            region: row.region,
            cluster: row.cluster,
            supertype: row.supertype,
            subclass: row.subclass,
            coords,
        });
    }

    builder.build().context("Inconsistent input columns")
}

pub fn write_region_metrics(metrics: &MetricTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["region".to_string()];
    header.extend(metrics.columns().iter().cloned());
    writer.write_record(&header)?;

    for (region, row) in metrics.regions().iter().zip(metrics.data().rows()) {
        let mut record = vec![region.clone()];
        record.extend(row.iter().map(|v| format_value(*v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_local_metrics(local: &LocalMetrics, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(local.columns())?;
    for row in local.data().rows() {
        writer.write_record(row.iter().map(|v| format_value(*v)))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_proportions(props: &ProportionTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["region".to_string()];
    header.extend(props.categories().iter().cloned());
    writer.write_record(&header)?;

    for (region, row) in props.regions().iter().zip(props.data().rows()) {
        let mut record = vec![region.clone()];
        record.extend(row.iter().map(|v| format_value(*v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn format_value(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
