// src/bin/verify_output.rs

use anyhow::{Context, Result};
use glob::glob;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

fn main() -> Result<()> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| "output".to_string());

    // 1) Find all output tables
    let pattern = format!("{}/Census_*.csv", dir);
    let paths: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    if paths.is_empty() {
        return Err(anyhow::anyhow!("No output tables found under '{}'", pattern));
    }

    // 2) Check each one
    let mut failed = 0;
    for path in &paths {
        match verify_table(path) {
            Ok(summary) => println!("✔ {}: {}", path.display(), summary),
            Err(e) => {
                failed += 1;
                println!("✘ {}: {:#}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!("{} of {} tables failed", failed, paths.len()));
    }
    Ok(())
}

/// Header shape, sort order, quarter labels and equal row counts per area.
fn verify_table(path: &Path) -> Result<String> {
    let mut rdr = csv::Reader::from_path(path).context("opening")?;
    let headers = rdr.headers().context("reading header")?.clone();
    let names: Vec<&str> = headers.iter().collect();
    if names.len() != 4 || names[..3] != ["MSA_Name", "Year", "Quarter"] {
        anyhow::bail!("unexpected header {:?}", names);
    }

    let mut prev: Option<(String, i32, String)> = None;
    let mut per_area: BTreeMap<String, usize> = BTreeMap::new();
    let mut rows = 0usize;
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("record {}", idx))?;
        let area = record[0].to_string();
        let year: i32 = record[1]
            .parse()
            .with_context(|| format!("record {}: bad year {:?}", idx, &record[1]))?;
        let quarter = record[2].to_string();
        if !QUARTERS.contains(&quarter.as_str()) {
            anyhow::bail!("record {}: bad quarter {:?}", idx, quarter);
        }
        if !record[3].is_empty() {
            record[3]
                .parse::<f64>()
                .with_context(|| format!("record {}: bad value {:?}", idx, &record[3]))?;
        }

        let key = (area, year, quarter);
        if let Some(p) = &prev {
            if *p > key {
                anyhow::bail!("record {}: {:?} sorts before {:?}", idx, key, p);
            }
        }
        *per_area.entry(key.0.clone()).or_default() += 1;
        prev = Some(key);
        rows += 1;
    }

    let mut counts: Vec<usize> = per_area.values().copied().collect();
    counts.dedup();
    if counts.len() > 1 {
        let uneven: Vec<_> = per_area.iter().filter(|(_, n)| **n != counts[0]).collect();
        anyhow::bail!("areas have unequal row counts: {:?}", uneven);
    }
    if counts.first().map_or(false, |n| n % 4 != 0) {
        anyhow::bail!("row count per area is not a whole number of years");
    }
    Ok(format!("{} rows, {} areas, {} value column", rows, per_area.len(), names[3]))
}
