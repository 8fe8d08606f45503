// src/pipeline.rs
use std::path::PathBuf;

use futures::future::join_all;
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::error::{HvsError, MetricFailure, Stage};
use crate::fetch::SourceFetcher;
use crate::metric::{Era, Metric};
use crate::process::{extract, merge, reshape, xlsx, LongRow};
use crate::reconcile::{reconcile, RenameMap};
use crate::sink::write_series;

/// What a successful metric run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub metric: Metric,
    pub path: PathBuf,
    pub rows: usize,
    pub areas: usize,
}

pub type MetricResult = Result<MetricOutcome, MetricFailure>;

/// Drives fetch → parse → extract → reshape → reconcile → merge → write for
/// each configured metric.
pub struct Pipeline<F> {
    fetcher: F,
    config: PipelineConfig,
    renames: &'static RenameMap,
}

impl<F: SourceFetcher> Pipeline<F> {
    pub fn new(fetcher: F, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            config,
            renames: RenameMap::census(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every selected metric. Metrics are independent: one failing does
    /// not stop or roll back the others. Results follow the configured order.
    pub async fn run_all(&self) -> Vec<MetricResult> {
        let mut metrics: Vec<Metric> = Vec::with_capacity(self.config.metrics.len());
        for m in &self.config.metrics {
            if !metrics.contains(m) {
                metrics.push(*m);
            }
        }
        join_all(metrics.into_iter().map(|m| self.run_metric(m))).await
    }

    #[instrument(level = "info", skip(self, metric), fields(metric = %metric))]
    pub async fn run_metric(&self, metric: Metric) -> MetricResult {
        let (early, late) = futures::join!(
            self.load_era(metric, Era::Early),
            self.load_era(metric, Era::Late)
        );
        let series = merge(metric, early?, late?);

        let path = self.config.output_path(metric);
        write_series(&series, &path, self.config.output_format)
            .map_err(|e| MetricFailure::new(metric, Stage::Write, e))?;

        let outcome = MetricOutcome {
            metric,
            path,
            rows: series.rows.len(),
            areas: series.area_count(),
        };
        info!(
            rows = outcome.rows,
            areas = outcome.areas,
            path = %outcome.path.display(),
            "metric complete"
        );
        Ok(outcome)
    }

    /// One era's long table, already in the target vocabulary.
    async fn load_era(&self, metric: Metric, era: Era) -> Result<Vec<LongRow>, MetricFailure> {
        let source_id = metric.spec().source(era);
        let fail =
            |stage: Stage, e: HvsError| MetricFailure::new(metric, stage, e).with_source(source_id);

        let bytes = self
            .fetcher
            .fetch(source_id)
            .await
            .map_err(|e| fail(Stage::Fetch, e))?;
        let table = xlsx::read_workbook(source_id, &bytes).map_err(|e| fail(Stage::Parse, e))?;
        let wide = extract(&table, self.config.layouts.for_era(era))
            .map_err(|e| fail(Stage::Extract, e))?;
        let long = reshape(&wide, &era.years()).map_err(|e| fail(Stage::Reshape, e))?;
        info!(
            source_id,
            era = era.as_str(),
            wide_rows = wide.len(),
            long_rows = long.len(),
            "era loaded"
        );

        // Only the era on the far side of the vocabulary change is rewritten.
        let mode = self.config.rename_mode;
        if mode.target_era() == Some(era) {
            Ok(reconcile(long, self.renames, mode))
        } else {
            Ok(long)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::init_test_logging;
    use crate::process::raw_table::Cell;
    use crate::process::utils::HEADER_LABEL;
    use crate::process::xlsx::test_support::workbook_bytes;
    use crate::reconcile::RenameMode;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;

    const EARLY_AREAS: [&str; 2] = ["Atlanta-Sandy Springs-Marietta, GA", "Akron, OH"];
    const LATE_AREAS: [&str; 2] = ["Atlanta-Sandy Springs-Roswell, GA", "Akron, OH"];

    struct MemoryFetcher {
        workbooks: HashMap<String, Vec<u8>>,
    }

    impl SourceFetcher for MemoryFetcher {
        async fn fetch(&self, source_id: &str) -> Result<Vec<u8>, HvsError> {
            self.workbooks
                .get(source_id)
                .cloned()
                .ok_or_else(|| HvsError::Fetch {
                    source_id: source_id.to_string(),
                    message: "404 Not Found".into(),
                })
        }
    }

    fn rate(metric: Metric, area_idx: usize, year: i32, quarter: usize) -> f64 {
        let base = match metric {
            Metric::HomeownershipRate => 60.0,
            Metric::RentalVacancyRate => 8.0,
            Metric::HomeownerVacancyRate => 1.0,
        };
        base + area_idx as f64 * 100.0 + (year - 2005) as f64 + quarter as f64 / 10.0
    }

    /// Census-style sheet: title, blank rows, then one block per year (label
    /// row followed by every area), then three footer rows.
    fn workbook(metric: Metric, era: Era, areas: &[&str], extra_row: bool) -> Vec<u8> {
        let mut rows = vec![vec![Cell::Text(format!("Table for {metric}"))]];
        rows.extend((1..8).map(|_| Vec::new()));
        for year in era.years() {
            rows.push(vec![
                Cell::Text(year.to_string()),
                Cell::Text(HEADER_LABEL.into()),
            ]);
            for (i, area) in areas.iter().enumerate() {
                let mut row = vec![
                    Cell::Number((i + 1) as f64),
                    Cell::Text(format!("{} {}", i + 1, area)),
                ];
                for q in 0..4 {
                    row.push(Cell::Number(rate(metric, i, year, q)));
                    row.push(Cell::Number(0.4));
                }
                rows.push(row);
            }
        }
        if extra_row {
            rows.push(vec![Cell::Empty, Cell::Text(areas[0].into())]);
        }
        rows.push(vec![Cell::Text("Source: Current Population Survey".into())]);
        rows.push(Vec::new());
        rows.push(vec![Cell::Text("Note: rates in percent".into())]);
        workbook_bytes(&rows)
    }

    fn fetcher() -> MemoryFetcher {
        let mut workbooks = HashMap::new();
        for metric in Metric::ALL {
            let spec = metric.spec();
            workbooks.insert(
                spec.early_source.to_string(),
                workbook(metric, Era::Early, &EARLY_AREAS, false),
            );
            workbooks.insert(
                spec.late_source.to_string(),
                workbook(metric, Era::Late, &LATE_AREAS, false),
            );
        }
        MemoryFetcher { workbooks }
    }

    fn config(out_dir: &Path, mode: RenameMode) -> PipelineConfig {
        PipelineConfig {
            out_dir: out_dir.to_path_buf(),
            rename_mode: mode,
            ..PipelineConfig::default()
        }
    }

    fn read_rows(path: &Path) -> Vec<(String, i32, String, f64)> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.records()
            .map(|r| {
                let r = r.unwrap();
                (
                    r[0].to_string(),
                    r[1].parse().unwrap(),
                    r[2].to_string(),
                    r[3].parse().unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn writes_all_three_tables() {
        init_test_logging();
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::KeepNew));

        let results = pipeline.run_all().await;
        assert_eq!(results.len(), 3);
        for (result, metric) in results.iter().zip(Metric::ALL) {
            let outcome = result.as_ref().unwrap();
            assert_eq!(outcome.metric, metric);
            assert_eq!(outcome.areas, 2);
            assert_eq!(outcome.rows, 2 * 14 * 4);

            let header = std::fs::read_to_string(&outcome.path).unwrap();
            let first_line = header.lines().next().unwrap();
            assert_eq!(
                first_line,
                format!("MSA_Name,Year,Quarter,{}", metric.spec().value_field)
            );

            let rows = read_rows(&outcome.path);
            assert_eq!(rows.len(), outcome.rows);
            assert!(rows
                .windows(2)
                .all(|w| (&w[0].0, w[0].1, &w[0].2) < (&w[1].0, w[1].1, &w[1].2)));
        }
    }

    #[tokio::test]
    async fn homeowner_vacancy_file_holds_its_own_series() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::KeepNew));
        pipeline.run_all().await;

        let path = pipeline.config().output_path(Metric::HomeownerVacancyRate);
        let rows = read_rows(&path);
        // Akron is area index 1 in the synthetic sheets
        let akron_2005_q1 = rows
            .iter()
            .find(|r| r.0 == "Akron, OH" && r.1 == 2005 && r.2 == "Q1")
            .unwrap();
        assert_eq!(akron_2005_q1.3, rate(Metric::HomeownerVacancyRate, 1, 2005, 0));
        assert_ne!(akron_2005_q1.3, rate(Metric::RentalVacancyRate, 1, 2005, 0));
    }

    #[tokio::test]
    async fn keep_new_unifies_on_new_names() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::KeepNew));
        pipeline.run_all().await;

        let rows = read_rows(&pipeline.config().output_path(Metric::HomeownershipRate));
        let old: Vec<&str> = RenameMap::census().old_names().collect();
        assert!(rows.iter().all(|r| !old.contains(&r.0.as_str())));

        let atlanta: Vec<i32> = rows
            .iter()
            .filter(|r| r.0 == "Atlanta-Sandy Springs-Roswell, GA" && r.2 == "Q4")
            .map(|r| r.1)
            .collect();
        assert_eq!(atlanta, (2005..=2018).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn keep_old_unifies_on_old_names() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::KeepOld));
        pipeline.run_all().await;

        let rows = read_rows(&pipeline.config().output_path(Metric::RentalVacancyRate));
        let names: std::collections::BTreeSet<&str> = rows.iter().map(|r| r.0.as_str()).collect();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["Akron, OH", "Atlanta-Sandy Springs-Marietta, GA"]
        );
    }

    #[tokio::test]
    async fn no_op_leaves_both_vocabularies() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::NoOp));
        let results = pipeline.run_all().await;
        assert_eq!(results[0].as_ref().unwrap().areas, 3);
    }

    #[tokio::test]
    async fn reruns_are_byte_identical() {
        let tmp = tempdir().unwrap();
        let pipeline = Pipeline::new(fetcher(), config(tmp.path(), RenameMode::KeepNew));

        pipeline.run_all().await;
        let first: Vec<Vec<u8>> = Metric::ALL
            .iter()
            .map(|m| std::fs::read(pipeline.config().output_path(*m)).unwrap())
            .collect();
        pipeline.run_all().await;
        let second: Vec<Vec<u8>> = Metric::ALL
            .iter()
            .map(|m| std::fs::read(pipeline.config().output_path(*m)).unwrap())
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_metric_does_not_block_others() {
        let tmp = tempdir().unwrap();
        let mut fetcher = fetcher();
        let missing = Metric::RentalVacancyRate.spec().late_source;
        fetcher.workbooks.remove(missing);
        let pipeline = Pipeline::new(fetcher, config(tmp.path(), RenameMode::KeepNew));

        let results = pipeline.run_all().await;
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());

        let failure = results[1].as_ref().unwrap_err();
        assert_eq!(failure.metric, Metric::RentalVacancyRate);
        assert_eq!(failure.stage, Stage::Fetch);
        assert_eq!(failure.source_id.as_deref(), Some(missing));
        assert!(!pipeline
            .config()
            .output_path(Metric::RentalVacancyRate)
            .exists());
    }

    #[tokio::test]
    async fn misaligned_years_fail_in_reshape() {
        let tmp = tempdir().unwrap();
        let mut fetcher = fetcher();
        let spec = Metric::HomeownershipRate.spec();
        fetcher.workbooks.insert(
            spec.early_source.to_string(),
            workbook(Metric::HomeownershipRate, Era::Early, &EARLY_AREAS, true),
        );
        let pipeline = Pipeline::new(fetcher, config(tmp.path(), RenameMode::KeepNew));

        let failure = pipeline
            .run_metric(Metric::HomeownershipRate)
            .await
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Reshape);
        match &failure.error {
            HvsError::YearAlignment {
                area,
                expected,
                found,
            } => {
                assert_eq!(area, "Atlanta-Sandy Springs-Marietta, GA");
                assert_eq!((*expected, *found), (10, 11));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[tokio::test]
    async fn layout_without_areas_fails_in_extract() {
        let tmp = tempdir().unwrap();
        let mut config = config(tmp.path(), RenameMode::KeepNew);
        // column 0 only holds row numbers and year labels, which clean to nothing
        config.layouts.late.columns = [0, 2, 4, 6, 8];
        let pipeline = Pipeline::new(fetcher(), config);

        let failure = pipeline
            .run_metric(Metric::RentalVacancyRate)
            .await
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Extract);
        assert_eq!(
            failure.source_id.as_deref(),
            Some(Metric::RentalVacancyRate.spec().late_source)
        );
        assert!(matches!(failure.error, HvsError::MalformedTable { .. }));
        assert!(!pipeline
            .config()
            .output_path(Metric::RentalVacancyRate)
            .exists());
    }

    #[tokio::test]
    async fn garbage_bytes_fail_in_parse() {
        let tmp = tempdir().unwrap();
        let mut fetcher = fetcher();
        fetcher.workbooks.insert(
            Metric::HomeownerVacancyRate.spec().late_source.to_string(),
            b"<html>moved</html>".to_vec(),
        );
        let pipeline = Pipeline::new(fetcher, config(tmp.path(), RenameMode::KeepNew));
        let failure = pipeline
            .run_metric(Metric::HomeownerVacancyRate)
            .await
            .unwrap_err();
        assert_eq!(failure.stage, Stage::Parse);
    }
}
