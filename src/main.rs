use anyhow::{bail, Context, Result};
use hvs_msa::{
    config::PipelineConfig,
    fetch::{HttpFetcher, LocalFetcher, SourceFetcher},
    pipeline::{MetricResult, Pipeline},
    sink::report::RunReport,
};
use std::fs;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = PipelineConfig::load().context("loading configuration")?;
    info!(
        rename_mode = %config.rename_mode,
        format = config.output_format.extension(),
        offline = config.offline,
        metrics = config.metrics.len(),
        "configured"
    );
    for d in [&config.raw_dir, &config.out_dir] {
        fs::create_dir_all(d).with_context(|| format!("creating {}", d.display()))?;
    }

    // ─── 3) run every metric ─────────────────────────────────────────
    let start = Instant::now();
    let results = if config.offline {
        let fetcher = LocalFetcher::new(config.raw_dir.clone());
        run(fetcher, config.clone()).await
    } else {
        let fetcher = HttpFetcher::new(&config)?;
        run(fetcher, config.clone()).await
    };

    // ─── 4) report ───────────────────────────────────────────────────
    for result in &results {
        match result {
            Ok(o) => info!(metric = %o.metric, rows = o.rows, path = %o.path.display(), "written"),
            Err(f) => error!(
                metric = %f.metric,
                stage = %f.stage,
                source_id = f.source_id.as_deref().unwrap_or("-"),
                "{}",
                f.error
            ),
        }
    }
    let report = RunReport::new(&config, &results);
    let report_path = report.write(&config.out_dir)?;
    info!(path = %report_path.display(), elapsed = ?start.elapsed(), "run report written");

    let failures = report.failures();
    if failures > 0 {
        bail!("{} of {} metrics failed", failures, results.len());
    }
    info!("all done");
    Ok(())
}

async fn run<F: SourceFetcher>(fetcher: F, config: PipelineConfig) -> Vec<MetricResult> {
    Pipeline::new(fetcher, config).run_all().await
}
