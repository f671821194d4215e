use anyhow::{Context, Result};
use bondscraper::{
    config::{self, Config},
    extract::{self, PageRange},
    fetch, output, pipeline,
};
use chrono::Local;
use reqwest::Client;
use std::{env, fs, path::PathBuf};
use tracing::{info, warn};
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

    // ─── 2) resolve + load config ────────────────────────────────────
    let args: Vec<String> = env::args().skip(1).collect();
    let config_path = config::config_path_from_args(&args)?;
    let cfg = Config::load(&config_path)?;

    // ─── 3) download the listing document ────────────────────────────
    let client = Client::new();
    let downloads_dir = PathBuf::from("downloads");
    fs::create_dir_all(&downloads_dir)?;
    info!(url = %cfg.url, "downloading listing document");
    let doc_path = fetch::download_document(&client, &cfg.url, &downloads_dir).await?;
    let text = fs::read_to_string(&doc_path)
        .with_context(|| format!("failed to read downloaded document {}", doc_path.display()))?;

    // ─── 4) extract per-page fragments ───────────────────────────────
    let range: PageRange = cfg.page_range.parse()?;
    let fragments = extract::read_fragments(&text, &range)?;
    info!("extracted {} page fragments", fragments.len());

    // ─── 5) merge + rank ─────────────────────────────────────────────
    let table = pipeline::merge(&fragments, &cfg.index_column, &cfg.keep_columns)?;
    let now = Local::now().naive_local();
    let outcome = pipeline::rank(&table, cfg.face_value, cfg.maturity_horizon_years, now)?;
    for skip in &outcome.skipped {
        warn!(identifier = %skip.identifier, reason = %skip.reason, "record dropped");
    }

    // ─── 6) persist ──────────────────────────────────────────────────
    let filename = output::generate_output_filename(&cfg.csv_filename, "csv", now);
    output::write_ranked(&filename, &cfg.index_column, &table.columns, &outcome.ranked)?;

    info!(
        ranked = outcome.ranked.len(),
        skipped = outcome.skipped.len(),
        output = %filename,
        "all done"
    );
    Ok(())
}
