use anyhow::Result;
use chrono::Local;
use leitos::{config::PipelineConfig, process, schema};
use std::{env, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_INPUT_DIR: &str = "dados/originais";
const DEFAULT_OUTPUT_DIR: &str = "dados/limpos";

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) arguments & config ───────────────────────────────────────
    // usage: leitos [INPUT_DIR] [OUTPUT_DIR]
    let mut args = env::args().skip(1);
    let input_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INPUT_DIR.into()));
    let output_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into()));
    let config_path = env::var_os("LEITOS_CONFIG").map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;

    // ─── 3) column consistency gate ──────────────────────────────────
    info!(dir = %input_dir.display(), "checking column consistency");
    let (consistent, report) = schema::check_directory(&input_dir, &config)?;
    report.log();
    if !consistent {
        warn!("processing stopped; fix the column inconsistencies first");
        return Ok(());
    }

    // ─── 4) normalize & consolidate ──────────────────────────────────
    info!("processing data");
    let Some(consolidated) = process::process_all(&input_dir, &config)? else {
        warn!("nothing was consolidated; no output written");
        return Ok(());
    };

    // ─── 5) write ────────────────────────────────────────────────────
    let path = process::consolidate::write_consolidated(
        &output_dir,
        &config.output_prefix,
        &consolidated.batch,
        Local::now().naive_local(),
    )?;
    consolidated.log_summary();
    info!(path = %path.display(), "done");
    Ok(())
}
