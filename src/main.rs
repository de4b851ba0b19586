use color_eyre::eyre::eyre;
use color_eyre::Result;
use glossa::cli::{parse_args, run_command, run_local_command};
use glossa::config::GlossaConfig;
use glossa::context::AppContext;
use tracing_subscriber::EnvFilter;

/// Log to stderr so the streamed answer on stdout stays clean.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glossa=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = parse_args(std::env::args());

    // Handle version/help before any initialization
    if let Some(result) = run_local_command(&command, &mut std::io::stdout()) {
        return result;
    }

    color_eyre::install()?;
    init_tracing();

    let config = GlossaConfig::load()?;
    let ctx = AppContext::from_config(config)?;

    let mut stdout = std::io::stdout();
    let result = tokio::select! {
        result = run_command(&ctx, command, &mut stdout) => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            ctx.shutdown();
            Err(eyre!("Interrupted"))
        }
    };

    ctx.shutdown();
    result
}
