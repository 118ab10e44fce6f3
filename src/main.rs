use anyhow::Result;
use modemscraper::{
    config::Config,
    cycle::{self, CycleOutcome, FailureBudget},
    fetch::{self, Session},
    report::Sink,
};
use tokio::time::sleep;
use tracing::{error, info, warn};
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
    let cfg = Config::from_env()?;
    info!(
        router = %cfg.router_addr,
        user = %cfg.username,
        rate_secs = cfg.rate.as_secs(),
        layout = ?cfg.layout,
        new_relic = cfg.new_relic.is_some(),
        "configured"
    );

    // ─── 3) session + sink ───────────────────────────────────────────
    let client = fetch::build_client()?;
    let sink = Sink::from_config(client.clone(), cfg.new_relic.as_ref())?;
    if matches!(sink, Sink::Log) {
        warn!("NEW_RELIC_LICENSE_KEY not set; events are only logged");
    }
    let session = Session::new(
        client,
        cfg.router_addr.clone(),
        cfg.username.clone(),
        cfg.password.clone(),
    );
    session.login().await?;

    // ─── 4) poll loop ────────────────────────────────────────────────
    let mut budget = FailureBudget::new(cfg.max_consecutive_failures);
    loop {
        match cycle::run_cycle(&session, &cfg.layout, &sink).await {
            Ok(CycleOutcome::Reported { events }) => {
                budget.succeeded();
                info!(events, "reported");
            }
            Ok(CycleOutcome::Relogged) => {
                info!("logged in again; skipping this cycle");
            }
            Err(e) => {
                error!("cycle failed: {:#}", e);
                let failures = budget.failed(e)?;
                warn!(failures, limit = cfg.max_consecutive_failures, "will retry next cycle");
            }
        }
        sleep(cfg.rate).await;
    }
}
