// src/cycle.rs

use crate::config::TableLayout;
use crate::error::ReportError;
use crate::extract::{columns_to_records, extract_indexed_table};
use crate::fetch::{CredentialsError, Session, StatusPage};
use crate::report::{report_entries, MetricEvent, Sink, TableKind};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::{debug, info, instrument};

/// How a single poll ended.
#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Reported { events: usize },
    /// The device had logged us out; nothing was read this time.
    Relogged,
}

/// Counts failed cycles in a row and decides when the poller gives up.
#[derive(Debug)]
pub struct FailureBudget {
    limit: u32,
    failures: u32,
}

impl FailureBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, failures: 0 }
    }

    pub fn succeeded(&mut self) {
        self.failures = 0;
    }

    /// Count a failed cycle. Returns the failures so far, or the error to exit
    /// with once the limit is reached. Rejected credentials never get a retry.
    pub fn failed(&mut self, err: anyhow::Error) -> Result<u32> {
        if err.is::<CredentialsError>() {
            return Err(err);
        }
        self.failures += 1;
        if self.failures >= self.limit {
            bail!("{} consecutive failed cycles, last: {:#}", self.failures, err);
        }
        Ok(self.failures)
    }
}

/// Turn one status page into events for all tables, downstream first.
///
/// Nothing is returned unless every table converts cleanly.
pub fn collect_events(
    body: &str,
    layout: &TableLayout,
    observed_at: DateTime<Utc>,
) -> Result<Vec<MetricEvent>, ReportError> {
    let doc = Html::parse_document(body);
    let mut events = Vec::new();

    for table in TableKind::ALL {
        let position = layout.position(table);
        let shape = |source| ReportError::Shape { table, source };

        let columns = extract_indexed_table(&doc, position).map_err(shape)?;
        let records = columns_to_records(&columns).map_err(shape)?;
        let mut table_events = report_entries(table, &records, observed_at)?;
        debug!(%table, position, channels = table_events.len(), "table converted");
        events.append(&mut table_events);
    }

    Ok(events)
}

/// Fetch, convert and record one cycle.
#[instrument(level = "info", skip_all)]
pub async fn run_cycle(
    session: &Session,
    layout: &TableLayout,
    sink: &Sink,
) -> Result<CycleOutcome> {
    let body = match session.fetch_status_page().await? {
        StatusPage::Body(body) => body,
        StatusPage::LoggedOut => return Ok(CycleOutcome::Relogged),
    };

    let events = collect_events(&body, layout, Utc::now())?;
    sink.record_all(&events).await?;
    info!(events = events.len(), "cycle reported");
    Ok(CycleOutcome::Reported {
        events: events.len(),
    })
}
