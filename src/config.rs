// src/config.rs

use crate::report::TableKind;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, time::Duration};
use url::Url;

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_RATE_SECS: u64 = 120;
const DEFAULT_MAX_FAILURES: u32 = 5;
const DEFAULT_APP_NAME: &str = "modemscraper";
const NEW_RELIC_EVENTS_URL: &str = "https://insights-collector.newrelic.com/v1/accounts/";

/// Position (1-based) of each table's block under `#content` on the status
/// page. Firmware updates move these around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableLayout {
    pub downstream: usize,
    pub upstream: usize,
    pub codewords: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            downstream: 13,
            upstream: 14,
            codewords: 15,
        }
    }
}

impl TableLayout {
    pub fn position(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Downstream => self.downstream,
            TableKind::Upstream => self.upstream,
            TableKind::Codewords => self.codewords,
        }
    }

    /// Read a YAML layout file; keys left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading layout file {}", path.display()))?;
        let layout: TableLayout = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing layout file {}", path.display()))?;
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<()> {
        for kind in TableKind::ALL {
            if self.position(kind) == 0 {
                bail!("{} table position must be 1 or greater", kind);
            }
        }
        Ok(())
    }
}

pub struct NewRelicConfig {
    pub license_key: String,
    pub account_id: String,
    pub app_name: String,
    pub events_url: Option<String>,
}

impl NewRelicConfig {
    pub fn events_url(&self) -> Result<Url> {
        let raw = match &self.events_url {
            Some(u) => u.clone(),
            None => format!("{}{}/events", NEW_RELIC_EVENTS_URL, self.account_id),
        };
        Url::parse(&raw).with_context(|| format!("parsing New Relic events URL {}", raw))
    }
}

/// Everything the poller needs, read once at startup.
pub struct Config {
    pub router_addr: Url,
    pub username: String,
    pub password: String,
    pub rate: Duration,
    pub max_consecutive_failures: u32,
    pub layout: TableLayout,
    pub new_relic: Option<NewRelicConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |key: &str| lookup(key).ok_or_else(|| anyhow!("{} not set", key));

        let router_addr = base_url(&required("ROUTER_ADDR")?)?;
        let username = lookup("ROUTER_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        let password = required("ROUTER_PASSWORD")?;

        let rate = match lookup("SCRAPE_RATE_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SCRAPE_RATE_SECS={:?}", raw))?,
            None => DEFAULT_RATE_SECS,
        };
        if rate == 0 {
            bail!("SCRAPE_RATE_SECS must be 1 or greater");
        }
        let max_consecutive_failures = match lookup("MAX_CONSECUTIVE_FAILURES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("MAX_CONSECUTIVE_FAILURES={:?}", raw))?,
            None => DEFAULT_MAX_FAILURES,
        };

        let layout = match lookup("TABLE_LAYOUT_FILE") {
            Some(path) => TableLayout::load(Path::new(&path))?,
            None => TableLayout::default(),
        };

        let new_relic = match (lookup("NEW_RELIC_LICENSE_KEY"), lookup("NEW_RELIC_ACCOUNT_ID")) {
            (Some(license_key), Some(account_id)) => Some(NewRelicConfig {
                license_key,
                account_id,
                app_name: lookup("NEW_RELIC_APP_NAME")
                    .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
                events_url: lookup("NEW_RELIC_EVENTS_URL"),
            }),
            (Some(_), None) => bail!("NEW_RELIC_ACCOUNT_ID not set"),
            (None, _) => None,
        };

        Ok(Self {
            router_addr,
            username,
            password,
            rate: Duration::from_secs(rate),
            max_consecutive_failures,
            layout,
            new_relic,
        })
    }
}

/// Parse the device address so page names join onto it rather than
/// replacing its last path segment.
fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("ROUTER_ADDR={:?}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
