// src/fetch/session.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

const LOGIN_PAGE: &str = "check.jst";
const STATUS_PAGE: &str = "network_setup.jst";

const BAD_CREDENTIALS_MARKER: &str = "alert(\"Incorrect ";
const LOGGED_OUT_MARKER: &str = "alert(\"Please Login First!\");";

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// The device rejected the configured user name or password.
#[derive(Debug, Error)]
#[error("incorrect user name or password")]
pub struct CredentialsError;

/// What a status page request produced.
#[derive(Debug)]
pub enum StatusPage {
    Body(String),
    /// The session had expired; a fresh login was done and the page should be
    /// requested again next cycle.
    LoggedOut,
}

/// A logged-in HTTP session with the gateway's web UI.
pub struct Session {
    client: Client,
    base: Url,
    username: String,
    password: String,
    retry_delay: Duration,
}

impl Session {
    /// `client` must have a cookie store; the login cookie lives there.
    pub fn new(client: Client, base: Url, username: String, password: String) -> Self {
        Self {
            client,
            base,
            username,
            password,
            retry_delay: RETRY_DELAY,
        }
    }

    fn page(&self, name: &str) -> Result<Url> {
        self.base
            .join(name)
            .with_context(|| format!("joining {} onto {}", name, self.base))
    }

    /// Post the login form. Fails with [`CredentialsError`] if the device
    /// answers with its "Incorrect user name or password" alert.
    #[instrument(level = "info", skip(self), fields(user = %self.username))]
    pub async fn login(&self) -> Result<()> {
        let url = self.page(LOGIN_PAGE)?;
        let body = self
            .client
            .post(url.clone())
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("POST {}", url))?
            .text()
            .await
            .with_context(|| format!("reading body from {}", url))?;

        if is_bad_credentials(&body) {
            return Err(CredentialsError.into());
        }
        info!("logged in");
        Ok(())
    }

    /// Fetch the status page, logging in again if the session expired.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_status_page(&self) -> Result<StatusPage> {
        let url = self.page(STATUS_PAGE)?;
        let body = self.get_text_with_retry(&url).await?;

        if is_logged_out(&body) {
            warn!("session expired; logging in again");
            self.login().await?;
            return Ok(StatusPage::LoggedOut);
        }
        debug!(bytes = body.len(), "fetched status page");
        Ok(StatusPage::Body(body))
    }

    /// GET `url`, retrying connection failures and 5xx answers. Any other
    /// non-success status fails at once.
    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let retry = match self.client.get(url.clone()).send().await {
                Ok(resp) if !resp.status().is_server_error() => {
                    return resp
                        .error_for_status()
                        .with_context(|| format!("Non-success status {}", url))?
                        .text()
                        .await
                        .with_context(|| format!("reading body from {}", url));
                }
                Ok(resp) => anyhow!("HTTP {}", resp.status()),
                Err(e) => anyhow!(e),
            };

            if attempt >= MAX_RETRIES {
                return Err(retry)
                    .with_context(|| format!("GET {} failed after {} attempts", url, attempt));
            }
            warn!(%url, attempt, error = %retry, "Retrying");
            sleep(self.retry_delay).await;
        }
    }
}

fn is_bad_credentials(body: &str) -> bool {
    body.contains(BAD_CREDENTIALS_MARKER)
}

fn is_logged_out(body: &str) -> bool {
    body.contains(LOGGED_OUT_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::build_client;
    use crate::fetch::test_server::{serve, Reply};

    const LOGGED_OUT_PAGE: &str = r#"<script type="text/javascript">alert("Please Login First!"); location.href="home_loggedout.jst";</script>"#;

    fn session(base: Url) -> Session {
        let mut session = Session::new(build_client().unwrap(), base, "admin".into(), "pw".into());
        session.retry_delay = Duration::from_millis(10);
        session
    }

    fn ok(body: &str) -> Reply {
        Reply::Respond(200, body.to_string())
    }

    #[test]
    fn login_alerts_are_recognised() {
        let rejected = r#"<script>alert("Incorrect user name or password!");</script>"#;
        assert!(is_bad_credentials(rejected));
        assert!(!is_bad_credentials("<html>welcome</html>"));

        assert!(is_logged_out(LOGGED_OUT_PAGE));
        assert!(!is_logged_out(rejected));
    }

    #[test]
    fn pages_join_onto_base() {
        let session = Session::new(
            Client::new(),
            Url::parse("http://10.0.0.1/").unwrap(),
            "admin".into(),
            "pw".into(),
        );
        assert_eq!(
            session.page(STATUS_PAGE).unwrap().as_str(),
            "http://10.0.0.1/network_setup.jst"
        );
    }

    #[tokio::test]
    async fn dropped_connections_are_retried() {
        let (base, requests) =
            serve(vec![Reply::Hangup, Reply::Hangup, ok("<html>status</html>")]).await;

        let page = session(base).fetch_status_page().await.unwrap();
        assert!(matches!(page, StatusPage::Body(ref b) if b == "<html>status</html>"));
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let (base, requests) =
            serve(vec![Reply::Hangup, Reply::Hangup, Reply::Hangup]).await;

        let err = session(base).fetch_status_page().await.unwrap_err();
        assert!(format!("{:#}", err).contains("after 3 attempts"), "{:#}", err);
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let (base, requests) =
            serve(vec![Reply::Respond(503, String::new()), ok("<html>status</html>")]).await;

        let page = session(base).fetch_status_page().await.unwrap();
        assert!(matches!(page, StatusPage::Body(_)));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let (base, requests) = serve(vec![
            Reply::Respond(404, String::new()),
            ok("<html>status</html>"),
        ])
        .await;

        let err = session(base).fetch_status_page().await.unwrap_err();
        assert!(format!("{:#}", err).contains("404"), "{:#}", err);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_session_logs_in_again() {
        let (base, requests) = serve(vec![ok(LOGGED_OUT_PAGE), ok("<html>welcome</html>")]).await;

        let page = session(base).fetch_status_page().await.unwrap();
        assert!(matches!(page, StatusPage::LoggedOut));
        assert_eq!(
            *requests.lock().unwrap(),
            vec!["GET /network_setup.jst", "POST /check.jst"]
        );
    }

    #[tokio::test]
    async fn rejected_login_is_a_credentials_error() {
        let (base, _) = serve(vec![ok(
            r#"<script>alert("Incorrect user name or password!");</script>"#,
        )])
        .await;

        let err = session(base).login().await.unwrap_err();
        assert!(err.is::<CredentialsError>());
    }
}
