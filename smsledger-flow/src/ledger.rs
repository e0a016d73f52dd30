//! Remote ledger client.
//!
//! The workflow treats the ledger as an optimistic side channel: failures are
//! logged and never block or revert the local transition, so the client only
//! needs to report them honestly.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use smsledger_core::{LedgerRecord, LedgerReply};

pub trait LedgerClient: Send + Sync {
    fn post_transaction(
        &self,
        record: &LedgerRecord,
    ) -> impl Future<Output = Result<LedgerReply>> + Send;
}

impl<T: LedgerClient> LedgerClient for &T {
    fn post_transaction(
        &self,
        record: &LedgerRecord,
    ) -> impl Future<Output = Result<LedgerReply>> + Send {
        (**self).post_transaction(record)
    }
}

/// HTTP client for the remote ledger service.
pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpLedgerClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl LedgerClient for HttpLedgerClient {
    async fn post_transaction(&self, record: &LedgerRecord) -> Result<LedgerReply> {
        let url = format!("{}/api/expenses", self.base_url);
        let mut req = self.client.post(&url).json(record);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.context("ledger request")?;
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("ledger error: {status} {txt}");
        }
        resp.json::<LedgerReply>().await.context("parse ledger reply")
    }
}

/// No-op ledger for offline operation: every post succeeds locally.
pub struct NullLedger;

impl LedgerClient for NullLedger {
    async fn post_transaction(&self, _record: &LedgerRecord) -> Result<LedgerReply> {
        Ok(LedgerReply {
            success: true,
            message: Some("offline".to_string()),
        })
    }
}
