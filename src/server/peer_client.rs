//! HTTP transport for replicating client commands to peers.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::broadcast::{PeerOutcome, PeerTarget};
use crate::server::routes::CommonResponse;
use crate::zone::{PeerCommandClient, ZoneCommand};

/// Posts commands to a peer's admin API as `ips=<list>` forms.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(HttpPeerClient { client })
    }

    async fn post(&self, peer: PeerTarget, command: ZoneCommand, ips: String) -> PeerOutcome {
        let url = format!("{}{}", peer.base_url(), command.path());
        debug!(%url, "sending command to peer");

        let response = match self.client.post(&url).form(&[("ips", ips)]).send().await {
            Ok(response) => response,
            Err(err) => return classify(&err),
        };
        let status = response.status();
        match response.json::<CommonResponse>().await {
            Ok(body) if body.success => PeerOutcome::Success,
            Ok(body) => PeerOutcome::Failed(body.message),
            Err(_) if !status.is_success() => {
                PeerOutcome::Failed(format!("peer returned {}", status))
            }
            Err(err) => classify(&err),
        }
    }
}

impl PeerCommandClient for HttpPeerClient {
    fn send(
        &self,
        peer: PeerTarget,
        command: ZoneCommand,
        ips: String,
    ) -> BoxFuture<'static, PeerOutcome> {
        let client = self.clone();
        Box::pin(async move { client.post(peer, command, ips).await })
    }
}

/// Only a refused connection or a timeout is ignorable. DNS, TLS and every
/// other error is a real failure.
fn classify(err: &reqwest::Error) -> PeerOutcome {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            let outcome = PeerOutcome::from_io_error(io_err);
            if !outcome.is_failure() {
                return outcome;
            }
        }
        source = cause.source();
    }

    if err.is_timeout() {
        PeerOutcome::Ignored("ignored error: connect timeout".to_string())
    } else {
        PeerOutcome::Failed(err.to_string())
    }
}
