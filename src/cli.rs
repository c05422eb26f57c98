use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use anyhow::Result;

use crate::background::{Background, Connector, CredentialSource};
use crate::bridge::{self, Flow, PageEvent, SnapshotPage};
use crate::config::Config;
use crate::detect::{Detector, readout};
use crate::ghapi::{ContentStore, GitHubClient};
use crate::models::{InboundMessage, Platform};
use crate::signal::{Indicator, LogSink};
use crate::srs::ReviewRepository;

pub mod commands;

pub use commands::Commands;

/// The background context as the binary runs it: GitHub over HTTP, badge in the log.
pub fn background<R>(store: R, config: &Config) -> Background<R>
where
    R: ReviewRepository + CredentialSource,
{
    let api_url = config.api_url.clone();
    let connect: Connector = Box::new(move |credentials| {
        Arc::new(GitHubClient::new(&api_url, credentials.clone())) as Arc<dyn ContentStore>
    });

    Background::new(store, connect, Indicator::new(Arc::new(LogSink)))
}

/// Runs one page: page events come in on `events`, accepted submissions go
/// through `background` as they are detected.
///
/// Returns how many submissions were synced before the page unloaded or the
/// event stream ended.
pub async fn watch<R, E>(
    platform: Platform,
    config: &Config,
    background: &Background<R>,
    events: E,
) -> Result<usize>
where
    R: ReviewRepository + CredentialSource,
    E: AsyncBufRead + Unpin,
{
    let page = Arc::new(SnapshotPage::new(platform));
    let (outbox, mut inbox) = mpsc::unbounded_channel::<InboundMessage>();
    let detector = Detector::new(
        readout::probe_for(platform, page.clone()),
        page.clone(),
        config.detector(platform),
        outbox,
    );

    log::info!("[watch] Watching {platform} page events");
    let mut lines = events.lines();
    let mut synced = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::info!("[watch] Event stream closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<PageEvent>().and_then(|event| bridge::dispatch(&page, &detector, event)) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Stop) => break,
                    Err(err) => log::warn!("[watch] {err}"),
                }
            }
            Some(message) = inbox.recv() => {
                if background.handle(message).await.is_ok() {
                    synced += 1;
                }
            }
        }
    }

    // The page is gone; anything it already handed over still gets synced.
    drop(detector);
    while let Some(message) = inbox.recv().await {
        if background.handle(message).await.is_ok() {
            synced += 1;
        }
    }

    Ok(synced)
}
