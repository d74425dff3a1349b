// ABOUTME: Startup and wiring of the watch → dedup → probe pipeline
// ABOUTME: Checks node reachability, spawns the dispatch task, and drives the event log on the caller's task

use crate::classify::{SignatureClassifier, SignatureTable};
use crate::config::Settings;
use crate::dispatch::{dispatch, spawn_probes};
use crate::image_protocols::ImageSink;
use crate::probe::Prober;
use crate::watcher::watch_providers;
use anyhow::{bail, Context, Result};
use kubo_sdk::KuboClient;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Pipeline {
    client: KuboClient,
    prober: Prober,
    queue_capacity: usize,
}

impl Pipeline {
    pub fn new(client: KuboClient, settings: &Settings, sink: Arc<dyn ImageSink>) -> Self {
        Self::with_classifier(client, settings, Arc::new(SignatureTable::new()), sink)
    }

    pub fn with_classifier(
        client: KuboClient,
        settings: &Settings,
        classifier: Arc<dyn SignatureClassifier>,
        sink: Arc<dyn ImageSink>,
    ) -> Self {
        let prober = Prober::new(Arc::new(client.clone()), classifier, sink)
            .with_abandon_level(settings.abandon_log_level);

        Self {
            client,
            prober,
            queue_capacity: settings.queue_capacity,
        }
    }

    /// Run until the event log fails. Every return is an error.
    pub async fn run(self) -> Result<Infallible> {
        if !self.client.is_up().await {
            bail!("Kubo node isn't running at {}", self.client.base_url());
        }

        let (queue, pending) = mpsc::channel(self.queue_capacity);
        tokio::spawn(dispatch(pending, spawn_probes(self.prober)));

        let mut tail = self
            .client
            .log_tail()
            .await
            .context("Failed to connect to the node's event log")?;
        log::info!("Watching provider announcements on {}", self.client.base_url());

        let err = match watch_providers(&mut tail, &queue).await {
            Ok(never) => match never {},
            Err(err) => err,
        };
        Err(err).with_context(|| format!("Stopped after {} log lines", tail.lines_read()))
    }
}
