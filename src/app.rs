use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use tokio::{io, task::JoinHandle, time::timeout};

use crate::{
    ai::GeminiClient,
    background::BackgroundService,
    config::AppConfig,
    host,
    infrastructure::{
        directories::ResolvedPaths,
        shutdown::{Shutdown, ShutdownReason},
    },
    storage::{JsonFileStore, SettingsStore},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The native-messaging host process: background service on stdin/stdout.
pub struct HostApp {
    service: Arc<BackgroundService>,
    shutdown: Shutdown,
}

impl HostApp {
    pub fn initialize(config: AppConfig, paths: &ResolvedPaths, shutdown: Shutdown) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(format!("feedguard/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let gemini = GeminiClient::new(http_client, config.gemini);

        let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(&paths.settings_path));
        tracing::info!(
            target: "storage",
            settings = %paths.settings_path.display(),
            "settings store ready"
        );

        Ok(Self {
            service: Arc::new(BackgroundService::new(store, gemini)),
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let HostApp { service, shutdown } = self;
        let mut listener = shutdown.subscribe();

        let mut host_handle: JoinHandle<Result<(), host::FramingError>> = tokio::spawn(
            host::serve(io::stdin(), io::stdout(), service, shutdown.subscribe()),
        );

        tokio::select! {
            reason = listener.notified() => {
                tracing::info!(reason = ?reason, "stopping host");
            }
            res = &mut host_handle => {
                log_host_exit(res);
                shutdown.trigger(ShutdownReason::InputClosed);
                tracing::info!("host finished");
                return Ok(());
            }
        }

        match timeout(SHUTDOWN_TIMEOUT, &mut host_handle).await {
            Ok(res) => log_host_exit(res),
            Err(_) => {
                tracing::warn!(
                    target: "host",
                    "host did not stop within {:?}; aborting",
                    SHUTDOWN_TIMEOUT
                );
                host_handle.abort();
            }
        }
        tracing::info!("host finished");
        Ok(())
    }
}

fn log_host_exit(res: Result<Result<(), host::FramingError>, tokio::task::JoinError>) {
    match res {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(target: "host", error = %err, "host loop failed"),
        Err(err) if err.is_panic() => tracing::error!(target: "host", "host task panicked"),
        Err(_) => {}
    }
}
