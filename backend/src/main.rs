//! Synchronisation entry point: loads settings, wires adapters, and runs the
//! engine once or periodically until interrupted.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use membership_sync::domain::ports::{
    CommerceSource, DirectorySource, FixtureCommerceSource, FixtureDirectorySource,
};
use membership_sync::domain::{
    ProgressState, RemoteSources, SyncEnvelope, SyncOrchestrator, SyncOutcome, SyncPorts,
    SyncScheduler,
};
use membership_sync::outbound::credentials::JsonCredentialStore;
use membership_sync::outbound::http::{
    CommerceCredentials, CommerceHttpClient, DirectoryHttpClient, LedgerHttpClient,
};
use membership_sync::outbound::memory::{MemoryStores, SnapshotFile};
use membership_sync::outbound::network::TcpProbeMonitor;
use membership_sync::outbound::notify::{TracingNotifier, TracingTelemetry};
use membership_sync::settings::SyncSettings;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        SyncSettings::load().map_err(|error| eyre!("failed to load settings: {error}"))?;

    let snapshot = SnapshotFile::new(settings.snapshot_path());
    let stores = MemoryStores::from_snapshot(
        snapshot
            .load()
            .wrap_err("failed to load the local store snapshot")?,
    );
    let credentials = JsonCredentialStore::open(settings.credentials_path())
        .wrap_err("failed to open the credential store")?;

    let ledger_url = settings
        .ledger_url()?
        .ok_or_else(|| eyre!("SYNC_LEDGER_URL must be set"))?;
    let sources = RemoteSources {
        ledger: Arc::new(
            LedgerHttpClient::new(&ledger_url, settings.http_timeout())
                .wrap_err("failed to build the ledger client")?,
        ),
        directory: directory_source(&settings)?,
        commerce: commerce_source(&settings)?,
    };

    let notifier = Arc::new(TracingNotifier::new(settings.notifications()));
    let ports = SyncPorts::new(
        stores.local_stores(),
        sources,
        Arc::new(credentials),
        notifier.clone(),
    );
    let envelope = SyncEnvelope::new(
        SyncOrchestrator::new(ports, Arc::new(DefaultClock)),
        Arc::new(TracingTelemetry),
        notifier,
    );
    let probe_address = settings
        .probe_address
        .clone()
        .or_else(|| probe_address_for(&ledger_url))
        .ok_or_else(|| eyre!("SYNC_PROBE_ADDRESS must be set when the ledger URL has no host"))?;
    let scheduler = SyncScheduler::new(
        envelope,
        Arc::new(TcpProbeMonitor::new(probe_address, settings.probe_timeout())),
        settings.scheduler_config(),
    );

    let persister = tokio::spawn(persist_when_idle(
        scheduler.subscribe(),
        stores.clone(),
        snapshot.clone(),
    ));

    let result = match settings.periodic_interval() {
        Some(every) => {
            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                if let Err(error) = signal::ctrl_c().await {
                    error!(error = %error, "failed to listen for ctrl-c");
                }
                trigger.cancel();
            });
            scheduler
                .run_periodic(every, settings.run_config(), shutdown)
                .await;
            Ok(())
        }
        None => run_once(&scheduler, &settings).await,
    };

    drop(scheduler);
    if let Err(join_error) = persister.await {
        warn!(error = %join_error, "snapshot task ended abnormally");
    }
    save_snapshot(&stores, &snapshot).await?;
    result
}

async fn run_once(scheduler: &SyncScheduler, settings: &SyncSettings) -> Result<()> {
    let ticket = scheduler.request_run(settings.run_config()).await;
    let outcome = tokio::select! {
        outcome = ticket.outcome() => outcome.wrap_err("scheduled run did not complete")?,
        _ = signal::ctrl_c() => {
            scheduler.cancel_current().await;
            SyncOutcome::Cancelled
        }
    };
    match outcome {
        SyncOutcome::Success(summary) => {
            info!(
                first_run = summary.first_run,
                accounts = summary.accounts.len(),
                associated = summary.associated.len(),
                "synchronisation succeeded"
            );
            Ok(())
        }
        SyncOutcome::Cancelled => {
            warn!("synchronisation cancelled");
            Ok(())
        }
        SyncOutcome::Failure(failure) => Err(eyre!("{failure}")),
    }
}

fn directory_source(settings: &SyncSettings) -> Result<Arc<dyn DirectorySource>> {
    match settings.directory_url()? {
        Some(url) => Ok(Arc::new(
            DirectoryHttpClient::new(url, settings.http_timeout())
                .wrap_err("failed to build the directory client")?,
        )),
        None => {
            warn!("SYNC_DIRECTORY_URL unset; directory treated as empty");
            Ok(Arc::new(FixtureDirectorySource))
        }
    }
}

fn commerce_source(settings: &SyncSettings) -> Result<Arc<dyn CommerceSource>> {
    let Some(shop_url) = settings.shop_url()? else {
        warn!("SYNC_SHOP_URL unset; commerce collections treated as empty");
        return Ok(Arc::new(FixtureCommerceSource));
    };
    let credentials = CommerceCredentials {
        key: settings
            .commerce_key
            .clone()
            .ok_or_else(|| eyre!("SYNC_COMMERCE_KEY must be set with SYNC_SHOP_URL"))?,
        secret: settings
            .commerce_secret
            .clone()
            .ok_or_else(|| eyre!("SYNC_COMMERCE_SECRET must be set with SYNC_SHOP_URL"))?,
    };
    Ok(Arc::new(
        CommerceHttpClient::new(shop_url, credentials, settings.http_timeout())
            .wrap_err("failed to build the shop client")?,
    ))
}

fn probe_address_for(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

/// Persist the local store every time a run hands the indicator back.
async fn persist_when_idle(
    mut progress: watch::Receiver<ProgressState>,
    stores: MemoryStores,
    snapshot: SnapshotFile,
) {
    while progress.changed().await.is_ok() {
        let idle = *progress.borrow_and_update() == ProgressState::Idle;
        if idle {
            if let Err(error) = save_snapshot(&stores, &snapshot).await {
                warn!(error = %error, "failed to persist local store");
            }
        }
    }
}

async fn save_snapshot(stores: &MemoryStores, snapshot: &SnapshotFile) -> Result<()> {
    snapshot
        .save(&stores.snapshot().await)
        .wrap_err_with(|| format!("failed to save snapshot to {}", snapshot.path().display()))?;
    info!(path = %snapshot.path().display(), "local store persisted");
    Ok(())
}
