use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheService, FetchError, Snapshot};
use crate::error::ScanError;
use crate::models::{Asset, AssetReceipt, InterventionReceipt};
use crate::reconcile::{history_for_asset, Reconciler};
use crate::remote::Remote;
use crate::tag;
use crate::{log_error, log_info, log_warn};

use super::forms::{AssetDraft, InterventionDraft};
use super::state::{Resolution, ScanOperation, ScanOutcome, ScanPhase, ScanSession, WriteKind};

const ENABLE_LOGS: bool = true;

/// Drives one scan screen: resolve a scanned tag, branch on the selected
/// operation, and submit the resulting form.
///
/// Cheap to clone; clones share the session. Everything suspends only the
/// calling step, and overlapping transitions are refused by the session
/// itself rather than by locks held across I/O.
#[derive(Clone)]
pub struct ScanController {
    session: Arc<Mutex<ScanSession>>,
    cache: Arc<CacheService>,
    reconciler: Reconciler,
    remote: Arc<dyn Remote>,
    mounted: CancellationToken,
}

impl ScanController {
    pub fn new(cache: Arc<CacheService>, remote: Arc<dyn Remote>) -> Self {
        Self {
            session: Arc::new(Mutex::new(ScanSession::new())),
            reconciler: Reconciler::new(cache.clone()),
            cache,
            remote,
            mounted: CancellationToken::new(),
        }
    }

    pub async fn snapshot(&self) -> ScanSession {
        self.session.lock().await.clone()
    }

    pub async fn select_operation(&self, operation: ScanOperation) -> Result<(), ScanError> {
        self.ensure_mounted()?;
        let mut session = self.session.lock().await;
        session.select_operation(operation);
        log_info!("scan operation set to {:?}", operation);
        Ok(())
    }

    /// Resolve a scan payload and move to the phase the operation calls for.
    ///
    /// A scan arriving while the session is not `Idle` is ignored.
    pub async fn scan(&self, raw: &str) -> Result<ScanOutcome, ScanError> {
        self.ensure_mounted()?;

        let (epoch, operation) = {
            let mut session = self.session.lock().await;
            match session.begin_resolving(raw)? {
                Some(epoch) => (epoch, session.operation()),
                None => {
                    log_info!("scan ignored while {}", session.phase().name());
                    return Ok(ScanOutcome::Ignored);
                }
            }
        };
        log_info!("resolving scan '{}'", tag::extract(raw));

        let resolution = self.resolve(raw, operation).await;

        if self.mounted.is_cancelled() {
            return Err(ScanError::Unmounted);
        }

        let mut session = self.session.lock().await;
        let outcome = match resolution {
            Ok(resolution) => session.complete_resolution(epoch, resolution),
            Err(err) => session.fail_resolution(epoch, err),
        };
        match &outcome {
            Ok(_) => log_info!("scan resolved; now {}", session.phase().name()),
            Err(err) => log_warn!("scan ended: {err}"),
        }
        outcome
    }

    /// Validate and send the intervention form.
    ///
    /// Validation failures leave the form open and touch neither the network
    /// nor the cache. A remote failure also leaves the form open; nothing is
    /// retried automatically.
    pub async fn submit_intervention(
        &self,
        draft: &InterventionDraft,
    ) -> Result<InterventionReceipt, ScanError> {
        self.ensure_mounted()?;

        let (epoch, payload) = {
            let mut session = self.session.lock().await;
            let epoch = session.begin_write(WriteKind::Intervention)?;
            let validated = match (session.asset(), session.phase()) {
                (Some(asset), ScanPhase::Interviewing { permitted, .. }) => {
                    draft.validate(&asset.id, permitted).map_err(ScanError::from)
                }
                (_, phase) => Err(ScanError::InvalidPhase {
                    action: WriteKind::Intervention.action(),
                    phase: phase.name(),
                }),
            };
            match validated {
                Ok(payload) => (epoch, payload),
                Err(err) => {
                    session.abort_write(epoch);
                    return Err(err);
                }
            }
        };

        let result = self.remote.create_intervention(&payload).await;
        let receipt = self.settle_write(epoch, result).await?;

        self.cache.invalidate_interventions().await;
        self.cache.invalidate_assets().await;
        log_info!("intervention {} recorded for asset {}", receipt.id, payload.asset_id);

        self.finish_write(epoch).await;
        Ok(receipt)
    }

    /// Validate and send the creation form for the scanned tag.
    pub async fn submit_asset(&self, draft: &AssetDraft) -> Result<AssetReceipt, ScanError> {
        self.ensure_mounted()?;

        let (epoch, payload) = {
            let mut session = self.session.lock().await;
            let epoch = session.begin_write(WriteKind::Asset)?;
            let tag = session.tag().unwrap_or_default().to_string();
            match draft.validate(&tag) {
                Ok(payload) => (epoch, payload),
                Err(err) => {
                    session.abort_write(epoch);
                    return Err(err.into());
                }
            }
        };

        let result = self.remote.create_asset(&payload).await;
        let receipt = self.settle_write(epoch, result).await?;

        self.cache.invalidate_assets().await;
        log_info!("asset {} created with tag {}", receipt.id, payload.tag);

        self.finish_write(epoch).await;
        Ok(receipt)
    }

    /// Close whatever is open and return to `Idle`.
    pub async fn cancel(&self) {
        self.session.lock().await.reset();
    }

    /// The owning screen is gone. Suspended steps finish their I/O but leave
    /// the session untouched.
    pub fn unmount(&self) {
        self.mounted.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    fn ensure_mounted(&self) -> Result<(), ScanError> {
        if self.mounted.is_cancelled() {
            Err(ScanError::Unmounted)
        } else {
            Ok(())
        }
    }

    /// Look the tag up, then for add-intervention attach the reconciled
    /// history the install status is computed from.
    async fn resolve(
        &self,
        raw: &str,
        operation: Option<ScanOperation>,
    ) -> Result<Resolution, FetchError> {
        let Some(asset) = self.lookup(raw).await? else {
            return Ok(Resolution::NotFound);
        };
        if operation != Some(ScanOperation::AddIntervention) {
            return Ok(Resolution::Found(asset));
        }

        let snapshot = self.reconciler.interventions(false).await?;
        if snapshot.stale {
            log_warn!("install status for {} uses stale interventions", asset.tag);
        }
        let interventions = history_for_asset(&asset, &snapshot.reconciled.records);
        Ok(Resolution::Found(Asset {
            interventions,
            ..asset
        }))
    }

    /// Look in the current snapshot first; on a miss refresh exactly once.
    async fn lookup(&self, raw: &str) -> Result<Option<Asset>, FetchError> {
        let assets = self.cache.assets(false).await?;
        warn_if_stale(&assets);
        if let Some(asset) = find_by_tag(&assets, raw) {
            return Ok(Some(asset));
        }

        let assets = self.cache.assets(true).await?;
        warn_if_stale(&assets);
        Ok(find_by_tag(&assets, raw))
    }

    async fn settle_write<R>(&self, epoch: u64, result: anyhow::Result<R>) -> Result<R, ScanError> {
        match result {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                log_error!("write failed: {err:#}");
                if !self.mounted.is_cancelled() {
                    self.session.lock().await.abort_write(epoch);
                }
                Err(ScanError::Write(err))
            }
        }
    }

    async fn finish_write(&self, epoch: u64) {
        if self.mounted.is_cancelled() {
            return;
        }
        self.session.lock().await.finish_write(epoch);
    }
}

fn find_by_tag(assets: &Snapshot<Asset>, raw: &str) -> Option<Asset> {
    assets.iter().find(|asset| tag::matches(&asset.tag, raw)).cloned()
}

fn warn_if_stale(assets: &Snapshot<Asset>) {
    if let Some(reason) = assets.stale_reason() {
        log_warn!("resolving against {} stale assets: {reason}", assets.len());
    }
}
