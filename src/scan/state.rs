use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cache::FetchError;
use crate::error::ScanError;
use crate::models::{Asset, InterventionType};
use crate::tag;

use super::status::{install_status, permitted_types, InstallStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanOperation {
    View,
    AddIntervention,
    Create,
}

/// Dialogs the scan screen can have open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    AssetDetail,
    InterventionForm,
    CreationForm,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    /// Rejects further scans until the lookup settles.
    Resolving,
    Viewing,
    Interviewing {
        status: InstallStatus,
        permitted: Vec<InterventionType>,
    },
    Creating,
}

impl ScanPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Resolving => "resolving",
            ScanPhase::Viewing => "viewing",
            ScanPhase::Interviewing { .. } => "interviewing",
            ScanPhase::Creating => "creating",
        }
    }
}

/// Which form a write is submitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Intervention,
    Asset,
}

impl WriteKind {
    pub fn action(&self) -> &'static str {
        match self {
            WriteKind::Intervention => "submit_intervention",
            WriteKind::Asset => "submit_asset",
        }
    }
}

/// Result of looking a tag up in the asset collection.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Asset),
    NotFound,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Scan arrived while another was in progress or the session moved on.
    Ignored,
    ShowAsset { asset: Asset },
    StartIntervention {
        asset: Asset,
        status: InstallStatus,
        permitted: Vec<InterventionType>,
    },
    CreateAsset { tag: String },
}

/// Working state of the scan screen.
///
/// Fields change only through the transition methods below.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSession {
    operation: Option<ScanOperation>,
    raw: Option<String>,
    tag: Option<String>,
    asset: Option<Asset>,
    phase: ScanPhase,
    modals: BTreeSet<Modal>,
    writing: bool,
    #[serde(skip)]
    epoch: u64,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            operation: None,
            raw: None,
            tag: None,
            asset: None,
            phase: ScanPhase::Idle,
            modals: BTreeSet::new(),
            writing: false,
            epoch: 0,
        }
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(&self) -> Option<ScanOperation> {
        self.operation
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    pub fn modals(&self) -> &BTreeSet<Modal> {
        &self.modals
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ScanPhase::Idle
    }

    /// Clear everything but the selected operation and return to `Idle`.
    ///
    /// Bumping the epoch orphans any resolution or write still in flight.
    pub fn reset(&mut self) {
        let operation = self.operation;
        let epoch = self.epoch.wrapping_add(1);
        *self = Self {
            operation,
            epoch,
            ..Self::default()
        };
    }

    /// Switching operation always starts over, so the same tag can be
    /// rescanned for the new operation.
    pub fn select_operation(&mut self, operation: ScanOperation) {
        self.operation = Some(operation);
        self.reset();
    }

    /// `Idle` → `Resolving`. Returns the epoch the resolution belongs to, or
    /// `None` when the session is busy and the scan must be ignored.
    pub fn begin_resolving(&mut self, raw: &str) -> Result<Option<u64>, ScanError> {
        if self.phase != ScanPhase::Idle {
            return Ok(None);
        }
        if self.operation.is_none() {
            return Err(ScanError::InvalidPhase {
                action: "scan",
                phase: "no operation is selected",
            });
        }

        let tag = tag::extract(raw);
        if tag.is_empty() {
            return Err(ScanError::NotFound { tag });
        }

        self.raw = Some(raw.to_string());
        self.tag = Some(tag);
        self.phase = ScanPhase::Resolving;
        Ok(Some(self.epoch))
    }

    /// `Resolving` → `Viewing` / `Interviewing` / `Creating`, or a terminal
    /// error that resets the session.
    pub fn complete_resolution(
        &mut self,
        epoch: u64,
        resolution: Resolution,
    ) -> Result<ScanOutcome, ScanError> {
        if epoch != self.epoch || self.phase != ScanPhase::Resolving {
            return Ok(ScanOutcome::Ignored);
        }
        let Some(operation) = self.operation else {
            self.reset();
            return Ok(ScanOutcome::Ignored);
        };
        let tag = self.tag.clone().unwrap_or_default();

        match (operation, resolution) {
            (ScanOperation::View, Resolution::Found(asset)) => {
                self.enter(ScanPhase::Viewing, Modal::AssetDetail, Some(asset.clone()));
                Ok(ScanOutcome::ShowAsset { asset })
            }
            (ScanOperation::AddIntervention, Resolution::Found(asset)) => {
                let status = install_status(&asset.interventions);
                let permitted = permitted_types(status);
                self.enter(
                    ScanPhase::Interviewing {
                        status,
                        permitted: permitted.clone(),
                    },
                    Modal::InterventionForm,
                    Some(asset.clone()),
                );
                Ok(ScanOutcome::StartIntervention {
                    asset,
                    status,
                    permitted,
                })
            }
            (ScanOperation::Create, Resolution::NotFound) => {
                self.enter(ScanPhase::Creating, Modal::CreationForm, None);
                Ok(ScanOutcome::CreateAsset { tag })
            }
            (ScanOperation::Create, Resolution::Found(_)) => {
                self.reset();
                Err(ScanError::Conflict { tag })
            }
            (ScanOperation::View | ScanOperation::AddIntervention, Resolution::NotFound) => {
                self.reset();
                Err(ScanError::NotFound { tag })
            }
        }
    }

    /// The lookup could not reach the remote and had nothing cached.
    pub fn fail_resolution(&mut self, epoch: u64, err: FetchError) -> Result<ScanOutcome, ScanError> {
        if epoch != self.epoch {
            return Ok(ScanOutcome::Ignored);
        }
        self.reset();
        Err(ScanError::Fetch(err))
    }

    /// Mark a write as started from the current form phase.
    pub fn begin_write(&mut self, kind: WriteKind) -> Result<u64, ScanError> {
        let action = kind.action();
        let expected = match kind {
            WriteKind::Intervention => matches!(self.phase, ScanPhase::Interviewing { .. }),
            WriteKind::Asset => self.phase == ScanPhase::Creating,
        };
        if !expected {
            return Err(ScanError::InvalidPhase {
                action,
                phase: self.phase.name(),
            });
        }
        if self.writing {
            return Err(ScanError::InvalidPhase {
                action,
                phase: "a write is in flight",
            });
        }
        self.writing = true;
        Ok(self.epoch)
    }

    /// Write rejected (validation or remote); the form stays open.
    pub fn abort_write(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.writing = false;
        }
    }

    /// Write accepted; the session is done.
    pub fn finish_write(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.reset();
        }
    }

    fn enter(&mut self, phase: ScanPhase, modal: Modal, asset: Option<Asset>) {
        self.phase = phase;
        self.asset = asset;
        self.modals.insert(modal);
    }
}
