use serde::{Deserialize, Serialize};

use crate::models::{InterventionRecord, InterventionType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Installed,
    NotInstalled,
}

/// Installed iff there is an install and no decommission after the latest one.
pub fn install_status(interventions: &[InterventionRecord]) -> InstallStatus {
    let latest_install = interventions
        .iter()
        .filter(|i| i.intervention_type == InterventionType::Install)
        .map(|i| i.performed_at)
        .max();

    match latest_install {
        None => InstallStatus::NotInstalled,
        Some(installed_at) => {
            let decommissioned_after = interventions.iter().any(|i| {
                i.intervention_type == InterventionType::Decommission && i.performed_at > installed_at
            });
            if decommissioned_after {
                InstallStatus::NotInstalled
            } else {
                InstallStatus::Installed
            }
        }
    }
}

/// Intervention types the form offers for an asset in `status`.
pub fn permitted_types(status: InstallStatus) -> Vec<InterventionType> {
    match status {
        InstallStatus::NotInstalled => vec![InterventionType::Install],
        InstallStatus::Installed => vec![
            InterventionType::Maintain,
            InterventionType::Replace,
            InterventionType::Verify,
            InterventionType::Decommission,
        ],
    }
}
