use std::collections::{HashMap, HashSet};

use crate::models::{Asset, AssetRef, InterventionRecord};
use crate::log_warn;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Owner {
    Single(String),
    /// Listed under more than one asset; attributing it to either would merge
    /// two concrete assets' histories.
    Ambiguous,
}

/// intervention id → owning asset id, built from the nested asset listing,
/// plus the ids of every listed asset.
///
/// Only constructible complete, so lookups can never observe a partial map.
#[derive(Debug, Default)]
pub struct OwnerIndex {
    owners: HashMap<String, Owner>,
    assets: HashSet<String>,
}

impl OwnerIndex {
    pub fn build(assets: &[Asset]) -> Self {
        let mut owners: HashMap<String, Owner> = HashMap::new();
        let mut listed = HashSet::new();
        for asset in assets {
            listed.insert(asset.id.clone());
            for intervention in &asset.interventions {
                owners
                    .entry(intervention.id.clone())
                    .and_modify(|owner| {
                        if *owner != Owner::Single(asset.id.clone()) {
                            *owner = Owner::Ambiguous;
                        }
                    })
                    .or_insert_with(|| Owner::Single(asset.id.clone()));
            }
        }
        Self {
            owners,
            assets: listed,
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn lookup(&self, intervention_id: &str) -> Option<&Owner> {
        self.owners.get(intervention_id)
    }

    fn is_listed(&self, asset_id: &str) -> bool {
        self.assets.contains(asset_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Every record with its owner filled in, in listing order.
    pub records: Vec<InterventionRecord>,
    /// Records left `Unresolved` (written as the sentinel id).
    pub unresolved: usize,
    /// Subset of `unresolved` listed under several assets.
    pub ambiguous: usize,
}

/// Attach the owning asset to each flat intervention record.
///
/// The nested listing wins. A record missing from it keeps the owner the flat
/// listing reports only when that asset is itself listed; everything else is
/// `Unresolved`.
pub fn reconcile(assets: &[Asset], flat: &[InterventionRecord]) -> Reconciled {
    let index = OwnerIndex::build(assets);
    reconcile_with(&index, flat)
}

pub fn reconcile_with(index: &OwnerIndex, flat: &[InterventionRecord]) -> Reconciled {
    let mut unresolved = 0;
    let mut ambiguous = 0;

    let records = flat
        .iter()
        .map(|record| {
            let asset = match index.lookup(&record.id) {
                Some(Owner::Single(asset_id)) => AssetRef::Known(asset_id.clone()),
                Some(Owner::Ambiguous) => {
                    ambiguous += 1;
                    AssetRef::Unresolved
                }
                None => match record.asset.known_id() {
                    Some(asset_id) if index.is_listed(asset_id) => record.asset.clone(),
                    _ => AssetRef::Unresolved,
                },
            };
            if !asset.is_resolved() {
                unresolved += 1;
            }
            InterventionRecord {
                asset,
                ..record.clone()
            }
        })
        .collect();

    if unresolved > 0 {
        log_warn!(
            "{unresolved} of {} intervention records have no known asset ({ambiguous} ambiguous); assigned sentinel",
            flat.len()
        );
    }

    Reconciled {
        records,
        unresolved,
        ambiguous,
    }
}

/// Records that belong to `asset_id`. Unresolved records are never included,
/// whatever id is asked for.
pub fn interventions_for_asset<'a>(
    records: &'a [InterventionRecord],
    asset_id: &str,
) -> Vec<&'a InterventionRecord> {
    let wanted = AssetRef::from_wire(Some(asset_id.to_string()));
    let Some(wanted) = wanted.known_id() else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|record| record.asset.known_id() == Some(wanted))
        .collect()
}

/// The asset's nested interventions plus reconciled flat records attributed
/// to it, each id once. Nested copies win over flat ones.
pub fn history_for_asset(asset: &Asset, reconciled: &[InterventionRecord]) -> Vec<InterventionRecord> {
    let mut seen = HashSet::new();
    let nested = asset.interventions.iter().map(|record| InterventionRecord {
        asset: AssetRef::Known(asset.id.clone()),
        ..record.clone()
    });
    let flat = interventions_for_asset(reconciled, &asset.id)
        .into_iter()
        .cloned();

    nested
        .chain(flat)
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

pub fn unresolved(records: &[InterventionRecord]) -> Vec<&InterventionRecord> {
    records
        .iter()
        .filter(|record| !record.asset.is_resolved())
        .collect()
}
