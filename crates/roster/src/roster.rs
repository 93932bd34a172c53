// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The application roster.

use crate::assets::localize_asset;
use sam_core::{AppId, AppPackage, ChangeKind, RosterChange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("app not found: {0}")]
    NotFound(AppId),

    #[error("app is not removable: {0}")]
    NotRemovable(AppId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad deleted-list file: {0}")]
    BadDeletedList(#[from] serde_json::Error),
}

/// On-disk shape of the deleted-system-apps file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DeletedList {
    #[serde(rename = "deletedList", default)]
    deleted: Vec<AppId>,
}

/// Authoritative in-memory map of installed applications.
///
/// Exactly one [`AppPackage`] per app id. Conflicts between install
/// directories are resolved by [`AppPackage::outranks`]; system apps the user
/// uninstalled stay out via the persisted deleted list.
pub struct Roster {
    apps: HashMap<AppId, AppPackage>,
    deleted_system_apps: Vec<AppId>,
    deleted_list_path: PathBuf,
    locale_fallbacks: Vec<String>,
    ready: bool,
}

impl Roster {
    /// Create an empty roster, loading the deleted-system-apps file when it
    /// exists. A damaged file is logged and treated as empty.
    pub fn new(deleted_list_path: impl Into<PathBuf>, locale_fallbacks: Vec<String>) -> Self {
        let deleted_list_path = deleted_list_path.into();
        let deleted_system_apps = match std::fs::read_to_string(&deleted_list_path) {
            Ok(contents) => match serde_json::from_str::<DeletedList>(&contents) {
                Ok(list) => list.deleted,
                Err(e) => {
                    warn!(path = %deleted_list_path.display(), error = %e,
                          "unreadable deleted-apps list, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self {
            apps: HashMap::new(),
            deleted_system_apps,
            deleted_list_path,
            locale_fallbacks,
            ready: false,
        }
    }

    /// Whether the first full scan has been applied.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn all(&self) -> &HashMap<AppId, AppPackage> {
        &self.apps
    }

    pub fn get(&self, app_id: &str) -> Option<&AppPackage> {
        self.apps.get(app_id)
    }

    pub fn deleted_system_apps(&self) -> &[AppId] {
        &self.deleted_system_apps
    }

    fn is_deleted_system_app(&self, candidate: &AppPackage) -> bool {
        candidate.type_by_dir.is_system() && self.deleted_system_apps.contains(&candidate.app_id)
    }

    fn admit(&self, mut candidate: AppPackage) -> AppPackage {
        if candidate.main.starts_with('$') {
            let localized =
                localize_asset(&candidate.folder_path, &candidate.main, &self.locale_fallbacks);
            candidate.main = localized.to_string_lossy().into_owned();
        }
        candidate
    }

    /// Ingest a full scan result and replace the roster contents.
    ///
    /// Candidates for the same app id are reduced to one winner; the roster
    /// is then diffed against its previous contents and the deltas returned.
    /// Install-time flags (`locked`, `flagged_for_removal`) survive a rescan.
    pub fn apply_scan(&mut self, found: Vec<AppPackage>, reason: &str) -> Vec<RosterChange> {
        let mut winners: HashMap<AppId, AppPackage> = HashMap::new();
        for candidate in found {
            if self.is_deleted_system_app(&candidate) {
                continue;
            }
            let candidate = self.admit(candidate);
            match winners.remove(&candidate.app_id) {
                Some(incumbent) if !candidate.outranks(&incumbent) => {
                    winners.insert(incumbent.app_id.clone(), incumbent);
                }
                _ => {
                    winners.insert(candidate.app_id.clone(), candidate);
                }
            }
        }

        let mut changes = Vec::new();

        for (app_id, package) in &mut winners {
            match self.apps.get(app_id) {
                Some(previous) => {
                    package.locked = previous.locked;
                    package.flagged_for_removal = previous.flagged_for_removal;
                    if *previous != *package {
                        changes.push(RosterChange {
                            app_id: app_id.clone(),
                            change: ChangeKind::Updated,
                            reason: reason.to_string(),
                        });
                    }
                }
                None => changes.push(RosterChange {
                    app_id: app_id.clone(),
                    change: ChangeKind::Added,
                    reason: reason.to_string(),
                }),
            }
        }

        for app_id in self.apps.keys() {
            if !winners.contains_key(app_id) {
                changes.push(RosterChange {
                    app_id: app_id.clone(),
                    change: ChangeKind::Removed,
                    reason: reason.to_string(),
                });
            }
        }

        info!(total = winners.len(), changed = changes.len(), reason, "roster scan applied");
        self.apps = winners;
        self.ready = true;
        changes
    }

    /// Ingest a single-app rescan (install/update path). `None` means the
    /// app is gone from disk.
    pub fn apply_one(
        &mut self,
        app_id: &AppId,
        candidate: Option<AppPackage>,
        reason: &str,
    ) -> Option<RosterChange> {
        match candidate {
            None => self.apps.remove(app_id).map(|_| RosterChange {
                app_id: app_id.clone(),
                change: ChangeKind::Removed,
                reason: reason.to_string(),
            }),
            Some(candidate) => {
                if self.is_deleted_system_app(&candidate) {
                    return None;
                }
                let candidate = self.admit(candidate);
                match self.apps.get(app_id) {
                    Some(incumbent) if !candidate.outranks(incumbent) => None,
                    Some(_) => {
                        self.apps.insert(app_id.clone(), candidate);
                        Some(RosterChange {
                            app_id: app_id.clone(),
                            change: ChangeKind::Updated,
                            reason: reason.to_string(),
                        })
                    }
                    None => {
                        self.apps.insert(app_id.clone(), candidate);
                        Some(RosterChange {
                            app_id: app_id.clone(),
                            change: ChangeKind::Added,
                            reason: reason.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Set or clear the install lock. A locked package rejects new launches.
    pub fn lock(&mut self, app_id: &str, locked: bool) -> Result<(), RosterError> {
        match self.apps.get_mut(app_id) {
            Some(package) => {
                info!(app_id, locked, "install lock changed");
                package.locked = locked;
                Ok(())
            }
            None => Err(RosterError::NotFound(AppId::new(app_id))),
        }
    }

    /// Flag a package for removal; it loses every future conflict and its
    /// running info is dropped once the instance stops.
    pub fn flag_for_removal(&mut self, app_id: &str) -> Result<(), RosterError> {
        match self.apps.get_mut(app_id) {
            Some(package) => {
                package.flagged_for_removal = true;
                Ok(())
            }
            None => Err(RosterError::NotFound(AppId::new(app_id))),
        }
    }

    /// Record a system app as user-deleted so scans stop re-adding it.
    pub fn mark_removed(&mut self, app_id: &AppId) -> Result<(), RosterError> {
        if !self.deleted_system_apps.contains(app_id) {
            self.deleted_system_apps.push(app_id.clone());
            self.persist_deleted_list()?;
        }
        Ok(())
    }

    /// Remove an app at the user's request.
    ///
    /// System apps are recorded in the deleted list; store apps are simply
    /// dropped here (the installer protocol is the caller's business).
    pub fn uninstall(&mut self, app_id: &str) -> Result<RosterChange, RosterError> {
        let package = match self.apps.get(app_id) {
            Some(package) => package,
            None => return Err(RosterError::NotFound(AppId::new(app_id))),
        };
        if !package.removable {
            return Err(RosterError::NotRemovable(AppId::new(app_id)));
        }

        let id = package.app_id.clone();
        if package.type_by_dir.is_system() {
            self.mark_removed(&id)?;
        }
        self.apps.remove(app_id);
        info!(app_id, "app uninstalled");
        Ok(RosterChange {
            app_id: id,
            change: ChangeKind::Removed,
            reason: "uninstalled".to_string(),
        })
    }

    fn persist_deleted_list(&self) -> Result<(), RosterError> {
        if let Some(parent) = self.deleted_list_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let list = DeletedList { deleted: self.deleted_system_apps.clone() };
        std::fs::write(&self.deleted_list_path, serde_json::to_string_pretty(&list)?)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "roster_tests.rs"]
mod tests;
