//! Extension host contract
//!
//! The viewer pulls snapshots from an [`ExtensionHost`] and listens for
//! [`HostEvent`]s telling it that something changed. Hosts never push data;
//! every change is answered with a full pull and recompute.

use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};
use exthud_common::{ExtensionDescription, MarketplaceInfo};
use log::info;

use crate::analysis::StatusMap;
use crate::domain::SnapshotError;
use crate::snapshot::ExtensionSnapshot;

/// Change notification from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    StatusesChanged,
    MarketplaceChanged,
}

/// Source of extension data
pub trait ExtensionHost {
    /// Installed extensions. Read once, when the model is created.
    fn extension_descriptions(&self) -> Vec<ExtensionDescription>;

    /// Current status of every extension that has one
    fn current_statuses(&self) -> StatusMap;

    /// Marketplace metadata loaded so far
    fn marketplace_records(&self) -> Vec<MarketplaceInfo>;
}

/// Host backed by a snapshot file on disk
///
/// [`SnapshotHost::reload`] re-reads the file and announces what changed.
/// Descriptions in a reloaded file are ignored by models that already
/// captured theirs.
pub struct SnapshotHost {
    path: Option<PathBuf>,
    snapshot: ExtensionSnapshot,
    events: Sender<HostEvent>,
}

impl SnapshotHost {
    /// Open a snapshot file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Receiver<HostEvent>), SnapshotError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = ExtensionSnapshot::from_file(&path)?;
        info!(
            "loaded snapshot: {} descriptions, {} statuses, {} marketplace records",
            snapshot.descriptions.len(),
            snapshot.statuses.len(),
            snapshot.marketplace.len()
        );
        let (mut host, events) = Self::from_snapshot(snapshot);
        host.path = Some(path);
        Ok((host, events))
    }

    /// Serve an in-memory snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: ExtensionSnapshot) -> (Self, Receiver<HostEvent>) {
        let (events, rx) = unbounded();
        (Self { path: None, snapshot, events }, rx)
    }

    /// Replace the served snapshot and announce the change
    pub fn replace(&mut self, snapshot: ExtensionSnapshot) {
        let marketplace_changed = snapshot.marketplace != self.snapshot.marketplace;
        self.snapshot = snapshot;
        // No listener is fine: nobody is watching yet
        let _ = self.events.send(HostEvent::StatusesChanged);
        if marketplace_changed {
            let _ = self.events.send(HostEvent::MarketplaceChanged);
        }
    }

    /// Re-read the snapshot file. In-memory hosts are left unchanged.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed; the previous
    /// snapshot stays in place
    pub fn reload(&mut self) -> Result<(), SnapshotError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let snapshot = ExtensionSnapshot::from_file(&path)?;
        info!("reloaded snapshot {}", path.display());
        self.replace(snapshot);
        Ok(())
    }
}

impl ExtensionHost for SnapshotHost {
    fn extension_descriptions(&self) -> Vec<ExtensionDescription> {
        self.snapshot.descriptions.clone()
    }

    fn current_statuses(&self) -> StatusMap {
        self.snapshot.statuses.clone()
    }

    fn marketplace_records(&self) -> Vec<MarketplaceInfo> {
        self.snapshot.marketplace.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthud_common::{ExtensionId, InstallSource};

    #[test]
    fn test_replace_announces_changes() {
        let (mut host, events) = SnapshotHost::from_snapshot(ExtensionSnapshot::default());

        host.replace(ExtensionSnapshot::default());
        assert_eq!(events.try_recv(), Ok(HostEvent::StatusesChanged));
        assert!(events.try_recv().is_err());

        host.replace(ExtensionSnapshot {
            marketplace: vec![MarketplaceInfo {
                identifier: ExtensionId::new("a.b"),
                display_name: "AB".to_string(),
                icon_url: None,
                icon_url_fallback: None,
                install_source: InstallSource::BuiltIn,
            }],
            ..ExtensionSnapshot::default()
        });
        assert_eq!(events.try_recv(), Ok(HostEvent::StatusesChanged));
        assert_eq!(events.try_recv(), Ok(HostEvent::MarketplaceChanged));
        assert_eq!(host.marketplace_records().len(), 1);
    }

    #[test]
    fn test_reload_without_file_is_noop() {
        let (mut host, events) = SnapshotHost::from_snapshot(ExtensionSnapshot::default());
        assert!(host.reload().is_ok());
        assert!(events.try_recv().is_err());
    }
}
