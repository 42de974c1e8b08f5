//! Process-wide registry of live avatar instances.
//!
//! The registry holds no render state. Each entry is the mailbox of a live
//! instance; a memory-pressure watchdog asks for a forced cleanup by posting
//! [`LifecycleCommand::ForceCleanup`] into that mailbox, and the instance runs
//! its own full disposal path the next time it drains its mailbox. The
//! registry never reaches into instance internals.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::InstanceId;

/// Commands an instance receives through its registry mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Stop rendering and release every resource now.
    ForceCleanup,
}

struct Entry {
    seq: u64,
    registered_at: Instant,
    mailbox: Sender<LifecycleCommand>,
}

/// Shared handle to the live-instance table. Cloning shares the table.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    entries: Arc<Mutex<HashMap<InstanceId, Entry>>>,
    next_seq: Arc<AtomicU64>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<InstanceId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a live instance and the mailbox it drains.
    pub fn register(&self, id: InstanceId, mailbox: Sender<LifecycleCommand>) {
        let mut entries = self.entries();
        if entries.contains_key(&id) {
            warn!("Avatar {} registered twice, replacing entry", id);
        }
        entries.insert(
            id.clone(),
            Entry {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                registered_at: Instant::now(),
                mailbox,
            },
        );
        debug!("Avatar {} registered ({} live)", id, entries.len());
    }

    /// Forget an instance. Returns `false` if it was not registered.
    pub fn unregister(&self, id: &InstanceId) -> bool {
        let mut entries = self.entries();
        let removed = entries.remove(id).is_some();
        if removed {
            debug!("Avatar {} unregistered ({} live)", id, entries.len());
        }
        removed
    }

    /// Ask an instance to run its full disposal path out-of-band.
    ///
    /// Returns `true` if the command reached a live mailbox. An entry whose
    /// instance vanished without unregistering is dropped.
    pub fn force_cleanup(&self, id: &InstanceId) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.get(id) else {
            debug!("Force cleanup requested for unknown avatar {}", id);
            return false;
        };

        if entry.mailbox.send(LifecycleCommand::ForceCleanup).is_ok() {
            info!("Force cleanup requested for avatar {}", id);
            true
        } else {
            warn!("Avatar {} is gone but was still registered, dropping entry", id);
            entries.remove(id);
            false
        }
    }

    /// Force-clean every registered instance. Returns how many were reached.
    pub fn force_cleanup_all(&self) -> usize {
        let ids = self.live_ids();
        ids.iter().filter(|id| self.force_cleanup(id)).count()
    }

    /// Number of registered instances.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    /// Identifiers of registered instances, oldest first.
    pub fn live_ids(&self) -> Vec<InstanceId> {
        let entries = self.entries();
        let mut ids: Vec<_> = entries
            .iter()
            .map(|(id, entry)| (entry.seq, id.clone()))
            .collect();
        ids.sort_by_key(|(seq, _)| *seq);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// How long an instance has been registered.
    pub fn age(&self, id: &InstanceId) -> Option<Duration> {
        self.entries().get(id).map(|entry| entry.registered_at.elapsed())
    }

    /// Log every live instance with its age, for leak monitoring.
    pub fn log_live_instances(&self) {
        let entries = self.entries();
        info!("{} live avatar instance(s)", entries.len());
        for (id, entry) in entries.iter() {
            info!("  {} alive for {:.1?}", id, entry.registered_at.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_register_and_unregister() {
        let registry = ResourceRegistry::new();
        let id = InstanceId::new();
        let (tx, _rx) = unbounded();

        registry.register(id.clone(), tx);
        assert_eq!(registry.live_count(), 1);
        assert!(registry.age(&id).is_some());

        assert!(registry.unregister(&id));
        assert!(!registry.unregister(&id));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_force_cleanup_posts_command() {
        let registry = ResourceRegistry::new();
        let id = InstanceId::new();
        let (tx, rx) = unbounded();
        registry.register(id.clone(), tx);

        assert!(registry.force_cleanup(&id));
        assert_eq!(rx.try_recv(), Ok(LifecycleCommand::ForceCleanup));
        // The instance unregisters itself once it has cleaned up.
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_force_cleanup_drops_dead_entry() {
        let registry = ResourceRegistry::new();
        let id = InstanceId::new();
        let (tx, rx) = unbounded();
        registry.register(id.clone(), tx);
        drop(rx);

        assert!(!registry.force_cleanup(&id));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_force_cleanup_unknown() {
        let registry = ResourceRegistry::new();
        assert!(!registry.force_cleanup(&InstanceId::new()));
    }

    #[test]
    fn test_force_cleanup_all_and_ordering() {
        let registry = ResourceRegistry::new();
        let first = InstanceId::new();
        let second = InstanceId::new();
        let (tx1, rx1) = unbounded();
        let (tx2, rx2) = unbounded();
        registry.register(first.clone(), tx1);
        registry.register(second.clone(), tx2);

        assert_eq!(registry.live_ids(), vec![first, second]);
        assert_eq!(registry.force_cleanup_all(), 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_clones_share_table() {
        let registry = ResourceRegistry::new();
        let other = registry.clone();
        let (tx, _rx) = unbounded();
        registry.register(InstanceId::new(), tx);
        assert_eq!(other.live_count(), 1);
    }
}
