/*!
 * Child Set
 * Ordered tracker of live, unreaped workers
 */

use crate::core::types::Pid;

/// Workers forked by this process image that have not been reaped yet
///
/// Insertion order is preserved. The set is only touched from the main
/// control flow; the signal handler communicates through atomic counters
/// and never mutates it, so no interleaving can observe a half-applied
/// update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildSet {
    pids: Vec<Pid>,
}

impl ChildSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly forked worker
    ///
    /// Returns false if the pid was already tracked.
    pub fn insert(&mut self, pid: Pid) -> bool {
        if self.contains(pid) {
            return false;
        }
        self.pids.push(pid);
        true
    }

    /// Stop tracking a worker
    ///
    /// Returns false if the pid was not tracked, so a pid can only ever be
    /// removed once.
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.pids.iter().position(|&p| p == pid) {
            Some(index) => {
                self.pids.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Tracked pids, oldest first
    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.pids.iter().copied()
    }

    /// Drop every tracked pid, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.pids.len();
        self.pids.clear();
        count
    }
}
