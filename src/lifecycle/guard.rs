use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Lifecycle submissions tracked by the in-flight guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    StartHand,
    Commit,
    Reveal,
    /// Leave-table and the leave-after-hand toggle share one slot.
    Leave,
    /// Both sit-out and sit-in.
    SitOut,
    HandleTimeout,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::StartHand => "start",
            LifecycleAction::Commit => "commit",
            LifecycleAction::Reveal => "reveal",
            LifecycleAction::Leave => "leave",
            LifecycleAction::SitOut => "sitout",
            LifecycleAction::HandleTimeout => "timeout",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one lifecycle submission in flight per controller.
#[derive(Clone, Debug, Default)]
pub struct ActiveActionGuard {
    slot: Arc<Mutex<Option<LifecycleAction>>>,
}

impl ActiveActionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `action`, or returns the action already holding it.
    pub fn try_acquire(&self, action: LifecycleAction) -> Result<ActionPermit, LifecycleAction> {
        let mut slot = self.slot.lock();
        if let Some(active) = *slot {
            return Err(active);
        }
        *slot = Some(action);
        Ok(ActionPermit {
            slot: Arc::clone(&self.slot),
            action,
        })
    }

    pub fn current(&self) -> Option<LifecycleAction> {
        *self.slot.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.current().is_some()
    }
}

/// Holds the guard until dropped, whichever way the submission ends.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct ActionPermit {
    slot: Arc<Mutex<Option<LifecycleAction>>>,
    action: LifecycleAction,
}

impl ActionPermit {
    pub fn action(&self) -> LifecycleAction {
        self.action
    }
}

impl Drop for ActionPermit {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if *slot == Some(self.action) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let guard = ActiveActionGuard::new();
        let permit = guard.try_acquire(LifecycleAction::Commit).unwrap();
        assert_eq!(guard.current(), Some(LifecycleAction::Commit));
        assert_eq!(
            guard.try_acquire(LifecycleAction::StartHand).unwrap_err(),
            LifecycleAction::Commit
        );
        drop(permit);
        assert!(!guard.is_busy());
        let _reveal = guard.try_acquire(LifecycleAction::Reveal).unwrap();
        assert_eq!(guard.current(), Some(LifecycleAction::Reveal));
    }

    #[test]
    fn clones_share_the_slot() {
        let guard = ActiveActionGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire(LifecycleAction::Leave).unwrap();
        assert!(other.is_busy());
    }

    #[test]
    fn action_labels() {
        assert_eq!(LifecycleAction::SitOut.to_string(), "sitout");
        assert_eq!(LifecycleAction::StartHand.as_str(), "start");
    }
}
