//! Pending-work flags shared between button callbacks and the main loop.
//!
//! Callbacks only ever raise flags; the loop reads and clears them under the
//! same lock, so a press that lands while the loop is clearing is never lost.

use parking_lot::Mutex;

use crate::navigator::PostStep;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub account_change: bool,
    pub post_change: bool,
    pub first_post: bool,
}

#[derive(Debug, Default)]
pub struct TriggerFlags {
    pending: Mutex<Pending>,
}

impl TriggerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags as they are at startup: the first tick selects account 0, post 0.
    pub fn armed() -> Self {
        let flags = Self::new();
        flags.request_account_change();
        flags
    }

    /// Account switch, which always re-displays the first post.
    pub fn request_account_change(&self) {
        let mut pending = self.pending.lock();
        pending.account_change = true;
        pending.post_change = true;
        pending.first_post = true;
    }

    pub fn request_post_change(&self) {
        self.pending.lock().post_change = true;
    }

    /// Raised by the loop after it switched accounts.
    pub fn raise_first_post(&self) {
        let mut pending = self.pending.lock();
        pending.post_change = true;
        pending.first_post = true;
    }

    pub fn take_account_change(&self) -> bool {
        std::mem::take(&mut self.pending.lock().account_change)
    }

    /// Clears a pending post change and reports which step it asks for.
    /// `first_post` is only consumed together with a post change.
    pub fn take_post_change(&self) -> Option<PostStep> {
        let mut pending = self.pending.lock();
        if !std::mem::take(&mut pending.post_change) {
            return None;
        }
        if std::mem::take(&mut pending.first_post) {
            Some(PostStep::First)
        } else {
            Some(PostStep::Next)
        }
    }

    pub fn snapshot(&self) -> Pending {
        *self.pending.lock()
    }
}
