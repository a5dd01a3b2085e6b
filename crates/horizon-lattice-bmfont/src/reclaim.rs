//! Deferred release of GPU buffers.
//!
//! A [`RenderableText`](crate::RenderableText) dropped without
//! [`dispose`](crate::RenderableText::dispose) may be dropped on any thread,
//! but its vertex buffer can only be released on the owner thread. Drop
//! pushes the handle here instead, and the owner thread releases everything
//! pending on its next [`drain`](ResourceReclaimer::drain).
//!
//! Every handle is queued together with the [`BackendId`] that created it. A
//! drain only releases the handles of the backend it is given; the rest stay
//! queued until their own backend drains.
//!
//! Handles that are never drained leak; nothing crashes.

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::{BackendId, BufferHandle, RenderBackend};
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// Thread-safe queue of buffer handles waiting to be released.
#[derive(Debug)]
pub struct ResourceReclaimer {
    owner: ThreadAffinity,
    pending: Mutex<Vec<(BackendId, BufferHandle)>>,
}

impl Default for ResourceReclaimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceReclaimer {
    /// Create a reclaimer owned by the calling thread.
    pub fn new() -> Self {
        Self::with_owner(ThreadAffinity::current())
    }

    /// Create a reclaimer owned by an explicit thread.
    pub fn with_owner(owner: ThreadAffinity) -> Self {
        Self {
            owner,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The thread allowed to drain this queue.
    pub fn owner(&self) -> ThreadAffinity {
        self.owner
    }

    /// Queue a buffer created by `backend` for release. Callable from any thread.
    pub fn defer_release(&self, backend: BackendId, buffer: BufferHandle) {
        self.pending.lock().push((backend, buffer));
    }

    /// Number of handles waiting to be released, across all backends.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of handles waiting for `backend`.
    pub fn pending_for(&self, backend: BackendId) -> usize {
        self.pending
            .lock()
            .iter()
            .filter(|(owner, _)| *owner == backend)
            .count()
    }

    /// Release the queued buffers that belong to `backend`, returning how many were released.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owner.
    pub fn drain(&self, backend: &mut dyn RenderBackend) -> usize {
        self.owner
            .assert_same_thread_with_msg("ResourceReclaimer::drain() called off the owner thread");

        let id = backend.id();
        // Release outside the lock so other threads can keep queueing.
        let buffers: Vec<BufferHandle> = {
            let mut pending = self.pending.lock();
            let (mine, others): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|(owner, _)| *owner == id);
            *pending = others;
            mine.into_iter().map(|(_, buffer)| buffer).collect()
        };
        if buffers.is_empty() {
            return 0;
        }

        let count = buffers.len();
        for buffer in buffers {
            backend.release_buffer(buffer);
        }
        debug!(
            target: targets::RECLAIM,
            count,
            remaining = self.pending(),
            "released deferred buffers"
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::HeadlessBackend;

    #[test]
    fn drain_releases_handles_queued_from_other_threads() {
        let reclaimer = Arc::new(ResourceReclaimer::new());
        let mut backend = HeadlessBackend::new();
        let a = backend.create_buffer();
        let b = backend.create_buffer();

        let id = backend.id();
        let remote = Arc::clone(&reclaimer);
        std::thread::spawn(move || {
            remote.defer_release(id, a);
            remote.defer_release(id, b);
        })
        .join()
        .unwrap();

        assert_eq!(reclaimer.pending(), 2);
        assert_eq!(reclaimer.drain(&mut backend), 2);
        assert_eq!(reclaimer.pending(), 0);
        assert_eq!(backend.stats().buffers_released, 2);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn drain_only_releases_its_own_backends_handles() {
        let reclaimer = ResourceReclaimer::new();
        let mut first = HeadlessBackend::new();
        let mut second = HeadlessBackend::new();
        let dropped = first.create_buffer();
        let live = second.create_buffer();
        // Keys from separate slot maps compare equal.
        assert_eq!(dropped, live);

        reclaimer.defer_release(first.id(), dropped);
        assert_eq!(reclaimer.drain(&mut second), 0);
        assert_eq!(second.live_buffers(), 1);
        assert_eq!(reclaimer.pending_for(first.id()), 1);
        assert_eq!(reclaimer.pending_for(second.id()), 0);

        assert_eq!(reclaimer.drain(&mut first), 1);
        assert_eq!(first.live_buffers(), 0);
        assert_eq!(reclaimer.pending(), 0);
    }

    #[test]
    fn drain_of_empty_queue_is_noop() {
        let reclaimer = ResourceReclaimer::new();
        let mut backend = HeadlessBackend::new();
        assert_eq!(reclaimer.drain(&mut backend), 0);
        assert_eq!(backend.stats().buffers_released, 0);
    }

    #[test]
    #[should_panic(expected = "GRAPHICS THREAD VIOLATION")]
    fn drain_off_owner_thread_panics() {
        let reclaimer = Arc::new(ResourceReclaimer::new());
        let remote = Arc::clone(&reclaimer);
        let result = std::thread::spawn(move || {
            let mut backend = HeadlessBackend::new();
            remote.drain(&mut backend);
        })
        .join();
        if let Err(payload) = result {
            std::panic::resume_unwind(payload);
        }
    }
}
