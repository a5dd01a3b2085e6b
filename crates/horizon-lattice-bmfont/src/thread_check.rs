//! Owner-thread tracking for graphics resources.
//!
//! GPU buffers may only be created, uploaded and released on the thread that
//! owns the rendering context. Text blocks, on the other hand, can be dropped
//! anywhere. [`ThreadAffinity`] records the owner thread so the code paths
//! that actually touch the backend can verify where they run.
//!
//! ```
//! use horizon_lattice_bmfont::thread_check::ThreadAffinity;
//!
//! let affinity = ThreadAffinity::current();
//! assert!(affinity.is_same_thread());
//!
//! let handle = std::thread::spawn(move || affinity.is_same_thread());
//! assert!(!handle.join().unwrap());
//! ```

use std::thread::ThreadId;

/// Records the thread a resource owner was created on.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The thread this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Check if the calling thread is the owner thread.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panics if called from a thread other than the owner.
    ///
    /// Active in both debug and release builds.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only variant of [`assert_same_thread_with_msg`](Self::assert_same_thread_with_msg).
    #[inline]
    pub fn debug_assert_same_thread_with_msg(&self, msg: &str) {
        #[cfg(debug_assertions)]
        self.assert_same_thread_with_msg(msg);
        #[cfg(not(debug_assertions))]
        let _ = msg;
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            GRAPHICS THREAD VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {msg}\n\
            \n\
            Owner thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            GPU resources must only be touched from the thread that owns the\n\
            rendering context. Other threads should hand buffer handles to a\n\
            ResourceReclaimer and let the owner drain it.\n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_matches_creating_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        assert_eq!(affinity.thread_id(), std::thread::current().id());
        affinity.assert_same_thread_with_msg("should not panic");
    }

    #[test]
    fn affinity_differs_on_other_thread() {
        let affinity = ThreadAffinity::current();
        let same = std::thread::spawn(move || affinity.is_same_thread())
            .join()
            .unwrap();
        assert!(!same);
    }

    #[test]
    fn wrong_thread_assert_panics() {
        let affinity = ThreadAffinity::current();
        let result = std::thread::spawn(move || {
            affinity.assert_same_thread_with_msg("released off-thread");
        })
        .join();
        assert!(result.is_err());
    }
}
