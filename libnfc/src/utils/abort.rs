//! Cross-thread cancellation of blocking transport calls.
//!
//! A transport hands out clones of its [`AbortHandle`]; any thread may call
//! [`AbortHandle::abort`] while the owning thread is blocked in a
//! transceive, and the blocked call returns [`Error::Aborted`] within
//! [`ABORT_POLL_INTERVAL`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::utils::timeout::{ABORT_POLL_INTERVAL, Timeout};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the pending (or next) blocking call.
    pub fn abort(&self) {
        log::debug!("abort requested");
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Consume a pending abort request, returning `Err(Aborted)` if one was set.
    pub fn check(&self) -> Result<()> {
        if self.flag.swap(false, Ordering::SeqCst) {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Poll `ready` until it yields a value, the timeout expires
    /// (`Err(Timeout)`) or the handle is aborted (`Err(Aborted)`).
    pub fn block_until<T>(
        &self,
        timeout: Timeout,
        mut ready: impl FnMut() -> Option<T>,
    ) -> Result<T> {
        let deadline = timeout.deadline();
        loop {
            self.check()?;
            if let Some(v) = ready() {
                return Ok(v);
            }
            if deadline.expired() {
                return Err(Error::Timeout);
            }
            thread::sleep(deadline.next_wait(ABORT_POLL_INTERVAL));
        }
    }

    /// Sleep for `timeout`, waking early with `Err(Aborted)` on cancellation.
    pub fn sleep(&self, timeout: Timeout) -> Result<()> {
        match self.block_until::<()>(timeout, || None) {
            Err(Error::Timeout) => Ok(()),
            other => other,
        }
    }
}
