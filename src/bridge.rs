//! Status channel between an effect instance and its host.
//!
//! The host transport is not part of this crate. What the effect needs from
//! it is a place to drop processing reports without blocking, so this module
//! provides a bounded queue whose depth is fixed when the context is created.
//!
//! # Architecture
//!
//! - **Audio side** owns a [`StatusSender`] inside the effect instance
//! - **Host side** owns the [`StatusReceiver`] returned by `open`
//! - A full queue drops the newest report instead of waiting for the host,
//!   counting it in a shared atomic the host reads from its own thread
//!
//! # Usage
//!
//! ```ignore
//! let (tx, rx) = create_status_channel(8);
//!
//! // Audio thread
//! tx.try_report(status);
//!
//! // Host thread
//! for status in rx.drain() { /* ... */ }
//! if rx.dropped() > 0 { /* log off the audio thread */ }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError},
};

use crate::error::{EffectError, STATUS_OK};

/// Outcome of one processing call, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    /// `STATUS_OK` or a negative error code
    pub status: i32,
    /// Samples read from the input
    pub consumed: usize,
    /// Samples written to the output
    pub produced: usize,
}

impl ProcessStatus {
    pub fn ok(samples: usize) -> Self {
        Self {
            status: STATUS_OK,
            consumed: samples,
            produced: samples,
        }
    }

    pub fn failed(err: &EffectError) -> Self {
        Self {
            status: err.status_code(),
            consumed: 0,
            produced: 0,
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Audio-side end of the status channel.
pub struct StatusSender {
    tx: SyncSender<ProcessStatus>,
    dropped: Arc<AtomicU64>,
}

/// Host-side end of the status channel.
pub struct StatusReceiver {
    rx: Receiver<ProcessStatus>,
    /// Reports lost to a full queue (written by the audio side)
    dropped: Arc<AtomicU64>,
}

/// Create a linked sender/receiver pair holding at most `depth` reports.
pub fn create_status_channel(depth: usize) -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::sync_channel(depth);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        StatusSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        StatusReceiver { rx, dropped },
    )
}

impl StatusSender {
    /// Queue a report without blocking.
    ///
    /// Returns `false` if the report was dropped because the queue is full
    /// or the host has gone away. Runs on the audio thread, so it never logs.
    pub fn try_report(&self, status: ProcessStatus) -> bool {
        match self.tx.try_send(status) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl StatusReceiver {
    /// Next pending report, if any.
    pub fn try_recv(&self) -> Option<ProcessStatus> {
        match self.rx.try_recv() {
            Ok(status) => Some(status),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All pending reports, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = ProcessStatus> + '_ {
        self.rx.try_iter()
    }

    /// Total reports dropped because the queue was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
