//! Latest-request-wins sequencing for a logical request slot.
//!
//! Each slot (product search, country search, result fetch) hands out
//! monotonically increasing tickets. Starting a new ticket supersedes every
//! earlier one: a superseded future is dropped at its next suspension point
//! and its result is never committed, so a slow early response cannot
//! overwrite a faster later one.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// A logical slot whose most recent request is the only one allowed to land.
#[derive(Clone, Debug)]
pub struct RequestSlot {
    label: &'static str,
    generation: Arc<watch::Sender<u64>>,
}

impl RequestSlot {
    pub fn new(label: &'static str) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            label,
            generation: Arc::new(generation),
        }
    }

    /// Issues a new ticket, superseding all earlier ones.
    pub fn begin(&self) -> RequestTicket {
        let mut id = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            id = *g;
        });
        RequestTicket {
            label: self.label,
            id,
            generation: Arc::clone(&self.generation),
            changes: self.generation.subscribe(),
        }
    }

    /// Supersedes every outstanding ticket without issuing a new one.
    pub fn cancel(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    /// Generation of the most recently issued (or cancelled) ticket.
    pub fn current(&self) -> u64 {
        *self.generation.borrow()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Handle for one request in a [`RequestSlot`].
#[derive(Debug)]
pub struct RequestTicket {
    label: &'static str,
    id: u64,
    generation: Arc<watch::Sender<u64>>,
    changes: watch::Receiver<u64>,
}

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True while no newer ticket has been issued for the slot.
    pub fn is_current(&self) -> bool {
        *self.generation.borrow() == self.id
    }

    /// Drives `fut` unless the ticket is superseded first.
    ///
    /// Returns `None` when a newer ticket was issued before `fut` started,
    /// while it was pending, or before its output could be committed.
    pub async fn run<F>(self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        if !self.is_current() {
            tracing::debug!("{} request #{} superseded before start", self.label, self.id);
            return None;
        }
        let RequestTicket {
            label,
            id,
            generation,
            mut changes,
        } = self;

        let superseded = async {
            loop {
                if changes.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
                if *changes.borrow_and_update() != id {
                    break;
                }
            }
        };

        tokio::select! {
            output = fut => {
                if *generation.borrow() == id {
                    Some(output)
                } else {
                    tracing::debug!("{} request #{} finished after being superseded", label, id);
                    None
                }
            }
            _ = superseded => {
                tracing::debug!("{} request #{} cancelled", label, id);
                None
            }
        }
    }
}
