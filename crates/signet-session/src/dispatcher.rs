//! Result delivery for asynchronous sign-ins.
//!
//! A sign-in starts on the caller's task and finishes on whichever task
//! feeds the provider's answer back in. The dispatcher bridges the two with
//! one `oneshot` channel per [`SignInHandle`]:
//!
//! ```text
//! begin_sign_in ──register(H)──→ [H → Sender]      caller awaits SignInTicket
//!                                     │
//! complete_sign_in ──deliver(H)───────┘──→ AuthResult arrives at the ticket
//! ```
//!
//! Taking the sender out of the map on delivery is what makes delivery
//! at-most-once: a second `deliver` for the same handle finds nothing.
//! Dropping a sender without sending (dispatcher dropped, manager gone)
//! resolves the ticket to `Cancelled`, so a ticket never hangs silently.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{AuthResult, SignInHandle};

/// The caller's end of one sign-in: a future that resolves to exactly one
/// [`AuthResult`].
///
/// ```rust,ignore
/// let ticket = manager.begin_sign_in().await?;
/// let handle = ticket.handle();          // give this to the provider glue
/// let result = ticket.await;             // Success, or a classified Failure
/// ```
#[derive(Debug)]
#[must_use = "a ticket is the only way to observe the sign-in outcome"]
pub struct SignInTicket {
    handle: SignInHandle,
    rx: oneshot::Receiver<AuthResult>,
}

impl SignInTicket {
    /// The correlation handle of this sign-in.
    pub fn handle(&self) -> SignInHandle {
        self.handle
    }
}

impl Future for SignInTicket {
    type Output = AuthResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<AuthResult> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                AuthResult::cancelled("sign-in was abandoned before it completed")
            })
        })
    }
}

/// Routes each sign-in's result to the ticket that started it.
///
/// Not thread-safe by itself: the [`SessionManager`](crate::SessionManager)
/// owns it behind the same lock as the session state, so registering,
/// delivering, and the state change they accompany happen atomically.
#[derive(Debug, Default)]
pub struct ResultDispatcher {
    waiters: HashMap<SignInHandle, oneshot::Sender<AuthResult>>,
}

impl ResultDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` and returns the ticket its result will reach.
    ///
    /// Handles are unique per manager; registering one twice replaces the
    /// first waiter, whose ticket then resolves to `Cancelled`.
    pub fn register(&mut self, handle: SignInHandle) -> SignInTicket {
        let (tx, rx) = oneshot::channel();
        if self.waiters.insert(handle, tx).is_some() {
            tracing::warn!(%handle, "handle registered twice, first waiter dropped");
        }
        SignInTicket { handle, rx }
    }

    /// Delivers `result` to the ticket registered for `handle`.
    ///
    /// Returns `false` if nothing is registered for `handle` (never issued,
    /// already delivered, or cancelled). The result is dropped in that case.
    pub fn deliver(&mut self, handle: SignInHandle, result: AuthResult) -> bool {
        let Some(tx) = self.waiters.remove(&handle) else {
            tracing::debug!(%handle, "no waiter for handle, result dropped");
            return false;
        };
        if tx.send(result).is_err() {
            // The caller dropped its ticket. The operation still counts as
            // delivered: it must not be delivered again.
            tracing::debug!(%handle, "ticket dropped before delivery");
        }
        true
    }

    /// Resolves the ticket for `handle` with `Cancelled`.
    ///
    /// Returns `false` if nothing is registered for `handle`.
    pub fn cancel(&mut self, handle: SignInHandle, reason: &str) -> bool {
        self.deliver(handle, AuthResult::cancelled(reason))
    }
}
