//! Session-related types.
//!
//! The session holds the cart, a one-shot flash message, and the current
//! checkout phase. Nothing else about the visitor is stored.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use zinga_core::CheckoutPhase;

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
}

impl Flash {
    /// Queue a flash message for the next page view.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn set(
        session: &Session,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        session
            .insert(
                keys::FLASH,
                Self {
                    message: message.into(),
                },
            )
            .await
    }

    /// Take the queued flash message, if any. It will not be shown again.
    ///
    /// Session errors are logged and treated as "no message".
    pub async fn take(session: &Session) -> Option<Self> {
        match session.remove::<Self>(keys::FLASH).await {
            Ok(flash) => flash,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read flash message");
                None
            }
        }
    }
}

/// Checkout phase stored between requests, stamped when it was written.
///
/// A `Submitting` phase outlives its request when the client disconnects
/// mid-submission and the handler is dropped. The stamp lets the next
/// submission tell that apart from one still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    pub phase: CheckoutPhase,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutState {
    /// Stamp `phase` with the current time.
    #[must_use]
    pub fn new(phase: CheckoutPhase) -> Self {
        Self {
            phase,
            updated_at: Utc::now(),
        }
    }

    /// Whether more than `after` has passed since this state was written.
    #[must_use]
    pub fn is_stale(&self, after: Duration) -> bool {
        TimeDelta::from_std(after)
            .is_ok_and(|after| Utc::now().signed_duration_since(self.updated_at) > after)
    }

    /// Load the stored state, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.get(keys::CHECKOUT).await
    }

    /// Store `phase`, stamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn store(
        session: &Session,
        phase: CheckoutPhase,
    ) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::CHECKOUT, Self::new(phase)).await
    }

    /// Forget the checkout so the next one starts from editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.remove::<Self>(keys::CHECKOUT).await.map(|_| ())
    }
}

/// Session keys.
pub mod keys {
    /// Key for the serialized cart.
    pub const CART: &str = "cart";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";

    /// Key for the stamped [`super::CheckoutState`].
    pub const CHECKOUT: &str = "checkout";
}
