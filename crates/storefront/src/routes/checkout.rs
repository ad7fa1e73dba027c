//! Checkout route handlers.
//!
//! The card form is rendered by Stripe.js in the browser; on submit the
//! script exchanges the card for a payment-method token and posts the form
//! with the token in a hidden field. The server then verifies the token with
//! Stripe, forwards the order to the webhook, clears the cart, and redirects
//! home with a flash message.
//!
//! The checkout phase is kept in the session. A second submission while one
//! is still `Submitting` is rejected with 409. A `Submitting` phase older than
//! the outbound timeouts allow belongs to a dropped request and is returned to
//! editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::time::Duration;

use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use zinga_core::{
    CheckoutError, CheckoutForm, CheckoutPhase, FieldError, OrderPayload, PaymentMethodId,
};

use super::cart::CartView;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{CheckoutState, Flash};
use crate::services::cart::{CartStore, CartStoreError};
use crate::services::orders::{DeliveryOutcome, ORDER_FAILED_MESSAGE};
use crate::state::{AppState, CheckoutServices};

/// Flash shown on the home page after a successful order.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully! Welcome to the Zinga family.";

const FIX_FIELDS_MESSAGE: &str = "Please correct the highlighted fields.";
const MISSING_CARD_MESSAGE: &str = "Please enter your card details.";
const ABANDONED_MESSAGE: &str = "The previous submission did not finish.";

/// Submitted checkout form, including the Stripe.js token.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutSubmission {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub payment_method_id: String,
}

impl CheckoutSubmission {
    fn into_parts(self) -> (CheckoutForm, Option<PaymentMethodId>) {
        let token = self.payment_method_id.trim();
        let token = (!token.is_empty()).then(|| PaymentMethodId::new(token));
        (
            CheckoutForm {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                phone: self.phone,
                address: self.address,
                city: self.city,
                zip: self.zip,
            },
            token,
        )
    }
}

/// Per-field error messages for the template.
#[derive(Clone, Default)]
pub struct FieldErrorsView {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl From<&[FieldError]> for FieldErrorsView {
    fn from(errors: &[FieldError]) -> Self {
        let mut view = Self::default();
        for error in errors {
            let slot = match error.field {
                "first_name" => &mut view.first_name,
                "last_name" => &mut view.last_name,
                "email" => &mut view.email,
                "phone" => &mut view.phone,
                "address" => &mut view.address,
                "city" => &mut view.city,
                "zip" => &mut view.zip,
                _ => continue,
            };
            *slot = Some(error.message.clone());
        }
        view
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutForm,
    pub field_errors: FieldErrorsView,
    pub error: Option<String>,
    pub submit_enabled: bool,
    /// `None` when checkout is not configured on this deployment.
    pub publishable_key: Option<String>,
    pub nonce: String,
}

impl CheckoutTemplate {
    fn new(
        store: &CartStore,
        form: CheckoutForm,
        phase: &CheckoutPhase,
        publishable_key: Option<&str>,
        nonce: String,
    ) -> Self {
        Self {
            cart: CartView::from(store.cart()),
            form,
            field_errors: FieldErrorsView::default(),
            error: phase.error_message().map(str::to_string),
            submit_enabled: phase.submit_enabled() && publishable_key.is_some(),
            publishable_key: publishable_key.map(str::to_string),
            nonce,
        }
    }
}

/// Display the checkout form. An empty cart redirects to `/cart`.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let store = CartStore::load(session).await?;
    if store.cart().is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let publishable_key = state.checkout().map(|c| c.publishable_key);
    Ok(CheckoutTemplate::new(
        &store,
        CheckoutForm::default(),
        &CheckoutPhase::Editing,
        publishable_key,
        nonce,
    )
    .into_response())
}

/// Submit an order.
///
/// Success clears the cart and redirects home with a flash message. Any
/// failure re-renders the form with every field as submitted.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(submission): Form<CheckoutSubmission>,
) -> Result<Response> {
    let services = state
        .checkout()
        .ok_or_else(|| AppError::Unavailable("Checkout is not configured".to_string()))?;

    let mut store = CartStore::load(session.clone()).await?;
    if store.cart().is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let phase = current_phase(&session, services.stale_after)
        .await?
        .submit()
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected checkout submission");
            AppError::Conflict("An order is already being processed".to_string())
        })?;
    CheckoutState::store(&session, phase.clone()).await?;
    session.save().await?;

    let (form, token) = submission.into_parts();
    let outcome = place_order(services, &mut store, &form, token).await;

    match outcome {
        Ok(()) => {
            phase.succeed().map_err(transition_error)?;
            CheckoutState::clear(&session).await?;
            Flash::set(&session, ORDER_PLACED_MESSAGE).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(failure) => {
            let failed = phase.fail(failure.message).map_err(transition_error)?;
            CheckoutState::store(&session, failed.edit().map_err(transition_error)?).await?;
            let mut page = CheckoutTemplate::new(
                &store,
                form,
                &failed,
                Some(services.publishable_key),
                nonce,
            );
            page.field_errors = FieldErrorsView::from(failure.field_errors.as_slice());
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// The session's checkout phase. A `Submitting` phase older than
/// `stale_after` is failed and returned to editing.
async fn current_phase(session: &Session, stale_after: Duration) -> Result<CheckoutPhase> {
    let Some(state) = CheckoutState::load(session).await? else {
        return Ok(CheckoutPhase::Editing);
    };

    if state.phase == CheckoutPhase::Submitting && state.is_stale(stale_after) {
        tracing::warn!(
            since = %state.updated_at,
            "Abandoned checkout submission, returning to editing"
        );
        return state
            .phase
            .fail(ABANDONED_MESSAGE)
            .and_then(|failed| failed.edit())
            .map_err(transition_error);
    }

    Ok(state.phase)
}

fn transition_error(error: CheckoutError) -> AppError {
    AppError::Internal(error.to_string())
}

/// Why an order was not placed.
struct OrderFailure {
    message: String,
    field_errors: Vec<FieldError>,
}

impl OrderFailure {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: Vec::new(),
        }
    }
}

/// Validate, verify the payment token, forward the order, clear the cart.
async fn place_order(
    services: CheckoutServices<'_>,
    store: &mut CartStore,
    form: &CheckoutForm,
    token: Option<PaymentMethodId>,
) -> std::result::Result<(), OrderFailure> {
    let (contact, shipping) = form.validate().map_err(|field_errors| OrderFailure {
        message: FIX_FIELDS_MESSAGE.to_string(),
        field_errors,
    })?;

    let token = token.ok_or_else(|| OrderFailure::message(MISSING_CARD_MESSAGE))?;

    services
        .stripe
        .retrieve_payment_method(&token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Payment method verification failed");
            OrderFailure::message(e.customer_message())
        })?;

    let payload = OrderPayload::new(contact, shipping, store.cart(), token);

    match services.orders.forward(&payload).await {
        Ok(DeliveryOutcome::Confirmed) => {
            add_breadcrumb("checkout", "Order confirmed by webhook", None);
        }
        Ok(DeliveryOutcome::Assumed) => {
            add_breadcrumb("checkout", "Order delivery assumed", None);
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Order forwarding failed");
            return Err(OrderFailure::message(ORDER_FAILED_MESSAGE));
        }
    }

    if let Err(e) = store.clear_cart().await {
        report_uncleared_cart(&e);
    }
    Ok(())
}

/// The order went through but the cart is still full; a retry would place it
/// twice.
fn report_uncleared_cart(error: &CartStoreError) {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        sentry_event_id = %event_id,
        "Failed to clear cart after order"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_current_phase_defaults_to_editing() {
        let phase = current_phase(&session(), Duration::from_secs(30)).await.unwrap();
        assert_eq!(phase, CheckoutPhase::Editing);
    }

    #[tokio::test]
    async fn test_fresh_submission_blocks_another() {
        let session = session();
        CheckoutState::store(&session, CheckoutPhase::Submitting)
            .await
            .unwrap();

        let phase = current_phase(&session, Duration::from_secs(30)).await.unwrap();
        assert_eq!(phase, CheckoutPhase::Submitting);
        assert!(phase.submit().is_err());
    }

    #[tokio::test]
    async fn test_abandoned_submission_returns_to_editing() {
        let session = session();
        CheckoutState::store(&session, CheckoutPhase::Submitting)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let phase = current_phase(&session, Duration::from_millis(5)).await.unwrap();
        assert_eq!(phase, CheckoutPhase::Editing);
        assert_eq!(phase.submit().unwrap(), CheckoutPhase::Submitting);
    }

    #[test]
    fn test_uncleared_cart_is_captured() {
        let events = sentry::test::with_captured_events(|| {
            let error = CartStoreError::Store(tower_sessions::session_store::Error::Backend(
                "store offline".to_string(),
            ));
            report_uncleared_cart(&error);
        });
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_submission_splits_token() {
        let submission = CheckoutSubmission {
            first_name: "Ada".to_string(),
            payment_method_id: "  pm_card_visa ".to_string(),
            ..CheckoutSubmission::default()
        };
        let (form, token) = submission.into_parts();
        assert_eq!(form.first_name, "Ada");
        assert_eq!(token.map(PaymentMethodId::into_inner).as_deref(), Some("pm_card_visa"));

        let (_, token) = CheckoutSubmission::default().into_parts();
        assert!(token.is_none());
    }

    #[test]
    fn test_field_errors_view() {
        let errors = vec![
            FieldError {
                field: "email",
                message: "is required".to_string(),
            },
            FieldError {
                field: "zip",
                message: "is required".to_string(),
            },
        ];
        let view = FieldErrorsView::from(errors.as_slice());
        assert_eq!(view.email.as_deref(), Some("is required"));
        assert_eq!(view.zip.as_deref(), Some("is required"));
        assert!(view.first_name.is_none());
    }
}
