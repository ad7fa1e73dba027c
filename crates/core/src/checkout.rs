//! Checkout state machine and form validation.
//!
//! ```text
//! Editing ──submit──▶ Submitting ──succeed──▶ Succeeded
//!    ▲                    │
//!    └──── edit ◀── Failed(message)
//! ```
//!
//! The form fields live outside the phase so a failure never loses what the
//! customer typed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ContactDetails, Email, ShippingAddress};

/// Current phase of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckoutPhase {
    #[default]
    Editing,
    Submitting,
    Succeeded,
    Failed(String),
}

/// An illegal phase transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while {phase}")]
pub struct CheckoutError {
    action: &'static str,
    phase: &'static str,
}

impl CheckoutPhase {
    const fn name(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    fn reject(&self, action: &'static str) -> CheckoutError {
        CheckoutError {
            action,
            phase: self.name(),
        }
    }

    /// Start submitting. Allowed from `Editing` and `Failed`.
    ///
    /// # Errors
    ///
    /// Returns an error when a submission is already in flight or has
    /// already succeeded.
    pub fn submit(&self) -> Result<Self, CheckoutError> {
        match self {
            Self::Editing | Self::Failed(_) => Ok(Self::Submitting),
            _ => Err(self.reject("submit")),
        }
    }

    /// Finish a submission successfully.
    ///
    /// # Errors
    ///
    /// Returns an error unless currently `Submitting`.
    pub fn succeed(&self) -> Result<Self, CheckoutError> {
        match self {
            Self::Submitting => Ok(Self::Succeeded),
            _ => Err(self.reject("succeed")),
        }
    }

    /// Finish a submission with a customer-facing error message.
    ///
    /// # Errors
    ///
    /// Returns an error unless currently `Submitting`.
    pub fn fail(&self, message: impl Into<String>) -> Result<Self, CheckoutError> {
        match self {
            Self::Submitting => Ok(Self::Failed(message.into())),
            _ => Err(self.reject("fail")),
        }
    }

    /// Return to editing after a failure, keeping the form as it was.
    ///
    /// # Errors
    ///
    /// Returns an error unless currently `Failed` or already `Editing`.
    pub fn edit(&self) -> Result<Self, CheckoutError> {
        match self {
            Self::Editing | Self::Failed(_) => Ok(Self::Editing),
            _ => Err(self.reject("edit")),
        }
    }

    /// Whether the submit control should be enabled.
    #[must_use]
    pub const fn submit_enabled(&self) -> bool {
        matches!(self, Self::Editing | Self::Failed(_))
    }

    /// The error message to show inline, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// A single invalid checkout field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Raw checkout form fields, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
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
}

impl CheckoutForm {
    /// Validate every field, collecting all errors.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per invalid field, in form order.
    pub fn validate(&self) -> Result<(ContactDetails, ShippingAddress), Vec<FieldError>> {
        let mut errors = Vec::new();

        let first_name = required("first_name", &self.first_name, &mut errors);
        let last_name = required("last_name", &self.last_name, &mut errors);
        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.push(FieldError {
                    field: "email",
                    message: e.to_string(),
                });
                None
            }
        };
        let phone = required("phone", &self.phone, &mut errors);
        let address = required("address", &self.address, &mut errors);
        let city = required("city", &self.city, &mut errors);
        let zip = required("zip", &self.zip, &mut errors);

        match (email, errors.is_empty()) {
            (Some(email), true) => Ok((
                ContactDetails {
                    first_name,
                    last_name,
                    email,
                    phone,
                },
                ShippingAddress { address, city, zip },
            )),
            _ => Err(errors),
        }
    }
}

fn required(field: &'static str, value: &str, errors: &mut Vec<FieldError>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError {
            field,
            message: "is required".to_string(),
        });
    }
    value.to_string()
}
