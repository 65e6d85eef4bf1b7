//! The checkout wizard.
//!
//! [`CheckoutFlow`] is a linear state machine over four stages:
//!
//! ```text
//! Delivery -> Payment -> Review -> Success
//!                ^---------'
//! ```
//!
//! Forward moves require the stage's form to validate. Placing an order is
//! split in two: [`CheckoutFlow::begin_order`] marks the review as processing
//! and captures the cart total, then [`CheckoutFlow::complete_order`] or
//! [`CheckoutFlow::abort_order`] settles it once the submission returns.
//! A failed call leaves the flow exactly as it was.

use core::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartState;
use crate::validation::{DeliveryForm, DeliveryInfo, FieldErrors, PaymentForm, PaymentInfo};

/// Wizard step, numbered from 1 for the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Delivery = 1,
    Payment = 2,
    Review = 3,
    Success = 4,
}

impl CheckoutStep {
    /// Steps shown in the progress indicator.
    pub const PROGRESS: [Self; 3] = [Self::Delivery, Self::Payment, Self::Review];

    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delivery => "Delivery",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Success => "Complete",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from checkout transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The submitted form failed validation.
    #[error("form has invalid fields: {0}")]
    Validation(#[from] FieldErrors),

    /// The action is not available at the current step.
    #[error("cannot {action} at the {from} step")]
    InvalidTransition {
        from: CheckoutStep,
        action: &'static str,
    },

    /// An order is already being placed.
    #[error("order is already being processed")]
    AlreadyProcessing,

    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,
}

/// Where the wizard is, together with the data captured so far.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CheckoutStage {
    #[default]
    Delivery,
    Payment {
        delivery: DeliveryInfo,
        /// Payment details kept from an earlier visit to review.
        previous: Option<PaymentInfo>,
    },
    Review {
        delivery: DeliveryInfo,
        payment: PaymentInfo,
        /// Total captured when the order was placed; set while processing.
        placing: Option<Decimal>,
    },
    Success {
        total: Decimal,
    },
}

impl CheckoutStage {
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self {
            Self::Delivery => CheckoutStep::Delivery,
            Self::Payment { .. } => CheckoutStep::Payment,
            Self::Review { .. } => CheckoutStep::Review,
            Self::Success { .. } => CheckoutStep::Success,
        }
    }
}

/// A visitor's checkout wizard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckoutFlow {
    stage: CheckoutStage,
}

impl CheckoutFlow {
    /// A fresh wizard at the delivery step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn stage(&self) -> &CheckoutStage {
        &self.stage
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.stage.step()
    }

    /// Captured delivery details, from the payment step onward.
    #[must_use]
    pub const fn delivery(&self) -> Option<&DeliveryInfo> {
        match &self.stage {
            CheckoutStage::Payment { delivery, .. } | CheckoutStage::Review { delivery, .. } => {
                Some(delivery)
            }
            CheckoutStage::Delivery | CheckoutStage::Success { .. } => None,
        }
    }

    /// Captured payment details: the validated ones at review, or the ones
    /// kept after going back to the payment step.
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentInfo> {
        match &self.stage {
            CheckoutStage::Review { payment, .. } => Some(payment),
            CheckoutStage::Payment { previous, .. } => previous.as_ref(),
            CheckoutStage::Delivery | CheckoutStage::Success { .. } => None,
        }
    }

    /// Whether an order is being placed.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(
            self.stage,
            CheckoutStage::Review {
                placing: Some(_),
                ..
            }
        )
    }

    /// Whether the wizard may be closed without completing.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        !self.is_processing()
    }

    /// The confirmed order total, once the order succeeded.
    #[must_use]
    pub const fn order_total(&self) -> Option<Decimal> {
        match self.stage {
            CheckoutStage::Success { total } => Some(total),
            _ => None,
        }
    }

    /// Delivery to payment.
    ///
    /// # Errors
    ///
    /// Fails if the wizard is not at the delivery step or the form is invalid.
    pub fn submit_delivery(&mut self, form: &DeliveryForm) -> Result<(), CheckoutError> {
        if self.step() != CheckoutStep::Delivery {
            return Err(self.invalid("submit delivery details"));
        }
        let delivery = form.validate()?;
        self.stage = CheckoutStage::Payment {
            delivery,
            previous: None,
        };
        Ok(())
    }

    /// Payment to review. Card expiry is judged against `today`.
    ///
    /// # Errors
    ///
    /// Fails if the wizard is not at the payment step or the form is invalid.
    pub fn submit_payment(
        &mut self,
        form: &PaymentForm,
        today: NaiveDate,
    ) -> Result<(), CheckoutError> {
        let CheckoutStage::Payment { delivery, .. } = &self.stage else {
            return Err(self.invalid("submit payment details"));
        };
        let payment = form.validate(today)?;
        self.stage = CheckoutStage::Review {
            delivery: delivery.clone(),
            payment,
            placing: None,
        };
        Ok(())
    }

    /// Review back to payment, keeping the payment details.
    ///
    /// # Errors
    ///
    /// Fails outside the review step or while the order is processing.
    pub fn back_to_payment(&mut self) -> Result<(), CheckoutError> {
        match &self.stage {
            CheckoutStage::Review {
                placing: Some(_), ..
            } => Err(CheckoutError::AlreadyProcessing),
            CheckoutStage::Review {
                delivery, payment, ..
            } => {
                self.stage = CheckoutStage::Payment {
                    delivery: delivery.clone(),
                    previous: Some(payment.clone()),
                };
                Ok(())
            }
            _ => Err(self.invalid("go back to payment")),
        }
    }

    /// Mark the order as processing and capture the cart total.
    ///
    /// Returns the captured total.
    ///
    /// # Errors
    ///
    /// Fails outside the review step, when an order is already processing,
    /// or when the cart is empty.
    pub fn begin_order(&mut self, cart: &CartState) -> Result<Decimal, CheckoutError> {
        let CheckoutStage::Review { placing, .. } = &mut self.stage else {
            return Err(self.invalid("place the order"));
        };
        if placing.is_some() {
            return Err(CheckoutError::AlreadyProcessing);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let total = cart.total_price();
        *placing = Some(total);
        Ok(total)
    }

    /// Move a processing order to success, carrying the captured total.
    ///
    /// # Errors
    ///
    /// Fails unless an order is processing.
    pub fn complete_order(&mut self) -> Result<Decimal, CheckoutError> {
        match self.stage {
            CheckoutStage::Review {
                placing: Some(total),
                ..
            } => {
                self.stage = CheckoutStage::Success { total };
                Ok(total)
            }
            _ => Err(self.invalid("complete the order")),
        }
    }

    /// Clear the processing mark after a failed submission, staying at review.
    pub fn abort_order(&mut self) {
        if let CheckoutStage::Review { placing, .. } = &mut self.stage {
            *placing = None;
        }
    }

    /// Discard all captured data and return to the delivery step.
    pub fn reset(&mut self) {
        self.stage = CheckoutStage::Delivery;
    }

    const fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            from: self.step(),
            action,
        }
    }
}
