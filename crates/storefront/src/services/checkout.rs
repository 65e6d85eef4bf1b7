//! Checkout orchestration.
//!
//! [`CheckoutService`] ties the pure [`CheckoutFlow`] to the visitor's cart
//! and to an [`OrderSubmitter`]. The flow is stored in the session next to
//! the cart, and every method returns a [`CheckoutSnapshot`] of both for
//! rendering.
//!
//! Placing an order saves the processing mark to the session store before
//! the submitter is called, so a second submission from the same visitor is
//! rejected while the first is in flight. The mark is always settled, even
//! when the placing request goes away.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use scoder_core::{
    CartAction, CartLine, CartState, CheckoutError, CheckoutFlow, CheckoutStep, DeliveryForm,
    DeliveryInfo, PaymentForm, PaymentInfo,
};
use thiserror::Error;
use tracing::{Instrument, instrument};
use uuid::Uuid;

use crate::models::session_keys;
use crate::services::cart::CartStore;
use crate::session::{SessionError, SessionStorage};

// =============================================================================
// Order Submission
// =============================================================================

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub delivery: DeliveryInfo,
    pub payment: PaymentInfo,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

/// Proof that an order was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub reference: Uuid,
}

/// Errors from an order submitter.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The processor refused the order.
    #[error("order declined: {0}")]
    Declined(String),

    /// The processor could not be reached.
    #[error("order service unavailable: {0}")]
    Unavailable(String),
}

impl OrderError {
    /// Message shown on the review step.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined(reason) => format!("Your order was declined: {reason}"),
            Self::Unavailable(_) => {
                "We could not place your order right now. Please try again.".to_string()
            }
        }
    }
}

/// Places orders.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` if the order is not accepted.
    async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrderError>;
}

/// Accepts every order after a fixed delay. No payment is processed.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedOrderSubmitter {
    delay: Duration,
}

impl SimulatedOrderSubmitter {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl OrderSubmitter for SimulatedOrderSubmitter {
    async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrderError> {
        tokio::time::sleep(self.delay).await;
        let reference = Uuid::new_v4();
        tracing::info!(
            %reference,
            total = %order.total,
            lines = order.lines.len(),
            "Simulated order accepted"
        );
        Ok(OrderReceipt { reference })
    }
}

// =============================================================================
// CheckoutService
// =============================================================================

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    /// The wizard refused the transition.
    #[error(transparent)]
    Flow(#[from] CheckoutError),

    /// The submitter did not accept the order. The flow is back at review.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The session store failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Checkout is not open for this visitor.
    #[error("checkout is not open")]
    NotOpen,
}

/// Cart and wizard state after an operation.
#[derive(Debug, Clone)]
pub struct CheckoutSnapshot {
    pub cart: CartState,
    pub flow: CheckoutFlow,
}

impl CheckoutSnapshot {
    /// Whether the checkout overlay is shown.
    ///
    /// The success step stays visible after the cart (and with it the
    /// checkout flag) has been cleared.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.cart.is_checkout_open() || matches!(self.flow.step(), CheckoutStep::Success)
    }
}

/// A visitor's checkout, backed by their session.
pub struct CheckoutService<S> {
    storage: S,
    cart: CartStore<S>,
}

impl<S: SessionStorage + Clone + 'static> CheckoutService<S> {
    pub fn new(storage: S) -> Self {
        Self {
            cart: CartStore::new(storage.clone()),
            storage,
        }
    }

    async fn load_flow(&self) -> Result<CheckoutFlow, SessionError> {
        let Some(value) = self.storage.read(session_keys::CHECKOUT).await? else {
            return Ok(CheckoutFlow::new());
        };

        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding undecodable checkout");
            CheckoutFlow::new()
        }))
    }

    async fn save_flow(&self, flow: &CheckoutFlow) -> Result<(), SessionError> {
        self.storage
            .write(session_keys::CHECKOUT, serde_json::to_value(flow)?)
            .await
    }

    /// Current cart and wizard state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn snapshot(&self) -> Result<CheckoutSnapshot, SessionError> {
        Ok(CheckoutSnapshot {
            cart: self.cart.load().await?,
            flow: self.load_flow().await?,
        })
    }

    /// Load state for a forward transition, requiring checkout to be open.
    async fn open_snapshot(&self) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let snapshot = self.snapshot().await?;
        if snapshot.cart.is_checkout_open() {
            Ok(snapshot)
        } else {
            Err(CheckoutServiceError::NotOpen)
        }
    }

    /// Open checkout at the delivery step, closing the cart panel.
    ///
    /// # Errors
    ///
    /// Fails when the cart is empty, an order is processing, or the session
    /// store fails.
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let snapshot = self.snapshot().await?;
        if snapshot.cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        if snapshot.flow.is_processing() {
            return Err(CheckoutError::AlreadyProcessing.into());
        }

        let cart = self.cart.dispatch(CartAction::OpenCheckout).await?;
        let flow = CheckoutFlow::new();
        self.save_flow(&flow).await?;
        Ok(CheckoutSnapshot { cart, flow })
    }

    /// Submit the delivery form.
    ///
    /// # Errors
    ///
    /// Fails with `Flow(Validation)` when the form is invalid, or when the
    /// wizard is closed or at another step.
    #[instrument(skip(self, form))]
    pub async fn submit_delivery(
        &self,
        form: &DeliveryForm,
    ) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let mut snapshot = self.open_snapshot().await?;
        snapshot.flow.submit_delivery(&form.masked())?;
        self.save_flow(&snapshot.flow).await?;
        Ok(snapshot)
    }

    /// Submit the payment form, checking expiry against `today`.
    ///
    /// # Errors
    ///
    /// Fails with `Flow(Validation)` when the form is invalid, or when the
    /// wizard is closed or at another step.
    #[instrument(skip(self, form))]
    pub async fn submit_payment(
        &self,
        form: &PaymentForm,
        today: NaiveDate,
    ) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let mut snapshot = self.open_snapshot().await?;
        snapshot.flow.submit_payment(&form.masked(), today)?;
        self.save_flow(&snapshot.flow).await?;
        Ok(snapshot)
    }

    /// Go back from review to payment.
    ///
    /// # Errors
    ///
    /// Fails outside the review step or while the order is processing.
    #[instrument(skip(self))]
    pub async fn back(&self) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let mut snapshot = self.open_snapshot().await?;
        snapshot.flow.back_to_payment()?;
        self.save_flow(&snapshot.flow).await?;
        Ok(snapshot)
    }

    /// Place the order.
    ///
    /// On success the wizard moves to the success step carrying the total
    /// captured before the cart was cleared. If the submitter fails, the
    /// wizard returns to review with the cart intact and the error is
    /// returned as `Order`.
    ///
    /// Submission and its outcome run on their own task, so the outcome is
    /// stored even if the calling request is dropped mid-delay.
    ///
    /// # Errors
    ///
    /// Fails outside the review step, on a duplicate submission, when the
    /// submitter refuses the order, or when the session store fails.
    #[instrument(skip(self, submitter))]
    pub async fn place_order(
        &self,
        submitter: Arc<dyn OrderSubmitter>,
    ) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let mut snapshot = self.open_snapshot().await?;
        let total = snapshot.flow.begin_order(&snapshot.cart)?;

        let (Some(delivery), Some(payment)) = (snapshot.flow.delivery(), snapshot.flow.payment())
        else {
            return Err(CheckoutError::InvalidTransition {
                from: snapshot.flow.step(),
                action: "place the order",
            }
            .into());
        };
        let request = OrderRequest {
            delivery: delivery.clone(),
            payment: payment.clone(),
            lines: snapshot.cart.lines().to_vec(),
            total,
        };

        self.save_flow(&snapshot.flow).await?;
        self.storage.flush().await?;
        tracing::info!(%total, "Placing order");

        let settlement = Self::new(self.storage.clone());
        let task = tokio::spawn(
            async move {
                settlement
                    .settle(submitter.as_ref(), &request, snapshot)
                    .await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Order task failed");
                let mut flow = self.load_flow().await?;
                flow.abort_order();
                self.save_flow(&flow).await?;
                self.storage.flush().await?;
                Err(OrderError::Unavailable(e.to_string()).into())
            }
        }
    }

    /// Submit the order and store the outcome.
    async fn settle(
        &self,
        submitter: &dyn OrderSubmitter,
        request: &OrderRequest,
        mut snapshot: CheckoutSnapshot,
    ) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        match submitter.submit(request).await {
            Ok(receipt) => {
                snapshot.flow.complete_order()?;
                self.save_flow(&snapshot.flow).await?;
                snapshot.cart = self.cart.dispatch(CartAction::ClearCart).await?;
                self.storage.flush().await?;
                tracing::info!(reference = %receipt.reference, total = %request.total, "Order placed");
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order submission failed");
                snapshot.flow.abort_order();
                self.save_flow(&snapshot.flow).await?;
                self.storage.flush().await?;
                Err(e.into())
            }
        }
    }

    /// Whether an order is being placed.
    ///
    /// Cart lines must not change while this holds: the placing request
    /// clears the cart it loaded when it finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn order_in_flight(&self) -> Result<bool, SessionError> {
        Ok(self.load_flow().await?.is_processing())
    }

    /// Close the checkout, discarding captured step data.
    ///
    /// Used both to cancel from steps 1 to 3 (the cart is kept) and to close
    /// the success step.
    ///
    /// # Errors
    ///
    /// Fails while an order is processing, or when the session store fails.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<CheckoutSnapshot, CheckoutServiceError> {
        let mut snapshot = self.snapshot().await?;
        if !snapshot.flow.can_cancel() {
            return Err(CheckoutError::AlreadyProcessing.into());
        }

        snapshot.flow.reset();
        self.save_flow(&snapshot.flow).await?;
        snapshot.cart = self.cart.dispatch(CartAction::CloseCheckout).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scoder_core::{Product, ProductId, Rating};

    use super::*;
    use crate::session::MemoryStorage;

    #[derive(Default)]
    struct FailingSubmitter {
        delay: Duration,
    }

    #[async_trait]
    impl OrderSubmitter for FailingSubmitter {
        async fn submit(&self, _order: &OrderRequest) -> Result<OrderReceipt, OrderError> {
            tokio::time::sleep(self.delay).await;
            Err(OrderError::Unavailable("connection refused".to_string()))
        }
    }

    /// Counts submissions and checks the processing mark was flushed first.
    struct RecordingSubmitter {
        storage: MemoryStorage,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OrderSubmitter for RecordingSubmitter {
        async fn submit(&self, order: &OrderRequest) -> Result<OrderReceipt, OrderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let flow = CheckoutService::new(self.storage.clone())
                .snapshot()
                .await
                .unwrap()
                .flow;
            assert!(flow.is_processing());
            assert_eq!(order.total, Decimal::new(2000, 2));
            Ok(OrderReceipt {
                reference: Uuid::new_v4(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn delivery_form() -> DeliveryForm {
        DeliveryForm {
            full_name: "Ana Lima".to_string(),
            email: "ana@example.com".to_string(),
            phone: "(11) 98888-7777".to_string(),
            zip_code: "04538-133".to_string(),
            address: "Avenida Brigadeiro Faria Lima, 3477".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        }
    }

    fn payment_form() -> PaymentForm {
        PaymentForm {
            payment_method: "credit".to_string(),
            card_number: "4000 1234 5678 9010".to_string(),
            card_name: "Ana Lima".to_string(),
            expiry_date: "11/29".to_string(),
            cvv: "321".to_string(),
        }
    }

    async fn seeded(storage: &MemoryStorage) -> CheckoutService<MemoryStorage> {
        let product = Product {
            id: ProductId::new(1),
            title: "Backpack".to_string(),
            price: Decimal::new(1000, 2),
            description: String::new(),
            category: "bags".to_string(),
            image: String::new(),
            rating: Rating::default(),
        };
        let cart = CartStore::new(storage.clone());
        cart.dispatch(CartAction::AddItem(product.clone())).await.unwrap();
        cart.dispatch(CartAction::AddItem(product)).await.unwrap();
        CheckoutService::new(storage.clone())
    }

    async fn at_review(service: &CheckoutService<MemoryStorage>) {
        service.open().await.unwrap();
        service.submit_delivery(&delivery_form()).await.unwrap();
        service
            .submit_payment(&payment_form(), today())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_checkout_clears_cart_and_keeps_total() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;

        let snapshot = service.open().await.unwrap();
        assert!(snapshot.cart.is_checkout_open());
        assert!(!snapshot.cart.is_cart_open());
        assert_eq!(snapshot.flow.step(), CheckoutStep::Delivery);

        service.submit_delivery(&delivery_form()).await.unwrap();
        let snapshot = service
            .submit_payment(&payment_form(), today())
            .await
            .unwrap();
        assert_eq!(snapshot.flow.step(), CheckoutStep::Review);

        let submitter = Arc::new(SimulatedOrderSubmitter::new(Duration::from_millis(10)));
        let snapshot = service.place_order(submitter).await.unwrap();

        assert_eq!(snapshot.flow.step(), CheckoutStep::Success);
        assert_eq!(snapshot.flow.order_total(), Some(Decimal::new(2000, 2)));
        assert!(snapshot.cart.is_empty());
        assert!(snapshot.is_visible());

        let closed = service.close().await.unwrap();
        assert_eq!(closed.flow.step(), CheckoutStep::Delivery);
        assert!(!closed.is_visible());
    }

    #[tokio::test]
    async fn test_simulated_submitter_waits_for_delay() {
        let submitter = Arc::new(SimulatedOrderSubmitter::new(Duration::from_millis(50)));
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let started = std::time::Instant::now();
        service.place_order(submitter).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_processing_mark_flushed_before_submit() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let submitter = Arc::new(RecordingSubmitter {
            storage: storage.clone(),
            calls: Arc::clone(&calls),
        });
        service.place_order(submitter).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected_while_processing() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let mut flow = service.snapshot().await.unwrap().flow;
        let cart = service.snapshot().await.unwrap().cart;
        flow.begin_order(&cart).unwrap();
        service.save_flow(&flow).await.unwrap();

        let submitter = Arc::new(SimulatedOrderSubmitter::new(Duration::ZERO));
        let err = service.place_order(submitter).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::Flow(CheckoutError::AlreadyProcessing)
        ));
        let err = service.close().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::Flow(CheckoutError::AlreadyProcessing)
        ));
    }

    #[tokio::test]
    async fn test_failed_submission_returns_to_review() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let err = service
            .place_order(Arc::new(FailingSubmitter::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutServiceError::Order(_)));

        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.flow.step(), CheckoutStep::Review);
        assert!(!snapshot.flow.is_processing());
        assert_eq!(snapshot.cart.total_items(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_request_still_completes_order() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let submitter = Arc::new(SimulatedOrderSubmitter::new(Duration::from_millis(100)));
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), service.place_order(submitter)).await;
        assert!(abandoned.is_err());
        assert!(service.order_in_flight().await.unwrap());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!service.order_in_flight().await.unwrap());
        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.flow.step(), CheckoutStep::Success);
        assert!(snapshot.cart.is_empty());

        let closed = service.close().await.unwrap();
        assert_eq!(closed.flow.step(), CheckoutStep::Delivery);
    }

    #[tokio::test]
    async fn test_abandoned_failing_order_can_be_cancelled() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let submitter = Arc::new(FailingSubmitter {
            delay: Duration::from_millis(100),
        });
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), service.place_order(submitter)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = service.snapshot().await.unwrap();
        assert_eq!(snapshot.flow.step(), CheckoutStep::Review);
        assert!(!snapshot.flow.is_processing());

        service.back().await.unwrap();
        let closed = service.close().await.unwrap();
        assert!(!closed.cart.is_checkout_open());
        assert_eq!(closed.cart.total_items(), 2);
    }

    #[tokio::test]
    async fn test_invalid_delivery_keeps_step() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        service.open().await.unwrap();

        let form = DeliveryForm {
            phone: "99999".to_string(),
            ..delivery_form()
        };
        let err = service.submit_delivery(&form).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::Flow(CheckoutError::Validation(ref e)) if e.has("phone")
        ));
        assert_eq!(
            service.snapshot().await.unwrap().flow.step(),
            CheckoutStep::Delivery
        );
    }

    #[tokio::test]
    async fn test_back_then_resubmit() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        at_review(&service).await;

        let snapshot = service.back().await.unwrap();
        assert_eq!(snapshot.flow.step(), CheckoutStep::Payment);
        assert!(snapshot.flow.payment().is_some());
    }

    #[tokio::test]
    async fn test_closed_checkout_rejects_forms() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;

        let err = service.submit_delivery(&delivery_form()).await.unwrap_err();
        assert!(matches!(err, CheckoutServiceError::NotOpen));
    }

    #[tokio::test]
    async fn test_open_requires_items() {
        let service = CheckoutService::new(MemoryStorage::new());
        let err = service.open().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::Flow(CheckoutError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_cancel_keeps_cart() {
        let storage = MemoryStorage::new();
        let service = seeded(&storage).await;
        service.open().await.unwrap();
        service.submit_delivery(&delivery_form()).await.unwrap();

        let snapshot = service.close().await.unwrap();
        assert!(!snapshot.cart.is_checkout_open());
        assert_eq!(snapshot.cart.total_items(), 2);
        assert_eq!(snapshot.flow.step(), CheckoutStep::Delivery);
    }
}
