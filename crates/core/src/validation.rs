//! Form schemas for checkout and login.
//!
//! Each raw form (as posted by the browser) validates into a typed record or
//! a [`FieldErrors`] map holding the first failing rule per field. Field keys
//! match the HTML input names, so templates can look errors up directly.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::format::{mask_card_number, mask_cvv, mask_expiry, mask_phone, normalize_zip};
use crate::types::Email;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s]+$").expect("Invalid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([0-9]{2}\)\s[0-9]{4,5}-[0-9]{4}$").expect("Invalid regex"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("Invalid regex"));
static CARD_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4} [0-9]{4} [0-9]{4} [0-9]{4}$").expect("Invalid regex")
});
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("Invalid regex"));
static CVV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("Invalid regex"));

const FULL_NAME_MAX: usize = 50;
const CARD_NUMBER_LENGTH: usize = 19;
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;

// =============================================================================
// Field Errors
// =============================================================================

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message recorded wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn check(&mut self, field: &'static str, ok: bool, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn is_name(s: &str) -> bool {
    NAME_RE.is_match(s)
}

fn mask_if_present(value: &str, mask: fn(&str) -> String) -> String {
    if value.is_empty() {
        String::new()
    } else {
        mask(value)
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Delivery form as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub zip_code: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

/// Validated delivery details captured by the checkout wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    /// Always in `DDDDD-DDD` form.
    pub zip_code: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

impl DeliveryForm {
    /// Apply the phone and ZIP input masks to non-empty values.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            phone: mask_if_present(&self.phone, mask_phone),
            zip_code: mask_if_present(&self.zip_code, normalize_zip),
            ..self.clone()
        }
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any rule is violated.
    pub fn validate(&self) -> Result<DeliveryInfo, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name_len = char_len(&self.full_name);
        errors.check(
            "full_name",
            name_len >= 2,
            "Name must be at least 2 characters",
        );
        errors.check("full_name", name_len <= FULL_NAME_MAX, "Name is too long");
        errors.check(
            "full_name",
            is_name(&self.full_name),
            "Name should only contain letters and spaces",
        );

        let email = Email::parse(&self.email);
        errors.check(
            "email",
            email.is_ok(),
            "Please enter a valid email address",
        );

        errors.check(
            "phone",
            PHONE_RE.is_match(&self.phone),
            "Please enter a valid phone number (11) 99999-9999",
        );
        errors.check(
            "zip_code",
            ZIP_RE.is_match(&self.zip_code),
            "Please enter a valid ZIP code",
        );
        errors.check(
            "address",
            char_len(&self.address) >= 5,
            "Address must be at least 5 characters",
        );
        errors.check("city", char_len(&self.city) >= 2, "City name is required");
        errors.check("state", char_len(&self.state) >= 2, "State is required");

        match email {
            Ok(email) => errors.finish(|| DeliveryInfo {
                full_name: self.full_name.clone(),
                email,
                phone: self.phone.clone(),
                zip_code: normalize_zip(&self.zip_code),
                address: self.address.clone(),
                city: self.city.clone(),
                state: self.state.clone(),
            }),
            Err(_) => Err(errors),
        }
    }
}

impl From<&DeliveryInfo> for DeliveryForm {
    fn from(info: &DeliveryInfo) -> Self {
        Self {
            full_name: info.full_name.clone(),
            email: info.email.to_string(),
            phone: info.phone.clone(),
            zip_code: info.zip_code.clone(),
            address: info.address.clone(),
            city: info.city.clone(),
            state: info.state.clone(),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Card type chosen on the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Credit,
    Debit,
}

impl PaymentMethod {
    /// Form value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Credit => "Credit",
            Self::Debit => "Debit",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }
}

/// Card expiry as month and two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiry {
    pub month: u32,
    /// Two-digit year (`27` for 2027).
    pub year: u32,
}

impl CardExpiry {
    /// Parse `MM/YY`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let captures = EXPIRY_RE.captures(s)?;
        let month = captures.get(1)?.as_str().parse().ok()?;
        let year = captures.get(2)?.as_str().parse().ok()?;
        Some(Self { month, year })
    }

    /// Whether the card is still valid in the month containing `today`.
    ///
    /// A card expiring this month is accepted.
    #[must_use]
    pub fn is_valid_on(&self, today: NaiveDate) -> bool {
        let current_year = today.year().rem_euclid(100).unsigned_abs();
        let current_month = today.month();
        self.year > current_year || (self.year == current_year && self.month >= current_month)
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

/// Payment form as posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub payment_method: String,
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            payment_method: PaymentMethod::Credit.as_str().to_string(),
            card_number: String::new(),
            card_name: String::new(),
            expiry_date: String::new(),
            cvv: String::new(),
        }
    }
}

/// Validated payment details captured by the checkout wizard.
///
/// `Debug` output redacts the card number and CVV.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub card_number: String,
    pub card_name: String,
    pub expiry: CardExpiry,
    pub cvv: String,
}

impl fmt::Debug for PaymentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentInfo")
            .field("method", &self.method)
            .field("card_number", &self.masked_card_number())
            .field("card_name", &self.card_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

impl PaymentInfo {
    /// Last four digits of the card.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.card_number.len().saturating_sub(4);
        self.card_number.get(start..).unwrap_or_default()
    }

    /// Card number with all but the last four digits hidden.
    #[must_use]
    pub fn masked_card_number(&self) -> String {
        format!("**** **** **** {}", self.last_four())
    }
}

impl PaymentForm {
    /// Apply the card number, expiry and CVV input masks to non-empty values.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            card_number: mask_if_present(&self.card_number, mask_card_number),
            expiry_date: mask_if_present(&self.expiry_date, mask_expiry),
            cvv: mask_if_present(&self.cvv, mask_cvv),
            ..self.clone()
        }
    }

    /// Validate every field, judging expiry against `today`.
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any rule is violated.
    pub fn validate(&self, today: NaiveDate) -> Result<PaymentInfo, FieldErrors> {
        let mut errors = FieldErrors::new();

        let method = PaymentMethod::parse(&self.payment_method);
        errors.check(
            "payment_method",
            method.is_some(),
            "Please select a payment method",
        );

        errors.check(
            "card_number",
            CARD_NUMBER_RE.is_match(&self.card_number),
            "Please enter a valid card number",
        );
        errors.check(
            "card_number",
            self.card_number.len() == CARD_NUMBER_LENGTH,
            "Card number must be exactly 16 digits",
        );

        errors.check(
            "card_name",
            char_len(&self.card_name) >= 2,
            "Cardholder name is required",
        );
        errors.check(
            "card_name",
            is_name(&self.card_name),
            "Name should only contain letters and spaces",
        );

        let expiry = CardExpiry::parse(&self.expiry_date);
        match expiry {
            None => errors.add("expiry_date", "Please enter date in MM/YY format"),
            Some(expiry) if !expiry.is_valid_on(today) => {
                errors.add("expiry_date", "Card has expired");
            }
            Some(_) => {}
        }

        errors.check("cvv", CVV_RE.is_match(&self.cvv), "CVV must be 3-4 digits");

        match (method, expiry) {
            (Some(method), Some(expiry)) => errors.finish(|| PaymentInfo {
                method,
                card_number: self.card_number.clone(),
                card_name: self.card_name.clone(),
                expiry,
                cvv: self.cvv.clone(),
            }),
            _ => Err(errors),
        }
    }
}

impl From<&PaymentInfo> for PaymentForm {
    fn from(info: &PaymentInfo) -> Self {
        Self {
            payment_method: info.method.as_str().to_string(),
            card_number: info.card_number.clone(),
            card_name: info.card_name.clone(),
            expiry_date: info.expiry.to_string(),
            cvv: info.cvv.clone(),
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login form as posted.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Credentials that passed the login schema.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginInfo {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInfo")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginForm {
    /// Validate username and password lengths.
    ///
    /// # Errors
    ///
    /// Returns the failing fields when any rule is violated.
    pub fn validate(&self) -> Result<LoginInfo, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username_len = char_len(&self.username);

        errors.check(
            "username",
            username_len >= USERNAME_MIN,
            "Username must be at least 3 characters",
        );
        errors.check(
            "username",
            username_len <= USERNAME_MAX,
            "Username is too long",
        );
        errors.check(
            "password",
            char_len(&self.password) >= PASSWORD_MIN,
            "Password must be at least 6 characters",
        );

        errors.finish(|| LoginInfo {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}
