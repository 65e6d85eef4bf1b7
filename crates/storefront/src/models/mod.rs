//! Domain models for storefront.

pub mod session;
pub mod user;

pub use session::{AuthSession, keys as session_keys};
pub use user::{Address, Geolocation, PersonName, UserProfile};
