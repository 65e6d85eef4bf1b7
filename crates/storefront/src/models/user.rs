//! User profile types.
//!
//! Field names follow the catalog service's user JSON so a stored profile
//! reads the same as one fetched from `/users/{id}`.

use scoder_core::UserId;
use serde::{Deserialize, Serialize};

/// A logged-in visitor's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub name: PersonName,
    pub phone: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub number: u32,
    pub zipcode: String,
    pub geolocation: Geolocation,
}

/// Coordinates as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geolocation {
    pub lat: String,
    pub long: String,
}

impl UserProfile {
    /// Placeholder profile for a freshly logged-in username.
    ///
    /// The login endpoint only returns a token, so everything except the
    /// username is filled with fixed demo data.
    #[must_use]
    pub fn placeholder(username: &str) -> Self {
        Self {
            id: UserId::new(1),
            email: username.to_string(),
            username: username.to_string(),
            name: PersonName {
                firstname: "John".to_string(),
                lastname: "Doe".to_string(),
            },
            phone: "(11) 99999-9999".to_string(),
            address: Address {
                city: "São Paulo".to_string(),
                street: "Rua das Flores".to_string(),
                number: 123,
                zipcode: "01234-567".to_string(),
                geolocation: Geolocation {
                    lat: "-23.550520".to_string(),
                    long: "-46.633308".to_string(),
                },
            },
        }
    }

    /// Name for the header greeting: first name, else username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.firstname.is_empty() {
            &self.username
        } else {
            &self.name.firstname
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_uses_username() {
        let user = UserProfile::placeholder("mor_2314");
        assert_eq!(user.username, "mor_2314");
        assert_eq!(user.email, "mor_2314");
        assert_eq!(user.display_name(), "John");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = UserProfile::placeholder("kevinryan");
        user.name.firstname.clear();
        assert_eq!(user.display_name(), "kevinryan");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(UserProfile::placeholder("donero")).unwrap();
        assert_eq!(json["name"]["firstname"], "John");
        assert_eq!(json["address"]["geolocation"]["long"], "-46.633308");
        assert_eq!(json["id"], 1);
    }
}
