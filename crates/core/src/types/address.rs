//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`ShippingAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("shipping address field `{0}` is required")]
    MissingField(&'static str),
    /// The postal code is not eight digits.
    #[error("postal code must have 8 digits")]
    InvalidPostalCode,
}

/// A Brazilian postal address.
///
/// Field names on the wire follow the checkout form (`cep`, `rua`, ...).
/// The address is stored as a JSON document on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// CEP, with or without the dash.
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "complemento", default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
}

impl ShippingAddress {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field, or
    /// [`AddressError::InvalidPostalCode`] if the CEP does not contain
    /// exactly eight digits.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required = [
            ("cep", &self.postal_code),
            ("rua", &self.street),
            ("numero", &self.number),
            ("bairro", &self.neighborhood),
            ("cidade", &self.city),
            ("estado", &self.state),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }

        let digits = self
            .postal_code
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect::<Vec<_>>();
        if digits.len() != 8 || !digits.iter().all(char::is_ascii_digit) {
            return Err(AddressError::InvalidPostalCode);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            postal_code: "96400-000".to_string(),
            street: "Rua General Osório".to_string(),
            number: "120".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "Bagé".to_string(),
            state: "RS".to_string(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert!(address().validate().is_ok());
    }

    #[test]
    fn test_blank_required_field() {
        let mut addr = address();
        addr.city = "  ".to_string();
        assert_eq!(addr.validate(), Err(AddressError::MissingField("cidade")));
    }

    #[test]
    fn test_complement_is_optional() {
        let mut addr = address();
        addr.complement = Some("apto 2".to_string());
        assert!(addr.validate().is_ok());
    }

    #[test]
    fn test_bad_postal_code() {
        let mut addr = address();
        addr.postal_code = "9640".to_string();
        assert_eq!(addr.validate(), Err(AddressError::InvalidPostalCode));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(address()).unwrap();
        assert_eq!(json["cep"], "96400-000");
        assert_eq!(json["bairro"], "Centro");
        assert!(json.get("complemento").is_none());
    }
}
