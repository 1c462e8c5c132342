//! Manufacturer records and the upstream reply shape.

use serde::{Deserialize, Serialize};

/// A manufacturer registered for a MAC prefix.
///
/// Immutable once built. On the wire the country code travels under the
/// `country` key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Manufacturer {
    /// Registered company name
    pub company: String,
    /// Registered postal address
    pub address: String,
    /// Two-letter country code
    #[serde(rename = "country")]
    pub country_code: String,
}

impl Manufacturer {
    /// Creates a manufacturer record.
    pub fn new(
        company: impl Into<String>,
        address: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            address: address.into(),
            country_code: country_code.into(),
        }
    }

    /// Returns true for the zero record (all fields empty).
    pub fn is_empty(&self) -> bool {
        self.company.is_empty() && self.address.is_empty() && self.country_code.is_empty()
    }
}

/// Body of `GET /v2/macs/{prefix}`.
///
/// A miss is reported as `{"found": false}` with the other fields empty or
/// absent, so every field defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamReply {
    /// Registered company name
    #[serde(default)]
    pub company: String,
    /// Registered postal address
    #[serde(default)]
    pub address: String,
    /// Two-letter country code
    #[serde(default)]
    pub country: String,
    /// Whether the upstream knows this prefix
    #[serde(default)]
    pub found: bool,
}

impl UpstreamReply {
    /// A reply for a known prefix.
    pub fn hit(manufacturer: &Manufacturer) -> Self {
        Self {
            company: manufacturer.company.clone(),
            address: manufacturer.address.clone(),
            country: manufacturer.country_code.clone(),
            found: true,
        }
    }

    /// A "not found" reply.
    pub fn miss() -> Self {
        Self::default()
    }

    /// The manufacturer carried by this reply, if the upstream found one.
    pub fn into_manufacturer(self) -> Option<Manufacturer> {
        if !self.found {
            return None;
        }
        Some(Manufacturer {
            company: self.company,
            address: self.address,
            country_code: self.country,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_wire_keys() {
        let m = Manufacturer::new("Acme", "1 A St", "US");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["company"], "Acme");
        assert_eq!(json["address"], "1 A St");
        assert_eq!(json["country"], "US");
        assert!(json.get("country_code").is_none());
    }

    #[test]
    fn test_zero_manufacturer() {
        assert!(Manufacturer::default().is_empty());
        assert!(!Manufacturer::new("Acme", "", "").is_empty());
    }

    #[test]
    fn test_reply_decodes_bare_miss() {
        let reply: UpstreamReply = serde_json::from_str(r#"{"found":false}"#).unwrap();
        assert!(!reply.found);
        assert_eq!(reply.into_manufacturer(), None);
    }

    #[test]
    fn test_reply_ignores_extra_fields() {
        let body = r#"{
            "success": true,
            "found": true,
            "macPrefix": "AABBCC",
            "company": "Acme",
            "address": "1 A St",
            "country": "US",
            "blockStart": "AABBCC000000",
            "isRand": false
        }"#;
        let reply: UpstreamReply = serde_json::from_str(body).unwrap();
        assert_eq!(
            reply.into_manufacturer(),
            Some(Manufacturer::new("Acme", "1 A St", "US"))
        );
    }

    #[test]
    fn test_hit_reply_carries_manufacturer() {
        let m = Manufacturer::new("Acme", "1 A St", "US");
        assert_eq!(UpstreamReply::hit(&m).into_manufacturer(), Some(m));
    }
}
