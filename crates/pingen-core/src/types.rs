//! Common types used throughout the Pingen client

use crate::constants::{
    PRODUCTION_API_BASE, PRODUCTION_IDENTITY_BASE, STAGING_API_BASE, STAGING_IDENTITY_BASE,
};
use crate::error::PingenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target deployment of the Pingen services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            Environment::Staging => STAGING_API_BASE,
            Environment::Production => PRODUCTION_API_BASE,
        }
    }

    pub fn default_identity_base(&self) -> &'static str {
        match self {
            Environment::Staging => STAGING_IDENTITY_BASE,
            Environment::Production => PRODUCTION_IDENTITY_BASE,
        }
    }
}

impl FromStr for Environment {
    type Err = PingenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(PingenError::validation(
                "invalid env (use staging or production)",
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a closed set of lowercase string values accepted by the letter endpoints.
macro_rules! letter_option {
    ($(#[$meta:meta])* $name:ident, $flag:literal, { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALLOWED: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl FromStr for $name {
            type Err = PingenError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(PingenError::validation(concat!("invalid ", $flag))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

letter_option!(
    /// Where the recipient address sits on the first page
    AddressPosition, "address-position", {
        Left => "left",
        Right => "right",
    }
);

letter_option!(
    /// Postal product used for delivery
    DeliveryProduct, "delivery-product", {
        Fast => "fast",
        Cheap => "cheap",
        Bulk => "bulk",
        Premium => "premium",
        Registered => "registered",
    }
);

letter_option!(
    PrintMode, "print-mode", {
        Simplex => "simplex",
        Duplex => "duplex",
    }
);

letter_option!(
    PrintSpectrum, "print-spectrum", {
        Color => "color",
        Grayscale => "grayscale",
    }
);

/// Parse an optional letter option, treating an empty string as absent
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, PingenError>
where
    T: FromStr<Err = PingenError>,
{
    match value {
        Some(raw) if !raw.is_empty() => raw.parse().map(Some),
        _ => Ok(None),
    }
}

/// Query parameters accepted by the JSON:API list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub filter: String,
    pub q: String,
    pub include: String,
    /// Sparse fieldset for the primary resource type
    pub fields: String,
}

impl ListParams {
    /// Build the query map for `resource`. Zero and empty values are omitted.
    pub fn to_query(&self, resource: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if self.page > 0 {
            params.insert("page[number]".to_string(), self.page.to_string());
        }
        if self.limit > 0 {
            params.insert("page[limit]".to_string(), self.limit.to_string());
        }
        let text_params = [
            ("sort".to_string(), &self.sort),
            ("filter".to_string(), &self.filter),
            ("q".to_string(), &self.q),
            ("include".to_string(), &self.include),
            (format!("fields[{}]", resource), &self.fields),
        ];
        for (key, value) in text_params {
            if !value.is_empty() {
                params.insert(key, value.clone());
            }
        }
        params
    }
}
