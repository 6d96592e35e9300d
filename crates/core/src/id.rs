//! Strongly-typed textual identifiers shared by both datasets.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Invoice number (unique per invoice row; names the output document).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

/// Purchase-order reference (join key between invoices and backup rows).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoReference(String);

/// Supplier quote reference of one backup row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteReference(String);

macro_rules! impl_text_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Build the identifier, rejecting blank values.
            pub fn new(value: impl Into<String>) -> Result<Self, EngineError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(EngineError::format(concat!($name, " must not be blank")));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_text_newtype!(InvoiceNumber, "invoice number");
impl_text_newtype!(PoReference, "PO reference");
impl_text_newtype!(QuoteReference, "supplier quote reference");

impl InvoiceNumber {
    /// File stem used when persisting the merged document.
    ///
    /// Path separators are replaced so the number can never escape the
    /// output directory.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect()
    }
}
