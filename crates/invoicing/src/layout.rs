//! Layout registry: named template slots resolved to page coordinates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use invoicestamp_core::{EngineError, EngineResult};

/// Every slot the renderer stamps text into.
///
/// The configuration keys are kept verbatim from the historical layout file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    InvoiceReference,
    InvoiceDate,
    DueDate,
    Po,
    AccountingMonthPrimary,
    AccountingMonthSecondary,
    AccountingMonthTertiary,
    Quantity,
    NetAmount,
    SubTotal,
    /// Standard VAT position.
    Vat,
    /// Alternate VAT position, used for wide amounts.
    VatAlternate,
    Total,
    QuoteRefColumn,
    ClientRefColumn,
    SiteNameColumn,
    EstimateColumn,
    /// Net amount repeated on the last backup page.
    GrandTotal,
}

impl Slot {
    pub const ALL: [Slot; 18] = [
        Slot::InvoiceReference,
        Slot::InvoiceDate,
        Slot::DueDate,
        Slot::Po,
        Slot::AccountingMonthPrimary,
        Slot::AccountingMonthSecondary,
        Slot::AccountingMonthTertiary,
        Slot::Quantity,
        Slot::NetAmount,
        Slot::SubTotal,
        Slot::Vat,
        Slot::VatAlternate,
        Slot::Total,
        Slot::QuoteRefColumn,
        Slot::ClientRefColumn,
        Slot::SiteNameColumn,
        Slot::EstimateColumn,
        Slot::GrandTotal,
    ];

    /// Configuration key of the slot.
    pub fn key(self) -> &'static str {
        match self {
            Slot::InvoiceReference => "invoice_reference",
            Slot::InvoiceDate => "invoice_date",
            Slot::DueDate => "due_date",
            Slot::Po => "po",
            Slot::AccountingMonthPrimary => "accounting_month_uno",
            Slot::AccountingMonthSecondary => "accounting_month_dos",
            Slot::AccountingMonthTertiary => "accounting_month_tres",
            Slot::Quantity => "quantity",
            Slot::NetAmount => "net_amount",
            Slot::SubTotal => "sub_total",
            Slot::Vat => "vat",
            Slot::VatAlternate => "vat_dos",
            Slot::Total => "total",
            Slot::QuoteRefColumn => "bloque_uno",
            Slot::ClientRefColumn => "bloque_two",
            Slot::SiteNameColumn => "bloque_three",
            Slot::EstimateColumn => "bloque_four",
            Slot::GrandTotal => "total_two",
        }
    }

    pub fn from_key(key: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

impl core::fmt::Display for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// A point on the template page, top-left origin, y pointing down.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Immutable slot → position map, validated to cover every [`Slot`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRegistry {
    positions: BTreeMap<Slot, Position>,
    ignored_keys: Vec<String>,
}

impl LayoutRegistry {
    /// Build the registry from `(key, position)` entries.
    ///
    /// Fails with a configuration error naming every slot that has no entry.
    /// Keys that do not name a slot are kept aside in [`Self::ignored_keys`].
    pub fn from_entries<I, K>(entries: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (K, Position)>,
        K: AsRef<str>,
    {
        let mut positions = BTreeMap::new();
        let mut ignored_keys = Vec::new();

        for (key, position) in entries {
            let key = key.as_ref();
            match Slot::from_key(key) {
                Some(slot) => {
                    positions.insert(slot, position);
                }
                None => ignored_keys.push(key.to_string()),
            }
        }

        let missing: Vec<&str> = Slot::ALL
            .iter()
            .filter(|slot| !positions.contains_key(*slot))
            .map(|slot| slot.key())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::configuration(format!(
                "layout is missing positions for: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            positions,
            ignored_keys,
        })
    }

    pub fn position(&self, slot: Slot) -> EngineResult<Position> {
        self.positions.get(&slot).copied().ok_or_else(|| {
            EngineError::configuration(format!("layout slot '{}' is not defined", slot.key()))
        })
    }

    /// Resolve a slot by its configuration key.
    pub fn resolve(&self, key: &str) -> EngineResult<Position> {
        let slot = Slot::from_key(key).ok_or_else(|| {
            EngineError::configuration(format!("unknown layout slot '{key}'"))
        })?;
        self.position(slot)
    }

    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored_keys
    }
}
