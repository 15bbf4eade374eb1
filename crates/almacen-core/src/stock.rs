//! # Stock Accounting
//!
//! A product's stock is never stored. It is the number of `entrada`
//! movements minus the number of `salida` movements in its history.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Movements for "Arroz 1kg"                                              │
//! │                                                                         │
//! │   entrada (NFC 04:A3)  ┐                                                │
//! │   entrada (NFC 04:B7)  ├── entradas = 3                                 │
//! │   entrada (manual)     ┘                                                │
//! │   salida  (manual)     ─── salidas  = 1                                 │
//! │                                                                         │
//! │   stock = 3 - 1 = 2                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are counted, quantities are not. The database layer computes the
//! same figure with an aggregate query; this module is the in-memory form.

use serde::{Deserialize, Serialize};

use crate::types::{MovementType, StockMovement};

/// Movement counts for a single product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub entradas: i64,
    pub salidas: i64,
}

impl StockLevel {
    /// Counts the movements of `product_id` found in `movements`.
    ///
    /// ```rust
    /// use almacen_core::stock::StockLevel;
    ///
    /// let level = StockLevel::for_product("p-1", std::iter::empty());
    /// assert_eq!(level.stock(), 0);
    /// ```
    pub fn for_product<'a, I>(product_id: &str, movements: I) -> Self
    where
        I: IntoIterator<Item = &'a StockMovement>,
    {
        movements
            .into_iter()
            .filter(|m| m.product_id == product_id)
            .fold(StockLevel::default(), |mut level, m| {
                level.record(m.movement_type);
                level
            })
    }

    /// Adds one movement of the given type.
    pub fn record(&mut self, movement_type: MovementType) {
        match movement_type {
            MovementType::Entrada => self.entradas += 1,
            MovementType::Salida => self.salidas += 1,
        }
    }

    /// Units on hand: entradas minus salidas. May go negative.
    #[inline]
    pub const fn stock(&self) -> i64 {
        self.entradas - self.salidas
    }
}

/// Stock of one product, computed from a movement slice.
pub fn compute_stock<'a, I>(product_id: &str, movements: I) -> i64
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    StockLevel::for_product(product_id, movements).stock()
}

/// A product's stock together with its name, for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductStock {
    pub product_id: String,
    pub product_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub level: StockLevel,
}

impl ProductStock {
    #[inline]
    pub const fn stock(&self) -> i64 {
        self.level.stock()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
