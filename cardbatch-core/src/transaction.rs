//! Card transaction records: one card-type line within one settlement batch.

use serde::{Deserialize, Serialize};

use crate::batch_date::BatchDate;

/// One card-type line of a batch, as stated by the source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardTransaction {
    /// Date of the batch this line belongs to
    batch_date: BatchDate,
    /// Card brand identifier (VISA, MC, AMEX, ...)
    card_type: String,
    /// Number of card transactions in the line
    quantity: u32,
    /// Amount before fees
    gross_amount: f64,
    /// Amount after fees, as stated by the source
    net_amount: f64,
    /// Processing fee
    fee: f64,
}

impl CardTransaction {
    /// Create a new CardTransaction
    pub fn new(
        batch_date: impl Into<BatchDate>,
        card_type: impl Into<String>,
        quantity: u32,
        gross_amount: f64,
        net_amount: f64,
        fee: f64,
    ) -> Self {
        Self {
            batch_date: batch_date.into(),
            card_type: card_type.into(),
            quantity,
            gross_amount,
            net_amount,
            fee,
        }
    }

    pub fn batch_date(&self) -> &BatchDate {
        &self.batch_date
    }

    pub fn card_type(&self) -> &str {
        &self.card_type
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn gross_amount(&self) -> f64 {
        self.gross_amount
    }

    pub fn net_amount(&self) -> f64 {
        self.net_amount
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// `gross - fee - net`. Zero for a consistent line; reported, never corrected.
    pub fn fee_discrepancy(&self) -> f64 {
        self.gross_amount - self.fee - self.net_amount
    }
}
