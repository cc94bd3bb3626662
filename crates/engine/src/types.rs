// Copyright 2025 boxoffice contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// Ticket number. Strictly positive; 0 is the "not yet allocated"
/// sentinel stamped into empty record-table slots.
pub type TicketId = u64;

/// All tickets currently sell at a flat $10.00, in pennies.
pub const FLAT_TICKET_PRICE: u64 = 1000;

/// The window that hands out promotional goodies with each sale.
pub const GOODIE_WINDOW: u32 = 1;

/// One incoming request within a sale: which movie, which showing.
///
/// Movie and showing numbering is 0-based. Both are validated against
/// the configured limits before any ticket number is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub movie: u32,
    pub showing: u32,
}

/// A ticket record, one per issued ticket number.
///
/// The record is created zero-valued the instant its number is drawn
/// from the roll, populated by the sale path, and later updated at
/// most once by the exchange path. Records are never deleted within a
/// run. Callers always receive copies, never references into the
/// store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique ticket number; immutable once assigned.
    pub ticket_id: TicketId,
    /// Movie index, 0-based.
    pub movie: u32,
    /// Showing index, 0-based.
    pub showing: u32,
    /// Price in pennies. May be meaningless when `sold_out` is true.
    pub price: u64,
    /// The showing was already at capacity; this record is a
    /// placeholder for the unfulfilled request.
    pub sold_out: bool,
    /// Sold through the goodie-granting window and not sold out.
    pub goodies: bool,
    /// A goodie exchange was performed with this ticket. Transitions
    /// false to true exactly once.
    pub exchanged: bool,
    /// Item handed back during the exchange. Empty until exchanged.
    pub exchange_old: String,
    /// Item received during the exchange. Empty until exchanged.
    pub exchange_new: String,
    /// Selling window, 1-based.
    pub window: u32,
}

/// One line of the `items_sold` list in a [`Receipt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub description: String,
    /// Amount, in pennies.
    pub pennies: u64,
}

/// The itemized receipt for tickets actually sold in one sale.
///
/// Sold-out placeholders contribute neither a line item nor anything
/// to the total. The receipt is ephemeral: it is returned to the
/// caller and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Opaque timestamp token supplied by the caller, copied as-is.
    pub time: serde_json::Value,
    /// Selling window, 1-based.
    pub window: u32,
    pub items_sold: Vec<ReceiptItem>,
    /// Total amount for all line items, in pennies.
    pub total_pennies: u64,
}

/// The outcome of one sale: tickets in request order (sold-out
/// placeholders included) plus the receipt for the tickets actually
/// sold.
///
/// An aborted sale hands back whatever was assembled so far through
/// the `partial` field of the sell error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub tickets: Vec<Ticket>,
    pub receipt: Receipt,
}
