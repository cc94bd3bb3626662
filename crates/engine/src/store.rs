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

use std::sync::Mutex;

use crate::types::{Ticket, TicketId};

/// The canonical table of ticket records, indexed by ticket number.
///
/// The table is sized once at startup to `movies × showings × seats`
/// plus the permanently unused slot 0, so ticket number 0 can serve as
/// the "not yet allocated" sentinel. Records are volatile: the table
/// is rebuilt on every run and records are never deleted within one.
///
/// One coarse mutex covers the whole table. The sale and exchange
/// update paths copy disjoint field sets, and because both run under
/// the same lock they can never interleave field-by-field and corrupt
/// a record. Nothing outside this module touches the slots directly;
/// readers receive copies.
pub struct RecordStore {
    records: Mutex<Vec<Ticket>>,
}

impl RecordStore {
    /// Allocate a zeroed table holding `capacity` tickets plus the
    /// reserved slot 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(vec![Ticket::default(); capacity + 1]),
        }
    }

    /// Mark a slot allocated by stamping its ticket number, returning
    /// a copy of the fresh record.
    ///
    /// A number at or past the end of the table is [`StoreError::TableFull`]:
    /// the roll has outrun the table and the engine cannot safely
    /// continue issuing numbers. Freshness is guaranteed upstream
    /// because the roll delivers each number to exactly one caller.
    pub fn create(&self, ticket_id: TicketId) -> Result<Ticket, StoreError> {
        let mut records = self.records.lock().unwrap();
        let last = records.len() as u64 - 1;
        let Some(slot) = records.get_mut(ticket_id as usize) else {
            return Err(StoreError::TableFull { ticket_id, last });
        };
        debug_assert_eq!(slot.ticket_id, 0, "ticket number issued twice");
        slot.ticket_id = ticket_id;
        Ok(slot.clone())
    }

    /// Return a full copy of the record for the given ticket number.
    ///
    /// Fails with [`StoreError::NotAllocated`] when the number is out
    /// of range (including the reserved slot 0) or the slot's stamped
    /// number does not match the one requested.
    pub fn read(&self, ticket_id: TicketId) -> Result<Ticket, StoreError> {
        if ticket_id == 0 {
            return Err(StoreError::NotAllocated { ticket_id });
        }
        let records = self.records.lock().unwrap();
        match records.get(ticket_id as usize) {
            Some(slot) if slot.ticket_id == ticket_id => Ok(slot.clone()),
            _ => Err(StoreError::NotAllocated { ticket_id }),
        }
    }

    /// Overwrite only the sale-related fields of the matching slot:
    /// movie, showing, price, sold_out, goodies, window.
    ///
    /// The exchange fields are ignored; recording a sale can never
    /// clobber an exchange that somehow landed first.
    pub fn update_sale(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let last = records.len() as u64 - 1;
        let slot = Self::slot_mut(&mut records, ticket.ticket_id, last)?;
        slot.movie = ticket.movie;
        slot.showing = ticket.showing;
        slot.price = ticket.price;
        slot.sold_out = ticket.sold_out;
        slot.goodies = ticket.goodies;
        slot.window = ticket.window;
        Ok(())
    }

    /// Overwrite only the exchange-related fields of the matching
    /// slot: exchanged, exchange_old, exchange_new.
    pub fn update_exchange(&self, ticket: &Ticket) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let last = records.len() as u64 - 1;
        let slot = Self::slot_mut(&mut records, ticket.ticket_id, last)?;
        slot.exchanged = ticket.exchanged;
        slot.exchange_old = ticket.exchange_old.clone();
        slot.exchange_new = ticket.exchange_new.clone();
        Ok(())
    }

    fn slot_mut<'a>(
        records: &'a mut [Ticket],
        ticket_id: TicketId,
        last: u64,
    ) -> Result<&'a mut Ticket, StoreError> {
        if ticket_id == 0 {
            return Err(StoreError::OutOfBounds { ticket_id, last });
        }
        records
            .get_mut(ticket_id as usize)
            .ok_or(StoreError::OutOfBounds { ticket_id, last })
    }
}

/// Errors produced by the record store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An update referenced a ticket number outside the table.
    #[error("ticket {ticket_id} is outside the record table (last slot is {last})")]
    OutOfBounds { ticket_id: TicketId, last: u64 },
    /// A read referenced a slot that was never stamped with the
    /// requested number.
    #[error("ticket {ticket_id} is not allocated")]
    NotAllocated { ticket_id: TicketId },
    /// A create ran past the last slot: every ticket the table was
    /// sized for has already been issued.
    #[error("record table full: ticket {ticket_id} exceeds capacity (last slot is {last})")]
    TableFull { ticket_id: TicketId, last: u64 },
}
