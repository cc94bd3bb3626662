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

mod gate;

use std::sync::{
    OnceLock,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    config::EngineLimits,
    ledger::SeatLedger,
    roll::{DEFAULT_ROLL_BUFFER, RollError, TicketRoll},
    store::{RecordStore, StoreError},
    types::{
        FLAT_TICKET_PRICE, GOODIE_WINDOW, Receipt, ReceiptItem, Sale, Ticket, TicketId,
        TicketRequest,
    },
};
use gate::InitGate;

/// Invalid initialization parameter. Fatal at startup: no engine
/// state is mutated and the first failing call's outcome is what
/// every later initialize call observes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {value} ({requirement})")]
pub struct ConfigError {
    pub field: &'static str,
    pub value: i64,
    pub requirement: &'static str,
}

/// Errors returned by [`InventoryEngine::sell`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SellError {
    /// Sales have not been opened by a successful initialize.
    #[error("sale denied: the ticketing system is not open")]
    ServiceNotOpen,
    #[error("window {window} out of range: must be between 1 and {max}, inclusive")]
    WindowOutOfRange { window: u32, max: u32 },
    /// One request referenced a movie or showing outside the
    /// configured ranges. Nothing was consumed; `request` is 1-based.
    #[error("ticket request {request}: {field} {value} out of range: must be below {max}")]
    RequestOutOfRange {
        request: usize,
        field: &'static str,
        value: u32,
        max: u32,
    },
    /// The sale stopped partway through. `partial` holds the tickets
    /// and receipt assembled before the failure; seats consumed for
    /// them stay consumed. `request` is 1-based.
    #[error("sale aborted at ticket request {request}: {source}")]
    Aborted {
        request: usize,
        partial: Sale,
        #[source]
        source: AbortCause,
    },
}

impl SellError {
    /// True for the one unrecoverable condition: the ticket roll has
    /// outrun the record table and unique-number issuance can no
    /// longer be guaranteed. The hosting process should shut down
    /// cleanly rather than keep selling.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SellError::Aborted {
                source: AbortCause::Roll(RollError::Exhausted),
                ..
            }
        )
    }
}

/// What stopped an in-flight sale
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortCause {
    #[error(transparent)]
    Roll(#[from] RollError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors returned by [`InventoryEngine::exchange`]
///
/// The three denial variants are expected, frequent outcomes of
/// business rules, not failures of the system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    /// Exchanges have not been opened by a successful initialize.
    #[error("exchange denied: the ticketing system is not open")]
    ServiceNotOpen,
    #[error("exchange failed: {0}")]
    NotAllocated(#[source] StoreError),
    /// The ticket never entitled its holder to goodies, either
    /// because the showing was sold out or because it was not sold at
    /// the goodie-granting window.
    #[error("exchange denied: this ticket does not entitle the customer to goodies")]
    NotEntitled,
    #[error("exchange denied: a goodie exchange was already made with this ticket")]
    AlreadyExchanged,
    #[error("exchange denied: the theatre has run out of exchange goods")]
    OutOfGoods,
    #[error("exchange failed to record: {0}")]
    Store(#[source] StoreError),
}

/// Limits after validation, in their natural unsigned form.
#[derive(Debug, Clone, Copy)]
struct Limits {
    exchange_stock: u32,
    movies: u32,
    showings: u32,
    seats: u32,
    windows: u32,
}

impl Limits {
    fn validate(limits: &EngineLimits) -> Result<Self, ConfigError> {
        let non_negative = |field, value: i64| {
            if value < 0 {
                Err(ConfigError { field, value, requirement: "must not be negative" })
            } else {
                Ok(value as u32)
            }
        };
        let at_least_one = |field, value: i64| {
            if value < 1 {
                Err(ConfigError { field, value, requirement: "must be at least 1" })
            } else {
                Ok(value as u32)
            }
        };

        Ok(Self {
            exchange_stock: non_negative("exchange_stock", limits.exchange_stock)?,
            movies: at_least_one("movies", limits.movies)?,
            showings: at_least_one("showings_per_movie", limits.showings_per_movie)?,
            seats: at_least_one("seats_per_showing", limits.seats_per_showing)?,
            windows: at_least_one("windows", limits.windows)?,
        })
    }
}

/// Everything a ready engine owns. Built once by the winning
/// initialize call and never torn down within a run.
struct EngineState {
    limits: Limits,
    roll: TicketRoll,
    ledger: SeatLedger,
    store: RecordStore,
    exchanges_done: AtomicU32,
}

/// The ticket inventory and allocation engine.
///
/// One instance owns all shared mutable state (the roll, the seat
/// ledger, the record table, the exchange-stock counter, and the
/// sales-open flag), so independent engines can coexist in one
/// process. All operations take `&self` and are safe to call from any
/// number of threads; a transport adapter in front of the engine only
/// needs to hand over well-typed arguments and relay the error it
/// gets back without collapsing the classification.
pub struct InventoryEngine {
    gate: InitGate,
    sales_open: AtomicBool,
    state: OnceLock<EngineState>,
}

impl Default for InventoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryEngine {
    pub fn new() -> Self {
        Self {
            gate: InitGate::new(),
            sales_open: AtomicBool::new(false),
            state: OnceLock::new(),
        }
    }

    /// Open the ticketing system.
    ///
    /// Callable any number of times, but the real work runs exactly
    /// once: the first call validates the limits and builds the
    /// engine state, callers arriving during that work block until it
    /// finishes, and every caller receives the first call's outcome.
    /// On a validation failure nothing is mutated and sales never
    /// open.
    pub fn initialize(&self, limits: &EngineLimits) -> Result<(), ConfigError> {
        self.gate.run_once(|| self.open_for_sales(limits))
    }

    fn open_for_sales(&self, limits: &EngineLimits) -> Result<(), ConfigError> {
        let limits = Limits::validate(limits)?;
        let capacity =
            limits.movies as usize * limits.showings as usize * limits.seats as usize;

        let state = EngineState {
            ledger: SeatLedger::new(limits.movies, limits.showings, limits.seats),
            store: RecordStore::new(capacity),
            roll: TicketRoll::start(DEFAULT_ROLL_BUFFER),
            exchanges_done: AtomicU32::new(0),
            limits,
        };
        // The gate guarantees a single winner, so this set cannot race.
        let _ = self.state.set(state);
        self.sales_open.store(true, Ordering::Release);

        info!(
            target: "engine",
            movies = limits.movies,
            showings = limits.showings,
            seats = limits.seats,
            windows = limits.windows,
            exchange_stock = limits.exchange_stock,
            ticket_capacity = capacity,
            "ticketing system open for sales and exchanges"
        );
        Ok(())
    }

    fn ready_state(&self) -> Option<&EngineState> {
        if !self.sales_open.load(Ordering::Acquire) {
            return None;
        }
        self.state.get()
    }

    /// Sell tickets for one customer.
    ///
    /// Requests are validated in full before any ticket number or
    /// seat is consumed; an invalid window or request rejects the
    /// whole call with nothing issued. Valid requests are processed
    /// in input order: draw the next number off the roll, consume a
    /// seat for the showing, and persist the outcome. A request whose
    /// showing is already at capacity still produces a ticket record,
    /// returned at its request position flagged sold out and absent
    /// from the receipt.
    ///
    /// `payment_info` is reserved and unvalidated; `local_time` is
    /// copied as-is into the receipt.
    ///
    /// Ticket numbers are assigned in global issuance order, so two
    /// concurrent sales interleave at the roll and neither observes a
    /// gap.
    pub fn sell(
        &self,
        window: u32,
        requests: &[TicketRequest],
        payment_info: serde_json::Value,
        local_time: serde_json::Value,
    ) -> Result<Sale, SellError> {
        let state = self.ready_state().ok_or(SellError::ServiceNotOpen)?;
        let limits = &state.limits;

        if window < 1 || window > limits.windows {
            return Err(SellError::WindowOutOfRange { window, max: limits.windows });
        }
        // Reject as much as possible before consuming anything.
        for (i, request) in requests.iter().enumerate() {
            if request.movie >= limits.movies {
                return Err(SellError::RequestOutOfRange {
                    request: i + 1,
                    field: "movie",
                    value: request.movie,
                    max: limits.movies,
                });
            }
            if request.showing >= limits.showings {
                return Err(SellError::RequestOutOfRange {
                    request: i + 1,
                    field: "showing",
                    value: request.showing,
                    max: limits.showings,
                });
            }
        }
        // Validation and use of payment_info not currently implemented.
        let _ = payment_info;

        let mut sale = Sale {
            tickets: Vec::with_capacity(requests.len()),
            receipt: Receipt {
                time: local_time,
                window,
                items_sold: Vec::new(),
                total_pennies: 0,
            },
        };

        for (i, request) in requests.iter().enumerate() {
            let ticket_id = match state.roll.take() {
                Ok(id) => id,
                Err(err) => {
                    return Err(SellError::Aborted {
                        request: i + 1,
                        partial: sale,
                        source: err.into(),
                    });
                }
            };
            let mut ticket = match state.store.create(ticket_id) {
                Ok(ticket) => ticket,
                Err(err) => {
                    return Err(self.capacity_exhausted(state, i + 1, sale, err));
                }
            };

            ticket.movie = request.movie;
            ticket.showing = request.showing;
            ticket.window = window;

            let claim = state.ledger.consume_seat(request.movie, request.showing);
            ticket.price = FLAT_TICKET_PRICE;
            ticket.sold_out = claim.over_capacity;

            if !ticket.sold_out {
                sale.receipt.total_pennies += ticket.price;
                if window == GOODIE_WINDOW {
                    ticket.goodies = true;
                }
                sale.receipt.items_sold.push(ReceiptItem {
                    description: format!("Movie {}, Showing {}", ticket.movie, ticket.showing),
                    pennies: ticket.price,
                });
            }

            sale.tickets.push(ticket.clone());
            if let Err(err) = state.store.update_sale(&ticket) {
                return Err(SellError::Aborted {
                    request: i + 1,
                    partial: sale,
                    source: err.into(),
                });
            }
        }

        debug!(
            target: "engine",
            window,
            tickets = sale.tickets.len(),
            sold = sale.receipt.items_sold.len(),
            total_pennies = sale.receipt.total_pennies,
            "sale completed"
        );
        Ok(sale)
    }

    /// A drawn ticket number has no slot left in the record table.
    /// Unique-number issuance is safety-critical for all downstream
    /// accounting, so the roll is closed for good and the condition is
    /// reported as fatal rather than quietly reusing a number.
    fn capacity_exhausted(
        &self,
        state: &EngineState,
        request: usize,
        partial: Sale,
        err: StoreError,
    ) -> SellError {
        error!(
            target: "engine",
            %err,
            request,
            "ticket roll has outrun the record table; closing the roll, no further tickets can be issued"
        );
        state.roll.shutdown();
        SellError::Aborted {
            request,
            partial,
            source: RollError::Exhausted.into(),
        }
    }

    /// Exchange the goodie received with a ticket.
    ///
    /// Eligibility is checked in order, first failure wins: sold-out
    /// tickets and tickets without goodies are never entitled, a
    /// ticket exchanges at most once, and an empty stock refuses the
    /// exchange without mutating anything.
    ///
    /// Concurrent exchanges of one ticket are not serialized across
    /// this read/update pair; the table lock covers each store call
    /// individually, so two calls racing on the same ticket can both
    /// pass the eligibility checks. Different tickets are unaffected.
    pub fn exchange(
        &self,
        ticket_id: TicketId,
        old_good: &str,
        new_good: &str,
    ) -> Result<(), ExchangeError> {
        let state = self.ready_state().ok_or(ExchangeError::ServiceNotOpen)?;

        let mut ticket = state
            .store
            .read(ticket_id)
            .map_err(ExchangeError::NotAllocated)?;

        if ticket.sold_out {
            return Err(ExchangeError::NotEntitled);
        }
        if !ticket.goodies {
            return Err(ExchangeError::NotEntitled);
        }
        if ticket.exchanged {
            return Err(ExchangeError::AlreadyExchanged);
        }
        if state.exchanges_done.load(Ordering::Acquire) >= state.limits.exchange_stock {
            return Err(ExchangeError::OutOfGoods);
        }

        state.exchanges_done.fetch_add(1, Ordering::AcqRel);
        ticket.exchanged = true;
        ticket.exchange_old = old_good.to_string();
        ticket.exchange_new = new_good.to_string();
        state
            .store
            .update_exchange(&ticket)
            .map_err(ExchangeError::Store)?;

        debug!(target: "engine", ticket_id, old_good, new_good, "goodie exchanged");
        Ok(())
    }

    /// Fetch a copy of a ticket record, for reporting.
    ///
    /// Returns `None` before sales open or when the number was never
    /// issued. The copy is the caller's own; stored state cannot be
    /// mutated through it.
    pub fn ticket(&self, ticket_id: TicketId) -> Option<Ticket> {
        self.ready_state()?.store.read(ticket_id).ok()
    }

    /// Number of goodie exchanges performed so far.
    pub fn exchanges_done(&self) -> u32 {
        self.ready_state()
            .map(|state| state.exchanges_done.load(Ordering::Acquire))
            .unwrap_or(0)
    }
}
