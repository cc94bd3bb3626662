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

//! Boxoffice Inventory Engine
//!
//! This crate provides a concurrent ticket inventory and allocation
//! engine: it issues unique, monotonically increasing ticket numbers,
//! tracks per-(movie, showing) seat consumption under concurrent
//! access, records each ticket's sale and goodie-exchange state, and
//! enforces the configured inventory limits without double-selling or
//! losing updates.
//!
//! Architecture:
//! - Ticket roll: a background producer feeding a bounded MPMC queue,
//!   so any number of sellers can draw unique numbers without locking
//! - Seat ledger: one atomic counter per showing; checking
//!   availability and consuming a seat are the same step
//! - Record store: a fixed-size table under one coarse lock, with
//!   disjoint partial updates for the sale and exchange paths
//! - Inventory engine: run-once initialization gate, then Sell and
//!   Exchange from arbitrarily many threads
//!
//! The engine is purely in-process; a transport adapter in front of it
//! is responsible for wire formats and for relaying the error
//! classification unchanged. The `boxoffice` binary in this crate
//! drives the engine with simulated windows and a cafeteria.

pub mod config;
pub mod engine;
pub mod ledger;
pub mod logging;
pub mod roll;
pub mod store;
pub mod types;

pub use config::{EngineLimits, SimulationConfig};
pub use engine::{AbortCause, ConfigError, ExchangeError, InventoryEngine, SellError};
pub use ledger::{SeatClaim, SeatLedger};
pub use roll::{RollError, TicketRoll};
pub use store::{RecordStore, StoreError};
pub use types::*;
