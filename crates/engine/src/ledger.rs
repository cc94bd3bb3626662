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

use std::sync::atomic::{AtomicU32, Ordering};

/// Per-showing seat accounting.
///
/// One monotonically increasing counter per (movie, showing) pair,
/// tracking seats consumed so far. Checking availability and consuming
/// a seat are the same atomic step; there is no read-only peek, which
/// rules out a check-then-act race between two sellers.
///
/// The check is optimistic and not reversible: a seat is consumed by
/// the act of asking for it, and a failure later in the sale does not
/// give it back. Counters may run past capacity; the over-capacity
/// count is the sold-out signal, not an error state.
pub struct SeatLedger {
    seats_per_showing: u32,
    showings: usize,
    counters: Vec<AtomicU32>,
}

/// Result of consuming one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatClaim {
    /// Seats consumed for this showing so far, including this one.
    pub consumed: u32,
    /// This consumption ran past the showing's capacity; the sale
    /// must be recorded as sold out.
    pub over_capacity: bool,
}

impl SeatLedger {
    pub fn new(movies: u32, showings: u32, seats_per_showing: u32) -> Self {
        let mut counters = Vec::with_capacity((movies as usize) * (showings as usize));
        counters.resize_with((movies as usize) * (showings as usize), || AtomicU32::new(0));
        Self {
            seats_per_showing,
            showings: showings as usize,
            counters,
        }
    }

    /// Atomically consume one seat for the given showing.
    ///
    /// Movie and showing must already be range-checked by the caller;
    /// the engine validates every request before consuming anything.
    pub fn consume_seat(&self, movie: u32, showing: u32) -> SeatClaim {
        let index = (movie as usize) * self.showings + (showing as usize);
        let consumed = self.counters[index].fetch_add(1, Ordering::AcqRel) + 1;
        SeatClaim {
            consumed,
            over_capacity: consumed > self.seats_per_showing,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_capacity_boundary() {
        let ledger = SeatLedger::new(2, 3, 3);

        for n in 1..=3 {
            let claim = ledger.consume_seat(1, 2);
            assert_eq!(claim, SeatClaim { consumed: n, over_capacity: false });
        }
        for n in 4..=6 {
            let claim = ledger.consume_seat(1, 2);
            assert_eq!(claim, SeatClaim { consumed: n, over_capacity: true });
        }
    }

    #[test]
    fn test_showings_are_independent() {
        let ledger = SeatLedger::new(2, 2, 1);

        assert!(!ledger.consume_seat(0, 0).over_capacity);
        assert!(ledger.consume_seat(0, 0).over_capacity);
        // A full (0, 0) leaves every other pair untouched.
        assert!(!ledger.consume_seat(0, 1).over_capacity);
        assert!(!ledger.consume_seat(1, 0).over_capacity);
        assert!(!ledger.consume_seat(1, 1).over_capacity);
    }

    #[test]
    fn test_concurrent_consumption_loses_no_updates() {
        let seats = 60;
        let ledger = Arc::new(SeatLedger::new(1, 1, seats));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(thread::spawn(move || {
                let mut over = 0u32;
                for _ in 0..25 {
                    if ledger.consume_seat(0, 0).over_capacity {
                        over += 1;
                    }
                }
                over
            }));
        }

        let total_over: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 200 consumptions against 60 seats: exactly 140 must report
        // over capacity, no matter how the threads interleave.
        assert_eq!(total_over, 200 - seats);
        let last = ledger.consume_seat(0, 0);
        assert_eq!(last.consumed, 201);
    }
}
