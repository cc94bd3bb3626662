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

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, bounded};
use crossbeam::select;
use tracing::debug;

use crate::types::TicketId;

/// Default buffer size for the roll. Small, to keep `take` latency
/// low without generating numbers far ahead of demand.
pub const DEFAULT_ROLL_BUFFER: usize = 5;

/// A virtual roll of ticket numbers.
///
/// A background producer thread pushes 1, 2, 3, … into a bounded
/// channel; [`TicketRoll::take`] pulls the next number off the roll.
///
/// Properties:
/// - Strictly increasing, gapless sequence starting at 1
/// - Each number is delivered to exactly one caller
/// - Any number of threads may call `take` concurrently without
///   external locking (the channel is MPMC)
/// - `take` blocks only while the buffer is momentarily empty
/// - After [`TicketRoll::shutdown`], pending and future `take` calls
///   fail with [`RollError::Exhausted`]
///
/// The roll does NOT:
/// - Restart or reuse numbers
/// - Know about the record table's capacity; the engine decides when
///   a drawn number can no longer be stored and shuts the roll down
pub struct TicketRoll {
    numbers: Receiver<TicketId>,
    stop: Sender<()>,
    closed: AtomicBool,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl TicketRoll {
    /// Start the roll with the given channel buffer size.
    pub fn start(buffer: usize) -> Self {
        let (number_tx, number_rx) = bounded(buffer);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let producer = thread::Builder::new()
            .name("ticket-roll".to_string())
            .spawn(move || Self::run_producer(number_tx, stop_rx))
            .expect("failed to spawn ticket roll producer thread");

        Self {
            numbers: number_rx,
            stop: stop_tx,
            closed: AtomicBool::new(false),
            producer: Mutex::new(Some(producer)),
        }
    }

    /// Producer loop: enqueue sequential numbers until told to stop.
    ///
    /// Numbers start at 1 so that a stamped record is distinguishable
    /// from the zero-valued sentinel in an empty slot.
    fn run_producer(numbers: Sender<TicketId>, stop: Receiver<()>) {
        let mut next: TicketId = 1;
        loop {
            select! {
                send(numbers, next) -> sent => {
                    if sent.is_err() {
                        break;
                    }
                    next += 1;
                }
                recv(stop) -> _ => break,
            }
        }
        debug!(target: "roll", last_issued = next.saturating_sub(1), "ticket roll producer stopped");
    }

    /// Pull the next ticket number off the roll, blocking until one is
    /// available.
    ///
    /// Fails with [`RollError::Exhausted`] once the roll has been shut
    /// down; numbers still sitting in the buffer at that point are
    /// never delivered.
    pub fn take(&self) -> Result<TicketId, RollError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RollError::Exhausted);
        }
        self.numbers.recv().map_err(|_| RollError::Exhausted)
    }

    /// Stop the producer and fail all pending and future takes.
    ///
    /// Idempotent; safe to call from any thread.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        // Wake the producer if it is blocked on a full buffer.
        let _ = self.stop.try_send(());
        if let Ok(mut producer) = self.producer.lock()
            && let Some(handle) = producer.take()
            && handle.join().is_err()
        {
            debug!(target: "roll", "ticket roll producer panicked");
        }
    }
}

impl Drop for TicketRoll {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Errors produced by the ticket roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RollError {
    /// The roll has been shut down; no further ticket numbers will be
    /// issued. This is the one fatal condition in the system: it means
    /// the record table is undersized for actual demand.
    #[error("ticket roll exhausted: no further ticket numbers will be issued")]
    Exhausted,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_sequential_takes_are_gapless() {
        let roll = TicketRoll::start(DEFAULT_ROLL_BUFFER);
        for expected in 1..=20 {
            assert_eq!(roll.take().unwrap(), expected);
        }
    }

    #[test]
    fn test_take_after_shutdown_fails() {
        let roll = TicketRoll::start(DEFAULT_ROLL_BUFFER);
        assert_eq!(roll.take().unwrap(), 1);

        roll.shutdown();
        assert_eq!(roll.take(), Err(RollError::Exhausted));
        // Still failing on the next attempt, not blocking.
        assert_eq!(roll.take(), Err(RollError::Exhausted));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let roll = TicketRoll::start(2);
        roll.shutdown();
        roll.shutdown();
        assert_eq!(roll.take(), Err(RollError::Exhausted));
    }

    #[test]
    fn test_concurrent_takes_are_unique() {
        let roll = Arc::new(TicketRoll::start(DEFAULT_ROLL_BUFFER));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let roll = roll.clone();
            handles.push(thread::spawn(move || {
                let mut taken = Vec::with_capacity(50);
                for _ in 0..50 {
                    taken.push(roll.take().unwrap());
                }
                taken
            }));
        }

        let mut all: Vec<TicketId> = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }

        let distinct: HashSet<TicketId> = all.iter().copied().collect();
        assert_eq!(distinct.len(), 200);
        assert_eq!(*all.iter().min().unwrap(), 1);
        assert_eq!(*all.iter().max().unwrap(), 200);
    }
}
