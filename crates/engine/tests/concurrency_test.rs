//! Concurrency tests for the inventory engine
//!
//! These tests drive the engine from many threads at once and verify
//! the properties that must hold regardless of interleaving: unique
//! gapless ticket numbers, exact seat accounting, a single
//! initialization, and exchange-stock enforcement.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use boxoffice_engine::{EngineLimits, InventoryEngine, TicketId, TicketRequest};
use serde_json::Value;

fn request(movie: u32, showing: u32) -> TicketRequest {
    TicketRequest { movie, showing }
}

#[test]
fn test_concurrent_sales_issue_unique_gapless_numbers() {
    let limits = EngineLimits {
        exchange_stock: 0,
        movies: 2,
        showings_per_movie: 2,
        seats_per_showing: 100,
        windows: 4,
    };
    let engine = Arc::new(InventoryEngine::new());
    engine.initialize(&limits).unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();

    for worker in 0..8u32 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            let window = worker % 4 + 1;
            let mut ids = Vec::new();
            for _ in 0..10 {
                let requests = [request(0, 0), request(1, 0), request(0, 1)];
                let sale = engine
                    .sell(window, &requests, Value::Null, Value::Null)
                    .unwrap();
                ids.extend(sale.tickets.iter().map(|t| t.ticket_id));
            }
            ids
        }));
    }

    let mut all: Vec<TicketId> = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    // 8 workers x 10 sales x 3 tickets: every number distinct and
    // positive, and collectively the gapless range 1..=240.
    assert_eq!(all.len(), 240);
    let distinct: HashSet<TicketId> = all.iter().copied().collect();
    assert_eq!(distinct.len(), 240);
    assert_eq!(distinct, (1..=240).collect::<HashSet<TicketId>>());
}

#[test]
fn test_concurrent_sales_never_oversell_a_showing() {
    let seats = 50u32;
    // Two movies keep the record table (2 x 1 x 50 slots) roomier
    // than the one contended showing, so the seat boundary is what
    // the workers actually hit.
    let limits = EngineLimits {
        exchange_stock: 0,
        movies: 2,
        showings_per_movie: 1,
        seats_per_showing: seats as i64,
        windows: 2,
    };
    let engine = Arc::new(InventoryEngine::new());
    engine.initialize(&limits).unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut sold = 0u32;
            for _ in 0..10 {
                let sale = engine
                    .sell(2, &[request(0, 0)], Value::Null, Value::Null)
                    .unwrap();
                if !sale.tickets[0].sold_out {
                    sold += 1;
                }
            }
            sold
        }));
    }

    // 80 requests against 50 seats: exactly 50 sell, the other 30
    // come back as sold-out placeholders, no matter the interleaving.
    let total_sold: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total_sold, seats);
}

#[test]
fn test_concurrent_initialize_runs_setup_once() {
    let engine = Arc::new(InventoryEngine::new());
    let limits = EngineLimits {
        exchange_stock: 5,
        movies: 2,
        showings_per_movie: 2,
        seats_per_showing: 10,
        windows: 2,
    };

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let limits = limits.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.initialize(&limits)
        }));
    }
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    // Exactly one roll was started: numbering begins at 1.
    let sale = engine
        .sell(1, &[request(0, 0)], Value::Null, Value::Null)
        .unwrap();
    assert_eq!(sale.tickets[0].ticket_id, 1);
}

#[test]
fn test_concurrent_exchanges_of_distinct_tickets() {
    let limits = EngineLimits {
        exchange_stock: 16,
        movies: 1,
        showings_per_movie: 1,
        seats_per_showing: 16,
        windows: 1,
    };
    let engine = Arc::new(InventoryEngine::new());
    engine.initialize(&limits).unwrap();

    let sale = engine
        .sell(1, &[request(0, 0); 16], Value::Null, Value::Null)
        .unwrap();
    let ids: Vec<TicketId> = sale.tickets.iter().map(|t| t.ticket_id).collect();

    let barrier = Arc::new(Barrier::new(ids.len()));
    let mut handles = Vec::new();
    for id in ids.clone() {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.exchange(id, "water", "soda")
        }));
    }
    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }

    assert_eq!(engine.exchanges_done(), 16);
    for id in ids {
        let stored = engine.ticket(id).unwrap();
        assert!(stored.exchanged);
        assert_eq!(stored.exchange_new, "soda");
    }
}
