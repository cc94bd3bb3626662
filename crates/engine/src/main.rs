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

//! Boxoffice simulation driver
//!
//! This binary wires up the inventory engine and models a theatre's
//! day in-process:
//! - Window threads sell random tickets at random intervals
//! - Window 1 sends a random subset of its goodie tickets to the
//!   cafeteria for a water-to-soda exchange
//! - A tracker thread tallies sales, sellouts, and exchanges and
//!   renders the summary report at closing time

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, bail};
use crossbeam::channel::{Receiver, Sender, bounded, unbounded};
use rand::Rng;
use tracing::{debug, error, info, warn};

use boxoffice_engine::{
    EngineLimits, InventoryEngine, SimulationConfig, Ticket, TicketId, TicketRequest, logging,
};

/// Notifications flowing to the tracker.
enum TrackerMessage {
    Sale { tickets: Vec<Ticket> },
    Exchange,
}

/// Per-run tallies, rendered at shutdown.
struct Summary {
    exchanges: u64,
    /// (movies+1) × (showings+1); the last row and column hold
    /// per-showing and per-movie subtotals plus a grand total.
    sold: Vec<Vec<u64>>,
    sold_out: Vec<Vec<u64>>,
}

fn main() -> Result<()> {
    logging::init_logging()?;

    let limits = EngineLimits::from_env().unwrap_or_else(|_| {
        info!(target: "server", "Using default engine limits");
        EngineLimits::default()
    });
    let sim = SimulationConfig::from_env().unwrap_or_else(|_| {
        info!(target: "server", "Using default simulation settings");
        SimulationConfig::default()
    });

    info!(target: "server", "Starting boxoffice simulation");
    info!(target: "server", "Engine limits: {:?}", limits);
    info!(target: "server", "Simulation: {:?}", sim);

    info!(target: "server", "Opening the ticketing system...");
    let engine = Arc::new(InventoryEngine::new());
    if let Err(err) = engine.initialize(&limits) {
        error!(target: "server", %err, "ticketing system refused to open");
        bail!("initialization failed: {err}");
    }

    let movies = limits.movies as u32;
    let showings = limits.showings_per_movie as u32;
    let windows = limits.windows as u32;

    let (tracker_tx, tracker_rx) = unbounded::<TrackerMessage>();
    let (cafeteria_tx, cafeteria_rx) = bounded::<TicketId>(2);
    let stop = Arc::new(AtomicBool::new(false));
    let fatal = Arc::new(AtomicBool::new(false));

    info!(target: "server", "Starting tracker...");
    let tracker = spawn_tracker(tracker_rx, movies, showings);

    info!(target: "server", "Opening the cafeteria...");
    let cafeteria = spawn_cafeteria(engine.clone(), cafeteria_rx, tracker_tx.clone());

    info!(target: "server", "Opening {} ticket windows...", windows);
    let mut window_handles = Vec::new();
    for window in 1..=windows {
        // Only window 1 hands out goodies, so only it talks to the
        // cafeteria; the channel closes when window 1 goes home.
        let cafeteria_tx = (window == 1).then(|| cafeteria_tx.clone());
        window_handles.push(spawn_window(WindowSeat {
            engine: engine.clone(),
            tracker: tracker_tx.clone(),
            cafeteria: cafeteria_tx,
            stop: stop.clone(),
            fatal: fatal.clone(),
            window,
            movies,
            showings,
            sim: sim.clone(),
        }));
    }
    drop(cafeteria_tx);
    drop(tracker_tx);

    thread::sleep(Duration::from_secs(sim.run_secs));
    info!(target: "server", "Closing time; notifying ticket windows");
    stop.store(true, Ordering::Release);

    for handle in window_handles {
        let _ = handle.join();
    }
    info!(target: "server", "All windows closed");
    let _ = cafeteria.join();
    info!(target: "server", "Cafeteria closed");

    match tracker.join() {
        Ok(summary) => report(&summary, movies, showings),
        Err(_) => warn!(target: "server", "tracker panicked; no summary report"),
    }

    if fatal.load(Ordering::Acquire) {
        bail!("ticket capacity exhausted; simulation ended early");
    }
    info!(target: "server", "Shutdown complete");
    Ok(())
}

struct WindowSeat {
    engine: Arc<InventoryEngine>,
    tracker: Sender<TrackerMessage>,
    cafeteria: Option<Sender<TicketId>>,
    stop: Arc<AtomicBool>,
    fatal: Arc<AtomicBool>,
    window: u32,
    movies: u32,
    showings: u32,
    sim: SimulationConfig,
}

fn spawn_window(seat: WindowSeat) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("window-{}", seat.window))
        .spawn(move || run_window(seat))
        .expect("failed to spawn window thread")
}

fn run_window(seat: WindowSeat) {
    let mut rng = rand::thread_rng();
    info!(target: "window", window = seat.window, "window open");

    while !seat.stop.load(Ordering::Acquire) {
        if seat.sim.avg_delay_ms > 0 {
            let pause = rng.gen_range(0..=2 * seat.sim.avg_delay_ms);
            thread::sleep(Duration::from_millis(pause));
        }

        let count = rng.gen_range(1..=seat.sim.max_per_sale.max(1)) as usize;
        let requests: Vec<TicketRequest> = (0..count)
            .map(|_| TicketRequest {
                movie: rng.gen_range(0..seat.movies),
                showing: rng.gen_range(0..seat.showings),
            })
            .collect();

        let payment = serde_json::json!({ "reserved": "payment info is reserved for future use" });
        let local_time = serde_json::json!(chrono::Utc::now().to_rfc3339());

        match seat.engine.sell(seat.window, &requests, payment, local_time) {
            Ok(sale) => {
                debug!(
                    target: "window",
                    window = seat.window,
                    tickets = sale.tickets.len(),
                    total_pennies = sale.receipt.total_pennies,
                    "sale completed"
                );
                if let Some(cafeteria) = &seat.cafeteria {
                    for ticket in sale.tickets.iter().filter(|t| t.goodies) {
                        // Even-numbered whim: roughly half the
                        // customers bother to exchange their water.
                        if rng.gen_range(0..10) % 2 == 0
                            && cafeteria.send(ticket.ticket_id).is_err()
                        {
                            break;
                        }
                    }
                }
                let _ = seat.tracker.send(TrackerMessage::Sale { tickets: sale.tickets });
            }
            Err(err) if err.is_fatal() => {
                error!(target: "window", window = seat.window, %err, "ticket capacity exhausted; closing early");
                seat.fatal.store(true, Ordering::Release);
                seat.stop.store(true, Ordering::Release);
            }
            Err(err) => {
                warn!(target: "window", window = seat.window, %err, "sale failed");
            }
        }
    }

    info!(target: "window", window = seat.window, "window closed");
}

fn spawn_cafeteria(
    engine: Arc<InventoryEngine>,
    requests: Receiver<TicketId>,
    tracker: Sender<TrackerMessage>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("cafeteria".to_string())
        .spawn(move || {
            info!(target: "cafeteria", "cafeteria open");
            // The only exchange on offer: free water for soda.
            while let Ok(ticket_id) = requests.recv() {
                match engine.exchange(ticket_id, "water", "soda") {
                    Ok(()) => {
                        debug!(target: "cafeteria", ticket_id, "exchange performed");
                        let _ = tracker.send(TrackerMessage::Exchange);
                    }
                    Err(err) => {
                        debug!(target: "cafeteria", ticket_id, %err, "exchange denied");
                    }
                }
            }
            info!(target: "cafeteria", "cafeteria closed");
        })
        .expect("failed to spawn cafeteria thread")
}

fn spawn_tracker(
    messages: Receiver<TrackerMessage>,
    movies: u32,
    showings: u32,
) -> JoinHandle<Summary> {
    thread::Builder::new()
        .name("tracker".to_string())
        .spawn(move || {
            let rows = movies as usize + 1;
            let cols = showings as usize + 1;
            let mut summary = Summary {
                exchanges: 0,
                sold: vec![vec![0; cols]; rows],
                sold_out: vec![vec![0; cols]; rows],
            };

            while let Ok(message) = messages.recv() {
                match message {
                    TrackerMessage::Exchange => summary.exchanges += 1,
                    TrackerMessage::Sale { tickets } => {
                        for ticket in tickets {
                            let table = if ticket.sold_out {
                                &mut summary.sold_out
                            } else {
                                &mut summary.sold
                            };
                            let (m, s) = (ticket.movie as usize, ticket.showing as usize);
                            table[m][s] += 1; // the particular movie and showing
                            table[m][cols - 1] += 1; // the movie subtotal
                            table[rows - 1][s] += 1; // the showing subtotal
                            table[rows - 1][cols - 1] += 1; // the grand total
                        }
                    }
                }
            }

            summary
        })
        .expect("failed to spawn tracker thread")
}

/// Log the end-of-day report: exchanges performed, then one table of
/// tickets sold and one of missed sales, each with subtotals.
fn report(summary: &Summary, movies: u32, showings: u32) {
    info!(target: "report", "Ticket and Exchange Report");
    info!(target: "report", "{} exchanges performed", summary.exchanges);
    for line in render_table("Tickets sold", &summary.sold, movies, showings) {
        info!(target: "report", "{}", line);
    }
    for line in render_table(
        "Missed sales due to sellouts",
        &summary.sold_out,
        movies,
        showings,
    ) {
        info!(target: "report", "{}", line);
    }
}

fn render_table(title: &str, table: &[Vec<u64>], movies: u32, showings: u32) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{title} per movie and showing"));

    let mut header = String::from("             ");
    for movie in 0..movies {
        header.push_str(&format!("Movie {movie:2}  "));
    }
    header.push_str("All movies");
    lines.push(header);

    for showing in 0..=showings as usize {
        let mut line = if showing == showings as usize {
            String::from("All showings ")
        } else {
            format!("Showing {showing:2}   ")
        };
        for movie in 0..=movies as usize {
            line.push_str(&format!("{:8}  ", table[movie][showing]));
        }
        lines.push(line);
    }

    lines
}
