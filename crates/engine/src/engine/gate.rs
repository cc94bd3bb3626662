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

use std::sync::{Condvar, Mutex};

use super::ConfigError;

/// Run-once initialization gate.
///
/// Explicit {Idle → Running → Done} state machine: the first caller
/// performs setup, callers arriving while setup is in progress block
/// on the condvar, and every caller, however late, receives the first
/// call's outcome. Setup is never re-run, even after a failure.
pub(super) struct InitGate {
    state: Mutex<GateState>,
    ready: Condvar,
}

enum GateState {
    Idle,
    Running,
    Done(Result<(), ConfigError>),
}

impl InitGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
            ready: Condvar::new(),
        }
    }

    /// Run `setup` if and only if no call has run it before, and
    /// return the outcome of whichever call ran it.
    pub fn run_once<F>(&self, setup: F) -> Result<(), ConfigError>
    where
        F: FnOnce() -> Result<(), ConfigError>,
    {
        let mut state = self.state.lock().unwrap();
        loop {
            match &*state {
                GateState::Idle => {
                    *state = GateState::Running;
                    // Setup runs without the lock so that waiters can
                    // park on the condvar instead of the mutex.
                    drop(state);
                    let outcome = setup();
                    let mut state = self.state.lock().unwrap();
                    *state = GateState::Done(outcome.clone());
                    self.ready.notify_all();
                    return outcome;
                }
                GateState::Running => {
                    state = self.ready.wait(state).unwrap();
                }
                GateState::Done(outcome) => return outcome.clone(),
            }
        }
    }
}
