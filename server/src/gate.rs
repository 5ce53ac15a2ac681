//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Single-connection exclusivity enforcement.
//!
//! When the policy is on, at most one connection is "active" at any
//! instant. The acceptor swaps each newly admitted connection into a
//! mutex-guarded slot and cancels the previous occupant's token AFTER the
//! lock is released; the displaced session observes its token, writes the
//! displacement notice itself (best-effort) and closes its own stream.
//! Teardown is a compare-and-clear: a session that was already displaced
//! must never erase the slot entry owned by a newer connection.

use crate::types::ConnectionId;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One occupant of the exclusivity slot.
struct ActiveSession {
    id: ConnectionId,
    displace: CancellationToken,
}

/// Admission gate shared by the acceptor and every session.
pub(crate) struct ConnectionGate {
    exclusive: bool,
    slot: Mutex<Option<ActiveSession>>,
}

impl ConnectionGate {
    /// Create a gate; a non-exclusive gate admits everything untouched.
    pub(crate) fn new(exclusive: bool) -> Self {
        Self {
            exclusive,
            slot: Mutex::new(None),
        }
    }

    /// Admit a connection, displacing the previous occupant if any.
    ///
    /// Returns the token the new session must watch for its own
    /// displacement, or `None` when the policy is off. The slot lock is
    /// released before the previous occupant is cancelled, so no I/O ever
    /// happens under the lock.
    pub(crate) fn admit(&self, id: ConnectionId) -> Option<CancellationToken> {
        if !self.exclusive {
            return None;
        }
        let token = CancellationToken::new();
        let previous = {
            let mut slot = self.slot.lock().unwrap();
            slot.replace(ActiveSession {
                id,
                displace: token.clone(),
            })
        };
        if let Some(previous) = previous {
            debug!(
                displaced = %previous.id,
                admitted = %id,
                "displacing previous connection"
            );
            previous.displace.cancel();
        }
        Some(token)
    }

    /// Clear the slot at session teardown, but only if this session still
    /// owns it.
    pub(crate) fn release(&self, id: ConnectionId) {
        let mut slot = self.slot.lock().unwrap();
        if slot.as_ref().is_some_and(|active| active.id == id) {
            *slot = None;
        }
    }

    /// Current occupant, if any.
    #[cfg(test)]
    pub(crate) fn occupant(&self) -> Option<ConnectionId> {
        self.slot.lock().unwrap().as_ref().map(|active| active.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_exclusive_gate_is_a_noop() {
        let gate = ConnectionGate::new(false);
        assert!(gate.admit(ConnectionId::new(1)).is_none());
        assert!(gate.occupant().is_none());
        gate.release(ConnectionId::new(1));
    }

    #[test]
    fn admission_displaces_previous_occupant() {
        let gate = ConnectionGate::new(true);

        let first = gate.admit(ConnectionId::new(1)).expect("token expected");
        assert!(!first.is_cancelled());
        assert_eq!(gate.occupant(), Some(ConnectionId::new(1)));

        let second = gate.admit(ConnectionId::new(2)).expect("token expected");
        assert!(first.is_cancelled(), "previous occupant must be displaced");
        assert!(!second.is_cancelled());
        assert_eq!(gate.occupant(), Some(ConnectionId::new(2)));
    }

    #[test]
    fn release_is_compare_and_clear() {
        let gate = ConnectionGate::new(true);
        let _first = gate.admit(ConnectionId::new(1));
        let _second = gate.admit(ConnectionId::new(2));

        // The displaced session's cleanup must not evict the newer owner.
        gate.release(ConnectionId::new(1));
        assert_eq!(gate.occupant(), Some(ConnectionId::new(2)));

        gate.release(ConnectionId::new(2));
        assert!(gate.occupant().is_none());
    }
}
