//! Worker search state machine.
//!
//! Pure and clock-free: the caller reports keystrokes, debounce expiry and
//! store responses; the controller decides which request to issue and which
//! response may update the visible state. Every issued search gets a
//! monotonically increasing sequence number and only the response carrying
//! the latest one is accepted.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::authorization::StaffAccess;
use crate::models::{DirectoryEntry, OrgPlacement};

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Empty query, nothing shown.
    #[default]
    Idle,
    /// Query changed, debounce timer running.
    Pending,
    /// Request in flight.
    Searching,
    Results,
    /// The latest request failed; the message is shown inline.
    Failed,
}

/// One row of the result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerHit {
    pub national_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Filled in by enrichment; stays `None` when enrichment fails.
    pub org_unit: Option<String>,
    pub employer: Option<String>,
}

impl From<DirectoryEntry> for WorkerHit {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            national_id: entry.national_id,
            name: entry.name,
            email: entry.email,
            org_unit: None,
            employer: None,
        }
    }
}

/// What a keystroke did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Same trimmed text as before: nothing to do.
    Unchanged,
    /// Empty query: results cleared immediately, no request.
    Cleared,
    /// Arm (or re-arm) the debounce timer for this ticket.
    Scheduled { ticket: u64, delay: Duration },
}

/// A search the caller must run against the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub query: String,
}

/// Plain view of the controller for renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSnapshot {
    pub phase: SearchPhase,
    /// Query that produced `results`.
    pub query: Option<String>,
    pub results: Vec<WorkerHit>,
    pub message: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct PendingInput {
    ticket: u64,
    query: String,
}

#[derive(Debug)]
enum IssuedState {
    InFlight,
    Done(Vec<WorkerHit>),
    Failed(String),
}

#[derive(Debug)]
struct IssuedSearch {
    seq: u64,
    query: String,
    state: IssuedState,
}

#[derive(Debug)]
pub struct SearchController {
    debounce: Duration,
    last_input: String,
    next_ticket: u64,
    next_seq: u64,
    pending: Option<PendingInput>,
    latest: Option<IssuedSearch>,
}

impl SearchController {
    /// Only health staff can search the directory.
    pub fn new(_access: StaffAccess<'_>, debounce: Duration) -> Self {
        Self {
            debounce,
            last_input: String::new(),
            next_ticket: 0,
            next_seq: 0,
            pending: None,
            latest: None,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        if self.pending.is_some() {
            return SearchPhase::Pending;
        }
        match self.latest.as_ref().map(|s| &s.state) {
            None => SearchPhase::Idle,
            Some(IssuedState::InFlight) => SearchPhase::Searching,
            Some(IssuedState::Done(_)) => SearchPhase::Results,
            Some(IssuedState::Failed(_)) => SearchPhase::Failed,
        }
    }

    /// Results of the latest completed search. Kept visible while the next
    /// query is pending.
    pub fn results(&self) -> &[WorkerHit] {
        match self.latest.as_ref().map(|s| &s.state) {
            Some(IssuedState::Done(hits)) => hits.as_slice(),
            _ => &[],
        }
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let message = match self.latest.as_ref().map(|s| &s.state) {
            Some(IssuedState::Failed(message)) => Some(message.clone()),
            Some(IssuedState::Done(hits)) if hits.is_empty() => Some("Sin resultados".into()),
            _ => None,
        };
        SearchSnapshot {
            phase: self.phase(),
            query: self.latest.as_ref().map(|s| s.query.clone()),
            results: self.results().to_vec(),
            message,
        }
    }

    /// Report the current contents of the search box.
    pub fn input(&mut self, raw: &str) -> InputOutcome {
        let query = raw.trim();
        if query == self.last_input {
            return InputOutcome::Unchanged;
        }
        self.last_input = query.to_string();

        if query.is_empty() {
            self.pending = None;
            self.latest = None;
            return InputOutcome::Cleared;
        }

        self.next_ticket += 1;
        self.pending = Some(PendingInput {
            ticket: self.next_ticket,
            query: query.to_string(),
        });
        InputOutcome::Scheduled {
            ticket: self.next_ticket,
            delay: self.debounce,
        }
    }

    /// The debounce timer for `ticket` fired. Returns the request to run,
    /// or `None` when the ticket was superseded or the query equals the
    /// last issued one.
    pub fn debounce_elapsed(&mut self, ticket: u64) -> Option<SearchRequest> {
        if self.pending.as_ref().map(|p| p.ticket) != Some(ticket) {
            return None;
        }
        let pending = self.pending.take()?;

        if let Some(latest) = &self.latest {
            let failed = matches!(latest.state, IssuedState::Failed(_));
            if latest.query == pending.query && !failed {
                tracing::debug!(seq = latest.seq, "Search query unchanged, not reissued");
                return None;
            }
        }

        self.next_seq += 1;
        self.latest = Some(IssuedSearch {
            seq: self.next_seq,
            query: pending.query.clone(),
            state: IssuedState::InFlight,
        });
        Some(SearchRequest {
            seq: self.next_seq,
            query: pending.query,
        })
    }

    /// Deliver the response for `seq`. Returns `false` when the response
    /// is stale and was discarded.
    pub fn complete(&mut self, seq: u64, result: Result<Vec<WorkerHit>, String>) -> bool {
        let Some(latest) = self.latest.as_mut() else {
            tracing::debug!(seq, "Discarding search response after clear");
            return false;
        };
        if latest.seq != seq || !matches!(latest.state, IssuedState::InFlight) {
            tracing::debug!(seq, latest = latest.seq, "Discarding stale search response");
            return false;
        }
        latest.state = match result {
            Ok(hits) => IssuedState::Done(hits),
            Err(message) => IssuedState::Failed(message),
        };
        true
    }

    /// Merge organizational placements into the results of `seq`.
    pub fn enrich(&mut self, seq: u64, placements: &HashMap<String, OrgPlacement>) -> bool {
        let Some(IssuedSearch {
            seq: latest_seq,
            state: IssuedState::Done(hits),
            ..
        }) = self.latest.as_mut()
        else {
            return false;
        };
        if *latest_seq != seq {
            return false;
        }
        for hit in hits.iter_mut() {
            if let Some(p) = hit.national_id.as_ref().and_then(|id| placements.get(id)) {
                hit.org_unit = p.org_unit.clone();
                hit.employer = p.employer.clone();
            }
        }
        true
    }

    /// Manual clear: back to Idle, any in-flight response is discarded.
    pub fn clear(&mut self) {
        self.last_input.clear();
        self.pending = None;
        self.latest = None;
    }
}
