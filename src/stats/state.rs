use serde::Serialize;

use super::types::DashboardStats;
use crate::error::Result;

/// What the dashboard currently has to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LoadState {
    Loading,
    Error(String),
    Ready(DashboardStats),
}

impl LoadState {
    pub fn from_result(result: Result<DashboardStats>) -> Self {
        match result {
            Ok(stats) => LoadState::Ready(stats),
            Err(e) => LoadState::Error(e.to_string()),
        }
    }

    pub fn stats(&self) -> Option<&DashboardStats> {
        match self {
            LoadState::Ready(stats) => Some(stats),
            _ => None,
        }
    }
}

/// Identifies one dashboard fetch so a stale result can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Holds the displayed load state across repeated fetches.
///
/// Each fetch takes a ticket from [`DashboardState::begin`]; only the result
/// for the most recent ticket is applied.
#[derive(Debug)]
pub struct DashboardState {
    generation: u64,
    state: LoadState,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            generation: 0,
            state: LoadState::Loading,
        }
    }

    pub fn begin(&mut self) -> FetchTicket {
        self.generation += 1;
        self.state = LoadState::Loading;
        FetchTicket(self.generation)
    }

    /// Apply a fetch result. Returns false (and changes nothing) if a newer
    /// fetch has started since `ticket` was issued.
    pub fn finish(&mut self, ticket: FetchTicket, result: Result<DashboardStats>) -> bool {
        if ticket.0 != self.generation {
            log::debug!(
                "Dropping superseded dashboard fetch {} (current {})",
                ticket.0,
                self.generation
            );
            return false;
        }
        self.state = LoadState::from_result(result);
        true
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
