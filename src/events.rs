use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::PlayerId;

/// audit events emitted by loan operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanEvent {
    LoanQuoted {
        player: PlayerId,
        principal: Money,
        repayment: Money,
        downgraded: bool,
        timestamp: DateTime<Utc>,
    },
    LoanRequestAtCap {
        player: PlayerId,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanAccepted {
        player: PlayerId,
        principal: Money,
        repayment: Money,
        new_outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDenied {
        player: PlayerId,
        principal: Money,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        player: PlayerId,
        paid: Money,
        remaining: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event buffer the host drains and persists or broadcasts
///
/// Shared between concurrent callers, so the buffer sits behind a mutex;
/// emission order across players is arbitrary.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<LoanEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, event: LoanEvent) {
        self.events.lock().push(event);
    }

    pub fn drain(&self) -> Vec<LoanEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
