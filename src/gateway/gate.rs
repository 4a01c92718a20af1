use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(4);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateStatus {
    Idle,
    Generating,
    CoolingDown,
}

/// Reason a submission was dropped before any request went out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Throttled {
    InFlight,
    CoolingDown,
}

/// Single-flight guard with a cooldown that starts when a request resolves,
/// whether it succeeded or not.
#[derive(Clone, Debug)]
pub struct GenerationGate {
    in_flight: bool,
    cooldown_until: Option<Instant>,
    cooldown: Duration,
}

impl GenerationGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            in_flight: false,
            cooldown_until: None,
            cooldown,
        }
    }

    pub fn status(&self, now: Instant) -> GateStatus {
        if self.in_flight {
            GateStatus::Generating
        } else if self.cooldown_until.is_some_and(|until| now < until) {
            GateStatus::CoolingDown
        } else {
            GateStatus::Idle
        }
    }

    /// Time left on the cooldown, if it is running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.cooldown_until
            .filter(|&until| now < until && !self.in_flight)
            .map(|until| until - now)
    }

    /// Claim the gate for a new request. Rejections change nothing.
    pub fn try_begin(&mut self, now: Instant) -> Result<(), Throttled> {
        match self.status(now) {
            GateStatus::Generating => Err(Throttled::InFlight),
            GateStatus::CoolingDown => Err(Throttled::CoolingDown),
            GateStatus::Idle => {
                self.in_flight = true;
                self.cooldown_until = None;
                Ok(())
            }
        }
    }

    /// Mark the outstanding request resolved and restart the cooldown.
    pub fn finish(&mut self, now: Instant) {
        self.in_flight = false;
        self.cooldown_until = Some(now + self.cooldown);
    }

    /// Drop all pending state, e.g. when the session ends.
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.cooldown_until = None;
    }
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
