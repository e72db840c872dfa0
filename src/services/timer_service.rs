use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// What the ticker reports back; `generation` identifies the arming it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick from a disarmed or superseded arming.
    Stale,
    Running { remaining: u32 },
    Expired,
}

#[derive(Debug)]
struct Armed {
    generation: u64,
    question_index: usize,
    time_limit: u32,
    remaining_at_arm: u32,
    armed_at: Instant,
    cancel: CancellationToken,
}

impl Armed {
    fn elapsed_secs(&self, now: Instant) -> u32 {
        now.saturating_duration_since(self.armed_at)
            .as_secs()
            .min(u32::MAX as u64) as u32
    }

    fn remaining(&self, now: Instant) -> u32 {
        self.remaining_at_arm.saturating_sub(self.elapsed_secs(now))
    }
}

/// Countdown for the active question.
///
/// Remaining time is derived from the wall-clock time since arming, never from
/// the number of ticks received, so a late, duplicated or coalesced tick cannot
/// decrement twice. Expiry is reported once per arming; the arming is dropped at
/// the same moment.
#[derive(Debug, Default)]
pub struct Countdown {
    armed: Option<Armed>,
    generation: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown with `remaining` seconds left out of `time_limit` and
    /// returns the token the ticker must watch. Any previous arming is cancelled.
    pub fn arm(
        &mut self,
        question_index: usize,
        time_limit: u32,
        remaining: u32,
        now: Instant,
    ) -> (TimerTick, CancellationToken) {
        self.disarm(now);
        self.generation += 1;
        let cancel = CancellationToken::new();
        self.armed = Some(Armed {
            generation: self.generation,
            question_index,
            time_limit,
            remaining_at_arm: remaining.min(time_limit),
            armed_at: now,
            cancel: cancel.clone(),
        });
        tracing::debug!(question_index, remaining, "Countdown armed");
        (
            TimerTick {
                generation: self.generation,
            },
            cancel,
        )
    }

    /// Cancels the ticker without reporting expiry. Returns the remaining time
    /// at the moment of disarming, or `None` if nothing was armed.
    pub fn disarm(&mut self, now: Instant) -> Option<u32> {
        let armed = self.armed.take()?;
        armed.cancel.cancel();
        let remaining = armed.remaining(now);
        tracing::debug!(question_index = armed.question_index, remaining, "Countdown disarmed");
        Some(remaining)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn remaining(&self, now: Instant) -> Option<u32> {
        self.armed.as_ref().map(|a| a.remaining(now))
    }

    /// Seconds spent on the question so far, including time consumed before a
    /// pause or restart, clamped to the limit.
    pub fn time_used(&self, now: Instant) -> Option<u32> {
        self.armed.as_ref().map(|a| {
            let consumed_before = a.time_limit - a.remaining_at_arm;
            consumed_before
                .saturating_add(a.elapsed_secs(now))
                .min(a.time_limit)
        })
    }

    pub fn on_tick(&mut self, tick: TimerTick, now: Instant) -> TickOutcome {
        let remaining = match &self.armed {
            Some(armed) if armed.generation == tick.generation => armed.remaining(now),
            _ => return TickOutcome::Stale,
        };

        if remaining == 0 {
            if let Some(armed) = self.armed.take() {
                armed.cancel.cancel();
            }
            TickOutcome::Expired
        } else {
            TickOutcome::Running { remaining }
        }
    }
}

/// Sends a tick every second until `cancel` fires or `emit` reports that the
/// receiving side is gone.
pub fn spawn_ticker<F>(tick: TimerTick, cancel: CancellationToken, emit: F)
where
    F: Fn(TimerTick) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !emit(tick) {
                        break;
                    }
                }
            }
        }
    });
}
