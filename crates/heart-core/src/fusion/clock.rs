//! Time bases for the simulated sources and the live-analyzer budget.

/// Phase source for the sinusoidal simulations.
///
/// In streamed mode the host reports the playback position now and then; the
/// clock extrapolates from the last report while playing so seeks resync the
/// phase. Otherwise it runs on wall time since `origin_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackClock {
    streamed: bool,
    playing: bool,
    position_ms: f64,
    updated_at_ms: f64,
    origin_ms: f64,
}

impl PlaybackClock {
    pub fn new(origin_ms: f64) -> Self {
        Self {
            streamed: false,
            playing: false,
            position_ms: 0.0,
            updated_at_ms: origin_ms,
            origin_ms,
        }
    }

    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    pub fn phase_ms(&self, now_ms: f64) -> f64 {
        if self.streamed {
            let drift = if self.playing {
                (now_ms - self.updated_at_ms).max(0.0)
            } else {
                0.0
            };
            self.position_ms + drift
        } else {
            (now_ms - self.origin_ms).max(0.0)
        }
    }

    pub fn phase_sec(&self, now_ms: f64) -> f64 {
        self.phase_ms(now_ms) / 1000.0
    }

    pub fn set_position(&mut self, position_ms: f64, now_ms: f64) {
        if !position_ms.is_finite() {
            return;
        }
        self.position_ms = position_ms.max(0.0);
        self.updated_at_ms = now_ms;
    }

    pub fn set_playing(&mut self, playing: bool, now_ms: f64) {
        if playing == self.playing {
            return;
        }
        // Freeze the extrapolated position so pausing does not jump back.
        self.position_ms = self.phase_ms(now_ms);
        self.updated_at_ms = now_ms;
        self.playing = playing;
    }

    pub fn set_streamed(&mut self, streamed: bool, now_ms: f64) {
        if streamed == self.streamed {
            return;
        }
        self.position_ms = self.phase_ms(now_ms);
        self.updated_at_ms = now_ms;
        self.streamed = streamed;
        if !streamed {
            self.origin_ms = now_ms - self.position_ms;
        }
    }
}

/// Hard upper bound on how long a live analyzer may run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyzerBudget {
    pub started_at_ms: f64,
    pub limit_ms: f64,
}

impl AnalyzerBudget {
    pub fn new(started_at_ms: f64, limit_ms: f64) -> Self {
        Self {
            started_at_ms,
            limit_ms,
        }
    }

    pub fn expired(&self, now_ms: f64) -> bool {
        now_ms - self.started_at_ms >= self.limit_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_phase_counts_from_origin() {
        let clock = PlaybackClock::new(1_000.0);
        assert_eq!(clock.phase_ms(1_500.0), 500.0);
        assert_eq!(clock.phase_ms(900.0), 0.0);
    }

    #[test]
    fn streamed_phase_extrapolates_only_while_playing() {
        let mut clock = PlaybackClock::new(0.0);
        clock.set_streamed(true, 0.0);
        clock.set_position(10_000.0, 100.0);
        assert_eq!(clock.phase_ms(600.0), 10_000.0);
        clock.set_playing(true, 600.0);
        assert_eq!(clock.phase_ms(1_100.0), 10_500.0);
        // seek back
        clock.set_position(2_000.0, 1_100.0);
        assert_eq!(clock.phase_ms(1_200.0), 2_100.0);
        clock.set_playing(false, 1_200.0);
        assert_eq!(clock.phase_ms(5_000.0), 2_100.0);
    }

    #[test]
    fn leaving_streamed_mode_keeps_phase_continuous() {
        let mut clock = PlaybackClock::new(0.0);
        clock.set_streamed(true, 0.0);
        clock.set_position(42_000.0, 50.0);
        clock.set_streamed(false, 50.0);
        assert_eq!(clock.phase_ms(50.0), 42_000.0);
        assert_eq!(clock.phase_ms(1_050.0), 43_000.0);
    }

    #[test]
    fn budget_expires_at_limit() {
        let b = AnalyzerBudget::new(100.0, 1_000.0);
        assert!(!b.expired(1_099.0));
        assert!(b.expired(1_100.0));
    }
}
