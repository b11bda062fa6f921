//! The fused control vector and the last-value hand-off between audio
//! sources and the render loop.

use crate::constants::{IDLE_OVERALL, SIMULATION_INTERVAL_MS, TIMBRAL_INTERVAL_MS};
use std::cell::Cell;
use std::fmt;

/// Per-tick audio description. Levels are in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlVector {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub overall: f32,
    pub beat: bool,
}

impl ControlVector {
    pub fn new(bass: f32, mid: f32, treble: f32, overall: f32, beat: bool) -> Self {
        Self {
            bass: unit(bass),
            mid: unit(mid),
            treble: unit(treble),
            overall: unit(overall),
            beat,
        }
    }

    /// No audio contribution at all.
    pub const fn silent() -> Self {
        Self {
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            overall: 0.0,
            beat: false,
        }
    }

    /// Substituted when nothing has been published yet.
    pub const fn idle() -> Self {
        Self {
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            overall: IDLE_OVERALL,
            beat: false,
        }
    }

    #[inline]
    pub fn beat_level(&self) -> f32 {
        if self.beat {
            1.0
        } else {
            0.0
        }
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Upstream producers, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    LiveSpectral,
    Timbral,
    TrackSimulation,
    TimeSimulation,
}

/// How often a source publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    EveryFrame,
    IntervalMs(u32),
}

impl Cadence {
    /// Timer period for interval producers; `None` when pulled per frame.
    pub fn interval_ms(self) -> Option<u32> {
        match self {
            Cadence::EveryFrame => None,
            Cadence::IntervalMs(ms) => Some(ms),
        }
    }
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::LiveSpectral,
        SourceKind::Timbral,
        SourceKind::TrackSimulation,
        SourceKind::TimeSimulation,
    ];

    pub fn cadence(self) -> Cadence {
        match self {
            SourceKind::LiveSpectral => Cadence::EveryFrame,
            SourceKind::Timbral => Cadence::IntervalMs(TIMBRAL_INTERVAL_MS),
            SourceKind::TrackSimulation | SourceKind::TimeSimulation => {
                Cadence::IntervalMs(SIMULATION_INTERVAL_MS)
            }
        }
    }

    pub fn status(self) -> SourceStatus {
        match self {
            SourceKind::LiveSpectral => SourceStatus::LocalFileAnalysis,
            SourceKind::Timbral => SourceStatus::RealAnalysis,
            SourceKind::TrackSimulation => SourceStatus::VendorSimulation,
            SourceKind::TimeSimulation => SourceStatus::Loading,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceKind::LiveSpectral => "live-spectral",
            SourceKind::Timbral => "timbral",
            SourceKind::TrackSimulation => "track-simulation",
            SourceKind::TimeSimulation => "time-simulation",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only projection of the active source for UI indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    RealAnalysis,
    VendorSimulation,
    LocalFileAnalysis,
    Loading,
}

impl SourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStatus::RealAnalysis => "real-analysis",
            SourceStatus::VendorSimulation => "vendor-simulation",
            SourceStatus::LocalFileAnalysis => "local-file-analysis",
            SourceStatus::Loading => "loading",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Publication {
    pub source: SourceKind,
    pub vector: ControlVector,
    pub published_at_ms: f64,
}

/// Single shared slot holding the most recent vector.
///
/// The slot is a `Cell` over a `Copy` value, so a publish always swaps the
/// whole vector and a reader can never see fields from two writes. Only the
/// current owner may publish; a source that lost ownership is ignored.
#[derive(Debug)]
pub struct ControlBus {
    owner: Cell<SourceKind>,
    slot: Cell<Option<Publication>>,
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::new(SourceKind::TimeSimulation)
    }
}

impl ControlBus {
    pub fn new(owner: SourceKind) -> Self {
        Self {
            owner: Cell::new(owner),
            slot: Cell::new(None),
        }
    }

    pub fn owner(&self) -> SourceKind {
        self.owner.get()
    }

    /// Transfer write access. The last published vector stays readable
    /// until the new owner publishes.
    pub fn hand_over(&self, next: SourceKind) {
        self.owner.set(next);
    }

    pub fn publish(&self, source: SourceKind, vector: ControlVector, now_ms: f64) -> bool {
        if source != self.owner.get() {
            log::debug!(
                "[bus] dropped stale publication from {} (owner {})",
                source,
                self.owner.get()
            );
            return false;
        }
        self.slot.set(Some(Publication {
            source,
            vector,
            published_at_ms: now_ms,
        }));
        true
    }

    pub fn last(&self) -> Option<Publication> {
        self.slot.get()
    }

    pub fn latest(&self) -> ControlVector {
        self.slot
            .get()
            .map(|p| p.vector)
            .unwrap_or_else(ControlVector::idle)
    }
}
