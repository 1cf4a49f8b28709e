//! Eye-closure state machine

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::event::DrowsinessEvent;
use crate::observation::{EyeVerdict, Observation};
use crate::state::{DetectorState, Phase};
use crate::{DmsConfig, DmsError};

/// Drowsiness detector over a stream of eye observations.
///
/// Pure function of the observation stream: no clock, no I/O, no allocation
/// per frame. Not thread-safe; the owner of the frame callback drives it.
#[derive(Debug, Clone)]
pub struct DrowsinessDetector {
    config: DmsConfig,
    state: DetectorState,
    /// Observations rejected for running backwards in time
    rejected: u64,
}

impl DrowsinessDetector {
    /// Create a new detector with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        let unit = config.time_unit.suffix();
        debug!(
            "Creating drowsiness detector: threshold={}{}, grace={}{}, hysteresis={}{}",
            config.closed_threshold, unit, config.absence_grace, unit, config.clear_hysteresis, unit,
        );
        Ok(Self {
            config,
            state: DetectorState::default(),
            rejected: 0,
        })
    }

    /// Create a detector for observations stamped by `clock`.
    ///
    /// Fails when the clock ticks in a different unit than the thresholds.
    pub fn with_clock(config: DmsConfig, clock: &impl Clock) -> Result<Self, DmsError> {
        config.check_clock(clock)?;
        Self::new(config)
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> DetectorState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_alarming(&self) -> bool {
        self.state.phase == Phase::Alarming
    }

    /// Number of observations rejected for non-monotonic time
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Fold one observation into the state.
    ///
    /// A timestamp earlier than the previous one is rejected with
    /// [`DmsError::NonMonotonicTime`] and leaves the state untouched.
    pub fn ingest(&mut self, obs: Observation) -> Result<DrowsinessEvent, DmsError> {
        let t = obs.timestamp;
        if let Some(previous) = self.state.last_seen {
            if t < previous {
                self.rejected += 1;
                warn!("Rejected observation: time went backwards ({} -> {})", previous, t);
                return Err(DmsError::NonMonotonicTime {
                    previous,
                    current: t,
                });
            }
        }
        self.state.last_seen = Some(t);

        let verdict = obs.verdict();
        let event = match verdict {
            EyeVerdict::Open => self.on_open(t),
            EyeVerdict::Closed => self.on_closed(t),
            EyeVerdict::Unknown => self.on_unknown(t),
        };

        if verdict != EyeVerdict::Unknown {
            self.state.last_valid = Some(t);
        }

        Ok(event)
    }

    /// Return to `Idle` (on driver change).
    ///
    /// An active alarm is cleared at the last seen timestamp so alarm and
    /// clear events keep alternating.
    pub fn reset(&mut self) -> DrowsinessEvent {
        let event = match (self.state.phase, self.state.last_seen) {
            (Phase::Alarming, Some(at)) => {
                info!("Drowsiness alarm cleared by reset at {}", at);
                DrowsinessEvent::Cleared { at }
            }
            _ => DrowsinessEvent::None,
        };
        self.state.reset();
        event
    }

    fn on_open(&mut self, t: u64) -> DrowsinessEvent {
        match self.state.phase {
            Phase::Idle | Phase::Open => {
                self.enter_open(t);
                DrowsinessEvent::None
            }
            Phase::Closing => {
                debug!("Eyes reopened after {} before threshold", t - self.closed_since(t));
                self.enter_open(t);
                DrowsinessEvent::None
            }
            Phase::Alarming => {
                let pending = *self.state.pending_clear_since.get_or_insert(t);
                if t - pending >= self.config.clear_hysteresis {
                    info!("Drowsiness alarm cleared at {}", t);
                    self.enter_open(t);
                    DrowsinessEvent::Cleared { at: t }
                } else {
                    DrowsinessEvent::None
                }
            }
        }
    }

    fn on_closed(&mut self, t: u64) -> DrowsinessEvent {
        match self.state.phase {
            Phase::Idle | Phase::Open => {
                debug!("Both eyes closed at {}", t);
                self.state.phase = Phase::Closing;
                self.state.closed_since = Some(t);
                DrowsinessEvent::None
            }
            Phase::Closing => {
                let since = self.closed_since(t);
                if t - since >= self.config.closed_threshold {
                    info!("Drowsiness alarm: eyes closed since {} (now {})", since, t);
                    self.state.phase = Phase::Alarming;
                    DrowsinessEvent::DrowsyAlarm { since }
                } else {
                    DrowsinessEvent::None
                }
            }
            Phase::Alarming => {
                self.state.pending_clear_since = None;
                DrowsinessEvent::None
            }
        }
    }

    fn on_unknown(&mut self, t: u64) -> DrowsinessEvent {
        match self.state.phase {
            Phase::Idle => {}
            Phase::Open | Phase::Closing => {
                let last_valid = self.state.last_valid.unwrap_or(t);
                if t - last_valid > self.config.absence_grace {
                    debug!("Eye state unknown for {}, dropping to idle", t - last_valid);
                    self.state.phase = Phase::Idle;
                    self.state.closed_since = None;
                }
            }
            // Absence never silences an active alarm
            Phase::Alarming => self.state.pending_clear_since = None,
        }
        DrowsinessEvent::None
    }

    fn enter_open(&mut self, t: u64) {
        self.state.phase = Phase::Open;
        self.state.closed_since = None;
        self.state.pending_clear_since = None;
        self.state.last_both_eyes_open = Some(t);
    }

    fn closed_since(&self, t: u64) -> u64 {
        self.state.closed_since.unwrap_or(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::EyeState::{Absent, Closed, Open};
    use crate::observation::EyeState;

    fn detector() -> DrowsinessDetector {
        DrowsinessDetector::new(DmsConfig::default()).unwrap()
    }

    fn feed(detector: &mut DrowsinessDetector, frames: &[(u64, EyeState, EyeState)]) -> Vec<DrowsinessEvent> {
        frames
            .iter()
            .map(|&(t, l, r)| detector.ingest(Observation::new(t, l, r)).unwrap())
            .collect()
    }

    fn both(ts: impl IntoIterator<Item = u64>, state: EyeState) -> Vec<(u64, EyeState, EyeState)> {
        ts.into_iter().map(|t| (t, state, state)).collect()
    }

    fn non_none(events: &[DrowsinessEvent]) -> Vec<DrowsinessEvent> {
        events.iter().copied().filter(DrowsinessEvent::is_some).collect()
    }

    #[test]
    fn test_initial_state() {
        let d = detector();
        assert_eq!(d.snapshot(), DetectorState::default());
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn test_invalid_config() {
        let config = DmsConfig {
            closed_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(DrowsinessDetector::new(config), Err(DmsError::InvalidConfig(_))));
    }

    #[test]
    fn test_normal_blink() {
        let mut d = detector();
        let frames = [
            (0, Open, Open),
            (100, Closed, Closed),
            (200, Closed, Closed),
            (300, Closed, Closed),
            (400, Open, Open),
        ];
        let events = feed(&mut d, &frames);
        assert!(events.iter().all(|e| *e == DrowsinessEvent::None));
        assert_eq!(d.phase(), Phase::Open);
        assert_eq!(d.snapshot().last_both_eyes_open, Some(400));
    }

    #[test]
    fn test_microsleep_fires_and_clears() {
        let mut d = detector();
        let mut frames = both((0..=200).step_by(100), Open);
        frames.extend(both((300..=1800).step_by(100), Closed));
        frames.extend(both((1900..=2500).step_by(100), Open));

        let events = feed(&mut d, &frames);

        let alarm_at = frames.iter().zip(&events).find(|(_, e)| e.is_alarm()).map(|(f, _)| f.0);
        assert_eq!(alarm_at, Some(1300));
        let cleared_at = frames.iter().zip(&events).find(|(_, e)| e.is_cleared()).map(|(f, _)| f.0);
        assert_eq!(cleared_at, Some(2200));

        assert_eq!(
            non_none(&events),
            vec![
                DrowsinessEvent::DrowsyAlarm { since: 300 },
                DrowsinessEvent::Cleared { at: 2200 },
            ]
        );
        assert_eq!(d.phase(), Phase::Open);
    }

    #[test]
    fn test_alarm_fires_exactly_at_threshold() {
        let mut d = detector();
        assert_eq!(d.ingest(Observation::both(0, Closed)).unwrap(), DrowsinessEvent::None);
        assert_eq!(d.ingest(Observation::both(999, Closed)).unwrap(), DrowsinessEvent::None);
        assert_eq!(
            d.ingest(Observation::both(1000, Closed)).unwrap(),
            DrowsinessEvent::DrowsyAlarm { since: 0 }
        );
    }

    #[test]
    fn test_absence_during_closure_keeps_timer() {
        let mut d = detector();
        let frames = [
            (0, Closed, Closed),
            (200, Absent, Absent),
            (400, Closed, Closed),
            (1000, Closed, Closed),
        ];
        let events = feed(&mut d, &frames);
        assert_eq!(events[3], DrowsinessEvent::DrowsyAlarm { since: 0 });
    }

    #[test]
    fn test_long_absence_drops_timer() {
        let mut d = detector();
        let mut frames = vec![(0, Closed, Closed)];
        frames.extend(both((200..=800).step_by(200), Absent));
        frames.push((1000, Closed, Closed));

        let events = feed(&mut d, &frames);
        assert!(non_none(&events).is_empty());

        let state = d.snapshot();
        assert_eq!(state.phase, Phase::Closing);
        assert_eq!(state.closed_since, Some(1000));
    }

    #[test]
    fn test_absence_grace_boundary_is_inclusive() {
        let mut d = detector();
        d.ingest(Observation::both(0, Closed)).unwrap();
        d.ingest(Observation::absent(500)).unwrap();
        assert_eq!(d.phase(), Phase::Closing);
        d.ingest(Observation::absent(501)).unwrap();
        assert_eq!(d.phase(), Phase::Idle);
        assert_eq!(d.snapshot().closed_since, None);
    }

    #[test]
    fn test_wink_ignored() {
        let mut d = detector();
        let frames: Vec<_> = (0..=2000).step_by(100).map(|t| (t, Closed, Open)).collect();
        let events = feed(&mut d, &frames);
        assert!(non_none(&events).is_empty());
        assert_eq!(d.phase(), Phase::Idle);
    }

    #[test]
    fn test_hysteresis_resists_flicker() {
        let mut d = detector();
        let mut frames = both((3000..=4900).step_by(100), Closed);
        frames.push((5000, Open, Open));
        frames.push((5100, Closed, Closed));

        let events = feed(&mut d, &frames);
        assert_eq!(non_none(&events), vec![DrowsinessEvent::DrowsyAlarm { since: 3000 }]);
        assert!(d.is_alarming());
        assert_eq!(d.snapshot().pending_clear_since, None);
    }

    #[test]
    fn test_unknown_resets_pending_clear() {
        let mut d = detector();
        let mut frames = both([0, 1000], Closed);
        frames.extend(both([1100, 1300], Open));
        frames.push((1350, Open, Closed));
        frames.extend(both([1400, 1500, 1700], Open));

        let events = feed(&mut d, &frames);
        assert_eq!(
            non_none(&events),
            vec![
                DrowsinessEvent::DrowsyAlarm { since: 0 },
                DrowsinessEvent::Cleared { at: 1700 },
            ]
        );
    }

    #[test]
    fn test_absence_does_not_clear_alarm() {
        let mut d = detector();
        feed(&mut d, &both([0, 1000], Closed));
        feed(&mut d, &both((1100..=10_000).step_by(500), Absent));
        assert!(d.is_alarming());
        assert_eq!(d.snapshot().closed_since, Some(0));
    }

    #[test]
    fn test_zero_hysteresis_clears_on_first_open() {
        let config = DmsConfig {
            clear_hysteresis: 0,
            ..Default::default()
        };
        let mut d = DrowsinessDetector::new(config).unwrap();
        feed(&mut d, &both([0, 1000], Closed));
        assert_eq!(
            d.ingest(Observation::both(1100, Open)).unwrap(),
            DrowsinessEvent::Cleared { at: 1100 }
        );
    }

    #[test]
    fn test_open_window_expires_to_idle() {
        let mut d = detector();
        d.ingest(Observation::both(0, Open)).unwrap();
        d.ingest(Observation::absent(400)).unwrap();
        assert_eq!(d.phase(), Phase::Open);
        d.ingest(Observation::absent(600)).unwrap();
        assert_eq!(d.phase(), Phase::Idle);
        assert_eq!(d.snapshot().last_both_eyes_open, Some(0));
    }

    #[test]
    fn test_with_clock_checks_unit() {
        use crate::clock::{ManualClock, TimeUnit};

        let seconds = ManualClock::new(TimeUnit::Seconds);
        assert!(matches!(
            DrowsinessDetector::with_clock(DmsConfig::default(), &seconds),
            Err(DmsError::InvalidConfig(_))
        ));

        let d = DrowsinessDetector::with_clock(DmsConfig::for_unit(TimeUnit::Seconds), &seconds).unwrap();
        assert_eq!(d.config().closed_threshold, 1);
    }

    #[test]
    fn test_backward_time_rejected() {
        let mut d = detector();
        d.ingest(Observation::both(0, Closed)).unwrap();
        d.ingest(Observation::both(500, Closed)).unwrap();
        let before = d.snapshot();

        let err = d.ingest(Observation::both(400, Open)).unwrap_err();
        assert!(matches!(err, DmsError::NonMonotonicTime { previous: 500, current: 400 }));

        assert_eq!(d.snapshot(), before);
        assert_eq!(d.rejected(), 1);

        // Still usable
        assert_eq!(
            d.ingest(Observation::both(1000, Closed)).unwrap(),
            DrowsinessEvent::DrowsyAlarm { since: 0 }
        );
    }

    #[test]
    fn test_equal_timestamps_accepted() {
        let mut d = detector();
        d.ingest(Observation::both(100, Open)).unwrap();
        assert!(d.ingest(Observation::both(100, Closed)).is_ok());
        assert_eq!(d.snapshot().closed_since, Some(100));
    }

    #[test]
    fn test_reset_clears_active_alarm() {
        let mut d = detector();
        feed(&mut d, &both([0, 1200], Closed));
        assert!(d.is_alarming());

        assert_eq!(d.reset(), DrowsinessEvent::Cleared { at: 1200 });
        assert_eq!(d.phase(), Phase::Idle);
        assert_eq!(d.reset(), DrowsinessEvent::None);

        // Time guard survives the reset
        assert!(d.ingest(Observation::both(1100, Open)).is_err());
    }

    #[test]
    fn test_alarm_rearms_after_clear() {
        let mut d = detector();
        let mut frames = both([0, 1000], Closed);
        frames.extend(both([1100, 1400], Open));
        frames.extend(both([2000, 3000], Closed));
        let events = feed(&mut d, &frames);
        assert_eq!(
            non_none(&events),
            vec![
                DrowsinessEvent::DrowsyAlarm { since: 0 },
                DrowsinessEvent::Cleared { at: 1400 },
                DrowsinessEvent::DrowsyAlarm { since: 2000 },
            ]
        );
    }
}
