//! Debounced alarm state machine.
//!
//! # State Machine
//!
//! ```text
//! Off --[alert in range]----------------------> On (activated_at = now)
//! On  --[alert in range]----------------------> On (activated_at re-armed)
//! On  --[now - activated_at >= auto_off]------> Off
//! *   --[force_off (loop start / shutdown)]---> Off
//! ```
//!
//! Local state only changes after the actuator service confirms a command.
//! A failed command leaves the tracked state as it was, so it can drift from
//! the physical output until the next successful command. Auto-off retries
//! naturally on the next poll.

use std::time::{Duration, Instant};

use tracing::info;

use super::service::{ActuatorError, ActuatorService};

/// Default minimum time the alarm stays on.
pub const DEFAULT_AUTO_OFF: Duration = Duration::from_secs(1);

/// Tracked alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Off,
    On { activated_at: Instant },
}

impl ActuatorState {
    pub fn is_on(&self) -> bool {
        matches!(self, ActuatorState::On { .. })
    }
}

/// A confirmed change of alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorTransition {
    /// Off to on.
    SwitchedOn,
    /// Already on; activation time pushed forward.
    Rearmed,
    /// On to off (or off confirmed).
    SwitchedOff,
}

/// Drives one alarm output through an [`ActuatorService`].
pub struct ActuatorController {
    service: Box<dyn ActuatorService>,
    output_id: u8,
    auto_off: Duration,
    state: ActuatorState,
}

impl ActuatorController {
    pub fn new(service: Box<dyn ActuatorService>, output_id: u8, auto_off: Duration) -> Self {
        Self {
            service,
            output_id,
            auto_off,
            state: ActuatorState::Off,
        }
    }

    /// Current tracked state.
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Command the output off regardless of tracked state.
    ///
    /// Used at loop start and on shutdown.
    pub fn force_off(&mut self) -> Result<ActuatorTransition, ActuatorError> {
        self.service.set_output(self.output_id, false)?;
        self.state = ActuatorState::Off;
        info!(output = self.output_id, "Alarm OFF (forced)");
        Ok(ActuatorTransition::SwitchedOff)
    }

    /// Switch off if the alarm has been on for at least the auto-off
    /// duration. Returns `Ok(None)` when nothing was due.
    pub fn poll_auto_off(
        &mut self,
        now: Instant,
    ) -> Result<Option<ActuatorTransition>, ActuatorError> {
        let ActuatorState::On { activated_at } = self.state else {
            return Ok(None);
        };

        if now.saturating_duration_since(activated_at) < self.auto_off {
            return Ok(None);
        }

        self.service.set_output(self.output_id, false)?;
        self.state = ActuatorState::Off;
        info!(
            output = self.output_id,
            on_for_ms = now.saturating_duration_since(activated_at).as_millis() as u64,
            "Alarm OFF"
        );
        Ok(Some(ActuatorTransition::SwitchedOff))
    }

    /// Switch the alarm on (or re-arm it) at `now`.
    ///
    /// The caller is responsible for the alert and proximity conditions.
    pub fn trigger(&mut self, now: Instant) -> Result<ActuatorTransition, ActuatorError> {
        self.service.set_output(self.output_id, true)?;

        let transition = if self.state.is_on() {
            ActuatorTransition::Rearmed
        } else {
            info!(output = self.output_id, "Alarm ON");
            ActuatorTransition::SwitchedOn
        };
        self.state = ActuatorState::On { activated_at: now };
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use std::sync::{Arc, Mutex};

    /// Records commands and fails while `fail` is set.
    #[derive(Clone, Default)]
    struct FakeService {
        commands: Arc<Mutex<Vec<(u8, bool)>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl FakeService {
        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn commands(&self) -> Vec<(u8, bool)> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl ActuatorService for FakeService {
        fn set_output(&self, output_id: u8, on: bool) -> Result<(), ActuatorError> {
            self.commands.lock().unwrap().push((output_id, on));
            if *self.fail.lock().unwrap() {
                return Err(ActuatorError::Request {
                    output_id,
                    on,
                    source: HttpError::Timeout {
                        url: "fake".to_string(),
                    },
                });
            }
            Ok(())
        }
    }

    fn controller() -> (ActuatorController, FakeService) {
        let service = FakeService::default();
        let controller = ActuatorController::new(Box::new(service.clone()), 17, DEFAULT_AUTO_OFF);
        (controller, service)
    }

    #[test]
    fn test_initial_state_off() {
        let (c, _) = controller();
        assert_eq!(c.state(), ActuatorState::Off);
        assert!(!c.is_on());
    }

    #[test]
    fn test_trigger_switches_on() {
        let (mut c, service) = controller();
        let t0 = Instant::now();

        assert_eq!(c.trigger(t0).unwrap(), ActuatorTransition::SwitchedOn);
        assert_eq!(c.state(), ActuatorState::On { activated_at: t0 });
        assert_eq!(service.commands(), vec![(17, true)]);
    }

    #[test]
    fn test_auto_off_after_duration() {
        let (mut c, service) = controller();
        let t0 = Instant::now();
        c.trigger(t0).unwrap();

        assert_eq!(c.poll_auto_off(t0 + Duration::from_millis(999)).unwrap(), None);
        assert!(c.is_on());

        assert_eq!(
            c.poll_auto_off(t0 + Duration::from_secs(1)).unwrap(),
            Some(ActuatorTransition::SwitchedOff)
        );
        assert_eq!(c.state(), ActuatorState::Off);
        assert_eq!(service.commands(), vec![(17, true), (17, false)]);
    }

    #[test]
    fn test_auto_off_noop_when_off() {
        let (mut c, service) = controller();
        assert_eq!(
            c.poll_auto_off(Instant::now() + Duration::from_secs(60)).unwrap(),
            None
        );
        assert!(service.commands().is_empty());
    }

    #[test]
    fn test_retrigger_rearms() {
        let (mut c, _) = controller();
        let t0 = Instant::now();
        c.trigger(t0).unwrap();

        let t1 = t0 + Duration::from_millis(800);
        assert_eq!(c.trigger(t1).unwrap(), ActuatorTransition::Rearmed);

        // Would have expired relative to t0, not relative to t1.
        assert_eq!(c.poll_auto_off(t0 + Duration::from_millis(1200)).unwrap(), None);
        assert!(c
            .poll_auto_off(t1 + Duration::from_secs(1))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_failed_trigger_keeps_state() {
        let (mut c, service) = controller();
        service.set_failing(true);

        assert!(c.trigger(Instant::now()).is_err());
        assert_eq!(c.state(), ActuatorState::Off);
    }

    #[test]
    fn test_failed_auto_off_stays_on_and_retries() {
        let (mut c, service) = controller();
        let t0 = Instant::now();
        c.trigger(t0).unwrap();

        service.set_failing(true);
        let later = t0 + Duration::from_secs(2);
        assert!(c.poll_auto_off(later).is_err());
        assert!(c.is_on());

        service.set_failing(false);
        assert_eq!(
            c.poll_auto_off(later).unwrap(),
            Some(ActuatorTransition::SwitchedOff)
        );
        assert_eq!(
            service.commands(),
            vec![(17, true), (17, false), (17, false)]
        );
    }

    #[test]
    fn test_force_off_always_sends() {
        let (mut c, service) = controller();
        assert_eq!(c.force_off().unwrap(), ActuatorTransition::SwitchedOff);
        assert_eq!(service.commands(), vec![(17, false)]);

        c.trigger(Instant::now()).unwrap();
        c.force_off().unwrap();
        assert!(!c.is_on());
    }

    #[test]
    fn test_failed_force_off_keeps_on() {
        let (mut c, service) = controller();
        c.trigger(Instant::now()).unwrap();
        service.set_failing(true);
        assert!(c.force_off().is_err());
        assert!(c.is_on());
    }
}
