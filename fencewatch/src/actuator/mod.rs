//! Alarm actuator control.
//!
//! The alarm is a buzzer on a GPIO pin of a separate host, switched through
//! that host's pin-control web API. [`ActuatorController`] owns the ON/OFF
//! state and decides when to send commands; [`ActuatorService`] is the
//! capability that actually sends them.

mod controller;
mod service;

pub use controller::{ActuatorController, ActuatorState, ActuatorTransition, DEFAULT_AUTO_OFF};
pub use service::{
    ActuatorError, ActuatorService, HttpActuator, DEFAULT_ACTUATOR_TIMEOUT, DEFAULT_OUTPUT_ID,
};
