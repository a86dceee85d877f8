//! Reference autonomous routine: forward six feet, turn right, then a
//! diagonal move, each step waiting on the drive's completion event.

use mecha_common::consts::SM_STATE_STARTED;
use tracing::{debug, info};

use crate::control::drive::DriveTarget;
use crate::event::Event;
use crate::state::machine::StateMachine;

/// What an autonomous routine needs from the drivetrain.
pub trait DriveCommands {
    fn drive_set_target(&mut self, target: DriveTarget);
    fn drive_stop(&mut self);
}

const DRIVE_FORWARD: u32 = SM_STATE_STARTED;
const TURN_RIGHT: u32 = SM_STATE_STARTED + 1;
const DRIVE_DIAGONAL: u32 = SM_STATE_STARTED + 2;
const DONE: u32 = SM_STATE_STARTED + 3;

/// Forward distance of the first leg, in inches.
const FORWARD_DISTANCE: f64 = 72.0;
const TURN_ANGLE: f64 = 90.0;
const DIAGONAL_X: f64 = 3.0;
const DIAGONAL_Y: f64 = 4.0;

pub struct Autonomous {
    drive_event: Event,
}

impl Default for Autonomous {
    fn default() -> Self {
        Self::new()
    }
}

impl Autonomous {
    pub fn new() -> Self {
        Self {
            drive_event: Event::new(),
        }
    }

    /// The event every drive step signals.
    pub fn drive_event(&self) -> &Event {
        &self.drive_event
    }

    pub fn start(&mut self, sm: &mut StateMachine) {
        sm.start();
        info!("autonomous started");
    }

    pub fn stop(&mut self, sm: &mut StateMachine) {
        sm.stop();
        info!("autonomous stopped");
    }

    /// Act on the current state if the machine is ready.
    pub fn periodic(&mut self, sm: &mut StateMachine, drive: &mut dyn DriveCommands) {
        if !sm.is_ready() {
            return;
        }
        let state = sm.current_state();
        debug!(step = state.wrapping_sub(SM_STATE_STARTED), "autonomous step");
        match state {
            DRIVE_FORWARD => {
                self.drive_to(drive, DriveTarget::new(0.0, FORWARD_DISTANCE, 0.0));
                sm.wait_for_single_event(&self.drive_event, state + 1, 0);
            }
            TURN_RIGHT => {
                self.drive_to(drive, DriveTarget::new(0.0, 0.0, TURN_ANGLE));
                sm.wait_for_single_event(&self.drive_event, state + 1, 0);
            }
            DRIVE_DIAGONAL => {
                self.drive_to(
                    drive,
                    DriveTarget::new(DIAGONAL_X, DIAGONAL_Y, 0.0).timeout_ms(0),
                );
                sm.wait_for_single_event(&self.drive_event, state + 1, 0);
            }
            _ => {
                if state == DONE {
                    drive.drive_stop();
                }
                sm.stop();
                info!("autonomous sequence finished");
            }
        }
    }

    fn drive_to(&self, drive: &mut dyn DriveCommands, target: DriveTarget) {
        drive.drive_set_target(target.notify(&self.drive_event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ManualClock;
    use std::rc::Rc;

    #[derive(Default)]
    struct NullDrive {
        targets: usize,
        stops: usize,
        last_event: Option<Event>,
    }

    impl DriveCommands for NullDrive {
        fn drive_set_target(&mut self, target: DriveTarget) {
            self.targets += 1;
            self.last_event = target.event;
        }
        fn drive_stop(&mut self) {
            self.stops += 1;
        }
    }

    #[test]
    fn waits_while_drive_is_busy() {
        let mut sm = StateMachine::new("auto", Rc::new(ManualClock::new(0)));
        let mut auto = Autonomous::new();
        let mut drive = NullDrive::default();

        auto.start(&mut sm);
        auto.periodic(&mut sm, &mut drive);
        auto.periodic(&mut sm, &mut drive);
        sm.evaluate();
        auto.periodic(&mut sm, &mut drive);

        assert_eq!(drive.targets, 1);
        assert_eq!(sm.current_state(), DRIVE_FORWARD);
    }

    #[test]
    fn unknown_state_stops_without_touching_drive() {
        let mut sm = StateMachine::new("auto", Rc::new(ManualClock::new(0)));
        let mut auto = Autonomous::new();
        let mut drive = NullDrive::default();

        sm.start();
        sm.wait_for_events(&[], 42, 0);
        sm.evaluate();
        auto.periodic(&mut sm, &mut drive);

        assert_eq!(drive.stops, 0);
        assert!(!sm.is_ready());
        assert!(!sm.is_running());
    }

    #[test]
    fn drive_completion_signals_the_routine_event() {
        let mut sm = StateMachine::new("auto", Rc::new(ManualClock::new(0)));
        let mut auto = Autonomous::new();
        let mut drive = NullDrive::default();

        auto.start(&mut sm);
        auto.periodic(&mut sm, &mut drive);
        assert!(!auto.drive_event().is_signaled());

        let done = drive.last_event.take().expect("target carries an event");
        done.set();
        assert!(auto.drive_event().is_signaled());

        sm.evaluate();
        assert!(sm.is_ready());
        assert_eq!(sm.current_state(), TURN_RIGHT);
    }
}
