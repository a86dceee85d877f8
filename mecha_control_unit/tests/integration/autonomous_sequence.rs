//! Reference autonomous routine against a recording drivetrain.

use std::rc::Rc;

use mecha_common::consts::SM_STATE_STARTED;
use mecha_control_unit::control::drive::DriveTarget;
use mecha_control_unit::event::{Event, ManualClock};
use mecha_control_unit::robot::autonomous::{Autonomous, DriveCommands};
use mecha_control_unit::state::machine::StateMachine;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetTarget {
        dx: f64,
        dy: f64,
        d_angle: f64,
        stop_on_target: bool,
        timeout_ms: u64,
    },
    Stop,
}

/// Records every call and completes each move `busy_ticks` ticks later.
struct RecordingDrive {
    calls: Vec<Call>,
    pending: Option<(Event, u32)>,
    busy_ticks: u32,
}

impl RecordingDrive {
    fn new(busy_ticks: u32) -> Self {
        Self {
            calls: Vec::new(),
            pending: None,
            busy_ticks,
        }
    }

    /// Post-periodic stand-in.
    fn update(&mut self) {
        if let Some((event, remaining)) = &mut self.pending {
            if *remaining == 0 {
                event.set();
                self.pending = None;
            } else {
                *remaining -= 1;
            }
        }
    }
}

impl DriveCommands for RecordingDrive {
    fn drive_set_target(&mut self, target: DriveTarget) {
        self.calls.push(Call::SetTarget {
            dx: target.dx,
            dy: target.dy,
            d_angle: target.d_angle,
            stop_on_target: target.stop_on_target,
            timeout_ms: target.timeout_ms,
        });
        self.pending = target.event.map(|ev| (ev, self.busy_ticks));
    }

    fn drive_stop(&mut self) {
        self.calls.push(Call::Stop);
        self.pending = None;
    }
}

/// Tick until the machine stops, returning each state acted on.
fn run_routine(drive: &mut RecordingDrive) -> (Vec<u32>, StateMachine) {
    let clock = Rc::new(ManualClock::new(0));
    let mut sm = StateMachine::new("auto", clock.clone());
    let mut auto = Autonomous::new();
    let mut visited = Vec::new();

    auto.start(&mut sm);
    for _ in 0..100 {
        clock.advance(100);
        sm.evaluate();
        if sm.is_ready() {
            visited.push(sm.current_state());
        }
        auto.periodic(&mut sm, drive);
        drive.update();
        if !sm.is_running() {
            break;
        }
    }
    (visited, sm)
}

fn set_target(dx: f64, dy: f64, d_angle: f64) -> Call {
    Call::SetTarget {
        dx,
        dy,
        d_angle,
        stop_on_target: true,
        timeout_ms: 0,
    }
}

#[test]
fn visits_states_in_order_with_literal_targets() {
    let mut drive = RecordingDrive::new(3);
    let (visited, sm) = run_routine(&mut drive);

    assert_eq!(
        visited,
        [
            SM_STATE_STARTED,
            SM_STATE_STARTED + 1,
            SM_STATE_STARTED + 2,
            SM_STATE_STARTED + 3,
        ]
    );
    assert_eq!(
        drive.calls,
        [
            set_target(0.0, 72.0, 0.0),
            set_target(0.0, 0.0, 90.0),
            set_target(3.0, 4.0, 0.0),
            Call::Stop,
        ]
    );
    assert!(!sm.is_ready());
    assert!(!sm.is_running());
}

#[test]
fn instant_completion_still_advances_one_state_per_tick() {
    let mut drive = RecordingDrive::new(0);
    let (visited, sm) = run_routine(&mut drive);

    assert_eq!(visited.len(), 4);
    assert!(visited.windows(2).all(|w| w[1] == w[0] + 1));
    assert_eq!(drive.calls.len(), 4);
    assert!(!sm.is_ready());
}

#[test]
fn stalled_drive_holds_the_first_state() {
    let mut drive = RecordingDrive::new(u32::MAX);
    let (visited, sm) = run_routine(&mut drive);

    assert_eq!(visited, [SM_STATE_STARTED]);
    assert_eq!(drive.calls.len(), 1);
    assert_eq!(sm.current_state(), SM_STATE_STARTED);
    assert!(sm.is_running());
}

#[test]
fn stopping_mid_sequence_leaves_machine_idle() {
    let clock = Rc::new(ManualClock::new(0));
    let mut sm = StateMachine::new("auto", clock.clone());
    let mut auto = Autonomous::new();
    let mut drive = RecordingDrive::new(0);

    auto.start(&mut sm);
    auto.periodic(&mut sm, &mut drive);
    auto.stop(&mut sm);
    auto.stop(&mut sm);

    drive.update();
    sm.evaluate();
    assert!(!sm.is_ready());
    assert_eq!(sm.current_state(), 0);
}
