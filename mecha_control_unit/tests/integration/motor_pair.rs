//! Paired PID motors under the scheduler: sync-group writes, completion
//! events and stop-mode cancellation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mecha_common::hal::MotorOutput;
use mecha_common::robot::config::PidConfig;
use mecha_common::robot::state::RobotMode;
use mecha_control_unit::control::kinematics::{PidAxis, PidInputSource};
use mecha_control_unit::control::motor::{MotorOptions, PidMotor};
use mecha_control_unit::control::pid::PidController;
use mecha_control_unit::event::{Event, ManualClock};
use mecha_control_unit::task::{Scheduler, TaskHandle};

/// Motor that stages writes per sync group and applies them together.
struct StagedMotor {
    staged: Rc<Cell<Option<f64>>>,
    applied: Rc<Cell<f64>>,
    bus: Rc<RefCell<Vec<Rc<Cell<Option<f64>>>>>>,
    bus_applied: Rc<RefCell<Vec<Rc<Cell<f64>>>>>,
}

impl MotorOutput for StagedMotor {
    fn set_output(&mut self, value: f64, sync_group: u8) {
        if sync_group == 0 {
            self.applied.set(value);
        } else {
            self.staged.set(Some(value));
        }
    }

    fn apply_sync_group(&mut self, _sync_group: u8) {
        for (staged, applied) in self.bus.borrow().iter().zip(self.bus_applied.borrow().iter()) {
            if let Some(v) = staged.take() {
                applied.set(v);
            }
        }
    }

    fn output(&self) -> f64 {
        self.applied.get()
    }
}

/// Lift whose height follows the applied output of the lead motor.
struct Lift(Rc<Cell<f64>>);

impl PidInputSource for Lift {
    fn pid_input(&self, _axis: PidAxis) -> f64 {
        self.0.get()
    }
}

struct Rig {
    motor: Rc<RefCell<PidMotor>>,
    scheduler: Scheduler,
    clock: Rc<ManualClock>,
    height: Rc<Cell<f64>>,
    applied: [Rc<Cell<f64>>; 2],
    staged: [Rc<Cell<Option<f64>>>; 2],
}

fn rig() -> Rig {
    let clock = Rc::new(ManualClock::new(0));
    let height = Rc::new(Cell::new(0.0));
    let staged: [Rc<Cell<Option<f64>>>; 2] = std::array::from_fn(|_| Rc::new(Cell::new(None)));
    let applied: [Rc<Cell<f64>>; 2] = std::array::from_fn(|_| Rc::new(Cell::new(0.0)));
    let bus = Rc::new(RefCell::new(staged.to_vec()));
    let bus_applied = Rc::new(RefCell::new(applied.to_vec()));
    let motor = |i: usize| StagedMotor {
        staged: staged[i].clone(),
        applied: applied[i].clone(),
        bus: bus.clone(),
        bus_applied: bus_applied.clone(),
    };

    let cfg = PidConfig {
        kp: 0.1,
        tolerance: 0.2,
        settling_ms: 100,
        ..PidConfig::drive()
    };
    let pid = PidController::new("lift", &cfg, clock.clone());
    let lift = PidMotor::new(
        "lift",
        pid,
        PidAxis::Aux(0),
        Box::new(Lift(height.clone())),
        Box::new(motor(0)),
        MotorOptions::default(),
        clock.clone(),
    )
    .with_follower(Box::new(motor(1)), 1);

    let lift = Rc::new(RefCell::new(lift));
    let mut scheduler = Scheduler::new();
    scheduler
        .register("lift", PidMotor::PHASES, lift.clone() as TaskHandle)
        .unwrap();

    Rig {
        motor: lift,
        scheduler,
        clock,
        height,
        applied,
        staged,
    }
}

impl Rig {
    fn tick(&self) {
        self.clock.advance(100);
        self.scheduler.post_periodic(RobotMode::Autonomous);
        self.height
            .set(self.height.get() + self.applied[0].get() * 5.0);
    }
}

#[test]
fn pair_is_applied_together() {
    let r = rig();
    r.motor.borrow_mut().set_target(10.0, true, None, 0);
    r.tick();

    assert_eq!(r.applied[0].get(), 1.0);
    assert_eq!(r.applied[1].get(), 1.0);
    assert!(r.staged.iter().all(|s| s.get().is_none()));
}

#[test]
fn reaches_setpoint_and_signals_once() {
    let r = rig();
    let done = Event::new();
    r.motor.borrow_mut().set_target(10.0, true, Some(&done), 0);

    let mut ticks = 0;
    while !done.is_signaled() && ticks < 100 {
        r.tick();
        ticks += 1;
    }
    assert!(done.is_signaled());
    assert!((r.height.get() - 10.0).abs() <= 0.2);
    assert!(!r.motor.borrow().is_active());
    assert_eq!(r.applied.each_ref().map(|a| a.get()), [0.0, 0.0]);
}

#[test]
fn stop_mode_cancels_without_signaling() {
    let r = rig();
    let done = Event::new();
    r.motor.borrow_mut().set_target(10.0, true, Some(&done), 0);
    r.tick();

    r.scheduler.stop_mode(RobotMode::Autonomous);
    assert!(!r.motor.borrow().is_active());
    assert!(!done.is_signaled());
    assert_eq!(r.applied[0].get(), 0.0);
    assert_eq!(r.applied[1].get(), 0.0);

    r.tick();
    assert!(!done.is_signaled());
}
