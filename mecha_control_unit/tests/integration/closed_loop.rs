//! Full robot against the simulated chassis: scheduler, drive base, state
//! machine and mode handlers running together tick by tick.

use std::rc::Rc;

use mecha_common::hal::StickAxis;
use mecha_common::robot::config::{LineFollowerConfig, RobotConfig};
use mecha_common::robot::state::RobotMode;
use mecha_control_unit::control::drive::LineTarget;
use mecha_control_unit::cycle::CycleRunner;
use mecha_control_unit::event::{Event, ManualClock};
use mecha_control_unit::robot::Robot;
use mecha_control_unit::task::Scheduler;

use super::{SimRig, sim_config};

const PERIOD_MS: u64 = 100;

fn build(config: &RobotConfig) -> (CycleRunner<Robot>, SimRig, Rc<ManualClock>) {
    let rig = SimRig::new();
    let clock = Rc::new(ManualClock::new(0));
    let mut scheduler = Scheduler::new();
    let robot = Robot::build(config, rig.hardware(), clock.clone(), &mut scheduler).unwrap();
    (
        CycleRunner::new(scheduler, robot, config.cycle_time_ms),
        rig,
        clock,
    )
}

fn tick(runner: &mut CycleRunner<Robot>, rig: &SimRig, clock: &ManualClock) {
    clock.advance(PERIOD_MS);
    runner.tick();
    rig.step();
}

#[test]
fn registers_tasks_in_phase_order() {
    let (runner, _rig, _clock) = build(&sim_config());
    let names: Vec<&str> = runner.scheduler().task_names().collect();
    assert_eq!(names, ["left_buttons", "digital_in", "auto_sm", "drive_base"]);
}

#[test]
fn autonomous_routine_completes_on_the_plant() {
    let (mut runner, rig, clock) = build(&sim_config());
    runner.set_mode(RobotMode::Autonomous);

    let mut ticks = 0;
    while runner.handler().auto_sm().borrow().is_running() && ticks < 400 {
        tick(&mut runner, &rig, &clock);
        ticks += 1;
    }

    let robot = runner.handler();
    assert!(!robot.auto_sm().borrow().is_running(), "routine did not finish");
    assert!(!robot.auto_sm().borrow().is_ready());

    let drive = robot.drive_base().borrow();
    assert!(!drive.pid_drive().is_active());
    assert!(rig.wheel_outputs().iter().all(|w| *w == 0.0));

    // Turned right a quarter turn, within the turn tolerance.
    assert!((rig.gyro.get() - 90.0).abs() <= 0.5, "heading {}", rig.gyro.get());
}

#[test]
fn leaving_autonomous_stops_the_drive() {
    let (mut runner, rig, clock) = build(&sim_config());
    runner.set_mode(RobotMode::Autonomous);
    for _ in 0..3 {
        tick(&mut runner, &rig, &clock);
    }
    assert!(runner.handler().drive_base().borrow().pid_drive().is_active());
    assert!(rig.wheel_outputs().iter().any(|w| *w != 0.0));

    runner.set_mode(RobotMode::Disabled);
    let robot = runner.handler();
    assert!(!robot.drive_base().borrow().pid_drive().is_active());
    assert!(!robot.auto_sm().borrow().is_running());
    assert!(rig.wheel_outputs().iter().all(|w| *w == 0.0));
}

#[test]
fn entering_a_mode_rezeroes_odometry() {
    let (mut runner, rig, _clock) = build(&sim_config());
    for encoder in &rig.encoders {
        encoder.set(25.0);
    }
    rig.gyro.set(12.0);

    runner.set_mode(RobotMode::TeleOp);
    let drive = runner.handler().drive_base().borrow();
    assert_eq!(drive.pose().y, 0.0);
    assert_eq!(rig.gyro.get(), 0.0);
}

#[test]
fn teleop_arcade_then_mecanum_toggle() {
    let (mut runner, rig, clock) = build(&sim_config());
    runner.set_mode(RobotMode::TeleOp);

    // Full forward on the stick; HID reports forward as negative Y.
    let mut axes = [0.0; 4];
    axes[StickAxis::Y as usize] = -1.0;
    rig.stick.set(axes);

    tick(&mut runner, &rig, &clock);
    // Arcade: scaled to 0.5, right side motors inverted.
    assert_eq!(rig.wheel_outputs(), [0.5, 0.5, -0.5, -0.5]);
    assert!(!runner.handler().teleop().is_mecanum());

    rig.buttons.set(0x0001);
    tick(&mut runner, &rig, &clock);
    assert!(runner.handler().teleop().is_mecanum());

    // Release does not toggle back.
    rig.buttons.set(0);
    tick(&mut runner, &rig, &clock);
    assert!(runner.handler().teleop().is_mecanum());

    // Forward polar drive: every wheel at 0.5 before inversion.
    let wheels = rig.wheel_outputs();
    for (w, expected) in wheels.iter().zip([0.5, 0.5, -0.5, -0.5]) {
        assert!((w - expected).abs() < 1e-9, "{wheels:?}");
    }
}

#[test]
fn teleop_start_resets_mecanum_mode() {
    let (mut runner, rig, clock) = build(&sim_config());
    runner.set_mode(RobotMode::TeleOp);
    rig.buttons.set(0x0001);
    tick(&mut runner, &rig, &clock);
    assert!(runner.handler().teleop().is_mecanum());

    runner.set_mode(RobotMode::Disabled);
    runner.set_mode(RobotMode::TeleOp);
    assert!(!runner.handler().teleop().is_mecanum());
}

/// Digital input word with the given light sensors lit on channels 12..=14.
fn light_word(left: bool, center: bool, right: bool) -> u32 {
    ((left as u32) << 11) | ((center as u32) << 12) | ((right as u32) << 13)
}

#[test]
fn line_follow_runs_to_the_t_junction() {
    let mut config = sim_config();
    config.drive.line_follower = Some(LineFollowerConfig::default());
    let (mut runner, rig, clock) = build(&config);
    runner.set_mode(RobotMode::TeleOp);

    let done = Event::new();
    rig.digital_in.set(light_word(false, true, false));
    assert!(
        runner
            .handler()
            .drive_base()
            .borrow_mut()
            .follow_line(LineTarget::new(0.3).notify(&done))
    );

    for _ in 0..3 {
        tick(&mut runner, &rig, &clock);
    }
    assert!(runner.handler().drive_base().borrow().pid_drive().is_following_line());
    assert!(rig.wheel_outputs().iter().all(|w| w.abs() > 0.0));
    assert!(!done.is_signaled());

    rig.digital_in.set(light_word(true, true, true));
    tick(&mut runner, &rig, &clock);
    assert!(done.is_signaled());
    assert!(!runner.handler().drive_base().borrow().pid_drive().is_active());
    assert!(rig.wheel_outputs().iter().all(|w| *w == 0.0));
}

#[test]
fn line_follow_unavailable_without_config() {
    let (runner, _rig, _clock) = build(&sim_config());
    let mut drive = runner.handler().drive_base().borrow_mut();
    assert!(drive.pid_drive().light_pid().is_none());
    assert!(!drive.follow_line(LineTarget::new(0.3)));
}
