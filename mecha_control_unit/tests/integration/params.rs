//! Drive base tunables through the `ConfigurableParams` capability.

use std::rc::Rc;

use mecha_common::robot::state::ChassisKind;
use mecha_control_unit::control::pid::PidGains;
use mecha_control_unit::error::ParamError;
use mecha_control_unit::event::ManualClock;
use mecha_control_unit::params::{ConfigurableParams, ParamValue};
use mecha_control_unit::robot::drive_base::DriveBase;

use super::{SimRig, sim_config};

fn drive_base(chassis: ChassisKind) -> DriveBase {
    let mut config = sim_config();
    config.drive.chassis = chassis;
    let rig = SimRig::new();
    DriveBase::new(rig.hardware().chassis, &config.drive, Rc::new(ManualClock::new(0)))
}

#[test]
fn lists_drive_and_turn_tunables() {
    let base = drive_base(ChassisKind::Mecanum);
    let names: Vec<&str> = base.param_descriptors().iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        ["DrivePID", "DriveKp", "DriveKi", "DriveKd", "TurnPID", "TurnKp", "TurnKi", "TurnKd"]
    );
}

#[test]
fn drive_gains_apply_to_both_translation_axes() {
    let mut base = drive_base(ChassisKind::Mecanum);
    base.set_param("DriveKp", 0.3).unwrap();
    base.set_param("DriveKd", 0.02).unwrap();

    assert_eq!(base.get_param("DriveKp"), Ok(ParamValue::Scalar(0.3)));
    assert_eq!(
        base.get_param("DrivePID"),
        Ok(ParamValue::Gains(PidGains::new(0.3, 0.0, 0.02)))
    );
    let drive = base.pid_drive();
    assert_eq!(drive.y_pid().gains(), PidGains::new(0.3, 0.0, 0.02));
    assert_eq!(drive.x_pid().map(|x| x.gains()), Some(PidGains::new(0.3, 0.0, 0.02)));
    // Turn loop untouched.
    assert_eq!(drive.turn_pid().gains().kp, 0.05);
}

#[test]
fn tank_chassis_has_no_x_loop_to_tune() {
    let mut base = drive_base(ChassisKind::Tank);
    base.set_param("DriveKi", 0.01).unwrap();
    assert!(base.pid_drive().x_pid().is_none());
    assert_eq!(base.get_param("DriveKi"), Ok(ParamValue::Scalar(0.01)));
}

#[test]
fn unknown_name_returns_error_code() {
    let mut base = drive_base(ChassisKind::Mecanum);
    let err = base.get_param("ArmKp").unwrap_err();
    assert_eq!(err, ParamError::UnknownParam("ArmKp".into()));
    assert_eq!(err.code(), -1);
    assert_eq!(base.set_param("ArmKp", 1.0).unwrap_err().code(), -1);
}

#[test]
fn failed_writes_change_nothing() {
    let mut base = drive_base(ChassisKind::Mecanum);
    let before = base.get_param("TurnPID").unwrap();

    let err = base.set_param("TurnPID", 1.0).unwrap_err();
    assert_eq!(err, ParamError::ReadOnly("TurnPID".into()));
    assert_eq!(err.code(), -2);

    let err = base.set_param("TurnKp", -1.0).unwrap_err();
    assert_eq!(err.code(), -3);
    assert!(base.set_param("TurnKd", f64::NAN).is_err());

    assert_eq!(base.get_param("TurnPID").unwrap(), before);
}
