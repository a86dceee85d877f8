//! Edge dispatch through the scheduler: listener order, capacity and
//! same-tick hand-off to the state machine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mecha_common::consts::{MAX_EDGE_LISTENERS, SM_STATE_STARTED};
use mecha_common::robot::state::RobotMode;
use mecha_control_unit::event::{Event, ManualClock};
use mecha_control_unit::input::edge::{EdgeDispatcher, EdgeEvent};
use mecha_control_unit::state::machine::StateMachine;
use mecha_control_unit::task::{Scheduler, TaskHandle};

use super::SharedWord;

fn dispatcher(word: &Rc<Cell<u32>>) -> EdgeDispatcher {
    EdgeDispatcher::new("din", 0, Box::new(SharedWord(word.clone())), 8)
}

#[test]
fn simultaneous_edges_arrive_in_ascending_channel_order() {
    let word = Rc::new(Cell::new(0b0000_0000));
    let mut din = dispatcher(&word);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    assert!(din.register_listener(
        0xFF,
        Box::new(move |ev: EdgeEvent| log.borrow_mut().push((ev.channel, ev.active))),
    ));

    word.set(0b1010_0101);
    assert_eq!(din.dispatch(), 4);
    word.set(0b0010_0100);
    assert_eq!(din.dispatch(), 2);

    assert_eq!(
        *seen.borrow(),
        [(1, true), (3, true), (6, true), (8, true), (1, false), (8, false)]
    );
}

#[test]
fn capacity_overflow_is_reported_not_fatal() {
    let word = Rc::new(Cell::new(0));
    let mut din = dispatcher(&word);
    let hits = Rc::new(Cell::new(0));

    for _ in 0..MAX_EDGE_LISTENERS {
        let hits = hits.clone();
        assert!(din.register_listener(0x01, Box::new(move |_| hits.set(hits.get() + 1))));
    }
    assert!(!din.register_listener(0x02, Box::new(|_| {})));
    assert_eq!(din.listener_count(), MAX_EDGE_LISTENERS);
    assert_eq!(din.channel_mask(), 0x01);

    word.set(0x03);
    din.dispatch();
    assert_eq!(hits.get(), MAX_EDGE_LISTENERS);
}

#[test]
fn button_event_advances_state_machine_in_the_same_tick() {
    let word = Rc::new(Cell::new(0));
    let clock = Rc::new(ManualClock::new(0));
    let pressed = Event::new();

    let mut din = dispatcher(&word);
    let ev = pressed.clone();
    assert!(din.register_listener(
        0x04,
        Box::new(move |e: EdgeEvent| {
            if e.active {
                ev.set();
            }
        }),
    ));
    let sm = Rc::new(RefCell::new(StateMachine::new("sm", clock)));

    let mut scheduler = Scheduler::new();
    scheduler
        .register("din", EdgeDispatcher::PHASES, Rc::new(RefCell::new(din)) as TaskHandle)
        .unwrap();
    scheduler
        .register("sm", StateMachine::PHASES, sm.clone() as TaskHandle)
        .unwrap();

    sm.borrow_mut().start();
    sm.borrow_mut()
        .wait_for_single_event(&pressed, SM_STATE_STARTED + 1, 0);

    scheduler.pre_periodic(RobotMode::TeleOp);
    assert!(!sm.borrow().is_ready());

    word.set(0x04);
    scheduler.pre_periodic(RobotMode::TeleOp);
    assert!(sm.borrow().is_ready());
    assert_eq!(sm.borrow().current_state(), SM_STATE_STARTED + 1);
}

#[test]
fn bcd_thumbwheel_reads_active_low() {
    let word = Rc::new(Cell::new(0));
    let mut din = dispatcher(&word);
    // Digit 5 on bits 2..=5, active low: bits 2 and 4 pulled low.
    word.set(!(0b0101 << 2) & 0xFF);
    din.dispatch();
    assert_eq!(din.bcd_switch(2), 5);
    assert!(din.state(1));
    assert!(!din.state(3));
}
