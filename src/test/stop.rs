use crate::sim::{Event, EventResult, SimDuration, SimError, SimTime, Simulator, World};
use std::cell::RefCell;
use std::rc::Rc;

fn schedule_log_at(sim: &mut Simulator, log: &Rc<RefCell<Vec<u64>>>, secs: &[u64]) {
    for &s in secs {
        let l = Rc::clone(log);
        sim.schedule_at(SimTime::from_secs(s), Mark { s, log: l })
            .expect("schedule_at");
    }
}

struct Mark {
    s: u64,
    log: Rc<RefCell<Vec<u64>>>,
}

impl Event for Mark {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) -> EventResult {
        self.log.borrow_mut().push(self.s);
        Ok(())
    }
}

#[test]
fn stop_is_exclusive_of_its_own_instant() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulator::new();
    schedule_log_at(&mut sim, &log, &[1, 2, 3]);

    sim.stop_at(SimTime::from_secs(2)).expect("stop");
    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![1]);
    assert_eq!(sim.now(), SimTime::from_secs(2));
    assert!(!sim.is_finished());

    // 停止标记只生效一次，再次运行会继续执行剩余事件。
    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
    assert_eq!(sim.now(), SimTime::from_secs(3));
}

#[test]
fn earliest_stop_wins_and_later_stops_remain() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulator::new();
    schedule_log_at(&mut sim, &log, &[1, 4, 6]);

    sim.stop_at(SimTime::from_secs(5)).expect("stop");
    sim.stop_after(SimDuration::from_secs(3)).expect("stop");

    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![1]);
    assert_eq!(sim.now(), SimTime::from_secs(3));

    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![1, 4]);
    assert_eq!(sim.now(), SimTime::from_secs(5));

    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![1, 4, 6]);
    assert_eq!(sim.now(), SimTime::from_secs(6));
}

#[test]
fn stop_reached_with_empty_queue_still_advances_clock() {
    let mut sim = Simulator::new();
    sim.stop_after(SimDuration::from_secs(10)).expect("stop");
    sim.run(&mut ()).expect("run");
    assert_eq!(sim.now(), SimTime::from_secs(10));
    assert_eq!(sim.executed_events(), 0);
}

#[test]
fn stop_from_callback_halts_after_current_event() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulator::new();

    let l = Rc::clone(&log);
    sim.schedule_fn(SimDuration::from_secs(1), move |sim, _| {
        l.borrow_mut().push(100);
        sim.stop()?;
        Ok(())
    })
    .expect("schedule");
    schedule_log_at(&mut sim, &log, &[1, 2]);

    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![100]);
    assert_eq!(sim.now(), SimTime::from_secs(1));

    sim.run(&mut ()).expect("run");
    assert_eq!(*log.borrow(), vec![100, 1, 2]);
}

#[test]
fn stop_in_the_past_is_rejected() {
    let mut sim = Simulator::new();
    sim.stop_at(SimTime::from_secs(5)).expect("stop");
    sim.run(&mut ()).expect("run");

    let err = sim.stop_at(SimTime::from_secs(1)).unwrap_err();
    assert!(matches!(err, SimError::InvalidArgument(_)));
    let err = sim.stop_after(SimDuration::from_secs(-1)).unwrap_err();
    assert!(matches!(err, SimError::InvalidArgument(_)));
}

#[test]
fn clock_is_monotonic_within_and_across_runs() {
    let times = Rc::new(RefCell::new(Vec::new()));
    let mut sim = Simulator::new();

    for delay in [7, 3, 3, 9, 1, 5] {
        let t = Rc::clone(&times);
        sim.schedule_fn(SimDuration::from_millis(delay), move |sim, _| {
            t.borrow_mut().push(sim.now());
            let t2 = Rc::clone(&t);
            sim.schedule_fn(SimDuration::from_millis(delay / 2), move |sim, _| {
                t2.borrow_mut().push(sim.now());
                Ok(())
            })?;
            Ok(())
        })
        .expect("schedule");
    }

    sim.stop_at(SimTime::from_millis(6)).expect("stop");
    sim.run(&mut ()).expect("run");
    let first_run_end = sim.now();
    sim.run(&mut ()).expect("run");

    let times = times.borrow();
    assert_eq!(times.len(), 12);
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert!(first_run_end <= times[times.len() - 1]);
}
