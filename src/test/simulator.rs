use crate::error::{ChannelSide, RdtError};
use crate::sim::{Iteration, RunOutcome, Simulator, World};

/// 在第 `done_at` 次迭代后完成的世界
#[derive(Default)]
struct CountingWorld {
    seen: Vec<u64>,
    done_at: Option<u64>,
    fail_at: Option<u64>,
}

impl World for CountingWorld {
    fn on_iteration(&mut self, now: Iteration) -> Result<(), RdtError> {
        if self.fail_at == Some(now.0) {
            return Err(RdtError::ChannelNotSet(ChannelSide::Send));
        }
        self.seen.push(now.0);
        Ok(())
    }

    fn is_done(&self) -> bool {
        match (self.done_at, self.seen.last()) {
            (Some(d), Some(&last)) => last >= d,
            _ => false,
        }
    }
}

#[test]
fn run_stops_as_soon_as_world_is_done() {
    let mut world = CountingWorld {
        done_at: Some(3),
        ..CountingWorld::default()
    };
    let mut sim = Simulator::default();
    let outcome = sim.run_until(Iteration(10), &mut world).expect("run");

    assert_eq!(outcome, RunOutcome::Completed { iterations: 3 });
    assert!(outcome.is_completed());
    assert_eq!(world.seen, vec![1, 2, 3]);
    assert_eq!(sim.now(), Iteration(3));
}

#[test]
fn run_is_bounded_by_the_iteration_limit() {
    let mut world = CountingWorld::default();
    let mut sim = Simulator::default();
    let outcome = sim.run_until(Iteration(5), &mut world).expect("run");

    assert_eq!(outcome, RunOutcome::Exhausted { iterations: 5 });
    assert!(!outcome.is_completed());
    assert_eq!(outcome.iterations(), 5);
    assert_eq!(world.seen, vec![1, 2, 3, 4, 5]);
}

#[test]
fn already_done_world_is_not_ticked() {
    let mut world = CountingWorld {
        seen: vec![7],
        done_at: Some(1),
        ..CountingWorld::default()
    };
    let mut sim = Simulator::default();
    let outcome = sim.run_until(Iteration(10), &mut world).expect("run");

    assert_eq!(outcome, RunOutcome::Completed { iterations: 0 });
    assert_eq!(world.seen, vec![7]);
}

#[test]
fn world_error_aborts_the_run() {
    let mut world = CountingWorld {
        fail_at: Some(2),
        ..CountingWorld::default()
    };
    let mut sim = Simulator::default();
    let err = sim.run_until(Iteration(10), &mut world).expect_err("fails");

    assert!(matches!(err, RdtError::ChannelNotSet(ChannelSide::Send)));
    assert_eq!(world.seen, vec![1]);
    assert_eq!(sim.now(), Iteration(2));
}
