//! Time management for a single search.
//!
//! A `TimeController` turns a UCI time control into two budgets: a *target*
//! (don't start another deepening iteration past this point) and a *limit*
//! (abort the ongoing search outright). The limit check is only performed
//! every few thousand nodes, so a search can overshoot it by a sliver.
//!
//! The controller also carries the engine status flag the I/O thread uses
//! to talk to the search: `stop` flips it to `Aborted`, and `ponderhit`
//! turns a pondering search into a normal thinking one, at which point the
//! clocks start mattering.

use chess::piece::Color;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uci::time_control::TimeControl;

/// How many nodes may pass between checks of the clock and status flag.
const CHECKUP_WINDOW: u64 = 4096;

/// What the search is currently supposed to be doing. Shared between the
/// search and the I/O thread; a stale read just delays the reaction by one
/// checkup window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineStatus {
    Thinking = 0,
    Pondering = 1,
    Aborted = 2,
}

impl EngineStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Thinking,
            1 => Self::Pondering,
            _ => Self::Aborted,
        }
    }
}

/// Decides when the search should stop, based on the time control and the
/// shared engine status.
#[derive(Debug, Clone)]
pub struct TimeController {
    tc: TimeControl,

    /// The instant the search was started.
    start: Instant,

    /// Don't start a new deepening iteration beyond this budget.
    target_time: Duration,

    /// Abort the search outright beyond this budget.
    limit_time: Duration,

    status: Arc<AtomicU8>,

    /// The node count at which to bother checking the clock again.
    next_checkup: u64,
}

impl TimeController {
    /// Build a controller for the given time control, and a handle the I/O
    /// side can use to stop the search or deliver a ponderhit.
    ///
    /// The budget split follows a simple static rule: in sudden-death we
    /// aim for a fortieth of the remaining time plus the increment, and
    /// never spend more than a fifth; with N moves to go we aim for an
    /// equal split, half of the remaining time when the control is one
    /// move away. When pondering is on, the target stretches by a quarter
    /// since some of the thinking comes free.
    pub fn new(
        tc: TimeControl,
        side: Color,
        pondering: bool,
        ponder_option: bool,
    ) -> (Self, TimeControlHandle) {
        let status = if pondering {
            EngineStatus::Pondering
        } else {
            EngineStatus::Thinking
        };
        let status = Arc::new(AtomicU8::new(status as u8));
        let handle = TimeControlHandle {
            status: status.clone(),
        };

        let mut controller = TimeController {
            tc,
            start: Instant::now(),
            target_time: Duration::ZERO,
            limit_time: Duration::ZERO,
            status,
            next_checkup: CHECKUP_WINDOW,
        };

        match tc {
            TimeControl::FixedTime(movetime) => {
                controller.target_time = movetime;
                controller.limit_time = movetime;
            }

            TimeControl::Clock {
                wtime,
                btime,
                winc,
                binc,
                movestogo,
            } => {
                let time = if side.is_white() { wtime } else { btime };
                let inc = if side.is_white() { winc } else { binc }.unwrap_or_default();

                let (target, limit) = match movestogo {
                    None => (
                        time / 40 + inc,
                        Duration::max(time / 5, inc.saturating_sub(Duration::from_millis(250))),
                    ),
                    Some(1) => (
                        time / 2,
                        Duration::max(
                            time.saturating_sub(Duration::from_millis(250)),
                            time * 3 / 4,
                        ),
                    ),
                    Some(movestogo) => (
                        time / movestogo.min(20),
                        Duration::min(time / 4, time * 4 / movestogo),
                    ),
                };

                controller.target_time = target;
                controller.limit_time = limit;

                if ponder_option {
                    controller.target_time = Duration::min(limit, target * 5 / 4);
                }
            }

            _ => {}
        }

        (controller, handle)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::Relaxed))
    }

    pub fn aborted(&self) -> bool {
        self.status() == EngineStatus::Aborted
    }

    /// May the ongoing search keep going? Cheap until the node count
    /// crosses the next checkup mark.
    pub fn should_continue(&mut self, nodes: u64) -> bool {
        if nodes < self.next_checkup {
            return true;
        }
        self.next_checkup = nodes + CHECKUP_WINDOW;

        match self.status() {
            EngineStatus::Aborted => return false,

            // While pondering, the clock isn't running for us.
            EngineStatus::Pondering => return true,

            EngineStatus::Thinking => {}
        }

        match self.tc {
            TimeControl::Nodes(max_nodes) => nodes < max_nodes,
            TimeControl::FixedTime(_) | TimeControl::Clock { .. } => {
                self.elapsed() < self.limit_time
            }
            _ => true,
        }
    }

    /// Is it worth starting an iteration at this depth? A search that has
    /// spent its target would almost certainly not finish another one.
    pub fn should_deepen(&self, depth: usize) -> bool {
        if depth <= 1 {
            return true;
        }

        match self.status() {
            EngineStatus::Aborted => return false,
            EngineStatus::Pondering => return true,
            EngineStatus::Thinking => {}
        }

        match self.tc {
            TimeControl::Depth(max_depth) => depth <= max_depth,
            TimeControl::Nodes(_) => true,
            TimeControl::FixedTime(_) | TimeControl::Clock { .. } => {
                self.elapsed() < self.target_time
            }
            TimeControl::Infinite => true,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A wrapper for driving the status flag from the I/O thread.
#[derive(Debug, Clone)]
pub struct TimeControlHandle {
    status: Arc<AtomicU8>,
}

impl TimeControlHandle {
    /// Stop the current search.
    pub fn stop(&self) {
        self.status.store(EngineStatus::Aborted as u8, Ordering::Relaxed);
    }

    /// The pondered-on move was played: start thinking on our own clock.
    pub fn ponderhit(&self) {
        self.status.store(EngineStatus::Thinking as u8, Ordering::Relaxed);
    }
}

////////////////////////////////////////////////////////////////////////////////
//
// Tests
//
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_control() {
        let (tc, _handle) =
            TimeController::new(TimeControl::Depth(4), Color::White, false, false);

        assert!(tc.should_deepen(4));
        assert!(!tc.should_deepen(5));
        let mut tc = tc;
        assert!(tc.should_continue(1_000_000));
    }

    #[test]
    fn node_control() {
        let (mut tc, _handle) =
            TimeController::new(TimeControl::Nodes(10_000), Color::White, false, false);

        assert!(tc.should_continue(CHECKUP_WINDOW));
        assert!(!tc.should_continue(20_000));
    }

    #[test]
    fn stop_aborts() {
        let (mut tc, handle) =
            TimeController::new(TimeControl::Infinite, Color::White, false, false);

        assert!(tc.should_continue(CHECKUP_WINDOW));
        handle.stop();
        assert!(!tc.should_continue(2 * CHECKUP_WINDOW));
        assert!(!tc.should_deepen(2));
        assert!(tc.aborted());
    }

    #[test]
    fn ponderhit_starts_the_clock() {
        let clock = TimeControl::Clock {
            wtime: Duration::from_millis(10),
            btime: Duration::from_millis(10),
            winc: None,
            binc: None,
            movestogo: None,
        };
        let (tc, handle) = TimeController::new(clock, Color::White, true, true);

        // Pondering ignores the (tiny) clock entirely.
        assert_eq!(tc.status(), EngineStatus::Pondering);
        assert!(tc.should_deepen(30));

        handle.ponderhit();
        assert_eq!(tc.status(), EngineStatus::Thinking);
    }

    #[test]
    fn clock_budgets() {
        let clock = TimeControl::Clock {
            wtime: Duration::from_millis(40_000),
            btime: Duration::from_millis(40_000),
            winc: Some(Duration::from_millis(1000)),
            binc: None,
            movestogo: None,
        };
        let (tc, _handle) = TimeController::new(clock, Color::White, false, false);

        // time/40 + inc and max(time/5, inc - 250)
        assert_eq!(tc.target_time, Duration::from_millis(2000));
        assert_eq!(tc.limit_time, Duration::from_millis(8000));
    }
}
