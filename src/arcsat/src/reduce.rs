//! Learned-constraint deletion policies.
//!
//! The solver polls a "reduce needed" flag once per search iteration; the
//! flag is raised by a conflict timer owned by the active policy. The
//! sweep itself runs in the solver (it needs the arena and the locked
//! test); this module holds the policies, their timers and the LBD
//! machinery.

/// User-selectable learned-constraint deletion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnedDeletion {
    /// Every `K` conflicts, keep binary and locked constraints and as many
    /// others as fit under `K`.
    FixedSize(usize),
    /// When the clause arena grows past a byte watermark, delete the least
    /// active half.
    MemoryBased,
    /// Rank clauses by literal-block distance (lower is better) and
    /// periodically discard the worse half.
    Lbd,
}

impl Default for LearnedDeletion {
    fn default() -> Self {
        LearnedDeletion::Lbd
    }
}

/// Periodic conflict counter: fires every `bound` conflicts.
#[derive(Debug, Clone)]
pub(crate) struct ConflictTimerAdapter {
    bound: u64,
    count: u64,
}

impl ConflictTimerAdapter {
    pub fn new(bound: u64) -> Self {
        debug_assert!(bound > 0);
        Self { bound, count: 0 }
    }

    #[inline]
    pub fn new_conflict(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.bound {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// What a deletion-policy timer asks the solver to do on a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    None,
    /// Run the deletion sweep at the next safe point.
    Reduce,
    /// Compare the arena footprint against the watermark first.
    CheckMemory,
}

const LBD_FIRST_REDUCE: u64 = 5000;
const LBD_REDUCE_INC: u64 = 1000;

#[derive(Debug)]
pub(crate) enum ReduceTimer {
    Fixed(ConflictTimerAdapter),
    Memory(ConflictTimerAdapter),
    Lbd {
        tick: ConflictTimerAdapter,
        acc: u64,
        next_bound: u64,
    },
}

impl ReduceTimer {
    pub fn for_strategy(strategy: LearnedDeletion) -> Self {
        match strategy {
            LearnedDeletion::FixedSize(k) => {
                ReduceTimer::Fixed(ConflictTimerAdapter::new(k.max(1) as u64))
            }
            LearnedDeletion::MemoryBased => ReduceTimer::Memory(ConflictTimerAdapter::new(500)),
            LearnedDeletion::Lbd => ReduceTimer::Lbd {
                tick: ConflictTimerAdapter::new(LBD_REDUCE_INC),
                acc: 0,
                next_bound: LBD_FIRST_REDUCE,
            },
        }
    }

    /// Conflict-timer subscription: called once per conflict.
    pub fn new_conflict(&mut self) -> TimerEvent {
        match self {
            ReduceTimer::Fixed(t) => {
                if t.new_conflict() {
                    TimerEvent::Reduce
                } else {
                    TimerEvent::None
                }
            }
            ReduceTimer::Memory(t) => {
                if t.new_conflict() {
                    TimerEvent::CheckMemory
                } else {
                    TimerEvent::None
                }
            }
            ReduceTimer::Lbd {
                tick,
                acc,
                next_bound,
            } => {
                if tick.new_conflict() {
                    *acc += LBD_REDUCE_INC;
                    if *acc >= *next_bound {
                        *next_bound += LBD_REDUCE_INC;
                        *acc = 0;
                        return TimerEvent::Reduce;
                    }
                }
                TimerEvent::None
            }
        }
    }

    /// Reset at the beginning of a solve call. May itself request a sweep
    /// when the previous call left an overdue budget behind.
    pub fn reset(&mut self) -> TimerEvent {
        match self {
            ReduceTimer::Fixed(t) | ReduceTimer::Memory(t) => {
                t.reset();
                TimerEvent::None
            }
            ReduceTimer::Lbd {
                tick,
                acc,
                next_bound,
            } => {
                tick.reset();
                *next_bound = LBD_FIRST_REDUCE;
                if *acc >= *next_bound {
                    *acc = 0;
                    TimerEvent::Reduce
                } else {
                    TimerEvent::None
                }
            }
        }
    }
}

/// Stamped per-level flags for computing the literal-block distance of a
/// clause (the number of distinct decision levels among its literals)
/// without clearing an array on every conflict.
#[derive(Debug, Default)]
pub(crate) struct LbdFlags {
    stamp: u64,
    flags: Vec<u64>,
}

impl LbdFlags {
    pub fn ensure_levels(&mut self, n_levels: usize) {
        if self.flags.len() < n_levels + 1 {
            self.flags.resize(n_levels + 1, 0);
        }
    }

    /// Distance of a clause whose asserting literal is skipped by the
    /// caller; the asserting level always counts for one.
    pub fn lbd_with_asserting(&mut self, levels: impl Iterator<Item = i32>) -> u32 {
        self.stamp += 1;
        let mut n = 1u32;
        for lvl in levels {
            debug_assert!(lvl >= 0);
            let lvl = lvl as usize;
            if lvl < self.flags.len() && self.flags[lvl] != self.stamp {
                self.flags[lvl] = self.stamp;
                n += 1;
            }
        }
        n
    }
}
