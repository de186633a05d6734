//! Restart strategies.
//!
//! The search driver runs one restart epoch at a time; between epochs it
//! asks the strategy whether the conflict budget of the epoch is spent.
//! Strategies receive every conflict through `new_conflict` (they are
//! subscribed to the conflict-timer dispatch) and, for the dynamic
//! strategy, every learned clause with its LBD score.

/// User-selectable restart policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestartPolicy {
    /// Luby sequence scaled by `factor` (the usual default).
    Luby { factor: u64 },
    /// Geometric series: `first` conflicts, multiplied by `inc` at each restart.
    Geometric { first: u64, inc: f64 },
    /// LBD-driven: restart when the recent learned-clause quality degrades
    /// compared to the whole run.
    Dynamic,
    /// Never restart.
    Never,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::Luby { factor: 32 }
    }
}

#[derive(Debug)]
pub(crate) enum Restarter {
    Luby(LubyState),
    Geometric(GeometricState),
    Dynamic(DynamicState),
    Never,
}

impl Restarter {
    pub fn from_policy(policy: RestartPolicy) -> Self {
        match policy {
            RestartPolicy::Luby { factor } => Restarter::Luby(LubyState::new(factor)),
            RestartPolicy::Geometric { first, inc } => {
                Restarter::Geometric(GeometricState::new(first, inc))
            }
            RestartPolicy::Dynamic => Restarter::Dynamic(DynamicState::new()),
            RestartPolicy::Never => Restarter::Never,
        }
    }

    /// Reset the strategy state at the beginning of a solve call.
    pub fn init(&mut self) {
        match self {
            Restarter::Luby(s) => s.init(),
            Restarter::Geometric(s) => s.init(),
            Restarter::Dynamic(s) => s.init(),
            Restarter::Never => {}
        }
    }

    /// Conflict-timer subscription: called once per conflict.
    pub fn new_conflict(&mut self) {
        match self {
            Restarter::Luby(s) => s.conflicts += 1,
            Restarter::Geometric(s) => s.conflicts += 1,
            Restarter::Dynamic(_) | Restarter::Never => {}
        }
    }

    /// Called for each recorded learned clause.
    pub fn new_learned_clause(&mut self, trail_level: usize, lbd: u32) {
        if let Restarter::Dynamic(s) = self {
            s.new_learned_clause(trail_level, lbd);
        }
    }

    pub fn should_restart(&self) -> bool {
        match self {
            Restarter::Luby(s) => s.conflicts >= s.bound,
            Restarter::Geometric(s) => s.conflicts as f64 >= s.bound,
            Restarter::Dynamic(s) => s.want_restart,
            Restarter::Never => false,
        }
    }

    /// The driver restarted: advance to the next epoch budget.
    pub fn on_restart(&mut self) {
        match self {
            Restarter::Luby(s) => {
                s.index += 1;
                s.conflicts = 0;
                s.bound = (luby(2.0, s.index) * s.factor as f64) as u64;
            }
            Restarter::Geometric(s) => {
                s.conflicts = 0;
                s.bound *= s.inc;
            }
            Restarter::Dynamic(s) => s.clear_window(),
            Restarter::Never => {}
        }
    }

    /// The driver backjumped all the way to the root level.
    pub fn on_backjump_to_root_level(&mut self) {
        if let Restarter::Dynamic(s) = self {
            s.clear_window();
        }
    }
}

#[derive(Debug)]
pub(crate) struct LubyState {
    factor: u64,
    index: i32,
    bound: u64,
    conflicts: u64,
}

impl LubyState {
    fn new(factor: u64) -> Self {
        let mut s = LubyState {
            factor,
            index: 0,
            bound: 0,
            conflicts: 0,
        };
        s.init();
        s
    }
    fn init(&mut self) {
        self.index = 0;
        self.conflicts = 0;
        self.bound = (luby(2.0, 0) * self.factor as f64) as u64;
    }
}

#[derive(Debug)]
pub(crate) struct GeometricState {
    first: u64,
    inc: f64,
    bound: f64,
    conflicts: u64,
}

impl GeometricState {
    fn new(first: u64, inc: f64) -> Self {
        GeometricState {
            first,
            inc,
            bound: first as f64,
            conflicts: 0,
        }
    }
    fn init(&mut self) {
        self.bound = self.first as f64;
        self.conflicts = 0;
    }
}

const LBD_WINDOW: usize = 50;

/// Restart when the short-term average LBD of learned clauses exceeds the
/// long-term average by a margin; postpone when the trail is unusually
/// deep, which suggests the solver is close to a model.
#[derive(Debug)]
pub(crate) struct DynamicState {
    window: [u32; LBD_WINDOW],
    pos: usize,
    filled: usize,
    recent_sum: u64,
    global_sum: u64,
    n_learned: u64,
    trail_avg: f64,
    want_restart: bool,
}

impl DynamicState {
    fn new() -> Self {
        DynamicState {
            window: [0; LBD_WINDOW],
            pos: 0,
            filled: 0,
            recent_sum: 0,
            global_sum: 0,
            n_learned: 0,
            trail_avg: 0.0,
            want_restart: false,
        }
    }

    fn init(&mut self) {
        self.clear_window();
        self.global_sum = 0;
        self.n_learned = 0;
        self.trail_avg = 0.0;
    }

    fn clear_window(&mut self) {
        self.pos = 0;
        self.filled = 0;
        self.recent_sum = 0;
        self.want_restart = false;
    }

    fn new_learned_clause(&mut self, trail_level: usize, lbd: u32) {
        self.global_sum += u64::from(lbd);
        self.n_learned += 1;
        if self.n_learned == 1 {
            self.trail_avg = trail_level as f64;
        } else {
            self.trail_avg = 0.999 * self.trail_avg + 0.001 * trail_level as f64;
        }

        // a deep trail hints at an almost-complete assignment
        if self.filled == LBD_WINDOW && trail_level as f64 > 1.4 * self.trail_avg {
            self.clear_window();
            return;
        }

        if self.filled == LBD_WINDOW {
            self.recent_sum -= u64::from(self.window[self.pos]);
        } else {
            self.filled += 1;
        }
        self.window[self.pos] = lbd;
        self.recent_sum += u64::from(lbd);
        self.pos = (self.pos + 1) % LBD_WINDOW;

        if self.filled == LBD_WINDOW {
            let recent = self.recent_sum as f64 / LBD_WINDOW as f64;
            let global = self.global_sum as f64 / self.n_learned as f64;
            if recent * 0.8 > global {
                self.want_restart = true;
            }
        }
    }
}

/// Finite subsequences of the Luby-sequence:
///
/// > 0: 1
/// > 1: 1 1 2
/// > 2: 1 1 2 1 1 2 4
/// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
/// ...
pub(crate) fn luby(y: f64, mut x: i32) -> f64 {
    // Find the finite subsequence that contains index 'x', and the
    // size of that subsequence:
    let mut size = 1;
    let mut seq = 0;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }

    while size - 1 != x {
        size = (size - 1) >> 1;
        seq -= 1;
        x %= size;
    }

    f64::powi(y, seq)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_luby_sequence() {
        let expect = [1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8];
        for (x, &e) in expect.iter().enumerate() {
            assert_eq!(luby(2.0, x as i32) as u64, e, "luby({})", x);
        }
    }

    #[test]
    fn test_luby_restarter_epochs() {
        let mut r = Restarter::from_policy(RestartPolicy::Luby { factor: 4 });
        r.init();
        for _ in 0..3 {
            assert!(!r.should_restart());
            r.new_conflict();
        }
        r.new_conflict();
        assert!(r.should_restart());
        r.on_restart();
        assert!(!r.should_restart());
    }

    #[test]
    fn test_geometric_growth() {
        let mut r = Restarter::from_policy(RestartPolicy::Geometric {
            first: 2,
            inc: 1.5,
        });
        r.init();
        r.new_conflict();
        r.new_conflict();
        assert!(r.should_restart());
        r.on_restart();
        r.new_conflict();
        r.new_conflict();
        assert!(!r.should_restart()); // bound grew to 3
        r.new_conflict();
        assert!(r.should_restart());
    }

    #[test]
    fn test_dynamic_triggers_on_degrading_lbd() {
        let mut r = Restarter::from_policy(RestartPolicy::Dynamic);
        r.init();
        // a long run of good clauses, then a window of bad ones
        for _ in 0..500 {
            r.new_learned_clause(10, 2);
        }
        assert!(!r.should_restart());
        for _ in 0..LBD_WINDOW {
            r.new_learned_clause(10, 20);
        }
        assert!(r.should_restart());
        r.on_restart();
        assert!(!r.should_restart());
    }

    #[test]
    fn test_never() {
        let mut r = Restarter::from_policy(RestartPolicy::Never);
        r.init();
        for _ in 0..1000 {
            r.new_conflict();
        }
        assert!(!r.should_restart());
    }
}
