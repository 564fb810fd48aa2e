/// Decides who is responsible for decrementing the timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Every call to [`step`](super::Machine::step) decrements both timers once.
    PerStep,
    /// The timers are only decremented by
    /// [`tick_timers`](super::Machine::tick_timers), so that the host can run
    /// them on their own 60Hz clock independent of the instruction rate.
    External,
}

impl Default for Timing {
    fn default() -> Self {
        Timing::PerStep
    }
}

/// The runtime configuration of a [`Machine`](super::Machine).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub timing: Timing,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}
