/// Represents a timer inside of the chip
/// infrastructure, it will count down to
/// zero from what ever number it was given,
/// one unit per tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// will store the value of the timer
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Will set the value from which the timer shall count down from.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    /// Will get the value that the counter is currently at.
    pub fn get_value(&self) -> u8 {
        self.value
    }

    /// Is the timer still counting down.
    pub fn is_active(&self) -> bool {
        self.value > 0
    }

    /// Will decrement the timer by one, a timer at zero stays there.
    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }
}
