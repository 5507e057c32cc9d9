/// The delay and sound counters. Both count down towards zero at 60Hz,
/// independently of how fast instructions run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u16,
    pub sound: u16,
}

/// fixed rate the timers are driven at
pub const TIMER_HZ: u32 = 60;

impl Timers {
    /// one 60Hz tick; saturates at zero
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// the buzzer sounds while the sound counter is positive
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}
