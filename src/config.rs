/// slowest and fastest instruction rates the controller accepts
pub const MIN_CYCLE_HZ: u32 = 1;
pub const MAX_CYCLE_HZ: u32 = 1000;

pub const DEFAULT_CYCLE_HZ: u32 = 500;

/// Tunables for a machine and the controller driving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8Config {
    /// instructions per second
    pub cycle_hz: u32,
    /// fixed seed for `RND`; entropy when `None`
    pub seed: Option<u64>,
    pub start_paused: bool,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Chip8Config {
            cycle_hz: DEFAULT_CYCLE_HZ,
            seed: None,
            start_paused: false,
        }
    }
}

impl Chip8Config {
    pub fn new(cycle_hz: u32) -> Self {
        Chip8Config {
            cycle_hz: clamp_cycle_hz(cycle_hz),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn paused(mut self) -> Self {
        self.start_paused = true;
        self
    }
}

pub fn clamp_cycle_hz(hz: u32) -> u32 {
    hz.clamp(MIN_CYCLE_HZ, MAX_CYCLE_HZ)
}
