//! Wall-clock pacing.
//!
//! The host loop calls [`CycleController::update`] once per iteration with
//! the current time. Two independent gates decide whether the interpreter
//! steps (configurable rate, not while paused or awaiting a key) and whether
//! the timers tick (fixed 60Hz, not while paused). Either, both or neither
//! may fire in one update.

use crate::config::{clamp_cycle_hz, Chip8Config};
use crate::error::Fault;
use crate::interpreter::{Chip8Interpreter, StepOutcome};
use crate::timer::TIMER_HZ;
use std::time::{Duration, Instant};

/// Coarse machine state, for status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    AwaitingKey(usize),
    Halted,
}

/// What happened during one `update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    pub cycle: Option<StepOutcome>,
    pub timers: bool,
    /// key that satisfied a pending key wait
    pub key: Option<u8>,
}

pub struct CycleController {
    cycle_hz: u32,
    last_cycle: Instant,
    last_timer: Instant,
}

impl CycleController {
    pub fn new(config: &Chip8Config, now: Instant) -> Self {
        CycleController {
            cycle_hz: clamp_cycle_hz(config.cycle_hz),
            last_cycle: now,
            last_timer: now,
        }
    }

    pub fn cycle_hz(&self) -> u32 {
        self.cycle_hz
    }

    /// takes effect on the next `update`; returns the clamped rate
    pub fn set_cycle_hz(&mut self, hz: u32) -> u32 {
        self.cycle_hz = clamp_cycle_hz(hz);
        self.cycle_hz
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(1) / self.cycle_hz
    }

    pub fn timer_period() -> Duration {
        Duration::from_secs(1) / TIMER_HZ
    }

    pub fn update(
        &mut self,
        machine: &mut Chip8Interpreter,
        now: Instant,
    ) -> Result<Tick, Fault> {
        if machine.is_paused() || machine.fault().is_some() {
            // nothing owed for time spent stopped, and no key resolves a
            // wait until the machine runs again
            self.last_cycle = now;
            self.last_timer = now;
            return Ok(Tick::default());
        }

        let mut tick = Tick {
            key: machine.poll_keys(),
            ..Tick::default()
        };

        let cycle_period = self.cycle_period();
        if machine.awaiting_key().is_none()
            && gate(&mut self.last_cycle, cycle_period, now)
        {
            tick.cycle = Some(machine.step()?);
        }

        if gate(&mut self.last_timer, Self::timer_period(), now) {
            machine.tick_timers();
            tick.timers = true;
        }

        Ok(tick)
    }

    /// Single step on demand, ignoring the timing gates and the pause flag.
    /// A key pressed since the last sample can satisfy a pending wait first.
    pub fn manual_tick(&mut self, machine: &mut Chip8Interpreter) -> Result<StepOutcome, Fault> {
        machine.poll_keys();
        machine.step()
    }

    pub fn toggle_pause(&mut self, machine: &mut Chip8Interpreter) -> bool {
        machine.toggle_pause()
    }

    pub fn state(machine: &Chip8Interpreter) -> RunState {
        if machine.fault().is_some() {
            RunState::Halted
        } else if machine.is_paused() {
            RunState::Paused
        } else if let Some(register) = machine.awaiting_key() {
            RunState::AwaitingKey(register)
        } else {
            RunState::Running
        }
    }
}

/// Fires once `period` has elapsed since `last`. Advances by exactly one
/// period to hold the rate, unless more than one period behind.
pub(crate) fn gate(last: &mut Instant, period: Duration, now: Instant) -> bool {
    let elapsed = now.saturating_duration_since(*last);
    if elapsed < period {
        return false;
    }
    *last = if elapsed >= period * 2 { now } else { *last + period };
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup(program: &[u8], hz: u32) -> (Chip8Interpreter, CycleController, Instant) {
        let config = Chip8Config::new(hz).with_seed(1);
        let mut m = Chip8Interpreter::from_config(&config);
        m.load_image(program).unwrap();
        let t0 = Instant::now();
        (m, CycleController::new(&config, t0), t0)
    }

    #[test]
    fn test_periods() {
        let (_, c, _) = setup(&[], 500);
        assert_eq!(c.cycle_period(), ms(2));
        assert_eq!(CycleController::timer_period(), Duration::from_nanos(16_666_666));
    }

    #[test]
    fn test_cycle_gate() -> Result<(), Fault> {
        // 100Hz: one instruction every 10ms
        let (mut m, mut c, t0) = setup(&[0x70, 0x01, 0x12, 0x00], 100);
        assert_eq!(c.update(&mut m, t0 + ms(5))?.cycle, None);
        assert_eq!(
            c.update(&mut m, t0 + ms(10))?.cycle,
            Some(StepOutcome::Executed(Instruction::AddByte { x: 0, byte: 1 }))
        );
        // same instant: gate already consumed
        assert_eq!(c.update(&mut m, t0 + ms(10))?.cycle, None);
        assert!(c.update(&mut m, t0 + ms(20))?.cycle.is_some());
        assert_eq!(m.cycles(), 2);
        Ok(())
    }

    #[test]
    fn test_at_most_one_step_per_update() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0x70, 0x01, 0x12, 0x00], 1000);
        c.update(&mut m, t0 + Duration::from_secs(1))?;
        assert_eq!(m.cycles(), 1);
        Ok(())
    }

    #[test]
    fn test_timer_gate_independent_of_cycle_rate() -> Result<(), Fault> {
        // 1Hz cycles, timers still at 60Hz
        let (mut m, mut c, t0) = setup(&[0x60, 0x03, 0xf0, 0x15], 1);
        m.step()?;
        m.step()?;
        assert_eq!(m.timers().delay, 3);
        let mut t = t0;
        for _ in 0..4 {
            t += ms(17);
            let tick = c.update(&mut m, t)?;
            assert!(tick.timers);
            assert_eq!(tick.cycle, None);
        }
        assert_eq!(m.timers().delay, 0);
        Ok(())
    }

    #[test]
    fn test_both_gates_can_fire_together() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0x12, 0x00], 60);
        let tick = c.update(&mut m, t0 + ms(17))?;
        assert!(tick.cycle.is_some());
        assert!(tick.timers);
        Ok(())
    }

    #[test]
    fn test_pause_stops_cycles_and_timers() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0x60, 0x05, 0xf0, 0x15, 0x12, 0x04], 1000);
        m.step()?;
        m.step()?;
        assert!(c.toggle_pause(&mut m));
        let tick = c.update(&mut m, t0 + Duration::from_secs(1))?;
        assert_eq!(tick, Tick::default());
        assert_eq!(m.timers().delay, 5);
        assert_eq!(CycleController::state(&m), RunState::Paused);

        // resuming doesn't try to catch up on the paused second
        assert!(!c.toggle_pause(&mut m));
        let tick = c.update(&mut m, t0 + Duration::from_secs(1))?;
        assert_eq!(tick.cycle, None);
        assert!(!tick.timers);
        Ok(())
    }

    #[test]
    fn test_manual_tick_while_paused() -> Result<(), Fault> {
        let (mut m, mut c, _) = setup(&[0x6a, 0x05], 10);
        m.set_paused(true);
        c.manual_tick(&mut m)?;
        assert_eq!(m.registers()[0xa], 5);
        assert!(m.is_paused());
        Ok(())
    }

    #[test]
    fn test_key_wait_holds_cycles_but_not_timers() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0x60, 0x02, 0xf0, 0x15, 0xf1, 0x0a, 0x62, 0x01], 1000);
        for _ in 0..3 {
            m.step()?;
        }
        assert_eq!(CycleController::state(&m), RunState::AwaitingKey(1));
        let tick = c.update(&mut m, t0 + ms(17))?;
        assert_eq!(tick.cycle, None);
        assert!(tick.timers);
        assert_eq!(m.program_counter(), 0x206);

        m.set_key(0xc, true);
        let tick = c.update(&mut m, t0 + ms(18))?;
        assert_eq!(tick.key, Some(0xc));
        assert_eq!(m.registers()[1], 0xc);
        assert!(tick.cycle.is_some());
        assert_eq!(m.registers()[2], 1);
        Ok(())
    }

    #[test]
    fn test_key_press_while_paused_leaves_wait_pending() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0xf3, 0x0a, 0x12, 0x02], 1000);
        m.step()?;
        m.set_paused(true);

        m.set_key(0x6, true);
        let tick = c.update(&mut m, t0 + ms(5))?;
        assert_eq!(tick.key, None);
        assert_eq!(m.registers()[3], 0);
        assert_eq!(m.awaiting_key(), Some(3));

        // the press is still fresh once the machine runs again
        m.set_paused(false);
        let tick = c.update(&mut m, t0 + ms(6))?;
        assert_eq!(tick.key, Some(0x6));
        assert_eq!(m.registers()[3], 0x6);
        assert_eq!(m.awaiting_key(), None);
        Ok(())
    }

    #[test]
    fn test_manual_tick_resolves_key_wait() -> Result<(), Fault> {
        let (mut m, mut c, _) = setup(&[0xf3, 0x0a, 0x64, 0x01], 10);
        m.set_paused(true);
        assert_eq!(c.manual_tick(&mut m)?, StepOutcome::Executed(Instruction::WaitKey { x: 3 }));
        assert_eq!(c.manual_tick(&mut m)?, StepOutcome::AwaitingKey);
        m.set_key(0x2, true);
        c.manual_tick(&mut m)?;
        assert_eq!(m.registers()[3], 0x2);
        assert_eq!(m.registers()[4], 1);
        Ok(())
    }

    #[test]
    fn test_set_cycle_rate_takes_effect_next_check() -> Result<(), Fault> {
        let (mut m, mut c, t0) = setup(&[0x12, 0x00], 10);
        assert_eq!(c.update(&mut m, t0 + ms(2))?.cycle, None);
        assert_eq!(c.set_cycle_hz(500), 500);
        assert!(c.update(&mut m, t0 + ms(2))?.cycle.is_some());
        assert_eq!(c.set_cycle_hz(0), 1);
        assert_eq!(c.set_cycle_hz(2000), 1000);
        Ok(())
    }

    #[test]
    fn test_fault_surfaces_once_then_halts() {
        let (mut m, mut c, t0) = setup(&[0x00, 0xee], 1000);
        assert_eq!(
            c.update(&mut m, t0 + ms(1)),
            Err(Fault::StackUnderflow { pc: 0x200 })
        );
        assert_eq!(CycleController::state(&m), RunState::Halted);
        assert_eq!(c.update(&mut m, t0 + ms(2)), Ok(Tick::default()));
    }

    #[test]
    fn test_gate_resyncs_when_far_behind() {
        let t0 = Instant::now();
        let mut last = t0;
        assert!(gate(&mut last, ms(10), t0 + ms(15)));
        assert_eq!(last, t0 + ms(10));
        assert!(gate(&mut last, ms(10), t0 + ms(100)));
        assert_eq!(last, t0 + ms(100));
    }
}
