//! End-to-end scenarios driven through the public API only.

use chip8::memory::{MemoryMap, CHIP8_FONT, CHIP8_FONT_ADDR};
use chip8::{Chip8Config, Chip8Error, Chip8Interpreter, CycleController, Fault, RunState, StepOutcome};
use std::time::{Duration, Instant};

fn machine(program: &[u8]) -> Chip8Interpreter {
    let mut m = Chip8Interpreter::with_seed(42);
    m.load_image(program).expect("program fits");
    m
}

#[test]
fn set_then_add_immediate() -> Result<(), Fault> {
    let mut m = machine(&[0x6a, 0x05, 0x7a, 0x0b]);
    m.step()?;
    m.step()?;
    assert_eq!(m.registers()[0xa], 16);
    assert_eq!(m.program_counter(), 0x204);
    assert_eq!(m.registers()[0xf], 0);
    Ok(())
}

#[test]
fn draw_font_glyph_at_origin() -> Result<(), Fault> {
    // I = glyph for "8", V0 = V1 = 0, DRW V0, V1, 5
    let glyph = CHIP8_FONT_ADDR + 8 * 5;
    let mut m = machine(&[0xa0 | (glyph >> 8) as u8, glyph as u8, 0xd0, 0x15]);
    m.step()?;
    m.step()?;
    let bits = &CHIP8_FONT[40..45];
    for y in 0..32 {
        for x in 0..64 {
            let expected = y < 5 && x < 8 && bits[y] & (0x80 >> x) != 0;
            assert_eq!(m.pixel(x, y), expected, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(m.registers()[0xf], 0);
    Ok(())
}

#[test]
fn clear_leaves_blank_screen() -> Result<(), Fault> {
    let mut m = machine(&[0x00, 0xe0]);
    m.step()?;
    assert!(m.display().iter().all(|&p| !p));
    assert_eq!(m.display().len(), 2048);
    Ok(())
}

#[test]
fn zero_word_clears_lit_screen() -> Result<(), Fault> {
    // I = glyph "0", DRW V0, V0, 5, then a bare 0x0000
    let mut m = machine(&[0xa0, 0x50, 0xd0, 0x05, 0x00, 0x00]);
    m.step()?;
    m.step()?;
    assert!(m.pixel(0, 0));
    m.step()?;
    assert!(m.display().iter().all(|&p| !p));
    assert_eq!(m.unknown_opcode_count(), 0);
    Ok(())
}

#[test]
fn register_compare_skips_regardless_of_low_nibble() -> Result<(), Fault> {
    // VA = VB = 3, then 5AB1 skips the 0x0123 that follows
    let mut m = machine(&[0x6a, 0x03, 0x6b, 0x03, 0x5a, 0xb1, 0x01, 0x23]);
    for _ in 0..3 {
        m.step()?;
    }
    assert_eq!(m.program_counter(), 0x208);
    assert_eq!(m.unknown_opcode_count(), 0);
    Ok(())
}

#[test]
fn call_return_round_trip() -> Result<(), Fault> {
    // 0x200: CALL 0x300 ... 0x300: RET
    let mut program = vec![0u8; 0x102];
    program[0..2].copy_from_slice(&[0x23, 0x00]);
    program[0x100..0x102].copy_from_slice(&[0x00, 0xee]);
    let mut m = machine(&program);
    m.step()?;
    m.step()?;
    assert_eq!(m.program_counter(), 0x202);
    assert!(m.stack().is_empty());
    Ok(())
}

#[test]
fn sixteen_nested_calls_then_overflow() {
    // each CALL targets the next word
    let mut program = Vec::new();
    for i in 0..17u16 {
        let target = 0x200 + 2 * (i + 1);
        program.extend_from_slice(&(0x2000 | target).to_be_bytes());
    }
    let mut m = machine(&program);
    for _ in 0..16 {
        assert!(matches!(m.step(), Ok(StepOutcome::Executed(_))));
    }
    assert_eq!(m.stack().len(), 16);
    assert_eq!(m.step(), Err(Fault::StackOverflow { pc: 0x220 }));
    assert_eq!(CycleController::state(&m), RunState::Halted);
}

#[test]
fn return_on_empty_stack_underflows() {
    let mut m = machine(&[0x00, 0xee]);
    assert_eq!(m.step(), Err(Fault::StackUnderflow { pc: 0x200 }));
    assert_eq!(m.fault(), Some(&Fault::StackUnderflow { pc: 0x200 }));
}

#[test]
fn key_wait_resumes_after_press() -> Result<(), Fault> {
    let config = Chip8Config::new(1000).with_seed(1);
    let mut m = Chip8Interpreter::from_config(&config);
    m.load_image(&[0xf0, 0x0a, 0x70, 0x01]).expect("program fits");
    let t0 = Instant::now();
    let mut c = CycleController::new(&config, t0);

    c.update(&mut m, t0 + Duration::from_millis(1))?;
    assert_eq!(CycleController::state(&m), RunState::AwaitingKey(0));
    assert_eq!(m.program_counter(), 0x202);

    for ms in 2..20 {
        c.update(&mut m, t0 + Duration::from_millis(ms))?;
    }
    assert_eq!(m.program_counter(), 0x202);
    assert_eq!(m.cycles(), 1);

    m.set_key(7, true);
    let tick = c.update(&mut m, t0 + Duration::from_millis(20))?;
    assert_eq!(tick.key, Some(7));
    // V0 = 7, then the following instruction adds 1
    assert_eq!(m.registers()[0], 8);
    assert_eq!(m.program_counter(), 0x204);
    Ok(())
}

#[test]
fn delay_timer_counts_down_and_stops() -> Result<(), Fault> {
    let mut m = machine(&[0x60, 0x03, 0xf0, 0x15]);
    m.step()?;
    m.step()?;
    for _ in 0..3 {
        m.tick_timers();
    }
    assert_eq!(m.timers().delay, 0);
    m.tick_timers();
    assert_eq!(m.timers().delay, 0);
    Ok(())
}

#[test]
fn unknown_opcodes_never_crash() -> Result<(), Fault> {
    let mut m = machine(&[0x01, 0x23, 0x8a, 0xbf, 0xe1, 0x00, 0xf1, 0x00]);
    for _ in 0..4 {
        assert!(matches!(m.step()?, StepOutcome::Unknown(_)));
    }
    assert_eq!(m.program_counter(), 0x208);
    assert_eq!(m.unknown_opcode_count(), 4);
    Ok(())
}

#[test]
fn rom_file_errors() {
    let mut m = Chip8Interpreter::with_seed(0);
    assert!(matches!(
        m.load_rom_file("/definitely/not/a/rom.ch8"),
        Err(Chip8Error::RomUnreadable(_))
    ));
    let mut big: &[u8] = &[0u8; 4096];
    assert!(matches!(
        m.load_program(&mut big),
        Err(Chip8Error::RomTooLarge { size: 4096, max: 3584 })
    ));
}

#[test]
fn separate_machines_do_not_share_state() -> Result<(), Fault> {
    let mut a = machine(&[0x6a, 0x05]);
    let b = machine(&[0x6a, 0x05]);
    a.step()?;
    assert_eq!(a.registers()[0xa], 5);
    assert_eq!(b.registers()[0xa], 0);
    assert_eq!(b.memory().get_word(0x200)?, 0x6a05);
    Ok(())
}
