use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// left-hand side of a qwerty keyboard, laid out like the COSMAC VIP's
/// hex keypad
///   1 2 3 C      1 2 3 4
///   4 5 6 D  <-  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x0c),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('r', 0x0d),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('f', 0x0e),
    ('z', 0x0a),
    ('x', 0x00),
    ('c', 0x0b),
    ('v', 0x0f),
];

/// terminals only report presses, so a key counts as held for this long
/// after its last press (or auto-repeat) event
const KEY_HOLD: Duration = Duration::from_millis(200);

/// Requests aimed at the host loop rather than the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    TogglePause,
    Step,
    Reset,
    Faster,
    Slower,
    Quit,
}

/// One sample of the input device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub keys: [bool; 16],
    pub commands: Vec<HostCommand>,
    pub warnings: Vec<String>,
}

/// reads keypresses
pub trait Input {
    /// sample which of the 16 keys are down, and drain any host commands
    fn poll(&mut self, now: Instant) -> Result<InputFrame, io::Error>;
}

/// implementation of Input using crossterm in raw mode
pub struct TermInput {
    keymap: HashMap<char, u8>,
    last_press: [Option<Instant>; 16],
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_press: [None; 16],
        })
    }

    fn handle(&mut self, code: KeyCode, now: Instant, frame: &mut InputFrame) {
        match code {
            KeyCode::Char(c) => {
                let c = c.to_ascii_lowercase();
                match self.keymap.get(&c) {
                    Some(&key) => self.last_press[key as usize] = Some(now),
                    None => match command_for(c) {
                        Some(command) => frame.commands.push(command),
                        None => frame
                            .warnings
                            .push(format!("Warning: can't map {:?} to a CHIP-8 key", c)),
                    },
                }
            }
            KeyCode::F(5) => frame.commands.push(HostCommand::Reset),
            KeyCode::Esc => frame.commands.push(HostCommand::Quit),
            _ => frame
                .warnings
                .push("Warning: unknown key event received".to_owned()),
        }
    }
}

fn command_for(c: char) -> Option<HostCommand> {
    match c {
        ' ' => Some(HostCommand::TogglePause),
        '.' => Some(HostCommand::Step),
        '+' | '=' => Some(HostCommand::Faster),
        '-' | '_' => Some(HostCommand::Slower),
        _ => None,
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self, now: Instant) -> Result<InputFrame, io::Error> {
        let mut frame = InputFrame::default();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => self.handle(evt.code, now, &mut frame),
                Event::Resize(..) => {}
                _ => frame
                    .warnings
                    .push("Warning: unknown event received".to_owned()),
            }
        }
        frame.keys = held_keys(&self.last_press, now);
        Ok(frame)
    }
}

fn held_keys(last_press: &[Option<Instant>; 16], now: Instant) -> [bool; 16] {
    let mut keys = [false; 16];
    for (key, pressed) in keys.iter_mut().zip(last_press) {
        *key = matches!(pressed, Some(t) if now.saturating_duration_since(*t) < KEY_HOLD);
    }
    keys
}

/// expand a list of key numbers into a keypad sample
pub fn key_array(keys: &[u8]) -> [bool; 16] {
    let mut sample = [false; 16];
    for &k in keys {
        sample[(k & 0xf) as usize] = true;
    }
    sample
}

/// dummy Input implementation for testing; replays a script of frames, then
/// keeps reporting every key up
pub struct DummyInput {
    script: Vec<InputFrame>,
}

impl DummyInput {
    pub fn new(frames: Vec<InputFrame>) -> Self {
        let mut script = frames;
        script.reverse();
        DummyInput { script }
    }

    /// a single frame with these keys down
    pub fn pressing(keys: &[u8]) -> Self {
        Self::new(vec![InputFrame {
            keys: key_array(keys),
            ..InputFrame::default()
        }])
    }
}

impl Input for DummyInput {
    fn poll(&mut self, _now: Instant) -> Result<InputFrame, io::Error> {
        Ok(self.script.pop().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_every_key() {
        let mut seen = [false; 16];
        for (_, key) in CHIP8_CONVENTIONAL_KEYMAP {
            seen[key as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_key_array() {
        let keys = key_array(&[0x0, 0x7, 0x1f]);
        assert!(keys[0x0] && keys[0x7] && keys[0xf]);
        assert_eq!(keys.iter().filter(|&&k| k).count(), 3);
    }

    #[test]
    fn test_keys_held_briefly_after_press() {
        let t0 = Instant::now();
        let mut last_press = [None; 16];
        last_press[0xa] = Some(t0);
        assert!(held_keys(&last_press, t0 + Duration::from_millis(50))[0xa]);
        assert!(!held_keys(&last_press, t0 + KEY_HOLD)[0xa]);
        assert!(!held_keys(&last_press, t0)[0xb]);
    }

    #[test]
    fn test_host_commands() {
        assert_eq!(command_for(' '), Some(HostCommand::TogglePause));
        assert_eq!(command_for('.'), Some(HostCommand::Step));
        assert_eq!(command_for('+'), Some(HostCommand::Faster));
        assert_eq!(command_for('-'), Some(HostCommand::Slower));
        assert_eq!(command_for('k'), None);
    }

    #[test]
    fn test_dummy_input_replays_script() -> Result<(), io::Error> {
        let now = Instant::now();
        let mut input = DummyInput::new(vec![
            InputFrame {
                keys: key_array(&[3]),
                ..InputFrame::default()
            },
            InputFrame {
                commands: vec![HostCommand::Quit],
                ..InputFrame::default()
            },
        ]);
        assert!(input.poll(now)?.keys[3]);
        assert_eq!(input.poll(now)?.commands, vec![HostCommand::Quit]);
        assert_eq!(input.poll(now)?, InputFrame::default());
        Ok(())
    }
}
