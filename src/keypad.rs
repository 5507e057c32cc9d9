/// The 16-key hex keypad, sampled twice so a fresh press can be told apart
/// from a key that is being held.
#[derive(Debug, Clone, Default)]
pub struct Keypad {
    keys: [bool; 16],
    previous: [bool; 16],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self, key: u8) -> bool {
        self.keys[(key & 0xf) as usize]
    }

    pub fn set_key(&mut self, key: u8, down: bool) {
        self.keys[(key & 0xf) as usize] = down;
    }

    pub fn set_all(&mut self, keys: [bool; 16]) {
        self.keys = keys;
    }

    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }

    /// lowest key that went from up to down since the last `latch`
    pub fn newly_pressed(&self) -> Option<u8> {
        (0..16u8).find(|&k| self.keys[k as usize] && !self.previous[k as usize])
    }

    /// remember the current sample as the previous one
    pub fn latch(&mut self) {
        self.previous = self.keys;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_masked() {
        let mut k = Keypad::new();
        k.set_key(0x17, true);
        assert!(k.is_down(0x7));
        assert!(k.is_down(0x27));
        assert!(!k.is_down(0x6));
    }

    #[test]
    fn test_press_is_edge_triggered() {
        let mut k = Keypad::new();
        k.set_key(0x7, true);
        assert_eq!(k.newly_pressed(), Some(0x7));
        k.latch();
        // still held: not a new press
        assert_eq!(k.newly_pressed(), None);
        k.set_key(0x7, false);
        k.latch();
        k.set_key(0x7, true);
        assert_eq!(k.newly_pressed(), Some(0x7));
    }

    #[test]
    fn test_release_is_not_a_press() {
        let mut k = Keypad::new();
        k.set_all([true; 16]);
        k.latch();
        k.set_key(0x3, false);
        assert_eq!(k.newly_pressed(), None);
    }
}
