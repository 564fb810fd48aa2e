use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
    definitions::{display, keyboard},
    InputError,
};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all from the pixels
    fn display(&mut self, framebuffer: &Framebuffer);
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the host keyboard
pub trait KeyboardCommands {
    /// Will return all the key transitions since the last call.
    fn poll(&mut self) -> Vec<KeyEvent>;
}

/// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
/// `(64 x 32)`. Every pixel is stored as a single byte that is either `0` or `1`, row by row.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Box<[u8; display::RESOLUTION]>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self {
            pixels: Box::new([0; display::RESOLUTION]),
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|&pixel| if pixel == 1 { '#' } else { '.' })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will set every pixel to `0`
    pub(crate) fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|pixel| *pixel = 0);
    }

    /// Will flip the pixel at the given coordinate and return true if it was
    /// turned off (a collision).
    pub(crate) fn toggle(&mut self, x: usize, y: usize) -> bool {
        debug_assert!(x < display::WIDTH && y < display::HEIGHT);
        let pixel = &mut self.pixels[y * display::WIDTH + x];
        *pixel ^= 1;
        *pixel == 0
    }

    /// Will return the pixel at the given coordinate, `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < display::WIDTH && y < display::HEIGHT {
            Some(self.pixels[y * display::WIDTH + x])
        } else {
            None
        }
    }

    /// All the pixels row by row.
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels[..]
    }

    /// Iterates over the rows, every row is `WIDTH` pixels long.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(display::WIDTH)
    }

    /// Is every pixel turned off.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&pixel| pixel == 0)
    }
}

/// Will represent the last set key with the previous
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    index: usize,
    last: bool,
    current: bool,
}

impl Key {
    fn new(index: usize, last: bool, current: bool) -> Self {
        Self {
            index,
            last,
            current,
        }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_last(&self) -> bool {
        self.last
    }

    pub fn get_current(&self) -> bool {
        self.current
    }

    /// Did the key go from released to pressed.
    pub fn is_press(&self) -> bool {
        !self.last && self.current
    }
}

/// Will store the last change to the given keyboard
/// and represent the internal keyboard as well
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
    last: Option<Key>,
    /// One bit per key that went down while a key press is awaited.
    presses: u16,
    /// Is an `FX0A` currently waiting for a key press.
    awaiting: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub(crate) fn reset(&mut self) {
        self.keys = [false; keyboard::SIZE];
        self.last = None;
        self.presses = 0;
        self.awaiting = false;
    }

    /// Will flag the key if it went down while a press is awaited.
    fn record_press(&mut self, key: usize, to: bool) {
        if self.awaiting && to && !self.keys[key] {
            self.presses |= 1 << key;
        }
    }

    pub fn set_key(&mut self, key: usize, to: bool) -> Result<(), InputError> {
        if key >= keyboard::SIZE {
            return Err(InputError::InvalidKey(key));
        }

        self.record_press(key, to);
        self.last = Some(Key::new(key, self.keys[key], to));
        self.keys[key] = to;
        Ok(())
    }

    pub fn set_mult(&mut self, keys: &[bool; keyboard::SIZE]) {
        for (key, &to) in keys.iter().enumerate() {
            self.record_press(key, to);
        }
        // remember the first newly pressed key
        if let Some(index) = (0..keyboard::SIZE).find(|&i| !self.keys[i] && keys[i]) {
            self.last = Some(Key::new(index, false, true));
        }
        self.keys = *keys;
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }

    /// The key is masked to the valid range `0-F`.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys[key & (keyboard::SIZE - 1)]
    }

    pub fn get_last(&self) -> Option<Key> {
        self.last
    }

    /// Will return the lowest key pressed since the wait started.
    ///
    /// The first call starts the wait and forgets all earlier presses, so only
    /// keys going down while waiting count. A release never clears a press.
    pub(crate) fn take_press(&mut self) -> Option<usize> {
        if !self.awaiting {
            self.awaiting = true;
            self.presses = 0;
            return None;
        }

        if self.presses == 0 {
            return None;
        }

        let key = self.presses.trailing_zeros() as usize;
        self.awaiting = false;
        self.presses = 0;
        Some(key)
    }
}

/// A single key transition reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: usize,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn new(key: usize, pressed: bool) -> Self {
        Self { key, pressed }
    }
}

/// A thread safe handle for feeding key transitions into a machine.
///
/// The events are applied in order at the start of the next step, so that
/// no instruction will ever see a half updated keyboard.
#[derive(Debug, Clone, Default)]
pub struct KeyQueue {
    events: Arc<Mutex<VecDeque<KeyEvent>>>,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: KeyEvent) {
        self.events.lock().push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub(crate) fn drain(&self) -> VecDeque<KeyEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_toggle() {
        let mut fb = Framebuffer::new();
        assert!(fb.is_blank());

        assert!(!fb.toggle(3, 4));
        assert_eq!(fb.get(3, 4), Some(1));
        assert!(fb.toggle(3, 4));
        assert_eq!(fb.get(3, 4), Some(0));

        assert_eq!(fb.get(display::WIDTH, 0), None);
        assert_eq!(fb.get(0, display::HEIGHT), None);
    }

    #[test]
    fn test_framebuffer_clear() {
        let mut fb = Framebuffer::new();
        fb.toggle(0, 0);
        fb.toggle(display::WIDTH - 1, display::HEIGHT - 1);
        assert_eq!(fb.as_slice()[display::RESOLUTION - 1], 1);
        fb.clear();
        assert!(fb.is_blank());
        assert_eq!(fb.rows().count(), display::HEIGHT);
    }

    #[test]
    fn test_set_key() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.set_key(0xA, true), Ok(()));
        assert!(keyboard.is_pressed(0xA));
        assert_eq!(keyboard.get_last(), Some(Key::new(0xA, false, true)));

        assert_eq!(
            keyboard.set_key(keyboard::SIZE, true),
            Err(InputError::InvalidKey(keyboard::SIZE))
        );
        // nothing else was touched
        assert_eq!(keyboard.get_keys().iter().filter(|&&k| k).count(), 1);
    }

    #[test]
    fn test_take_press() {
        let mut keyboard = Keyboard::new();
        // pressed before anyone waited
        keyboard.set_key(0x5, true).unwrap();
        assert_eq!(keyboard.take_press(), None);
        assert_eq!(keyboard.take_press(), None);

        // a release is not a press
        keyboard.set_key(0x5, false).unwrap();
        assert_eq!(keyboard.take_press(), None);

        keyboard.set_key(0x5, true).unwrap();
        assert_eq!(keyboard.take_press(), Some(0x5));
    }

    #[test]
    fn test_take_press_survives_release() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.take_press(), None);

        keyboard.set_key(0x9, true).unwrap();
        keyboard.set_key(0x9, false).unwrap();
        keyboard.set_key(0x2, true).unwrap();
        keyboard.set_key(0x4, false).unwrap();

        // the lowest key wins
        assert_eq!(keyboard.take_press(), Some(0x2));
        // a new wait starts from scratch
        assert_eq!(keyboard.take_press(), None);
        assert_eq!(keyboard.take_press(), None);
    }

    #[test]
    fn test_set_mult() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.take_press(), None);

        let mut keys = [false; keyboard::SIZE];
        keys[0x3] = true;
        keys[0xC] = true;
        keyboard.set_mult(&keys);
        assert_eq!(keyboard.get_keys(), &keys[..]);
        assert_eq!(keyboard.get_last(), Some(Key::new(0x3, false, true)));
        assert_eq!(keyboard.take_press(), Some(0x3));

        keyboard.reset();
        assert!(keyboard.get_keys().iter().all(|&k| !k));
    }

    #[test]
    fn test_key_queue_across_threads() {
        let queue = KeyQueue::new();
        let sender = queue.clone();
        std::thread::spawn(move || {
            sender.push(KeyEvent::new(0x1, true));
            sender.push(KeyEvent::new(0x1, false));
        })
        .join()
        .unwrap();

        let events: Vec<_> = queue.drain().into_iter().collect();
        assert_eq!(
            events,
            vec![KeyEvent::new(0x1, true), KeyEvent::new(0x1, false)]
        );
        assert!(queue.is_empty());
    }
}
