use pc_keyboard::{KeyCode, ScancodeSet, ScancodeSet1};
use x86_64::instructions::port::Port;

use crate::ps2;

pub const RELEASE_BIT: u8 = 0x80;

const PS2_ACK: u8 = 0xFA;
const PS2_RESEND: u8 = 0xFE;

pub trait InputDevice {
    fn poll(&mut self) -> Option<u8>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpecialKey {
    Escape,
    Enter,
    Backspace,
    F2,
    F3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub raw_code: u8,
    pub is_release: bool,
    pub printable: Option<char>,
    pub special: Option<SpecialKey>,
}

impl InputEvent {
    pub fn from_raw(raw_code: u8) -> Self {
        let (printable, special) = translate(raw_code);
        Self { raw_code, is_release: is_release(raw_code), printable, special }
    }

    pub fn is_special(&self, key: SpecialKey) -> bool {
        self.special == Some(key)
    }

    pub fn is_char(&self, ch: char) -> bool {
        self.printable == Some(ch)
    }
}

pub fn is_release(code: u8) -> bool {
    code & RELEASE_BIT != 0
}

pub fn translate(code: u8) -> (Option<char>, Option<SpecialKey>) {
    // Fresh decoder per code: the alphabet has no 0xE0-prefixed keys, so
    // there is no state worth carrying between calls.
    let mut decoder = ScancodeSet1::new();
    let key = match decoder.advance_state(code) {
        Ok(Some(evt)) => evt.code,
        _ => return (None, None),
    };
    match key {
        KeyCode::Escape => (None, Some(SpecialKey::Escape)),
        KeyCode::Return | KeyCode::NumpadEnter => (None, Some(SpecialKey::Enter)),
        KeyCode::Backspace => (None, Some(SpecialKey::Backspace)),
        KeyCode::F2 => (None, Some(SpecialKey::F2)),
        KeyCode::F3 => (None, Some(SpecialKey::F3)),
        other => (printable_for(other), None),
    }
}

fn printable_for(key: KeyCode) -> Option<char> {
    let ch = match key {
        KeyCode::Key1 => '1',
        KeyCode::Key2 => '2',
        KeyCode::Key3 => '3',
        KeyCode::Key4 => '4',
        KeyCode::Key5 => '5',
        KeyCode::Key6 => '6',
        KeyCode::Key7 => '7',
        KeyCode::Key8 => '8',
        KeyCode::Key9 => '9',
        KeyCode::Key0 => '0',
        KeyCode::Q => 'q',
        KeyCode::W => 'w',
        KeyCode::E => 'e',
        KeyCode::R => 'r',
        KeyCode::T => 't',
        KeyCode::Y => 'y',
        KeyCode::U => 'u',
        KeyCode::I => 'i',
        KeyCode::O => 'o',
        KeyCode::P => 'p',
        KeyCode::A => 'a',
        KeyCode::S => 's',
        KeyCode::D => 'd',
        KeyCode::F => 'f',
        KeyCode::G => 'g',
        KeyCode::H => 'h',
        KeyCode::J => 'j',
        KeyCode::K => 'k',
        KeyCode::L => 'l',
        KeyCode::Z => 'z',
        KeyCode::X => 'x',
        KeyCode::C => 'c',
        KeyCode::V => 'v',
        KeyCode::B => 'b',
        KeyCode::N => 'n',
        KeyCode::M => 'm',
        KeyCode::Spacebar => ' ',
        // '=' shares a key with '+'; without shift tracking it stands in for it.
        // The second '+' is numpad 0x4E, not 0x4C (numpad 5).
        KeyCode::OemPlus | KeyCode::NumpadAdd => '+',
        KeyCode::OemMinus | KeyCode::NumpadSubtract => '-',
        KeyCode::NumpadMultiply => '*',
        KeyCode::Oem2 | KeyCode::NumpadDivide => '/',
        _ => return None,
    };
    Some(ch)
}

pub struct Ps2Keyboard {
    data: Port<u8>,
    status: Port<u8>,
}

impl Ps2Keyboard {
    pub fn new() -> Self {
        Self { data: Port::new(ps2::DATA_PORT), status: Port::new(ps2::STATUS_PORT) }
    }
}

impl Default for Ps2Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDevice for Ps2Keyboard {
    fn poll(&mut self) -> Option<u8> {
        let status: u8 = unsafe { self.status.read() };
        if status & ps2::STATUS_OUT_FULL == 0 {
            return None;
        }
        let sc: u8 = unsafe { self.data.read() };
        if status & ps2::STATUS_AUX_DATA != 0 {
            return None;
        }
        if sc == PS2_ACK || sc == PS2_RESEND {
            return None;
        }
        Some(sc)
    }
}

pub struct InputSource<D: InputDevice> {
    device: D,
}

impl<D: InputDevice> InputSource<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn poll_event(&mut self) -> Option<InputEvent> {
        let code = self.device.poll()?;
        if is_release(code) {
            return None;
        }
        let evt = InputEvent::from_raw(code);
        crate::ktrace!("kbd: code={:#04x} char={:?} special={:?}", code, evt.printable, evt.special);
        Some(evt)
    }

    pub fn wait_event(&mut self) -> InputEvent {
        loop {
            if let Some(evt) = self.poll_event() {
                return evt;
            }
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SC_ESCAPE: u8 = 0x01;
    pub(crate) const SC_BACKSPACE: u8 = 0x0E;
    pub(crate) const SC_ENTER: u8 = 0x1C;
    pub(crate) const SC_SPACE: u8 = 0x39;
    pub(crate) const SC_F2: u8 = 0x3C;
    pub(crate) const SC_F3: u8 = 0x3D;

    pub(crate) fn scancode_for(ch: char) -> u8 {
        (0u8..0x80)
            .find(|&code| translate(code).0 == Some(ch))
            .unwrap_or_else(|| panic!("no scancode for {ch:?}"))
    }

    pub(crate) fn press(ch: char) -> InputEvent {
        InputEvent::from_raw(scancode_for(ch))
    }

    pub(crate) fn key(code: u8) -> InputEvent {
        InputEvent::from_raw(code)
    }

    pub(crate) struct ScriptedDevice {
        codes: Vec<u8>,
        next: usize,
    }

    impl ScriptedDevice {
        pub(crate) fn new(script: &[u8]) -> Self {
            Self { codes: script.to_vec(), next: 0 }
        }
    }

    impl InputDevice for ScriptedDevice {
        fn poll(&mut self) -> Option<u8> {
            let code = *self.codes.get(self.next)?;
            self.next += 1;
            Some(code)
        }
    }

    #[test]
    fn test_release_bit() {
        assert!(is_release(0x9C));
        assert!(!is_release(SC_ENTER));
    }

    #[test]
    fn test_special_keys() {
        assert_eq!(translate(SC_ESCAPE), (None, Some(SpecialKey::Escape)));
        assert_eq!(translate(SC_ENTER), (None, Some(SpecialKey::Enter)));
        assert_eq!(translate(SC_BACKSPACE), (None, Some(SpecialKey::Backspace)));
        assert_eq!(translate(SC_F2), (None, Some(SpecialKey::F2)));
        assert_eq!(translate(SC_F3), (None, Some(SpecialKey::F3)));
    }

    #[test]
    fn test_alphabet() {
        assert_eq!(translate(0x02).0, Some('1'));
        assert_eq!(translate(0x0B).0, Some('0'));
        assert_eq!(translate(0x1E).0, Some('a'));
        assert_eq!(translate(0x2C).0, Some('z'));
        assert_eq!(translate(SC_SPACE).0, Some(' '));
        assert_eq!(translate(0x35).0, Some('/'));
        assert_eq!(translate(0x37).0, Some('*'));
        for ch in "abcdefghijklmnopqrstuvwxyz0123456789".chars() {
            assert_eq!(translate(scancode_for(ch)).0, Some(ch));
        }
    }

    #[test]
    fn test_operators_have_two_keys() {
        assert_eq!(translate(0x0C).0, Some('-'));
        assert_eq!(translate(0x4A).0, Some('-'));
        assert_eq!(translate(0x0D).0, Some('+'));
        assert_eq!(translate(0x4E).0, Some('+'));
        assert_eq!(translate(0x4C), (None, None));
    }

    #[test]
    fn test_unmapped_codes_are_silent() {
        // Tab, left shift, caps lock, extended prefix.
        for code in [0x0F, 0x2A, 0x3A, 0xE0] {
            assert_eq!(translate(code), (None, None));
        }
    }

    #[test]
    fn test_poll_event_filters_releases() {
        let mut input = InputSource::new(ScriptedDevice::new(&[0x9E, 0x1E, 0x9E]));
        assert_eq!(input.poll_event(), None);
        let evt = input.poll_event().expect("press");
        assert!(evt.is_char('a'));
        assert!(!evt.is_release);
        assert_eq!(input.poll_event(), None);
        assert_eq!(input.poll_event(), None);
    }

    #[test]
    fn test_wait_event_skips_releases() {
        let mut input = InputSource::new(ScriptedDevice::new(&[0x81, 0x9C, SC_ESCAPE]));
        assert!(input.wait_event().is_special(SpecialKey::Escape));
    }
}
