use core::fmt::Write;

use heapless::String as HString;

use crate::app::{AppContext, AppSignal, Application};
use crate::display::{Display, WIDTH};
use crate::keyboard::{InputEvent, SpecialKey};

pub const MAX_ATTEMPTS: u8 = 6;

// None of these contain `h` or `v`, which are taken by the hint keys.
pub const WORDS: &[&str] = &[
    "kernel", "buffer", "memory", "pointer", "compiler", "display", "keyboard", "register", "integer",
    "scroll",
];

const VOWELS: [u8; 5] = [b'a', b'e', b'i', b'o', b'u'];

const WORD_ROW: usize = 4;
const GUESSED_ROW: usize = 7;
const ATTEMPTS_ROW: usize = 9;
const MESSAGE_ROW: usize = 12;
const TEXT_COL: usize = 4;
const FIELD_WIDTH: usize = WIDTH - TEXT_COL - 2;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LetterSet(u32);

impl LetterSet {
    pub fn contains(&self, letter: u8) -> bool {
        letter.is_ascii_lowercase() && self.0 & (1 << (letter - b'a')) != 0
    }

    pub fn insert(&mut self, letter: u8) -> bool {
        if !letter.is_ascii_lowercase() || self.contains(letter) {
            return false;
        }
        self.0 |= 1 << (letter - b'a');
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (b'a'..=b'z').filter(|c| self.contains(*c))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Won,
    Lost,
    ExitToMenu,
}

pub struct WordGame {
    phase: GamePhase,
    next_word: usize,
    current: usize,
    guessed: LetterSet,
    attempts_left: u8,
}

impl Default for WordGame {
    fn default() -> Self {
        Self::new()
    }
}

impl WordGame {
    pub const fn new() -> Self {
        Self { phase: GamePhase::Playing, next_word: 0, current: 0, guessed: LetterSet(0), attempts_left: MAX_ATTEMPTS }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    pub fn guessed(&self) -> LetterSet {
        self.guessed
    }

    fn secret(&self) -> &'static [u8] {
        WORDS[self.current].as_bytes()
    }

    fn is_solved(&self) -> bool {
        self.secret().iter().all(|c| self.guessed.contains(*c))
    }

    fn next_round(&mut self, d: &mut Display) {
        self.current = self.next_word;
        self.next_word = (self.next_word + 1) % WORDS.len();
        self.reset_round(d);
    }

    fn reset_round(&mut self, d: &mut Display) {
        self.guessed = LetterSet::default();
        self.attempts_left = MAX_ATTEMPTS;
        self.phase = GamePhase::Playing;
        klog!("wordgame: round {} ({} letters)", self.current, self.secret().len());
        self.draw_screen(d);
        self.draw_message(d, "Guess a letter.");
    }

    fn draw_screen(&self, d: &mut Display) {
        d.clear();
        d.draw_box(0, 0, 24, 79, Some("Word Game"));
        d.write_at(WORD_ROW - 2, TEXT_COL, "Guess the word one letter at a time.");
        d.write_at(20, TEXT_COL, "a-z guess   h hint   v vowel hint (hints cost one attempt)");
        d.write_at(21, TEXT_COL, "n next word (after a win)   r retry (after a loss)   Esc menu");
        self.draw_board(d);
    }

    fn draw_board(&self, d: &mut Display) {
        let mut masked: HString<FIELD_WIDTH> = HString::new();
        let _ = masked.push_str("Word:  ");
        for &c in self.secret() {
            let shown = if self.guessed.contains(c) { c as char } else { '_' };
            let _ = masked.push(shown);
            let _ = masked.push(' ');
        }
        d.write_field(WORD_ROW, TEXT_COL, FIELD_WIDTH, masked.as_str());

        let mut guessed: HString<FIELD_WIDTH> = HString::new();
        let _ = guessed.push_str("Guessed: ");
        for c in self.guessed.iter() {
            let _ = guessed.push(c as char);
            let _ = guessed.push(' ');
        }
        d.write_field(GUESSED_ROW, TEXT_COL, FIELD_WIDTH, guessed.as_str());

        let mut attempts: HString<FIELD_WIDTH> = HString::new();
        let _ = write!(attempts, "Attempts left: {}", self.attempts_left);
        d.write_field(ATTEMPTS_ROW, TEXT_COL, FIELD_WIDTH, attempts.as_str());
        d.move_cursor_to(MESSAGE_ROW, TEXT_COL);
    }

    fn draw_message(&self, d: &mut Display, msg: &str) {
        d.write_field(MESSAGE_ROW, TEXT_COL, FIELD_WIDTH, msg);
    }

    fn guess(&mut self, letter: u8) -> bool {
        if !self.guessed.insert(letter) {
            return false;
        }
        if !self.secret().contains(&letter) {
            self.attempts_left = self.attempts_left.saturating_sub(1);
        }
        true
    }

    fn reveal(&mut self, letter: u8) {
        self.guessed.insert(letter);
        self.attempts_left = self.attempts_left.saturating_sub(1);
    }

    fn hint(&mut self) -> bool {
        let guessed = self.guessed;
        match self.secret().iter().copied().find(|c| !guessed.contains(*c)) {
            Some(letter) => {
                self.reveal(letter);
                true
            }
            None => false,
        }
    }

    fn vowel_hint(&mut self) -> bool {
        let secret = self.secret();
        let guessed = self.guessed;
        match VOWELS.iter().copied().find(|v| secret.contains(v) && !guessed.contains(*v)) {
            Some(vowel) => {
                self.reveal(vowel);
                true
            }
            None => self.hint(),
        }
    }

    fn settle(&mut self, d: &mut Display) {
        if self.is_solved() {
            self.phase = GamePhase::Won;
            klog!("wordgame: won round {} with {} attempts left", self.current, self.attempts_left);
            self.draw_board(d);
            self.draw_message(d, "You got it! Press n for the next word.");
        } else if self.attempts_left == 0 {
            self.phase = GamePhase::Lost;
            klog!("wordgame: lost round {}", self.current);
            self.draw_board(d);
            self.draw_message(d, "Out of attempts. Press r to retry.");
        } else {
            self.draw_board(d);
        }
    }

    fn handle_playing(&mut self, d: &mut Display, ch: char) {
        let changed = match ch {
            'h' => self.hint(),
            'v' => self.vowel_hint(),
            c if c.is_ascii_lowercase() => {
                let fresh = self.guess(c as u8);
                if !fresh {
                    self.draw_message(d, "Already guessed.");
                } else if self.secret().contains(&(c as u8)) {
                    self.draw_message(d, "Yes!");
                } else {
                    self.draw_message(d, "No.");
                }
                fresh
            }
            _ => false,
        };
        if changed {
            self.settle(d);
        }
    }
}

impl Application for WordGame {
    fn title(&self) -> &'static str {
        "Word Game"
    }

    fn enter(&mut self, ctx: &mut AppContext) {
        self.next_round(ctx.display);
    }

    fn handle_event(&mut self, ctx: &mut AppContext, evt: &InputEvent) -> AppSignal {
        if evt.is_special(SpecialKey::Escape) || self.phase == GamePhase::ExitToMenu {
            self.phase = GamePhase::ExitToMenu;
            return AppSignal::ReturnToMenu;
        }
        let Some(ch) = evt.printable else {
            return AppSignal::Continue;
        };
        let d = &mut *ctx.display;
        match self.phase {
            GamePhase::Playing => self.handle_playing(d, ch),
            GamePhase::Won if ch == 'n' => self.next_round(d),
            GamePhase::Lost if ch == 'r' => self.reset_round(d),
            _ => {}
        }
        AppSignal::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::tests::{key, press, SC_ESCAPE};
    use crate::store::BlobStore;

    struct Rig {
        display: Display,
        store: BlobStore,
        game: WordGame,
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Self { display: Display::new(), store: BlobStore::new(), game: WordGame::new() };
            let mut ctx = AppContext { display: &mut rig.display, store: &mut rig.store };
            rig.game.enter(&mut ctx);
            rig
        }

        fn send(&mut self, evt: InputEvent) -> AppSignal {
            let mut ctx = AppContext { display: &mut self.display, store: &mut self.store };
            self.game.handle_event(&mut ctx, &evt)
        }

        fn screen_contains(&self, needle: &str) -> bool {
            (0..crate::display::HEIGHT).any(|row| self.display.row_text(row).contains(needle))
        }
    }

    fn wrong_letters(secret: &str) -> Vec<char> {
        ('a'..='z').filter(|c| *c != 'h' && *c != 'v' && !secret.contains(*c)).collect()
    }

    #[test]
    fn test_words_avoid_hint_keys() {
        for word in WORDS {
            assert!(!word.contains('h') && !word.contains('v'), "{word}");
            assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_letter_set() {
        let mut set = LetterSet::default();
        assert!(set.insert(b'k'));
        assert!(!set.insert(b'k'));
        assert!(!set.insert(b'K'));
        assert!(set.contains(b'k'));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![b'k']);
    }

    #[test]
    fn test_guessing_every_letter_wins() {
        let mut rig = Rig::new();
        assert_eq!(WORDS[0], "kernel");
        for ch in "kernl".chars() {
            rig.send(press(ch));
        }
        assert_eq!(rig.game.phase(), GamePhase::Won);
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS);
        assert!(rig.screen_contains("k e r n e l"));
    }

    #[test]
    fn test_six_misses_lose_without_revealing() {
        let mut rig = Rig::new();
        rig.send(press('e'));
        for ch in wrong_letters("kernel").into_iter().take(MAX_ATTEMPTS as usize) {
            assert_eq!(rig.game.phase(), GamePhase::Playing);
            rig.send(press(ch));
        }
        assert_eq!(rig.game.phase(), GamePhase::Lost);
        assert_eq!(rig.game.attempts_left(), 0);
        assert!(!rig.screen_contains("kernel"));
        assert!(rig.screen_contains("_ e _ _ e _"));

        // Further guesses are ignored until retry.
        rig.send(press('k'));
        assert!(!rig.game.guessed().contains(b'k'));
    }

    #[test]
    fn test_repeat_guess_is_free() {
        let mut rig = Rig::new();
        rig.send(press('z'));
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS - 1);
        rig.send(press('z'));
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS - 1);
        assert!(rig.screen_contains("Already guessed."));
    }

    #[test]
    fn test_hint_reveals_leftmost_unguessed() {
        let mut rig = Rig::new();
        rig.send(press('k'));
        rig.send(press('h'));
        assert!(rig.game.guessed().contains(b'e'));
        assert!(!rig.game.guessed().contains(b'r'));
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS - 1);
    }

    #[test]
    fn test_vowel_hint_then_fallback() {
        let mut rig = Rig::new();
        rig.send(press('v'));
        assert!(rig.game.guessed().contains(b'e'));
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS - 1);
        // "kernel" has no other vowel, so this behaves like a plain hint.
        rig.send(press('v'));
        assert!(rig.game.guessed().contains(b'k'));
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS - 2);
    }

    #[test]
    fn test_hint_can_finish_the_word() {
        let mut rig = Rig::new();
        for ch in "kern".chars() {
            rig.send(press(ch));
        }
        rig.send(press('h'));
        assert_eq!(rig.game.phase(), GamePhase::Won);
    }

    #[test]
    fn test_retry_keeps_word_and_next_advances() {
        let mut rig = Rig::new();
        for ch in wrong_letters("kernel").into_iter().take(MAX_ATTEMPTS as usize) {
            rig.send(press(ch));
        }
        assert_eq!(rig.game.phase(), GamePhase::Lost);
        rig.send(press('r'));
        assert_eq!(rig.game.phase(), GamePhase::Playing);
        assert_eq!(rig.game.attempts_left(), MAX_ATTEMPTS);
        assert_eq!(rig.game.guessed(), LetterSet::default());

        for ch in "kernl".chars() {
            rig.send(press(ch));
        }
        assert_eq!(rig.game.phase(), GamePhase::Won);
        rig.send(press('n'));
        assert_eq!(rig.game.phase(), GamePhase::Playing);
        assert_eq!(rig.game.secret(), WORDS[1].as_bytes());
    }

    #[test]
    fn test_word_index_wraps_and_persists() {
        let mut rig = Rig::new();
        for _ in 0..WORDS.len() {
            let mut ctx = AppContext { display: &mut rig.display, store: &mut rig.store };
            rig.game.enter(&mut ctx);
        }
        assert_eq!(rig.game.secret(), WORDS[0].as_bytes());
    }

    #[test]
    fn test_escape_from_any_phase() {
        let mut rig = Rig::new();
        assert_eq!(rig.send(key(SC_ESCAPE)), AppSignal::ReturnToMenu);
        assert_eq!(rig.game.phase(), GamePhase::ExitToMenu);
    }
}
