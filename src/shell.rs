use core::fmt::Write;

use heapless::String as HString;

use crate::app::{AppContext, AppSignal, Application, MENU_ENTRIES};
use crate::calculator::Calculator;
use crate::display::{CellSink, Display, HIGHLIGHT_ATTRIBUTE, WIDTH};
use crate::editor::Editor;
use crate::keyboard::{InputDevice, InputEvent, InputSource, SpecialKey};
use crate::store::{BlobStore, SLOT_COUNT};
use crate::wordgame::WordGame;
use crate::{OS_NAME, OS_VERSION};

const MENU_TOP: usize = 6;
const MENU_LEFT: usize = 24;
const MENU_RIGHT: usize = 55;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActiveApp {
    Calculator,
    Editor,
    WordGame,
}

impl ActiveApp {
    fn from_key(ch: char) -> Option<Self> {
        let entry = MENU_ENTRIES.iter().position(|e| e.key == ch)?;
        [Self::Calculator, Self::Editor, Self::WordGame].get(entry).copied()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShellStep {
    Continue,
    Halt,
}

pub struct Shell<D: InputDevice> {
    input: InputSource<D>,
    display: Display,
    store: BlobStore,
    calculator: Calculator,
    editor: Editor,
    word_game: WordGame,
    active: Option<ActiveApp>,
}

impl<D: InputDevice> Shell<D> {
    pub fn new(device: D) -> Self {
        Self {
            input: InputSource::new(device),
            display: Display::new(),
            store: BlobStore::new(),
            calculator: Calculator::new(),
            editor: Editor::new(),
            word_game: WordGame::new(),
            active: None,
        }
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display {
        &mut self.display
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn active(&self) -> Option<ActiveApp> {
        self.active
    }

    fn with_app<R>(&mut self, which: ActiveApp, f: impl FnOnce(&mut dyn Application, &mut AppContext) -> R) -> R {
        let app: &mut dyn Application = match which {
            ActiveApp::Calculator => &mut self.calculator,
            ActiveApp::Editor => &mut self.editor,
            ActiveApp::WordGame => &mut self.word_game,
        };
        let mut ctx = AppContext { display: &mut self.display, store: &mut self.store };
        f(app, &mut ctx)
    }

    pub fn draw_menu(&mut self) {
        let d = &mut self.display;
        d.clear();
        let mut banner: HString<WIDTH> = HString::new();
        let _ = write!(banner, " {} {}", OS_NAME, OS_VERSION);
        d.fill_at_attr(0, 0, WIDTH, b' ', HIGHLIGHT_ATTRIBUTE);
        d.write_at_attr(0, 0, banner.as_str(), HIGHLIGHT_ATTRIBUTE);

        let bottom = MENU_TOP + MENU_ENTRIES.len() + 5;
        d.draw_box(MENU_TOP, MENU_LEFT, bottom, MENU_RIGHT, Some(OS_NAME));
        d.write_at(MENU_TOP + 2, MENU_LEFT + 3, "Choose an application:");
        let mut row = MENU_TOP + 3;
        for entry in MENU_ENTRIES {
            let mut line: HString<WIDTH> = HString::new();
            let _ = write!(line, "[{}] {}", entry.key, entry.label);
            d.write_at(row, MENU_LEFT + 5, line.as_str());
            row += 1;
        }
        d.write_at(row + 1, MENU_LEFT + 5, "[Esc] Halt");

        let mut usage: HString<WIDTH> = HString::new();
        let _ = write!(usage, "Store: {}/{} blobs", self.store.len(), SLOT_COUNT);
        d.write_at(bottom + 2, MENU_LEFT + 3, usage.as_str());
        d.move_cursor_to(bottom + 4, 0);
    }

    fn draw_halt(&mut self) {
        let d = &mut self.display;
        d.clear();
        d.write_line("System halted. It is now safe to power off.");
    }

    fn launch(&mut self, which: ActiveApp) {
        let title = self.with_app(which, |app, ctx| {
            app.enter(ctx);
            app.title()
        });
        klog!("shell: enter {}", title);
        self.active = Some(which);
    }

    pub fn step(&mut self, evt: &InputEvent) -> ShellStep {
        if let Some(which) = self.active {
            let (signal, title) = self.with_app(which, |app, ctx| (app.handle_event(ctx, evt), app.title()));
            if signal == AppSignal::ReturnToMenu {
                klog!("shell: exit {}", title);
                self.active = None;
                self.draw_menu();
            }
            return ShellStep::Continue;
        }

        if evt.is_special(SpecialKey::Escape) {
            return ShellStep::Halt;
        }
        if let Some(which) = evt.printable.and_then(ActiveApp::from_key) {
            self.launch(which);
        }
        ShellStep::Continue
    }

    pub fn run(&mut self, sink: &mut impl CellSink) {
        self.draw_menu();
        self.display.present(sink);
        loop {
            let evt = self.input.wait_event();
            if self.step(&evt) == ShellStep::Halt {
                break;
            }
            self.display.present(sink);
        }
        klog!("shell: halt requested");
        self.draw_halt();
        self.display.present(sink);
    }
}
