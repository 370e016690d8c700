use crate::display::Display;
use crate::keyboard::InputEvent;
use crate::store::BlobStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppSignal {
    Continue,
    ReturnToMenu,
}

pub struct AppContext<'a> {
    pub display: &'a mut Display,
    pub store: &'a mut BlobStore,
}

pub trait Application {
    fn title(&self) -> &'static str;

    fn enter(&mut self, ctx: &mut AppContext);

    fn handle_event(&mut self, ctx: &mut AppContext, evt: &InputEvent) -> AppSignal;
}

pub struct AppDescriptor {
    pub key: char,
    pub label: &'static str,
}

pub const MENU_ENTRIES: &[AppDescriptor] = &[
    AppDescriptor { key: 'c', label: "Calculator" },
    AppDescriptor { key: 'e', label: "Text Editor" },
    AppDescriptor { key: 'w', label: "Word Game" },
];
