#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod serial;

pub mod app;
pub mod calculator;
pub mod display;
pub mod editor;
pub mod keyboard;
pub mod ps2;
pub mod shell;
pub mod status;
pub mod store;
pub mod vga;
pub mod wordgame;

pub const OS_NAME: &str = "MiniOS";
pub const OS_VERSION: &str = "0.3.1";
