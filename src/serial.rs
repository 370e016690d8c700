use core::fmt;

#[cfg(not(test))]
use core::fmt::Write;
#[cfg(not(test))]
use lazy_static::lazy_static;
#[cfg(not(test))]
use spin::Mutex;
#[cfg(not(test))]
use uart_16550::SerialPort;

#[cfg(not(test))]
lazy_static! {
    static ref SERIAL1: Mutex<SerialPort> = {
        let mut serial_port = unsafe { SerialPort::new(0x3F8) };
        serial_port.init();
        Mutex::new(serial_port)
    };
}

pub fn write(msg: &str) {
    log(format_args!("{}", msg));
}

#[cfg(not(test))]
pub fn log(args: fmt::Arguments) {
    let mut serial = SERIAL1.lock();
    let _ = serial.write_fmt(args);
    serial.send(b'\r');
    serial.send(b'\n');
}

#[cfg(test)]
pub fn log(_args: fmt::Arguments) {}

/// Like [`write`], but gives up instead of spinning when the port is held.
/// The panic handler uses this so a panic inside a log call cannot deadlock.
#[cfg(not(test))]
pub fn write_try(msg: &str) {
    let Some(mut serial) = SERIAL1.try_lock() else {
        return;
    };
    for byte in msg.bytes() {
        serial.send(byte);
    }
    serial.send(b'\r');
    serial.send(b'\n');
}

#[cfg(test)]
pub fn write_try(_msg: &str) {}

#[macro_export]
macro_rules! klog {
    ($($arg:tt)*) => {
        $crate::serial::log(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {
        if cfg!(feature = "log") {
            $crate::serial::log(format_args!($($arg)*))
        }
    };
}
