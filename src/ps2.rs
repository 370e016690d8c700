use x86_64::instructions::port::Port;

pub const STATUS_PORT: u16 = 0x64;
pub const DATA_PORT: u16 = 0x60;

const CMD_READ_CTRL: u8 = 0x20;
const CMD_WRITE_CTRL: u8 = 0x60;
const CMD_DISABLE_PORT1: u8 = 0xAD;
const CMD_DISABLE_PORT2: u8 = 0xA7;
const CMD_ENABLE_PORT1: u8 = 0xAE;

pub const STATUS_OUT_FULL: u8 = 0x01;
const STATUS_IN_FULL: u8 = 0x02;
pub const STATUS_AUX_DATA: u8 = 0x20;

// Controller configuration byte.
const CTRL_PORT1_IRQ: u8 = 0x01;
const CTRL_PORT2_IRQ: u8 = 0x02;
const CTRL_PORT2_CLOCK_OFF: u8 = 0x20;
const CTRL_TRANSLATE: u8 = 0x40;

const SPIN_LIMIT: u32 = 100_000;

fn status() -> u8 {
    unsafe { Port::<u8>::new(STATUS_PORT).read() }
}

fn data() -> u8 {
    unsafe { Port::<u8>::new(DATA_PORT).read() }
}

// Spins until the status bits in `mask` read as `set`, or gives up.
fn wait_status(mask: u8, set: bool) -> bool {
    (0..SPIN_LIMIT).any(|_| (status() & mask != 0) == set)
}

fn send(port: u16, byte: u8) {
    let _ = wait_status(STATUS_IN_FULL, false);
    unsafe { Port::<u8>::new(port).write(byte) };
}

pub fn flush_output() {
    while status() & STATUS_OUT_FULL != 0 {
        let _ = data();
    }
}

// Only the keyboard port stays live, translating to set 1 with IRQs masked.
pub fn init_controller() -> bool {
    send(STATUS_PORT, CMD_DISABLE_PORT1);
    send(STATUS_PORT, CMD_DISABLE_PORT2);
    flush_output();

    send(STATUS_PORT, CMD_READ_CTRL);
    if !wait_status(STATUS_OUT_FULL, true) {
        return false;
    }
    let mut ctrl = data();
    ctrl |= CTRL_TRANSLATE | CTRL_PORT2_CLOCK_OFF;
    ctrl &= !(CTRL_PORT1_IRQ | CTRL_PORT2_IRQ);

    send(STATUS_PORT, CMD_WRITE_CTRL);
    send(DATA_PORT, ctrl);

    send(STATUS_PORT, CMD_ENABLE_PORT1);
    flush_output();
    true
}
