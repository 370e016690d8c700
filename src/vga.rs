use core::ptr;

use x86_64::instructions::port::Port;

use crate::display::{Cell, CellSink, CursorPosition, HEIGHT, WIDTH};

pub const VGA_PHYS_ADDR: u64 = 0xB8000;

const CRTC_INDEX: u16 = 0x3D4;
const CRTC_DATA: u16 = 0x3D5;
const CRTC_CURSOR_HIGH: u8 = 0x0E;
const CRTC_CURSOR_LOW: u8 = 0x0F;

pub struct VgaTextBuffer {
    base: *mut u16,
    crtc_index: Port<u8>,
    crtc_data: Port<u8>,
}

impl VgaTextBuffer {
    /// # Safety
    ///
    /// `virt_addr` must map the VGA text buffer (physical 0xB8000) and no
    /// other live reference may alias it.
    pub unsafe fn new(virt_addr: u64) -> Self {
        Self {
            base: virt_addr as *mut u16,
            crtc_index: Port::new(CRTC_INDEX),
            crtc_data: Port::new(CRTC_DATA),
        }
    }
}

impl CellSink for VgaTextBuffer {
    fn write_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if row >= HEIGHT || col >= WIDTH {
            return;
        }
        unsafe {
            ptr::write_volatile(self.base.add(row * WIDTH + col), cell.to_vga());
        }
    }

    fn set_cursor(&mut self, pos: CursorPosition) {
        let offset = (pos.row.min(HEIGHT - 1) * WIDTH + pos.col.min(WIDTH - 1)) as u16;
        unsafe {
            self.crtc_index.write(CRTC_CURSOR_HIGH);
            self.crtc_data.write((offset >> 8) as u8);
            self.crtc_index.write(CRTC_CURSOR_LOW);
            self.crtc_data.write((offset & 0xFF) as u8);
        }
    }
}
