#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod kernel {
    use core::fmt::Write;
    use core::panic::PanicInfo;
    use core::sync::atomic::{AtomicU64, Ordering};

    use bootloader_api::{config::BootloaderConfig, entry_point, BootInfo};
    use heapless::String as HString;

    use minios::display::{Display, HIGHLIGHT_ATTRIBUTE};
    use minios::keyboard::Ps2Keyboard;
    use minios::shell::Shell;
    use minios::vga::{VgaTextBuffer, VGA_PHYS_ADDR};
    use minios::{klog, ps2, serial, OS_NAME, OS_VERSION};

    static BOOTLOADER_CONFIG: BootloaderConfig = {
        let mut cfg = BootloaderConfig::new_default();
        cfg.mappings.physical_memory =
            Some(bootloader_api::config::Mapping::FixedAddress(0xffff_8000_0000_0000));
        cfg
    };

    entry_point!(kernel_main, config = &BOOTLOADER_CONFIG);

    // Virtual address of the text buffer, kept for the panic handler.
    static VGA_VIRT: AtomicU64 = AtomicU64::new(VGA_PHYS_ADDR);

    fn kernel_main(boot_info: &'static mut BootInfo) -> ! {
        klog!("{} {} booting", OS_NAME, OS_VERSION);
        let phys_offset = boot_info.physical_memory_offset.into_option().unwrap_or(0);
        VGA_VIRT.store(phys_offset + VGA_PHYS_ADDR, Ordering::Relaxed);

        let ps2_ok = ps2::init_controller();
        klog!("ps2: controller init {}", if ps2_ok { "ok" } else { "failed" });

        let mut screen = unsafe { VgaTextBuffer::new(VGA_VIRT.load(Ordering::Relaxed)) };
        let mut shell = Shell::new(Ps2Keyboard::new());
        shell.run(&mut screen);

        serial::write("halted");
        halt_loop()
    }

    fn halt_loop() -> ! {
        loop {
            x86_64::instructions::hlt();
        }
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        x86_64::instructions::interrupts::disable();
        let mut msg: HString<256> = HString::new();
        let _ = write!(msg, "{}", info);
        serial::write_try("=== KERNEL PANIC ===");
        serial::write_try(msg.as_str());

        let mut d = Display::new();
        d.clear();
        d.set_attribute(HIGHLIGHT_ATTRIBUTE);
        d.write_line("=== KERNEL PANIC ===");
        d.set_attribute(minios::display::DEFAULT_ATTRIBUTE);
        d.write_line(msg.as_str());
        d.write_line("System halted.");
        let mut screen = unsafe { VgaTextBuffer::new(VGA_VIRT.load(Ordering::Relaxed)) };
        d.present(&mut screen);

        halt_loop()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!(
        "{} {} is a bare-metal kernel; build it for x86_64-unknown-none and boot the image.",
        minios::OS_NAME,
        minios::OS_VERSION
    );
    std::process::exit(1);
}
