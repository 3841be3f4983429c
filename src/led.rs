//! Status LEDs
//!
//! [`Leds`] drives one or more LEDs that share a GPIO port. Each LED is a bit in the
//! port; a mask selects one or more LEDs.
//!
//! ```no_run
//! use imxrt_pit_hal as hal;
//! use hal::led::{ActiveLevel, Leds};
//!
//! const ORANGE: u32 = 1 << 11;
//! const BLUE: u32 = 1 << 10;
//!
//! let gpio1 = hal::ral::gpio::GPIO1::take().unwrap();
//! let leds = Leds::new(gpio1, ORANGE | BLUE, ActiveLevel::Low);
//!
//! leds.on(ORANGE);
//! leds.toggle(ORANGE | BLUE);
//! assert!(leds.is_on(BLUE));
//! ```
//!
//! Configure the LED pads as GPIOs before you create `Leds`.
//!
//! `on`, `off`, and `toggle` are single writes to the port's set, clear, and toggle
//! registers. They're safe to call from an interrupt, like a PIT handler.

use crate::ral::{self, gpio::RegisterBlock};

/// The pin level that lights an LED
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// The LED is on when the pin is high
    High,
    /// The LED is on when the pin is low
    Low,
}

/// One or more LEDs on a GPIO port
#[cfg_attr(docsrs, doc(cfg(feature = "led")))]
pub struct Leds {
    gpio: *const RegisterBlock,
    mask: u32,
    active: ActiveLevel,
}

// Safety: after construction, LEDs are only changed with atomic writes to the
// set, clear, and toggle registers.
unsafe impl Send for Leds {}
unsafe impl Sync for Leds {}

impl Leds {
    /// Drive the LEDs in `mask` on the `gpio` port
    ///
    /// The LEDs start off.
    pub fn new(gpio: ral::gpio::Instance, mask: u32, active: ActiveLevel) -> Self {
        let gpio = &*gpio as *const RegisterBlock;
        // Safety: the RAL instance is the only handle to the port
        unsafe { Self::from_raw(gpio, mask, active) }
    }

    /// Drive the LEDs in `mask` on the GPIO port at `gpio`
    ///
    /// # Safety
    ///
    /// `gpio` must point to a GPIO register block that's valid for the lifetime of
    /// `Leds`. Nothing else may change the direction of the pins in `mask`.
    pub unsafe fn from_raw(gpio: *const RegisterBlock, mask: u32, active: ActiveLevel) -> Self {
        let leds = Leds { gpio, mask, active };
        // Drive the pins off before they become outputs, so the LEDs don't flash.
        leds.off(mask);
        ral::modify_reg!(ral::gpio, gpio, GDIR, |gdir| gdir | mask);
        leds
    }

    /// Returns the mask of all LEDs
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Returns the pin level that lights the LEDs
    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    /// Turn on the LEDs in `mask`
    ///
    /// Bits outside of the LEDs' mask are ignored. The same goes for `off` and `toggle`.
    pub fn on(&self, mask: u32) {
        match self.active {
            ActiveLevel::High => self.set(mask),
            ActiveLevel::Low => self.clear(mask),
        }
    }

    /// Turn off the LEDs in `mask`
    pub fn off(&self, mask: u32) {
        match self.active {
            ActiveLevel::High => self.clear(mask),
            ActiveLevel::Low => self.set(mask),
        }
    }

    /// Toggle the LEDs in `mask`
    pub fn toggle(&self, mask: u32) {
        // Safety: atomic write
        unsafe { ral::write_reg!(ral::gpio, self.gpio, DR_TOGGLE, mask & self.mask) }
    }

    /// Returns `true` if every LED in `mask` is on
    pub fn is_on(&self, mask: u32) -> bool {
        let mask = mask & self.mask;
        // Safety: atomic read
        let dr = unsafe { ral::read_reg!(ral::gpio, self.gpio, DR) } & mask;
        match self.active {
            ActiveLevel::High => dr == mask,
            ActiveLevel::Low => dr == 0,
        }
    }

    fn set(&self, mask: u32) {
        // Safety: atomic write
        unsafe { ral::write_reg!(ral::gpio, self.gpio, DR_SET, mask & self.mask) }
    }

    fn clear(&self, mask: u32) {
        // Safety: atomic write
        unsafe { ral::write_reg!(ral::gpio, self.gpio, DR_CLEAR, mask & self.mask) }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveLevel, Leds, RegisterBlock};
    use core::{mem, ptr};

    const ORANGE: u32 = 1 << 11;
    const YELLOW: u32 = 1 << 28;
    const GREEN: u32 = 1 << 29;
    const BLUE: u32 = 1 << 10;
    const ALL: u32 = ORANGE | YELLOW | GREEN | BLUE;

    /// Read a register, including write-only registers
    fn peek<R>(reg: &R) -> u32 {
        unsafe { ptr::read_volatile(reg as *const R as *const u32) }
    }

    fn gpio() -> RegisterBlock {
        // Safety: register block is a collection of u32s
        unsafe { mem::zeroed() }
    }

    #[test]
    fn new_drives_leds_off_as_outputs() {
        let gpio = gpio();
        gpio.GDIR.write(1 << 3);
        let leds = unsafe { Leds::from_raw(&gpio, ALL, ActiveLevel::Low) };

        assert_eq!(peek(&gpio.DR_SET), ALL);
        assert_eq!(peek(&gpio.DR_CLEAR), 0);
        assert_eq!(peek(&gpio.GDIR), ALL | 1 << 3);
        assert_eq!(leds.mask(), ALL);
    }

    #[test]
    fn active_high() {
        let gpio = gpio();
        let leds = unsafe { Leds::from_raw(&gpio, ALL, ActiveLevel::High) };
        assert_eq!(peek(&gpio.DR_CLEAR), ALL);

        leds.on(ORANGE | GREEN);
        assert_eq!(peek(&gpio.DR_SET), ORANGE | GREEN);

        leds.off(GREEN);
        assert_eq!(peek(&gpio.DR_CLEAR), GREEN);

        leds.toggle(BLUE);
        assert_eq!(peek(&gpio.DR_TOGGLE), BLUE);
    }

    #[test]
    fn active_low() {
        let gpio = gpio();
        let leds = unsafe { Leds::from_raw(&gpio, ALL, ActiveLevel::Low) };

        leds.on(YELLOW);
        assert_eq!(peek(&gpio.DR_CLEAR), YELLOW);

        leds.off(YELLOW | BLUE);
        assert_eq!(peek(&gpio.DR_SET), YELLOW | BLUE);

        leds.toggle(ORANGE);
        assert_eq!(peek(&gpio.DR_TOGGLE), ORANGE);
    }

    #[test]
    fn foreign_pins_are_ignored() {
        let gpio = gpio();
        let leds = unsafe { Leds::from_raw(&gpio, ORANGE, ActiveLevel::High) };

        leds.on(u32::max_value());
        assert_eq!(peek(&gpio.DR_SET), ORANGE);
        leds.toggle(BLUE);
        assert_eq!(peek(&gpio.DR_TOGGLE), 0);
        assert_eq!(peek(&gpio.GDIR), ORANGE);
    }

    #[test]
    fn is_on_reads_the_port() {
        let gpio = gpio();
        let high = unsafe { Leds::from_raw(&gpio, ORANGE | BLUE, ActiveLevel::High) };
        gpio.DR.write(ORANGE);
        assert!(high.is_on(ORANGE));
        assert!(!high.is_on(BLUE));
        assert!(!high.is_on(ORANGE | BLUE));

        let low = unsafe { Leds::from_raw(&gpio, ORANGE | BLUE, ActiveLevel::Low) };
        assert!(!low.is_on(ORANGE));
        assert!(low.is_on(BLUE));
    }
}
