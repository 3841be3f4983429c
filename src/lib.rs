//! Periodic interrupt timers and status LEDs for i.MX RT processors
//!
//! `imxrt-pit-hal` drives the periodic interrupt timer (PIT) found on NXP's i.MX RT
//! processors. Each PIT channel calls a function of yours, from the PIT interrupt,
//! every time its period elapses. Periods are specified in nanoseconds, and the driver
//! converts them to PIT clock ticks.
//!
//! The crate also includes a small [`led`] driver. It turns one or more board LEDs on,
//! off, or toggles them. It's a handy thing to call from a PIT handler.
//!
//! The crate registers the PIT interrupt handler statically, using the [`cortex-m-rt`]
//! interfaces. This means that your final program should also depend on `cortex-m-rt`,
//! or be at least `cortex-m-rt` compatible.
//!
//! [`cortex-m-rt`]: https://crates.io/crates/cortex-m-rt
//!
//! # Dependencies
//!
//! - A Rust installation; recommended installation using `rustup`. We support the
//!   latest, stable Rust toolchain.
//!
//! - The `thumbv7em-none-eabihf` Rust target, which may be installed using
//!   `rustup`: `rustup target add thumbv7em-none-eabihf`
//!
//!   The target is only necessary when building for an embedded system. The
//!   main crate should build and test on your host.
//!
//! - An embedded system with a compatible i.MX RT processor.
//!
//! # Feature flags
//!
//! You're **required** to specify a feature that describes your i.MX RT chip variant.
//! You may select only one chip feature.
//!
//! The crate compiles for the following chips:
//!
//! - `"imxrt1010"` for i.MX RT **1010** variants
//! - `"imxrt1060"` for i.MX RT **1060** variants
//!
//! Each peripheral has it's own feature, which is enabled by default. You may want to
//! disable the `"pit"` feature if you have your own PIT driver, and the interrupt handler
//! that this crate provides causes a duplicate definition.
//!
//! | **Chip**  | `"led"` | `"pit"` |
//! | --------- | ------- | ------- |
//! | imxrt1010 |    ✓    |    ✓    |
//! | imxrt1060 |    ✓    |    ✓    |
//!
//! When developing a binary for your embedded system, you should enable this crate's `"rt"`
//! feature. Otherwise, when developing libraries against the crate, you may skip the
//! `"rt"` feature.
//!
//! Enable the `"defmt"` feature to log PIT configuration changes with [`defmt`]. The
//! crate never logs from an interrupt.
//!
//! [`defmt`]: https://crates.io/crates/defmt
//!
//! # Example
//!
//! Toggle an LED every 250ms from PIT channel 0:
//!
//! ```no_run
//! use imxrt_pit_hal as hal;
//! use hal::{led::{ActiveLevel, Leds}, pit::{Channel, Context}, ral};
//!
//! static mut LED: Option<Leds> = None;
//!
//! fn blink(context: Context) {
//!     // Safety: context points to LED, which is set before the PIT starts.
//!     if let Some(Some(led)) = unsafe { context.get::<Option<Leds>>() } {
//!         led.toggle(1 << 3);
//!     }
//! }
//!
//! let gpio2 = ral::gpio::GPIO2::take().unwrap();
//! let context = unsafe {
//!     LED = Some(Leds::new(gpio2, 1 << 3, ActiveLevel::High));
//!     Context::from_ptr(core::ptr::addr_of!(LED) as *const ())
//! };
//!
//! let mut pit = ral::pit::PIT::take().map(hal::PIT::new).unwrap();
//! let channel = Channel::new(0).unwrap();
//! pit.init(24_000_000, Some(blink), context, channel).unwrap();
//! pit.set_period(250_000_000, true, channel).unwrap();
//! ```
//!
//! ## License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0)
//! - [MIT License](http://opensource.org/licenses/MIT)
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Developer note: you'll find compile_error!s like this scattered
// throughout the implementation. The errors will point you towards
// things that you need to consider when adding a new chip. Once
// you've added support for that new chip, you should update the
// comditional compile.
#[cfg(not(any(feature = "imxrt1010", feature = "imxrt1060")))]
compile_error!(concat!(
    "You must select a chip feature flag! Available chips:\n",
    "  - imxrt1010\n",
    "  - imxrt1060\n"
));

/// Decorates one or more functions that act as interrupt handlers.
///
/// `interrupts!` may only be used once per module. It should only include
/// functions wrapped by `handler!`. The function names should reflect the
/// IRQ name as provided by the RAL's `interrupt` macro.
#[cfg(feature = "pit")]
macro_rules! interrupts {
    ($($handlers:item)*) => {
        #[cfg(all(target_arch = "arm", feature = "rt"))]
        use crate::ral::interrupt;
        $($handlers)*
    };
}

/// Decorator helper for an interrupt handler
#[cfg(feature = "pit")]
macro_rules! handler {
    (unsafe fn $isr_name:ident () $body:block) => {
        #[cfg_attr(all(target_arch = "arm", feature = "rt"), crate::rt::interrupt)]
        #[cfg_attr(any(not(target_arch = "arm"), not(feature = "rt")), allow(unused, non_snake_case))]
        unsafe fn $isr_name() $body
    };
}

/// Log a configuration change at the debug level
///
/// Expands to nothing without the `"defmt"` feature.
#[cfg(feature = "pit")]
macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

/// Log a configuration change at the trace level
///
/// Expands to nothing without the `"defmt"` feature.
#[cfg(feature = "pit")]
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::trace!($($arg)*);
    };
}

//
// Modules
//
#[cfg(feature = "pit")]
#[cfg_attr(docsrs, doc(cfg(feature = "pit")))]
pub mod ccm;
#[cfg(feature = "led")]
#[cfg_attr(docsrs, doc(cfg(feature = "led")))]
pub mod led;
#[cfg(feature = "pit")]
#[cfg_attr(docsrs, doc(cfg(feature = "pit")))]
pub mod pit;

pub use imxrt_ral as ral;

#[cfg(all(target_arch = "arm", feature = "rt"))]
use cortex_m_rt as rt;

//
// Module re-exports
//
#[cfg(feature = "led")]
pub use led::Leds;
#[cfg(feature = "pit")]
pub use pit::{Error as PITError, PIT};
