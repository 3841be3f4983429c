//! Periodic interrupt timer (PIT)
//!
//! The PIT has four independent channels. Each channel counts down from a reload
//! value, and requests an interrupt when it reaches zero. The [`PIT`] driver converts
//! a period in nanoseconds into a reload value, and calls your [`Handler`] every
//! time the period elapses.
//!
//! ```no_run
//! use imxrt_pit_hal as hal;
//! use hal::pit::{Channel, Context};
//! use core::sync::atomic::{AtomicU32, Ordering};
//!
//! static TICKS: AtomicU32 = AtomicU32::new(0);
//!
//! fn on_tick(context: Context) {
//!     // Safety: context created from TICKS, below
//!     let ticks: &AtomicU32 = unsafe { context.get() }.unwrap();
//!     ticks.fetch_add(1, Ordering::Relaxed);
//! }
//!
//! let mut pit = hal::ral::pit::PIT::take().map(hal::PIT::new).unwrap();
//! let channel = Channel::new(0).unwrap();
//!
//! // The PIT's input clock is 24MHz. Call on_tick every millisecond.
//! pit.init(24_000_000, Some(on_tick), Context::new(&TICKS), channel).unwrap();
//! pit.set_period(1_000_000, true, channel).unwrap();
//! ```
//!
//! Handlers run in the PIT interrupt. Keep them short, and don't block.
//!
//! # Shared state
//!
//! Configuration methods take `&mut PIT`, and run in the main flow of control. They
//! aren't synchronized with the PIT interrupt. If you're making several changes to a
//! running channel that need to appear atomic to its handler, disable the channel
//! first. [`set_period`](PIT::set_period) does this for you when you `restart`.
//! Disabling a channel prevents future calls to its handler; it doesn't stop a
//! handler that's already running.

mod registry;
mod timebase;

pub use registry::{Binding, Channel, Context, Handler, Registry, CHANNEL_COUNT};
pub use timebase::{derive_timebase, nanoseconds_to_ticks, Timebase, NANOS_PER_SECOND};

use crate::{ccm, ral};
use core::{fmt, sync::atomic, time::Duration};
use cortex_m::peripheral::nvic;

/// PIT errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(docsrs, doc(cfg(feature = "pit")))]
pub enum Error {
    /// The clock rate is zero, or faster than 1GHz
    ClockRate,
    /// The period is shorter than one clock tick
    PeriodTooShort,
    /// The period doesn't fit in a `u32` of nanoseconds
    PeriodTooLong,
    /// The channel hasn't been initialized
    Uninitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ClockRate => f.write_str("PIT clock rate must be in 1Hz..=1GHz"),
            Error::PeriodTooShort => f.write_str("period is shorter than one PIT tick"),
            Error::PeriodTooLong => f.write_str("period exceeds u32::MAX nanoseconds"),
            Error::Uninitialized => f.write_str("PIT channel is not initialized"),
        }
    }
}

/// A channel's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(docsrs, doc(cfg(feature = "pit")))]
pub enum State {
    /// The channel was never initialized
    Uninitialized,
    /// The channel is initialized, and it's not counting
    Disabled,
    /// The channel is counting, and it will interrupt when it times out
    Enabled,
}

/// Handlers for the crate's PIT interrupt
static REGISTRY: Registry = Registry::new();

/// Periodic interrupt timer (PIT)
///
/// `PIT` owns all four PIT channels, and the timebase shared by those channels.
/// Use [`init`](PIT::init) to register a channel's handler, then
/// [`set_period`](PIT::set_period) to start the channel.
///
/// When the `"rt"` feature is enabled, the crate defines the PIT interrupt handler.
/// A `PIT` created with [`new`](PIT::new) dispatches from that handler. Otherwise,
/// call [`on_interrupt`](PIT::on_interrupt) from your own handler.
#[cfg_attr(docsrs, doc(cfg(feature = "pit")))]
pub struct PIT<'r> {
    pit: *const register::RegisterBlock,
    nvic: *const nvic::RegisterBlock,
    ccgr: *mut u32,
    registry: &'r Registry,
    timebase: Option<Timebase>,
    /// Channels with a period set since their last `init`
    loaded: [bool; CHANNEL_COUNT],
}

impl PIT<'static> {
    /// Acquire the PIT from the RAL's PIT instance
    ///
    /// The PIT uses the registry that's read by the crate's PIT interrupt handler.
    pub fn new(pit: ral::pit::Instance) -> Self {
        let pit = &*pit as *const ral::pit::RegisterBlock as *const register::RegisterBlock;
        // Safety: the RAL instance is the only handle to the PIT. The NVIC and CCM
        // addresses are fixed; we only touch the PIT's bits.
        unsafe {
            Self::from_raw(
                pit,
                cortex_m::peripheral::NVIC::ptr(),
                ccm::PIT_CCGR,
                &REGISTRY,
            )
        }
    }
}

impl<'r> PIT<'r> {
    /// Create a PIT from raw register block pointers, and a handler registry
    ///
    /// `ccgr` points to the CCGR register holding the PIT clock gate.
    ///
    /// # Safety
    ///
    /// Each pointer must be valid for the lifetime of the `PIT`, and the PIT must not
    /// be accessed through any other handle. Interrupts are dispatched from `registry`
    /// only if you call [`on_interrupt`](PIT::on_interrupt).
    pub unsafe fn from_raw(
        pit: *const register::RegisterBlock,
        nvic: *const nvic::RegisterBlock,
        ccgr: *mut u32,
        registry: &'r Registry,
    ) -> Self {
        PIT {
            pit,
            nvic,
            ccgr,
            registry,
            timebase: None,
            loaded: [false; CHANNEL_COUNT],
        }
    }

    #[inline(always)]
    fn channel(&self, channel: Channel) -> &register::ChannelRegisterBlock {
        // Safety: pointer is valid per the constructors
        unsafe { &(*self.pit).CHANNEL[channel.index()] }
    }

    /// Initialize a PIT channel
    ///
    /// `init` turns on the PIT clock gate, enables the PIT module, and derives the
    /// timebase from `clock_hz`. It then binds `handler` and `context` to `channel`,
    /// and unmasks the channel's interrupt. The channel stays disabled until you call
    /// [`set_period`](PIT::set_period) or [`set_enabled`](PIT::set_enabled).
    ///
    /// All channels share one timebase. Every call to `init` replaces the timebase,
    /// so call `init` with the same `clock_hz` for every channel. Initializing a
    /// channel again replaces its handler and context.
    ///
    /// Returns [`Error::ClockRate`] if `clock_hz` is zero, or faster than 1GHz. In that
    /// case, nothing changes.
    pub fn init(
        &mut self,
        clock_hz: u32,
        handler: Option<Handler>,
        context: Context,
        channel: Channel,
    ) -> Result<(), Error> {
        let timebase = Timebase::new(clock_hz)?;
        debug!(
            "PIT channel {} init at {} Hz, {} ns per tick",
            channel,
            clock_hz,
            timebase.ns_per_tick()
        );

        // Safety: pointers are valid per the constructors
        unsafe {
            ccm::clock_gate_pit_at(self.ccgr, ccm::ClockGate::On);
            ral::modify_reg!(register, self.pit, MCR, MDIS: MDIS_0);
        }
        self.timebase = Some(timebase);
        self.loaded[channel.index()] = false;

        let regs = self.channel(channel);
        ral::write_reg!(register, regs, TCTRL, 0);
        ral::write_reg!(register, regs, TFLG, TIF: 1);
        atomic::compiler_fence(atomic::Ordering::SeqCst);

        self.registry.register(channel, handler, context);
        atomic::compiler_fence(atomic::Ordering::SeqCst);

        let nr = usize::from(interrupt_number(channel));
        let (word, bit) = (nr / 32, 1u32 << (nr % 32));
        // Safety: write-one-to-clear and write-one-to-set registers. Only affects
        // the PIT interrupt.
        unsafe {
            (*self.nvic).icpr[word].write(bit);
            (*self.nvic).iser[word].write(bit);
        }
        Ok(())
    }

    /// Set a channel's period, in nanoseconds, and enable the channel
    ///
    /// If `restart` is `true`, the channel stops, its pending timeout is cleared,
    /// and it starts counting the new period right away. If `restart` is `false`,
    /// the channel finishes its current period before it starts the new period.
    ///
    /// Periods that aren't a multiple of the timebase are rounded down to the nearest
    /// tick. After a successful return, the channel is enabled.
    ///
    /// Returns [`Error::Uninitialized`] if the channel was never initialized, or
    /// [`Error::PeriodTooShort`] if the period is shorter than one tick. When there's
    /// an error, the channel is untouched.
    pub fn set_period(
        &mut self,
        period_ns: u32,
        restart: bool,
        channel: Channel,
    ) -> Result<(), Error> {
        if !self.registry.is_initialized(channel) {
            return Err(Error::Uninitialized);
        }
        let ticks = self.timebase.ok_or(Error::Uninitialized)?.ticks(period_ns)?;
        trace!(
            "PIT channel {} period {} ns, load {}, restart {}",
            channel,
            period_ns,
            ticks,
            restart
        );

        load(self.channel(channel), ticks, restart, |_| {});
        self.loaded[channel.index()] = true;
        Ok(())
    }

    /// Set a channel's period with a `Duration`
    ///
    /// Returns [`Error::PeriodTooLong`] if the duration is longer than `u32::MAX`
    /// nanoseconds. Otherwise, behaves like [`set_period`](PIT::set_period).
    pub fn set_period_duration(
        &mut self,
        period: Duration,
        restart: bool,
        channel: Channel,
    ) -> Result<(), Error> {
        use core::convert::TryFrom;
        let period_ns = u32::try_from(period.as_nanos()).map_err(|_| Error::PeriodTooLong)?;
        self.set_period(period_ns, restart, channel)
    }

    /// Enable or disable a channel
    ///
    /// The channel's timer and its interrupt are enabled or disabled together.
    pub fn set_enabled(&mut self, enable: bool, channel: Channel) {
        trace!("PIT channel {} enabled {}", channel, enable);
        set_enabled(self.channel(channel), enable);
    }

    /// Returns `true` if the channel's timer is enabled
    pub fn is_enabled(&self, channel: Channel) -> bool {
        ral::read_reg!(register, self.channel(channel), TCTRL, TEN == 1)
    }

    /// Returns the channel's state
    pub fn state(&self, channel: Channel) -> State {
        if !self.registry.is_initialized(channel) {
            State::Uninitialized
        } else if self.is_enabled(channel) {
            State::Enabled
        } else {
            State::Disabled
        }
    }

    /// Returns the channel's reload value
    pub fn load_value(&self, channel: Channel) -> u32 {
        ral::read_reg!(register, self.channel(channel), LDVAL)
    }

    /// Returns the channel's current count
    ///
    /// The count decrements from the reload value to zero.
    pub fn current_value(&self, channel: Channel) -> u32 {
        ral::read_reg!(register, self.channel(channel), CVAL)
    }

    /// Returns the channel's period, as represented by its reload value
    ///
    /// Returns `None` if the channel isn't initialized, or if there's been no
    /// [`set_period`](PIT::set_period) since the channel's last `init`.
    pub fn period(&self, channel: Channel) -> Option<Duration> {
        if !self.registry.is_initialized(channel) || !self.loaded[channel.index()] {
            return None;
        }
        let timebase = self.timebase?;
        Some(Duration::from_nanos(
            timebase.nanoseconds(self.load_value(channel)),
        ))
    }

    /// Returns the timebase derived by the most recent [`init`](PIT::init)
    pub fn timebase(&self) -> Option<Timebase> {
        self.timebase
    }

    /// Stop all channels while a debugger halts the processor
    ///
    /// The PIT must be clocked, so call this after [`init`](PIT::init).
    pub fn set_debug_freeze(&mut self, freeze: bool) {
        // Safety: pointer is valid per the constructors
        unsafe { ral::modify_reg!(register, self.pit, MCR, FRZ: freeze as u32) };
    }

    /// Dispatch pending channel timeouts
    ///
    /// Call `on_interrupt` from the PIT interrupt handler when you're not using the
    /// `"rt"` feature, or when you're using your own [`Registry`].
    pub fn on_interrupt(&self) {
        // Safety: pointer is valid per the constructors
        unsafe { on_interrupt(self.pit, self.registry) };
    }
}

/// Returns the NVIC interrupt number for `channel`
///
/// On the i.MX RT, all PIT channels share one interrupt.
pub fn interrupt_number(_channel: Channel) -> u8 {
    use cortex_m::interrupt::Nr;
    ral::interrupt::PIT.nr()
}

#[inline(always)]
fn set_enabled(regs: &register::ChannelRegisterBlock, enable: bool) {
    let enable = enable as u32;
    ral::modify_reg!(register, regs, TCTRL, TIE: enable, TEN: enable);
}

/// Load `ticks` into a channel, then enable the channel
///
/// A restart stops the channel and clears its flag before the new load value is
/// written. `step` sees the channel after every register write.
#[inline(always)]
fn load<F>(regs: &register::ChannelRegisterBlock, ticks: u32, restart: bool, mut step: F)
where
    F: FnMut(&register::ChannelRegisterBlock),
{
    if restart {
        set_enabled(regs, false);
        step(regs);
        ral::write_reg!(register, regs, TFLG, TIF: 1);
        step(regs);
    }
    ral::write_reg!(register, regs, LDVAL, ticks);
    step(regs);
    set_enabled(regs, true);
    step(regs);
}

/// Service a timeout on `channel`
///
/// The flag is cleared before the handler runs. If the channel times out again
/// while the handler is running, the interrupt stays pending.
///
/// # Safety
///
/// `pit` must point to a PIT register block.
#[inline(always)]
unsafe fn dispatch(pit: *const register::RegisterBlock, registry: &Registry, channel: Channel) {
    let regs = &(*pit).CHANNEL[channel.index()];
    ral::write_reg!(register, regs, TFLG, TIF: 1);
    atomic::compiler_fence(atomic::Ordering::SeqCst);
    registry.get(channel).invoke();
}

/// Dispatch every enabled channel that's timed out
///
/// # Safety
///
/// `pit` must point to a PIT register block.
unsafe fn on_interrupt(pit: *const register::RegisterBlock, registry: &Registry) {
    for &channel in Channel::ALL.iter() {
        let regs = &(*pit).CHANNEL[channel.index()];
        let pending = ral::read_reg!(register, regs, TFLG, TIF == 1)
            && ral::read_reg!(register, regs, TCTRL, TIE == 1);
        if pending {
            dispatch(pit, registry, channel);
        }
    }
}

interrupts! {
    handler!{unsafe fn PIT() {
        on_interrupt(ral::pit::PIT as *const register::RegisterBlock, &REGISTRY);
    }}
}

/// The auto-generated RAL API doesn't index PIT channels. This is a macro-compatible API
/// that does.
///
/// The approach here is to
///
/// - take the RAL flags, and remove the channel number (copy-paste from RAL)
/// - expose a 'Channel' as a collection of PIT channel registers (copy-paste from RAL)
pub mod register {
    #![allow(unused, non_snake_case, non_upper_case_globals)] // Compatibility with RAL

    use super::CHANNEL_COUNT;
    use crate::ral::{RORegister, RWRegister};

    /// The PIT register block, with indexable channels
    #[repr(C)]
    pub struct RegisterBlock {
        /// PIT Module Control Register
        pub MCR: RWRegister<u32>,

        _reserved0: [u32; 55],

        /// PIT Upper Lifetime Timer Register
        pub LTMR64H: RORegister<u32>,

        /// PIT Lower Lifetime Timer Register
        pub LTMR64L: RORegister<u32>,

        _reserved1: [u32; 6],

        /// Timer channels
        pub CHANNEL: [ChannelRegisterBlock; CHANNEL_COUNT],
    }

    /// One PIT channel's registers
    #[repr(C)]
    pub struct ChannelRegisterBlock {
        /// Timer Load Value Register
        pub LDVAL: RWRegister<u32>,

        /// Current Timer Value Register
        pub CVAL: RORegister<u32>,

        /// Timer Control Register
        pub TCTRL: RWRegister<u32>,

        /// Timer Flag Register
        pub TFLG: RWRegister<u32>,
    }

    /// PIT Module Control Register
    pub mod MCR {

        /// Freeze
        pub mod FRZ {
            /// Offset (0 bits)
            pub const offset: u32 = 0;
            /// Mask (1 bit: 1 << 0)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Timers continue to run in Debug mode.
                pub const FRZ_0: u32 = 0b0;

                /// 0b1: Timers are stopped in Debug mode.
                pub const FRZ_1: u32 = 0b1;
            }
        }

        /// Module Disable for PIT
        pub mod MDIS {
            /// Offset (1 bits)
            pub const offset: u32 = 1;
            /// Mask (1 bit: 1 << 1)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Clock for standard PIT timers is enabled.
                pub const MDIS_0: u32 = 0b0;

                /// 0b1: Clock for standard PIT timers is disabled.
                pub const MDIS_1: u32 = 0b1;
            }
        }
    }

    /// Timer Load Value Register
    pub mod LDVAL {

        /// Timer Start Value
        pub mod TSV {
            /// Offset (0 bits)
            pub const offset: u32 = 0;
            /// Mask (32 bits: 0xffffffff << 0)
            pub const mask: u32 = 0xffffffff << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values (empty)
            pub mod RW {}
        }
    }

    /// Current Timer Value Register
    pub mod CVAL {

        /// Current Timer Value
        pub mod TVL {
            /// Offset (0 bits)
            pub const offset: u32 = 0;
            /// Mask (32 bits: 0xffffffff << 0)
            pub const mask: u32 = 0xffffffff << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values (empty)
            pub mod RW {}
        }
    }

    /// Timer Control Register
    pub mod TCTRL {

        /// Timer Enable
        pub mod TEN {
            /// Offset (0 bits)
            pub const offset: u32 = 0;
            /// Mask (1 bit: 1 << 0)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Timer n is disabled.
                pub const TEN_0: u32 = 0b0;

                /// 0b1: Timer n is enabled.
                pub const TEN_1: u32 = 0b1;
            }
        }

        /// Timer Interrupt Enable
        pub mod TIE {
            /// Offset (1 bits)
            pub const offset: u32 = 1;
            /// Mask (1 bit: 1 << 1)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Interrupt requests from Timer n are disabled.
                pub const TIE_0: u32 = 0b0;

                /// 0b1: Interrupt will be requested whenever TIF is set.
                pub const TIE_1: u32 = 0b1;
            }
        }

        /// Chain Mode
        pub mod CHN {
            /// Offset (2 bits)
            pub const offset: u32 = 2;
            /// Mask (1 bit: 1 << 2)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Timer is not chained.
                pub const CHN_0: u32 = 0b0;

                /// 0b1: Timer is chained to previous timer.
                pub const CHN_1: u32 = 0b1;
            }
        }
    }

    /// Timer Flag Register
    pub mod TFLG {

        /// Timer Interrupt Flag
        pub mod TIF {
            /// Offset (0 bits)
            pub const offset: u32 = 0;
            /// Mask (1 bit: 1 << 0)
            pub const mask: u32 = 1 << offset;
            /// Read-only values (empty)
            pub mod R {}
            /// Write-only values (empty)
            pub mod W {}
            /// Read-write values
            pub mod RW {

                /// 0b0: Timeout has not yet occurred.
                pub const TIF_0: u32 = 0b0;

                /// 0b1: Timeout has occurred. Write 1 to clear.
                pub const TIF_1: u32 = 0b1;
            }
        }
    }
}
