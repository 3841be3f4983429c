//! PIT timebase
//!
//! Converts between nanosecond periods and PIT reload values. The timebase is
//! derived once from the PIT's input clock, then read by every channel.

use super::Error;
use core::time::Duration;

/// Nanoseconds in one second
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Derive `(ticks_per_ns, ns_per_tick)` from the PIT input clock
///
/// Both ratios are floored. A 50MHz clock produces `(0, 20)`; a 24MHz clock produces
/// `(0, 41)`, losing the fractional 0.67ns of every tick.
///
/// # Panics
///
/// Panics if `clock_hz` is zero. Use [`Timebase::new`] to validate the clock first.
pub fn derive_timebase(clock_hz: u32) -> (u32, u32) {
    assert!(clock_hz > 0, "PIT clock rate must be non-zero");
    (clock_hz / NANOS_PER_SECOND, NANOS_PER_SECOND / clock_hz)
}

/// Convert a period into a PIT reload value
///
/// The PIT counts down and fires when it reaches zero, so the load value is one
/// less than the number of ticks in the period.
///
/// # Panics
///
/// Panics if `period_ns` is shorter than one tick. See [`Timebase::ticks`]
/// for a checked conversion.
pub fn nanoseconds_to_ticks(period_ns: u32, ns_per_tick: u32) -> u32 {
    assert!(
        ns_per_tick > 0 && period_ns >= ns_per_tick,
        "period is below the timebase resolution"
    );
    period_ns / ns_per_tick - 1
}

/// A validated PIT timebase
///
/// ```
/// use imxrt_pit_hal::pit::Timebase;
///
/// let timebase = Timebase::new(50_000_000).unwrap();
/// assert_eq!(timebase.ns_per_tick(), 20);
/// assert_eq!(timebase.ticks(1_000_000), Ok(49_999));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timebase {
    clock_hz: u32,
    ticks_per_ns: u32,
    ns_per_tick: u32,
}

impl Timebase {
    /// Derive the timebase for a PIT clocked at `clock_hz`
    ///
    /// Returns [`Error::ClockRate`] if the clock is zero, or if it's faster than 1GHz.
    /// Above 1GHz, a tick is shorter than a nanosecond, and there's no way to express
    /// a period.
    ///
    /// Below 1GHz, `ticks_per_ns` is always zero. That's the precision floor of a
    /// nanosecond timebase; conversions only use `ns_per_tick`.
    pub fn new(clock_hz: u32) -> Result<Self, Error> {
        if clock_hz == 0 || clock_hz > NANOS_PER_SECOND {
            return Err(Error::ClockRate);
        }
        let (ticks_per_ns, ns_per_tick) = derive_timebase(clock_hz);
        Ok(Timebase {
            clock_hz,
            ticks_per_ns,
            ns_per_tick,
        })
    }

    /// The PIT input clock (Hz)
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Whole clock ticks per nanosecond
    pub const fn ticks_per_ns(&self) -> u32 {
        self.ticks_per_ns
    }

    /// Whole nanoseconds per clock tick
    pub const fn ns_per_tick(&self) -> u32 {
        self.ns_per_tick
    }

    /// The shortest period this timebase can express
    pub const fn resolution(&self) -> Duration {
        Duration::from_nanos(self.ns_per_tick as u64)
    }

    /// Convert `period_ns` into a reload value
    ///
    /// Returns [`Error::PeriodTooShort`] if the period is less than one tick.
    /// Periods that aren't a multiple of the tick are rounded down.
    pub fn ticks(&self, period_ns: u32) -> Result<u32, Error> {
        if period_ns < self.ns_per_tick {
            return Err(Error::PeriodTooShort);
        }
        Ok(nanoseconds_to_ticks(period_ns, self.ns_per_tick))
    }

    /// The period, in nanoseconds, produced by the reload value `ticks`
    pub const fn nanoseconds(&self, ticks: u32) -> u64 {
        (ticks as u64 + 1) * self.ns_per_tick as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_timebase_floors() {
        assert_eq!(derive_timebase(50_000_000), (0, 20));
        assert_eq!(derive_timebase(24_000_000), (0, 41));
        assert_eq!(derive_timebase(1_000_000_000), (1, 1));
        assert_eq!(derive_timebase(1), (0, NANOS_PER_SECOND));
    }

    #[test]
    #[should_panic]
    fn derive_timebase_zero_clock() {
        derive_timebase(0);
    }

    #[test]
    fn reject_unusable_clocks() {
        assert_eq!(Timebase::new(0), Err(Error::ClockRate));
        assert_eq!(Timebase::new(1_000_000_001), Err(Error::ClockRate));
        assert_eq!(Timebase::new(u32::max_value()), Err(Error::ClockRate));
        assert!(Timebase::new(1_000_000_000).is_ok());
    }

    #[test]
    fn one_millisecond_at_50mhz() {
        assert_eq!(nanoseconds_to_ticks(1_000_000, 20), 49_999);
        let timebase = Timebase::new(50_000_000).unwrap();
        assert_eq!(timebase.ticks(1_000_000), Ok(49_999));
        assert_eq!(timebase.nanoseconds(49_999), 1_000_000);
        assert_eq!(timebase.resolution(), Duration::from_nanos(20));
    }

    #[test]
    fn one_tick_period_loads_zero() {
        let timebase = Timebase::new(50_000_000).unwrap();
        assert_eq!(timebase.ticks(20), Ok(0));
        assert_eq!(timebase.ticks(39), Ok(0));
    }

    #[test]
    fn period_below_resolution() {
        let timebase = Timebase::new(50_000_000).unwrap();
        assert_eq!(timebase.ticks(19), Err(Error::PeriodTooShort));
        assert_eq!(timebase.ticks(0), Err(Error::PeriodTooShort));
    }

    #[test]
    #[should_panic]
    fn raw_conversion_traps_on_underflow() {
        nanoseconds_to_ticks(10, 20);
    }

    #[test]
    fn round_trip_within_one_tick() {
        const CLOCKS: [u32; 6] = [
            1_000_000,
            24_000_000,
            33_000_000,
            50_000_000,
            132_000_000,
            1_000_000_000,
        ];
        const PERIODS: [u32; 6] = [
            1_000,
            7_919,
            500_000,
            1_000_000,
            123_456_789,
            u32::max_value(),
        ];

        for &clock in CLOCKS.iter() {
            let timebase = Timebase::new(clock).unwrap();
            for &period in PERIODS.iter().filter(|&&p| p >= timebase.ns_per_tick()) {
                let ticks = timebase.ticks(period).unwrap();
                let back = timebase.nanoseconds(ticks);
                let period = period as u64;
                assert!(back <= period, "{} Hz, {} ns -> {} ns", clock, period, back);
                assert!(
                    period - back < timebase.ns_per_tick() as u64,
                    "{} Hz, {} ns -> {} ns",
                    clock,
                    period,
                    back
                );
            }
        }
    }
}
