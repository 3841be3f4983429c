//! Clock control module (CCM)
//!
//! The PIT runs from the periodic clock root, and its registers only respond once
//! its clock gate is on. [`PIT::init`](crate::PIT::init) turns the gate on for you.
//! Use [`clock_gate_pit`] if you're managing clock gates yourself.
//!
//! Selecting the periodic clock root, and its divider, is left to your board
//! startup code. Pass the resulting frequency to the PIT.

/// Describes a clock gate setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockGate {
    /// Clock is off during all modes
    ///
    /// Stop enter hardware handshake is disabled.
    Off = 0b00,
    /// Clock is on in run mode, but off in wait and stop modes
    OnlyRun = 0b01,
    /// Clock is on in all modes, except stop mode
    On = 0b11,
}

/// CCGR1, the clock gate register that holds the PIT gate
pub(crate) const PIT_CCGR: *mut u32 = 0x400F_C06C as *mut u32;

/// The PIT gate within its CCGR register
const PIT_GATE: usize = 6;

/// Set the clock gate for the PIT
///
/// # Safety
///
/// This could be called by anyone who can access the CCM register block, which is always
/// available. The PIT driver sets this gate when initializing a channel.
pub unsafe fn clock_gate_pit(gate: ClockGate) {
    set_clock_gate(PIT_CCGR, &[PIT_GATE], gate as u8);
}

/// Set the PIT clock gate in the CCGR register at `ccgr`
///
/// # Safety
///
/// `ccgr` must point to the PIT's CCGR register, or to memory standing in for it.
#[inline(always)]
pub(crate) unsafe fn clock_gate_pit_at(ccgr: *mut u32, gate: ClockGate) {
    set_clock_gate(ccgr, &[PIT_GATE], gate as u8);
}

/// # Safety
///
/// Should only be used when you have a mutable reference to an enabled clock.
/// Should only be used on a valid clock gate register.
#[inline(always)]
unsafe fn set_clock_gate(ccgr: *mut u32, gates: &[usize], value: u8) {
    const MASK: u32 = 0b11;
    let mut register = core::ptr::read_volatile(ccgr);

    for gate in gates {
        let shift: usize = gate * 2;
        register &= !(MASK << shift);
        register |= (MASK & (value as u32)) << shift;
    }

    core::ptr::write_volatile(ccgr, register);
}
