// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Peripheral implementations for the Milandr MDR32F9Qx MCU.
//!
//! Cortex-M3 parts of the 1986VE9x family. This crate covers the pieces the
//! system needs to get off the internal RC oscillator after reset: the
//! RST_CLK controller, the backup-domain regulator trim, the EEPROM wait
//! states, and the core-side NVIC/SCB setup. See [`clocks`] for the bring-up
//! entry point.

#![no_std]

#[cfg(test)]
extern crate std;

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod bkp;
pub mod clocks;
pub mod eeprom;
pub mod nvic;
pub mod rst_clk;
pub mod scb;

mod static_ref;
pub use static_ref::StaticRef;

/// Start of on-chip flash, where the vector table lives.
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Early core setup, to run exactly once, immediately after reset.
///
/// Points the vector table at flash and masks and acknowledges every
/// interrupt, so the clock bring-up that follows cannot be preempted by
/// anything armed before the reset. Callers continue with
/// [`clocks::Clocks::init`].
pub unsafe fn init() {
    scb::set_vector_table_offset(FLASH_BASE as usize as *const ());

    nvic::disable_all();
    nvic::clear_all_pending();
}
