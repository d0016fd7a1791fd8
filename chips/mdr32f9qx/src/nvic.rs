// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Cortex-M3 NVIC, with the MDR32F9Qx interrupt assignment.
//!
//! The MDR32F9Qx wires 32 interrupt lines into the NVIC, so a single
//! set/clear bank is implemented. The register map below is the generic
//! ARMv7-M one; `ICTR.INTLINESNUM` reports how many banks the core actually
//! implements and the mass operations iterate only over those.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::static_ref::StaticRef;

register_structs! {
    NvicRegisters {
        (0x000 => _reserved0),

        /// Interrupt Controller Type Register
        (0x004 => ictr: ReadOnly<u32, InterruptControllerType::Register>),

        (0x008 => _reserved1),

        /// Interrupt Set-Enable Registers
        (0x100 => iser: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Clear-Enable Registers
        (0x180 => icer: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Set-Pending Registers
        (0x200 => ispr: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        /// Interrupt Clear-Pending Registers
        (0x280 => icpr: [ReadWrite<u32, NvicSetClear::Register>; 32]),

        (0x300 => @END),
    }
}

register_bitfields![u32,
    InterruptControllerType [
        /// Total number of interrupt lines in groups of 32
        INTLINESNUM     OFFSET(0)   NUMBITS(4)
    ],

    NvicSetClear [
        /// For register NVIC_XXXXn, access interrupt (m+(32*n)).
        BITS            OFFSET(0)   NUMBITS(32)
    ]
];

/// The NVIC peripheral in MMIO space.
const NVIC: StaticRef<NvicRegisters> =
    unsafe { StaticRef::new(0xE000E000 as *const NvicRegisters) };

/// Number of valid NVIC_XXXX registers. This is a ceiling on the number of
/// available interrupts (it counts banks of 32); the actual number may be
/// less.
fn number_of_nvic_registers() -> usize {
    (NVIC.ictr.read(InterruptControllerType::INTLINESNUM) + 1) as usize
}

/// Clear all pending interrupts.
pub unsafe fn clear_all_pending() {
    for icpr in NVIC.icpr.iter().take(number_of_nvic_registers()) {
        icpr.set(!0)
    }
}

/// Enable all interrupts.
pub unsafe fn enable_all() {
    for iser in NVIC.iser.iter().take(number_of_nvic_registers()) {
        iser.set(!0)
    }
}

/// Disable all interrupts.
pub unsafe fn disable_all() {
    for icer in NVIC.icer.iter().take(number_of_nvic_registers()) {
        icer.set(!0)
    }
}

/// An opaque wrapper for a single NVIC interrupt.
///
/// Hand these out to low-level drivers to let them control their own
/// interrupt line but not others.
pub struct Nvic(u32);

impl Nvic {
    /// Creates a new `Nvic`.
    ///
    /// Marked unsafe because only chip/platform configuration code should be
    /// able to create these.
    pub const unsafe fn new(idx: u32) -> Nvic {
        Nvic(idx)
    }

    /// Enable the interrupt.
    pub fn enable(&self) {
        let idx = self.0 as usize;

        NVIC.iser[idx / 32].set(1 << (self.0 & 31));
    }

    /// Disable the interrupt.
    pub fn disable(&self) {
        let idx = self.0 as usize;

        NVIC.icer[idx / 32].set(1 << (self.0 & 31));
    }

    /// Clear pending state.
    pub fn clear_pending(&self) {
        let idx = self.0 as usize;

        NVIC.icpr[idx / 32].set(1 << (self.0 & 31));
    }
}

/// Interrupt ids from the MDR32F9Qx vector table. Gaps are reserved lines.
pub mod irqn {
    pub const CAN1: u32 = 0;
    pub const CAN2: u32 = 1;
    pub const USB: u32 = 2;
    pub const DMA: u32 = 5;
    pub const UART1: u32 = 6;
    pub const UART2: u32 = 7;
    pub const SSP1: u32 = 8;
    pub const I2C: u32 = 10;
    pub const POWER: u32 = 11;
    pub const WWDG: u32 = 12;
    pub const TIMER1: u32 = 14;
    pub const TIMER2: u32 = 15;
    pub const TIMER3: u32 = 16;
    pub const ADC: u32 = 17;
    pub const COMPARATOR: u32 = 19;
    pub const SSP2: u32 = 20;
    pub const BACKUP: u32 = 27;
    pub const EXT_INT1: u32 = 28;
    pub const EXT_INT2: u32 = 29;
    pub const EXT_INT3: u32 = 30;
    pub const EXT_INT4: u32 = 31;
}
