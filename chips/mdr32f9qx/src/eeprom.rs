// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! EEPROM (on-chip flash) controller for the MDR32F9Qx.
//!
//! Program/erase is not implemented; the module exists so bring-up can insert
//! the access wait states the flash array needs once the core runs faster
//! than it can fetch.

use tock_registers::interfaces::{ReadWriteable, Readable};
use tock_registers::registers::{ReadWrite, WriteOnly};
use tock_registers::register_bitfields;

use crate::static_ref::StaticRef;

/// EEPROM control
#[repr(C)]
struct EepromRegisters {
    /// command register
    cmd: ReadWrite<u32, CMD::Register>,
    /// address register
    adr: ReadWrite<u32>,
    /// data input register
    di: ReadWrite<u32>,
    /// data output register
    dout: ReadWrite<u32>,
    /// protection key register
    key: WriteOnly<u32>,
}

register_bitfields![u32,
    CMD [
        /// Write enable for the NVSTR line
        NVSTR OFFSET(13) NUMBITS(1) [],
        /// Program enable
        PROG OFFSET(12) NUMBITS(1) [],
        /// Mass erase select
        MAS1 OFFSET(11) NUMBITS(1) [],
        /// Erase enable
        ERASE OFFSET(10) NUMBITS(1) [],
        /// Information block select
        IFREN OFFSET(9) NUMBITS(1) [],
        /// Sector enable
        SE OFFSET(8) NUMBITS(1) [],
        /// Y address enable
        YE OFFSET(7) NUMBITS(1) [],
        /// X address enable
        XE OFFSET(6) NUMBITS(1) [],
        /// Access delay, wait states inserted on every fetch
        DELAY OFFSET(3) NUMBITS(3) [],
        /// Read enable
        RD OFFSET(2) NUMBITS(1) [],
        /// Write enable
        WR OFFSET(1) NUMBITS(1) [],
        /// Register-access control mode
        CON OFFSET(0) NUMBITS(1) []
    ]
];

const EEPROM_BASE: StaticRef<EepromRegisters> =
    unsafe { StaticRef::new(0x40018000 as *const EepromRegisters) };

/// Number of wait states inserted on flash fetches.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromAccessDelay {
    Cycles0 = 0,
    Cycles1 = 1,
    Cycles2 = 2,
    Cycles3 = 3,
    Cycles4 = 4,
    Cycles5 = 5,
    Cycles6 = 6,
    Cycles7 = 7,
}

impl EepromAccessDelay {
    /// Wait states for a target core clock: one per started 25 MHz above the
    /// first, saturating at the field maximum.
    pub const fn for_core_clock(frequency_hz: u32) -> Self {
        let cycles = frequency_hz.saturating_sub(1) / 25_000_000;
        match cycles {
            0 => Self::Cycles0,
            1 => Self::Cycles1,
            2 => Self::Cycles2,
            3 => Self::Cycles3,
            4 => Self::Cycles4,
            5 => Self::Cycles5,
            6 => Self::Cycles6,
            _ => Self::Cycles7,
        }
    }

    fn for_field(bits: u32) -> Self {
        match bits & 0b111 {
            0 => Self::Cycles0,
            1 => Self::Cycles1,
            2 => Self::Cycles2,
            3 => Self::Cycles3,
            4 => Self::Cycles4,
            5 => Self::Cycles5,
            6 => Self::Cycles6,
            _ => Self::Cycles7,
        }
    }
}

pub struct Eeprom {
    registers: StaticRef<EepromRegisters>,
}

impl Eeprom {
    pub const fn new() -> Self {
        Self {
            registers: EEPROM_BASE,
        }
    }

    /// Program the fetch wait-state count. The EEPROM peripheral clock must
    /// be gated on before the controller accepts the write.
    pub fn set_access_delay(&self, delay: EepromAccessDelay) {
        self.registers.cmd.modify(CMD::DELAY.val(delay as u32));
    }

    pub fn get_access_delay(&self) -> EepromAccessDelay {
        EepromAccessDelay::for_field(self.registers.cmd.read(CMD::DELAY))
    }
}

#[cfg(test)]
impl Eeprom {
    /// A fresh accessor over a zeroed register block in host memory.
    pub(crate) fn new_for_tests() -> Self {
        use core::mem::MaybeUninit;
        let registers = std::boxed::Box::leak(std::boxed::Box::new(unsafe {
            MaybeUninit::<EepromRegisters>::zeroed().assume_init()
        }));
        Self {
            registers: unsafe { StaticRef::new(registers) },
        }
    }
}
