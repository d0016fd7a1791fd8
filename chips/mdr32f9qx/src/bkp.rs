// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Backup domain controller (BKP) for the MDR32F9Qx.
//!
//! The backup domain holds sixteen battery-backed scratch words, the RTC, and
//! REG_0E, which trims the internal core voltage regulator. Bring-up only
//! touches REG_0E; the scratch words are exposed for boards that want
//! reset-surviving state.

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::register_bitfields;

use crate::static_ref::StaticRef;

/// Backup domain and RTC control
#[repr(C)]
struct BkpRegisters {
    /// battery-backed scratch words REG_00..REG_0D
    reg: [ReadWrite<u32>; 14],
    /// regulator trim and power control
    reg_0e: ReadWrite<u32, REG_0E::Register>,
    /// battery-backed scratch word REG_0F
    reg_0f: ReadWrite<u32>,
    /// RTC counter
    rtc_cnt: ReadWrite<u32>,
    /// RTC prescaler counter
    rtc_div: ReadWrite<u32>,
    /// RTC prescaler reload
    rtc_prl: ReadWrite<u32>,
    /// RTC alarm
    rtc_alrm: ReadWrite<u32>,
    /// RTC control and status
    rtc_cs: ReadWrite<u32>,
}

register_bitfields![u32,
    REG_0E [
        /// Power-on-reset flag control
        FPOR OFFSET(11) NUMBITS(1) [],
        /// HSI oscillator trim
        TRIM OFFSET(8) NUMBITS(3) [],
        /// JTAG B port enable
        JTAGB OFFSET(7) NUMBITS(1) [],
        /// JTAG A port enable
        JTAGA OFFSET(6) NUMBITS(1) [],
        /// Regulator output select resistance
        SELECTRI OFFSET(3) NUMBITS(3) [],
        /// Regulator low-power mode select
        LOW OFFSET(0) NUMBITS(3) []
    ]
];

const BKP_BASE: StaticRef<BkpRegisters> =
    unsafe { StaticRef::new(0x400D8000 as *const BkpRegisters) };

/// Drive setting for the internal core voltage regulator. LOW and SELECTRI
/// are programmed to the same 3-bit value, scaled with the core clock the
/// regulator has to sustain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreRegulatorDrive(u8);

impl CoreRegulatorDrive {
    /// Drive value for a target core clock, one step per started 10 MHz,
    /// saturating at the maximum field value.
    pub const fn for_core_clock(frequency_hz: u32) -> Self {
        let step = frequency_hz / 10_000_000;
        if step > 0b111 {
            Self(0b111)
        } else {
            Self(step as u8)
        }
    }

    const fn bits(self) -> u32 {
        self.0 as u32
    }
}

pub struct Bkp {
    registers: StaticRef<BkpRegisters>,
}

impl Bkp {
    pub const fn new() -> Self {
        Self {
            registers: BKP_BASE,
        }
    }

    /// Program the regulator drive fields. Clears both fields first, then
    /// sets them to the same value, preserving the rest of REG_0E (JTAG
    /// enables, oscillator trim).
    pub fn set_core_regulator_drive(&self, drive: CoreRegulatorDrive) {
        self.registers
            .reg_0e
            .modify(REG_0E::LOW::CLEAR + REG_0E::SELECTRI::CLEAR);
        self.registers
            .reg_0e
            .modify(REG_0E::LOW.val(drive.bits()) + REG_0E::SELECTRI.val(drive.bits()));
    }

    /// Read one of the fifteen battery-backed scratch words (REG_00..REG_0D,
    /// REG_0F). Indices 0..=13 map to REG_00..REG_0D, 14 to REG_0F.
    pub fn read_scratch(&self, index: usize) -> Option<u32> {
        match index {
            0..=13 => Some(self.registers.reg[index].get()),
            14 => Some(self.registers.reg_0f.get()),
            _ => None,
        }
    }

    /// Write one of the battery-backed scratch words. Returns `None` for an
    /// out-of-range index.
    pub fn write_scratch(&self, index: usize, value: u32) -> Option<()> {
        match index {
            0..=13 => {
                self.registers.reg[index].set(value);
                Some(())
            }
            14 => {
                self.registers.reg_0f.set(value);
                Some(())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
impl Bkp {
    /// A fresh accessor over a zeroed register block in host memory.
    pub(crate) fn new_for_tests() -> Self {
        use core::mem::MaybeUninit;
        let registers = std::boxed::Box::leak(std::boxed::Box::new(unsafe {
            MaybeUninit::<BkpRegisters>::zeroed().assume_init()
        }));
        Self {
            registers: unsafe { StaticRef::new(registers) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regulator_drive_scales_with_frequency() {
        assert_eq!(CoreRegulatorDrive::for_core_clock(8_000_000).bits(), 0);
        assert_eq!(CoreRegulatorDrive::for_core_clock(10_000_000).bits(), 1);
        assert_eq!(CoreRegulatorDrive::for_core_clock(32_000_000).bits(), 3);
        assert_eq!(CoreRegulatorDrive::for_core_clock(80_000_000).bits(), 0b111);
        assert_eq!(CoreRegulatorDrive::for_core_clock(u32::MAX).bits(), 0b111);
    }

    #[test]
    fn regulator_write_preserves_other_fields() {
        let bkp = Bkp::new_for_tests();

        // JTAG enables and a stale drive value survive a reset.
        bkp.registers.reg_0e.set((1 << 6) | (1 << 7) | 0b101_101);
        bkp.set_core_regulator_drive(CoreRegulatorDrive::for_core_clock(32_000_000));

        let reg = bkp.registers.reg_0e.get();
        assert_eq!(reg & 0b111, 3);
        assert_eq!((reg >> 3) & 0b111, 3);
        assert_eq!(reg & ((1 << 6) | (1 << 7)), (1 << 6) | (1 << 7));
    }

    #[test]
    fn scratch_words() {
        let bkp = Bkp::new_for_tests();

        assert_eq!(bkp.write_scratch(0, 0xDEAD_BEEF), Some(()));
        assert_eq!(bkp.read_scratch(0), Some(0xDEAD_BEEF));
        assert_eq!(bkp.write_scratch(14, 7), Some(()));
        assert_eq!(bkp.read_scratch(14), Some(7));
        assert_eq!(bkp.write_scratch(15, 0), None);
        assert_eq!(bkp.read_scratch(15), None);
    }
}
