// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! ARM Cortex-M3 System Control Block, as implemented on the MDR32F9Qx.
//!
//! Only the registers the chip support code touches are modeled; the rest of
//! the SCS is reserved padding from this crate's point of view.

use tock_registers::interfaces::{ReadWriteable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

use crate::static_ref::StaticRef;

register_structs! {
    ScbRegisters {
        /// CPUID Base Register
        (0x00 => cpuid: ReadOnly<u32, CpuId::Register>),

        /// Interrupt Control and State Register
        (0x04 => icsr: ReadWrite<u32>),

        /// Vector Table Offset Register
        (0x08 => vtor: ReadWrite<u32, VectorTableOffset::Register>),

        /// Application Interrupt and Reset Control Register
        (0x0c => aircr: ReadWrite<u32, ApplicationInterruptAndReset::Register>),

        /// System Control Register
        (0x10 => scr: ReadWrite<u32, SystemControl::Register>),

        /// Configuration and Control Register
        (0x14 => ccr: ReadWrite<u32>),

        (0x18 => @END),
    }
}

register_bitfields![u32,
    CpuId [
        /// Implementer code assigned by ARM. ARM implementations are 0x41.
        IMPLEMENTER     OFFSET(24)  NUMBITS(8),

        /// Implementer-defined variant number.
        VARIANT         OFFSET(20)  NUMBITS(4),

        /// Architecture always reads as 0xF for Cortex-M.
        ARCHITECTURE    OFFSET(16)  NUMBITS(4),

        /// Implementer-defined part number.
        PARTNO          OFFSET(4)   NUMBITS(12),

        /// Implementer-defined revision number.
        REVISION        OFFSET(0)   NUMBITS(4)
    ],

    VectorTableOffset [
        /// Bits [31:7] of the vector table address; bits [6:0] are always 0.
        TBLOFF          OFFSET(7)   NUMBITS(25)
    ],

    ApplicationInterruptAndReset [
        /// Key field. Must write 0x05FA or the write is ignored.
        VECTKEY         OFFSET(16)  NUMBITS(16),

        /// 0=Little endian, 1=Big endian. RO.
        ENDIANNESS      OFFSET(15)  NUMBITS(1),

        /// Binary point position for priority grouping.
        PRIGROUP        OFFSET(8)   NUMBITS(3),

        /// Writing 1 requests a local reset.
        SYSRESETREQ     OFFSET(2)   NUMBITS(1)
    ],

    SystemControl [
        SEVONPEND       OFFSET(4)   NUMBITS(1),
        SLEEPDEEP       OFFSET(2)   NUMBITS(1),
        SLEEPONEXIT     OFFSET(1)   NUMBITS(1)
    ]
];

const SCB: StaticRef<ScbRegisters> = unsafe { StaticRef::new(0xE000ED00 as *const ScbRegisters) };

/// Relocate the interrupt vector table.
pub unsafe fn set_vector_table_offset(offset: *const ()) {
    SCB.vtor.set(offset as u32);
}

/// Allow the core to go into deep sleep on WFI.
pub unsafe fn set_sleepdeep() {
    SCB.scr.modify(SystemControl::SLEEPDEEP::SET);
}

/// Do not allow the core to go into deep sleep on WFI.
pub unsafe fn unset_sleepdeep() {
    SCB.scr.modify(SystemControl::SLEEPDEEP::CLEAR);
}

/// Software reset using the ARM System Control Block.
pub unsafe fn reset() {
    SCB.aircr.modify(
        ApplicationInterruptAndReset::VECTKEY.val(0x05FA)
            + ApplicationInterruptAndReset::SYSRESETREQ::SET,
    );
}
