// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Reset and clock controller (RST_CLK) for the MDR32F9Qx.
//!
//! The block owns the oscillator enables, the CPU PLL, the CPU clock tree
//! selects (CPU_C1 -> CPU_C2 -> CPU_C3 -> HCLK) and the peripheral clock
//! gates. The [`crate::clocks`] driver builds the bring-up sequence and the
//! core-clock computation on top of the accessors here.

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::register_bitfields;

use crate::static_ref::StaticRef;

/// Reset and clock control
#[repr(C)]
struct RstClkRegisters {
    /// clock status register
    clock_status: ReadOnly<u32, CLOCK_STATUS::Register>,
    /// PLL control register
    pll_control: ReadWrite<u32, PLL_CONTROL::Register>,
    /// high-speed oscillator control register
    hs_control: ReadWrite<u32, HS_CONTROL::Register>,
    /// CPU clock tree configuration register
    cpu_clock: ReadWrite<u32, CPU_CLOCK::Register>,
    /// USB clock tree configuration register
    usb_clock: ReadWrite<u32, USB_CLOCK::Register>,
    /// ADC and MCO clock configuration register
    adc_mco_clock: ReadWrite<u32, ADC_MCO_CLOCK::Register>,
    /// RTC HSE clock register
    rtc_hs_clock: ReadWrite<u32, RTC_HS_CLOCK::Register>,
    /// RTC HSI clock register
    rtc_hsi_clock: ReadWrite<u32, RTC_HSI_CLOCK::Register>,
    /// peripheral clock gating register
    per_clock: ReadWrite<u32, PER_CLOCK::Register>,
    /// CAN clock register
    can_clock: ReadWrite<u32, CAN_CLOCK::Register>,
    /// timer clock register
    tim_clock: ReadWrite<u32, TIM_CLOCK::Register>,
    /// UART clock register
    uart_clock: ReadWrite<u32, UART_CLOCK::Register>,
    /// SSP clock register
    ssp_clock: ReadWrite<u32, SSP_CLOCK::Register>,
}

register_bitfields![u32,
    CLOCK_STATUS [
        /// HSE oscillator ready flag
        HSE_RDY OFFSET(2) NUMBITS(1) [],
        /// CPU PLL lock flag
        PLL_CPU_RDY OFFSET(1) NUMBITS(1) [],
        /// USB PLL lock flag
        PLL_USB_RDY OFFSET(0) NUMBITS(1) []
    ],
    PLL_CONTROL [
        /// CPU PLL multiplication factor, output = input * (field + 1)
        PLL_CPU_MUL OFFSET(8) NUMBITS(4) [],
        /// USB PLL multiplication factor
        PLL_USB_MUL OFFSET(4) NUMBITS(4) [],
        /// CPU PLL multiplier reload, pulse to latch PLL_CPU_MUL
        PLL_CPU_PLD OFFSET(3) NUMBITS(1) [],
        /// CPU PLL enable
        PLL_CPU_ON OFFSET(2) NUMBITS(1) [],
        /// USB PLL multiplier reload
        PLL_USB_RLD OFFSET(1) NUMBITS(1) [],
        /// USB PLL enable
        PLL_USB_ON OFFSET(0) NUMBITS(1) []
    ],
    HS_CONTROL [
        /// HSE bypass, feed the pad clock straight through the oscillator
        HSE_BYP OFFSET(1) NUMBITS(1) [],
        /// HSE oscillator enable
        HSE_ON OFFSET(0) NUMBITS(1) []
    ],
    CPU_CLOCK [
        /// Final CPU clock select
        HCLK_SEL OFFSET(8) NUMBITS(2) [
            HSI = 0b00,
            CPU_C3 = 0b01,
            LSE = 0b10,
            LSI = 0b11
        ],
        /// CPU_C3 divider select. Bit 3 enables division, bits [2:0] select
        /// the divisor 2 << n.
        CPU_C3_SEL OFFSET(4) NUMBITS(4) [],
        /// CPU_C2 select
        CPU_C2_SEL OFFSET(2) NUMBITS(1) [
            CPU_C1 = 0,
            PLL_CPU = 1
        ],
        /// CPU_C1 oscillator select. Bit 1 selects HSE over HSI, bit 0 taps
        /// the oscillator divided by two.
        CPU_C1_SEL OFFSET(0) NUMBITS(2) [
            HSI = 0b00,
            HSI_DIV_2 = 0b01,
            HSE = 0b10,
            HSE_DIV_2 = 0b11
        ]
    ],
    USB_CLOCK [
        /// USB clock enable
        USB_CLK_EN OFFSET(8) NUMBITS(1) [],
        /// USB_C3 divide-by-two select
        USB_C3_SEL OFFSET(4) NUMBITS(1) [],
        /// USB_C2 select
        USB_C2_SEL OFFSET(2) NUMBITS(1) [],
        /// USB_C1 oscillator select
        USB_C1_SEL OFFSET(0) NUMBITS(2) []
    ],
    ADC_MCO_CLOCK [
        /// ADC clock enable
        ADC_CLK_EN OFFSET(13) NUMBITS(1) [],
        /// ADC_C3 divider select
        ADC_C3_SEL OFFSET(8) NUMBITS(4) [],
        /// ADC_C2 select
        ADC_C2_SEL OFFSET(4) NUMBITS(2) [],
        /// ADC_C1 select
        ADC_C1_SEL OFFSET(0) NUMBITS(2) []
    ],
    RTC_HS_CLOCK [
        /// RTC HSE clock enable
        HSE_RTC_EN OFFSET(4) NUMBITS(1) [],
        /// HSE divider select for the RTC
        HSE_SEL OFFSET(0) NUMBITS(4) []
    ],
    RTC_HSI_CLOCK [
        /// RTC HSI clock enable
        HSI_RTC_EN OFFSET(4) NUMBITS(1) [],
        /// HSI divider select for the RTC
        HSI_SEL OFFSET(0) NUMBITS(4) []
    ],
    PER_CLOCK [
        EXT_BUS OFFSET(30) NUMBITS(1) [],
        PORTF OFFSET(29) NUMBITS(1) [],
        BKP OFFSET(27) NUMBITS(1) [],
        PORTE OFFSET(25) NUMBITS(1) [],
        PORTD OFFSET(24) NUMBITS(1) [],
        PORTC OFFSET(23) NUMBITS(1) [],
        PORTB OFFSET(22) NUMBITS(1) [],
        PORTA OFFSET(21) NUMBITS(1) [],
        SSP2 OFFSET(20) NUMBITS(1) [],
        COMP OFFSET(19) NUMBITS(1) [],
        DAC OFFSET(18) NUMBITS(1) [],
        ADC OFFSET(17) NUMBITS(1) [],
        TIMER3 OFFSET(16) NUMBITS(1) [],
        TIMER2 OFFSET(15) NUMBITS(1) [],
        TIMER1 OFFSET(14) NUMBITS(1) [],
        IWDG OFFSET(13) NUMBITS(1) [],
        WWDG OFFSET(12) NUMBITS(1) [],
        POWER OFFSET(11) NUMBITS(1) [],
        I2C1 OFFSET(10) NUMBITS(1) [],
        SSP1 OFFSET(8) NUMBITS(1) [],
        UART2 OFFSET(7) NUMBITS(1) [],
        UART1 OFFSET(6) NUMBITS(1) [],
        DMA OFFSET(5) NUMBITS(1) [],
        RST_CLK OFFSET(4) NUMBITS(1) [],
        EEPROM OFFSET(3) NUMBITS(1) [],
        USB OFFSET(2) NUMBITS(1) [],
        CAN2 OFFSET(1) NUMBITS(1) [],
        CAN1 OFFSET(0) NUMBITS(1) []
    ],
    CAN_CLOCK [
        CAN2_CLK_EN OFFSET(25) NUMBITS(1) [],
        CAN1_CLK_EN OFFSET(24) NUMBITS(1) [],
        CAN2_BRG OFFSET(8) NUMBITS(8) [],
        CAN1_BRG OFFSET(0) NUMBITS(8) []
    ],
    TIM_CLOCK [
        TIM3_CLK_EN OFFSET(26) NUMBITS(1) [],
        TIM2_CLK_EN OFFSET(25) NUMBITS(1) [],
        TIM1_CLK_EN OFFSET(24) NUMBITS(1) [],
        TIM3_BRG OFFSET(16) NUMBITS(8) [],
        TIM2_BRG OFFSET(8) NUMBITS(8) [],
        TIM1_BRG OFFSET(0) NUMBITS(8) []
    ],
    UART_CLOCK [
        UART2_CLK_EN OFFSET(25) NUMBITS(1) [],
        UART1_CLK_EN OFFSET(24) NUMBITS(1) [],
        UART2_BRG OFFSET(8) NUMBITS(8) [],
        UART1_BRG OFFSET(0) NUMBITS(8) []
    ],
    SSP_CLOCK [
        SSP2_CLK_EN OFFSET(25) NUMBITS(1) [],
        SSP1_CLK_EN OFFSET(24) NUMBITS(1) [],
        SSP2_BRG OFFSET(8) NUMBITS(8) [],
        SSP1_BRG OFFSET(0) NUMBITS(8) []
    ]
];

const RST_CLK_BASE: StaticRef<RstClkRegisters> =
    unsafe { StaticRef::new(0x40020000 as *const RstClkRegisters) };

/// First-stage CPU clock (CPU_C1) source select.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuC1Source {
    Hsi = 0b00,
    HsiDividedBy2 = 0b01,
    Hse = 0b10,
    HseDividedBy2 = 0b11,
}

/// Second-stage CPU clock (CPU_C2) select.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuC2Source {
    CpuC1 = 0b0,
    PllCpu = 0b1,
}

/// Final CPU clock (HCLK) select.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HclkSource {
    Hsi = 0b00,
    CpuC3 = 0b01,
    Lse = 0b10,
    Lsi = 0b11,
}

/// CPU PLL multiplication factor. The hardware field encodes factor - 1.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllCpuMultiplier {
    Mul1 = 0,
    Mul2 = 1,
    Mul3 = 2,
    Mul4 = 3,
    Mul5 = 4,
    Mul6 = 5,
    Mul7 = 6,
    Mul8 = 7,
    Mul9 = 8,
    Mul10 = 9,
    Mul11 = 10,
    Mul12 = 11,
    Mul13 = 12,
    Mul14 = 13,
    Mul15 = 14,
    Mul16 = 15,
}

impl PllCpuMultiplier {
    /// The effective multiplication factor.
    pub const fn factor(self) -> u32 {
        self as u32 + 1
    }

    fn from_field(bits: u32) -> Self {
        match bits & 0b1111 {
            0 => Self::Mul1,
            1 => Self::Mul2,
            2 => Self::Mul3,
            3 => Self::Mul4,
            4 => Self::Mul5,
            5 => Self::Mul6,
            6 => Self::Mul7,
            7 => Self::Mul8,
            8 => Self::Mul9,
            9 => Self::Mul10,
            10 => Self::Mul11,
            11 => Self::Mul12,
            12 => Self::Mul13,
            13 => Self::Mul14,
            14 => Self::Mul15,
            _ => Self::Mul16,
        }
    }
}

/// Third-stage CPU clock (CPU_C3) divider. Bit 3 of the field enables
/// division; bits [2:0] select a divisor of `2 << n`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuC3Divider {
    DivideBy1 = 0b0000,
    DivideBy2 = 0b1000,
    DivideBy4 = 0b1001,
    DivideBy8 = 0b1010,
    DivideBy16 = 0b1011,
    DivideBy32 = 0b1100,
    DivideBy64 = 0b1101,
    DivideBy128 = 0b1110,
    DivideBy256 = 0b1111,
}

impl CpuC3Divider {
    pub const fn divisor(self) -> u32 {
        let bits = self as u32;
        if bits & 0b1000 == 0 {
            1
        } else {
            2 << (bits & 0b0111)
        }
    }

    fn from_field(bits: u32) -> Self {
        match bits & 0b1111 {
            0b1000 => Self::DivideBy2,
            0b1001 => Self::DivideBy4,
            0b1010 => Self::DivideBy8,
            0b1011 => Self::DivideBy16,
            0b1100 => Self::DivideBy32,
            0b1101 => Self::DivideBy64,
            0b1110 => Self::DivideBy128,
            // Divide enable bit clear, the stage passes CPU_C2 through.
            _ if bits & 0b1000 == 0 => Self::DivideBy1,
            _ => Self::DivideBy256,
        }
    }
}

/// HSE mode
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HseMode {
    BYPASS,
    CRYSTAL,
}

pub struct RstClk {
    registers: StaticRef<RstClkRegisters>,
}

impl RstClk {
    pub const fn new() -> Self {
        Self {
            registers: RST_CLK_BASE,
        }
    }

    /* HSE oscillator */

    pub fn enable_hse_clock(&self) {
        self.registers.hs_control.modify(HS_CONTROL::HSE_ON::SET);
    }

    pub fn enable_hse_clock_bypass(&self) {
        self.registers.hs_control.modify(HS_CONTROL::HSE_BYP::SET);
    }

    pub fn disable_hse_clock(&self) {
        self.registers.hs_control.modify(HS_CONTROL::HSE_ON::CLEAR);
        self.registers.hs_control.modify(HS_CONTROL::HSE_BYP::CLEAR);
    }

    pub fn is_enabled_hse_clock(&self) -> bool {
        self.registers.hs_control.is_set(HS_CONTROL::HSE_ON)
    }

    // Indicates whether the HSE oscillator is stable
    pub fn is_ready_hse_clock(&self) -> bool {
        self.registers.clock_status.is_set(CLOCK_STATUS::HSE_RDY)
    }

    /* CPU PLL */

    pub fn set_pll_cpu_multiplier(&self, multiplier: PllCpuMultiplier) {
        self.registers
            .pll_control
            .modify(PLL_CONTROL::PLL_CPU_MUL.val(multiplier as u32));
    }

    pub fn get_pll_cpu_multiplier(&self) -> PllCpuMultiplier {
        PllCpuMultiplier::from_field(self.registers.pll_control.read(PLL_CONTROL::PLL_CPU_MUL))
    }

    // The CPU PLL must not be feeding HCLK when disabled.
    pub fn disable_pll_cpu_clock(&self) {
        self.registers.pll_control.modify(PLL_CONTROL::PLL_CPU_ON::CLEAR);
    }

    pub fn enable_pll_cpu_clock(&self) {
        self.registers.pll_control.modify(PLL_CONTROL::PLL_CPU_ON::SET);
    }

    pub fn is_enabled_pll_cpu_clock(&self) -> bool {
        self.registers.pll_control.is_set(PLL_CONTROL::PLL_CPU_ON)
    }

    // Indicates whether the CPU PLL has locked
    pub fn is_ready_pll_cpu_clock(&self) -> bool {
        self.registers.clock_status.is_set(CLOCK_STATUS::PLL_CPU_RDY)
    }

    /// Pulse the reload bit so the PLL latches a new multiplier.
    pub fn relatch_pll_cpu_multiplier(&self) {
        self.registers.pll_control.modify(PLL_CONTROL::PLL_CPU_PLD::SET);
        self.registers.pll_control.modify(PLL_CONTROL::PLL_CPU_PLD::CLEAR);
    }

    /* CPU clock tree selects */

    pub fn set_cpu_c1_source(&self, source: CpuC1Source) {
        self.registers
            .cpu_clock
            .modify(CPU_CLOCK::CPU_C1_SEL.val(source as u32));
    }

    pub fn get_cpu_c1_source(&self) -> CpuC1Source {
        match self.registers.cpu_clock.read(CPU_CLOCK::CPU_C1_SEL) {
            0b00 => CpuC1Source::Hsi,
            0b01 => CpuC1Source::HsiDividedBy2,
            0b10 => CpuC1Source::Hse,
            _ => CpuC1Source::HseDividedBy2,
        }
    }

    pub fn set_cpu_c2_source(&self, source: CpuC2Source) {
        self.registers
            .cpu_clock
            .modify(CPU_CLOCK::CPU_C2_SEL.val(source as u32));
    }

    pub fn get_cpu_c2_source(&self) -> CpuC2Source {
        match self.registers.cpu_clock.read(CPU_CLOCK::CPU_C2_SEL) {
            0 => CpuC2Source::CpuC1,
            _ => CpuC2Source::PllCpu,
        }
    }

    pub fn set_cpu_c3_divider(&self, divider: CpuC3Divider) {
        self.registers
            .cpu_clock
            .modify(CPU_CLOCK::CPU_C3_SEL.val(divider as u32));
    }

    pub fn get_cpu_c3_divider(&self) -> CpuC3Divider {
        CpuC3Divider::from_field(self.registers.cpu_clock.read(CPU_CLOCK::CPU_C3_SEL))
    }

    pub fn set_hclk_source(&self, source: HclkSource) {
        self.registers
            .cpu_clock
            .modify(CPU_CLOCK::HCLK_SEL.val(source as u32));
    }

    pub fn get_hclk_source(&self) -> HclkSource {
        match self.registers.cpu_clock.read(CPU_CLOCK::HCLK_SEL) {
            0b00 => HclkSource::Hsi,
            0b01 => HclkSource::CpuC3,
            0b10 => HclkSource::Lse,
            _ => HclkSource::Lsi,
        }
    }

    /* Reset-state defaults */

    /// Gate off every peripheral clock except the controllers that must stay
    /// alive across bring-up: RST_CLK itself and the backup domain.
    pub fn reset_peripheral_clocks(&self) {
        self.registers
            .per_clock
            .write(PER_CLOCK::RST_CLK::SET + PER_CLOCK::BKP::SET);
    }

    /// Put the clock tree configuration back into its unconfigured state.
    pub fn reset_clock_configuration(&self) {
        self.registers.cpu_clock.set(0);
        self.registers.pll_control.set(0);
        self.registers.hs_control.set(0);
        self.registers.usb_clock.set(0);
        self.registers.adc_mco_clock.set(0);
    }

    /* Peripheral clock gates */

    pub fn is_enabled_eeprom_clock(&self) -> bool {
        self.registers.per_clock.is_set(PER_CLOCK::EEPROM)
    }

    pub fn enable_eeprom_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::EEPROM::SET);
    }

    pub fn disable_eeprom_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::EEPROM::CLEAR);
    }

    pub fn is_enabled_dma_clock(&self) -> bool {
        self.registers.per_clock.is_set(PER_CLOCK::DMA)
    }

    pub fn enable_dma_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::DMA::SET);
    }

    pub fn disable_dma_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::DMA::CLEAR);
    }

    pub fn is_enabled_uart1_clock(&self) -> bool {
        self.registers.per_clock.is_set(PER_CLOCK::UART1)
    }

    pub fn enable_uart1_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::UART1::SET);
    }

    pub fn disable_uart1_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::UART1::CLEAR);
    }

    pub fn is_enabled_uart2_clock(&self) -> bool {
        self.registers.per_clock.is_set(PER_CLOCK::UART2)
    }

    pub fn enable_uart2_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::UART2::SET);
    }

    pub fn disable_uart2_clock(&self) {
        self.registers.per_clock.modify(PER_CLOCK::UART2::CLEAR);
    }
}

#[cfg(test)]
impl RstClk {
    const HSE_RDY_BIT: u32 = 1 << 2;
    const PLL_CPU_RDY_BIT: u32 = 1 << 1;

    /// A fresh accessor over a zeroed register block in host memory.
    pub(crate) fn new_for_tests() -> Self {
        use core::mem::MaybeUninit;
        let registers = std::boxed::Box::leak(std::boxed::Box::new(unsafe {
            MaybeUninit::<RstClkRegisters>::zeroed().assume_init()
        }));
        Self {
            registers: unsafe { StaticRef::new(registers) },
        }
    }

    pub(crate) fn set_hse_ready_for_tests(&self, ready: bool) {
        self.force_clock_status(Self::HSE_RDY_BIT, ready);
    }

    pub(crate) fn set_pll_cpu_ready_for_tests(&self, ready: bool) {
        self.force_clock_status(Self::PLL_CPU_RDY_BIT, ready);
    }

    // CLOCK_STATUS is read-only through the register interface; write the
    // backing word directly. It is the first register in the block.
    fn force_clock_status(&self, bit: u32, set: bool) {
        let status = self.registers.clock_status.get();
        let status = if set { status | bit } else { status & !bit };
        let base = &*self.registers as *const RstClkRegisters as *mut u32;
        unsafe { base.write_volatile(status) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_c1_source_field_encoding() {
        let rst_clk = RstClk::new_for_tests();

        for (source, bits) in [
            (CpuC1Source::Hsi, 0b00),
            (CpuC1Source::HsiDividedBy2, 0b01),
            (CpuC1Source::Hse, 0b10),
            (CpuC1Source::HseDividedBy2, 0b11),
        ] {
            rst_clk.set_cpu_c1_source(source);
            assert_eq!(rst_clk.registers.cpu_clock.get() & 0b11, bits);
            assert_eq!(rst_clk.get_cpu_c1_source(), source);
        }
    }

    #[test]
    fn pll_multiplier_field_position() {
        let rst_clk = RstClk::new_for_tests();

        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul16);
        assert_eq!(rst_clk.registers.pll_control.get(), 0xF00);
        assert_eq!(rst_clk.get_pll_cpu_multiplier(), PllCpuMultiplier::Mul16);

        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul4);
        assert_eq!(rst_clk.registers.pll_control.get(), 0x300);
    }

    #[test]
    fn pll_relatch_pulses_without_disturbing_configuration() {
        let rst_clk = RstClk::new_for_tests();

        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul10);
        rst_clk.enable_pll_cpu_clock();
        rst_clk.relatch_pll_cpu_multiplier();

        // PLD must end up clear; ON and MUL must survive the pulse.
        assert!(rst_clk.is_enabled_pll_cpu_clock());
        assert_eq!(rst_clk.get_pll_cpu_multiplier(), PllCpuMultiplier::Mul10);
        assert_eq!(rst_clk.registers.pll_control.get() & (1 << 3), 0);
    }

    #[test]
    fn reset_peripheral_clocks_keeps_only_rst_clk_and_bkp() {
        let rst_clk = RstClk::new_for_tests();

        rst_clk.registers.per_clock.set(!0);
        rst_clk.reset_peripheral_clocks();
        assert_eq!(rst_clk.registers.per_clock.get(), (1 << 4) | (1 << 27));
    }

    #[test]
    fn reset_clock_configuration_zeroes_the_tree() {
        let rst_clk = RstClk::new_for_tests();

        rst_clk.enable_hse_clock();
        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul8);
        rst_clk.set_hclk_source(HclkSource::CpuC3);
        rst_clk.registers.usb_clock.set(0x1FF);
        rst_clk.registers.adc_mco_clock.set(0x2013);

        rst_clk.reset_clock_configuration();

        assert_eq!(rst_clk.registers.cpu_clock.get(), 0);
        assert_eq!(rst_clk.registers.pll_control.get(), 0);
        assert_eq!(rst_clk.registers.hs_control.get(), 0);
        assert_eq!(rst_clk.registers.usb_clock.get(), 0);
        assert_eq!(rst_clk.registers.adc_mco_clock.get(), 0);
    }

    #[test]
    fn hse_enable_and_ready_flag() {
        let rst_clk = RstClk::new_for_tests();

        assert!(!rst_clk.is_enabled_hse_clock());
        rst_clk.enable_hse_clock();
        assert!(rst_clk.is_enabled_hse_clock());
        assert_eq!(rst_clk.registers.hs_control.get(), 0b01);

        assert!(!rst_clk.is_ready_hse_clock());
        rst_clk.set_hse_ready_for_tests(true);
        assert!(rst_clk.is_ready_hse_clock());

        rst_clk.enable_hse_clock_bypass();
        assert_eq!(rst_clk.registers.hs_control.get(), 0b11);

        rst_clk.disable_hse_clock();
        assert_eq!(rst_clk.registers.hs_control.get(), 0);
    }

    #[test]
    fn cpu_c3_divider_encoding() {
        for (divider, divisor) in [
            (CpuC3Divider::DivideBy1, 1),
            (CpuC3Divider::DivideBy2, 2),
            (CpuC3Divider::DivideBy4, 4),
            (CpuC3Divider::DivideBy8, 8),
            (CpuC3Divider::DivideBy16, 16),
            (CpuC3Divider::DivideBy32, 32),
            (CpuC3Divider::DivideBy64, 64),
            (CpuC3Divider::DivideBy128, 128),
            (CpuC3Divider::DivideBy256, 256),
        ] {
            assert_eq!(divider.divisor(), divisor);
        }

        let rst_clk = RstClk::new_for_tests();
        rst_clk.set_cpu_c3_divider(CpuC3Divider::DivideBy64);
        assert_eq!(rst_clk.registers.cpu_clock.get() & 0xF0, 0b1101 << 4);
        assert_eq!(rst_clk.get_cpu_c3_divider(), CpuC3Divider::DivideBy64);

        // Any encoding with the divide-enable bit clear reads back as /1.
        rst_clk.registers.cpu_clock.set(0b0111 << 4);
        assert_eq!(rst_clk.get_cpu_c3_divider(), CpuC3Divider::DivideBy1);
    }

    #[test]
    fn eeprom_clock_gating() {
        let rst_clk = RstClk::new_for_tests();

        assert!(!rst_clk.is_enabled_eeprom_clock());
        rst_clk.enable_eeprom_clock();
        assert!(rst_clk.is_enabled_eeprom_clock());
        assert_eq!(rst_clk.registers.per_clock.get(), 1 << 3);
        rst_clk.disable_eeprom_clock();
        assert!(!rst_clk.is_enabled_eeprom_clock());
    }
}
