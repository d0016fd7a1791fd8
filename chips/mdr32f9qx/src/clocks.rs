// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! MDR32F9Qx clock driver.
//!
//! Two responsibilities live here:
//!
//! - [`Clocks::init`] runs the one-shot post-reset bring-up: put the RST_CLK
//!   block into a known default state, start the HSE oscillator, lock the CPU
//!   PLL, move HCLK onto the PLL path and insert the flash wait states the
//!   faster clock requires.
//! - [`Clocks::update_core_clock`] recomputes the core clock frequency from
//!   the current register state and publishes it. Peripheral drivers that
//!   derive timing from the core clock (baud rate generators, delay loops)
//!   read the published value through [`Clocks::core_clock_frequency`].
//!
//! The published frequency is owned by [`Clocks`] and written only by the
//! resolver; it starts at the 8 MHz the hardware runs at out of reset.
//!
//! # Usage
//!
//! ```rust,ignore
//! let rst_clk = RstClk::new();
//! let bkp = Bkp::new();
//! let eeprom = Eeprom::new();
//! let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);
//!
//! clocks.init(&SystemClockConfig::default())?;
//! let baud_base = clocks.core_clock_frequency();
//! ```

use core::cell::Cell;

use crate::bkp::{Bkp, CoreRegulatorDrive};
use crate::eeprom::{Eeprom, EepromAccessDelay};
use crate::rst_clk::{
    CpuC1Source, CpuC2Source, CpuC3Divider, HclkSource, HseMode, PllCpuMultiplier, RstClk,
};

/// HSI RC oscillator frequency.
pub const HSI_FREQUENCY_HZ: u32 = 8_000_000;
/// Default board crystal on the HSE input. Boards with a different crystal
/// override it through [`Hse::set_frequency_hz`].
pub const HSE_FREQUENCY_HZ: u32 = 8_000_000;
/// LSI RC oscillator frequency.
pub const LSI_FREQUENCY_HZ: u32 = 40_000;
/// LSE watch crystal frequency.
pub const LSE_FREQUENCY_HZ: u32 = 32_768;
/// Rated core clock limit for this part.
pub const MAX_CORE_FREQUENCY_HZ: u32 = 80_000_000;

/// Clock configuration related error
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// The requested configuration was impossible or conflicting
    BadConfiguration {
        /// Explanation of error
        reason: &'static str,
    },
}

/// Main HSE clock structure
pub struct Hse<'a> {
    rst_clk: &'a RstClk,
    frequency_hz: Cell<u32>,
}

impl<'a> Hse<'a> {
    fn new(rst_clk: &'a RstClk) -> Self {
        Self {
            rst_clk,
            frequency_hz: Cell::new(HSE_FREQUENCY_HZ),
        }
    }

    /// Start the HSE oscillator and wait for it to stabilize.
    ///
    /// This blocks until the hardware reports the oscillator ready. A dead
    /// crystal hangs bring-up forever: this runs before any fault handling
    /// exists and there is no clock to fall back onto.
    pub fn enable(&self, mode: HseMode) {
        if mode == HseMode::BYPASS {
            self.rst_clk.enable_hse_clock_bypass();
        }

        self.rst_clk.enable_hse_clock();

        while !self.rst_clk.is_ready_hse_clock() {}
    }

    /// Stop the HSE oscillator. The caller must have moved the CPU off every
    /// HSE-derived path first.
    pub fn disable(&self) {
        self.rst_clk.disable_hse_clock();
    }

    /// Check whether the HSE oscillator is enabled.
    pub fn is_enabled(&self) -> bool {
        self.rst_clk.is_enabled_hse_clock()
    }

    /// Get the frequency in Hz of the HSE clock, or `None` while it is
    /// disabled.
    pub fn get_frequency_hz(&self) -> Option<u32> {
        if self.is_enabled() {
            Some(self.frequency_hz.get())
        } else {
            None
        }
    }

    /// Declare the frequency of the board's HSE source in Hz.
    pub fn set_frequency_hz(&self, frequency: u32) {
        self.frequency_hz.set(frequency);
    }
}

/// Parameters for the post-reset clock bring-up.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemClockConfig {
    /// Whether the HSE pad drives a crystal or takes an external clock.
    pub hse_mode: HseMode,
    /// First-stage clock select programmed before the PLL starts.
    pub cpu_c1_source: CpuC1Source,
    /// CPU PLL multiplication factor.
    pub pll_multiplier: PllCpuMultiplier,
    /// Third-stage divider between the PLL and HCLK.
    pub cpu_c3_divider: CpuC3Divider,
}

impl SystemClockConfig {
    /// The default bring-up: 8 MHz crystal, PLL x4, no output division, for
    /// a 32 MHz core clock.
    pub const fn new() -> Self {
        Self {
            hse_mode: HseMode::CRYSTAL,
            cpu_c1_source: CpuC1Source::Hse,
            pll_multiplier: PllCpuMultiplier::Mul4,
            cpu_c3_divider: CpuC3Divider::DivideBy1,
        }
    }
}

impl Default for SystemClockConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Main struct for configuring on-board clocks.
pub struct Clocks<'a> {
    rst_clk: &'a RstClk,
    bkp: &'a Bkp,
    eeprom: &'a Eeprom,
    /// High speed external clock
    pub hse: Hse<'a>,
    // Published core clock frequency. Only update_core_clock() writes it.
    core_frequency_hz: Cell<u32>,
}

impl<'a> Clocks<'a> {
    pub fn new(rst_clk: &'a RstClk, bkp: &'a Bkp, eeprom: &'a Eeprom) -> Self {
        Self {
            rst_clk,
            bkp,
            eeprom,
            hse: Hse::new(rst_clk),
            core_frequency_hz: Cell::new(HSI_FREQUENCY_HZ),
        }
    }

    /// The core clock frequency in Hz, as published by the last
    /// [`Clocks::update_core_clock`] call.
    pub fn core_clock_frequency(&self) -> u32 {
        self.core_frequency_hz.get()
    }

    // The frequency the configuration will produce once the CPU runs from
    // the PLL path. Needed up front: the regulator drive and the flash wait
    // states are programmed for the target frequency, not the current one.
    fn target_core_frequency(&self, config: &SystemClockConfig) -> u32 {
        let cpu_c1_freq = match config.cpu_c1_source {
            CpuC1Source::Hsi => HSI_FREQUENCY_HZ,
            CpuC1Source::HsiDividedBy2 => HSI_FREQUENCY_HZ / 2,
            CpuC1Source::Hse => self.hse.frequency_hz.get(),
            CpuC1Source::HseDividedBy2 => self.hse.frequency_hz.get() / 2,
        };
        let cpu_c2_freq = cpu_c1_freq * config.pll_multiplier.factor();
        cpu_c2_freq / config.cpu_c3_divider.divisor()
    }

    /// One-shot clock bring-up.
    ///
    /// Call once, early after reset, before anything else relies on a live
    /// oscillator or on peripheral clocks; re-running it mid-flight is not
    /// supported and will glitch every clocked peripheral. Both hardware
    /// ready polls block with no timeout (see [`Hse::enable`]).
    pub fn init(&self, config: &SystemClockConfig) -> Result<(), ClockError> {
        let target = self.target_core_frequency(config);
        if target > MAX_CORE_FREQUENCY_HZ {
            return Err(ClockError::BadConfiguration {
                reason: "core clock above the rated 80 MHz limit",
            });
        }

        // Gate off everything but RST_CLK and the backup domain, and put the
        // clock tree back into its unconfigured reset state.
        self.rst_clk.reset_peripheral_clocks();
        self.rst_clk.reset_clock_configuration();

        // The regulator has to be able to sustain the target frequency
        // before the switch happens.
        self.bkp
            .set_core_regulator_drive(CoreRegulatorDrive::for_core_clock(target));

        self.hse.enable(config.hse_mode);

        self.rst_clk.set_cpu_c1_source(config.cpu_c1_source);

        self.rst_clk.set_pll_cpu_multiplier(config.pll_multiplier);
        self.rst_clk.enable_pll_cpu_clock();
        self.rst_clk.relatch_pll_cpu_multiplier();

        while !self.rst_clk.is_ready_pll_cpu_clock() {}

        // The PLL has locked; route it through CPU_C2/CPU_C3 onto HCLK.
        self.rst_clk.set_cpu_c3_divider(config.cpu_c3_divider);
        self.rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        self.rst_clk.set_hclk_source(HclkSource::CpuC3);

        // Flash fetches need wait states at the higher core clock.
        self.rst_clk.enable_eeprom_clock();
        self.eeprom
            .set_access_delay(EepromAccessDelay::for_core_clock(target));

        let frequency = self.update_core_clock();
        debug!("clocks: core clock running at {} Hz", frequency);

        Ok(())
    }

    /// Recompute the core clock frequency from the current register state
    /// and publish it.
    ///
    /// Safe to call at any point after a reconfiguration; calling it twice
    /// with unchanged registers yields the same value.
    pub fn update_core_clock(&self) -> u32 {
        let frequency = self.resolve_core_clock();
        self.core_frequency_hz.set(frequency);
        frequency
    }

    // Walk the CPU clock tree the way the hardware does: oscillator select
    // (with optional /2 tap), optional PLL multiplication, then the final
    // four-way HCLK select.
    fn resolve_core_clock(&self) -> u32 {
        let cpu_c1_freq = match self.rst_clk.get_cpu_c1_source() {
            CpuC1Source::Hsi => HSI_FREQUENCY_HZ,
            CpuC1Source::HsiDividedBy2 => HSI_FREQUENCY_HZ / 2,
            CpuC1Source::Hse => self.hse.frequency_hz.get(),
            CpuC1Source::HseDividedBy2 => self.hse.frequency_hz.get() / 2,
        };

        let cpu_c2_freq = match self.rst_clk.get_cpu_c2_source() {
            CpuC2Source::CpuC1 => cpu_c1_freq,
            CpuC2Source::PllCpu => cpu_c1_freq * self.rst_clk.get_pll_cpu_multiplier().factor(),
        };

        match self.rst_clk.get_hclk_source() {
            HclkSource::Hsi => HSI_FREQUENCY_HZ,
            HclkSource::CpuC3 => cpu_c2_freq / self.rst_clk.get_cpu_c3_divider().divisor(),
            HclkSource::Lse => LSE_FREQUENCY_HZ,
            HclkSource::Lsi => LSI_FREQUENCY_HZ,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peripherals() -> (RstClk, Bkp, Eeprom) {
        (
            RstClk::new_for_tests(),
            Bkp::new_for_tests(),
            Eeprom::new_for_tests(),
        )
    }

    #[test]
    fn core_clock_defaults_to_hsi() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        // The published value starts at the reset-state 8 MHz, and resolving
        // an untouched register block yields the same.
        assert_eq!(clocks.core_clock_frequency(), 8_000_000);
        assert_eq!(clocks.update_core_clock(), 8_000_000);
    }

    #[test]
    fn resolver_selects_documented_sources() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        // Garbage in the PLL and divider fields must not leak into the
        // bypass selections.
        rst_clk.set_cpu_c1_source(CpuC1Source::HseDividedBy2);
        rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul16);
        rst_clk.set_cpu_c3_divider(CpuC3Divider::DivideBy256);

        rst_clk.set_hclk_source(HclkSource::Hsi);
        assert_eq!(clocks.update_core_clock(), HSI_FREQUENCY_HZ);

        rst_clk.set_hclk_source(HclkSource::Lse);
        assert_eq!(clocks.update_core_clock(), LSE_FREQUENCY_HZ);

        rst_clk.set_hclk_source(HclkSource::Lsi);
        assert_eq!(clocks.update_core_clock(), LSI_FREQUENCY_HZ);

        // The derived path does use them.
        rst_clk.set_hclk_source(HclkSource::CpuC3);
        assert_eq!(clocks.update_core_clock(), 4_000_000 * 16 / 256);
    }

    #[test]
    fn pll_multiplier_covers_x1_to_x16() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        rst_clk.set_cpu_c1_source(CpuC1Source::Hsi);
        rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        rst_clk.set_hclk_source(HclkSource::CpuC3);

        for (multiplier, factor) in [
            (PllCpuMultiplier::Mul1, 1),
            (PllCpuMultiplier::Mul2, 2),
            (PllCpuMultiplier::Mul3, 3),
            (PllCpuMultiplier::Mul4, 4),
            (PllCpuMultiplier::Mul5, 5),
            (PllCpuMultiplier::Mul6, 6),
            (PllCpuMultiplier::Mul7, 7),
            (PllCpuMultiplier::Mul8, 8),
            (PllCpuMultiplier::Mul9, 9),
            (PllCpuMultiplier::Mul10, 10),
            (PllCpuMultiplier::Mul11, 11),
            (PllCpuMultiplier::Mul12, 12),
            (PllCpuMultiplier::Mul13, 13),
            (PllCpuMultiplier::Mul14, 14),
            (PllCpuMultiplier::Mul15, 15),
            (PllCpuMultiplier::Mul16, 16),
        ] {
            rst_clk.set_pll_cpu_multiplier(multiplier);
            assert_eq!(clocks.update_core_clock(), HSI_FREQUENCY_HZ * factor);
        }
    }

    #[test]
    fn c3_divider_shifts_the_pll_output() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        // 8 MHz HSE x4 = 32 MHz into the divider stage.
        rst_clk.set_cpu_c1_source(CpuC1Source::Hse);
        rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul4);
        rst_clk.set_hclk_source(HclkSource::CpuC3);

        rst_clk.set_cpu_c3_divider(CpuC3Divider::DivideBy1);
        assert_eq!(clocks.update_core_clock(), 32_000_000);

        for (divider, divisor) in [
            (CpuC3Divider::DivideBy2, 2),
            (CpuC3Divider::DivideBy4, 4),
            (CpuC3Divider::DivideBy8, 8),
            (CpuC3Divider::DivideBy16, 16),
            (CpuC3Divider::DivideBy32, 32),
            (CpuC3Divider::DivideBy64, 64),
            (CpuC3Divider::DivideBy128, 128),
            (CpuC3Divider::DivideBy256, 256),
        ] {
            rst_clk.set_cpu_c3_divider(divider);
            assert_eq!(clocks.update_core_clock(), 32_000_000 / divisor);
        }
    }

    #[test]
    fn division_truncates() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        clocks.hse.set_frequency_hz(10_000_001);
        rst_clk.set_cpu_c1_source(CpuC1Source::Hse);
        rst_clk.set_cpu_c2_source(CpuC2Source::CpuC1);
        rst_clk.set_hclk_source(HclkSource::CpuC3);
        rst_clk.set_cpu_c3_divider(CpuC3Divider::DivideBy2);

        assert_eq!(clocks.update_core_clock(), 5_000_000);
    }

    #[test]
    fn c1_divide_by_two_halves_the_oscillator() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        rst_clk.set_cpu_c2_source(CpuC2Source::CpuC1);
        rst_clk.set_hclk_source(HclkSource::CpuC3);

        rst_clk.set_cpu_c1_source(CpuC1Source::HseDividedBy2);
        assert_eq!(clocks.update_core_clock(), 4_000_000);

        rst_clk.set_cpu_c1_source(CpuC1Source::HsiDividedBy2);
        assert_eq!(clocks.update_core_clock(), 4_000_000);
    }

    #[test]
    fn resolver_is_idempotent() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        rst_clk.set_cpu_c1_source(CpuC1Source::Hse);
        rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul7);
        rst_clk.set_cpu_c3_divider(CpuC3Divider::DivideBy2);
        rst_clk.set_hclk_source(HclkSource::CpuC3);

        let first = clocks.update_core_clock();
        let second = clocks.update_core_clock();
        assert_eq!(first, second);
        assert_eq!(first, 8_000_000 * 7 / 2);
    }

    #[test]
    fn board_crystal_override_feeds_the_resolver() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        clocks.hse.set_frequency_hz(16_000_000);
        rst_clk.set_cpu_c1_source(CpuC1Source::Hse);
        rst_clk.set_cpu_c2_source(CpuC2Source::PllCpu);
        rst_clk.set_pll_cpu_multiplier(PllCpuMultiplier::Mul4);
        rst_clk.set_hclk_source(HclkSource::CpuC3);

        assert_eq!(clocks.update_core_clock(), 64_000_000);
    }

    #[test]
    fn init_rejects_overclocked_configuration() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        let config = SystemClockConfig {
            pll_multiplier: PllCpuMultiplier::Mul16,
            ..SystemClockConfig::default()
        };

        assert_eq!(
            clocks.init(&config),
            Err(ClockError::BadConfiguration {
                reason: "core clock above the rated 80 MHz limit",
            })
        );

        // Validation must come before any register write.
        assert!(!rst_clk.is_enabled_hse_clock());
        assert!(!rst_clk.is_enabled_eeprom_clock());
        assert_eq!(clocks.core_clock_frequency(), 8_000_000);
    }

    // The bring-up must perform its writes in the documented order, and in
    // particular must not move past either ready poll before the hardware
    // (here: the harness thread) reports ready.
    #[test]
    fn init_waits_for_ready_bits_in_order() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;
        use std::time::Duration;

        struct AssertSend<T>(T);
        unsafe impl<T> Send for AssertSend<T> {}

        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        let done = AtomicBool::new(false);

        let wait_until = |condition: &dyn Fn() -> bool| {
            while !condition() {
                thread::sleep(Duration::from_millis(1));
            }
        };

        thread::scope(|s| {
            let clocks_handle = AssertSend(&clocks);
            let done = &done;
            s.spawn(move || {
                let clocks = clocks_handle;
                clocks.0.init(&SystemClockConfig::default()).unwrap();
                done.store(true, Ordering::Release);
            });

            // Parked at the HSE ready poll: oscillator on, nothing from the
            // later steps visible yet.
            wait_until(&|| rst_clk.is_enabled_hse_clock());
            assert!(!done.load(Ordering::Acquire));
            assert_eq!(rst_clk.get_cpu_c1_source(), CpuC1Source::Hsi);
            assert!(!rst_clk.is_enabled_pll_cpu_clock());

            rst_clk.set_hse_ready_for_tests(true);

            // Parked at the PLL lock poll: C1 switched and PLL programmed,
            // but the CPU still on the reset clock path.
            wait_until(&|| rst_clk.is_enabled_pll_cpu_clock());
            assert!(!done.load(Ordering::Acquire));
            assert_eq!(rst_clk.get_cpu_c1_source(), CpuC1Source::Hse);
            assert_eq!(rst_clk.get_pll_cpu_multiplier(), PllCpuMultiplier::Mul4);
            assert_eq!(rst_clk.get_hclk_source(), HclkSource::Hsi);
            assert!(!rst_clk.is_enabled_eeprom_clock());

            rst_clk.set_pll_cpu_ready_for_tests(true);
        });

        assert!(done.load(Ordering::Acquire));
        assert_eq!(rst_clk.get_cpu_c2_source(), CpuC2Source::PllCpu);
        assert_eq!(rst_clk.get_hclk_source(), HclkSource::CpuC3);
        assert!(rst_clk.is_enabled_eeprom_clock());
        assert_eq!(eeprom.get_access_delay(), EepromAccessDelay::Cycles1);

        // 8 MHz crystal, x4, no division: the published core clock is the
        // end-to-end 32 MHz.
        assert_eq!(clocks.core_clock_frequency(), 32_000_000);
    }

    #[test]
    fn hse_frequency_reads_none_while_disabled() {
        let (rst_clk, bkp, eeprom) = peripherals();
        let clocks = Clocks::new(&rst_clk, &bkp, &eeprom);

        assert_eq!(clocks.hse.get_frequency_hz(), None);
        rst_clk.set_hse_ready_for_tests(true);
        clocks.hse.enable(HseMode::CRYSTAL);
        assert_eq!(clocks.hse.get_frequency_hz(), Some(HSE_FREQUENCY_HZ));
        assert!(clocks.hse.is_enabled());

        clocks.hse.disable();
        assert_eq!(clocks.hse.get_frequency_hz(), None);
    }
}
