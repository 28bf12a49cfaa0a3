//! Serial Peripheral Interface (SPI)
//!
//! Type-level markers for the SPI peripherals, the pins each signal can use
//! (see [`ValidPinIdSck`] and friends) and the baud rate prescaler.
//!
//! The SPI kernel clock feeds a power-of-two divider, `BR[2:0]` in `SPI_CR1`.
//! [`BaudRatePrescaler::for_target`] picks the divider for a wanted bus
//! frequency:
//!
//! ```
//! use feed_bsp::spi::BaudRatePrescaler;
//! use fugit::RateExtU32;
//!
//! let br = BaudRatePrescaler::for_target(feed_bsp::spi1::PERIPH_CLOCK, 10.MHz()).unwrap();
//! assert_eq!(br, BaudRatePrescaler::Div16);
//! assert_eq!(br.output(feed_bsp::spi1::PERIPH_CLOCK), 5_250_000.Hz::<1, 1>());
//! ```

use core::fmt;

use fugit::HertzU32;

use crate::{gpio::af, gpio::DynAlternate, pinout::Peripheral, typelevel::Sealed};

mod pins;
pub use pins::*;

/// Marker for the `SPI1` peripheral, clocked from APB2.
#[derive(Debug)]
pub struct SPI1(());
impl Sealed for SPI1 {}
impl Peripheral for SPI1 {
    const NAME: &'static str = "SPI1";
    const ALTERNATE: DynAlternate = af::GPIO_AF5_SPI1;
}

/// Marker for the `SPI2` peripheral, clocked from APB1.
#[derive(Debug)]
pub struct SPI2(());
impl Sealed for SPI2 {}
impl Peripheral for SPI2 {
    const NAME: &'static str = "SPI2";
    const ALTERNATE: DynAlternate = af::GPIO_AF5_SPI2;
}

/// Baud rate selection error
#[non_exhaustive]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Zero was requested as bus frequency.
    ZeroFrequency,
    /// Even the largest divider leaves the bus faster than requested.
    TargetTooLow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroFrequency => f.write_str("requested SPI frequency is zero"),
            Error::TargetTooLow => f.write_str("requested SPI frequency is below pclk / 256"),
        }
    }
}

impl core::error::Error for Error {}

/// SPI clock divider, `BR[2:0]`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum BaudRatePrescaler {
    /// `fPCLK / 2`
    Div2 = 0b000,
    /// `fPCLK / 4`
    Div4 = 0b001,
    /// `fPCLK / 8`
    Div8 = 0b010,
    /// `fPCLK / 16`
    Div16 = 0b011,
    /// `fPCLK / 32`
    Div32 = 0b100,
    /// `fPCLK / 64`
    Div64 = 0b101,
    /// `fPCLK / 128`
    Div128 = 0b110,
    /// `fPCLK / 256`
    Div256 = 0b111,
}

impl BaudRatePrescaler {
    /// Every divider, fastest first.
    pub const ALL: [BaudRatePrescaler; 8] = [
        BaudRatePrescaler::Div2,
        BaudRatePrescaler::Div4,
        BaudRatePrescaler::Div8,
        BaudRatePrescaler::Div16,
        BaudRatePrescaler::Div32,
        BaudRatePrescaler::Div64,
        BaudRatePrescaler::Div128,
        BaudRatePrescaler::Div256,
    ];

    /// `BR[2:0]` field value.
    #[inline]
    pub const fn br_bits(self) -> u8 {
        self as u8
    }

    /// Division factor, 2 to 256.
    #[inline]
    pub const fn divisor(self) -> u32 {
        2 << self.br_bits()
    }

    /// Bus frequency obtained from kernel clock `pclk`.
    pub const fn output(self, pclk: HertzU32) -> HertzU32 {
        HertzU32::from_raw(pclk.raw() / self.divisor())
    }

    /// The smallest divider that brings `pclk` down to `target` or below.
    pub const fn for_target(pclk: HertzU32, target: HertzU32) -> Result<Self, Error> {
        if target.raw() == 0 {
            return Err(Error::ZeroFrequency);
        }
        let mut i = 0;
        while i < Self::ALL.len() {
            let br = Self::ALL[i];
            if br.output(pclk).raw() <= target.raw() {
                return Ok(br);
            }
            i += 1;
        }
        Err(Error::TargetTooLow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::RateExtU32;

    const PCLK: HertzU32 = HertzU32::from_raw(84_000_000);

    #[test]
    fn divisors() {
        assert_eq!(BaudRatePrescaler::Div2.divisor(), 2);
        assert_eq!(BaudRatePrescaler::Div32.divisor(), 32);
        assert_eq!(BaudRatePrescaler::Div256.divisor(), 256);
        assert_eq!(BaudRatePrescaler::Div256.br_bits(), 0b111);
    }

    #[test]
    fn fastest_divider() {
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 42.MHz()),
            Ok(BaudRatePrescaler::Div2)
        );
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 100.MHz()),
            Ok(BaudRatePrescaler::Div2)
        );
    }

    #[test]
    fn never_exceeds_target() {
        // 84 MHz / 4 = 21 MHz is just above 20 MHz
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 20.MHz()),
            Ok(BaudRatePrescaler::Div8)
        );
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 21.MHz()),
            Ok(BaudRatePrescaler::Div4)
        );
        for target in [4u32, 7, 12, 19, 33, 50] {
            let target = (target * 100_000).Hz();
            let br = BaudRatePrescaler::for_target(PCLK, target).unwrap();
            assert!(br.output(PCLK) <= target);
        }
    }

    #[test]
    fn slowest_divider() {
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 328_125.Hz()),
            Ok(BaudRatePrescaler::Div256)
        );
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 328_124.Hz()),
            Err(Error::TargetTooLow)
        );
        assert_eq!(
            BaudRatePrescaler::for_target(PCLK, 0.Hz()),
            Err(Error::ZeroFrequency)
        );
    }

    #[test]
    fn markers() {
        assert_eq!(SPI1::NAME, "SPI1");
        assert_eq!(SPI2::ALTERNATE.num, 5);
    }
}
