//! General Purpose Input and Output (GPIO)
//!
//! Value-level description of how a pin is configured: which pin
//! ([`DynPinId`]), in which [`DynMode`], with which [`DynPullType`] and
//! [`DynSpeed`], and routed to which [`DynAlternate`] function. A
//! [`PinConfig`] bundles all of them.
//!
//! ```
//! use feed_bsp::gpio::{af, DynMode, DynPullType, DynSpeed, PinConfig, PinId, PB6};
//!
//! const SCL: PinConfig = PinConfig {
//!     pin: PB6::DYN,
//!     mode: DynMode::AlternateOpenDrain,
//!     pull: DynPullType::Up,
//!     speed: DynSpeed::Low,
//!     alternate: Some(af::GPIO_AF4_I2C1),
//! };
//! assert!(SCL.is_consistent());
//! assert_eq!(SCL.gpio_pin(), 1 << 6);
//! ```

// Design Notes:
//
// - Type-level pin ids are only used to check the board table against the valid pin/peripheral
//   pairings at compile time. Everything else is value-level and usable from `const fn`s.

mod func;
mod pin;
mod pull;
pub mod reg;

pub use func::*;
pub use pin::{
    porta, portb, portc, portd, porth, DynPinId, DynPortId, ParsePinError, PinId,
};
pub use porta::*;
pub use portb::*;
pub use portc::*;
pub use portd::*;
pub use porth::*;
pub use pull::*;

/// The output speed (slew rate) of a pin, `OSPEEDR`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum DynSpeed {
    /// `GPIO_SPEED_FREQ_LOW`
    Low = 0b00,
    /// `GPIO_SPEED_FREQ_MEDIUM`
    Medium = 0b01,
    /// `GPIO_SPEED_FREQ_HIGH`
    High = 0b10,
    /// `GPIO_SPEED_FREQ_VERY_HIGH`
    VeryHigh = 0b11,
}

impl DynSpeed {
    /// Name of this speed in the vendor HAL.
    pub const fn hal_name(self) -> &'static str {
        match self {
            DynSpeed::Low => "GPIO_SPEED_FREQ_LOW",
            DynSpeed::Medium => "GPIO_SPEED_FREQ_MEDIUM",
            DynSpeed::High => "GPIO_SPEED_FREQ_HIGH",
            DynSpeed::VeryHigh => "GPIO_SPEED_FREQ_VERY_HIGH",
        }
    }

    /// Two-bit `OSPEEDR` field value.
    #[inline]
    pub const fn ospeedr(self) -> u32 {
        self as u32
    }
}

/// Complete configuration of one pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    /// The pin.
    pub pin: DynPinId,
    /// Direction and output driver.
    pub mode: DynMode,
    /// Pull resistor.
    pub pull: DynPullType,
    /// Output speed.
    pub speed: DynSpeed,
    /// Alternate function, present exactly when `mode` is an alternate mode.
    pub alternate: Option<DynAlternate>,
}

impl PinConfig {
    /// Port of the pin (`GPIOx`).
    #[inline]
    pub const fn port(&self) -> DynPortId {
        self.pin.port
    }

    /// Pin bit within its port (`GPIO_PIN_x`).
    #[inline]
    pub const fn gpio_pin(&self) -> u16 {
        self.pin.mask()
    }

    /// An alternate function is selected if and only if the mode hands the
    /// pin to a peripheral.
    pub const fn is_consistent(&self) -> bool {
        self.mode.is_alternate() == self.alternate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCK: PinConfig = PinConfig {
        pin: <PA5 as PinId>::DYN,
        mode: DynMode::AlternatePushPull,
        pull: DynPullType::None,
        speed: DynSpeed::VeryHigh,
        alternate: Some(af::GPIO_AF5_SPI1),
    };

    #[test]
    fn speed_encoding() {
        assert_eq!(DynSpeed::Low.ospeedr(), 0b00);
        assert_eq!(DynSpeed::VeryHigh.ospeedr(), 0b11);
    }

    #[test]
    fn config_accessors() {
        assert_eq!(SCK.port(), DynPortId::A);
        assert_eq!(SCK.gpio_pin(), 0x0020);
        assert!(SCK.is_consistent());
    }

    #[test]
    fn inconsistent_configs() {
        let no_af = PinConfig {
            alternate: None,
            ..SCK
        };
        assert!(!no_af.is_consistent());

        let af_on_output = PinConfig {
            mode: DynMode::OutputPushPull,
            ..SCK
        };
        assert!(!af_on_output.is_consistent());

        let plain_output = PinConfig {
            mode: DynMode::OutputPushPull,
            alternate: None,
            ..SCK
        };
        assert!(plain_output.is_consistent());
    }
}
