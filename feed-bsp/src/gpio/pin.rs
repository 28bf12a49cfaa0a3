//! Pin identities.
//!
//! The STM32F401 exposes GPIO ports A to E and H, each with up to 16 pins. A pin
//! is named after its port letter and number: `PB6` is pin 6 of port B.

use core::fmt;
use core::str::FromStr;

use crate::typelevel::Sealed;

/// Value-level `enum` for the pin's port.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DynPortId {
    /// `GPIOA`
    A = 0,
    /// `GPIOB`
    B = 1,
    /// `GPIOC`
    C = 2,
    /// `GPIOD`
    D = 3,
    /// `GPIOE`
    E = 4,
    /// `GPIOH`
    H = 7,
}

impl DynPortId {
    /// Every port of the device, in register order.
    pub const ALL: [DynPortId; 6] = [
        DynPortId::A,
        DynPortId::B,
        DynPortId::C,
        DynPortId::D,
        DynPortId::E,
        DynPortId::H,
    ];

    /// Position of the port in the GPIO register space.
    ///
    /// Also the bit of the port's clock enable in `RCC_AHB1ENR`.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Port letter, `'A'` for `GPIOA`.
    pub const fn letter(self) -> char {
        match self {
            DynPortId::A => 'A',
            DynPortId::B => 'B',
            DynPortId::C => 'C',
            DynPortId::D => 'D',
            DynPortId::E => 'E',
            DynPortId::H => 'H',
        }
    }

    /// Port from its letter, either case.
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(DynPortId::A),
            'B' => Some(DynPortId::B),
            'C' => Some(DynPortId::C),
            'D' => Some(DynPortId::D),
            'E' => Some(DynPortId::E),
            'H' => Some(DynPortId::H),
            _ => None,
        }
    }

    /// Name of the port's register block in the vendor HAL (`GPIOB`).
    pub const fn hal_name(self) -> &'static str {
        match self {
            DynPortId::A => "GPIOA",
            DynPortId::B => "GPIOB",
            DynPortId::C => "GPIOC",
            DynPortId::D => "GPIOD",
            DynPortId::E => "GPIOE",
            DynPortId::H => "GPIOH",
        }
    }

    /// Clock enable bit of this port in `RCC_AHB1ENR`.
    #[inline]
    pub const fn rcc_enable_mask(self) -> u32 {
        1 << self.index()
    }
}

impl fmt::Display for DynPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hal_name())
    }
}

/// Type-level `enum` for the pin Id (port + pin number).
pub trait PinId: Sealed {
    /// This pin as a `DynPinId`.
    const DYN: DynPinId;
}

/// Value-level representation for the pin (port + number).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DynPinId {
    /// Pin port.
    pub port: DynPortId,
    /// Pin number within the port, `0..=15`.
    pub num: u8,
}

impl DynPinId {
    /// Highest pin number of a port.
    pub const MAX_NUM: u8 = 15;

    /// Pin `num` of `port`.
    ///
    /// Panics (at compile time when used in a `const`) if `num` is above 15.
    pub const fn new(port: DynPortId, num: u8) -> Self {
        assert!(num <= Self::MAX_NUM, "GPIO pin number out of range");
        Self { port, num }
    }

    /// Bit of this pin in the port's 16-bit registers (`GPIO_PIN_x`).
    #[inline]
    pub const fn mask(self) -> u16 {
        1 << self.num
    }

    /// `const` equality.
    #[inline]
    pub const fn same_as(self, other: DynPinId) -> bool {
        self.port as u8 == other.port as u8 && self.num == other.num
    }
}

impl fmt::Display for DynPinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.num)
    }
}

/// Error returned when a pin name such as `"PB6"` cannot be parsed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParsePinError {
    /// The input was empty.
    Empty,
    /// The input did not start with `P`.
    MissingPrefix,
    /// The port letter is not a port of this device.
    UnknownPort(char),
    /// The pin number is missing, not decimal, or above 15.
    InvalidNumber,
}

impl fmt::Display for ParsePinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePinError::Empty => f.write_str("empty pin name"),
            ParsePinError::MissingPrefix => f.write_str("pin name must start with 'P'"),
            ParsePinError::UnknownPort(c) => write!(f, "no GPIO port '{}'", c),
            ParsePinError::InvalidNumber => f.write_str("pin number must be 0 to 15"),
        }
    }
}

impl core::error::Error for ParsePinError {}

impl FromStr for DynPinId {
    type Err = ParsePinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match chars.next() {
            None => return Err(ParsePinError::Empty),
            Some('P' | 'p') => {}
            Some(_) => return Err(ParsePinError::MissingPrefix),
        }
        let letter = chars.next().ok_or(ParsePinError::InvalidNumber)?;
        let port = DynPortId::from_letter(letter).ok_or(ParsePinError::UnknownPort(letter))?;

        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParsePinError::InvalidNumber);
        }
        let num: u8 = digits.parse().map_err(|_| ParsePinError::InvalidNumber)?;
        if num > DynPinId::MAX_NUM {
            return Err(ParsePinError::InvalidNumber);
        }
        Ok(DynPinId { port, num })
    }
}

macro_rules! pin_ids {
    ($port:ident: $($num:literal),*) => {
        paste::paste!{
            $(
                #[doc = "Type level variant for the pin `P" $port $num "`."]
                #[derive(Debug)]
                pub struct [<P $port $num>] (pub(crate) ());
                impl Sealed for [<P $port $num>] {}
                impl PinId for [<P $port $num>] {
                    const DYN: DynPinId = DynPinId::new(DynPortId::$port, $num);
                }
            )*
        }
    };
}

/// Pins of `GPIOA`.
pub mod porta {
    use super::{DynPinId, DynPortId, PinId, Sealed};
    pin_ids!(A: 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
}
/// Pins of `GPIOB`.
pub mod portb {
    use super::{DynPinId, DynPortId, PinId, Sealed};
    pin_ids!(B: 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14, 15);
}
/// Pins of `GPIOC`.
pub mod portc {
    use super::{DynPinId, DynPortId, PinId, Sealed};
    pin_ids!(C: 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
}
/// Pins of `GPIOD`. Only `PD2` is bonded out on the 64-pin package.
pub mod portd {
    use super::{DynPinId, DynPortId, PinId, Sealed};
    pin_ids!(D: 2);
}
/// Pins of `GPIOH`.
pub mod porth {
    use super::{DynPinId, DynPortId, PinId, Sealed};
    pin_ids!(H: 0, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pin_names() {
        assert_eq!("PB6".parse::<DynPinId>(), Ok(DynPinId::new(DynPortId::B, 6)));
        assert_eq!("pa15".parse::<DynPinId>(), Ok(DynPinId::new(DynPortId::A, 15)));
        assert_eq!(" PH1 ".parse::<DynPinId>(), Ok(DynPinId::new(DynPortId::H, 1)));
    }

    #[test]
    fn reject_bad_pin_names() {
        assert_eq!("".parse::<DynPinId>(), Err(ParsePinError::Empty));
        assert_eq!("B6".parse::<DynPinId>(), Err(ParsePinError::MissingPrefix));
        assert_eq!("PF3".parse::<DynPinId>(), Err(ParsePinError::UnknownPort('F')));
        assert_eq!("PA16".parse::<DynPinId>(), Err(ParsePinError::InvalidNumber));
        assert_eq!("PA".parse::<DynPinId>(), Err(ParsePinError::InvalidNumber));
        assert_eq!("PA+1".parse::<DynPinId>(), Err(ParsePinError::InvalidNumber));
        assert_eq!("P".parse::<DynPinId>(), Err(ParsePinError::InvalidNumber));
    }

    #[test]
    fn pin_masks() {
        assert_eq!(<porta::PA5 as PinId>::DYN.mask(), 0x0020);
        assert_eq!(<portb::PB9 as PinId>::DYN.mask(), 0x0200);
        assert_eq!(DynPinId::new(DynPortId::C, 15).mask(), 0x8000);
    }

    #[test]
    fn port_clock_bits() {
        assert_eq!(DynPortId::A.rcc_enable_mask(), 1 << 0);
        assert_eq!(DynPortId::B.rcc_enable_mask(), 1 << 1);
        assert_eq!(DynPortId::H.rcc_enable_mask(), 1 << 7);
    }

    #[test]
    fn const_equality() {
        let pb6 = <portb::PB6 as PinId>::DYN;
        assert!(pb6.same_as(DynPinId::new(DynPortId::B, 6)));
        assert!(!pb6.same_as(DynPinId::new(DynPortId::A, 6)));
        assert!(!pb6.same_as(DynPinId::new(DynPortId::B, 7)));
    }
}
