//! Inter-Integrated Circuit (I2C) bus
//!
//! Type-level marker for `I2C1` and the pins its signals can use. Both lines
//! are open-drain and need a pull-up; the board relies on the internal ones.

use crate::{
    gpio::{af, DynAlternate, PinId, PB6, PB7, PB8, PB9},
    pinout::{Peripheral, ValidPin},
    typelevel::Sealed,
};

/// Marker for the `I2C1` peripheral.
#[derive(Debug)]
pub struct I2C1(());
impl Sealed for I2C1 {}
impl Peripheral for I2C1 {
    const NAME: &'static str = "I2C1";
    const ALTERNATE: DynAlternate = af::GPIO_AF4_I2C1;
}

/// Indicates a valid SCL pin for I2C1
pub trait ValidPinIdScl<I2C: Peripheral>: PinId {}

/// Indicates a valid SDA pin for I2C1
pub trait ValidPinIdSda<I2C: Peripheral>: PinId {}

macro_rules! impl_valid_i2c {
    ($($i2c:ident: {
        scl: [$($scl:ident),*],
        sda: [$($sda:ident),*],
    }),*) => {
        $(
            $(impl ValidPinIdScl<$i2c> for $scl {})*
            $(impl ValidPinIdSda<$i2c> for $sda {})*
        )*

        /// Every pin an I2C signal can be routed to.
        pub const VALID_PINS: &[ValidPin] = &[
            $(
                $(ValidPin::new::<$i2c, $scl>("SCL"),)*
                $(ValidPin::new::<$i2c, $sda>("SDA"),)*
            )*
        ];
    };
}

impl_valid_i2c!(
    I2C1: {
        scl: [PB6, PB8],
        sda: [PB7, PB9],
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2c1_pins() {
        let scl: [_; 2] = [PB6::DYN, PB8::DYN];
        let sda: [_; 2] = [PB7::DYN, PB9::DYN];
        for v in VALID_PINS {
            assert_eq!(v.peripheral, "I2C1");
            assert_eq!(v.alternate, af::GPIO_AF4_I2C1);
            match v.signal {
                "SCL" => assert!(scl.contains(&v.pin)),
                "SDA" => assert!(sda.contains(&v.pin)),
                other => panic!("unexpected signal {}", other),
            }
        }
        assert_eq!(VALID_PINS.len(), 4);
    }
}
