//! GPIO register values derived from pin configurations.
//!
//! Each STM32F4 GPIO port is configured through six registers. Every pin owns
//! one field in each of them:
//!
//! | Register  | Field width | Pins      |
//! |-----------|-------------|-----------|
//! | `MODER`   | 2 bits      | 0 to 15   |
//! | `OTYPER`  | 1 bit       | 0 to 15   |
//! | `OSPEEDR` | 2 bits      | 0 to 15   |
//! | `PUPDR`   | 2 bits      | 0 to 15   |
//! | `AFRL`    | 4 bits      | 0 to 7    |
//! | `AFRH`    | 4 bits      | 8 to 15   |
//!
//! A [`PortPatch`] holds, per register, the bits a set of pins owns and the
//! value they must take. Applying it is a read-modify-write that leaves every
//! other pin of the port untouched.

use super::{DynPortId, PinConfig};

/// The bits of one register owned by a set of pins, and their value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FieldPatch {
    /// Bits owned by the pins.
    pub mask: u32,
    /// Value of the owned bits. Never has bits outside `mask`.
    pub value: u32,
}

impl FieldPatch {
    /// Patch that owns no bit.
    pub const EMPTY: FieldPatch = FieldPatch { mask: 0, value: 0 };

    /// Field number `index` of `width` bits set to `value`.
    ///
    /// # Panics
    ///
    /// If the field does not fit in a 32 bit register.
    pub const fn field(width: u32, index: u32, value: u32) -> Self {
        assert!(
            width > 0 && width < 32 && index < 32 / width,
            "register field out of range"
        );
        let ones = (1u32 << width) - 1;
        let shift = width * index;
        FieldPatch {
            mask: ones << shift,
            value: (value & ones) << shift,
        }
    }

    /// Union of two patches. On overlapping bits `other` wins.
    pub const fn merge(self, other: FieldPatch) -> Self {
        FieldPatch {
            mask: self.mask | other.mask,
            value: (self.value & !other.mask) | other.value,
        }
    }

    /// Register value after the patch is written over `current`.
    #[inline]
    pub const fn apply(self, current: u32) -> u32 {
        (current & !self.mask) | self.value
    }
}

/// Register values for the pins of one port.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortPatch {
    /// Port the patch belongs to.
    pub port: DynPortId,
    /// `GPIOx_MODER`
    pub moder: FieldPatch,
    /// `GPIOx_OTYPER`
    pub otyper: FieldPatch,
    /// `GPIOx_OSPEEDR`
    pub ospeedr: FieldPatch,
    /// `GPIOx_PUPDR`
    pub pupdr: FieldPatch,
    /// `GPIOx_AFRL`
    pub afrl: FieldPatch,
    /// `GPIOx_AFRH`
    pub afrh: FieldPatch,
}

impl PortPatch {
    /// Patch that configures nothing on `port`.
    pub const fn empty(port: DynPortId) -> Self {
        PortPatch {
            port,
            moder: FieldPatch::EMPTY,
            otyper: FieldPatch::EMPTY,
            ospeedr: FieldPatch::EMPTY,
            pupdr: FieldPatch::EMPTY,
            afrl: FieldPatch::EMPTY,
            afrh: FieldPatch::EMPTY,
        }
    }

    /// Adds `config` to the patch. Pins of other ports are ignored.
    pub const fn with(self, config: &PinConfig) -> Self {
        if config.pin.port as u8 != self.port as u8 {
            return self;
        }
        let n = config.pin.num as u32;
        let mut patch = self;
        patch.moder = patch.moder.merge(FieldPatch::field(2, n, config.mode.moder()));
        patch.otyper = patch.otyper.merge(FieldPatch::field(1, n, config.mode.otyper()));
        patch.ospeedr = patch.ospeedr.merge(FieldPatch::field(2, n, config.speed.ospeedr()));
        patch.pupdr = patch.pupdr.merge(FieldPatch::field(2, n, config.pull.pupdr()));
        if let Some(af) = config.alternate {
            if n < 8 {
                patch.afrl = patch.afrl.merge(FieldPatch::field(4, n, af.afr()));
            } else {
                patch.afrh = patch.afrh.merge(FieldPatch::field(4, n - 8, af.afr()));
            }
        }
        patch
    }

    /// Patch for every pin of `configs` that lives on `port`.
    pub const fn for_port(port: DynPortId, configs: &[PinConfig]) -> Self {
        let mut patch = PortPatch::empty(port);
        let mut i = 0;
        while i < configs.len() {
            patch = patch.with(&configs[i]);
            i += 1;
        }
        patch
    }

    /// Whether the patch configures at least one pin.
    pub const fn is_empty(&self) -> bool {
        self.moder.mask == 0
    }

    /// Registers of the port after the patch is written over `current`.
    pub const fn apply(&self, current: PortRegisters) -> PortRegisters {
        PortRegisters {
            moder: self.moder.apply(current.moder),
            otyper: self.otyper.apply(current.otyper),
            ospeedr: self.ospeedr.apply(current.ospeedr),
            pupdr: self.pupdr.apply(current.pupdr),
            afrl: self.afrl.apply(current.afrl),
            afrh: self.afrh.apply(current.afrh),
        }
    }
}

/// Snapshot of the six configuration registers of a port.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PortRegisters {
    /// `GPIOx_MODER`
    pub moder: u32,
    /// `GPIOx_OTYPER`
    pub otyper: u32,
    /// `GPIOx_OSPEEDR`
    pub ospeedr: u32,
    /// `GPIOx_PUPDR`
    pub pupdr: u32,
    /// `GPIOx_AFRL`
    pub afrl: u32,
    /// `GPIOx_AFRH`
    pub afrh: u32,
}

impl PortRegisters {
    /// Register values after reset (RM0368 section 8.4).
    ///
    /// Ports A and B come out of reset with the debug port pins (`PA13`,
    /// `PA14`, `PA15`, `PB3`, `PB4`) already in their JTAG/SWD alternate
    /// function.
    pub const fn reset(port: DynPortId) -> Self {
        match port {
            DynPortId::A => PortRegisters {
                moder: 0xA800_0000,
                otyper: 0,
                ospeedr: 0x0C00_0000,
                pupdr: 0x6400_0000,
                afrl: 0,
                afrh: 0,
            },
            DynPortId::B => PortRegisters {
                moder: 0x0000_0280,
                otyper: 0,
                ospeedr: 0x0000_00C0,
                pupdr: 0x0000_0100,
                afrl: 0,
                afrh: 0,
            },
            _ => PortRegisters {
                moder: 0,
                otyper: 0,
                ospeedr: 0,
                pupdr: 0,
                afrl: 0,
                afrh: 0,
            },
        }
    }
}

/// `RCC_AHB1ENR` bits that clock every port used by `configs`.
pub const fn ahb1enr_mask(configs: &[PinConfig]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < configs.len() {
        mask |= configs[i].pin.port.rcc_enable_mask();
        i += 1;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{af, DynMode, DynPullType, DynSpeed, PinId, PA5, PB9};

    const SCK: PinConfig = PinConfig {
        pin: <PA5 as PinId>::DYN,
        mode: DynMode::AlternatePushPull,
        pull: DynPullType::None,
        speed: DynSpeed::VeryHigh,
        alternate: Some(af::GPIO_AF5_SPI1),
    };

    const SDA: PinConfig = PinConfig {
        pin: <PB9 as PinId>::DYN,
        mode: DynMode::AlternateOpenDrain,
        pull: DynPullType::Up,
        speed: DynSpeed::Low,
        alternate: Some(af::GPIO_AF4_I2C1),
    };

    #[test]
    fn field_layout() {
        let f = FieldPatch::field(2, 5, 0b10);
        assert_eq!(f.mask, 0b11 << 10);
        assert_eq!(f.value, 0b10 << 10);
        // value is truncated to the field width
        assert_eq!(FieldPatch::field(1, 3, 0b11).value, 1 << 3);
    }

    #[test]
    fn widest_fields_fit() {
        assert_eq!(FieldPatch::field(4, 7, 0xF).mask, 0xF000_0000);
        assert_eq!(FieldPatch::field(2, 15, 0b11).mask, 0xC000_0000);
    }

    #[test]
    #[should_panic(expected = "register field out of range")]
    fn field_past_register_end() {
        FieldPatch::field(4, 8, 0);
    }

    #[test]
    #[should_panic(expected = "register field out of range")]
    fn field_full_width() {
        FieldPatch::field(32, 0, 0);
    }

    #[test]
    fn merge_prefers_later_patch() {
        let a = FieldPatch::field(4, 0, 0xA);
        let b = FieldPatch::field(4, 0, 0x5);
        assert_eq!(a.merge(b), b);
        let c = FieldPatch::field(4, 1, 0x3);
        assert_eq!(a.merge(c).value, 0x3A);
    }

    #[test]
    fn apply_keeps_other_bits() {
        let f = FieldPatch::field(2, 1, 0b01);
        assert_eq!(f.apply(0xFFFF_FFFF), 0xFFFF_FFF7);
        assert_eq!(f.apply(0), 0b0100);
    }

    #[test]
    fn low_pin_uses_afrl() {
        let p = PortPatch::for_port(DynPortId::A, &[SCK]);
        assert_eq!(p.moder, FieldPatch::field(2, 5, 0b10));
        assert_eq!(p.otyper, FieldPatch::field(1, 5, 0));
        assert_eq!(p.ospeedr, FieldPatch::field(2, 5, 0b11));
        assert_eq!(p.pupdr, FieldPatch::field(2, 5, 0b00));
        assert_eq!(p.afrl, FieldPatch::field(4, 5, 5));
        assert_eq!(p.afrh, FieldPatch::EMPTY);
    }

    #[test]
    fn high_pin_uses_afrh() {
        let p = PortPatch::for_port(DynPortId::B, &[SDA]);
        assert_eq!(p.afrl, FieldPatch::EMPTY);
        assert_eq!(p.afrh, FieldPatch::field(4, 1, 4));
        assert_eq!(p.otyper.value, 1 << 9);
    }

    #[test]
    fn other_ports_are_ignored() {
        let p = PortPatch::for_port(DynPortId::C, &[SCK, SDA]);
        assert!(p.is_empty());
        assert_eq!(p, PortPatch::empty(DynPortId::C));
    }

    #[test]
    fn clock_enable_mask() {
        assert_eq!(ahb1enr_mask(&[SCK]), 0b01);
        assert_eq!(ahb1enr_mask(&[SCK, SDA]), 0b11);
        assert_eq!(ahb1enr_mask(&[]), 0);
    }
}
