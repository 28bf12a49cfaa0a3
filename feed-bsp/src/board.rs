//! The board's pinout
//!
//! One [`mx_peripheral!`](crate::mx_peripheral) per enabled peripheral. The
//! flat `MX_*` constants generated here are re-exported at the crate root.

use crate::gpio::{reg::PortPatch, DynPortId};
use crate::pinout::{find_conflict, PeripheralConfig, Pinout};
use crate::usb::roles_compatible;

/// Version of the configurator table format.
pub const MX_DEVICE_VERSION: u32 = 0x0100_0000;

crate::mx_peripheral! {
    /// `I2C1` on the header's open-drain pair.
    I2C1 in i2c {
        pins: {
            SCL: PB6 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
            SDA: PB9 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
        }
    }
}

crate::mx_peripheral! {
    /// `SPI1`, clocked from APB2.
    SPI1 in spi {
        clock: 84_000_000,
        pins: {
            MISO: PA6 { mode: AlternatePushPull, pull: None, speed: Low, af: GPIO_AF5_SPI1 },
            MOSI: PA7 { mode: AlternatePushPull, pull: None, speed: Low, af: GPIO_AF5_SPI1 },
            SCK: PA5 { mode: AlternatePushPull, pull: None, speed: VeryHigh, af: GPIO_AF5_SPI1 },
        }
    }
}

crate::mx_peripheral! {
    /// USB device middleware, enumerating as a virtual serial port.
    USB_DEVICE { virtual_mode: Cdc_FS = CdcFs }
}

crate::mx_peripheral! {
    /// The OTG FS core, device role only.
    USB_OTG_FS { virtual_mode: Device_Only = DeviceOnly }
}

/// Every enabled peripheral, in configurator order.
pub const PERIPHERALS: &[PeripheralConfig] = &[
    i2c1::CONFIG,
    spi1::CONFIG,
    usb_device::CONFIG,
    usb_otg_fs::CONFIG,
];

/// The board table.
pub const PINOUT: Pinout = Pinout::new(PERIPHERALS);

/// `GPIOA` register values for the board's pins.
pub const PORTA_PATCH: PortPatch = PINOUT.port_patch(DynPortId::A);

/// `GPIOB` register values for the board's pins.
pub const PORTB_PATCH: PortPatch = PINOUT.port_patch(DynPortId::B);

/// `RCC_AHB1ENR` bits of the ports the board uses.
pub const AHB1ENR_MASK: u32 = PINOUT.ahb1enr_mask();

const _: () = assert!(
    find_conflict(PERIPHERALS).is_none(),
    "two signals share a pin"
);
const _: () = assert!(
    roles_compatible(PERIPHERALS),
    "USB device class needs a device capable OTG core"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::reg::{FieldPatch, PortRegisters};

    #[test]
    fn board_validates() {
        assert_eq!(PINOUT.validate(), Ok(()));
    }

    #[test]
    fn port_a_registers() {
        let regs = PORTA_PATCH.apply(PortRegisters::reset(DynPortId::A));
        // PA5..PA7 in alternate mode, debug pins untouched
        assert_eq!(regs.moder, 0xA800_A800);
        assert_eq!(regs.otyper, 0);
        assert_eq!(regs.ospeedr, 0x0C00_0C00);
        assert_eq!(regs.afrl, 0x5550_0000);
        assert_eq!(regs.afrh, 0);
    }

    #[test]
    fn port_b_registers() {
        assert_eq!(
            PORTB_PATCH.moder,
            FieldPatch::field(2, 6, 0b10).merge(FieldPatch::field(2, 9, 0b10))
        );
        let regs = PORTB_PATCH.apply(PortRegisters::reset(DynPortId::B));
        assert_eq!(regs.moder, 0x0008_2280);
        assert_eq!(regs.otyper, 0x0240);
        assert_eq!(regs.pupdr, 0x0004_1100);
        assert_eq!(regs.afrl, 0x0400_0000);
        assert_eq!(regs.afrh, 0x0000_0040);
    }

    #[test]
    fn clocks() {
        assert_eq!(AHB1ENR_MASK, 0b11);
        assert_eq!(spi1::PERIPH_CLOCK.to_MHz(), 84);
        assert_eq!(PINOUT.peripheral("SPI1").and_then(|p| p.clock), Some(spi1::PERIPH_CLOCK));
        assert_eq!(PINOUT.peripheral("I2C1").and_then(|p| p.clock), None);
    }
}
