//! Universal Serial Bus (USB)
//!
//! The STM32F401 has a single USB core, OTG FS. The board declares two USB
//! entries: the device middleware (`USB_DEVICE`), whose virtual mode is the
//! class the board enumerates as, and the core itself (`USB_OTG_FS`), whose
//! virtual mode is the role it plays on the bus. A device class only works on
//! a core that can act as a device:
//!
//! ```
//! use feed_bsp::usb::{modes_compatible, VirtualMode};
//!
//! assert!(modes_compatible(VirtualMode::CdcFs, VirtualMode::DeviceOnly));
//! assert!(!modes_compatible(VirtualMode::CdcFs, VirtualMode::HostOnly));
//! ```

use core::fmt;

use crate::{
    gpio::{af, DynAlternate, PinId, PA10, PA11, PA12, PA8},
    pinout::{Peripheral, PeripheralConfig, ValidPin},
    typelevel::Sealed,
};

/// Largest packet of a full speed bulk or control endpoint.
pub const FS_MAX_PACKET_SIZE: u16 = 64;

/// Marker for the `USB_OTG_FS` core.
#[allow(non_camel_case_types)]
#[derive(Debug)]
pub struct USB_OTG_FS(());
impl Sealed for USB_OTG_FS {}
impl Peripheral for USB_OTG_FS {
    const NAME: &'static str = "USB_OTG_FS";
    const ALTERNATE: DynAlternate = af::GPIO_AF10_OTG_FS;
}

/// Indicates a valid DM pin for USB_OTG_FS
pub trait ValidPinIdDm<USB: Peripheral>: PinId {}
/// Indicates a valid DP pin for USB_OTG_FS
pub trait ValidPinIdDp<USB: Peripheral>: PinId {}
/// Indicates a valid ID pin for USB_OTG_FS
pub trait ValidPinIdId<USB: Peripheral>: PinId {}
/// Indicates a valid SOF pin for USB_OTG_FS
pub trait ValidPinIdSof<USB: Peripheral>: PinId {}

impl ValidPinIdDm<USB_OTG_FS> for PA11 {}
impl ValidPinIdDp<USB_OTG_FS> for PA12 {}
impl ValidPinIdId<USB_OTG_FS> for PA10 {}
impl ValidPinIdSof<USB_OTG_FS> for PA8 {}

/// Every pin a USB_OTG_FS signal can be routed to.
///
/// The data lines have no alternative: OTG FS always uses `PA11` and `PA12`.
pub const VALID_PINS: &[ValidPin] = &[
    ValidPin::new::<USB_OTG_FS, PA11>("DM"),
    ValidPin::new::<USB_OTG_FS, PA12>("DP"),
    ValidPin::new::<USB_OTG_FS, PA10>("ID"),
    ValidPin::new::<USB_OTG_FS, PA8>("SOF"),
];

/// Virtual mode of a USB peripheral.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VirtualMode {
    /// Audio class device, `Audio_FS`.
    AudioFs,
    /// Communication device class (virtual serial port), `Cdc_FS`.
    CdcFs,
    /// HID device with a custom report descriptor, `CustomHid_FS`.
    CustomHidFs,
    /// Device firmware upgrade, `Dfu_FS`.
    DfuFs,
    /// Human interface device, `Hid_FS`.
    HidFs,
    /// Mass storage, `Msc_FS`.
    MscFs,
    /// Core acts as a device only, `Device_Only`.
    DeviceOnly,
    /// Core acts as a host only, `Host_Only`.
    HostOnly,
    /// Core switches between host and device, `Dual_Role`.
    DualRole,
}

impl VirtualMode {
    /// Name of the mode in the configurator.
    pub const fn mx_name(self) -> &'static str {
        match self {
            VirtualMode::AudioFs => "Audio_FS",
            VirtualMode::CdcFs => "Cdc_FS",
            VirtualMode::CustomHidFs => "CustomHid_FS",
            VirtualMode::DfuFs => "Dfu_FS",
            VirtualMode::HidFs => "Hid_FS",
            VirtualMode::MscFs => "Msc_FS",
            VirtualMode::DeviceOnly => "Device_Only",
            VirtualMode::HostOnly => "Host_Only",
            VirtualMode::DualRole => "Dual_Role",
        }
    }

    /// `bInterfaceClass` of the class's first interface. `None` for core roles.
    pub const fn interface_class(self) -> Option<u8> {
        match self {
            VirtualMode::AudioFs => Some(0x01),
            VirtualMode::CdcFs => Some(0x02),
            VirtualMode::CustomHidFs | VirtualMode::HidFs => Some(0x03),
            VirtualMode::MscFs => Some(0x08),
            VirtualMode::DfuFs => Some(0xFE),
            VirtualMode::DeviceOnly | VirtualMode::HostOnly | VirtualMode::DualRole => None,
        }
    }

    /// Whether this is a device class of the middleware rather than a core role.
    #[inline]
    pub const fn is_device_class(self) -> bool {
        self.interface_class().is_some()
    }

    /// Whether a core in this role can run a device class.
    pub const fn supports_device(self) -> bool {
        matches!(self, VirtualMode::DeviceOnly | VirtualMode::DualRole)
    }
}

impl fmt::Display for VirtualMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mx_name())
    }
}

/// Whether device class `device` can run on a core in role `core`.
pub const fn modes_compatible(device: VirtualMode, core: VirtualMode) -> bool {
    device.is_device_class() && !core.is_device_class() && core.supports_device()
}

/// Whether every device class of the table has a device capable core.
///
/// Tables without a device class are always compatible. A board asserts on
/// it so that a class on a host-only core does not build:
///
/// ```compile_fail
/// use feed_bsp::{pinout::PeripheralConfig, usb::roles_compatible};
///
/// feed_bsp::mx_peripheral! {
///     USB_DEVICE { virtual_mode: Cdc_FS = CdcFs }
/// }
/// feed_bsp::mx_peripheral! {
///     USB_OTG_FS { virtual_mode: Host_Only = HostOnly }
/// }
///
/// const TABLE: &[PeripheralConfig] = &[usb_device::CONFIG, usb_otg_fs::CONFIG];
/// const _: () = assert!(roles_compatible(TABLE), "USB device class needs a device core");
/// ```
pub const fn roles_compatible(peripherals: &[PeripheralConfig]) -> bool {
    let mut i = 0;
    while i < peripherals.len() {
        if let Some(device) = peripherals[i].virtual_mode {
            if device.is_device_class() && !has_core_for(peripherals, device) {
                return false;
            }
        }
        i += 1;
    }
    true
}

const fn has_core_for(peripherals: &[PeripheralConfig], device: VirtualMode) -> bool {
    let mut i = 0;
    while i < peripherals.len() {
        if let Some(core) = peripherals[i].virtual_mode {
            if modes_compatible(device, core) {
                return true;
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn usb(name: &'static str, mode: VirtualMode) -> PeripheralConfig {
        PeripheralConfig {
            name,
            signals: &[],
            clock: None,
            virtual_mode: Some(mode),
        }
    }

    #[test]
    fn names() {
        assert_eq!(VirtualMode::CdcFs.mx_name(), "Cdc_FS");
        assert_eq!(VirtualMode::DeviceOnly.mx_name(), "Device_Only");
    }

    #[test]
    fn class_codes() {
        assert_eq!(VirtualMode::CdcFs.interface_class(), Some(0x02));
        assert_eq!(VirtualMode::MscFs.interface_class(), Some(0x08));
        assert_eq!(VirtualMode::DfuFs.interface_class(), Some(0xFE));
        assert_eq!(VirtualMode::HostOnly.interface_class(), None);
        assert!(!VirtualMode::DualRole.is_device_class());
    }

    #[test]
    fn compatibility() {
        assert!(modes_compatible(VirtualMode::CdcFs, VirtualMode::DualRole));
        assert!(!modes_compatible(VirtualMode::CdcFs, VirtualMode::HostOnly));
        assert!(!modes_compatible(VirtualMode::DeviceOnly, VirtualMode::DeviceOnly));
        assert!(!modes_compatible(VirtualMode::CdcFs, VirtualMode::HidFs));
    }

    #[test]
    fn table_roles() {
        let ok = [
            usb("USB_DEVICE", VirtualMode::CdcFs),
            usb("USB_OTG_FS", VirtualMode::DeviceOnly),
        ];
        assert!(roles_compatible(&ok));

        let host = [
            usb("USB_DEVICE", VirtualMode::CdcFs),
            usb("USB_OTG_FS", VirtualMode::HostOnly),
        ];
        assert!(!roles_compatible(&host));

        let no_core = [usb("USB_DEVICE", VirtualMode::CdcFs)];
        assert!(!roles_compatible(&no_core));

        assert!(roles_compatible(&[usb("USB_OTG_FS", VirtualMode::HostOnly)]));
        assert!(roles_compatible(&[]));
    }

    #[test]
    fn data_lines() {
        let dm = VALID_PINS[0];
        assert_eq!((dm.signal, dm.pin), ("DM", PA11::DYN));
        assert_eq!(VALID_PINS[1].pin, PA12::DYN);
        assert!(VALID_PINS.iter().all(|v| v.alternate.num == 10));
    }
}
