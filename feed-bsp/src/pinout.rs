//! Board pinout tables
//!
//! A board is described as a list of [`PeripheralConfig`]s, each holding the
//! [`Signal`]s it routes to pins, its clock and, for USB, its virtual mode.
//! Tables are normally declared with [`mx_peripheral!`](crate::mx_peripheral),
//! which also checks the table while the crate is being compiled:
//!
//! - every signal sits on a pin that can carry it;
//! - every signal uses its peripheral's alternate function;
//! - every pin's mode agrees with its alternate function.
//!
//! Checks that span the whole table (two signals on one pin, USB roles) are
//! available as `const fn`s ([`find_conflict`], [`crate::usb::roles_compatible`])
//! for the board to assert on, and all of them are re-run by [`validate`] for
//! tables assembled at runtime.

use core::fmt;

use fugit::HertzU32;

use crate::gpio::{reg::PortPatch, DynAlternate, DynPinId, DynPortId, PinConfig, PinId};
use crate::typelevel::Sealed;
use crate::usb::VirtualMode;

/// Type-level marker of a peripheral that owns pins.
pub trait Peripheral: Sealed {
    /// Name of the peripheral, as in the reference manual (`I2C1`).
    const NAME: &'static str;
    /// Alternate function that routes the peripheral's signals to its pins.
    const ALTERNATE: DynAlternate;
}

/// One pin a peripheral signal can be routed to.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidPin {
    /// Peripheral name (`SPI1`).
    pub peripheral: &'static str,
    /// Signal name (`SCK`).
    pub signal: &'static str,
    /// Pin able to carry the signal.
    pub pin: DynPinId,
    /// Alternate function selecting the signal on that pin.
    pub alternate: DynAlternate,
}

impl ValidPin {
    /// Entry for signal `signal` of peripheral `D` on pin `P`.
    pub const fn new<D: Peripheral, P: PinId>(signal: &'static str) -> Self {
        ValidPin {
            peripheral: D::NAME,
            signal,
            pin: P::DYN,
            alternate: D::ALTERNATE,
        }
    }
}

/// A peripheral signal and the pin configuration carrying it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signal {
    /// Signal name (`SCL`).
    pub name: &'static str,
    /// Pin configuration.
    pub config: PinConfig,
}

/// One peripheral's entry in a board table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Peripheral name (`I2C1`, `USB_DEVICE`).
    pub name: &'static str,
    /// Signals routed to pins. Empty for peripherals with fixed or no pins.
    pub signals: &'static [Signal],
    /// Kernel clock of the peripheral, when the board fixes it.
    pub clock: Option<HertzU32>,
    /// USB virtual mode, for the USB middleware and core.
    pub virtual_mode: Option<VirtualMode>,
}

impl PeripheralConfig {
    /// Configuration of the signal named `signal`.
    pub fn signal(&self, signal: &str) -> Option<&'static PinConfig> {
        self.signals
            .iter()
            .find(|s| s.name == signal)
            .map(|s| &s.config)
    }
}

/// Names a signal of a peripheral, displayed as `I2C1_SCL`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalName {
    /// Peripheral name.
    pub peripheral: &'static str,
    /// Signal name.
    pub signal: &'static str,
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.peripheral, self.signal)
    }
}

/// Two signals routed to the same pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conflict {
    /// The contested pin.
    pub pin: DynPinId,
    /// Signal declared first.
    pub first: SignalName,
    /// Signal declared second.
    pub second: SignalName,
}

/// Pinout error
#[non_exhaustive]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinoutError {
    /// Two signals claim the same pin.
    PinConflict(Conflict),
    /// Alternate mode without an alternate function, or the other way round.
    ModeMismatch(SignalName),
    /// The pin cannot carry the signal.
    InvalidPin {
        /// The signal.
        signal: SignalName,
        /// The pin it was routed to.
        pin: DynPinId,
    },
    /// The signal's alternate function does not select it on its pin.
    AlternateMismatch(SignalName),
    /// A USB device class is enabled while the OTG core cannot act as a device.
    UsbRoleMismatch,
}

impl fmt::Display for PinoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinoutError::PinConflict(c) => {
                write!(f, "{} and {} both use {}", c.first, c.second, c.pin)
            }
            PinoutError::ModeMismatch(s) => {
                write!(f, "{}: mode and alternate function disagree", s)
            }
            PinoutError::InvalidPin { signal, pin } => {
                write!(f, "{} cannot be routed to {}", signal, pin)
            }
            PinoutError::AlternateMismatch(s) => write!(f, "{}: wrong alternate function", s),
            PinoutError::UsbRoleMismatch => {
                f.write_str("USB device class enabled but the OTG core is not device capable")
            }
        }
    }
}

impl core::error::Error for PinoutError {}

/// Every known pin/signal pairing, across peripheral families.
static VALID_PINS: [&[ValidPin]; 3] = [
    crate::i2c::VALID_PINS,
    crate::spi::VALID_PINS,
    crate::usb::VALID_PINS,
];

/// `const` string equality.
#[doc(hidden)]
pub const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// First pair of signals routed to the same pin, in declaration order.
///
/// A board asserts on it to reject a shared pin at build time. `I2C1_SDA`
/// and `SPI2_NSS` both sit on `PB9` here:
///
/// ```compile_fail
/// use feed_bsp::pinout::{find_conflict, PeripheralConfig};
///
/// feed_bsp::mx_peripheral! {
///     I2C1 in i2c {
///         pins: {
///             SDA: PB9 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
///         }
///     }
/// }
/// feed_bsp::mx_peripheral! {
///     SPI2 in spi {
///         pins: {
///             NSS: PB9 { mode: AlternatePushPull, pull: None, speed: Low, af: GPIO_AF5_SPI2 },
///         }
///     }
/// }
///
/// const TABLE: &[PeripheralConfig] = &[i2c1::CONFIG, spi2::CONFIG];
/// const _: () = assert!(find_conflict(TABLE).is_none(), "two signals share a pin");
/// ```
pub const fn find_conflict(peripherals: &[PeripheralConfig]) -> Option<Conflict> {
    let mut p = 0;
    while p < peripherals.len() {
        let mut s = 0;
        while s < peripherals[p].signals.len() {
            let first = &peripherals[p].signals[s];

            // scan everything declared after `first`
            let mut q = p;
            let mut t = s + 1;
            while q < peripherals.len() {
                while t < peripherals[q].signals.len() {
                    let second = &peripherals[q].signals[t];
                    if first.config.pin.same_as(second.config.pin) {
                        return Some(Conflict {
                            pin: first.config.pin,
                            first: SignalName {
                                peripheral: peripherals[p].name,
                                signal: first.name,
                            },
                            second: SignalName {
                                peripheral: peripherals[q].name,
                                signal: second.name,
                            },
                        });
                    }
                    t += 1;
                }
                q += 1;
                t = 0;
            }
            s += 1;
        }
        p += 1;
    }
    None
}

/// Checks a table assembled at runtime.
///
/// Reports the first problem found, checking in order: each signal's mode,
/// pin and alternate function, then pin conflicts, then USB roles.
/// Peripherals without a known pin table (anything but I2C, SPI and OTG FS)
/// skip the pin and alternate function checks.
pub fn validate(peripherals: &[PeripheralConfig]) -> Result<(), PinoutError> {
    let result = check(peripherals);
    #[cfg(feature = "defmt")]
    if let Err(e) = result {
        defmt::warn!("pinout rejected: {}", e);
    }
    result
}

fn check(peripherals: &[PeripheralConfig]) -> Result<(), PinoutError> {
    for periph in peripherals {
        for signal in periph.signals {
            let name = SignalName {
                peripheral: periph.name,
                signal: signal.name,
            };
            if !signal.config.is_consistent() {
                return Err(PinoutError::ModeMismatch(name));
            }
            check_routing(name, &signal.config)?;
        }
    }
    if let Some(conflict) = find_conflict(peripherals) {
        return Err(PinoutError::PinConflict(conflict));
    }
    if !crate::usb::roles_compatible(peripherals) {
        return Err(PinoutError::UsbRoleMismatch);
    }
    Ok(())
}

fn check_routing(name: SignalName, config: &PinConfig) -> Result<(), PinoutError> {
    let mut known = VALID_PINS
        .iter()
        .flat_map(|table| table.iter())
        .filter(|v| v.peripheral == name.peripheral)
        .peekable();
    if known.peek().is_none() {
        return Ok(());
    }
    let entry = known
        .find(|v| v.signal == name.signal && v.pin == config.pin)
        .ok_or(PinoutError::InvalidPin {
            signal: name,
            pin: config.pin,
        })?;
    if config.alternate != Some(entry.alternate) {
        return Err(PinoutError::AlternateMismatch(name));
    }
    Ok(())
}

/// A complete board table.
#[derive(Clone, Copy, Debug)]
pub struct Pinout {
    peripherals: &'static [PeripheralConfig],
}

impl Pinout {
    /// Wraps a board table.
    pub const fn new(peripherals: &'static [PeripheralConfig]) -> Self {
        Self { peripherals }
    }

    /// The peripherals of the table, in declaration order.
    pub const fn peripherals(&self) -> &'static [PeripheralConfig] {
        self.peripherals
    }

    /// Peripheral named `name`.
    pub fn peripheral(&self, name: &str) -> Option<&'static PeripheralConfig> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    /// Configuration of `signal` of `peripheral`.
    pub fn signal(&self, peripheral: &str, signal: &str) -> Option<&'static PinConfig> {
        self.peripheral(peripheral)?.signal(signal)
    }

    /// Every routed signal with its peripheral.
    pub fn signals(&self) -> impl Iterator<Item = (&'static PeripheralConfig, &'static Signal)> {
        let peripherals = self.peripherals;
        peripherals
            .iter()
            .flat_map(|p| p.signals.iter().map(move |s| (p, s)))
    }

    /// Signal routed to `pin`, if any.
    pub fn signal_on(&self, pin: DynPinId) -> Option<SignalName> {
        self.signals()
            .find(|(_, s)| s.config.pin == pin)
            .map(|(p, s)| SignalName {
                peripheral: p.name,
                signal: s.name,
            })
    }

    /// Register values for every pin of the table on `port`.
    pub const fn port_patch(&self, port: DynPortId) -> PortPatch {
        let mut patch = PortPatch::empty(port);
        let mut p = 0;
        while p < self.peripherals.len() {
            let signals = self.peripherals[p].signals;
            let mut s = 0;
            while s < signals.len() {
                patch = patch.with(&signals[s].config);
                s += 1;
            }
            p += 1;
        }
        patch
    }

    /// `RCC_AHB1ENR` bits clocking every port the table uses.
    pub const fn ahb1enr_mask(&self) -> u32 {
        let mut mask = 0;
        let mut p = 0;
        while p < self.peripherals.len() {
            let signals = self.peripherals[p].signals;
            let mut s = 0;
            while s < signals.len() {
                mask |= signals[s].config.port().rcc_enable_mask();
                s += 1;
            }
            p += 1;
        }
        mask
    }

    /// See [`validate`].
    pub fn validate(&self) -> Result<(), PinoutError> {
        validate(self.peripherals)
    }
}

//==============================================================================
//  mx_peripheral helper macro
//==============================================================================

/// Declares one peripheral of a board table.
///
/// Two shapes are accepted. A peripheral routed to pins names the module
/// holding its type-level marker and pin traits (`i2c`, `spi`), an optional
/// kernel clock in hertz and its signals:
///
/// ```
/// feed_bsp::mx_peripheral! {
///     /// Sensor bus.
///     I2C1 in i2c {
///         pins: {
///             SCL: PB8 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
///             SDA: PB7 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
///         }
///     }
/// }
///
/// assert_eq!(i2c1::SCL.pin.to_string(), "PB8");
/// assert_eq!(MX_I2C1_SDA_GPIO_Pin, 1 << 7);
/// ```
///
/// A USB peripheral names its virtual mode twice, as the configurator spells
/// it and as the [`VirtualMode`](crate::usb::VirtualMode) variant:
///
/// ```
/// feed_bsp::mx_peripheral! {
///     USB_DEVICE { virtual_mode: Cdc_FS = CdcFs }
/// }
///
/// assert_eq!(MX_USB_DEVICE_Cdc_FS, 1);
/// ```
///
/// Each invocation expands to:
/// - a module named after the peripheral in lower case (`i2c1`) with one
///   [`PinConfig`](crate::gpio::PinConfig) per signal, `SIGNALS`, `CONFIG`
///   and, when given, `PERIPH_CLOCK` or `VIRTUAL_MODE`;
/// - the flat configurator constants: `MX_I2C1`, `MX_I2C1_SCL_Pin`,
///   `MX_I2C1_SCL_GPIO_Pin`, `MX_I2C1_SCL_GPIOx`, `MX_I2C1_SCL_GPIO_Mode`,
///   `MX_I2C1_SCL_GPIO_PuPd`, `MX_I2C1_SCL_GPIO_Speed`, `MX_I2C1_SCL_GPIO_AF`,
///   `MX_SPI1_PERIPH_CLOCK_FREQ`, `MX_USB_DEVICE_VM`, `MX_USB_DEVICE_Cdc_FS`;
/// - compile-time checks that each pin can carry its signal, uses the
///   peripheral's alternate function and has a matching mode.
///
/// Routing a signal to the wrong pin does not build:
///
/// ```compile_fail
/// feed_bsp::mx_peripheral! {
///     I2C1 in i2c {
///         pins: {
///             SCL: PA0 { mode: AlternateOpenDrain, pull: Up, speed: Low, af: GPIO_AF4_I2C1 },
///         }
///     }
/// }
/// ```
///
/// Nor does another peripheral's alternate function, even with the right
/// number:
///
/// ```compile_fail
/// feed_bsp::mx_peripheral! {
///     SPI1 in spi {
///         pins: {
///             SCK: PA5 { mode: AlternatePushPull, pull: None, speed: Low, af: GPIO_AF5_SPI2 },
///         }
///     }
/// }
/// ```
///
/// Nor a mode that does not select the alternate function:
///
/// ```compile_fail
/// feed_bsp::mx_peripheral! {
///     SPI1 in spi {
///         pins: {
///             SCK: PA5 { mode: OutputPushPull, pull: None, speed: Low, af: GPIO_AF5_SPI1 },
///         }
///     }
/// }
/// ```
#[macro_export]
macro_rules! mx_peripheral {
    (@clock) => {
        ::core::option::Option::None
    };
    (@clock $freq:literal) => {
        ::core::option::Option::Some($crate::fugit::HertzU32::from_raw($freq))
    };
    (
        $( #[$periph_doc:meta] )*
        $Periph:ident in $family:ident {
            $( clock: $freq:literal, )?
            pins: {
                $(
                    $Signal:ident: $Pin:ident {
                        mode: $Mode:ident,
                        pull: $Pull:ident,
                        speed: $Speed:ident,
                        af: $Af:ident $(,)?
                    }
                ),+ $(,)?
            } $(,)?
        } $(,)?
    ) => {
        $crate::paste::paste! {
            #[doc = "`" $Periph "` is enabled."]
            pub const [<MX_ $Periph>]: u32 = 1;

            $(
                #[doc = "Kernel clock of `" $Periph "`, in hertz."]
                pub const [<MX_ $Periph _PERIPH_CLOCK_FREQ>]: u32 = $freq;
            )?

            $(
                #[doc = "`" $Periph "_" $Signal "` pin name."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _Pin>]: $crate::gpio::DynPinId =
                    [<$Periph:lower>]::$Signal.pin;
                #[doc = "`" $Periph "_" $Signal "` pin bit."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIO_Pin>]: u16 =
                    [<$Periph:lower>]::$Signal.gpio_pin();
                #[doc = "`" $Periph "_" $Signal "` port."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIOx>]: $crate::gpio::DynPortId =
                    [<$Periph:lower>]::$Signal.port();
                #[doc = "`" $Periph "_" $Signal "` mode."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIO_Mode>]: $crate::gpio::DynMode =
                    [<$Periph:lower>]::$Signal.mode;
                #[doc = "`" $Periph "_" $Signal "` pull resistor."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIO_PuPd>]: $crate::gpio::DynPullType =
                    [<$Periph:lower>]::$Signal.pull;
                #[doc = "`" $Periph "_" $Signal "` output speed."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIO_Speed>]: $crate::gpio::DynSpeed =
                    [<$Periph:lower>]::$Signal.speed;
                #[doc = "`" $Periph "_" $Signal "` alternate function."]
                #[allow(non_upper_case_globals)]
                pub const [<MX_ $Periph _ $Signal _GPIO_AF>]: $crate::gpio::DynAlternate =
                    $crate::gpio::af::$Af;
            )+

            $( #[$periph_doc] )*
            pub mod [<$Periph:lower>] {
                $(
                    #[doc = "`" $Periph "_" $Signal "` on `" $Pin "`."]
                    pub const $Signal: $crate::gpio::PinConfig = $crate::gpio::PinConfig {
                        pin: <$crate::gpio::$Pin as $crate::gpio::PinId>::DYN,
                        mode: $crate::gpio::DynMode::$Mode,
                        pull: $crate::gpio::DynPullType::$Pull,
                        speed: $crate::gpio::DynSpeed::$Speed,
                        alternate: ::core::option::Option::Some($crate::gpio::af::$Af),
                    };
                )+

                $(
                    /// Kernel clock of the peripheral.
                    pub const PERIPH_CLOCK: $crate::fugit::HertzU32 =
                        $crate::fugit::HertzU32::from_raw($freq);
                )?

                /// Every signal routed for this peripheral.
                pub const SIGNALS: &[$crate::pinout::Signal] = &[
                    $(
                        $crate::pinout::Signal {
                            name: ::core::stringify!($Signal),
                            config: $Signal,
                        },
                    )+
                ];

                /// The peripheral's entry in the board table.
                pub const CONFIG: $crate::pinout::PeripheralConfig =
                    $crate::pinout::PeripheralConfig {
                        name: ::core::stringify!($Periph),
                        signals: SIGNALS,
                        clock: $crate::mx_peripheral!(@clock $($freq)?),
                        virtual_mode: ::core::option::Option::None,
                    };
            }

            $(
                const _: () = {
                    const fn valid<P>()
                    where
                        P: $crate::$family::[<ValidPinId $Signal:camel>]<$crate::$family::$Periph>,
                    {
                    }
                    valid::<$crate::gpio::$Pin>();

                    ::core::assert!(
                        $crate::gpio::af::$Af.num
                            == <$crate::$family::$Periph as $crate::pinout::Peripheral>::ALTERNATE.num
                            && $crate::pinout::str_eq(
                                $crate::gpio::af::$Af.peripheral,
                                <$crate::$family::$Periph as $crate::pinout::Peripheral>::ALTERNATE
                                    .peripheral,
                            ),
                        ::core::concat!(
                            "wrong alternate function for ",
                            ::core::stringify!($Periph), "_", ::core::stringify!($Signal)
                        )
                    );
                    ::core::assert!(
                        [<$Periph:lower>]::$Signal.is_consistent(),
                        ::core::concat!(
                            "mode and alternate function disagree for ",
                            ::core::stringify!($Periph), "_", ::core::stringify!($Signal)
                        )
                    );
                };
            )+
        }
    };
    (
        $( #[$periph_doc:meta] )*
        $Periph:ident {
            virtual_mode: $MxMode:ident = $Mode:ident $(,)?
        } $(,)?
    ) => {
        $crate::paste::paste! {
            #[doc = "`" $Periph "` is enabled."]
            pub const [<MX_ $Periph>]: u32 = 1;

            #[doc = "Virtual mode of `" $Periph "`."]
            pub const [<MX_ $Periph _VM>]: $crate::usb::VirtualMode =
                $crate::usb::VirtualMode::$Mode;

            #[doc = "`" $Periph "` runs in the `" $MxMode "` virtual mode."]
            #[allow(non_upper_case_globals)]
            pub const [<MX_ $Periph _ $MxMode>]: u32 = 1;

            $( #[$periph_doc] )*
            pub mod [<$Periph:lower>] {
                /// Virtual mode of the peripheral.
                pub const VIRTUAL_MODE: $crate::usb::VirtualMode =
                    $crate::usb::VirtualMode::$Mode;

                /// The peripheral's entry in the board table.
                pub const CONFIG: $crate::pinout::PeripheralConfig =
                    $crate::pinout::PeripheralConfig {
                        name: ::core::stringify!($Periph),
                        signals: &[],
                        clock: ::core::option::Option::None,
                        virtual_mode: ::core::option::Option::Some(VIRTUAL_MODE),
                    };
            }

            const _: () = ::core::assert!(
                $crate::pinout::str_eq(
                    $crate::usb::VirtualMode::$Mode.mx_name(),
                    ::core::stringify!($MxMode),
                ),
                ::core::concat!(
                    "virtual mode ",
                    ::core::stringify!($MxMode),
                    " is not ",
                    ::core::stringify!($Mode)
                )
            );
        }
    };
}
