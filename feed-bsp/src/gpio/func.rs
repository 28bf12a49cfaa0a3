use core::fmt;

/// Value-level `enum` for the pin's mode.
///
/// Combines the `MODER` direction with the `OTYPER` output driver, the way the
/// vendor HAL's `GPIO_MODE_*` values do.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynMode {
    /// Floating or pulled digital input, `GPIO_MODE_INPUT`.
    Input,
    /// Push-pull output, `GPIO_MODE_OUTPUT_PP`.
    OutputPushPull,
    /// Open-drain output, `GPIO_MODE_OUTPUT_OD`.
    OutputOpenDrain,
    /// Alternate function with push-pull driver, `GPIO_MODE_AF_PP`.
    AlternatePushPull,
    /// Alternate function with open-drain driver, `GPIO_MODE_AF_OD`.
    AlternateOpenDrain,
    /// Analog, `GPIO_MODE_ANALOG`.
    Analog,
}

impl DynMode {
    /// Name of this mode in the vendor HAL.
    pub const fn hal_name(self) -> &'static str {
        match self {
            DynMode::Input => "GPIO_MODE_INPUT",
            DynMode::OutputPushPull => "GPIO_MODE_OUTPUT_PP",
            DynMode::OutputOpenDrain => "GPIO_MODE_OUTPUT_OD",
            DynMode::AlternatePushPull => "GPIO_MODE_AF_PP",
            DynMode::AlternateOpenDrain => "GPIO_MODE_AF_OD",
            DynMode::Analog => "GPIO_MODE_ANALOG",
        }
    }

    /// Two-bit `MODER` field value.
    pub const fn moder(self) -> u32 {
        match self {
            DynMode::Input => 0b00,
            DynMode::OutputPushPull | DynMode::OutputOpenDrain => 0b01,
            DynMode::AlternatePushPull | DynMode::AlternateOpenDrain => 0b10,
            DynMode::Analog => 0b11,
        }
    }

    /// One-bit `OTYPER` field value. Only meaningful for driven modes.
    pub const fn otyper(self) -> u32 {
        match self {
            DynMode::OutputOpenDrain | DynMode::AlternateOpenDrain => 1,
            _ => 0,
        }
    }

    /// Whether the pin is handed to a peripheral.
    pub const fn is_alternate(self) -> bool {
        matches!(
            self,
            DynMode::AlternatePushPull | DynMode::AlternateOpenDrain
        )
    }
}

/// Alternate function selection: the `AFRL`/`AFRH` number and the peripheral
/// it routes to the pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynAlternate {
    /// `AF0` to `AF15`.
    pub num: u8,
    /// Peripheral the function belongs to, as the HAL spells it.
    pub peripheral: &'static str,
}

impl DynAlternate {
    /// Highest alternate function number.
    pub const MAX_NUM: u8 = 15;

    /// Alternate function `num` of `peripheral`.
    pub const fn new(num: u8, peripheral: &'static str) -> Self {
        assert!(num <= Self::MAX_NUM, "alternate function out of range");
        Self { num, peripheral }
    }

    /// Four-bit `AFRx` field value.
    #[inline]
    pub const fn afr(self) -> u32 {
        self.num as u32
    }
}

impl fmt::Display for DynAlternate {
    /// Writes the HAL name, e.g. `GPIO_AF4_I2C1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO_AF{}_{}", self.num, self.peripheral)
    }
}

macro_rules! alternate_functions {
    ($($num:literal: [$($periph:ident),+]),* $(,)?) => {
        paste::paste! {
            $($(
                #[doc = "Alternate function " $num " routed to `" $periph "`."]
                pub const [<GPIO_AF $num _ $periph>]: DynAlternate =
                    DynAlternate::new($num, stringify!($periph));
            )+)*
        }
    };
}

/// Alternate function selections of the STM32F401, named as in the vendor HAL.
#[allow(non_upper_case_globals)]
pub mod af {
    use super::DynAlternate;

    alternate_functions!(
        0: [RTC_50Hz, MCO, TAMPER, SWJ, TRACE],
        1: [TIM1, TIM2],
        2: [TIM3, TIM4, TIM5],
        3: [TIM9, TIM10, TIM11],
        4: [I2C1, I2C2, I2C3],
        5: [SPI1, SPI2, SPI3, SPI4, I2S2ext],
        6: [SPI3, SPI4, I2S3ext],
        7: [USART1, USART2, I2S3ext],
        8: [USART6],
        9: [I2C2, I2C3],
        10: [OTG_FS],
        12: [SDIO],
        15: [EVENTOUT],
    );
}
