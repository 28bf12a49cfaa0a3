use embedded_hal::digital::PinState;

/// Value-level `enum` for pull resistor types.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DynPullType {
    /// No pull resistor, `GPIO_NOPULL`.
    None = 0b00,
    /// Pull-up, `GPIO_PULLUP`.
    Up = 0b01,
    /// Pull-down, `GPIO_PULLDOWN`.
    Down = 0b10,
}

impl DynPullType {
    /// Name of this setting in the vendor HAL.
    pub const fn hal_name(self) -> &'static str {
        match self {
            DynPullType::None => "GPIO_NOPULL",
            DynPullType::Up => "GPIO_PULLUP",
            DynPullType::Down => "GPIO_PULLDOWN",
        }
    }

    /// Two-bit `PUPDR` field value.
    #[inline]
    pub const fn pupdr(self) -> u32 {
        self as u32
    }

    /// Level an undriven line settles to, if any.
    ///
    /// Open-drain buses rely on this: an I2C line idles high through its pull-up.
    pub const fn idle_level(self) -> Option<PinState> {
        match self {
            DynPullType::None => None,
            DynPullType::Up => Some(PinState::High),
            DynPullType::Down => Some(PinState::Low),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pupdr_encoding() {
        assert_eq!(DynPullType::None.pupdr(), 0b00);
        assert_eq!(DynPullType::Up.pupdr(), 0b01);
        assert_eq!(DynPullType::Down.pupdr(), 0b10);
    }

    #[test]
    fn idle_levels() {
        assert_eq!(DynPullType::Up.idle_level(), Some(PinState::High));
        assert_eq!(DynPullType::Down.idle_level(), Some(PinState::Low));
        assert_eq!(DynPullType::None.idle_level(), None);
    }
}
