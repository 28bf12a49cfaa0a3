//! Module supporting type-level programming
//!
//! Pins and peripherals exist twice in this crate: as values ([`DynPinId`],
//! [`DynAlternate`]) that can be stored in tables and compared, and as
//! zero-sized types ([`PB6`], [`I2C1`]) whose trait implementations encode
//! which pairings the silicon allows. A board table that routes a signal to a
//! pin that cannot carry it then fails to build instead of failing on the
//! bench.
//!
//! The traits used for that purpose are sealed: only this crate decides which
//! pin types exist and which pairings are valid.
//!
//! [`DynPinId`]: crate::gpio::DynPinId
//! [`DynAlternate`]: crate::gpio::DynAlternate
//! [`PB6`]: crate::gpio::PB6
//! [`I2C1`]: crate::i2c::I2C1

mod private {
    /// Super trait used to mark traits with an exhaustive set of
    /// implementations
    pub trait Sealed {}
}

pub(crate) use private::Sealed;
