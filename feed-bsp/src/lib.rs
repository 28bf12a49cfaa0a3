//! Board support for the STM32F401 USB audio feed board
//!
//! This crate describes how the board's pins are wired: which GPIO carries
//! which peripheral signal, in which mode, with which pull resistor, slew rate
//! and alternate function, plus the peripheral clock and USB mode choices made
//! when the board was laid out.
//!
//! Every value is available twice:
//! - grouped by peripheral, e.g. [`board::i2c1::SCL`] or [`board::spi1::PERIPH_CLOCK`];
//! - under the flat configurator names, e.g. [`MX_I2C1_SCL_GPIOx`] or
//!   [`MX_SPI1_PERIPH_CLOCK_FREQ`], so bring-up code written against those
//!   names keeps working.
//!
//! ```
//! use feed_bsp::gpio::{DynPortId, DynSpeed};
//!
//! assert_eq!(feed_bsp::MX_I2C1_SCL_GPIOx, DynPortId::B);
//! assert_eq!(feed_bsp::MX_SPI1_SCK_GPIO_Speed, DynSpeed::VeryHigh);
//! assert_eq!(feed_bsp::MX_SPI1_PERIPH_CLOCK_FREQ, 84_000_000);
//! ```
//!
//! The crate never touches hardware registers. [`gpio::reg`] derives the
//! values the GPIO registers must receive; writing them is left to the HAL.
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log validation and stream errors.

#![warn(missing_docs)]
#![no_std]

#[doc(hidden)]
pub use fugit;
#[doc(hidden)]
pub use paste;

pub mod board;
pub mod gpio;
pub mod i2c;
pub mod pinout;
pub mod spi;
pub mod stream;
pub(crate) mod typelevel;
pub mod usb;

pub use board::*;
