use crate::{
    gpio::{PinId, PA15, PA4, PA5, PA6, PA7, PB10, PB12, PB13, PB14, PB15, PB3, PB4, PB5, PB9, PC2, PC3},
    pinout::{Peripheral, ValidPin},
};

use super::{SPI1, SPI2};

macro_rules! pin_validation {
    ($($p:ident),*) => {
        paste::paste! {
            $(
                #[doc = "Indicates a valid " $p " pin for SPI1 or SPI2"]
                pub trait [<ValidPinId $p>]<SPI: Peripheral>: PinId {}
            )*
        }
    };
}
pin_validation!(Sck, Miso, Mosi, Nss);

macro_rules! impl_valid_spi {
    ($($spi:ident: {
        sck: [$($sck:ident),*],
        miso: [$($miso:ident),*],
        mosi: [$($mosi:ident),*],
        nss: [$($nss:ident),*],
    }),*) => {
        $(
            $(impl ValidPinIdSck<$spi> for $sck {})*
            $(impl ValidPinIdMiso<$spi> for $miso {})*
            $(impl ValidPinIdMosi<$spi> for $mosi {})*
            $(impl ValidPinIdNss<$spi> for $nss {})*
        )*

        /// Every pin an SPI signal can be routed to.
        pub const VALID_PINS: &[ValidPin] = &[
            $(
                $(ValidPin::new::<$spi, $sck>("SCK"),)*
                $(ValidPin::new::<$spi, $miso>("MISO"),)*
                $(ValidPin::new::<$spi, $mosi>("MOSI"),)*
                $(ValidPin::new::<$spi, $nss>("NSS"),)*
            )*
        ];
    };
}

impl_valid_spi!(
    SPI1: {
        sck: [PA5, PB3],
        miso: [PA6, PB4],
        mosi: [PA7, PB5],
        nss: [PA4, PA15],
    },
    SPI2: {
        sck: [PB10, PB13],
        miso: [PB14, PC2],
        mosi: [PB15, PC3],
        nss: [PB9, PB12],
    }
);
