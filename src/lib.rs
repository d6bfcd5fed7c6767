//! DS18B20 thermometer on a bit-banged 1-Wire bus, shown on a TM1638 seven-segment board.

#![cfg_attr(not(test), no_std)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::cast_possible_truncation)]

pub mod display;
pub mod ds18b20;
pub mod onewire;
pub mod thermometer;
