//! Контур тангажа автопилота СВВП
//!
//! Стабилизация тангажа в самолетном режиме и в режиме висения на
//! целочисленной арифметике с фиксированной точкой. Библиотека не зависит
//! от платы; прошивка для RP2040 собирается с функцией `rp2040`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod utils;

pub mod config;
pub mod control;
pub mod data;

#[cfg(feature = "rp2040")]
pub mod tasks;
