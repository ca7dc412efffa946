#![cfg_attr(not(test), no_std)]

//! Board adapters for the ESP32-S3 sign: MAX7219 text surface, bitmap font,
//! and Wi-Fi connectivity state.

pub mod network;
pub mod platform;
pub mod render;
