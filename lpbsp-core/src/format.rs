//! Fixed-width decimal rendering for character displays
//!
//! Values are right-justified and padded with spaces to the width of the
//! largest value of their type, so a number redrawn in place always covers
//! the previous one. Zero renders as a single `0` in the last column.

use core::fmt::Write;

use heapless::String;

/// Render a `u8` into 3 columns
pub fn format_u8(value: u8) -> String<3> {
    right_justify(u32::from(value))
}

/// Render a `u16` into 5 columns
pub fn format_u16(value: u16) -> String<5> {
    right_justify(u32::from(value))
}

/// Render a `u32` into 10 columns
pub fn format_u32(value: u32) -> String<10> {
    right_justify(value)
}

/// ASCII hex digit for the low nibble of `value` (upper case)
pub fn hex_digit(value: u8) -> char {
    match value & 0x0F {
        n @ 0..=9 => char::from(b'0' + n),
        n => char::from(b'A' + n - 10),
    }
}

fn right_justify<const N: usize>(value: u32) -> String<N> {
    let mut out = String::new();
    // N always fits the widest value of the source type
    let _ = write!(out, "{:>width$}", value, width = N);
    out
}
