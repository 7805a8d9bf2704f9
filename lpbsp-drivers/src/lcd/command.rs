//! HD44780 instruction set and I/O expander wiring

/// PCF8574 output bits as wired on the common LCD1602 backpack
///
/// The upper four outputs drive D4..D7; the lower four carry control lines.
pub mod pin {
    /// Register select (0 = instruction, 1 = data)
    pub const RS: u8 = 0x01;
    /// Read/write (1 = read); asserted only to park the expander
    pub const RW: u8 = 0x02;
    /// Enable strobe, latched on the falling edge
    pub const EN: u8 = 0x04;
    /// Backlight transistor
    pub const BACKLIGHT: u8 = 0x08;
    /// Data lines D4..D7
    pub const DATA: u8 = 0xF0;
}

/// HD44780 instructions and their flag bits
pub mod cmd {
    pub const CLEAR_DISPLAY: u8 = 0x01;
    pub const RETURN_HOME: u8 = 0x02;
    pub const ENTRY_MODE_SET: u8 = 0x04;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const CURSOR_SHIFT: u8 = 0x10;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const SET_CGRAM_ADDR: u8 = 0x40;
    pub const SET_DDRAM_ADDR: u8 = 0x80;

    // Entry mode
    pub const ENTRY_INCREMENT: u8 = 0x02;
    pub const ENTRY_SHIFT: u8 = 0x01;

    // Display control
    pub const DISPLAY_ON: u8 = 0x04;
    pub const CURSOR_ON: u8 = 0x02;
    pub const BLINK_ON: u8 = 0x01;

    // Function set
    pub const EIGHT_BIT: u8 = 0x10;
    pub const TWO_LINE: u8 = 0x08;
    pub const FONT_5X10: u8 = 0x04;
}

/// Largest DDRAM address
pub const DDRAM_MASK: u8 = 0x7F;

/// Which controller register a byte is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Instruction register (commands)
    Instruction,
    /// Data register (characters)
    Data,
}

impl Register {
    /// RS bit for this register
    pub const fn select_bit(self) -> u8 {
        match self {
            Register::Instruction => 0,
            Register::Data => pin::RS,
        }
    }
}

/// Display control instruction
pub const fn display_control(display: bool, cursor: bool, blink: bool) -> u8 {
    let mut value = cmd::DISPLAY_CONTROL;
    if display {
        value |= cmd::DISPLAY_ON;
    }
    if cursor {
        value |= cmd::CURSOR_ON;
    }
    if blink {
        value |= cmd::BLINK_ON;
    }
    value
}
