//! LCD1602 Character Display Driver
//!
//! Driver for HD44780-compatible character LCDs behind a PCF8574 I2C
//! backpack. The controller runs in 4-bit mode: every command or data byte
//! is split into two nibbles, each presented on D4..D7 and latched by an
//! enable strobe, all through single-byte expander writes.
//!
//! There is no read-back path, so the controller's busy flag is never
//! polled. Each byte is followed by a fixed settle delay instead.

use embedded_hal::i2c::Error;
use lpbsp_core::format::{format_u16, format_u32, format_u8, hex_digit};
use lpbsp_hal::{DelayNs, I2cBus};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::command::{cmd, display_control, pin, Register, DDRAM_MASK};
use super::status::{LcdError, SendStatus, Step};

/// Common backpack address (PCF8574 with A0..A2 high)
pub const DEFAULT_ADDRESS: u8 = 0x27;

/// Init script sent in 8-bit framing (upper nibble only, one strobe each)
///
/// Three 8-bit function sets resynchronise the nibble phase whatever state
/// the controller was left in; the fourth switches to 4-bit mode.
const WAKE_SEQUENCE: [u8; 4] = [
    cmd::FUNCTION_SET | cmd::EIGHT_BIT,
    cmd::FUNCTION_SET | cmd::EIGHT_BIT,
    cmd::FUNCTION_SET | cmd::EIGHT_BIT,
    cmd::FUNCTION_SET,
];

/// Character font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Font {
    /// 5x8 dots (all multi-line panels)
    #[default]
    Dots5x8,
    /// 5x10 dots (single-line panels only)
    Dots5x10,
}

/// Open-loop timing of the nibble protocol
///
/// These are minimum settle times; the controller cannot report when it
/// is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timing {
    /// Data valid before the strobe rises (µs)
    pub setup_us: u32,
    /// Strobe high time (µs)
    pub pulse_us: u32,
    /// Data held after the strobe falls (µs)
    pub hold_us: u32,
    /// Command execution time after each byte (ms)
    pub settle_ms: u32,
    /// Delay after a backlight change (ms)
    pub backlight_ms: u32,
}

impl Timing {
    /// 50 µs per nibble phase, 2 ms per byte, 1 ms after a backlight change
    pub const HD44780: Self = Self {
        setup_us: 50,
        pulse_us: 50,
        hold_us: 50,
        settle_ms: 2,
        backlight_ms: 1,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::HD44780
    }
}

/// LCD configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LcdConfig {
    /// 7-bit expander address
    pub address: u8,
    /// Visible rows (1..=4)
    pub rows: u8,
    /// Visible columns
    pub columns: u8,
    pub font: Font,
    /// Show the underline cursor after init
    pub cursor: bool,
    /// Blink the cursor cell after init
    pub blink: bool,
    pub timing: Timing,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            rows: 2,
            columns: 16,
            font: Font::Dots5x8,
            cursor: false,
            blink: false,
            timing: Timing::HD44780,
        }
    }
}

impl LcdConfig {
    fn function_set(&self) -> u8 {
        let mut value = cmd::FUNCTION_SET;
        if self.rows > 1 {
            value |= cmd::TWO_LINE;
        } else if self.font == Font::Dots5x10 {
            value |= cmd::FONT_5X10;
        }
        value
    }

    /// DDRAM address of a cell, clamped to the panel
    fn cell_address(&self, row: u8, col: u8) -> u8 {
        let last_row = self.rows.clamp(1, 4) - 1;
        let last_col = self.columns.max(1) - 1;
        let row = row.min(last_row);
        let col = col.min(last_col);

        // Rows 2 and 3 continue rows 0 and 1 in DDRAM
        let base = match row {
            0 => 0x00,
            1 => 0x40,
            2 => self.columns,
            _ => 0x40u8.wrapping_add(self.columns),
        };
        base.wrapping_add(col) & DDRAM_MASK
    }
}

/// State the driver assumes the panel is in
///
/// Only the backlight changes at runtime. The expander drives the
/// backlight from the same byte as the data lines, so this flag goes out
/// with every byte written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySession {
    pub backlight: bool,
}

impl DisplaySession {
    /// Expander bits carried by every byte
    pub const fn flags(&self) -> u8 {
        if self.backlight {
            pin::BACKLIGHT
        } else {
            0
        }
    }
}

/// LCD1602 driver
pub struct Lcd1602<B, D> {
    bus: B,
    delay: D,
    config: LcdConfig,
    session: DisplaySession,
}

impl<B, D> Lcd1602<B, D>
where
    B: I2cBus,
    B::Error: Error,
    D: DelayNs,
{
    /// Create a new driver
    ///
    /// Nothing is sent until [`initialize`](Self::initialize). The backlight
    /// starts off.
    pub fn new(bus: B, delay: D, config: LcdConfig) -> Self {
        Self {
            bus,
            delay,
            config,
            session: DisplaySession::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &LcdConfig {
        &self.config
    }

    /// Get the assumed panel state
    pub fn session(&self) -> DisplaySession {
        self.session
    }

    /// Get access to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus and delay
    pub fn free(self) -> (B, D) {
        (self.bus, self.delay)
    }

    /// Run the power-on script and turn the backlight on
    ///
    /// Safe to repeat at any time; it also recovers a controller left
    /// between nibbles by an earlier bus failure.
    pub fn initialize(&mut self) -> Result<(), LcdError<B::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("lcd: init at {=u8:#x}", self.config.address);

        let mut status = SendStatus::new();

        for &command in &WAKE_SEQUENCE {
            status.merge(self.send_upper(command));
        }

        let script = [
            self.config.function_set(),
            display_control(true, self.config.cursor, self.config.blink),
            cmd::ENTRY_MODE_SET | cmd::ENTRY_INCREMENT,
            cmd::CLEAR_DISPLAY,
        ];
        for &command in &script {
            status.merge(self.send(command, Register::Instruction));
            self.delay.delay_ms(self.config.timing.settle_ms);
        }

        status.merge(self.set_backlight(true));
        status.into_result()
    }

    /// Blank the panel and home the cursor
    pub fn clear(&mut self) -> Result<(), LcdError<B::Error>> {
        self.command(cmd::CLEAR_DISPLAY)
    }

    /// Home the cursor and undo any display shift
    pub fn return_home(&mut self) -> Result<(), LcdError<B::Error>> {
        self.command(cmd::RETURN_HOME)
    }

    /// Move the cursor to a raw DDRAM address
    pub fn set_ddram_address(&mut self, address: u8) -> Result<(), LcdError<B::Error>> {
        self.command(cmd::SET_DDRAM_ADDR | (address & DDRAM_MASK))
    }

    /// Move the cursor to a cell (row 0.., col 0..)
    ///
    /// Positions off the panel are clamped to the last row and column.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<(), LcdError<B::Error>> {
        let address = self.config.cell_address(row, col);
        self.set_ddram_address(address)
    }

    /// Switch the display, cursor and blink on or off
    pub fn display_control(
        &mut self,
        display: bool,
        cursor: bool,
        blink: bool,
    ) -> Result<(), LcdError<B::Error>> {
        self.command(display_control(display, cursor, blink))
    }

    /// Write one character code at the cursor
    pub fn write_char(&mut self, code: u8) -> Result<(), LcdError<B::Error>> {
        self.send(code, Register::Data).into_result()
    }

    /// Write character codes up to the end of `s` or the first NUL
    ///
    /// Each byte is a full send; a failing byte does not stop the rest.
    pub fn write_string(&mut self, s: &str) -> Result<(), LcdError<B::Error>> {
        let mut status = SendStatus::new();
        for code in s.bytes().take_while(|&b| b != 0) {
            status.merge(self.send(code, Register::Data));
        }
        status.into_result()
    }

    /// Write the low nibble of `value` as one hex digit
    pub fn write_hex(&mut self, value: u8) -> Result<(), LcdError<B::Error>> {
        self.write_char(hex_digit(value) as u8)
    }

    /// Write `value` right-justified in 3 cells
    pub fn write_u8(&mut self, value: u8) -> Result<(), LcdError<B::Error>> {
        self.write_string(&format_u8(value))
    }

    /// Write `value` right-justified in 5 cells
    pub fn write_u16(&mut self, value: u16) -> Result<(), LcdError<B::Error>> {
        self.write_string(&format_u16(value))
    }

    /// Write `value` right-justified in 10 cells
    pub fn write_u32(&mut self, value: u32) -> Result<(), LcdError<B::Error>> {
        self.write_string(&format_u32(value))
    }

    /// Turn the backlight on; later writes keep it on
    pub fn backlight_on(&mut self) -> Result<(), LcdError<B::Error>> {
        self.set_backlight(true).into_result()
    }

    /// Turn the backlight off; later writes keep it off
    pub fn backlight_off(&mut self) -> Result<(), LcdError<B::Error>> {
        self.set_backlight(false).into_result()
    }

    /// Whether the backlight is on
    pub fn backlight(&self) -> bool {
        self.session.backlight
    }

    fn command(&mut self, command: u8) -> Result<(), LcdError<B::Error>> {
        self.send(command, Register::Instruction).into_result()
    }

    /// Send one byte as two strobed nibbles, then park the expander
    ///
    /// Seven single-byte writes; all of them are issued even if some fail.
    pub fn send(&mut self, value: u8, register: Register) -> SendStatus<B::Error> {
        let flags = self.session.flags() | register.select_bit();
        let mut status = SendStatus::new();

        self.strobe(
            &mut status,
            (value & pin::DATA) | flags,
            [Step::UpperSetup, Step::UpperStrobe, Step::UpperHold],
        );
        self.strobe(
            &mut status,
            ((value << 4) & pin::DATA) | flags,
            [Step::LowerSetup, Step::LowerStrobe, Step::LowerHold],
        );

        let park = self.session.flags() | pin::RW;
        status.record(Step::Release, self.bus.write1(self.config.address, park));
        self.delay.delay_ms(self.config.timing.settle_ms);

        status
    }

    /// Present one nibble (already in D4..D7) and pulse enable
    fn strobe(&mut self, status: &mut SendStatus<B::Error>, nibble: u8, steps: [Step; 3]) {
        let address = self.config.address;
        let timing = self.config.timing;

        status.record(steps[0], self.bus.write1(address, nibble));
        self.delay.delay_us(timing.setup_us);
        status.record(steps[1], self.bus.write1(address, nibble | pin::EN));
        self.delay.delay_us(timing.pulse_us);
        status.record(steps[2], self.bus.write1(address, nibble));
        self.delay.delay_us(timing.hold_us);
    }

    /// 8-bit framed instruction: only the upper nibble exists
    fn send_upper(&mut self, command: u8) -> SendStatus<B::Error> {
        let address = self.config.address;
        let settle = self.config.timing.settle_ms;
        let byte = (command & pin::DATA) | self.session.flags();
        let mut status = SendStatus::new();

        status.record(Step::UpperStrobe, self.bus.write1(address, byte | pin::EN));
        self.delay.delay_ms(settle);
        status.record(Step::UpperHold, self.bus.write1(address, byte));
        self.delay.delay_ms(settle);

        status
    }

    fn set_backlight(&mut self, on: bool) -> SendStatus<B::Error> {
        self.session.backlight = on;
        let mut status = SendStatus::new();
        status.record(
            Step::Backlight,
            self.bus.write1(self.config.address, self.session.flags()),
        );
        self.delay.delay_ms(self.config.timing.backlight_ms);
        status
    }
}

/// Text output through `write!`; any bus failure becomes `fmt::Error`
impl<B, D> core::fmt::Write for Lcd1602<B, D>
where
    B: I2cBus,
    B::Error: Error,
    D: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_string(s).map_err(|_| core::fmt::Error)
    }
}
