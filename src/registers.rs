//! PCA9685 register map and bus defaults for the motor shield.
//!
//! Each of the 16 PWM channels owns four consecutive registers starting at
//! [`LED0_ON_L`]: `ON_L`, `ON_H`, `OFF_L`, `OFF_H`. With auto-increment
//! enabled in [`MODE1`], a channel is programmed with a single 5-byte write:
//! `[LED0_ON_L + 4 * channel, on_l, on_h, off_l, off_h]`.

// ---------------------------------------------------------------------------
// Mode registers
// ---------------------------------------------------------------------------

/// Mode register 1 (sleep, auto-increment, restart).
pub const MODE1: u8 = 0x00;

/// Mode register 2 (output driver configuration, unused here).
#[allow(dead_code)]
pub const MODE2: u8 = 0x01;

/// MODE1: respond to the LED all-call address.
pub const MODE1_ALLCALL: u8 = 0x01;

/// MODE1: low-power mode, oscillator off. Required while writing PRE_SCALE.
pub const MODE1_SLEEP: u8 = 0x10;

/// MODE1: register auto-increment.
pub const MODE1_AI: u8 = 0x20;

/// MODE1: restart PWM channels after leaving sleep.
pub const MODE1_RESTART: u8 = 0x80;

// ---------------------------------------------------------------------------
// Channel registers
// ---------------------------------------------------------------------------

/// First register of channel 0. Channel `n` starts at `LED0_ON_L + 4 * n`.
pub const LED0_ON_L: u8 = 0x06;

/// Prescaler for the PWM output frequency. Only writable in sleep mode.
pub const PRE_SCALE: u8 = 0xFE;

// ---------------------------------------------------------------------------
// Chip constants
// ---------------------------------------------------------------------------

/// Internal oscillator frequency in Hz.
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Counter steps per PWM period (12-bit).
pub const PWM_STEPS: u32 = 4096;

/// Smallest prescale value the chip accepts (~1526 Hz).
pub const PRESCALE_MIN: u8 = 3;

/// Largest prescale value (~24 Hz).
pub const PRESCALE_MAX: u8 = 255;

/// Oscillator start-up time after clearing SLEEP, in microseconds.
/// The datasheet asks for 500 µs; the shield library has always used 5 ms.
pub const OSCILLATOR_SETTLE_US: u32 = 5_000;

// ---------------------------------------------------------------------------
// Duty encoding
// ---------------------------------------------------------------------------

/// Number of PWM channels on the chip.
pub const CHANNEL_COUNT: u8 = 16;

/// Largest proportional duty value.
pub const MAX_DUTY: u16 = 4095;

/// ON-time value with the full-on bit (bit 4 of `ON_H`) set. Writing
/// `(FULL_ON, 0)` latches the output permanently high.
pub const FULL_ON: u16 = 4096;

// ---------------------------------------------------------------------------
// Bus defaults
// ---------------------------------------------------------------------------

/// Default 7-bit I2C address of the motor shield.
pub const DEFAULT_ADDRESS: u8 = 0x60;

/// Default PWM carrier frequency in Hz.
pub const DEFAULT_FREQUENCY_HZ: u16 = 1600;

/// Prescale value for a PWM frequency, rounded to nearest and clamped to
/// the chip's range. `frequency_hz` of zero is treated as 1 Hz.
pub fn prescale_for(frequency_hz: u16) -> u8 {
    let divisor = PWM_STEPS * u32::from(frequency_hz.max(1));
    let rounded = (OSCILLATOR_HZ + divisor / 2) / divisor;
    let prescale = rounded.saturating_sub(1);
    prescale.clamp(u32::from(PRESCALE_MIN), u32::from(PRESCALE_MAX)) as u8
}
