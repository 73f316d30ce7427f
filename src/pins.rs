//! Fixed PWM channel wiring of the shield.
//!
//! Each motor position drives one dual H-bridge: two PWM channels set the
//! coil current, four channels act as digital bridge inputs.

/// PWM channels wired to one motor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperPins {
    /// Coil A current (proportional duty).
    pub pwm_a: u8,
    /// Coil A bridge input 1.
    pub ain1: u8,
    /// Coil A bridge input 2.
    pub ain2: u8,
    /// Coil B current (proportional duty).
    pub pwm_b: u8,
    /// Coil B bridge input 1.
    pub bin1: u8,
    /// Coil B bridge input 2.
    pub bin2: u8,
}

impl StepperPins {
    /// All six channels, PWM channels first.
    pub fn channels(&self) -> [u8; 6] {
        [self.pwm_a, self.ain1, self.ain2, self.pwm_b, self.bin1, self.bin2]
    }
}

/// Number of motor positions on the shield.
pub const MOTOR_COUNT: usize = 2;

/// Wiring per motor slot, indexed by `motor number - 1`.
pub const MOTOR_PINS: [StepperPins; MOTOR_COUNT] = [
    StepperPins {
        pwm_a: 8,
        ain2: 9,
        ain1: 10,
        pwm_b: 13,
        bin2: 12,
        bin1: 11,
    },
    StepperPins {
        pwm_a: 2,
        ain2: 3,
        ain1: 4,
        pwm_b: 7,
        bin2: 6,
        bin1: 5,
    },
];

/// Channel driving the laser.
#[cfg(not(feature = "laser-active-low"))]
pub const LASER_PIN: u8 = 15;
#[cfg(feature = "laser-active-low")]
pub const LASER_PIN: u8 = 14;

/// Rail level that switches the laser on.
pub const LASER_ON_LEVEL: bool = cfg!(not(feature = "laser-active-low"));
