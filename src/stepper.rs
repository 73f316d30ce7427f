//! Microstepping motor state and the excitation state machine.
//!
//! [`MicroStepper`] is the per-slot state owned by the shield.
//! [`Stepper`] is the handle callers get from
//! [`MotorShield::claim_slot()`](crate::MotorShield::claim_slot): it borrows
//! that state together with the shield's PWM port, so every movement is
//! pushed straight to the hardware.

use crate::curve::{MicrostepResolution, LATCH_AIN1, LATCH_AIN2, LATCH_BIN1, LATCH_BIN2};
use crate::error::ShieldError;
use crate::pins::StepperPins;
use crate::port::{PwmDevice, PwmPort};

/// Rotation direction for a single microstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing position.
    Forward,
    /// Decreasing position.
    Backward,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// State of one claimed motor slot.
///
/// Invariants, held after every update:
/// * `phase` is in `[0, 4 * microsteps)`
/// * `position` is in `[0, microsteps_per_rev)`
/// * `pins` never change after the slot is claimed
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MicroStepper {
    slot_index: u8,
    resolution: MicrostepResolution,
    microsteps_per_rev: u32,
    phase: u16,
    position: u32,
    target: u32,
    pins: StepperPins,
    usec_per_microstep: u32,
}

impl MicroStepper {
    /// `steps_per_rev` must be non-zero; the shield checks this on claim.
    pub(crate) fn new(
        slot_index: u8,
        steps_per_rev: u16,
        resolution: MicrostepResolution,
        pins: StepperPins,
    ) -> Self {
        Self {
            slot_index,
            resolution,
            microsteps_per_rev: u32::from(steps_per_rev) * u32::from(resolution.microsteps()),
            phase: 0,
            position: 0,
            target: 0,
            pins,
            usec_per_microstep: 0,
        }
    }

    /// Zero-based slot this motor is wired to.
    pub fn slot_index(&self) -> u8 {
        self.slot_index
    }

    pub fn resolution(&self) -> MicrostepResolution {
        self.resolution
    }

    /// Full steps per revolution times microsteps per step.
    pub fn microsteps_per_rev(&self) -> u32 {
        self.microsteps_per_rev
    }

    /// Position within the four-quadrant excitation cycle.
    pub fn phase(&self) -> u16 {
        self.phase
    }

    /// Absolute rotor position in microsteps.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn pins(&self) -> StepperPins {
        self.pins
    }

    /// Interval between microsteps in µs, as last set by `set_speed`.
    pub fn speed(&self) -> u32 {
        self.usec_per_microstep
    }

    /// Exact equality; there is no tolerance band.
    pub fn is_at_target(&self) -> bool {
        self.position == self.target
    }

    pub(crate) fn set_target(&mut self, target: u32) {
        self.target = target;
    }

    /// Positions past a full revolution wrap around.
    pub(crate) fn set_position(&mut self, position: u32) {
        self.position = position % self.microsteps_per_rev;
    }

    pub(crate) fn set_speed(&mut self, rpm: f32) {
        // Float-to-int casts saturate: 0 rpm gives u32::MAX, negative gives 0.
        self.usec_per_microstep = (60_000_000.0 / (self.microsteps_per_rev as f32 * rpm)) as u32;
    }

    /// Move the phase and position counters one microstep. No bus traffic.
    pub(crate) fn step_counters(&mut self, direction: Direction) {
        let cycle = self.resolution.cycle_len();
        let rev = self.microsteps_per_rev;

        match direction {
            Direction::Forward => {
                self.phase += 1;
                self.position += 1;
            }
            Direction::Backward => {
                // Unsigned counters: substitute the wrapped value at zero.
                self.phase = if self.phase == 0 { cycle - 1 } else { self.phase - 1 };
                self.position = if self.position == 0 { rev - 1 } else { self.position - 1 };
            }
        }

        self.phase = (self.phase + cycle) % cycle;
        self.position = (self.position + rev) % rev;
    }
}

/// Handle to a claimed motor slot.
///
/// Borrows the shield mutably, so only one handle exists at a time. Drop it
/// and claim again (or call [`MotorShield::stepper()`](crate::MotorShield::stepper))
/// to switch motors; the slot state lives on in the shield.
pub struct Stepper<'a, D> {
    motor: &'a mut MicroStepper,
    port: &'a mut PwmPort<D>,
}

impl<'a, D> Stepper<'a, D>
where
    D: PwmDevice,
{
    pub(crate) fn new(motor: &'a mut MicroStepper, port: &'a mut PwmPort<D>) -> Self {
        Self { motor, port }
    }

    /// Read-only view of the slot state.
    pub fn state(&self) -> &MicroStepper {
        self.motor
    }

    /// Rotate one microstep and push the new coil excitation to the shield.
    ///
    /// Writes both coil duties, then the four bridge inputs in the order
    /// AIN2, BIN1, AIN1, BIN2.
    ///
    /// # Returns
    /// The new absolute position.
    ///
    /// # Errors
    /// Returns the first PWM device error. The counters have already moved
    /// by then, so the next successful call re-syncs the coils.
    pub fn advance_microstep(&mut self, direction: Direction) -> Result<u32, ShieldError<D::Error>> {
        self.motor.step_counters(direction);

        let excitation = self.motor.resolution.curve().excitation(self.motor.phase);
        let pins = self.motor.pins;

        self.port.set_duty(pins.pwm_a, excitation.duty_a)?;
        self.port.set_duty(pins.pwm_b, excitation.duty_b)?;

        self.port.set_rail(pins.ain2, excitation.is_latched(LATCH_AIN2))?;
        self.port.set_rail(pins.bin1, excitation.is_latched(LATCH_BIN1))?;
        self.port.set_rail(pins.ain1, excitation.is_latched(LATCH_AIN1))?;
        self.port.set_rail(pins.bin2, excitation.is_latched(LATCH_BIN2))?;

        Ok(self.motor.position)
    }

    /// Rotate `count` microsteps in one direction.
    ///
    /// # Returns
    /// The final absolute position (unchanged when `count` is 0).
    pub fn advance(&mut self, count: u32, direction: Direction) -> Result<u32, ShieldError<D::Error>> {
        for _ in 0..count {
            self.advance_microstep(direction)?;
        }
        Ok(self.motor.position)
    }

    /// De-energise both coils so the rotor turns freely.
    ///
    /// Position and target are kept.
    pub fn release(&mut self) -> Result<(), ShieldError<D::Error>> {
        let pins = self.motor.pins;

        self.port.set_rail(pins.ain1, false)?;
        self.port.set_rail(pins.ain2, false)?;
        self.port.set_rail(pins.bin1, false)?;
        self.port.set_rail(pins.bin2, false)?;
        self.port.set_duty(pins.pwm_a, 0)?;
        self.port.set_duty(pins.pwm_b, 0)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("motor {} released", self.motor.slot_index + 1);

        Ok(())
    }

    /// Set the target position in absolute microsteps.
    pub fn set_target(&mut self, target: u32) {
        self.motor.set_target(target);
    }

    /// Overwrite the current position without moving the rotor.
    pub fn set_position(&mut self, position: u32) {
        self.motor.set_position(position);
    }

    pub fn is_at_target(&self) -> bool {
        self.motor.is_at_target()
    }

    /// Store the microstep interval for `rpm`:
    /// `60_000_000 / (microsteps_per_rev * rpm)` µs.
    ///
    /// Nothing in this crate consumes the value; it is kept for firmware
    /// that schedules its own stepping.
    pub fn set_speed(&mut self, rpm: f32) {
        self.motor.set_speed(rpm);
    }

    pub fn speed(&self) -> u32 {
        self.motor.speed()
    }

    pub fn position(&self) -> u32 {
        self.motor.position()
    }

    pub fn target(&self) -> u32 {
        self.motor.target()
    }
}
