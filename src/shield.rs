//! The two-motor shield.
//!
//! [`MotorShield`] owns the PWM port, both motor slots and the laser
//! on-time accumulator. Slots are fixed storage inside the shield: a slot
//! is claimed the first time a caller asks for it with a step count and is
//! never unclaimed.

use embedded_hal::i2c::I2c;

use crate::curve::MicrostepResolution;
use crate::driver::Pca9685;
use crate::error::ShieldError;
use crate::pins::{LASER_ON_LEVEL, LASER_PIN, MOTOR_COUNT, MOTOR_PINS};
use crate::port::{PwmDevice, PwmPort};
use crate::stepper::{MicroStepper, Stepper};

/// Driver for the SkyPointer motor shield.
///
/// # Lifecycle
///
/// 1. [`MotorShield::new()`]: constructs the shield without bus traffic.
/// 2. [`MotorShield::init()`]: resets the PWM chip and sets the carrier
///    frequency. Required before anything that touches the hardware; this
///    is not checked.
/// 3. [`MotorShield::claim_slot()`]: bind a motor and get a [`Stepper`].
///
/// # Example
///
/// ```no_run
/// use skypointer_motorshield::{Direction, MotorShield, DEFAULT_ADDRESS, DEFAULT_FREQUENCY_HZ};
///
/// # fn example(i2c: impl embedded_hal::i2c::I2c) {
/// let mut shield = MotorShield::new(i2c, DEFAULT_ADDRESS);
/// shield.init(DEFAULT_FREQUENCY_HZ).unwrap();
///
/// let mut azimuth = shield.claim_slot(200, 1).unwrap();
/// azimuth.set_target(1600);
/// while !azimuth.is_at_target() {
///     azimuth.advance_microstep(Direction::Forward).unwrap();
/// }
/// # }
/// ```
pub struct MotorShield<D> {
    port: PwmPort<D>,
    resolution: MicrostepResolution,
    motors: [Option<MicroStepper>; MOTOR_COUNT],
    laser_on_time: u32,
}

impl<I2C> MotorShield<Pca9685<I2C>>
where
    I2C: I2c,
{
    /// Create a shield on its PCA9685 with 16 microsteps per step.
    ///
    /// # Arguments
    /// * `i2c`: I2C peripheral (takes ownership for exclusive access)
    /// * `address`: 7-bit I2C address (typically 0x60)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::from_device(Pca9685::new(i2c, address), MicrostepResolution::default())
    }
}

impl<D> MotorShield<D>
where
    D: PwmDevice,
{
    /// Create a shield on any PWM device with the given microstep resolution.
    pub fn from_device(device: D, resolution: MicrostepResolution) -> Self {
        Self {
            port: PwmPort::new(device),
            resolution,
            motors: [None, None],
            laser_on_time: 0,
        }
    }

    /// Initialise the PWM chip at `frequency_hz` (1600 Hz on the shield)
    /// and clear the laser on-time accumulator.
    ///
    /// # Errors
    /// * [`ShieldError::InvalidFrequency`] if `frequency_hz` is 0
    /// * [`ShieldError::Pwm`] on communication failure
    pub fn init(&mut self, frequency_hz: u16) -> Result<(), ShieldError<D::Error>> {
        self.port.init(frequency_hz)?;
        self.laser_on_time = 0;
        Ok(())
    }

    /// Bind a motor to slot `motor` (1 or 2) and return its handle.
    ///
    /// The first claim fixes the slot's wiring and its revolution length of
    /// `steps_per_rev * microsteps` microsteps. Later claims return the
    /// same slot untouched, even if `steps_per_rev` differs.
    ///
    /// Returns `None` if `motor` is not 1 or 2, or if an unclaimed slot is
    /// claimed with `steps_per_rev == 0`.
    pub fn claim_slot(&mut self, steps_per_rev: u16, motor: u8) -> Option<Stepper<'_, D>> {
        let index = slot_index(motor)?;
        let slot = &mut self.motors[index];

        match slot {
            Some(_existing) => {
                #[cfg(feature = "defmt")]
                {
                    let requested =
                        u32::from(steps_per_rev) * u32::from(self.resolution.microsteps());
                    if _existing.microsteps_per_rev() != requested {
                        defmt::warn!(
                            "motor {} already claimed with {} microsteps/rev; ignoring {} steps/rev",
                            motor,
                            _existing.microsteps_per_rev(),
                            steps_per_rev
                        );
                    }
                }
            }
            None => {
                if steps_per_rev == 0 {
                    return None;
                }
                *slot = Some(MicroStepper::new(
                    index as u8,
                    steps_per_rev,
                    self.resolution,
                    MOTOR_PINS[index],
                ));

                #[cfg(feature = "defmt")]
                defmt::info!("motor {} claimed: {} steps/rev", motor, steps_per_rev);
            }
        }

        let state = slot.as_mut()?;
        Some(Stepper::new(state, &mut self.port))
    }

    /// Handle to an already claimed slot, or `None`.
    pub fn stepper(&mut self, motor: u8) -> Option<Stepper<'_, D>> {
        let index = slot_index(motor)?;
        let state = self.motors[index].as_mut()?;
        Some(Stepper::new(state, &mut self.port))
    }

    /// State of an already claimed slot, or `None`.
    pub fn motor(&self, motor: u8) -> Option<&MicroStepper> {
        self.motors[slot_index(motor)?].as_ref()
    }

    pub fn resolution(&self) -> MicrostepResolution {
        self.resolution
    }

    /// Set a raw channel duty. See [`PwmPort::set_duty`].
    pub fn set_duty(&mut self, channel: u8, value: u16) -> Result<(), ShieldError<D::Error>> {
        self.port.set_duty(channel, value)
    }

    /// Drive a raw channel fully high or low. See [`PwmPort::set_rail`].
    pub fn set_rail(&mut self, channel: u8, high: bool) -> Result<(), ShieldError<D::Error>> {
        self.port.set_rail(channel, high)
    }

    /// Switch the laser on or off.
    ///
    /// Does not touch the on-time accumulator.
    pub fn laser(&mut self, on: bool) -> Result<(), ShieldError<D::Error>> {
        #[cfg(feature = "defmt")]
        defmt::info!("laser {}", if on { "on" } else { "off" });

        self.port.set_rail(LASER_PIN, on == LASER_ON_LEVEL)
    }

    /// Store the laser on-time counter.
    pub fn set_laser_on_time(&mut self, time: u32) {
        self.laser_on_time = time;
    }

    pub fn laser_on_time(&self) -> u32 {
        self.laser_on_time
    }

    /// Borrow the PWM port.
    pub fn port(&self) -> &PwmPort<D> {
        &self.port
    }

    /// Give back the PWM device.
    pub fn into_inner(self) -> D {
        self.port.into_inner()
    }
}

/// Map a 1-based motor number to its slot.
fn slot_index(motor: u8) -> Option<usize> {
    match motor {
        1..=2 => Some(usize::from(motor - 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeI2c, NoDelay, PwmCall, RecordingPwm};
    use crate::registers::{DEFAULT_FREQUENCY_HZ, LED0_ON_L};
    use crate::stepper::Direction;

    fn shield() -> MotorShield<RecordingPwm> {
        MotorShield::from_device(RecordingPwm::new(), MicrostepResolution::Sixteen)
    }

    // ── Claiming ─────────────────────────────────────────────────────

    #[test]
    fn claim_rejects_invalid_motor_numbers() {
        let mut shield = shield();
        assert!(shield.claim_slot(200, 0).is_none());
        assert!(shield.claim_slot(200, 3).is_none());
        assert!(shield.claim_slot(200, 255).is_none());
        assert!(shield.motor(1).is_none());
        assert!(shield.motor(2).is_none());
    }

    #[test]
    fn claim_assigns_fixed_pins_and_revolution() {
        let mut shield = shield();
        {
            let stepper = shield.claim_slot(200, 1).unwrap();
            assert_eq!(stepper.state().slot_index(), 0);
            assert_eq!(stepper.state().microsteps_per_rev(), 3200);
            assert_eq!(stepper.state().pins(), MOTOR_PINS[0]);
        }
        let stepper = shield.claim_slot(48, 2).unwrap();
        assert_eq!(stepper.state().slot_index(), 1);
        assert_eq!(stepper.state().microsteps_per_rev(), 768);
        assert_eq!(stepper.state().pins(), MOTOR_PINS[1]);
    }

    #[test]
    fn second_claim_returns_same_slot_and_ignores_step_count() {
        let mut shield = shield();
        let first_pins = {
            let mut stepper = shield.claim_slot(200, 1).unwrap();
            stepper.set_position(77);
            stepper.set_target(100);
            stepper.state().pins()
        };

        let stepper = shield.claim_slot(400, 1).unwrap();
        assert_eq!(stepper.state().pins(), first_pins);
        assert_eq!(stepper.state().microsteps_per_rev(), 3200);
        assert_eq!(stepper.position(), 77);
        assert_eq!(stepper.target(), 100);
    }

    #[test]
    fn claim_with_zero_steps_leaves_slot_unclaimed() {
        let mut shield = shield();
        assert!(shield.claim_slot(0, 1).is_none());
        assert!(shield.motor(1).is_none());

        // Once claimed, the step count is no longer consulted.
        shield.claim_slot(200, 1).unwrap();
        assert!(shield.claim_slot(0, 1).is_some());
    }

    #[test]
    fn claiming_does_not_touch_the_bus() {
        let mut shield = shield();
        shield.claim_slot(200, 1).unwrap();
        shield.claim_slot(200, 2).unwrap();
        assert!(shield.port().device().calls.is_empty());
    }

    #[test]
    fn stepper_requires_prior_claim() {
        let mut shield = shield();
        assert!(shield.stepper(1).is_none());
        shield.claim_slot(200, 1).unwrap();
        assert!(shield.stepper(1).is_some());
        assert!(shield.stepper(2).is_none());
    }

    // ── Motion through the shield ────────────────────────────────────

    #[test]
    fn full_revolution_at_sixteen_microsteps() {
        let mut shield = shield();
        let mut stepper = shield.claim_slot(200, 1).unwrap();

        let mut position = 0;
        for _ in 0..3200 {
            position = stepper.advance_microstep(Direction::Forward).unwrap();
        }
        assert_eq!(position, 0);
        assert_eq!(stepper.state().phase(), 0);
    }

    #[test]
    fn motors_move_independently() {
        let mut shield = shield();
        shield.claim_slot(200, 1).unwrap().advance(10, Direction::Forward).unwrap();
        shield.claim_slot(200, 2).unwrap().advance(3, Direction::Backward).unwrap();

        assert_eq!(shield.motor(1).unwrap().position(), 10);
        assert_eq!(shield.motor(2).unwrap().position(), 3197);
    }

    #[test]
    fn eight_microstep_shield_uses_eight_step_table() {
        let mut shield = MotorShield::from_device(RecordingPwm::new(), MicrostepResolution::Eight);
        let mut stepper = shield.claim_slot(200, 1).unwrap();
        assert_eq!(stepper.state().microsteps_per_rev(), 1600);
        stepper.advance_microstep(Direction::Forward).unwrap();

        let writes = shield.port().device().pwm_writes();
        assert_eq!(writes[0], (8, 0, 4016));
        assert_eq!(writes[1], (13, 0, 799));
    }

    // ── Laser and accumulator ────────────────────────────────────────

    #[test]
    fn laser_drives_its_rail() {
        let mut shield = shield();
        shield.laser(true).unwrap();
        shield.laser(false).unwrap();

        let on = if LASER_ON_LEVEL { (LASER_PIN, 4096, 0) } else { (LASER_PIN, 0, 0) };
        let off = if LASER_ON_LEVEL { (LASER_PIN, 0, 0) } else { (LASER_PIN, 4096, 0) };
        assert_eq!(shield.port().device().pwm_writes(), [on, off]);
    }

    #[test]
    fn laser_on_time_is_plain_storage() {
        let mut shield = shield();
        assert_eq!(shield.laser_on_time(), 0);
        shield.set_laser_on_time(4_000);
        shield.laser(true).unwrap();
        assert_eq!(shield.laser_on_time(), 4_000);
    }

    #[test]
    fn init_clears_laser_on_time() {
        let mut shield = shield();
        shield.set_laser_on_time(123);
        shield.init(DEFAULT_FREQUENCY_HZ).unwrap();
        assert_eq!(shield.laser_on_time(), 0);
        assert_eq!(shield.port().device().calls[1], PwmCall::Frequency(1600));
    }

    #[test]
    fn raw_duty_saturates_through_shield() {
        let mut shield = shield();
        shield.set_duty(0, 5000).unwrap();
        assert_eq!(shield.port().device().pwm_writes(), [(0, 4096, 0)]);
    }

    // ── Full stack on the PCA9685 ────────────────────────────────────

    #[test]
    fn pca9685_stack_writes_expected_registers() {
        let chip = Pca9685::with_delay(FakeI2c::new(), 0x60, NoDelay::default());
        let mut shield = MotorShield::from_device(chip, MicrostepResolution::Sixteen);
        shield.init(1600).unwrap();
        shield
            .claim_slot(200, 1)
            .unwrap()
            .advance_microstep(Direction::Forward)
            .unwrap();

        let (i2c, _) = shield.into_inner().release();
        let channel = |n: u8| LED0_ON_L + 4 * n;

        // Coil A at table[15] = 4075 = 0x0FEB, coil B at table[1] = 401 = 0x0191.
        assert_eq!(&i2c.registers[channel(8) as usize..][..4], &[0x00, 0x00, 0xEB, 0x0F]);
        assert_eq!(&i2c.registers[channel(13) as usize..][..4], &[0x00, 0x00, 0x91, 0x01]);
        // AIN2 and BIN1 full on, AIN1 and BIN2 off.
        assert_eq!(&i2c.registers[channel(9) as usize..][..4], &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(&i2c.registers[channel(11) as usize..][..4], &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(&i2c.registers[channel(10) as usize..][..4], &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&i2c.registers[channel(12) as usize..][..4], &[0x00, 0x00, 0x00, 0x00]);
        assert!(i2c.writes.iter().all(|(address, _)| *address == 0x60));
    }
}
