//! Laser pointer demo
//!
//! Drives the SkyPointer mount on a Raspberry Pi Pico 2: walks the laser
//! through a fixed list of (azimuth, elevation) positions, taking the short
//! way round on each axis, and lights the laser for a few seconds at every
//! stop.
//!
//! # Wiring
//!
//! | Signal    | Pico 2 Pin | Notes                        |
//! |-----------|------------|------------------------------|
//! | I2C0 SDA  | GP20       | Motor shield SDA             |
//! | I2C0 SCL  | GP21       | Motor shield SCL             |
//!
//! Motor 1 (azimuth) and motor 2 (elevation) are 200 step/rev steppers.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp as hal;
use embassy_rp::block::ImageDef;
use embassy_rp::i2c::{self, I2c};
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use skypointer_motorshield::{
    Direction, MotorShield, PwmDevice, Stepper, DEFAULT_ADDRESS, DEFAULT_FREQUENCY_HZ,
};

/// Tell the Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = hal::block::ImageDef::secure_exe();

const AZIMUTH: u8 = 1;
const ELEVATION: u8 = 2;

const STEPS_PER_REV: u16 = 200;
const SLEW_RPM: f32 = 6.0;

/// How long the laser stays on at each stop.
const DWELL: Duration = Duration::from_secs(4);

/// Stops as (azimuth, elevation) in absolute microsteps (3200 per rev).
const STOPS: [(u32, u32); 4] = [(0, 400), (800, 600), (1600, 400), (2400, 200)];

/// Shortest direction from the current position to the target, or `None`
/// when already there.
fn direction_to_target<D: PwmDevice>(stepper: &Stepper<'_, D>) -> Option<Direction> {
    if stepper.is_at_target() {
        return None;
    }

    let rev = stepper.state().microsteps_per_rev();
    let ahead = (stepper.target() + rev - stepper.position()) % rev;
    if ahead <= rev / 2 {
        Some(Direction::Forward)
    } else {
        Some(Direction::Backward)
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // --- I2C bus (GP20 = SDA, GP21 = SCL) ---
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, i2c::Config::default());

    // --- Motor shield ---
    let mut shield = MotorShield::new(i2c, DEFAULT_ADDRESS);
    if let Err(e) = shield.init(DEFAULT_FREQUENCY_HZ) {
        error!("Shield init failed: {}", e);
        return;
    }

    for motor in [AZIMUTH, ELEVATION] {
        let mut stepper = shield
            .claim_slot(STEPS_PER_REV, motor)
            .expect("motor numbers are 1 and 2");
        stepper.set_speed(SLEW_RPM);
    }

    let interval = shield
        .motor(AZIMUTH)
        .map(|m| Duration::from_micros(u64::from(m.speed())))
        .unwrap_or(Duration::from_millis(3));

    info!("Laser pointer started, {} us per microstep", interval.as_micros());

    // Main loop: slew to the next stop, light the laser, repeat.
    for (azimuth, elevation) in STOPS.iter().copied().cycle() {
        if let Some(mut stepper) = shield.stepper(AZIMUTH) {
            stepper.set_target(azimuth);
        }
        if let Some(mut stepper) = shield.stepper(ELEVATION) {
            stepper.set_target(elevation);
        }

        loop {
            let mut moving = false;

            for motor in [AZIMUTH, ELEVATION] {
                let Some(mut stepper) = shield.stepper(motor) else {
                    continue;
                };
                if let Some(direction) = direction_to_target(&stepper) {
                    moving = true;
                    if let Err(e) = stepper.advance_microstep(direction) {
                        error!("Motor {} step failed: {}", motor, e);
                    }
                }
            }

            if !moving {
                break;
            }
            Timer::after(interval).await;
        }

        info!("At stop ({}, {})", azimuth, elevation);

        if let Err(e) = shield.laser(true) {
            error!("Laser on failed: {}", e);
        }
        Timer::after(DWELL).await;
        if let Err(e) = shield.laser(false) {
            error!("Laser off failed: {}", e);
        }
    }
}
