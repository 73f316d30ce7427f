//! Sine-weighted coil current profile for microstepping.
//!
//! One electrical cycle of a two-phase stepper is split into four
//! quadrants of `N` microsteps each (`N` = microsteps per full step). Inside
//! a quadrant the two coil currents follow a quarter sine and a quarter
//! cosine, read from the same monotonic table of `N + 1` amplitudes: one
//! coil walks the table forwards while the other walks it backwards.
//!
//! ```text
//! quadrant | coil A duty         | coil B duty         | latch
//! ---------+---------------------+---------------------+-------
//!    0     | table[N - p]        | table[p]            | 0b0011
//!    1     | table[p - N]        | table[2N - p]       | 0b0110
//!    2     | table[3N - p]       | table[p - 2N]       | 0b1100
//!    3     | table[p - 3N]       | table[4N - p]       | 0b1001
//! ```
//!
//! Latch bits select the energised bridge inputs: bit 0 = AIN2,
//! bit 1 = BIN1, bit 2 = AIN1, bit 3 = BIN2.

/// 8 microsteps per step: round(4095 · sin(i · π / 16)).
const CURVE_8: [u16; 9] = [0, 799, 1567, 2275, 2896, 3405, 3783, 4016, 4095];

/// 16 microsteps per step: round(4095 · sin(i · π / 32)).
const CURVE_16: [u16; 17] = [
    0, 401, 799, 1189, 1567, 1930, 2275, 2598, 2896, 3165, 3405, 3611, 3783, 3919, 4016, 4075,
    4095,
];

/// Latch bit driving AIN2.
pub const LATCH_AIN2: u8 = 0x01;
/// Latch bit driving BIN1.
pub const LATCH_BIN1: u8 = 0x02;
/// Latch bit driving AIN1.
pub const LATCH_AIN1: u8 = 0x04;
/// Latch bit driving BIN2.
pub const LATCH_BIN2: u8 = 0x08;

const QUADRANT_LATCH: [u8; 4] = [
    LATCH_AIN2 | LATCH_BIN1,
    LATCH_BIN1 | LATCH_AIN1,
    LATCH_AIN1 | LATCH_BIN2,
    LATCH_BIN2 | LATCH_AIN2,
];

/// Number of microsteps per full step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MicrostepResolution {
    /// 8 microsteps per step.
    Eight,
    /// 16 microsteps per step.
    #[default]
    Sixteen,
}

impl MicrostepResolution {
    /// Microsteps per full step.
    pub const fn microsteps(self) -> u16 {
        match self {
            MicrostepResolution::Eight => 8,
            MicrostepResolution::Sixteen => 16,
        }
    }

    /// Length of the excitation cycle (four quadrants).
    pub const fn cycle_len(self) -> u16 {
        4 * self.microsteps()
    }

    /// The excitation table for this resolution.
    pub const fn curve(self) -> MicrostepCurve {
        match self {
            MicrostepResolution::Eight => MicrostepCurve { table: &CURVE_8 },
            MicrostepResolution::Sixteen => MicrostepCurve { table: &CURVE_16 },
        }
    }
}

/// Quarter-period amplitude table, `microsteps + 1` entries from 0 to 4095.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicrostepCurve {
    table: &'static [u16],
}

impl MicrostepCurve {
    /// Microsteps per full step covered by this table.
    pub fn microsteps(&self) -> u16 {
        (self.table.len() - 1) as u16
    }

    /// The raw amplitudes.
    pub fn table(&self) -> &'static [u16] {
        self.table
    }

    /// Coil excitation for a phase in `[0, 4 * microsteps)`. Out-of-range
    /// phases are reduced modulo the cycle length first.
    pub fn excitation(&self, phase: u16) -> Excitation {
        Excitation::for_phase(self, phase)
    }
}

/// Duty pair and bridge latch for one microstep phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Excitation {
    /// Duty for coil A's PWM channel.
    pub duty_a: u16,
    /// Duty for coil B's PWM channel.
    pub duty_b: u16,
    /// Energised bridge inputs, see the `LATCH_*` bits.
    pub latch: u8,
}

impl Excitation {
    /// Compute the excitation for `phase`.
    ///
    /// A phase on a quadrant boundary belongs to the quadrant it enters.
    pub fn for_phase(curve: &MicrostepCurve, phase: u16) -> Self {
        let n = curve.microsteps();
        let p = phase % (4 * n);
        let quadrant = p / n;
        let t = curve.table;

        let (a, b) = match quadrant {
            0 => (n - p, p),
            1 => (p - n, 2 * n - p),
            2 => (3 * n - p, p - 2 * n),
            _ => (p - 3 * n, 4 * n - p),
        };

        Self {
            duty_a: t[a as usize],
            duty_b: t[b as usize],
            latch: QUADRANT_LATCH[quadrant as usize],
        }
    }

    /// Whether the bridge input behind `bit` is driven high.
    pub fn is_latched(&self, bit: u8) -> bool {
        self.latch & bit != 0
    }
}
