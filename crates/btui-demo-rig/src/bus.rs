#![forbid(unsafe_code)]

//! The rig's pin bus.
//!
//! The real bench rig hangs a DAC, a row/column cursor matrix, a trigger
//! line and a handful of SPI-style enables off one 32-bit GPIO bank. The
//! demo keeps the same register picture behind [`RigBus`] so the screens
//! read and write pins exactly as the firmware would, with [`SimBus`]
//! standing in for the hardware.

/// Bit positions within the pin register.
pub mod pin {
    /// DAC value, 8 bits.
    pub const VDAC_BASE: u32 = 0;
    /// Cursor row select, 4 bits.
    pub const ROW_A_BASE: u32 = 8;
    /// Cursor column select, 4 bits.
    pub const COL_A_BASE: u32 = 12;
    pub const DAC_EN: u32 = 16;
    pub const TRIG: u32 = 17;
    pub const SPI_CLK: u32 = 18;
    pub const SPI_DOUT: u32 = 19;
    pub const SPI_COL_EN: u32 = 20;
    pub const SPI_ALL_EN: u32 = 21;
    pub const SPARE: u32 = 22;
    pub const DAC_WR: u32 = 26;
    /// DAC unit select, 2 bits.
    pub const DAC_SEL_BASE: u32 = 27;
}

/// One 32-bit bank of rig pins.
pub trait RigBus {
    /// Snapshot of the whole register.
    fn read_all(&self) -> u32;

    /// Set the bits selected by `mask` to `bits`, leaving the rest alone.
    fn write_masked(&mut self, mask: u32, bits: u32);

    /// Drive a single pin.
    fn write_pin(&mut self, pin: u32, high: bool) {
        self.write_masked(1 << pin, u32::from(high) << pin);
    }

    /// Read back a single pin.
    fn read_pin(&self, pin: u32) -> bool {
        self.read_all() & (1 << pin) != 0
    }
}

/// In-memory [`RigBus`] with every pin low at power-on.
#[derive(Debug, Default)]
pub struct SimBus {
    register: u32,
}

impl SimBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RigBus for SimBus {
    fn read_all(&self) -> u32 {
        self.register
    }

    fn write_masked(&mut self, mask: u32, bits: u32) {
        self.register = (self.register & !mask) | (bits & mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_writes_leave_other_bits_alone() {
        let mut bus = SimBus::new();
        bus.write_masked(0xFF << pin::VDAC_BASE, 0xAB << pin::VDAC_BASE);
        bus.write_masked(0xF << pin::ROW_A_BASE, 0x5 << pin::ROW_A_BASE);
        assert_eq!((bus.read_all() >> pin::VDAC_BASE) & 0xFF, 0xAB);
        assert_eq!((bus.read_all() >> pin::ROW_A_BASE) & 0xF, 0x5);

        bus.write_masked(0xFF << pin::VDAC_BASE, 0);
        assert_eq!((bus.read_all() >> pin::VDAC_BASE) & 0xFF, 0);
        assert_eq!((bus.read_all() >> pin::ROW_A_BASE) & 0xF, 0x5);
    }

    #[test]
    fn single_pins_read_back() {
        let mut bus = SimBus::new();
        assert!(!bus.read_pin(pin::TRIG));
        bus.write_pin(pin::TRIG, true);
        assert!(bus.read_pin(pin::TRIG));
        assert!(!bus.read_pin(pin::DAC_EN));
        bus.write_pin(pin::TRIG, false);
        assert_eq!(bus.read_all(), 0);
    }
}
