use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use crate::device::PulseTransmitter;
use crate::{Error, Result};

/// Transmits pulses to the kernel's `/dev/lircX` device by writing the
/// raw alternating pulse/space microsecond stream directly, the same
/// write(2) interface `lirc-tools`' `irsend` uses against a `LIRC_MODE_PULSE`
/// device. See README.md for how to enable `/dev/lircX` on the target board.
pub struct CirPulseTransmitter {
    tx_device: Mutex<File>,
}

impl CirPulseTransmitter {
    /// Opens the transmit device at `tx_device_path` (e.g. `/dev/lirc0`)
    /// for writing.
    pub fn new(tx_device_path: impl AsRef<Path>) -> Result<Self> {
        let tx_device = OpenOptions::new().write(true).open(tx_device_path)?;
        Ok(Self {
            tx_device: Mutex::new(tx_device),
        })
    }
}

impl PulseTransmitter for CirPulseTransmitter {
    /// Writes `pulses` (pulse-first, alternating pulse/space microsecond
    /// magnitudes) to the device as native-endian `u32`s in one `write`.
    fn send_pulses(&self, pulses: &[u32]) -> Result<()> {
        let mut tx_device = self
            .tx_device
            .lock()
            .map_err(|e| Error::Transmitting(format!("lock error: {e}")))?;

        let mut bytes = Vec::with_capacity(pulses.len() * 4);
        for &p in pulses {
            bytes.extend_from_slice(&p.to_ne_bytes());
        }
        tx_device
            .write_all(&bytes)
            .map_err(|e| Error::Transmitting(e.to_string()))?;
        Ok(())
    }
}
