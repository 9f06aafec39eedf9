use crate::Result;

/// A sink that accepts an already-encoded pulse/space stream (pulse-first,
/// microseconds, odd length) and pushes it out to IR transmit hardware.
///
/// This is deliberately narrower than [`crate::driver::Driver`]: it only
/// covers the "send already-encoded pulses" half of a driver's contract,
/// which is all `/dev/lircX`-style write-only transmit devices need.
pub trait PulseTransmitter {
    fn send_pulses(&self, pulses: &[u32]) -> Result<()>;
}
