//! # Wheel Odometry Interface

/// A quadrature wheel encoder.
///
/// Pulses accumulate from the last call to [`WheelEncoder::reset`] and are signed by the
/// direction of rotation.
pub trait WheelEncoder {
    /// Get the pulses accumulated since the last reset.
    fn pulses(&self) -> i32;

    /// Zero the pulse count.
    fn reset(&mut self);

    /// Read then reset the pulse count, returning the pulses in the interval just finished.
    fn take_pulses(&mut self) -> i32 {
        let p = self.pulses();
        self.reset();
        p
    }
}
