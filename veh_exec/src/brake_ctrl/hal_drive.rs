//! Brake drive channel over an `embedded_hal` PWM pin

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use embedded_hal::PwmPin;
use eqpt_if::{brake::DriveChannel, EqptError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Adapts a HAL PWM pin to a [`DriveChannel`].
///
/// HAL PWM pins don't expose their period, it's fixed when the timer driving them is
/// configured. The channel is told that period on creation and rejects any other.
pub struct HalPwmChannel<P>
where
    P: PwmPin<Duty = u16>
{
    pin: P,
    period_us: u32,
    duty: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P> HalPwmChannel<P>
where
    P: PwmPin<Duty = u16>
{
    /// Wrap a pin whose timer runs at the given period. The pin is enabled at zero duty.
    pub fn new(mut pin: P, period_us: u32) -> Self {
        pin.set_duty(0);
        pin.enable();

        Self { pin, period_us, duty: 0.0 }
    }

    pub fn release(mut self) -> P {
        self.pin.set_duty(0);
        self.pin.disable();
        self.pin
    }
}

impl<P> DriveChannel for HalPwmChannel<P>
where
    P: PwmPin<Duty = u16>
{
    fn set_period_us(&mut self, period_us: u32) -> Result<(), EqptError> {
        if period_us == self.period_us {
            Ok(())
        }
        else {
            Err(EqptError::OutOfRange(period_us as f64))
        }
    }

    fn set_duty(&mut self, duty: f64) -> Result<(), EqptError> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(EqptError::OutOfRange(duty));
        }

        let max = self.pin.get_max_duty();
        self.pin.set_duty((duty * max as f64).round() as u16);
        self.duty = duty;

        Ok(())
    }

    fn duty(&self) -> f64 {
        self.duty
    }
}
