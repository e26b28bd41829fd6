//! [`PulseSink`] implementation for the PCA9685 servo driver board

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Channel, Pca9685};

// Internal
use ctrl_if::stages::{PulseSink, SinkError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Prescale value for the standard 50 Hz servo/ESC signal
/// (25 MHz oscillator / 4096 counts / 50 Hz - 1).
const PRESCALE_50_HZ: u8 = 121;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pulse sink backed by an Adafruit PCA9685 16 channel driver board.
pub struct Pca9685Sink<I2C> {
    pca: Pca9685<I2C>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<I2C, E> Pca9685Sink<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    /// Initialise the board at the given I2C address and set it up for
    /// 50 Hz output.
    pub fn new(i2c: I2C, address: u8) -> Result<Self, SinkError> {
        let mut pca = Pca9685::new(i2c, address).map_err(map_pca_error)?;

        pca.set_prescale(PRESCALE_50_HZ).map_err(map_pca_error)?;
        pca.enable().map_err(map_pca_error)?;

        Ok(Self { pca })
    }
}

impl<I2C, E> PulseSink for Pca9685Sink<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    fn set_duty_cycle(&mut self, channel: u8, duty_cycle: u16) -> Result<(), SinkError> {
        let channel = channel_from_id(channel)?;

        // The board's counters are 12 bit, the interface encoding 16 bit
        let off_count = duty_cycle >> 4;

        self.pca
            .set_channel_on_off(channel, 0, off_count)
            .map_err(map_pca_error)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a driver error into a sink error.
fn map_pca_error<E>(error: pwm_pca9685::Error<E>) -> SinkError {
    match error {
        pwm_pca9685::Error::I2C(_) => SinkError::I2c,
        pwm_pca9685::Error::InvalidInputData => SinkError::InvalidDutyCycle
    }
}

/// Map a numeric channel id onto a board channel.
fn channel_from_id(id: u8) -> Result<Channel, SinkError> {
    let channel = match id {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return Err(SinkError::InvalidChannel(id))
    };

    Ok(channel)
}
