//! Signal output port trait.

use crate::domain::error::OrbscanError;
use crate::domain::signal::Signal;

pub trait SignalSink {
    fn publish(&mut self, signal: &Signal) -> Result<(), OrbscanError>;
}
