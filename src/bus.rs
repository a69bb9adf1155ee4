//! One request/response round trip against the bus gateway.
//!
//! The gateway always replies with a syntactically valid frame: either
//! real device data or an explicit "nobody answered" sentinel. "No
//! answer" therefore has to be disambiguated from "malformed answer" by
//! trying both known shapes, which is what [`Bus::exchange`] does.

use crate::error::{BuswireError, Result};
use crate::protocol::{hex, DeviceMessage, ResponseFrame, TimeoutIndicator};
use crate::transport::Transport;

/// A handle on the bus, owning the transport to its gateway.
pub struct Bus<T: Transport> {
    transport: T,
}

impl<T: Transport> Bus<T> {
    /// Wrap a connected transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Send `request` and decode the reply as `R`.
    ///
    /// Transport failures propagate unchanged and are not retried here.
    /// If the reply does not parse as `R`, it is re-tried as the timeout
    /// sentinel: a match means the bus reported that no device answered
    /// ([`BuswireError::Timeout`]); a second mismatch re-raises the
    /// original parse error.
    pub async fn exchange<R: ResponseFrame>(&mut self, request: &DeviceMessage) -> Result<R> {
        let frame = request.serialize();
        tracing::trace!("-> {}", hex(&frame));

        let reply = self.transport.request(&frame).await?;
        tracing::trace!("<- {}", hex(&reply));

        match R::parse(&reply) {
            Ok(decoded) => Ok(decoded),
            Err(original @ BuswireError::Parse(_)) => {
                if TimeoutIndicator::parse(&reply).is_ok() {
                    Err(BuswireError::Timeout)
                } else {
                    Err(original)
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Consume the bus, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
