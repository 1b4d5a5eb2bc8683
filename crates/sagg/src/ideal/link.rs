//! In-memory transport for in-process two-party runs.

use crate::Error;
use sagg_traits::Exchange;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One endpoint of an in-memory duplex link.
///
/// Each [`Exchange::exchange`] call is one full round: the outgoing buffer
/// is queued to the peer and the call blocks until the peer's buffer for
/// the same round arrives. Both endpoints send before they receive, so two
/// parties calling `exchange` concurrently always make progress.
pub struct LocalLink {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl LocalLink {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (LocalLink, LocalLink) {
        let (tx_a, rx_b) = channel();
        let (tx_b, rx_a) = channel();
        (
            LocalLink { tx: tx_a, rx: rx_a },
            LocalLink { tx: tx_b, rx: rx_b },
        )
    }
}

impl Exchange for LocalLink {
    type Error = Error;

    fn exchange(&mut self, outgoing: &[u8]) -> Result<Vec<u8>, Error> {
        self.tx
            .send(outgoing.to_vec())
            .map_err(|_| Error::transport("peer endpoint dropped"))?;
        self.rx
            .recv()
            .map_err(|_| Error::transport("peer endpoint dropped"))
    }
}
