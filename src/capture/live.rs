//! Live capture through `pnet` datalink channels.

use bytes::Bytes;
use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use tracing::info;

use snoopy_core::io::{now_ns, PacketReader, RawPacket, MAX_PACKET_LEN};
use snoopy_core::Error;

use crate::error::CaptureError;

/// First interface that is up, not loopback, and has a MAC address.
pub fn default_interface() -> Result<NetworkInterface, CaptureError> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.is_up() && !iface.is_loopback() && iface.mac.is_some())
        .ok_or(CaptureError::NoInterface)
}

pub fn find_interface(name: &str) -> Result<NetworkInterface, CaptureError> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| CaptureError::InterfaceNotFound(name.to_string()))
}

/// Promiscuous Ethernet capture on one interface.
pub struct LiveCapture {
    rx: Box<dyn DataLinkReceiver>,
    frame_number: u64,
}

impl LiveCapture {
    /// Open the interface, buffering roughly `read_ahead` packets in the kernel.
    pub fn open(iface: &NetworkInterface, read_ahead: usize) -> anyhow::Result<Self> {
        let config = datalink::Config {
            read_buffer_size: read_ahead.saturating_mul(MAX_PACKET_LEN),
            promiscuous: true,
            ..Default::default()
        };
        let rx = match datalink::channel(iface, config)? {
            Channel::Ethernet(_tx, rx) => rx,
            _ => return Err(CaptureError::UnsupportedChannel(iface.name.clone()).into()),
        };
        info!(interface = %iface.name, "capturing");
        Ok(Self {
            rx,
            frame_number: 0,
        })
    }
}

impl PacketReader for LiveCapture {
    fn next_packet(&mut self) -> Result<Option<RawPacket>, Error> {
        let frame = self.rx.next()?;
        self.frame_number += 1;
        Ok(Some(RawPacket {
            frame_number: self.frame_number,
            timestamp_ns: now_ns(),
            original_len: frame.len() as u32,
            data: Bytes::copy_from_slice(frame),
        }))
    }
}
