use crate::wire::{self, RecordBuilder, WireError};
use anyhow::Context;
use lifesong_core::Record;
use rosc::{OscMessage, OscPacket};
use std::{
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    time::{Duration, Instant},
};

const BUF_SIZE: usize = 1536;

/// Waits for the fields of one record to arrive as OSC messages over UDP.
pub struct OscRecordReceiver {
    socket: UdpSocket,
    buf_raw: Vec<u8>,
}

fn flatten(packet: OscPacket, messages: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(message) => messages.push(message),
        OscPacket::Bundle(bundle) => {
            for packet in bundle.content {
                flatten(packet, messages);
            }
        }
    }
}

impl OscRecordReceiver {
    pub fn new<A: ToSocketAddrs>(addrs: A) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addrs)?;
        let buf_raw = vec![0; BUF_SIZE];
        Ok(Self { socket, buf_raw })
    }

    pub fn local_socket_address(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Returns `Ok(None)` when the read timed out or the datagram was unusable.
    fn recv_packet(&mut self) -> Result<Option<OscPacket>, io::Error> {
        let size = match self.socket.recv(&mut self.buf_raw) {
            Ok(size) => size,
            Err(error) => {
                return match error.kind() {
                    // Which of these a timeout produces depends on the platform.
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Ok(None),
                    _ => Err(error),
                };
            }
        };
        if size >= BUF_SIZE {
            log::warn!("UDP message too long for buffer!");
            return Ok(None);
        }
        match rosc::decoder::decode_udp(&self.buf_raw[..size]) {
            Ok((_, packet)) => Ok(Some(packet)),
            Err(e) => {
                log::warn!("Failed to decode OSC packet: {e:?}");
                Ok(None)
            }
        }
    }

    fn accept(builder: &mut RecordBuilder, message: &OscMessage) -> anyhow::Result<()> {
        match wire::decode_field(message) {
            Ok(value) => {
                let field = value.field();
                log::info!("received {}: {:?}", field, message.args);
                if builder.set(value) {
                    log::warn!("{} received again, keeping the latest value", field);
                }
                Ok(())
            }
            Err(WireError::UnknownAddress(address)) => {
                log::warn!("ignoring message to unknown address {}", address);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("bad message to {}", message.addr)),
        }
    }

    /// Blocks until all seven fields have arrived. With a `timeout`, gives up once it has
    /// elapsed, reporting the fields still missing. A timeout too long to represent as an
    /// instant never expires.
    pub fn receive_record(&mut self, timeout: Option<Duration>) -> anyhow::Result<Record> {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut builder = RecordBuilder::new();
        let mut messages = Vec::new();
        log::info!(
            "waiting for a record on {}",
            self.local_socket_address()?
        );
        while !builder.is_complete() {
            let read_timeout = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(WireError::Missing(builder.missing()))
                            .context("timed out waiting for a record");
                    }
                    Some(remaining)
                }
                None => None,
            };
            self.socket.set_read_timeout(read_timeout)?;
            if let Some(packet) = self.recv_packet()? {
                flatten(packet, &mut messages);
                for message in messages.drain(..) {
                    Self::accept(&mut builder, &message)?;
                }
            }
        }
        Ok(builder.build()?)
    }
}
