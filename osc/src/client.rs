use crate::wire;
use lifesong_core::Record;
use rosc::{OscMessage, OscPacket};
use std::net::{Ipv4Addr, ToSocketAddrs, UdpSocket};

/// Sends records to a listening composer, one OSC message per field.
pub struct OscClient {
    socket: UdpSocket,
}

impl OscClient {
    pub fn new<A: ToSocketAddrs>(addrs: A) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(addrs)?;
        Ok(Self { socket })
    }

    pub fn send_message(&self, message: OscMessage) -> anyhow::Result<()> {
        let buf = match rosc::encoder::encode(&OscPacket::Message(message)) {
            Ok(buf) => buf,
            Err(e) => anyhow::bail!("{e:?}"),
        };
        self.socket.send(&buf)?;
        Ok(())
    }

    pub fn send_record(&self, record: &Record) -> anyhow::Result<()> {
        for message in wire::encode_record(record) {
            log::info!("sending {} {:?}", message.addr, message.args);
            self.send_message(message)?;
        }
        Ok(())
    }
}
