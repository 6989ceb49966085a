pub mod wire;
pub use wire::{
    Field, FieldValue, RecordBuilder, SENTINEL, WireError, decode_field, encode_record,
};
mod receiver;
pub use receiver::OscRecordReceiver;
mod client;
pub use client::OscClient;

pub use rosc::{OscMessage, OscPacket, OscType};

/// Where a composer listens unless told otherwise.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:4560";
