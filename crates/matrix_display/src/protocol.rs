//! Datagram framing for the matrix emulator.
//!
//! Byte 0 is the opcode, followed by big-endian 32-bit integer arguments.
//! Handshake and present carry no arguments and are zero-padded to
//! [`PACKET_SIZE`].

use bytes::{BufMut, Bytes, BytesMut};
use common::Rgb;

/// Size of the handshake and present datagrams.
pub const PACKET_SIZE: usize = 50;

pub const OP_HANDSHAKE: u8 = 0;
pub const OP_BRIGHTNESS: u8 = 1;
pub const OP_SET_PIXEL: u8 = 2;
pub const OP_PRESENT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Handshake,
    Brightness(f32),
    SetPixel { x: usize, y: usize, color: Rgb },
    Present,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Handshake => OP_HANDSHAKE,
            Command::Brightness(_) => OP_BRIGHTNESS,
            Command::SetPixel { .. } => OP_SET_PIXEL,
            Command::Present => OP_PRESENT,
        }
    }

    pub fn encode(&self) -> Bytes {
        match *self {
            Command::Handshake | Command::Present => {
                let mut buf = BytesMut::zeroed(PACKET_SIZE);
                buf[0] = self.opcode();
                buf.freeze()
            }
            Command::Brightness(level) => {
                let mut buf = BytesMut::with_capacity(5);
                buf.put_u8(OP_BRIGHTNESS);
                buf.put_i32(brightness_level(level));
                buf.freeze()
            }
            Command::SetPixel { x, y, color } => {
                let mut buf = BytesMut::with_capacity(1 + 5 * 4);
                buf.put_u8(OP_SET_PIXEL);
                for v in [x as i32, y as i32, color.r.into(), color.g.into(), color.b.into()] {
                    buf.put_i32(v);
                }
                buf.freeze()
            }
        }
    }
}

/// Brightness on the wire: `round(level * 255)`, level clamped to 0..=1.
pub fn brightness_level(level: f32) -> i32 {
    (level.clamp(0.0, 1.0) * 255.0).round() as i32
}
