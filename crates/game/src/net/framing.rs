use std::io::{self, ErrorKind, Read, Write};

use rkyv::rancor;

use super::protocol::WireObject;

/// Largest payload a single frame may carry, in bytes.
pub const MAX_OBJECT_SIZE: usize = 20 * 1024;

const LENGTH_PREFIX: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("encoded object is {size} bytes, limit is {max}")]
    EncodingTooLarge { size: usize, max: usize },
    #[error("frame length {length} exceeds limit of {max} bytes")]
    Framing { length: u32, max: usize },
    #[error("encoding failed: {0}")]
    Encoding(rancor::Error),
    #[error("decoding failed: {0}")]
    Decoding(rancor::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("handshake rejected")]
    Handshake,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// True when the peer went away rather than misbehaving.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::Io(err) => matches!(
                err.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
                    | ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

/// Length-prefixed object stream over an ordered byte transport.
///
/// Each frame is a little-endian `u32` payload length followed by the rkyv
/// archive of one object. Any error leaves the stream at an unknown position,
/// so callers drop the channel after the first failure.
#[derive(Debug)]
pub struct FramedChannel<S> {
    stream: S,
}

impl<S: Read + Write> FramedChannel<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Encodes `object` and writes it as one frame.
    ///
    /// Nothing is written when the encoding is larger than [`MAX_OBJECT_SIZE`].
    pub fn send_object<T: WireObject>(&mut self, object: &T) -> Result<(), ChannelError> {
        let payload = object.encode().map_err(ChannelError::Encoding)?;
        if payload.len() > MAX_OBJECT_SIZE {
            return Err(ChannelError::EncodingTooLarge {
                size: payload.len(),
                max: MAX_OBJECT_SIZE,
            });
        }

        let mut frame = Vec::with_capacity(LENGTH_PREFIX + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);
        self.write_raw(&frame)
    }

    /// Reads one frame and decodes it as `T`.
    pub fn receive_object<T: WireObject>(&mut self) -> Result<T, ChannelError> {
        let mut prefix = [0u8; LENGTH_PREFIX];
        self.read_exact(&mut prefix)?;

        let length = u32::from_le_bytes(prefix);
        if length as usize > MAX_OBJECT_SIZE {
            return Err(ChannelError::Framing {
                length,
                max: MAX_OBJECT_SIZE,
            });
        }

        let mut payload = vec![0u8; length as usize];
        self.read_exact(&mut payload)?;
        T::decode(&payload).map_err(ChannelError::Decoding)
    }

    /// Fills `buf` completely, failing with [`ChannelError::ConnectionClosed`]
    /// if the peer closes first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ChannelError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => return Err(ChannelError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Writes `bytes` unframed and flushes.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{ClientMessage, EntityState, ServerMessage, WorldUpdate};
    use std::io::Cursor;

    /// Hands out at most one byte per read, with an interruption in between.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupt: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn crowded_update(count: u32) -> ServerMessage {
        let mut update = WorldUpdate::new(1);
        update.entities = (0..count)
            .map(|entity_id| EntityState {
                entity_id,
                ..Default::default()
            })
            .collect();
        ServerMessage::WorldUpdate(update)
    }

    fn written(channel: FramedChannel<Cursor<Vec<u8>>>) -> Vec<u8> {
        channel.into_inner().into_inner()
    }

    #[test]
    fn frame_is_le_length_then_payload() {
        let mut channel = FramedChannel::new(Cursor::new(Vec::new()));
        channel.send_object(&ClientMessage::Ping { timestamp_ms: 42 }).unwrap();

        let bytes = written(channel);
        let length = u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(length, bytes.len() - 4);
        assert_eq!(
            ClientMessage::decode(&bytes[4..]).unwrap(),
            ClientMessage::Ping { timestamp_ms: 42 }
        );
    }

    #[test]
    fn consecutive_frames_read_back_in_order() {
        let mut writer = FramedChannel::new(Cursor::new(Vec::new()));
        let sent = [
            ClientMessage::Ping { timestamp_ms: 1 },
            ClientMessage::Disconnect,
            ClientMessage::Ping { timestamp_ms: 2 },
        ];
        for message in &sent {
            writer.send_object(message).unwrap();
        }

        let mut reader = FramedChannel::new(Cursor::new(written(writer)));
        for message in &sent {
            assert_eq!(&reader.receive_object::<ClientMessage>().unwrap(), message);
        }
        assert!(matches!(
            reader.receive_object::<ClientMessage>(),
            Err(ChannelError::ConnectionClosed)
        ));
    }

    #[test]
    fn short_reads_are_accumulated() {
        let mut writer = FramedChannel::new(Cursor::new(Vec::new()));
        let message = crowded_update(12);
        writer.send_object(&message).unwrap();

        let mut reader = FramedChannel::new(Trickle {
            data: written(writer),
            pos: 0,
            interrupt: false,
        });
        assert_eq!(reader.receive_object::<ServerMessage>().unwrap(), message);
    }

    #[test]
    fn oversized_object_writes_nothing() {
        let mut channel = FramedChannel::new(Cursor::new(Vec::new()));
        let err = channel.send_object(&crowded_update(1000)).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::EncodingTooLarge { size, max: MAX_OBJECT_SIZE } if size > MAX_OBJECT_SIZE
        ));
        assert!(written(channel).is_empty());
    }

    #[test]
    fn inbound_length_over_limit_is_framing_error() {
        let mut bytes = ((MAX_OBJECT_SIZE + 1) as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 64]);
        let mut channel = FramedChannel::new(Cursor::new(bytes));
        assert!(matches!(
            channel.receive_object::<ClientMessage>(),
            Err(ChannelError::Framing { length, .. }) if length as usize == MAX_OBJECT_SIZE + 1
        ));
    }

    #[test]
    fn truncated_payload_is_connection_closed() {
        let mut writer = FramedChannel::new(Cursor::new(Vec::new()));
        writer.send_object(&crowded_update(4)).unwrap();
        let mut bytes = written(writer);
        bytes.truncate(bytes.len() - 3);

        let mut reader = FramedChannel::new(Cursor::new(bytes));
        let err = reader.receive_object::<ServerMessage>().unwrap_err();
        assert!(matches!(err, ChannelError::ConnectionClosed));
        assert!(err.is_disconnect());
    }

    #[test]
    fn garbage_payload_is_decoding_error() {
        let mut bytes = 16u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xAB; 16]);
        let mut channel = FramedChannel::new(Cursor::new(bytes));
        let err = channel.receive_object::<ServerMessage>().unwrap_err();
        assert!(matches!(err, ChannelError::Decoding(_)));
        assert!(!err.is_disconnect());
    }
}
