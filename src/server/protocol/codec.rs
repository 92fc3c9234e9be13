//! Length-prefixed envelope framing.
//!
//! A frame is a 4-byte little-endian body length followed by exactly that
//! many bytes of JSON. The length is checked against [`MAX_MESSAGE_SIZE`]
//! before any body byte is read, so an oversized prefix never causes an
//! allocation. Every decode error is fatal to the connection that produced it.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::server::MAX_MESSAGE_SIZE;
use crate::server::protocol::envelope::Envelope;

const LEN_PREFIX: usize = 4;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Stream closed before a whole prefix or body was available
    #[error("truncated frame")]
    Truncated,

    /// Advertised or produced body larger than the frame limit
    #[error("frame body of {0} bytes exceeds the {max} byte limit", max = MAX_MESSAGE_SIZE)]
    OversizedMessage(usize),

    /// Body is not a valid envelope
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Truncated
        } else {
            CodecError::Io(e)
        }
    }
}

/// Serialize an envelope into one complete frame.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    let body = serde_json::to_vec(envelope)?;
    if body.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::OversizedMessage(body.len()));
    }
    let mut frame = Vec::with_capacity(LEN_PREFIX + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Read exactly one frame from `reader`.
pub async fn decode<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Envelope, CodecError> {
    let mut prefix = [0u8; LEN_PREFIX];
    reader.read_exact(&mut prefix).await?;
    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(CodecError::OversizedMessage(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Encode and write one envelope, then flush.
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &Envelope,
) -> Result<(), CodecError> {
    let frame = encode(envelope)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Incremental decoder for transports that deliver bytes in arbitrary
/// chunks (WebSocket binary messages). Frames may span chunks.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet consumed by a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete envelope, `Ok(None)` if more bytes are needed.
    pub fn next_envelope(&mut self) -> Result<Option<Envelope>, CodecError> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }
        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(&self.buf[..LEN_PREFIX]);
        let len = u32::from_le_bytes(prefix) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(CodecError::OversizedMessage(len));
        }
        if self.buf.len() < LEN_PREFIX + len {
            return Ok(None);
        }
        let envelope = serde_json::from_slice(&self.buf[LEN_PREFIX..LEN_PREFIX + len])?;
        self.buf.drain(..LEN_PREFIX + len);
        Ok(Some(envelope))
    }

    /// Called when the transport closes: leftover bytes mean a cut frame.
    pub fn finish(&self) -> Result<(), CodecError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Envelope {
        Envelope::new("PLAY_CARD", json!({ "cardIndex": 2 }))
    }

    #[tokio::test]
    async fn test_roundtrip() {
        for envelope in [sample(), Envelope::bare("PROMPT_INPUT")] {
            let frame = encode(&envelope).unwrap();
            let mut reader: &[u8] = &frame;
            assert_eq!(decode(&mut reader).await.unwrap(), envelope);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_prefix_is_little_endian() {
        let frame = encode(&sample()).unwrap();
        let body_len = frame.len() - LEN_PREFIX;
        assert_eq!(frame[..4], (body_len as u32).to_le_bytes());
    }

    #[tokio::test]
    async fn test_oversized_prefix_leaves_body_unread() {
        let body = vec![b' '; 16];
        let mut frame = ((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec();
        frame.extend_from_slice(&body);

        let mut reader: &[u8] = &frame;
        let err = decode(&mut reader).await.unwrap_err();
        assert!(matches!(err, CodecError::OversizedMessage(n) if n == MAX_MESSAGE_SIZE + 1));
        assert_eq!(reader.len(), body.len());
    }

    #[tokio::test]
    async fn test_truncated_prefix_and_body() {
        let mut short: &[u8] = &[1, 0];
        assert!(matches!(decode(&mut short).await, Err(CodecError::Truncated)));

        let frame = encode(&sample()).unwrap();
        let mut cut: &[u8] = &frame[..frame.len() - 1];
        assert!(matches!(decode(&mut cut).await, Err(CodecError::Truncated)));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let body = b"{\"payload\":1}";
        let mut frame = (body.len() as u32).to_le_bytes().to_vec();
        frame.extend_from_slice(body);
        let mut reader: &[u8] = &frame;
        assert!(matches!(decode(&mut reader).await, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_encode_rejects_oversized_envelope() {
        let big = Envelope::new("X", json!("a".repeat(MAX_MESSAGE_SIZE)));
        assert!(matches!(encode(&big), Err(CodecError::OversizedMessage(_))));
    }

    #[test]
    fn test_frame_decoder_handles_split_frames() {
        let mut stream = encode(&sample()).unwrap();
        stream.extend(encode(&Envelope::bare("VIEW_DECK")).unwrap());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&stream[..3]);
        assert!(decoder.next_envelope().unwrap().is_none());
        decoder.extend(&stream[3..]);
        assert_eq!(decoder.next_envelope().unwrap(), Some(sample()));
        assert_eq!(decoder.next_envelope().unwrap(), Some(Envelope::bare("VIEW_DECK")));
        assert!(decoder.next_envelope().unwrap().is_none());
        assert!(decoder.finish().is_ok());

        decoder.extend(&[9, 0]);
        assert!(matches!(decoder.finish(), Err(CodecError::Truncated)));
    }

    #[test]
    fn test_one_websocket_message_can_batch_large_envelopes() {
        use crate::config::server::WS_MAX_FRAME_SIZE;

        let large = |kind: &str| Envelope::new(kind, json!("x".repeat(MAX_MESSAGE_SIZE - 64)));
        let mut message = Vec::new();
        for kind in ["A", "B", "C"] {
            message.extend(encode(&large(kind)).unwrap());
        }
        assert!(message.len() > MAX_MESSAGE_SIZE + LEN_PREFIX);
        assert!(message.len() <= WS_MAX_FRAME_SIZE);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&message);
        for kind in ["A", "B", "C"] {
            assert_eq!(decoder.next_envelope().unwrap().map(|e| e.kind), Some(kind.to_string()));
        }
        assert_eq!(decoder.pending(), 0);
    }
}
