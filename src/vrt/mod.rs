//! VRT packet framing: reads one packet from the data socket and classifies
//! it as IF-data, receiver-context, digitizer-context or extension.

pub mod context;
pub mod header;
pub mod sample;

use tracing::{trace, warn};

use crate::error::ProtocolError;
use crate::transport::Socket;

pub use context::{DigitizerContext, ExtensionPacket, ReceiverContext};
pub use header::{PacketType, StreamId, Timestamp, VrtHeader, VrtTrailer};
pub use sample::Samples;

use header::{
    context_stream_kind, parse_prefix, parse_stream_id, VRT_HEADER_WORDS, VRT_TRAILER_WORDS,
};

/// One packet off the data socket, fully decoded.
#[derive(Debug, Clone)]
pub enum VrtPacket {
    IfData {
        header: VrtHeader,
        trailer: VrtTrailer,
        samples: Samples,
    },
    Receiver(ReceiverContext),
    Digitizer(DigitizerContext),
    Extension(ExtensionPacket),
}

/// Tracks the expected wrapping packet-count per stream so loss can be
/// detected without ever treating a mismatch as fatal.
#[derive(Debug, Default)]
pub struct PacketCounter {
    expected: Option<u8>,
}

impl PacketCounter {
    pub fn observe(&mut self, actual: u8) {
        if let Some(expected) = self.expected {
            if expected != actual {
                warn!(expected, actual, "VRT packet-count mismatch, resyncing");
            }
        }
        self.expected = Some((actual + 1) & 0x0f);
    }
}

/// Reads exactly one VRT packet from `socket`.
pub fn read_packet(socket: &mut Socket) -> Result<VrtPacket, crate::error::Error> {
    let mut prefix_buf = [0u8; 4];
    socket.recv_exact(&mut prefix_buf)?;
    let (_, prefix) = parse_prefix(&prefix_buf).expect("4-byte prefix parse is infallible");

    let mut stream_id_buf = [0u8; 4];
    socket.recv_exact(&mut stream_id_buf)?;
    let (_, stream_word) = parse_stream_id(&stream_id_buf).expect("4-byte u32 parse is infallible");

    let payload_words = prefix.packet_size_words.saturating_sub(2);
    let mut payload = vec![0u8; payload_words as usize * 4];
    socket.recv_exact(&mut payload)?;

    if let Some(kind) = context_stream_kind(stream_word) {
        trace!(?kind, "received context packet");
        return Ok(match kind {
            StreamId::ReceiverContext => VrtPacket::Receiver(ReceiverContext::parse(&payload)),
            StreamId::DigitizerContext => VrtPacket::Digitizer(DigitizerContext::parse(&payload)),
            StreamId::Extension => VrtPacket::Extension(ExtensionPacket::parse(&payload)),
            _ => unreachable!("context_stream_kind only returns context variants"),
        });
    }

    // Not one of the three context ids: treat as IF-data. The reference
    // driver rejects unrecognized stream ids outright; we mirror that by
    // only accepting the three sample-format ids here.
    if stream_word != header::I16Q16_DATA_STREAM_ID
        && stream_word != header::I16_DATA_STREAM_ID
        && stream_word != header::I32_DATA_STREAM_ID
    {
        return Err(ProtocolError::NotIQFrame(stream_word).into());
    }

    // Reassemble the full word count (minus the 2 prefix words already
    // consumed) to parse the timestamp fields from the payload we just
    // received whole.
    let (rest, header) = VrtHeader::parse(&payload, prefix, stream_word)?;

    let trailer_offset = rest.len().saturating_sub(VRT_TRAILER_WORDS as usize * 4);
    let sample_bytes = &rest[..trailer_offset];
    let trailer_word = if rest.len() >= 4 {
        u32::from_be_bytes([
            rest[trailer_offset],
            rest[trailer_offset + 1],
            rest[trailer_offset + 2],
            rest[trailer_offset + 3],
        ])
    } else {
        0
    };

    let samples = sample::decode(header.stream_id, sample_bytes, header.samples_per_packet);

    trace!(
        stream_id = header.stream_id.wire_value(),
        captured_at = ?header.captured_at(),
        samples_per_packet = header.samples_per_packet,
        "decoded IF-data packet"
    );

    Ok(VrtPacket::IfData {
        header,
        trailer: VrtTrailer::parse(trailer_word),
        samples,
    })
}

// Used only to size header subtraction consistently with `header.rs`;
// re-exported so the sweep/capture module doesn't need to reach into `header`
// directly for this constant.
pub(crate) const HEADER_WORDS: u16 = VRT_HEADER_WORDS;
