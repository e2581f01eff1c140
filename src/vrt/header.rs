use chrono::{DateTime, TimeZone, Utc};
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32, be_u64, be_u8};
use nom::IResult;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{NomError, ProtocolError};

pub const RECEIVER_CONTEXT_STREAM_ID: u32 = 0x9000_0001;
pub const DIGITIZER_CONTEXT_STREAM_ID: u32 = 0x9000_0002;
pub const EXTENSION_STREAM_ID: u32 = 0x9000_0003;
pub const I16Q16_DATA_STREAM_ID: u32 = 0x0000_0001;
pub const I16_DATA_STREAM_ID: u32 = 0x0000_0002;
pub const I32_DATA_STREAM_ID: u32 = 0x0000_0003;

/// Stream ids that classify a VRT packet's payload. IF-data packets carry one
/// of the three sample-format ids; the rest are context/extension packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum StreamId {
    I16Q16Data = I16Q16_DATA_STREAM_ID,
    I16Data = I16_DATA_STREAM_ID,
    I32Data = I32_DATA_STREAM_ID,
    ReceiverContext = RECEIVER_CONTEXT_STREAM_ID,
    DigitizerContext = DIGITIZER_CONTEXT_STREAM_ID,
    Extension = EXTENSION_STREAM_ID,
}

impl StreamId {
    /// Wire value this variant decodes from, via `IntoPrimitive`.
    pub fn wire_value(self) -> u32 {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    IfData,
    Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: u32,
    pub picoseconds: u64,
}

impl Timestamp {
    /// Converts the VRT integer-seconds/fractional-picoseconds pair into a
    /// UTC instant. `None` if `seconds` doesn't land on a representable
    /// `DateTime<Utc>`.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds as i64, (self.picoseconds / 1_000) as u32)
            .single()
    }
}

/// The first two VRT words: packet type, 4-bit wrapping packet counter, and
/// the packet size in 32-bit words (inclusive of every field, header through
/// trailer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PacketPrefix {
    pub packet_type: PacketType,
    pub packet_count: u8,
    pub packet_size_words: u16,
    pub tsi_present: bool,
    pub tsf_present: bool,
}

pub(crate) fn parse_prefix(input: &[u8]) -> IResult<&[u8], PacketPrefix> {
    let (input, byte0) = be_u8(input)?;
    let (input, byte1) = be_u8(input)?;
    let (input, packet_size_words) = be_u16(input)?;

    let packet_type = if byte0 & 0xf0 == 0x10 {
        PacketType::Context
    } else {
        PacketType::IfData
    };
    let packet_count = byte1 & 0x0f;
    let tsi_present = (byte1 & 0xC0) >> 6 != 0;
    let tsf_present = (byte1 & 0x30) >> 4 != 0;

    Ok((
        input,
        PacketPrefix {
            packet_type,
            packet_count,
            packet_size_words,
            tsi_present,
            tsf_present,
        },
    ))
}

pub(crate) fn parse_stream_id(input: &[u8]) -> IResult<&[u8], u32> {
    be_u32(input)
}

/// Header of an IF-data packet: everything before the raw sample payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrtHeader {
    pub packet_type: PacketType,
    pub stream_id: StreamId,
    pub packet_count: u8,
    pub samples_per_packet: u16,
    pub timestamp: Timestamp,
}

impl VrtHeader {
    /// Parses the IF-data header that follows the 2-word prefix and 1-word
    /// stream id: 1 word seconds, 2 words picoseconds (when present).
    pub(crate) fn parse<'a>(
        input: &'a [u8],
        prefix: PacketPrefix,
        stream_word: u32,
    ) -> Result<(&'a [u8], VrtHeader), ProtocolError> {
        if !prefix.tsi_present {
            return Err(ProtocolError::InvTimestamp);
        }

        let (input, seconds) =
            be_u32::<_, nom::error::Error<&[u8]>>(input).map_err(nom_err_to_protocol)?;
        let (input, picoseconds) = if prefix.tsf_present {
            be_u64::<_, nom::error::Error<&[u8]>>(input).map_err(nom_err_to_protocol)?
        } else {
            (input, 0)
        };

        // samples_per_packet = packet words - header(7) - trailer(1), with
        // the 2 prefix words already consumed by the caller.
        let samples_per_packet = prefix
            .packet_size_words
            .saturating_sub(VRT_HEADER_WORDS)
            .saturating_sub(VRT_TRAILER_WORDS);

        let stream_id = StreamId::try_from(stream_word).map_err(|_| ProtocolError::NotIQFrame(stream_word))?;

        Ok((
            input,
            VrtHeader {
                packet_type: prefix.packet_type,
                stream_id,
                packet_count: prefix.packet_count,
                samples_per_packet,
                timestamp: Timestamp {
                    seconds,
                    picoseconds,
                },
            },
        ))
    }

    /// The packet's timestamp, converted to a UTC instant.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.to_utc()
    }
}

/// Fixed IF-data header size in 32-bit words: 2 prefix + 1 stream id + 1
/// seconds + 2 picoseconds + 1 reserved/class-id placeholder.
pub(crate) const VRT_HEADER_WORDS: u16 = 7;
pub(crate) const VRT_TRAILER_WORDS: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VrtTrailer {
    pub valid_data: bool,
    pub ref_lock: bool,
    pub over_range: bool,
    pub sample_loss: bool,
    pub spectral_inversion: bool,
}

impl VrtTrailer {
    pub(crate) fn parse(word: u32) -> VrtTrailer {
        VrtTrailer {
            valid_data: word & (1 << 31) != 0,
            ref_lock: word & (1 << 29) != 0,
            over_range: word & (1 << 27) != 0,
            sample_loss: word & (1 << 26) != 0,
            spectral_inversion: word & (1 << 24) != 0,
        }
    }
}

pub(crate) fn context_stream_kind(word: u32) -> Option<StreamId> {
    match StreamId::try_from(word) {
        Ok(id @ (StreamId::ReceiverContext | StreamId::DigitizerContext | StreamId::Extension)) => Some(id),
        _ => None,
    }
}

fn nom_err_to_protocol(e: nom::Err<nom::error::Error<&[u8]>>) -> ProtocolError {
    ProtocolError::Nom(NomError(format!("{e:?}")))
}

pub(crate) fn take_words(input: &[u8], words: usize) -> IResult<&[u8], &[u8]> {
    take(words * 4)(input)
}
