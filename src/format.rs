//! Format descriptors and negotiation parameters.
//!
//! A host proposes a format as a [`FormatParam`]: a media type/subtype pair plus,
//! for raw audio, an [`AudioInfoRaw`] candidate. Validation turns the candidate
//! into an [`AudioFormat`], which is immutable and always within bounds.

use core::fmt;

use crate::error::FormatError;

/// Highest channel count a format may carry.
pub const MAX_CHANNELS: u32 = 64;

/// Highest sample rate a format may carry, in Hz.
pub const MAX_RATE: u32 = 192_000;

/// Bytes per sample used when turning a chunk size into a frame count.
///
/// This is fixed regardless of the negotiated [`SampleFormat`]: frame counts are
/// an approximation for anything that isn't a 32-bit encoding.
pub const ASSUMED_SAMPLE_WIDTH: u32 = 4;

/// Top-level media type of a format parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MediaType {
    Audio,
    Video,
    Image,
    Binary,
    Stream,
    Application,
}

/// Media subtype, qualifying [`MediaType`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MediaSubtype {
    Raw,
    Dsp,
    Iec958,
    Dsd,
    Mp3,
    Aac,
    Vorbis,
    Opus,
    Flac,
}

/// Sample encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum SampleFormat {
    Unknown = 0,
    U8 = 1,
    S16 = 2,
    S16P = 3,
    S24 = 4,
    S32 = 5,
    S32P = 6,
    F32 = 7,
    F32P = 8,
    F64 = 9,
    F64P = 10,
}

impl SampleFormat {
    /// Bytes per sample, `0` for [`SampleFormat::Unknown`]
    pub fn sample_width(self) -> u32 {
        match self {
            SampleFormat::Unknown => 0,
            SampleFormat::U8 => 1,
            SampleFormat::S16 | SampleFormat::S16P => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 | SampleFormat::S32P => 4,
            SampleFormat::F32 | SampleFormat::F32P => 4,
            SampleFormat::F64 | SampleFormat::F64P => 8,
        }
    }

    /// Whether each channel lives in its own plane
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            SampleFormat::S16P | SampleFormat::S32P | SampleFormat::F32P | SampleFormat::F64P
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::Unknown => "UNKNOWN",
            SampleFormat::U8 => "U8",
            SampleFormat::S16 => "S16LE",
            SampleFormat::S16P => "S16P",
            SampleFormat::S24 => "S24LE",
            SampleFormat::S32 => "S32LE",
            SampleFormat::S32P => "S32P",
            SampleFormat::F32 => "F32LE",
            SampleFormat::F32P => "F32P",
            SampleFormat::F64 => "F64LE",
            SampleFormat::F64P => "F64P",
        }
    }

    fn from_u8(v: u8) -> SampleFormat {
        match v {
            1 => SampleFormat::U8,
            2 => SampleFormat::S16,
            3 => SampleFormat::S16P,
            4 => SampleFormat::S24,
            5 => SampleFormat::S32,
            6 => SampleFormat::S32P,
            7 => SampleFormat::F32,
            8 => SampleFormat::F32P,
            9 => SampleFormat::F64,
            10 => SampleFormat::F64P,
            _ => SampleFormat::Unknown,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unvalidated raw audio properties, as proposed by a peer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AudioInfoRaw {
    pub format: SampleFormat,
    pub channels: u32,
    pub rate: u32,
}

impl AudioInfoRaw {
    pub fn new(format: SampleFormat, channels: u32, rate: u32) -> Self {
        Self { format, channels, rate }
    }
}

/// A format parameter object, the unit exchanged during negotiation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FormatParam {
    pub media_type: MediaType,
    pub media_subtype: MediaSubtype,
    /// Raw audio properties; absent for compressed or non-audio formats
    pub raw: Option<AudioInfoRaw>,
}

impl FormatParam {
    /// Build an `audio/raw` format parameter
    pub fn audio_raw(info: AudioInfoRaw) -> Self {
        Self {
            media_type: MediaType::Audio,
            media_subtype: MediaSubtype::Raw,
            raw: Some(info),
        }
    }

    /// Build a parameter of an arbitrary media type with no raw audio properties
    pub fn other(media_type: MediaType, media_subtype: MediaSubtype) -> Self {
        Self {
            media_type,
            media_subtype,
            raw: None,
        }
    }

    /// Parse and validate this parameter as raw audio.
    ///
    /// Checks happen in order: media type, presence of raw properties, channel
    /// count, sample rate. The first failing check is reported.
    pub fn parse_audio_raw(&self) -> Result<AudioFormat, FormatError> {
        if self.media_type != MediaType::Audio || self.media_subtype != MediaSubtype::Raw {
            return Err(FormatError::UnsupportedMediaType {
                media_type: self.media_type,
                media_subtype: self.media_subtype,
            });
        }
        let raw = self.raw.ok_or(FormatError::MissingAudioInfo)?;
        AudioFormat::new(raw)
    }
}

impl From<AudioFormat> for FormatParam {
    fn from(format: AudioFormat) -> Self {
        FormatParam::audio_raw(format.info())
    }
}

/// A validated raw audio format.
///
/// Channels are within `1..=64` and the rate within `1..=192000` Hz. There is no
/// way to change either after construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AudioFormat {
    format: SampleFormat,
    channels: u32,
    rate: u32,
}

// Packed layout: bit 63 marks presence, bits 16..48 rate, 8..16 channels, 0..8 encoding.
const PACKED_PRESENT: u64 = 1 << 63;

impl AudioFormat {
    /// Validate a candidate. Nothing is partially applied on failure.
    pub fn new(info: AudioInfoRaw) -> Result<Self, FormatError> {
        if info.channels == 0 || info.channels > MAX_CHANNELS {
            return Err(FormatError::InvalidChannels(info.channels));
        }
        if info.rate == 0 || info.rate > MAX_RATE {
            return Err(FormatError::InvalidRate(info.rate));
        }
        Ok(Self {
            format: info.format,
            channels: info.channels,
            rate: info.rate,
        })
    }

    #[inline]
    pub fn sample_format(&self) -> SampleFormat {
        self.format
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn info(&self) -> AudioInfoRaw {
        AudioInfoRaw::new(self.format, self.channels, self.rate)
    }

    /// Number of whole frames in `bytes` of payload, assuming
    /// [`ASSUMED_SAMPLE_WIDTH`]-byte samples.
    #[inline]
    pub fn frames_in(&self, bytes: u32) -> u32 {
        bytes / (self.channels * ASSUMED_SAMPLE_WIDTH)
    }

    #[inline]
    pub(crate) fn pack(&self) -> u64 {
        PACKED_PRESENT
            | (u64::from(self.rate) << 16)
            | (u64::from(self.channels) << 8)
            | u64::from(self.format as u8)
    }

    #[inline]
    pub(crate) fn unpack(bits: u64) -> Option<Self> {
        if bits & PACKED_PRESENT == 0 {
            return None;
        }
        Some(Self {
            format: SampleFormat::from_u8((bits & 0xff) as u8),
            channels: ((bits >> 8) & 0xff) as u32,
            rate: ((bits >> 16) & 0xffff_ffff) as u32,
        })
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} channels, {} Hz, {}", self.channels, self.rate, self.format)
    }
}
