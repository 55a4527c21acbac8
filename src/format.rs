//! Media formats and the constraints pads place on them.
//!
//! A pad declares an *accepted format* ([`FormatCaps`]), and every format sent
//! or received through it ([`MediaFormat`]) must satisfy that constraint.
//!
//! - [`CapsValue<T>`]: A single parameter constraint (fixed, range, list, any)
//! - [`VideoFormatCaps`] / [`AudioFormatCaps`]: Raw format constraints
//! - [`FormatCaps`]: The full constraint a pad accepts
//!
//! Both [`MediaFormat`] and [`FormatCaps`] implement `Display`, which is what
//! ends up in caps-rejection errors.
//!
//! ```rust
//! use flowcore::format::{
//!     AudioFormat, AudioFormatCaps, CapsValue, FormatCaps, MediaFormat, SampleFormat,
//! };
//!
//! // Pad accepts 16-bit audio at 44.1 or 48 kHz, any channel count
//! let caps = FormatCaps::AudioRaw(AudioFormatCaps {
//!     sample_format: CapsValue::Fixed(SampleFormat::S16),
//!     sample_rate: CapsValue::List(vec![44100, 48000]),
//!     channels: CapsValue::Any,
//! });
//!
//! assert!(caps.accepts(&MediaFormat::AudioRaw(AudioFormat::DVD_QUALITY)));
//! assert!(!caps.accepts(&MediaFormat::AudioRaw(AudioFormat::new(
//!     22050,
//!     2,
//!     SampleFormat::S16
//! ))));
//! ```

use std::fmt;

// ============================================================================
// CapsValue - constraint on a single parameter
// ============================================================================

/// A value that can be fixed, range, list, or any.
///
/// # Examples
///
/// ```rust
/// use flowcore::format::CapsValue;
///
/// let fixed: CapsValue<u32> = CapsValue::Fixed(1920);
/// let range: CapsValue<u32> = (640..=1920).into();
/// let list: CapsValue<u32> = CapsValue::List(vec![1920, 1280, 720]);
///
/// assert!(fixed.accepts(&1920));
/// assert!(range.accepts(&1280));
/// assert!(!list.accepts(&800));
/// assert!(CapsValue::<u32>::Any.accepts(&7));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CapsValue<T> {
    /// Exact value.
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values.
    List(Vec<T>),
    /// Any value accepted.
    #[default]
    Any,
}

impl<T: Ord> CapsValue<T> {
    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::Fixed(v) => v == value,
            Self::Range { min, max } => value >= min && value <= max,
            Self::List(values) => values.contains(value),
            Self::Any => true,
        }
    }

    /// Check if this accepts any value.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl<T> From<T> for CapsValue<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T> From<std::ops::RangeInclusive<T>> for CapsValue<T> {
    fn from(range: std::ops::RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::Range { min, max }
    }
}

impl<T: fmt::Display> fmt::Display for CapsValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "{v}"),
            Self::Range { min, max } => write!(f, "[{min}, {max}]"),
            Self::List(values) => {
                f.write_str("{")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Self::Any => f.write_str("*"),
        }
    }
}

// ============================================================================
// Media Formats
// ============================================================================

/// Media format - describes buffer contents on a link.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaFormat {
    /// Raw video frames.
    VideoRaw(VideoFormat),
    /// Encoded video.
    Video(VideoCodec),
    /// Raw audio samples.
    AudioRaw(AudioFormat),
    /// Encoded audio.
    Audio(AudioCodec),
    /// Opaque bytes.
    Bytes,
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VideoRaw(v) => write!(
                f,
                "video/raw(format={}, width={}, height={}, framerate={})",
                v.pixel_format, v.width, v.height, v.framerate
            ),
            Self::Video(codec) => write!(f, "video/{codec}"),
            Self::AudioRaw(a) => write!(
                f,
                "audio/raw(format={}, rate={}, channels={})",
                a.sample_format, a.sample_rate, a.channels
            ),
            Self::Audio(codec) => write!(f, "audio/{codec}"),
            Self::Bytes => f.write_str("bytes"),
        }
    }
}

/// Raw video format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct VideoFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub pixel_format: PixelFormat,
    /// Frame rate.
    pub framerate: Framerate,
}

impl VideoFormat {
    /// Create a new video format.
    pub const fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        framerate: Framerate,
    ) -> Self {
        Self {
            width,
            height,
            pixel_format,
            framerate,
        }
    }
}

/// Pixel formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum PixelFormat {
    /// YUV 4:2:0 planar.
    #[default]
    I420,
    /// YUV 4:2:0 semi-planar.
    Nv12,
    /// YUV 4:2:2 packed.
    Yuyv,
    /// RGB 8-bit per channel, packed.
    Rgb24,
    /// RGBA 8-bit per channel, packed.
    Rgba,
    /// 8-bit grayscale.
    Gray8,
}

/// Video codecs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    H265,
    /// VP9.
    Vp9,
    /// AV1.
    Av1,
}

/// Frame rate as numerator/denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Framerate {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (time units).
    pub den: u32,
}

impl Framerate {
    /// Create a new framerate.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// 25 fps (PAL).
    pub const FPS_25: Self = Self::new(25, 1);
    /// 30 fps.
    pub const FPS_30: Self = Self::new(30, 1);
    /// 60 fps.
    pub const FPS_60: Self = Self::new(60, 1);
    /// 29.97 fps (NTSC).
    pub const FPS_29_97: Self = Self::new(30000, 1001);
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl PartialOrd for Framerate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Framerate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // a/b vs c/d => a*d vs c*b
        let lhs = (self.num as u64) * (other.den as u64);
        let rhs = (other.num as u64) * (self.den as u64);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Raw audio format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Sample format.
    pub sample_format: SampleFormat,
}

impl AudioFormat {
    /// Create a new audio format.
    pub const fn new(sample_rate: u32, channels: u16, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
        }
    }

    /// CD quality: 44100 Hz, stereo, 16-bit signed.
    pub const CD_QUALITY: Self = Self::new(44100, 2, SampleFormat::S16);

    /// DVD quality: 48000 Hz, stereo, 16-bit signed.
    pub const DVD_QUALITY: Self = Self::new(48000, 2, SampleFormat::S16);
}

/// Audio sample formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum SampleFormat {
    /// Signed 16-bit integer.
    #[default]
    S16,
    /// Signed 32-bit integer.
    S32,
    /// 32-bit floating point.
    F32,
    /// Unsigned 8-bit integer.
    U8,
}

/// Audio codecs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AudioCodec {
    /// Opus.
    Opus,
    /// AAC.
    Aac,
    /// MP3.
    Mp3,
    /// FLAC.
    Flac,
}

macro_rules! display_as_debug {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{self:?}")
            }
        })*
    };
}

display_as_debug!(PixelFormat, VideoCodec, SampleFormat, AudioCodec);

// ============================================================================
// Format constraints
// ============================================================================

/// Constraint on raw video formats.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VideoFormatCaps {
    /// Accepted pixel formats.
    pub pixel_format: CapsValue<PixelFormat>,
    /// Accepted widths.
    pub width: CapsValue<u32>,
    /// Accepted heights.
    pub height: CapsValue<u32>,
    /// Accepted framerates.
    pub framerate: CapsValue<Framerate>,
}

impl VideoFormatCaps {
    /// Accept any raw video.
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to a single pixel format.
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = CapsValue::Fixed(format);
        self
    }

    /// Restrict to a size range.
    pub fn with_size_range(mut self, min_w: u32, max_w: u32, min_h: u32, max_h: u32) -> Self {
        self.width = CapsValue::Range {
            min: min_w,
            max: max_w,
        };
        self.height = CapsValue::Range {
            min: min_h,
            max: max_h,
        };
        self
    }

    /// Check whether a video format satisfies this constraint.
    pub fn accepts(&self, format: &VideoFormat) -> bool {
        self.pixel_format.accepts(&format.pixel_format)
            && self.width.accepts(&format.width)
            && self.height.accepts(&format.height)
            && self.framerate.accepts(&format.framerate)
    }
}

/// Constraint on raw audio formats.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct AudioFormatCaps {
    /// Accepted sample formats.
    pub sample_format: CapsValue<SampleFormat>,
    /// Accepted sample rates.
    pub sample_rate: CapsValue<u32>,
    /// Accepted channel counts.
    pub channels: CapsValue<u16>,
}

impl AudioFormatCaps {
    /// Accept any raw audio.
    pub fn any() -> Self {
        Self::default()
    }

    /// Check whether an audio format satisfies this constraint.
    pub fn accepts(&self, format: &AudioFormat) -> bool {
        self.sample_format.accepts(&format.sample_format)
            && self.sample_rate.accepts(&format.sample_rate)
            && self.channels.accepts(&format.channels)
    }
}

/// The accepted-format constraint of a pad.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum FormatCaps {
    /// Anything goes.
    #[default]
    Any,
    /// Raw video within the constraint.
    VideoRaw(VideoFormatCaps),
    /// Encoded video with one of the codecs.
    Video(CapsValue<VideoCodec>),
    /// Raw audio within the constraint.
    AudioRaw(AudioFormatCaps),
    /// Encoded audio with one of the codecs.
    Audio(CapsValue<AudioCodec>),
    /// Opaque bytes only.
    Bytes,
    /// Any of the alternatives.
    OneOf(Vec<FormatCaps>),
}

impl FormatCaps {
    /// Check whether a format satisfies this constraint.
    pub fn accepts(&self, format: &MediaFormat) -> bool {
        match (self, format) {
            (Self::Any, _) => true,
            (Self::OneOf(alternatives), format) => alternatives.iter().any(|c| c.accepts(format)),
            (Self::VideoRaw(caps), MediaFormat::VideoRaw(v)) => caps.accepts(v),
            (Self::Video(codecs), MediaFormat::Video(codec)) => codecs.accepts(codec),
            (Self::AudioRaw(caps), MediaFormat::AudioRaw(a)) => caps.accepts(a),
            (Self::Audio(codecs), MediaFormat::Audio(codec)) => codecs.accepts(codec),
            (Self::Bytes, MediaFormat::Bytes) => true,
            _ => false,
        }
    }
}

impl From<MediaFormat> for FormatCaps {
    fn from(format: MediaFormat) -> Self {
        match format {
            MediaFormat::VideoRaw(v) => Self::VideoRaw(VideoFormatCaps {
                pixel_format: v.pixel_format.into(),
                width: v.width.into(),
                height: v.height.into(),
                framerate: v.framerate.into(),
            }),
            MediaFormat::Video(codec) => Self::Video(codec.into()),
            MediaFormat::AudioRaw(a) => Self::AudioRaw(AudioFormatCaps {
                sample_format: a.sample_format.into(),
                sample_rate: a.sample_rate.into(),
                channels: a.channels.into(),
            }),
            MediaFormat::Audio(codec) => Self::Audio(codec.into()),
            MediaFormat::Bytes => Self::Bytes,
        }
    }
}

impl fmt::Display for FormatCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::VideoRaw(c) => write!(
                f,
                "video/raw(format={}, width={}, height={}, framerate={})",
                c.pixel_format, c.width, c.height, c.framerate
            ),
            Self::Video(codecs) => write!(f, "video/{codecs}"),
            Self::AudioRaw(c) => write!(
                f,
                "audio/raw(format={}, rate={}, channels={})",
                c.sample_format, c.sample_rate, c.channels
            ),
            Self::Audio(codecs) => write!(f, "audio/{codecs}"),
            Self::Bytes => f.write_str("bytes"),
            Self::OneOf(alternatives) => {
                for (i, c) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_value_accepts() {
        let range: CapsValue<u32> = (100..=200).into();
        assert!(range.accepts(&100));
        assert!(range.accepts(&200));
        assert!(!range.accepts(&201));

        let list = CapsValue::List(vec![Framerate::FPS_25, Framerate::FPS_30]);
        assert!(list.accepts(&Framerate::FPS_30));
        assert!(!list.accepts(&Framerate::FPS_60));
    }

    #[test]
    fn test_framerate_ordering() {
        assert!(Framerate::FPS_29_97 < Framerate::FPS_30);
        assert_eq!(Framerate::new(60, 2), Framerate::new(60, 2));
        assert_eq!(
            Framerate::new(60, 2).cmp(&Framerate::FPS_30),
            std::cmp::Ordering::Equal
        );
    }

    #[test]
    fn test_video_caps() {
        let caps = FormatCaps::VideoRaw(
            VideoFormatCaps::any()
                .with_pixel_format(PixelFormat::Nv12)
                .with_size_range(320, 1920, 240, 1080),
        );

        let hd = VideoFormat::new(1280, 720, PixelFormat::Nv12, Framerate::FPS_30);
        assert!(caps.accepts(&MediaFormat::VideoRaw(hd)));

        let rgb = VideoFormat::new(1280, 720, PixelFormat::Rgb24, Framerate::FPS_30);
        assert!(!caps.accepts(&MediaFormat::VideoRaw(rgb)));

        let uhd = VideoFormat::new(3840, 2160, PixelFormat::Nv12, Framerate::FPS_30);
        assert!(!caps.accepts(&MediaFormat::VideoRaw(uhd)));

        // Wrong media type entirely
        assert!(!caps.accepts(&MediaFormat::Audio(AudioCodec::Opus)));
    }

    #[test]
    fn test_one_of_and_any() {
        let caps = FormatCaps::OneOf(vec![
            FormatCaps::Video(CapsValue::List(vec![VideoCodec::H264, VideoCodec::H265])),
            FormatCaps::Bytes,
        ]);
        assert!(caps.accepts(&MediaFormat::Video(VideoCodec::H265)));
        assert!(caps.accepts(&MediaFormat::Bytes));
        assert!(!caps.accepts(&MediaFormat::Video(VideoCodec::Av1)));

        assert!(FormatCaps::Any.accepts(&MediaFormat::Video(VideoCodec::Av1)));
    }

    #[test]
    fn test_fixed_caps_from_format() {
        let format = MediaFormat::AudioRaw(AudioFormat::CD_QUALITY);
        let caps = FormatCaps::from(format.clone());
        assert!(caps.accepts(&format));
        assert!(!caps.accepts(&MediaFormat::AudioRaw(AudioFormat::DVD_QUALITY)));
    }

    #[test]
    fn test_display() {
        let caps = FormatCaps::AudioRaw(AudioFormatCaps {
            sample_format: CapsValue::Fixed(SampleFormat::F32),
            sample_rate: CapsValue::List(vec![44100, 48000]),
            channels: (1..=2).into(),
        });
        assert_eq!(
            caps.to_string(),
            "audio/raw(format=F32, rate={44100, 48000}, channels=[1, 2])"
        );

        let format = MediaFormat::AudioRaw(AudioFormat::CD_QUALITY);
        assert_eq!(
            format.to_string(),
            "audio/raw(format=S16, rate=44100, channels=2)"
        );
        assert_eq!(MediaFormat::Video(VideoCodec::H264).to_string(), "video/H264");
    }
}
