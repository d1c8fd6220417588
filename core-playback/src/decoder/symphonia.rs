//! # Symphonia Decoder Implementation
//!
//! Decodes a complete in-memory asset into a [`DecodedBuffer`].

use super::format_detector::FormatDetector;
use super::sample_converter::SampleConverter;
use super::BufferDecoder;
use crate::error::{PlaybackError, Result};
use bridge_traits::DecodedBuffer;
use core_runtime::logging::strip_path;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, instrument, warn};

/// Corrupt packets tolerated in a row before the asset is rejected.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Symphonia-backed [`BufferDecoder`].
///
/// Decodes the first audio track of the container. Corrupt packets are
/// skipped; the asset is rejected only after [`MAX_CONSECUTIVE_ERRORS`]
/// failures in a row or on an unrecoverable error.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BufferDecoder for SymphoniaDecoder {
    #[instrument(skip(self, bytes), fields(file = %strip_path(path), bytes = bytes.len()))]
    fn decode(&self, path: &str, bytes: &[u8]) -> Result<DecodedBuffer> {
        let hint = FormatDetector::hint_from_path(Path::new(path));
        let media_source = Box::new(Cursor::new(bytes.to_vec())) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PlaybackError::decode(path, format!("Failed to probe format: {}", e)))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::decode(path, "No supported audio tracks"))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let codec = FormatDetector::detect_codec(params.codec);
        FormatDetector::validate_codec_support(&codec)?;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| PlaybackError::decode(path, "Missing sample rate"))?;

        // Channels may only be known after the first packet (AAC/M4A)
        let mut channels = params.channels.map(|ch| ch.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| PlaybackError::decode(path, format!("Failed to create decoder: {}", e)))?;

        debug!(?codec, sample_rate, ?channels, "Decoding asset");

        let mut samples = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams: keep the first one
                    debug!("Track list changed, stopping at first stream");
                    break;
                }
                Err(e) => {
                    return Err(PlaybackError::decode(
                        path,
                        format!("Failed to read packet: {}", e),
                    ))
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;
                    let decoded_channels = decoded.spec().channels.count() as u16;
                    channels = Some(settle_channels(
                        path,
                        channels,
                        decoded_channels,
                        !samples.is_empty(),
                    )?);
                    SampleConverter::append_interleaved(&decoded, &mut samples);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(error = %e, consecutive_errors, "Skipping corrupted packet");
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(PlaybackError::decode(
                            path,
                            format!("Stream corruption after {} failed packets", consecutive_errors),
                        ));
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    consecutive_errors += 1;
                    warn!(error = %e, consecutive_errors, "Skipping undecodable packet");
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(PlaybackError::decode(
                            path,
                            format!("Decoder failure after {} failed packets: {}", consecutive_errors, e),
                        ));
                    }
                }
                Err(e) => {
                    return Err(PlaybackError::decode(
                        path,
                        format!("Failed to decode packet: {}", e),
                    ))
                }
            }
        }

        let channels = channels.unwrap_or(1);
        SampleConverter::clamp_samples(&mut samples);

        let buffer = DecodedBuffer::new(samples, channels, sample_rate)
            .map_err(|e| PlaybackError::decode(path, e))?;

        if buffer.is_empty() {
            return Err(PlaybackError::EmptyAudio(path.to_string()));
        }

        debug!(
            frames = buffer.frames(),
            duration_ms = buffer.duration().as_millis() as u64,
            "Decoded asset"
        );
        Ok(buffer)
    }
}

/// Channel count for the next decoded packet.
///
/// The first packet may correct the count announced by the container. Once
/// samples are stored the layout is fixed and a different count rejects the
/// asset.
fn settle_channels(
    path: &str,
    established: Option<u16>,
    decoded: u16,
    has_samples: bool,
) -> Result<u16> {
    match established {
        Some(current) if current == decoded => Ok(current),
        Some(current) if has_samples => Err(PlaybackError::decode(
            path,
            format!("Channel count changed from {} to {} mid-stream", current, decoded),
        )),
        _ => {
            debug!(decoded_channels = decoded, "Channel count taken from decoded audio");
            Ok(decoded)
        }
    }
}
