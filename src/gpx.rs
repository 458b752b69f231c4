// ABOUTME: GPX 1.1 track encoder for a sample stream augmented with cadence
// ABOUTME: Emits one trkseg with a trkpt per sample and Garmin TrackPointExtension hr/cad values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cadecalc contributors

//! # Track encoding
//!
//! The encoder is all-or-nothing: channels are validated against the point
//! count up front, and bytes are only returned on success. Output is
//! deterministic for a given input.
//!
//! Point count is `latlng.original_size`. Optional channels (`altitude`,
//! `heartrate`, `cadence`, `time`) that are present must hold at least that
//! many samples. Without a `time` channel points are spaced one second apart.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use html_escape::encode_text;

use crate::constants::channels;
use crate::errors::EncodeError;
use crate::models::{Activity, SampleStream, StreamData};

const GPX_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx creator="cadecalc" version="1.1" xmlns="http://www.topografix.com/GPX/1/1" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd http://www.garmin.com/xmlschemas/GpxExtensions/v3 http://www.garmin.com/xmlschemas/GpxExtensionsv3.xsd http://www.garmin.com/xmlschemas/TrackPointExtension/v1 http://www.garmin.com/xmlschemas/TrackPointExtensionv1.xsd" xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1" xmlns:gpxx="http://www.garmin.com/xmlschemas/GpxExtensions/v3">
"#;

/// Garmin activity type code for cycling
const TRACK_TYPE_CYCLING: &str = "1";

/// Numeric channel view
#[derive(Clone, Copy)]
enum Samples<'a> {
    Scalars(&'a [f64]),
    Integers(&'a [i32]),
}

impl Samples<'_> {
    fn len(self) -> usize {
        match self {
            Self::Scalars(values) => values.len(),
            Self::Integers(values) => values.len(),
        }
    }

    fn render(self, index: usize) -> String {
        match self {
            Self::Scalars(values) => values[index].to_string(),
            Self::Integers(values) => values[index].to_string(),
        }
    }

    fn seconds(self, index: usize) -> i64 {
        match self {
            Self::Scalars(values) => values[index] as i64,
            Self::Integers(values) => i64::from(values[index]),
        }
    }
}

/// Channels resolved and length-checked against the point count
struct Track<'a> {
    latlng: &'a [[f64; 2]],
    time: Option<Samples<'a>>,
    altitude: Option<Samples<'a>>,
    heartrate: Option<Samples<'a>>,
    cadence: Option<Samples<'a>>,
}

fn numeric_channel<'a>(
    stream: &'a SampleStream,
    name: &str,
    points: usize,
) -> Result<Option<Samples<'a>>, EncodeError> {
    let Some(channel) = stream.get(name) else {
        return Ok(None);
    };
    let samples = match &channel.data {
        StreamData::Scalars(values) => Samples::Scalars(values),
        StreamData::Integers(values) => Samples::Integers(values),
        StreamData::Coordinates(values) if values.is_empty() => Samples::Scalars(&[]),
        StreamData::Coordinates(_) => {
            return Err(EncodeError::UnexpectedSampleShape {
                channel: name.to_owned(),
                expected: "numeric",
            })
        }
    };
    check_len(name, samples.len(), points)?;
    Ok(Some(samples))
}

fn check_len(channel: &str, len: usize, points: usize) -> Result<(), EncodeError> {
    if len < points {
        return Err(EncodeError::ChannelIndexOutOfRange {
            channel: channel.to_owned(),
            index: len,
            len,
        });
    }
    Ok(())
}

impl<'a> Track<'a> {
    fn resolve(stream: &'a SampleStream) -> Result<Self, EncodeError> {
        let latlng_channel =
            stream
                .get(channels::LATLNG)
                .ok_or_else(|| EncodeError::MissingRequiredChannel {
                    channel: channels::LATLNG.to_owned(),
                })?;
        let latlng = latlng_channel.data.as_coordinates().ok_or_else(|| {
            EncodeError::UnexpectedSampleShape {
                channel: channels::LATLNG.to_owned(),
                expected: "coordinate",
            }
        })?;
        let points = latlng_channel.original_size;
        check_len(channels::LATLNG, latlng.len(), points)?;

        Ok(Self {
            latlng: &latlng[..points],
            time: numeric_channel(stream, channels::TIME, points)?,
            altitude: numeric_channel(stream, channels::ALTITUDE, points)?,
            heartrate: numeric_channel(stream, channels::HEARTRATE, points)?,
            cadence: numeric_channel(stream, channels::CADENCE, points)?,
        })
    }

    fn point_time(
        &self,
        start: DateTime<Utc>,
        index: usize,
    ) -> Result<DateTime<Utc>, EncodeError> {
        let offset = self
            .time
            .map_or(index as i64, |time| time.seconds(index));
        TimeDelta::try_seconds(offset)
            .and_then(|delta| start.checked_add_signed(delta))
            .ok_or_else(|| EncodeError::InvalidTimestamp {
                value: format!("{} + {offset}s", timestamp(start)),
            })
    }

    fn write_point(
        &self,
        out: &mut String,
        start: DateTime<Utc>,
        index: usize,
    ) -> Result<(), EncodeError> {
        let [lat, lon] = self.latlng[index];
        out.push_str(&format!("   <trkpt lat=\"{lat}\" lon=\"{lon}\">\n"));
        if let Some(altitude) = self.altitude {
            out.push_str(&format!("    <ele>{}</ele>\n", altitude.render(index)));
        }
        out.push_str(&format!(
            "    <time>{}</time>\n",
            timestamp(self.point_time(start, index)?)
        ));

        if self.heartrate.is_some() || self.cadence.is_some() {
            out.push_str("    <extensions>\n     <gpxtpx:TrackPointExtension>\n");
            if let Some(heartrate) = self.heartrate {
                out.push_str(&format!(
                    "      <gpxtpx:hr>{}</gpxtpx:hr>\n",
                    heartrate.render(index)
                ));
            }
            if let Some(cadence) = self.cadence {
                out.push_str(&format!(
                    "      <gpxtpx:cad>{}</gpxtpx:cad>\n",
                    cadence.render(index)
                ));
            }
            out.push_str("     </gpxtpx:TrackPointExtension>\n    </extensions>\n");
        }
        out.push_str("   </trkpt>\n");
        Ok(())
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 start timestamp
///
/// # Errors
///
/// Returns [`EncodeError::InvalidTimestamp`] if `value` is not RFC3339
pub fn parse_start(value: &str) -> Result<DateTime<Utc>, EncodeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| EncodeError::InvalidTimestamp {
            value: value.to_owned(),
        })
}

/// Encode `stream` as a GPX 1.1 document titled after `activity`
///
/// # Errors
///
/// Returns an [`EncodeError`] if `latlng` is missing, a channel is shorter
/// than the point count or has the wrong shape, or the timestamp is invalid
pub fn encode(
    stream: &SampleStream,
    activity: &Activity,
    start_timestamp: &str,
) -> Result<Vec<u8>, EncodeError> {
    let start = parse_start(start_timestamp)?;
    let track = Track::resolve(stream)?;

    let mut out = String::with_capacity(GPX_HEADER.len() + track.latlng.len() * 200);
    out.push_str(GPX_HEADER);
    out.push_str(&format!(
        " <metadata>\n  <time>{}</time>\n </metadata>\n",
        timestamp(start)
    ));
    out.push_str(&format!(
        " <trk>\n  <name>{}</name>\n  <type>{TRACK_TYPE_CYCLING}</type>\n  <trkseg>\n",
        encode_text(&activity.name)
    ));
    for index in 0..track.latlng.len() {
        track.write_point(&mut out, start, index)?;
    }
    out.push_str("  </trkseg>\n </trk>\n</gpx>\n");

    Ok(out.into_bytes())
}
