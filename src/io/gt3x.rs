//! ActiGraph GT3X reader
//!
//! A `.gt3x` file is a zip archive holding at least two entries:
//!
//! - `info.txt`: `Key: Value` lines describing the device and the recording.
//!   Dates are .NET ticks (100 ns intervals since 0001-01-01).
//! - `log.bin`: a sequence of records
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       1     Separator (0x1E)
//! 1       1     Record type
//! 2       4     Timestamp, seconds since 1970-01-01 (device local time), LE
//! 6       2     Payload size, LE
//! 8       N     Payload
//! 8+N     1     Checksum: one's complement of the XOR of bytes 0..8+N
//! ```
//!
//! Acceleration lives in `ACTIVITY` records (12-bit packed, Y X Z) and
//! `ACTIVITY2` records (i16 LE, X Y Z). An activity record with an empty
//! payload marks idle sleep mode: the device repeated its last sample for
//! that second. All other record types are skipped.

use super::{Recording, RecordingReader};
use crate::error::PaatError;
use crate::types::{axis, Acceleration};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const INFO_ENTRY: &str = "info.txt";
const LOG_ENTRY: &str = "log.bin";

const RECORD_SEPARATOR: u8 = 0x1E;
const RECORD_HEADER_LEN: usize = 8;

const RECORD_ACTIVITY: u8 = 0x00;
const RECORD_ACTIVITY2: u8 = 0x1A;

/// Highest sampling rate of ActiGraph devices
const MAX_SAMPLE_RATE: u32 = 100;

/// Scale of devices whose info.txt predates the "Acceleration Scale" key
const LEGACY_ACCELERATION_SCALE: f64 = 341.0;

/// .NET ticks at 1970-01-01T00:00:00
const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Contents of `info.txt`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gt3xMetadata {
    /// All key/value pairs, verbatim
    pub fields: BTreeMap<String, String>,
}

impl Gt3xMetadata {
    /// Parse `Key: Value` lines; lines without a colon are ignored
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.get("Serial Number")
    }

    pub fn device_type(&self) -> Option<&str> {
        self.get("Device Type")
    }

    pub fn firmware(&self) -> Option<&str> {
        self.get("Firmware")
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.get("TimeZone")
    }

    /// Sampling rate in Hz
    pub fn sample_rate(&self) -> Result<u32, PaatError> {
        let raw = self
            .get("Sample Rate")
            .ok_or_else(|| PaatError::Metadata("missing Sample Rate".to_string()))?;
        let rate: u32 = raw
            .parse()
            .map_err(|_| PaatError::Metadata(format!("invalid Sample Rate '{raw}'")))?;
        if rate == 0 || rate > MAX_SAMPLE_RATE {
            return Err(PaatError::Metadata(format!(
                "Sample Rate must be between 1 and {MAX_SAMPLE_RATE} Hz, got {rate}"
            )));
        }
        Ok(rate)
    }

    /// Counts per g
    pub fn acceleration_scale(&self) -> Result<f64, PaatError> {
        match self.get("Acceleration Scale") {
            None => Ok(LEGACY_ACCELERATION_SCALE),
            Some(raw) => {
                let scale: f64 = raw.parse().map_err(|_| {
                    PaatError::Metadata(format!("invalid Acceleration Scale '{raw}'"))
                })?;
                if !scale.is_finite() || scale <= 0.0 {
                    return Err(PaatError::Metadata(format!(
                        "Acceleration Scale must be positive, got {raw}"
                    )));
                }
                Ok(scale)
            }
        }
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.ticks_field("Start Date")
    }

    pub fn stop_date(&self) -> Option<DateTime<Utc>> {
        self.ticks_field("Stop Date")
    }

    pub fn last_sample_time(&self) -> Option<DateTime<Utc>> {
        self.ticks_field("Last Sample Time")
    }

    pub fn download_date(&self) -> Option<DateTime<Utc>> {
        self.ticks_field("Download Date")
    }

    fn ticks_field(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)?.parse::<i64>().ok().and_then(ticks_to_datetime)
    }
}

/// Convert .NET ticks to a timestamp; zero ticks mean "not set"
pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let since_epoch = ticks - TICKS_AT_UNIX_EPOCH;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Read a `.gt3x` file from disk
pub fn read_gt3x(path: &Path) -> Result<Recording, PaatError> {
    let file = File::open(path)?;
    read_gt3x_from(file)
}

/// Read a `.gt3x` archive from any seekable source
pub fn read_gt3x_from<R: Read + Seek>(source: R) -> Result<Recording, PaatError> {
    let mut archive = ZipArchive::new(source)?;

    let info = read_entry(&mut archive, INFO_ENTRY)?;
    let metadata = Gt3xMetadata::parse(&String::from_utf8_lossy(&info));
    let sample_rate = metadata.sample_rate()?;
    let scale = metadata.acceleration_scale()?;

    let log = read_entry(&mut archive, LOG_ENTRY)?;
    let (time, acceleration) = parse_log(&log, sample_rate, scale)?;

    tracing::debug!(
        samples = time.len(),
        sample_rate,
        scale,
        serial = metadata.serial_number().unwrap_or("unknown"),
        "read GT3X recording"
    );

    Ok(Recording {
        time,
        acceleration,
        metadata: Some(metadata),
    })
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, PaatError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(PaatError::MissingEntry(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut buffer = Vec::new();
    entry.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Decode the acceleration samples of a `log.bin` stream
pub fn parse_log(
    data: &[u8],
    sample_rate: u32,
    scale: f64,
) -> Result<(Vec<DateTime<Utc>>, Vec<Acceleration>), PaatError> {
    let mut time = Vec::new();
    let mut acceleration: Vec<Acceleration> = Vec::new();
    let step_nanos = 1_000_000_000 / sample_rate as i64;
    let mut offset = 0;

    while offset < data.len() {
        let record = Record::parse(data, offset)?;
        offset += record.encoded_len();

        let samples = match record.kind {
            RECORD_ACTIVITY | RECORD_ACTIVITY2 if record.payload.len() <= 1 => {
                // Idle sleep mode: one second of the last known sample
                match acceleration.last() {
                    Some(&last) => vec![last; sample_rate as usize],
                    None => Vec::new(),
                }
            }
            RECORD_ACTIVITY => decode_activity(record.payload, scale),
            RECORD_ACTIVITY2 => decode_activity2(record.payload, scale),
            other => {
                tracing::trace!(kind = other, offset = record.offset, "skipping record");
                continue;
            }
        };

        let base = DateTime::from_timestamp(record.timestamp as i64, 0).ok_or_else(|| {
            PaatError::Record {
                offset: record.offset,
                message: format!("timestamp {} out of range", record.timestamp),
            }
        })?;

        for (i, sample) in samples.into_iter().enumerate() {
            time.push(base + Duration::nanoseconds(i as i64 * step_nanos));
            acceleration.push(sample);
        }
    }

    Ok((time, acceleration))
}

struct Record<'a> {
    offset: usize,
    kind: u8,
    timestamp: u32,
    payload: &'a [u8],
}

impl<'a> Record<'a> {
    fn parse(data: &'a [u8], offset: usize) -> Result<Self, PaatError> {
        let header = data
            .get(offset..offset + RECORD_HEADER_LEN)
            .ok_or_else(|| PaatError::Record {
                offset,
                message: format!(
                    "truncated header: need {} bytes, got {}",
                    RECORD_HEADER_LEN,
                    data.len() - offset
                ),
            })?;

        if header[0] != RECORD_SEPARATOR {
            return Err(PaatError::Record {
                offset,
                message: format!("expected separator 0x1e, got {:#04x}", header[0]),
            });
        }

        let kind = header[1];
        let timestamp = LittleEndian::read_u32(&header[2..6]);
        let size = LittleEndian::read_u16(&header[6..8]) as usize;

        let payload_start = offset + RECORD_HEADER_LEN;
        let checksum_at = payload_start + size;
        let checksum = *data.get(checksum_at).ok_or_else(|| PaatError::Record {
            offset,
            message: format!("truncated record: payload of {size} bytes runs past end of log"),
        })?;

        let expected = checksum_of(&data[offset..checksum_at]);
        if checksum != expected {
            return Err(PaatError::Checksum {
                offset,
                expected,
                got: checksum,
            });
        }

        Ok(Self {
            offset,
            kind,
            timestamp,
            payload: &data[payload_start..checksum_at],
        })
    }

    fn encoded_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len() + 1
    }
}

fn checksum_of(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// 12-bit two's-complement values packed MSB first, Y X Z per sample
fn decode_activity(payload: &[u8], scale: f64) -> Vec<Acceleration> {
    let values = payload.len() * 8 / 12;
    let mut reader = BitReader::new(payload);
    let mut samples = Vec::with_capacity(values / 3);

    for _ in 0..values / 3 {
        let mut sample = [0.0; 3];
        for value in sample.iter_mut() {
            let raw = reader.read12();
            let signed = if raw & 0x800 != 0 {
                raw as i32 - 0x1000
            } else {
                raw as i32
            };
            *value = signed as f64 / scale;
        }
        samples.push(sample);
    }

    samples
}

/// i16 LE values, X Y Z per sample, re-ordered to Y X Z
fn decode_activity2(payload: &[u8], scale: f64) -> Vec<Acceleration> {
    payload
        .chunks_exact(6)
        .map(|chunk| {
            let mut sample = [0.0; 3];
            sample[axis::X] = LittleEndian::read_i16(&chunk[0..2]) as f64 / scale;
            sample[axis::Y] = LittleEndian::read_i16(&chunk[2..4]) as f64 / scale;
            sample[axis::Z] = LittleEndian::read_i16(&chunk[4..6]) as f64 / scale;
            sample
        })
        .collect()
}

struct BitReader<'a> {
    data: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit: 0 }
    }

    /// Caller guarantees 12 bits remain
    fn read12(&mut self) -> u16 {
        let mut value = 0u16;
        for _ in 0..12 {
            let byte = self.data[self.bit / 8];
            let bit = (byte >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | bit as u16;
            self.bit += 1;
        }
        value
    }
}

/// [`RecordingReader`] for ActiGraph `.gt3x` files
pub struct Gt3xReader;

impl RecordingReader for Gt3xReader {
    fn format(&self) -> &'static str {
        "gt3x"
    }

    fn read_bytes(&self, bytes: &[u8]) -> Result<Recording, PaatError> {
        read_gt3x_from(Cursor::new(bytes))
    }

    fn read_path(&self, path: &Path) -> Result<Recording, PaatError> {
        read_gt3x(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    // 2024-01-15T08:00:00Z
    const T0: u32 = 1_705_305_600;

    fn encode_record(kind: u8, timestamp: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![RECORD_SEPARATOR, kind];
        bytes.extend_from_slice(&timestamp.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes.push(checksum_of(&bytes));
        bytes
    }

    fn pack12(values: &[i16]) -> Vec<u8> {
        let mut bits: Vec<u8> = Vec::new();
        for &v in values {
            let raw = (v as u16) & 0x0FFF;
            for shift in (0..12).rev() {
                bits.push(((raw >> shift) & 1) as u8);
            }
        }
        bits.chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &b)| acc | (b << (7 - i)))
            })
            .collect()
    }

    fn activity2(samples: &[[i16; 3]]) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|s| s.iter().flat_map(|v| v.to_le_bytes()))
            .collect()
    }

    fn build_archive(info: &str, log: &[u8]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(INFO_ENTRY, FileOptions::default()).unwrap();
        writer.write_all(info.as_bytes()).unwrap();
        writer.start_file(LOG_ENTRY, FileOptions::default()).unwrap();
        writer.write_all(log).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn info_txt(sample_rate: u32, scale: Option<f64>) -> String {
        let mut info = format!(
            "Serial Number: MOS2E22180349\nDevice Type: wGT3XBT\nFirmware: 1.9.2\nSample Rate: {sample_rate}\nStart Date: 638409024000000000\nTimeZone: 01:00:00\n"
        );
        if let Some(scale) = scale {
            info.push_str(&format!("Acceleration Scale: {scale}\n"));
        }
        info
    }

    #[test]
    fn test_metadata_parsing() {
        let metadata = Gt3xMetadata::parse(&info_txt(30, Some(256.0)));

        assert_eq!(metadata.serial_number(), Some("MOS2E22180349"));
        assert_eq!(metadata.device_type(), Some("wGT3XBT"));
        assert_eq!(metadata.firmware(), Some("1.9.2"));
        assert_eq!(metadata.time_zone(), Some("01:00:00"));
        assert_eq!(metadata.sample_rate().unwrap(), 30);
        assert_eq!(metadata.acceleration_scale().unwrap(), 256.0);
        assert_eq!(
            metadata.start_date(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap())
        );
        assert_eq!(metadata.stop_date(), None);
    }

    #[test]
    fn test_metadata_defaults_and_errors() {
        let metadata = Gt3xMetadata::parse("Sample Rate: abc\n");
        assert_eq!(metadata.acceleration_scale().unwrap(), LEGACY_ACCELERATION_SCALE);
        assert!(matches!(metadata.sample_rate(), Err(PaatError::Metadata(_))));
        assert!(Gt3xMetadata::parse("").sample_rate().is_err());
        assert!(Gt3xMetadata::parse("Sample Rate: 0").sample_rate().is_err());
        assert!(Gt3xMetadata::parse("Sample Rate: 100").sample_rate().is_ok());
        assert!(matches!(
            Gt3xMetadata::parse("Sample Rate: 4000000000").sample_rate(),
            Err(PaatError::Metadata(_))
        ));
    }

    #[test]
    fn test_ticks_conversion() {
        assert_eq!(
            ticks_to_datetime(TICKS_AT_UNIX_EPOCH),
            DateTime::from_timestamp(0, 0)
        );
        assert_eq!(ticks_to_datetime(0), None);
        assert_eq!(
            ticks_to_datetime(TICKS_AT_UNIX_EPOCH + 15),
            DateTime::from_timestamp(0, 1_500)
        );
    }

    #[test]
    fn test_decode_packed_activity() {
        let payload = pack12(&[256, -256, 0, 128, 2047, -2048]);
        let samples = decode_activity(&payload, 256.0);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], [1.0, -1.0, 0.0]);
        assert_abs_diff_eq!(samples[1][0], 0.5);
        assert_abs_diff_eq!(samples[1][1], 2047.0 / 256.0);
        assert_abs_diff_eq!(samples[1][2], -8.0);
    }

    #[test]
    fn test_decode_activity2_reorders_axes() {
        let samples = decode_activity2(&activity2(&[[256, 512, -256]]), 256.0);
        // stored X Y Z, returned Y X Z
        assert_eq!(samples, vec![[2.0, 1.0, -1.0]]);
    }

    #[test]
    fn test_parse_log_timestamps_and_idle() {
        let mut log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 256], [0, 128, 256]]));
        log.extend(encode_record(0x02, T0, &[0x10, 0x0F])); // battery, skipped
        log.extend(encode_record(RECORD_ACTIVITY2, T0 + 1, &[]));

        let (time, acc) = parse_log(&log, 2, 256.0).unwrap();

        assert_eq!(time.len(), 4);
        assert_eq!(acc.len(), 4);
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        assert_eq!(time[1], base + Duration::milliseconds(500));
        assert_eq!(time[2], base + Duration::seconds(1));
        assert_eq!(acc[1], [0.5, 0.0, 1.0]);
        // idle second repeats the last sample
        assert_eq!(acc[2], acc[1]);
        assert_eq!(acc[3], acc[1]);
    }

    #[test]
    fn test_idle_before_any_activity_yields_nothing() {
        let log = encode_record(RECORD_ACTIVITY, T0, &[0]);
        let (time, _) = parse_log(&log, 30, 256.0).unwrap();
        assert!(time.is_empty());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 256]]));
        let last = log.len() - 1;
        log[last] ^= 0xFF;

        assert!(matches!(
            parse_log(&log, 30, 256.0),
            Err(PaatError::Checksum { offset: 0, .. })
        ));
    }

    #[test]
    fn test_bad_separator_and_truncation() {
        let mut log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 256]]));
        log[0] = 0x00;
        assert!(matches!(parse_log(&log, 30, 256.0), Err(PaatError::Record { .. })));

        let log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 256]]));
        assert!(matches!(
            parse_log(&log[..log.len() - 2], 30, 256.0),
            Err(PaatError::Record { .. })
        ));
        assert!(matches!(parse_log(&log[..4], 30, 256.0), Err(PaatError::Record { .. })));
    }

    #[test]
    fn test_read_archive() {
        let log = encode_record(
            RECORD_ACTIVITY,
            T0,
            &pack12(&[0, 0, 256, 0, 0, 256, 0, 0, 256]),
        );
        let archive = build_archive(&info_txt(3, Some(256.0)), &log);

        let recording = Gt3xReader.read_bytes(&archive).unwrap();

        assert_eq!(recording.len(), 3);
        assert!(recording.acceleration.iter().all(|a| *a == [0.0, 0.0, 1.0]));
        let metadata = recording.metadata.unwrap();
        assert_eq!(metadata.serial_number(), Some("MOS2E22180349"));
    }

    #[test]
    fn test_read_archive_from_disk() {
        let log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 341]]));
        let archive = build_archive(&info_txt(1, None), &log);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.gt3x");
        std::fs::write(&path, archive).unwrap();

        let recording = read_gt3x(&path).unwrap();
        assert_eq!(recording.acceleration, vec![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_missing_log_entry() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(INFO_ENTRY, FileOptions::default()).unwrap();
        writer.write_all(info_txt(30, None).as_bytes()).unwrap();
        let archive = writer.finish().unwrap().into_inner();

        let err = read_gt3x_from(Cursor::new(archive)).unwrap_err();
        assert!(matches!(err, PaatError::MissingEntry(name) if name == LOG_ENTRY));
    }

    #[test]
    fn test_oversized_sample_rate_rejected_before_decoding() {
        let mut log = encode_record(RECORD_ACTIVITY2, T0, &activity2(&[[0, 0, 256]]));
        log.extend(encode_record(RECORD_ACTIVITY2, T0 + 1, &[]));
        let archive = build_archive(&info_txt(4_000_000_000, Some(256.0)), &log);

        assert!(matches!(
            Gt3xReader.read_bytes(&archive),
            Err(PaatError::Metadata(_))
        ));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Gt3xReader.read_bytes(b"definitely not a zip archive"),
            Err(PaatError::Archive(_))
        ));
    }
}
