//! Packed event log record decoding.
//!
//! A payload read from a source holds zero or more records packed back to
//! back. Each record starts with a fixed 56-byte little-endian header whose
//! `length` field is the authoritative total span of the record (header plus
//! all variable sections); the next record starts exactly `length` bytes
//! after the current one. Variable sections (security identifier, binary
//! data, message strings) are located by offsets relative to the record
//! start and are validated against `length` before being read.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::types::EventType;

/// Size of the fixed record header in bytes.
pub const HEADER_LEN: usize = 56;

/// Marker value carried in the `reserved` header field by real logs.
pub const RECORD_MAGIC: u32 = 0x654c_664c;

/// One decoded record out of a packed payload.
///
/// Header fields are kept verbatim; the variable sections are copied out of
/// the payload after bounds validation. The strings section runs from
/// `string_offset` through the end of the record and holds `num_strings`
/// NUL-terminated UTF-16LE strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogRecord {
    pub length: u32,
    pub reserved: u32,
    pub record_number: u32,
    pub time_generated: u32,
    pub time_written: u32,
    pub event_id: u32,
    pub event_type: u16,
    pub num_strings: u16,
    pub event_category: u16,
    pub reserved_flags: u16,
    pub closing_record_number: u32,
    pub string_offset: u32,
    pub user_sid_length: u32,
    pub user_sid_offset: u32,
    pub data_length: u32,
    pub data_offset: u32,

    /// Raw strings section: the bytes from `string_offset` to `length`.
    pub strings_raw: Vec<u8>,

    /// Security identifier bytes, when the record carries one.
    pub user_sid: Option<Vec<u8>>,

    /// Event-specific binary data, when the record carries any.
    pub data: Option<Vec<u8>>,
}

impl EventLogRecord {
    /// Severity class of this record.
    pub fn event_type(&self) -> EventType {
        EventType::from_raw(self.event_type)
    }

    /// Decode the strings section into `num_strings` UTF-16LE strings.
    ///
    /// Undecodable units are replaced, never dropped; a strings section
    /// shorter than `num_strings` yields however many strings it holds.
    pub fn strings(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.num_strings as usize);
        let mut units: Vec<u16> = Vec::new();

        for pair in self.strings_raw.chunks_exact(2) {
            if out.len() == self.num_strings as usize {
                break;
            }
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            if unit == 0 {
                out.push(String::from_utf16_lossy(&units));
                units.clear();
            } else {
                units.push(unit);
            }
        }
        out
    }

    /// Build a well-formed record for synthetic feeds and tests.
    ///
    /// Offsets and `length` are filled in by [`encode`]; the strings are
    /// stored NUL-terminated UTF-16LE as a real log would write them.
    pub fn synthetic(
        record_number: u32,
        event_id: u32,
        event_type: EventType,
        strings: &[&str],
    ) -> Self {
        let mut strings_raw = Vec::new();
        for s in strings {
            for unit in s.encode_utf16() {
                strings_raw.extend_from_slice(&unit.to_le_bytes());
            }
            strings_raw.extend_from_slice(&0u16.to_le_bytes());
        }

        Self {
            reserved: RECORD_MAGIC,
            record_number,
            event_id,
            event_type: event_type.as_raw(),
            num_strings: strings.len() as u16,
            strings_raw,
            ..Self::default()
        }
    }
}

/// Encode a record into the packed wire layout.
///
/// Section offsets and the total `length` are computed from the variable
/// sections actually present, overriding whatever the input carries; the
/// returned buffer decodes back to a record with those computed values.
pub fn encode(record: &EventLogRecord) -> Vec<u8> {
    let sid_len = record.user_sid.as_ref().map_or(0, Vec::len);
    let data_len = record.data.as_ref().map_or(0, Vec::len);

    let sid_offset = HEADER_LEN;
    let data_offset = sid_offset + sid_len;
    let string_offset = data_offset + data_len;
    let length = string_offset + record.strings_raw.len();

    let mut buf = Vec::with_capacity(length);
    buf.extend_from_slice(&(length as u32).to_le_bytes());
    buf.extend_from_slice(&record.reserved.to_le_bytes());
    buf.extend_from_slice(&record.record_number.to_le_bytes());
    buf.extend_from_slice(&record.time_generated.to_le_bytes());
    buf.extend_from_slice(&record.time_written.to_le_bytes());
    buf.extend_from_slice(&record.event_id.to_le_bytes());
    buf.extend_from_slice(&record.event_type.to_le_bytes());
    buf.extend_from_slice(&record.num_strings.to_le_bytes());
    buf.extend_from_slice(&record.event_category.to_le_bytes());
    buf.extend_from_slice(&record.reserved_flags.to_le_bytes());
    buf.extend_from_slice(&record.closing_record_number.to_le_bytes());
    buf.extend_from_slice(&(string_offset as u32).to_le_bytes());
    buf.extend_from_slice(&(sid_len as u32).to_le_bytes());
    let sid_offset = if sid_len > 0 { sid_offset } else { 0 };
    buf.extend_from_slice(&(sid_offset as u32).to_le_bytes());
    buf.extend_from_slice(&(data_len as u32).to_le_bytes());
    let data_offset = if data_len > 0 { data_offset } else { 0 };
    buf.extend_from_slice(&(data_offset as u32).to_le_bytes());

    if let Some(sid) = &record.user_sid {
        buf.extend_from_slice(sid);
    }
    if let Some(data) = &record.data {
        buf.extend_from_slice(data);
    }
    buf.extend_from_slice(&record.strings_raw);
    buf
}

/// Walk all records packed inside `payload`.
///
/// The iterator is lazy and restartable: decoding the same payload twice
/// yields identical results. It ends silently at the first truncated record
/// (declared `length` running past the payload) and yields one terminal
/// [`RecordError::MalformedRecord`] for a record whose header contradicts
/// its own bounds.
pub fn decode(payload: &[u8]) -> RecordIter<'_> {
    RecordIter {
        payload,
        cursor: 0,
        done: false,
    }
}

/// Decode exactly one record at the start of `payload`.
///
/// Fails with [`RecordError::BufferTooSmall`] if the payload cannot hold a
/// header. Used when the caller already knows the buffer holds a single
/// record; the record's sections are bounded by the payload even if the
/// declared `length` runs past it.
pub fn parse_record(payload: &[u8]) -> Result<EventLogRecord, RecordError> {
    if payload.len() < HEADER_LEN {
        return Err(RecordError::BufferTooSmall { need: HEADER_LEN });
    }
    let length = read_u32(payload, 0) as usize;
    check_declared_length(length)?;
    decode_at(payload, 0, length.min(payload.len()))
}

/// Iterator over the records packed inside one payload.
pub struct RecordIter<'a> {
    payload: &'a [u8],
    cursor: usize,
    done: bool,
}

impl Iterator for RecordIter<'_> {
    type Item = Result<EventLogRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cursor + HEADER_LEN > self.payload.len() {
            self.done = true;
            return None;
        }

        let length = read_u32(self.payload, self.cursor) as usize;
        if let Err(err) = check_declared_length(length) {
            // A zero or short length means the cursor can never advance
            // trustworthily; stop after reporting.
            self.done = true;
            return Some(Err(err));
        }
        if self.cursor + length > self.payload.len() {
            // Truncated trailing record: end of usable data.
            self.done = true;
            return None;
        }

        match decode_at(self.payload, self.cursor, length) {
            Ok(record) => {
                self.cursor += length;
                Some(Ok(record))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn check_declared_length(length: usize) -> Result<(), RecordError> {
    if length == 0 {
        return Err(RecordError::MalformedRecord("record length is zero".into()));
    }
    if length < HEADER_LEN {
        return Err(RecordError::MalformedRecord(format!(
            "record length {length} is shorter than the {HEADER_LEN}-byte header"
        )));
    }
    Ok(())
}

/// Decode the record spanning `payload[start..start + span]`.
///
/// The caller guarantees `span >= HEADER_LEN` and that the span lies within
/// the payload; every section offset is validated against `span` here.
fn decode_at(payload: &[u8], start: usize, span: usize) -> Result<EventLogRecord, RecordError> {
    let rec = &payload[start..start + span];

    let mut record = EventLogRecord {
        length: read_u32(rec, 0),
        reserved: read_u32(rec, 4),
        record_number: read_u32(rec, 8),
        time_generated: read_u32(rec, 12),
        time_written: read_u32(rec, 16),
        event_id: read_u32(rec, 20),
        event_type: read_u16(rec, 24),
        num_strings: read_u16(rec, 26),
        event_category: read_u16(rec, 28),
        reserved_flags: read_u16(rec, 30),
        closing_record_number: read_u32(rec, 32),
        string_offset: read_u32(rec, 36),
        user_sid_length: read_u32(rec, 40),
        user_sid_offset: read_u32(rec, 44),
        data_length: read_u32(rec, 48),
        data_offset: read_u32(rec, 52),
        ..EventLogRecord::default()
    };

    let string_offset = record.string_offset as usize;
    if string_offset < HEADER_LEN || string_offset > span {
        return Err(RecordError::MalformedRecord(format!(
            "string offset {string_offset} outside record of {span} bytes"
        )));
    }
    record.strings_raw = rec[string_offset..].to_vec();

    record.user_sid = section(rec, record.user_sid_offset, record.user_sid_length, "sid")?;
    record.data = section(rec, record.data_offset, record.data_length, "data")?;

    Ok(record)
}

/// Copy an optional variable section out of the record slice.
fn section(rec: &[u8], offset: u32, len: u32, what: &str) -> Result<Option<Vec<u8>>, RecordError> {
    if len == 0 {
        return Ok(None);
    }
    let offset = offset as usize;
    let len = len as usize;
    let end = offset.checked_add(len).filter(|end| *end <= rec.len());
    match end {
        Some(end) if offset >= HEADER_LEN => Ok(Some(rec[offset..end].to_vec())),
        _ => Err(RecordError::MalformedRecord(format!(
            "{what} section at {offset}+{len} outside record of {} bytes",
            rec.len()
        ))),
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(record_number: u32, strings: &[&str]) -> Vec<u8> {
        encode(&EventLogRecord::synthetic(
            record_number,
            4242,
            EventType::Information,
            strings,
        ))
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut record = EventLogRecord::synthetic(7, 123_432, EventType::Warning, &["one", "two"]);
        record.time_generated = 1_700_000_000;
        record.event_category = 3;
        record.user_sid = Some(vec![1, 5, 0, 0, 0, 0, 0, 5]);
        record.data = Some(vec![0xde, 0xad, 0xbe, 0xef]);

        let buf = encode(&record);
        let decoded = parse_record(&buf).unwrap();

        assert_eq!(decoded.length as usize, buf.len());
        assert_eq!(decoded.reserved, RECORD_MAGIC);
        assert_eq!(decoded.record_number, 7);
        assert_eq!(decoded.time_generated, 1_700_000_000);
        assert_eq!(decoded.event_id, 123_432);
        assert_eq!(decoded.event_type(), EventType::Warning);
        assert_eq!(decoded.num_strings, 2);
        assert_eq!(decoded.event_category, 3);
        assert_eq!(decoded.user_sid, record.user_sid);
        assert_eq!(decoded.data, record.data);
        assert_eq!(decoded.strings(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_decode_packed_records_in_order() {
        let mut payload = Vec::new();
        for n in 1..=4u32 {
            payload.extend_from_slice(&sample(n, &["msg"]));
        }

        let records: Vec<_> = decode(&payload).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 4);
        let numbers: Vec<u32> = records.iter().map(|r| r.record_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_is_restartable() {
        let payload = sample(1, &["hello"]);
        let first: Vec<_> = decode(&payload).collect();
        let second: Vec<_> = decode(&payload).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_truncated_record_stops_decoding() {
        let mut payload = sample(1, &["kept"]);
        let mut truncated = sample(2, &["lost"]);
        truncated.truncate(truncated.len() - 1);
        payload.extend_from_slice(&truncated);

        let records: Vec<_> = decode(&payload).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_number, 1);
    }

    #[test]
    fn test_zero_length_record_is_malformed_not_a_loop() {
        let mut payload = sample(1, &[]);
        payload.extend_from_slice(&[0u8; HEADER_LEN]);

        let mut iter = decode(&payload);
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next(),
            Some(Err(RecordError::MalformedRecord(_)))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_string_offset_outside_record_is_malformed() {
        let mut buf = sample(1, &["x"]);
        let bogus = (buf.len() as u32 + 100).to_le_bytes();
        buf[36..40].copy_from_slice(&bogus);

        assert!(matches!(
            parse_record(&buf),
            Err(RecordError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_sid_section_outside_record_is_malformed() {
        let mut record = EventLogRecord::synthetic(1, 1, EventType::Error, &[]);
        record.user_sid = Some(vec![0u8; 8]);
        let mut buf = encode(&record);
        // Point the SID past the end of the record.
        let len = buf.len() as u32;
        buf[44..48].copy_from_slice(&len.to_le_bytes());

        assert!(matches!(
            parse_record(&buf),
            Err(RecordError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_strings_raw_spans_offset_to_length() {
        let record = EventLogRecord::synthetic(1, 1, EventType::Information, &["ab"]);
        let buf = encode(&record);
        let decoded = parse_record(&buf).unwrap();

        let start = decoded.string_offset as usize;
        let end = decoded.length as usize;
        assert_eq!(decoded.strings_raw, buf[start..end].to_vec());
    }

    #[test]
    fn test_parse_record_needs_a_full_header() {
        let err = parse_record(&[0u8; HEADER_LEN - 1]).unwrap_err();
        assert_eq!(err, RecordError::BufferTooSmall { need: HEADER_LEN });
    }

    #[test]
    fn test_empty_payload_yields_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let record = EventLogRecord::synthetic(9, 55, EventType::AuditSuccess, &["s"]);
        let json = serde_json::to_string(&record).unwrap();
        let back: EventLogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
