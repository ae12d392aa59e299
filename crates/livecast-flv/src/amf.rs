//! Minimal AMF0 writers for SCRIPTDATA payloads.
//!
//! Only the subset the `onMetaData` tag needs: strings, number and
//! boolean object properties, ECMA array framing and the object-end
//! marker.

use bytes::{BufMut, BytesMut};

const MARKER_NUMBER: u8 = 0x00;
const MARKER_BOOLEAN: u8 = 0x01;
const MARKER_STRING: u8 = 0x02;
const MARKER_ECMA_ARRAY: u8 = 0x08;

fn put_utf8(buf: &mut BytesMut, value: &str) {
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

/// Write a marked AMF0 string value.
pub fn write_string(buf: &mut BytesMut, value: &str) {
    buf.put_u8(MARKER_STRING);
    put_utf8(buf, value);
}

/// Write an ECMA array header with the given element count.
pub fn write_ecma_array_header(buf: &mut BytesMut, count: u32) {
    buf.put_u8(MARKER_ECMA_ARRAY);
    buf.put_u32(count);
}

/// Write a named number property (8-byte IEEE-754 big-endian).
pub fn write_number_property(buf: &mut BytesMut, key: &str, value: f64) {
    put_utf8(buf, key);
    buf.put_u8(MARKER_NUMBER);
    buf.put_f64(value);
}

/// Write a named boolean property.
pub fn write_boolean_property(buf: &mut BytesMut, key: &str, value: bool) {
    put_utf8(buf, key);
    buf.put_u8(MARKER_BOOLEAN);
    buf.put_u8(u8::from(value));
}

/// Write the object-end marker that closes an ECMA array.
pub fn write_object_end(buf: &mut BytesMut) {
    buf.put_slice(&[0x00, 0x00, 0x09]);
}
