//! Google encoded polyline format.
//!
//! Every point is stored as the difference from the previous one, in units of
//! 1e-5 degrees. Each signed delta is zig-zag mapped, split into 5-bit chunks
//! (least significant first), flagged with 0x20 when more chunks follow and
//! offset by 63 into printable ASCII.

use crate::entities::GeoPoint;
use crate::error::{decode_error, Error};

const PRECISION: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: u64 = 0x1f;
const CONTINUATION: u64 = 0x20;
const OFFSET: u8 = 63;
const MAX_BYTE: u8 = 126;

/// 7 chunks hold 35 bits, enough for any zig-zagged 32-bit delta.
const MAX_CHUNKS: usize = 7;

/// Decodes an encoded polyline into its points.
///
/// Fails on bytes outside the polyline alphabet, runs that never clear the
/// continuation bit, runs longer than a single delta can need, a latitude
/// without a matching longitude, and points outside valid WGS84 ranges.
pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, Error> {
    let bytes = encoded.as_bytes();

    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, index)?;
        if next >= bytes.len() {
            return Err(decode_error("latitude without longitude"));
        }

        let (delta_lng, next) = decode_value(bytes, next)?;
        index = next;

        lat += delta_lat;
        lng += delta_lng;

        let point = GeoPoint {
            lat: lat as f64 / PRECISION,
            lng: lng as f64 / PRECISION,
        };

        if !point.is_valid() {
            return Err(decode_error("coordinate out of range"));
        }

        points.push(point);
    }

    Ok(points)
}

/// Reads one zig-zagged value starting at `start`, returning it with the
/// index of the first unread byte.
fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), Error> {
    let mut result: u64 = 0;
    let mut shift = 0;
    let mut index = start;

    loop {
        if index - start == MAX_CHUNKS {
            return Err(decode_error("overlong run"));
        }

        let byte = *bytes
            .get(index)
            .ok_or_else(|| decode_error("truncated run"))?;

        if !(OFFSET..=MAX_BYTE).contains(&byte) {
            return Err(decode_error("byte outside polyline alphabet"));
        }

        let chunk = (byte - OFFSET) as u64;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        index += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1) as i64
    } else {
        (result >> 1) as i64
    };

    Ok((value, index))
}

/// Encodes points, rounding each coordinate to 1e-5 degrees.
pub fn encode(points: &[GeoPoint]) -> String {
    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;

        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lng - prev_lng, &mut encoded);

        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

fn encode_value(value: i64, encoded: &mut String) {
    let mut zigzag = if value < 0 {
        !(value << 1) as u64
    } else {
        (value << 1) as u64
    };

    while zigzag >= CONTINUATION {
        let chunk = (CONTINUATION | (zigzag & CHUNK_MASK)) as u8;
        encoded.push(char::from(chunk + OFFSET));
        zigzag >>= CHUNK_BITS;
    }

    encoded.push(char::from(zigzag as u8 + OFFSET));
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn assert_close(actual: &GeoPoint, lat: f64, lng: f64) {
        assert!(
            (actual.lat - lat).abs() < 1e-5 && (actual.lng - lng).abs() < 1e-5,
            "expected ({lat}, {lng}), got ({}, {})",
            actual.lat,
            actual.lng
        );
    }

    #[test]
    fn decodes_reference_fixture() {
        let points = decode(FIXTURE).unwrap();

        assert_eq!(points.len(), 3);
        assert_close(&points[0], 38.5, -120.2);
        assert_close(&points[1], 40.7, -120.95);
        assert_close(&points[2], 43.252, -126.453);
    }

    #[test]
    fn decodes_empty_string() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn encodes_reference_fixture() {
        let points = [
            GeoPoint { lat: 38.5, lng: -120.2 },
            GeoPoint { lat: 40.7, lng: -120.95 },
            GeoPoint { lat: 43.252, lng: -126.453 },
        ];

        assert_eq!(encode(&points), FIXTURE);
    }

    #[test]
    fn rejects_truncated_run() {
        let err = decode("_p~iF~ps|").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn rejects_dangling_latitude() {
        let err = decode("_p~iF").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn rejects_overlong_run() {
        let err = decode("~~~~~~~~~~~~?").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn rejects_bytes_outside_alphabet() {
        assert!(decode("_p~iF ps|U").unwrap_err().is_decode_error());
        assert!(decode("_p~iF~ps|\u{7f}").unwrap_err().is_decode_error());
    }

    #[test]
    fn rejects_out_of_range_points() {
        let encoded = encode(&[GeoPoint { lat: 95.0, lng: 0.0 }]);
        assert!(decode(&encoded).unwrap_err().is_decode_error());
    }

    #[test]
    fn decode_inverts_encode() {
        let points = vec![
            GeoPoint { lat: 55.67594, lng: 12.56553 },
            GeoPoint { lat: 55.67601, lng: 12.56541 },
            GeoPoint { lat: -33.86882, lng: 151.20929 },
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: -0.00001, lng: 179.99999 },
        ];

        let decoded = decode(&encode(&points)).unwrap();

        assert_eq!(decoded.len(), points.len());
        for (actual, expected) in decoded.iter().zip(&points) {
            assert_close(actual, expected.lat, expected.lng);
        }
    }
}
