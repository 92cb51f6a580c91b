//! FITS primary HDU reader and writer.
//!
//! A FITS file is a sequence of 2880 byte blocks. The header is made of
//! 80 byte ASCII cards (`KEYWORD = value / comment`) terminated by an `END`
//! card, and the data unit follows on the next block boundary as big-endian
//! integers. Unsigned 16-bit cameras store `value - 32768` as `i16` with
//! `BZERO = 32768`.

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::reader::RawFrameReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawFrame};

pub const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// Reader for single-image FITS files as delivered by INDI camera drivers.
pub struct FitsReader;

/// Header keywords in file order, values with comments and quotes stripped.
#[derive(Debug, Default)]
struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    fn get(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn integer(&self, key: &str) -> Result<Option<i64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        if let Ok(v) = value.parse::<i64>() {
            return Ok(Some(v));
        }
        // Writers sometimes emit integral keywords as reals, e.g. `32768.0`
        match value.replace(['D', 'd'], "E").parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
            _ => Err(ConversionError::DecodeError(format!(
                "{key} is not an integer: {value}"
            ))),
        }
    }

    fn require_integer(&self, key: &str) -> Result<i64> {
        self.integer(key)?
            .ok_or_else(|| ConversionError::DecodeError(format!("missing {key} keyword")))
    }

    fn real(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|value| {
                value.replace(['D', 'd'], "E").parse::<f64>().map_err(|_| {
                    ConversionError::DecodeError(format!("{key} is not a number: {value}"))
                })
            })
            .transpose()
    }
}

/// Extracts the value field of a card, dropping the inline comment.
fn parse_value(field: &str) -> String {
    let field = field.trim_start();
    if let Some(rest) = field.strip_prefix('\'') {
        // Quotes inside strings are escaped by doubling them
        let mut value = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        return value.trim_end().to_string();
    }

    field
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Parses header cards up to `END`, returning them with the byte offset of
/// the data unit.
fn parse_header(data: &[u8]) -> Result<(Header, usize)> {
    let mut header = Header::default();

    for (block_index, block) in data.chunks(BLOCK_SIZE).enumerate() {
        if block.len() < BLOCK_SIZE {
            break;
        }
        for card in block.chunks_exact(CARD_SIZE) {
            if !card.is_ascii() {
                return Err(ConversionError::DecodeError("non-ASCII header card".to_string()));
            }
            let card = std::str::from_utf8(card)
                .map_err(|e| ConversionError::DecodeError(e.to_string()))?;
            let keyword = card[..8].trim();

            if keyword == "END" {
                return Ok((header, (block_index + 1) * BLOCK_SIZE));
            }
            if keyword.is_empty() || &card[8..10] != "= " {
                // COMMENT, HISTORY and blank cards carry no value
                continue;
            }
            header
                .cards
                .push((keyword.to_string(), parse_value(&card[10..])));
        }
    }

    Err(ConversionError::DecodeError(
        "header has no END card".to_string(),
    ))
}

impl RawFrameReader for FitsReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawFrame> {
        debug!("Decoding FITS image, {} bytes", data.len());

        let (header, data_offset) = parse_header(data)?;

        if header.get("SIMPLE") != Some("T") {
            return Err(ConversionError::DecodeError(
                "not a standard FITS file (SIMPLE != T)".to_string(),
            ));
        }

        let naxis = header.require_integer("NAXIS")?;
        if naxis != 2 {
            return Err(ConversionError::UnsupportedFormat(format!(
                "NAXIS = {naxis}, expected a single 2-D image"
            )));
        }

        let bitpix = header.require_integer("BITPIX")?;
        if !matches!(bitpix, 8 | 16 | 32) {
            return Err(ConversionError::UnsupportedFormat(format!("BITPIX = {bitpix}")));
        }

        if let Some(bscale) = header.real("BSCALE")? {
            if bscale != 1.0 {
                return Err(ConversionError::UnsupportedFormat(format!("BSCALE = {bscale}")));
            }
        }
        let bzero = header.integer("BZERO")?.unwrap_or(0);

        let width = header.require_integer("NAXIS1")?;
        let height = header.require_integer("NAXIS2")?;
        let (width, height) = match (usize::try_from(width), usize::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(ConversionError::DecodeError(format!(
                    "negative axis length {width}x{height}"
                )));
            }
        };

        let bytes_per_sample = (bitpix / 8) as usize;
        let data_end = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(bytes_per_sample))
            .and_then(|len| len.checked_add(data_offset).map(|end| (len, end)));
        let Some((data_len, data_end)) = data_end else {
            return Err(ConversionError::DecodeError(format!(
                "axis lengths {width}x{height} overflow the data unit size"
            )));
        };
        let payload = data
            .get(data_offset..data_end)
            .ok_or_else(|| {
                ConversionError::DecodeError(format!(
                    "data unit truncated: expected {} bytes after offset {}, got {}",
                    data_len,
                    data_offset,
                    data.len().saturating_sub(data_offset)
                ))
            })?;

        let physical = |stored: i64| stored.saturating_add(bzero).clamp(0, u32::MAX as i64) as u32;
        let samples: Vec<u32> = match bitpix {
            8 => payload.iter().map(|&b| physical(b as i64)).collect(),
            16 => payload
                .chunks_exact(2)
                .map(|b| physical(i16::from_be_bytes([b[0], b[1]]) as i64))
                .collect(),
            _ => payload
                .chunks_exact(4)
                .map(|b| physical(i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64))
                .collect(),
        };

        let cfa = match header.get("BAYERPAT") {
            Some(pattern) => {
                let x_offset = header.integer("XBAYROFF")?.unwrap_or(0);
                let y_offset = header.integer("YBAYROFF")?.unwrap_or(0);
                Some(pattern.parse::<CfaPattern>()?.shifted(x_offset, y_offset))
            }
            None => None,
        };

        debug!(
            width,
            height,
            bitpix,
            bzero,
            cfa = ?cfa,
            "Decoded FITS primary HDU"
        );

        Ok(RawFrame {
            width,
            height,
            data: samples,
            bits_per_sample: bitpix as u32,
            cfa,
        })
    }
}

fn value_card(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= {value:>20}")
}

fn string_card(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= '{value:<8}'")
}

/// Encodes a frame as a FITS primary HDU.
///
/// Frames of up to 8 bits are written as `BITPIX = 8`, up to 16 bits as
/// `BITPIX = 16` with `BZERO = 32768`, anything wider as `BITPIX = 32` with
/// `BZERO = 2147483648`. The mosaic phase, when known, goes into `BAYERPAT`.
pub fn encode_fits(frame: &RawFrame) -> Result<Vec<u8>> {
    if frame.data.len() != frame.pixel_count() {
        return Err(ConversionError::InvalidDimensions(frame.width, frame.height));
    }

    let (bitpix, bzero): (i64, i64) = match frame.bits_per_sample {
        0..=8 => (8, 0),
        9..=16 => (16, 1 << 15),
        _ => (32, 1 << 31),
    };

    let mut cards = vec![
        value_card("SIMPLE", "T"),
        value_card("BITPIX", &bitpix.to_string()),
        value_card("NAXIS", "2"),
        value_card("NAXIS1", &frame.width.to_string()),
        value_card("NAXIS2", &frame.height.to_string()),
    ];
    if bzero != 0 {
        cards.push(value_card("BZERO", &bzero.to_string()));
        cards.push(value_card("BSCALE", "1"));
    }
    if let Some(cfa) = frame.cfa {
        cards.push(string_card("BAYERPAT", cfa.as_str()));
        cards.push(value_card("XBAYROFF", "0"));
        cards.push(value_card("YBAYROFF", "0"));
    }
    cards.push("END".to_string());

    let mut out = Vec::with_capacity(BLOCK_SIZE * 2 + frame.data.len() * (bitpix as usize / 8));
    for card in &cards {
        out.extend_from_slice(card.as_bytes());
        out.resize(out.len() + CARD_SIZE - card.len(), b' ');
    }
    out.resize(out.len().next_multiple_of(BLOCK_SIZE), b' ');

    for &sample in &frame.data {
        match bitpix {
            8 => out.push(sample.min(u8::MAX as u32) as u8),
            16 => {
                let stored = (sample.min(u16::MAX as u32) as i64 - bzero) as i16;
                out.extend_from_slice(&stored.to_be_bytes());
            }
            _ => {
                let stored = (sample as i64 - bzero) as i32;
                out.extend_from_slice(&stored.to_be_bytes());
            }
        }
    }
    out.resize(out.len().next_multiple_of(BLOCK_SIZE), 0);

    Ok(out)
}
