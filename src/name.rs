//! Domain name codec: compression-aware encode/decode and canonical
//! comparison (spec.md §4.A).
//!
//! Grounded on the teacher's `dns/common.rs` label reader (pointer-following
//! loop, 0xC0 tag, hop cap) and `network_order/primitive.rs` in
//! `dandyvica-dnsquery`, generalized to emit compression pointers as well as
//! follow them — the teacher only implements the decode half.

use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::error::{DnsError, Result};

/// Maximum total wire length of a name, including the terminating root
/// octet (RFC 1035 §3.1).
pub const MAX_NAME_WIRE_LEN: usize = 255;
/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;
/// Pointer targets must land below this offset to be representable in the
/// 14-bit pointer field.
pub const MAX_COMPRESSIBLE_OFFSET: usize = 0x4000;
/// Bound on pointer hops while decoding, to reject loops without relying on
/// stack exhaustion (spec.md §9).
const MAX_POINTER_HOPS: u32 = 128;

/// An ordered sequence of DNS labels. Absolute (root-terminated) names are
/// the common case and are required by most APIs; relative names exist only
/// as an intermediate construction aid and cannot be encoded to wire form.
///
/// Comparison is case-insensitive over ASCII, but the original case of each
/// label is preserved for encoding (spec.md §3 "Name").
#[derive(Debug, Clone)]
pub struct Name {
    labels: Vec<Box<[u8]>>,
    absolute: bool,
}

impl Name {
    /// The root name ".".
    pub fn root() -> Self {
        Name {
            labels: Vec::new(),
            absolute: true,
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn labels(&self) -> &[Box<[u8]>] {
        &self.labels
    }

    /// Parse a dotted textual name. A trailing `.` marks it absolute;
    /// without one the name is relative (and cannot be put on the wire
    /// until anchored). `\DDD` and `\.`/`\\` escapes are accepted.
    pub fn from_ascii(s: &str) -> Result<Self> {
        if s == "." {
            return Ok(Name::root());
        }

        let mut labels = Vec::new();
        let mut current = Vec::new();
        let bytes = s.as_bytes();
        let mut i = 0;
        let absolute = s.ends_with('.') && !s.ends_with("\\.");
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    i += 1;
                    if i >= bytes.len() {
                        return Err(DnsError::illegal_argument("dangling escape in name"));
                    }
                    if bytes[i].is_ascii_digit() && i + 2 < bytes.len() {
                        let digits = &s[i..i + 3];
                        if let Ok(v) = digits.parse::<u16>() {
                            if v <= 255 {
                                current.push(v as u8);
                                i += 3;
                                continue;
                            }
                        }
                    }
                    current.push(bytes[i]);
                    i += 1;
                }
                b'.' => {
                    labels.push(current.clone().into_boxed_slice());
                    current.clear();
                    i += 1;
                }
                b => {
                    current.push(b);
                    i += 1;
                }
            }
        }
        if !current.is_empty() || !absolute {
            labels.push(current.into_boxed_slice());
        }

        for label in &labels {
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsError::illegal_argument(format!(
                    "label exceeds {MAX_LABEL_LEN} octets"
                )));
            }
        }
        let name = Name { labels, absolute };
        if name.wire_len() > MAX_NAME_WIRE_LEN {
            return Err(DnsError::illegal_argument(format!(
                "name exceeds {MAX_NAME_WIRE_LEN} wire octets"
            )));
        }
        Ok(name)
    }

    /// Uncompressed wire length (label length bytes + label bytes +
    /// terminating root octet).
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| 1 + l.len()).sum::<usize>() + 1
    }

    pub fn eq_ignore_case(&self, other: &Name) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    fn lowercased_labels(&self) -> Vec<Box<[u8]>> {
        self.labels
            .iter()
            .map(|l| l.to_ascii_lowercase().into_boxed_slice())
            .collect()
    }

    /// Canonical form per RFC 4034 §6.2: every label lower-cased, original
    /// absoluteness preserved. Used by canonical RDATA emission for DNSSEC
    /// digest/signature inputs (spec.md §4.B registry's "canonical-emit").
    pub fn to_canonical(&self) -> Name {
        Name {
            labels: self.lowercased_labels(),
            absolute: self.absolute,
        }
    }

    /// Encode this name onto `buf`, using (and contributing to) the
    /// compression table when `compress` is true. Per-type RDATA policy
    /// (spec.md §4.A/§4.B) decides whether `compress` is passed as true.
    pub fn encode(
        &self,
        buf: &mut Vec<u8>,
        table: &mut CompressionTable,
        compress: bool,
    ) -> Result<()> {
        if !self.absolute {
            return Err(DnsError::illegal_argument("cannot encode a relative name"));
        }
        let lowered = self.lowercased_labels();
        let mut idx = 0usize;
        while idx < self.labels.len() {
            if compress {
                if let Some(&offset) = table.lookup(&lowered[idx..]) {
                    buf.push(0xC0 | ((offset >> 8) as u8));
                    buf.push((offset & 0xFF) as u8);
                    return Ok(());
                }
                if buf.len() < MAX_COMPRESSIBLE_OFFSET {
                    table.insert(lowered[idx..].to_vec(), buf.len() as u16);
                }
            }
            let label = &self.labels[idx];
            buf.push(label.len() as u8);
            buf.extend_from_slice(label);
            idx += 1;
        }
        buf.push(0);
        Ok(())
    }

    /// Decode a name starting at the cursor's current position, following
    /// compression pointers within the full message buffer backing the
    /// cursor. Advances the cursor past the name's own bytes (not past any
    /// pointer target).
    pub fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let buf: &[u8] = cursor.get_ref();
        let mut labels: Vec<Box<[u8]>> = Vec::new();
        let mut pos = cursor.position() as usize;
        let mut hops = 0u32;
        let mut resume_at: Option<usize> = None;
        let mut total_len = 1usize; // account for the terminating root octet

        loop {
            if pos >= buf.len() {
                return Err(DnsError::malformed("name runs past end of message"));
            }
            let b = buf[pos];
            if b & 0xC0 == 0xC0 {
                if pos + 1 >= buf.len() {
                    return Err(DnsError::malformed("truncated compression pointer"));
                }
                let pointer = (((b as u16) & 0x3F) << 8) | buf[pos + 1] as u16;
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DnsError::malformed("compression pointer loop"));
                }
                pos = pointer as usize;
                continue;
            }
            if b & 0xC0 != 0 {
                return Err(DnsError::malformed("invalid label length tag"));
            }
            if b == 0 {
                if resume_at.is_none() {
                    resume_at = Some(pos + 1);
                }
                break;
            }
            let len = b as usize; // <= 63, since top two bits are clear
            pos += 1;
            if pos + len > buf.len() {
                return Err(DnsError::malformed("label runs past end of message"));
            }
            labels.push(buf[pos..pos + len].to_vec().into_boxed_slice());
            total_len += 1 + len;
            if total_len > MAX_NAME_WIRE_LEN {
                return Err(DnsError::malformed("name exceeds 255 wire octets"));
            }
            pos += len;
        }

        cursor.set_position(resume_at.unwrap() as u64);
        Ok(Name {
            labels,
            absolute: true,
        })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(if self.absolute { "." } else { "" });
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for &b in label.iter() {
                match b {
                    b'.' => f.write_str("\\.")?,
                    b'\\' => f.write_str("\\\\")?,
                    0x21..=0x7E => f.write_str(std::str::from_utf8(&[b]).unwrap())?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
        }
        if self.absolute {
            f.write_str(".")?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = DnsError;
    fn from_str(s: &str) -> Result<Self> {
        Name::from_ascii(s)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.eq_ignore_case(other)
    }
}
impl Eq for Name {}

/// Maps a lower-cased label suffix to the first wire offset it was seen at,
/// scoped to a single message encode (spec.md §4.A/§4.C).
#[derive(Debug, Default)]
pub struct CompressionTable {
    offsets: HashMap<Vec<Box<[u8]>>, u16>,
}

impl CompressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, suffix: &[Box<[u8]>]) -> Option<&u16> {
        self.offsets.get(suffix)
    }

    fn insert(&mut self, suffix: Vec<Box<[u8]>>, offset: u16) {
        self.offsets.entry(suffix).or_insert(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_name_encodes_to_single_zero_byte() {
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        Name::root().encode(&mut buf, &mut table, true).unwrap();
        assert_eq!(buf, vec![0]);
    }

    #[test]
    fn round_trips_through_wire_without_compression() {
        let name = Name::from_ascii("www.example.com.").unwrap();
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        name.encode(&mut buf, &mut table, false).unwrap();

        let mut cursor = Cursor::new(buf.as_slice());
        let decoded = Name::decode(&mut cursor).unwrap();
        assert!(name.eq_ignore_case(&decoded));
        assert_eq!(decoded.to_string(), "www.example.com.");
    }

    #[test]
    fn compression_pointer_is_followed() {
        // Pre-seed a buffer with "example.com." at offset 0, then a pointer to it.
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        let base = Name::from_ascii("example.com.").unwrap();
        base.encode(&mut buf, &mut table, true).unwrap();
        let pointer_at = buf.len();
        let www = Name::from_ascii("www.example.com.").unwrap();
        www.encode(&mut buf, &mut table, true).unwrap();

        // The second encode should have reused the suffix via a pointer,
        // making it much shorter than a second full encode would be.
        let mut cursor = Cursor::new(buf.as_slice());
        cursor.set_position(pointer_at as u64);
        let decoded = Name::decode(&mut cursor).unwrap();
        assert_eq!(decoded.to_string(), "www.example.com.");
    }

    #[test]
    fn rejects_pointer_loops() {
        // Byte 0: pointer to itself.
        let buf: Vec<u8> = vec![0xC0, 0x00];
        let mut cursor = Cursor::new(buf.as_slice());
        assert!(Name::decode(&mut cursor).is_err());
    }

    #[test]
    fn rejects_oversized_label() {
        let mut buf = vec![64u8]; // length 64 with top bits clear is invalid (max 63)
        buf.extend(std::iter::repeat(b'a').take(64));
        buf.push(0);
        let mut cursor = Cursor::new(buf.as_slice());
        assert!(Name::decode(&mut cursor).is_err());
    }

    #[test]
    fn to_canonical_lowercases_labels_without_changing_equality() {
        let name = Name::from_ascii("WWW.Example.COM.").unwrap();
        let canonical = name.to_canonical();
        assert_eq!(canonical.to_string(), "www.example.com.");
        assert!(name.eq_ignore_case(&canonical));
    }

    #[test]
    fn case_insensitive_compare_preserves_case_on_encode() {
        let a = Name::from_ascii("WWW.Example.COM.").unwrap();
        let b = Name::from_ascii("www.example.com.").unwrap();
        assert!(a.eq_ignore_case(&b));
        assert_eq!(a.to_string(), "WWW.Example.COM.");
    }
}
