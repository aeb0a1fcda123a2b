//! 12-octet message header (RFC 1035 §4.1.1), bit-packed with `bitstream-io`.
//!
//! Grounded on the teacher's `dns/header.rs`, which packs the same layout
//! but collapses the reserved Z field, AD and CD into a single 3-bit `z`.
//! spec.md §3 requires AD and CD as independently addressable flags, so they
//! are split out here and only the single reserved bit remains folded into
//! `z`.

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use std::io::Cursor;

use crate::dns::enums::OpCode;
use crate::error::{DnsError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: OpCode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: bool,
    pub ad: bool,
    pub cd: bool,
    /// Low 4 bits of the full rcode; the OPT record carries the high 8
    /// bits when EDNS is in play (spec.md §4.B "OPT").
    pub rcode_low: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut writer = BitWriter::endian(buf, BigEndian);
        writer
            .write_var::<u16>(16, self.id)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.qr as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(4, self.opcode.code())
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.aa as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.tc as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.rd as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.ra as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.z as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.ad as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(1, self.cd as u8)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u8>(4, self.rcode_low & 0x0F)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u16>(16, self.qdcount)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u16>(16, self.ancount)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u16>(16, self.nscount)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        writer
            .write_var::<u16>(16, self.arcount)
            .map_err(|e| DnsError::malformed(e.to_string()))?;
        Ok(())
    }

    pub fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let start = cursor.position();
        let remaining = &cursor.get_ref()[start as usize..];
        let mut reader = BitReader::endian(remaining, BigEndian);

        let id = reader
            .read_var::<u16>(16)
            .map_err(|_| DnsError::malformed("truncated header"))?;
        let qr = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let opcode = OpCode::from_code(
            reader
                .read_var::<u8>(4)
                .map_err(|_| DnsError::malformed("truncated header"))?,
        );
        let aa = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let tc = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let rd = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let ra = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let z = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let ad = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let cd = reader.read_var::<u8>(1).map_err(|_| DnsError::malformed("truncated header"))? == 1;
        let rcode_low = reader
            .read_var::<u8>(4)
            .map_err(|_| DnsError::malformed("truncated header"))?;
        let qdcount = reader
            .read_var::<u16>(16)
            .map_err(|_| DnsError::malformed("truncated header"))?;
        let ancount = reader
            .read_var::<u16>(16)
            .map_err(|_| DnsError::malformed("truncated header"))?;
        let nscount = reader
            .read_var::<u16>(16)
            .map_err(|_| DnsError::malformed("truncated header"))?;
        let arcount = reader
            .read_var::<u16>(16)
            .map_err(|_| DnsError::malformed("truncated header"))?;

        cursor.set_position(start + 12);
        Ok(Header {
            id,
            qr,
            opcode,
            aa,
            tc,
            rd,
            ra,
            z,
            ad,
            cd,
            rcode_low,
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}
