//! Resource record: owner name + type/class/ttl + [`RData`] (spec.md §3
//! "Record").

use std::io::Cursor;

use crate::dns::enums::{RecordClass, RecordType};
use crate::dns::question::{read_u16, read_u32};
use crate::dns::rdata::RData;
use crate::error::{DnsError, Result};
use crate::name::{CompressionTable, Name};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: Name,
    pub class: RecordClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl Record {
    pub fn new(name: Name, class: RecordClass, ttl: u32, rdata: RData) -> Self {
        Record {
            name,
            class,
            ttl,
            rdata,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.rdata.record_type()
    }

    pub fn encode(&self, buf: &mut Vec<u8>, table: &mut CompressionTable) -> Result<()> {
        let rtype = self.record_type();
        if rtype == RecordType::OPT {
            // RFC 6891 §6.1.2: OPT owner name must be the root.
            Name::root().encode(buf, table, false)?;
        } else {
            self.name.encode(buf, table, true)?;
        }
        buf.extend_from_slice(&rtype.code().to_be_bytes());
        buf.extend_from_slice(&self.class.code().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());

        let rdlength_at = buf.len();
        buf.extend_from_slice(&0u16.to_be_bytes());
        let rdata_start = buf.len();
        self.rdata.encode(buf, table)?;
        let rdlength = (buf.len() - rdata_start) as u16;
        buf[rdlength_at..rdlength_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }

    /// RFC 4034 §6.2 canonical form: lower-cased owner name, lower-cased
    /// embedded RDATA names, no compression anywhere (spec.md §4.B
    /// registry's "canonical-emit" entry). This crate emits canonical form
    /// for digest/signature input but does not itself validate DNSSEC
    /// signatures (Non-goal).
    pub fn canonical_encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        let mut table = CompressionTable::new();
        let rtype = self.record_type();
        self.name.to_canonical().encode(buf, &mut table, false)?;
        buf.extend_from_slice(&rtype.code().to_be_bytes());
        buf.extend_from_slice(&self.class.code().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());

        let rdlength_at = buf.len();
        buf.extend_from_slice(&0u16.to_be_bytes());
        let rdata_start = buf.len();
        self.rdata.canonical_encode(buf)?;
        let rdlength = (buf.len() - rdata_start) as u16;
        buf[rdlength_at..rdlength_at + 2].copy_from_slice(&rdlength.to_be_bytes());
        Ok(())
    }

    pub fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let name = Name::decode(cursor)?;
        let rtype = RecordType::from_code(read_u16(cursor)?);
        let class_code = read_u16(cursor)?;
        let ttl = read_u32(cursor)?;
        let rdlength = read_u16(cursor)?;
        let rdata = RData::decode(cursor, rtype, class_code, ttl, rdlength)?;
        let class = if rtype == RecordType::OPT {
            RecordClass::IN // payload size lives in RData::Opt; class slot is repurposed on the wire
        } else {
            RecordClass::from_code(class_code)
        };
        Ok(Record {
            name,
            class,
            ttl,
            rdata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn a_record_round_trips() {
        let record = Record::new(
            Name::from_ascii("www.example.com.").unwrap(),
            RecordClass::IN,
            300,
            RData::A(Ipv4Addr::new(192, 0, 2, 1)),
        );
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        record.encode(&mut buf, &mut table).unwrap();

        let mut cursor = Cursor::new(buf.as_slice());
        let decoded = Record::decode(&mut cursor).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn opt_owner_name_is_forced_to_root() {
        let record = Record::new(
            Name::from_ascii("ignored.example.").unwrap(),
            RecordClass::from_code(4096),
            0,
            RData::Opt {
                udp_payload_size: 4096,
                extended_rcode: 0,
                version: 0,
                dnssec_ok: false,
                options: Vec::new(),
            },
        );
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        record.encode(&mut buf, &mut table).unwrap();
        assert_eq!(buf[0], 0); // root name: single zero byte
    }

    #[test]
    fn canonical_encode_lowercases_owner_name() {
        let record = Record::new(
            Name::from_ascii("WWW.Example.COM.").unwrap(),
            RecordClass::IN,
            300,
            RData::A(Ipv4Addr::new(192, 0, 2, 1)),
        );
        let mut buf = Vec::new();
        record.canonical_encode(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf.as_slice());
        let decoded = Record::decode(&mut cursor).unwrap();
        assert_eq!(decoded.name.to_string(), "www.example.com.");
    }

    #[test]
    fn rejects_truncated_rdlength() {
        let mut buf = Vec::new();
        let mut table = CompressionTable::new();
        Name::from_ascii("x.").unwrap().encode(&mut buf, &mut table, false).unwrap();
        buf.extend_from_slice(&1u16.to_be_bytes()); // A
        buf.extend_from_slice(&1u16.to_be_bytes()); // IN
        buf.extend_from_slice(&0u32.to_be_bytes()); // ttl
        buf.extend_from_slice(&10u16.to_be_bytes()); // rdlength says 10
        buf.extend_from_slice(&[1, 2, 3]); // but only 3 bytes follow

        let mut cursor = Cursor::new(buf.as_slice());
        assert!(Record::decode(&mut cursor).is_err());
    }
}
