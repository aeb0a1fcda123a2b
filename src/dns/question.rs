//! Question section entry (RFC 1035 §4.1.2).
//!
//! Grounded on the teacher's `dns/question.rs`, replacing its `Vec<String>`
//! label storage (lossy: it cannot hold binary or dot-escaped labels) with
//! the [`Name`] codec shared by the rest of the message.

use std::io::Cursor;

use crate::dns::enums::{RecordClass, RecordType};
use crate::error::Result;
use crate::name::{CompressionTable, Name};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(qname: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    pub fn encode(&self, buf: &mut Vec<u8>, table: &mut CompressionTable) -> Result<()> {
        self.qname.encode(buf, table, true)?;
        buf.extend_from_slice(&self.qtype.code().to_be_bytes());
        buf.extend_from_slice(&self.qclass.code().to_be_bytes());
        Ok(())
    }

    pub fn decode(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let qname = Name::decode(cursor)?;
        let qtype = RecordType::from_code(read_u16(cursor)?);
        let qclass = RecordClass::from_code(read_u16(cursor)?);
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }
}

pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    use crate::error::DnsError;
    use std::io::Read;
    let mut b = [0u8; 2];
    cursor
        .read_exact(&mut b)
        .map_err(|_| DnsError::malformed("truncated field"))?;
    Ok(u16::from_be_bytes(b))
}

pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    use crate::error::DnsError;
    use std::io::Read;
    let mut b = [0u8; 4];
    cursor
        .read_exact(&mut b)
        .map_err(|_| DnsError::malformed("truncated field"))?;
    Ok(u32::from_be_bytes(b))
}
