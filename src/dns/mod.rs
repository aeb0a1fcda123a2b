//! DNS wire format: header, question, resource records, and the top-level
//! message envelope that ties them together with TSIG/EDNS (spec.md §3/§4).

pub mod enums;
pub mod header;
pub mod message;
pub mod question;
pub mod rdata;
pub mod rr;
pub mod text;

pub use enums::{OpCode, RecordClass, RecordType, ResponseCode};
pub use header::Header;
pub use message::Message;
pub use question::Question;
pub use rdata::{EdnsOption, RData};
pub use rr::Record;
pub use text::{from_text, to_text};
