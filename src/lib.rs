pub mod config;
pub mod dns;
pub mod error;
pub mod name;
pub mod resolver;
pub mod tsig;

pub use config::ResolverConfig;
pub use dns::{Message, OpCode, Question, RData, Record, RecordClass, RecordType, ResponseCode};
pub use error::{DnsError, TsigErrorCode};
pub use name::Name;
pub use resolver::{SimpleResolver, Transport};
pub use tsig::{TsigAlgorithm, TsigKey};
