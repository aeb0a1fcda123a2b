//! Closed DNS enumerations: record types, classes, opcodes, rcodes.
//!
//! Each carries an `Other(code)` escape hatch so unknown wire values survive
//! a round-trip instead of collapsing into a single `Unknown` bucket (the
//! teacher's `DNSResourceType`/`DNSResourceClass` do the latter, which loses
//! the numeric code on decode — spec.md §4.B requires unknown types to
//! "retain opaque rdata" and therefore their real type code). Text I/O
//! accepts both the symbolic name and the generic `TYPEnnn`/`CLASSnnn` form.

use std::fmt;
use std::str::FromStr;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($repr:ty) {
            $( $variant:ident = $code:expr ),+ $(,)?
        }
        generic = $generic_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            Other($repr),
        }

        impl $name {
            pub fn code(self) -> $repr {
                match self {
                    $( $name::$variant => $code, )+
                    $name::Other(v) => v,
                }
            }

            pub fn from_code(code: $repr) -> Self {
                match code {
                    $( $code => $name::$variant, )+
                    other => $name::Other(other),
                }
            }
        }

        impl From<$repr> for $name {
            fn from(v: $repr) -> Self {
                $name::from_code(v)
            }
        }

        impl From<$name> for $repr {
            fn from(v: $name) -> Self {
                v.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $name::$variant => write!(f, stringify!($variant)), )+
                    $name::Other(v) => write!(f, "{}{}", $generic_prefix, v),
                }
            }
        }

        impl FromStr for $name {
            type Err = crate::error::DnsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok($name::$variant);
                    }
                )+
                let upper = s.to_ascii_uppercase();
                if let Some(rest) = upper.strip_prefix($generic_prefix) {
                    if let Ok(v) = rest.parse::<$repr>() {
                        return Ok($name::from_code(v));
                    }
                }
                Err(crate::error::DnsError::illegal_argument(format!(
                    "unrecognized {}: {}",
                    stringify!($name),
                    s
                )))
            }
        }
    };
}

closed_enum! {
    /// RR TYPE / QTYPE values (RFC 1035 §3.2.2, plus common extensions).
    pub RecordType(u16) {
        A = 1, NS = 2, MD = 3, MF = 4, CNAME = 5, SOA = 6, MB = 7, MG = 8,
        MR = 9, NULL = 10, WKS = 11, PTR = 12, HINFO = 13, MINFO = 14,
        MX = 15, TXT = 16,
        AAAA = 28, SRV = 33, NAPTR = 35, OPT = 41,
        DS = 43, SSHFP = 44, RRSIG = 46, NSEC = 47, DNSKEY = 48,
        NSEC3 = 50, NSEC3PARAM = 51, TLSA = 52,
        SVCB = 64, HTTPS = 65,
        CDS = 59, CDNSKEY = 60, CAA = 257,
        TKEY = 249, TSIG = 250,
        AXFR = 252, MAILB = 253, MAILA = 254, ANY = 255, IXFR = 251,
    }
    generic = "TYPE"
}

closed_enum! {
    /// RR CLASS / QCLASS values (RFC 1035 §3.2.4).
    pub RecordClass(u16) {
        IN = 1, CS = 2, CH = 3, HS = 4, NONE = 254, ANY = 255,
    }
    generic = "CLASS"
}

impl RecordType {
    /// Whether names embedded in this type's RDATA may be compressed.
    /// RFC 3597 forbids compressing RDATA of types not explicitly granted
    /// it by a defining RFC; SRV (RFC 2782) and NSEC (RFC 3845) explicitly
    /// forbid it, and any type this registry doesn't recognize is treated
    /// conservatively as non-compressible.
    pub fn rdata_names_compressible(self) -> bool {
        matches!(
            self,
            RecordType::NS
                | RecordType::MD
                | RecordType::MF
                | RecordType::CNAME
                | RecordType::SOA
                | RecordType::MB
                | RecordType::MG
                | RecordType::MR
                | RecordType::PTR
                | RecordType::MINFO
                | RecordType::MX
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpCode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Other(u8),
}

impl OpCode {
    pub fn code(self) -> u8 {
        match self {
            OpCode::Query => 0,
            OpCode::IQuery => 1,
            OpCode::Status => 2,
            OpCode::Notify => 4,
            OpCode::Update => 5,
            OpCode::Other(v) => v,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            4 => OpCode::Notify,
            5 => OpCode::Update,
            other => OpCode::Other(other),
        }
    }
}

impl Default for OpCode {
    fn default() -> Self {
        OpCode::Query
    }
}

/// Full (extended, OPT-aware) response code. The wire header only carries
/// the low 4 bits; the OPT pseudo-RR's TTL field carries the upper 8 bits
/// (spec.md §4.B "OPT").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    YxDomain,
    YxrrSet,
    NxrrSet,
    NotAuth,
    NotZone,
    BadVers,
    BadSig,
    BadKey,
    BadTime,
    BadMode,
    BadName,
    BadAlg,
    BadTrunc,
    BadCookie,
    Other(u16),
}

impl ResponseCode {
    pub fn code(self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NxDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YxDomain => 6,
            ResponseCode::YxrrSet => 7,
            ResponseCode::NxrrSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::BadVers => 16, // == BadSig for non-EDNS contexts
            ResponseCode::BadSig => 16,
            ResponseCode::BadKey => 17,
            ResponseCode::BadTime => 18,
            ResponseCode::BadMode => 19,
            ResponseCode::BadName => 20,
            ResponseCode::BadAlg => 21,
            ResponseCode::BadTrunc => 22,
            ResponseCode::BadCookie => 23,
            ResponseCode::Other(v) => v,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NxDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YxDomain,
            7 => ResponseCode::YxrrSet,
            8 => ResponseCode::NxrrSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            16 => ResponseCode::BadSig,
            17 => ResponseCode::BadKey,
            18 => ResponseCode::BadTime,
            19 => ResponseCode::BadMode,
            20 => ResponseCode::BadName,
            21 => ResponseCode::BadAlg,
            22 => ResponseCode::BadTrunc,
            23 => ResponseCode::BadCookie,
            other => ResponseCode::Other(other),
        }
    }

    /// Split into the wire header's 4-bit low field and the OPT TTL's 8-bit
    /// extended field.
    pub fn split(self) -> (u8, u8) {
        let full = self.code();
        ((full & 0x0F) as u8, (full >> 4) as u8)
    }

    /// Recombine a header's low 4 bits with an OPT record's extended 8 bits.
    pub fn combine(low4: u8, high8: u8) -> Self {
        Self::from_code(((high8 as u16) << 4) | (low4 as u16 & 0x0F))
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        ResponseCode::NoError
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NxDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::YxDomain => "YXDOMAIN",
            ResponseCode::YxrrSet => "YXRRSET",
            ResponseCode::NxrrSet => "NXRRSET",
            ResponseCode::NotAuth => "NOTAUTH",
            ResponseCode::NotZone => "NOTZONE",
            ResponseCode::BadVers | ResponseCode::BadSig => "BADSIG",
            ResponseCode::BadKey => "BADKEY",
            ResponseCode::BadTime => "BADTIME",
            ResponseCode::BadMode => "BADMODE",
            ResponseCode::BadName => "BADNAME",
            ResponseCode::BadAlg => "BADALG",
            ResponseCode::BadTrunc => "BADTRUNC",
            ResponseCode::BadCookie => "BADCOOKIE",
            ResponseCode::Other(_) => return write!(f, "RCODE{}", self.code()),
        };
        f.write_str(s)
    }
}
