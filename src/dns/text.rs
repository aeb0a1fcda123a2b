//! Presentation ("zone file") format for RDATA, scoped to a single record
//! rather than a whole zone (spec.md §4.B "text form (optional per type)").
//!
//! Grounded on RFC 1035 §5.1 presentation syntax, generalized from the
//! per-field reader in the teacher's `zone/parser.rs` (which parses whole
//! zone files) down to one RDATA value at a time. OPT and TSIG have no
//! presentation format (RFC 8945 §2.3 calls TSIG "meta" RRs that never
//! appear in a zone file) and reject with [`DnsError::NoTextFormat`].

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::dns::enums::RecordType;
use crate::dns::rdata::RData;
use crate::error::{DnsError, Result};
use crate::name::Name;

/// Render `rdata` in presentation format. Returns [`DnsError::NoTextFormat`]
/// for types that have none (OPT, TSIG).
pub fn to_text(rdata: &RData) -> Result<String> {
    Ok(match rdata {
        RData::A(addr) => addr.to_string(),
        RData::Aaaa(addr) => addr.to_string(),
        RData::Ns(n) | RData::Cname(n) | RData::Ptr(n) | RData::Md(n) | RData::Mf(n)
        | RData::Mb(n) | RData::Mg(n) | RData::Mr(n) => n.to_string(),
        RData::Null(data) => hex::encode(data),
        RData::Mx {
            preference,
            exchange,
        } => format!("{preference} {exchange}"),
        RData::Txt(segments) => segments.iter().map(|s| quote(s)).collect::<Vec<_>>().join(" "),
        RData::Hinfo { cpu, os } => format!("{} {}", quote(cpu), quote(os)),
        RData::Minfo { rmailbx, emailbx } => format!("{rmailbx} {emailbx}"),
        RData::Wks {
            address,
            protocol,
            bitmap,
        } => format!("{address} {protocol} {}", hex::encode(bitmap)),
        RData::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => format!("{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}"),
        RData::Srv {
            priority,
            weight,
            port,
            target,
        } => format!("{priority} {weight} {port} {target}"),
        RData::Naptr {
            order,
            preference,
            flags,
            services,
            regexp,
            replacement,
        } => format!(
            "{order} {preference} {} {} {} {replacement}",
            quote(flags),
            quote(services),
            quote(regexp)
        ),
        RData::Opt { .. } => return Err(no_text_format("OPT")),
        RData::Tsig(_) => return Err(no_text_format("TSIG")),
        RData::Dnskey {
            flags,
            protocol,
            algorithm,
            public_key,
        } => format!(
            "{flags} {protocol} {algorithm} {}",
            base64_encode(public_key)
        ),
        RData::Rrsig {
            type_covered,
            algorithm,
            labels,
            original_ttl,
            expiration,
            inception,
            key_tag,
            signer_name,
            signature,
        } => format!(
            "{type_covered} {algorithm} {labels} {original_ttl} {expiration} {inception} {key_tag} {signer_name} {}",
            base64_encode(signature)
        ),
        RData::Ds {
            key_tag,
            algorithm,
            digest_type,
            digest,
        } => format!("{key_tag} {algorithm} {digest_type} {}", hex::encode(digest)),
        RData::Nsec {
            next_domain,
            type_bitmap,
        } => format!("{next_domain} {}", hex::encode(type_bitmap)),
        RData::Nsec3 {
            hash_algorithm,
            flags,
            iterations,
            salt,
            next_hashed_owner,
            type_bitmap,
        } => format!(
            "{hash_algorithm} {flags} {iterations} {} {} {}",
            if salt.is_empty() {
                "-".to_string()
            } else {
                hex::encode(salt)
            },
            hex::encode(next_hashed_owner),
            hex::encode(type_bitmap)
        ),
        RData::Caa { flags, tag, value } => format!(
            "{flags} {} {}",
            String::from_utf8_lossy(tag),
            quote(value)
        ),
        RData::Unknown(_, data) => format!("\\# {} {}", data.len(), hex::encode(data)),
    })
}

/// Parse `s` as the RDATA of `record_type`. Returns
/// [`DnsError::NoTextFormat`] for OPT/TSIG.
pub fn from_text(record_type: RecordType, s: &str) -> Result<RData> {
    let tokens = tokenize(s)?;
    let mut it = tokens.into_iter();
    let mut next = |what: &str| -> Result<String> {
        it.next()
            .ok_or_else(|| DnsError::malformed(format!("missing {what} in rdata text")))
    };

    Ok(match record_type {
        RecordType::A => RData::A(parse_field::<Ipv4Addr>(&next("address")?)?),
        RecordType::AAAA => RData::Aaaa(parse_field::<Ipv6Addr>(&next("address")?)?),
        RecordType::NS => RData::Ns(Name::from_ascii(&next("name")?)?),
        RecordType::CNAME => RData::Cname(Name::from_ascii(&next("name")?)?),
        RecordType::PTR => RData::Ptr(Name::from_ascii(&next("name")?)?),
        RecordType::MD => RData::Md(Name::from_ascii(&next("name")?)?),
        RecordType::MF => RData::Mf(Name::from_ascii(&next("name")?)?),
        RecordType::MB => RData::Mb(Name::from_ascii(&next("name")?)?),
        RecordType::MG => RData::Mg(Name::from_ascii(&next("name")?)?),
        RecordType::MR => RData::Mr(Name::from_ascii(&next("name")?)?),
        RecordType::MX => RData::Mx {
            preference: parse_field::<u16>(&next("preference")?)?,
            exchange: Name::from_ascii(&next("exchange")?)?,
        },
        RecordType::TXT => RData::Txt(it.map(|s| s.into_bytes()).collect()),
        RecordType::HINFO => RData::Hinfo {
            cpu: next("cpu")?.into_bytes(),
            os: next("os")?.into_bytes(),
        },
        RecordType::MINFO => RData::Minfo {
            rmailbx: Name::from_ascii(&next("rmailbx")?)?,
            emailbx: Name::from_ascii(&next("emailbx")?)?,
        },
        RecordType::SOA => RData::Soa {
            mname: Name::from_ascii(&next("mname")?)?,
            rname: Name::from_ascii(&next("rname")?)?,
            serial: parse_field::<u32>(&next("serial")?)?,
            refresh: parse_field::<u32>(&next("refresh")?)?,
            retry: parse_field::<u32>(&next("retry")?)?,
            expire: parse_field::<u32>(&next("expire")?)?,
            minimum: parse_field::<u32>(&next("minimum")?)?,
        },
        RecordType::SRV => RData::Srv {
            priority: parse_field::<u16>(&next("priority")?)?,
            weight: parse_field::<u16>(&next("weight")?)?,
            port: parse_field::<u16>(&next("port")?)?,
            target: Name::from_ascii(&next("target")?)?,
        },
        RecordType::DNSKEY => RData::Dnskey {
            flags: parse_field::<u16>(&next("flags")?)?,
            protocol: parse_field::<u8>(&next("protocol")?)?,
            algorithm: parse_field::<u8>(&next("algorithm")?)?,
            public_key: base64_decode(&next("public key")?)?,
        },
        RecordType::DS => RData::Ds {
            key_tag: parse_field::<u16>(&next("key tag")?)?,
            algorithm: parse_field::<u8>(&next("algorithm")?)?,
            digest_type: parse_field::<u8>(&next("digest type")?)?,
            digest: hex::decode(next("digest")?)
                .map_err(|e| DnsError::malformed(format!("invalid hex digest: {e}")))?,
        },
        RecordType::CAA => RData::Caa {
            flags: parse_field::<u8>(&next("flags")?)?,
            tag: next("tag")?.into_bytes(),
            value: next("value")?.into_bytes(),
        },
        RecordType::NULL => RData::Null(
            hex::decode(next("data")?).map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?,
        ),
        RecordType::WKS => RData::Wks {
            address: parse_field::<Ipv4Addr>(&next("address")?)?,
            protocol: parse_field::<u8>(&next("protocol")?)?,
            bitmap: hex::decode(next("bitmap")?)
                .map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?,
        },
        RecordType::NAPTR => RData::Naptr {
            order: parse_field::<u16>(&next("order")?)?,
            preference: parse_field::<u16>(&next("preference")?)?,
            flags: next("flags")?.into_bytes(),
            services: next("services")?.into_bytes(),
            regexp: next("regexp")?.into_bytes(),
            replacement: Name::from_ascii(&next("replacement")?)?,
        },
        RecordType::RRSIG => RData::Rrsig {
            type_covered: next("type covered")?.parse()?,
            algorithm: parse_field::<u8>(&next("algorithm")?)?,
            labels: parse_field::<u8>(&next("labels")?)?,
            original_ttl: parse_field::<u32>(&next("original ttl")?)?,
            expiration: parse_field::<u32>(&next("expiration")?)?,
            inception: parse_field::<u32>(&next("inception")?)?,
            key_tag: parse_field::<u16>(&next("key tag")?)?,
            signer_name: Name::from_ascii(&next("signer name")?)?,
            signature: base64_decode(&next("signature")?)?,
        },
        RecordType::NSEC => RData::Nsec {
            next_domain: Name::from_ascii(&next("next domain")?)?,
            type_bitmap: hex::decode(next("type bitmap")?)
                .map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?,
        },
        RecordType::NSEC3 => {
            let hash_algorithm = parse_field::<u8>(&next("hash algorithm")?)?;
            let flags = parse_field::<u8>(&next("flags")?)?;
            let iterations = parse_field::<u16>(&next("iterations")?)?;
            let salt_tok = next("salt")?;
            let salt = if salt_tok == "-" {
                Vec::new()
            } else {
                hex::decode(salt_tok).map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?
            };
            let next_hashed_owner = hex::decode(next("next hashed owner")?)
                .map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?;
            let type_bitmap = hex::decode(next("type bitmap")?)
                .map_err(|e| DnsError::malformed(format!("invalid hex: {e}")))?;
            RData::Nsec3 {
                hash_algorithm,
                flags,
                iterations,
                salt,
                next_hashed_owner,
                type_bitmap,
            }
        }
        RecordType::OPT => return Err(no_text_format("OPT")),
        RecordType::TSIG => return Err(no_text_format("TSIG")),
        other => {
            return Err(DnsError::NoTextFormat(format!(
                "no text format defined for {other}"
            )))
        }
    })
}

fn no_text_format(type_name: &str) -> DnsError {
    DnsError::NoTextFormat(format!("no text format defined for {type_name}"))
}

fn parse_field<T: FromStr>(s: &str) -> Result<T> {
    s.parse::<T>()
        .map_err(|_| DnsError::malformed(format!("invalid field in rdata text: {s}")))
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn base64_decode(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| DnsError::malformed(format!("invalid base64 in rdata text: {e}")))
}

fn quote(data: &[u8]) -> String {
    format!("\"{}\"", String::from_utf8_lossy(data).replace('"', "\\\""))
}

/// Splits presentation text on whitespace, treating `"..."` as a single
/// token (RFC 1035 §5.1 character-string quoting).
fn tokenize(s: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut tok = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => {
                        if let Some(escaped) = chars.next() {
                            tok.push(escaped);
                        }
                    }
                    Some(ch) => tok.push(ch),
                    None => return Err(DnsError::malformed("unterminated quoted string")),
                }
            }
            tokens.push(tok);
        } else {
            let mut tok = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                tok.push(ch);
                chars.next();
            }
            tokens.push(tok);
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_round_trips_through_text() {
        let rdata = RData::A(Ipv4Addr::new(192, 0, 2, 1));
        let text = to_text(&rdata).unwrap();
        assert_eq!(text, "192.0.2.1");
        assert_eq!(from_text(RecordType::A, &text).unwrap(), rdata);
    }

    #[test]
    fn txt_round_trips_quoted_segments() {
        let rdata = RData::Txt(vec![b"hello world".to_vec(), b"second".to_vec()]);
        let text = to_text(&rdata).unwrap();
        assert_eq!(from_text(RecordType::TXT, &text).unwrap(), rdata);
    }

    #[test]
    fn soa_round_trips() {
        let rdata = RData::Soa {
            mname: Name::from_ascii("ns1.example.").unwrap(),
            rname: Name::from_ascii("hostmaster.example.").unwrap(),
            serial: 2024010100,
            refresh: 3600,
            retry: 900,
            expire: 604800,
            minimum: 300,
        };
        let text = to_text(&rdata).unwrap();
        assert_eq!(from_text(RecordType::SOA, &text).unwrap(), rdata);
    }

    #[test]
    fn tsig_has_no_text_format() {
        let rdata = RData::Tsig(crate::tsig::TsigRdata {
            algorithm_name: Name::from_ascii("hmac-sha256.").unwrap(),
            time_signed: 0,
            fudge: 300,
            mac: Vec::new(),
            original_id: 0,
            error: 0,
            other_data: Vec::new(),
        });
        let err = to_text(&rdata).unwrap_err();
        match err {
            DnsError::NoTextFormat(msg) => {
                assert!(msg.contains("no text format defined for TSIG"))
            }
            other => panic!("expected NoTextFormat, got {other:?}"),
        }
        assert!(from_text(RecordType::TSIG, "anything").is_err());
    }
}
