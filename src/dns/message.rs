//! The top-level DNS message: header, four sections, and TSIG/EDNS
//! bookkeeping (spec.md §4.C).
//!
//! Grounded structurally on the teacher's `dns/packet.rs` section-by-section
//! serialize/parse loop, replaced here with a two-pass encoder so that
//! truncation is decided before TSIG signs the final bytes (spec.md §4.D
//! "apply vs setTSIG").

use std::io::Cursor;

use crate::dns::enums::{OpCode, RecordClass, RecordType, ResponseCode};
use crate::dns::header::Header;
use crate::dns::question::Question;
use crate::dns::rdata::RData;
use crate::dns::rr::Record;
use crate::error::{DnsError, Result};
use crate::name::{CompressionTable, Name};
use crate::tsig::{self, TsigKey, TsigParams, TsigRdata};

/// Deferred signing intent attached via [`Message::set_tsig`]. Kept
/// separate from `additional` so records pushed after the intent was set
/// still land before the TSIG at serialize time (spec.md §8 invariant 3).
struct TsigIntent {
    key: TsigKey,
    error: u16,
    other_data: Vec<u8>,
    prior_mac: Option<Vec<u8>>,
}

/// A TSIG record discovered while parsing, retained with enough of the
/// original wire bytes to re-derive the exact hash domain on verify — a
/// fresh re-encode of the parsed structures could choose different
/// compression pointers and silently change the hash input.
struct ParsedTsig {
    message_bytes_without_tsig: Vec<u8>,
    owner: Name,
    rdata: TsigRdata,
}

pub struct Message {
    pub header: Header,
    pub question: Vec<Question>,
    pub answer: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
    /// Set on parse when a structurally valid, last-position TSIG record
    /// was found (spec.md §4.C) — not a claim that it cryptographically
    /// verifies, only that one was present to check.
    pub is_signed: bool,

    tsig_intent: Option<TsigIntent>,
    parsed_tsig: Option<ParsedTsig>,
}

impl Message {
    pub fn query(id: u16, opcode: OpCode, question: Question, recursion_desired: bool) -> Self {
        Message {
            header: Header {
                id,
                qr: false,
                opcode,
                rd: recursion_desired,
                qdcount: 1,
                ..Default::default()
            },
            question: vec![question],
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            is_signed: false,
            tsig_intent: None,
            parsed_tsig: None,
        }
    }

    /// Build a skeleton response (matching ID and question, `qr` set, `ra`
    /// set) that the caller fills in with answer/authority records.
    pub fn response_for(request: &Message, rcode: ResponseCode) -> Self {
        let (low, _high) = rcode.split();
        Message {
            header: Header {
                id: request.header.id,
                qr: true,
                opcode: request.header.opcode,
                aa: false,
                tc: false,
                rd: request.header.rd,
                ra: true,
                rcode_low: low,
                qdcount: request.question.len() as u16,
                ..Default::default()
            },
            question: request.question.clone(),
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            is_signed: false,
            tsig_intent: None,
            parsed_tsig: None,
        }
    }

    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        let (low, high) = rcode.split();
        self.header.rcode_low = low;
        for record in &mut self.additional {
            if let RData::Opt { extended_rcode, .. } = &mut record.rdata {
                *extended_rcode = high;
            }
        }
    }

    pub fn rcode(&self) -> ResponseCode {
        let high = self
            .additional
            .iter()
            .find_map(|r| match &r.rdata {
                RData::Opt { extended_rcode, .. } => Some(*extended_rcode),
                _ => None,
            })
            .unwrap_or(0);
        ResponseCode::combine(self.header.rcode_low, high)
    }

    pub fn add_opt(&mut self, udp_payload_size: u16, dnssec_ok: bool) {
        self.additional.push(Record::new(
            Name::root(),
            RecordClass::from_code(udp_payload_size),
            0,
            RData::Opt {
                udp_payload_size,
                extended_rcode: 0,
                version: 0,
                dnssec_ok,
                options: Vec::new(),
            },
        ));
    }

    pub fn edns_opt(&self) -> Option<&RData> {
        self.additional
            .iter()
            .map(|r| &r.rdata)
            .find(|r| matches!(r, RData::Opt { .. }))
    }

    /// Attach a deferred signing intent: signing happens inside [`Self::to_wire`],
    /// after truncation is decided, and the TSIG is always the final record
    /// regardless of what the caller adds to `additional` afterwards.
    pub fn set_tsig(&mut self, key: TsigKey) {
        self.tsig_intent = Some(TsigIntent {
            key,
            error: 0,
            other_data: Vec::new(),
            prior_mac: None,
        });
    }

    /// Like [`Self::set_tsig`], but prefixes the request's MAC into the hash
    /// input as RFC 8945 §5.3.1 requires for response signing.
    pub fn set_tsig_for_response(&mut self, key: TsigKey, request_mac: Vec<u8>) {
        self.tsig_intent = Some(TsigIntent {
            key,
            error: 0,
            other_data: Vec::new(),
            prior_mac: Some(request_mac),
        });
    }

    /// Sign immediately and push the TSIG record directly into
    /// `additional`. Unlike [`Self::set_tsig`], nothing protects this
    /// record's position: a record pushed afterwards breaks the
    /// "TSIG is last" invariant and the next `to_wire()` call will produce
    /// bytes that fail to re-parse (spec.md §8 invariant 4) — this is
    /// intentional, not a bug to guard against.
    pub fn apply_tsig(&mut self, key: TsigKey) -> Result<()> {
        let body = self.encode_body(&self.answer, &self.authority, &self.additional, false)?;
        let time_signed = tsig::now_unix();
        let fudge = 300;
        let params = TsigParams {
            key: &key,
            time_signed,
            fudge,
            error: 0,
            other_data: &[],
            prior_mac: None,
        };
        let mac = tsig::compute_mac(&body, &params);
        let record = tsig_record(&key, time_signed, fudge, 0, Vec::new(), mac, self.header.id);
        self.additional.push(record);
        Ok(())
    }

    /// Maximum UDP payload allowed before setting TC (None means no cap,
    /// as for TCP). When the budget is exceeded, records are dropped from
    /// the tail of additional first, then authority, then answer (spec.md
    /// §4.C) until the message fits or nothing is left to drop.
    pub fn to_wire(&self, max_size: Option<usize>) -> Result<Vec<u8>> {
        let reserved_tsig = self
            .tsig_intent
            .as_ref()
            .map(|i| estimate_tsig_wire_len(&i.key))
            .unwrap_or(0);
        let budget = max_size.map(|m| m.saturating_sub(reserved_tsig));

        let mut answer = self.answer.clone();
        let mut authority = self.authority.clone();
        let mut additional = self.additional.clone();
        let mut tc = false;
        loop {
            let bytes = self.encode_body(&answer, &authority, &additional, tc)?;
            let Some(b) = budget else { break };
            if bytes.len() <= b {
                break;
            }
            if additional.pop().is_some() {
                tc = true;
            } else if authority.pop().is_some() {
                tc = true;
            } else if answer.pop().is_some() {
                tc = true;
            } else {
                break;
            }
        }

        let body = self.encode_body(&answer, &authority, &additional, tc)?;

        match &self.tsig_intent {
            None => Ok(body),
            Some(intent) => {
                let time_signed = tsig::now_unix();
                let fudge = 300;
                let params = TsigParams {
                    key: &intent.key,
                    time_signed,
                    fudge,
                    error: intent.error,
                    other_data: &intent.other_data,
                    prior_mac: intent.prior_mac.as_deref(),
                };
                let mac = tsig::compute_mac(&body, &params);
                let record = tsig_record(
                    &intent.key,
                    time_signed,
                    fudge,
                    intent.error,
                    intent.other_data.clone(),
                    mac,
                    self.header.id,
                );
                additional.push(record);
                self.encode_body(&answer, &authority, &additional, tc)
            }
        }
    }

    fn encode_body(
        &self,
        answer: &[Record],
        authority: &[Record],
        additional: &[Record],
        tc: bool,
    ) -> Result<Vec<u8>> {
        let mut header = self.header;
        header.tc = tc;
        header.qdcount = self.question.len() as u16;
        header.ancount = answer.len() as u16;
        header.nscount = authority.len() as u16;
        header.arcount = additional.len() as u16;

        let mut buf = Vec::new();
        header.encode(&mut buf)?;
        let mut table = CompressionTable::new();
        for q in &self.question {
            q.encode(&mut buf, &mut table)?;
        }
        for r in answer {
            r.encode(&mut buf, &mut table)?;
        }
        for r in authority {
            r.encode(&mut buf, &mut table)?;
        }
        for r in additional {
            r.encode(&mut buf, &mut table)?;
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let header = Header::decode(&mut cursor)?;

        let question = (0..header.qdcount)
            .map(|_| Question::decode(&mut cursor))
            .collect::<Result<Vec<_>>>()?;
        let answer = (0..header.ancount)
            .map(|_| Record::decode(&mut cursor))
            .collect::<Result<Vec<_>>>()?;
        let authority = (0..header.nscount)
            .map(|_| Record::decode(&mut cursor))
            .collect::<Result<Vec<_>>>()?;

        let mut additional = Vec::new();
        let mut tsig_at: Option<usize> = None;
        for i in 0..header.arcount {
            let offset_before = cursor.position() as usize;
            let record = Record::decode(&mut cursor)?;
            if record.record_type() == RecordType::TSIG {
                if i != header.arcount - 1 {
                    return Err(DnsError::malformed(
                        "TSIG record must be the last additional record",
                    ));
                }
                tsig_at = Some(offset_before);
            } else if tsig_at.is_some() {
                return Err(DnsError::malformed("additional record found after TSIG"));
            }
            additional.push(record);
        }

        let mut message = Message {
            header,
            question,
            answer,
            authority,
            additional,
            is_signed: false,
            tsig_intent: None,
            parsed_tsig: None,
        };

        if let Some(offset) = tsig_at {
            let tsig_record = message.additional.pop().expect("just pushed");
            let owner = tsig_record.name.clone();
            let rdata = match tsig_record.rdata {
                RData::Tsig(r) => r,
                _ => unreachable!("record_type() == TSIG guarantees this variant"),
            };

            let mut without_tsig = bytes[..offset].to_vec();
            let new_arcount = message.additional.len() as u16;
            without_tsig[10..12].copy_from_slice(&new_arcount.to_be_bytes());

            message.header.arcount = new_arcount;
            message.is_signed = true;
            message.parsed_tsig = Some(ParsedTsig {
                message_bytes_without_tsig: without_tsig,
                owner,
                rdata,
            });
        }

        Ok(message)
    }

    /// Verify this message's TSIG against `key`, prefixing `request_mac`
    /// when checking a response (spec.md §4.D). `FORMERR` is returned when
    /// no TSIG was present at all.
    pub fn verify_tsig(&self, key: &TsigKey, request_mac: Option<&[u8]>) -> Result<()> {
        match &self.parsed_tsig {
            None => Err(DnsError::TsigVerifyFailed(crate::error::TsigErrorCode::FormErr)),
            Some(parsed) => tsig::verify(
                &parsed.message_bytes_without_tsig,
                &parsed.owner,
                &parsed.rdata,
                key,
                request_mac,
                tsig::now_unix(),
            )
            .map_err(DnsError::TsigVerifyFailed),
        }
    }

    /// The signed request's MAC, needed by a server to sign its response
    /// (spec.md §4.D request-MAC prefixing).
    pub fn tsig_mac(&self) -> Option<&[u8]> {
        self.parsed_tsig.as_ref().map(|p| p.rdata.mac.as_slice())
    }
}

fn tsig_record(
    key: &TsigKey,
    time_signed: u64,
    fudge: u16,
    error: u16,
    other_data: Vec<u8>,
    mac: Vec<u8>,
    original_id: u16,
) -> Record {
    Record::new(
        key.name.clone(),
        RecordClass::ANY,
        0,
        RData::Tsig(TsigRdata {
            algorithm_name: Name::from_ascii(key.algorithm.canonical_name()).expect("valid"),
            time_signed,
            fudge,
            mac,
            original_id,
            error,
            other_data,
        }),
    )
}

/// Upper bound on the TSIG record's wire length, used to reserve truncation
/// budget before the MAC (whose length is fixed per algorithm) is known.
fn estimate_tsig_wire_len(key: &TsigKey) -> usize {
    let owner_len = key.name.wire_len();
    let algorithm_len = key.algorithm.canonical_name().len() + 2;
    owner_len + 2 + 2 + 4 + 2 + algorithm_len + 6 + 2 + 2 + key.algorithm.mac_len() + 2 + 2 + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::RecordType;
    use crate::dns::question::Question;
    use std::net::Ipv4Addr;

    fn a_question() -> Question {
        Question::new(
            Name::from_ascii("www.example.").unwrap(),
            RecordType::A,
            RecordClass::IN,
        )
    }

    fn test_key() -> TsigKey {
        TsigKey::new("example.", "hmac-sha256", "MTIzNDU2Nzg=").unwrap()
    }

    #[test]
    fn signed_query_round_trips_and_verifies() {
        let mut msg = Message::query(1234, OpCode::Query, a_question(), true);
        msg.set_tsig(test_key());
        let bytes = msg.to_wire(Some(512)).unwrap();

        let parsed = Message::decode(&bytes).unwrap();
        assert!(parsed.is_signed);
        assert_eq!(parsed.additional.len(), 0); // tsig isn't a plain additional record
        assert!(parsed.verify_tsig(&test_key(), None).is_ok());
    }

    #[test]
    fn opt_and_tsig_are_ordered_opt_then_tsig() {
        let mut msg = Message::query(1, OpCode::Query, a_question(), true);
        msg.set_tsig(test_key());
        msg.add_opt(4096, false);
        let bytes = msg.to_wire(Some(512)).unwrap();

        // additional_count low byte = 2 (OPT + TSIG)
        assert_eq!(bytes[11], 2);

        let parsed = Message::decode(&bytes).unwrap();
        assert_eq!(parsed.additional.len(), 1);
        assert!(matches!(parsed.additional[0].rdata, RData::Opt { .. }));
        assert!(parsed.is_signed);
        assert!(parsed.verify_tsig(&test_key(), None).is_ok());
    }

    #[test]
    fn apply_then_mutate_breaks_reparse() {
        let mut msg = Message::query(1, OpCode::Query, a_question(), true);
        msg.apply_tsig(test_key()).unwrap();
        msg.add_opt(4096, false); // pushed after TSIG: now TSIG is not last
        let bytes = msg.to_wire(None).unwrap();
        assert!(Message::decode(&bytes).is_err());
    }

    #[test]
    fn truncation_drops_additional_before_authority_before_answer() {
        let mut msg = Message::query(1, OpCode::Query, a_question(), true);
        msg.additional.push(Record::new(
            Name::from_ascii("extra.example.").unwrap(),
            RecordClass::IN,
            60,
            RData::A(Ipv4Addr::new(10, 0, 0, 1)),
        ));
        msg.authority.push(Record::new(
            Name::from_ascii("example.").unwrap(),
            RecordClass::IN,
            60,
            RData::Ns(Name::from_ascii("ns1.example.").unwrap()),
        ));
        msg.answer.push(Record::new(
            Name::from_ascii("www.example.").unwrap(),
            RecordClass::IN,
            60,
            RData::A(Ipv4Addr::new(93, 184, 216, 34)),
        ));

        let full = msg.to_wire(None).unwrap();
        let bytes = msg.to_wire(Some(full.len() - 1)).unwrap();

        let parsed = Message::decode(&bytes).unwrap();
        assert!(parsed.header.tc);
        assert_eq!(parsed.additional.len(), 0, "additional must be dropped before authority/answer");
        assert_eq!(parsed.authority.len(), 1, "authority must survive while additional is droppable");
        assert_eq!(parsed.answer.len(), 1);
    }

    #[test]
    fn truncation_sets_tc_and_tsig_still_verifies() {
        let mut request = Message::query(7, OpCode::Query, a_question(), true);
        request.set_tsig(test_key());
        let request_bytes = request.to_wire(None).unwrap();
        let parsed_request = Message::decode(&request_bytes).unwrap();
        let request_mac = parsed_request.tsig_mac().unwrap().to_vec();

        let mut response = Message::response_for(&parsed_request, ResponseCode::NoError);
        for i in 0..40u32 {
            response.answer.push(Record::new(
                Name::from_ascii("www.example.").unwrap(),
                RecordClass::IN,
                300,
                RData::Txt(vec![format!("record number {i}").into_bytes()]),
            ));
        }
        response.set_tsig_for_response(test_key(), request_mac.clone());

        let bytes = response.to_wire(Some(512)).unwrap();
        assert!(bytes.len() <= 512 + estimate_tsig_wire_len(&test_key()) + 64);

        let parsed = Message::decode(&bytes).unwrap();
        assert!(parsed.header.tc);
        assert!(parsed.is_signed);
        assert!(parsed.verify_tsig(&test_key(), Some(&request_mac)).is_ok());
    }

    #[test]
    fn unsigned_tsig_verify_is_formerr() {
        let msg = Message::query(1, OpCode::Query, a_question(), true);
        let bytes = msg.to_wire(None).unwrap();
        let parsed = Message::decode(&bytes).unwrap();
        let err = parsed.verify_tsig(&test_key(), None).unwrap_err();
        assert!(matches!(
            err,
            DnsError::TsigVerifyFailed(crate::error::TsigErrorCode::FormErr)
        ));
    }

    #[test]
    fn a_answer_round_trips_through_response() {
        let request = Message::query(9, OpCode::Query, a_question(), true);
        let mut response = Message::response_for(&request, ResponseCode::NoError);
        response.answer.push(Record::new(
            Name::from_ascii("www.example.").unwrap(),
            RecordClass::IN,
            60,
            RData::A(Ipv4Addr::new(93, 184, 216, 34)),
        ));
        let bytes = response.to_wire(None).unwrap();
        let parsed = Message::decode(&bytes).unwrap();
        assert_eq!(parsed.answer.len(), 1);
        assert_eq!(parsed.answer[0].rdata, RData::A(Ipv4Addr::new(93, 184, 216, 34)));
    }
}
