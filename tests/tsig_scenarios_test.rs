//! End-to-end TSIG scenarios from spec.md §8 ("concrete end-to-end
//! scenarios seed the suite"), run against the public crate surface rather
//! than any module-private state.

use std::sync::Arc;

use courier::dns::{Message, OpCode, Question, RData, RecordClass, RecordType};
use courier::name::Name;
use courier::resolver::{EchoTransport, SimpleResolver};
use courier::{DnsError, ResolverConfig, TsigKey};

const KEY_NAME: &str = "example.";
const KEY_SECRET_BASE64: &str = "12345678";

fn a_query() -> Message {
    Message::query(
        0,
        OpCode::Query,
        Question::new(Name::from_ascii("www.example.").unwrap(), RecordType::A, RecordClass::IN),
        true,
    )
}

/// Scenario 1: a signed query with HMAC-SHA256 round-trips and verifies.
#[test]
fn scenario_1_signed_query_verifies_and_reports_additional_count_one() {
    let key = TsigKey::new(KEY_NAME, "hmac-sha256", KEY_SECRET_BASE64).unwrap();
    let mut query = a_query();
    query.set_tsig(key.clone());
    let bytes = query.to_wire(Some(512)).unwrap();

    assert_eq!(bytes[11], 1, "additional count low byte must be 1");

    let parsed = Message::decode(&bytes).unwrap();
    assert!(parsed.is_signed);
    assert!(parsed.verify_tsig(&key, None).is_ok());
}

/// Scenario 2: every algorithm name accepted at construction signs and
/// verifies identically at the wire level.
#[test]
fn scenario_2_all_algorithm_aliases_construct_and_verify() {
    let aliases = [
        "hmac-md5",
        "hmac-md5.sig-alg.reg.int.",
        "hmac-sha1",
        "hmac-sha224",
        "hmac-sha256",
        "hmac-sha256.",
        "hmac-sha384",
        "hmac-sha512",
        "HmacMD5",
        "HmacSHA1",
        "HmacSHA224",
        "HmacSHA256",
        "HmacSHA384",
        "HmacSHA512",
    ];
    for alias in aliases {
        let key = TsigKey::new(KEY_NAME, alias, KEY_SECRET_BASE64)
            .unwrap_or_else(|e| panic!("alias {alias} failed to construct: {e}"));
        let mut query = a_query();
        query.set_tsig(key.clone());
        let bytes = query.to_wire(Some(512)).unwrap();
        let parsed = Message::decode(&bytes).unwrap();
        assert!(parsed.is_signed, "alias {alias} did not produce a signed message");
        assert!(
            parsed.verify_tsig(&key, None).is_ok(),
            "alias {alias} failed to verify"
        );
    }
}

/// Scenario 3: constructing a key with an unrecognized algorithm name fails.
#[test]
fn scenario_3_unknown_algorithm_is_illegal_argument() {
    let err = TsigKey::new(KEY_NAME, "randomalg", KEY_SECRET_BASE64).unwrap_err();
    assert!(matches!(err, DnsError::IllegalArgument(_)));
}

/// Scenario 4: a query signed and then given an OPT record emits
/// `[OPT, TSIG]` in that order with additional count 2.
#[test]
fn scenario_4_opt_added_after_tsig_intent_still_orders_tsig_last() {
    let key = TsigKey::new(KEY_NAME, "hmac-sha256", KEY_SECRET_BASE64).unwrap();
    let mut query = a_query();
    query.set_tsig(key.clone());
    query.add_opt(4096, false);
    let bytes = query.to_wire(Some(512)).unwrap();

    assert_eq!(bytes[11], 2, "additional count low byte must be 2 (OPT + TSIG)");

    let parsed = Message::decode(&bytes).unwrap();
    assert_eq!(parsed.additional.len(), 1);
    assert!(matches!(parsed.additional[0].rdata, RData::Opt { .. }));
    assert!(parsed.is_signed);
    assert!(parsed.verify_tsig(&key, None).is_ok());
}

/// Scenario 5: `apply`-then-mutate produces bytes that fail to re-parse.
#[test]
fn scenario_5_apply_then_mutate_breaks_reparse() {
    let key = TsigKey::new(KEY_NAME, "hmac-sha256", KEY_SECRET_BASE64).unwrap();
    let mut query = a_query();
    query.add_opt(4096, false);
    query.apply_tsig(key).unwrap();
    query.add_opt(512, false); // pushed after the already-applied TSIG
    let bytes = query.to_wire(None).unwrap();
    assert!(Message::decode(&bytes).is_err());
}

/// Scenario 6: a signed response carrying 40 TXT answers under a 512-byte
/// cap gets truncated but still verifies against the request MAC.
#[test]
fn scenario_6_signed_response_with_truncation_still_verifies() {
    let key = TsigKey::new(KEY_NAME, "hmac-sha256", KEY_SECRET_BASE64).unwrap();

    let mut request = a_query();
    request.set_tsig(key.clone());
    let request_bytes = request.to_wire(None).unwrap();
    let parsed_request = Message::decode(&request_bytes).unwrap();
    let request_mac = parsed_request.tsig_mac().unwrap().to_vec();

    let mut response = Message::response_for(&parsed_request, courier::dns::ResponseCode::NoError);
    for i in 0..40u32 {
        response.answer.push(courier::dns::Record::new(
            Name::from_ascii("www.example.").unwrap(),
            RecordClass::IN,
            300,
            RData::Txt(vec![format!("answer segment number {i}").into_bytes()]),
        ));
    }
    response.set_tsig_for_response(key.clone(), request_mac.clone());
    let bytes = response.to_wire(Some(512)).unwrap();

    let parsed = Message::decode(&bytes).unwrap();
    assert!(parsed.header.tc, "response must be marked truncated");
    assert!(parsed.is_signed);
    assert!(parsed.verify_tsig(&key, Some(&request_mac)).is_ok());
}

/// Scenario 7: TSIG rdata has no presentation form.
#[test]
fn scenario_7_tsig_rdata_has_no_text_format() {
    let rdata = RData::Tsig(courier::tsig::TsigRdata {
        algorithm_name: Name::from_ascii("hmac-sha256.").unwrap(),
        time_signed: 0,
        fudge: 300,
        mac: Vec::new(),
        original_id: 0,
        error: 0,
        other_data: Vec::new(),
    });
    let err = courier::dns::to_text(&rdata).unwrap_err();
    match err {
        DnsError::NoTextFormat(msg) => assert!(msg.contains("no text format defined for TSIG")),
        other => panic!("expected NoTextFormat, got {other:?}"),
    }
    assert!(courier::dns::from_text(RecordType::TSIG, "anything").is_err());
}

/// Scenario 8: a resolver whose transport echoes the request back as the
/// reply produces a signed message ending in `[OPT, TSIG]` that verifies
/// against its own bytes.
#[tokio::test]
async fn scenario_8_resolver_echo_harness_round_trips_opt_and_tsig() {
    let key = TsigKey::new(KEY_NAME, "hmac-sha256", KEY_SECRET_BASE64).unwrap();
    let config = ResolverConfig::new("192.0.2.53:53".parse().unwrap()).with_tsig_key(key);
    let resolver = SimpleResolver::with_transport(config, Arc::new(EchoTransport));

    let reply = resolver.send_async(a_query()).await.unwrap();
    assert!(reply.is_signed);
    assert_eq!(reply.additional.len(), 1);
    assert!(matches!(reply.additional[0].rdata, RData::Opt { .. }));
}
