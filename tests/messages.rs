use binframe::prelude::*;
use binframe_strategy::*;
use proptest::prelude::*;

const MAGIC: u32 = 0xCAFE_BABE;

fn chunk_codec(order: Endian, checksum: Option<ChecksumWidth>) -> MessageCodec {
    let mut config = CodecConfig::new(MAGIC).with_order(order);
    config.checksum = checksum;
    MessageCodec::new(config)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 300, ..ProptestConfig::default() })]

    #[test]
    fn chunk_messages_round_trip(
        chunks in arb_chunks(6),
        order in arb_endian(),
        checksum in proptest::option::of(arb_checksum()),
        flags in any::<u16>(),
    ) {
        let codec = chunk_codec(order, checksum);
        let enc = codec.encode_chunks(flags, &chunks).unwrap();

        let message = codec.decode(&enc).unwrap();
        prop_assert_eq!(message.header.flags, flags);
        prop_assert_eq!(message.header.count as usize, chunks.len());
        prop_assert_eq!(message.body, Body::Chunks(chunks));
    }

    #[test]
    fn record_messages_round_trip(
        (schema, records) in arb_schema_and_records(10),
        order in arb_endian(),
        checksum in arb_checksum(),
    ) {
        let codec = MessageCodec::new(
            CodecConfig::default()
                .with_order(order)
                .with_checksum(checksum)
                .with_records(schema.clone()),
        );
        let enc = codec.encode_records(0, &records).unwrap();
        prop_assert_eq!(
            enc.len(),
            12 + records.len() * schema.record_size() + checksum.bytes()
        );
        prop_assert_eq!(codec.decode(&enc).unwrap().body, Body::Records(records));
    }

    #[test]
    fn single_bit_flips_fail_the_checksum(
        chunks in arb_chunks(4),
        checksum in arb_checksum(),
        flip in any::<prop::sample::Index>(),
    ) {
        let codec = chunk_codec(Endian::Big, Some(checksum));
        let mut enc = codec.encode_chunks(0, &chunks).unwrap();
        let bit = flip.index(enc.len() * 8);
        enc[bit / 8] ^= 1 << (bit % 8);

        match codec.decode(&enc) {
            Err(CodecError::ChecksumMismatch { .. }) => {}
            other => prop_assert!(false, "bit {}: {:?}", bit, other),
        }
    }

    #[test]
    fn truncated_messages_never_decode(chunks in arb_chunks(4), cut in any::<prop::sample::Index>()) {
        let codec = chunk_codec(Endian::Big, None);
        let enc = codec.encode_chunks(0, &chunks).unwrap();
        let short = &enc[..cut.index(enc.len())];
        prop_assert!(codec.decode(short).unwrap_err().is_truncation());
    }
}

#[test]
fn cafebabe_scenario() {
    let chunks = vec![
        Chunk::new(1, &b"AB"[..]).unwrap(),
        Chunk::new(2, vec![0x00, 0x2A]).unwrap(),
    ];
    let enc = encode_message(MAGIC, 1, 0, &chunks, None).unwrap();
    let (header, decoded) = decode_message(&enc, MAGIC, None).unwrap();

    assert_eq!(header.magic, MAGIC);
    assert_eq!(header.version, 1);
    assert_eq!(header.count, 2);
    assert_eq!(decoded, chunks);
    assert_eq!(&decoded[0].payload()[..], b"AB");
    assert_eq!(&decoded[1].payload()[..], &[0x00, 0x2A]);
}

#[test]
fn count_enforcement_at_message_level() {
    let three: Vec<_> = (1..=3u8).map(|t| Chunk::new(t, vec![t]).unwrap()).collect();
    let mut enc = encode_message(MAGIC, 1, 0, &three, None).unwrap();

    // declare three, keep two
    let two_present = &enc[..enc.len() - 4];
    assert!(decode_message(two_present, MAGIC, None)
        .unwrap_err()
        .is_truncation());

    // declare three, append a fourth
    enc.extend_from_slice(&[4, 0, 1, 4]);
    match decode_message(&enc, MAGIC, None) {
        Err(CodecError::CountMismatch {
            expected: 3,
            trailing: 4,
            ..
        }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn forward_compatible_reader() {
    let chunks = vec![
        Chunk::new(1, &b"name"[..]).unwrap(),
        Chunk::new(0x7F, &b"added in a later version"[..]).unwrap(),
        Chunk::new(2, &b"value"[..]).unwrap(),
    ];
    let enc = encode_message(MAGIC, 2, 0, &chunks, Some(ChecksumWidth::U16)).unwrap();

    let header = peek_header(&enc, Endian::Big).unwrap();
    assert_eq!(header.version, 2);

    let (_, decoded) = decode_message(&enc, MAGIC, Some(ChecksumWidth::U16)).unwrap();
    let understood: Vec<_> = decoded.iter().filter(|ch| ch.tag() < 0x10).collect();
    assert_eq!(understood.len(), 2);
    assert_eq!(&understood[1].payload()[..], b"value");
}
