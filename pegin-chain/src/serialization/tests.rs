//! Serialization tests.

use color_eyre::eyre::Result;
use proptest::prelude::*;

use super::*;

#[test]
fn compactsize_rejects_non_canonical_encodings() {
    pegin_test::init();

    let non_canonical: [&[u8]; 3] = [
        b"\xfd\xfc\x00",
        b"\xfe\xff\xff\x00\x00",
        b"\xff\xff\xff\xff\xff\x00\x00\x00\x00",
    ];

    for bytes in non_canonical {
        assert!(
            matches!(
                (&mut &bytes[..]).read_compactsize(),
                Err(SerializationError::Parse(_))
            ),
            "{bytes:?}"
        );
    }
}

#[test]
fn compactsize_rejects_oversized_lengths() {
    pegin_test::init();

    let mut bytes = Vec::new();
    bytes
        .write_compactsize(MAX_PROTOCOL_MESSAGE_LEN as u64 + 1)
        .expect("vec writes are infallible");

    assert!((&mut bytes.as_slice()).read_compactsize().is_err());
}

#[test]
fn exact_deserialization_rejects_trailing_bytes() -> Result<()> {
    pegin_test::init();

    let bytes = [0x02, 0xaa, 0xbb];
    assert_eq!(Vec::<u8>::consensus_deserialize_exact(&bytes)?, vec![0xaa, 0xbb]);

    let bytes = [0x01, 0xaa, 0xbb];
    assert!(matches!(
        Vec::<u8>::consensus_deserialize_exact(&bytes),
        Err(SerializationError::TrailingBytes(1))
    ));

    Ok(())
}

#[test]
fn sha256d_matches_known_vector() {
    pegin_test::init();

    // SHA256d("hello")
    assert_eq!(
        hex::encode(sha256d::hash(b"hello")),
        "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
    );
}

proptest! {
    #[test]
    fn compactsize_round_trip(n in 0..=(MAX_PROTOCOL_MESSAGE_LEN as u64)) {
        pegin_test::init();

        let mut bytes = Vec::new();
        bytes.write_compactsize(n)?;
        prop_assert_eq!(bytes.len(), compactsize_len(n));

        let parsed = (&mut bytes.as_slice()).read_compactsize()?;
        prop_assert_eq!(parsed, n);
    }
}
