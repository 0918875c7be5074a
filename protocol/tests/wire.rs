use protocol::codec;
use protocol::packets::{ClientBound, ServerBound};
use protocol::{PacketReader, PacketWriter, BYTE_ARRAY_LENGTH, STRING_LENGTH};
use tokio::io::AsyncReadExt;

#[test]
fn string_round_trip() {
    let encoded = codec::encode_string("Minecraft Server");

    assert_eq!(encoded.len(), STRING_LENGTH);
    assert_eq!(&encoded[..16], b"Minecraft Server");
    assert!(encoded[16..].iter().all(|&b| b == 0x20));

    assert_eq!(codec::decode_string(&encoded, 0), "Minecraft Server");
}

#[test]
fn string_truncates_past_64_bytes() {
    let long = "x".repeat(100);
    let encoded = codec::encode_string(&long);

    assert_eq!(codec::decode_string(&encoded, 0), "x".repeat(64));
}

#[test]
fn string_decode_strips_only_trailing_spaces() {
    let encoded = codec::encode_string("  spaced  out");
    assert_eq!(codec::decode_string(&encoded, 0), "  spaced  out");
}

#[test]
fn short_round_trip() {
    for value in [0i16, 1, 5, 255, 256, 1024, i16::MAX, -1, -5, i16::MIN] {
        let encoded = codec::encode_short(value);
        assert_eq!(codec::decode_short(&encoded, 0), value, "value {value}");
    }
}

// A decode that shifts the high byte before widening collapses these to 0.
#[test]
fn short_decode_survives_high_bit() {
    assert_eq!(codec::decode_short(&[0x80, 0x01], 0), -32767);
    assert_eq!(codec::decode_short(&[0xff, 0xff], 0), -1);
    assert_eq!(codec::decode_short(&[0x7f, 0xff], 0), i16::MAX);
}

#[test]
fn int_is_big_endian() {
    assert_eq!(codec::encode_int(0x01020304), [0x01, 0x02, 0x03, 0x04]);
    assert_eq!(codec::encode_int(1048576), [0x00, 0x10, 0x00, 0x00]);
}

#[test]
fn byte_array_pads_with_zeroes() {
    let encoded = codec::encode_byte_array(&[1, 2, 3]);

    assert_eq!(encoded.len(), BYTE_ARRAY_LENGTH);
    assert_eq!(&encoded[..3], &[1, 2, 3]);
    assert!(encoded[3..].iter().all(|&b| b == 0));
}

#[test]
fn reader_zero_fills_past_end() {
    let mut r = PacketReader::new(&[0xab, 0xcd]);

    assert_eq!(r.read_byte(), 0xab);
    assert_eq!(r.read_bytes(4), vec![0xcd, 0, 0, 0]);
    assert_eq!(r.read_byte(), 0);
    assert!(r.eof());
}

#[test]
fn reader_maps_nul_to_space_in_strings() {
    // a string field whose tail was zero-filled by a short socket read
    let mut buffer = vec![b'B', b'o', b'b'];
    buffer.resize(STRING_LENGTH, 0);

    let mut r = PacketReader::new(&buffer);
    assert_eq!(r.read_string(), "Bob");
}

#[test]
fn reader_seek_and_reset() {
    let mut r = PacketReader::new(&[0x00, 0x11, 0x22, 0x33]);

    r.seek(2);
    assert_eq!(r.read_byte(), 0x22);

    r.reset();
    assert_eq!(r.read_byte(), 0x00);

    r.advance(2);
    assert_eq!(r.read_byte(), 0x33);
    assert!(r.eof());
}

#[test]
fn writer_appends_fields() {
    let mut w = PacketWriter::new();

    w.write_byte(0x00);
    w.write_byte(0x07);
    w.write_string("Minecraft Server");
    w.write_string("Welcome to my Minecraft Server!");
    w.write_byte(0x00);

    let expected = ClientBound::ServerIdentification {
        name: "Minecraft Server",
        motd: "Welcome to my Minecraft Server!",
        op: false,
    }
    .to_bytes();

    assert_eq!(w.as_slice(), &expected[..]);
}

#[tokio::test]
async fn writer_flush_clears_buffer() {
    let (mut client, mut server) = tokio::io::duplex(256);

    let mut w = PacketWriter::new();
    w.write_byte(0x0c);
    w.write_byte(3);
    w.flush_to(&mut client).await.unwrap();

    assert!(w.as_slice().is_empty());

    let mut received = [0u8; 2];
    server.read_exact(&mut received).await.unwrap();
    assert_eq!(received, [0x0c, 3]);
}

#[test]
fn server_identification_layout() {
    let bytes = ClientBound::ServerIdentification {
        name: "Minecraft Server",
        motd: "Welcome to my Minecraft Server!",
        op: false,
    }
    .to_bytes();

    assert_eq!(bytes.len(), 131);
    assert_eq!(bytes[0], 0x00);
    assert_eq!(bytes[1], 0x07);
    assert_eq!(codec::decode_string(&bytes, 2), "Minecraft Server");
    assert_eq!(
        codec::decode_string(&bytes, 2 + STRING_LENGTH),
        "Welcome to my Minecraft Server!"
    );
    assert_eq!(bytes[130], 0x00);
}

#[test]
fn identification_op_byte() {
    let bytes = ClientBound::ServerIdentification {
        name: "n",
        motd: "m",
        op: true,
    }
    .to_bytes();

    assert_eq!(bytes[130], 0x64);
}

#[test]
fn level_data_chunk_layout() {
    let data = vec![0x5a; 300];
    let bytes = ClientBound::LevelDataChunk {
        data: &data,
        percent: 42,
    }
    .to_bytes();

    assert_eq!(bytes.len(), 1028);
    assert_eq!(bytes[0], 0x03);
    assert_eq!(codec::decode_short(&bytes, 1), 300);
    assert_eq!(&bytes[3..303], &data[..]);
    assert!(bytes[303..1027].iter().all(|&b| b == 0));
    assert_eq!(bytes[1027], 42);
}

#[test]
fn level_finalize_layout() {
    let bytes = ClientBound::LevelFinalize {
        width: 128,
        height: 64,
        depth: 128,
    }
    .to_bytes();

    assert_eq!(bytes, vec![0x04, 0x00, 0x80, 0x00, 0x40, 0x00, 0x80]);
}

#[test]
fn set_block_layout() {
    let bytes = ClientBound::SetBlock {
        x: 5,
        y: 2,
        z: 5,
        block: 2,
    }
    .to_bytes();

    assert_eq!(bytes, vec![0x06, 0x00, 0x05, 0x00, 0x02, 0x00, 0x05, 0x02]);
}

#[test]
fn spawn_player_is_74_bytes() {
    let bytes = ClientBound::SpawnPlayer {
        id: 0xff,
        name: "Alice",
        x: (64 << 5) + 16,
        y: (8 << 5) + 16,
        z: (64 << 5) + 16,
        yaw: 0,
        pitch: 0,
    }
    .to_bytes();

    assert_eq!(bytes.len(), 74);
    assert_eq!(bytes[0], 0x07);
    assert_eq!(bytes[1], 0xff);
    assert_eq!(codec::decode_string(&bytes, 2), "Alice");
    assert_eq!(codec::decode_short(&bytes, 66), (64 << 5) + 16);
}

#[test]
fn position_update_wraps_deltas() {
    let bytes = ClientBound::PositionUpdate {
        id: 1,
        dx: 5,
        dy: 0,
        dz: -3,
        yaw: 10,
        pitch: 20,
    }
    .to_bytes();

    assert_eq!(bytes, vec![0x09, 1, 5, 0, 0xfd, 10, 20]);
}

#[test]
fn disconnect_is_65_bytes() {
    let bytes = ClientBound::Disconnect {
        reason: "The server is full!",
    }
    .to_bytes();

    assert_eq!(bytes.len(), 65);
    assert_eq!(bytes[0], 0x0e);
    assert_eq!(codec::decode_string(&bytes, 1), "The server is full!");
}

#[test]
fn message_layout() {
    let bytes = ClientBound::Message {
        source: 3,
        text: "Alice: hi",
    }
    .to_bytes();

    assert_eq!(bytes.len(), 66);
    assert_eq!(bytes[0], 0x0d);
    assert_eq!(bytes[1], 3);
    assert_eq!(codec::decode_string(&bytes, 2), "Alice: hi");
}

#[test]
fn parse_identification() {
    let mut body = Vec::new();
    body.push(0x07);
    body.extend_from_slice(&codec::encode_string("Alice"));
    body.extend_from_slice(&codec::encode_string("key"));
    body.push(0x00);

    assert_eq!(ServerBound::body_len(0x00), Some(body.len()));
    assert_eq!(
        ServerBound::parse(0x00, &body),
        Some(ServerBound::Identification {
            protocol: 0x07,
            username: "Alice".to_string(),
            verification_key: "key".to_string(),
        })
    );
}

#[test]
fn parse_set_block() {
    let body = [0x00, 0x05, 0x00, 0x02, 0x00, 0x05, 0x01, 0x03];

    assert_eq!(ServerBound::body_len(0x05), Some(body.len()));
    assert_eq!(
        ServerBound::parse(0x05, &body),
        Some(ServerBound::SetBlock {
            x: 5,
            y: 2,
            z: 5,
            mode: 0x01,
            block: 3,
        })
    );
}

#[test]
fn parse_position_ignores_player_id() {
    let body = [0xff, 0x00, 0x69, 0x00, 0x40, 0x00, 0x67, 0x0a, 0x14];

    assert_eq!(ServerBound::body_len(0x08), Some(body.len()));
    assert_eq!(
        ServerBound::parse(0x08, &body),
        Some(ServerBound::Position {
            x: 105,
            y: 64,
            z: 103,
            yaw: 0x0a,
            pitch: 0x14,
        })
    );
}

#[test]
fn parse_message() {
    let mut body = vec![0x00];
    body.extend_from_slice(&codec::encode_string("hello world"));

    assert_eq!(ServerBound::body_len(0x0d), Some(body.len()));
    assert_eq!(
        ServerBound::parse(0x0d, &body),
        Some(ServerBound::Message {
            text: "hello world".to_string(),
        })
    );
}

#[test]
fn unknown_packet_ids_have_no_length() {
    assert_eq!(ServerBound::body_len(0x01), None);
    assert_eq!(ServerBound::body_len(0xfe), None);
    assert!(ServerBound::parse(0xfe, &[]).is_none());
}
