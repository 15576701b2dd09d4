//! End-to-end tests against a loopback server.
//!
//! Each test spawns a small blocking server thread that answers the upgrade
//! request and then plays a scripted exchange of frames.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::json;
use sockwire::frame::{self, Frame, Opcode};
use sockwire::{compute_accept_key, ClientConfig, Connection, ConnectionState, WsError};

/// Read the upgrade request and return its `Sec-WebSocket-Key`.
fn read_request(reader: &mut BufReader<TcpStream>) -> (Vec<String>, String) {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end().to_string();
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }
    let key = lines
        .iter()
        .find_map(|l| l.strip_prefix("Sec-WebSocket-Key: "))
        .unwrap()
        .to_string();
    (lines, key)
}

fn write_response(stream: &mut TcpStream, accept: &str) {
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {accept}\r\n\r\n"
    );
    stream.write_all(response.as_bytes()).unwrap();
}

/// Accept one connection and complete the handshake.
fn accept_upgrade(listener: &TcpListener) -> (BufReader<TcpStream>, TcpStream, Vec<String>) {
    let (stream, _) = listener.accept().unwrap();
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    let (lines, key) = read_request(&mut reader);
    write_response(&mut writer, &compute_accept_key(&key));
    (reader, writer, lines)
}

/// Read one client frame byte by byte until it is complete.
fn read_client_frame(reader: &mut impl Read) -> Frame {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if let Some(total) = frame::frame_len(&bytes).unwrap() {
            if bytes.len() >= total {
                return frame::decode_frame(&bytes).unwrap();
            }
        }
        reader.read_exact(&mut byte).unwrap();
        bytes.push(byte[0]);
    }
}

fn server<F>(handler: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(TcpListener) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (port, thread::spawn(move || handler(listener)))
}

fn client_config() -> ClientConfig {
    ClientConfig::new()
        .read_timeout(Some(Duration::from_secs(5)))
        .write_timeout(Some(Duration::from_secs(5)))
        .connect_timeout(Some(Duration::from_secs(5)))
}

#[test]
fn test_send_and_receive_echo() {
    let (port, handle) = server(|listener| {
        let (mut reader, mut writer, _) = accept_upgrade(&listener);
        let frame = read_client_frame(&mut reader);
        assert!(frame.masked);
        assert_eq!(frame.opcode, Opcode::Text);

        let reply = frame::encode_with_mask(&frame.payload, Opcode::Text, None).unwrap();
        writer.write_all(&reply).unwrap();
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    conn.send(&json!({ "msg": "hello" })).unwrap();

    let echoed: serde_json::Value = conn.receive_json().unwrap();
    assert_eq!(echoed, json!({ "msg": "hello" }));

    conn.close();
    handle.join().unwrap();
}

#[test]
fn test_upgrade_request_headers() {
    let (port, handle) = server(move |listener| {
        let (_reader, _writer, lines) = accept_upgrade(&listener);
        assert_eq!(lines[0], "GET /socket.io/?EIO=2&transport=websocket HTTP/1.1");
        assert_eq!(lines[1], format!("Host: http://127.0.0.1:{}", listener.local_addr().unwrap().port()));
        assert_eq!(lines[2], "Connection: Upgrade");
        assert_eq!(lines[3], "Upgrade: WebSocket");
        assert!(lines[4].starts_with("Sec-WebSocket-Key: "));
        assert_eq!(lines[5], "Sec-WebSocket-Version:");
        assert_eq!(lines[6], "Origin: *");
        assert_eq!(lines.len(), 7);
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    conn.ensure_connected().unwrap();
    assert!(conn.is_connected());

    conn.close();
    handle.join().unwrap();
}

#[test]
fn test_emit_socket_io_event() {
    let (port, handle) = server(|listener| {
        let (mut reader, _writer, _) = accept_upgrade(&listener);
        let frame = read_client_frame(&mut reader);
        assert_eq!(frame.as_text(), Some(r#"42["msg","hello"]"#));
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    conn.emit("msg", "hello").unwrap();

    handle.join().unwrap();
    conn.close();
}

#[test]
fn test_frames_in_the_handshake_segment() {
    let (port, handle) = server(|listener| {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let (_, key) = read_request(&mut reader);

        let mut segment = format!(
            "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n\r\n",
            compute_accept_key(&key)
        )
        .into_bytes();
        segment.extend(frame::encode_with_mask(br#"0{"sid":"abc"}"#, Opcode::Text, None).unwrap());
        segment.extend(frame::encode_with_mask(b"40", Opcode::Text, None).unwrap());
        writer.write_all(&segment).unwrap();
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    assert_eq!(conn.receive().unwrap(), br#"0{"sid":"abc"}"#);
    assert_eq!(conn.receive().unwrap(), b"40");

    handle.join().unwrap();
    conn.close();
}

#[test]
fn test_large_binary_reply_spans_reads() {
    let payload: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let (port, handle) = server(move |listener| {
        let (mut reader, mut writer, _) = accept_upgrade(&listener);
        let _request = read_client_frame(&mut reader);

        let reply = frame::encode_with_mask(&payload, Opcode::Binary, None).unwrap();
        assert_eq!(reply[1], 127);
        for chunk in reply.chunks(4096) {
            writer.write_all(chunk).unwrap();
            writer.flush().unwrap();
        }
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    conn.send_text("download").unwrap();
    assert_eq!(conn.receive().unwrap(), expected);

    conn.close();
    handle.join().unwrap();
}

#[test]
fn test_ping_surfaces_as_unsupported_then_frame() {
    let (port, handle) = server(|listener| {
        let (mut reader, mut writer, _) = accept_upgrade(&listener);
        let _request = read_client_frame(&mut reader);
        let ping = frame::encode_with_mask(b"beat", Opcode::Ping, None).unwrap();
        writer.write_all(&ping).unwrap();

        // Wait for the client's next request before sending the second ping.
        let _request = read_client_frame(&mut reader);
        writer.write_all(&ping).unwrap();
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    conn.send_text("one").unwrap();
    let err = conn.receive().unwrap_err();
    assert!(matches!(
        err,
        WsError::UnsupportedFrameType { opcode: 0x9, fin: true }
    ));

    conn.send_text("two").unwrap();
    let frame = conn.receive_frame().unwrap();
    assert_eq!(frame.opcode, Opcode::Ping);
    assert_eq!(frame.payload, b"beat");

    conn.close();
    handle.join().unwrap();
}

#[test]
fn test_rejected_handshake() {
    let (port, handle) = server(|listener| {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let _ = read_request(&mut reader);
        write_response(&mut writer, "AAAAAAAAAAAAAAAAAAAAAAAAAAA=");

        // The client closes the stream after rejecting the response.
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    let err = conn.send_text("hello").unwrap_err();
    assert!(matches!(err, WsError::HandshakeRejected { .. }));
    assert!(err.is_fatal());
    assert_eq!(conn.state(), ConnectionState::Disconnected);

    handle.join().unwrap();
}

#[test]
fn test_malformed_handshake_response() {
    let (port, handle) = server(|listener| {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let _ = read_request(&mut reader);
        writer
            .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
    });

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    let err = conn.ensure_connected().unwrap_err();
    assert!(matches!(err, WsError::HandshakeMalformedResponse(_)));

    handle.join().unwrap();
}

#[test]
fn test_expired_handshake_reconnects() {
    let (port, handle) = server(|listener| {
        for expected in ["first", "second"] {
            let (mut reader, _writer, _) = accept_upgrade(&listener);
            let frame = read_client_frame(&mut reader);
            assert_eq!(frame.as_text(), Some(expected));
        }
    });

    let config = client_config().handshake_expiry(Duration::from_millis(200));
    let mut conn = Connection::with_config("127.0.0.1", port, config);

    conn.send_text("first").unwrap();
    thread::sleep(Duration::from_millis(300));
    conn.send_text("second").unwrap();

    handle.join().unwrap();
    conn.close();
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut conn = Connection::with_config("127.0.0.1", port, client_config());
    let err = conn.send_text("hello").unwrap_err();
    assert!(matches!(err, WsError::Io(_)));
    assert!(!conn.is_connected());
}
