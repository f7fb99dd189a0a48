use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use regist::activation_key::is_activation_key;
use regist::client::request::build_request_for_raw_serial;
use regist::client::ActivationClient;
use regist::codec::Codec;
use regist::errors::RegistResult;
use regist::pipeline::ActivationPipeline;
use regist::protocol::{Rejection, ResponseToken};
use regist::server::{ActivationServer, SessionOptions};

/// Spin up a server on a random loopback port.
async fn start_server() -> (String, JoinHandle<RegistResult<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let server = ActivationServer::from_listener(
        listener,
        ActivationPipeline::default(),
        SessionOptions::default(),
    );
    let addr = server.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move { server.run().await });
    (addr, handle)
}

async fn read_line(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await.expect("read failed");
        assert_eq!(n, 1, "connection closed mid-line");
        if byte[0] == b'\n' {
            break;
        }
        out.push(byte[0]);
    }
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn issues_key_and_keeps_session_open_after_rejections() {
    let (addr, server) = start_server().await;
    let mut client = ActivationClient::connect(addr.as_str()).await.unwrap();

    assert_eq!(
        client.request("FOO,a,b").await.unwrap(),
        ResponseToken::Rejected(Rejection::BadFormat)
    );
    assert_eq!(
        client.request("RRC,00,11111111").await.unwrap(),
        ResponseToken::Rejected(Rejection::BadSerial)
    );

    let line = build_request_for_raw_serial(&Codec::default(), "SYS123", "456789").unwrap();
    match client.request(&line).await.unwrap() {
        ResponseToken::Activated(key) => assert!(is_activation_key(&key), "{key}"),
        other => panic!("expected activation key, got {other:?}"),
    }

    client.disconnect().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn disconnect_message_closes_without_response() {
    let (addr, server) = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    stream.write_all(b"X\n").await.unwrap();

    let mut rest = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
        .await
        .expect("server should close the connection");
    assert_eq!(read.unwrap(), 0);
    assert!(rest.is_empty());

    server.abort();
}

#[tokio::test]
async fn disconnect_after_partial_request_sends_nothing() {
    let (addr, server) = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    stream.write_all(b"RRC,00,").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(b"X\n").await.unwrap();

    let mut rest = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
        .await
        .expect("server should close the connection")
        .unwrap();
    assert!(rest.is_empty(), "unexpected response: {rest:?}");

    server.abort();
}

#[tokio::test]
async fn request_split_across_writes_is_reassembled() {
    let (addr, server) = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    // Long fingerprint so the line also spans several 256-byte reads.
    let fingerprint = "CPU:Intel;BOARD:ABC123;".repeat(20);
    let line = build_request_for_raw_serial(&Codec::default(), &fingerprint, "000001").unwrap();
    let (head, tail) = line.split_at(10);

    stream.write_all(head.as_bytes()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(tail.as_bytes()).await.unwrap();
    stream.write_all(b"\n").await.unwrap();

    let response = read_line(&mut stream).await;
    assert!(is_activation_key(&response), "{response}");

    server.abort();
}

#[tokio::test]
async fn back_to_back_lines_get_one_response_each() {
    let (addr, server) = start_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();

    stream
        .write_all(b"FOO,a,b\nRRC,00,11111111\n")
        .await
        .unwrap();

    assert_eq!(read_line(&mut stream).await, "BADFORMAT");
    assert_eq!(read_line(&mut stream).await, "BADSN");

    server.abort();
}

#[tokio::test]
async fn sessions_are_served_one_at_a_time() {
    let (addr, server) = start_server().await;

    let mut first = ActivationClient::connect(addr.as_str()).await.unwrap();
    assert_eq!(first.send_line("FOO,a,b").await.unwrap(), "BADFORMAT");

    // The second client connects, but is not served while the first is open.
    let mut second = TcpStream::connect(&addr).await.unwrap();
    second.write_all(b"FOO,a,b\n").await.unwrap();
    let mut byte = [0u8; 1];
    let waiting = tokio::time::timeout(Duration::from_millis(200), second.read(&mut byte)).await;
    assert!(waiting.is_err(), "second session must wait for the first");

    first.disconnect().await.unwrap();
    assert_eq!(read_line(&mut second).await, "BADFORMAT");

    server.abort();
}
