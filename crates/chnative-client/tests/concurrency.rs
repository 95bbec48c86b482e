//! Tests for sharing one connection between tasks.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use chnative_client::{Block, Config, Connection, Error, OnProcess, Progress, QueryContext};
use chnative_testing::{MockServer, ServerScript, fixtures, init_tracing};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_cancel_wakes_blocked_drain() {
    init_tracing();
    let (stream, recording, mut server) = MockServer::pair();
    let script = ServerScript::new().progress(&Progress {
        rows: 1,
        ..Progress::default()
    });
    let expected = script.clone().build();
    server.send(script).await.unwrap();

    let conn = Arc::new(Connection::new(stream, Config::default()).unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let drainer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            let mut on = OnProcess::new().on_progress(move |p| {
                let _ = tx.send(p);
            });
            conn.drain(&QueryContext::new(), &mut on).await
        })
    };

    // The progress packet has been handled; drain now waits for a tag.
    rx.recv().await.unwrap();
    conn.cancel().await.unwrap();

    let err = drainer.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    assert!(!err.is_connection_reusable());
    assert_eq!(recording.read_data(), expected);
    assert_eq!(server.read_to_end().await.unwrap(), vec![3]);
}

#[tokio::test]
async fn test_cancel_during_drain_keeps_reads_aligned() {
    init_tracing();
    const BLOCKS: usize = 40;

    let mut script = ServerScript::new();
    for i in 0..BLOCKS {
        script = script.data(&fixtures::rows_block(i + 1));
    }
    let expected = script.clone().build();

    // A small pipe makes payloads arrive in several reads.
    let (stream, recording, mut server) = MockServer::pair_with_capacity(97);
    let sender = tokio::spawn(async move {
        let _ = server.send(script).await;
        server
    });

    let conn = Arc::new(Connection::new(stream, Config::default()).unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel::<Block>();
    let drainer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move {
            let mut on = OnProcess::new().on_data(move |block| {
                let _ = tx.send(block);
            });
            conn.drain(&QueryContext::new(), &mut on).await
        })
    };

    let mut received = Vec::new();
    while received.len() < 5 {
        received.push(rx.recv().await.unwrap());
    }
    conn.cancel().await.unwrap();

    let err = drainer.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    while let Some(block) = rx.recv().await {
        received.push(block);
    }
    sender.abort();

    // Blocks arrive whole and in server order.
    for (i, block) in received.iter().enumerate() {
        assert_eq!(*block, fixtures::rows_block(i + 1));
    }

    // Every byte was read once, in order.
    let reads = recording.reads();
    let mut next = 0;
    for read in &reads {
        assert_eq!(read.offset, next);
        next += read.len as u64;
    }
    let read = recording.read_data();
    assert_eq!(read.len() as u64, next);
    assert_eq!(read, expected.slice(..read.len()));
    assert_eq!(&recording.written()[..], [3]);
}

#[tokio::test]
async fn test_close_while_drain_waits() {
    init_tracing();
    let (stream, recording, _server) = MockServer::pair();
    let conn = Arc::new(Connection::new(stream, Config::default()).unwrap());

    let drainer = {
        let conn = Arc::clone(&conn);
        tokio::spawn(async move { conn.drain(&QueryContext::new(), &mut OnProcess::new()).await })
    };
    tokio::task::yield_now().await;
    conn.close().await.unwrap();

    let err = drainer.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed));
    assert!(recording.written().is_empty());
    assert_eq!(recording.bytes_read(), 0);
}
