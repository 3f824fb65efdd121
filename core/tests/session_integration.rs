/*
 * session_integration.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests for the IMAP session pipeline. A scripted in-memory
 * server (tokio duplex stream) plays the other end of the connection so
 * the full cycle is exercised: tag allocation, command encoding,
 * continuation rounds, response aggregation, streaming and teardown.
 *
 * Run with:
 *   cargo test -p portalettere_core --test session_integration -- --nocapture
 */

use portalettere_core::command::{FetchCommand, ImapCommand};
use portalettere_core::sasl::oauthbearer_client_response;
use portalettere_core::{ImapError, ImapSession, SessionState};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Read one CRLF-terminated line from the scripted server's end.
async fn read_line(server: &mut DuplexStream) -> String {
    let mut buf = Vec::new();
    let mut b = [0u8; 1];
    loop {
        let n = server.read(&mut b).await.expect("server read");
        assert!(n > 0, "client closed while server expected a line");
        buf.push(b[0]);
        if buf.len() >= 2 && buf[buf.len() - 2..] == *b"\r\n" {
            break;
        }
    }
    String::from_utf8_lossy(&buf[..buf.len() - 2]).to_string()
}

async fn write_line(server: &mut DuplexStream, line: &str) {
    server
        .write_all(format!("{}\r\n", line).as_bytes())
        .await
        .expect("server write");
}

fn start_session() -> (ImapSession, DuplexStream) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (reader, writer) = tokio::io::split(client);
    (ImapSession::attach(reader, writer), server)
}

/// Script a LOGIN exchange; the OK line advertises the given capabilities.
async fn scripted_login(session: &ImapSession, server: &mut DuplexStream, caps: &str) {
    let handle = session.execute_login("user@example.com", "secret").unwrap();
    let line = read_line(server).await;
    assert_eq!(line, "A0001 LOGIN \"user@example.com\" \"secret\"");
    write_line(server, &format!("A0001 OK [CAPABILITY {}] logged in", caps)).await;
    let completion = handle.wait().await.unwrap();
    assert!(completion.status.is_ok());
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_greeting_seeds_capabilities() {
    let (session, mut server) = start_session();
    write_line(
        &mut server,
        "* OK [CAPABILITY IMAP4rev1 AUTH=XOAUTH2 SASL-IR] server ready",
    )
    .await;
    // Sequence on a NOOP so the greeting is known to be processed.
    let handle = session.execute_noop().unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0001 OK NOOP completed").await;
    handle.wait().await.unwrap();
    assert!(session.has_capability("AUTH=XOAUTH2"));
    assert!(session.has_capability("SASL-IR"));
}

#[tokio::test]
async fn test_preauth_greeting_skips_authentication() {
    let (session, mut server) = start_session();
    write_line(&mut server, "* PREAUTH portalettere server ready").await;
    let handle = session.execute_noop().unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0001 OK NOOP completed").await;
    handle.wait().await.unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_select_aggregates_untagged() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1 IDLE").await;

    let handle = session.execute_select("INBOX").unwrap();
    assert_eq!(read_line(&mut server).await, "A0002 SELECT INBOX");
    write_line(&mut server, "* 3 EXISTS").await;
    write_line(&mut server, "* 0 RECENT").await;
    write_line(&mut server, "* OK [UIDVALIDITY 3857529045] UIDs valid").await;
    write_line(&mut server, "A0002 OK [READ-WRITE] SELECT completed").await;

    let completion = handle.wait().await.unwrap();
    assert!(completion.status.is_ok());
    let lines: Vec<&str> = completion.untagged.iter().map(|u| u.line.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "* 3 EXISTS",
            "* 0 RECENT",
            "* OK [UIDVALIDITY 3857529045] UIDs valid",
        ]
    );
    assert_eq!(session.state(), SessionState::Selected);
}

#[tokio::test]
async fn test_capability_set_is_replaced_wholesale() {
    let (session, mut server) = start_session();
    assert!(session.capabilities().is_empty());

    let handle = session.execute_capability().unwrap();
    assert_eq!(read_line(&mut server).await, "A0001 CAPABILITY");
    write_line(&mut server, "* CAPABILITY IMAP4rev1 AUTH=XOAUTH2 SASL-IR").await;
    write_line(&mut server, "A0001 OK CAPABILITY completed").await;
    handle.wait().await.unwrap();
    assert!(session.has_capability("AUTH=XOAUTH2"));
    assert!(session.has_capability("sasl-ir"));

    let handle = session.execute_capability().unwrap();
    assert_eq!(read_line(&mut server).await, "A0002 CAPABILITY");
    write_line(&mut server, "* CAPABILITY IMAP4rev1 IDLE").await;
    write_line(&mut server, "A0002 OK CAPABILITY completed").await;
    handle.wait().await.unwrap();
    assert!(session.has_capability("IDLE"));
    assert!(!session.has_capability("AUTH=XOAUTH2"));
}

#[tokio::test]
async fn test_oauthbearer_deferred_payload_round_trip() {
    let (session, mut server) = start_session();

    // Advertise OAUTHBEARER without SASL-IR: payload must be deferred.
    let handle = session.execute_capability().unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "* CAPABILITY IMAP4rev1 AUTH=OAUTHBEARER").await;
    write_line(&mut server, "A0001 OK done").await;
    handle.wait().await.unwrap();

    let handle = session
        .execute_oauthbearer("user@example.com", "imap.example.com", 993, "tok123")
        .unwrap();
    assert_eq!(read_line(&mut server).await, "A0002 AUTHENTICATE OAUTHBEARER");
    write_line(&mut server, "+ ").await;
    let payload = read_line(&mut server).await;
    assert_eq!(
        payload,
        oauthbearer_client_response("user@example.com", "imap.example.com", 993, "tok123")
    );
    write_line(&mut server, "A0002 OK authenticated").await;
    assert!(handle.wait().await.unwrap().status.is_ok());
    assert_eq!(session.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_append_literal_goes_out_on_continuation() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;

    let message = b"From: a@b\r\n\r\nhello".to_vec();
    let handle = session.execute_append("Drafts", message.clone()).unwrap();
    assert_eq!(
        read_line(&mut server).await,
        format!("A0002 APPEND Drafts {{{}}}", message.len())
    );
    write_line(&mut server, "+ Ready for literal data").await;
    let mut body = vec![0u8; message.len() + 2];
    server.read_exact(&mut body).await.unwrap();
    assert_eq!(&body[..message.len()], &message[..]);
    assert_eq!(&body[message.len()..], b"\r\n");
    write_line(&mut server, "A0002 OK APPEND completed").await;
    assert!(handle.wait().await.unwrap().status.is_ok());
}

#[tokio::test]
async fn test_idle_streams_in_order_until_done() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1 IDLE").await;

    let handle = session.execute_select("INBOX").unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0002 OK SELECT completed").await;
    handle.wait().await.unwrap();

    let (handle, mut stream) = session.execute_idle().unwrap();
    assert_eq!(session.state(), SessionState::Idling);
    assert_eq!(read_line(&mut server).await, "A0003 IDLE");
    write_line(&mut server, "+ idling").await;
    write_line(&mut server, "* 4 EXISTS").await;
    write_line(&mut server, "* 1 RECENT").await;
    write_line(&mut server, "* 5 EXISTS").await;

    assert_eq!(stream.recv().await.unwrap().line, "* 4 EXISTS");
    assert_eq!(stream.recv().await.unwrap().line, "* 1 RECENT");
    assert_eq!(stream.recv().await.unwrap().line, "* 5 EXISTS");

    session.done().unwrap();
    assert_eq!(read_line(&mut server).await, "DONE");
    write_line(&mut server, "A0003 OK IDLE terminated").await;

    let completion = handle.wait().await.unwrap();
    assert!(completion.status.is_ok());
    assert!(completion.untagged.is_empty());
    assert!(stream.recv().await.is_none());
    assert_eq!(session.state(), SessionState::Selected);
}

#[tokio::test]
async fn test_streaming_fetch_forwards_live() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;

    let handle = session.execute_select("INBOX").unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0002 OK SELECT completed").await;
    handle.wait().await.unwrap();

    let fetch = FetchCommand::with_items(
        vec![portalettere_core::message_set::MessageNumberSet::Range(1, 2)],
        "UID FLAGS",
    )
    .streaming();
    let (handle, mut stream) = session
        .execute_streaming(ImapCommand::Fetch(fetch))
        .unwrap();
    assert_eq!(read_line(&mut server).await, "A0003 FETCH 1:2 (UID FLAGS)");
    write_line(&mut server, "* 1 FETCH (UID 544 FLAGS (\\Seen))").await;
    write_line(&mut server, "* 2 FETCH (UID 545 FLAGS ())").await;
    assert_eq!(
        stream.recv().await.unwrap().line,
        "* 1 FETCH (UID 544 FLAGS (\\Seen))"
    );
    assert_eq!(stream.recv().await.unwrap().line, "* 2 FETCH (UID 545 FLAGS ())");
    write_line(&mut server, "A0003 OK FETCH completed").await;
    assert!(handle.wait().await.unwrap().status.is_ok());
    assert!(stream.recv().await.is_none());
}

#[tokio::test]
async fn test_pipelined_untagged_data_follows_oldest_tag() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;

    let noop = session.execute_noop().unwrap();
    let status = session.execute_status("INBOX", &["MESSAGES", "UIDNEXT"]).unwrap();
    assert_eq!(read_line(&mut server).await, "A0002 NOOP");
    assert_eq!(
        read_line(&mut server).await,
        "A0003 STATUS INBOX (MESSAGES UIDNEXT)"
    );
    write_line(&mut server, "A0002 OK NOOP completed").await;
    write_line(&mut server, "* STATUS INBOX (MESSAGES 231 UIDNEXT 44292)").await;
    write_line(&mut server, "A0003 OK STATUS completed").await;

    let noop_completion = noop.wait().await.unwrap();
    assert!(noop_completion.untagged.is_empty());
    let status_completion = status.wait().await.unwrap();
    assert_eq!(status_completion.untagged.len(), 1);
    assert_eq!(
        status_completion.untagged[0].line,
        "* STATUS INBOX (MESSAGES 231 UIDNEXT 44292)"
    );
}

#[tokio::test]
async fn test_unknown_tag_leaves_other_handles_untouched() {
    let (session, mut server) = start_session();
    let handle = session.execute_noop().unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A9999 OK nobody asked").await;
    write_line(&mut server, "A0001 OK NOOP completed").await;
    assert!(handle.wait().await.unwrap().status.is_ok());
}

#[tokio::test]
async fn test_transport_teardown_fails_all_outstanding() {
    let (session, mut server) = start_session();
    let h1 = session.execute_noop().unwrap();
    let h2 = session.execute_noop().unwrap();
    let h3 = session.execute_capability().unwrap();
    for _ in 0..3 {
        read_line(&mut server).await;
    }
    drop(server);
    for h in [h1, h2, h3] {
        assert!(matches!(h.wait().await, Err(ImapError::ConnectionClosed(_))));
    }
    assert_eq!(session.state(), SessionState::Closed);
    assert!(matches!(
        session.execute_noop(),
        Err(ImapError::StateViolation { .. })
    ));
}

#[tokio::test]
async fn test_illegal_commands_fail_before_any_bytes() {
    let (session, _server) = start_session();
    // Not authenticated: SELECT and FETCH are out.
    assert!(matches!(
        session.execute_select("INBOX"),
        Err(ImapError::StateViolation { .. })
    ));
    let fetch = FetchCommand::with_items(
        vec![portalettere_core::message_set::MessageNumberSet::Single(1)],
        "FLAGS",
    );
    assert!(matches!(
        session.execute_fetch(fetch),
        Err(ImapError::StateViolation { .. })
    ));
    // IDLE needs Selected.
    assert!(matches!(
        session.execute_idle(),
        Err(ImapError::StateViolation { .. })
    ));
    // DONE with no IDLE outstanding.
    assert!(matches!(
        session.done(),
        Err(ImapError::StateViolation { .. })
    ));
}

#[tokio::test]
async fn test_idle_without_capability_is_capability_missing() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;
    let handle = session.execute_select("INBOX").unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0002 OK SELECT completed").await;
    handle.wait().await.unwrap();

    assert!(matches!(
        session.execute_idle(),
        Err(ImapError::CapabilityMissing(_))
    ));
}

#[tokio::test]
async fn test_second_continuation_command_rejected_while_first_pending() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;

    let _first = session.execute_append("Drafts", b"one".to_vec()).unwrap();
    assert!(matches!(
        session.execute_append("Drafts", b"two".to_vec()),
        Err(ImapError::StateViolation { .. })
    ));
    // Server never prompted; tear down.
    drop(server);
}

#[tokio::test]
async fn test_logout_closes_session() {
    let (session, mut server) = start_session();
    let handle = session.execute_logout().unwrap();
    assert_eq!(read_line(&mut server).await, "A0001 LOGOUT");
    write_line(&mut server, "* BYE portalettere signing off").await;
    write_line(&mut server, "A0001 OK LOGOUT completed").await;
    let completion = handle.wait().await.unwrap();
    assert!(completion.status.is_ok());
    assert_eq!(completion.untagged[0].line, "* BYE portalettere signing off");
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_fetch_literal_attached_to_untagged_line() {
    let (session, mut server) = start_session();
    scripted_login(&session, &mut server, "IMAP4rev1").await;
    let handle = session.execute_select("INBOX").unwrap();
    read_line(&mut server).await;
    write_line(&mut server, "A0002 OK SELECT completed").await;
    handle.wait().await.unwrap();

    let fetch = FetchCommand::uid_with_items(
        vec![portalettere_core::message_set::MessageNumberSet::Single(544)],
        "BODY[]",
    );
    let handle = session.execute_fetch(fetch).unwrap();
    assert_eq!(read_line(&mut server).await, "A0003 UID FETCH 544 (BODY[])");
    server
        .write_all(b"* 1 FETCH (UID 544 BODY[] {5}\r\nhello)\r\n")
        .await
        .unwrap();
    write_line(&mut server, "A0003 OK FETCH completed").await;

    let completion = handle.wait().await.unwrap();
    assert!(completion.status.is_ok());
    assert_eq!(completion.untagged[0].literal.as_deref(), Some(&b"hello"[..]));
    // tail of the literal-carrying response arrives as its own data line
    assert_eq!(completion.untagged[1].line, ")");
}
