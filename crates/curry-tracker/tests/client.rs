use std::time::Duration;

use curry_core::{
    Attachment, Credential, ErrorKind, Taxonomy, TorrentDownloader, TrackerEndpoint,
    UploadPayload,
};
use curry_tracker::TrackerClient;
use httpmock::MockServer;
use httpmock::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn client(server: &MockServer, credential: Credential) -> anyhow::Result<TrackerClient> {
    client_at(server.base_url(), credential)
}

fn client_at(base_url: String, credential: Credential) -> anyhow::Result<TrackerClient> {
    let endpoint = TrackerEndpoint {
        base_url,
        announce_host: "flacsfor.me".to_string(),
        acronym: "RED".to_string(),
        credential,
        taxonomy: Taxonomy::Redacted,
        requires_log_field: false,
    };
    Ok(TrackerClient::new(endpoint, Duration::from_secs(5))?)
}

fn cookie() -> Credential {
    Credential::SessionCookie("session=abc".to_string())
}

fn payload() -> UploadPayload {
    UploadPayload {
        auth: Some("authkey".to_string()),
        category: 0,
        artists: vec!["Artist".to_string()],
        importance: vec![1],
        title: "Album".to_string(),
        year: 2001,
        release_type: 1,
        format: "FLAC".to_string(),
        media: "CD".to_string(),
        bitrate: "Lossless".to_string(),
        album_description: String::new(),
        release_description: String::new(),
        tags: "rock".to_string(),
        image: String::new(),
        remaster_year: 2001,
        remaster_record_label: String::new(),
        remaster_catalogue_number: String::new(),
        remaster_title: String::new(),
        scene: false,
        torrent: Attachment {
            file_name: "Album-redacted.sh.torrent".to_string(),
            mime: Attachment::TORRENT_MIME,
            bytes: b"d4:infod4:name5:Albumee".to_vec(),
        },
        logs: Vec::new(),
    }
}

#[tokio::test]
async fn fetch_index_sends_cookie_and_parses_keys() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ajax.php")
            .query_param("action", "index")
            .header("cookie", "session=abc");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "status": "success",
                "response": {"id": 7, "authkey": "ak", "passkey": "pk", "username": "me"}
            }));
    });

    let index = client(&server, cookie())?.fetch_index().await?;

    mock.assert();
    assert_eq!(index.id, 7);
    assert_eq!(index.authkey, "ak");
    assert_eq!(index.passkey, "pk");
    Ok(())
}

#[tokio::test]
async fn login_redirect_is_an_auth_error() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/ajax.php");
        then.status(302).header("location", "login.php");
    });

    let err = client(&server, cookie())?
        .fetch("index", &[])
        .await
        .expect_err("redirect to login");

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.is_fatal());
    assert_eq!(err.tracker(), Some("RED"));
    Ok(())
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ajax.php");
        then.status(200);
    });

    let err = client(&server, Credential::SessionCookie(String::new()))?
        .fetch("index", &[])
        .await
        .expect_err("no credential");

    assert_eq!(err.kind(), ErrorKind::Auth);
    mock.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn failure_envelope_and_bad_status_are_protocol_errors() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/ajax.php").query_param("action", "torrent");
        then.status(200)
            .json_body(json!({"status": "failure", "error": "bad id parameter"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ajax.php").query_param("action", "index");
        then.status(502);
    });
    let client = client(&server, cookie())?;

    let envelope = client.fetch_torrent_by_id(9).await.expect_err("failure status");
    assert_eq!(envelope.kind(), ErrorKind::Protocol);
    assert!(envelope.message().contains("bad id parameter"));

    let status = client.fetch_index().await.expect_err("502");
    assert_eq!(status.kind(), ErrorKind::Protocol);
    Ok(())
}

#[tokio::test]
async fn torrent_lookup_by_hash_uses_upper_case() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ajax.php")
            .query_param("action", "torrent")
            .query_param("hash", "ABC123");
        then.status(200).json_body(json!({
            "status": "success",
            "response": {
                "group": {"name": "Album", "year": 2001, "releaseType": 1, "tags": []},
                "torrent": {"id": 42, "filePath": "Album", "fileList": "", "hasLog": false}
            }
        }));
    });

    let record = client(&server, cookie())?
        .fetch_torrent_by_hash("abc123")
        .await?;

    mock.assert();
    assert_eq!(record.torrent_id, 42);
    assert_eq!(record.file_path, "Album");
    Ok(())
}

#[tokio::test]
async fn session_upload_follows_the_torrents_redirect() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/upload.php")
            .header("cookie", "session=abc");
        then.status(302).header("location", "torrents.php?id=55");
    });

    let location = client(&server, cookie())?.upload(payload()).await?;

    mock.assert();
    assert_eq!(location, format!("{}/torrents.php?id=55", server.base_url()));
    Ok(())
}

#[tokio::test]
async fn session_upload_surfaces_the_red_paragraph() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/upload.php");
        then.status(200).body(
            r#"<html><div class="thin"><p style="color: red; text-align: center;">Duplicate upload</p></div></html>"#,
        );
    });

    let err = client(&server, cookie())?
        .upload_form(payload())
        .await
        .expect_err("rejected");

    assert_eq!(err.kind(), ErrorKind::Upload);
    assert_eq!(err.message(), "Duplicate upload");
    Ok(())
}

#[tokio::test]
async fn session_upload_without_message_is_generic_and_other_status_is_protocol() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let client_a = client(&server, cookie())?;
    let mut ok_page = server.mock(|when, then| {
        when.method(POST).path("/upload.php");
        then.status(200).body("<html><div class=\"thin\"></div></html>");
    });

    let generic = client_a.upload_form(payload()).await.expect_err("rejected");
    assert_eq!(generic.kind(), ErrorKind::Upload);
    assert!(!generic.message().is_empty());

    ok_page.delete();
    server.mock(|when, then| {
        when.method(POST).path("/upload.php");
        then.status(503);
    });
    let unavailable = client_a.upload_form(payload()).await.expect_err("503");
    assert_eq!(unavailable.kind(), ErrorKind::Protocol);
    Ok(())
}

#[tokio::test]
async fn api_upload_uses_authorization_and_reads_torrent_id() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/ajax.php")
            .query_param("action", "upload")
            .header("authorization", "key-123");
        then.status(200)
            .json_body(json!({"status": "success", "response": {"torrentId": 77, "groupId": 3}}));
    });

    let location = client(&server, Credential::ApiKey("key-123".to_string()))?
        .upload(payload())
        .await?;

    mock.assert();
    assert_eq!(
        location,
        format!("{}/torrents.php?torrentid=77", server.base_url())
    );
    Ok(())
}

#[tokio::test]
async fn api_upload_failures_carry_the_server_message() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mut failure = server.mock(|when, then| {
        when.method(POST).path("/ajax.php");
        then.status(200)
            .json_body(json!({"status": "failure", "error": "This torrent already exists."}));
    });
    let client = client(&server, Credential::ApiKey("key-123".to_string()))?;

    let rejected = client.upload(payload()).await.expect_err("failure status");
    assert_eq!(rejected.kind(), ErrorKind::Upload);
    assert_eq!(rejected.message(), "This torrent already exists.");

    failure.delete();
    server.mock(|when, then| {
        when.method(POST).path("/ajax.php");
        then.status(500)
            .json_body(json!({"status": "failure", "error": "Internal error"}));
    });
    let crashed = client.upload(payload()).await.expect_err("500");
    assert_eq!(crashed.kind(), ErrorKind::Upload);
    assert_eq!(crashed.message(), "Internal error");
    Ok(())
}

#[tokio::test]
async fn download_passes_keys_and_returns_bytes() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/torrents.php")
            .query_param("action", "download")
            .query_param("id", "42")
            .query_param("authkey", "ak")
            .query_param("torrent_pass", "pk");
        then.status(200).body("d4:infod4:name1:xee");
    });

    let bytes = client(&server, cookie())?
        .download_torrent(42, "ak", "pk")
        .await?;

    mock.assert();
    assert_eq!(bytes, b"d4:infod4:name1:xee");
    Ok(())
}

/// Answers one request with a 200 whose body stops short of its declared length.
async fn truncated_page_server() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut chunk = [0_u8; 4096];
        while !(request.ends_with(b"--\r\n") || request.ends_with(b"\r\n0\r\n\r\n")) {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => request.extend_from_slice(&chunk[..read]),
            }
        }
        let head = b"HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: 4096\r\n\r\n";
        let _ = stream.write_all(head).await;
        let _ = stream.write_all(br#"<div class="thin"><p style="color: red">Dupl"#).await;
        let _ = stream.shutdown().await;
    });
    Ok(format!("http://{address}"))
}

#[tokio::test]
async fn unreadable_upload_page_is_a_protocol_error() -> anyhow::Result<()> {
    let base_url = truncated_page_server().await?;

    let err = client_at(base_url, cookie())?
        .upload_form(payload())
        .await
        .expect_err("body cut short");

    assert_eq!(err.kind(), ErrorKind::Protocol);
    Ok(())
}
