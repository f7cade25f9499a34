//! Integration tests for the engine against a real directory tree.

use egais_sync::{
    Block, FileStore, MockHttpClient, ReqwestClient, Stage, StageOutcome, SyncConfig, SyncEngine,
    SyncError,
};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

const OUT_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<A>
  <url replyId="42">http://utm:8080/opt/out/ReplyNATTN/1523</url>
  <url>http://utm:8080/opt/out/Ticket/1524</url>
  <url>http://utm:8080/opt/out/Ticket/1525</url>
  <ver>2</ver>
</A>"#;

const IN_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<A>
  <url>http://utm:8080/opt/in/WayBill_v3/98</url>
  <url>http://utm:8080/opt/in/WayBill_v3/99</url>
  <url>http://utm:8080/opt/in/WayBill_v3/100</url>
  <ver>2</ver>
</A>"#;

fn scripted_utm() -> MockHttpClient {
    let http = MockHttpClient::new();
    http.set_response("http://utm:8080/opt/out", OUT_LIST);
    http.set_response("http://utm:8080/opt/in", IN_LIST);
    http.set_response("http://utm:8080/opt/out/ReplyNATTN/1523", "<ReplyNATTN/>");
    http.set_response("http://utm:8080/opt/out/Ticket/1524", "<Ticket n=\"1524\"/>");
    http.set_failure("http://utm:8080/opt/out/Ticket/1525", "HTTP status 404 Not Found");
    http
}

#[test]
fn mirror_out_block_to_disk() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("egais_data");
    let http = scripted_utm();

    let config = SyncConfig::new("http://utm:8080/", &dest);
    let engine = SyncEngine::new(config, &http, FileStore::new());
    let report = engine.run();

    assert!(report.is_success());
    assert_eq!(report.skipped_count(), 1);

    let reply = fs::read(dest.join("ReplyNATTN_1523.xml")).unwrap();
    assert_eq!(reply, b"<ReplyNATTN/>");
    assert_eq!(fs::read(dest.join("42").join("ReplyNATTN_1523.xml")).unwrap(), reply);
    assert_eq!(
        fs::read(dest.join("Ticket_1524.xml")).unwrap(),
        b"<Ticket n=\"1524\"/>"
    );
    assert!(!dest.join("Ticket_1525.xml").exists());

    // Delete is off by default.
    assert!(http.deletes().is_empty());
}

#[test]
fn resync_overwrites_existing_files() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("egais_data");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("Ticket_1524.xml"), b"stale").unwrap();
    let http = scripted_utm();

    let engine = SyncEngine::new(SyncConfig::new("http://utm:8080", &dest), &http, FileStore::new());
    engine.sync_out().unwrap();

    assert_eq!(
        fs::read(dest.join("Ticket_1524.xml")).unwrap(),
        b"<Ticket n=\"1524\"/>"
    );
}

#[test]
fn full_run_syncs_then_prunes_both_blocks() {
    let dir = tempdir().unwrap();
    let http = scripted_utm();

    let config = SyncConfig::new("http://utm:8080", dir.path())
        .with_delete(true)
        .with_max_id_out(1525)
        .with_max_id_in(100);
    let engine = SyncEngine::new(config, &http, FileStore::new());
    let report = engine.run();

    assert!(report.is_success());
    let stages: Vec<Stage> = report.outcomes.iter().map(|o| o.stage()).collect();
    assert_eq!(
        stages,
        vec![Stage::SyncOut, Stage::Prune(Block::Out), Stage::Prune(Block::In)]
    );

    assert_eq!(
        http.deletes(),
        vec![
            "http://utm:8080/opt/out/ReplyNATTN/1523",
            "http://utm:8080/opt/out/Ticket/1524",
            "http://utm:8080/opt/in/WayBill_v3/98",
            "http://utm:8080/opt/in/WayBill_v3/99",
        ]
    );

    let prune_in = report
        .completed()
        .find(|r| r.stage == Stage::Prune(Block::In))
        .unwrap();
    assert_eq!(prune_in.deleted, 2);
    assert_eq!(prune_in.retained, 1);
}

#[test]
fn unwritable_destination_aborts_sync_only() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"").unwrap();
    let http = scripted_utm();

    let config = SyncConfig::new("http://utm:8080", &blocker)
        .with_delete(true)
        .with_max_id_in(99);
    let engine = SyncEngine::new(config, &http, FileStore::new());
    let report = engine.run();

    assert!(!report.is_success());
    assert!(matches!(
        report.outcomes[0],
        StageOutcome::Aborted {
            error: SyncError::Storage { .. },
            ..
        }
    ));
    assert_eq!(http.deletes(), vec!["http://utm:8080/opt/in/WayBill_v3/98"]);
    assert!(http
        .gets()
        .iter()
        .all(|url| !url.starts_with("http://utm:8080/opt/out/")));
}

/// Serves canned responses over plain HTTP/1.1, one request per connection.
fn serve(
    listener: TcpListener,
    routes: HashMap<String, String>,
    requests: usize,
) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default();
            let target = parts.next().unwrap_or_default();
            let request = format!("{method} {target}");

            let (status, body) = match routes.get(&request) {
                Some(body) => ("200 OK", body.as_str()),
                None => ("404 Not Found", ""),
            };
            log.lock().push(request);

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    });

    seen
}

#[test]
fn reqwest_client_against_loopback_server() {
    let dir = tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let mut routes = HashMap::new();
    routes.insert(
        "GET /opt/out".to_string(),
        format!("<A><url>{base}/opt/out/Ticket/5</url><url>{base}/opt/out/Ticket/6</url></A>"),
    );
    routes.insert("GET /opt/out/Ticket/5".to_string(), "<Ticket/>".to_string());
    routes.insert("DELETE /opt/out/Ticket/5".to_string(), String::new());
    let seen = serve(listener, routes, 5);

    let config = SyncConfig::new(&base, dir.path())
        .with_in_block(false)
        .with_delete(true)
        .with_max_id_out(6);
    let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
    let engine = SyncEngine::new(config, ReqwestClient::with_client(client), FileStore::new());
    let report = engine.run();

    assert!(report.is_success());
    assert_eq!(fs::read(dir.path().join("Ticket_5.xml")).unwrap(), b"<Ticket/>");
    // Ticket/6 answers 404, which skips the entry without failing the stage.
    assert!(!dir.path().join("Ticket_6.xml").exists());
    assert_eq!(report.skipped_count(), 1);

    let prune_out = report.completed().last().unwrap();
    assert_eq!(prune_out.stage, Stage::Prune(Block::Out));
    assert_eq!(prune_out.deleted, 1);
    assert_eq!(prune_out.retained, 1);

    assert_eq!(
        *seen.lock(),
        vec![
            "GET /opt/out",
            "GET /opt/out/Ticket/5",
            "GET /opt/out/Ticket/6",
            "GET /opt/out",
            "DELETE /opt/out/Ticket/5",
        ]
    );
}
