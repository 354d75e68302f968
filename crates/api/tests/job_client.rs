use std::time::Duration;

use resultgrid_api::{ApiError, JobClient};
use resultgrid_types::{CreateJobPayload, JobStatus, PriceCheckPayload};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct Canned {
    status: &'static str,
    content_type: Option<&'static str>,
    body: String,
}

fn json_reply(status: &'static str, body: Value) -> Canned {
    Canned {
        status,
        content_type: Some("application/json"),
        body: body.to_string(),
    }
}

/// Serves the canned replies in order, one connection each, and returns the
/// request line plus body of every request seen.
async fn serve(replies: Vec<Canned>) -> (String, JoinHandle<Vec<(String, String)>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let base_url = format!("http://{}", listener.local_addr().expect("listener address"));
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for reply in replies {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            seen.push(read_request(&mut socket).await);

            let mut head = format!("HTTP/1.1 {}\r\nconnection: close\r\n", reply.status);
            if let Some(content_type) = reply.content_type {
                head.push_str(&format!("content-type: {content_type}\r\n"));
            }
            if !reply.status.starts_with("204") {
                head.push_str(&format!("content-length: {}\r\n", reply.body.len()));
            }
            head.push_str("\r\n");
            head.push_str(&reply.body);
            socket.write_all(head.as_bytes()).await.expect("write reply");
            let _ = socket.shutdown().await;
        }
        seen
    });
    (base_url, handle)
}

async fn read_request(socket: &mut TcpStream) -> (String, String) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let read = socket.read(&mut chunk).await.expect("read request");
        assert!(read > 0, "client closed before sending headers");
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buffer.len() < header_end + content_length {
        let read = socket.read(&mut chunk).await.expect("read request body");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buffer[header_end..]).to_string();
    (request_line, body)
}

fn request_lines(seen: &[(String, String)]) -> Vec<&str> {
    seen.iter().map(|(line, _)| line.as_str()).collect()
}

#[tokio::test]
async fn create_job_posts_tagged_payload() {
    let (base_url, server) = serve(vec![json_reply("200 OK", json!({"id": "abc", "status": "queued"}))]).await;
    let client = JobClient::new(&base_url).unwrap();

    let payload = CreateJobPayload::PriceCheck(PriceCheckPayload {
        budget: "data/orcamento.xlsx".into(),
        sudecap: "data/sudecap.xls".into(),
        sinapi: "data/sinapi.xlsx".into(),
        tolerance: Some(0.05),
        compare_descriptions: None,
        out_dir: None,
    });
    let job = client.create_job(&payload).await.unwrap();
    assert_eq!(job.id, "abc");
    assert_eq!(job.status, JobStatus::Queued);

    let seen = server.await.unwrap();
    assert_eq!(request_lines(&seen), ["POST /jobs HTTP/1.1"]);
    let body: Value = serde_json::from_str(&seen[0].1).unwrap();
    assert_eq!(
        body,
        json!({"op": "precos_auto", "orc": "data/orcamento.xlsx", "sudecap": "data/sudecap.xls", "sinapi": "data/sinapi.xlsx", "tol_rel": 0.05})
    );
}

#[tokio::test]
async fn http_errors_surface_the_detail_field() {
    let (base_url, _server) = serve(vec![json_reply("422 Unprocessable Entity", json!({"detail": "orc ausente"}))]).await;
    let client = JobClient::new(&base_url).unwrap();

    let error = client.get_job("abc").await.unwrap_err();
    match error {
        ApiError::Http { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "orc ausente");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_content_and_non_json_bodies() {
    let (base_url, _server) = serve(vec![
        Canned {
            status: "204 No Content",
            content_type: None,
            body: String::new(),
        },
        Canned {
            status: "200 OK",
            content_type: Some("text/plain"),
            body: "ok".into(),
        },
    ])
    .await;
    let client = JobClient::new(&base_url).unwrap();

    assert_eq!(client.health().await.unwrap(), Value::Null);
    assert_eq!(client.health().await.unwrap(), Value::String("ok".into()));
}

#[tokio::test]
async fn wait_for_result_polls_until_finished() {
    let (base_url, server) = serve(vec![
        json_reply("200 OK", json!({"id": "a/b", "status": "queued"})),
        json_reply("200 OK", json!({"id": "a/b", "status": "started"})),
        json_reply("200 OK", json!({"id": "a/b", "status": "finished"})),
        json_reply("200 OK", json!({"data": {"cruzado": [{"codigo": "1"}]}})),
    ])
    .await;
    let client = JobClient::new(&base_url).unwrap();

    let mut statuses = Vec::new();
    let document = client
        .wait_for_result_with("a/b", Duration::from_millis(5), |job| statuses.push(job.status.clone()))
        .await
        .unwrap();
    assert_eq!(document["data"]["cruzado"][0]["codigo"], "1");
    assert_eq!(statuses, [JobStatus::Queued, JobStatus::Started, JobStatus::Finished]);

    let seen = server.await.unwrap();
    assert_eq!(
        request_lines(&seen),
        [
            "GET /jobs/a%2Fb HTTP/1.1",
            "GET /jobs/a%2Fb HTTP/1.1",
            "GET /jobs/a%2Fb HTTP/1.1",
            "GET /jobs/a%2Fb/result HTTP/1.1"
        ]
    );
}

#[tokio::test]
async fn wait_for_result_stops_on_failure() {
    let (base_url, _server) = serve(vec![json_reply("200 OK", json!({"id": "x", "status": "failed"}))]).await;
    let client = JobClient::new(&base_url).unwrap();

    let error = client.wait_for_result("x", Duration::from_millis(5)).await.unwrap_err();
    assert!(matches!(error, ApiError::JobFailed { ref id } if id == "x"), "got {error:?}");
}
