// Integration tests for the leveled logger and its sinks
use simple_pipelines::logging::{FileSink, RocketChatSink, Sink};
use simple_pipelines::{LogLevel, Logger, LoggerConfig, SinkConfig, SinkError};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_logger_levels() {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let sink_logs = Arc::clone(&logs);
    let logger = Logger::from_fn(move |line| sink_logs.lock().unwrap().push(line.to_string()))
        .with_levels([LogLevel::Info, LogLevel::Error]);

    logger.info("This is an info log");
    logger.success("This should not be logged");
    logger.error("This is an error log");

    let logs = logs.lock().unwrap();
    assert_eq!(logs.len(), 2, "Logger should only log INFO and ERROR messages");
    assert!(logs.contains(&"[INFO] This is an info log".to_string()));
    assert!(logs.contains(&"[ERROR] This is an error log".to_string()));
}

#[test]
fn test_fields_are_joined() {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let sink_logs = Arc::clone(&logs);
    let logger = Logger::from_fn(move |line| sink_logs.lock().unwrap().push(line.to_string()));

    logger.log(LogLevel::Success, "Loaded", &[("rows", &3), ("table", &"orders")]);

    assert_eq!(
        logs.lock().unwrap().as_slice(),
        ["[SUCCESS] Loaded rows: 3 | table: orders".to_string()]
    );
}

#[test]
fn test_file_logger_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs/pipeline.log");

    let logger = Logger::file(&path).unwrap().with_levels([LogLevel::Warning]);
    logger.warning("first");
    logger.info("filtered out");
    logger.warning("second");

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "[WARNING] first\n[WARNING] second\n");
}

#[test]
fn test_logger_from_file_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/run.log");
    let config = LoggerConfig {
        sink: SinkConfig::File { path: path.clone() },
        levels: vec![LogLevel::Error],
    };

    let logger = Logger::from_config(&config).unwrap();
    logger.info("ignored");
    logger.error("kept");

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[ERROR] kept\n");
}

/// Accept one HTTP request, answer with `status_line`, return the raw request
fn serve_once(status_line: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response =
            format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).unwrap();
        request
    });

    (format!("http://{addr}"), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let body_len = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn local_sink(url: &str) -> RocketChatSink {
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    RocketChatSink::with_client(url, "user-1", "secret-token", "GENERAL", client)
}

#[test]
fn test_rocket_chat_posts_message() {
    let (url, server) = serve_once("HTTP/1.1 200 OK");
    let sink = local_sink(&url);

    sink.publish("[INFO] hello").unwrap();

    let request = server.join().unwrap();
    let lowered = request.to_lowercase();
    assert!(request.starts_with("POST /api/v1/chat.postMessage HTTP/1.1"));
    assert!(lowered.contains("x-auth-token: secret-token"));
    assert!(lowered.contains("x-user-id: user-1"));
    assert!(request.contains("roomId=GENERAL"));
    assert!(request.contains("text=%5BINFO%5D+hello"));
}

#[test]
fn test_rocket_chat_non_ok_status_is_error() {
    let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error");
    let sink = local_sink(&url);

    let err = sink.publish("[ERROR] boom").unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, SinkError::Status { status: 500 }));
}

#[test]
fn test_logger_swallows_webhook_failure() {
    let (url, server) = serve_once("HTTP/1.1 401 Unauthorized");
    let logger = Logger::with_sink(local_sink(&url));

    // must not panic or propagate
    logger.error("unauthorized");
    server.join().unwrap();
}

#[test]
fn test_file_sink_is_shareable_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.log");
    let logger = Logger::with_sink(FileSink::new(&path).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let logger = logger.clone();
            thread::spawn(move || logger.info(&format!("worker {i}")))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 4);
}
