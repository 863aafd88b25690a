//! Minimal HTTP responder for tests: one canned answer per connection.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

pub(crate) struct MockHttp {
    port: u16,
    handle: JoinHandle<Vec<String>>,
}

impl MockHttp {
    /// Serves `responses` in order, each on its own connection, then exits.
    pub(crate) fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    break;
                };
                let mut reader = BufReader::new(stream);

                let mut head = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                    head.push_str(&line);
                }
                let mut payload = vec![0u8; content_length];
                let _ = reader.read_exact(&mut payload);
                head.push_str(&String::from_utf8_lossy(&payload));
                requests.push(head);

                let mut stream = reader.into_inner();
                let response = format!(
                    "HTTP/1.1 {} MOCK\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        Self { port, handle }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}/{}", self.port, path)
    }

    /// Waits until every canned response was served; returns the raw requests.
    pub(crate) fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}
