use std::sync::mpsc::{self, Receiver};
use std::thread;

use tiny_http::{Response, Server};

/// What the local server saw of the single request it answered.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub url: String,
    pub authorization: Option<String>,
}

/// Serves one canned response on a loopback port and returns its base URL.
pub fn serve_once(status: u16, body: Vec<u8>) -> (String, Receiver<SeenRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            let _ = tx.send(SeenRequest {
                url: request.url().to_string(),
                authorization,
            });
            let _ = request.respond(Response::from_data(body).with_status_code(status));
        }
    });
    (format!("http://{addr}"), rx)
}

/// An address nothing listens on.
pub fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn http_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
