//! Local fixtures shared by the unit tests.

use crate::decode::f32_to_i16_pcm;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Answers exactly one HTTP request with `status` and `body`, then closes.
pub(crate) async fn serve_once(status: u16, body: Vec<u8>) -> Url {
    serve_recording(status, body).await.0
}

/// Like [`serve_once`], also handing back the raw request bytes.
pub(crate) async fn serve_recording(status: u16, body: Vec<u8>) -> (Url, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return Vec::new();
        };

        let request = read_request(&mut socket).await;

        let reason = if (200..300).contains(&status) { "OK" } else { "Error" };
        let head = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&body).await;
        let _ = socket.shutdown().await;
        request
    });

    let url = Url::parse(&format!("http://{addr}/")).expect("base url");
    (url, handle)
}

/// Drains one request, body included, so closing the socket does not reset it.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut seen = Vec::new();
    let mut buf = [0u8; 8192];
    let mut body_start = None;
    loop {
        if let Some(start) = body_start {
            if seen.len() >= start + content_length(&seen[..start]) {
                break;
            }
        }
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        seen.extend_from_slice(&buf[..n]);
        if body_start.is_none() {
            body_start = seen
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .map(|p| p + 4);
        }
    }
    seen
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// Announces `total` body bytes, sends only `partial`, then stalls with the
/// connection open until the handle is dropped or aborted.
pub(crate) async fn serve_stalled(total: usize, partial: Vec<u8>) -> (Url, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut socket).await;
        let head = format!("HTTP/1.1 200 OK\r\ncontent-length: {total}\r\n\r\n");
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&partial).await;
        let _ = socket.flush().await;
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    });

    let url = Url::parse(&format!("http://{addr}/")).expect("base url");
    (url, handle)
}

/// A loopback url on a port with nothing listening.
pub(crate) async fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/clip.wav")).expect("url")
}

/// Interleaved 16-bit PCM wrapped in a WAV container.
pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, interleaved: &[f32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for s in f32_to_i16_pcm(interleaved) {
            writer.write_sample(s).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

pub(crate) fn sine(freq_hz: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
        })
        .collect()
}
