//! Client CLI for the streaming gateway.
//!
//! Invokes a model and decodes the framed response on the fly, printing
//! text deltas as they arrive.

use clap::Parser;
use futures_util::StreamExt;
use std::io::Write;

use stream_gateway::codec::{self, Frame, MESSAGE_CRC_LEN, PRELUDE_LEN};

#[derive(Parser)]
#[command(name = "stream-cli")]
#[command(about = "Invoke the streaming gateway and print decoded events", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Model id placed in the request path.
    #[arg(short, long, default_value = "hal.daisy-bell")]
    model: String,

    /// Request body JSON; a minimal body is sent when omitted.
    #[arg(short, long)]
    body: Option<String>,

    /// Print every decoded event instead of only text deltas.
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let body = cli.body.clone().unwrap_or_else(|| {
        serde_json::json!({
            "max_tokens": 100,
            "messages": [{ "role": "user", "content": "Hello" }],
        })
        .to_string()
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!(
            "{}/model/{}/invoke-with-response-stream",
            cli.url, cli.model
        ))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        std::process::exit(1);
    }

    let mut buffer: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
        while let Some(frame) = take_frame(&mut buffer)? {
            print_event(&frame, cli.raw)?;
        }
    }
    println!();

    if !buffer.is_empty() {
        eprintln!("Warning: {} trailing bytes did not form a frame", buffer.len());
    }
    Ok(())
}

/// Peel one complete frame off the front of the buffer, if present.
fn take_frame(buffer: &mut Vec<u8>) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    if buffer.len() < PRELUDE_LEN + MESSAGE_CRC_LEN {
        return Ok(None);
    }
    let total = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    if buffer.len() < total {
        return Ok(None);
    }
    let frame = codec::decode_frame(&buffer[..total])?;
    buffer.drain(..total);
    Ok(Some(frame))
}

fn print_event(frame: &Frame, raw: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = codec::decode_event(frame)?;
    if raw {
        println!("{text}");
        return Ok(());
    }

    let event: serde_json::Value = serde_json::from_str(&text)?;
    if event["type"] == "content_block_delta" && event["delta"]["type"] == "text_delta" {
        if let Some(delta) = event["delta"]["text"].as_str() {
            print!("{delta}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
