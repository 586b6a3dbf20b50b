//! Example: minimal rendering client.
//!
//! Usage:
//!
//! ```bash
//! # Run the server (2 screens by default)
//! cargo run -p sync-server -- -screens2 -framerate10
//!
//! # In two other terminals, run this example twice
//! cargo run --example sync_client
//! cargo run --example sync_client -- hello
//! ```
//!
//! It will:
//! - connect to 127.0.0.1:9002 (override with SYNC_CLIENT_ADDR)
//! - request a slot (`S`), then report ready (`D`) after every advance
//! - print each control line, plus any payload frame that follows
//! - if a text argument is given, broadcast it with the first frame.

use std::env;
use std::error::Error;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use sync_protocol::{decode_bytes_payload, decode_ints_payload, parse_advance_line, PayloadKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let addr = env::var("SYNC_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:9002".to_string());
    let broadcast = env::args().nth(1);

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    println!("Connected.");

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Request a slot.
    write_half.write_all(b"S\n").await?;

    if let Some(text) = broadcast {
        write_half.write_all(format!("T,{}\n", text).as_bytes()).await?;
    }

    // First readiness report kicks off frame 0 once everyone is in.
    write_half.write_all(b"D\n").await?;

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            println!("Server closed the connection.");
            break;
        }

        let Some(advance) = parse_advance_line(&line) else {
            eprintln!("Unparsable control line: {:?}", line.trim_end());
            continue;
        };

        print!("frame {}", advance.frame);
        if let Some(text) = &advance.text {
            print!("  text={:?}", text);
        }

        // A B/I prefix means exactly one payload frame follows.
        match advance.payload {
            Some(PayloadKind::Bytes) => {
                let frame = read_payload_frame(&mut reader, 1).await?;
                let data = decode_bytes_payload(&frame)?;
                print!("  bytes={:?}", &data[..]);
            }
            Some(PayloadKind::Ints) => {
                let frame = read_payload_frame(&mut reader, 4).await?;
                let ints = decode_ints_payload(&frame)?;
                print!("  ints={:?}", ints);
            }
            None => {}
        }
        println!();

        // "Render" instantly and report ready for the next frame.
        write_half.write_all(b"D\n").await?;
    }

    Ok(())
}

/// Read one payload frame (4-byte count, then `count * elem_size`
/// bytes of body) into a single buffer for the decoders.
async fn read_payload_frame<R>(reader: &mut R, elem_size: usize) -> Result<Vec<u8>, Box<dyn Error>>
where
    R: AsyncReadExt + Unpin,
{
    let mut count_buf = [0u8; 4];
    reader.read_exact(&mut count_buf).await?;
    let count = u32::from_be_bytes(count_buf) as usize;

    let mut frame = vec![0u8; 4 + count * elem_size];
    frame[..4].copy_from_slice(&count_buf);
    reader.read_exact(&mut frame[4..]).await?;
    Ok(frame)
}
