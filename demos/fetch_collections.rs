//! Fetch Collections - list what an NNTSC server collects.
//!
//! This example demonstrates:
//! - Connecting with the builder pattern
//! - Sending a collection list request
//! - Draining decoded messages until the reply arrives
//!
//! # Running
//!
//! ```sh
//! cargo run --example fetch_collections -- localhost:61234
//! ```

use std::time::Duration;

use nntsc_client::{Client, DrainStop, Message, RequestKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("localhost:{}", nntsc_client::transport::DEFAULT_PORT));

    let mut client = Client::builder()
        .read_timeout(Duration::from_secs(30))
        .connect(addr.as_str())?;
    client.send_request(RequestKind::Collections, 0, 0)?;

    while client.receive()? > 0 {
        let drained = client.drain()?;
        for message in drained.messages {
            if let Message::Collections { collections } = message {
                for collection in &collections {
                    println!("{}", collection);
                }
                client.disconnect();
                return Ok(());
            }
        }
        match drained.stop {
            DrainStop::Pending => {}
            DrainStop::Disconnect(reason) => return Err(reason.into()),
            DrainStop::Failed(e) => return Err(e.into()),
        }
    }

    Err("connection closed before the collection list arrived".into())
}
