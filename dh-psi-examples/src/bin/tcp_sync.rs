//! TCP-based PSI protocol example.
//!
//! Each process runs one [`Party`] and talks to the other through a
//! [`Channel`] implemented over a TCP stream. Messages are framed as one
//! JSON document per line, masked values hex-encoded.
//!
//! Run server:
//! ```bash
//! cargo run --bin tcp_sync -- server
//! ```
//!
//! Run client (in another terminal):
//! ```bash
//! cargo run --bin tcp_sync -- client
//! ```

use clap::{Parser, Subcommand};
use dh_psi::{
    BlindedMessage, BlindedPair, Channel, DoubleBlindedMessage, DoubleBlindedPair, ElementRef,
    GroupParameters, IntersectionResult, Message, Party, PsiError,
};
use log::debug;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

/// Wire format for a (reference, masked value) pair.
#[derive(Debug, Serialize, Deserialize)]
struct WirePair {
    reference: usize,
    /// Big-endian hex encoding of the masked value
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireMessage {
    Blinded { items: Vec<WirePair> },
    DoubleBlinded { items: Vec<WirePair> },
}

fn encode_pair(reference: ElementRef, value: &BigUint) -> WirePair {
    WirePair {
        reference: reference.index(),
        value: hex::encode(value.to_bytes_be()),
    }
}

fn decode_pair(pair: &WirePair) -> dh_psi::Result<(ElementRef, BigUint)> {
    let bytes = hex::decode(&pair.value)
        .map_err(|e| PsiError::Transport(format!("bad masked value: {}", e)))?;
    Ok((ElementRef::new(pair.reference), BigUint::from_bytes_be(&bytes)))
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        match message {
            Message::Blinded(m) => WireMessage::Blinded {
                items: m
                    .items
                    .iter()
                    .map(|p| encode_pair(p.reference, &p.value))
                    .collect(),
            },
            Message::DoubleBlinded(m) => WireMessage::DoubleBlinded {
                items: m
                    .items
                    .iter()
                    .map(|p| encode_pair(p.reference, &p.value))
                    .collect(),
            },
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = PsiError;

    fn try_from(wire: WireMessage) -> dh_psi::Result<Self> {
        Ok(match wire {
            WireMessage::Blinded { items } => Message::Blinded(BlindedMessage::new(
                items
                    .iter()
                    .map(|p| {
                        decode_pair(p).map(|(reference, value)| BlindedPair { reference, value })
                    })
                    .collect::<dh_psi::Result<_>>()?,
            )),
            WireMessage::DoubleBlinded { items } => {
                Message::DoubleBlinded(DoubleBlindedMessage::new(
                    items
                        .iter()
                        .map(|p| {
                            decode_pair(p)
                                .map(|(reference, value)| DoubleBlindedPair { reference, value })
                        })
                        .collect::<dh_psi::Result<_>>()?,
                ))
            }
        })
    }
}

/// A [`Channel`] over a TCP stream, one JSON message per line.
struct TcpChannel {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpChannel {
    fn new(stream: TcpStream) -> std::io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        })
    }
}

impl Channel<Message> for TcpChannel {
    fn send(&mut self, message: Message) -> dh_psi::Result<()> {
        let mut line = serde_json::to_string(&WireMessage::from(&message))
            .map_err(|e| PsiError::Transport(e.to_string()))?;
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| PsiError::Transport(e.to_string()))?;
        debug!("sent {} bytes", line.len());
        Ok(())
    }

    fn receive(&mut self) -> dh_psi::Result<Message> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| PsiError::Transport(e.to_string()))?;
        if read == 0 {
            return Err(PsiError::ExchangeIncomplete(
                "peer closed the connection before sending".to_string(),
            ));
        }
        debug!("received {} bytes", read);
        let wire: WireMessage =
            serde_json::from_str(&line).map_err(|e| PsiError::Transport(e.to_string()))?;
        Message::try_from(wire)
    }
}

/// Run one side of the protocol. The side that speaks first sends before it
/// receives in each round; the other side does the opposite.
fn run_party<C: Channel<Message>>(
    party: &Party,
    channel: &mut C,
    speaks_first: bool,
) -> dh_psi::Result<IntersectionResult> {
    println!("\n--- First round: blind and exchange ---");
    let blinded = Message::Blinded(party.blind());
    let peer_blinded = if speaks_first {
        channel.send(blinded)?;
        channel.receive()?
    } else {
        let received = channel.receive()?;
        channel.send(blinded)?;
        received
    }
    .into_blinded()?;
    println!("Received {} blinded values", peer_blinded.len());

    println!("\n--- Second round: reblind and return ---");
    let peer_double = party.reblind(&peer_blinded);
    let returned = Message::DoubleBlinded(peer_double.clone());
    let own_double = if speaks_first {
        channel.send(returned)?;
        channel.receive()?
    } else {
        let received = channel.receive()?;
        channel.send(returned)?;
        received
    }
    .into_double_blinded()?;
    println!("Received {} double-blinded values", own_double.len());

    println!("\n--- Intersection ---");
    party.intersect(&own_double, &peer_double)
}

fn print_items(label: &str, party: &Party) {
    println!("\n{}'s items ({}):", label, party.len());
    for (i, item) in party.elements().enumerate() {
        println!("  {}: {}", i + 1, item);
    }
}

fn print_result(label: &str, result: &IntersectionResult) {
    println!("\n=== Results ===");
    println!("{} intersection size: {}", label, result.len());
    for (i, item) in result.iter().enumerate() {
        println!("  {}: {}", i + 1, item);
    }
}

/// Run the server (Bob)
fn run_server(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PSI TCP Server ===");
    println!("Listening on {}", address);

    let listener = TcpListener::bind(address)?;
    println!("Waiting for client connection...");
    let (stream, addr) = listener.accept()?;
    println!("Connected to {}", addr);

    let bob = Party::new(
        "Bob",
        &GroupParameters::reference(),
        [
            "bob_secret_1",
            "shared_item_1",
            "bob_secret_2",
            "shared_item_2",
            "bob_secret_3",
        ],
        &mut OsRng,
    )?;
    print_items("Server", &bob);

    let mut channel = TcpChannel::new(stream)?;
    let result = run_party(&bob, &mut channel, false)?;
    print_result("Server", &result);

    println!("\n✓ Server protocol completed!");
    Ok(())
}

/// Run the client (Alice)
fn run_client(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PSI TCP Client ===");
    println!("Connecting to {}", address);

    let stream = TcpStream::connect(address)?;
    println!("Connected to server");

    let alice = Party::new(
        "Alice",
        &GroupParameters::reference(),
        [
            "alice_secret_1",
            "shared_item_1",
            "alice_secret_2",
            "shared_item_2",
            "alice_secret_3",
        ],
        &mut OsRng,
    )?;
    print_items("Client", &alice);

    let mut channel = TcpChannel::new(stream)?;
    let result = run_party(&alice, &mut channel, true)?;
    print_result("Client", &result);

    println!("\n✓ Client protocol completed!");
    Ok(())
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Listen and wait for a client
    Server,
    /// Connect to a listening server
    Client,
}

#[derive(Parser, Debug)]
#[command(about = "Run DH-based PSI between two processes over TCP")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    #[arg(long, default_value = "127.0.0.1:7878")]
    address: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    match args.mode {
        Mode::Server => run_server(&args.address),
        Mode::Client => run_client(&args.address),
    }
}
