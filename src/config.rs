//! CLI argument parsing and the network defaults shared by both binaries.
//!
//! Defaults mirror the reference implementation's hardcoded constants so a
//! sender and receiver invoked with no flags can still talk to each other.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

pub const SERVER_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const SERVER_PORT_TO: u16 = 5002;
pub const CLIENT_PORT: u16 = 6001;
pub const SERVER_PORT: u16 = 6002;
pub const CLIENT_PORT_TO: u16 = 5001;

#[derive(Parser, Debug)]
#[command(name = "sender", about = "Send a file over a reliable UDP channel")]
pub struct SenderArgs {
    /// Path of the file to transmit.
    pub filename: String,

    /// Address the receiver listens on for data datagrams.
    #[arg(long, default_value_t = SocketAddr::new(SERVER_IP, SERVER_PORT_TO))]
    pub server_addr: SocketAddr,

    /// Local address to bind for receiving ACKs.
    #[arg(long, default_value_t = SocketAddr::new(SERVER_IP, CLIENT_PORT))]
    pub bind_addr: SocketAddr,
}

#[derive(Parser, Debug)]
#[command(name = "receiver", about = "Receive a file over a reliable UDP channel")]
pub struct ReceiverArgs {
    /// Path the received bytes are written to.
    #[arg(long, default_value = "output.txt")]
    pub output: String,

    /// Local address to bind for receiving data datagrams.
    #[arg(long, default_value_t = SocketAddr::new(SERVER_IP, SERVER_PORT))]
    pub bind_addr: SocketAddr,

    /// Address of the sender's ACK-receiving endpoint.
    #[arg(long, default_value_t = SocketAddr::new(SERVER_IP, CLIENT_PORT_TO))]
    pub client_addr: SocketAddr,
}
