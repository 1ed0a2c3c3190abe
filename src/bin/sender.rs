use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use reludp::config::SenderArgs;
use reludp::transport::UdpTransport;
use reludp::Error;

fn run() -> Result<(), Error> {
    let args = SenderArgs::parse();

    let file = File::open(&args.filename)
        .map_err(|e| Error::UsageError(format!("cannot open {}: {}", args.filename, e)))?;
    let reader = BufReader::new(file);

    let transport = UdpTransport::bind(args.bind_addr)?;

    reludp::sender::send_file(reader, &transport, args.server_addr)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "sender failed");
            ExitCode::FAILURE
        }
    }
}
