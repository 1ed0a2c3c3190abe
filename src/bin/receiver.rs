use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use reludp::config::ReceiverArgs;
use reludp::transport::UdpTransport;
use reludp::Error;

fn run() -> Result<(), Error> {
    let args = ReceiverArgs::parse();

    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);

    let transport = UdpTransport::bind(args.bind_addr)?;

    reludp::receiver::receive_file(&mut writer, &transport, args.client_addr)?;
    writer.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "receiver failed");
            ExitCode::FAILURE
        }
    }
}
