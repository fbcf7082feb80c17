/*  Terminal front-end for the receiving side: waits for one incoming
    transfer and writes it into the save directory.
 */

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use gbn_transfer::{receive_file, session, CancelToken, Logger, ReceiverConfig};

/// Command line arguments parser for this application.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = session::DEFAULT_PORT)]
    port: u16,

    /// Directory to save the incoming file in
    #[arg(short, long, default_value = ".")]
    save_dir: PathBuf,

    /// Print protocol events to stdout
    #[arg(short, long)]
    log: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("Listening on port {}", args.port);

    let config = ReceiverConfig {
        port: args.port,
        save_dir: args.save_dir,
        ..ReceiverConfig::default()
    };
    let logger = if args.log {
        Logger::stdout()
    } else {
        Logger::disabled()
    };

    let saved = receive_file(&config, &logger, &CancelToken::new())?;

    println!("File saved as {}", saved.display());
    Ok(())
}
