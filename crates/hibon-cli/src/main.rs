//! HiBON CLI - inspect documents, manage device keys and build signed envelopes.

use clap::{Parser, Subcommand};
use hibon::TextFormat;
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;

use commands::{dart_index, envelope, keygen, sender, sign, text, validate};

#[derive(Parser)]
#[command(name = "hibon")]
#[command(about = "HiBON document, key and envelope CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document as text
    Text {
        /// Document file (or stdin if not provided)
        input: Option<String>,
        /// Output format: json, pretty-json, base64 or hex
        #[arg(long, default_value = "pretty-json")]
        format: TextFormat,
    },
    /// Check that a document is canonical
    Validate {
        /// Document file (or stdin if not provided)
        input: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the DART index of a document
    DartIndex {
        /// Document file (or stdin if not provided)
        input: Option<String>,
        /// Print hex instead of base64url
        #[arg(long)]
        hex: bool,
    },
    /// Derive a key and write its PIN-locked device document
    Keygen {
        /// Passphrase the key is derived from
        #[arg(long)]
        passphrase: String,
        /// Salt for the passphrase
        #[arg(long, default_value = "")]
        salt: String,
        /// PIN that locks the device document
        #[arg(long)]
        pin: String,
        /// Where to write the device document
        #[arg(long)]
        out: String,
    },
    /// Sign a file with a device key
    Sign {
        /// Device document written by keygen
        #[arg(long)]
        device: String,
        /// PIN of the device document
        #[arg(long)]
        pin: String,
        /// File to sign (or stdin if not provided)
        input: Option<String>,
    },
    /// Build a request envelope, signed when a device is given
    Sender {
        /// Method name
        #[arg(long)]
        method: String,
        /// Params document (default: empty document)
        #[arg(long)]
        params: Option<String>,
        /// Device document to sign with
        #[arg(long, requires = "pin")]
        device: Option<String>,
        /// PIN of the device document
        #[arg(long)]
        pin: Option<String>,
        /// Key deriver as hex (default: sign with the device key itself)
        #[arg(long, default_value = "")]
        deriver: String,
        /// Where to write the envelope
        #[arg(long)]
        out: String,
    },
    /// Show and verify a request envelope
    Envelope {
        /// Envelope file (or stdin if not provided)
        input: Option<String>,
        /// Exit with error code if the signature does not verify
        #[arg(long)]
        strict: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HIBON_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Warning: logging disabled: {}", e);
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text { input, format } => text::run(input, format),
        Commands::Validate { input, json } => validate::run(input, json),
        Commands::DartIndex { input, hex } => dart_index::run(input, hex),
        Commands::Keygen {
            passphrase,
            salt,
            pin,
            out,
        } => keygen::run(passphrase, salt, pin, out),
        Commands::Sign { device, pin, input } => sign::run(device, pin, input),
        Commands::Sender {
            method,
            params,
            device,
            pin,
            deriver,
            out,
        } => sender::run(method, params, device, pin, deriver, out),
        Commands::Envelope { input, strict } => envelope::run(input, strict),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
