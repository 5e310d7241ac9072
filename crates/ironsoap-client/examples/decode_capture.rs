//! Decode a captured SOAP response body the same way a live call would.
//!
//! ```text
//! cargo run --example decode_capture -- response.bin \
//!     --content-type 'multipart/related; type="application/xop+xml"; ...' -vv
//! ```

use std::sync::{Arc, Mutex};

use clap::Parser;
use ironsoap_client::{DecodeConfig, HttpReply, HttpResponse, PendingCall, SoapValue, XmlEnvelopeDecoder};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry::Registry};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// File holding the raw HTTP response body
    path: std::path::PathBuf,

    #[arg(short, long, default_value = "text/xml; charset=utf-8")]
    content_type: String,

    #[arg(short, long, default_value_t = 200)]
    status: u16,

    /// Log the raw payload while decoding
    #[arg(long)]
    dump: bool,

    /// Verbose logging (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose_level: u8) -> anyhow::Result<()> {
    let filter_str = match verbose_level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = Registry::default().with(EnvFilter::new(filter_str)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact(),
    );

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_value(value: &SoapValue, depth: usize) {
    let indent = "  ".repeat(depth);
    if value.children.is_empty() {
        println!("{indent}{} = {:?}", value.name, value.value);
    } else {
        println!("{indent}{}:", value.name);
        for child in &value.children {
            print_value(child, depth + 1);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let body = std::fs::read(&args.path)?;
    let reply = Arc::new(Mutex::new(HttpReply::from_response(HttpResponse {
        status_code: args.status,
        headers: vec![("Content-Type".to_owned(), args.content_type.clone())],
        body,
    })));

    let config = DecodeConfig::builder().dump_payloads(args.dump).build();
    let call = PendingCall::with_decoder(&reply, Vec::new(), Arc::new(XmlEnvelopeDecoder), config);

    let message = call.return_message();
    println!(
        "message: {} (fault: {})",
        if message.name().is_empty() { "<unnamed>" } else { message.name() },
        message.is_fault()
    );
    for argument in message.arguments() {
        print_value(argument, 1);
    }

    let headers = call.return_headers();
    if !headers.is_empty() {
        println!("headers:");
        for header in &headers {
            print_value(header, 1);
        }
    }

    Ok(())
}
