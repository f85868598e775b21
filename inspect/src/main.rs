use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use hylarana_opus::packet::{self, IdHeader};

#[derive(Parser, Clone, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Configure {
    /// Files that each hold exactly one container packet.
    #[arg(long, required = true)]
    pub packet: Vec<PathBuf>,
    #[arg(long, default_value = "warn")]
    pub log_level: log::Level,
}

fn main() -> Result<()> {
    let config = Configure::parse();
    simple_logger::init_with_level(config.log_level)?;
    log::info!("configure: {:?}", config);

    #[cfg(feature = "libopus")]
    println!("engine: {}", hylarana_opus::version::<hylarana_opus::Libopus>());

    for path in &config.packet {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        println!("{}: {} bytes", path.display(), bytes.len());
        describe(&bytes).with_context(|| format!("failed to inspect {}", path.display()))?;
    }

    Ok(())
}

fn describe(bytes: &[u8]) -> Result<()> {
    if packet::is_header(bytes) {
        let header = IdHeader::parse(bytes)?;
        println!("  identification header");
        println!("    version: {}", header.version);
        println!("    channels: {}", header.channels);
        println!("    pre-skip: {}", header.pre_skip);
        println!("    input sample rate: {}", header.input_sample_rate);
        println!("    output gain: {:.2} dB", header.output_gain as f32 / 256.0);
        println!("    mapping family: {}", header.mapping_family);

        if let Some(mapping) = &header.mapping {
            println!(
                "    streams: {} ({} coupled), mapping: {:?}",
                mapping.streams, mapping.coupled_streams, mapping.mapping
            );
        }
    } else if packet::is_comment_header(bytes) {
        let comments = packet::parse_comments(bytes)?;
        println!("  comment header");
        println!("    vendor: {}", comments.vendor_lossy());

        for comment in &comments.comments {
            println!("    {}", String::from_utf8_lossy(comment));
        }
    } else {
        println!("  audio packet");

        #[cfg(feature = "libopus")]
        println!(
            "    channels: {}",
            packet::channels::<hylarana_opus::Libopus>(bytes)?
        );
    }

    Ok(())
}
