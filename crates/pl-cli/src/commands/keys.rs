//! Key generation and identifier encoding commands.

use anyhow::{Context, Result};
use colored::Colorize;
use pl_anchor::{base58, AnchorKeypair};
use std::path::PathBuf;

/// Handle `pl keygen`.
pub fn cmd_keygen(output: Option<PathBuf>) -> Result<()> {
    let keypair = AnchorKeypair::generate();
    let address = keypair.public_key_base58();

    if let Some(path) = output {
        keypair
            .save(&path)
            .with_context(|| format!("failed to write keypair to {}", path.display()))?;
        println!("{} Keypair written to {}", "✓".green(), path.display());
        println!("{}: {}", "Address".bold(), address);
    } else {
        let file = keypair.to_file_format();
        println!("{}", "Generated Ed25519 Keypair".bold().underline());
        println!("{}: {}", "Private Key".bold().red(), file.private_key);
        println!("{}: {}", "Public Key".bold().green(), file.public_key);
        println!("{}: {}", "Address".bold(), address);
        println!();
        println!(
            "{}",
            "WARNING: Keep the private key secret!".yellow().bold()
        );
    }

    Ok(())
}

/// Handle `pl encode`: hex bytes in, base58 text out.
pub fn cmd_encode(hex_input: &str) -> Result<()> {
    let trimmed = hex_input.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).with_context(|| format!("invalid hex input {hex_input:?}"))?;
    println!("{}", base58::encode(&bytes));
    Ok(())
}
