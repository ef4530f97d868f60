use clap::Parser as ClapParser;
use std::{fs, process};

use bytecode::disassemble;

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bytecode as hex digits (whitespace is ignored)
    #[arg(required_unless_present = "file", help = "Hex-encoded bytecode")]
    hex: Option<String>,

    /// Read raw bytecode bytes from a file instead
    #[arg(long, conflicts_with = "hex", help = "Raw bytecode file")]
    file: Option<String>,

    /// Literal pool used to resolve literal and selector operands
    #[arg(long, value_delimiter = ',', help = "Comma-separated literal pool")]
    literals: Vec<String>,
}

/// Decode hex digits, ignoring whitespace between them.
fn decode_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(digits)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let bytes = match (&cli.file, &cli.hex) {
        (Some(path), _) => match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                eprintln!("failed to read {}: {}", path, err);
                process::exit(1);
            }
        },
        (None, Some(text)) => match decode_hex(text) {
            Ok(bytes) => bytes,
            Err(err) => {
                eprintln!("bad input: {}", err);
                process::exit(2);
            }
        },
        (None, None) => {
            eprintln!("usage: disasm <hex> | --file <path>");
            process::exit(2);
        }
    };
    log::debug!("decoding {} bytes with {} literals", bytes.len(), cli.literals.len());

    match disassemble(&bytes, &cli.literals) {
        Ok(listing) => print!("{listing}"),
        Err(err) => {
            eprintln!("decode error: {}", err);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_ignores_whitespace() {
        assert_eq!(decode_hex("0600 00\n0001 14").expect("valid"), vec![6, 0, 0, 0, 1, 0x14]);
    }

    #[test]
    fn bad_hex_input_is_rejected() {
        assert_eq!(decode_hex("061"), Err(hex::FromHexError::OddLength));
        assert_eq!(
            decode_hex("0g"),
            Err(hex::FromHexError::InvalidHexCharacter { c: 'g', index: 1 })
        );
    }
}
