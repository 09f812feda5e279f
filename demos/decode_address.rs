use lnlink::{bech32, decode_segwit_address};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let hrp = flag_value(&args, "--hrp").unwrap_or_else(|| "bc".to_string());
    let Some(address) = args.last().filter(|_| args.len() > 1) else {
        eprintln!("usage: decode_address [--hrp bc] <address>");
        std::process::exit(2);
    };

    let raw = bech32::decode(address)?;
    println!("hrp: {} ({} checksum)", raw.hrp, raw.variant);

    let segwit = decode_segwit_address(&hrp, address)?;
    println!("witness version: {}", segwit.version);
    println!("program: {}", hex::encode(&segwit.program));
    println!("script_pubkey: {}", hex::encode(segwit.script_pubkey()));
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
}
