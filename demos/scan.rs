//! Classify a scanned string the way a wallet's QR handler would.

use lnlink::{
    lnurl::{decode_lnurl, lightning_address_url, parse_lightning_address},
    parse_invoice_string, InvoiceScan, LnLink,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let input = match flag_value(&args, "--input") {
        Some(input) => input,
        None => {
            eprintln!("usage: scan --input <invoice|offer|lnurl|address|lnlink>");
            std::process::exit(2);
        }
    };

    if let Ok(link) = LnLink::parse(&input) {
        println!("pairing link for {} at {}", link.node_id, link.host);
        return Ok(());
    }

    match parse_invoice_string(&input)? {
        InvoiceScan::Offer => println!("bolt12 offer (decode on the node for details)"),
        InvoiceScan::Invoice(amount) => println!("invoice, amount: {amount:?}"),
        InvoiceScan::NotInvoice => {
            if let Some((name, host)) = parse_lightning_address(&input) {
                println!("lightning address -> {}", lightning_address_url(name, host)?);
            } else {
                println!("lnurl -> {}", decode_lnurl(&input)?);
            }
        }
    }
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
}
