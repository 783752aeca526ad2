//! The Slave provisioning tool, grounded in `slave_prov.py`.

use std::path::PathBuf;

use clap::Parser;
use kdistro_tpm::KeyStore;

#[derive(Parser)]
#[command(name = "slave_prov", version, about = "The Slave provisioning software.")]
struct Args {
    /// External key file list.
    #[arg(short = 'e', num_args = 1.., value_name = "KEY_FILE")]
    ext_keys: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut keystore = KeyStore::open("SLAVE_TPMCTX");
    if let Err(e) = keystore.provision() {
        eprintln!("slave_prov: provisioning failed: {e}");
        std::process::exit(1);
    }
    println!("slave_prov: provisioning completed!");

    for key_file in &args.ext_keys {
        match keystore.load_external_key(key_file, None) {
            Ok(ordinal) => println!("slave_prov: loaded external key {} as ordinal {}", key_file.display(), ordinal.get()),
            Err(e) => eprintln!("slave_prov: failed to load {}: {e}", key_file.display()),
        }
    }
}
