//! The Master provisioning tool, grounded in `master_prov.py`: creates the
//! endorsement primary and asymmetric key pair, then loads any number of
//! external (peer) public keys into the context directory.

use std::path::PathBuf;

use clap::Parser;
use kdistro_tpm::KeyStore;

#[derive(Parser)]
#[command(name = "master_prov", version, about = "The Master provisioning software.")]
struct Args {
    /// External key file list.
    #[arg(short = 'e', num_args = 1.., value_name = "KEY_FILE")]
    ext_keys: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut keystore = KeyStore::open("MASTER_TPMCTX");
    if let Err(e) = keystore.provision() {
        eprintln!("master_prov: provisioning failed: {e}");
        std::process::exit(1);
    }
    println!("master_prov: provisioning completed!");

    for key_file in &args.ext_keys {
        match keystore.load_external_key(key_file, None) {
            Ok(ordinal) => println!("master_prov: loaded external key {} as ordinal {}", key_file.display(), ordinal.get()),
            Err(e) => eprintln!("master_prov: failed to load {}: {e}", key_file.display()),
        }
    }
}
