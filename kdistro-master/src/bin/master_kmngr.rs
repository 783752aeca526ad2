//! The Master key manager daemon: provisions nothing itself (see
//! `master_prov`), loads an already-provisioned TPM context, and runs the
//! LTK/STK rotation loop until a signal requests shutdown.

use std::path::PathBuf;

use clap::Parser;
use kdistro_can::{CanIds, SocketCanTransport};
use kdistro_config::Config;
use kdistro_master::MasterOrchestrator;
use kdistro_tpm::KeyStore;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "master_kmngr", version, about = "The Master Key Manager module.")]
struct Args {
    /// The path and name of the configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

fn setup_logging(log: &kdistro_config::LogConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(
        PathBuf::from(&log.filename).parent().unwrap_or_else(|| std::path::Path::new(".")),
        PathBuf::from(&log.filename).file_name().unwrap_or_default(),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_new(&log.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking.and(std::io::stdout))
        .init();

    guard
}

fn main() {
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("master_kmngr: unable to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = setup_logging(&config.log);
    info!("Master Key manager starting");

    let mut keystore = KeyStore::open("MASTER_TPMCTX");
    if let Err(e) = keystore.reset_lockout() {
        error!(error = %e, "master_kmngr: dictionary lockout reset failed, continuing");
    }

    let ext_pub_key_idx = match keystore.load_external_key(std::path::Path::new(&config.secrets.ext_pub_key), None) {
        Ok(idx) => idx,
        Err(e) => {
            error!(error = %e, "master_kmngr: unable to load external public key");
            std::process::exit(1);
        }
    };

    let transport = match SocketCanTransport::open(&config.can.vbus) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "master_kmngr: unable to set up CAN communications");
            std::process::exit(1);
        }
    };

    let ids = CanIds::from_base(config.can.ltk_st, config.can.stk_st);
    let ltk_size_bytes = (config.secrets.ltk_size_bits / 8) as usize;

    let mut orchestrator = MasterOrchestrator::new(
        keystore,
        transport,
        ids,
        ext_pub_key_idx,
        ltk_size_bytes,
        config.timers.ltk_cycle,
        config.timers.stk_cycle,
    );

    let stop_flag = orchestrator.stop_flag();
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM, signal_hook::consts::SIGQUIT] {
        if let Err(e) = signal_hook::flag::register(sig, stop_flag.clone()) {
            error!(error = %e, signal = sig, "master_kmngr: failed to register signal handler");
        }
    }

    orchestrator.run_loop();
    info!("master_kmngr: exited");
}
