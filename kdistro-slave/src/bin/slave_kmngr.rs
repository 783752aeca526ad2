//! The Slave key manager daemon: loads an already-provisioned TPM context,
//! connects to the CAN bus and local MQTT broker, and runs the receive loop
//! until a signal requests shutdown.

use std::path::PathBuf;

use clap::Parser;
use kdistro_can::{CanIds, LtkReassembler, SocketCanTransport, StkReassembler};
use kdistro_config::Config;
use kdistro_mqtt::MqttPublisher;
use kdistro_slave::SlaveOrchestrator;
use kdistro_tpm::KeyStore;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "slave_kmngr", version, about = "The Slave Key Manager module.")]
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
            eprintln!("slave_kmngr: unable to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = setup_logging(&config.log);
    info!("Slave Key manager starting");

    let mut keystore = KeyStore::open("SLAVE_TPMCTX");
    if let Err(e) = keystore.reset_lockout() {
        error!(error = %e, "slave_kmngr: dictionary lockout reset failed, continuing");
    }

    let ext_pub_key_idx = match keystore.load_external_key(std::path::Path::new(&config.secrets.ext_pub_key), None) {
        Ok(idx) => idx,
        Err(e) => {
            error!(error = %e, "slave_kmngr: unable to load external public key");
            std::process::exit(1);
        }
    };

    let transport = match SocketCanTransport::open(&config.can.vbus) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "slave_kmngr: unable to set up CAN communications");
            std::process::exit(1);
        }
    };

    let ids = CanIds::from_base(config.can.ltk_st, config.can.stk_st);
    let ltk_reassembler = LtkReassembler::new(ids.ltk_pub, ids.ltk_sig);
    let stk_reassembler = StkReassembler::new(ids.stk);

    let mqtt = MqttPublisher::connect(
        "kdistro-slave",
        &config.mqtt.user,
        &config.mqtt.passwd,
        &config.mqtt.host,
        config.mqtt.port,
    );

    let mut orchestrator = SlaveOrchestrator::new(
        keystore,
        transport,
        ltk_reassembler,
        stk_reassembler,
        ext_pub_key_idx,
        Some(mqtt),
    );

    let stop_flag = orchestrator.stop_flag();
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM, signal_hook::consts::SIGQUIT] {
        if let Err(e) = signal_hook::flag::register(sig, stop_flag.clone()) {
            error!(error = %e, signal = sig, "slave_kmngr: failed to register signal handler");
        }
    }

    orchestrator.run_loop();
    info!("slave_kmngr: exited");
}
