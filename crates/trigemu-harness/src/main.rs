//! Demo CLI harness: wires a [`trigemu::Module`] to in-process channels,
//! loads a JSON configuration document, drives the lifecycle end-to-end for
//! a fixed duration, and prints the info surface before exiting. Grounded
//! in `examples/get-convex-convex-backend/crates/local_backend/src/main.rs`'s
//! `clap::Parser` + `cmd_util::env::config_service` startup pattern, adapted
//! from an async tokio server to this module's synchronous thread model.
use std::{
    fs,
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use cmd_util::env::config_service;
use runtime::{
    prod::ProdRuntime,
    Runtime,
};
use trigemu::Module;
use trigemu_messages::{
    channel::bounded,
    ConfParams,
    DaqTick,
    ResumeParams,
    RunNumber,
    StartParams,
    SystemMicros,
    TimeSync,
    TriggerDecision,
    TriggerDecisionToken,
    TriggerInhibit,
};

#[derive(Parser, Debug)]
#[command(name = "trigemu-harness", about = "Standalone trigger-decision emulator demo harness")]
struct Args {
    /// Path to a JSON document with the `ConfParams` fields (`spec.md` §6).
    #[arg(long)]
    config: PathBuf,

    /// Run number to start with.
    #[arg(long, default_value_t = 1)]
    run: u64,

    /// How long to run before issuing `stop`, in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    duration_ms: u64,

    /// If set, pause for this many milliseconds partway through the run,
    /// then resume at the same cadence.
    #[arg(long)]
    pause_for_ms: Option<u64>,
}

type HarnessModule = Module<
    ProdRuntime,
    trigemu_messages::channel::ChannelReceiver<TimeSync>,
    trigemu_messages::channel::ChannelReceiver<TriggerInhibit>,
    trigemu_messages::channel::ChannelReceiver<TriggerDecisionToken>,
    trigemu_messages::channel::ChannelSender<TriggerDecision>,
>;

fn main() -> anyhow::Result<()> {
    let _guard = config_service();
    let args = Args::parse();
    tracing::info!(?args, "starting trigemu-harness");

    let conf_json = fs::read_to_string(&args.config)?;
    let conf: ConfParams = serde_json::from_str(&conf_json)?;

    let (sync_tx, sync_rx) = bounded::<TimeSync>(256);
    let (_inhibit_tx, inhibit_rx) = bounded::<TriggerInhibit>(256);
    let (_token_tx, token_rx) = bounded::<TriggerDecisionToken>(256);
    let (decision_tx, decision_rx) = bounded::<TriggerDecision>(256);

    let rt = ProdRuntime::new();
    let mut module: HarnessModule = Module::new(rt.clone(), sync_rx, Some(inhibit_rx), Some(token_rx), decision_tx);

    let trigger_interval_ticks = conf.trigger_interval_ticks;
    module.configure(conf)?;
    module.start(StartParams {
        run: RunNumber(args.run),
        trigger_interval_ticks,
    })?;

    // Feed a single synchronization anchor at the current wall clock so the
    // estimator has something to extrapolate from.
    sync_tx.send_timeout(
        TimeSync {
            daq_time: DaqTick(0),
            system_time: SystemMicros(rt.system_time_micros()),
        },
        Duration::from_millis(10),
    )?;

    let sink = std::thread::spawn(move || {
        let mut count = 0u64;
        while let Ok(_decision) = decision_rx.recv_timeout(Duration::from_secs(1)) {
            count += 1;
        }
        count
    });

    if let Some(pause_ms) = args.pause_for_ms {
        std::thread::sleep(Duration::from_millis(args.duration_ms / 2));
        module.pause()?;
        tracing::info!("paused");
        std::thread::sleep(Duration::from_millis(pause_ms));
        module.resume(ResumeParams {
            trigger_interval_ticks,
        })?;
        tracing::info!("resumed");
        std::thread::sleep(Duration::from_millis(args.duration_ms / 2));
    } else {
        std::thread::sleep(Duration::from_millis(args.duration_ms));
    }

    module.stop()?;
    let info = module.info();
    tracing::info!(?info, "final info snapshot");

    drop(module);
    let emitted = sink.join().expect("sink thread panicked");
    tracing::info!(emitted, "sink observed decisions");

    Ok(())
}
