//! Integration tests built from the concrete scenarios in `spec.md` §8.
//! Each drives a full [`trigemu::Module`] instance wired to in-process
//! channels and a [`runtime::testing::TestRuntime`] so the DAQ-time
//! extrapolation is controlled by virtual clock advances rather than real
//! wall-clock racing; worker polling intervals (1-10 ms) still cost a
//! little real time, which is why these tests sleep briefly between
//! clock advances.
use std::time::Duration;

use runtime::{
    testing::TestRuntime,
    Runtime,
};
use trigemu::Module;
use trigemu_messages::{
    channel::bounded,
    ConfParams,
    DaqTick,
    GeoId,
    ResumeParams,
    RunNumber,
    StartParams,
    SystemMicros,
    TimeSync,
    TriggerDecision,
    TriggerDecisionToken,
    TriggerInhibit,
    TriggerNumber,
};

type TestModule = Module<
    TestRuntime,
    trigemu_messages::channel::ChannelReceiver<TimeSync>,
    trigemu_messages::channel::ChannelReceiver<TriggerInhibit>,
    trigemu_messages::channel::ChannelReceiver<TriggerDecisionToken>,
    trigemu_messages::channel::ChannelSender<TriggerDecision>,
>;

struct Harness {
    module: TestModule,
    rt: TestRuntime,
    sync_tx: trigemu_messages::channel::ChannelSender<TimeSync>,
    inhibit_tx: trigemu_messages::channel::ChannelSender<TriggerInhibit>,
    token_tx: trigemu_messages::channel::ChannelSender<TriggerDecisionToken>,
    decision_rx: trigemu_messages::channel::ChannelReceiver<TriggerDecision>,
}

fn build_harness(with_token_endpoint: bool) -> Harness {
    let rt = TestRuntime::new();
    let (sync_tx, sync_rx) = bounded::<TimeSync>(64);
    let (inhibit_tx, inhibit_rx) = bounded::<TriggerInhibit>(64);
    let (token_tx, token_rx) = bounded::<TriggerDecisionToken>(64);
    let (decision_tx, decision_rx) = bounded::<TriggerDecision>(64);

    let module = Module::new(
        rt.clone(),
        sync_rx,
        Some(inhibit_rx),
        with_token_endpoint.then_some(token_rx),
        decision_tx,
    );

    Harness {
        module,
        rt,
        sync_tx,
        inhibit_tx,
        token_tx,
        decision_rx,
    }
}

fn base_conf() -> ConfParams {
    ConfParams {
        min_readout_window_ticks: 10,
        max_readout_window_ticks: 20,
        trigger_window_offset: 0,
        min_links_in_request: 1,
        max_links_in_request: 3,
        trigger_interval_ticks: 50_000_000,
        trigger_offset: 0,
        trigger_delay_ticks: 0,
        clock_frequency_hz: 50_000_000,
        repeat_trigger_count: 1,
        stop_burst_count: 0,
        initial_token_count: 0,
        links: vec![GeoId(1), GeoId(2), GeoId(3)],
    }
}

/// Pump the harness's virtual clock forward in small steps, giving real OS
/// threads time to observe each advance between steps.
fn pump(rt: &TestRuntime, total: Duration, step: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        rt.advance(step);
        std::thread::sleep(Duration::from_micros(300));
        elapsed += step;
    }
}

fn recv_all(rx: &trigemu_messages::channel::ChannelReceiver<TriggerDecision>) -> Vec<TriggerDecision> {
    let mut decisions = Vec::new();
    while let Ok(d) = rx.recv_timeout(Duration::from_millis(0)) {
        decisions.push(d);
    }
    decisions
}

/// Scenario 1: idle start (no time-sync yet) produces no decisions and
/// leaves the estimate invalid; the module then converges once the first
/// anchor arrives and starts emitting on the grid.
///
/// The precise wall-clock tolerance on the extrapolated estimate
/// (`spec.md` scenario 1's "within one tick interval of real time") is
/// covered by the deterministic, single-threaded unit tests in
/// `estimator.rs`, not here: `TestRuntime::sleep` does not block in real
/// time, so the scheduler's busy-poll loop can race the shared virtual
/// clock forward arbitrarily fast once other workers are running
/// concurrently, which makes a tight upper-bound timing assertion in this
/// multi-threaded harness unreliable. This test only asserts the
/// qualitative behavior: idle, then converge, then emit.
#[test]
fn idle_start_then_first_sync_converges() {
    let mut h = build_harness(false);
    h.module.configure(base_conf()).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();

    // No time-sync yet: the estimate stays invalid, so the scheduler never
    // gets past its initial wait and nothing is emitted.
    pump(&h.rt, Duration::from_millis(200), Duration::from_millis(5));
    assert_eq!(h.module.current_estimate(), DaqTick::INVALID);
    assert!(recv_all(&h.decision_rx).is_empty());

    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    // Give the estimator a moment to pick up the anchor.
    pump(&h.rt, Duration::from_millis(50), Duration::from_millis(5));
    assert!(h.module.current_estimate().is_valid());

    pump(&h.rt, Duration::from_millis(1_100), Duration::from_millis(5));
    h.module.stop().unwrap();

    let decisions = recv_all(&h.decision_rx);
    assert!(!decisions.is_empty(), "expected at least one decision after the first sync converges");
    assert_eq!(decisions[0].trigger_number, TriggerNumber(1));
}

/// Scenario 2: basic cadence.
#[test]
fn basic_cadence_produces_contiguous_grid_aligned_decisions() {
    let mut h = build_harness(false);
    h.module.configure(base_conf()).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();

    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    // clock_hz = 50_000_000 ticks/sec, interval = 50_000_000 ticks (1 Hz):
    // advancing the virtual wall clock by 3.5 seconds should cross three
    // grid points.
    pump(&h.rt, Duration::from_millis(3_500), Duration::from_millis(5));

    h.module.stop().unwrap();
    let decisions = recv_all(&h.decision_rx);

    assert!(decisions.len() >= 3, "expected at least 3 decisions, got {}", decisions.len());
    for (i, d) in decisions.iter().enumerate() {
        assert_eq!(d.trigger_number, TriggerNumber((i + 1) as u64));
        assert_eq!(d.trigger_timestamp, DaqTick(50_000_000 * (i as u64 + 1)));
    }
}

/// Scenario 3: pause/resume changes cadence without breaking trigger-number
/// contiguity.
#[test]
fn pause_then_resume_changes_cadence_and_continues_numbering() {
    let mut h = build_harness(false);
    h.module.configure(base_conf()).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();
    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(3_200), Duration::from_millis(5));
    h.module.pause().unwrap();

    let before_resume = recv_all(&h.decision_rx);
    assert!(!before_resume.is_empty());
    let last_trigger_number = before_resume.last().unwrap().trigger_number;

    // No emissions while paused.
    pump(&h.rt, Duration::from_millis(500), Duration::from_millis(5));
    assert!(recv_all(&h.decision_rx).is_empty());

    h.module
        .resume(ResumeParams {
            trigger_interval_ticks: 25_000_000,
        })
        .unwrap();

    pump(&h.rt, Duration::from_millis(1_000), Duration::from_millis(5));
    h.module.stop().unwrap();

    let after_resume = recv_all(&h.decision_rx);
    assert!(!after_resume.is_empty());
    assert_eq!(after_resume[0].trigger_number, TriggerNumber(last_trigger_number.0 + 1));
}

/// Scenario 4: credit exhaustion with a token endpoint wired.
#[test]
fn credit_exhaustion_gates_emission_until_a_token_arrives() {
    let mut h = build_harness(true);
    let mut conf = base_conf();
    conf.initial_token_count = 2;
    h.module.configure(conf).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();
    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(4_500), Duration::from_millis(5));

    let decisions = recv_all(&h.decision_rx);
    assert_eq!(decisions.len(), 2);

    h.token_tx
        .send_timeout(
            TriggerDecisionToken {
                run_number: RunNumber(1),
                trigger_number: TriggerNumber::INVALID,
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(1_500), Duration::from_millis(5));
    h.module.stop().unwrap();

    let more = recv_all(&h.decision_rx);
    assert_eq!(more.len(), 1);
    assert_eq!(more[0].trigger_number, TriggerNumber(3));
}

/// Scenario 5: the open-decisions set transitions from `{1, 2}` to `{2}`
/// when a token retiring trigger 1 arrives after a live scheduler burst.
#[test]
fn token_retirement_transitions_open_decisions_set() {
    let mut h = build_harness(true);
    let mut conf = base_conf();
    conf.initial_token_count = 2;
    h.module.configure(conf).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();
    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(4_500), Duration::from_millis(5));

    let decisions = recv_all(&h.decision_rx);
    assert_eq!(decisions.len(), 2);
    assert_eq!(h.module.open_decisions_count(), 2);

    // Pause first: retirement doesn't check the paused flag, but a fresh
    // emission off the credit this token restores would otherwise race this
    // assertion (spec.md's credit/open-decisions bookkeeping is independent
    // of pause, which only gates the scheduler's own emission loop).
    h.module.pause().unwrap();

    h.token_tx
        .send_timeout(
            TriggerDecisionToken {
                run_number: RunNumber(1),
                trigger_number: TriggerNumber(1),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(50), Duration::from_millis(5));
    assert_eq!(h.module.open_decisions_count(), 1);

    h.module.stop().unwrap();
}

/// Scenario 6: stop burst, emitted ungated while fully inhibited.
#[test]
fn stop_burst_emits_exact_count_even_while_inhibited() {
    let mut h = build_harness(false);
    let mut conf = base_conf();
    conf.trigger_interval_ticks = 5_000_000; // 10 Hz at 50 MHz clock
    conf.stop_burst_count = 3;
    h.module.configure(conf).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(1),
            trigger_interval_ticks: 5_000_000,
        })
        .unwrap();

    h.inhibit_tx
        .send_timeout(TriggerInhibit { busy: true }, Duration::from_millis(10))
        .unwrap();
    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(2_000), Duration::from_millis(5));
    // Fully inhibited: nothing should have been emitted yet.
    assert!(recv_all(&h.decision_rx).is_empty());

    h.module.stop().unwrap();
    let burst = recv_all(&h.decision_rx);

    assert_eq!(burst.len(), 3);
    assert_eq!(burst[0].trigger_number, TriggerNumber(1));
    assert_eq!(burst[1].trigger_number, TriggerNumber(2));
    assert_eq!(burst[2].trigger_number, TriggerNumber(3));
    assert!(burst.iter().all(|d| d.trigger_timestamp == burst[0].trigger_timestamp));
}

/// Window contract (P7) and link-count bounds (P8), exercised end-to-end.
#[test]
fn emitted_decisions_respect_window_and_link_count_contracts() {
    let mut h = build_harness(false);
    let conf = base_conf();
    h.module.configure(conf.clone()).unwrap();
    h.module
        .start(StartParams {
            run: RunNumber(7),
            trigger_interval_ticks: 50_000_000,
        })
        .unwrap();
    h.sync_tx
        .send_timeout(
            TimeSync {
                daq_time: DaqTick(0),
                system_time: SystemMicros(h.rt.system_time_micros()),
            },
            Duration::from_millis(10),
        )
        .unwrap();

    pump(&h.rt, Duration::from_millis(2_500), Duration::from_millis(5));
    h.module.stop().unwrap();

    let decisions = recv_all(&h.decision_rx);
    assert!(!decisions.is_empty());

    for d in &decisions {
        assert!(d.components.len() as u32 >= conf.min_links_in_request);
        assert!(d.components.len() as u32 <= conf.max_links_in_request);
        let mut seen = std::collections::HashSet::new();
        for c in &d.components {
            assert!(seen.insert(c.component), "duplicate component in one decision");
            assert_eq!(c.window_begin, DaqTick(d.trigger_timestamp.0 - conf.trigger_window_offset as u64));
            let width = c.window_end.0 - c.window_begin.0;
            assert!(width >= conf.min_readout_window_ticks && width <= conf.max_readout_window_ticks);
            assert!(conf.links.contains(&c.component));
        }
    }
}
