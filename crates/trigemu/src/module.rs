//! The lifecycle controller (`spec.md` §6): coordinates
//! `configure → start → {pause ⇄ resume} → stop` / `scrap`, owning the
//! shared state and worker threads for one run.
use std::sync::Arc;

use runtime::Runtime;
use trigemu_messages::{
    channel::{
        EndpointReceiver,
        EndpointSender,
    },
    config::validate_trigger_interval,
    ClockHz,
    ConfParams,
    DaqTick,
    ResumeParams,
    StartParams,
    TimeSync,
    TriggerDecision,
    TriggerDecisionToken,
    TriggerInhibit,
    TriggerType,
};

use crate::{
    estimator,
    inhibit,
    scheduler::{
        self,
        SchedulerConfig,
    },
    state::{
        InfoSnapshot,
        SharedState,
    },
    tokens,
};

/// The module, generic over its runtime and the four endpoint types it was
/// wired up with at construction (`spec.md` §6 "Endpoints (bound at init
/// time)"). `InhibitRx`/`TokenRx` are optional endpoints: `None` means "not
/// wired", matching §4.2/§4.3's "present only if ... wired".
pub struct Module<R, SyncRx, InhibitRx, TokenRx, DecisionTx>
where
    R: Runtime,
    SyncRx: EndpointReceiver<TimeSync> + Clone + Send + Sync + 'static,
    InhibitRx: EndpointReceiver<TriggerInhibit> + Clone + Send + Sync + 'static,
    TokenRx: EndpointReceiver<TriggerDecisionToken> + Clone + Send + Sync + 'static,
    DecisionTx: EndpointSender<TriggerDecision> + Clone + Send + Sync + 'static,
{
    rt: R,
    time_sync_rx: SyncRx,
    inhibit_rx: Option<InhibitRx>,
    token_rx: Option<TokenRx>,
    decision_tx: DecisionTx,

    conf: Option<ConfParams>,
    configured: bool,

    workers: Option<Vec<R::JoinHandle>>,
    run_state: Option<Arc<SharedState>>,
}

impl<R, SyncRx, InhibitRx, TokenRx, DecisionTx> Module<R, SyncRx, InhibitRx, TokenRx, DecisionTx>
where
    R: Runtime,
    SyncRx: EndpointReceiver<TimeSync> + Clone + Send + Sync + 'static,
    InhibitRx: EndpointReceiver<TriggerInhibit> + Clone + Send + Sync + 'static,
    TokenRx: EndpointReceiver<TriggerDecisionToken> + Clone + Send + Sync + 'static,
    DecisionTx: EndpointSender<TriggerDecision> + Clone + Send + Sync + 'static,
{
    pub fn new(
        rt: R,
        time_sync_rx: SyncRx,
        inhibit_rx: Option<InhibitRx>,
        token_rx: Option<TokenRx>,
        decision_tx: DecisionTx,
    ) -> Self {
        Self {
            rt,
            time_sync_rx,
            inhibit_rx,
            token_rx,
            decision_tx,
            conf: None,
            configured: false,
            workers: None,
            run_state: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.workers.is_some()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// `configure`: not running. Parses and validates `ConfParams`, stores
    /// it, marks the module configured.
    pub fn configure(&mut self, conf: ConfParams) -> Result<(), errors::TrigemuFault> {
        if self.is_running() {
            return Err(errors::TrigemuFault::invalid_transition("configure", "running"));
        }
        conf.validate()?;
        self.conf = Some(conf);
        self.configured = true;
        Ok(())
    }

    /// `start`: configured, not running. Re-validates configuration and the
    /// requested interval, resets all counters and the open-decisions set
    /// (by constructing a fresh [`SharedState`]), and spawns the four
    /// workers.
    pub fn start(&mut self, params: StartParams) -> Result<(), errors::TrigemuFault> {
        if self.is_running() {
            return Err(errors::TrigemuFault::invalid_transition("start", "running"));
        }
        let Some(conf) = self.conf.clone() else {
            return Err(errors::TrigemuFault::invalid_transition("start", "not configured"));
        };
        conf.validate()?;
        validate_trigger_interval(params.trigger_interval_ticks)?;

        let has_token_endpoint = self.token_rx.is_some();
        let initial_credit = if has_token_endpoint { conf.initial_token_count } else { 0 };

        let state = Arc::new(SharedState::new(params.run, params.trigger_interval_ticks, initial_credit));

        let clock_hz = ClockHz::new(conf.clock_frequency_hz)
            .ok_or_else(|| errors::TrigemuFault::configuration("clock_frequency_hz must be > 0"))?;

        let scheduler_config = SchedulerConfig {
            run_number: params.run,
            trigger_offset: conf.trigger_offset,
            trigger_delay_ticks: conf.trigger_delay_ticks,
            trigger_window_offset: conf.trigger_window_offset,
            min_readout_window_ticks: conf.min_readout_window_ticks,
            max_readout_window_ticks: conf.max_readout_window_ticks,
            min_links_in_request: conf.min_links_in_request,
            max_links_in_request: conf.max_links_in_request,
            links: conf.links.clone(),
            trigger_type: TriggerType::default(),
            repeat_count: conf.repeat_trigger_count.max(1),
            stop_burst_count: conf.stop_burst_count,
            has_token_endpoint,
        };

        let mut workers: Vec<R::JoinHandle> = Vec::with_capacity(4);

        {
            let state = state.clone();
            let rt = self.rt.clone();
            let rx = self.time_sync_rx.clone();
            workers.push(self.rt.spawn_thread("trigemu-estimator", move || {
                estimator::run(&state, &rt, clock_hz, &rx);
            }));
        }

        if let Some(inhibit_rx) = &self.inhibit_rx {
            let state = state.clone();
            let rt = self.rt.clone();
            let rx = inhibit_rx.clone();
            workers.push(self.rt.spawn_thread("trigemu-inhibit", move || {
                inhibit::run(&state, &rt, &rx);
            }));
        }

        if let Some(token_rx) = &self.token_rx {
            let state = state.clone();
            let rt = self.rt.clone();
            let rx = token_rx.clone();
            workers.push(self.rt.spawn_thread("trigemu-tokens", move || {
                tokens::run(&state, &rt, &rx);
            }));
        }

        {
            let state = state.clone();
            let rt = self.rt.clone();
            let tx = self.decision_tx.clone();
            workers.push(self.rt.spawn_thread("trigemu-scheduler", move || {
                scheduler::run(&state, &rt, &scheduler_config, &tx);
            }));
        }

        self.run_state = Some(state);
        self.workers = Some(workers);
        Ok(())
    }

    /// `stop`: running. Clears `running`, which causes every worker to exit
    /// within one sleep interval and the scheduler to perform its end-of-run
    /// burst before returning; then joins all of them.
    pub fn stop(&mut self) -> Result<(), errors::TrigemuFault> {
        let Some(state) = &self.run_state else {
            return Err(errors::TrigemuFault::invalid_transition("stop", "not running"));
        };
        let Some(workers) = self.workers.take() else {
            return Err(errors::TrigemuFault::invalid_transition("stop", "not running"));
        };
        state.stop();
        for worker in workers {
            worker.join();
        }
        Ok(())
    }

    /// `pause`: running.
    pub fn pause(&mut self) -> Result<(), errors::TrigemuFault> {
        let Some(state) = &self.run_state else {
            return Err(errors::TrigemuFault::invalid_transition("pause", "not running"));
        };
        if !self.is_running() {
            return Err(errors::TrigemuFault::invalid_transition("pause", "not running"));
        }
        state.set_paused(true);
        Ok(())
    }

    /// `resume`: running, paused. Re-validates and applies the new
    /// cadence, then clears `paused`.
    pub fn resume(&mut self, params: ResumeParams) -> Result<(), errors::TrigemuFault> {
        let Some(state) = &self.run_state else {
            return Err(errors::TrigemuFault::invalid_transition("resume", "not running"));
        };
        if !self.is_running() {
            return Err(errors::TrigemuFault::invalid_transition("resume", "not running"));
        }
        if !state.is_paused() {
            return Err(errors::TrigemuFault::invalid_transition("resume", "not paused"));
        }
        validate_trigger_interval(params.trigger_interval_ticks)?;
        state.set_trigger_interval_ticks(params.trigger_interval_ticks);
        state.set_paused(false);
        Ok(())
    }

    /// `scrap`: not running. Clears `configured`.
    pub fn scrap(&mut self) -> Result<(), errors::TrigemuFault> {
        if self.is_running() {
            return Err(errors::TrigemuFault::invalid_transition("scrap", "running"));
        }
        self.configured = false;
        self.conf = None;
        Ok(())
    }

    /// The info surface (`spec.md` §6): an on-demand query whose "new"
    /// fields are exchange-zeroed. Returns all-zero if no run has started
    /// yet.
    pub fn info(&self) -> InfoSnapshot {
        self.run_state
            .as_ref()
            .map(|s| s.info_snapshot())
            .unwrap_or_default()
    }

    /// The estimator's current DAQ-tick estimate, or `DaqTick::INVALID`
    /// before the first time-sync anchor arrives (or if no run has
    /// started). Diagnostic only; not part of the info surface above.
    pub fn current_estimate(&self) -> DaqTick {
        self.run_state
            .as_ref()
            .map(|s| s.load_estimate())
            .unwrap_or(DaqTick::INVALID)
    }

    /// Current size of the open-decisions set. Diagnostic only; not part
    /// of the info surface above.
    pub fn open_decisions_count(&self) -> usize {
        self.run_state
            .as_ref()
            .map(|s| s.open_decisions_snapshot().len())
            .unwrap_or(0)
    }
}
