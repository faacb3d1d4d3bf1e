//! Launch router state machine
//!
//! One event loop owns every phase transition; connectivity, attribution,
//! push, and retry signals come in over the event channel, and the loop's
//! own background tasks (setup query, consent prompt) post their results
//! back the same way. Nothing mutates routing state from outside the loop.
//!
//! Failures are absorbed, never surfaced: transport and protocol errors on
//! the setup query, a rejection from the endpoint, and connectivity loss
//! all resolve to a deterministic fallback phase. Once attribution has
//! arrived the router always leaves `hatching`.

use crate::consent::{should_prompt, ConsentDelegate, ConsentOutcome};
use coopgate_core::{
    AttributionPayload, ConsentState, Destination, DisplayPhase, Error, LaunchMode, Result,
};
use coopgate_net::connectivity::LinkState;
use coopgate_net::push;
use coopgate_net::setup::{QueryContext, SetupDecision, SetupError, SetupQuery, SetupService};
use coopgate_store::StateStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Everything that can advance the state machine.
#[derive(Debug)]
pub enum RouterEvent {
    /// Reachability transition from the connectivity monitor.
    Link(LinkState),
    /// One-shot attribution signal; `None` is a delivery failure.
    Attribution(Option<AttributionPayload>),
    /// Inbound push or cold-launch notification payload.
    Push(serde_json::Value),
    /// Explicit re-evaluation request.
    Retry,
    /// Posted back by the router's own setup task.
    SetupResolved(std::result::Result<SetupDecision, SetupError>),
    /// Posted back by the router's own consent task.
    ConsentResolved(ConsentOutcome),
}

/// Handle held by producers and the presentation layer.
#[derive(Clone)]
pub struct RouterHandle {
    events: mpsc::Sender<RouterEvent>,
    phases: watch::Receiver<DisplayPhase>,
}

impl RouterHandle {
    pub async fn send(&self, event: RouterEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|e| Error::RouterClosed(e.to_string()))
    }

    /// Subscribe to phase changes.
    pub fn phases(&self) -> watch::Receiver<DisplayPhase> {
        self.phases.clone()
    }

    pub fn current_phase(&self) -> DisplayPhase {
        self.phases.borrow().clone()
    }

    /// Wait until the router reaches a terminal phase and return it.
    pub async fn wait_for_decision(&mut self) -> DisplayPhase {
        loop {
            let phase = self.phases.borrow().clone();
            if phase.is_terminal() {
                return phase;
            }
            if self.phases.changed().await.is_err() {
                return self.phases.borrow().clone();
            }
        }
    }
}

pub struct LaunchRouter {
    store: Arc<dyn StateStore>,
    setup: Arc<dyn SetupService>,
    consent: Arc<dyn ConsentDelegate>,
    ctx: QueryContext,
    phase: DisplayPhase,
    phase_tx: watch::Sender<DisplayPhase>,
    events_tx: mpsc::Sender<RouterEvent>,
    attribution: Option<AttributionPayload>,
    link: Option<LinkState>,
    setup_in_flight: bool,
    consent_in_flight: bool,
}

impl LaunchRouter {
    /// Spawn the router task and return its handle. The router starts in
    /// `hatching` and waits for events.
    pub fn spawn(
        store: Arc<dyn StateStore>,
        setup: Arc<dyn SetupService>,
        consent: Arc<dyn ConsentDelegate>,
        ctx: QueryContext,
    ) -> RouterHandle {
        let (events_tx, events_rx) = mpsc::channel(64);
        let (phase_tx, phases) = watch::channel(DisplayPhase::Hatching);
        let router = Self {
            store,
            setup,
            consent,
            ctx,
            phase: DisplayPhase::Hatching,
            phase_tx,
            events_tx: events_tx.clone(),
            attribution: None,
            link: None,
            setup_in_flight: false,
            consent_in_flight: false,
        };
        tokio::spawn(router.run(events_rx));
        RouterHandle {
            events: events_tx,
            phases,
        }
    }

    async fn run(mut self, mut events: mpsc::Receiver<RouterEvent>) {
        info!("Launch router up in {}", self.phase);
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!("Event channel closed, router stopping");
    }

    fn handle(&mut self, event: RouterEvent) {
        match event {
            RouterEvent::Link(LinkState::Unsatisfied) => self.on_offline(),
            RouterEvent::Link(LinkState::Satisfied) => self.on_online(),
            RouterEvent::Attribution(payload) => self.on_attribution(payload),
            RouterEvent::Push(payload) => self.on_push(&payload),
            RouterEvent::Retry => self.evaluate(),
            RouterEvent::SetupResolved(result) => self.on_setup(result),
            RouterEvent::ConsentResolved(outcome) => self.on_consent(outcome),
        }
    }

    /// Reachability lost: a mid-remote-session user gets the dedicated
    /// offline notice, everyone else routes to the local dashboard.
    fn on_offline(&mut self) {
        self.link = Some(LinkState::Unsatisfied);
        if self.mode() == Some(LaunchMode::StatsDisplay) {
            self.set_phase(DisplayPhase::StrayOffline);
        } else {
            self.persist_mode(LaunchMode::Nest);
            self.set_phase(DisplayPhase::NestFallback);
        }
    }

    /// Reachability regained counts as the retry signal.
    fn on_online(&mut self) {
        let regained = self.link == Some(LinkState::Unsatisfied);
        self.link = Some(LinkState::Satisfied);
        if regained {
            self.evaluate();
        }
    }

    fn on_attribution(&mut self, payload: Option<AttributionPayload>) {
        if self.attribution.is_some() {
            debug!("Duplicate attribution signal ignored");
            return;
        }
        // Failure still unblocks routing, as an empty payload.
        self.attribution = Some(payload.unwrap_or_default());
        self.evaluate();
    }

    fn on_push(&mut self, payload: &serde_json::Value) {
        match push::ingest(self.store.as_ref(), payload) {
            Ok(true) => debug!("Deep link cached for next evaluation"),
            Ok(false) => {}
            Err(e) => warn!("Push ingestion failed: {}", e),
        }
    }

    /// The routing ladder: preference gate, cached deep link, consent,
    /// then the setup query. Runs only before a terminal decision and
    /// never while a prompt or query is outstanding.
    fn evaluate(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        let Some(attribution) = self.attribution.clone() else {
            debug!("Waiting for attribution before routing");
            return;
        };
        if self.consent_in_flight || self.setup_in_flight {
            return;
        }

        if self.mode() == Some(LaunchMode::Nest) {
            self.set_phase(DisplayPhase::NestFallback);
            return;
        }

        match self.store.take_pending_link() {
            Ok(Some(url)) => match Destination::parse(&url, 0) {
                Ok(dest) => {
                    info!("Serving cached deep link");
                    self.set_phase(DisplayPhase::StatsDisplay(dest));
                    return;
                }
                Err(e) => warn!("Discarding unusable pending link: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Pending link unreadable: {}", e),
        }

        let consent = self.consent_state();
        let now = chrono::Utc::now().timestamp();
        if should_prompt(&consent, now) {
            self.begin_consent();
        } else {
            self.begin_setup(attribution);
        }
    }

    fn begin_consent(&mut self) {
        self.consent_in_flight = true;
        info!("Showing notification consent prompt");
        let delegate = self.consent.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = delegate.request().await;
            let _ = events.send(RouterEvent::ConsentResolved(outcome)).await;
        });
    }

    /// Prompt resolved: persist the outcome and the prompt timestamp,
    /// then continue routing regardless of what the user chose.
    fn on_consent(&mut self, outcome: ConsentOutcome) {
        self.consent_in_flight = false;
        match outcome {
            ConsentOutcome::PermissionGranted => self.persist_consent(true),
            ConsentOutcome::PermissionDenied => self.persist_consent(false),
            ConsentOutcome::Declined => {}
        }
        let now = chrono::Utc::now().timestamp();
        if let Err(e) = self.store.record_prompt(now) {
            warn!("Failed to record prompt time: {}", e);
        }
        self.evaluate();
    }

    fn begin_setup(&mut self, attribution: AttributionPayload) {
        if self.setup_in_flight {
            debug!("Setup query already in flight");
            return;
        }
        self.setup_in_flight = true;
        let query = SetupQuery::build(attribution, &self.ctx, self.store.as_ref());
        let setup = self.setup.clone();
        let events = self.events_tx.clone();
        info!("Issuing setup query");
        tokio::spawn(async move {
            let result = setup.submit(&query).await;
            let _ = events.send(RouterEvent::SetupResolved(result)).await;
        });
    }

    fn on_setup(&mut self, result: std::result::Result<SetupDecision, SetupError>) {
        self.setup_in_flight = false;
        match result {
            Ok(SetupDecision::Serve(dest)) => {
                if let Err(e) = self.store.save_destination(&dest) {
                    warn!("Failed to save destination: {}", e);
                }
                self.persist_mode(LaunchMode::StatsDisplay);
                self.set_phase(DisplayPhase::StatsDisplay(dest));
            }
            Ok(SetupDecision::Reject) => {
                info!("Endpoint declined remote content");
                self.persist_mode(LaunchMode::Nest);
                self.set_phase(DisplayPhase::NestFallback);
            }
            Err(e) => {
                warn!("Setup query failed: {}", e);
                // Saved destinations are reused without an expiry check,
                // matching the shipped behavior.
                match self.store.saved_destination() {
                    Ok(Some(dest)) => {
                        info!("Falling back to saved destination");
                        self.set_phase(DisplayPhase::StatsDisplay(dest));
                    }
                    _ => {
                        self.persist_mode(LaunchMode::Nest);
                        self.set_phase(DisplayPhase::NestFallback);
                    }
                }
            }
        }
    }

    fn set_phase(&mut self, next: DisplayPhase) {
        if self.phase == next {
            return;
        }
        info!("Phase {} -> {}", self.phase, next);
        if next.is_terminal() {
            if let Err(e) = self.store.mark_launched() {
                warn!("Failed to mark launch: {}", e);
            }
        }
        self.phase = next.clone();
        let _ = self.phase_tx.send(next);
    }

    fn mode(&self) -> Option<LaunchMode> {
        self.store.launch_mode().unwrap_or_else(|e| {
            warn!("Launch mode unreadable: {}", e);
            None
        })
    }

    fn persist_mode(&self, mode: LaunchMode) {
        if let Err(e) = self.store.set_launch_mode(mode) {
            warn!("Failed to persist launch mode: {}", e);
        }
    }

    fn persist_consent(&self, granted: bool) {
        if let Err(e) = self.store.record_consent(granted) {
            warn!("Failed to persist consent: {}", e);
        }
    }

    fn consent_state(&self) -> ConsentState {
        self.store.consent().unwrap_or_else(|e| {
            warn!("Consent state unreadable: {}", e);
            ConsentState::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopgate_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeSetup {
        results: std::sync::Mutex<std::collections::VecDeque<
            std::result::Result<SetupDecision, SetupError>,
        >>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FakeSetup {
        fn serving(url: &str, expires: i64) -> Self {
            Self::with(Ok(SetupDecision::Serve(Destination {
                url: url.into(),
                expires_at: expires,
            })))
        }

        fn rejecting() -> Self {
            Self::with(Ok(SetupDecision::Reject))
        }

        fn failing() -> Self {
            Self::with(Err(SetupError::Transport("connection refused".into())))
        }

        fn with(result: std::result::Result<SetupDecision, SetupError>) -> Self {
            Self {
                results: std::sync::Mutex::new([result].into()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn then_serving(self, url: &str, expires: i64) -> Self {
            self.results
                .lock()
                .unwrap()
                .push_back(Ok(SetupDecision::Serve(Destination {
                    url: url.into(),
                    expires_at: expires,
                })));
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SetupService for FakeSetup {
        async fn submit(
            &self,
            _query: &SetupQuery,
        ) -> std::result::Result<SetupDecision, SetupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SetupDecision::Reject))
        }
    }

    struct FakeConsent {
        outcome: ConsentOutcome,
        calls: AtomicUsize,
    }

    impl FakeConsent {
        fn new(outcome: ConsentOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ConsentDelegate for FakeConsent {
        async fn request(&self) -> ConsentOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    fn ctx() -> QueryContext {
        QueryContext {
            install_id: "inst-test".into(),
            bundle_id: "app.coopgate.flock".into(),
            store_id: "6744830127".into(),
            project_id: "coopgate-flock".into(),
            locale: "EN".into(),
        }
    }

    fn decided_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.record_consent(true).unwrap();
        store
    }

    async fn wait_for(
        rx: &mut watch::Receiver<DisplayPhase>,
        pred: impl Fn(&DisplayPhase) -> bool,
    ) -> DisplayPhase {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let phase = rx.borrow().clone();
                if pred(&phase) {
                    return phase;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("phase not reached in time")
    }

    #[tokio::test]
    async fn nest_mode_skips_the_setup_query() {
        let store = decided_store();
        store.set_launch_mode(LaunchMode::Nest).unwrap();
        let setup = Arc::new(FakeSetup::serving("https://x.test/a", 1));
        let handle = LaunchRouter::spawn(
            store,
            setup.clone(),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        let phase = handle.clone().wait_for_decision().await;
        assert_eq!(phase, DisplayPhase::NestFallback);
        assert_eq!(setup.calls(), 0);
    }

    #[tokio::test]
    async fn successful_setup_serves_and_persists() {
        let store = decided_store();
        let setup = Arc::new(FakeSetup::serving("https://x.test/a", 9_999_999_999));
        let handle = LaunchRouter::spawn(
            store.clone(),
            setup,
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle
            .send(RouterEvent::Attribution(Some(AttributionPayload::new())))
            .await
            .unwrap();
        let phase = handle.clone().wait_for_decision().await;
        match phase {
            DisplayPhase::StatsDisplay(dest) => assert_eq!(dest.url, "https://x.test/a"),
            other => panic!("unexpected phase {}", other),
        }
        assert_eq!(
            store.launch_mode().unwrap(),
            Some(LaunchMode::StatsDisplay)
        );
        assert_eq!(
            store.saved_destination().unwrap().unwrap().url,
            "https://x.test/a"
        );
        assert!(store.has_launched_before().unwrap());
    }

    #[tokio::test]
    async fn rejection_lands_in_nest_and_persists_mode() {
        let store = decided_store();
        let handle = LaunchRouter::spawn(
            store.clone(),
            Arc::new(FakeSetup::rejecting()),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        assert_eq!(
            handle.clone().wait_for_decision().await,
            DisplayPhase::NestFallback
        );
        assert_eq!(store.launch_mode().unwrap(), Some(LaunchMode::Nest));
    }

    #[tokio::test]
    async fn failed_setup_falls_back_to_saved_destination() {
        let store = decided_store();
        store
            .save_destination(&Destination {
                url: "https://x.test/saved".into(),
                // Already in the past: reused anyway, as shipped.
                expires_at: 1,
            })
            .unwrap();
        let handle = LaunchRouter::spawn(
            store,
            Arc::new(FakeSetup::failing()),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        match handle.clone().wait_for_decision().await {
            DisplayPhase::StatsDisplay(dest) => assert_eq!(dest.url, "https://x.test/saved"),
            other => panic!("unexpected phase {}", other),
        }
    }

    #[tokio::test]
    async fn failed_setup_without_saved_destination_nests() {
        let store = decided_store();
        let handle = LaunchRouter::spawn(
            store.clone(),
            Arc::new(FakeSetup::failing()),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        assert_eq!(
            handle.clone().wait_for_decision().await,
            DisplayPhase::NestFallback
        );
        assert_eq!(store.launch_mode().unwrap(), Some(LaunchMode::Nest));
    }

    #[tokio::test]
    async fn pending_link_bypasses_the_setup_query() {
        let store = decided_store();
        store.set_pending_link("https://x.test/deep").unwrap();
        let setup = Arc::new(FakeSetup::serving("https://x.test/other", 1));
        let handle = LaunchRouter::spawn(
            store.clone(),
            setup.clone(),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        match handle.clone().wait_for_decision().await {
            DisplayPhase::StatsDisplay(dest) => assert_eq!(dest.url, "https://x.test/deep"),
            other => panic!("unexpected phase {}", other),
        }
        assert_eq!(setup.calls(), 0);
        assert_eq!(store.pending_link().unwrap(), None);
    }

    #[tokio::test]
    async fn undecided_consent_prompts_then_queries() {
        let store = Arc::new(MemoryStore::new());
        let setup = Arc::new(FakeSetup::serving("https://x.test/a", 1));
        let consent = Arc::new(FakeConsent::new(ConsentOutcome::PermissionGranted));
        let handle = LaunchRouter::spawn(store.clone(), setup.clone(), consent.clone(), ctx());
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        let phase = handle.clone().wait_for_decision().await;
        assert!(matches!(phase, DisplayPhase::StatsDisplay(_)));
        assert_eq!(consent.calls(), 1);
        assert_eq!(setup.calls(), 1);
        let recorded = store.consent().unwrap();
        assert!(recorded.granted);
        assert!(recorded.last_prompt_at.is_some());
    }

    #[tokio::test]
    async fn declined_consent_still_queries() {
        let store = Arc::new(MemoryStore::new());
        let setup = Arc::new(FakeSetup::rejecting());
        let consent = Arc::new(FakeConsent::new(ConsentOutcome::Declined));
        let handle = LaunchRouter::spawn(store.clone(), setup.clone(), consent.clone(), ctx());
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        handle.clone().wait_for_decision().await;
        assert_eq!(consent.calls(), 1);
        assert_eq!(setup.calls(), 1);
        let recorded = store.consent().unwrap();
        assert!(!recorded.decided());
        assert!(recorded.last_prompt_at.is_some());
    }

    #[tokio::test]
    async fn offline_routes_by_persisted_mode() {
        // Fresh install: offline goes to the dashboard and persists Nest.
        let store = Arc::new(MemoryStore::new());
        let handle = LaunchRouter::spawn(
            store.clone(),
            Arc::new(FakeSetup::rejecting()),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle
            .send(RouterEvent::Link(LinkState::Unsatisfied))
            .await
            .unwrap();
        assert_eq!(
            handle.clone().wait_for_decision().await,
            DisplayPhase::NestFallback
        );
        assert_eq!(store.launch_mode().unwrap(), Some(LaunchMode::Nest));

        // Returning remote-session user: offline shows the stray notice.
        let store = decided_store();
        store.set_launch_mode(LaunchMode::StatsDisplay).unwrap();
        let handle = LaunchRouter::spawn(
            store,
            Arc::new(FakeSetup::serving("https://x.test/a", 1)),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle
            .send(RouterEvent::Link(LinkState::Unsatisfied))
            .await
            .unwrap();
        let mut phases = handle.phases();
        let phase = wait_for(&mut phases, |p| *p == DisplayPhase::StrayOffline).await;
        assert_eq!(phase, DisplayPhase::StrayOffline);
    }

    #[tokio::test]
    async fn regained_connectivity_retries_from_offline_notice() {
        let store = decided_store();
        let setup = Arc::new(
            FakeSetup::serving("https://x.test/a", 9_999_999_999)
                .then_serving("https://x.test/back", 9_999_999_999),
        );
        let handle = LaunchRouter::spawn(
            store,
            setup.clone(),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        // Reach a remote session, then lose the link mid-session.
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        handle.clone().wait_for_decision().await;
        handle
            .send(RouterEvent::Link(LinkState::Unsatisfied))
            .await
            .unwrap();
        let mut phases = handle.phases();
        wait_for(&mut phases, |p| *p == DisplayPhase::StrayOffline).await;

        // Regaining the link re-enters evaluation and issues a new query.
        handle
            .send(RouterEvent::Link(LinkState::Satisfied))
            .await
            .unwrap();
        let phase = wait_for(&mut phases, |p| {
            matches!(p, DisplayPhase::StatsDisplay(d) if d.url == "https://x.test/back")
        })
        .await;
        assert!(matches!(phase, DisplayPhase::StatsDisplay(_)));
        assert_eq!(setup.calls(), 2);
    }

    #[tokio::test]
    async fn duplicate_attribution_is_ignored() {
        let store = decided_store();
        let setup = Arc::new(FakeSetup::serving("https://x.test/a", 1));
        let handle = LaunchRouter::spawn(
            store,
            setup.clone(),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        handle
            .send(RouterEvent::Attribution(Some(AttributionPayload::new())))
            .await
            .unwrap();
        handle.clone().wait_for_decision().await;
        assert_eq!(setup.calls(), 1);
    }

    #[tokio::test]
    async fn in_flight_guard_prevents_overlapping_queries() {
        let store = decided_store();
        let setup = Arc::new(
            FakeSetup::serving("https://x.test/a", 1).slow(Duration::from_millis(100)),
        );
        let handle = LaunchRouter::spawn(
            store,
            setup.clone(),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        handle.send(RouterEvent::Retry).await.unwrap();
        handle.send(RouterEvent::Retry).await.unwrap();
        handle.clone().wait_for_decision().await;
        assert_eq!(setup.calls(), 1);
    }

    #[tokio::test]
    async fn push_payload_is_cached_for_the_next_evaluation() {
        let store = decided_store();
        let handle = LaunchRouter::spawn(
            store.clone(),
            Arc::new(FakeSetup::rejecting()),
            Arc::new(FakeConsent::new(ConsentOutcome::Declined)),
            ctx(),
        );
        handle
            .send(RouterEvent::Push(serde_json::json!({
                "data": {"url": "https://x.test/from-push"}
            })))
            .await
            .unwrap();
        handle.send(RouterEvent::Attribution(None)).await.unwrap();
        match handle.clone().wait_for_decision().await {
            DisplayPhase::StatsDisplay(dest) => {
                assert_eq!(dest.url, "https://x.test/from-push")
            }
            other => panic!("unexpected phase {}", other),
        }
    }
}
