//! The Offer Matcher Manager: a single-writer actor that fans an incoming
//! offer out across a rotating set of matchers, accumulating placements
//! until resource, deadline, or token budgets are exhausted.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, instrument, warn};

use common::clock::Clock;

use crate::error::OfferError;
use crate::matcher::MatcherHandle;
use crate::offer::{MatchedTasks, Offer, OfferId, TaskPlacement};
use crate::resources::subtract_resources;

/// Hard cap on placements per offer. `max_tasks_per_offer == 0` means the
/// Manager never accepts a placement, which is a legal (if useless)
/// configuration.
#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    pub max_tasks_per_offer: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_offer: usize::MAX,
        }
    }
}

enum Command {
    SetLaunchTokens(u64),
    AddLaunchTokens(i64),
    AddOrUpdateMatcher(MatcherHandle, oneshot::Sender<MatcherHandle>),
    RemoveMatcher(MatcherHandle, oneshot::Sender<MatcherHandle>),
    MatchOffer {
        deadline: Instant,
        offer: Offer,
        reply_tx: oneshot::Sender<MatchedTasks>,
    },
    MatchedTasksReply {
        offer_id: OfferId,
        placements: Vec<TaskPlacement>,
    },
    #[cfg(test)]
    DebugSnapshot(oneshot::Sender<DebugSnapshot>),
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct DebugSnapshot {
    pub launch_tokens: u64,
    pub offers_in_flight: usize,
}

/// Per-in-flight-offer state the Manager owns exclusively.
struct OfferData {
    offer: Offer,
    deadline: Instant,
    reply_tx: Option<oneshot::Sender<MatchedTasks>>,
    matcher_queue: VecDeque<MatcherHandle>,
    /// The matcher a query is currently outstanding against, if any. Both a
    /// real matcher reply and the deadline self-message resolve this field
    /// — they are indistinguishable once they reach the mailbox.
    in_flight_matcher: Option<MatcherHandle>,
    tasks: Vec<TaskPlacement>,
}

/// A cheaply-cloneable handle to a running Manager's mailbox.
#[derive(Clone)]
pub struct ManagerHandle {
    tx: mpsc::UnboundedSender<Command>,
    wanted_offers: watch::Receiver<bool>,
}

impl ManagerHandle {
    pub async fn set_launch_tokens(&self, n: u64) {
        let _ = self.tx.send(Command::SetLaunchTokens(n));
    }

    /// `delta` may be negative on the public boundary, but the counter is
    /// clamped at 0 rather than allowed to underflow or go negative — see
    /// `DESIGN.md` for why only internal consumption is allowed to reduce
    /// the counter arbitrarily.
    pub async fn add_launch_tokens(&self, delta: i64) {
        let _ = self.tx.send(Command::AddLaunchTokens(delta));
    }

    /// Adds `matcher` (or replaces the existing one with the same id) and
    /// returns once the Manager has applied the change.
    pub async fn add_or_update_matcher(&self, matcher: MatcherHandle) -> anyhow::Result<MatcherHandle> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::AddOrUpdateMatcher(matcher, reply_tx))
            .map_err(|_| anyhow::anyhow!("manager mailbox closed"))?;
        reply_rx.await.map_err(|_| anyhow::anyhow!("manager dropped reply"))
    }

    pub async fn remove_matcher(&self, matcher: MatcherHandle) -> anyhow::Result<MatcherHandle> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::RemoveMatcher(matcher, reply_tx))
            .map_err(|_| anyhow::anyhow!("manager mailbox closed"))?;
        reply_rx.await.map_err(|_| anyhow::anyhow!("manager dropped reply"))
    }

    /// Submits an offer for matching and waits for the Manager's single
    /// reply. Never resolves more than once, and resolves even if no
    /// matcher ever replies (the deadline guarantees that).
    pub async fn match_offer(&self, deadline: Instant, offer: Offer) -> anyhow::Result<MatchedTasks> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::MatchOffer { deadline, offer, reply_tx })
            .map_err(|_| anyhow::anyhow!("manager mailbox closed"))?;
        reply_rx.await.map_err(|_| anyhow::anyhow!("manager dropped reply"))
    }

    /// A view of the wanted-offers signal: `true` iff matchers exist and
    /// tokens remain. Duplicate values may be observed; treat as idempotent.
    pub fn wanted_offers(&self) -> watch::Receiver<bool> {
        self.wanted_offers.clone()
    }

    #[cfg(test)]
    pub async fn debug_snapshot(&self) -> DebugSnapshot {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.tx.send(Command::DebugSnapshot(reply_tx));
        reply_rx.await.expect("manager dropped debug snapshot reply")
    }
}

/// The Manager itself. Construct with `Manager::spawn` to get a running
/// actor and a handle to it; there is no way to drive a `Manager` except
/// through its mailbox.
pub struct Manager {
    config: ManagerConfig,
    clock: Arc<dyn Clock>,
    launch_tokens: u64,
    matchers: Vec<MatcherHandle>,
    offers: HashMap<OfferId, OfferData>,
    wanted_offers_tx: watch::Sender<bool>,
    mailbox_tx: mpsc::UnboundedSender<Command>,
}

impl Manager {
    /// Spawns the actor loop on the current Tokio runtime and returns a
    /// handle to it. The loop runs until every `ManagerHandle` (and the
    /// internal self-sender) is dropped.
    pub fn spawn(config: ManagerConfig, clock: Arc<dyn Clock>) -> ManagerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (wanted_tx, wanted_rx) = watch::channel(false);

        let manager = Manager {
            config,
            clock,
            launch_tokens: 0,
            matchers: Vec::new(),
            offers: HashMap::new(),
            wanted_offers_tx: wanted_tx,
            mailbox_tx: tx.clone(),
        };

        tokio::spawn(manager.run(rx));

        ManagerHandle {
            tx,
            wanted_offers: wanted_rx,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd);
        }
        debug!("offer matcher manager mailbox closed; actor exiting");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SetLaunchTokens(n) => self.set_launch_tokens(n),
            Command::AddLaunchTokens(delta) => self.add_launch_tokens(delta),
            Command::AddOrUpdateMatcher(matcher, reply_tx) => {
                self.add_or_update_matcher(matcher.clone());
                let _ = reply_tx.send(matcher);
            }
            Command::RemoveMatcher(matcher, reply_tx) => {
                self.remove_matcher(&matcher);
                let _ = reply_tx.send(matcher);
            }
            Command::MatchOffer { deadline, offer, reply_tx } => self.match_offer(deadline, offer, reply_tx),
            Command::MatchedTasksReply { offer_id, placements } => self.handle_matched_tasks(offer_id, placements),
            #[cfg(test)]
            Command::DebugSnapshot(reply_tx) => {
                let _ = reply_tx.send(DebugSnapshot {
                    launch_tokens: self.launch_tokens,
                    offers_in_flight: self.offers.len(),
                });
            }
        }
        self.publish_wanted_offers();
    }

    #[instrument(skip(self))]
    fn set_launch_tokens(&mut self, n: u64) {
        info!(tokens = n, "launch tokens set");
        self.launch_tokens = n;
    }

    #[instrument(skip(self))]
    fn add_launch_tokens(&mut self, delta: i64) {
        let before = self.launch_tokens;
        self.launch_tokens = self.launch_tokens.saturating_add_signed(delta);
        debug!(before, after = self.launch_tokens, delta, "launch tokens adjusted");
    }

    #[instrument(skip(self, matcher), fields(matcher_id = %matcher.id))]
    fn add_or_update_matcher(&mut self, matcher: MatcherHandle) {
        if let Some(existing) = self.matchers.iter_mut().find(|m| m.id == matcher.id) {
            *existing = matcher.clone();
        } else {
            self.matchers.push(matcher.clone());
        }

        // A matcher joining mid-flight participates in every in-flight
        // offer's remaining round.
        for data in self.offers.values_mut() {
            let already_present = data.matcher_queue.iter().any(|m| m == &matcher)
                || data.in_flight_matcher.as_ref() == Some(&matcher);
            if !already_present {
                data.matcher_queue.push_back(matcher.clone());
            }
        }

        info!("matcher added or updated");
    }

    #[instrument(skip(self, matcher), fields(matcher_id = %matcher.id))]
    fn remove_matcher(&mut self, matcher: &MatcherHandle) {
        self.matchers.retain(|m| m != matcher);

        // Leaving removes it from future rotations but does not cancel an
        // already-dispatched query to it.
        for data in self.offers.values_mut() {
            data.matcher_queue.retain(|m| m != matcher);
        }

        info!("matcher removed");
    }

    #[instrument(skip(self, offer, reply_tx), fields(offer_id = %offer.id))]
    fn match_offer(&mut self, deadline: Instant, offer: Offer, reply_tx: oneshot::Sender<MatchedTasks>) {
        if !self.wanted_offers_value() {
            debug!("offers not wanted at entry; replying empty");
            let _ = reply_tx.send(MatchedTasks::empty(offer.id));
            return;
        }

        let offer_id = offer.id;
        let mut shuffled = self.matchers.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        let matcher_queue: VecDeque<MatcherHandle> = shuffled.into();

        self.offers.insert(
            offer_id,
            OfferData {
                offer,
                deadline,
                reply_tx: Some(reply_tx),
                matcher_queue,
                in_flight_matcher: None,
                tasks: Vec::new(),
            },
        );

        self.schedule_deadline_timeout(offer_id, deadline);
        self.dispatch_next_or_finish(offer_id);
    }

    /// Schedules the deferred self-message that serves as this offer's
    /// timeout path. Indistinguishable, once delivered, from a genuine
    /// empty matcher reply.
    fn schedule_deadline_timeout(&self, offer_id: OfferId, deadline: Instant) {
        let tx = self.mailbox_tx.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            let now = clock.now();
            if deadline > now {
                tokio::time::sleep(deadline - now).await;
            }
            let _ = tx.send(Command::MatchedTasksReply {
                offer_id,
                placements: Vec::new(),
            });
        });
    }

    #[instrument(skip(self, offer_id), fields(%offer_id))]
    fn handle_matched_tasks(&mut self, offer_id: OfferId, mut added: Vec<TaskPlacement>) {
        let Some(data) = self.offers.get_mut(&offer_id) else {
            warn!("late MatchedTasks reply for unknown/already-finished offer; dropped");
            return;
        };

        let replying_matcher = data.in_flight_matcher.take();

        let remaining_capacity = self.config.max_tasks_per_offer.saturating_sub(data.tasks.len());
        let k = (self.launch_tokens as usize).min(added.len()).min(remaining_capacity);

        let rejected: Vec<TaskPlacement> = added.split_off(k);
        let accepted = added;

        for placement in rejected {
            placement.source.reject();
        }

        for placement in &accepted {
            let (reduced, errors) = subtract_resources(&data.offer.resources, &placement.resources);
            for reason in errors {
                let err = OfferError::PlacementProcessing {
                    task_id: placement.task_id.clone(),
                    reason,
                };
                error!(task_id = %placement.task_id, error = %err, "placement resource processing failed; offer state preserved, dispatch continues");
            }
            data.offer.resources = reduced;
        }

        let accepted_count = accepted.len();
        data.tasks.extend(accepted);
        self.launch_tokens = self.launch_tokens.saturating_sub(accepted_count as u64);

        if let Some(matcher) = replying_matcher {
            if accepted_count > 0 {
                data.matcher_queue.push_back(matcher);
            }
        }

        self.dispatch_next_or_finish(offer_id);
    }

    /// `scheduleNextMatcherOrFinish`: terminates the offer, or dispatches
    /// exactly one more matcher query.
    fn dispatch_next_or_finish(&mut self, offer_id: OfferId) {
        let now = self.clock.now();
        let max_tasks = self.config.max_tasks_per_offer;
        let tokens_left = self.launch_tokens;

        let Some(data) = self.offers.get(&offer_id) else {
            return;
        };

        if now >= data.deadline {
            warn!(offer_id = %offer_id, "offer deadline elapsed; finishing with accumulated placements");
            self.finish_offer(offer_id);
            return;
        }

        if data.tasks.len() >= max_tasks {
            debug!(offer_id = %offer_id, "max tasks per offer reached; finishing");
            self.finish_offer(offer_id);
            return;
        }

        if tokens_left == 0 {
            debug!(offer_id = %offer_id, "no launch tokens remain; finishing");
            self.finish_offer(offer_id);
            return;
        }

        let deadline = data.deadline;

        let Some(data) = self.offers.get_mut(&offer_id) else {
            return;
        };
        let Some(matcher) = data.matcher_queue.pop_front() else {
            debug!(offer_id = %offer_id, "matcher queue exhausted; finishing");
            self.finish_offer(offer_id);
            return;
        };
        data.in_flight_matcher = Some(matcher.clone());
        let offer_snapshot = data.offer.clone();
        let tx = self.mailbox_tx.clone();

        tokio::spawn(async move {
            let placements = match matcher.matcher.process_offer(deadline, offer_snapshot).await {
                Ok(matched) => matched.placements,
                Err(e) => {
                    let err = OfferError::MatcherFailed(e.to_string());
                    warn!(matcher_id = %matcher.id, error = %err, "matcher query failed; treated as empty reply");
                    Vec::new()
                }
            };
            let _ = tx.send(Command::MatchedTasksReply {
                offer_id,
                placements,
            });
        });
    }

    fn finish_offer(&mut self, offer_id: OfferId) {
        if let Some(mut data) = self.offers.remove(&offer_id) {
            if let Some(reply_tx) = data.reply_tx.take() {
                let _ = reply_tx.send(MatchedTasks {
                    offer_id,
                    placements: data.tasks,
                });
            }
        }
    }

    fn wanted_offers_value(&self) -> bool {
        !self.matchers.is_empty() && self.launch_tokens > 0
    }

    fn publish_wanted_offers(&self) {
        let _ = self.wanted_offers_tx.send(self.wanted_offers_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque as StdVecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use common::clock::SystemClock;

    use crate::matcher::OfferMatcher;
    use crate::resources::Resource;

    #[derive(Debug)]
    struct RecordingSource {
        task_id: String,
        rejected: Arc<StdMutex<Vec<String>>>,
    }

    impl crate::offer::TaskSource for RecordingSource {
        fn reject(self: Box<Self>) {
            self.rejected.lock().unwrap().push(self.task_id);
        }
    }

    fn placement(task_id: &str, rejected: &Arc<StdMutex<Vec<String>>>) -> TaskPlacement {
        TaskPlacement {
            task_id: task_id.to_string(),
            resources: vec![Resource::scalar("cpus", "*", 1.0)],
            source: Box::new(RecordingSource {
                task_id: task_id.to_string(),
                rejected: rejected.clone(),
            }),
        }
    }

    /// Hands out one preloaded batch per call, in order, then empties.
    struct ScriptedMatcher {
        batches: StdMutex<StdVecDeque<Vec<TaskPlacement>>>,
        delay: Duration,
    }

    impl ScriptedMatcher {
        fn new(batches: Vec<Vec<TaskPlacement>>) -> Self {
            Self {
                batches: StdMutex::new(batches.into()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(batches: Vec<Vec<TaskPlacement>>, delay: Duration) -> Self {
            Self {
                batches: StdMutex::new(batches.into()),
                delay,
            }
        }
    }

    #[async_trait]
    impl OfferMatcher for ScriptedMatcher {
        async fn process_offer(&self, _deadline: Instant, offer: Offer) -> anyhow::Result<MatchedTasks> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let batch = self.batches.lock().unwrap().pop_front().unwrap_or_default();
            Ok(MatchedTasks {
                offer_id: offer.id,
                placements: batch,
            })
        }
    }

    /// Blocks until notified, then hands out a single preloaded batch.
    /// Used to pin down exactly when a matcher is "in flight" so a test can
    /// inject a matcher-set change while that query is outstanding.
    struct GatedMatcher {
        notify: Arc<Notify>,
        result: StdMutex<Option<Vec<TaskPlacement>>>,
    }

    #[async_trait]
    impl OfferMatcher for GatedMatcher {
        async fn process_offer(&self, _deadline: Instant, offer: Offer) -> anyhow::Result<MatchedTasks> {
            self.notify.notified().await;
            let placements = self.result.lock().unwrap().take().unwrap_or_default();
            Ok(MatchedTasks {
                offer_id: offer.id,
                placements,
            })
        }
    }

    fn far_off_deadline(clock: &dyn Clock) -> Instant {
        clock.now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn s1_single_matcher_abundant_resources_is_fully_accepted() {
        let clock = Arc::new(SystemClock);
        let handle = Manager::spawn(ManagerConfig::default(), clock.clone());
        handle.set_launch_tokens(10).await;

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        let matcher = Arc::new(ScriptedMatcher::new(vec![vec![
            placement("t1", &rejected),
            placement("t2", &rejected),
        ]]));
        handle
            .add_or_update_matcher(MatcherHandle::new("m1", matcher))
            .await
            .unwrap();

        let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
        let result = handle.match_offer(far_off_deadline(&*clock), offer).await.unwrap();

        assert_eq!(result.placements.len(), 2);
        assert!(rejected.lock().unwrap().is_empty());

        let snapshot = handle.debug_snapshot().await;
        assert_eq!(snapshot.launch_tokens, 8);
        assert_eq!(snapshot.offers_in_flight, 0);
    }

    #[tokio::test]
    async fn s2_launch_token_exhaustion_rejects_the_overflow() {
        let clock = Arc::new(SystemClock);
        let handle = Manager::spawn(ManagerConfig::default(), clock.clone());
        handle.set_launch_tokens(1).await;

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        let matcher = Arc::new(ScriptedMatcher::new(vec![vec![
            placement("t1", &rejected),
            placement("t2", &rejected),
            placement("t3", &rejected),
        ]]));
        handle
            .add_or_update_matcher(MatcherHandle::new("m1", matcher))
            .await
            .unwrap();

        let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
        let result = handle.match_offer(far_off_deadline(&*clock), offer).await.unwrap();

        assert_eq!(result.placements.len(), 1);
        assert_eq!(rejected.lock().unwrap().len(), 2);

        let snapshot = handle.debug_snapshot().await;
        assert_eq!(snapshot.launch_tokens, 0);
    }

    #[tokio::test]
    async fn s3_max_tasks_per_offer_caps_acceptance() {
        let clock = Arc::new(SystemClock);
        let config = ManagerConfig { max_tasks_per_offer: 1 };
        let handle = Manager::spawn(config, clock.clone());
        handle.set_launch_tokens(10).await;

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        let matcher = Arc::new(ScriptedMatcher::new(vec![vec![
            placement("t1", &rejected),
            placement("t2", &rejected),
            placement("t3", &rejected),
        ]]));
        handle
            .add_or_update_matcher(MatcherHandle::new("m1", matcher))
            .await
            .unwrap();

        let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
        let result = handle.match_offer(far_off_deadline(&*clock), offer).await.unwrap();

        assert_eq!(result.placements.len(), 1);
        assert_eq!(rejected.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn s4_deadline_expiry_drops_a_late_matcher_reply() {
        let clock = Arc::new(SystemClock);
        let handle = Manager::spawn(ManagerConfig::default(), clock.clone());
        handle.set_launch_tokens(10).await;

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        // This matcher replies well after the offer's deadline elapses.
        let matcher = Arc::new(ScriptedMatcher::with_delay(
            vec![vec![placement("late", &rejected)]],
            Duration::from_millis(150),
        ));
        handle
            .add_or_update_matcher(MatcherHandle::new("slow", matcher))
            .await
            .unwrap();

        let deadline = clock.now() + Duration::from_millis(20);
        let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
        let result = handle.match_offer(deadline, offer).await.unwrap();

        // The deadline fires before the slow matcher replies, so the offer
        // finishes empty.
        assert!(result.placements.is_empty());

        // Give the slow matcher's late reply time to arrive at the mailbox
        // and be dropped; the manager must not panic or double-reply.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = handle.debug_snapshot().await;
        assert_eq!(snapshot.offers_in_flight, 0);
        // The late placement was never accepted, so its source was never
        // told to reject it either — it simply vanishes with the dropped reply.
        assert!(rejected.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn s5_a_matcher_added_mid_flight_joins_the_same_offers_round() {
        let clock = Arc::new(SystemClock);
        let handle = Manager::spawn(ManagerConfig::default(), clock.clone());
        handle.set_launch_tokens(10).await;

        let notify = Arc::new(Notify::new());
        let gated = Arc::new(GatedMatcher {
            notify: notify.clone(),
            result: StdMutex::new(Some(Vec::new())),
        });
        handle
            .add_or_update_matcher(MatcherHandle::new("gate", gated))
            .await
            .unwrap();

        let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
        let deadline = far_off_deadline(&*clock);
        let handle_for_offer = handle.clone();
        let offer_task = tokio::spawn(async move { handle_for_offer.match_offer(deadline, offer).await });

        // Give the manager time to dispatch to "gate" and mark it in-flight.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        let late_joiner = Arc::new(ScriptedMatcher::new(vec![vec![placement("joined", &rejected)]]));
        handle
            .add_or_update_matcher(MatcherHandle::new("joiner", late_joiner))
            .await
            .unwrap();

        // Let "gate" reply empty; the newly joined matcher should be queried next.
        notify.notify_one();

        let result = offer_task.await.unwrap().unwrap();
        assert_eq!(result.placements.len(), 1);
        assert_eq!(result.placements[0].task_id, "joined");
    }

    #[tokio::test]
    async fn wanted_offers_requires_both_a_matcher_and_launch_tokens() {
        let clock = Arc::new(SystemClock);
        let handle = Manager::spawn(ManagerConfig::default(), clock);
        let mut wanted = handle.wanted_offers();
        assert!(!*wanted.borrow());

        handle.set_launch_tokens(5).await;
        wanted.changed().await.unwrap();
        assert!(!*wanted.borrow(), "tokens alone do not make offers wanted");

        let rejected = Arc::new(StdMutex::new(Vec::new()));
        let matcher = Arc::new(ScriptedMatcher::new(vec![vec![placement("t1", &rejected)]]));
        handle
            .add_or_update_matcher(MatcherHandle::new("m1", matcher))
            .await
            .unwrap();
        wanted.changed().await.unwrap();
        assert!(*wanted.borrow());

        handle.set_launch_tokens(0).await;
        wanted.changed().await.unwrap();
        assert!(!*wanted.borrow());
    }
}
