use std::collections::VecDeque;
use std::time::Duration;

use blocker_core::{
    update, ActionId, Effect, Msg, Session, SessionView, Settings, StepReport, Timings,
};
use blocker_logging::{blocker_debug, blocker_error, blocker_info, set_action_context};
use tokio::sync::mpsc;

use crate::actions;
use crate::detect::{closed_confirmations, open_confirmation, scan_changes, scan_document};
use crate::messages::{Request, Response, SettingsChannel};
use crate::profile::CompiledProfile;
use crate::store::StoredSettings;
use crate::surface::Surface;
use crate::sync::SettingsSync;
use crate::timers::TimerQueue;

/// Outside events the running pipeline reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The tree reported structural changes; drain them.
    TreeChanged,
    /// The settings collaborator pushed new settings.
    SettingsUpdated(StoredSettings),
    Shutdown,
}

/// Owns the session and executes its effects against a surface and a settings channel.
///
/// Everything runs on one task: messages are applied one at a time through
/// [`blocker_core::update`], tree effects answer synchronously with a step report, and
/// timers resolve through a `DelayQueue`.
pub struct Pipeline<S, C> {
    surface: S,
    profile: CompiledProfile,
    channel: C,
    session: Session,
    timers: TimerQueue,
    sync: SettingsSync,
    inbox: VecDeque<Msg>,
    active: bool,
}

impl<S: Surface, C: SettingsChannel> Pipeline<S, C> {
    pub fn new(
        surface: S,
        profile: CompiledProfile,
        channel: C,
        timings: Timings,
        sync_interval: Duration,
    ) -> Self {
        Self {
            surface,
            profile,
            channel,
            session: Session::new(Settings::default(), timings),
            timers: TimerQueue::new(),
            sync: SettingsSync::new(sync_interval),
            inbox: VecDeque::new(),
            active: false,
        }
    }

    /// Loads settings and scans the whole tree once.
    pub fn activate(&mut self) {
        self.refresh_settings();
        self.active = true;
        self.surface.take_mutations();
        self.rescan();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Applies `msg` and everything it causes until the session settles.
    pub fn dispatch(&mut self, msg: Msg) {
        self.inbox.push_back(msg);
        while let Some(msg) = self.inbox.pop_front() {
            set_action_context(message_action(&msg).or_else(|| self.active_id()));
            let session = std::mem::take(&mut self.session);
            let (next, effects) = update(session, msg);
            self.session = next;
            set_action_context(self.active_id());
            for effect in effects {
                self.execute(effect);
            }
        }
        set_action_context(None);
    }

    /// Drains tree mutations: inserted posts are scanned, and a removed confirmation
    /// surface is reported to the session.
    pub fn observe(&mut self) {
        let mutations = self.surface.take_mutations();
        if mutations.is_empty() || !self.active {
            return;
        }
        let candidates = scan_changes(&self.surface, &self.profile, &mutations);
        if !candidates.is_empty() {
            self.dispatch(Msg::ScanCompleted(candidates));
        }
        let sheets = closed_confirmations(&self.surface, &self.profile, &mutations);
        if !sheets.is_empty() {
            self.dispatch(Msg::ConfirmationClosed { sheets });
        }
    }

    /// Pulls settings from the collaborator and applies them when they changed.
    pub fn refresh_settings(&mut self) {
        match self.sync.pull(&mut self.channel) {
            Ok(Some(settings)) => self.apply_settings(settings),
            Ok(None) => {}
            Err(err) => blocker_error!("Settings refresh failed: {}", err),
        }
    }

    pub fn accept_push(&mut self, stored: &StoredSettings) {
        if let Some(settings) = self.sync.accept_push(stored) {
            self.apply_settings(settings);
        }
    }

    /// Observes the tree, then waits for the next timer and applies it.
    /// Returns false when no timer is pending.
    pub async fn advance(&mut self) -> bool {
        self.observe();
        match self.timers.next().await {
            Some((action_id, timer)) => {
                self.dispatch(Msg::TimerElapsed { action_id, timer });
                self.observe();
                true
            }
            None => false,
        }
    }

    /// Advances until nothing is left to wait for. A manual confirmation without a
    /// deadline stops here until the sheet is answered.
    pub async fn run_until_idle(&mut self) {
        while self.advance().await {}
    }

    /// Runs until `Shutdown` or until the event sender is dropped.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<PipelineEvent>) {
        self.activate();
        let mut refresh = tokio::time::interval(self.sync.interval());
        refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        refresh.tick().await;

        loop {
            let wake = tokio::select! {
                biased;
                event = events.recv() => Wake::Event(event),
                Some(expired) = self.timers.next(), if !self.timers.is_empty() => Wake::Timer(expired),
                _ = refresh.tick() => Wake::Refresh,
            };
            match wake {
                Wake::Event(Some(PipelineEvent::TreeChanged)) => self.observe(),
                Wake::Event(Some(PipelineEvent::SettingsUpdated(stored))) => {
                    self.accept_push(&stored)
                }
                Wake::Event(Some(PipelineEvent::Shutdown) | None) => break,
                Wake::Timer((action_id, timer)) => {
                    self.dispatch(Msg::TimerElapsed { action_id, timer });
                    self.observe();
                }
                Wake::Refresh => self.refresh_settings(),
            }
        }
        blocker_info!("Pipeline stopped");
    }

    fn apply_settings(&mut self, settings: Settings) {
        let rules_changed = settings.rules != *self.session.rules();
        self.dispatch(Msg::SettingsChanged(settings));
        if rules_changed && self.active {
            self.rescan();
        }
    }

    fn rescan(&mut self) {
        let candidates = scan_document(&self.surface, &self.profile);
        self.dispatch(Msg::ScanCompleted(candidates));
    }

    fn active_id(&self) -> Option<ActionId> {
        self.session.active().map(|action| action.id)
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::OpenMenu { action_id, node } => {
                let report = actions::open_menu(&mut self.surface, &self.profile, node);
                self.inbox.push_back(Msg::StepReported { action_id, report });
            }
            Effect::SelectBlockOption { action_id } => {
                let report = actions::select_block_option(&mut self.surface, &self.profile);
                self.inbox.push_back(Msg::StepReported { action_id, report });
            }
            Effect::ConfirmBlock { action_id } => {
                let report = actions::confirm_block(&mut self.surface, &self.profile);
                self.inbox.push_back(Msg::StepReported { action_id, report });
            }
            Effect::WatchConfirmation { action_id } => {
                let sheet = open_confirmation(&self.surface, &self.profile);
                let report = StepReport::ConfirmationShown(sheet);
                self.inbox.push_back(Msg::StepReported { action_id, report });
            }
            Effect::StartTimer {
                action_id,
                timer,
                delay,
            } => self.timers.start(action_id, timer, delay),
            Effect::CancelTimers { action_id } => self.timers.cancel(action_id),
            Effect::IncrementBlockedCount => {
                if let Err(err) = self.channel.request(Request::IncrementBlockCount) {
                    blocker_error!("Failed to bump the blocked count: {}", err);
                }
            }
            Effect::ReportBlocked {
                identity,
                reason,
                rule,
            } => {
                let request = Request::BlockUser {
                    username: identity.to_string(),
                    reason,
                    matched_keyword: rule,
                };
                match self.channel.request(request) {
                    Ok(Response::Block(ack)) if !ack.success => {
                        blocker_debug!("{} was already recorded as blocked", identity)
                    }
                    Ok(_) => {}
                    Err(err) => blocker_error!("Failed to record block of {}: {}", identity, err),
                }
            }
        }
    }
}

enum Wake {
    Event(Option<PipelineEvent>),
    Timer((ActionId, blocker_core::Timer)),
    Refresh,
}

fn message_action(msg: &Msg) -> Option<ActionId> {
    match msg {
        Msg::StepReported { action_id, .. } | Msg::TimerElapsed { action_id, .. } => {
            Some(*action_id)
        }
        _ => None,
    }
}
