//! Reconciliation pass and per-entry render pipelines.
//!
//! A pass recomputes every entry's distance from the active one, detaches
//! frames that moved out of the window, attaches frames that moved into it,
//! and starts an asynchronous pipeline for each entry within distance 1.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::rc::Rc;

use story_player_core::error::PlayerError;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use super::load::LoadGate;
use super::messaging::MessagingChannel;
use super::player::PlayerCore;
use crate::domain::location::{VisibilityState, encoded_location, sources_match};
use crate::domain::navigation::position_of;

/// Handles to the pipelines started by one operation. Awaiting it waits for
/// all of them; dropping it lets them run on detached.
#[derive(Debug, Default)]
pub struct RenderPass {
    handles: Vec<JoinHandle<()>>,
}

impl RenderPass {
    /// A pass that started nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of tasks this pass is tracking.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether this pass started nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Waits until every tracked task settles.
    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    error!(error = %err, "render pipeline panicked");
                }
            }
        }
    }
}

impl IntoFuture for RenderPass {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()>>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.settled())
    }
}

#[derive(Debug, Clone, Copy)]
struct PipelineJob {
    index: usize,
    old_distance: usize,
}

impl PlayerCore {
    /// Runs one reconciliation pass, visiting entries starting at
    /// `starting_index` (the active entry when `None`) and wrapping.
    pub(crate) fn render(self: &Rc<Self>, starting_index: Option<usize>) -> RenderPass {
        let mut pass = RenderPass::empty();

        let jobs = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let len = state.entries.len();
            if len == 0 {
                return pass;
            }
            let active = state.active;
            let start = starting_index.unwrap_or(active) % len;

            let mut jobs = Vec::new();
            for offset in 0..len {
                let index = (start + offset) % len;
                let entry = &mut state.entries[index];
                let old_distance = entry.distance;
                entry.distance = index.abs_diff(active);

                if entry.distance > 1 && entry.is_attached() {
                    Self::detach(entry);
                }
                if entry.distance <= 1 && entry.frame.is_some() {
                    if !entry.is_attached() {
                        self.attach(entry);
                    }
                    jobs.push(PipelineJob {
                        index,
                        old_distance,
                    });
                }
            }

            // The active wait must exist before any neighbor takes its gate.
            let active_loaded = state.entries[active].content_loaded;
            state.load.begin(active, active_loaded);

            jobs.into_iter()
                .map(|job| {
                    let gate = if job.index == active {
                        LoadGate::open()
                    } else {
                        state.load.gate(active_loaded)
                    };
                    (job, gate)
                })
                .collect::<Vec<_>>()
        };

        debug!(pipelines = jobs.len(), "reconciliation pass");
        for (job, gate) in jobs {
            pass.push(tokio::task::spawn_local(Rc::clone(self).pipeline(job, gate)));
        }
        pass
    }

    #[instrument(skip(self, job, gate), fields(index = job.index))]
    async fn pipeline(self: Rc<Self>, job: PipelineJob, gate: LoadGate) {
        match self.run_pipeline(job, gate).await {
            Ok(()) => {}
            Err(err) if err.is_cancellation() => {
                debug!("render pipeline superseded");
            }
            Err(err) => {
                error!(error = %err, "render pipeline failed");
            }
        }
    }

    async fn run_pipeline(&self, job: PipelineJob, gate: LoadGate) -> Result<(), PlayerError> {
        let index = job.index;
        gate.wait().await?;

        let locator = self.locator(index)?;
        let url = self.serving_url(&locator).await?;
        self.assign_source(index, &url)?;

        if self.visible.listener().wait().await.is_none() {
            return Err(PlayerError::Cancelled);
        }

        let (distance, active, playing) = {
            let state = self.state.borrow();
            let entry = state
                .entries
                .get(index)
                .ok_or_else(|| PlayerError::NotFound(locator.clone()))?;
            (entry.distance, state.active, state.playing)
        };

        if distance == 0 && playing {
            self.update_visibility(index, VisibilityState::Visible);
        } else if job.old_distance == 0 && distance == 1 {
            self.update_visibility(index, VisibilityState::Inactive);
        }

        let mut state = self.state.borrow_mut();
        state.animation.position(index, position_of(index, active));
        if distance == 0 {
            if let Some(frame) = state.entries[index].frame.as_mut() {
                frame.focus();
            }
        }
        Ok(())
    }

    fn locator(&self, index: usize) -> Result<String, PlayerError> {
        self.state
            .borrow()
            .entries
            .get(index)
            .map(|e| e.descriptor.locator.clone())
            .ok_or_else(|| PlayerError::NotFound(format!("story at index {index}")))
    }

    /// The address a story is loaded from: rewritten through the serving
    /// host when one is configured and the locator is not already on a proxy
    /// origin.
    pub(crate) async fn serving_url(&self, locator: &str) -> Result<String, PlayerError> {
        let resolver = &self.collab.resolver;
        match &self.serving_host {
            Some(host) if !resolver.is_proxy_origin(locator) => {
                resolver.serving_url(host, locator).await
            }
            _ => Ok(locator.to_owned()),
        }
    }

    fn assign_source(&self, index: usize, url: &str) -> Result<(), PlayerError> {
        let is_proxy = self.collab.resolver.is_proxy_origin(url);
        let mut state = self.state.borrow_mut();
        let Some(entry) = state.entries.get_mut(index) else {
            return Ok(());
        };
        let title = entry.descriptor.title.clone();
        let Some(frame) = entry.frame.as_mut() else {
            return Ok(());
        };
        if !frame.is_attached() {
            debug!(index, "skipping source for a detached frame");
            return Ok(());
        }
        if sources_match(url, &frame.src()) {
            return Ok(());
        }
        let location = encoded_location(url, &self.params, VisibilityState::Prerender, is_proxy)?;
        frame.set_src(&location);
        if let Some(title) = title {
            frame.set_title(&title);
        }
        debug!(index, url, "assigned story source");
        Ok(())
    }

    /// Sends a visibility change to the entry's document once connected.
    pub(crate) fn update_visibility(&self, index: usize, visibility: VisibilityState) {
        self.with_channel(index, "change visibility", move |channel| async move {
            channel.change_visibility(visibility).await
        });
    }

    /// Runs `op` against the entry's messaging channel once it is established
    /// for the current attach cycle. Failures are logged.
    pub(crate) fn with_channel<F, Fut>(&self, index: usize, what: &'static str, op: F)
    where
        F: FnOnce(Rc<MessagingChannel>) -> Fut + 'static,
        Fut: Future<Output = Result<(), PlayerError>> + 'static,
    {
        let Some(listener) = self
            .state
            .borrow()
            .entries
            .get(index)
            .map(|e| e.channel.listener())
        else {
            return;
        };
        tokio::task::spawn_local(async move {
            let Some(channel) = listener.wait().await else {
                debug!(index, what, "channel superseded before message was sent");
                return;
            };
            if let Err(err) = op(channel).await {
                error!(index, what, error = %err, "story message failed");
            }
        });
    }

    /// Applies every queued frame write.
    pub(crate) fn flush_animation(&self) -> usize {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let mut written = 0;
        for (index, write) in state.animation.drain() {
            let Some(frame) = state.entries.get_mut(index).and_then(|e| e.frame.as_mut()) else {
                continue;
            };
            if let Some(transform) = write.transform {
                frame.set_transform(&transform);
            }
            if let Some(position) = write.position {
                frame.set_position(position);
            }
            written += 1;
        }
        written
    }
}
