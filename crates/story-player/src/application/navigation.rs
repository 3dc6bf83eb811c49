//! Navigation: moving the active index, forwarding page moves, and fetching
//! more stories near the end of the sequence.

use std::rc::Rc;

use serde_json::Value;
use story_player_core::error::PlayerError;
use story_player_core::host::PlayerEvent;
use tracing::{debug, info, instrument, warn};

use super::messaging::{DocumentState, PageSelection};
use super::player::{PlayerCore, ShowOptions};
use super::render::RenderPass;
use crate::domain::location::substitute_offset;
use crate::domain::navigation::{Step, go_target, needs_more, remaining, step};

impl PlayerCore {
    pub(crate) fn next(self: &Rc<Self>) -> RenderPass {
        self.step_by(1)
    }

    pub(crate) fn previous(self: &Rc<Self>) -> RenderPass {
        self.step_by(-1)
    }

    fn step_by(self: &Rc<Self>, delta: i64) -> RenderPass {
        let (active, len) = {
            let state = self.state.borrow();
            (state.active, state.entries.len())
        };
        match step(active, delta, len, self.wraps()) {
            Step::Blocked => {
                debug!(active, delta, "no story in that direction");
                RenderPass::empty()
            }
            Step::Wrap => self
                .go(delta, 0, ShowOptions::default())
                .unwrap_or_else(|err| {
                    warn!(error = %err, "wrapping navigation failed");
                    RenderPass::empty()
                }),
            Step::To(index) => {
                self.state.borrow_mut().active = index;
                let pass = self.render(None);
                self.on_navigation();
                pass
            }
        }
    }

    /// Moves by `story_delta` stories, then forwards `page_delta` to the new
    /// active story once its pipelines settle.
    pub(crate) fn go(
        self: &Rc<Self>,
        story_delta: i64,
        page_delta: i64,
        options: ShowOptions,
    ) -> Result<RenderPass, PlayerError> {
        if story_delta == 0 && page_delta == 0 {
            return Ok(RenderPass::empty());
        }

        let (active, len) = {
            let state = self.state.borrow();
            (state.active, state.entries.len())
        };
        let target = go_target(active, story_delta, len, self.wraps())?;

        let mut pass = if target == active {
            RenderPass::empty()
        } else {
            self.switch_to(target, options)
        };

        if page_delta != 0 {
            let settle = std::mem::take(&mut pass);
            let core = Rc::clone(self);
            pass.push(tokio::task::spawn_local(async move {
                settle.settled().await;
                let active = core.state.borrow().active;
                core.with_channel(active, "select page", move |channel| async move {
                    channel.select_page(&PageSelection::Delta(page_delta)).await
                });
            }));
        }
        Ok(pass)
    }

    /// Makes the story at `locator` (or the current one) active and
    /// forwards `page_id` to it.
    #[instrument(skip(self, options))]
    pub(crate) fn show(
        self: &Rc<Self>,
        locator: Option<&str>,
        page_id: Option<&str>,
        options: ShowOptions,
    ) -> Result<RenderPass, PlayerError> {
        let index = match locator {
            Some(locator) => self
                .index_of(locator)
                .ok_or_else(|| PlayerError::NotFound(locator.to_owned()))?,
            None => {
                let state = self.state.borrow();
                if state.entries.is_empty() {
                    return Err(PlayerError::NotFound("no stories loaded".to_owned()));
                }
                state.active
            }
        };

        let mut pass = if index == self.state.borrow().active {
            RenderPass::empty()
        } else {
            self.switch_to(index, options)
        };

        if let Some(page_id) = page_id {
            let settle = std::mem::take(&mut pass);
            let selection = PageSelection::Id(page_id.to_owned());
            let core = Rc::clone(self);
            pass.push(tokio::task::spawn_local(async move {
                settle.settled().await;
                core.with_channel(index, "select page", move |channel| async move {
                    channel.select_page(&selection).await
                });
            }));
        }
        Ok(pass)
    }

    fn switch_to(self: &Rc<Self>, index: usize, options: ShowOptions) -> RenderPass {
        self.state.borrow_mut().active = index;
        let pass = self.render(None);
        if !options.animate {
            self.state.borrow_mut().suppressed_transition = Some(index);
            self.collab.surface.set_navigation_transition(false);
        }
        self.on_navigation();
        pass
    }

    fn on_navigation(self: &Rc<Self>) {
        let (index, remaining) = {
            let state = self.state.borrow();
            (state.active, remaining(state.active, state.entries.len()))
        };
        info!(index, remaining, "navigated to story");
        self.emit(PlayerEvent::Navigation { index, remaining });
        self.maybe_prefetch(remaining);
    }

    /// Fetches more stories when fetching is configured and few remain.
    pub(crate) fn maybe_prefetch(self: &Rc<Self>, remaining: usize) {
        if !self.fetch_enabled() || !needs_more(remaining) {
            return;
        }
        let Some(endpoint) = self.config.fetch_endpoint() else {
            return;
        };
        let url = {
            let mut state = self.state.borrow_mut();
            if state.fetching {
                debug!("story fetch already in flight");
                return;
            }
            state.fetching = true;
            substitute_offset(endpoint, state.entries.len())
        };
        tokio::task::spawn_local(Rc::clone(self).prefetch(url));
    }

    #[instrument(skip(self))]
    async fn prefetch(self: Rc<Self>, url: String) {
        let fetched = self.collab.fetcher.fetch(&url).await;
        self.state.borrow_mut().fetching = false;
        match fetched {
            Ok(stories) if stories.is_empty() => debug!("no more stories available"),
            Ok(stories) => {
                let count = stories.len();
                match self.append(stories) {
                    Ok(pass) => {
                        info!(count, "fetched more stories");
                        drop(pass);
                    }
                    Err(err) => warn!(error = %err, "fetched stories were malformed"),
                }
            }
            Err(err) => warn!(error = %err, "failed fetching more stories"),
        }
    }

    /// Rewinds the story at `locator` once it is connected.
    pub(crate) fn rewind(self: &Rc<Self>, locator: &str) -> Result<(), PlayerError> {
        let index = self
            .index_of(locator)
            .ok_or_else(|| PlayerError::NotFound(locator.to_owned()))?;
        let connected = self.state.borrow().entries[index].connected.listener();
        let core = Rc::clone(self);
        tokio::task::spawn_local(async move {
            if connected.wait().await.is_none() {
                return;
            }
            core.with_channel(index, "rewind", |channel| async move { channel.rewind().await });
        });
        Ok(())
    }

    /// Asks the active story whether a page attachment is open and reports
    /// the answer to the host.
    pub(crate) fn query_page_attachment(self: &Rc<Self>) {
        let active = self.state.borrow().active;
        let core = Rc::clone(self);
        self.with_channel(active, "get page attachment state", move |channel| async move {
            let open = channel.get_state(DocumentState::PageAttachment).await?;
            core.emit(if open == Value::Bool(true) {
                PlayerEvent::PageAttachmentOpen
            } else {
                PlayerEvent::PageAttachmentClose
            });
            Ok::<(), PlayerError>(())
        });
    }
}
