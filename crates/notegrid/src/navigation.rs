//! Back-stack navigation with special-cased re-entry for the transient
//! result view.
//!
//! The result screen is a dead-end overlay, not a stack frame: entering it
//! records where the user came from, and going back jumps straight there as
//! a stack replace.

use crate::types::View;

/// Options for one navigation step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigateOptions {
    /// Pop the stack top before pushing, leaving no trail behind.
    pub replace_history: bool,
    /// Where `go_back` should land after the result view. Defaults to the
    /// view being navigated away from.
    pub entry_source: Option<View>,
}

/// Visibility of one screen in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenFlag {
    pub view: View,
    pub active: bool,
    /// Inactive screens are hidden from assistive tooling.
    pub aria_hidden: bool,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    current: View,
    previous: Option<View>,
    /// Return target for the result dead-end, tracked outside the stack.
    entry: Option<View>,
    /// Never empty; the top matches `current`.
    history: Vec<View>,
}

impl NavigationState {
    pub fn new(boot: View) -> Self {
        Self {
            current: boot,
            previous: None,
            entry: None,
            history: vec![boot],
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn previous(&self) -> Option<View> {
        self.previous
    }

    pub fn entry(&self) -> Option<View> {
        self.entry
    }

    pub fn history(&self) -> &[View] {
        &self.history
    }

    /// Switch the active view. Returns true when the step left the team
    /// view, the caller's cue to close team modal overlays.
    pub fn navigate_to(&mut self, target: View, options: NavigateOptions) -> bool {
        if options.replace_history && !self.history.is_empty() {
            self.history.pop();
        }
        if target == self.current && !options.replace_history {
            return false;
        }

        let from = self.current;
        self.previous = Some(from);
        self.current = target;

        if target == View::Result {
            self.entry = Some(options.entry_source.unwrap_or(from));
        }
        if self.history.last() != Some(&target) {
            self.history.push(target);
        }

        from == View::Team && target != View::Team
    }

    /// Step back. From the result view this jumps straight to the recorded
    /// entry view as a stack replace; home is terminal. Returns true when
    /// the step left the team view.
    pub fn go_back(&mut self) -> bool {
        if self.current == View::Result {
            let destination = self.entry.take().unwrap_or(View::Home);
            return self.navigate_to(
                destination,
                NavigateOptions {
                    replace_history: true,
                    entry_source: None,
                },
            );
        }
        if self.current == View::Home {
            return false;
        }
        if self.history.len() > 1 {
            self.history.pop();
            if let Some(&top) = self.history.last() {
                self.current = top;
                self.previous = if self.history.len() >= 2 {
                    Some(self.history[self.history.len() - 2])
                } else {
                    None
                };
            }
        }
        false
    }

    /// Project the active view onto per-screen flags: exactly one active,
    /// the rest hidden.
    pub fn screen_flags(&self) -> Vec<ScreenFlag> {
        View::all()
            .iter()
            .map(|&view| ScreenFlag {
                view,
                active: view == self.current,
                aria_hidden: view != self.current,
            })
            .collect()
    }
}
