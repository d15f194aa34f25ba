//! Loading gate timing for the splash screen
//!
//! The room is only mounted once the gate has been started, and the gate can
//! only be started after the ready delay has elapsed.

use crate::config::LoadingConfig;

/// What the splash screen should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// Still "loading": show the rotating message at this index
    Preparing { message_index: usize },
    /// Ready: show the ready title and the enter button
    Ready,
    Started,
}

#[derive(Debug, Clone)]
pub struct LoadingGate {
    messages: Vec<String>,
    ready_title: String,
    message_secs: f32,
    ready_secs: f32,
    elapsed: f32,
    started: bool,
}

impl LoadingGate {
    pub fn new(config: &LoadingConfig) -> Self {
        Self {
            messages: config.messages.clone(),
            ready_title: config.ready_title.clone(),
            message_secs: config.message_secs.max(f32::EPSILON),
            ready_secs: config.ready_secs.max(0.0),
            elapsed: 0.0,
            started: false,
        }
    }

    pub fn tick(&mut self, delta_secs: f32) {
        self.elapsed += delta_secs.max(0.0);
    }

    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.ready_secs
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Press the enter button; returns whether the gate opened
    pub fn start(&mut self) -> bool {
        if self.is_ready() {
            self.started = true;
        }
        self.started
    }

    pub fn phase(&self) -> GatePhase {
        if self.started {
            GatePhase::Started
        } else if self.is_ready() {
            GatePhase::Ready
        } else {
            let count = self.messages.len().max(1);
            let step = (self.elapsed / self.message_secs) as usize;
            GatePhase::Preparing {
                message_index: step % count,
            }
        }
    }

    /// Headline text for the current phase
    pub fn headline(&self) -> &str {
        match self.phase() {
            GatePhase::Preparing { message_index } => self
                .messages
                .get(message_index)
                .map(String::as_str)
                .unwrap_or(""),
            GatePhase::Ready | GatePhase::Started => &self.ready_title,
        }
    }
}
