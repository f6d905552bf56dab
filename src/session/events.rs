// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Change notifications emitted by the session.

use std::sync::mpsc::{self, Receiver, Sender};

use super::{AppMode, ExamSummary, PracticeState, QuestionState};
use crate::music::Pitch;

/// Something observers may want to re-render
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Keys whose display may have changed
    KeysChanged(Vec<Pitch>),
    /// A new scale was selected (by name)
    ScaleSelected(String),
    ModeChanged(AppMode),
    QuestionStateChanged(QuestionState),
    PracticeStateChanged(PracticeState),
    /// An exam attempt ended with this result
    ExamFinished(ExamSummary),
    /// Attempt state was cleared
    Reset,
}

/// Fan-out of session events to any number of subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<SessionEvent>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send an event to every live subscriber, dropping closed ones
    pub fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
