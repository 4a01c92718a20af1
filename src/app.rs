use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::AppEvent;
use crate::gateway::gate::{GateStatus, GenerationGate};
use crate::gateway::{
    GenerationError, GenerationRequest, SnippetGenerator, generated_snippet,
};
use crate::session::buffer::Edit;
use crate::session::navigation::Mode;
use crate::session::practice::Practice;
use crate::snippet::Language;
use crate::snippet::store::SnippetStore;
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// Which pane receives keystrokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Editor,
    History,
    Generate,
}

/// Field of the generate form under the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerateField {
    Language,
    Topic,
}

pub struct App {
    pub practice: Practice,
    pub theme: &'static Theme,
    pub config: Config,
    pub focus: Focus,
    pub generate_field: GenerateField,
    pub language_index: usize,
    pub topic: LineInput,
    pub gate: GenerationGate,
    pub generate_error: Option<String>,
    pub history_selected: usize,
    /// One-line status shown in the header, e.g. after a completion.
    pub notice: Option<String>,
    pub should_quit: bool,
    generator: Arc<dyn SnippetGenerator>,
    events: mpsc::Sender<AppEvent>,
}

impl App {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        store: SnippetStore,
        generator: Arc<dyn SnippetGenerator>,
        events: mpsc::Sender<AppEvent>,
    ) -> Self {
        let language_index = Language::CHOICES
            .iter()
            .position(|&l| l == config.language())
            .unwrap_or(0);
        let topic = LineInput::new(&config.default_topic);
        let gate = GenerationGate::new(config.cooldown());

        Self {
            practice: Practice::new(store),
            theme,
            config,
            focus: Focus::Editor,
            generate_field: GenerateField::Topic,
            language_index,
            topic,
            gate,
            generate_error: None,
            history_selected: 0,
            notice: None,
            should_quit: false,
            generator,
            events,
        }
    }

    pub fn selected_language(&self) -> Language {
        Language::CHOICES[self.language_index % Language::CHOICES.len()]
    }

    pub fn cycle_language(&mut self, forward: bool) {
        let n = Language::CHOICES.len();
        self.language_index = if forward {
            (self.language_index + 1) % n
        } else {
            (self.language_index + n - 1) % n
        };
    }

    pub fn gate_status(&self) -> GateStatus {
        self.gate.status(Instant::now())
    }

    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.gate.remaining(Instant::now())
    }

    // --- editor ---

    pub fn edit(&mut self, edit: Edit) {
        if let Some(done) = self.practice.edit(&edit) {
            let title = self.practice.current_snippet().title().to_string();
            info!(snippet_id = %done.snippet_id, index = done.index, "completed snippet");
            self.notice = Some(format!("✓ Complete! {title}"));
        }
    }

    pub fn next_snippet(&mut self) -> bool {
        let moved = self.practice.advance();
        if moved {
            self.notice = None;
        }
        moved
    }

    pub fn previous_snippet(&mut self) -> bool {
        let moved = self.practice.retreat();
        if moved {
            self.notice = None;
        }
        moved
    }

    // --- history ---

    pub fn open_history(&mut self) {
        self.history_selected = self.practice.navigator().active();
        self.focus = Focus::History;
    }

    pub fn history_move(&mut self, down: bool) {
        let last = self.practice.navigator().current();
        self.history_selected = if down {
            (self.history_selected + 1).min(last)
        } else {
            self.history_selected.saturating_sub(1)
        };
    }

    /// Open the highlighted history entry read-only.
    pub fn view_selected_history(&mut self) -> bool {
        let viewed = self.practice.select_history(self.history_selected);
        if viewed {
            self.focus = Focus::Editor;
        }
        viewed
    }

    pub fn return_to_practice(&mut self) -> bool {
        let returned = self.practice.return_to_practice();
        self.focus = Focus::Editor;
        returned
    }

    pub fn is_reviewing(&self) -> bool {
        matches!(self.practice.mode(), Mode::Reviewing(_))
    }

    // --- generation ---

    pub fn open_generate_form(&mut self) {
        self.focus = Focus::Generate;
        self.generate_field = GenerateField::Topic;
    }

    /// Kick off a generation on a worker thread. Throttled submissions are
    /// dropped silently and return `false`.
    pub fn submit_generation(&mut self, now: Instant) -> bool {
        if let Err(reason) = self.gate.try_begin(now) {
            debug!(?reason, "generation throttled");
            return false;
        }
        self.generate_error = None;

        let request = GenerationRequest::new(self.selected_language(), self.topic.value());
        info!(language = %request.language, topic = %request.topic, "generating snippet");

        let generator = Arc::clone(&self.generator);
        let tx = self.events.clone();
        thread::spawn(move || {
            let result = generator.generate(&request);
            // The loop may already be gone on quit; nothing to do then.
            let _ = tx.send(AppEvent::Generated { request, result });
        });
        true
    }

    /// Apply a finished generation. Failures leave practice state untouched.
    pub fn on_generated(
        &mut self,
        request: GenerationRequest,
        result: Result<String, GenerationError>,
        now: Instant,
    ) {
        self.gate.finish(now);
        match result {
            Ok(code) => {
                let id = self.practice.store().generated_id();
                let snippet = generated_snippet(id, &request, code);
                let index = self.practice.append_generated(snippet);
                info!(index, "generated snippet appended");
                self.history_selected = index;
                self.notice = None;
                self.focus = Focus::Editor;
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.generate_error = Some(e.display_message());
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.gate.reset();
    }
}
