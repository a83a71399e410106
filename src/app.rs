use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::dial::state::StateKind;
use crate::dial::{NavigationDial, ProgressWrite};
use crate::event::{DriveCommand, Event};

// ── Application State ─────────────────────────────────────────────────

pub struct App {
    pub dial: NavigationDial,
    pub should_quit: bool,
    pub show_help_bar: bool,

    /// Simulated host visibility ('v' toggles it, like covering the widget).
    pub visible: bool,

    /// Outcome of the last direct progress write, shown in the header.
    pub last_write: Option<ProgressWrite>,

    started: Instant,
}

impl App {
    pub fn new(mut dial: NavigationDial) -> Self {
        // Attach to the host surface: resume the default state's animations.
        dial.on_visible();
        Self {
            dial,
            should_quit: false,
            show_help_bar: true,
            visible: true,
            last_write: None,
            started: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Tick => self.on_tick(),
            Event::Resize(_, _) => {
                // The next draw picks the new area up; nothing to do here.
            }
            Event::Drive(cmd) => self.handle_drive(cmd),
        }
    }

    fn on_tick(&mut self) {
        self.dial.advance(self.started.elapsed());
    }

    fn handle_drive(&mut self, cmd: DriveCommand) {
        debug!(?cmd, "tour command");
        match cmd {
            DriveCommand::SetProgress(value) => {
                self.last_write = Some(self.dial.try_set_progress(value));
            }
            DriveCommand::SmoothProgress(target) => self.dial.smoothly_set_progress(target),
            DriveCommand::Nearby(nearby) => self.dial.set_nearby_state(nearby),
        }
    }

    /// Handle a key event, dispatching to the dial's control surface
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help_bar = !self.show_help_bar,

            // Smooth targets
            KeyCode::Left | KeyCode::Char('h') => {
                let target = (self.dial.target_progress() - 0.1).clamp(0.0, 1.0);
                self.dial.smoothly_set_progress(target);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let target = (self.dial.target_progress() + 0.1).clamp(0.0, 1.0);
                self.dial.smoothly_set_progress(target);
            }
            KeyCode::Char('g') => self.dial.smoothly_set_progress(1.0),
            KeyCode::Char('r') => self.dial.smoothly_set_progress(0.0),
            KeyCode::Char('s') => self.dial.cancel_smooth_progress(),

            // Direct writes (show the guarded/rejected outcomes)
            KeyCode::Up | KeyCode::Char('k') => {
                let value = (self.dial.progress() + 0.01).min(1.0);
                self.last_write = Some(self.dial.try_set_progress(value));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let value = (self.dial.progress() - 0.01).max(0.0);
                self.last_write = Some(self.dial.try_set_progress(value));
            }

            // Digit: smooth to n/10
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let target = c.to_digit(10).unwrap_or(0) as f32 / 10.0;
                self.dial.smoothly_set_progress(target);
            }

            KeyCode::Char('n') => {
                let nearby = self.dial.state() != StateKind::Nearby;
                self.dial.set_nearby_state(nearby);
            }

            KeyCode::Char('v') => {
                if self.visible {
                    self.dial.on_hidden();
                } else {
                    self.dial.on_visible();
                }
                self.visible = !self.visible;
            }

            _ => {}
        }
    }
}
