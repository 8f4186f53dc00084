use std::time::Duration;
use tracing::trace;

use crate::domain::{DTConfig, DTError, Message};
use crate::model::Model;
use crate::record::SortKey;
use ratatui::crossterm::event::{self, Event, KeyCode, MouseButton, MouseEventKind};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DTConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DTError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(self.map_event(model, event::read()?));
        }
        Ok(None)
    }

    pub fn map_event(&self, model: &Model, input: Event) -> Option<Message> {
        match input {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                Some(Message::Click(mouse.column, mouse.row))
            }
            Event::Resize(width, height) => Some(Message::Resize(width, height)),
            _ => None,
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('/') | KeyCode::Char('s') => Some(Message::EnterSearch),
            KeyCode::Char('r') => Some(Message::NextRole),
            KeyCode::Char('R') => Some(Message::PreviousRole),
            KeyCode::Char('1') => Some(Message::Sort(SortKey::Id)),
            KeyCode::Char('2') => Some(Message::Sort(SortKey::Name)),
            KeyCode::Char('3') => Some(Message::Sort(SortKey::Age)),
            KeyCode::Char('4') => Some(Message::Sort(SortKey::Role)),
            KeyCode::Right | KeyCode::Char('n') | KeyCode::Char('l') => Some(Message::NextPage),
            KeyCode::Left | KeyCode::Char('p') | KeyCode::Char('h') => {
                Some(Message::PreviousPage)
            }
            KeyCode::Char('g') => Some(Message::FirstPage),
            KeyCode::Char('G') => Some(Message::LastPage),
            KeyCode::Char('y') => Some(Message::CopyPage),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
