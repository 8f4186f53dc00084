use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Line editor behind the search box.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize, // In chars, not bytes
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => self.enter(),
            (KeyCode::Esc, KeyModifiers::NONE) => self.escape(),
            (KeyCode::Backspace, KeyModifiers::NONE) => self.backspace(),
            (KeyCode::Delete, KeyModifiers::NONE) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Home, KeyModifiers::NONE) => self.home(),
            (KeyCode::End, KeyModifiers::NONE) => self.end(),
            (kc, km) => self.key(kc, km),
        }
    }

    /// Start editing `s` with the cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.clear();
        self.current_input = s.to_string();
        self.curser_pos = s.chars().count();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.current_input.remove(self.getbytepos());
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.current_input.remove(self.getbytepos());
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        if modifier.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            trace!("Ignoring {code:?} with {modifier:?}");
        } else if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
