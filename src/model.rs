use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use std::time::Instant;
use tracing::{error, info, trace};

use crate::domain::{DTError, HELP_TEXT, Message};
use crate::inputter::{InputResult, Inputter};
use crate::record::{Record, Role, SortKey};
use crate::source::RecordSource;
use crate::table::TableState;
use crate::ui::{Target, hit_test};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// Everything the ui needs to draw a frame.
pub struct UIData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<[String; 4]>,
    pub filtered: usize,
    pub total: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub can_prev: bool,
    pub can_next: bool,
    pub role_label: String,
    pub search: InputResult,
    pub active_cmdinput: bool,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
}

pub struct Model {
    name: String,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: TableState,
    total_records: usize,
    area: Rect,
    uidata: UIData,
    clipboard: Option<Clipboard>, // Created on first copy
    input: Inputter,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
}

impl Model {
    pub fn init(source: &dyn RecordSource, ui_width: u16, ui_height: u16) -> Result<Self, DTError> {
        let start_time = Instant::now();
        let records = source.load()?;
        info!(
            "Loaded {} records from {} in {}ms",
            records.len(),
            source.name(),
            start_time.elapsed().as_millis()
        );

        let total_records = records.len();
        let mut model = Self {
            name: source.name(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            total_records,
            table: TableState::new(records),
            area: Rect::new(0, 0, ui_width, ui_height),
            uidata: Self::empty_uidata(),
            clipboard: None,
            input: Inputter::default(),
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: format!("Loaded {total_records} records"),
        };
        model.update_uidata();
        Ok(model)
    }

    fn empty_uidata() -> UIData {
        UIData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            filtered: 0,
            total: 0,
            current_page: 1,
            total_pages: 0,
            can_prev: false,
            can_next: false,
            role_label: String::new(),
            search: InputResult::default(),
            active_cmdinput: false,
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
        }
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    #[cfg(test)]
    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn update_uidata(&mut self) {
        let page = self.table.page();
        let sort = self.table.sort();
        let headers = SortKey::ALL
            .iter()
            .map(|&key| match sort {
                Some((sort_key, direction)) if sort_key == key => {
                    format!("{} {}", key.header(), direction.glyph())
                }
                _ => key.header().to_string(),
            })
            .collect();

        let search = if self.active_cmdinput {
            self.last_input.clone()
        } else {
            InputResult {
                input: self.table.search().to_string(),
                ..InputResult::default()
            }
        };

        self.uidata = UIData {
            name: self.name.clone(),
            headers,
            rows: page.rows.iter().map(Record::fields).collect(),
            filtered: page.filtered,
            total: self.total_records,
            current_page: page.current_page,
            total_pages: page.total_pages,
            can_prev: page.can_prev,
            can_next: page.can_next,
            role_label: Self::role_label(self.table.role_filter()),
            search,
            active_cmdinput: self.active_cmdinput,
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            status_message: self.status_message.clone(),
        };
    }

    fn role_label(role: Option<Role>) -> String {
        role.map(|r| r.to_string())
            .unwrap_or_else(|| "All Roles".to_string())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DTError> {
        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::EnterSearch => self.enter_cmd_mode(),
                    Message::NextRole => self.cycle_role(true),
                    Message::PreviousRole => self.cycle_role(false),
                    Message::Sort(key) => self.sort(key),
                    Message::NextPage => self.table.next_page(),
                    Message::PreviousPage => self.table.prev_page(),
                    Message::FirstPage => self.table.first_page(),
                    Message::LastPage => self.table.last_page(),
                    Message::CopyPage => self.copy_page(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Click(column, row) => self.click(column, row),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::CMDINPUT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Click(column, row) => {
                        // Clicking anywhere else keeps the search and leaves the box
                        if hit_test(self.area, column, row) != Some(Target::SearchBox) {
                            self.leave_cmd_mode();
                            self.click(column, row);
                        }
                    }
                    _ => (),
                },
            }
        }

        self.update_uidata();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.area.width, width, self.area.height, height
        );
        self.area = Rect::new(0, 0, width, height);
    }

    fn click(&mut self, column: u16, row: u16) {
        let target = hit_test(self.area, column, row);
        trace!("Click at {}:{} => {:?}", column, row, target);
        match target {
            Some(Target::SearchBox) => self.enter_cmd_mode(),
            Some(Target::RoleSelector) => self.cycle_role(true),
            Some(Target::Header(key)) => self.sort(key),
            Some(Target::Prev) => self.table.prev_page(),
            Some(Target::Next) => self.table.next_page(),
            None => {}
        }
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn cycle_role(&mut self, forward: bool) {
        let role = Role::cycle(self.table.role_filter(), forward);
        self.table.set_role_filter(role);
        self.set_status_message(format!("Showing {}", Self::role_label(role)));
    }

    fn sort(&mut self, key: SortKey) {
        self.table.toggle_sort(key);
        match self.table.sort() {
            Some((key, direction)) => {
                self.set_status_message(format!("Sorted by {} {}", key.header(), direction.glyph()))
            }
            None => self.set_status_message("Original order"),
        }
    }

    fn enter_cmd_mode(&mut self) {
        trace!("Entering search input ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.active_cmdinput = true;
        self.input.set(self.table.search());
        self.last_input = self.input.get();
    }

    fn leave_cmd_mode(&mut self) {
        trace!("Leaving search input with \"{}\"", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = Modus::TABLE;
        self.previous_modus = Modus::CMDINPUT;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.input != self.table.search() {
                self.table.set_search(&self.last_input.input);
            }
            if self.last_input.finished {
                self.leave_cmd_mode();
            }
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace("\"", "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    /// The visible page as csv, including a header line.
    pub fn page_as_csv(&self) -> String {
        let header = SortKey::ALL
            .iter()
            .map(|k| k.header().to_lowercase())
            .collect::<Vec<String>>()
            .join(",");
        let page = self.table.page();
        let rows = page.rows.iter().map(|r| {
            r.fields()
                .iter()
                .map(|f| Model::wrap_cell_content(f))
                .collect::<Vec<String>>()
                .join(",")
        });
        std::iter::once(header)
            .chain(rows)
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn copy_page(&mut self) {
        let content = self.page_as_csv();
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    error!("Could not open clipboard: {:?}", e);
                    self.set_status_message("Clipboard not available!");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => {
                    trace!("Copied page to clipboard.");
                    let rows = self.uidata.rows.len();
                    self.set_status_message(format!("Copied {rows} rows"));
                }
                Err(e) => {
                    error!("Error copying to clipboard: {:?}", e);
                    self.set_status_message("Copy failed!");
                }
            }
        }
    }
}
