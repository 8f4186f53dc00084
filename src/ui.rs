use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Row, Table, Wrap},
};

use crate::model::{Model, UIData};
use crate::record::SortKey;

pub const CONTROLS_HEIGHT: u16 = 3;
pub const PAGER_HEIGHT: u16 = 3;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const ROLE_SELECTOR_WIDTH: u16 = 22;
pub const PAGER_BUTTON_WIDTH: u16 = 10;

const HEADER_BG: Color = Color::Blue;
const ROW_BG_EVEN: Color = Color::Rgb(40, 40, 40);
const DISABLED: Color = Color::DarkGray;

/// Screen regions, shared by drawing and mouse hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLayout {
    pub search: Rect,
    pub role: Rect,
    pub table: Rect,
    pub header: Rect,
    pub body: Rect,
    pub prev: Rect,
    pub page: Rect,
    pub next: Rect,
    pub status: Rect,
}

/// Interactive element under a mouse click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    SearchBox,
    RoleSelector,
    Header(SortKey),
    Prev,
    Next,
}

fn outer_block() -> Block<'static> {
    let instructions = Line::from(vec![
        " Search ".into(),
        "</>".blue().bold(),
        " Role ".into(),
        "<R>".blue().bold(),
        " Sort ".into(),
        "<1-4>".blue().bold(),
        " Page ".into(),
        "<←/→>".blue().bold(),
        " Help ".into(),
        "<?>".blue().bold(),
        " Quit ".into(),
        "<Q> ".blue().bold(),
    ]);
    Block::bordered()
        .title_bottom(instructions.centered())
        .border_set(border::THICK)
}

fn column_constraints() -> [Constraint; 4] {
    [Constraint::Ratio(1, 4); 4]
}

impl ScreenLayout {
    pub fn new(area: Rect) -> Self {
        let inner = outer_block().inner(area);
        let [controls, table, pager, status] = Layout::vertical([
            Constraint::Length(CONTROLS_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(inner);

        let [search, _, role] = Layout::horizontal([
            Constraint::Percentage(60),
            Constraint::Min(0),
            Constraint::Length(ROLE_SELECTOR_WIDTH),
        ])
        .areas(controls);

        let table_inner = Block::bordered().inner(table);
        let [header, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(table_inner);

        let [prev, page, next] = Layout::horizontal([
            Constraint::Length(PAGER_BUTTON_WIDTH),
            Constraint::Min(0),
            Constraint::Length(PAGER_BUTTON_WIDTH),
        ])
        .areas(pager);

        Self {
            search,
            role,
            table,
            header,
            body,
            prev,
            page,
            next,
            status,
        }
    }

    pub fn header_cells(&self) -> [Rect; 4] {
        Layout::horizontal(column_constraints()).areas(self.header)
    }
}

pub fn hit_test(area: Rect, column: u16, row: u16) -> Option<Target> {
    let layout = ScreenLayout::new(area);
    let pos = Position::new(column, row);
    if layout.search.contains(pos) {
        Some(Target::SearchBox)
    } else if layout.role.contains(pos) {
        Some(Target::RoleSelector)
    } else if layout.prev.contains(pos) {
        Some(Target::Prev)
    } else if layout.next.contains(pos) {
        Some(Target::Next)
    } else {
        layout
            .header_cells()
            .iter()
            .position(|cell| cell.contains(pos))
            .map(|idx| Target::Header(SortKey::ALL[idx]))
    }
}

pub fn draw(model: &Model, frame: &mut Frame) {
    let uidata = model.get_uidata();
    let area = frame.area();
    let layout = ScreenLayout::new(area);

    let title = Line::from(format!(" Data table [{}] ", uidata.name).bold());
    frame.render_widget(outer_block().title(title.centered()), area);

    draw_search(uidata, &layout, frame);
    draw_role_selector(uidata, &layout, frame);
    draw_table(uidata, &layout, frame);
    draw_pager(uidata, &layout, frame);
    draw_statusline(uidata, &layout, frame);

    if uidata.show_popup {
        draw_popup(uidata, area, frame);
    }
}

fn draw_search(uidata: &UIData, layout: &ScreenLayout, frame: &mut Frame) {
    let border_style = if uidata.active_cmdinput {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::bordered().title(" Search ").border_style(border_style);
    let text = if uidata.search.input.is_empty() && !uidata.active_cmdinput {
        Line::from("Search...".fg(DISABLED))
    } else {
        Line::from(uidata.search.input.as_str())
    };
    let inner = block.inner(layout.search);
    frame.render_widget(Paragraph::new(text).block(block), layout.search);

    if uidata.active_cmdinput {
        let offset = cursor_offset(&uidata.search.input, uidata.search.curser_pos, inner.width);
        frame.set_cursor_position(Position::new(inner.x + offset, inner.y));
    }
}

/// Display columns in front of the cursor, kept inside a box `width` wide.
fn cursor_offset(input: &str, curser_pos: usize, width: u16) -> u16 {
    let before: String = input.chars().take(curser_pos).collect();
    let columns = Line::from(before).width();
    std::cmp::min(columns, (width as usize).saturating_sub(1)) as u16
}

fn draw_role_selector(uidata: &UIData, layout: &ScreenLayout, frame: &mut Frame) {
    let line = Line::from(vec![
        "◀ ".fg(DISABLED),
        Span::from(uidata.role_label.as_str()).bold(),
        " ▶".fg(DISABLED),
    ]);
    frame.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .block(Block::bordered().title(" Role ")),
        layout.role,
    );
}

fn draw_table(uidata: &UIData, layout: &ScreenLayout, frame: &mut Frame) {
    let header = Row::new(uidata.headers.iter().map(|h| h.as_str()))
        .style(Style::default().fg(Color::White).bg(HEADER_BG).bold());

    let rows = uidata.rows.iter().enumerate().map(|(idx, row)| {
        let style = if idx % 2 == 0 {
            Style::default().bg(ROW_BG_EVEN)
        } else {
            Style::default()
        };
        Row::new(row.iter().map(|c| c.as_str())).style(style)
    });

    let table = Table::new(rows, column_constraints())
        .header(header)
        .column_spacing(0)
        .block(Block::bordered());
    frame.render_widget(table, layout.table);

    if uidata.rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No results found")
                .alignment(Alignment::Center)
                .fg(Color::Gray),
            layout.body,
        );
    }
}

fn button(label: &str, enabled: bool) -> Paragraph<'_> {
    let style = if enabled {
        Style::default().fg(Color::White).bg(HEADER_BG).bold()
    } else {
        Style::default().fg(DISABLED)
    };
    Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::bordered().border_style(style))
}

fn draw_pager(uidata: &UIData, layout: &ScreenLayout, frame: &mut Frame) {
    frame.render_widget(button("Prev", uidata.can_prev), layout.prev);
    frame.render_widget(button("Next", uidata.can_next), layout.next);

    let [label] = Layout::vertical([Constraint::Length(1)])
        .flex(Flex::Center)
        .areas(layout.page);
    frame.render_widget(
        Paragraph::new(format!(
            "Page {} of {}",
            uidata.current_page, uidata.total_pages
        ))
        .alignment(Alignment::Center)
        .add_modifier(Modifier::BOLD),
        label,
    );
}

fn draw_statusline(uidata: &UIData, layout: &ScreenLayout, frame: &mut Frame) {
    let counts = format!("{} of {} records ", uidata.filtered, uidata.total);
    let [message, count] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(counts.chars().count() as u16),
    ])
    .areas(layout.status);
    frame.render_widget(Paragraph::new(uidata.status_message.as_str()), message);
    frame.render_widget(Paragraph::new(counts).fg(DISABLED), count);
}

fn draw_popup(uidata: &UIData, area: Rect, frame: &mut Frame) {
    let [popup] = Layout::vertical([Constraint::Percentage(80)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(56)])
        .flex(Flex::Center)
        .areas(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(uidata.popup_message.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title(" Help ".bold())
                    .title_bottom(Line::from(" <Esc> close ").centered())
                    .border_set(border::DOUBLE),
            ),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::source::SampleRecords;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    const WIDTH: u16 = 80;
    const HEIGHT: u16 = 24;

    fn render(model: &Model) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(WIDTH, HEIGHT)).unwrap();
        terminal.draw(|f| draw(model, f)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn screen_text(buf: &Buffer) -> String {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn model() -> Model {
        Model::init(&SampleRecords, WIDTH, HEIGHT).unwrap()
    }

    #[test]
    fn renders_first_page() {
        let text = screen_text(&render(&model()));
        assert!(text.contains("John Doe"));
        assert!(text.contains("Jane Smith"));
        assert!(text.contains("Charlie"));
        assert!(!text.contains("David"));
        assert!(text.contains("Page 1 of 3"));
        assert!(text.contains("All Roles"));
        assert!(text.contains("Search..."));
    }

    #[test]
    fn renders_sort_glyph() {
        let mut model = model();
        model.update(Some(Message::Sort(SortKey::Age))).unwrap();
        let text = screen_text(&render(&model));
        assert!(text.contains("Age ↑"));
        model.update(Some(Message::Sort(SortKey::Age))).unwrap();
        let text = screen_text(&render(&model));
        assert!(text.contains("Age ↓"));
        assert!(text.contains("David"));
    }

    #[test]
    fn renders_placeholder_when_empty() {
        let mut model = model();
        model.update(Some(Message::EnterSearch)).unwrap();
        for c in "nobody".chars() {
            model
                .update(Some(Message::RawKey(ratatui::crossterm::event::KeyEvent::from(
                    ratatui::crossterm::event::KeyCode::Char(c),
                ))))
                .unwrap();
        }
        let text = screen_text(&render(&model));
        assert!(text.contains("No results found"));
        assert!(text.contains("Page 1 of 0"));
    }

    #[test]
    fn renders_help_popup() {
        let mut model = model();
        model.update(Some(Message::Help)).unwrap();
        let text = screen_text(&render(&model));
        assert!(text.contains("Help"));
        assert!(text.contains("first / last page"));
    }

    #[test]
    fn cursor_stays_in_search_box() {
        assert_eq!(cursor_offset("jane", 2, 20), 2);
        assert_eq!(cursor_offset("名前", 2, 20), 4);
        let long = "x".repeat(70_000);
        assert_eq!(cursor_offset(&long, 70_000, 20), 19);
        assert_eq!(cursor_offset("", 0, 0), 0);
    }

    #[test]
    fn renders_long_search_without_panicking() {
        let mut model = model();
        model.update(Some(Message::EnterSearch)).unwrap();
        for _ in 0..200 {
            model
                .update(Some(Message::RawKey(ratatui::crossterm::event::KeyEvent::from(
                    ratatui::crossterm::event::KeyCode::Char('x'),
                ))))
                .unwrap();
        }
        let text = screen_text(&render(&model));
        assert!(text.contains("No results found"));
    }

    #[test]
    fn hit_test_matches_layout() {
        let area = Rect::new(0, 0, WIDTH, HEIGHT);
        let layout = ScreenLayout::new(area);

        assert_eq!(
            hit_test(area, layout.search.x + 1, layout.search.y + 1),
            Some(Target::SearchBox)
        );
        assert_eq!(
            hit_test(area, layout.role.x + 1, layout.role.y + 1),
            Some(Target::RoleSelector)
        );
        assert_eq!(
            hit_test(area, layout.prev.x + 1, layout.prev.y + 1),
            Some(Target::Prev)
        );
        assert_eq!(
            hit_test(area, layout.next.x + 1, layout.next.y + 1),
            Some(Target::Next)
        );
        for (cell, key) in layout.header_cells().iter().zip(SortKey::ALL) {
            assert_eq!(hit_test(area, cell.x, cell.y), Some(Target::Header(key)));
        }
        assert_eq!(hit_test(area, layout.body.x, layout.body.y), None);
        assert_eq!(hit_test(area, 0, 0), None);
    }
}
