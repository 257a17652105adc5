use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::domain::CMDMode;
use crate::model::UIData;
use crate::sort::SortDirection;

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const FILTER_LINE_HEIGHT: u16 = 1;
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(15);

/// Renders the read-only UIData snapshot. Never mutates model state.
#[derive(Default)]
pub struct JobsUI;

impl JobsUI {
    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let [title_area, filter_area, table_area, footer_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(FILTER_LINE_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_title(uidata, title_area, frame);
        self.draw_filter_line(uidata, filter_area, frame);
        if uidata.no_data_to_show {
            self.draw_empty_state(uidata, table_area, frame);
        } else {
            self.draw_table(uidata, table_area, frame);
        }
        self.draw_footer(uidata, footer_area, frame);
        self.draw_status_line(uidata, status_area, frame);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_title(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let title = Line::from(format!(" jobtv [{}] ", uidata.name).bold());
        frame.render_widget(Paragraph::new(title).centered(), area);
    }

    fn draw_filter_line(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let mut spans: Vec<Span> = Vec::new();
        for filter in uidata.filters.iter() {
            let shown = if filter.value.is_empty() {
                "·".to_string()
            } else {
                filter.value.clone()
            };
            let mut style = Style::default();
            if filter.disabled {
                style = style.add_modifier(Modifier::DIM);
            }
            spans.push(Span::styled(format!(" {}: ", filter.label), style.bold()));
            spans.push(Span::styled(shown, style));
            if filter.show_clear {
                spans.push(Span::styled(" ✕", style.fg(Color::Red)));
            }
            spans.push(Span::raw("  "));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let header = Row::new(
            uidata
                .columns
                .iter()
                .map(|column| {
                    let indicator = match column.sort {
                        Some(SortDirection::Asc) => " ▲",
                        Some(SortDirection::Desc) => " ▼",
                        None => "",
                    };
                    let mut style = Style::default().add_modifier(Modifier::BOLD);
                    if column.selected {
                        style = style.fg(Color::Yellow);
                    }
                    Cell::from(format!("{}{indicator}", column.title)).style(style)
                })
                .collect::<Vec<Cell>>(),
        )
        .height(TABLE_HEADER_HEIGHT);

        let rows = uidata
            .rows
            .iter()
            .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.as_str()))));

        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(19),
            Constraint::Length(19),
            Constraint::Length(9),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(Some(uidata.selected_row));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_empty_state(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let message = Paragraph::new(uidata.empty_message.as_str().italic()).centered();
        frame.render_widget(message, area);
    }

    fn draw_footer(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let hint = uidata
            .row_hints
            .get(uidata.selected_row)
            .map(String::as_str)
            .unwrap_or("");
        let line = Line::from(vec![
            Span::raw(format!(" {} ", uidata.filtered_jobs_message)),
            Span::styled(format!("(page size {}) ", uidata.jobs_limit), Style::default().dim()),
            Span::styled(hint, Style::default().italic()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_status_line(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        if uidata.active_cmdinput {
            let label = match uidata.cmd_mode {
                Some(CMDMode::IdFilter) => "id filter",
                Some(CMDMode::UserFilter) => "user filter",
                None => "input",
            };
            let split = uidata
                .cmdinput
                .input
                .char_indices()
                .nth(uidata.cmdinput.curser_pos)
                .map(|(byte_idx, _)| byte_idx)
                .unwrap_or(uidata.cmdinput.input.len());
            let (before, after) = uidata.cmdinput.input.split_at(split);
            let line = Line::from(vec![
                Span::styled(format!(" {label}> "), Style::default().bold()),
                Span::raw(before),
                Span::styled("█", Style::default().add_modifier(Modifier::SLOW_BLINK)),
                Span::raw(after),
            ]);
            frame.render_widget(Paragraph::new(line), area);
        } else if uidata.last_status_message_update.elapsed() < STATUS_MESSAGE_TTL {
            frame.render_widget(
                Paragraph::new(Line::from(format!(" {}", uidata.status_message)).dim()),
                area,
            );
        }
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = centered_rect(60, 70, frame.area());
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .block(Block::bordered().title(" help "));
        frame.render_widget(popup, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}
