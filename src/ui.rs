use crate::{
    app::{App, LogLevel},
    gamepad::Gamepad,
    nav::{Direction as NavDirection, Input, Source, MOD_COLUMN, RATING_COLUMN},
    rating::Rating,
};
use anyhow::Result;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Padding, Paragraph, Row, Table},
};
use std::{
    io,
    time::{Duration, Instant},
};

const FRAME_TIME: Duration = Duration::from_millis(16);
const HEADER_HEIGHT: u16 = 3;
const LOG_HEIGHT: u16 = 4;
const RATING_COLUMN_WIDTH: u16 = 12;

#[derive(Clone)]
struct Theme {
    accent: Color,
    border: Color,
    text: Color,
    muted: Color,
    warning: Color,
    error: Color,
    row_bg: Color,
    cell_bg: Color,
    header_bg: Color,
    silver: Color,
    gold: Color,
}

impl Theme {
    fn new() -> Self {
        Self {
            accent: Color::Rgb(120, 190, 255),
            border: Color::Rgb(65, 75, 90),
            text: Color::Rgb(220, 230, 240),
            muted: Color::Rgb(135, 145, 155),
            warning: Color::Rgb(230, 200, 120),
            error: Color::Rgb(235, 100, 95),
            row_bg: Color::Rgb(70, 70, 70),
            cell_bg: Color::Rgb(90, 90, 90),
            header_bg: Color::Rgb(22, 28, 36),
            silver: Color::Rgb(200, 205, 215),
            gold: Color::Rgb(240, 195, 70),
        }
    }

    fn block(&self, title: &'static str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border))
            .title(Span::styled(
                title,
                Style::default()
                    .fg(self.accent)
                    .add_modifier(Modifier::BOLD),
            ))
    }

    fn rating_style(&self, rating: Rating) -> Style {
        match rating {
            Rating::Unrated => Style::default().fg(self.muted),
            Rating::Silver => Style::default().fg(self.silver),
            Rating::Gold => Style::default().fg(self.gold).add_modifier(Modifier::BOLD),
            Rating::Bad => Style::default().fg(self.error),
        }
    }
}

struct Areas {
    header: Rect,
    list: Rect,
    status: Rect,
    log: Rect,
}

fn split(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(4),
            Constraint::Length(1),
            Constraint::Length(LOG_HEIGHT),
        ])
        .split(area);
    Areas {
        header: chunks[0],
        list: chunks[1],
        status: chunks[2],
        log: chunks[3],
    }
}

/// Rows left for mods once borders and the column header are drawn.
fn list_rows(area: Rect) -> usize {
    split(area).list.height.saturating_sub(3).max(1) as usize
}

pub fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let releases = supports_keyboard_enhancement().unwrap_or(false);
    if releases {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut gamepad = match Gamepad::open() {
        Ok(Some(pad)) => {
            app.log_info(format!("Gamepad: {}", pad.name()));
            Some(pad)
        }
        Ok(None) => None,
        Err(err) => {
            app.log_warn(format!("Gamepad unavailable: {err:#}"));
            None
        }
    };

    let result = run_loop(&mut terminal, app, gamepad.as_mut(), releases);

    if releases {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let saved = app.shutdown();
    result.and(saved)
}

fn run_loop(
    terminal: &mut Terminal<impl Backend>,
    app: &mut App,
    mut gamepad: Option<&mut Gamepad>,
    releases: bool,
) -> Result<()> {
    loop {
        let frame_start = Instant::now();
        app.tick(frame_start);
        app.nav.set_visible_rows(list_rows(terminal.size()?));
        terminal.draw(|frame| draw(frame, app))?;

        if app.should_quit {
            break;
        }

        if event::poll(FRAME_TIME)? {
            // Drain whatever queued up so held keys don't lag behind.
            loop {
                if let Event::Key(key) = event::read()? {
                    match translate_key(key, releases) {
                        KeyOutcome::Input(input) => app.handle_input(input, Instant::now()),
                        KeyOutcome::Quit => app.should_quit = true,
                        KeyOutcome::Ignored => {}
                    }
                }
                if app.should_quit || !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        if let Some(pad) = gamepad.as_deref_mut() {
            for input in pad.poll() {
                app.handle_input(input, Instant::now());
            }
        }

        if app.should_quit {
            break;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Input(Input),
    Quit,
    Ignored,
}

fn translate_key(key: KeyEvent, releases: bool) -> KeyOutcome {
    let direction = match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(NavDirection::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(NavDirection::Down),
        _ => None,
    };

    match key.kind {
        KeyEventKind::Release => {
            return match direction {
                Some(direction) => KeyOutcome::Input(Input::Release(direction, Source::Keyboard)),
                None => KeyOutcome::Ignored,
            };
        }
        // The hold timer produces repeats itself.
        KeyEventKind::Repeat if releases => return KeyOutcome::Ignored,
        _ => {}
    }

    if let Some(direction) = direction {
        return KeyOutcome::Input(if releases {
            Input::Press(direction, Source::Keyboard)
        } else {
            Input::Step(direction)
        });
    }

    let input = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), mods) if mods.contains(KeyModifiers::CONTROL) => {
            return KeyOutcome::Quit
        }
        (KeyCode::Char('q'), _) | (KeyCode::Char('Q'), _) | (KeyCode::Esc, _) => {
            return KeyOutcome::Quit
        }
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Input::Column(MOD_COLUMN),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Input::Column(RATING_COLUMN),
        (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => Input::Activate,
        (KeyCode::PageUp, _) => Input::Page(-1),
        (KeyCode::PageDown, _) => Input::Page(1),
        (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Input::Home,
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => Input::End,
        _ => return KeyOutcome::Ignored,
    };
    KeyOutcome::Input(input)
}

fn draw(frame: &mut Frame<'_>, app: &App) {
    let theme = Theme::new();
    let areas = split(frame.size());

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "gzfe",
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("Mod ", Style::default().fg(theme.muted)),
            Span::styled(
                if app.nav.is_empty() {
                    "0/0".to_string()
                } else {
                    format!("{}/{}", app.nav.selected_row() + 1, app.nav.len())
                },
                Style::default().fg(theme.text),
            ),
        ]),
        Line::from(vec![
            Span::styled("Folder: ", Style::default().fg(theme.muted)),
            Span::styled(
                app.settings.mods_dir.display().to_string(),
                Style::default().fg(theme.text),
            ),
        ]),
    ])
    .style(Style::default().bg(theme.header_bg))
    .alignment(Alignment::Center);
    frame.render_widget(header, areas.header);

    if app.nav.is_empty() {
        let empty = Paragraph::new("No mod folders with .wad or .pk3 files.")
            .style(Style::default().fg(theme.muted))
            .block(theme.block("Mods"))
            .alignment(Alignment::Center);
        frame.render_widget(empty, areas.list);
    } else {
        let table = Table::new(
            build_rows(app, &theme),
            [Constraint::Min(20), Constraint::Length(RATING_COLUMN_WIDTH)],
        )
        .header(
            Row::new(vec![Cell::from("Mod"), Cell::from("Rating")])
                .style(Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        )
        .column_spacing(1)
        .block(theme.block("Mods").padding(Padding::horizontal(1)));
        frame.render_widget(table, areas.list);
    }

    let status = Paragraph::new(status_bar_line(app, areas.status.width))
        .style(Style::default().fg(theme.text).bg(theme.header_bg));
    frame.render_widget(status, areas.status);

    let log = Paragraph::new(build_log_lines(app, &theme, areas.log.height as usize));
    frame.render_widget(log, areas.log);
}

fn build_rows(app: &App, theme: &Theme) -> Vec<Row<'static>> {
    let selected = app.nav.selected_row();
    let column = app.nav.selected_col();
    app.nav
        .visible_range()
        .filter_map(|index| {
            let entry = app.catalog.get(index)?;
            let rating = app.rating_at(index);
            let mut name = Cell::from(entry.name.clone()).style(Style::default().fg(theme.text));
            let mut rating_cell = Cell::from(format!("{} {}", rating.glyph(), rating.display_name()))
                .style(theme.rating_style(rating));
            let mut row_style = Style::default();
            if index == selected {
                row_style = row_style.bg(theme.row_bg);
                let focused = Style::default().bg(theme.cell_bg).add_modifier(Modifier::BOLD);
                if column == MOD_COLUMN {
                    name = name.style(focused.fg(theme.text));
                } else {
                    rating_cell = rating_cell.style(theme.rating_style(rating).patch(focused));
                }
            }
            Some(Row::new(vec![name, rating_cell]).style(row_style))
        })
        .collect()
}

fn status_bar_line(app: &App, width: u16) -> String {
    let width = width as usize;
    let left = format!("Status: {}", app.status);
    let right = app.hint().to_string();

    if width == 0 {
        return String::new();
    }

    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len + right_len + 1 > width {
        let available = width.saturating_sub(left_len + 1);
        let trimmed_right: String = right.chars().take(available).collect();
        return format!("{left} {trimmed_right}");
    }

    let spaces = width - left_len - right_len;
    format!("{left}{}{right}", " ".repeat(spaces))
}

fn build_log_lines(app: &App, theme: &Theme, height: usize) -> Vec<Line<'static>> {
    if height == 0 {
        return Vec::new();
    }

    if app.logs.is_empty() {
        return vec![Line::from(Span::styled(
            "No recent events.",
            Style::default().fg(theme.muted),
        ))];
    }

    let start = app.logs.len().saturating_sub(height);
    app.logs[start..]
        .iter()
        .map(|entry| {
            let (label, color) = match entry.level {
                LogLevel::Info => ("[i]", theme.accent),
                LogLevel::Warn => ("[!]", theme.warning),
                LogLevel::Error => ("[x]", theme.error),
            };
            Line::from(vec![
                Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(entry.message.clone(), Style::default().fg(theme.text)),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn arrows_hold_when_releases_are_reported() {
        assert_eq!(
            translate_key(key(KeyCode::Down, KeyEventKind::Press), true),
            KeyOutcome::Input(Input::Press(NavDirection::Down, Source::Keyboard))
        );
        assert_eq!(
            translate_key(key(KeyCode::Down, KeyEventKind::Release), true),
            KeyOutcome::Input(Input::Release(NavDirection::Down, Source::Keyboard))
        );
        assert_eq!(
            translate_key(key(KeyCode::Down, KeyEventKind::Repeat), true),
            KeyOutcome::Ignored
        );
    }

    #[test]
    fn arrows_step_without_release_support() {
        assert_eq!(
            translate_key(key(KeyCode::Up, KeyEventKind::Press), false),
            KeyOutcome::Input(Input::Step(NavDirection::Up))
        );
    }

    #[test]
    fn enter_and_space_activate() {
        for code in [KeyCode::Enter, KeyCode::Char(' ')] {
            assert_eq!(
                translate_key(key(code, KeyEventKind::Press), true),
                KeyOutcome::Input(Input::Activate)
            );
        }
        assert_eq!(
            translate_key(key(KeyCode::Right, KeyEventKind::Press), false),
            KeyOutcome::Input(Input::Column(RATING_COLUMN))
        );
        assert_eq!(
            translate_key(key(KeyCode::Esc, KeyEventKind::Press), false),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn list_rows_track_terminal_height() {
        let area = Rect::new(0, 0, 80, 40);
        // 40 - header 3 - status 1 - log 4 - borders 2 - column header 1
        assert_eq!(list_rows(area), 29);
        assert_eq!(list_rows(Rect::new(0, 0, 80, 5)), 1);
    }
}
