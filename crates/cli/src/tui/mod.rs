pub mod form;

use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use effcalc_engine::{MetricsController, MetricsField, Scenario};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::report::{ADVANTAGES, ADVANTAGES_HEADING, INPUT_HEADING, RESULT_ROWS};
use crate::util;
use form::FormState;

struct TuiApp {
    controller: MetricsController,
    form: FormState,
    should_quit: bool,
    show_help: bool,
    /// Set by the controller's render callback and by UI-only changes.
    dirty: Arc<AtomicBool>,
}

impl TuiApp {
    fn new(mut controller: MetricsController) -> Self {
        let form = FormState::from_input(controller.input());
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&dirty);
        controller.on_render(Box::new(move |_| flag.store(true, Ordering::SeqCst)));
        Self {
            controller,
            form,
            should_quit: false,
            show_help: false,
            dirty,
        }
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// True if a redraw is due; clears the flag.
    fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Focus, help and quit are UI-only; edits redraw via the controller
        self.mark_dirty();
        if self.show_help {
            // Any key dismisses help
            self.show_help = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let edited = match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                false
            }
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                false
            }
            KeyCode::Char('u') if ctrl => self.form.clear(),
            KeyCode::Char('r') if ctrl => {
                self.controller.reset();
                self.form.sync_from(self.controller.input());
                false
            }
            KeyCode::F(1) => {
                self.show_help = true;
                false
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
                self.form.focus_next();
                false
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.focus_prev();
                false
            }
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) if !ctrl => self.form.insert(c),
            _ => false,
        };

        if edited {
            let field = self.form.focused;
            self.controller.edit(field, self.form.text(field));
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);

        let body = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        self.draw_inputs(frame, body[0]);

        let panels = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body[1]);
        self.draw_panel(frame, panels[0], Scenario::Human);
        self.draw_panel(frame, panels[1], Scenario::Ai);

        self.draw_advantages(frame, chunks[2]);
        self.draw_status(frame, chunks[3]);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = " Calculadora de Eficiência Operacional | humano x IA ";
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_inputs(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        for field in MetricsField::ALL {
            let focused = field == self.form.focused;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(field.label(), label_style)));

            let text = self.form.text(field);
            let value_style = if focused {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::White)
            };
            let cursor = if focused { "_" } else { "" };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{}{}", text, cursor), value_style),
            ]));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", INPUT_HEADING))
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_panel(&self, frame: &mut Frame, area: Rect, scenario: Scenario) {
        let result = self.controller.comparison().get(scenario);
        let inner_width = area.width.saturating_sub(4) as usize;

        let mut lines = Vec::new();
        for row in &RESULT_ROWS {
            lines.push(Line::from(Span::styled(
                format!("{}:", row.label),
                Style::default().fg(Color::DarkGray),
            )));
            let value_style = match row.label {
                "Faturamento" => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                "Perda Mensal" => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            };
            let value = util::truncate_display(&(row.value)(result), inner_width);
            lines.push(Line::from(vec![Span::raw("  "), Span::styled(value, value_style)]));
        }

        let border = if scenario.is_ai() { Color::Cyan } else { Color::Blue };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", scenario.title()))
            .title_style(Style::default().fg(border).add_modifier(Modifier::BOLD));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_advantages(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = ADVANTAGES
            .iter()
            .map(|(title, detail)| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", title),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(*detail, Style::default().fg(Color::Gray)),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", ADVANTAGES_HEADING));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = format!(
            " {} = {:?}  (rev {})",
            self.form.focused.label(),
            self.form.focused_text(),
            self.controller.revision()
        );
        let right = "Tab: next  Ctrl+R: reset  F1: help  Esc: quit ";

        let padding = (area.width as usize)
            .saturating_sub(util::display_width(&left) + util::display_width(right));
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Editing",
            "  -------",
            "  0-9 . e -        Type into the focused input",
            "  Backspace        Delete last character",
            "  Ctrl+U           Clear input (counts as 0)",
            "  Ctrl+R           Reset all inputs",
            "",
            "  Navigation",
            "  ----------",
            "  Tab / Down       Next input",
            "  Shift+Tab / Up   Previous input",
            "",
            "  General",
            "  -------",
            "  Esc / Ctrl+C     Quit",
            "  F1               Toggle this help",
            "",
        ];
        let help_width: u16 = 52;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Run the interactive calculator until the user quits.
pub fn run(controller: MetricsController) -> Result<(), String> {
    let app = TuiApp::new(controller);
    run_app(app)
}

fn run_app(mut app: TuiApp) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        if app.take_dirty() {
            terminal
                .draw(|frame| app.draw(frame))
                .map_err(|e| format!("draw error: {}", e))?;
        }

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("event poll error: {}", e))? {
            match event::read().map_err(|e| format!("event read error: {}", e))? {
                // Windows reports releases too
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Resize(_, _) => app.mark_dirty(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
