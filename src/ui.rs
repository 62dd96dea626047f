use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points, Rectangle},
        Block, Borders, Gauge, Paragraph, Widget, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::app::App;
use crate::celebration::Celebration;
use crate::game::GamePhase;
use crate::util;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.phase() {
            GamePhase::Menu => render_menu(self, area, buf),
            GamePhase::Loading => render_loading(area, buf),
            GamePhase::Countdown => render_countdown(self, area, buf),
            GamePhase::Playing => render_playing(self, area, buf),
            GamePhase::End => render_end(self, area, buf),
        }

        if self.celebration.is_active {
            render_confetti(&self.celebration, area, buf);
        }

        if let Some(notice) = &self.notice {
            render_notice(notice, area, buf);
        }
    }
}

fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let title_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let lines = vec![
        Line::from(Span::styled("s k i s s", title_style)),
        Line::from(""),
        Line::from(Span::styled(
            "sketch with the mouse, a neural net guesses",
            italic_style,
        )),
        Line::from(Span::styled(
            format!(
                "guess {} right before your lives run out",
                app.session.cfg().win_threshold
            ),
            italic_style,
        )),
        Line::from(""),
        Line::from(Span::styled("(enter) start  (q)uit", dim_style)),
    ];

    render_centered_lines(lines, area, buf);
}

fn render_loading(area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "warming up the classifier...",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(esc) cancel",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    render_centered_lines(lines, area, buf);
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            app.session.countdown().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "get ready to draw",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    render_centered_lines(lines, area, buf);
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let target_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1), // target, lives, play clock
                Constraint::Length(1), // classifier guess
                Constraint::Min(3),    // sketch canvas
                Constraint::Length(1), // budget gauge
                Constraint::Length(1), // key hints
            ]
            .as_ref(),
        )
        .split(area);

    let target = app.session.current_target().unwrap_or("?");
    let status = Line::from(vec![
        Span::styled("draw: ", dim_style),
        Span::styled(target.to_string(), target_style),
        Span::raw("   "),
        Span::styled(hearts(app.session.lives()), Style::default().fg(Color::Red)),
        Span::raw("   "),
        Span::styled(util::format_time(app.session.elapsed_ms()), dim_style),
    ]);
    Paragraph::new(status)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(guess_line(app))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    render_sketch(app, chunks[2], buf);

    let budget = app.session.budget_ms();
    let spent = app.pad.time_spent_ms();
    let remaining = budget.saturating_sub(spent);
    let ratio = if budget == 0 {
        0.0
    } else {
        (remaining as f64 / budget as f64).clamp(0.0, 1.0)
    };
    let gauge_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.25 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!("{} left", util::format_time(remaining)))
        .render(chunks[3], buf);

    Paragraph::new(Span::styled("(c)lear  (s)kip  (esc) menu", dim_style))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
}

/// The classifier's current best guess, a "got it" flash right after a
/// correct answer, or a placeholder while the canvas is blank
fn guess_line(app: &App) -> Line<'static> {
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    if app.session.pulse_active() {
        return Line::from(Span::styled(
            "✓ got it!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
    }
    match app.session.latest_output().first() {
        Some(top) => {
            let phrase = app.session.current_response().unwrap_or("I see");
            Line::from(vec![
                Span::styled(format!("{} ", phrase), italic_style),
                Span::styled(
                    top.label.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", util::format_pct(top.score)),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        }
        None => Line::from(Span::styled("the machine is watching...", italic_style)),
    }
}

fn render_sketch(app: &App, area: Rect, buf: &mut Buffer) {
    let size = app.pad.size() as f64;
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL))
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, size])
        .y_bounds([0.0, size])
        .paint(|ctx| {
            // Canvas y grows upward, the pad's grows downward
            for stroke in app.pad.strokes() {
                if let [(x, y)] = stroke.as_slice() {
                    ctx.draw(&Points {
                        coords: &[(*x, size - *y)],
                        color: Color::White,
                    });
                    continue;
                }
                for pair in stroke.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].0,
                        y1: size - pair[0].1,
                        x2: pair[1].0,
                        y2: size - pair[1].1,
                        color: Color::White,
                    });
                }
            }
            if let Some(b) = app.pad.bounding_box() {
                ctx.draw(&Rectangle {
                    x: b.min_x,
                    y: size - b.max_y,
                    width: b.width(),
                    height: b.height(),
                    color: Color::DarkGray,
                });
            }
        });
    canvas.render(area, buf);
}

fn render_end(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1), // headline
                Constraint::Length(1),
                Constraint::Min(1), // review list
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    let headline = if app.session.is_won() {
        Span::styled(
            format!(
                "you won!  {} of {} guessed in {}",
                app.session.correct_count(),
                app.session.resolved_count(),
                util::format_time(app.session.elapsed_ms()),
            ),
            Style::default().fg(Color::Green).patch(bold_style),
        )
    } else {
        Span::styled(
            format!(
                "game over  {} of {} guessed in {}",
                app.session.correct_count(),
                app.session.resolved_count(),
                util::format_time(app.session.elapsed_ms()),
            ),
            bold_style,
        )
    };
    Paragraph::new(headline)
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let target_width = app
        .session
        .predictions()
        .iter()
        .map(|p| p.target.width())
        .max()
        .unwrap_or(0);
    let review: Vec<Line> = app
        .session
        .predictions()
        .iter()
        .map(|p| {
            let mark = if p.correct {
                Span::styled("✓", Style::default().fg(Color::Green))
            } else {
                Span::styled("✗", Style::default().fg(Color::Red))
            };
            let guess = match &p.output {
                Some(c) => format!("{}  {}", c.label, util::format_pct(c.score)),
                None => "no guess".to_string(),
            };
            Line::from(vec![
                mark,
                Span::raw(" "),
                Span::styled(
                    format!("{:<width$}", p.target, width = target_width),
                    bold_style,
                ),
                Span::raw("  "),
                Span::styled(guess, dim_style),
            ])
        })
        .collect();
    Paragraph::new(review)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let legend = if Browser::is_available() {
        "(p)lay again  (m)enu  (t)weet  (q)uit"
    } else {
        "(p)lay again  (m)enu  (q)uit"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

/// Center `lines` vertically: pad with an empty chunk sized to half the
/// leftover height
fn render_centered_lines(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let content = lines.len() as u16;
    let pad_top = area.height.saturating_sub(content) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(pad_top),
            Constraint::Length(content),
            Constraint::Min(0),
        ])
        .split(area);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn render_notice(notice: &str, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let line = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
    Paragraph::new(Span::styled(
        notice.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(line, buf);
}

/// Paint confetti on top of whatever screen is showing
fn render_confetti(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x >= area.width || y >= area.height {
            continue;
        }
        let color = colors[particle.color_index % colors.len()];
        let fade = particle.fade();

        let style = if particle.is_text {
            if fade > 0.4 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            }
        } else if fade > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if fade > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}

fn hearts(lives: i32) -> String {
    "♥".repeat(lives.max(0) as usize)
}
