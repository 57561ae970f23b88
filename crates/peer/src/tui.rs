use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction as Axis, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use mazewar::{Canvas, Direction, Glyph, Guid, Maze, NetworkStats, Phase, Position};

const MAX_LOG_LINES: usize = 200;
const WALL: char = '#';
const FLOOR: char = ' ';

/// Character grid the registry paints into. North is drawn at the top and
/// east to the right.
pub struct MazeView {
    width: u16,
    height: u16,
    cells: Vec<char>,
    scores: BTreeMap<usize, (String, i32)>,
}

impl MazeView {
    pub fn new(maze: &Maze) -> Self {
        let mut cells = Vec::with_capacity(maze.width() as usize * maze.height() as usize);
        for x in 0..maze.width() {
            for y in 0..maze.height() {
                let wall = maze.is_wall(Position::new(x, y));
                cells.push(if wall { WALL } else { FLOOR });
            }
        }

        Self {
            width: maze.width(),
            height: maze.height(),
            cells,
            scores: BTreeMap::new(),
        }
    }

    pub fn clear_score(&mut self, index: usize) {
        self.scores.remove(&index);
    }

    #[cfg(test)]
    pub fn cell(&self, pos: Position) -> Option<char> {
        self.offset(pos).map(|i| self.cells[i])
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.width)
            .rev()
            .map(|x| {
                (0..self.height)
                    .map(|y| self.cells[x as usize * self.height as usize + y as usize])
                    .collect()
            })
            .collect()
    }

    pub fn scores(&self) -> impl Iterator<Item = (&usize, &(String, i32))> {
        self.scores.iter()
    }

    fn offset(&self, pos: Position) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.x as usize * self.height as usize + pos.y as usize)
        } else {
            None
        }
    }
}

impl Canvas for MazeView {
    fn erase(&mut self, pos: Position) {
        if let Some(i) = self.offset(pos) {
            if self.cells[i] != WALL {
                self.cells[i] = FLOOR;
            }
        }
    }

    fn draw(&mut self, pos: Position, glyph: Glyph) {
        if let Some(i) = self.offset(pos) {
            self.cells[i] = glyph_char(glyph);
        }
    }

    fn score(&mut self, index: usize, name: &str, score: i32) {
        self.scores.insert(index, (name.to_string(), score));
    }
}

fn glyph_char(glyph: Glyph) -> char {
    match glyph {
        Glyph::Rat(Direction::North) => '^',
        Glyph::Rat(Direction::South) => 'v',
        Glyph::Rat(Direction::East) => '>',
        Glyph::Rat(Direction::West) => '<',
        Glyph::Missile => '*',
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

pub struct TuiState {
    log: VecDeque<(LogLevel, String)>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            log: VecDeque::with_capacity(MAX_LOG_LINES),
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if self.log.len() >= MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back((level, message));
    }
}

pub struct PeerStatus {
    pub phase: Phase,
    pub local: Guid,
    pub rat_count: usize,
    pub uptime: Duration,
    pub network: NetworkStats,
}

pub fn render(frame: &mut Frame, state: &TuiState, view: &MazeView, status: &PeerStatus) {
    let rows = Layout::default()
        .direction(Axis::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Axis::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(36)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Axis::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(body[1]);

    render_header(frame, rows[0], status);
    render_maze(frame, body[0], view);
    render_scores(frame, side[0], view);
    render_network(frame, side[1], &status.network);
    render_log(frame, rows[2], state);
    render_help(frame, rows[3]);
}

fn render_header(frame: &mut Frame, area: Rect, status: &PeerStatus) {
    let title = format!(" Mazewar - Uptime: {} ", format_duration(status.uptime.as_secs()));
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let phase = match status.phase {
        Phase::Discovery => "discovering peers",
        Phase::Active => "active",
    };
    let text = format!(
        "Rat: {}  |  Phase: {}  |  Rats: {}",
        status.local, phase, status.rat_count
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_maze(frame: &mut Frame, area: Rect, view: &MazeView) {
    let block = Block::default()
        .title(" Maze ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let lines: Vec<Line> = view.rows().into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_scores(frame: &mut Frame, area: Rect, view: &MazeView) {
    let block = Block::default()
        .title(" Scores ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines: Vec<Line> = view
        .scores()
        .map(|(index, (name, score))| {
            Line::from(vec![
                Span::styled(format!("{:>2} ", index), Style::default().fg(Color::Gray)),
                Span::styled(format!("{:<20}", name), Style::default().fg(Color::White)),
                Span::styled(
                    format!("{:>6}", score),
                    Style::default().fg(if *score < 0 { Color::Red } else { Color::White }),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_network(frame: &mut Frame, area: Rect, net: &NetworkStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines = vec![
        Line::from(vec![
            Span::styled("Packets: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} sent / {} recv", net.packets_sent, net.packets_received),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Bytes: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} sent / {} recv",
                    format_bytes(net.bytes_sent),
                    format_bytes(net.bytes_received)
                ),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Events ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.log.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(skip)
        .map(|(level, message)| {
            let color = match level {
                LogLevel::Info => Color::White,
                LogLevel::Warn => Color::Yellow,
            };
            Line::from(Span::styled(message.clone(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "arrows/wasd move and turn, r about face, space fire, q or ESC to quit",
    )
    .block(block)
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_is_drawn_at_the_top() {
        let mut view = MazeView::new(&Maze::bordered(4, 5));
        view.draw(Position::new(2, 1), Glyph::Rat(Direction::North));

        let rows = view.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], "#####");
        assert_eq!(rows[1], "#^  #");
        assert_eq!(rows[2], "#   #");
    }

    #[test]
    fn erase_keeps_walls() {
        let mut view = MazeView::new(&Maze::bordered(4, 4));
        view.draw(Position::new(1, 1), Glyph::Missile);
        assert_eq!(view.cell(Position::new(1, 1)), Some('*'));

        view.erase(Position::new(1, 1));
        view.erase(Position::new(0, 0));
        view.erase(Position::new(40, 40));
        assert_eq!(view.cell(Position::new(1, 1)), Some(FLOOR));
        assert_eq!(view.cell(Position::new(0, 0)), Some(WALL));
    }

    #[test]
    fn departed_rows_can_be_cleared() {
        let mut view = MazeView::new(&Maze::open(2, 2));
        view.score(0, "alice", 3);
        view.score(1, "bob", -2);
        view.clear_score(1);

        let rows: Vec<usize> = view.scores().map(|(index, _)| *index).collect();
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn log_is_bounded() {
        let mut state = TuiState::new();
        for n in 0..MAX_LOG_LINES + 5 {
            state.log_info(format!("line {}", n));
        }
        assert_eq!(state.log.len(), MAX_LOG_LINES);
        assert_eq!(state.log.front().unwrap().1, "line 5");
    }
}
