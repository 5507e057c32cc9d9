use crate::controller::{CycleController, RunState};
use crate::instruction::Instruction;
use crate::interpreter::{Chip8Interpreter, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::symbols::Marker;
use tui::text::{Span, Spans};
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Everything a renderer gets to look at for one frame. The machine is
/// borrowed read-only.
pub struct DebugView<'a> {
    pub machine: &'a Chip8Interpreter,
    pub cycle_hz: u32,
    pub message: Option<&'a str>,
}

/// Display is used by the host loop to put the machine on a screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    fn draw(&mut self, view: &DebugView) -> Result<(), io::Error>;
}

// store useful metadata about the frame
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel equal to `lit`
    fn bitplane_from_data<'a>(
        &self,
        data: &'a [bool],
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let mut count = self.pixel_count().min(data.len());
        let w = self.0;
        std::iter::from_fn(move || {
            while count > 0 {
                count -= 1;
                if data[count] == lit {
                    return Some((
                        (count % w) as f64,        // x
                        -1.0 * (count / w) as f64, // y
                    ));
                }
            }
            None
        })
    }
}

/// monochrome display plus debug panels in a terminal, rendered using TUI
/// and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, view: &DebugView) -> Result<(), io::Error> {
        let machine = view.machine;
        let resolution = &self.resolution;
        self.terminal.draw(|f| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(
                    [
                        Constraint::Length(2 + resolution.0 as u16),
                        Constraint::Min(30),
                    ]
                    .as_ref(),
                )
                .split(f.size());
            let left = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(2 + resolution.1 as u16),
                        Constraint::Min(4),
                    ]
                    .as_ref(),
                )
                .split(columns[0]);
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(14), Constraint::Min(6)].as_ref())
                .split(columns[1]);

            // for now this assumes a 1:1 ratio between terminal, chip8 and the
            // internal TUI canvas
            let size = Rect::new(
                left[0].x,
                left[0].y,
                left[0].width.min(2 + resolution.0 as u16),
                left[0].height.min(2 + resolution.1 as u16),
            );
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_data(machine.display(), false)
                            .collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_data(machine.display(), true)
                            .collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);

            let status = Paragraph::new(status_lines(view))
                .block(Block::default().title("Status").borders(Borders::ALL));
            f.render_widget(status, left[1]);

            let registers = Paragraph::new(register_lines(machine))
                .block(Block::default().title("Registers").borders(Borders::ALL));
            f.render_widget(registers, right[0]);

            let rows = right[1].height.saturating_sub(2) as usize;
            let memory = Paragraph::new(memory_lines(machine, rows))
                .block(Block::default().title("Memory").borders(Borders::ALL));
            f.render_widget(memory, right[1]);
        })?;
        Ok(())
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_owned(), Style::default().fg(Color::Cyan))
}

/// V0-VF, I, PC, SP, timers, current opcode and the stack
fn register_lines(m: &Chip8Interpreter) -> Vec<Spans<'static>> {
    let v = m.registers();
    let mut lines = Vec::new();
    for half in v.chunks(8).enumerate() {
        let (row, regs) = half;
        let mut spans = Vec::new();
        for (i, value) in regs.iter().enumerate() {
            spans.push(label(&format!("V{:X}", row * 8 + i)));
            spans.push(Span::raw(format!(" {:02x} ", value)));
        }
        lines.push(Spans::from(spans));
    }
    let timers = m.timers();
    lines.push(Spans::from(vec![
        label("PC"),
        Span::raw(format!(" {:#05x}   ", m.program_counter())),
        label("I"),
        Span::raw(format!(" {:#05x}   ", m.index())),
        label("SP"),
        Span::raw(format!(" {}", m.stack_pointer())),
    ]));
    lines.push(Spans::from(vec![
        label("DT"),
        Span::raw(format!(" {:<6}", timers.delay)),
        label("ST"),
        Span::raw(format!(" {:<6}", timers.sound)),
        if m.sound_active() {
            Span::styled("BEEP", Style::default().add_modifier(Modifier::BOLD))
        } else {
            Span::raw("")
        },
    ]));
    let op = m.current_instruction();
    lines.push(Spans::from(vec![
        label("OP"),
        Span::raw(format!(" {:04x}  {}", op, Instruction::decode(op))),
    ]));
    let held: String = m
        .keypad()
        .keys()
        .iter()
        .enumerate()
        .map(|(key, &down)| if down { format!("{:X}", key) } else { "-".to_owned() })
        .collect();
    lines.push(Spans::from(vec![label("Keys"), Span::raw(format!(" {}", held))]));
    lines.push(Spans::from(vec![label("Stack")]));
    let stack = m.stack();
    if stack.is_empty() {
        lines.push(Spans::from(Span::raw("  (empty)")));
    }
    for (depth, addr) in stack.iter().enumerate().rev() {
        lines.push(Spans::from(Span::raw(format!("  {:2}: {:#05x}", depth, addr))));
    }
    lines
}

/// hex dump around PC, 8 bytes per row; PC's word is highlighted
fn memory_lines(m: &Chip8Interpreter, rows: usize) -> Vec<Spans<'static>> {
    let pc = m.program_counter() as usize;
    let ram = m.memory().as_slice();
    let start = (pc & !0x7).saturating_sub(16);
    let mut lines = Vec::new();
    for row in 0..rows {
        let base = start + row * 8;
        if base >= ram.len() {
            break;
        }
        let mut spans = vec![label(&format!("{:#06x} ", base))];
        for (offset, byte) in ram[base..(base + 8).min(ram.len())].iter().enumerate() {
            let addr = base + offset;
            let text = format!(" {:02x}", byte);
            if addr == pc || addr == pc + 1 {
                spans.push(Span::styled(text, Style::default().fg(Color::Green)));
            } else if addr == m.index() as usize {
                spans.push(Span::styled(text, Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw(text));
            }
        }
        lines.push(Spans::from(spans));
    }
    lines
}

fn state_text(m: &Chip8Interpreter) -> String {
    match CycleController::state(m) {
        RunState::Running => "RUNNING".to_owned(),
        RunState::Paused => "PAUSED".to_owned(),
        RunState::AwaitingKey(r) => format!("WAITING FOR KEY -> V{:X}", r),
        RunState::Halted => match m.fault() {
            Some(fault) => format!("HALTED: {}", fault),
            None => "HALTED".to_owned(),
        },
    }
}

fn status_lines(view: &DebugView) -> Vec<Spans<'static>> {
    let m = view.machine;
    let mut lines = vec![
        Spans::from(vec![
            Span::styled(
                state_text(m),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {} Hz  {} cycles", view.cycle_hz, m.cycles())),
        ]),
        Spans::from(Span::raw(
            "space pause  . step  +/- speed  F5 reset  esc quit",
        )),
    ];
    if let Some(diagnostic) = m.last_diagnostic() {
        lines.push(Spans::from(Span::styled(
            format!("{} ({} total)", diagnostic, m.unknown_opcode_count()),
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(message) = view.message {
        lines.push(Spans::from(Span::raw(message.to_owned())));
    }
    lines
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    pub frames: usize,
    pub last_status: Vec<String>,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay {
            frames: 0,
            last_status: Vec::new(),
        }
    }
}

impl Default for DummyDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, view: &DebugView) -> Result<(), io::Error> {
        self.frames += 1;
        self.last_status = status_lines(view).iter().map(spans_text).collect();
        Ok(())
    }
}

fn spans_text(spans: &Spans) -> String {
    spans.0.iter().map(|s| s.content.as_ref()).collect()
}
