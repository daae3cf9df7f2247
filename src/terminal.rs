// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); len],
        }
    }
}

/// Terminal session: raw mode, alternate screen, hidden cursor, and mouse
/// capture (wheel events are the scroll stream). Restores everything on
/// drop, panic, or signal. Construction failing is the one fatal setup
/// error; there is no recoverable error path past this point.
pub struct Terminal {
    stdout: Stdout,
    last: Option<LastFrame>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(event::EnableMouseCapture)?;
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self { stdout: out, last: None })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let needs_full_redraw = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);

        if needs_full_redraw || frame.is_dirty_all() {
            if needs_full_redraw {
                self.stdout
                    .queue(terminal::Clear(terminal::ClearType::All))?;
                self.last = Some(LastFrame::new(frame.width, frame.height));
            }
            self.draw_full(frame)?;
            frame.clear_dirty();
            return Ok(());
        }

        self.draw_diff(frame)?;
        frame.clear_dirty();
        Ok(())
    }

    fn draw_full(&mut self, frame: &Frame) -> Result<()> {
        let last = self.last.get_or_insert_with(|| LastFrame::new(frame.width, frame.height));
        let mut pen = Pen::default();

        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                pen.apply(&mut self.stdout, cell)?;
                self.stdout.queue(Print(cell.ch))?;
                last.cells[idx] = cell;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }

    /// Emit only cells that differ from what the terminal already shows,
    /// walking dirty indices in screen order to keep cursor moves short.
    fn draw_diff(&mut self, frame: &Frame) -> Result<()> {
        let last = self.last.as_mut().expect("diff path requires a last frame");
        let width = frame.width as usize;

        let mut dirty: Vec<usize> = frame.dirty_indices().to_vec();
        dirty.sort_unstable();

        let mut pen = Pen::default();
        let mut cur_pos: Option<(u16, u16)> = None;

        for idx in dirty {
            if idx >= last.cells.len() {
                continue;
            }
            let cell = frame.cell_at_index(idx);
            if last.cells[idx] == cell {
                continue;
            }
            last.cells[idx] = cell;

            let x = (idx % width) as u16;
            let y = (idx / width) as u16;
            if cur_pos != Some((x, y)) {
                self.stdout.queue(cursor::MoveTo(x, y))?;
            }
            pen.apply(&mut self.stdout, cell)?;
            self.stdout.queue(Print(cell.ch))?;

            let next_x = x.saturating_add(1);
            cur_pos = if next_x < frame.width {
                Some((next_x, y))
            } else {
                None
            };
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }
}

/// Tracks the attributes currently programmed into the terminal so
/// consecutive same-colored cells cost no escape sequences.
#[derive(Default)]
struct Pen {
    fg: Option<Option<Color>>,
    bg: Option<Option<Color>>,
    bold: Option<bool>,
}

impl Pen {
    fn apply(&mut self, out: &mut Stdout, cell: Cell) -> Result<()> {
        if self.fg != Some(cell.fg) {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = Some(cell.bg);
        }
        if self.bold != Some(cell.bold) {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = Some(cell.bold);
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
