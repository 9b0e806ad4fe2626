#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless rendering adapter for MikanBox.
//!
//! [`TextCanvas`] implements the [`Canvas`] capability by snapping every
//! sprite onto a character cell, which is enough to watch a session in a
//! terminal or to assert on frames in tests.

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use mikanbox_core::{Canvas, Sprite};
use std::{error::Error, fmt, io::Write};

const EMPTY: char = ' ';
const SPRAY_GLYPHS: [char; 4] = ['.', ':', '\'', '`'];

/// Character used to draw `sprite`.
///
/// Fresh fruit is `o`, partly spoiled fruit shows its damage as a digit and
/// spent fruit is `*`. Preservatives go from `P` through `p` to `#`.
#[must_use]
pub fn glyph(sprite: Sprite) -> char {
    match sprite {
        Sprite::Mikan { damage: 0 } => 'o',
        Sprite::Mikan { damage } if damage >= 4 => '*',
        Sprite::Mikan { damage } => char::from_digit(damage, 10).unwrap_or('?'),
        Sprite::Preservative { damage: 0 } => 'P',
        Sprite::Preservative { damage } if damage >= 6 => '#',
        Sprite::Preservative { .. } => 'p',
        Sprite::Spray { frame } => SPRAY_GLYPHS[frame as usize % SPRAY_GLYPHS.len()],
    }
}

/// Character-cell canvas covering a pixel area of `columns x rows` squares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextCanvas {
    columns: u32,
    rows: u32,
    square_size: u32,
    cells: Vec<char>,
}

impl TextCanvas {
    /// Creates a blank canvas.
    ///
    /// Returns an error when `square_size` is zero.
    pub fn new(columns: u32, rows: u32, square_size: u32) -> Result<Self, RenderingError> {
        if square_size == 0 {
            return Err(RenderingError::InvalidSquareSize { square_size });
        }
        Ok(Self {
            columns,
            rows,
            square_size,
            cells: vec![EMPTY; columns as usize * rows as usize],
        })
    }

    /// Erases every character.
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    /// Character at a column and a screen line (line zero is the top).
    #[must_use]
    pub fn glyph_at(&self, column: u32, line: u32) -> Option<char> {
        if column >= self.columns || line >= self.rows {
            return None;
        }
        Some(self.cells[(line * self.columns + column) as usize])
    }

    /// Renders the canvas framed by side walls and a floor.
    #[must_use]
    pub fn frame(&self) -> String {
        let width = self.columns as usize + 3;
        let mut frame = String::with_capacity(width * (self.rows as usize + 1));
        for line in self.cells.chunks(self.columns.max(1) as usize) {
            frame.push('|');
            frame.extend(line.iter());
            frame.push_str("|\n");
        }
        frame.push('+');
        frame.extend(std::iter::repeat('-').take(self.columns as usize));
        frame.push('+');
        frame
    }

    fn cell_of(&self, position: Vec2) -> Option<usize> {
        let size = self.square_size as f32;
        let centre = position + Vec2::splat(size / 2.0);
        if centre.x < 0.0 || centre.y < 0.0 {
            return None;
        }
        let column = (centre.x / size).floor() as u32;
        let line = (centre.y / size).floor() as u32;
        if column >= self.columns || line >= self.rows {
            return None;
        }
        Some((line * self.columns + column) as usize)
    }
}

impl Canvas for TextCanvas {
    fn draw_sprite(&mut self, sprite: Sprite, position: Vec2) {
        let Some(index) = self.cell_of(position) else {
            return;
        };
        // Particles never hide an item.
        if matches!(sprite, Sprite::Spray { .. }) && self.cells[index] != EMPTY {
            return;
        }
        self.cells[index] = glyph(sprite);
    }
}

/// Destination of rendered frames.
pub trait FrameSink {
    /// Presents a single frame.
    fn present(&mut self, frame: &str) -> AnyResult<()>;
}

/// [`FrameSink`] writing frames to any [`Write`] implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for WriterSink<W> {
    fn present(&mut self, frame: &str) -> AnyResult<()> {
        writeln!(self.writer, "{frame}").context("failed to write frame")?;
        self.writer.flush().context("failed to flush frame")
    }
}

/// Errors that can occur when constructing a canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// The square size must be positive to map pixels onto cells.
    InvalidSquareSize {
        /// Provided square size that failed validation.
        square_size: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSquareSize { square_size } => {
                write!(f, "square_size must be positive (received {square_size})")
            }
        }
    }
}

impl Error for RenderingError {}
