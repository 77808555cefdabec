//! Terminal progress reporting for the song-processing loop.
//!
//! A single-line bar with filled/empty cells, a counter and a postfix
//! showing the query in flight, redrawn in place with crossterm.  Outcome
//! lines are printed above the bar through [`ProgressBar::log`].

use std::io::{self, Write};

use crossterm::{
    cursor, execute,
    terminal::{self, Clear, ClearType},
};

use crate::matcher::MatchResult;
use crate::query::NormalizedQuery;

const BAR_CELLS: usize = 24;

pub struct ProgressBar {
    total: usize,
    done: usize,
    width: usize,
}

impl ProgressBar {
    pub fn new(total: usize) -> Self {
        let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(80);
        ProgressBar {
            total,
            done: 0,
            width: width.max(40),
        }
    }

    /// Redraw the bar with a postfix note, truncated to the terminal width.
    pub fn draw(&self, postfix: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;

        let filled = if self.total == 0 {
            BAR_CELLS
        } else {
            BAR_CELLS * self.done.min(self.total) / self.total
        };
        let mut line = format!(
            "[{}{}] {}/{}",
            "#".repeat(filled),
            "-".repeat(BAR_CELLS - filled),
            self.done,
            self.total
        );
        if !postfix.is_empty() {
            line.push_str("  ");
            line.push_str(postfix);
        }
        let line: String = line.chars().take(self.width - 1).collect();
        print!("{}", line);
        stdout.flush()
    }

    /// Print a full line above the bar, then redraw the bar.
    pub fn log(&self, message: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        println!("{}", message);
        self.draw("")
    }

    pub fn advance(&mut self) {
        self.done += 1;
    }

    /// Clear the bar line once the loop is done.
    pub fn finish(&self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        stdout.flush()
    }
}

/// Per-query diagnostic dump: the normalized query and the component
/// scores of the top-ranked candidates.
pub fn print_match_report(result: &MatchResult, limit: usize) {
    let normalized = NormalizedQuery::parse(&result.query);
    println!("  query: \"{}\"", normalized.full_text);
    if result.top_candidates.is_empty() {
        println!("  no candidates");
        return;
    }
    for (i, scored) in result.top_candidates.iter().take(limit).enumerate() {
        let c = &scored.candidate;
        println!(
            "  {}. {} - {}  [{}{}]",
            i + 1,
            c.artist,
            c.title,
            c.album.as_deref().unwrap_or("?"),
            c.year.map(|y| format!(", {}", y)).unwrap_or_default()
        );
        println!(
            "     full {:.3}  title {:.3}  artist {:.3}  ->  {:.3}",
            scored.full_score, scored.title_score, scored.artist_score, scored.weighted_score
        );
    }
}
