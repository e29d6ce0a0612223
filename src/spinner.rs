//! Loading indicators: an animated spinner and a static loading skeleton.
//!
//! Tables show one of the two while a request is in flight. The spinner
//! animates through [`TickMsg`] commands; the skeleton draws placeholder rows
//! shaped like the rows that will replace it.
//!
//! ```rust
//! use bubbletea_panels::spinner::{Model, Skeleton, DOT};
//!
//! let spinner = Model::new().with_spinner(DOT.clone());
//! assert!(!spinner.view().is_empty());
//!
//! let rows = Skeleton::Lines.view(3, 10);
//! assert_eq!(rows.lines().count(), 3);
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use lipgloss_extras::prelude::*;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Animation frames and their pace.
#[derive(Debug, Clone)]
pub struct Spinner {
    /// Frames to cycle through.
    pub frames: Vec<String>,
    /// Delay between frames.
    pub fps: Duration,
}

impl Spinner {
    /// Creates a spinner from frames and a frame delay.
    pub fn new(frames: Vec<String>, fps: Duration) -> Self {
        Self { frames, fps }
    }
}

fn frames(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// `| / - \`
pub static LINE: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: frames(&["|", "/", "-", "\\"]),
    fps: Duration::from_millis(100),
});

/// Braille dots.
pub static DOT: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: frames(&["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "]),
    fps: Duration::from_millis(100),
});

/// Small braille dots, used inline in toolbars.
pub static MINI_DOT: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: frames(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    fps: Duration::from_millis(83),
});

/// Growing ellipsis.
pub static ELLIPSIS: Lazy<Spinner> = Lazy::new(|| Spinner {
    frames: frames(&["", ".", "..", "..."]),
    fps: Duration::from_millis(333),
});

/// Advances one spinner by one frame.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// Spinner the tick belongs to.
    pub id: i64,
    tag: i64,
}

/// An animated spinner.
#[derive(Debug, Clone)]
pub struct Model {
    /// Frames in use.
    pub spinner: Spinner,
    /// Style applied to every frame.
    pub style: Style,
    /// Text after the frame, e.g. `"Loading"`.
    pub label: String,
    frame: usize,
    id: i64,
    tag: i64,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// A line spinner without label.
    pub fn new() -> Self {
        Self {
            spinner: LINE.clone(),
            style: Style::new(),
            label: String::new(),
            frame: 0,
            id: next_id(),
            tag: 0,
        }
    }

    /// Sets the frames (builder pattern).
    pub fn with_spinner(mut self, spinner: Spinner) -> Self {
        self.spinner = spinner;
        self
    }

    /// Sets the style (builder pattern).
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Sets the label (builder pattern).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Unique id of this spinner.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// A tick addressed to this spinner.
    pub fn tick_msg(&self) -> TickMsg {
        TickMsg {
            id: self.id,
            tag: self.tag,
        }
    }

    /// Starts or continues the animation.
    pub fn tick(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        bubbletea_tick(self.spinner.fps, move |_| Box::new(TickMsg { id, tag }) as Msg)
    }

    /// Advances on ticks addressed to this spinner and schedules the next one.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        let tick = msg.downcast_ref::<TickMsg>()?;
        if tick.id != self.id || tick.tag != self.tag {
            return None;
        }
        self.frame = (self.frame + 1) % self.spinner.frames.len().max(1);
        self.tag += 1;
        Some(self.tick())
    }

    /// Renders the current frame and label.
    pub fn view(&self) -> String {
        let Some(frame) = self.spinner.frames.get(self.frame) else {
            return "(error)".to_string();
        };
        let frame = self.style.render(frame);
        if self.label.is_empty() {
            frame
        } else {
            format!("{} {}", frame, self.label)
        }
    }
}

/// Shape of loading placeholder rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skeleton {
    /// One bar per row.
    Lines,
    /// A title bar and a shorter detail bar per row.
    Cards,
}

impl Skeleton {
    /// Renders `count` placeholder rows `width` cells wide.
    pub fn view(&self, count: usize, width: usize) -> String {
        let bar = |w: usize| "░".repeat(w.max(1));
        let mut rows = Vec::with_capacity(count);
        for i in 0..count {
            match self {
                Skeleton::Lines => {
                    // Alternate lengths so the block does not look like a wall.
                    let w = if i % 2 == 0 { width } else { width * 3 / 4 };
                    rows.push(bar(w));
                }
                Skeleton::Cards => {
                    rows.push(format!("{}\n{}", bar(width), bar(width / 2)));
                }
            }
        }
        rows.join("\n")
    }
}
