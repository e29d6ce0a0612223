//! Image file picker used by the toolbar's attach control.
//!
//! The picker browses one directory at a time, lists directories before
//! files, and only lets the user choose png, jpeg and gif images. Other files
//! are listed but dimmed. Choosing an image emits a [`FileSelectedMsg`]; the
//! host reads the file and calls [`Model::reset`] afterwards so the same
//! file can be chosen again.
//!
//! # Key Bindings
//!
//! - `j`/`↓`: Move cursor down
//! - `k`/`↑`: Move cursor up
//! - `l`/`→`/`Enter`: Open directory or choose image
//! - `h`/`←`/`Backspace`: Go to parent directory
//!
//! ```rust
//! use bubbletea_panels::filepicker::{image_mime, Model};
//! use std::path::Path;
//!
//! let picker = Model::new().with_directory(std::env::temp_dir());
//! assert!(picker.selected_path().is_none());
//! assert_eq!(image_mime(Path::new("cat.JPG")), Some("image/jpeg"));
//! assert_eq!(image_mime(Path::new("notes.txt")), None);
//! ```

use crate::key::{Binding, KeyMap};
use bubbletea_rs::{Cmd, KeyMsg, Msg, WindowSizeMsg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::warn;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

const MARGIN_BOTTOM: usize = 5;

/// Returns the MIME type for a supported image path.
///
/// Matching is on the extension only, case-insensitively.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Result of an asynchronous directory read.
#[derive(Debug, Clone)]
pub struct ReadDirMsg {
    /// Picker that asked for the read.
    pub id: i64,
    /// Directory that was read.
    pub directory: PathBuf,
    /// Sorted entries, or the error text.
    pub entries: Result<Vec<FileEntry>, String>,
}

/// Emitted when the user chooses an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelectedMsg {
    /// Picker the image was chosen in.
    pub id: i64,
    /// The chosen file.
    pub path: PathBuf,
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Directory (or a link to one).
    pub is_dir: bool,
}

impl FileEntry {
    /// Whether the entry can be chosen.
    pub fn selectable(&self) -> bool {
        !self.is_dir && image_mime(&self.path).is_some()
    }
}

fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}

fn read_entries(directory: &Path) -> std::io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(directory)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // `Path::is_dir` follows symlinks.
        let is_dir = path.is_dir();
        entries.push(FileEntry { name, path, is_dir });
    }
    sort_entries(&mut entries);
    Ok(entries)
}

/// Key bindings for the picker.
#[derive(Debug, Clone)]
pub struct FilepickerKeyMap {
    /// Cursor down.
    pub down: Binding,
    /// Cursor up.
    pub up: Binding,
    /// Parent directory.
    pub back: Binding,
    /// Open directory or choose image.
    pub open: Binding,
}

impl Default for FilepickerKeyMap {
    fn default() -> Self {
        Self {
            down: Binding::new(vec![KeyCode::Char('j'), KeyCode::Down]).with_help("j", "down"),
            up: Binding::new(vec![KeyCode::Char('k'), KeyCode::Up]).with_help("k", "up"),
            back: Binding::new(vec![KeyCode::Char('h'), KeyCode::Backspace, KeyCode::Left])
                .with_help("h", "back"),
            open: Binding::new(vec![KeyCode::Char('l'), KeyCode::Right, KeyCode::Enter])
                .with_help("l", "open"),
        }
    }
}

impl KeyMap for FilepickerKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.up, &self.down, &self.back, &self.open]
    }
}

/// Picker styles.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Cursor marker.
    pub cursor: Style,
    /// Directory names.
    pub directory: Style,
    /// Image names.
    pub file: Style,
    /// Files that cannot be chosen.
    pub disabled_file: Style,
    /// Row under the cursor.
    pub selected: Style,
    /// Empty-directory and error text.
    pub empty_directory: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            cursor: Style::new().foreground(Color::from("212")),
            directory: Style::new().foreground(Color::from("99")),
            file: Style::new(),
            disabled_file: Style::new().foreground(Color::from("243")),
            selected: Style::new().foreground(Color::from("212")).bold(true),
            empty_directory: Style::new().foreground(Color::from("240")),
        }
    }
}

/// The picker.
#[derive(Debug, Clone)]
pub struct Model {
    /// Directory being shown.
    pub current_directory: PathBuf,
    /// Visible rows.
    pub height: usize,
    /// Resize `height` from window size messages.
    pub auto_height: bool,
    /// Cursor glyph.
    pub cursor: String,
    /// Key bindings.
    pub keymap: FilepickerKeyMap,
    /// Styles.
    pub styles: Styles,
    id: i64,
    files: Vec<FileEntry>,
    selected: usize,
    offset: usize,
    history: Vec<usize>,
    path: Option<PathBuf>,
    error: Option<String>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates a picker rooted at the working directory.
    pub fn new() -> Self {
        Self {
            current_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            height: 10,
            auto_height: true,
            cursor: ">".to_string(),
            keymap: FilepickerKeyMap::default(),
            styles: Styles::default(),
            id: next_id(),
            files: Vec::new(),
            selected: 0,
            offset: 0,
            history: Vec::new(),
            path: None,
            error: None,
        }
    }

    /// Starts in `directory` (builder pattern).
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.current_directory = directory.into();
        self
    }

    /// Unique id of this picker.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Entries of the current directory.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Index of the cursor row.
    pub fn cursor_index(&self) -> usize {
        self.selected
    }

    /// The last chosen image, until [`Model::reset`].
    pub fn selected_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Error from the last directory read.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Forgets the chosen image.
    pub fn reset(&mut self) {
        self.path = None;
    }

    /// Reads the current directory synchronously.
    pub fn read_dir(&mut self) {
        let directory = self.current_directory.clone();
        let entries = read_entries(&directory).map_err(|err| err.to_string());
        self.apply_entries(entries);
    }

    /// Reads the current directory in the background, yielding a [`ReadDirMsg`].
    pub fn read_dir_cmd(&self) -> Cmd {
        let id = self.id;
        let directory = self.current_directory.clone();
        Box::pin(async move {
            let entries = read_entries_async(&directory)
                .await
                .map_err(|err| err.to_string());
            Some(Box::new(ReadDirMsg {
                id,
                directory,
                entries,
            }) as Msg)
        })
    }

    fn apply_entries(&mut self, entries: Result<Vec<FileEntry>, String>) {
        match entries {
            Ok(files) => {
                self.files = files;
                self.error = None;
            }
            Err(err) => {
                warn!(directory = %self.current_directory.display(), error = %err, "could not read directory");
                self.files.clear();
                self.error = Some(format!("Failed to read directory: {}", err));
            }
        }
        self.selected = self.selected.min(self.files.len().saturating_sub(1));
        self.scroll_to_cursor();
    }

    fn scroll_to_cursor(&mut self) {
        let height = self.height.max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
    }

    fn enter(&mut self, directory: PathBuf) -> Cmd {
        self.history.push(self.selected);
        self.selected = 0;
        self.change_directory(directory)
    }

    fn leave(&mut self) -> Option<Cmd> {
        let parent = self.current_directory.parent()?.to_path_buf();
        self.selected = self.history.pop().unwrap_or(0);
        Some(self.change_directory(parent))
    }

    // The old listing is dropped so keys cannot act on it while the new one loads.
    fn change_directory(&mut self, directory: PathBuf) -> Cmd {
        self.current_directory = directory;
        self.files.clear();
        self.error = None;
        self.offset = 0;
        self.read_dir_cmd()
    }

    /// Handles directory reads, resizes and keys.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(size) = msg.downcast_ref::<WindowSizeMsg>() {
            if self.auto_height {
                self.height = usize::from(size.height).saturating_sub(MARGIN_BOTTOM).max(1);
                self.scroll_to_cursor();
            }
            return None;
        }

        if let Some(read) = msg.downcast_ref::<ReadDirMsg>() {
            if read.id == self.id && read.directory == self.current_directory {
                self.apply_entries(read.entries.clone());
            }
            return None;
        }

        let key = msg.downcast_ref::<KeyMsg>()?;
        self.handle_key(key)
    }

    fn handle_key(&mut self, key: &KeyMsg) -> Option<Cmd> {
        if self.keymap.down.matches(key) {
            if self.selected + 1 < self.files.len() {
                self.selected += 1;
            }
            self.scroll_to_cursor();
        } else if self.keymap.up.matches(key) {
            self.selected = self.selected.saturating_sub(1);
            self.scroll_to_cursor();
        } else if self.keymap.back.matches(key) {
            return self.leave();
        } else if self.keymap.open.matches(key) {
            let entry = self.files.get(self.selected)?.clone();
            if entry.is_dir {
                return Some(self.enter(entry.path));
            } else if entry.selectable() {
                self.path = Some(entry.path.clone());
                return Some(crate::emit(Box::new(FileSelectedMsg {
                    id: self.id,
                    path: entry.path,
                })));
            }
        }
        None
    }

    /// Renders the visible rows.
    pub fn view(&self) -> String {
        if let Some(error) = &self.error {
            return self.styles.empty_directory.render(error);
        }
        if self.files.is_empty() {
            return self.styles.empty_directory.render("No images here.");
        }

        let blank = " ".repeat(self.cursor.chars().count());
        self.files
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.height.max(1))
            .map(|(i, f)| {
                let name = if f.is_dir {
                    format!("{}/", f.name)
                } else {
                    f.name.clone()
                };
                if i == self.selected {
                    format!(
                        "{} {}",
                        self.styles.cursor.render(&self.cursor),
                        self.styles.selected.render(&name)
                    )
                } else {
                    let style = if f.is_dir {
                        &self.styles.directory
                    } else if f.selectable() {
                        &self.styles.file
                    } else {
                        &self.styles.disabled_file
                    };
                    format!("{} {}", blank, style.render(&name))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

async fn read_entries_async(directory: &Path) -> std::io::Result<Vec<FileEntry>> {
    let mut dir = tokio::fs::read_dir(directory).await?;
    let mut entries = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push(FileEntry { name, path, is_dir });
    }
    sort_entries(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> Msg {
        Box::new(KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("albums")).unwrap();
        fs::write(dir.path().join("albums").join("inner.gif"), b"GIF89a").unwrap();
        fs::write(dir.path().join("b.png"), b"\x89PNG").unwrap();
        fs::write(dir.path().join("a.txt"), b"text").unwrap();
        fs::write(dir.path().join(".hidden.png"), b"x").unwrap();
        dir
    }

    fn names(picker: &Model) -> Vec<&str> {
        picker.files().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("x.png")), Some("image/png"));
        assert_eq!(image_mime(Path::new("x.jpeg")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("x.GIF")), Some("image/gif"));
        assert_eq!(image_mime(Path::new("x.webp")), None);
        assert_eq!(image_mime(Path::new("png")), None);
    }

    #[test]
    fn test_read_dir_sorts_and_skips_hidden() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        picker.read_dir();
        assert_eq!(names(&picker), vec!["albums", "a.txt", "b.png"]);
        assert!(picker.files()[0].is_dir);
        assert!(!picker.files()[1].selectable());
        assert!(picker.files()[2].selectable());
    }

    #[test]
    fn test_non_images_cannot_be_chosen() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        picker.read_dir();
        picker.update(&key(KeyCode::Down));
        assert!(picker.update(&key(KeyCode::Enter)).is_none());
        assert!(picker.selected_path().is_none());
    }

    #[tokio::test]
    async fn test_choosing_image_emits_selection() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        picker.read_dir();
        picker.update(&key(KeyCode::Down));
        picker.update(&key(KeyCode::Down));
        let cmd = picker.update(&key(KeyCode::Enter)).expect("image chosen");
        let msg = cmd.await.unwrap();
        let selected = msg.downcast_ref::<FileSelectedMsg>().unwrap();
        assert_eq!(selected.id, picker.id());
        assert_eq!(selected.path, dir.path().join("b.png"));
        assert_eq!(picker.selected_path(), Some(dir.path().join("b.png").as_path()));

        picker.reset();
        assert!(picker.selected_path().is_none());
    }

    #[tokio::test]
    async fn test_enter_and_leave_directory_restores_cursor() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        picker.read_dir();
        picker.update(&key(KeyCode::Down));
        picker.update(&key(KeyCode::Up));

        let cmd = picker.update(&key(KeyCode::Enter)).expect("directory read");
        assert_eq!(picker.current_directory, dir.path().join("albums"));
        assert!(picker.files().is_empty(), "listing waits for the read");
        picker.update(&cmd.await.unwrap());
        assert_eq!(names(&picker), vec!["inner.gif"]);

        let cmd = picker.update(&key(KeyCode::Char('h'))).expect("parent read");
        assert_eq!(picker.current_directory, dir.path());
        picker.update(&cmd.await.unwrap());
        assert_eq!(picker.cursor_index(), 0);
        assert_eq!(names(&picker).len(), 3);
    }

    #[tokio::test]
    async fn test_late_listing_of_previous_directory_is_ignored() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        let root_read = picker.read_dir_cmd();

        picker.read_dir();
        let cmd = picker.update(&key(KeyCode::Enter)).expect("directory read");
        picker.update(&root_read.await.unwrap());
        assert!(picker.files().is_empty());

        picker.update(&cmd.await.unwrap());
        assert_eq!(names(&picker), vec!["inner.gif"]);
    }

    #[tokio::test]
    async fn test_async_read_matches_sync_read() {
        let dir = fixture();
        let mut picker = Model::new().with_directory(dir.path());
        let msg = picker.read_dir_cmd().await.unwrap();
        picker.update(&msg);
        assert_eq!(names(&picker), vec!["albums", "a.txt", "b.png"]);
    }

    #[test]
    fn test_missing_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut picker = Model::new().with_directory(dir.path().join("gone"));
        picker.styles.empty_directory = Style::new();
        picker.read_dir();
        assert!(picker.files().is_empty());
        assert!(picker.view().starts_with("Failed to read directory"));
    }

    #[test]
    fn test_view_scrolls_with_cursor() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("{i}.png")), b"x").unwrap();
        }
        let mut picker = Model::new().with_directory(dir.path());
        picker.height = 2;
        picker.styles = Styles {
            cursor: Style::new(),
            directory: Style::new(),
            file: Style::new(),
            disabled_file: Style::new(),
            selected: Style::new(),
            empty_directory: Style::new(),
        };
        picker.read_dir();
        assert_eq!(picker.view(), "> 0.png\n  1.png");
        for _ in 0..3 {
            picker.update(&key(KeyCode::Char('j')));
        }
        assert_eq!(picker.view(), "  2.png\n> 3.png");
    }
}
