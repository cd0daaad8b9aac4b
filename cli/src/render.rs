//! Text and JSON renderers for the terminal.

use std::io::{self, Write};
use std::sync::Mutex;

use serde::Serialize;
use storage_navigator_core::navigation::{ActionSource, NullActionSource};
use storage_navigator_core::{Entry, NavigatorError, RenderData, Renderer};

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMAT: &str = "%I:%M %p";

/// Prints a listing as a `dir`-style table.
pub struct ConsoleRenderer<W> {
    out: Mutex<W>,
    source: Box<dyn ActionSource>,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    /// Write to `out`. Requests are not classified until an action source is
    /// set with [`ConsoleRenderer::with_action_source`].
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            source: Box::new(NullActionSource),
        }
    }

    pub fn with_action_source(mut self, source: impl ActionSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }
}

impl<W: Write + Send> Renderer for ConsoleRenderer<W> {
    fn render(&self, data: &RenderData<'_>) -> Result<(), NavigatorError> {
        let table = format_table(data);
        let mut out = self
            .out
            .lock()
            .map_err(|e| NavigatorError::Render(e.to_string()))?;
        out.write_all(table.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| NavigatorError::Render(e.to_string()))
    }

    fn action_source(&self) -> &dyn ActionSource {
        self.source.as_ref()
    }
}

/// Format `data` as the console table.
pub fn format_table(data: &RenderData<'_>) -> String {
    let mut lines = vec![
        format!("Location: {}", data.current_path),
        format!("{:<20}{:<8}{:<14}Name", "Date", "Time", ""),
        "-".repeat(60),
    ];
    for entry in data.listing {
        let (date, time) = match entry.last_modified() {
            Some(modified) => (
                modified.format(DATE_FORMAT).to_string(),
                modified.format(TIME_FORMAT).to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let size = match entry {
            Entry::Directory(_) => "<DIR>".to_string(),
            Entry::File(file) => group_thousands(file.byte_size),
        };
        lines.push(format!(
            "{date:<12} {time:<12} {size:<16} {}",
            entry.name()
        ));
    }
    let mut table = lines.join("\n");
    table.push('\n');
    table
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// JSON form of one listing: the render data plus each entry's
/// modification time in the configured `date_format`.
#[derive(Serialize)]
struct JsonListing<'a> {
    #[serde(flatten)]
    data: &'a RenderData<'a>,
    modified: Vec<Option<String>>,
}

/// Serialize `data` as a pretty-printed JSON document.
pub fn json_document(data: &RenderData<'_>) -> Result<String, serde_json::Error> {
    let modified = data
        .listing
        .iter()
        .map(|entry| {
            entry
                .last_modified()
                .map(|dt| data.config.format_datetime(&dt))
        })
        .collect();
    serde_json::to_string_pretty(&JsonListing { data, modified })
}

/// Prints the render data as one JSON document per listing.
pub struct JsonRenderer {
    source: Box<dyn ActionSource>,
}

impl JsonRenderer {
    pub fn new(source: impl ActionSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, data: &RenderData<'_>) -> Result<(), NavigatorError> {
        let json = json_document(data).map_err(|e| NavigatorError::Render(e.to_string()))?;
        println!("{json}");
        Ok(())
    }

    fn action_source(&self) -> &dyn ActionSource {
        self.source.as_ref()
    }
}
