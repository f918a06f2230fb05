use serde::Serialize;
use std::io::{self, Write};

/// A structure that can be serialized to JSON and parsed by Waybar.
///
/// Values are HTML-escaped since Waybar renders them as Pango markup.
#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct WaybarCustomModule {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
}

fn escape(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

impl WaybarCustomModule {
    /// A module without content, which Waybar hides.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(escape(text));
        self
    }
    #[must_use]
    pub fn alt(mut self, alt: &str) -> Self {
        self.alt = Some(escape(alt));
        self
    }
    #[must_use]
    pub fn tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = Some(escape(tooltip));
        self
    }
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(escape(class));
        self
    }

    /// Format the module as JSON and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format<T: Write>(&self, mut f: &mut T) -> io::Result<()> {
        serde_json::to_writer(&mut f, self)?;
        f.write_all(b"\n")?;
        f.flush()
    }
}
