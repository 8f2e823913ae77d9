// ABOUTME: Mount targets that receive rendered markup or the inline error block
// ABOUTME: Includes an in-memory buffer target for headless use

use std::sync::Mutex;

/// A host container the synthesizer clears and engines render into
pub trait MountTarget: Send + Sync {
    fn clear(&self);

    fn set_markup(&self, markup: &str);

    fn markup(&self) -> String;
}

/// Target backed by a string buffer
#[derive(Debug, Default)]
pub struct BufferTarget {
    markup: Mutex<String>,
}

impl BufferTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MountTarget for BufferTarget {
    fn clear(&self) {
        if let Ok(mut markup) = self.markup.lock() {
            markup.clear();
        }
    }

    fn set_markup(&self, markup: &str) {
        if let Ok(mut current) = self.markup.lock() {
            *current = markup.to_string();
        }
    }

    fn markup(&self) -> String {
        self.markup
            .lock()
            .map(|markup| markup.clone())
            .unwrap_or_default()
    }
}

/// Inline block shown in place of a component that failed to mount
pub fn error_markup(message: &str) -> String {
    format!(
        "<div style=\"color: red; padding: 10px;\">\n  <strong>Mount Error:</strong><br>\n  {}\n</div>",
        html_escape(message)
    )
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
