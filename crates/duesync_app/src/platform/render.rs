use duesync_core::{AppViewModel, StatusLine};

/// Prints status lines as they change.
pub struct Renderer {
    color: bool,
    last_status: Option<StatusLine>,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            last_status: None,
        }
    }

    /// Lines to print for `view`; empty when the status has not changed.
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let Some(status) = view.status.as_ref() else {
            return Vec::new();
        };
        if self.last_status.as_ref() == Some(status) {
            return Vec::new();
        }
        self.last_status = Some(status.clone());
        vec![format_status(status, self.color)]
    }
}

pub fn format_status(line: &StatusLine, color: bool) -> String {
    if !color {
        return line.message.clone();
    }
    match hex_to_rgb(line.kind.color()) {
        Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{}\x1b[0m", line.message),
        None => line.message.clone(),
    }
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
