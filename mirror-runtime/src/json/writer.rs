// Minimal JSON object writer for flat scalar members.

use std::fmt::Write as _;

/// Output layout of a [`ObjectWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One member per line, two-space indent: the file format.
    Pretty,
    /// Single line, no whitespace: used inside protocol payloads.
    Compact,
}

/// Writes one JSON object member by member.
pub struct ObjectWriter {
    out: String,
    layout: Layout,
    members: usize,
}

impl ObjectWriter {
    pub fn new(layout: Layout) -> Self {
        let mut out = String::with_capacity(64);
        out.push('{');
        ObjectWriter { out, layout, members: 0 }
    }

    fn key(&mut self, name: &str) {
        match self.layout {
            Layout::Pretty => {
                self.out.push_str(if self.members == 0 { "\n  " } else { ",\n  " });
                write_string(&mut self.out, name);
                self.out.push_str(": ");
            }
            Layout::Compact => {
                if self.members > 0 {
                    self.out.push(',');
                }
                write_string(&mut self.out, name);
                self.out.push(':');
            }
        }
        self.members += 1;
    }

    pub fn bool(&mut self, name: &str, value: bool) {
        self.key(name);
        self.out.push_str(if value { "true" } else { "false" });
    }

    pub fn int(&mut self, name: &str, value: i32) {
        self.key(name);
        let _ = write!(self.out, "{value}");
    }

    pub fn number(&mut self, name: &str, value: f64) {
        self.key(name);
        write_fixed(&mut self.out, value);
    }

    pub fn string(&mut self, name: &str, value: &str) {
        self.key(name);
        write_string(&mut self.out, value);
    }

    pub fn members(&self) -> usize {
        self.members
    }

    pub fn finish(mut self) -> String {
        if self.layout == Layout::Pretty {
            self.out.push('\n');
        }
        self.out.push('}');
        self.out
    }
}

/// Fixed-point with six decimals; `null` for NaN and infinities.
pub fn write_fixed(out: &mut String, value: f64) {
    if value.is_finite() {
        let _ = write!(out, "{value:.6}");
    } else {
        out.push_str("null");
    }
}

/// Quoted and escaped JSON string.
pub fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
