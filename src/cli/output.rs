//! Colored terminal output for release operations
//!
//! Normal messages go to stdout, errors to stderr. Write failures on the
//! terminal are ignored; there is nowhere left to report them.

use std::io::Write;
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    /// Output manager that prints nothing but errors
    pub fn quiet() -> Self {
        Self::new(false, true)
    }

    fn emit(&self, glyph: Glyph<'_>, message: &str) {
        let mut buffer = self.bufwtr.buffer();
        write_line(&mut buffer, glyph, message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(Glyph::plain("ℹ", Color::Cyan), message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(Glyph::bold("✓", Color::Green), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(Glyph::bold("⚠", Color::Yellow).tinted(), message);
    }

    /// Print an error message to stderr (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        write_line(&mut buffer, Glyph::bold("✗", Color::Red).tinted(), message);
        if bufwtr.print(&buffer).is_err() {
            println!("✗ {}", message);
        }
    }

    /// Print a message only in verbose (`--debug`) mode
    pub fn verbose(&self, message: &str) {
        if !self.verbose || self.quiet {
            return;
        }
        self.emit(Glyph::plain("→", Color::Blue), message);
    }

    /// Print a progress message for a long running step
    pub fn progress(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.emit(Glyph::plain("⋯", Color::Magenta), message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer);
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = writeln!(&mut buffer, "═══ {} ═══", title);
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print indented text, one line per input line
    pub fn indent(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.bufwtr.buffer();
        for line in message.lines() {
            let _ = writeln!(&mut buffer, "    {}", line);
        }
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print a plain message
    pub fn println(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer, "{}", message);
        let _ = self.bufwtr.print(&buffer);
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

/// Leading symbol of a message and how it is colored
#[derive(Debug, Clone, Copy)]
struct Glyph<'a> {
    symbol: &'a str,
    color: Color,
    bold: bool,
    /// Color the message text as well
    tint_text: bool,
}

impl<'a> Glyph<'a> {
    fn plain(symbol: &'a str, color: Color) -> Self {
        Self {
            symbol,
            color,
            bold: false,
            tint_text: false,
        }
    }

    fn bold(symbol: &'a str, color: Color) -> Self {
        Self {
            bold: true,
            ..Self::plain(symbol, color)
        }
    }

    fn tinted(self) -> Self {
        Self {
            tint_text: true,
            ..self
        }
    }
}

fn write_line(buffer: &mut Buffer, glyph: Glyph<'_>, message: &str) {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(glyph.color)).set_bold(glyph.bold);
    let _ = buffer.set_color(&spec);
    let _ = write!(buffer, "{}", glyph.symbol);
    let _ = buffer.reset();
    if glyph.tint_text {
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(glyph.color)));
    }
    let _ = writeln!(buffer, " {}", message);
    let _ = buffer.reset();
}
