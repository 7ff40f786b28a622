//! Terminal output for `relay-bot` startup and `relay-bot init`.
//!
//! Every line is either colored with a glyph or, under `--no-color`, prefixed
//! with a bracketed tag so logs stay greppable.

use owo_colors::OwoColorize;

/// Status marker shown in front of a line.
#[derive(Clone, Copy)]
enum Mark {
    Ok,
    Info,
    Warn,
    Error,
    Skipped,
}

impl Mark {
    fn tag(self) -> &'static str {
        match self {
            Mark::Ok => "[OK]",
            Mark::Info => "[INFO]",
            Mark::Warn => "[WARN]",
            Mark::Error => "[ERROR]",
            Mark::Skipped => "[SKIPPED]",
        }
    }

    fn glyph(self) -> String {
        match self {
            Mark::Ok => "✓".green().bold().to_string(),
            Mark::Info => "•".blue().to_string(),
            Mark::Warn => "⚠".yellow().bold().to_string(),
            Mark::Error => "✗".red().bold().to_string(),
            Mark::Skipped => "○".yellow().to_string(),
        }
    }
}

/// CLI printer; colors are decided once from `--no-color`.
pub struct Output {
    colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Printer matching the `--no-color` flag.
    pub fn for_cli(no_color: bool) -> Self {
        if no_color {
            Self::no_color()
        } else {
            Self::new()
        }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    fn mark_line(&self, mark: Mark, colored_text: String, plain_text: &str) {
        if self.colored {
            println!("  {} {}", mark.glyph(), colored_text);
        } else {
            println!("  {} {}", mark.tag(), plain_text);
        }
    }

    pub fn banner(&self) {
        let version = env!("CARGO_PKG_VERSION");
        if self.colored {
            println!(
                "\n   {}\n   {}\n   {}\n",
                " ┬─┐┌─┐┬  ┌─┐┬ ┬".bright_cyan().bold(),
                " ├┬┘├┤ │  ├─┤└┬┘".cyan().bold(),
                " ┴└─└─┘┴─┘┴ ┴ ┴ ".blue().bold(),
            );
            println!(
                "   {} {}\n",
                "Telegram relay bot".bright_white().bold(),
                format!("v{}", version).dimmed()
            );
        } else {
            println!("\n relay-bot\n   Telegram relay bot v{}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        self.mark_line(Mark::Ok, message.green().to_string(), message);
    }

    pub fn info(&self, message: &str) {
        self.mark_line(Mark::Info, message.to_string(), message);
    }

    pub fn warning(&self, message: &str) {
        self.mark_line(Mark::Warn, message.yellow().to_string(), message);
    }

    /// Errors go to stderr.
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", Mark::Error.glyph(), message.red());
        } else {
            eprintln!("  {} {}", Mark::Error.tag(), message);
        }
    }

    /// A scaffolded file or directory; `kind` is e.g. `config` or `directory`.
    pub fn created(&self, kind: &str, path: &str) {
        self.mark_line(
            Mark::Ok,
            format!("{} {}", kind.dimmed(), path.bright_white()),
            &format!("created {} {}", kind, path),
        );
    }

    pub fn skipped(&self, path: &str, reason: &str) {
        self.mark_line(
            Mark::Skipped,
            format!("{} {}", path.dimmed(), format!("({})", reason).yellow()),
            &format!("{} ({})", path, reason),
        );
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Startup facts such as backend, model and bot handle.
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// A shell command for the user to run.
    pub fn command(&self, cmd: &str) {
        let line = format!("$ {}", cmd);
        if self.colored {
            println!("     {}", line.bright_cyan());
        } else {
            println!("     {}", line);
        }
    }

    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    pub fn newline(&self) {
        println!();
    }
}
