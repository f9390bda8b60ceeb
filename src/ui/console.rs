use parking_lot::Mutex;
use std::io::{BufRead, Write};

use super::render::{render_table, RenderedTable, TableRow};
use super::{Confirmer, ListView, Notifier};

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("[OK] {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("[!!] {}", message);
    }
}

/// Reads `y`/`yes` from stdin. Anything else, including EOF, declines.
/// The read blocks; the delete flow calls it on a blocking thread.
pub struct ConsoleConfirmer;

impl Confirmer for ConsoleConfirmer {
    fn confirm(&self, title: &str, text: &str) -> bool {
        print!("{}: {} [y/N] ", title, text);
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Prints list pages to stdout and remembers the last row bindings.
#[derive(Default)]
pub struct ConsoleView {
    last: Mutex<RenderedTable>,
    quiet: bool,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps row bindings without printing. Used by one-shot edit/delete.
    pub fn quiet() -> Self {
        Self {
            last: Mutex::new(RenderedTable::default()),
            quiet: true,
        }
    }

    /// Entity id for a row number or id shown in the last rendered table.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        self.last.lock().resolve(reference).map(str::to_string)
    }
}

impl<E: TableRow> ListView<E> for ConsoleView {
    fn render(&self, rows: &[E]) {
        let table = render_table(rows);
        if !self.quiet {
            println!();
            print!("{}", table.text);
            println!();
        }
        *self.last.lock() = table;
    }
}
