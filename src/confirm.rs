#[cfg(test)]
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
    /// Approve this and every remaining item of the current category.
    All,
    /// Stop the run; completed actions stay done.
    Quit,
}

impl Decision {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Yes,
            "a" | "all" => Self::All,
            "q" | "quit" => Self::Quit,
            _ => Self::No,
        }
    }
}

#[derive(Debug)]
pub struct ConfirmRequest<'a> {
    pub action: &'a str,
    pub path: &'a Path,
    pub size: u64,
    /// Shown for review-tier caches.
    pub sample: &'a [String],
}

/// Source of per-item decisions. Blocks until one is available.
pub trait Confirm {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> Decision;
}

/// Prompts on stderr and reads answers from stdin.
pub struct ConsoleConfirmer<R> {
    input: R,
}

impl ConsoleConfirmer<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> Confirm for ConsoleConfirmer<R> {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> Decision {
        let mut stderr = io::stderr();
        let _ = writeln!(
            stderr,
            "{} {} ({})",
            request.action,
            request.path.display(),
            crate::scanner::size::format_size(request.size)
        );
        if !request.sample.is_empty() {
            let _ = writeln!(stderr, "  contains: {}", request.sample.join(", "));
        }
        let _ = write!(stderr, "Proceed? [y/N/all/quit] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            // EOF: no one left to ask
            Ok(0) => Decision::Quit,
            Ok(_) => Decision::parse(&answer),
            Err(_) => Decision::No,
        }
    }
}

/// Replays a fixed list of decisions, then answers `No`.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    decisions: VecDeque<Decision>,
    pub asked: Vec<std::path::PathBuf>,
}

#[cfg(test)]
impl ScriptedConfirmer {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Confirm for ScriptedConfirmer {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> Decision {
        self.asked.push(request.path.to_path_buf());
        self.decisions.pop_front().unwrap_or(Decision::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answers() {
        assert_eq!(Decision::parse("y\n"), Decision::Yes);
        assert_eq!(Decision::parse("YES"), Decision::Yes);
        assert_eq!(Decision::parse("all"), Decision::All);
        assert_eq!(Decision::parse("q"), Decision::Quit);
        assert_eq!(Decision::parse(""), Decision::No);
        assert_eq!(Decision::parse("maybe"), Decision::No);
    }

    #[test]
    fn console_reads_lines_and_quits_on_eof() {
        let mut confirmer = ConsoleConfirmer {
            input: "y\nn\n".as_bytes(),
        };
        let request = ConfirmRequest {
            action: "DELETE",
            path: Path::new("/tmp/x"),
            size: 10,
            sample: &[],
        };

        assert_eq!(confirmer.confirm(&request), Decision::Yes);
        assert_eq!(confirmer.confirm(&request), Decision::No);
        assert_eq!(confirmer.confirm(&request), Decision::Quit);
    }
}
