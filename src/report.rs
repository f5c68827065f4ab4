//! Per-commit reports and their dispatch

use colored::Colorize;
use log::debug;

use crate::commit::Commit;
use crate::error::Result;
use crate::git::Backend;
use crate::notifications::Sink;

/// Everything that goes into one commit's report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub sender: String,
    pub recipient: String,
    pub branch: String,
    pub hash: String,
    pub what_changed: String,
    pub diff: String,
}

impl Report {
    /// Query the backend for the commit's change summary and parent diff
    pub fn for_commit(
        backend: &dyn Backend,
        commit: &Commit,
        sender: &str,
        recipient: &str,
    ) -> Result<Self> {
        Ok(Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            branch: commit.branch().name().to_string(),
            hash: commit.hash().to_string(),
            what_changed: commit.what_changed(backend)?.to_string(),
            diff: commit.diff(backend)?,
        })
    }

    /// Render as a plain-text mail message
    pub fn render(&self) -> String {
        format!(
            "From: {sender}\n\
             To: {recipient}\n\
             Content-type: text/plain\n\
             Subject: {branch} {hash}\n\
             Branch: {branch}\n\
             \n\
             {what_changed}\n\
             \n\
             {diff}",
            sender = self.sender,
            recipient = self.recipient,
            branch = self.branch,
            hash = self.hash,
            what_changed = self.what_changed,
            diff = self.diff,
        )
    }
}

/// Renders commits in order and hands them to a sink
pub struct Dispatcher<'a> {
    sender: &'a str,
    recipient: &'a str,
    sink: &'a mut dyn Sink,
    dry_run: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(sender: &'a str, recipient: &'a str, sink: &'a mut dyn Sink, dry_run: bool) -> Self {
        Self {
            sender,
            recipient,
            sink,
            dry_run,
        }
    }

    /// Render and deliver one commit's report.
    ///
    /// In dry-run mode the report is rendered but never delivered.
    pub fn dispatch(&mut self, backend: &dyn Backend, commit: &Commit) -> Result<()> {
        let message = Report::for_commit(backend, commit, self.sender, self.recipient)?.render();

        if self.dry_run {
            println!(
                "  {} {} {}",
                "○".yellow(),
                commit.to_string().cyan(),
                "(dry run)".dimmed()
            );
            debug!("skipped {} byte report for {}", message.len(), commit);
            return Ok(());
        }

        println!("  {} {}", "→".green(), commit.to_string().cyan());
        self.sink.deliver(commit.hash(), &message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeBackend;
    use crate::notifications::MemorySink;
    use crate::revision::Branch;

    fn backend() -> FakeBackend {
        let mut backend = FakeBackend::new();
        backend
            .commit("abc123", &[])
            .commit("def456", &["abc123"])
            .branch("main", "def456");
        backend
    }

    fn commit(backend: &FakeBackend, hash: &str) -> Commit {
        Commit::new(backend, hash, Branch::lookup(backend, "main").unwrap()).unwrap()
    }

    #[test]
    fn test_render_layout() {
        let report = Report {
            sender: "dev@example.com".to_string(),
            recipient: "commits@example.com".to_string(),
            branch: "main".to_string(),
            hash: "def456".to_string(),
            what_changed: "commit def456\n:100644 100644 M\tsrc/lib.rs".to_string(),
            diff: "--- a/src/lib.rs\n+++ b/src/lib.rs".to_string(),
        };

        let expected = "From: dev@example.com\n\
                        To: commits@example.com\n\
                        Content-type: text/plain\n\
                        Subject: main def456\n\
                        Branch: main\n\
                        \n\
                        commit def456\n\
                        :100644 100644 M\tsrc/lib.rs\n\
                        \n\
                        --- a/src/lib.rs\n\
                        +++ b/src/lib.rs";
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn test_report_diffs_against_parent() {
        let backend = backend();
        let report = Report::for_commit(&backend, &commit(&backend, "def456"), "a@x", "b@x").unwrap();
        assert_eq!(report.diff, "diff abc123..def456");
        assert_eq!(report.branch, "main");
        assert_eq!(report.hash, "def456");
    }

    #[test]
    fn test_report_for_root_commit() {
        let backend = backend();
        let report = Report::for_commit(&backend, &commit(&backend, "abc123"), "a@x", "b@x").unwrap();
        assert_eq!(report.diff, "diff empty..abc123");
    }

    #[test]
    fn test_dispatch_delivers() {
        let backend = backend();
        let mut sink = MemorySink::default();
        let mut dispatcher = Dispatcher::new("a@x", "b@x", &mut sink, false);

        dispatcher.dispatch(&backend, &commit(&backend, "def456")).unwrap();

        assert_eq!(sink.messages.len(), 1);
        assert!(sink.messages[0].starts_with("From: a@x\nTo: b@x\n"));
        assert!(sink.messages[0].contains("Subject: main def456\n"));
    }

    #[test]
    fn test_dry_run_renders_without_delivering() {
        let backend = backend();
        let mut sink = MemorySink::default();
        let mut dispatcher = Dispatcher::new("a@x", "b@x", &mut sink, true);

        dispatcher.dispatch(&backend, &commit(&backend, "def456")).unwrap();

        assert!(sink.messages.is_empty());
        assert_eq!(backend.what_changed_calls.get(), 1);
        assert_eq!(backend.diff_calls.get(), 1);
    }
}
