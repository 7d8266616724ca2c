use outfitcheck_core::{Notice, NoticeLevel, Notifier};

/// Shows notices on stderr, the terminal's stand-in for a toast
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: &Notice) {
        let marker = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "•",
            NoticeLevel::Error => "✗",
        };
        eprintln!("{} {}: {}", marker, notice.title, notice.message);
    }
}
