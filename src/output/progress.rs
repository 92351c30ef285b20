use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use console::style;

/// Progress bar for fetching stats of many buckets
pub struct FetchProgress {
    pb: ProgressBar,
}

impl FetchProgress {
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(bar_style) = ProgressStyle::default_bar().template("  {msg} {bar:30} {pos}/{len}")
        {
            pb.set_style(bar_style);
        }
        pb.set_message(style("Fetching bucket stats").yellow().bright().to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish(self, fetched: usize) {
        let message = style(format!("Fetched stats for {fetched} buckets ✓"))
            .green()
            .bright();
        self.pb.finish_with_message(message.to_string());
    }
}
