//! 📊 progress.rs: "Are we there yet?" Every bulk load, every time, forever.
//!
//! 🚀 The loader reports a [`LoadProgress`] after every page that lands. What happens next is
//! up to the [`ProgressObserver`]: draw a bar, push into a Vec for a test, or do nothing at all.
//!
//! ⚠️ Watching this progress bar will not make it go faster.
//! Neither will refreshing it. We've tried. Science says no.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

/// 📦 How far along a load is. `loaded` only ever goes up, and never past `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
}

/// 👀 Gets told about every page that made it into the index.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, progress: LoadProgress);

    /// ✅ The load is over, one way or another.
    fn finish(&mut self) {}
}

/// 💤 Observes nothing. Judges nothing. Zen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _progress: LoadProgress) {}
}

/// 🧪 Remembers every report, in order. Tests love this one.
impl ProgressObserver for Vec<LoadProgress> {
    fn on_progress(&mut self, progress: LoadProgress) {
        self.push(progress);
    }
}

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 docs" → "1,000,000 docs". You're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS, or HH:MM:SS if you should probably call your mom. It's been a while.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📊 The terminal progress display: an indicatif bar plus a comfy-table of rates.
///
/// Uses a sliding 5-second window for docs/s so one slow page doesn't scare you.
/// (Your heart rate is not our responsibility.)
pub struct ProgressMetrics {
    /// 🏷️ what are we loading into? shown above the bar
    index_name: String,
    progress_bar: ProgressBar,
    /// 🔄 sliding window of (timestamp, docs loaded) for rate calculation
    rate_samples: VecDeque<(Instant, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("index_name", &self.index_name)
            .field("position", &self.progress_bar.position())
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 A bar sized to `total` documents. Cyan because it's classy, blue because it's calm.
    pub fn new(index_name: impl Into<String>, total: u64) -> Self {
        let progress_bar = ProgressBar::new(total);
        // -- the template is a literal, so the only way this fails is a typo caught in review.
        // -- if it ever does, the default style is still a perfectly good bar.
        if let Ok(style) = ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}]") {
            progress_bar.set_style(style.progress_chars("=>-"));
        }

        let start_time = Instant::now();
        let mut rate_samples = VecDeque::new();
        // -- 🔄 seed the window with t=0 so we don't divide by zero like animals
        rate_samples.push_back((start_time, 0u64));

        Self {
            index_name: index_name.into(),
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// 📈 docs/s over the last 5 seconds.
    fn docs_per_sec(&mut self, loaded: u64) -> f64 {
        let now = Instant::now();
        let window = Duration::from_secs(5);
        while let Some(&(timestamp, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > window {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples.push_back((now, loaded));

        match self.rate_samples.front() {
            Some(&(oldest_time, oldest_loaded)) => {
                let elapsed = now.duration_since(oldest_time).as_secs_f64();
                if elapsed > 0.0 {
                    loaded.saturating_sub(oldest_loaded) as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    /// 🎨 Render the table into the bar's message.
    ///
    /// ```text
    /// index: <name>
    /// | [=====>----------]
    ///   <docs/s>     <loaded / total>
    ///   <elapsed>    <remaining>
    /// ```
    fn render(&self, progress: LoadProgress, docs_per_sec: f64) {
        let percent = if progress.total > 0 {
            (progress.loaded as f64 / progress.total as f64) * 100.0
        } else {
            100.0
        };

        let elapsed = self.start_time.elapsed();
        let remaining = if percent > 0.0 && percent < 100.0 {
            // 🔮 linear extrapolation: assumes the future looks like the past
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            format_duration(Duration::from_secs_f64(
                (total_estimated - elapsed.as_secs_f64()).max(0.0),
            ))
        } else {
            "--:--".to_string()
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Docs/s", format_number(docs_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!(
                "{} / {} Docs",
                format_number(progress.loaded),
                format_number(progress.total)
            ))
            .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", percent)).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(""),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("index: {}\n{}", self.index_name, table));
    }
}

impl ProgressObserver for ProgressMetrics {
    fn on_progress(&mut self, progress: LoadProgress) {
        let docs_per_sec = self.docs_per_sec(progress.loaded);
        self.render(progress, docs_per_sec);
        self.progress_bar.set_position(progress.loaded);
    }

    fn finish(&mut self) {
        self.progress_bar.finish();
    }
}
