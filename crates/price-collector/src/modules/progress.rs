//! 진행률 및 남은 시간 표시.
//!
//! 수집 로직은 `ProgressReporter` trait에만 의존합니다.
//! 표시 실패는 수집을 중단시키지 않습니다.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::time::Instant;

/// 진행 막대 폭 (칸)
const BAR_WIDTH: usize = 50;

/// 진행률 보고 인터페이스.
pub trait ProgressReporter {
    /// 완료 수/전체 수 갱신. `completed == total`이면 완료 상태를 표시합니다.
    fn update(&mut self, completed: usize, total: usize, started_at: Instant);
}

/// 특정 시점의 진행 상태.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    /// 0.0 ~ 100.0
    pub percentage: f64,
    pub elapsed: Duration,
    /// 완료 수가 0이면 추정 불가
    pub remaining: Option<Duration>,
    pub is_complete: bool,
}

impl ProgressSnapshot {
    /// 남은 시간 = elapsed * (total - completed) / completed
    pub fn compute(completed: usize, total: usize, elapsed: Duration) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            (completed as f64 / total as f64 * 100.0).min(100.0)
        };

        let is_complete = completed >= total;

        let remaining = if completed == 0 || is_complete {
            None
        } else {
            let left = (total - completed) as f64;
            Some(elapsed.mul_f64(left / completed as f64))
        };

        Self {
            completed,
            total,
            percentage,
            elapsed,
            remaining,
            is_complete,
        }
    }

    /// 막대 옆에 붙는 상태 문구.
    pub fn status_text(&self) -> String {
        let elapsed = format_clock(self.elapsed);
        if self.is_complete {
            format!("{} elapsed | complete", elapsed)
        } else if let Some(remaining) = self.remaining {
            format!("{} elapsed | {} remaining", elapsed, format_clock(remaining))
        } else {
            format!("{} elapsed", elapsed)
        }
    }
}

/// `MM:SS`, 1시간 이상이면 `H:MM:SS`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 최소 간격 기반 갱신 제한.
#[derive(Debug, Clone)]
pub struct RefreshThrottle {
    min_interval: Duration,
    last_render: Option<Instant>,
}

impl RefreshThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_render: None,
        }
    }

    /// 첫 갱신과 완료 상태는 항상 표시.
    pub fn should_render(&mut self, now: Instant, complete: bool) -> bool {
        let due = match self.last_render {
            None => true,
            Some(last) => complete || now.duration_since(last) >= self.min_interval,
        };
        if due {
            self.last_render = Some(now);
        }
        due
    }
}

/// indicatif 기반 콘솔 진행 막대.
pub struct ConsoleProgress {
    bar: ProgressBar,
    throttle: RefreshThrottle,
    finished: bool,
}

impl ConsoleProgress {
    pub fn new(refresh_interval: Duration) -> Self {
        let bar = ProgressBar::new(0);
        let template = format!(
            "{{spinner:.green}} [{{bar:{}.cyan/blue}}] {{percent:>3}}% ({{pos}}/{{len}}) | {{msg}}",
            BAR_WIDTH
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░");
        bar.set_style(style);

        Self {
            bar,
            throttle: RefreshThrottle::new(refresh_interval),
            finished: false,
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn update(&mut self, completed: usize, total: usize, started_at: Instant) {
        if self.finished {
            return;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(started_at);
        let snapshot = ProgressSnapshot::compute(completed, total, elapsed);
        if !self.throttle.should_render(now, snapshot.is_complete) {
            return;
        }

        self.bar.set_length(total as u64);
        self.bar.set_position(completed.min(total) as u64);

        if snapshot.is_complete {
            self.finished = true;
            self.bar.finish_with_message(snapshot.status_text());
        } else {
            self.bar.set_message(snapshot.status_text());
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if !self.finished {
            self.bar.abandon();
        }
    }
}

/// 아무것도 표시하지 않는 Reporter (`--no-progress`).
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn update(&mut self, _completed: usize, _total: usize, _started_at: Instant) {}
}
