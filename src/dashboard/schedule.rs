/// Named periodic refresh tasks.
///
/// Each task fires once per interval after it is started, measured against
/// the caller-supplied clock. Missed ticks are not replayed: a task that
/// falls behind fires once and is rescheduled one interval from `now`.
use std::time::{Duration, Instant};

/// Which background refresh a task drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Stats,
    Alerts,
}

impl TaskKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Alerts => "alerts",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeriodicTask {
    kind: TaskKind,
    interval: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTask {
    pub fn new(kind: TaskKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            next_due: None,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Return `true` and reschedule if the task is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let mut next = due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.next_due = Some(next);
        true
    }
}

/// The dashboard's two refresh cycles, started and stopped together.
#[derive(Debug, Clone)]
pub struct Schedule {
    stats: PeriodicTask,
    alerts: PeriodicTask,
}

impl Schedule {
    pub fn new(stats_interval: Duration, alerts_interval: Duration) -> Self {
        Self {
            stats: PeriodicTask::new(TaskKind::Stats, stats_interval),
            alerts: PeriodicTask::new(TaskKind::Alerts, alerts_interval),
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.stats.start(now);
        self.alerts.start(now);
    }

    pub fn stop(&mut self) {
        self.stats.stop();
        self.alerts.stop();
    }

    pub fn is_running(&self) -> bool {
        self.stats.is_running() || self.alerts.is_running()
    }

    /// Tasks due at `now`, each rescheduled.
    pub fn due(&mut self, now: Instant) -> Vec<TaskKind> {
        let mut fired = Vec::new();
        if self.stats.poll(now) {
            fired.push(TaskKind::Stats);
        }
        if self.alerts.poll(now) {
            fired.push(TaskKind::Alerts);
        }
        fired
    }

    /// Earliest upcoming tick, if anything is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.stats.next_due(), self.alerts.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn task(&self, kind: TaskKind) -> &PeriodicTask {
        match kind {
            TaskKind::Stats => &self.stats,
            TaskKind::Alerts => &self.alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn task_fires_once_per_interval() {
        let t0 = Instant::now();
        let mut task = PeriodicTask::new(TaskKind::Stats, 5 * SECOND);
        task.start(t0);

        assert!(!task.poll(t0));
        assert!(!task.poll(t0 + 4 * SECOND));
        assert!(task.poll(t0 + 5 * SECOND));
        assert!(!task.poll(t0 + 5 * SECOND));
        assert_eq!(task.next_due(), Some(t0 + 10 * SECOND));
    }

    #[test]
    fn late_task_does_not_burst() {
        let t0 = Instant::now();
        let mut task = PeriodicTask::new(TaskKind::Alerts, 10 * SECOND);
        task.start(t0);

        let late = t0 + 35 * SECOND;
        assert!(task.poll(late));
        assert!(!task.poll(late));
        assert_eq!(task.next_due(), Some(late + 10 * SECOND));
    }

    #[test]
    fn stopped_task_never_fires() {
        let t0 = Instant::now();
        let mut task = PeriodicTask::new(TaskKind::Stats, SECOND);
        task.start(t0);
        task.stop();
        assert!(!task.poll(t0 + 60 * SECOND));
        assert!(!task.is_running());
    }

    #[test]
    fn schedule_runs_both_cycles_independently() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(5 * SECOND, 10 * SECOND);
        schedule.start(t0);

        assert_eq!(schedule.next_deadline(), Some(t0 + 5 * SECOND));
        assert_eq!(schedule.due(t0 + 5 * SECOND), vec![TaskKind::Stats]);
        assert_eq!(
            schedule.due(t0 + 10 * SECOND),
            vec![TaskKind::Stats, TaskKind::Alerts]
        );
        assert_eq!(schedule.task(TaskKind::Alerts).interval(), 10 * SECOND);
    }

    #[test]
    fn stopped_schedule_has_no_deadline() {
        let t0 = Instant::now();
        let mut schedule = Schedule::new(SECOND, SECOND);
        schedule.start(t0);
        assert!(schedule.is_running());
        schedule.stop();
        assert!(!schedule.is_running());
        assert_eq!(schedule.next_deadline(), None);
        assert!(schedule.due(t0 + 10 * SECOND).is_empty());
    }
}
