use std::fmt;
use std::net::IpAddr;
use std::time::SystemTime;

/// Running latency statistics for one probe burst. Exclusively owned by the
/// burst that created it and converted into a `ProbeSummary` at burst end.
#[derive(Debug)]
pub(crate) struct BurstStats {
    target: IpAddr,
    sent: u32,
    received: u32,
    min_ms: f64,
    max_ms: f64,
    total_ms: f64,
}

impl BurstStats {
    pub(crate) fn new(target: IpAddr) -> Self {
        BurstStats {
            target,
            sent: 0,
            received: 0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
            total_ms: 0.0,
        }
    }

    /// Called once per probe whose transmission succeeded.
    pub(crate) fn record_sent(&mut self) {
        self.sent += 1;
    }

    /// Folds one measured round trip into the running figures.
    pub(crate) fn record_received(&mut self, delay_ms: f64) {
        debug_assert!(delay_ms >= 0.0);
        self.received += 1;
        self.total_ms += delay_ms;
        if delay_ms < self.min_ms {
            self.min_ms = delay_ms;
        }
        if delay_ms > self.max_ms {
            self.max_ms = delay_ms;
        }
    }

    /// Converts the accumulator into an immutable summary, guarding the
    /// divisions: avg and min/max are `None` when nothing was received, loss
    /// is `None` when nothing was sent.
    pub(crate) fn finalize(self) -> ProbeSummary {
        debug_assert!(self.received <= self.sent);
        let received = f64::from(self.received);
        let sent = f64::from(self.sent);
        ProbeSummary {
            timestamp: SystemTime::now(),
            target: self.target,
            sent: self.sent,
            received: self.received,
            min_ms: (self.received > 0).then_some(self.min_ms),
            max_ms: (self.received > 0).then_some(self.max_ms),
            avg_ms: (self.received > 0).then(|| self.total_ms / received),
            total_ms: self.total_ms,
            loss_percent: (self.sent > 0).then(|| 100.0 * (sent - received) / sent),
        }
    }
}

/// The immutable result of one completed burst, handed to the summary sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSummary {
    pub timestamp: SystemTime,
    pub target: IpAddr,
    pub sent: u32,
    pub received: u32,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub total_ms: f64,
    /// `100 * (sent - received) / sent`, `None` when nothing was sent.
    pub loss_percent: Option<f64>,
}

impl fmt::Display for ProbeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} transmitted, {} received", self.target, self.sent, self.received)?;
        if let Some(loss) = self.loss_percent {
            write!(f, ", {loss:.1}% loss")?;
        }
        if let (Some(min), Some(avg), Some(max)) = (self.min_ms, self.avg_ms, self.max_ms) {
            write!(f, ", round-trip min/avg/max = {min:.1}/{avg:.1}/{max:.1} ms")?;
        }
        Ok(())
    }
}
