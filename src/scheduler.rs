use crate::probe::ProbeEngine;
use crate::socket::ProbeSocket;
use crate::{PersistError, ProbeSummary};
use std::time::Duration;

/// The persistence collaborator. Receives each completed burst summary; a
/// `PersistError` loses that one summary and nothing else.
pub trait SummarySink {
    fn record(&mut self, summary: &ProbeSummary) -> Result<(), PersistError>;
}

/// Repeats probe bursts forever at a fixed interval, handing each summary to
/// the sink. Terminates only with the process.
pub struct ProbeScheduler<S, K> {
    engine: ProbeEngine<S>,
    wait_period: Duration,
    sink: K,
}

impl<S, K> ProbeScheduler<S, K>
where
    S: ProbeSocket,
    K: SummarySink,
{
    pub fn new(engine: ProbeEngine<S>, wait_period: Duration, sink: K) -> Self {
        ProbeScheduler { engine, wait_period, sink }
    }

    /// The monitoring loop: burst, record, sleep, repeat. A failed resolution
    /// or a failed persist is logged and the next cycle proceeds after the
    /// same wait period; neither may kill the monitor.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_once();
            std::thread::sleep(self.wait_period);
        }
    }

    fn run_once(&mut self) {
        match self.engine.run_burst() {
            Ok(summary) => {
                tracing::info!("{summary}");
                if let Err(e) = self.sink.record(&summary) {
                    tracing::warn!("could not persist summary, trying next round: {e}");
                }
            }
            Err(e) => {
                tracing::warn!("burst skipped: {e}");
            }
        }
    }
}
