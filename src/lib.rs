#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! Host-reachability monitoring over ICMP echo (IPv4 and IPv6).
//!
//! One [`ProbeEngine`] per (destination, address family) runs serial probe
//! bursts and aggregates each burst into an immutable [`ProbeSummary`]; a
//! [`ProbeScheduler`] repeats bursts forever and hands every summary to a
//! [`SummarySink`]. Raw sockets require root or CAP_NET_RAW.

pub use error::{DecodeError, GenericError, OpenError, PersistError, ResolveError, SendError};
pub use packet::{EchoReply, IpFamily};
pub use probe::{open, ProbeConfig, ProbeEngine};
pub use scheduler::{ProbeScheduler, SummarySink};
pub use socket::ProbeSocket;
pub use stats::ProbeSummary;

mod checksum;
mod error;
mod packet;
mod probe;
mod resolve;
mod scheduler;
mod socket;
mod stats;
mod transport;
