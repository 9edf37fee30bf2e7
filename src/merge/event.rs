use std::path::PathBuf;

use crate::capture::{Encapsulation, InterfaceDescriptor};
use crate::compression::Compression;
use crate::file_type::FileType;

/// What is known about an input once it is open
#[derive(Debug, Clone, PartialEq)]
pub struct InputSummary {
    pub path: PathBuf,
    pub file_type: FileType,
    pub compression: Compression,
    pub encapsulation: Encapsulation,
}

/// Milestones of a merge run, in the order they are reported
#[derive(Debug)]
pub enum MergeEvent<'a> {
    /// All inputs are open
    InputsOpened { inputs: &'a [InputSummary] },
    /// The output encapsulation is known. `conflict` gives the first input and the first input
    /// with a different encapsulation, when the output falls back to per-record encapsulation.
    EncapsulationResolved {
        encapsulation: Encapsulation,
        conflict: Option<(&'a InputSummary, &'a InputSummary)>,
    },
    /// The output header is written
    ReadyToMerge {
        interfaces: &'a [InterfaceDescriptor],
    },
    /// A record was written. `count` includes it.
    RecordEmitted { count: u64 },
    /// The run is over
    Done { records: u64 },
}

/// Receives merge events
///
/// Returning `true` from `on_event` stops the merge. Records already written are kept and the
/// output is finalized.
pub trait MergeObserver {
    fn on_event(&mut self, event: &MergeEvent<'_>) -> bool;
}

impl<F> MergeObserver for F
where
    F: FnMut(&MergeEvent<'_>) -> bool,
{
    fn on_event(&mut self, event: &MergeEvent<'_>) -> bool {
        self(event)
    }
}

/// Observer that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl MergeObserver for NullObserver {
    fn on_event(&mut self, _event: &MergeEvent<'_>) -> bool {
        false
    }
}

/// Observer reporting the progress of the merge through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver {
    records: bool,
}

impl LogObserver {
    pub fn new() -> Self {
        LogObserver::default()
    }

    /// Also log every record (at debug level)
    pub fn with_records(self) -> Self {
        LogObserver { records: true }
    }
}

impl MergeObserver for LogObserver {
    fn on_event(&mut self, event: &MergeEvent<'_>) -> bool {
        match event {
            MergeEvent::InputsOpened { inputs } => {
                for input in inputs.iter() {
                    tracing::info!(
                        compression = %input.compression,
                        "{} is type {}.",
                        input.path.display(),
                        input.file_type.description()
                    );
                }
            }
            MergeEvent::EncapsulationResolved {
                encapsulation,
                conflict,
            } => {
                if let Some((first, other)) = conflict {
                    tracing::warn!("multiple frame encapsulation types detected, defaulting to per-packet encapsulation");
                    for input in &[first, other] {
                        tracing::warn!(
                            "{} had type {}",
                            input.path.display(),
                            input.encapsulation
                        );
                    }
                }
                tracing::info!("selected frame type {}", encapsulation);
            }
            MergeEvent::ReadyToMerge { interfaces } => {
                tracing::info!(interfaces = interfaces.len(), "ready to merge records");
            }
            MergeEvent::RecordEmitted { count } => {
                if self.records {
                    tracing::debug!("Record: {}", count);
                }
            }
            MergeEvent::Done { records } => {
                tracing::info!(records, "merging complete");
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &MergeEvent<'_>| {
                if let MergeEvent::RecordEmitted { count } = e {
                    seen.push(*count);
                }
                matches!(e, MergeEvent::RecordEmitted { count: 2 })
            };
            assert!(!observer.on_event(&MergeEvent::RecordEmitted { count: 1 }));
            assert!(observer.on_event(&MergeEvent::RecordEmitted { count: 2 }));
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn log_observer_never_stops() {
        let summary = InputSummary {
            path: PathBuf::from("a.pcap"),
            file_type: FileType::Pcap,
            compression: Compression::None,
            encapsulation: Encapsulation::Unknown,
        };
        let mut observer = LogObserver::new().with_records();
        let events = [
            MergeEvent::InputsOpened {
                inputs: std::slice::from_ref(&summary),
            },
            MergeEvent::EncapsulationResolved {
                encapsulation: Encapsulation::PerRecord,
                conflict: Some((&summary, &summary)),
            },
            MergeEvent::ReadyToMerge { interfaces: &[] },
            MergeEvent::RecordEmitted { count: 1 },
            MergeEvent::Done { records: 1 },
        ];
        for e in events.iter() {
            assert!(!observer.on_event(e));
        }
        assert!(!NullObserver.on_event(&MergeEvent::Done { records: 0 }));
    }
}
