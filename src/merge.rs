//! Merging of capture files
//!
//! A merge run opens all inputs, chooses the output encapsulation and interface table, then
//! copies records to the output in a single pass:
//!
//! ```text
//! InputSet -> resolve_encapsulation -> reconcile -> MergeScheduler -> RecordTransformer -> OutputSink
//! ```
//!
//! Progress is reported to a [`MergeObserver`], which can stop the run. A stopped run is not an
//! error: the output is finalized with the records written so far.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pcap_merge::merge::*;
//!
//! let config = MergeConfig::new(
//!     vec!["a.pcapng", "b.pcap"],
//!     OutputDestination::from_arg("merged.pcapng.gz"),
//! );
//! match merge_files(&config, &mut LogObserver::new()) {
//!     Ok(outcome) => println!("{} records written", outcome.records()),
//!     Err(e) => eprintln!("merge failed: {}", e),
//! }
//! ```

mod config;
mod encap;
mod error;
mod event;
mod input_set;
mod interfaces;
mod scheduler;
mod sink;
mod transform;

pub use config::*;
pub use encap::*;
pub use error::*;
pub use event::*;
pub use input_set::*;
pub use interfaces::*;
pub use scheduler::*;
pub use sink::*;
pub use transform::*;

use crate::capture::OutputHeader;

/// How a merge run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// All records were written
    Completed { records: u64 },
    /// The observer stopped the run
    Stopped { records: u64 },
}

impl MergeOutcome {
    pub fn records(&self) -> u64 {
        match *self {
            MergeOutcome::Completed { records } | MergeOutcome::Stopped { records } => records,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, MergeOutcome::Stopped { .. })
    }
}

/// Merge the input files of `config`
///
/// The configuration is checked before any file is opened.
pub fn merge_files<O>(config: &MergeConfig, observer: &mut O) -> Result<MergeOutcome, MergeError>
where
    O: MergeObserver + ?Sized,
{
    let plan = config.validate()?;
    let inputs = InputSet::open(config.inputs.as_slice())?;
    run(config, plan, inputs, observer)
}

/// Merge already opened inputs. `config.inputs` is ignored.
pub fn merge_inputs<O>(
    config: &MergeConfig,
    inputs: InputSet<'_>,
    observer: &mut O,
) -> Result<MergeOutcome, MergeError>
where
    O: MergeObserver + ?Sized,
{
    if inputs.is_empty() {
        return Err(ConfigError::NoInputs.into());
    }
    let plan = config.validate_output()?;
    run(config, plan, inputs, observer)
}

fn stopped<O: MergeObserver + ?Sized>(observer: &mut O, records: u64) -> MergeOutcome {
    tracing::info!(records, "merge stopped");
    observer.on_event(&MergeEvent::Done { records });
    MergeOutcome::Stopped { records }
}

fn run<O>(
    config: &MergeConfig,
    plan: MergePlan,
    mut inputs: InputSet<'_>,
    observer: &mut O,
) -> Result<MergeOutcome, MergeError>
where
    O: MergeObserver + ?Sized,
{
    let summaries = inputs.summaries();
    if observer.on_event(&MergeEvent::InputsOpened { inputs: &summaries }) {
        return Ok(stopped(observer, 0));
    }

    let resolution = resolve_encapsulation(&inputs.declared_encapsulations());
    let conflict = resolution
        .conflict
        .map(|(first, other)| (&summaries[first], &summaries[other]));
    if observer.on_event(&MergeEvent::EncapsulationResolved {
        encapsulation: resolution.encapsulation,
        conflict,
    }) {
        return Ok(stopped(observer, 0));
    }

    let input_interfaces = inputs.interfaces();
    let reconciled = reconcile(
        plan.policy,
        config.file_type,
        &input_interfaces,
        inputs.len(),
    )
    .map_err(|c| MergeError::IncompatibleInterfaces {
        interface: c.interface,
        first_input: inputs.path(c.first_input).to_path_buf(),
        conflicting_input: inputs.path(c.conflicting_input).to_path_buf(),
    })?;

    let header = OutputHeader {
        file_type: config.file_type,
        encapsulation: resolution.encapsulation,
        snaplen: output_snaplen(config.snap_length, &input_interfaces),
        interfaces: reconciled.interfaces,
        section_options: output_section_options(
            config.app_name(),
            inputs.first_section_options(),
        ),
    };
    let mut sink = OutputSink::open(&config.output, plan.compression, header)?;
    let transformer =
        RecordTransformer::new(config.snap_length, reconciled.remap, resolution.encapsulation);
    let mut scheduler = MergeScheduler::new(config.mode);

    let mut stop = observer.on_event(&MergeEvent::ReadyToMerge {
        interfaces: &sink.state().interfaces,
    });
    while !stop {
        let record = match scheduler.next(&mut inputs)? {
            Some(r) => r,
            None => break,
        };
        let record = transformer.apply(record);
        sink.append(&record)?;
        stop = observer.on_event(&MergeEvent::RecordEmitted {
            count: sink.state().records,
        });
    }

    let state = sink.finalize()?;
    if stop {
        return Ok(stopped(observer, state.records));
    }
    observer.on_event(&MergeEvent::Done {
        records: state.records,
    });
    Ok(MergeOutcome::Completed {
        records: state.records,
    })
}
