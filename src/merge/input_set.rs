use std::io::Read;
use std::path::{Path, PathBuf};

use crate::capture::{CaptureFile, CaptureReader, Encapsulation, InterfaceDescriptor, Record};
use crate::file_type::FileType;
use crate::pcapng::PcapNGOption;

use super::{InputSummary, MergeError, RecordSource};

/// An open input
pub struct InputHandle<'r> {
    path: PathBuf,
    capture: Box<dyn CaptureReader + 'r>,
    exhausted: bool,
}

impl<'r> InputHandle<'r> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capture(&self) -> &dyn CaptureReader {
        self.capture.as_ref()
    }

    pub fn summary(&self) -> InputSummary {
        InputSummary {
            path: self.path.clone(),
            file_type: self.capture.file_type(),
            compression: self.capture.compression(),
            encapsulation: self.capture.encapsulation(),
        }
    }
}

/// All inputs of a merge, in argument order
///
/// Each input is read once, from start to end.
pub struct InputSet<'r> {
    inputs: Vec<InputHandle<'r>>,
}

impl InputSet<'static> {
    /// Open all files. On the first failure, the files already opened are closed.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self, MergeError> {
        let mut inputs = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let capture = CaptureFile::open(index, path).map_err(|source| MergeError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!(input = index, path = %path.display(), "opened input");
            inputs.push(InputHandle {
                path: path.to_path_buf(),
                capture: Box::new(capture),
                exhausted: false,
            });
        }
        Ok(InputSet { inputs })
    }
}

impl<'r> InputSet<'r> {
    /// Open captures from byte streams. Names are only used in events and errors.
    pub fn from_readers<I, P, R>(sources: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<PathBuf>,
        R: Read + 'r,
    {
        let mut captures: Vec<(PathBuf, Box<dyn CaptureReader + 'r>)> = Vec::new();
        for (index, (name, source)) in sources.into_iter().enumerate() {
            let path = name.into();
            match CaptureFile::from_reader(index, source) {
                Ok(capture) => captures.push((path, Box::new(capture))),
                Err(source) => return Err(MergeError::Open { path, source }),
            }
        }
        Ok(InputSet::from_captures(captures))
    }

    /// Build an input set from captures opened by the caller
    pub fn from_captures(captures: Vec<(PathBuf, Box<dyn CaptureReader + 'r>)>) -> Self {
        let inputs = captures
            .into_iter()
            .map(|(path, capture)| InputHandle {
                path,
                capture,
                exhausted: false,
            })
            .collect();
        InputSet { inputs }
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InputHandle<'r>> {
        self.inputs.get(index)
    }

    pub fn path(&self, index: usize) -> &Path {
        self.inputs
            .get(index)
            .map_or_else(|| Path::new(""), |i| i.path())
    }

    pub fn summaries(&self) -> Vec<InputSummary> {
        self.inputs.iter().map(InputHandle::summary).collect()
    }

    /// Encapsulation declared by each input
    pub fn declared_encapsulations(&self) -> Vec<Encapsulation> {
        self.inputs
            .iter()
            .map(|i| i.capture.encapsulation())
            .collect()
    }

    /// Interfaces of all inputs, in input order, tagged with their input index
    pub fn interfaces(&self) -> Vec<InterfaceDescriptor> {
        self.inputs
            .iter()
            .enumerate()
            .flat_map(|(index, i)| {
                i.capture.interfaces().iter().cloned().map(move |mut d| {
                    d.input = index;
                    d
                })
            })
            .collect()
    }

    /// Section header options of the first pcapng input
    pub fn first_section_options(&self) -> Option<&[PcapNGOption<'static>]> {
        self.inputs
            .iter()
            .find(|i| i.capture.file_type() == FileType::PcapNg)
            .map(|i| i.capture.section_options())
    }
}

impl<'r> RecordSource for InputSet<'r> {
    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn next_record(&mut self, index: usize) -> Result<Option<Record>, MergeError> {
        let input = match self.inputs.get_mut(index) {
            Some(input) if !input.exhausted => input,
            _ => return Ok(None),
        };
        match input.capture.next_record() {
            Ok(Some(mut record)) => {
                record.input = index;
                Ok(Some(record))
            }
            Ok(None) => {
                tracing::debug!(input = index, path = %input.path.display(), "input exhausted");
                input.exhausted = true;
                Ok(None)
            }
            Err(source) => Err(MergeError::Read {
                path: input.path.clone(),
                offset: input.capture.position(),
                source,
            }),
        }
    }
}
