use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::capture::{Record, Timestamp};

use super::{MergeError, MergeMode};

/// Inputs the scheduler pulls records from
pub trait RecordSource {
    fn input_count(&self) -> usize;

    /// Next record of input `index`, or `None` once the input is exhausted
    fn next_record(&mut self, index: usize) -> Result<Option<Record>, MergeError>;
}

/// Decides which record is written next
pub struct MergeScheduler {
    mode: MergeMode,
    /// Concatenate: input being copied
    current: usize,
    /// Timestamp merge: next record of each input
    lookahead: Vec<Option<Record>>,
    /// Timestamp merge: inputs with a lookahead record, smallest (timestamp, input) first
    heap: BinaryHeap<Reverse<(Timestamp, usize)>>,
    /// Input whose lookahead must be read before the next pick
    refill: Option<usize>,
    primed: bool,
}

impl MergeScheduler {
    pub fn new(mode: MergeMode) -> Self {
        MergeScheduler {
            mode,
            current: 0,
            lookahead: Vec::new(),
            heap: BinaryHeap::new(),
            refill: None,
            primed: false,
        }
    }

    /// Return the next record to write, or `None` when all inputs are exhausted
    pub fn next<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<Record>, MergeError> {
        match self.mode {
            MergeMode::Concatenate => self.next_concatenated(source),
            MergeMode::TimestampMerge => self.next_by_timestamp(source),
        }
    }

    fn next_concatenated<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<Record>, MergeError> {
        while self.current < source.input_count() {
            if let Some(record) = source.next_record(self.current)? {
                return Ok(Some(record));
            }
            self.current += 1;
        }
        Ok(None)
    }

    fn next_by_timestamp<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<Record>, MergeError> {
        if !self.primed {
            self.primed = true;
            self.lookahead = vec![None; source.input_count()];
            for index in 0..source.input_count() {
                self.fill(source, index)?;
            }
        }
        if let Some(index) = self.refill.take() {
            self.fill(source, index)?;
        }
        let index = match self.heap.pop() {
            Some(Reverse((_, index))) => index,
            None => return Ok(None),
        };
        self.refill = Some(index);
        Ok(self.lookahead[index].take())
    }

    fn fill<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
        index: usize,
    ) -> Result<(), MergeError> {
        if let Some(record) = source.next_record(index)? {
            self.heap.push(Reverse((record.ts, index)));
            self.lookahead[index] = Some(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linktype::Linktype;
    use std::collections::VecDeque;

    struct Inputs(Vec<VecDeque<Record>>);

    impl RecordSource for Inputs {
        fn input_count(&self) -> usize {
            self.0.len()
        }

        fn next_record(&mut self, index: usize) -> Result<Option<Record>, MergeError> {
            Ok(self.0.get_mut(index).and_then(VecDeque::pop_front))
        }
    }

    fn inputs(timestamps: &[&[i64]]) -> Inputs {
        let queues = timestamps
            .iter()
            .enumerate()
            .map(|(input, ts)| {
                ts.iter()
                    .map(|&secs| Record {
                        input,
                        ts: Timestamp::new(secs, 0),
                        origlen: 0,
                        if_id: 0,
                        linktype: Linktype::ETHERNET,
                        data: Vec::new(),
                        options: Vec::new(),
                        encap: None,
                        raw_ts: None,
                    })
                    .collect()
            })
            .collect();
        Inputs(queues)
    }

    fn drain(mode: MergeMode, source: &mut Inputs) -> Vec<(usize, i64)> {
        let mut scheduler = MergeScheduler::new(mode);
        let mut out = Vec::new();
        while let Some(r) = scheduler.next(source).expect("next") {
            out.push((r.input, r.ts.secs));
        }
        out
    }

    #[test]
    fn interleaves_by_timestamp() {
        let mut src = inputs(&[&[1, 3, 5], &[2, 4]]);
        assert_eq!(
            drain(MergeMode::TimestampMerge, &mut src),
            vec![(0, 1), (1, 2), (0, 3), (1, 4), (0, 5)]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let mut src = inputs(&[&[1, 2], &[1, 2], &[0, 2]]);
        assert_eq!(
            drain(MergeMode::TimestampMerge, &mut src),
            vec![(2, 0), (0, 1), (1, 1), (0, 2), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn local_disorder_is_kept() {
        let mut src = inputs(&[&[5, 1], &[3]]);
        assert_eq!(
            drain(MergeMode::TimestampMerge, &mut src),
            vec![(1, 3), (0, 5), (0, 1)]
        );
    }

    #[test]
    fn concatenates_in_input_order() {
        let mut src = inputs(&[&[5, 6], &[], &[1, 2]]);
        assert_eq!(
            drain(MergeMode::Concatenate, &mut src),
            vec![(0, 5), (0, 6), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn empty_inputs() {
        let mut src = inputs(&[&[], &[]]);
        assert!(drain(MergeMode::TimestampMerge, &mut src).is_empty());
        assert!(drain(MergeMode::Concatenate, &mut Inputs(Vec::new())).is_empty());
    }

    #[test]
    fn refill_after_emission() {
        // the emitted input is read again only when the next record is requested
        let mut src = inputs(&[&[1, 2], &[3]]);
        let mut scheduler = MergeScheduler::new(MergeMode::TimestampMerge);
        let first = scheduler.next(&mut src).expect("next").expect("record");
        assert_eq!(first.ts.secs, 1);
        assert_eq!(src.0[0].len(), 1);
        scheduler.next(&mut src).expect("next");
        assert!(src.0[0].is_empty());
    }
}
