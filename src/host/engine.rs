use std::mem;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{add, copy, scale, triad, StreamArrays};
use crate::error::{config_error, Result, StreamError};
use crate::op::StreamOp;
use crate::simd::StreamElement;
use crate::{MIN_CHUNK, PARALLEL_THRESHOLD};

/// Worker boundaries are rounded to whole cache lines so that two workers
/// never write the same line.
const CACHE_LINE: usize = 64;

/// Runs stream operations over a fixed-size worker pool.
///
/// `[0, L)` is cut into one contiguous range per worker (never smaller than
/// `min_chunk` elements). Ranges start on cache-line boundaries of the target
/// array, after a short leading range when the target itself is not line
/// aligned. Each worker owns its range exclusively, and `run` returns only
/// after every range is done.
///
/// ```rust
/// use memstream::{HostEngine, StreamArrays, StreamOp};
///
/// let engine = HostEngine::builder().threads(2).build().unwrap();
///
/// let mut a = vec![1.0f64; 1 << 20];
/// let mut b = vec![2.0f64; 1 << 20];
/// let mut c = vec![0.0f64; 1 << 20];
/// let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
///
/// engine.run(StreamOp::Add, &mut arrays, 0.0);
/// assert!(arrays.c().iter().all(|&x| x == 3.0));
/// ```
pub struct HostEngine {
    pool: ThreadPool,
    min_chunk: usize,
    parallel_threshold: usize,
}

/// Configuration for a [`HostEngine`].
#[derive(Debug, Clone)]
pub struct HostEngineBuilder {
    threads: Option<usize>,
    min_chunk: usize,
    parallel_threshold: usize,
}

impl Default for HostEngineBuilder {
    fn default() -> Self {
        HostEngineBuilder {
            threads: None,
            min_chunk: MIN_CHUNK,
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }
}

impl HostEngineBuilder {
    /// Number of workers. Defaults to rayon's choice (`RAYON_NUM_THREADS` or
    /// the number of logical CPUs).
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Smallest range, in elements, given to one worker.
    pub fn min_chunk(mut self, min_chunk: usize) -> Self {
        self.min_chunk = min_chunk;
        self
    }

    /// Arrays shorter than this run on the calling thread.
    pub fn parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn build(self) -> Result<HostEngine> {
        if self.threads == Some(0) {
            return Err(config_error("threads must be at least 1"));
        }
        if self.min_chunk == 0 {
            return Err(config_error("min_chunk must be at least 1"));
        }

        let mut builder =
            ThreadPoolBuilder::new().thread_name(|index| format!("memstream-{index}"));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }

        let pool = builder.build().map_err(|e| StreamError::ThreadPoolError {
            message: e.to_string(),
        })?;

        log::debug!(
            "host engine ready: {} workers, min_chunk={}, parallel_threshold={}",
            pool.current_num_threads(),
            self.min_chunk,
            self.parallel_threshold
        );

        Ok(HostEngine {
            pool,
            min_chunk: self.min_chunk,
            parallel_threshold: self.parallel_threshold,
        })
    }
}

impl HostEngine {
    /// An engine with default settings.
    pub fn new() -> Result<Self> {
        HostEngineBuilder::default().build()
    }

    pub fn builder() -> HostEngineBuilder {
        HostEngineBuilder::default()
    }

    /// Number of workers in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Length of the contiguous range each worker gets for an array of `len`.
    pub fn chunk_len<T: StreamElement>(&self, len: usize) -> usize {
        let per_line = (CACHE_LINE / mem::size_of::<T>()).max(1);
        let even = len.div_ceil(self.threads().max(1));
        even.max(self.min_chunk).div_ceil(per_line) * per_line
    }

    /// Splits `[0, len)` for a run whose target array starts at `target`.
    ///
    /// Returns `(head, chunk)`. The first `head` elements bring the target up
    /// to a cache-line boundary; the rest is cut into ranges of `chunk`
    /// elements, each a whole number of lines, so every range after the head
    /// starts on its own line.
    pub fn partition<T: StreamElement>(&self, target: *const T, len: usize) -> (usize, usize) {
        let misalign = target as usize % CACHE_LINE;
        let head = if misalign == 0 {
            0
        } else {
            ((CACHE_LINE - misalign) / mem::size_of::<T>()).min(len)
        };
        (head, self.chunk_len::<T>(len - head))
    }

    /// Runs `op` over `arrays`, fanning out to the pool for large arrays.
    ///
    /// `s` is ignored by Copy and Add.
    pub fn run<T: StreamElement>(&self, op: StreamOp, arrays: &mut StreamArrays<'_, T>, s: T) {
        let len = arrays.len();

        if len < self.parallel_threshold || self.threads() == 1 {
            log::trace!("{op}: {len} {} elements inline", T::NAME);
            arrays.run(op, s);
            return;
        }

        let (head, chunk) = self.partition(arrays.array(op.writes()).as_ptr(), len);
        log::trace!(
            "{op}: {len} {} elements, {head} leading, then {} ranges of {chunk}",
            T::NAME,
            (len - head).div_ceil(chunk)
        );

        let (mut lead, mut body) = arrays.split_at(head);

        self.pool.install(|| {
            lead.run(op, s);

            let StreamArrays { a, b, c } = &mut body;
            match op {
                StreamOp::Copy => c
                    .par_chunks_mut(chunk)
                    .zip(a.par_chunks(chunk))
                    .for_each(|(c, a)| copy(a, c)),
                StreamOp::Scale => b
                    .par_chunks_mut(chunk)
                    .zip(c.par_chunks(chunk))
                    .for_each(|(b, c)| scale(b, c, s)),
                StreamOp::Add => c
                    .par_chunks_mut(chunk)
                    .zip(a.par_chunks(chunk))
                    .zip(b.par_chunks(chunk))
                    .for_each(|((c, a), b)| add(a, b, c)),
                StreamOp::Triad => a
                    .par_chunks_mut(chunk)
                    .zip(b.par_chunks(chunk))
                    .zip(c.par_chunks(chunk))
                    .for_each(|((a, b), c)| triad(a, b, c, s)),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlignedVec;

    #[test]
    fn test_rejects_zero_threads() {
        assert!(matches!(
            HostEngine::builder().threads(0).build(),
            Err(StreamError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_chunk() {
        assert!(matches!(
            HostEngine::builder().min_chunk(0).build(),
            Err(StreamError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_thread_count() {
        let engine = HostEngine::builder().threads(3).build().unwrap();
        assert_eq!(engine.threads(), 3);
    }

    #[test]
    fn test_chunk_len_is_cache_line_multiple() {
        let engine = HostEngine::builder().threads(3).min_chunk(1).build().unwrap();
        // 1000 / 3 -> 334, rounded up to 8 f64 per line -> 336
        assert_eq!(engine.chunk_len::<f64>(1000), 336);
        assert_eq!(engine.chunk_len::<f32>(1000), 336);
    }

    #[test]
    fn test_chunk_len_respects_min_chunk() {
        let engine = HostEngine::builder().threads(8).min_chunk(4096).build().unwrap();
        assert_eq!(engine.chunk_len::<f64>(10_000), 4096);
    }

    #[test]
    fn test_ranges_start_on_cache_lines() {
        let engine = HostEngine::builder().threads(4).min_chunk(1).build().unwrap();
        let data = AlignedVec::<f64>::zeroed_with_alignment(1000, CACHE_LINE).unwrap();

        for offset in 0..8 {
            let target = &data[offset..];
            let (head, chunk) = engine.partition(target.as_ptr(), target.len());
            assert_eq!(head, (8 - offset) % 8, "offset {offset}");
            assert_eq!(chunk * mem::size_of::<f64>() % CACHE_LINE, 0);

            let mut start = head;
            while start < target.len() {
                let address = target[start..].as_ptr() as usize;
                assert_eq!(address % CACHE_LINE, 0, "offset {offset}, range at {start}");
                start += chunk;
            }
        }
    }

    #[test]
    fn test_partition_shorter_than_head() {
        let engine = HostEngine::builder().threads(2).min_chunk(1).build().unwrap();
        let data = AlignedVec::<f32>::zeroed_with_alignment(64, CACHE_LINE).unwrap();
        // 4 bytes past a line: 15 floats to the next one, only 3 available
        let (head, _) = engine.partition(data[1..4].as_ptr(), 3);
        assert_eq!(head, 3);
    }

    #[test]
    fn test_parallel_matches_inline_on_unaligned_target() {
        let engine = HostEngine::builder()
            .threads(3)
            .min_chunk(1)
            .parallel_threshold(0)
            .build()
            .unwrap();

        for offset in [1, 3, 5] {
            for op in StreamOp::ALL {
                let init = |step: f64| -> Vec<f64> { (0..700).map(|i| i as f64 * step).collect() };
                let (mut a1, mut b1, mut c1) = (init(1.0), init(0.5), init(0.25));
                let (mut a2, mut b2, mut c2) = (a1.clone(), b1.clone(), c1.clone());

                let mut inline =
                    StreamArrays::new(&mut a1[offset..], &mut b1[offset..], &mut c1[offset..]).unwrap();
                inline.run(op, 3.0);

                let mut parallel =
                    StreamArrays::new(&mut a2[offset..], &mut b2[offset..], &mut c2[offset..]).unwrap();
                engine.run(op, &mut parallel, 3.0);

                assert_eq!(inline.array(op.writes()), parallel.array(op.writes()), "{op} at {offset}");
            }
        }
    }

    #[test]
    fn test_parallel_matches_inline() {
        let engine = HostEngine::builder()
            .threads(4)
            .min_chunk(1)
            .parallel_threshold(0)
            .build()
            .unwrap();

        let len = 1003;
        let init = |step: f32| -> Vec<f32> { (0..len).map(|i| i as f32 * step).collect() };

        for op in StreamOp::ALL {
            let (mut a1, mut b1, mut c1) = (init(1.0), init(0.5), init(0.25));
            let (mut a2, mut b2, mut c2) = (a1.clone(), b1.clone(), c1.clone());

            let mut inline = StreamArrays::new(&mut a1, &mut b1, &mut c1).unwrap();
            inline.run(op, 3.0);

            let mut parallel = StreamArrays::new(&mut a2, &mut b2, &mut c2).unwrap();
            engine.run(op, &mut parallel, 3.0);

            assert_eq!(inline.array(op.writes()), parallel.array(op.writes()), "{op}");
        }
    }
}
