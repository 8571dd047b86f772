//! Lookup-table caching for per-sample display mappings.
//!
//! Mapping a raw sample to a display value can be expensive (a spline
//! evaluation, a label table lookup), and it runs once per pixel on every
//! redraw. [`IntensityCache`] evaluates the mapping once for every integer
//! in a declared input range and answers later queries with a table lookup.
//!
//! The cache does not track what its functor depends on. Whoever changes the
//! functor's parameters, the evaluation range or state the functor reads must
//! call [`IntensityCache::compute_cache`] again.

use std::marker::PhantomData;

use log::debug;
use ndarray::Array2;
use num_traits::{NumCast, ToPrimitive};
use web_time::Instant;

use crate::volume::Sample;

/// A mapping from one input value to one output value.
pub trait UnaryFunctor<I, O> {
    fn evaluate(&self, input: I) -> O;
}

impl<I, O, F> UnaryFunctor<I, O> for F
where
    F: Fn(I) -> O,
{
    fn evaluate(&self, input: I) -> O {
        self(input)
    }
}

#[derive(Debug, Clone)]
pub struct IntensityCache<I, O, F> {
    functor: F,
    begin: i64,
    length: usize,
    cache: Vec<O>,
    _input: PhantomData<fn(I)>,
}

impl<I, O, F> IntensityCache<I, O, F>
where
    I: Sample,
    O: Copy,
    F: UnaryFunctor<I, O>,
{
    /// A cache over `functor` with an empty evaluation range.
    pub fn new(functor: F) -> Self {
        Self {
            functor,
            begin: 0,
            length: 0,
            cache: Vec::new(),
            _input: PhantomData,
        }
    }

    pub fn functor(&self) -> &F {
        &self.functor
    }

    /// Mutable access to the functor. Call [`compute_cache`](Self::compute_cache)
    /// after changing it.
    pub fn functor_mut(&mut self) -> &mut F {
        &mut self.functor
    }

    pub fn set_functor(&mut self, functor: F) {
        self.functor = functor;
    }

    /// Declare the inputs `[begin, begin + length)` that will be looked up.
    ///
    /// Changing the range discards the table until the next
    /// [`compute_cache`](Self::compute_cache).
    ///
    /// # Panics
    ///
    /// Panics if the range does not fit in the input type.
    pub fn set_evaluation_range(&mut self, begin: I, length: usize) {
        let begin = sample_value(begin);
        if length > 0 {
            let last = begin + length as i64 - 1;
            assert!(
                <I as NumCast>::from(last).is_some(),
                "evaluation range [{begin}, {last}] does not fit the input type"
            );
        }
        if (begin, length) != (self.begin, self.length) {
            self.cache.clear();
        }
        self.begin = begin;
        self.length = length;
    }

    /// The declared range as `(begin, length)`.
    pub fn evaluation_range(&self) -> (i64, usize) {
        (self.begin, self.length)
    }

    /// Whether the table covers the whole declared range.
    pub fn is_computed(&self) -> bool {
        self.cache.len() == self.length && self.length > 0
    }

    /// Evaluate the functor exactly once for every input in the evaluation range.
    pub fn compute_cache(&mut self) {
        let start = Instant::now();
        let functor = &self.functor;
        self.cache = (self.begin..self.begin + self.length as i64)
            .map(|value| functor.evaluate(input_from(value)))
            .collect();
        debug!(
            "Computed intensity cache of {} entries starting at {} in {:?}",
            self.length,
            self.begin,
            start.elapsed()
        );
    }

    /// Table lookup of the cached output for `input`.
    ///
    /// # Panics
    ///
    /// Panics if `input` is outside the evaluation range or the cache has not
    /// been computed for it.
    #[inline]
    pub fn evaluate(&self, input: I) -> O {
        let offset = sample_value(input) - self.begin;
        assert!(
            offset >= 0 && (offset as usize) < self.length,
            "value {input:?} outside cached range [{}, {})",
            self.begin,
            self.begin + self.length as i64
        );
        assert!(
            self.is_computed(),
            "intensity cache for [{}, {}) has not been computed",
            self.begin,
            self.begin + self.length as i64
        );
        self.cache[offset as usize]
    }

    /// A lightweight copyable handle that maps through this cache.
    pub fn caching_functor(&self) -> CachingFunctor<'_, I, O, F> {
        CachingFunctor { cache: self }
    }
}

/// Borrowing handle that evaluates through an [`IntensityCache`].
///
/// Handed to per-pixel passes in place of the wrapped functor.
#[derive(Debug)]
pub struct CachingFunctor<'a, I, O, F> {
    cache: &'a IntensityCache<I, O, F>,
}

impl<I, O, F> Clone for CachingFunctor<'_, I, O, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O, F> Copy for CachingFunctor<'_, I, O, F> {}

impl<I, O, F> CachingFunctor<'_, I, O, F>
where
    I: Sample,
    O: Copy,
    F: UnaryFunctor<I, O>,
{
    #[inline]
    pub fn evaluate(&self, input: I) -> O {
        self.cache.evaluate(input)
    }

    /// Map every sample of a slice through the cache.
    pub fn map_slice(&self, slice: &Array2<I>) -> Array2<O> {
        slice.mapv(|value| self.cache.evaluate(value))
    }
}

impl<I, O, F> UnaryFunctor<I, O> for CachingFunctor<'_, I, O, F>
where
    I: Sample,
    O: Copy,
    F: UnaryFunctor<I, O>,
{
    fn evaluate(&self, input: I) -> O {
        self.cache.evaluate(input)
    }
}

fn sample_value<I: ToPrimitive>(value: I) -> i64 {
    // Every `Sample` type fits in an i64.
    value.to_i64().unwrap_or(i64::MIN)
}

fn input_from<I: NumCast>(value: i64) -> I {
    match <I as NumCast>::from(value) {
        Some(input) => input,
        None => panic!("cache input {value} does not fit the input type"),
    }
}
