//! Pseudorandom, repeat-free traversal of inclusive IPv4 ranges
//!
//! An [`AddressRange`] walks every address of `[start, end]` exactly once by
//! repeatedly adding a prime step modulo the range length. The prime is the
//! least prime not below `length + isqrt(length)`, so it is strictly larger
//! than the length and therefore coprime with it, which makes the walk a full
//! cycle over the residues. State is a cursor and a counter, so memory is
//! constant regardless of range size.

use crate::survey::SurveyError;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::FusedIterator;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

/// An inclusive pair of IPv4 addresses as written in a range list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// First address (inclusive)
    pub start: Ipv4Addr,
    /// Last address (inclusive)
    pub end: Ipv4Addr,
}

impl RangeSpec {
    /// Create a range specification
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self { start, end }
    }

    /// Number of addresses covered, or zero if `end < start`
    pub fn len(&self) -> u64 {
        let (start, end) = (u32::from(self.start), u32::from(self.end));
        if end < start {
            0
        } else {
            u64::from(end - start) + 1
        }
    }

    /// Returns true if the specification covers no addresses
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

impl FromStr for RangeSpec {
    type Err = SurveyError;

    /// Accepts `start,end`, a CIDR block such as `10.0.0.0/24`, or a single address
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((start, end)) = s.split_once(',') {
            return Ok(Self::new(parse_addr(start)?, parse_addr(end)?));
        }
        if s.contains('/') {
            let net: Ipv4Net = s
                .parse()
                .map_err(|_| SurveyError::InvalidAddress(s.to_string()))?;
            return Ok(Self::new(net.network(), net.broadcast()));
        }
        let addr = parse_addr(s)?;
        Ok(Self::new(addr, addr))
    }
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, SurveyError> {
    let s = s.trim();
    s.parse()
        .map_err(|_| SurveyError::InvalidAddress(s.to_string()))
}

/// Parse a range list: one specification per line.
///
/// Blank lines and lines starting with `#` are skipped. Errors carry the
/// 1-based line number of the offending line.
pub fn parse_range_list(text: &str) -> Result<Vec<RangeSpec>, SurveyError> {
    let mut specs = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let spec = line.parse::<RangeSpec>().map_err(|e| SurveyError::ParseError {
            line: idx + 1,
            message: e.to_string(),
        })?;
        specs.push(spec);
    }
    Ok(specs)
}

/// Read and parse a range list file
pub fn read_range_file(path: impl AsRef<Path>) -> Result<Vec<RangeSpec>, SurveyError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        SurveyError::ConfigError(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_range_list(&text)
}

/// Integer square root (floor)
pub fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// Trial-division primality test over `[2, isqrt(n)]`
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let limit = isqrt(n);
    (2..=limit).all(|d| n % d != 0)
}

/// Least prime that is not below `length + isqrt(length)`
pub fn traversal_step(length: u64) -> u64 {
    let mut candidate = length + isqrt(length);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Resumable pseudorandom walk over an inclusive address range
///
/// Yields each address once; after `len()` draws it returns `None` on every
/// call until [`reset`](Self::reset) is called.
///
/// # Examples
///
/// ```
/// use autoping::AddressRange;
/// use std::net::Ipv4Addr;
///
/// let range = AddressRange::new(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 3))?;
/// let mut seen: Vec<_> = range.collect();
/// seen.sort();
/// assert_eq!(seen.len(), 3);
/// assert_eq!(seen[0], Ipv4Addr::new(10, 0, 0, 1));
/// # Ok::<(), autoping::SurveyError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange {
    start: u32,
    end: u32,
    length: u64,
    step: u64,
    cursor: u64,
    visited: u64,
}

impl AddressRange {
    /// Create a traversal over `[start, end]`
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, SurveyError> {
        let (lo, hi) = (u32::from(start), u32::from(end));
        if hi < lo {
            return Err(SurveyError::InvalidRange { start, end });
        }
        let length = u64::from(hi - lo) + 1;
        let step = traversal_step(length);
        Ok(Self {
            start: lo,
            end: hi,
            length,
            step,
            cursor: step % length,
            visited: 0,
        })
    }

    /// Create a traversal from two dotted-quad strings
    pub fn parse(start: &str, end: &str) -> Result<Self, SurveyError> {
        Self::new(parse_addr(start)?, parse_addr(end)?)
    }

    /// Create a traversal from a parsed specification
    pub fn from_spec(spec: &RangeSpec) -> Result<Self, SurveyError> {
        Self::new(spec.start, spec.end)
    }

    /// First address of the range
    pub fn start(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start)
    }

    /// Last address of the range (inclusive)
    pub fn end(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.end)
    }

    /// Number of addresses in the range
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Always false: a range holds at least one address
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Prime stride used for the walk
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Number of addresses produced so far
    pub fn visited(&self) -> u64 {
        self.visited
    }

    /// Returns true once every address has been produced
    pub fn is_exhausted(&self) -> bool {
        self.visited >= self.length
    }

    /// Fraction of the range produced so far, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.visited as f64 / self.length as f64
    }

    /// Rewind to the beginning of the same permutation
    pub fn reset(&mut self) {
        self.cursor = self.step % self.length;
        self.visited = 0;
    }

    /// The specification this range was built from
    pub fn spec(&self) -> RangeSpec {
        RangeSpec::new(self.start(), self.end())
    }
}

impl Iterator for AddressRange {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.is_exhausted() {
            return None;
        }
        // cursor < length <= 2^32, so the offset always fits
        let addr = self.start + self.cursor as u32;
        self.cursor = (self.cursor + self.step) % self.length;
        self.visited += 1;
        Some(Ipv4Addr::from(addr))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.length - self.visited).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for AddressRange {}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start(), self.end())
    }
}
