//! MRG32k3a combined multiple recursive generator with stream jump-ahead.
//!
//! Two order-3 recurrences modulo primes close to 2^32 are combined into one
//! uniform output with a period near 2^191. The sequence is cut into streams
//! 2^127 values apart, and every stream into substreams 2^76 values apart,
//! so that independently seeded instances never overlap.

use once_cell::sync::Lazy;

use crate::errors::InvalidSeed;

const M1: i64 = 4_294_967_087;
const M2: i64 = 4_294_944_443;
const A12: i64 = 1_403_580;
const A13N: i64 = 810_728;
const A21: i64 = 527_612;
const A23N: i64 = 1_370_589;
const NORM: f64 = 2.328306549295727688e-10;

/// log2 of the distance between two streams.
const STREAM_SHIFT: usize = 127;
/// log2 of the distance between two substreams.
const SUBSTREAM_SHIFT: usize = 76;
/// `A^(2^i)` is tabulated for every `i` a 64-bit jump can reach.
const JUMP_TABLE_LEN: usize = STREAM_SHIFT + 64;

type Matrix = [[u64; 3]; 3];

const A1P0: Matrix = [
    [0, 1, 0],
    [0, 0, 1],
    [(M1 - A13N) as u64, A12 as u64, 0],
];

const A2P0: Matrix = [
    [0, 1, 0],
    [0, 0, 1],
    [(M2 - A23N) as u64, 0, A21 as u64],
];

struct JumpTable {
    first: Vec<Matrix>,
    second: Vec<Matrix>,
}

static JUMP_TABLE: Lazy<JumpTable> = Lazy::new(|| {
    let mut first = Vec::with_capacity(JUMP_TABLE_LEN);
    let mut second = Vec::with_capacity(JUMP_TABLE_LEN);
    let (mut a1, mut a2) = (A1P0, A2P0);
    for _ in 0..JUMP_TABLE_LEN {
        first.push(a1);
        second.push(a2);
        a1 = mat_mul(&a1, &a1, M1 as u64);
        a2 = mat_mul(&a2, &a2, M2 as u64);
    }
    JumpTable { first, second }
});

fn mat_mul(a: &Matrix, b: &Matrix, m: u64) -> Matrix {
    let mut out = [[0u64; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            let sum: u128 = (0..3).map(|k| a[i][k] as u128 * b[k][j] as u128).sum();
            *cell = (sum % m as u128) as u64;
        }
    }
    out
}

fn mat_vec(a: &Matrix, v: [u64; 3], m: u64) -> [u64; 3] {
    let mut out = [0u64; 3];
    for (i, cell) in out.iter_mut().enumerate() {
        let sum: u128 = (0..3).map(|k| a[i][k] as u128 * v[k] as u128).sum();
        *cell = (sum % m as u128) as u64;
    }
    out
}

/// A single MRG32k3a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RngStream {
    state: [i64; 6],
}

impl RngStream {
    /// Seeds all six state components with `seed`, then jumps `stream`
    /// streams and `substream` substreams ahead.
    pub fn new(seed: u32, stream: u64, substream: u64) -> Result<Self, InvalidSeed> {
        Self::validate_seed(seed)?;
        Ok(Self::new_unchecked(seed, stream, substream))
    }

    pub(crate) fn validate_seed(seed: u32) -> Result<(), InvalidSeed> {
        if seed == 0 || seed as i64 >= M2 {
            return Err(InvalidSeed(seed));
        }
        Ok(())
    }

    /// Like [`new`](Self::new) for a seed that already passed
    /// [`validate_seed`](Self::validate_seed).
    pub(crate) fn new_unchecked(seed: u32, stream: u64, substream: u64) -> Self {
        let mut rng = Self {
            state: [seed as i64; 6],
        };
        rng.advance(stream, STREAM_SHIFT);
        rng.advance(substream, SUBSTREAM_SHIFT);
        rng
    }

    /// Jumps `nth * 2^shift` steps ahead.
    fn advance(&mut self, nth: u64, shift: usize) {
        let table = &*JUMP_TABLE;
        let mut s1 = [
            self.state[0] as u64,
            self.state[1] as u64,
            self.state[2] as u64,
        ];
        let mut s2 = [
            self.state[3] as u64,
            self.state[4] as u64,
            self.state[5] as u64,
        ];
        for bit in 0..64 {
            if (nth >> bit) & 1 == 1 {
                s1 = mat_vec(&table.first[shift + bit], s1, M1 as u64);
                s2 = mat_vec(&table.second[shift + bit], s2, M2 as u64);
            }
        }
        self.state = [
            s1[0] as i64,
            s1[1] as i64,
            s1[2] as i64,
            s2[0] as i64,
            s2[1] as i64,
            s2[2] as i64,
        ];
    }

    /// Next value, uniformly distributed in the open interval (0, 1).
    pub fn rand_u01(&mut self) -> f64 {
        let s = &mut self.state;

        let p1 = (A12 * s[1] - A13N * s[0]).rem_euclid(M1);
        s[0] = s[1];
        s[1] = s[2];
        s[2] = p1;

        let p2 = (A21 * s[5] - A23N * s[3]).rem_euclid(M2);
        s[3] = s[4];
        s[4] = s[5];
        s[5] = p2;

        if p1 > p2 {
            (p1 - p2) as f64 * NORM
        } else {
            (p1 - p2 + M1) as f64 * NORM
        }
    }
}

impl rand::RngCore for RngStream {
    fn next_u32(&mut self) -> u32 {
        (self.rand_u01() * 4_294_967_296.0) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32() as u64;
        let low = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dst);
        Ok(())
    }
}
