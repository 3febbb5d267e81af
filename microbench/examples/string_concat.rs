//! String Building — concatenation vs. pre-sized buffer
//!
//! Registers three members under `demo.Strings` at link time and runs them
//! through the microbench CLI:
//! - `calibrated`: sleeps 111ms, a sanity check for the reported average
//! - `concatenation`: rebuilds the whole string for every appended piece
//! - `builder`: appends into one growing buffer
//!
//! Run with: cargo run --example string_concat -p microbench --release -- -n 10

use microbench::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// Host for the string workloads; a fresh one is created per benchmark run
struct Strings {
    rng: StdRng,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Strings {
    /// `len` printable characters from '0' onwards
    fn random_string(&mut self, len: u32) -> String {
        (0..len)
            .map(|_| char::from(48 + self.rng.gen_range(0..74u8)))
            .collect()
    }

    fn concatenation(&mut self, count: u32, len: u32) -> usize {
        let mut result = String::new();
        for _ in 0..count {
            let piece = self.random_string(len);
            // New allocation and full copy on every append
            result = format!("{}{}", result, piece);
        }
        black_box(result).len()
    }

    fn builder(&mut self, count: u32, len: u32) -> usize {
        let mut result = String::with_capacity(buffer_len(count, len));
        for _ in 0..count {
            let piece = self.random_string(len);
            result.push_str(&piece);
        }
        black_box(result).len()
    }
}

/// Bytes needed for `count` pieces of `len` characters
fn buffer_len(count: u32, len: u32) -> usize {
    (count as usize).saturating_mul(len as usize)
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn install(registry: &mut Registry) {
    registry
        .location::<Strings>("demo.Strings")
        .member("calibrated", |_: &mut Strings| {
            std::thread::sleep(Duration::from_millis(111))
        })
        .member("concatenation", |s: &mut Strings, count: u32, len: u32| {
            black_box(s.concatenation(count, len));
        })
        .member("builder", |s: &mut Strings, count: u32, len: u32| {
            black_box(s.builder(count, len));
        });
}

microbench::submit! { LocationDef::new("demo.Strings", install) }

fn main() -> anyhow::Result<()> {
    let suite = Suite::discover()
        .bench("demo.Strings.calibrated", args![])
        .bench("demo.Strings.concatenation", args![10_000, 5])
        .bench("demo.Strings.builder", args![10_000, 5]);

    microbench::run(suite)
}
