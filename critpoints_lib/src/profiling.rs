//! Implementation details for the [`profile`](crate::profile) macro

use std::error::Error;
use std::io;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use thread_local::ThreadLocal;

use crate::{MapType, new_map};

/// Thread local storage of the [`Profiler`]s storing the scope statistics of each thread
pub static PROFILER: LazyLock<ThreadLocal<RwLock<Profiler>>> = LazyLock::new(ThreadLocal::new);

/// A scope guard recording the elapsed time of the scope
pub struct Guard {
    name: &'static str,
    enter_time: Instant,
}

/// Dropping a `Guard` adds its elapsed time to the profiler of the current thread
impl Drop for Guard {
    fn drop(&mut self) {
        let duration = self.enter_time.elapsed();
        PROFILER
            .get_or(Default::default)
            .write()
            .leave(self.name, duration);
    }
}

#[derive(Clone, Debug)]
struct Scope {
    num_calls: usize,
    duration_sum: Duration,
    first_call: Instant,
}

impl Scope {
    fn merge(&mut self, other: &Self) {
        self.num_calls += other.num_calls;
        self.duration_sum += other.duration_sum;
        self.first_call = self.first_call.min(other.first_call);
    }
}

/// Profiler storing the accumulated timings of all scopes entered on one thread
#[derive(Default)]
pub struct Profiler {
    scopes: MapType<&'static str, Scope>,
}

impl Profiler {
    /// Resets all profiling data of this profiler
    pub fn reset(&mut self) {
        self.scopes.clear();
    }

    /// Enters a scope with the given name, the returned guard records the time until it is dropped
    pub fn enter(&mut self, name: &'static str) -> Guard {
        let now = Instant::now();
        self.scopes.entry(name).or_insert_with(|| Scope {
            num_calls: 0,
            duration_sum: Duration::default(),
            first_call: now,
        });
        Guard {
            name,
            enter_time: now,
        }
    }

    fn leave(&mut self, name: &'static str, duration: Duration) {
        if let Some(scope) = self.scopes.get_mut(name) {
            scope.num_calls += 1;
            scope.duration_sum += duration;
        }
    }
}

/// Pretty prints the collected profiling data of all thread local [`Profiler`]s to the given writer, ordered by first call
pub fn write<W: io::Write>(out: &mut W) -> io::Result<()> {
    let mut merged_scopes = new_map::<&'static str, Scope>();
    for profiler in PROFILER.iter() {
        for (&name, scope) in &profiler.read().scopes {
            merged_scopes
                .entry(name)
                .and_modify(|s| s.merge(scope))
                .or_insert_with(|| scope.clone());
        }
    }

    let mut sorted_scopes = merged_scopes.into_iter().collect::<Vec<_>>();
    sorted_scopes.sort_unstable_by_key(|(_, s)| s.first_call);

    for (name, scope) in sorted_scopes.iter().filter(|(_, s)| s.num_calls > 0) {
        let duration_sum_secs = scope.duration_sum.as_secs_f64();
        writeln!(
            out,
            "{}: {:>4.2}ms avg, {} {} (total: {:.3}s)",
            name,
            duration_sum_secs * 1000.0 / (scope.num_calls as f64),
            scope.num_calls,
            if scope.num_calls > 1 { "calls" } else { "call" },
            duration_sum_secs
        )?;
    }

    Ok(())
}

/// Returns the pretty printed output of the collected profiling data as a `String`
pub fn write_to_string() -> Result<String, Box<dyn Error>> {
    let mut buffer = Vec::new();
    write(&mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Resets the profiling data of all thread local [`Profiler`]s
pub fn reset() {
    for profiler in PROFILER.iter() {
        profiler.write().reset();
    }
}
