//! Provides the [`profile`](crate::profile) macro or a dummy implementation depending on the selected feature

#[cfg(feature = "profiling")]
/// Creates a scope for profiling
///
/// The macro locally creates a scope guard (stored in a variable called `_profiling_scope_guard`)
/// that adds the time elapsed until it is dropped to the statistics of the named scope in a thread
/// local [`Profiler`](crate::profiling::Profiler). The statistics of all threads can be printed
/// using [`write`](crate::profiling::write), which produces one line per scope name:
/// ```text
/// extract_features: 12.31ms avg, 4 calls (total: 0.049s)
/// compute_gradient: 2.05ms avg, 4 calls (total: 0.008s)
/// ```
/// Scopes entered from several threads at the same time (e.g. inside a rayon loop) are summed up,
/// so their total can exceed the wall clock time of the enclosing scope.
///
/// If the `profiling` feature is disabled, the macro expands to nothing.
/// ```ignore
/// {
///     profile!("scope name");
/// }
/// ```
#[macro_export]
#[cfg_attr(docsrs, doc(cfg(feature = "profiling")))]
macro_rules! profile {
    ($name:expr) => {
        let _profiling_scope_guard = $crate::profiling::PROFILER
            .get_or(Default::default)
            .write()
            .enter($name);
    };
}

#[cfg(not(feature = "profiling"))]
/// No-op macro if profiling is disabled
#[macro_export]
macro_rules! profile {
    ($name:expr) => {};
}
