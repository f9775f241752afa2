pub mod bench_derivatives;
pub mod bench_extraction;
