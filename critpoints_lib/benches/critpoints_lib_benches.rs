mod benches;

use criterion::criterion_main;

use benches::bench_derivatives::bench_derivatives;
use benches::bench_extraction::bench_extraction;

criterion_main!(bench_derivatives, bench_extraction);
