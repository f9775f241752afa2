mod test_extraction;
#[cfg(feature = "io")]
mod test_io;
