use std::io::Stdout;

use bin2uf2_core::uf2::UF2_BLOCK_SIZE;
use pbr::{ProgressBar, Units};

/// Forwards writes to `inner` one uf2 block at a time, so a single large write still moves the bar.
pub struct ProgressBarReporter<T> {
    pb: ProgressBar<Stdout>,
    inner: T,
}

impl<T> ProgressBarReporter<T>
where
    T: std::io::Write,
{
    pub fn new(total_bytes: u64, label: &str, inner: T) -> Self {
        let mut pb = ProgressBar::new(total_bytes);
        pb.set_units(Units::Bytes);
        pb.message(&format!("{} ", label));

        Self { pb, inner }
    }

    pub fn finish(&mut self) {
        self.pb.finish();
    }
}

impl<T> std::io::Write for ProgressBarReporter<T>
where
    T: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let len = buf.len().min(UF2_BLOCK_SIZE);
        let written = self.inner.write(&buf[..len])?;
        self.pb.add(written as _);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
