use crate::command::{Runner, Shell};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// The machine being probed: where its filesystem is rooted, how commands are
/// executed on it, and how long to wait for the Nvidia card after powering it.
pub struct Host<R = Shell> {
    root:   PathBuf,
    runner: R,
    settle: Duration,
    #[cfg(test)]
    writes: std::cell::RefCell<Vec<(PathBuf, String)>>,
}

impl Host<Shell> {
    pub fn new() -> Self { Self::with_root("/", Shell) }
}

impl Default for Host<Shell> {
    fn default() -> Self { Self::new() }
}

impl<R: Runner> Host<R> {
    pub fn with_root<P: Into<PathBuf>>(root: P, runner: R) -> Self {
        Host {
            root: root.into(),
            runner,
            settle: Duration::from_secs(1),
            #[cfg(test)]
            writes: Default::default(),
        }
    }

    /// Time to wait after forcing the card on before looking for it on the bus.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle = delay;
        self
    }

    pub fn runner(&self) -> &R { &self.runner }

    pub fn root(&self) -> &Path { &self.root }

    pub(crate) fn settle(&self) -> Duration { self.settle }

    #[cfg(test)]
    pub(crate) fn record_write(&self, path: &Path, contents: &str) {
        self.writes.borrow_mut().push((path.to_path_buf(), contents.to_owned()));
    }

    #[cfg(not(test))]
    pub(crate) fn record_write(&self, _path: &Path, _contents: &str) {}

    /// Every successful control-file write, in order.
    #[cfg(test)]
    pub(crate) fn writes(&self) -> Vec<(PathBuf, String)> { self.writes.borrow().clone() }

    /// Resolves one of the fixed absolute paths against the host root.
    pub(crate) fn path<P: AsRef<Path>>(&self, absolute: P) -> PathBuf {
        let absolute = absolute.as_ref();
        self.root.join(absolute.strip_prefix("/").unwrap_or(absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::Script;

    #[test]
    fn path_is_joined_to_root() {
        let host = Host::with_root("/tmp/fake", Script::default());
        assert_eq!(host.path("/proc/acpi/bbswitch"), Path::new("/tmp/fake/proc/acpi/bbswitch"));

        let host = Host::with_root("/", Script::default());
        assert_eq!(host.path("/sys/bus/pci/rescan"), Path::new("/sys/bus/pci/rescan"));
    }
}
