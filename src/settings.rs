use bon::bon;

use crate::scheduler::{ThreadScheduler, WorkerCount};

/// Settings of a leaf acceleration structure build.
#[derive(Copy, Clone, Debug)]
pub struct AccelSettings {
    pub worker_count: WorkerCount,
    /// Pin worker threads to CPU cores
    pub pin_threads: bool,
    pub max_leaf_size: usize,
}

#[bon]
impl AccelSettings {
    #[builder]
    pub fn new(
        #[builder(default = WorkerCount::Auto)] worker_count: WorkerCount,
        #[builder(default)] pin_threads: bool,
        #[builder(default = 4)] max_leaf_size: usize,
    ) -> Self {
        assert!(max_leaf_size > 0);

        AccelSettings {
            worker_count,
            pin_threads,
            max_leaf_size,
        }
    }

    pub fn scheduler(&self) -> ThreadScheduler {
        ThreadScheduler::new(self.worker_count, self.pin_threads)
    }
}

impl Default for AccelSettings {
    fn default() -> Self {
        AccelSettings::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskScheduler as _;

    use assert2::assert;
    use std::num::NonZeroUsize;

    #[test]
    fn defaults() {
        let settings = AccelSettings::default();
        assert!(settings.worker_count == WorkerCount::Auto);
        assert!(!settings.pin_threads);
        assert!(settings.max_leaf_size == 4);
    }

    #[test]
    fn builder_overrides() {
        let settings = AccelSettings::builder()
            .worker_count(WorkerCount::Manual(NonZeroUsize::new(3).unwrap()))
            .max_leaf_size(8)
            .build();
        assert!(settings.max_leaf_size == 8);
        assert!(settings.scheduler().thread_count() == 3);
    }

    #[test]
    #[should_panic]
    fn zero_leaf_size() {
        let _ = AccelSettings::builder().max_leaf_size(0).build();
    }
}
