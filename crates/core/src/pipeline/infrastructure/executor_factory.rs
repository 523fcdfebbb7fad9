use std::time::Duration;

use crate::pipeline::detection_executor::DetectionExecutor;

use super::sequential_detection_executor::SequentialDetectionExecutor;
use super::threaded_detection_executor::ThreadedDetectionExecutor;

/// Sequential for a single worker without a timeout, threaded otherwise.
///
/// A timeout needs a separate thread to watch the detector, so it always
/// selects the threaded executor.
pub fn create_executor(workers: usize, timeout: Option<Duration>) -> Box<dyn DetectionExecutor> {
    if workers <= 1 && timeout.is_none() {
        Box::new(SequentialDetectionExecutor::new())
    } else {
        Box::new(ThreadedDetectionExecutor::new(workers, timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detection_executor::test_support::*;
    use crate::pipeline::detection_executor::DetectionOutcome;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(1, None)]
    #[case(4, None)]
    #[case(1, Some(Duration::from_secs(5)))]
    fn test_every_executor_runs_the_batch(#[case] workers: usize, #[case] timeout: Option<Duration>) {
        let executor = create_executor(workers, timeout);
        let outcomes = executor
            .execute(
                &paths(&["a.jpg", "b.jpg"]),
                Arc::new(StubReader),
                &factory(vec![("b.jpg", vec![face(vec![0.0, 1.0])])]),
                None,
            )
            .unwrap();
        assert_eq!(outcomes[0], DetectionOutcome::NoFaces);
        assert!(matches!(&outcomes[1], DetectionOutcome::Faces(v) if v.len() == 1));
    }
}
