use parking_lot::Mutex;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use teleop::config::DEFAULT_MAX_PART_SIZE;
use teleop::drive::DEFAULT_SCALE;
use teleop::{FrameDemuxer, Intent};

use crate::types::PyFrame;

/// Incremental multipart demuxer: feed raw body chunks, get frames back.
#[pyclass(name = "FrameDemuxer")]
pub struct PyFrameDemuxer {
    inner: Mutex<FrameDemuxer>,
}

#[pymethods]
impl PyFrameDemuxer {
    #[new]
    #[pyo3(signature = (boundary = "frame", max_part_size = DEFAULT_MAX_PART_SIZE))]
    fn new(boundary: &str, max_part_size: usize) -> Self {
        PyFrameDemuxer {
            inner: Mutex::new(FrameDemuxer::new(boundary).with_max_part_size(max_part_size)),
        }
    }

    fn feed(&self, chunk: &[u8]) -> PyResult<Vec<PyFrame>> {
        let frames = self
            .inner
            .lock()
            .feed(chunk)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(frames.into_iter().map(PyFrame::from).collect())
    }

    #[getter]
    fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    #[getter]
    fn frames(&self) -> u64 {
        self.inner.lock().stats().frames
    }

    #[getter]
    fn buffered(&self) -> usize {
        self.inner.lock().buffered()
    }
}

/// Wheel speeds `[w1, w2, w3, w4]` for a drive intent.
#[pyfunction]
#[pyo3(signature = (tx, ty, rotation, scale = DEFAULT_SCALE))]
pub fn wheel_speeds(tx: f64, ty: f64, rotation: f64, scale: f64) -> [f64; 4] {
    teleop::wheel_speeds(Intent::new(tx, ty, rotation), scale).0
}
