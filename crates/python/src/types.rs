use pyo3::prelude::*;
use pyo3::types::PyBytes;

use teleop::drive::ControllerInfo;
use teleop::{DisplayHandle, Frame};

#[pyclass(name = "Frame", skip_from_py_object)]
#[derive(Clone)]
pub struct PyFrame {
    #[pyo3(get)]
    pub seq: u64,
    #[pyo3(get)]
    pub media_type: String,
    pub data: Vec<u8>,
}

impl From<Frame> for PyFrame {
    fn from(frame: Frame) -> Self {
        PyFrame {
            seq: frame.seq,
            media_type: frame.media_type().to_string(),
            data: frame.data,
        }
    }
}

impl PyFrame {
    /// Copy a still-live handle; `None` once it has been revoked.
    pub fn from_handle(handle: &DisplayHandle) -> Option<Self> {
        Some(PyFrame {
            seq: handle.seq(),
            media_type: handle.media_type()?,
            data: handle.bytes()?.to_vec(),
        })
    }
}

#[pymethods]
impl PyFrame {
    #[getter]
    fn data<'py>(&self, py: Python<'py>) -> Bound<'py, PyBytes> {
        PyBytes::new(py, &self.data)
    }

    fn __len__(&self) -> usize {
        self.data.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Frame(seq={}, media_type='{}', len={})",
            self.seq,
            self.media_type,
            self.data.len()
        )
    }
}

#[pyclass(name = "ControllerInfo", skip_from_py_object)]
#[derive(Clone)]
pub struct PyControllerInfo {
    #[pyo3(get)]
    pub name: Option<String>,
    #[pyo3(get)]
    pub serial_number: Option<String>,
    #[pyo3(get)]
    pub firmware: Option<String>,
    #[pyo3(get)]
    pub version: Option<String>,
    #[pyo3(get)]
    pub api_version: Option<String>,
}

impl From<ControllerInfo> for PyControllerInfo {
    fn from(info: ControllerInfo) -> Self {
        PyControllerInfo {
            name: info.name,
            serial_number: info.serial_number,
            firmware: info.firmware,
            version: info.version,
            api_version: info.api_version,
        }
    }
}

#[pymethods]
impl PyControllerInfo {
    fn __repr__(&self) -> String {
        format!(
            "ControllerInfo(name={:?}, serial_number={:?}, firmware={:?})",
            self.name, self.serial_number, self.firmware
        )
    }
}
