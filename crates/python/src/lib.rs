mod client;
mod demuxer;
mod types;

use pyo3::prelude::*;

#[pymodule]
#[pyo3(name = "txt_teleop")]
fn txt_teleop_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<client::PyClient>()?;
    m.add_class::<demuxer::PyFrameDemuxer>()?;
    m.add_class::<types::PyFrame>()?;
    m.add_class::<types::PyControllerInfo>()?;
    m.add_function(wrap_pyfunction!(demuxer::wheel_speeds, m)?)?;
    Ok(())
}
