//! Call dispatcher
//!
//! Hands the three records to the native routine exactly once and turns the
//! status code into a `Result`. The dispatcher never harvests: on success
//! the outputs are left `Submitted` for the harvester; on failure they are
//! retired as `Released` with every pointer nulled and an empty ledger, so
//! nothing the failed call wrote can be harvested or freed later.

use crate::error::{Result, TriangleError};
use crate::ffi::{ArrayField, TriangleLibrary, TriangulateIo};
use crate::io::{RecordState, TriangleIo};
use crate::switches::Switches;
use std::sync::Arc;

const MIN_VERTICES: usize = 3;

/// Run `triangulate` over `input`, writing into `output` and `voronoi`
///
/// A failed call may have written pointers into the outputs before
/// returning. Those are reported and abandoned, not freed: there is no way
/// to tell which of them are complete allocations.
pub(crate) fn dispatch(
    library: &Arc<dyn TriangleLibrary>,
    switches: &Switches,
    input: &mut TriangleIo,
    output: &mut TriangleIo,
    voronoi: &mut TriangleIo,
) -> Result<()> {
    match input.state() {
        RecordState::Populated | RecordState::Submitted => {}
        state => {
            return Err(TriangleError::Lifecycle {
                operation: "submit",
                state,
            })
        }
    }
    for record in [&*output, &*voronoi] {
        if record.state() != RecordState::Empty {
            return Err(TriangleError::Lifecycle {
                operation: "write into",
                state: record.state(),
            });
        }
    }

    // Triangle aborts the whole process on fewer than three vertices
    if input.point_count() < MIN_VERTICES {
        return Err(TriangleError::validation(
            "vertices",
            format!(
                "at least {} required, got {}",
                MIN_VERTICES,
                input.point_count()
            ),
        ));
    }

    let has_triangles = input.triangle_count() > 0;
    let rendered = switches.render(has_triangles)?;

    input.state = RecordState::Submitted;
    for record in [&mut *output, &mut *voronoi] {
        record.state = RecordState::Submitted;
        record.library = Some(Arc::clone(library));
    }

    // Safety: `rendered` is NUL-terminated and outlives the call. Every
    // pointer in `input` refers to a managed buffer owned by `input`; the
    // outputs are empty records that the routine may fill.
    let status = unsafe {
        library.triangulate(
            rendered.as_ptr().cast_mut(),
            &mut input.raw,
            &mut output.raw,
            &mut voronoi.raw,
        )
    };
    tracing::debug!(switches = ?rendered, status, "triangulate");

    if status != 0 {
        let abandoned = abandoned_pointers(output) + abandoned_pointers(voronoi);
        if abandoned > 0 {
            tracing::warn!(
                status,
                abandoned,
                "failed triangulate() left output pointers behind; not freeing them"
            );
        }
        for record in [&mut *output, &mut *voronoi] {
            record.raw = TriangulateIo::empty();
            record.state = RecordState::Released;
        }
        return Err(TriangleError::NativeStatus { code: status });
    }
    Ok(())
}

fn abandoned_pointers(record: &TriangleIo) -> usize {
    ArrayField::ALL
        .into_iter()
        .filter(|field| !field.address(record.raw()).is_null())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::ffi::CStr;
    use std::os::raw::{c_char, c_int, c_void};
    use std::sync::Mutex;

    /// Records the switch string and returns a fixed status
    struct Recorder {
        status: c_int,
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(status: c_int) -> Arc<Self> {
            Arc::new(Self {
                status,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    unsafe impl TriangleLibrary for Recorder {
        unsafe fn triangulate(
            &self,
            switches: *mut c_char,
            _input: *mut TriangulateIo,
            _output: *mut TriangulateIo,
            _voronoi: *mut TriangulateIo,
        ) -> c_int {
            let switches = CStr::from_ptr(switches).to_string_lossy().into_owned();
            self.calls.lock().unwrap().push(switches);
            self.status
        }

        unsafe fn trifree(&self, _address: *mut c_void) {}
    }

    fn triangle_input() -> TriangleIo {
        let mut io = TriangleIo::new();
        io.set_vertices(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        io
    }

    #[test]
    fn test_dispatch_success_marks_records_submitted() {
        let recorder = Recorder::new(0);
        let library: Arc<dyn TriangleLibrary> = recorder.clone();
        let mut input = triangle_input();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        dispatch(&library, &Switches::from("c"), &mut input, &mut output, &mut voronoi).unwrap();

        assert_eq!(input.state(), RecordState::Submitted);
        assert_eq!(output.state(), RecordState::Submitted);
        assert_eq!(voronoi.state(), RecordState::Submitted);
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["Qzc".to_string()]);
    }

    #[test]
    fn test_dispatch_propagates_status() {
        let recorder = Recorder::new(1);
        let library: Arc<dyn TriangleLibrary> = recorder.clone();
        let mut input = triangle_input();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        let err = dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(err, TriangleError::NativeStatus { code: 1 });
        assert!(output.ledger().is_empty());
        assert_eq!(output.state(), RecordState::Released);
        assert_eq!(voronoi.state(), RecordState::Released);
        assert_eq!(input.state(), RecordState::Submitted);
    }

    /// Writes a pointer into the output, then reports failure
    struct PartialFailure(Mutex<Vec<usize>>);

    unsafe impl TriangleLibrary for PartialFailure {
        unsafe fn triangulate(
            &self,
            _switches: *mut c_char,
            _input: *mut TriangulateIo,
            output: *mut TriangulateIo,
            _voronoi: *mut TriangulateIo,
        ) -> c_int {
            (*output).pointlist = 0x1000 as *mut f64;
            (*output).numberofpoints = 1;
            3
        }

        unsafe fn trifree(&self, address: *mut c_void) {
            self.0.lock().unwrap().push(address as usize);
        }
    }

    #[test]
    fn test_failed_call_pointers_are_abandoned() {
        let failing = Arc::new(PartialFailure(Mutex::new(Vec::new())));
        let library: Arc<dyn TriangleLibrary> = failing.clone();
        let mut input = triangle_input();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        let err = dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(err, TriangleError::NativeStatus { code: 3 });
        assert!(output.raw().pointlist.is_null());
        assert!(output.harvest(&input).is_err());
        assert!(output.release().is_err());

        drop(output);
        assert!(failing.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_switches_skip_the_call() {
        let recorder = Recorder::new(0);
        let library: Arc<dyn TriangleLibrary> = recorder.clone();
        let mut input = triangle_input();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        let err = dispatch(&library, &Switches::from("r"), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(err.field(), Some("switches"));
        assert_eq!(input.state(), RecordState::Populated);
        assert_eq!(output.state(), RecordState::Empty);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_input_rejected() {
        let library: Arc<dyn TriangleLibrary> = Recorder::new(0);
        let mut input = TriangleIo::new();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        let err = dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(
            err,
            TriangleError::Lifecycle {
                operation: "submit",
                state: RecordState::Empty,
            }
        );
    }

    #[test]
    fn test_too_few_vertices_skip_the_call() {
        let recorder = Recorder::new(0);
        let library: Arc<dyn TriangleLibrary> = recorder.clone();
        let mut input = TriangleIo::new();
        input.set_holes(&[vec![0.5, 0.5]]).unwrap();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());

        let err = dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(err.field(), Some("vertices"));
        assert_eq!(input.state(), RecordState::Populated);
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_used_output_rejected() {
        let library: Arc<dyn TriangleLibrary> = Recorder::new(0);
        let mut input = triangle_input();
        let (mut output, mut voronoi) = (TriangleIo::new(), TriangleIo::new());
        dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi).unwrap();

        let err = dispatch(&library, &Switches::new(), &mut input, &mut output, &mut voronoi)
            .unwrap_err();
        assert_eq!(
            err,
            TriangleError::Lifecycle {
                operation: "write into",
                state: RecordState::Submitted,
            }
        );
    }
}
