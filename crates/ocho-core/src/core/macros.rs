//! Macros.

/// Write a line to the execution tracefile, if one is attached.
#[macro_export]
macro_rules! trace_exec {
    ($tracefile:expr, $format:expr, $($args:tt)*) => {
        if let Some(ref mut hndl) = $tracefile {
            match hndl {
                $crate::emulator::TracefileHandle::Stdout => println!($format, $($args)*),
                $crate::emulator::TracefileHandle::File(ref mut file) => {
                    writeln!(file, $format, $($args)*).ok();
                }
            }
        }
    }
}
