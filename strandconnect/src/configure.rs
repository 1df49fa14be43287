//! Stream post-configuration shared by both connect paths.

use strandvirtual::{IoMode, IoStream, ThroughputCaps};

/// Put a freshly produced stream into `mode` on both sides and apply `caps`.
///
/// Must run before the stream is handed to its caller.
pub fn configure_stream(stream: &dyn IoStream, mode: IoMode, caps: ThroughputCaps) {
    stream.set_output_io_mode(mode);
    stream.set_input_io_mode(mode);
    stream.set_throughput_caps(caps);
}
