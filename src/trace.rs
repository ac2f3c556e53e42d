//! Crate-internal logging macros.
//!
//! Call sites stay unconditional; without the `tracing` feature they expand to nothing.

macro_rules! sssp_info {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        tracing::info!($($arg)+);
    }};
}

macro_rules! sssp_debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)+);
    }};
}

macro_rules! sssp_trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)+);
    }};
}
