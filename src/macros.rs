/// Internal diagnostic logging.
///
/// These macros (`sdk_info!`, `sdk_warn!`, `sdk_debug!`) report on the health
/// of the tracing pipeline itself — dropped spans, exhausted retries, misuse
/// of the span lifecycle. They are not a general-purpose logging facility.
/// With the `internal-logs` feature enabled they forward to [`tracing`] under
/// this crate's name as target; without it they compile to nothing.
#[macro_export]
macro_rules! sdk_info {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::info!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name $(, $key = $value)*);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name $(, $value)*);
        }
    }};
}

/// Internal diagnostic logging at warn level.
///
/// See [`sdk_info!`] for intended use.
#[macro_export]
macro_rules! sdk_warn {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name $(, $key = $value)*);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name $(, $value)*);
        }
    }};
}

/// Internal diagnostic logging at debug level.
///
/// See [`sdk_info!`] for intended use.
#[macro_export]
macro_rules! sdk_debug {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name $(, $key = $value)*);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name $(, $value)*);
        }
    }};
}
