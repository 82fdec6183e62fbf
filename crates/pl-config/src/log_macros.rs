/// Domain-aware logging macros for configuration loading (`conf` domain).
///
/// ```ignore
/// pl_debug!(conf, file = %path.display(), "loaded language config");
/// ```

#[doc(hidden)]
macro_rules! pl_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
macro_rules! pl_debug {
    ($domain:ident, $($rest:tt)*) => {
        pl_log!(debug, $domain, $($rest)*)
    };
}
