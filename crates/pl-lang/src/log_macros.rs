/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field so analysis events can be filtered
/// by the stage that produced them: `parse` (grammar), `ast` (AST builder),
/// `check` (type annotation and checking).
///
/// ```ignore
/// pl_debug!(ast, name = %name, "variable declared");
/// pl_warn!(ast, rule = %name, "condition replaced with `false`");
/// ```

#[doc(hidden)]
macro_rules! pl_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
macro_rules! pl_warn {
    ($domain:ident, $($rest:tt)*) => {
        pl_log!(warn, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
macro_rules! pl_debug {
    ($domain:ident, $($rest:tt)*) => {
        pl_log!(debug, $domain, $($rest)*)
    };
}

/// Log at TRACE level with an automatic `domain` field.
macro_rules! pl_trace {
    ($domain:ident, $($rest:tt)*) => {
        pl_log!(trace, $domain, $($rest)*)
    };
}
