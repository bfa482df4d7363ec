//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging adapters and sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
#[doc(hidden)]
#[macro_export]
macro_rules! __bulletin_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext<'_> = &$ctx;
        tracing::event!(
            $level,
            run = ctx.run.unwrap_or(""),
            stage = ctx.stage.unwrap_or(""),
            window_start = ctx.window_start.unwrap_or(""),
            window_end = ctx.window_end.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with run context.
#[macro_export]
macro_rules! bulletin_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning log enriched with run context.
#[macro_export]
macro_rules! bulletin_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with run context.
#[macro_export]
macro_rules! bulletin_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with run context.
#[macro_export]
macro_rules! bulletin_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__bulletin_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
