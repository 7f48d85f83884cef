#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $logger:expr, { tracker = $tracker:expr }, $($arg:tt)* ) => {
      $logger.log_with_tracker($crate::log::Level::$level, &$tracker, format_args!($($arg)*))
    };

    ($level:ident, $logger:expr, { option_tracker = $option_tracker:expr }, $($arg:tt)* ) => {
      $logger.log_with_option_tracker($crate::log::Level::$level, $option_tracker, format_args!($($arg)*))
    };

    ($level:ident, $logger:expr, $($arg:tt)*) => {
      $logger.log($crate::log::Level::$level, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => { $crate::__log!(Debug, $logger, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => { $crate::__log!(Info, $logger, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)*) => { $crate::__log!(Warn, $logger, $($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => { $crate::__log!(Error, $logger, $($arg)*) };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)*) => { $crate::__log!(Fatal, $logger, $($arg)*) };
}
