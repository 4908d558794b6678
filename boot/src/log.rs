//! Logging shim.
//!
//! With the `defmt` feature the macros forward to defmt, std builds print to
//! stdout, and plain `no_std` builds make them vanish.  Only use `{}` and
//! `{:x}` in format strings, both backends understand those.

macro_rules! info {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)+);
        #[cfg(all(feature = "std", not(feature = "defmt")))]
        std::println!($($arg)+);
        #[cfg(not(any(feature = "std", feature = "defmt")))]
        let _ = core::format_args!($($arg)+);
    }};
}

macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
        #[cfg(all(feature = "std", not(feature = "defmt")))]
        std::println!("warning: {}", core::format_args!($($arg)+));
        #[cfg(not(any(feature = "std", feature = "defmt")))]
        let _ = core::format_args!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)+);
        #[cfg(not(feature = "defmt"))]
        let _ = core::format_args!($($arg)+);
    }};
}
