//! Command line arguments and display helpers shared between the binaries.

use std::fmt::{Display, Formatter};

/// Declares a `clap` argument group for logging with a binary specific
/// default filter.
#[macro_export]
macro_rules! logging_args_with_default_filter {
    ($struct_name:ident, $default_filter:literal) => {
        #[derive(clap::Parser)]
        #[group(skip)]
        pub struct $struct_name {
            #[clap(long, env, default_value = $default_filter)]
            pub log_filter: String,

            #[clap(long, env, default_value = "error")]
            pub log_stderr_threshold: ::tracing::level_filters::LevelFilter,

            /// Output log events as JSON.
            #[clap(long, env, action = clap::ArgAction::Set, default_value = "false")]
            pub use_json_logs: bool,
        }

        impl $struct_name {
            pub fn to_config(&self) -> $crate::Config {
                $crate::Config::new(
                    &self.log_filter,
                    self.log_stderr_threshold,
                    self.use_json_logs,
                )
            }
        }

        impl ::std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let Self {
                    log_filter,
                    log_stderr_threshold,
                    use_json_logs,
                } = self;

                writeln!(f, "log_filter: {}", log_filter)?;
                writeln!(f, "log_stderr_threshold: {}", log_stderr_threshold)?;
                writeln!(f, "use_json_logs: {}", use_json_logs)?;
                Ok(())
            }
        }
    };
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> std::fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> std::fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
