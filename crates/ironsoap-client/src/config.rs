/// Setting this variable to a non-zero integer turns on payload dumping.
pub const DEBUG_ENV_VAR: &str = "IRONSOAP_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct DecodeConfig {
    /// Log raw response bodies and transport error descriptions at debug level.
    #[builder(default = dump_payloads_from_env())]
    pub dump_payloads: bool,

    /// Emit a warning when a result is requested before the transport finished.
    #[builder(default = true)]
    pub warn_unfinished: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn dump_payloads_from_env() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|value| parse_debug_flag(&value))
        .unwrap_or(false)
}

pub(crate) fn parse_debug_flag(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok_and(|flag| flag != 0)
}
