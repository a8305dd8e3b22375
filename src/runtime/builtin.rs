use super::value::NativeFnPtr;

pub(super) mod native {
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::runtime::value::Value;

    /// Seconds since the UNIX epoch.
    pub fn clock(_args: &[Value]) -> Result<Value, String> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("system clock is before the UNIX epoch: {e}"))?;
        Ok(Value::Number(elapsed.as_secs_f64()))
    }
}

/// Natives every interpreter starts with.
pub(super) const GLOBALS: &[(&str, usize, NativeFnPtr)] = &[("clock", 0, native::clock)];
