//! Configuration validation shared by every `Pool` constructor.

use std::time::Duration;

use crate::error::PoolError;

pub(crate) const MIN_IDLE_TIME: Duration = Duration::from_millis(500);

pub(crate) fn validate<E>(
    stripes: usize,
    idle_time: Duration,
    max_per_stripe: usize,
) -> Result<(), PoolError<E>> {
    if stripes < 1 {
        return Err(PoolError::configuration("stripes", "must be >= 1"));
    }
    if idle_time < MIN_IDLE_TIME {
        return Err(PoolError::configuration(
            "idle_time",
            format!("must be >= {MIN_IDLE_TIME:?}"),
        ));
    }
    if max_per_stripe < 1 {
        return Err(PoolError::configuration("max_per_stripe", "must be >= 1"));
    }
    Ok(())
}

pub(crate) fn validate_max_uses<E>(max_uses: u32) -> Result<(), PoolError<E>> {
    if max_uses < 1 {
        return Err(PoolError::configuration("max_uses", "must be >= 1"));
    }
    Ok(())
}
