//! Log generator
//!
//! Synthesizes log records from a fixed set of levels and message templates.
//! Randomness and time are injected so runs can be reproduced.

use std::sync::Arc;

use insight_core::domain::log::{LogLevel, LogRecord};
use insight_core::time::Clock;
use rand::Rng;

/// Service tag stamped on every generated record
pub const SERVICE_NAME: &str = "log-generator-service";

/// Message templates; a `#` gets a random number appended
pub const MESSAGE_TEMPLATES: [&str; 10] = [
    "User authentication successful",
    "Payment processed for order #",
    "Database connection established",
    "API rate limit exceeded for user",
    "Failed to write to disk: permission denied",
    "User data fetched from cache",
    "Invalid input received for endpoint /api/users",
    "Third-party API timeout",
    "Successfully processed batch job #",
    "Unhandled exception: NullPointerException",
];

const TRACE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TRACE_LEN: usize = 8;
const TEMPLATE_NUMBER_BOUND: u32 = 10_000;

/// Random log record source
pub struct LogGenerator<R> {
    rng: R,
    clock: Arc<dyn Clock>,
}

impl<R: Rng> LogGenerator<R> {
    pub fn new(rng: R, clock: Arc<dyn Clock>) -> Self {
        Self { rng, clock }
    }

    /// Produce one record stamped with the clock's current time
    pub fn generate(&mut self) -> LogRecord {
        let level = LogLevel::GENERATED[self.rng.random_range(0..LogLevel::GENERATED.len())].clone();

        let template = MESSAGE_TEMPLATES[self.rng.random_range(0..MESSAGE_TEMPLATES.len())];
        let message = if template.contains('#') {
            format!(
                "{}{}",
                template,
                self.rng.random_range(0..TEMPLATE_NUMBER_BOUND)
            )
        } else {
            template.to_string()
        };

        LogRecord {
            level,
            message,
            timestamp: self.clock.now(),
            service: SERVICE_NAME.to_string(),
            trace_id: self.trace_id(),
        }
    }

    fn trace_id(&mut self) -> String {
        let suffix: String = (0..TRACE_LEN)
            .map(|_| char::from(TRACE_ALPHABET[self.rng.random_range(0..TRACE_ALPHABET.len())]))
            .collect();
        format!("trace-{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use insight_core::time::ManualClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn generator(seed: u64) -> LogGenerator<StdRng> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        LogGenerator::new(StdRng::seed_from_u64(seed), Arc::new(clock))
    }

    #[test]
    fn test_generated_record_shape() {
        let mut generator = generator(1);

        for _ in 0..200 {
            let record = generator.generate();

            assert!(record.level.is_recognised());
            assert_eq!(record.service, SERVICE_NAME);
            assert_eq!(
                record.timestamp,
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            );

            let suffix = record.trace_id.strip_prefix("trace-").unwrap();
            assert_eq!(suffix.len(), TRACE_LEN);
            assert!(suffix.bytes().all(|b| TRACE_ALPHABET.contains(&b)));

            assert!(
                MESSAGE_TEMPLATES
                    .iter()
                    .any(|template| record.message.starts_with(template.trim_end_matches('#')))
            );
        }
    }

    #[test]
    fn test_numbered_templates_get_a_number() {
        let mut generator = generator(9);

        let numbered = (0..500)
            .map(|_| generator.generate())
            .find(|record| record.message.starts_with("Payment processed for order #"))
            .unwrap();

        let number = numbered
            .message
            .trim_start_matches("Payment processed for order #");
        let value: u32 = number.parse().unwrap();
        assert!(value < TEMPLATE_NUMBER_BOUND);
    }

    #[test]
    fn test_same_seed_same_records() {
        let mut a = generator(42);
        let mut b = generator(42);

        for _ in 0..50 {
            assert_eq!(a.generate(), b.generate());
        }
    }

    #[test]
    fn test_all_levels_are_produced() {
        let mut generator = generator(5);
        let levels: std::collections::HashSet<LogLevel> =
            (0..300).map(|_| generator.generate().level).collect();

        assert_eq!(levels.len(), 3);
    }
}
