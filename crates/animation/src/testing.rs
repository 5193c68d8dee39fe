//! Scripted weather source for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{Condition, Error, Location, Result, WeatherReading};
use weather_client::WeatherSource;

pub fn reading(precip: u8, temp: i32, condition: Condition) -> WeatherReading {
    WeatherReading {
        precipitation_chance: precip,
        temperature_f: temp,
        condition,
        fetched_at: Utc::now(),
    }
}

/// Replays queued responses; repeats the last success once the queue is empty.
#[derive(Default)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Result<WeatherReading>>>,
    last: Mutex<Option<WeatherReading>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn returning(reading: WeatherReading) -> Self {
        let source = Self::default();
        source.push_ok(reading);
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_ok(&self, reading: WeatherReading) {
        self.queue.lock().unwrap().push_back(Ok(reading));
    }

    pub fn push_err(&self, message: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Err(Error::SourceUnavailable(message.into())));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn fetch_reading(&self, _location: &Location) -> Result<WeatherReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Ok(reading)) => {
                *self.last.lock().unwrap() = Some(reading.clone());
                Ok(reading)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::SourceUnavailable("script exhausted".into())),
        }
    }
}
