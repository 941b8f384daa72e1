//! Client-side request throttle with per-endpoint-class sliding windows.
//!
//! This is a best-effort throttle, not a security boundary: state is
//! in-memory and process-lifetime only, and resets on restart. Two processes
//! (or browser tabs) meter independently.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Coarse endpoint category with an independent rate-limit ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Anything without a more specific class.
    Default,
    /// Product read operations.
    Products,
    /// Cart mutation operations.
    Cart,
}

/// Ceiling and window for one endpoint class.
#[derive(Debug, Clone, Copy)]
pub struct ClassLimit {
    /// Maximum requests admitted per window.
    pub max_requests: usize,
    /// Trailing window length.
    pub window: Duration,
}

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window request meter.
///
/// Tracks per-class request timestamps; [`Self::can_make_request`] prunes
/// timestamps older than the class window, rejects without recording when the
/// ceiling is reached, and otherwise records the request and admits it.
#[derive(Debug)]
pub struct RequestMeter {
    limits: HashMap<EndpointClass, ClassLimit>,
    windows: Mutex<HashMap<EndpointClass, VecDeque<Instant>>>,
}

impl Default for RequestMeter {
    /// Default policy: 100/min default, 200/min product reads, 50/min cart
    /// writes. These are tunable policy values, not contracts.
    fn default() -> Self {
        Self::with_limits(HashMap::from([
            (
                EndpointClass::Default,
                ClassLimit {
                    max_requests: 100,
                    window: DEFAULT_WINDOW,
                },
            ),
            (
                EndpointClass::Products,
                ClassLimit {
                    max_requests: 200,
                    window: DEFAULT_WINDOW,
                },
            ),
            (
                EndpointClass::Cart,
                ClassLimit {
                    max_requests: 50,
                    window: DEFAULT_WINDOW,
                },
            ),
        ]))
    }
}

impl RequestMeter {
    /// Create a meter with explicit per-class limits. Classes without an
    /// entry fall back to the `Default` class limit, or 100/min if that is
    /// absent too.
    #[must_use]
    pub fn with_limits(limits: HashMap<EndpointClass, ClassLimit>) -> Self {
        Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn limit_for(&self, class: EndpointClass) -> ClassLimit {
        self.limits
            .get(&class)
            .or_else(|| self.limits.get(&EndpointClass::Default))
            .copied()
            .unwrap_or(ClassLimit {
                max_requests: 100,
                window: DEFAULT_WINDOW,
            })
    }

    /// Whether a request for this class may go out now. Admitted requests are
    /// recorded; rejected attempts are not.
    pub fn can_make_request(&self, class: EndpointClass) -> bool {
        let limit = self.limit_for(class);
        let now = Instant::now();

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = windows.entry(class).or_default();

        while let Some(&oldest) = timestamps.front() {
            if now.duration_since(oldest) >= limit.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= limit.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }
}
