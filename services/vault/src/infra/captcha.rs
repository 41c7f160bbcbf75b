use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::RngExt;

use crate::domain::repository::{Captcha, CaptchaStore};

pub const CAPTCHA_TTL: Duration = Duration::from_secs(300);

const CAPTCHA_ID_LEN: usize = 22;

/// URL-safe base64 alphabet.
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..CAPTCHA_ID_LEN)
        .map(|_| ID_CHARSET[rng.random_range(0..ID_CHARSET.len())] as char)
        .collect()
}

fn add_or_sub(a: i64, b: i64, subtract: bool) -> (String, i64) {
    if subtract {
        let (a, b) = if a < b { (b, a) } else { (a, b) };
        (format!("{a} - {b} = ?"), a - b)
    } else {
        (format!("{a} + {b} = ?"), a + b)
    }
}

/// Arithmetic question and its answer. Tiers are weighted 40/40/20.
fn generate_question() -> (String, i64) {
    let mut rng = rand::rng();
    match rng.random_range(0..100) {
        0..40 => {
            let a = rng.random_range(10..=99);
            let b = rng.random_range(10..=99);
            add_or_sub(a, b, rng.random_range(0..2) == 0)
        }
        40..80 => {
            if rng.random_range(0..2) == 0 {
                let a = rng.random_range(2..=12);
                let b = rng.random_range(2..=12);
                (format!("{a} × {b} = ?"), a * b)
            } else {
                let a = rng.random_range(100..=999);
                let b = rng.random_range(10..=99);
                add_or_sub(a, b, rng.random_range(0..2) == 0)
            }
        }
        _ => match rng.random_range(0..4) {
            0 => {
                let a = rng.random_range(10..=50);
                let b = rng.random_range(2..=9);
                let c = rng.random_range(2..=9);
                (format!("{a} + {b} × {c} = ?"), a + b * c)
            }
            1 => {
                let a = rng.random_range(2..=9);
                let b = rng.random_range(2..=9);
                let c = rng.random_range(1..a * b);
                (format!("{a} × {b} - {c} = ?"), a * b - c)
            }
            op => {
                let a = rng.random_range(100..=999);
                let b = rng.random_range(100..=999);
                add_or_sub(a, b, op == 3)
            }
        },
    }
}

struct Pending {
    answer: i64,
    issued_at: Instant,
}

/// Process-local captcha store. Clones share the same entries.
#[derive(Clone)]
pub struct InMemoryCaptchaStore {
    entries: Arc<Mutex<HashMap<String, Pending>>>,
    ttl: Duration,
}

impl Default for InMemoryCaptchaStore {
    fn default() -> Self {
        Self::with_ttl(CAPTCHA_TTL)
    }
}

impl InMemoryCaptchaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CaptchaStore for InMemoryCaptchaStore {
    fn issue(&self) -> Captcha {
        let (question, answer) = generate_question();
        let id = generate_id();
        let now = Instant::now();

        let mut entries = self.lock();
        entries.retain(|_, p| now.duration_since(p.issued_at) <= self.ttl);
        entries.insert(
            id.clone(),
            Pending {
                answer,
                issued_at: now,
            },
        );
        Captcha { id, question }
    }

    fn verify(&self, id: &str, answer: &str) -> bool {
        let Some(pending) = self.lock().remove(id) else {
            return false;
        };
        if pending.issued_at.elapsed() > self.ttl {
            return false;
        }
        answer.trim().parse::<i64>().ok() == Some(pending.answer)
    }
}
