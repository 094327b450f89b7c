// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use draw_ranker::ingest::fetch::Fetcher;
use draw_ranker::ingest::types::{RetrievalError, SourceSpec};

#[derive(Debug)]
pub enum Reply {
    Body(String),
    Fail(RetrievalError),
    /// Never resolves; only a timeout gets the caller out.
    Hang,
}

/// Fetcher replaying a script per URL. The last reply of a script repeats forever;
/// unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, RetrievalError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(url) {
                None => Reply::Fail(RetrievalError::Status(404)),
                Some(q) if q.len() > 1 => q.pop_front().unwrap(),
                Some(q) => match q.front() {
                    Some(Reply::Body(b)) => Reply::Body(b.clone()),
                    Some(Reply::Fail(RetrievalError::Timeout(d))) => {
                        Reply::Fail(RetrievalError::Timeout(*d))
                    }
                    Some(Reply::Fail(RetrievalError::Status(s))) => {
                        Reply::Fail(RetrievalError::Status(*s))
                    }
                    Some(Reply::Fail(RetrievalError::Transport(m))) => {
                        Reply::Fail(RetrievalError::Transport(m.clone()))
                    }
                    Some(Reply::Hang) => Reply::Hang,
                    None => Reply::Fail(RetrievalError::Status(404)),
                },
            }
        };

        match reply {
            Reply::Body(b) => Ok(b),
            Reply::Fail(e) => Err(e),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn src(name: &str) -> SourceSpec {
    SourceSpec {
        name: name.to_string(),
        url: format!("https://{name}.example/results"),
    }
}

/// Six distinct numbers for row `i`, all within `[1, domain_max]`.
pub fn row_numbers(i: usize, domain_max: u8) -> [u8; 6] {
    let d = usize::from(domain_max);
    let mut n = [0u8; 6];
    for (j, slot) in n.iter_mut().enumerate() {
        *slot = ((i + j * 7) % d + 1) as u8;
    }
    n.sort_unstable();
    n
}

/// A table page with `rows` draws, newest first, one draw every other day back from `newest`.
/// Each row carries a bonus ball that must not be read as a draw number.
pub fn table_page(newest: NaiveDate, rows: usize, domain_max: u8) -> String {
    let mut html = String::from(
        "<html><body><table class=\"results\">\n<tr><th>Ngày</th><th>Kết quả</th><th>Jackpot</th></tr>\n",
    );
    for i in 0..rows {
        let date = newest - Duration::days(2 * i as i64);
        let balls: String = row_numbers(i, domain_max)
            .iter()
            .map(|n| format!("<span class=\"ball\">{n:02}</span>"))
            .collect();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{balls}<span class=\"ball special\">{:02}</span></td><td>12.345.678.900đ</td></tr>\n",
            date.format("%d/%m/%Y"),
            (i % usize::from(domain_max)) + 1
        ));
    }
    html.push_str("</table></body></html>\n");
    html
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
